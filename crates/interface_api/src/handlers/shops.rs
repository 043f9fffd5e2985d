//! Shop handlers

use axum::{extract::State, http::StatusCode, Extension, Json};

use core_kernel::ShopId;

use crate::auth::{require_admin, Claims};
use crate::dto::shops::*;
use crate::error::ApiError;
use crate::extract::{ApiPath, ValidJson};
use crate::AppState;

/// Lists the Malaysian states
pub async fn list_states(
    State(state): State<AppState>,
) -> Result<Json<Vec<StateResponse>>, ApiError> {
    let states = state.shops.list_states().await?;
    Ok(Json(states.into_iter().map(Into::into).collect()))
}

/// Lists shops
pub async fn list_shops(
    State(state): State<AppState>,
) -> Result<Json<Vec<ShopResponse>>, ApiError> {
    let shops = state.shops.list_shops().await?;
    Ok(Json(shops.into_iter().map(Into::into).collect()))
}

/// Gets a shop by ID
pub async fn get_shop(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ShopId>,
) -> Result<Json<ShopResponse>, ApiError> {
    Ok(Json(state.shops.get_shop(id).await?.into()))
}

/// Previews the next branch code for a state
pub async fn generate_branch_code(
    State(state): State<AppState>,
    ApiPath(state_code): ApiPath<String>,
) -> Result<Json<BranchCodeResponse>, ApiError> {
    let branch_code = state.shops.preview_branch_code(&state_code).await?;
    Ok(Json(BranchCodeResponse { branch_code }))
}

/// Registers a shop together with its login
pub async fn create_shop(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ValidJson(request): ValidJson<CreateShopRequest>,
) -> Result<(StatusCode, Json<ShopResponse>), ApiError> {
    require_admin(&claims)?;
    let shop = state.shops.create_shop(request.into()).await?;
    Ok((StatusCode::CREATED, Json(shop.into())))
}

/// Replaces a shop's details
pub async fn update_shop(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiPath(id): ApiPath<ShopId>,
    ValidJson(request): ValidJson<UpdateShopRequest>,
) -> Result<Json<ShopResponse>, ApiError> {
    require_admin(&claims)?;
    Ok(Json(state.shops.update_shop(id, request.into()).await?.into()))
}
