//! Warranty and warranty part handlers

use axum::{extract::State, http::StatusCode, Extension, Json};

use core_kernel::{ShopId, WarrantyId, WarrantyPartId};

use crate::auth::{require_admin, Claims};
use crate::dto::common::{ApprovalRequest, SearchQuery};
use crate::dto::warranties::*;
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery, ValidJson};
use crate::AppState;

pub async fn list_warranties(
    State(state): State<AppState>,
) -> Result<Json<Vec<WarrantyResponse>>, ApiError> {
    let warranties = state.warranties.list_warranties().await?;
    Ok(Json(warranties.into_iter().map(Into::into).collect()))
}

pub async fn list_by_shop(
    State(state): State<AppState>,
    ApiPath(shop_id): ApiPath<ShopId>,
) -> Result<Json<Vec<WarrantyResponse>>, ApiError> {
    let warranties = state.warranties.list_by_shop(shop_id).await?;
    Ok(Json(warranties.into_iter().map(Into::into).collect()))
}

/// Gets a warranty with its parts
pub async fn get_warranty(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<WarrantyId>,
) -> Result<Json<WarrantyWithPartsResponse>, ApiError> {
    Ok(Json(state.warranties.get_warranty(id).await?.into()))
}

pub async fn list_parts(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<WarrantyId>,
) -> Result<Json<Vec<WarrantyPartResponse>>, ApiError> {
    let parts = state.warranties.list_parts(id).await?;
    Ok(Json(parts.into_iter().map(Into::into).collect()))
}

pub async fn list_car_parts(
    State(state): State<AppState>,
) -> Result<Json<Vec<CarPartResponse>>, ApiError> {
    let parts = state.warranties.list_car_parts().await?;
    Ok(Json(parts.into_iter().map(Into::into).collect()))
}

/// Public lookup by exact warranty number or plate number
pub async fn search(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<SearchQuery>,
) -> Result<Json<Vec<WarrantyWithPartsResponse>>, ApiError> {
    let found = state.warranties.search(&query.q).await?;
    Ok(Json(found.into_iter().map(Into::into).collect()))
}

/// Previews the next warranty number for `{branch_code}-{installation_date}`
pub async fn generate_warranty_no(
    State(state): State<AppState>,
    ApiPath(key): ApiPath<String>,
) -> Result<Json<WarrantyNoResponse>, ApiError> {
    let warranty_no = state.warranties.preview_warranty_no_for_key(&key).await?;
    Ok(Json(WarrantyNoResponse { warranty_no }))
}

/// Registers a warranty with all of its parts
pub async fn create_warranty(
    State(state): State<AppState>,
    ValidJson(request): ValidJson<CreateWarrantyRequest>,
) -> Result<(StatusCode, Json<WarrantyWithPartsResponse>), ApiError> {
    let (warranty, parts) = request.into_domain()?;
    let created = state.warranties.create_warranty(warranty, parts).await?;
    Ok((StatusCode::CREATED, Json(created.into())))
}

/// Updates a warranty and reconciles its parts
pub async fn update_warranty(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<WarrantyId>,
    ValidJson(request): ValidJson<UpdateWarrantyRequest>,
) -> Result<Json<WarrantyWithPartsResponse>, ApiError> {
    let (change, parts) = request.into_domain()?;
    Ok(Json(state.warranties.update_warranty(id, change, parts).await?.into()))
}

/// Sets the warranty's approval on it and every part
pub async fn set_approval(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiPath(id): ApiPath<WarrantyId>,
    ApiJson(request): ApiJson<ApprovalRequest>,
) -> Result<Json<WarrantyWithPartsResponse>, ApiError> {
    require_admin(&claims)?;
    let status = request.status()?;
    Ok(Json(state.warranties.set_approval(id, status).await?.into()))
}

pub async fn add_part(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<AddWarrantyPartRequest>,
) -> Result<(StatusCode, Json<WarrantyPartResponse>), ApiError> {
    let part = state
        .warranties
        .add_part(request.warranty_id, request.part.into())
        .await?;
    Ok((StatusCode::CREATED, Json(part.into())))
}

pub async fn update_part(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<WarrantyPartId>,
    ApiJson(request): ApiJson<WarrantyPartRequest>,
) -> Result<Json<WarrantyPartResponse>, ApiError> {
    Ok(Json(state.warranties.update_part(id, request.into()).await?.into()))
}

/// Sets one part's approval and returns the re-derived warranty
pub async fn set_part_approval(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiPath(id): ApiPath<WarrantyPartId>,
    ApiJson(request): ApiJson<ApprovalRequest>,
) -> Result<Json<WarrantyWithPartsResponse>, ApiError> {
    require_admin(&claims)?;
    let status = request.status()?;
    Ok(Json(state.warranties.set_part_approval(id, status).await?.into()))
}
