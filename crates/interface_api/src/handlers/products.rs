//! Product catalogue and stock allocation handlers

use axum::{extract::State, http::StatusCode, Extension, Json};

use core_kernel::{ProductAllocationId, ProductId, ShopId};

use crate::auth::{require_admin, Claims};
use crate::dto::products::*;
use crate::error::ApiError;
use crate::extract::{ApiPath, ValidJson};
use crate::AppState;

/// Lists products
pub async fn list_products(
    State(state): State<AppState>,
) -> Result<Json<Vec<ProductResponse>>, ApiError> {
    let products = state.products.list_products().await?;
    Ok(Json(products.into_iter().map(Into::into).collect()))
}

/// Gets a product by ID
pub async fn get_product(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<Json<ProductResponse>, ApiError> {
    Ok(Json(state.products.get_product(id).await?.into()))
}

/// Registers a film product
pub async fn create_product(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ValidJson(request): ValidJson<CreateProductRequest>,
) -> Result<(StatusCode, Json<ProductResponse>), ApiError> {
    require_admin(&claims)?;
    let product = state.products.create_product(request.into()).await?;
    Ok((StatusCode::CREATED, Json(product.into())))
}

/// Replaces a product's details
pub async fn update_product(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiPath(id): ApiPath<ProductId>,
    ValidJson(request): ValidJson<UpdateProductRequest>,
) -> Result<Json<ProductResponse>, ApiError> {
    require_admin(&claims)?;
    Ok(Json(state.products.update_product(id, request.into()).await?.into()))
}

/// Lists every allocation
pub async fn list_allocations(
    State(state): State<AppState>,
) -> Result<Json<Vec<AllocationResponse>>, ApiError> {
    let allocations = state.products.list_allocations().await?;
    Ok(Json(allocations.into_iter().map(Into::into).collect()))
}

pub async fn get_allocation(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ProductAllocationId>,
) -> Result<Json<AllocationResponse>, ApiError> {
    Ok(Json(state.products.get_allocation(id).await?.into()))
}

/// Hands stock to a shop
pub async fn create_allocation(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ValidJson(request): ValidJson<AllocationRequest>,
) -> Result<(StatusCode, Json<AllocationResponse>), ApiError> {
    require_admin(&claims)?;
    let allocation = state.products.allocate(request.into_domain()?).await?;
    Ok((StatusCode::CREATED, Json(allocation.into())))
}

pub async fn update_allocation(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiPath(id): ApiPath<ProductAllocationId>,
    ValidJson(request): ValidJson<AllocationRequest>,
) -> Result<Json<AllocationResponse>, ApiError> {
    require_admin(&claims)?;
    let allocation = state
        .products
        .update_allocation(id, request.into_domain()?)
        .await?;
    Ok(Json(allocation.into()))
}

/// Products a shop can fit, one entry per allocation
pub async fn list_shop_products(
    State(state): State<AppState>,
    ApiPath(shop_id): ApiPath<ShopId>,
) -> Result<Json<Vec<ShopProductResponse>>, ApiError> {
    let products = state.products.list_shop_products(shop_id).await?;
    Ok(Json(products.into_iter().map(Into::into).collect()))
}
