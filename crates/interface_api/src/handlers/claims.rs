//! Claim and claim part handlers

use axum::{extract::State, http::StatusCode, Extension, Json};

use core_kernel::{ClaimId, ClaimPartId, ShopId};
use domain_warranty::numbering::parse_request_date;

use crate::auth::{require_admin, Claims};
use crate::dto::claims::*;
use crate::dto::common::{ApprovalRequest, StatusRequest};
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath};
use crate::AppState;

pub async fn list_claims(
    State(state): State<AppState>,
) -> Result<Json<Vec<ClaimResponse>>, ApiError> {
    let claims = state.claims.list_claims().await?;
    Ok(Json(claims.into_iter().map(Into::into).collect()))
}

pub async fn list_by_shop(
    State(state): State<AppState>,
    ApiPath(shop_id): ApiPath<ShopId>,
) -> Result<Json<Vec<ClaimResponse>>, ApiError> {
    let claims = state.claims.list_by_shop(shop_id).await?;
    Ok(Json(claims.into_iter().map(Into::into).collect()))
}

/// Gets a claim with its parts
pub async fn get_claim(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ClaimId>,
) -> Result<Json<ClaimWithPartsResponse>, ApiError> {
    Ok(Json(state.claims.get_claim(id).await?.into()))
}

pub async fn list_parts(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ClaimId>,
) -> Result<Json<Vec<ClaimPartResponse>>, ApiError> {
    let parts = state.claims.list_parts(id).await?;
    Ok(Json(parts.into_iter().map(Into::into).collect()))
}

/// Previews the next claim number for a warranty and claim date
pub async fn generate_claim_no(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<GenerateClaimNoRequest>,
) -> Result<Json<ClaimNoResponse>, ApiError> {
    let claim_date = parse_request_date(&request.claim_date)?;
    let claim_no = state
        .claims
        .preview_claim_no(&request.warranty_no, claim_date)
        .await?;
    Ok(Json(ClaimNoResponse { claim_no }))
}

/// Files a claim with all of its parts
pub async fn create_claim(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateClaimRequest>,
) -> Result<(StatusCode, Json<ClaimWithPartsResponse>), ApiError> {
    let (claim, parts) = request.into_domain()?;
    let created = state.claims.create_claim(claim, parts).await?;
    Ok((StatusCode::CREATED, Json(created.into())))
}

/// Updates a claim and reconciles its parts
pub async fn update_claim(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ClaimId>,
    ApiJson(request): ApiJson<UpdateClaimRequest>,
) -> Result<Json<ClaimWithPartsResponse>, ApiError> {
    let (change, parts) = request.into_domain()?;
    Ok(Json(state.claims.update_claim(id, change, parts).await?.into()))
}

pub async fn set_approval(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiPath(id): ApiPath<ClaimId>,
    ApiJson(request): ApiJson<ApprovalRequest>,
) -> Result<Json<ClaimWithPartsResponse>, ApiError> {
    require_admin(&claims)?;
    let status = request.status()?;
    Ok(Json(state.claims.set_approval(id, status).await?.into()))
}

/// Opens or closes the claim with every part
pub async fn set_status(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ClaimId>,
    ApiJson(request): ApiJson<StatusRequest>,
) -> Result<Json<ClaimWithPartsResponse>, ApiError> {
    Ok(Json(state.claims.set_status(id, request.status).await?.into()))
}

pub async fn add_part(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<AddClaimPartRequest>,
) -> Result<(StatusCode, Json<ClaimPartResponse>), ApiError> {
    let (claim, part) = request.into_domain()?;
    let created = state.claims.add_part(claim, part).await?;
    Ok((StatusCode::CREATED, Json(created.into())))
}

pub async fn update_part(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ClaimPartId>,
    ApiJson(request): ApiJson<ClaimPartRequest>,
) -> Result<Json<ClaimPartResponse>, ApiError> {
    let change = request.into_change()?;
    Ok(Json(state.claims.update_part(id, change).await?.into()))
}

pub async fn set_part_approval(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiPath(id): ApiPath<ClaimPartId>,
    ApiJson(request): ApiJson<ApprovalRequest>,
) -> Result<Json<ClaimWithPartsResponse>, ApiError> {
    require_admin(&claims)?;
    let status = request.status()?;
    Ok(Json(state.claims.set_part_approval(id, status).await?.into()))
}

/// Opens or closes one part; the claim follows its parts
pub async fn set_part_status(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<ClaimPartId>,
    ApiJson(request): ApiJson<StatusRequest>,
) -> Result<Json<ClaimWithPartsResponse>, ApiError> {
    Ok(Json(state.claims.set_part_status(id, request.status).await?.into()))
}
