//! Object uploads

use axum::{body::Bytes, extract::State, http::StatusCode, Json};
use tracing::info;

use domain_warranty::storage::sanitize_filename;
use domain_warranty::UploadFolder;

use crate::dto::common::UploadResponse;
use crate::error::ApiError;
use crate::extract::ApiPath;
use crate::AppState;

/// Stores the raw request body under `folder` and returns its public URL
pub async fn upload(
    State(state): State<AppState>,
    ApiPath((folder, filename)): ApiPath<(String, String)>,
    body: Bytes,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    let folder: UploadFolder = folder.parse()?;
    let filename = sanitize_filename(&filename)?;
    if body.is_empty() {
        return Err(ApiError::BadRequest("upload body is empty".to_string()));
    }

    let url = state.storage.upload(folder, &filename, body.to_vec()).await?;
    info!(%folder, %url, "object uploaded");
    Ok((StatusCode::CREATED, Json(UploadResponse { url })))
}
