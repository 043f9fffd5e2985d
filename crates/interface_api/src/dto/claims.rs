//! Claims DTOs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{ApprovalStatus, ClaimId, ClaimPartId, LifecycleStatus, WarrantyId, WarrantyPartId};
use domain_claims::{
    Claim, ClaimChange, ClaimPartChange, ClaimWarrantyPart, ClaimWithParts, NewClaim, NewClaimPart,
};
use domain_warranty::numbering::parse_request_date;

use crate::error::ApiError;

fn parse_optional_date(input: Option<&str>) -> Result<Option<NaiveDate>, ApiError> {
    match input.map(str::trim).filter(|s| !s.is_empty()) {
        Some(date) => Ok(Some(parse_request_date(date)?)),
        None => Ok(None),
    }
}

/// One damaged part in a composite create or update
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimPartRequest {
    pub id: Option<ClaimPartId>,
    pub warranty_part_id: WarrantyPartId,
    pub damaged_image_url: String,
    pub remarks: Option<String>,
    pub resolution_date: Option<String>,
    pub resolution_image_url: Option<String>,
}

impl ClaimPartRequest {
    fn into_new(self) -> Result<NewClaimPart, ApiError> {
        Ok(NewClaimPart {
            warranty_part_id: self.warranty_part_id,
            damaged_image_url: self.damaged_image_url,
            remarks: self.remarks,
            resolution_date: parse_optional_date(self.resolution_date.as_deref())?,
            resolution_image_url: self.resolution_image_url,
        })
    }

    pub fn into_change(self) -> Result<ClaimPartChange, ApiError> {
        Ok(ClaimPartChange {
            id: self.id,
            warranty_part_id: self.warranty_part_id,
            damaged_image_url: self.damaged_image_url,
            remarks: self.remarks,
            resolution_date: parse_optional_date(self.resolution_date.as_deref())?,
            resolution_image_url: self.resolution_image_url,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateClaimRequest {
    pub warranty_id: WarrantyId,
    /// Generated from the warranty number and claim date when omitted
    pub claim_no: Option<String>,
    pub claim_date: String,
    #[serde(default)]
    pub parts: Vec<ClaimPartRequest>,
}

impl CreateClaimRequest {
    pub fn into_domain(self) -> Result<(NewClaim, Vec<NewClaimPart>), ApiError> {
        let claim = NewClaim {
            warranty_id: self.warranty_id,
            claim_no: self.claim_no.filter(|no| !no.trim().is_empty()),
            claim_date: parse_request_date(&self.claim_date)?,
        };
        let parts = self
            .parts
            .into_iter()
            .map(ClaimPartRequest::into_new)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((claim, parts))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateClaimRequest {
    pub claim_date: String,
    #[serde(default)]
    pub parts: Vec<ClaimPartRequest>,
}

impl UpdateClaimRequest {
    pub fn into_domain(self) -> Result<(ClaimChange, Vec<ClaimPartChange>), ApiError> {
        let change = ClaimChange {
            claim_date: parse_request_date(&self.claim_date)?,
        };
        let parts = self
            .parts
            .into_iter()
            .map(ClaimPartRequest::into_change)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((change, parts))
    }
}

/// Body of `POST /claim-parts`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddClaimPartRequest {
    pub claim_id: ClaimId,
    #[serde(flatten)]
    pub part: ClaimPartRequest,
}

impl AddClaimPartRequest {
    pub fn into_domain(self) -> Result<(ClaimId, NewClaimPart), ApiError> {
        Ok((self.claim_id, self.part.into_new()?))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateClaimNoRequest {
    pub warranty_no: String,
    pub claim_date: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimNoResponse {
    pub claim_no: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimResponse {
    pub id: ClaimId,
    pub warranty_id: WarrantyId,
    pub claim_no: String,
    pub claim_date: NaiveDate,
    pub approval_status: ApprovalStatus,
    /// Flag form of the approval
    pub is_approved: bool,
    pub status: LifecycleStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Claim> for ClaimResponse {
    fn from(claim: Claim) -> Self {
        Self {
            id: claim.id,
            warranty_id: claim.warranty_id,
            claim_no: claim.claim_no,
            claim_date: claim.claim_date,
            approval_status: claim.approval_status,
            is_approved: claim.approval_status == ApprovalStatus::Approved,
            status: claim.status,
            created_at: claim.created_at,
            updated_at: claim.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimPartResponse {
    pub id: ClaimPartId,
    pub claim_id: ClaimId,
    pub warranty_part_id: WarrantyPartId,
    pub damaged_image_url: String,
    pub remarks: Option<String>,
    pub resolution_date: Option<NaiveDate>,
    pub resolution_image_url: Option<String>,
    pub approval_status: ApprovalStatus,
    pub is_approved: bool,
    pub status: LifecycleStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ClaimWarrantyPart> for ClaimPartResponse {
    fn from(part: ClaimWarrantyPart) -> Self {
        Self {
            id: part.id,
            claim_id: part.claim_id,
            warranty_part_id: part.warranty_part_id,
            damaged_image_url: part.damaged_image_url,
            remarks: part.remarks,
            resolution_date: part.resolution_date,
            resolution_image_url: part.resolution_image_url,
            approval_status: part.approval_status,
            is_approved: part.approval_status == ApprovalStatus::Approved,
            status: part.status,
            created_at: part.created_at,
            updated_at: part.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ClaimWithPartsResponse {
    #[serde(flatten)]
    pub claim: ClaimResponse,
    pub parts: Vec<ClaimPartResponse>,
}

impl From<ClaimWithParts> for ClaimWithPartsResponse {
    fn from(composite: ClaimWithParts) -> Self {
        Self {
            claim: composite.parent.into(),
            parts: composite.children.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_resolution_date_is_none() {
        let req: AddClaimPartRequest = serde_json::from_str(
            r#"{"claimId": 4, "warrantyPartId": 9, "damagedImageUrl": "u", "resolutionDate": ""}"#,
        )
        .unwrap();
        let (claim, part) = req.into_domain().unwrap();
        assert_eq!(claim, ClaimId::new(4));
        assert_eq!(part.resolution_date, None);
    }

    #[test]
    fn test_bad_claim_date_is_rejected() {
        let req: CreateClaimRequest =
            serde_json::from_str(r#"{"warrantyId": 1, "claimDate": "yesterday"}"#).unwrap();
        assert!(req.into_domain().is_err());
    }
}
