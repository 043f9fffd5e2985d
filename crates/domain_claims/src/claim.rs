//! Claim aggregate: a claim against a warranty and the damaged parts it covers

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use core_kernel::{
    ApprovalStatus, ClaimId, ClaimPartId, Composite, CompositeChild, LifecycleStatus, WarrantyId,
    WarrantyPartId,
};

use crate::error::ClaimError;

/// A claim against a warranty
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    /// Unique identifier
    pub id: ClaimId,
    /// Warranty the claim is made under
    pub warranty_id: WarrantyId,
    /// `C<YYMMDD>-<warranty no>-SEQ`
    pub claim_no: String,
    /// Date the customer reported the damage
    pub claim_date: NaiveDate,
    /// Aggregate of the parts' approval
    pub approval_status: ApprovalStatus,
    /// Aggregate of the parts' lifecycle
    pub status: LifecycleStatus,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

/// One damaged warranty part named in a claim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimWarrantyPart {
    pub id: ClaimPartId,
    pub claim_id: ClaimId,
    /// The warranted part that was damaged
    pub warranty_part_id: WarrantyPartId,
    pub damaged_image_url: String,
    pub remarks: Option<String>,
    /// When the damage was repaired
    pub resolution_date: Option<NaiveDate>,
    pub resolution_image_url: Option<String>,
    pub approval_status: ApprovalStatus,
    pub status: LifecycleStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for filing a claim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewClaim {
    pub warranty_id: WarrantyId,
    /// Generated inside the creating transaction when absent
    pub claim_no: Option<String>,
    pub claim_date: NaiveDate,
}

/// Replacement fields for an existing claim; the number never changes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimChange {
    pub claim_date: NaiveDate,
}

/// Fields for a new claim part; the claim id is stamped by the writer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewClaimPart {
    pub warranty_part_id: WarrantyPartId,
    pub damaged_image_url: String,
    pub remarks: Option<String>,
    pub resolution_date: Option<NaiveDate>,
    pub resolution_image_url: Option<String>,
}

/// A claim part in an update payload; parts without an id are inserted
///
/// Approval and open/closed status are not part of the payload; they change
/// only through the status operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimPartChange {
    pub id: Option<ClaimPartId>,
    pub warranty_part_id: WarrantyPartId,
    pub damaged_image_url: String,
    pub remarks: Option<String>,
    pub resolution_date: Option<NaiveDate>,
    pub resolution_image_url: Option<String>,
}

impl ClaimPartChange {
    /// The insert equivalent of an unnamed change
    pub fn to_new(&self) -> NewClaimPart {
        NewClaimPart {
            warranty_part_id: self.warranty_part_id,
            damaged_image_url: self.damaged_image_url.clone(),
            remarks: self.remarks.clone(),
            resolution_date: self.resolution_date,
            resolution_image_url: self.resolution_image_url.clone(),
        }
    }
}

impl CompositeChild for ClaimWarrantyPart {
    type Id = ClaimPartId;
    type Key = WarrantyPartId;

    fn id(&self) -> ClaimPartId {
        self.id
    }

    fn natural_key(&self) -> WarrantyPartId {
        self.warranty_part_id
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

/// A claim together with its parts
pub type ClaimWithParts = Composite<Claim, ClaimWarrantyPart>;

impl NewClaim {
    pub fn validate(&self, parts: &[NewClaimPart]) -> Result<(), ClaimError> {
        if let Some(no) = &self.claim_no {
            if no.trim().is_empty() {
                return Err(ClaimError::validation("claim number is required"));
            }
        }
        let mut seen = HashSet::new();
        for part in parts {
            if part.damaged_image_url.trim().is_empty() {
                return Err(ClaimError::validation("damaged image is required for every part"));
            }
            if !seen.insert(part.warranty_part_id) {
                return Err(ClaimError::validation(format!(
                    "warranty part {} appears more than once",
                    part.warranty_part_id
                )));
            }
        }
        Ok(())
    }
}
