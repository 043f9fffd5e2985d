//! Claim filing, composite updates and the two claim status axes

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, instrument};

use core_kernel::{
    cascade_from_parent, create_with_children, preview_code, recompute_from_child, reserve_code,
    resync_parent, update_with_children, ApprovalStatus, BinaryApproval, ClaimId, ClaimPartId,
    CodeSequence, LifecycleStatus, ShopId, WarrantyId, WarrantyPartId,
};
use domain_warranty::numbering::claim_no_prefix;

use crate::axes::{ClaimApprovalAxis, ClaimApprovalFlagAxis, ClaimComposite, ClaimLifecycleAxis};
use crate::claim::{
    Claim, ClaimChange, ClaimPartChange, ClaimWarrantyPart, ClaimWithParts, NewClaim, NewClaimPart,
};
use crate::error::ClaimError;
use crate::ports::{ClaimsPort, ClaimsUnitOfWork};

/// How claim approval is resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimApprovalMode {
    /// Pending / approved / rejected, like warranties
    #[default]
    TriState,
    /// Approved or not; a claim is approved only when every part is
    Boolean,
}

impl ClaimApprovalMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimApprovalMode::TriState => "tri_state",
            ClaimApprovalMode::Boolean => "boolean",
        }
    }
}

impl fmt::Display for ClaimApprovalMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClaimApprovalMode {
    type Err = ClaimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tri_state" | "tristate" => Ok(ClaimApprovalMode::TriState),
            "boolean" | "bool" => Ok(ClaimApprovalMode::Boolean),
            other => Err(ClaimError::validation(format!(
                "unknown claim approval mode '{other}'"
            ))),
        }
    }
}

async fn finish_read<T>(uow: Box<dyn ClaimsUnitOfWork>, value: T) -> Result<T, ClaimError> {
    uow.rollback().await?;
    Ok(value)
}

async fn load_composite(
    uow: &mut dyn ClaimsUnitOfWork,
    id: ClaimId,
) -> Result<ClaimWithParts, ClaimError> {
    let parent = uow.get_claim(id).await?;
    let children = uow.list_claim_parts(id).await?;
    Ok(ClaimWithParts { parent, children })
}

/// Every referenced warranty part must exist and belong to the claim's warranty
async fn check_warranty_parts(
    uow: &mut dyn ClaimsUnitOfWork,
    warranty: WarrantyId,
    parts: impl IntoIterator<Item = WarrantyPartId>,
) -> Result<(), ClaimError> {
    let mut checked = HashSet::new();
    for part in parts {
        if !checked.insert(part) {
            continue;
        }
        let found = uow.get_warranty_part(part).await?;
        if found.warranty_id != warranty {
            return Err(ClaimError::ForeignWarrantyPart {
                part: part.to_string(),
                warranty: warranty.to_string(),
            });
        }
    }
    Ok(())
}

/// Claims against warranties
pub struct ClaimService {
    port: Arc<dyn ClaimsPort>,
    mode: ClaimApprovalMode,
}

impl ClaimService {
    pub fn new(port: Arc<dyn ClaimsPort>, mode: ClaimApprovalMode) -> Self {
        Self { port, mode }
    }

    pub fn approval_mode(&self) -> ClaimApprovalMode {
        self.mode
    }

    #[instrument(skip(self))]
    pub async fn list_claims(&self) -> Result<Vec<Claim>, ClaimError> {
        let mut uow = self.port.begin().await?;
        let claims = uow.list_claims().await?;
        finish_read(uow, claims).await
    }

    #[instrument(skip(self), fields(shop_id = %shop))]
    pub async fn list_by_shop(&self, shop: ShopId) -> Result<Vec<Claim>, ClaimError> {
        let mut uow = self.port.begin().await?;
        let claims = uow.list_claims_by_shop(shop).await?;
        finish_read(uow, claims).await
    }

    #[instrument(skip(self), fields(claim_id = %id))]
    pub async fn get_claim(&self, id: ClaimId) -> Result<ClaimWithParts, ClaimError> {
        let mut uow = self.port.begin().await?;
        let composite = load_composite(&mut *uow, id).await?;
        finish_read(uow, composite).await
    }

    #[instrument(skip(self), fields(claim_id = %id))]
    pub async fn list_parts(&self, id: ClaimId) -> Result<Vec<ClaimWarrantyPart>, ClaimError> {
        let mut uow = self.port.begin().await?;
        uow.get_claim(id).await?;
        let parts = uow.list_claim_parts(id).await?;
        finish_read(uow, parts).await
    }

    /// Returns the claim number the next claim on this warranty and date
    /// would receive
    #[instrument(skip(self))]
    pub async fn preview_claim_no(
        &self,
        warranty_no: &str,
        claim_date: NaiveDate,
    ) -> Result<String, ClaimError> {
        let warranty_no = warranty_no.trim().to_ascii_uppercase();
        if warranty_no.is_empty() {
            return Err(ClaimError::validation("warranty number is required"));
        }
        let prefix = claim_no_prefix(claim_date, &warranty_no);
        let mut uow = self.port.begin().await?;
        let code = preview_code(&mut *uow, CodeSequence::ClaimNo, &prefix).await?;
        finish_read(uow, code).await
    }

    /// Files a claim and all of its parts atomically
    ///
    /// Each part must reference a part of the claimed warranty. Without a
    /// claim number in the request, the next number for the warranty and
    /// claim date is reserved in the same unit of work.
    #[instrument(skip(self, claim, parts), fields(warranty_id = %claim.warranty_id, parts = parts.len()))]
    pub async fn create_claim(
        &self,
        mut claim: NewClaim,
        parts: Vec<NewClaimPart>,
    ) -> Result<ClaimWithParts, ClaimError> {
        claim.validate(&parts)?;

        let mut uow = self.port.begin().await?;
        let warranty = uow.get_warranty(claim.warranty_id).await?;
        check_warranty_parts(
            &mut *uow,
            warranty.id,
            parts.iter().map(|p| p.warranty_part_id).collect::<Vec<_>>(),
        )
        .await?;

        let claim_no = match claim.claim_no.take() {
            Some(no) => no.trim().to_ascii_uppercase(),
            None => {
                let prefix = claim_no_prefix(claim.claim_date, &warranty.warranty_no);
                reserve_code(&mut *uow, CodeSequence::ClaimNo, &prefix).await?
            }
        };
        claim.claim_no = Some(claim_no);

        let composite =
            create_with_children(&mut ClaimComposite::new(&mut *uow), claim, parts).await?;

        uow.commit().await?;
        info!(
            claim_id = %composite.parent.id,
            claim_no = %composite.parent.claim_no,
            "claim filed"
        );
        Ok(composite)
    }

    /// Updates a claim and reconciles its parts against the payload
    ///
    /// Both status axes are re-derived from the surviving parts.
    #[instrument(skip(self, change, parts), fields(claim_id = %id, parts = parts.len()))]
    pub async fn update_claim(
        &self,
        id: ClaimId,
        change: ClaimChange,
        parts: Vec<ClaimPartChange>,
    ) -> Result<ClaimWithParts, ClaimError> {
        for part in &parts {
            if part.damaged_image_url.trim().is_empty() {
                return Err(ClaimError::validation(
                    "damaged image is required for every part",
                ));
            }
        }

        let mut uow = self.port.begin().await?;
        let existing = uow.get_claim(id).await?;
        check_warranty_parts(
            &mut *uow,
            existing.warranty_id,
            parts.iter().map(|p| p.warranty_part_id).collect::<Vec<_>>(),
        )
        .await?;

        update_with_children(&mut ClaimComposite::new(&mut *uow), id, change, parts).await?;
        self.resync(&mut *uow, id).await?;
        let composite = load_composite(&mut *uow, id).await?;
        uow.commit().await?;
        Ok(composite)
    }

    /// Sets the claim's approval and copies it onto every part
    ///
    /// In boolean mode only `APPROVED` and `PENDING` are accepted.
    #[instrument(skip(self), fields(claim_id = %id, status = %status))]
    pub async fn set_approval(
        &self,
        id: ClaimId,
        status: ApprovalStatus,
    ) -> Result<ClaimWithParts, ClaimError> {
        self.check_mode(status)?;

        let mut uow = self.port.begin().await?;
        match self.mode {
            ClaimApprovalMode::TriState => {
                cascade_from_parent(&mut ClaimApprovalAxis::new(&mut *uow), id, status).await?;
            }
            ClaimApprovalMode::Boolean => {
                let approved = BinaryApproval::from_status(status);
                cascade_from_parent(&mut ClaimApprovalFlagAxis::new(&mut *uow), id, approved)
                    .await?;
            }
        }
        let composite = load_composite(&mut *uow, id).await?;
        uow.commit().await?;
        Ok(composite)
    }

    /// Sets one part's approval and re-derives the claim's
    #[instrument(skip(self), fields(part_id = %id, status = %status))]
    pub async fn set_part_approval(
        &self,
        id: ClaimPartId,
        status: ApprovalStatus,
    ) -> Result<ClaimWithParts, ClaimError> {
        self.check_mode(status)?;

        let mut uow = self.port.begin().await?;
        let claim = match self.mode {
            ClaimApprovalMode::TriState => {
                recompute_from_child(&mut ClaimApprovalAxis::new(&mut *uow), id, status)
                    .await?
                    .parent
            }
            ClaimApprovalMode::Boolean => {
                let approved = BinaryApproval::from_status(status);
                recompute_from_child(&mut ClaimApprovalFlagAxis::new(&mut *uow), id, approved)
                    .await?
                    .parent
            }
        };
        let composite = load_composite(&mut *uow, claim).await?;
        uow.commit().await?;
        Ok(composite)
    }

    /// Opens or closes the claim together with every part
    #[instrument(skip(self), fields(claim_id = %id, status = %status))]
    pub async fn set_status(
        &self,
        id: ClaimId,
        status: LifecycleStatus,
    ) -> Result<ClaimWithParts, ClaimError> {
        let mut uow = self.port.begin().await?;
        cascade_from_parent(&mut ClaimLifecycleAxis::new(&mut *uow), id, status).await?;
        let composite = load_composite(&mut *uow, id).await?;
        uow.commit().await?;
        Ok(composite)
    }

    /// Opens or closes one part and re-derives the claim's status
    #[instrument(skip(self), fields(part_id = %id, status = %status))]
    pub async fn set_part_status(
        &self,
        id: ClaimPartId,
        status: LifecycleStatus,
    ) -> Result<ClaimWithParts, ClaimError> {
        let mut uow = self.port.begin().await?;
        let update =
            recompute_from_child(&mut ClaimLifecycleAxis::new(&mut *uow), id, status).await?;
        let composite = load_composite(&mut *uow, update.parent).await?;
        uow.commit().await?;
        Ok(composite)
    }

    /// Adds one part to an existing claim
    #[instrument(skip(self, part), fields(claim_id = %claim))]
    pub async fn add_part(
        &self,
        claim: ClaimId,
        part: NewClaimPart,
    ) -> Result<ClaimWarrantyPart, ClaimError> {
        if part.damaged_image_url.trim().is_empty() {
            return Err(ClaimError::validation("damaged image is required"));
        }

        let mut uow = self.port.begin().await?;
        let existing = uow.get_claim(claim).await?;
        check_warranty_parts(&mut *uow, existing.warranty_id, [part.warranty_part_id]).await?;
        let created = uow.insert_claim_part(claim, part).await?;
        self.resync(&mut *uow, claim).await?;
        uow.commit().await?;
        Ok(created)
    }

    /// Replaces the fields of one part, keeping both of its statuses
    #[instrument(skip(self, change), fields(part_id = %id))]
    pub async fn update_part(
        &self,
        id: ClaimPartId,
        mut change: ClaimPartChange,
    ) -> Result<ClaimWarrantyPart, ClaimError> {
        change.id = Some(id);

        let mut uow = self.port.begin().await?;
        let existing = uow.get_claim_part(id).await?;
        let claim = uow.get_claim(existing.claim_id).await?;
        check_warranty_parts(&mut *uow, claim.warranty_id, [change.warranty_part_id]).await?;
        let updated = uow.update_claim_part(claim.id, id, change).await?;
        uow.commit().await?;
        Ok(updated)
    }

    fn check_mode(&self, status: ApprovalStatus) -> Result<(), ClaimError> {
        if self.mode == ClaimApprovalMode::Boolean && status == ApprovalStatus::Rejected {
            return Err(ClaimError::validation(
                "claims are approved or not approved; REJECTED is not accepted",
            ));
        }
        Ok(())
    }

    /// Re-derives both status axes after parts were added or removed
    async fn resync(&self, uow: &mut dyn ClaimsUnitOfWork, id: ClaimId) -> Result<(), ClaimError> {
        match self.mode {
            ClaimApprovalMode::TriState => {
                resync_parent(&mut ClaimApprovalAxis::new(&mut *uow), id).await?;
            }
            ClaimApprovalMode::Boolean => {
                resync_parent(&mut ClaimApprovalFlagAxis::new(&mut *uow), id).await?;
            }
        }
        resync_parent(&mut ClaimLifecycleAxis::new(&mut *uow), id).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_parsing() {
        assert_eq!("boolean".parse::<ClaimApprovalMode>().unwrap(), ClaimApprovalMode::Boolean);
        assert_eq!("TRI_STATE".parse::<ClaimApprovalMode>().unwrap(), ClaimApprovalMode::TriState);
        assert!("maybe".parse::<ClaimApprovalMode>().is_err());
    }

    #[test]
    fn test_mode_serde() {
        let json = serde_json::to_string(&ClaimApprovalMode::Boolean).unwrap();
        assert_eq!(json, "\"boolean\"");
        assert_eq!(ClaimApprovalMode::default(), ClaimApprovalMode::TriState);
    }
}
