//! Claims Domain Ports
//!
//! A claims unit of work extends the warranty unit of work: filing a claim
//! reads the warranty and its parts, and both must be seen in the same
//! transaction that writes the claim.

use async_trait::async_trait;

use core_kernel::{
    ApprovalStatus, ClaimId, ClaimPartId, DomainPort, HealthCheckable, LifecycleStatus, PortError,
    ShopId,
};
use domain_warranty::WarrantyUnitOfWork;

use crate::claim::{Claim, ClaimChange, ClaimPartChange, ClaimWarrantyPart, NewClaim, NewClaimPart};

/// Entry point to the claims store
#[async_trait]
pub trait ClaimsPort: DomainPort + HealthCheckable {
    /// Opens a unit of work
    async fn begin(&self) -> Result<Box<dyn ClaimsUnitOfWork>, PortError>;
}

/// Transaction-scoped access to claims and claim parts
#[async_trait]
pub trait ClaimsUnitOfWork: WarrantyUnitOfWork {
    async fn list_claims(&mut self) -> Result<Vec<Claim>, PortError>;

    /// Claims filed under any warranty of the shop
    async fn list_claims_by_shop(&mut self, shop: ShopId) -> Result<Vec<Claim>, PortError>;

    async fn get_claim(&mut self, id: ClaimId) -> Result<Claim, PortError>;

    /// Inserts a claim; `claim.claim_no` must already be resolved
    async fn insert_claim(&mut self, claim: NewClaim) -> Result<Claim, PortError>;

    async fn update_claim(&mut self, id: ClaimId, change: ClaimChange) -> Result<Claim, PortError>;

    async fn set_claim_approval(
        &mut self,
        id: ClaimId,
        status: ApprovalStatus,
    ) -> Result<Claim, PortError>;

    async fn set_claim_status(
        &mut self,
        id: ClaimId,
        status: LifecycleStatus,
    ) -> Result<Claim, PortError>;

    async fn list_claim_parts(&mut self, claim: ClaimId)
        -> Result<Vec<ClaimWarrantyPart>, PortError>;

    async fn get_claim_part(&mut self, id: ClaimPartId) -> Result<ClaimWarrantyPart, PortError>;

    async fn insert_claim_part(
        &mut self,
        claim: ClaimId,
        part: NewClaimPart,
    ) -> Result<ClaimWarrantyPart, PortError>;

    /// Updates a part of `claim`; a part of another claim is NotFound
    async fn update_claim_part(
        &mut self,
        claim: ClaimId,
        id: ClaimPartId,
        change: ClaimPartChange,
    ) -> Result<ClaimWarrantyPart, PortError>;

    async fn set_claim_part_approval(
        &mut self,
        id: ClaimPartId,
        status: ApprovalStatus,
    ) -> Result<ClaimWarrantyPart, PortError>;

    async fn set_claim_part_status(
        &mut self,
        id: ClaimPartId,
        status: LifecycleStatus,
    ) -> Result<ClaimWarrantyPart, PortError>;

    async fn delete_claim_part(&mut self, id: ClaimPartId) -> Result<(), PortError>;
}
