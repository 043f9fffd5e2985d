//! Binds the generic aggregator and composite writer to claim rows
//!
//! A claim carries two independent status axes. Approval is resolved either
//! tri-state or as a plain approved flag, depending on the configured
//! [`crate::ClaimApprovalMode`]; the open/closed lifecycle always uses
//! [`OpenClosed`].

use async_trait::async_trait;

use core_kernel::{
    ApprovalStatus, BinaryApproval, ClaimId, ClaimPartId, CompositeStore, LifecycleStatus,
    OpenClosed, PortError, StatusHierarchy, TriStateApproval,
};

use crate::claim::{Claim, ClaimChange, ClaimPartChange, ClaimWarrantyPart, NewClaim, NewClaimPart};
use crate::ports::ClaimsUnitOfWork;

/// Tri-state approval on claim / claim part
pub struct ClaimApprovalAxis<'a> {
    uow: &'a mut dyn ClaimsUnitOfWork,
}

impl<'a> ClaimApprovalAxis<'a> {
    pub fn new(uow: &'a mut dyn ClaimsUnitOfWork) -> Self {
        Self { uow }
    }
}

#[async_trait]
impl<'a> StatusHierarchy for ClaimApprovalAxis<'a> {
    type Domain = TriStateApproval;
    type ParentId = ClaimId;
    type ChildId = ClaimPartId;

    async fn write_parent(&mut self, parent: ClaimId, status: ApprovalStatus) -> Result<(), PortError> {
        self.uow.set_claim_approval(parent, status).await?;
        Ok(())
    }

    async fn write_child(
        &mut self,
        child: ClaimPartId,
        status: ApprovalStatus,
    ) -> Result<ClaimId, PortError> {
        let part = self.uow.set_claim_part_approval(child, status).await?;
        Ok(part.claim_id)
    }

    async fn children(
        &mut self,
        parent: ClaimId,
    ) -> Result<Vec<(ClaimPartId, ApprovalStatus)>, PortError> {
        let parts = self.uow.list_claim_parts(parent).await?;
        Ok(parts.into_iter().map(|p| (p.id, p.approval_status)).collect())
    }
}

/// Approved flag on claim / claim part, stored in the same approval column
///
/// `false` is written as `PENDING`. A stored `REJECTED` reads as `false`.
pub struct ClaimApprovalFlagAxis<'a> {
    uow: &'a mut dyn ClaimsUnitOfWork,
}

impl<'a> ClaimApprovalFlagAxis<'a> {
    pub fn new(uow: &'a mut dyn ClaimsUnitOfWork) -> Self {
        Self { uow }
    }
}

#[async_trait]
impl<'a> StatusHierarchy for ClaimApprovalFlagAxis<'a> {
    type Domain = BinaryApproval;
    type ParentId = ClaimId;
    type ChildId = ClaimPartId;

    async fn write_parent(&mut self, parent: ClaimId, approved: bool) -> Result<(), PortError> {
        self.uow
            .set_claim_approval(parent, BinaryApproval::to_status(approved))
            .await?;
        Ok(())
    }

    async fn write_child(&mut self, child: ClaimPartId, approved: bool) -> Result<ClaimId, PortError> {
        let part = self
            .uow
            .set_claim_part_approval(child, BinaryApproval::to_status(approved))
            .await?;
        Ok(part.claim_id)
    }

    async fn children(&mut self, parent: ClaimId) -> Result<Vec<(ClaimPartId, bool)>, PortError> {
        let parts = self.uow.list_claim_parts(parent).await?;
        Ok(parts
            .into_iter()
            .map(|p| (p.id, BinaryApproval::from_status(p.approval_status)))
            .collect())
    }
}

/// Open/closed lifecycle on claim / claim part
pub struct ClaimLifecycleAxis<'a> {
    uow: &'a mut dyn ClaimsUnitOfWork,
}

impl<'a> ClaimLifecycleAxis<'a> {
    pub fn new(uow: &'a mut dyn ClaimsUnitOfWork) -> Self {
        Self { uow }
    }
}

#[async_trait]
impl<'a> StatusHierarchy for ClaimLifecycleAxis<'a> {
    type Domain = OpenClosed;
    type ParentId = ClaimId;
    type ChildId = ClaimPartId;

    async fn write_parent(&mut self, parent: ClaimId, status: LifecycleStatus) -> Result<(), PortError> {
        self.uow.set_claim_status(parent, status).await?;
        Ok(())
    }

    async fn write_child(
        &mut self,
        child: ClaimPartId,
        status: LifecycleStatus,
    ) -> Result<ClaimId, PortError> {
        let part = self.uow.set_claim_part_status(child, status).await?;
        Ok(part.claim_id)
    }

    async fn children(
        &mut self,
        parent: ClaimId,
    ) -> Result<Vec<(ClaimPartId, LifecycleStatus)>, PortError> {
        let parts = self.uow.list_claim_parts(parent).await?;
        Ok(parts.into_iter().map(|p| (p.id, p.status)).collect())
    }
}

/// Claim with its parts as one composite
pub struct ClaimComposite<'a> {
    uow: &'a mut dyn ClaimsUnitOfWork,
}

impl<'a> ClaimComposite<'a> {
    pub fn new(uow: &'a mut dyn ClaimsUnitOfWork) -> Self {
        Self { uow }
    }
}

#[async_trait]
impl<'a> CompositeStore for ClaimComposite<'a> {
    type ParentId = ClaimId;
    type Parent = Claim;
    type NewParent = NewClaim;
    type ParentChange = ClaimChange;
    type Child = ClaimWarrantyPart;
    type NewChild = NewClaimPart;
    type ChildChange = ClaimPartChange;

    fn parent_id(parent: &Claim) -> ClaimId {
        parent.id
    }

    async fn insert_parent(&mut self, parent: NewClaim) -> Result<Claim, PortError> {
        self.uow.insert_claim(parent).await
    }

    async fn insert_child(
        &mut self,
        parent: ClaimId,
        child: NewClaimPart,
    ) -> Result<ClaimWarrantyPart, PortError> {
        self.uow.insert_claim_part(parent, child).await
    }

    async fn update_parent(&mut self, parent: ClaimId, change: ClaimChange) -> Result<Claim, PortError> {
        self.uow.update_claim(parent, change).await
    }

    async fn upsert_child(
        &mut self,
        parent: ClaimId,
        change: ClaimPartChange,
    ) -> Result<ClaimWarrantyPart, PortError> {
        match change.id {
            Some(id) => self.uow.update_claim_part(parent, id, change).await,
            None => self.uow.insert_claim_part(parent, change.to_new()).await,
        }
    }

    async fn children(&mut self, parent: ClaimId) -> Result<Vec<ClaimWarrantyPart>, PortError> {
        self.uow.list_claim_parts(parent).await
    }

    async fn delete_child(&mut self, child: ClaimPartId) -> Result<(), PortError> {
        self.uow.delete_claim_part(child).await
    }
}
