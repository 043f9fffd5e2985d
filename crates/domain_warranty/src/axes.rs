//! Binds the generic aggregator and composite writer to warranty rows

use async_trait::async_trait;

use core_kernel::{
    ApprovalStatus, CompositeStore, PortError, StatusHierarchy, TriStateApproval, WarrantyId,
    WarrantyPartId,
};

use crate::ports::WarrantyUnitOfWork;
use crate::warranty::{
    NewWarranty, NewWarrantyPart, Warranty, WarrantyChange, WarrantyPart, WarrantyPartChange,
};

/// Approval on warranty / warranty part
pub struct WarrantyApprovalAxis<'a> {
    uow: &'a mut dyn WarrantyUnitOfWork,
}

impl<'a> WarrantyApprovalAxis<'a> {
    pub fn new(uow: &'a mut dyn WarrantyUnitOfWork) -> Self {
        Self { uow }
    }
}

#[async_trait]
impl<'a> StatusHierarchy for WarrantyApprovalAxis<'a> {
    type Domain = TriStateApproval;
    type ParentId = WarrantyId;
    type ChildId = WarrantyPartId;

    async fn write_parent(
        &mut self,
        parent: WarrantyId,
        status: ApprovalStatus,
    ) -> Result<(), PortError> {
        self.uow.set_warranty_approval(parent, status).await?;
        Ok(())
    }

    async fn write_child(
        &mut self,
        child: WarrantyPartId,
        status: ApprovalStatus,
    ) -> Result<WarrantyId, PortError> {
        let part = self.uow.set_warranty_part_approval(child, status).await?;
        Ok(part.warranty_id)
    }

    async fn children(
        &mut self,
        parent: WarrantyId,
    ) -> Result<Vec<(WarrantyPartId, ApprovalStatus)>, PortError> {
        let parts = self.uow.list_warranty_parts(parent).await?;
        Ok(parts.into_iter().map(|p| (p.id, p.approval_status)).collect())
    }
}

/// Warranty with its parts as one composite
pub struct WarrantyComposite<'a> {
    uow: &'a mut dyn WarrantyUnitOfWork,
}

impl<'a> WarrantyComposite<'a> {
    pub fn new(uow: &'a mut dyn WarrantyUnitOfWork) -> Self {
        Self { uow }
    }
}

#[async_trait]
impl<'a> CompositeStore for WarrantyComposite<'a> {
    type ParentId = WarrantyId;
    type Parent = Warranty;
    type NewParent = NewWarranty;
    type ParentChange = WarrantyChange;
    type Child = WarrantyPart;
    type NewChild = NewWarrantyPart;
    type ChildChange = WarrantyPartChange;

    fn parent_id(parent: &Warranty) -> WarrantyId {
        parent.id
    }

    async fn insert_parent(&mut self, parent: NewWarranty) -> Result<Warranty, PortError> {
        self.uow.insert_warranty(parent).await
    }

    async fn insert_child(
        &mut self,
        parent: WarrantyId,
        child: NewWarrantyPart,
    ) -> Result<WarrantyPart, PortError> {
        self.uow.insert_warranty_part(parent, child).await
    }

    async fn update_parent(
        &mut self,
        parent: WarrantyId,
        change: WarrantyChange,
    ) -> Result<Warranty, PortError> {
        self.uow.update_warranty(parent, change).await
    }

    async fn upsert_child(
        &mut self,
        parent: WarrantyId,
        change: WarrantyPartChange,
    ) -> Result<WarrantyPart, PortError> {
        match change.id {
            Some(id) => self.uow.update_warranty_part(parent, id, change).await,
            None => self.uow.insert_warranty_part(parent, change.to_new()).await,
        }
    }

    async fn children(&mut self, parent: WarrantyId) -> Result<Vec<WarrantyPart>, PortError> {
        self.uow.list_warranty_parts(parent).await
    }

    async fn delete_child(&mut self, child: WarrantyPartId) -> Result<(), PortError> {
        self.uow.delete_warranty_part(child).await
    }
}
