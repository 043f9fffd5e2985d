//! Core Kernel - Foundational types for the film warranty system
//!
//! This crate provides the building blocks shared by the domain crates:
//! - Typed integer identifiers for every persisted entity
//! - Port error types and health-check traits for adapters
//! - Status domains and the generic parent/child status aggregator
//! - The composite writer for parent-with-children writes
//! - Sequential business code generation

pub mod aggregate;
pub mod composite;
pub mod error;
pub mod identifiers;
pub mod ports;
pub mod sequence;
pub mod status;

pub use aggregate::{
    cascade_from_parent, recompute_from_child, resync_parent, ChildUpdate, ParentResolution, StatusHierarchy,
};
pub use composite::{
    create_with_children, plan_child_sync, update_with_children, ChildSyncPlan, Composite,
    CompositeChild, CompositeStore,
};
pub use error::CoreError;
pub use identifiers::{
    CarPartId, ClaimId, ClaimPartId, ProductAllocationId, ProductId, ShopId, StateId, UserId,
    WarrantyId, WarrantyPartId,
};
pub use ports::{AdapterHealth, DomainPort, HealthCheckResult, HealthCheckable, PortError};
pub use sequence::{next_code, preview_code, reserve_code, CodeSequence, SequenceSource};
pub use status::{
    ApprovalStatus, BinaryApproval, LifecycleStatus, OpenClosed, StatusDomain, TriStateApproval,
};
