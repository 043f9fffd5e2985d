//! Repository implementations for the warranty store
//!
//! Each repository is a set of associated functions over a borrowed
//! `PgConnection`, so the same SQL runs inside whichever transaction the
//! caller holds. Rows are decoded with `sqlx::FromRow` and converted into
//! domain types at the repository boundary.
//!
//! # Conventions
//!
//! - Lookups of a single row return `DatabaseError::NotFound` for a missing id
//! - Timestamps are written with `clock_timestamp()` so writes inside one
//!   transaction stay ordered
//! - Lists are ordered by id

pub mod claims;
pub mod products;
pub mod reference;
pub mod sequences;
pub mod shops;
pub mod types;
pub mod warranties;

pub use claims::{ClaimPartRepository, ClaimRepository};
pub use products::{ProductAllocationRepository, ProductRepository};
pub use reference::ReferenceRepository;
pub use sequences::SequenceRepository;
pub use shops::{ShopRepository, UserRepository};
pub use types::{DbApprovalStatus, DbClaimStatus, DbUserRole};
pub use warranties::{WarrantyPartRepository, WarrantyRepository};
