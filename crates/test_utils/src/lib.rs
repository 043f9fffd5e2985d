//! Test Utilities Crate
//!
//! Shared test infrastructure for the warranty workspace.
//!
//! # Modules
//!
//! - `memory`: in-memory gateway implementing both domain ports, with fault injection
//! - `fixtures`: seeded reference data, request builders and seeding helpers
//! - `database`: PostgreSQL testcontainer management

pub mod database;
pub mod fixtures;
pub mod memory;

pub use database::*;
pub use fixtures::*;
pub use memory::{MemoryGateway, MemoryUnitOfWork, WriteKind};
