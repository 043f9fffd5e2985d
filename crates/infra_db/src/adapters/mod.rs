//! Domain Adapters
//!
//! Connects the domain port traits to the PostgreSQL repositories.

pub mod gateway;

pub use gateway::{PgGateway, PgUnitOfWork};
