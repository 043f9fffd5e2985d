//! Infrastructure Database Layer
//!
//! PostgreSQL persistence for the film warranty backend, built on SQLx.
//!
//! # Architecture
//!
//! - [`repositories`] hold the SQL, one associated function per statement,
//!   each taking the connection of the caller's transaction
//! - [`adapters`] implement `WarrantyPort` and `ClaimsPort` on a pool, one
//!   SQL transaction per unit of work
//! - [`pool`] builds the connection pool and applies migrations
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, run_migrations, DatabaseConfig, PgGateway};
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/warranty")).await?;
//! run_migrations(&pool).await?;
//! let gateway = PgGateway::new(pool);
//! ```

pub mod adapters;
pub mod error;
pub mod pool;
pub mod repositories;

pub use adapters::{PgGateway, PgUnitOfWork};
pub use error::DatabaseError;
pub use pool::{create_pool, run_migrations, DatabaseConfig, DatabasePool};
