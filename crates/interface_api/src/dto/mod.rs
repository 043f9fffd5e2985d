//! Request and response bodies
//!
//! JSON field names are camelCase. Request dates accept `YYYY-MM-DD` or
//! `YYMMDD`.

pub mod auth;
pub mod claims;
pub mod common;
pub mod products;
pub mod shops;
pub mod users;
pub mod warranties;
