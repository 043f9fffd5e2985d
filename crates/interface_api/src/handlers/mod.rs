//! Request handlers, one module per resource

pub mod auth;
pub mod claims;
pub mod health;
pub mod products;
pub mod shops;
pub mod uploads;
pub mod users;
pub mod warranties;
