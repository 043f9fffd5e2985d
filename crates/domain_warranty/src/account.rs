//! Login accounts and Argon2id password hashing
//!
//! Hashes are stored in PHC string form so the algorithm parameters and salt
//! travel with the hash.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{ShopId, UserId};

use crate::error::WarrantyError;

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Head-office administrator, approves warranties and claims
    Admin,
    /// Shop login created alongside every shop
    ShopAdmin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::ShopAdmin => "shop_admin",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = WarrantyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(UserRole::Admin),
            "shop_admin" => Ok(UserRole::ShopAdmin),
            other => Err(WarrantyError::validation(format!("unknown role '{}'", other))),
        }
    }
}

/// A login account
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub id: UserId,
    /// Owning shop; `None` for head-office accounts
    pub shop_id: Option<ShopId>,
    pub username: String,
    pub role: UserRole,
    /// PHC-formatted Argon2id hash, never serialized to clients
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for a new account; the password is already hashed
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub shop_id: Option<ShopId>,
    pub username: String,
    pub role: UserRole,
    pub password_hash: String,
}

/// Shortest password accepted for a new account or a password change
pub const MIN_PASSWORD_LEN: usize = 8;

/// An account requested by an administrator, password still in plaintext
#[derive(Debug, Clone, PartialEq)]
pub struct NewAccount {
    pub shop_id: Option<ShopId>,
    pub username: String,
    pub role: UserRole,
    pub password: String,
}

impl NewAccount {
    /// Shop logins must name their shop; head-office accounts must not
    pub fn validate(&self) -> Result<(), WarrantyError> {
        if self.username.trim().is_empty() {
            return Err(WarrantyError::validation("username is required"));
        }
        check_password_strength(&self.password)?;
        match (self.role, self.shop_id) {
            (UserRole::ShopAdmin, None) => Err(WarrantyError::validation(
                "a shop login needs a shop",
            )),
            (UserRole::Admin, Some(_)) => Err(WarrantyError::validation(
                "an admin account cannot belong to a shop",
            )),
            _ => Ok(()),
        }
    }
}

pub fn check_password_strength(password: &str) -> Result<(), WarrantyError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(WarrantyError::validation(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

/// Hashes a plaintext password with Argon2id and a random salt
pub fn hash_password(password: &str) -> Result<String, WarrantyError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| WarrantyError::PasswordHash(e.to_string()))
}

/// Verifies a plaintext password against a stored PHC hash
///
/// Returns `Ok(false)` on mismatch and `Err` only for an unreadable hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, WarrantyError> {
    let parsed =
        PasswordHash::new(hash).map_err(|e| WarrantyError::PasswordHash(e.to_string()))?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(WarrantyError::PasswordHash(e.to_string())),
    }
}
