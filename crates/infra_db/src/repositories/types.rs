//! PostgreSQL enum types
//!
//! Each enum mirrors a `CREATE TYPE ... AS ENUM` of the schema and converts
//! to and from its domain counterpart.

use core_kernel::{ApprovalStatus, LifecycleStatus};
use domain_warranty::UserRole;

/// Approval status enumeration (`approval_status`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "approval_status", rename_all = "UPPERCASE")]
pub enum DbApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

impl From<ApprovalStatus> for DbApprovalStatus {
    fn from(status: ApprovalStatus) -> Self {
        match status {
            ApprovalStatus::Pending => DbApprovalStatus::Pending,
            ApprovalStatus::Approved => DbApprovalStatus::Approved,
            ApprovalStatus::Rejected => DbApprovalStatus::Rejected,
        }
    }
}

impl From<DbApprovalStatus> for ApprovalStatus {
    fn from(status: DbApprovalStatus) -> Self {
        match status {
            DbApprovalStatus::Pending => ApprovalStatus::Pending,
            DbApprovalStatus::Approved => ApprovalStatus::Approved,
            DbApprovalStatus::Rejected => ApprovalStatus::Rejected,
        }
    }
}

/// Claim lifecycle enumeration (`claim_status`), stored as `Open` / `Closed`
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "claim_status")]
pub enum DbClaimStatus {
    Open,
    Closed,
}

impl From<LifecycleStatus> for DbClaimStatus {
    fn from(status: LifecycleStatus) -> Self {
        match status {
            LifecycleStatus::Open => DbClaimStatus::Open,
            LifecycleStatus::Closed => DbClaimStatus::Closed,
        }
    }
}

impl From<DbClaimStatus> for LifecycleStatus {
    fn from(status: DbClaimStatus) -> Self {
        match status {
            DbClaimStatus::Open => LifecycleStatus::Open,
            DbClaimStatus::Closed => LifecycleStatus::Closed,
        }
    }
}

/// Account role enumeration (`user_role`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
pub enum DbUserRole {
    Admin,
    ShopAdmin,
}

impl From<UserRole> for DbUserRole {
    fn from(role: UserRole) -> Self {
        match role {
            UserRole::Admin => DbUserRole::Admin,
            UserRole::ShopAdmin => DbUserRole::ShopAdmin,
        }
    }
}

impl From<DbUserRole> for UserRole {
    fn from(role: DbUserRole) -> Self {
        match role {
            DbUserRole::Admin => UserRole::Admin,
            DbUserRole::ShopAdmin => UserRole::ShopAdmin,
        }
    }
}
