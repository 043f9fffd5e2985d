//! Status domains for parent/child aggregation
//!
//! A status domain describes one axis on which a parent record mirrors its
//! children: the finite set of values, and how the parent's next value is
//! resolved from the full set of child values.
//!
//! | Domain | Values | Parent resolution |
//! |--------|--------|-------------------|
//! | [`TriStateApproval`] | PENDING / APPROVED / REJECTED | all approved, else all rejected, else pending |
//! | [`BinaryApproval`] | approved flag | all approved, else not approved |
//! | [`OpenClosed`] | Open / Closed | all closed, else open |
//!
//! Resolution over an empty child set always yields `None`: a parent without
//! children is never moved by its (nonexistent) children.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// A finite status enumeration with a parent-resolution rule
pub trait StatusDomain: Send + Sync + 'static {
    /// The stored value of the axis
    type Status: Copy + Eq + fmt::Debug + Send + Sync + 'static;

    /// Human-readable axis name, used in logs
    const NAME: &'static str;

    /// Resolves the parent's next value from every child's effective value
    ///
    /// Returns `None` when the parent must keep its current value.
    fn resolve_parent(children: &[Self::Status]) -> Option<Self::Status>;
}

/// Returns true when the set is non-empty and every entry equals `target`
pub fn all_equal<S: PartialEq>(statuses: &[S], target: &S) -> bool {
    !statuses.is_empty() && statuses.iter().all(|s| s == target)
}

/// Approval state of a warranty, claim, or one of their parts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalStatus {
    /// Awaiting review
    Pending,
    /// Accepted by an administrator
    Approved,
    /// Declined by an administrator
    Rejected,
}

impl ApprovalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalStatus::Pending => "PENDING",
            ApprovalStatus::Approved => "APPROVED",
            ApprovalStatus::Rejected => "REJECTED",
        }
    }

    pub fn is_approved(&self) -> bool {
        matches!(self, ApprovalStatus::Approved)
    }
}

impl Default for ApprovalStatus {
    fn default() -> Self {
        ApprovalStatus::Pending
    }
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApprovalStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(ApprovalStatus::Pending),
            "APPROVED" => Ok(ApprovalStatus::Approved),
            "REJECTED" => Ok(ApprovalStatus::Rejected),
            other => Err(CoreError::validation(format!(
                "unknown approval status '{}'",
                other
            ))),
        }
    }
}

/// Open/closed lifecycle of a claim and its parts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LifecycleStatus {
    Open,
    Closed,
}

impl LifecycleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleStatus::Open => "Open",
            LifecycleStatus::Closed => "Closed",
        }
    }

    pub fn from_open_flag(is_open: bool) -> Self {
        if is_open {
            LifecycleStatus::Open
        } else {
            LifecycleStatus::Closed
        }
    }
}

impl Default for LifecycleStatus {
    fn default() -> Self {
        LifecycleStatus::Open
    }
}

impl fmt::Display for LifecycleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LifecycleStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(LifecycleStatus::Open),
            "closed" => Ok(LifecycleStatus::Closed),
            other => Err(CoreError::validation(format!(
                "unknown claim status '{}'",
                other
            ))),
        }
    }
}

/// Three-valued approval used by warranties and (by default) claims
#[derive(Debug, Clone, Copy, Default)]
pub struct TriStateApproval;

impl StatusDomain for TriStateApproval {
    type Status = ApprovalStatus;

    const NAME: &'static str = "approval";

    fn resolve_parent(children: &[ApprovalStatus]) -> Option<ApprovalStatus> {
        if children.is_empty() {
            return None;
        }
        if all_equal(children, &ApprovalStatus::Approved) {
            Some(ApprovalStatus::Approved)
        } else if all_equal(children, &ApprovalStatus::Rejected) {
            Some(ApprovalStatus::Rejected)
        } else {
            Some(ApprovalStatus::Pending)
        }
    }
}

/// Two-valued approval flag: the parent is approved only if all children are
#[derive(Debug, Clone, Copy, Default)]
pub struct BinaryApproval;

impl StatusDomain for BinaryApproval {
    type Status = bool;

    const NAME: &'static str = "approval_flag";

    fn resolve_parent(children: &[bool]) -> Option<bool> {
        if children.is_empty() {
            return None;
        }
        Some(all_equal(children, &true))
    }
}

impl BinaryApproval {
    /// Projects a stored approval status onto the flag
    pub fn from_status(status: ApprovalStatus) -> bool {
        status.is_approved()
    }

    /// Stores the flag as an approval status; "not approved" is pending
    pub fn to_status(flag: bool) -> ApprovalStatus {
        if flag {
            ApprovalStatus::Approved
        } else {
            ApprovalStatus::Pending
        }
    }
}

/// Open/closed lifecycle: any open child keeps the parent open
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenClosed;

impl StatusDomain for OpenClosed {
    type Status = LifecycleStatus;

    const NAME: &'static str = "lifecycle";

    fn resolve_parent(children: &[LifecycleStatus]) -> Option<LifecycleStatus> {
        if children.is_empty() {
            return None;
        }
        if all_equal(children, &LifecycleStatus::Closed) {
            Some(LifecycleStatus::Closed)
        } else {
            Some(LifecycleStatus::Open)
        }
    }
}
