//! Bodies shared by several resources

use serde::{Deserialize, Serialize};

use core_kernel::{ApprovalStatus, LifecycleStatus};

use crate::error::ApiError;

/// Approval decision
///
/// Either `approvalStatus` (`PENDING` / `APPROVED` / `REJECTED`) or the flag
/// form `isApproved`, where `false` records the entity as pending.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalRequest {
    pub approval_status: Option<ApprovalStatus>,
    pub is_approved: Option<bool>,
}

impl ApprovalRequest {
    pub fn status(&self) -> Result<ApprovalStatus, ApiError> {
        match (self.approval_status, self.is_approved) {
            (Some(status), _) => Ok(status),
            (None, Some(true)) => Ok(ApprovalStatus::Approved),
            (None, Some(false)) => Ok(ApprovalStatus::Pending),
            (None, None) => Err(ApiError::BadRequest(
                "approvalStatus or isApproved is required".to_string(),
            )),
        }
    }
}

/// Open/closed decision
#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: LifecycleStatus,
}

/// `?q=` of the public search
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_approval_forms() {
        let tri: ApprovalRequest = serde_json::from_str(r#"{"approvalStatus":"REJECTED"}"#).unwrap();
        assert_eq!(tri.status().unwrap(), ApprovalStatus::Rejected);

        let flag: ApprovalRequest = serde_json::from_str(r#"{"isApproved":false}"#).unwrap();
        assert_eq!(flag.status().unwrap(), ApprovalStatus::Pending);

        let empty: ApprovalRequest = serde_json::from_str("{}").unwrap();
        assert!(empty.status().is_err());
    }
}
