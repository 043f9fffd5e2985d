//! Object storage port for uploaded images and invoices
//!
//! The domain only ever stores the public URL returned by an upload.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::PortError;

use crate::error::WarrantyError;

/// Destination folder of an upload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadFolder {
    ShopImages,
    CompanyLicenses,
    InstallationImages,
    DamagedImages,
    ResolutionImages,
    Invoices,
    Other,
}

impl UploadFolder {
    pub const ALL: [UploadFolder; 7] = [
        UploadFolder::ShopImages,
        UploadFolder::CompanyLicenses,
        UploadFolder::InstallationImages,
        UploadFolder::DamagedImages,
        UploadFolder::ResolutionImages,
        UploadFolder::Invoices,
        UploadFolder::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UploadFolder::ShopImages => "shop_images",
            UploadFolder::CompanyLicenses => "company_licenses",
            UploadFolder::InstallationImages => "installation_images",
            UploadFolder::DamagedImages => "damaged_images",
            UploadFolder::ResolutionImages => "resolution_images",
            UploadFolder::Invoices => "invoices",
            UploadFolder::Other => "other",
        }
    }
}

impl fmt::Display for UploadFolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UploadFolder {
    type Err = WarrantyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UploadFolder::ALL
            .into_iter()
            .find(|folder| folder.as_str() == s)
            .ok_or_else(|| WarrantyError::validation(format!("unknown upload folder '{}'", s)))
    }
}

/// Reduces a client-supplied filename to a safe object name
///
/// Path separators and anything outside `[A-Za-z0-9._-]` become `_`; leading
/// dots are stripped so the name can never climb out of its folder.
pub fn sanitize_filename(name: &str) -> Result<String, WarrantyError> {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.').to_string();
    if cleaned.is_empty() || cleaned.chars().all(|c| c == '_') {
        return Err(WarrantyError::validation("filename is required"));
    }
    Ok(cleaned)
}

/// Stores bytes and returns a publicly reachable URL
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn upload(
        &self,
        folder: UploadFolder,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<String, PortError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folder_names() {
        assert_eq!("damaged_images".parse::<UploadFolder>().unwrap(), UploadFolder::DamagedImages);
        assert!("../etc".parse::<UploadFolder>().is_err());
        for folder in UploadFolder::ALL {
            assert_eq!(folder.as_str().parse::<UploadFolder>().unwrap(), folder);
        }
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("front view.jpg").unwrap(), "front_view.jpg");
        assert_eq!(sanitize_filename("../../passwd").unwrap(), "_.._passwd");
        assert!(sanitize_filename("..").is_err());
        assert!(sanitize_filename("/").is_err());
    }
}
