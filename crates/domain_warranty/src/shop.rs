//! Installer shops and the Malaysian states they are registered in

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{ShopId, StateId};

use crate::error::WarrantyError;

/// A Malaysian state or federal territory; its code prefixes branch codes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MalaysianState {
    pub id: StateId,
    /// Full name, e.g. "Johor"
    pub name: String,
    /// Two-letter code, e.g. "JH"
    pub code: String,
}

/// An installer shop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shop {
    /// Unique identifier
    pub id: ShopId,
    /// Registered company name
    pub company_name: String,
    /// Company registration (SSM) number
    pub company_registration_number: String,
    /// Uploaded company licence image
    pub company_license_image_url: String,
    /// Company phone number
    pub company_contact_number: String,
    /// Company email address
    pub company_email: String,
    /// Company website
    pub company_website_url: String,
    /// Trading name of the shop
    pub shop_name: String,
    /// Street address
    pub shop_address: String,
    /// State the shop is registered in
    pub msia_state_id: Option<StateId>,
    /// State-prefixed branch code, e.g. `JH01`
    pub branch_code: String,
    /// Uploaded shop front image
    pub shop_image_url: String,
    /// Person in charge
    pub pic_name: String,
    pub pic_position: String,
    pub pic_contact_number: String,
    pub pic_email: String,
    /// Inactive shops cannot log in
    pub is_active: bool,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

/// Fields for registering a shop
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewShop {
    pub company_name: String,
    pub company_registration_number: String,
    pub company_license_image_url: String,
    pub company_contact_number: String,
    pub company_email: String,
    pub company_website_url: String,
    pub shop_name: String,
    pub shop_address: String,
    pub msia_state_id: Option<StateId>,
    /// Generated from the state when absent
    pub branch_code: Option<String>,
    pub shop_image_url: String,
    pub pic_name: String,
    pub pic_position: String,
    pub pic_contact_number: String,
    pub pic_email: String,
}

/// Replacement fields for an existing shop
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShopChange {
    pub company_name: String,
    pub company_registration_number: String,
    pub company_license_image_url: String,
    pub company_contact_number: String,
    pub company_email: String,
    pub company_website_url: String,
    pub shop_name: String,
    pub shop_address: String,
    pub msia_state_id: Option<StateId>,
    pub branch_code: String,
    pub shop_image_url: String,
    pub pic_name: String,
    pub pic_position: String,
    pub pic_contact_number: String,
    pub pic_email: String,
    pub is_active: bool,
}

fn require(value: &str, field: &str) -> Result<(), WarrantyError> {
    if value.trim().is_empty() {
        return Err(WarrantyError::validation(format!("{} is required", field)));
    }
    Ok(())
}

fn require_email(value: &str, field: &str) -> Result<(), WarrantyError> {
    require(value, field)?;
    match value.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(WarrantyError::validation(format!(
            "{} must be an email address",
            field
        ))),
    }
}

impl NewShop {
    /// Checks required fields before any store call
    pub fn validate(&self) -> Result<(), WarrantyError> {
        require(&self.company_name, "company name")?;
        require(&self.company_registration_number, "company registration number")?;
        require(&self.company_contact_number, "company contact number")?;
        require_email(&self.company_email, "company email")?;
        require(&self.shop_name, "shop name")?;
        require(&self.shop_address, "shop address")?;
        require(&self.pic_name, "person in charge name")?;
        require(&self.pic_contact_number, "person in charge contact number")?;
        require_email(&self.pic_email, "person in charge email")?;
        if self.branch_code.is_none() && self.msia_state_id.is_none() {
            return Err(WarrantyError::validation(
                "either a branch code or a state is required",
            ));
        }
        Ok(())
    }
}

impl ShopChange {
    pub fn validate(&self) -> Result<(), WarrantyError> {
        require(&self.company_name, "company name")?;
        require(&self.company_registration_number, "company registration number")?;
        require(&self.company_contact_number, "company contact number")?;
        require_email(&self.company_email, "company email")?;
        require(&self.shop_name, "shop name")?;
        require(&self.shop_address, "shop address")?;
        require(&self.branch_code, "branch code")?;
        require(&self.pic_name, "person in charge name")?;
        require(&self.pic_contact_number, "person in charge contact number")?;
        require_email(&self.pic_email, "person in charge email")
    }
}

/// Username of the account created with a shop
pub fn shop_login_username(branch_code: &str) -> String {
    branch_code.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_shop() -> NewShop {
        NewShop {
            company_name: "Tint Works Sdn Bhd".into(),
            company_registration_number: "202301000123".into(),
            company_contact_number: "+60 7-555 1234".into(),
            company_email: "hello@tintworks.my".into(),
            shop_name: "Tint Works Johor Bahru".into(),
            shop_address: "12 Jalan Mutiara".into(),
            msia_state_id: Some(StateId::new(1)),
            pic_name: "Aina".into(),
            pic_contact_number: "+60 12-345 6789".into(),
            pic_email: "aina@tintworks.my".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_shop() {
        assert!(new_shop().validate().is_ok());
    }

    #[test]
    fn test_requires_state_or_branch_code() {
        let mut shop = new_shop();
        shop.msia_state_id = None;
        assert!(shop.validate().is_err());
        shop.branch_code = Some("JH03".into());
        assert!(shop.validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_email() {
        let mut shop = new_shop();
        shop.pic_email = "aina".into();
        assert!(matches!(shop.validate(), Err(WarrantyError::Validation(_))));
    }

    #[test]
    fn test_login_username_is_lowercase_branch_code() {
        assert_eq!(shop_login_username("JH01"), "jh01");
    }
}
