//! Account administration bodies

use serde::Deserialize;
use validator::Validate;

use core_kernel::ShopId;
use domain_warranty::{NewAccount, UserRole};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub shop_id: Option<ShopId>,
    #[validate(length(min = 1))]
    pub username: String,
    pub role: UserRole,
    /// Strength is checked by the account service
    pub password: String,
}

impl From<CreateUserRequest> for NewAccount {
    fn from(req: CreateUserRequest) -> Self {
        NewAccount {
            shop_id: req.shop_id,
            username: req.username,
            role: req.role,
            password: req.password,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1))]
    pub current_password: String,
    pub new_password: String,
}
