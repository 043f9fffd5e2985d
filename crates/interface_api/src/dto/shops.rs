//! Shop DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use core_kernel::{ShopId, StateId};
use domain_warranty::{MalaysianState, NewShop, Shop, ShopChange};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateShopRequest {
    pub company_name: String,
    pub company_registration_number: String,
    #[serde(default)]
    pub company_license_image_url: String,
    pub company_contact_number: String,
    #[validate(email)]
    pub company_email: String,
    #[serde(default)]
    pub company_website_url: String,
    pub shop_name: String,
    pub shop_address: String,
    pub msia_state_id: Option<StateId>,
    /// Generated from the state when omitted
    pub branch_code: Option<String>,
    #[serde(default)]
    pub shop_image_url: String,
    pub pic_name: String,
    #[serde(default)]
    pub pic_position: String,
    pub pic_contact_number: String,
    #[validate(email)]
    pub pic_email: String,
}

impl From<CreateShopRequest> for NewShop {
    fn from(req: CreateShopRequest) -> Self {
        NewShop {
            company_name: req.company_name,
            company_registration_number: req.company_registration_number,
            company_license_image_url: req.company_license_image_url,
            company_contact_number: req.company_contact_number,
            company_email: req.company_email,
            company_website_url: req.company_website_url,
            shop_name: req.shop_name,
            shop_address: req.shop_address,
            msia_state_id: req.msia_state_id,
            branch_code: req.branch_code,
            shop_image_url: req.shop_image_url,
            pic_name: req.pic_name,
            pic_position: req.pic_position,
            pic_contact_number: req.pic_contact_number,
            pic_email: req.pic_email,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateShopRequest {
    pub company_name: String,
    pub company_registration_number: String,
    #[serde(default)]
    pub company_license_image_url: String,
    pub company_contact_number: String,
    #[validate(email)]
    pub company_email: String,
    #[serde(default)]
    pub company_website_url: String,
    pub shop_name: String,
    pub shop_address: String,
    pub msia_state_id: Option<StateId>,
    pub branch_code: String,
    #[serde(default)]
    pub shop_image_url: String,
    pub pic_name: String,
    #[serde(default)]
    pub pic_position: String,
    pub pic_contact_number: String,
    #[validate(email)]
    pub pic_email: String,
    pub is_active: bool,
}

impl From<UpdateShopRequest> for ShopChange {
    fn from(req: UpdateShopRequest) -> Self {
        ShopChange {
            company_name: req.company_name,
            company_registration_number: req.company_registration_number,
            company_license_image_url: req.company_license_image_url,
            company_contact_number: req.company_contact_number,
            company_email: req.company_email,
            company_website_url: req.company_website_url,
            shop_name: req.shop_name,
            shop_address: req.shop_address,
            msia_state_id: req.msia_state_id,
            branch_code: req.branch_code,
            shop_image_url: req.shop_image_url,
            pic_name: req.pic_name,
            pic_position: req.pic_position,
            pic_contact_number: req.pic_contact_number,
            pic_email: req.pic_email,
            is_active: req.is_active,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopResponse {
    pub id: ShopId,
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
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Shop> for ShopResponse {
    fn from(shop: Shop) -> Self {
        Self {
            id: shop.id,
            company_name: shop.company_name,
            company_registration_number: shop.company_registration_number,
            company_license_image_url: shop.company_license_image_url,
            company_contact_number: shop.company_contact_number,
            company_email: shop.company_email,
            company_website_url: shop.company_website_url,
            shop_name: shop.shop_name,
            shop_address: shop.shop_address,
            msia_state_id: shop.msia_state_id,
            branch_code: shop.branch_code,
            shop_image_url: shop.shop_image_url,
            pic_name: shop.pic_name,
            pic_position: shop.pic_position,
            pic_contact_number: shop.pic_contact_number,
            pic_email: shop.pic_email,
            is_active: shop.is_active,
            created_at: shop.created_at,
            updated_at: shop.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StateResponse {
    pub id: StateId,
    pub name: String,
    pub code: String,
}

impl From<MalaysianState> for StateResponse {
    fn from(state: MalaysianState) -> Self {
        Self {
            id: state.id,
            name: state.name,
            code: state.code,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchCodeResponse {
    pub branch_code: String,
}
