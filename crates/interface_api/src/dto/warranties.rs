//! Warranty DTOs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use core_kernel::{ApprovalStatus, CarPartId, ProductAllocationId, ShopId, WarrantyId, WarrantyPartId};
use domain_warranty::numbering::parse_request_date;
use domain_warranty::{
    CarPart, NewWarranty, NewWarrantyPart, Warranty, WarrantyChange, WarrantyPart,
    WarrantyPartChange, WarrantyWithParts,
};

use crate::error::ApiError;

/// One part in a composite create or update
///
/// `id` is ignored on create; on update a part without an id is new.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WarrantyPartRequest {
    pub id: Option<WarrantyPartId>,
    pub product_allocation_id: ProductAllocationId,
    pub car_part_id: CarPartId,
    #[serde(default)]
    pub installation_image_url: String,
}

impl From<WarrantyPartRequest> for NewWarrantyPart {
    fn from(req: WarrantyPartRequest) -> Self {
        NewWarrantyPart {
            product_allocation_id: req.product_allocation_id,
            car_part_id: req.car_part_id,
            installation_image_url: req.installation_image_url,
        }
    }
}

impl From<WarrantyPartRequest> for WarrantyPartChange {
    fn from(req: WarrantyPartRequest) -> Self {
        WarrantyPartChange {
            id: req.id,
            product_allocation_id: req.product_allocation_id,
            car_part_id: req.car_part_id,
            installation_image_url: req.installation_image_url,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateWarrantyRequest {
    pub shop_id: ShopId,
    pub client_name: String,
    pub client_contact: String,
    #[validate(email)]
    pub client_email: String,
    pub car_brand: String,
    pub car_model: String,
    pub car_colour: String,
    pub car_plate_no: String,
    pub car_chassis_no: String,
    pub installation_date: String,
    pub reference_no: Option<String>,
    /// Generated from the shop's branch code and the date when omitted
    pub warranty_no: Option<String>,
    #[serde(default)]
    pub invoice_attachment_url: String,
    #[serde(default)]
    pub parts: Vec<WarrantyPartRequest>,
}

impl CreateWarrantyRequest {
    pub fn into_domain(self) -> Result<(NewWarranty, Vec<NewWarrantyPart>), ApiError> {
        let installation_date = parse_request_date(&self.installation_date)?;
        let warranty = NewWarranty {
            shop_id: self.shop_id,
            client_name: self.client_name,
            client_contact: self.client_contact,
            client_email: self.client_email,
            car_brand: self.car_brand,
            car_model: self.car_model,
            car_colour: self.car_colour,
            car_plate_no: self.car_plate_no,
            car_chassis_no: self.car_chassis_no,
            installation_date,
            reference_no: self.reference_no,
            warranty_no: self.warranty_no.filter(|no| !no.trim().is_empty()),
            invoice_attachment_url: self.invoice_attachment_url,
        };
        let parts = self.parts.into_iter().map(Into::into).collect();
        Ok((warranty, parts))
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateWarrantyRequest {
    pub client_name: String,
    pub client_contact: String,
    #[validate(email)]
    pub client_email: String,
    pub car_brand: String,
    pub car_model: String,
    pub car_colour: String,
    pub car_plate_no: String,
    pub car_chassis_no: String,
    pub installation_date: String,
    pub reference_no: Option<String>,
    #[serde(default)]
    pub invoice_attachment_url: String,
    #[serde(default)]
    pub parts: Vec<WarrantyPartRequest>,
}

impl UpdateWarrantyRequest {
    pub fn into_domain(self) -> Result<(WarrantyChange, Vec<WarrantyPartChange>), ApiError> {
        let installation_date = parse_request_date(&self.installation_date)?;
        let change = WarrantyChange {
            client_name: self.client_name,
            client_contact: self.client_contact,
            client_email: self.client_email,
            car_brand: self.car_brand,
            car_model: self.car_model,
            car_colour: self.car_colour,
            car_plate_no: self.car_plate_no,
            car_chassis_no: self.car_chassis_no,
            installation_date,
            reference_no: self.reference_no,
            invoice_attachment_url: self.invoice_attachment_url,
        };
        let parts = self.parts.into_iter().map(Into::into).collect();
        Ok((change, parts))
    }
}

/// Body of `POST /warranty-parts`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddWarrantyPartRequest {
    pub warranty_id: WarrantyId,
    #[serde(flatten)]
    pub part: WarrantyPartRequest,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WarrantyResponse {
    pub id: WarrantyId,
    pub shop_id: ShopId,
    pub client_name: String,
    pub client_contact: String,
    pub client_email: String,
    pub car_brand: String,
    pub car_model: String,
    pub car_colour: String,
    pub car_plate_no: String,
    pub car_chassis_no: String,
    pub installation_date: NaiveDate,
    pub reference_no: Option<String>,
    pub warranty_no: String,
    pub invoice_attachment_url: String,
    pub is_active: bool,
    pub approval_status: ApprovalStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Warranty> for WarrantyResponse {
    fn from(w: Warranty) -> Self {
        Self {
            id: w.id,
            shop_id: w.shop_id,
            client_name: w.client_name,
            client_contact: w.client_contact,
            client_email: w.client_email,
            car_brand: w.car_brand,
            car_model: w.car_model,
            car_colour: w.car_colour,
            car_plate_no: w.car_plate_no,
            car_chassis_no: w.car_chassis_no,
            installation_date: w.installation_date,
            reference_no: w.reference_no,
            warranty_no: w.warranty_no,
            invoice_attachment_url: w.invoice_attachment_url,
            is_active: w.is_active,
            approval_status: w.approval_status,
            created_at: w.created_at,
            updated_at: w.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WarrantyPartResponse {
    pub id: WarrantyPartId,
    pub warranty_id: WarrantyId,
    pub product_allocation_id: ProductAllocationId,
    pub car_part_id: CarPartId,
    pub installation_image_url: String,
    pub approval_status: ApprovalStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<WarrantyPart> for WarrantyPartResponse {
    fn from(p: WarrantyPart) -> Self {
        Self {
            id: p.id,
            warranty_id: p.warranty_id,
            product_allocation_id: p.product_allocation_id,
            car_part_id: p.car_part_id,
            installation_image_url: p.installation_image_url,
            approval_status: p.approval_status,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

/// A warranty with its parts embedded
#[derive(Debug, Serialize)]
pub struct WarrantyWithPartsResponse {
    #[serde(flatten)]
    pub warranty: WarrantyResponse,
    pub parts: Vec<WarrantyPartResponse>,
}

impl From<WarrantyWithParts> for WarrantyWithPartsResponse {
    fn from(composite: WarrantyWithParts) -> Self {
        Self {
            warranty: composite.parent.into(),
            parts: composite.children.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CarPartResponse {
    pub id: CarPartId,
    pub name: String,
    pub code: String,
    pub description: Option<String>,
}

impl From<CarPart> for CarPartResponse {
    fn from(part: CarPart) -> Self {
        Self {
            id: part.id,
            name: part.name,
            code: part.code,
            description: part.description,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WarrantyNoResponse {
    pub warranty_no: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_accepts_short_dates() {
        let req: CreateWarrantyRequest = serde_json::from_str(
            r#"{
                "shopId": 1, "clientName": "Tan", "clientContact": "0123",
                "clientEmail": "tan@example.com", "carBrand": "Perodua", "carModel": "Myvi",
                "carColour": "Red", "carPlateNo": "JQA 1", "carChassisNo": "PM2",
                "installationDate": "241125", "warrantyNo": " ",
                "parts": [{"productAllocationId": 1, "carPartId": 2}]
            }"#,
        )
        .unwrap();
        let (warranty, parts) = req.into_domain().unwrap();
        assert_eq!(warranty.installation_date, NaiveDate::from_ymd_opt(2024, 11, 25).unwrap());
        assert_eq!(warranty.warranty_no, None);
        assert_eq!(parts[0].car_part_id, CarPartId::new(2));
    }
}
