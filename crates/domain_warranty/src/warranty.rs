//! Warranty aggregate: a warranty and the film installed per car part

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use core_kernel::{
    ApprovalStatus, CarPartId, Composite, CompositeChild, ProductAllocationId, ShopId, WarrantyId,
    WarrantyPartId,
};

use crate::error::WarrantyError;

/// A car part film can be installed on (windscreen, side windows, sunroof)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarPart {
    pub id: CarPartId,
    pub name: String,
    /// Short code, e.g. `FWS`, `R1`, `Sunroof`
    pub code: String,
    pub description: Option<String>,
}

/// A registered warranty
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Warranty {
    /// Unique identifier
    pub id: WarrantyId,
    /// Installing shop
    pub shop_id: ShopId,
    /// Customer name
    pub client_name: String,
    /// Customer phone number
    pub client_contact: String,
    /// Customer email
    pub client_email: String,
    /// Vehicle make
    pub car_brand: String,
    /// Vehicle model
    pub car_model: String,
    /// Vehicle colour
    pub car_colour: String,
    /// Registration plate
    pub car_plate_no: String,
    /// Chassis (VIN) number
    pub car_chassis_no: String,
    /// Date the film was installed
    pub installation_date: NaiveDate,
    /// Shop's own reference
    pub reference_no: Option<String>,
    /// `BRANCHCODE-YYMMDDSEQ`
    pub warranty_no: String,
    /// Uploaded invoice
    pub invoice_attachment_url: String,
    /// Whether the warranty is in force
    pub is_active: bool,
    /// Aggregate of the parts' approval
    pub approval_status: ApprovalStatus,
    /// Created timestamp
    pub created_at: DateTime<Utc>,
    /// Updated timestamp
    pub updated_at: DateTime<Utc>,
}

/// Fields for registering a warranty
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewWarranty {
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
    /// Generated inside the creating transaction when absent
    pub warranty_no: Option<String>,
    pub invoice_attachment_url: String,
}

/// Replacement fields for an existing warranty; the number never changes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarrantyChange {
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
    pub invoice_attachment_url: String,
}

/// Film installed on one car part under a warranty
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarrantyPart {
    pub id: WarrantyPartId,
    pub warranty_id: WarrantyId,
    /// Stock the film roll was drawn from
    pub product_allocation_id: ProductAllocationId,
    pub car_part_id: CarPartId,
    pub installation_image_url: String,
    pub approval_status: ApprovalStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for a new warranty part; the warranty id is stamped by the writer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewWarrantyPart {
    pub product_allocation_id: ProductAllocationId,
    pub car_part_id: CarPartId,
    pub installation_image_url: String,
}

/// A part in an update payload; parts without an id are inserted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WarrantyPartChange {
    pub id: Option<WarrantyPartId>,
    pub product_allocation_id: ProductAllocationId,
    pub car_part_id: CarPartId,
    pub installation_image_url: String,
}

impl WarrantyPartChange {
    /// The insert equivalent of an unnamed change
    pub fn to_new(&self) -> NewWarrantyPart {
        NewWarrantyPart {
            product_allocation_id: self.product_allocation_id,
            car_part_id: self.car_part_id,
            installation_image_url: self.installation_image_url.clone(),
        }
    }
}

impl CompositeChild for WarrantyPart {
    type Id = WarrantyPartId;
    type Key = CarPartId;

    fn id(&self) -> WarrantyPartId {
        self.id
    }

    fn natural_key(&self) -> CarPartId {
        self.car_part_id
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }
}

/// A warranty together with its parts
pub type WarrantyWithParts = Composite<Warranty, WarrantyPart>;

fn require(value: &str, field: &str) -> Result<(), WarrantyError> {
    if value.trim().is_empty() {
        return Err(WarrantyError::validation(format!("{} is required", field)));
    }
    Ok(())
}

fn validate_customer(
    client_name: &str,
    client_contact: &str,
    client_email: &str,
    car_plate_no: &str,
    car_chassis_no: &str,
) -> Result<(), WarrantyError> {
    require(client_name, "client name")?;
    require(client_contact, "client contact")?;
    require(client_email, "client email")?;
    if !client_email.contains('@') {
        return Err(WarrantyError::validation("client email must be an email address"));
    }
    require(car_plate_no, "car plate number")?;
    require(car_chassis_no, "car chassis number")
}

/// Rejects a part list that names the same car part twice
fn reject_repeated_car_parts<'a>(
    car_parts: impl Iterator<Item = &'a CarPartId>,
) -> Result<(), WarrantyError> {
    let mut seen = HashSet::new();
    for car_part in car_parts {
        if !seen.insert(*car_part) {
            return Err(WarrantyError::validation(format!(
                "car part {} appears more than once",
                car_part
            )));
        }
    }
    Ok(())
}

impl NewWarranty {
    pub fn validate(&self, parts: &[NewWarrantyPart]) -> Result<(), WarrantyError> {
        validate_customer(
            &self.client_name,
            &self.client_contact,
            &self.client_email,
            &self.car_plate_no,
            &self.car_chassis_no,
        )?;
        if let Some(no) = &self.warranty_no {
            require(no, "warranty number")?;
        }
        reject_repeated_car_parts(parts.iter().map(|p| &p.car_part_id))
    }
}

impl WarrantyChange {
    /// Repeated car parts are allowed here; the update collapses them
    pub fn validate(&self) -> Result<(), WarrantyError> {
        validate_customer(
            &self.client_name,
            &self.client_contact,
            &self.client_email,
            &self.car_plate_no,
            &self.car_chassis_no,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_warranty() -> NewWarranty {
        NewWarranty {
            shop_id: ShopId::new(1),
            client_name: "Lim Wei".into(),
            client_contact: "012-3456789".into(),
            client_email: "lim@example.com".into(),
            car_brand: "Perodua".into(),
            car_model: "Myvi".into(),
            car_colour: "Red".into(),
            car_plate_no: "JQX 1234".into(),
            car_chassis_no: "PM2M600S00123456".into(),
            installation_date: NaiveDate::from_ymd_opt(2024, 11, 25).unwrap(),
            reference_no: None,
            warranty_no: None,
            invoice_attachment_url: String::new(),
        }
    }

    fn part(car_part: i32) -> NewWarrantyPart {
        NewWarrantyPart {
            product_allocation_id: ProductAllocationId::new(1),
            car_part_id: CarPartId::new(car_part),
            installation_image_url: String::new(),
        }
    }

    #[test]
    fn test_valid_warranty() {
        assert!(new_warranty().validate(&[part(1), part(2)]).is_ok());
    }

    #[test]
    fn test_repeated_car_part_rejected() {
        let err = new_warranty().validate(&[part(1), part(1)]).unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_blank_warranty_no_rejected() {
        let mut warranty = new_warranty();
        warranty.warranty_no = Some("  ".into());
        assert!(warranty.validate(&[]).is_err());
    }

    #[test]
    fn test_natural_key_is_car_part() {
        let now = Utc::now();
        let p = WarrantyPart {
            id: WarrantyPartId::new(3),
            warranty_id: WarrantyId::new(1),
            product_allocation_id: ProductAllocationId::new(1),
            car_part_id: CarPartId::new(7),
            installation_image_url: String::new(),
            approval_status: ApprovalStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(p.natural_key(), CarPartId::new(7));
        assert_eq!(CompositeChild::id(&p), WarrantyPartId::new(3));
    }
}
