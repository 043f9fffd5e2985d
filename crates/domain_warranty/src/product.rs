//! Film products and the stock allocated to each shop
//!
//! Head office registers every shipped film roll as a [`Product`] and hands
//! quantities of it to shops as [`ProductAllocation`]s. A warranty part names
//! the allocation its film was cut from.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::{ProductAllocationId, ProductId, ShopId};

use crate::error::WarrantyError;

/// A film roll registered by head office
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    /// Film brand, e.g. "Profilm"
    pub brand: String,
    /// Film type, e.g. "Solar Film"
    pub film_type: String,
    pub series: String,
    pub name: String,
    /// Length of the warranty a part fitted with this film receives
    pub warranty_in_months: i32,
    /// Manufacturer serial printed on the roll
    pub film_serial_number: String,
    /// Quantity received in the shipment
    pub film_quantity: i32,
    pub shipment_number: String,
    pub description: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for registering a product
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewProduct {
    pub brand: String,
    pub film_type: String,
    pub series: String,
    pub name: String,
    pub warranty_in_months: i32,
    pub film_serial_number: String,
    pub film_quantity: i32,
    pub shipment_number: String,
    pub description: String,
}

/// Replacement fields for an existing product
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductChange {
    pub brand: String,
    pub film_type: String,
    pub series: String,
    pub name: String,
    pub warranty_in_months: i32,
    pub film_serial_number: String,
    pub film_quantity: i32,
    pub shipment_number: String,
    pub description: String,
    pub is_active: bool,
}

/// A quantity of one product handed to one shop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductAllocation {
    pub id: ProductAllocationId,
    pub product_id: ProductId,
    pub shop_id: ShopId,
    pub film_quantity: i32,
    pub allocation_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for allocating stock, also used to replace an allocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProductAllocation {
    pub product_id: ProductId,
    pub shop_id: ShopId,
    pub film_quantity: i32,
    pub allocation_date: NaiveDate,
}

/// A product as seen through one of a shop's allocations
///
/// This is what a shop picks from when it registers warranty parts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShopProduct {
    pub allocation_id: ProductAllocationId,
    pub shop_id: ShopId,
    pub product_id: ProductId,
    pub brand: String,
    pub film_type: String,
    pub series: String,
    pub name: String,
    pub warranty_in_months: i32,
    pub film_serial_number: String,
    /// Quantity handed to the shop, not the shipment total
    pub allocated_quantity: i32,
    pub allocation_date: NaiveDate,
}

impl ShopProduct {
    /// Joins an allocation with the product it draws from
    pub fn new(allocation: &ProductAllocation, product: &Product) -> Self {
        Self {
            allocation_id: allocation.id,
            shop_id: allocation.shop_id,
            product_id: product.id,
            brand: product.brand.clone(),
            film_type: product.film_type.clone(),
            series: product.series.clone(),
            name: product.name.clone(),
            warranty_in_months: product.warranty_in_months,
            film_serial_number: product.film_serial_number.clone(),
            allocated_quantity: allocation.film_quantity,
            allocation_date: allocation.allocation_date,
        }
    }
}

fn require(value: &str, field: &str) -> Result<(), WarrantyError> {
    if value.trim().is_empty() {
        return Err(WarrantyError::validation(format!("{} is required", field)));
    }
    Ok(())
}

impl NewProduct {
    pub fn validate(&self) -> Result<(), WarrantyError> {
        require(&self.brand, "brand")?;
        require(&self.film_type, "film type")?;
        require(&self.series, "series")?;
        require(&self.name, "product name")?;
        require(&self.film_serial_number, "film serial number")?;
        require(&self.shipment_number, "shipment number")?;
        if self.warranty_in_months <= 0 {
            return Err(WarrantyError::validation(
                "warranty period must be at least one month",
            ));
        }
        if self.film_quantity < 0 {
            return Err(WarrantyError::validation("film quantity cannot be negative"));
        }
        Ok(())
    }
}

impl ProductChange {
    /// Same rules as registration
    pub fn validate(&self) -> Result<(), WarrantyError> {
        NewProduct {
            brand: self.brand.clone(),
            film_type: self.film_type.clone(),
            series: self.series.clone(),
            name: self.name.clone(),
            warranty_in_months: self.warranty_in_months,
            film_serial_number: self.film_serial_number.clone(),
            film_quantity: self.film_quantity,
            shipment_number: self.shipment_number.clone(),
            description: String::new(),
        }
        .validate()
    }
}

impl NewProductAllocation {
    pub fn validate(&self) -> Result<(), WarrantyError> {
        if self.film_quantity <= 0 {
            return Err(WarrantyError::validation(
                "allocated film quantity must be positive",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_product() -> NewProduct {
        NewProduct {
            brand: "Profilm".into(),
            film_type: "Solar Film".into(),
            series: "Ceramic".into(),
            name: "CX70".into(),
            warranty_in_months: 60,
            film_serial_number: "CX70-2411-0001".into(),
            film_quantity: 30,
            shipment_number: "SHP-2411".into(),
            description: String::new(),
        }
    }

    #[test]
    fn test_valid_product() {
        assert!(new_product().validate().is_ok());
    }

    #[test]
    fn test_product_needs_warranty_period() {
        let mut product = new_product();
        product.warranty_in_months = 0;
        assert!(product.validate().is_err());
    }

    #[test]
    fn test_product_needs_serial_number() {
        let mut product = new_product();
        product.film_serial_number = " ".into();
        let err = product.validate().unwrap_err();
        assert!(err.to_string().contains("serial"));
    }

    #[test]
    fn test_allocation_quantity_must_be_positive() {
        let allocation = NewProductAllocation {
            product_id: ProductId::new(1),
            shop_id: ShopId::new(1),
            film_quantity: 0,
            allocation_date: NaiveDate::from_ymd_opt(2024, 11, 1).unwrap(),
        };
        assert!(allocation.validate().is_err());
    }
}
