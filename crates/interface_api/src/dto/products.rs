//! Product and stock allocation DTOs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use core_kernel::{ProductAllocationId, ProductId, ShopId};
use domain_warranty::numbering::parse_request_date;
use domain_warranty::{
    NewProduct, NewProductAllocation, Product, ProductAllocation, ProductChange, ShopProduct,
};

use crate::error::ApiError;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    pub brand: String,
    pub film_type: String,
    pub series: String,
    pub name: String,
    #[validate(range(min = 1))]
    pub warranty_in_months: i32,
    pub film_serial_number: String,
    #[validate(range(min = 0))]
    pub film_quantity: i32,
    pub shipment_number: String,
    #[serde(default)]
    pub description: String,
}

impl From<CreateProductRequest> for NewProduct {
    fn from(req: CreateProductRequest) -> Self {
        NewProduct {
            brand: req.brand,
            film_type: req.film_type,
            series: req.series,
            name: req.name,
            warranty_in_months: req.warranty_in_months,
            film_serial_number: req.film_serial_number,
            film_quantity: req.film_quantity,
            shipment_number: req.shipment_number,
            description: req.description,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    pub brand: String,
    pub film_type: String,
    pub series: String,
    pub name: String,
    #[validate(range(min = 1))]
    pub warranty_in_months: i32,
    pub film_serial_number: String,
    #[validate(range(min = 0))]
    pub film_quantity: i32,
    pub shipment_number: String,
    #[serde(default)]
    pub description: String,
    pub is_active: bool,
}

impl From<UpdateProductRequest> for ProductChange {
    fn from(req: UpdateProductRequest) -> Self {
        ProductChange {
            brand: req.brand,
            film_type: req.film_type,
            series: req.series,
            name: req.name,
            warranty_in_months: req.warranty_in_months,
            film_serial_number: req.film_serial_number,
            film_quantity: req.film_quantity,
            shipment_number: req.shipment_number,
            description: req.description,
            is_active: req.is_active,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    pub id: ProductId,
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
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Product> for ProductResponse {
    fn from(product: Product) -> Self {
        Self {
            id: product.id,
            brand: product.brand,
            film_type: product.film_type,
            series: product.series,
            name: product.name,
            warranty_in_months: product.warranty_in_months,
            film_serial_number: product.film_serial_number,
            film_quantity: product.film_quantity,
            shipment_number: product.shipment_number,
            description: product.description,
            is_active: product.is_active,
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}

/// Body of both allocation create and replace
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AllocationRequest {
    pub product_id: ProductId,
    pub shop_id: ShopId,
    #[validate(range(min = 1))]
    pub film_quantity: i32,
    pub allocation_date: String,
}

impl AllocationRequest {
    pub fn into_domain(self) -> Result<NewProductAllocation, ApiError> {
        Ok(NewProductAllocation {
            product_id: self.product_id,
            shop_id: self.shop_id,
            film_quantity: self.film_quantity,
            allocation_date: parse_request_date(&self.allocation_date)?,
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationResponse {
    pub id: ProductAllocationId,
    pub product_id: ProductId,
    pub shop_id: ShopId,
    pub film_quantity: i32,
    pub allocation_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProductAllocation> for AllocationResponse {
    fn from(allocation: ProductAllocation) -> Self {
        Self {
            id: allocation.id,
            product_id: allocation.product_id,
            shop_id: allocation.shop_id,
            film_quantity: allocation.film_quantity,
            allocation_date: allocation.allocation_date,
            created_at: allocation.created_at,
            updated_at: allocation.updated_at,
        }
    }
}

/// One entry of a shop's product list; `id` is the allocation to quote on
/// warranty parts
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopProductResponse {
    pub id: ProductAllocationId,
    pub shop_id: ShopId,
    pub product_id: ProductId,
    pub brand: String,
    pub film_type: String,
    pub series: String,
    pub name: String,
    pub warranty_in_months: i32,
    pub film_serial_number: String,
    pub film_quantity: i32,
    pub allocation_date: NaiveDate,
}

impl From<ShopProduct> for ShopProductResponse {
    fn from(product: ShopProduct) -> Self {
        Self {
            id: product.allocation_id,
            shop_id: product.shop_id,
            product_id: product.product_id,
            brand: product.brand,
            film_type: product.film_type,
            series: product.series,
            name: product.name,
            warranty_in_months: product.warranty_in_months,
            film_serial_number: product.film_serial_number,
            film_quantity: product.allocated_quantity,
            allocation_date: product.allocation_date,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocation_accepts_compact_date() {
        let req: AllocationRequest = serde_json::from_str(
            r#"{"productId": 1, "shopId": 2, "filmQuantity": 5, "allocationDate": "241101"}"#,
        )
        .unwrap();
        let allocation = req.into_domain().unwrap();
        assert_eq!(
            allocation.allocation_date,
            NaiveDate::from_ymd_opt(2024, 11, 1).unwrap()
        );
        assert_eq!(allocation.shop_id, ShopId::new(2));
    }

    #[test]
    fn test_allocation_rejects_bad_date() {
        let req: AllocationRequest = serde_json::from_str(
            r#"{"productId": 1, "shopId": 2, "filmQuantity": 5, "allocationDate": "soon"}"#,
        )
        .unwrap();
        assert!(matches!(req.into_domain(), Err(ApiError::BadRequest(_))));
    }
}
