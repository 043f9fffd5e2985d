//! Film product and stock allocation repositories

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgConnection;

use core_kernel::{ProductAllocationId, ProductId, ShopId};
use domain_warranty::{
    NewProduct, NewProductAllocation, Product, ProductAllocation, ProductChange, ShopProduct,
};

use crate::error::DatabaseError;

const PRODUCT_COLUMNS: &str = "id, brand, film_type, series, name, warranty_in_months, \
    film_serial_number, film_quantity, shipment_number, description, is_active, created_at, \
    updated_at";

const ALLOCATION_COLUMNS: &str =
    "id, product_id, shop_id, film_quantity, allocation_date, created_at, updated_at";

/// Repository for the film product catalogue
pub struct ProductRepository;

impl ProductRepository {
    pub async fn list(conn: &mut PgConnection) -> Result<Vec<Product>, DatabaseError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products ORDER BY id");
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .fetch_all(&mut *conn)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn get(conn: &mut PgConnection, id: ProductId) -> Result<Product, DatabaseError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1");
        sqlx::query_as::<_, ProductRow>(&sql)
            .bind(id.value())
            .fetch_optional(&mut *conn)
            .await?
            .map(Into::into)
            .ok_or_else(|| DatabaseError::not_found("Product", id))
    }

    /// # Errors
    ///
    /// * `DuplicateEntry` - the film serial number is already registered
    pub async fn insert(
        conn: &mut PgConnection,
        product: NewProduct,
    ) -> Result<Product, DatabaseError> {
        let sql = format!(
            "INSERT INTO products (brand, film_type, series, name, warranty_in_months, \
                film_serial_number, film_quantity, shipment_number, description, \
                created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, clock_timestamp(), clock_timestamp()) \
             RETURNING {PRODUCT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(product.brand)
            .bind(product.film_type)
            .bind(product.series)
            .bind(product.name)
            .bind(product.warranty_in_months)
            .bind(product.film_serial_number)
            .bind(product.film_quantity)
            .bind(product.shipment_number)
            .bind(product.description)
            .fetch_one(&mut *conn)
            .await?;
        Ok(row.into())
    }

    pub async fn update(
        conn: &mut PgConnection,
        id: ProductId,
        change: ProductChange,
    ) -> Result<Product, DatabaseError> {
        let sql = format!(
            "UPDATE products SET brand = $2, film_type = $3, series = $4, name = $5, \
                warranty_in_months = $6, film_serial_number = $7, film_quantity = $8, \
                shipment_number = $9, description = $10, is_active = $11, \
                updated_at = clock_timestamp() \
             WHERE id = $1 \
             RETURNING {PRODUCT_COLUMNS}"
        );
        sqlx::query_as::<_, ProductRow>(&sql)
            .bind(id.value())
            .bind(change.brand)
            .bind(change.film_type)
            .bind(change.series)
            .bind(change.name)
            .bind(change.warranty_in_months)
            .bind(change.film_serial_number)
            .bind(change.film_quantity)
            .bind(change.shipment_number)
            .bind(change.description)
            .bind(change.is_active)
            .fetch_optional(&mut *conn)
            .await?
            .map(Into::into)
            .ok_or_else(|| DatabaseError::not_found("Product", id))
    }
}

/// Repository for stock handed to shops
pub struct ProductAllocationRepository;

impl ProductAllocationRepository {
    pub async fn list(conn: &mut PgConnection) -> Result<Vec<ProductAllocation>, DatabaseError> {
        let sql = format!("SELECT {ALLOCATION_COLUMNS} FROM product_allocations ORDER BY id");
        let rows = sqlx::query_as::<_, AllocationRow>(&sql)
            .fetch_all(&mut *conn)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn get(
        conn: &mut PgConnection,
        id: ProductAllocationId,
    ) -> Result<ProductAllocation, DatabaseError> {
        let sql = format!("SELECT {ALLOCATION_COLUMNS} FROM product_allocations WHERE id = $1");
        sqlx::query_as::<_, AllocationRow>(&sql)
            .bind(id.value())
            .fetch_optional(&mut *conn)
            .await?
            .map(Into::into)
            .ok_or_else(|| DatabaseError::not_found("ProductAllocation", id))
    }

    /// # Errors
    ///
    /// * `ForeignKeyViolation` - the product or shop does not exist
    pub async fn insert(
        conn: &mut PgConnection,
        allocation: NewProductAllocation,
    ) -> Result<ProductAllocation, DatabaseError> {
        let sql = format!(
            "INSERT INTO product_allocations (product_id, shop_id, film_quantity, \
                allocation_date, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, clock_timestamp(), clock_timestamp()) \
             RETURNING {ALLOCATION_COLUMNS}"
        );
        let row = sqlx::query_as::<_, AllocationRow>(&sql)
            .bind(allocation.product_id.value())
            .bind(allocation.shop_id.value())
            .bind(allocation.film_quantity)
            .bind(allocation.allocation_date)
            .fetch_one(&mut *conn)
            .await?;
        Ok(row.into())
    }

    pub async fn update(
        conn: &mut PgConnection,
        id: ProductAllocationId,
        change: NewProductAllocation,
    ) -> Result<ProductAllocation, DatabaseError> {
        let sql = format!(
            "UPDATE product_allocations SET product_id = $2, shop_id = $3, \
                film_quantity = $4, allocation_date = $5, updated_at = clock_timestamp() \
             WHERE id = $1 \
             RETURNING {ALLOCATION_COLUMNS}"
        );
        sqlx::query_as::<_, AllocationRow>(&sql)
            .bind(id.value())
            .bind(change.product_id.value())
            .bind(change.shop_id.value())
            .bind(change.film_quantity)
            .bind(change.allocation_date)
            .fetch_optional(&mut *conn)
            .await?
            .map(Into::into)
            .ok_or_else(|| DatabaseError::not_found("ProductAllocation", id))
    }

    /// The shop's allocations joined with their products
    pub async fn list_by_shop(
        conn: &mut PgConnection,
        shop: ShopId,
    ) -> Result<Vec<ShopProduct>, DatabaseError> {
        let rows = sqlx::query_as::<_, ShopProductRow>(
            "SELECT a.id AS allocation_id, a.shop_id, p.id AS product_id, p.brand, p.film_type, \
                p.series, p.name, p.warranty_in_months, p.film_serial_number, \
                a.film_quantity AS allocated_quantity, a.allocation_date \
             FROM product_allocations a \
             JOIN products p ON p.id = a.product_id \
             WHERE a.shop_id = $1 \
             ORDER BY a.id",
        )
        .bind(shop.value())
        .fetch_all(&mut *conn)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}

/// Database row for a product
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRow {
    pub id: i32,
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

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Product {
            id: ProductId::new(row.id),
            brand: row.brand,
            film_type: row.film_type,
            series: row.series,
            name: row.name,
            warranty_in_months: row.warranty_in_months,
            film_serial_number: row.film_serial_number,
            film_quantity: row.film_quantity,
            shipment_number: row.shipment_number,
            description: row.description,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Database row for a stock allocation
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AllocationRow {
    pub id: i32,
    pub product_id: i32,
    pub shop_id: i32,
    pub film_quantity: i32,
    pub allocation_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<AllocationRow> for ProductAllocation {
    fn from(row: AllocationRow) -> Self {
        ProductAllocation {
            id: ProductAllocationId::new(row.id),
            product_id: ProductId::new(row.product_id),
            shop_id: ShopId::new(row.shop_id),
            film_quantity: row.film_quantity,
            allocation_date: row.allocation_date,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct ShopProductRow {
    allocation_id: i32,
    shop_id: i32,
    product_id: i32,
    brand: String,
    film_type: String,
    series: String,
    name: String,
    warranty_in_months: i32,
    film_serial_number: String,
    allocated_quantity: i32,
    allocation_date: NaiveDate,
}

impl From<ShopProductRow> for ShopProduct {
    fn from(row: ShopProductRow) -> Self {
        ShopProduct {
            allocation_id: ProductAllocationId::new(row.allocation_id),
            shop_id: ShopId::new(row.shop_id),
            product_id: ProductId::new(row.product_id),
            brand: row.brand,
            film_type: row.film_type,
            series: row.series,
            name: row.name,
            warranty_in_months: row.warranty_in_months,
            film_serial_number: row.film_serial_number,
            allocated_quantity: row.allocated_quantity,
            allocation_date: row.allocation_date,
        }
    }
}
