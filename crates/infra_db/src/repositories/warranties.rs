//! Warranty and warranty part repositories

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgConnection;

use core_kernel::{
    ApprovalStatus, CarPartId, ProductAllocationId, ShopId, WarrantyId, WarrantyPartId,
};
use domain_warranty::{
    NewWarranty, NewWarrantyPart, Warranty, WarrantyChange, WarrantyPart, WarrantyPartChange,
};

use crate::error::DatabaseError;
use crate::repositories::types::DbApprovalStatus;

const WARRANTY_COLUMNS: &str = "id, shop_id, client_name, client_contact, client_email, \
    car_brand, car_model, car_colour, car_plate_no, car_chassis_no, installation_date, \
    reference_no, warranty_no, invoice_attachment_url, is_active, approval_status, \
    created_at, updated_at";

const PART_COLUMNS: &str = "id, warranty_id, product_allocation_id, car_part_id, \
    installation_image_url, approval_status, created_at, updated_at";

/// Repository for warranty registrations
pub struct WarrantyRepository;

impl WarrantyRepository {
    pub async fn list(conn: &mut PgConnection) -> Result<Vec<Warranty>, DatabaseError> {
        let sql = format!("SELECT {WARRANTY_COLUMNS} FROM warranties ORDER BY id");
        let rows = sqlx::query_as::<_, WarrantyRow>(&sql)
            .fetch_all(&mut *conn)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn list_by_shop(
        conn: &mut PgConnection,
        shop: ShopId,
    ) -> Result<Vec<Warranty>, DatabaseError> {
        let sql = format!("SELECT {WARRANTY_COLUMNS} FROM warranties WHERE shop_id = $1 ORDER BY id");
        let rows = sqlx::query_as::<_, WarrantyRow>(&sql)
            .bind(shop.value())
            .fetch_all(&mut *conn)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn get(conn: &mut PgConnection, id: WarrantyId) -> Result<Warranty, DatabaseError> {
        let sql = format!("SELECT {WARRANTY_COLUMNS} FROM warranties WHERE id = $1");
        sqlx::query_as::<_, WarrantyRow>(&sql)
            .bind(id.value())
            .fetch_optional(&mut *conn)
            .await?
            .map(Into::into)
            .ok_or_else(|| DatabaseError::not_found("Warranty", id))
    }

    /// Exact, case-insensitive match on warranty number or car plate number
    pub async fn search(
        conn: &mut PgConnection,
        term: &str,
    ) -> Result<Vec<Warranty>, DatabaseError> {
        let sql = format!(
            "SELECT {WARRANTY_COLUMNS} FROM warranties \
             WHERE upper(warranty_no) = upper($1) OR upper(car_plate_no) = upper($1) \
             ORDER BY id"
        );
        let rows = sqlx::query_as::<_, WarrantyRow>(&sql)
            .bind(term)
            .fetch_all(&mut *conn)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Inserts a warranty whose number has already been resolved
    pub async fn insert(
        conn: &mut PgConnection,
        warranty: NewWarranty,
    ) -> Result<Warranty, DatabaseError> {
        let warranty_no = warranty.warranty_no.ok_or_else(|| {
            DatabaseError::ConstraintViolation("warranty number is required".to_string())
        })?;

        let sql = format!(
            "INSERT INTO warranties (shop_id, client_name, client_contact, client_email, \
                car_brand, car_model, car_colour, car_plate_no, car_chassis_no, \
                installation_date, reference_no, warranty_no, invoice_attachment_url, \
                created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, \
                clock_timestamp(), clock_timestamp()) \
             RETURNING {WARRANTY_COLUMNS}"
        );
        let row = sqlx::query_as::<_, WarrantyRow>(&sql)
            .bind(warranty.shop_id.value())
            .bind(warranty.client_name)
            .bind(warranty.client_contact)
            .bind(warranty.client_email)
            .bind(warranty.car_brand)
            .bind(warranty.car_model)
            .bind(warranty.car_colour)
            .bind(warranty.car_plate_no)
            .bind(warranty.car_chassis_no)
            .bind(warranty.installation_date)
            .bind(warranty.reference_no)
            .bind(warranty_no)
            .bind(warranty.invoice_attachment_url)
            .fetch_one(&mut *conn)
            .await?;
        Ok(row.into())
    }

    pub async fn update(
        conn: &mut PgConnection,
        id: WarrantyId,
        change: WarrantyChange,
    ) -> Result<Warranty, DatabaseError> {
        let sql = format!(
            "UPDATE warranties SET client_name = $2, client_contact = $3, client_email = $4, \
                car_brand = $5, car_model = $6, car_colour = $7, car_plate_no = $8, \
                car_chassis_no = $9, installation_date = $10, reference_no = $11, \
                invoice_attachment_url = $12, updated_at = clock_timestamp() \
             WHERE id = $1 \
             RETURNING {WARRANTY_COLUMNS}"
        );
        sqlx::query_as::<_, WarrantyRow>(&sql)
            .bind(id.value())
            .bind(change.client_name)
            .bind(change.client_contact)
            .bind(change.client_email)
            .bind(change.car_brand)
            .bind(change.car_model)
            .bind(change.car_colour)
            .bind(change.car_plate_no)
            .bind(change.car_chassis_no)
            .bind(change.installation_date)
            .bind(change.reference_no)
            .bind(change.invoice_attachment_url)
            .fetch_optional(&mut *conn)
            .await?
            .map(Into::into)
            .ok_or_else(|| DatabaseError::not_found("Warranty", id))
    }

    pub async fn set_approval(
        conn: &mut PgConnection,
        id: WarrantyId,
        status: ApprovalStatus,
    ) -> Result<Warranty, DatabaseError> {
        let sql = format!(
            "UPDATE warranties SET approval_status = $2, updated_at = clock_timestamp() \
             WHERE id = $1 RETURNING {WARRANTY_COLUMNS}"
        );
        sqlx::query_as::<_, WarrantyRow>(&sql)
            .bind(id.value())
            .bind(DbApprovalStatus::from(status))
            .fetch_optional(&mut *conn)
            .await?
            .map(Into::into)
            .ok_or_else(|| DatabaseError::not_found("Warranty", id))
    }
}

/// Repository for the car parts covered by a warranty
pub struct WarrantyPartRepository;

impl WarrantyPartRepository {
    pub async fn list(
        conn: &mut PgConnection,
        warranty: WarrantyId,
    ) -> Result<Vec<WarrantyPart>, DatabaseError> {
        let sql =
            format!("SELECT {PART_COLUMNS} FROM warranty_parts WHERE warranty_id = $1 ORDER BY id");
        let rows = sqlx::query_as::<_, WarrantyPartRow>(&sql)
            .bind(warranty.value())
            .fetch_all(&mut *conn)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn get(
        conn: &mut PgConnection,
        id: WarrantyPartId,
    ) -> Result<WarrantyPart, DatabaseError> {
        let sql = format!("SELECT {PART_COLUMNS} FROM warranty_parts WHERE id = $1");
        sqlx::query_as::<_, WarrantyPartRow>(&sql)
            .bind(id.value())
            .fetch_optional(&mut *conn)
            .await?
            .map(Into::into)
            .ok_or_else(|| DatabaseError::not_found("WarrantyPart", id))
    }

    pub async fn insert(
        conn: &mut PgConnection,
        warranty: WarrantyId,
        part: NewWarrantyPart,
    ) -> Result<WarrantyPart, DatabaseError> {
        let sql = format!(
            "INSERT INTO warranty_parts (warranty_id, product_allocation_id, car_part_id, \
                installation_image_url, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, clock_timestamp(), clock_timestamp()) \
             RETURNING {PART_COLUMNS}"
        );
        let row = sqlx::query_as::<_, WarrantyPartRow>(&sql)
            .bind(warranty.value())
            .bind(part.product_allocation_id.value())
            .bind(part.car_part_id.value())
            .bind(part.installation_image_url)
            .fetch_one(&mut *conn)
            .await?;
        Ok(row.into())
    }

    /// Updates a part only when it belongs to `warranty`
    pub async fn update(
        conn: &mut PgConnection,
        warranty: WarrantyId,
        id: WarrantyPartId,
        change: WarrantyPartChange,
    ) -> Result<WarrantyPart, DatabaseError> {
        let sql = format!(
            "UPDATE warranty_parts SET product_allocation_id = $3, car_part_id = $4, \
                installation_image_url = $5, updated_at = clock_timestamp() \
             WHERE id = $1 AND warranty_id = $2 \
             RETURNING {PART_COLUMNS}"
        );
        sqlx::query_as::<_, WarrantyPartRow>(&sql)
            .bind(id.value())
            .bind(warranty.value())
            .bind(change.product_allocation_id.value())
            .bind(change.car_part_id.value())
            .bind(change.installation_image_url)
            .fetch_optional(&mut *conn)
            .await?
            .map(Into::into)
            .ok_or_else(|| DatabaseError::not_found("WarrantyPart", id))
    }

    pub async fn set_approval(
        conn: &mut PgConnection,
        id: WarrantyPartId,
        status: ApprovalStatus,
    ) -> Result<WarrantyPart, DatabaseError> {
        let sql = format!(
            "UPDATE warranty_parts SET approval_status = $2, updated_at = clock_timestamp() \
             WHERE id = $1 RETURNING {PART_COLUMNS}"
        );
        sqlx::query_as::<_, WarrantyPartRow>(&sql)
            .bind(id.value())
            .bind(DbApprovalStatus::from(status))
            .fetch_optional(&mut *conn)
            .await?
            .map(Into::into)
            .ok_or_else(|| DatabaseError::not_found("WarrantyPart", id))
    }

    /// Deletes a part; a part still referenced by a claim is a foreign key
    /// violation
    pub async fn delete(conn: &mut PgConnection, id: WarrantyPartId) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM warranty_parts WHERE id = $1")
            .bind(id.value())
            .execute(&mut *conn)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("WarrantyPart", id));
        }
        Ok(())
    }
}

/// Database row for a warranty
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct WarrantyRow {
    pub id: i32,
    pub shop_id: i32,
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
    pub approval_status: DbApprovalStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<WarrantyRow> for Warranty {
    fn from(row: WarrantyRow) -> Self {
        Warranty {
            id: WarrantyId::new(row.id),
            shop_id: ShopId::new(row.shop_id),
            client_name: row.client_name,
            client_contact: row.client_contact,
            client_email: row.client_email,
            car_brand: row.car_brand,
            car_model: row.car_model,
            car_colour: row.car_colour,
            car_plate_no: row.car_plate_no,
            car_chassis_no: row.car_chassis_no,
            installation_date: row.installation_date,
            reference_no: row.reference_no,
            warranty_no: row.warranty_no,
            invoice_attachment_url: row.invoice_attachment_url,
            is_active: row.is_active,
            approval_status: row.approval_status.into(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Database row for a warranty part
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct WarrantyPartRow {
    pub id: i32,
    pub warranty_id: i32,
    pub product_allocation_id: i32,
    pub car_part_id: i32,
    pub installation_image_url: String,
    pub approval_status: DbApprovalStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<WarrantyPartRow> for WarrantyPart {
    fn from(row: WarrantyPartRow) -> Self {
        WarrantyPart {
            id: WarrantyPartId::new(row.id),
            warranty_id: WarrantyId::new(row.warranty_id),
            product_allocation_id: ProductAllocationId::new(row.product_allocation_id),
            car_part_id: CarPartId::new(row.car_part_id),
            installation_image_url: row.installation_image_url,
            approval_status: row.approval_status.into(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
