//! Claim repository implementation
//!
//! Claims are filed against a warranty and list the damaged warranty parts.
//! A claim part keeps a `RESTRICT` reference to its warranty part, so a part
//! under claim cannot be deleted from the warranty.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgConnection;

use core_kernel::{
    ApprovalStatus, ClaimId, ClaimPartId, LifecycleStatus, ShopId, WarrantyId, WarrantyPartId,
};
use domain_claims::{
    Claim, ClaimChange, ClaimPartChange, ClaimWarrantyPart, NewClaim, NewClaimPart,
};

use crate::error::DatabaseError;
use crate::repositories::types::{DbApprovalStatus, DbClaimStatus};

const CLAIM_COLUMNS: &str =
    "id, warranty_id, claim_no, claim_date, approval_status, status, created_at, updated_at";

const PART_COLUMNS: &str = "id, claim_id, warranty_part_id, damaged_image_url, remarks, \
    resolution_date, resolution_image_url, approval_status, status, created_at, updated_at";

/// Repository for warranty claims
pub struct ClaimRepository;

impl ClaimRepository {
    pub async fn list(conn: &mut PgConnection) -> Result<Vec<Claim>, DatabaseError> {
        let sql = format!("SELECT {CLAIM_COLUMNS} FROM claims ORDER BY id");
        let rows = sqlx::query_as::<_, ClaimRow>(&sql)
            .fetch_all(&mut *conn)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Claims filed under any warranty of `shop`
    pub async fn list_by_shop(
        conn: &mut PgConnection,
        shop: ShopId,
    ) -> Result<Vec<Claim>, DatabaseError> {
        let rows = sqlx::query_as::<_, ClaimRow>(
            "SELECT c.id, c.warranty_id, c.claim_no, c.claim_date, c.approval_status, c.status, \
                c.created_at, c.updated_at \
             FROM claims c JOIN warranties w ON w.id = c.warranty_id \
             WHERE w.shop_id = $1 ORDER BY c.id",
        )
        .bind(shop.value())
        .fetch_all(&mut *conn)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn get(conn: &mut PgConnection, id: ClaimId) -> Result<Claim, DatabaseError> {
        let sql = format!("SELECT {CLAIM_COLUMNS} FROM claims WHERE id = $1");
        sqlx::query_as::<_, ClaimRow>(&sql)
            .bind(id.value())
            .fetch_optional(&mut *conn)
            .await?
            .map(Into::into)
            .ok_or_else(|| DatabaseError::not_found("Claim", id))
    }

    /// Inserts a claim whose number has already been resolved
    pub async fn insert(conn: &mut PgConnection, claim: NewClaim) -> Result<Claim, DatabaseError> {
        let claim_no = claim.claim_no.ok_or_else(|| {
            DatabaseError::ConstraintViolation("claim number is required".to_string())
        })?;

        let sql = format!(
            "INSERT INTO claims (warranty_id, claim_no, claim_date, created_at, updated_at) \
             VALUES ($1, $2, $3, clock_timestamp(), clock_timestamp()) \
             RETURNING {CLAIM_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ClaimRow>(&sql)
            .bind(claim.warranty_id.value())
            .bind(claim_no)
            .bind(claim.claim_date)
            .fetch_one(&mut *conn)
            .await?;
        Ok(row.into())
    }

    pub async fn update(
        conn: &mut PgConnection,
        id: ClaimId,
        change: ClaimChange,
    ) -> Result<Claim, DatabaseError> {
        let sql = format!(
            "UPDATE claims SET claim_date = $2, updated_at = clock_timestamp() \
             WHERE id = $1 RETURNING {CLAIM_COLUMNS}"
        );
        sqlx::query_as::<_, ClaimRow>(&sql)
            .bind(id.value())
            .bind(change.claim_date)
            .fetch_optional(&mut *conn)
            .await?
            .map(Into::into)
            .ok_or_else(|| DatabaseError::not_found("Claim", id))
    }

    pub async fn set_approval(
        conn: &mut PgConnection,
        id: ClaimId,
        status: ApprovalStatus,
    ) -> Result<Claim, DatabaseError> {
        let sql = format!(
            "UPDATE claims SET approval_status = $2, updated_at = clock_timestamp() \
             WHERE id = $1 RETURNING {CLAIM_COLUMNS}"
        );
        sqlx::query_as::<_, ClaimRow>(&sql)
            .bind(id.value())
            .bind(DbApprovalStatus::from(status))
            .fetch_optional(&mut *conn)
            .await?
            .map(Into::into)
            .ok_or_else(|| DatabaseError::not_found("Claim", id))
    }

    pub async fn set_status(
        conn: &mut PgConnection,
        id: ClaimId,
        status: LifecycleStatus,
    ) -> Result<Claim, DatabaseError> {
        let sql = format!(
            "UPDATE claims SET status = $2, updated_at = clock_timestamp() \
             WHERE id = $1 RETURNING {CLAIM_COLUMNS}"
        );
        sqlx::query_as::<_, ClaimRow>(&sql)
            .bind(id.value())
            .bind(DbClaimStatus::from(status))
            .fetch_optional(&mut *conn)
            .await?
            .map(Into::into)
            .ok_or_else(|| DatabaseError::not_found("Claim", id))
    }
}

/// Repository for the damaged parts listed on a claim
pub struct ClaimPartRepository;

impl ClaimPartRepository {
    pub async fn list(
        conn: &mut PgConnection,
        claim: ClaimId,
    ) -> Result<Vec<ClaimWarrantyPart>, DatabaseError> {
        let sql = format!(
            "SELECT {PART_COLUMNS} FROM claim_warranty_parts WHERE claim_id = $1 ORDER BY id"
        );
        let rows = sqlx::query_as::<_, ClaimPartRow>(&sql)
            .bind(claim.value())
            .fetch_all(&mut *conn)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn get(
        conn: &mut PgConnection,
        id: ClaimPartId,
    ) -> Result<ClaimWarrantyPart, DatabaseError> {
        let sql = format!("SELECT {PART_COLUMNS} FROM claim_warranty_parts WHERE id = $1");
        sqlx::query_as::<_, ClaimPartRow>(&sql)
            .bind(id.value())
            .fetch_optional(&mut *conn)
            .await?
            .map(Into::into)
            .ok_or_else(|| DatabaseError::not_found("ClaimWarrantyPart", id))
    }

    pub async fn insert(
        conn: &mut PgConnection,
        claim: ClaimId,
        part: NewClaimPart,
    ) -> Result<ClaimWarrantyPart, DatabaseError> {
        let sql = format!(
            "INSERT INTO claim_warranty_parts (claim_id, warranty_part_id, damaged_image_url, \
                remarks, resolution_date, resolution_image_url, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, clock_timestamp(), clock_timestamp()) \
             RETURNING {PART_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ClaimPartRow>(&sql)
            .bind(claim.value())
            .bind(part.warranty_part_id.value())
            .bind(part.damaged_image_url)
            .bind(part.remarks)
            .bind(part.resolution_date)
            .bind(part.resolution_image_url)
            .fetch_one(&mut *conn)
            .await?;
        Ok(row.into())
    }

    /// Updates a part only when it belongs to `claim`
    pub async fn update(
        conn: &mut PgConnection,
        claim: ClaimId,
        id: ClaimPartId,
        change: ClaimPartChange,
    ) -> Result<ClaimWarrantyPart, DatabaseError> {
        let sql = format!(
            "UPDATE claim_warranty_parts SET warranty_part_id = $3, damaged_image_url = $4, \
                remarks = $5, resolution_date = $6, resolution_image_url = $7, \
                updated_at = clock_timestamp() \
             WHERE id = $1 AND claim_id = $2 \
             RETURNING {PART_COLUMNS}"
        );
        sqlx::query_as::<_, ClaimPartRow>(&sql)
            .bind(id.value())
            .bind(claim.value())
            .bind(change.warranty_part_id.value())
            .bind(change.damaged_image_url)
            .bind(change.remarks)
            .bind(change.resolution_date)
            .bind(change.resolution_image_url)
            .fetch_optional(&mut *conn)
            .await?
            .map(Into::into)
            .ok_or_else(|| DatabaseError::not_found("ClaimWarrantyPart", id))
    }

    pub async fn set_approval(
        conn: &mut PgConnection,
        id: ClaimPartId,
        status: ApprovalStatus,
    ) -> Result<ClaimWarrantyPart, DatabaseError> {
        let sql = format!(
            "UPDATE claim_warranty_parts SET approval_status = $2, \
                updated_at = clock_timestamp() \
             WHERE id = $1 RETURNING {PART_COLUMNS}"
        );
        sqlx::query_as::<_, ClaimPartRow>(&sql)
            .bind(id.value())
            .bind(DbApprovalStatus::from(status))
            .fetch_optional(&mut *conn)
            .await?
            .map(Into::into)
            .ok_or_else(|| DatabaseError::not_found("ClaimWarrantyPart", id))
    }

    pub async fn set_status(
        conn: &mut PgConnection,
        id: ClaimPartId,
        status: LifecycleStatus,
    ) -> Result<ClaimWarrantyPart, DatabaseError> {
        let sql = format!(
            "UPDATE claim_warranty_parts SET status = $2, updated_at = clock_timestamp() \
             WHERE id = $1 RETURNING {PART_COLUMNS}"
        );
        sqlx::query_as::<_, ClaimPartRow>(&sql)
            .bind(id.value())
            .bind(DbClaimStatus::from(status))
            .fetch_optional(&mut *conn)
            .await?
            .map(Into::into)
            .ok_or_else(|| DatabaseError::not_found("ClaimWarrantyPart", id))
    }

    pub async fn delete(conn: &mut PgConnection, id: ClaimPartId) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM claim_warranty_parts WHERE id = $1")
            .bind(id.value())
            .execute(&mut *conn)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("ClaimWarrantyPart", id));
        }
        Ok(())
    }
}

/// Database row for a claim
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ClaimRow {
    pub id: i32,
    pub warranty_id: i32,
    pub claim_no: String,
    pub claim_date: NaiveDate,
    pub approval_status: DbApprovalStatus,
    pub status: DbClaimStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ClaimRow> for Claim {
    fn from(row: ClaimRow) -> Self {
        Claim {
            id: ClaimId::new(row.id),
            warranty_id: WarrantyId::new(row.warranty_id),
            claim_no: row.claim_no,
            claim_date: row.claim_date,
            approval_status: row.approval_status.into(),
            status: row.status.into(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Database row for a claim part
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ClaimPartRow {
    pub id: i32,
    pub claim_id: i32,
    pub warranty_part_id: i32,
    pub damaged_image_url: String,
    pub remarks: Option<String>,
    pub resolution_date: Option<NaiveDate>,
    pub resolution_image_url: Option<String>,
    pub approval_status: DbApprovalStatus,
    pub status: DbClaimStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ClaimPartRow> for ClaimWarrantyPart {
    fn from(row: ClaimPartRow) -> Self {
        ClaimWarrantyPart {
            id: ClaimPartId::new(row.id),
            claim_id: ClaimId::new(row.claim_id),
            warranty_part_id: WarrantyPartId::new(row.warranty_part_id),
            damaged_image_url: row.damaged_image_url,
            remarks: row.remarks,
            resolution_date: row.resolution_date,
            resolution_image_url: row.resolution_image_url,
            approval_status: row.approval_status.into(),
            status: row.status.into(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
