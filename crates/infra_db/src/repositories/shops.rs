//! Shop and login account repositories

use chrono::{DateTime, Utc};
use sqlx::PgConnection;

use core_kernel::{ShopId, StateId, UserId};
use domain_warranty::{NewShop, NewUser, Shop, ShopChange, User};

use crate::error::DatabaseError;
use crate::repositories::types::DbUserRole;

const SHOP_COLUMNS: &str = "id, company_name, company_registration_number, \
    company_license_image_url, company_contact_number, company_email, company_website_url, \
    shop_name, shop_address, msia_state_id, branch_code, shop_image_url, pic_name, \
    pic_position, pic_contact_number, pic_email, is_active, created_at, updated_at";

const USER_COLUMNS: &str =
    "id, shop_id, username, role, password_hash, is_active, created_at, updated_at";

/// Repository for installer shops
pub struct ShopRepository;

impl ShopRepository {
    pub async fn list(conn: &mut PgConnection) -> Result<Vec<Shop>, DatabaseError> {
        let sql = format!("SELECT {SHOP_COLUMNS} FROM shops ORDER BY id");
        let rows = sqlx::query_as::<_, ShopRow>(&sql)
            .fetch_all(&mut *conn)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn get(conn: &mut PgConnection, id: ShopId) -> Result<Shop, DatabaseError> {
        let sql = format!("SELECT {SHOP_COLUMNS} FROM shops WHERE id = $1");
        sqlx::query_as::<_, ShopRow>(&sql)
            .bind(id.value())
            .fetch_optional(&mut *conn)
            .await?
            .map(Into::into)
            .ok_or_else(|| DatabaseError::not_found("Shop", id))
    }

    /// Inserts a shop whose branch code has already been resolved
    ///
    /// # Errors
    ///
    /// * `ConstraintViolation` - the branch code is missing
    /// * `DuplicateEntry` - the branch code is taken
    pub async fn insert(conn: &mut PgConnection, shop: NewShop) -> Result<Shop, DatabaseError> {
        let branch_code = shop.branch_code.ok_or_else(|| {
            DatabaseError::ConstraintViolation("branch code is required".to_string())
        })?;

        let sql = format!(
            "INSERT INTO shops (company_name, company_registration_number, \
                company_license_image_url, company_contact_number, company_email, \
                company_website_url, shop_name, shop_address, msia_state_id, branch_code, \
                shop_image_url, pic_name, pic_position, pic_contact_number, pic_email, \
                created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, \
                clock_timestamp(), clock_timestamp()) \
             RETURNING {SHOP_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ShopRow>(&sql)
            .bind(shop.company_name)
            .bind(shop.company_registration_number)
            .bind(shop.company_license_image_url)
            .bind(shop.company_contact_number)
            .bind(shop.company_email)
            .bind(shop.company_website_url)
            .bind(shop.shop_name)
            .bind(shop.shop_address)
            .bind(shop.msia_state_id.map(|id| id.value()))
            .bind(branch_code)
            .bind(shop.shop_image_url)
            .bind(shop.pic_name)
            .bind(shop.pic_position)
            .bind(shop.pic_contact_number)
            .bind(shop.pic_email)
            .fetch_one(&mut *conn)
            .await?;
        Ok(row.into())
    }

    pub async fn update(
        conn: &mut PgConnection,
        id: ShopId,
        change: ShopChange,
    ) -> Result<Shop, DatabaseError> {
        let sql = format!(
            "UPDATE shops SET company_name = $2, company_registration_number = $3, \
                company_license_image_url = $4, company_contact_number = $5, \
                company_email = $6, company_website_url = $7, shop_name = $8, \
                shop_address = $9, msia_state_id = $10, branch_code = $11, \
                shop_image_url = $12, pic_name = $13, pic_position = $14, \
                pic_contact_number = $15, pic_email = $16, is_active = $17, \
                updated_at = clock_timestamp() \
             WHERE id = $1 \
             RETURNING {SHOP_COLUMNS}"
        );
        sqlx::query_as::<_, ShopRow>(&sql)
            .bind(id.value())
            .bind(change.company_name)
            .bind(change.company_registration_number)
            .bind(change.company_license_image_url)
            .bind(change.company_contact_number)
            .bind(change.company_email)
            .bind(change.company_website_url)
            .bind(change.shop_name)
            .bind(change.shop_address)
            .bind(change.msia_state_id.map(|id| id.value()))
            .bind(change.branch_code)
            .bind(change.shop_image_url)
            .bind(change.pic_name)
            .bind(change.pic_position)
            .bind(change.pic_contact_number)
            .bind(change.pic_email)
            .bind(change.is_active)
            .fetch_optional(&mut *conn)
            .await?
            .map(Into::into)
            .ok_or_else(|| DatabaseError::not_found("Shop", id))
    }
}

/// Repository for login accounts
pub struct UserRepository;

impl UserRepository {
    pub async fn insert(conn: &mut PgConnection, user: NewUser) -> Result<User, DatabaseError> {
        let sql = format!(
            "INSERT INTO users (shop_id, username, role, password_hash, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, clock_timestamp(), clock_timestamp()) \
             RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(user.shop_id.map(|id| id.value()))
            .bind(user.username)
            .bind(DbUserRole::from(user.role))
            .bind(user.password_hash)
            .fetch_one(&mut *conn)
            .await?;
        Ok(row.into())
    }

    pub async fn get(conn: &mut PgConnection, id: UserId) -> Result<User, DatabaseError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(id.value())
            .fetch_optional(&mut *conn)
            .await?
            .map(Into::into)
            .ok_or_else(|| DatabaseError::not_found("User", id))
    }

    pub async fn set_password(
        conn: &mut PgConnection,
        id: UserId,
        password_hash: String,
    ) -> Result<User, DatabaseError> {
        let sql = format!(
            "UPDATE users SET password_hash = $2, updated_at = clock_timestamp() \
             WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, UserRow>(&sql)
            .bind(id.value())
            .bind(password_hash)
            .fetch_optional(&mut *conn)
            .await?
            .map(Into::into)
            .ok_or_else(|| DatabaseError::not_found("User", id))
    }

    pub async fn find_by_username(
        conn: &mut PgConnection,
        username: &str,
    ) -> Result<Option<User>, DatabaseError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(username)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(row.map(Into::into))
    }
}

/// Database row for a shop
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ShopRow {
    pub id: i32,
    pub company_name: String,
    pub company_registration_number: String,
    pub company_license_image_url: String,
    pub company_contact_number: String,
    pub company_email: String,
    pub company_website_url: String,
    pub shop_name: String,
    pub shop_address: String,
    pub msia_state_id: Option<i32>,
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

impl From<ShopRow> for Shop {
    fn from(row: ShopRow) -> Self {
        Shop {
            id: ShopId::new(row.id),
            company_name: row.company_name,
            company_registration_number: row.company_registration_number,
            company_license_image_url: row.company_license_image_url,
            company_contact_number: row.company_contact_number,
            company_email: row.company_email,
            company_website_url: row.company_website_url,
            shop_name: row.shop_name,
            shop_address: row.shop_address,
            msia_state_id: row.msia_state_id.map(StateId::new),
            branch_code: row.branch_code,
            shop_image_url: row.shop_image_url,
            pic_name: row.pic_name,
            pic_position: row.pic_position,
            pic_contact_number: row.pic_contact_number,
            pic_email: row.pic_email,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Database row for a login account
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: i32,
    pub shop_id: Option<i32>,
    pub username: String,
    pub role: DbUserRole,
    pub password_hash: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: UserId::new(row.id),
            shop_id: row.shop_id.map(ShopId::new),
            username: row.username,
            role: row.role.into(),
            password_hash: row.password_hash,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
