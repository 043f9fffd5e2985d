//! PostgreSQL Gateway
//!
//! [`PgGateway`] implements both domain ports on one connection pool. Each
//! call to `begin` opens a SQL transaction wrapped in a [`PgUnitOfWork`];
//! every repository call of the unit of work runs on that transaction.
//!
//! # Release guarantee
//!
//! `commit` and `rollback` consume the unit of work. A unit of work dropped
//! without either drops its `sqlx::Transaction`, which rolls back and
//! returns the connection to the pool.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, DatabaseConfig, PgGateway};
//! use domain_warranty::WarrantyPort;
//!
//! let pool = create_pool(DatabaseConfig::new(url)).await?;
//! let gateway = PgGateway::new(pool);
//! let mut uow = WarrantyPort::begin(&gateway).await?;
//! let shops = uow.list_shops().await?;
//! uow.rollback().await?;
//! ```

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use tracing::{debug, instrument};

use core_kernel::{
    AdapterHealth, ApprovalStatus, CarPartId, ClaimId, ClaimPartId, CodeSequence, DomainPort,
    HealthCheckResult, HealthCheckable, LifecycleStatus, PortError, ProductAllocationId, ProductId,
    SequenceSource, ShopId, StateId, UserId, WarrantyId, WarrantyPartId,
};
use domain_claims::{
    Claim, ClaimChange, ClaimPartChange, ClaimWarrantyPart, ClaimsPort, ClaimsUnitOfWork,
    NewClaim, NewClaimPart,
};
use domain_warranty::{
    CarPart, MalaysianState, NewProduct, NewProductAllocation, NewShop, NewUser, NewWarranty,
    NewWarrantyPart, Product, ProductAllocation, ProductChange, Shop, ShopChange, ShopProduct,
    User, Warranty, WarrantyChange, WarrantyPart, WarrantyPartChange, WarrantyPort,
    WarrantyUnitOfWork,
};

use crate::error::DatabaseError;
use crate::repositories::{
    ClaimPartRepository, ClaimRepository, ProductAllocationRepository, ProductRepository,
    ReferenceRepository, SequenceRepository, ShopRepository, UserRepository,
    WarrantyPartRepository, WarrantyRepository,
};

const ADAPTER_ID: &str = "postgres-warranty-gateway";

/// PostgreSQL-backed implementation of the warranty and claims ports
#[derive(Debug, Clone)]
pub struct PgGateway {
    pool: PgPool,
}

impl PgGateway {
    /// Creates a gateway over an existing pool
    ///
    /// # Arguments
    ///
    /// * `pool` - The PostgreSQL connection pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns the underlying pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    #[instrument(skip(self))]
    async fn open(&self) -> Result<PgUnitOfWork, PortError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| match DatabaseError::from(e) {
                DatabaseError::QueryFailed(msg) => DatabaseError::TransactionFailed(msg),
                other => other,
            })?;
        debug!("transaction opened");
        Ok(PgUnitOfWork { tx })
    }
}

impl DomainPort for PgGateway {}

#[async_trait]
impl HealthCheckable for PgGateway {
    /// Runs `SELECT 1` against the pool
    async fn health_check(&self) -> HealthCheckResult {
        let start = std::time::Instant::now();

        let result = sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await;

        let latency_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(_) => HealthCheckResult {
                adapter_id: ADAPTER_ID.to_string(),
                status: AdapterHealth::Healthy,
                latency_ms,
                message: None,
                checked_at: Utc::now(),
            },
            Err(e) => HealthCheckResult {
                adapter_id: ADAPTER_ID.to_string(),
                status: AdapterHealth::Unhealthy,
                latency_ms,
                message: Some(format!("Database error: {}", e)),
                checked_at: Utc::now(),
            },
        }
    }
}

#[async_trait]
impl WarrantyPort for PgGateway {
    async fn begin(&self) -> Result<Box<dyn WarrantyUnitOfWork>, PortError> {
        Ok(Box::new(self.open().await?))
    }
}

#[async_trait]
impl ClaimsPort for PgGateway {
    async fn begin(&self) -> Result<Box<dyn ClaimsUnitOfWork>, PortError> {
        Ok(Box::new(self.open().await?))
    }
}

/// One SQL transaction
pub struct PgUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

impl PgUnitOfWork {
    fn conn(&mut self) -> &mut PgConnection {
        &mut self.tx
    }
}

#[async_trait]
impl SequenceSource for PgUnitOfWork {
    async fn latest_code(
        &mut self,
        sequence: CodeSequence,
        prefix: &str,
    ) -> Result<Option<String>, PortError> {
        Ok(SequenceRepository::latest_code(self.conn(), sequence, prefix).await?)
    }

    #[instrument(skip(self))]
    async fn lock_prefix(&mut self, sequence: CodeSequence, prefix: &str) -> Result<(), PortError> {
        Ok(SequenceRepository::lock_prefix(self.conn(), sequence, prefix).await?)
    }
}

#[async_trait]
impl WarrantyUnitOfWork for PgUnitOfWork {
    async fn list_states(&mut self) -> Result<Vec<MalaysianState>, PortError> {
        Ok(ReferenceRepository::list_states(self.conn()).await?)
    }

    async fn get_state(&mut self, id: StateId) -> Result<MalaysianState, PortError> {
        Ok(ReferenceRepository::get_state(self.conn(), id).await?)
    }

    async fn list_car_parts(&mut self) -> Result<Vec<CarPart>, PortError> {
        Ok(ReferenceRepository::list_car_parts(self.conn()).await?)
    }

    async fn get_car_part(&mut self, id: CarPartId) -> Result<CarPart, PortError> {
        Ok(ReferenceRepository::get_car_part(self.conn(), id).await?)
    }

    async fn list_shops(&mut self) -> Result<Vec<Shop>, PortError> {
        Ok(ShopRepository::list(self.conn()).await?)
    }

    async fn get_shop(&mut self, id: ShopId) -> Result<Shop, PortError> {
        Ok(ShopRepository::get(self.conn(), id).await?)
    }

    async fn insert_shop(&mut self, shop: NewShop) -> Result<Shop, PortError> {
        Ok(ShopRepository::insert(self.conn(), shop).await?)
    }

    async fn update_shop(&mut self, id: ShopId, change: ShopChange) -> Result<Shop, PortError> {
        Ok(ShopRepository::update(self.conn(), id, change).await?)
    }

    async fn insert_user(&mut self, user: NewUser) -> Result<User, PortError> {
        Ok(UserRepository::insert(self.conn(), user).await?)
    }

    async fn get_user(&mut self, id: UserId) -> Result<User, PortError> {
        Ok(UserRepository::get(self.conn(), id).await?)
    }

    async fn find_user_by_username(&mut self, username: &str) -> Result<Option<User>, PortError> {
        Ok(UserRepository::find_by_username(self.conn(), username).await?)
    }

    async fn set_user_password(
        &mut self,
        id: UserId,
        password_hash: String,
    ) -> Result<User, PortError> {
        Ok(UserRepository::set_password(self.conn(), id, password_hash).await?)
    }

    async fn list_products(&mut self) -> Result<Vec<Product>, PortError> {
        Ok(ProductRepository::list(self.conn()).await?)
    }

    async fn get_product(&mut self, id: ProductId) -> Result<Product, PortError> {
        Ok(ProductRepository::get(self.conn(), id).await?)
    }

    async fn insert_product(&mut self, product: NewProduct) -> Result<Product, PortError> {
        Ok(ProductRepository::insert(self.conn(), product).await?)
    }

    async fn update_product(
        &mut self,
        id: ProductId,
        change: ProductChange,
    ) -> Result<Product, PortError> {
        Ok(ProductRepository::update(self.conn(), id, change).await?)
    }

    async fn list_product_allocations(&mut self) -> Result<Vec<ProductAllocation>, PortError> {
        Ok(ProductAllocationRepository::list(self.conn()).await?)
    }

    async fn get_product_allocation(
        &mut self,
        id: ProductAllocationId,
    ) -> Result<ProductAllocation, PortError> {
        Ok(ProductAllocationRepository::get(self.conn(), id).await?)
    }

    async fn insert_product_allocation(
        &mut self,
        allocation: NewProductAllocation,
    ) -> Result<ProductAllocation, PortError> {
        Ok(ProductAllocationRepository::insert(self.conn(), allocation).await?)
    }

    async fn update_product_allocation(
        &mut self,
        id: ProductAllocationId,
        change: NewProductAllocation,
    ) -> Result<ProductAllocation, PortError> {
        Ok(ProductAllocationRepository::update(self.conn(), id, change).await?)
    }

    async fn list_shop_products(&mut self, shop: ShopId) -> Result<Vec<ShopProduct>, PortError> {
        Ok(ProductAllocationRepository::list_by_shop(self.conn(), shop).await?)
    }

    async fn list_warranties(&mut self) -> Result<Vec<Warranty>, PortError> {
        Ok(WarrantyRepository::list(self.conn()).await?)
    }

    async fn list_warranties_by_shop(&mut self, shop: ShopId) -> Result<Vec<Warranty>, PortError> {
        Ok(WarrantyRepository::list_by_shop(self.conn(), shop).await?)
    }

    async fn get_warranty(&mut self, id: WarrantyId) -> Result<Warranty, PortError> {
        Ok(WarrantyRepository::get(self.conn(), id).await?)
    }

    async fn search_warranties(&mut self, term: &str) -> Result<Vec<Warranty>, PortError> {
        Ok(WarrantyRepository::search(self.conn(), term).await?)
    }

    async fn insert_warranty(&mut self, warranty: NewWarranty) -> Result<Warranty, PortError> {
        Ok(WarrantyRepository::insert(self.conn(), warranty).await?)
    }

    async fn update_warranty(
        &mut self,
        id: WarrantyId,
        change: WarrantyChange,
    ) -> Result<Warranty, PortError> {
        Ok(WarrantyRepository::update(self.conn(), id, change).await?)
    }

    async fn set_warranty_approval(
        &mut self,
        id: WarrantyId,
        status: ApprovalStatus,
    ) -> Result<Warranty, PortError> {
        Ok(WarrantyRepository::set_approval(self.conn(), id, status).await?)
    }

    async fn list_warranty_parts(
        &mut self,
        warranty: WarrantyId,
    ) -> Result<Vec<WarrantyPart>, PortError> {
        Ok(WarrantyPartRepository::list(self.conn(), warranty).await?)
    }

    async fn get_warranty_part(&mut self, id: WarrantyPartId) -> Result<WarrantyPart, PortError> {
        Ok(WarrantyPartRepository::get(self.conn(), id).await?)
    }

    async fn insert_warranty_part(
        &mut self,
        warranty: WarrantyId,
        part: NewWarrantyPart,
    ) -> Result<WarrantyPart, PortError> {
        Ok(WarrantyPartRepository::insert(self.conn(), warranty, part).await?)
    }

    async fn update_warranty_part(
        &mut self,
        warranty: WarrantyId,
        id: WarrantyPartId,
        change: WarrantyPartChange,
    ) -> Result<WarrantyPart, PortError> {
        Ok(WarrantyPartRepository::update(self.conn(), warranty, id, change).await?)
    }

    async fn set_warranty_part_approval(
        &mut self,
        id: WarrantyPartId,
        status: ApprovalStatus,
    ) -> Result<WarrantyPart, PortError> {
        Ok(WarrantyPartRepository::set_approval(self.conn(), id, status).await?)
    }

    async fn delete_warranty_part(&mut self, id: WarrantyPartId) -> Result<(), PortError> {
        Ok(WarrantyPartRepository::delete(self.conn(), id).await?)
    }

    #[instrument(skip(self))]
    async fn commit(self: Box<Self>) -> Result<(), PortError> {
        self.tx
            .commit()
            .await
            .map_err(|e| DatabaseError::TransactionFailed(e.to_string()))?;
        debug!("transaction committed");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn rollback(self: Box<Self>) -> Result<(), PortError> {
        self.tx
            .rollback()
            .await
            .map_err(|e| DatabaseError::TransactionFailed(e.to_string()))?;
        debug!("transaction rolled back");
        Ok(())
    }
}

#[async_trait]
impl ClaimsUnitOfWork for PgUnitOfWork {
    async fn list_claims(&mut self) -> Result<Vec<Claim>, PortError> {
        Ok(ClaimRepository::list(self.conn()).await?)
    }

    async fn list_claims_by_shop(&mut self, shop: ShopId) -> Result<Vec<Claim>, PortError> {
        Ok(ClaimRepository::list_by_shop(self.conn(), shop).await?)
    }

    async fn get_claim(&mut self, id: ClaimId) -> Result<Claim, PortError> {
        Ok(ClaimRepository::get(self.conn(), id).await?)
    }

    async fn insert_claim(&mut self, claim: NewClaim) -> Result<Claim, PortError> {
        Ok(ClaimRepository::insert(self.conn(), claim).await?)
    }

    async fn update_claim(&mut self, id: ClaimId, change: ClaimChange) -> Result<Claim, PortError> {
        Ok(ClaimRepository::update(self.conn(), id, change).await?)
    }

    async fn set_claim_approval(
        &mut self,
        id: ClaimId,
        status: ApprovalStatus,
    ) -> Result<Claim, PortError> {
        Ok(ClaimRepository::set_approval(self.conn(), id, status).await?)
    }

    async fn set_claim_status(
        &mut self,
        id: ClaimId,
        status: LifecycleStatus,
    ) -> Result<Claim, PortError> {
        Ok(ClaimRepository::set_status(self.conn(), id, status).await?)
    }

    async fn list_claim_parts(
        &mut self,
        claim: ClaimId,
    ) -> Result<Vec<ClaimWarrantyPart>, PortError> {
        Ok(ClaimPartRepository::list(self.conn(), claim).await?)
    }

    async fn get_claim_part(&mut self, id: ClaimPartId) -> Result<ClaimWarrantyPart, PortError> {
        Ok(ClaimPartRepository::get(self.conn(), id).await?)
    }

    async fn insert_claim_part(
        &mut self,
        claim: ClaimId,
        part: NewClaimPart,
    ) -> Result<ClaimWarrantyPart, PortError> {
        Ok(ClaimPartRepository::insert(self.conn(), claim, part).await?)
    }

    async fn update_claim_part(
        &mut self,
        claim: ClaimId,
        id: ClaimPartId,
        change: ClaimPartChange,
    ) -> Result<ClaimWarrantyPart, PortError> {
        Ok(ClaimPartRepository::update(self.conn(), claim, id, change).await?)
    }

    async fn set_claim_part_approval(
        &mut self,
        id: ClaimPartId,
        status: ApprovalStatus,
    ) -> Result<ClaimWarrantyPart, PortError> {
        Ok(ClaimPartRepository::set_approval(self.conn(), id, status).await?)
    }

    async fn set_claim_part_status(
        &mut self,
        id: ClaimPartId,
        status: LifecycleStatus,
    ) -> Result<ClaimWarrantyPart, PortError> {
        Ok(ClaimPartRepository::set_status(self.conn(), id, status).await?)
    }

    async fn delete_claim_part(&mut self, id: ClaimPartId) -> Result<(), PortError> {
        Ok(ClaimPartRepository::delete(self.conn(), id).await?)
    }
}
