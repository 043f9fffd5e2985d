//! Warranty Domain Ports
//!
//! The warranty domain reaches the relational store through one port,
//! [`WarrantyPort`], whose only job is to open a [`WarrantyUnitOfWork`]. The
//! unit of work carries the full per-entity CRUD surface; every read and
//! write a service performs happens inside one.
//!
//! # Release guarantee
//!
//! A unit of work ends in exactly one of three ways:
//!
//! - [`WarrantyUnitOfWork::commit`] makes every write visible at once
//! - [`WarrantyUnitOfWork::rollback`] discards them
//! - dropping the box without either also discards them
//!
//! The third path covers early `?` returns, request cancellation, timeouts
//! and panics, so no exit path can leave a partial write behind.
//!
//! # Adapters
//!
//! - **PostgreSQL**: `infra_db::PgGateway`, one SQL transaction per unit of work
//! - **In-memory**: `test_utils::MemoryGateway`, a working copy swapped in on commit

use async_trait::async_trait;

use core_kernel::{
    ApprovalStatus, CarPartId, DomainPort, HealthCheckable, PortError, ProductAllocationId,
    ProductId, SequenceSource, ShopId, StateId, UserId, WarrantyId, WarrantyPartId,
};

use crate::account::{NewUser, User};
use crate::product::{
    NewProduct, NewProductAllocation, Product, ProductAllocation, ProductChange, ShopProduct,
};
use crate::shop::{MalaysianState, NewShop, Shop, ShopChange};
use crate::warranty::{
    CarPart, NewWarranty, NewWarrantyPart, Warranty, WarrantyChange, WarrantyPart,
    WarrantyPartChange,
};

/// Entry point to the warranty store
#[async_trait]
pub trait WarrantyPort: DomainPort + HealthCheckable {
    /// Opens a unit of work
    async fn begin(&self) -> Result<Box<dyn WarrantyUnitOfWork>, PortError>;
}

/// Transaction-scoped access to shops, accounts, stock, warranties and parts
///
/// Lookups of a single row return `PortError::NotFound` when the row does not
/// exist. Unique violations surface as `PortError::Conflict`.
#[async_trait]
pub trait WarrantyUnitOfWork: SequenceSource + Send {
    // ========================================================================
    // Reference data
    // ========================================================================

    async fn list_states(&mut self) -> Result<Vec<MalaysianState>, PortError>;

    async fn get_state(&mut self, id: StateId) -> Result<MalaysianState, PortError>;

    async fn list_car_parts(&mut self) -> Result<Vec<CarPart>, PortError>;

    async fn get_car_part(&mut self, id: CarPartId) -> Result<CarPart, PortError>;

    // ========================================================================
    // Shops and accounts
    // ========================================================================

    async fn list_shops(&mut self) -> Result<Vec<Shop>, PortError>;

    async fn get_shop(&mut self, id: ShopId) -> Result<Shop, PortError>;

    /// Inserts a shop; `shop.branch_code` must already be resolved
    async fn insert_shop(&mut self, shop: NewShop) -> Result<Shop, PortError>;

    async fn update_shop(&mut self, id: ShopId, change: ShopChange) -> Result<Shop, PortError>;

    async fn insert_user(&mut self, user: NewUser) -> Result<User, PortError>;

    async fn get_user(&mut self, id: UserId) -> Result<User, PortError>;

    /// Returns `Ok(None)` for an unknown username
    async fn find_user_by_username(&mut self, username: &str) -> Result<Option<User>, PortError>;

    async fn set_user_password(
        &mut self,
        id: UserId,
        password_hash: String,
    ) -> Result<User, PortError>;

    // ========================================================================
    // Products and stock allocations
    // ========================================================================

    async fn list_products(&mut self) -> Result<Vec<Product>, PortError>;

    async fn get_product(&mut self, id: ProductId) -> Result<Product, PortError>;

    async fn insert_product(&mut self, product: NewProduct) -> Result<Product, PortError>;

    async fn update_product(
        &mut self,
        id: ProductId,
        change: ProductChange,
    ) -> Result<Product, PortError>;

    async fn list_product_allocations(&mut self) -> Result<Vec<ProductAllocation>, PortError>;

    async fn get_product_allocation(
        &mut self,
        id: ProductAllocationId,
    ) -> Result<ProductAllocation, PortError>;

    /// Unknown product or shop ids are foreign-key conflicts
    async fn insert_product_allocation(
        &mut self,
        allocation: NewProductAllocation,
    ) -> Result<ProductAllocation, PortError>;

    async fn update_product_allocation(
        &mut self,
        id: ProductAllocationId,
        change: NewProductAllocation,
    ) -> Result<ProductAllocation, PortError>;

    /// Every allocation of the shop joined with its product, ordered by allocation id
    async fn list_shop_products(&mut self, shop: ShopId) -> Result<Vec<ShopProduct>, PortError>;

    // ========================================================================
    // Warranties
    // ========================================================================

    async fn list_warranties(&mut self) -> Result<Vec<Warranty>, PortError>;

    async fn list_warranties_by_shop(&mut self, shop: ShopId) -> Result<Vec<Warranty>, PortError>;

    async fn get_warranty(&mut self, id: WarrantyId) -> Result<Warranty, PortError>;

    /// Exact, case-insensitive match on warranty number or car plate number
    async fn search_warranties(&mut self, term: &str) -> Result<Vec<Warranty>, PortError>;

    /// Inserts a warranty; `warranty.warranty_no` must already be resolved
    async fn insert_warranty(&mut self, warranty: NewWarranty) -> Result<Warranty, PortError>;

    async fn update_warranty(
        &mut self,
        id: WarrantyId,
        change: WarrantyChange,
    ) -> Result<Warranty, PortError>;

    async fn set_warranty_approval(
        &mut self,
        id: WarrantyId,
        status: ApprovalStatus,
    ) -> Result<Warranty, PortError>;

    // ========================================================================
    // Warranty parts
    // ========================================================================

    async fn list_warranty_parts(
        &mut self,
        warranty: WarrantyId,
    ) -> Result<Vec<WarrantyPart>, PortError>;

    async fn get_warranty_part(&mut self, id: WarrantyPartId) -> Result<WarrantyPart, PortError>;

    async fn insert_warranty_part(
        &mut self,
        warranty: WarrantyId,
        part: NewWarrantyPart,
    ) -> Result<WarrantyPart, PortError>;

    /// Updates a part of `warranty`; a part of another warranty is NotFound
    async fn update_warranty_part(
        &mut self,
        warranty: WarrantyId,
        id: WarrantyPartId,
        change: WarrantyPartChange,
    ) -> Result<WarrantyPart, PortError>;

    async fn set_warranty_part_approval(
        &mut self,
        id: WarrantyPartId,
        status: ApprovalStatus,
    ) -> Result<WarrantyPart, PortError>;

    async fn delete_warranty_part(&mut self, id: WarrantyPartId) -> Result<(), PortError>;

    // ========================================================================
    // Completion
    // ========================================================================

    /// Makes every write of this unit of work visible
    async fn commit(self: Box<Self>) -> Result<(), PortError>;

    /// Discards every write of this unit of work
    async fn rollback(self: Box<Self>) -> Result<(), PortError>;
}
