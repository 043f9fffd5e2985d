//! In-memory transactional gateway
//!
//! [`MemoryGateway`] implements both domain ports over plain collections.
//! Units of work are serialized: `begin` takes the store lock and clones the
//! committed state into a working copy; `commit` swaps the working copy in,
//! and rollback or drop throws it away. Foreign keys and unique constraints
//! mirror the PostgreSQL schema so services see the same failures.
//!
//! Faults can be injected per [`WriteKind`] to fail the Nth write of that
//! kind, which is how atomicity of the composite writer and aggregators is
//! exercised without a database.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

use core_kernel::{
    AdapterHealth, ApprovalStatus, CarPartId, ClaimId, ClaimPartId, CodeSequence, DomainPort,
    HealthCheckResult, HealthCheckable, LifecycleStatus, PortError, ProductAllocationId, ProductId,
    SequenceSource, ShopId, StateId, UserId, WarrantyId, WarrantyPartId,
};
use domain_claims::{
    Claim, ClaimChange, ClaimPartChange, ClaimWarrantyPart, ClaimsPort, ClaimsUnitOfWork, NewClaim,
    NewClaimPart,
};
use domain_warranty::{
    CarPart, MalaysianState, NewProduct, NewProductAllocation, NewShop, NewUser, NewWarranty,
    NewWarrantyPart, Product, ProductAllocation, ProductChange, Shop, ShopChange, ShopProduct, User,
    Warranty, WarrantyChange, WarrantyPart, WarrantyPartChange, WarrantyPort, WarrantyUnitOfWork,
};

use crate::fixtures::{car_parts, malaysian_states};

/// Kinds of write that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriteKind {
    InsertShop,
    UpdateShop,
    InsertUser,
    SetUserPassword,
    InsertProduct,
    UpdateProduct,
    InsertProductAllocation,
    UpdateProductAllocation,
    InsertWarranty,
    UpdateWarranty,
    SetWarrantyApproval,
    InsertWarrantyPart,
    UpdateWarrantyPart,
    SetWarrantyPartApproval,
    DeleteWarrantyPart,
    InsertClaim,
    UpdateClaim,
    SetClaimApproval,
    SetClaimStatus,
    InsertClaimPart,
    UpdateClaimPart,
    SetClaimPartApproval,
    SetClaimPartStatus,
    DeleteClaimPart,
    Commit,
}

#[derive(Debug, Default)]
struct FaultPlan {
    /// Remaining writes before the fault fires, per kind
    pending: HashMap<WriteKind, usize>,
    /// Writes seen per kind since the gateway was created
    seen: HashMap<WriteKind, usize>,
}

impl FaultPlan {
    fn record(&mut self, kind: WriteKind) -> Result<(), PortError> {
        *self.seen.entry(kind).or_insert(0) += 1;
        if let Some(remaining) = self.pending.get_mut(&kind) {
            *remaining -= 1;
            if *remaining == 0 {
                self.pending.remove(&kind);
                debug!(?kind, "injected fault");
                return Err(PortError::internal(format!("injected fault on {:?}", kind)));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
struct MemoryState {
    states: Vec<MalaysianState>,
    car_parts: Vec<CarPart>,
    shops: BTreeMap<ShopId, Shop>,
    users: BTreeMap<UserId, User>,
    products: BTreeMap<ProductId, Product>,
    allocations: BTreeMap<ProductAllocationId, ProductAllocation>,
    warranties: BTreeMap<WarrantyId, Warranty>,
    warranty_parts: BTreeMap<WarrantyPartId, WarrantyPart>,
    claims: BTreeMap<ClaimId, Claim>,
    claim_parts: BTreeMap<ClaimPartId, ClaimWarrantyPart>,
    /// Last id handed out per table, like a SERIAL column
    last_ids: HashMap<&'static str, i32>,
    last_timestamp: Option<DateTime<Utc>>,
}

impl MemoryState {
    fn seeded() -> Self {
        Self {
            states: malaysian_states(),
            car_parts: car_parts(),
            ..Self::default()
        }
    }

    fn next_id(&mut self, table: &'static str) -> i32 {
        let last = self.last_ids.entry(table).or_insert(0);
        *last += 1;
        *last
    }

    /// Strictly increasing, so "latest updated" is never ambiguous
    fn now(&mut self) -> DateTime<Utc> {
        let mut now = Utc::now();
        if let Some(last) = self.last_timestamp {
            if now <= last {
                now = last + Duration::microseconds(1);
            }
        }
        self.last_timestamp = Some(now);
        now
    }
}

/// Highest code by suffix length, then lexically
fn highest_code<'a>(codes: impl Iterator<Item = &'a str>, prefix: &str) -> Option<String> {
    codes
        .filter(|code| code.starts_with(prefix))
        .max_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)))
        .map(str::to_string)
}

/// In-memory implementation of [`WarrantyPort`] and [`ClaimsPort`]
#[derive(Clone)]
pub struct MemoryGateway {
    state: Arc<Mutex<MemoryState>>,
    faults: Arc<StdMutex<FaultPlan>>,
}

impl Default for MemoryGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryGateway {
    /// Creates a gateway seeded with the Malaysian states and car parts
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MemoryState::seeded())),
            faults: Arc::new(StdMutex::new(FaultPlan::default())),
        }
    }

    /// Makes the `nth` write of `kind` from now on fail (1-based)
    pub fn fail_on(&self, kind: WriteKind, nth: usize) {
        let mut plan = self.faults.lock().unwrap_or_else(|e| e.into_inner());
        plan.pending.insert(kind, nth.max(1));
    }

    /// Number of writes of `kind` attempted so far, including failed ones
    pub fn writes(&self, kind: WriteKind) -> usize {
        let plan = self.faults.lock().unwrap_or_else(|e| e.into_inner());
        plan.seen.get(&kind).copied().unwrap_or(0)
    }

    pub async fn shop_count(&self) -> usize {
        self.state.lock().await.shops.len()
    }

    pub async fn user_count(&self) -> usize {
        self.state.lock().await.users.len()
    }

    pub async fn product_count(&self) -> usize {
        self.state.lock().await.products.len()
    }

    pub async fn allocation_count(&self) -> usize {
        self.state.lock().await.allocations.len()
    }

    pub async fn warranty_count(&self) -> usize {
        self.state.lock().await.warranties.len()
    }

    pub async fn warranty_part_count(&self) -> usize {
        self.state.lock().await.warranty_parts.len()
    }

    pub async fn claim_count(&self) -> usize {
        self.state.lock().await.claims.len()
    }

    pub async fn claim_part_count(&self) -> usize {
        self.state.lock().await.claim_parts.len()
    }

    /// Committed copy of a warranty, bypassing any unit of work
    pub async fn warranty(&self, id: WarrantyId) -> Option<Warranty> {
        self.state.lock().await.warranties.get(&id).cloned()
    }

    /// Committed parts of a warranty, ordered by id
    pub async fn warranty_parts(&self, id: WarrantyId) -> Vec<WarrantyPart> {
        let state = self.state.lock().await;
        state
            .warranty_parts
            .values()
            .filter(|p| p.warranty_id == id)
            .cloned()
            .collect()
    }

    /// Committed copy of a claim
    pub async fn claim(&self, id: ClaimId) -> Option<Claim> {
        self.state.lock().await.claims.get(&id).cloned()
    }

    /// Committed parts of a claim, ordered by id
    pub async fn claim_parts(&self, id: ClaimId) -> Vec<ClaimWarrantyPart> {
        let state = self.state.lock().await;
        state
            .claim_parts
            .values()
            .filter(|p| p.claim_id == id)
            .cloned()
            .collect()
    }

    async fn open(&self) -> MemoryUnitOfWork {
        let guard = self.state.clone().lock_owned().await;
        let work = guard.clone();
        MemoryUnitOfWork {
            guard,
            work,
            faults: self.faults.clone(),
        }
    }
}

impl DomainPort for MemoryGateway {}

#[async_trait]
impl HealthCheckable for MemoryGateway {
    async fn health_check(&self) -> HealthCheckResult {
        HealthCheckResult {
            adapter_id: "memory".to_string(),
            status: AdapterHealth::Healthy,
            latency_ms: 0,
            message: None,
            checked_at: Utc::now(),
        }
    }
}

#[async_trait]
impl WarrantyPort for MemoryGateway {
    async fn begin(&self) -> Result<Box<dyn WarrantyUnitOfWork>, PortError> {
        Ok(Box::new(self.open().await))
    }
}

#[async_trait]
impl ClaimsPort for MemoryGateway {
    async fn begin(&self) -> Result<Box<dyn ClaimsUnitOfWork>, PortError> {
        Ok(Box::new(self.open().await))
    }
}

/// A serialized unit of work over a working copy of the store
pub struct MemoryUnitOfWork {
    guard: OwnedMutexGuard<MemoryState>,
    work: MemoryState,
    faults: Arc<StdMutex<FaultPlan>>,
}

impl MemoryUnitOfWork {
    fn write(&self, kind: WriteKind) -> Result<(), PortError> {
        let mut plan = self.faults.lock().unwrap_or_else(|e| e.into_inner());
        plan.record(kind)
    }

    fn shop_mut(&mut self, id: ShopId) -> Result<&mut Shop, PortError> {
        self.work
            .shops
            .get_mut(&id)
            .ok_or_else(|| PortError::not_found("Shop", id))
    }

    fn product_mut(&mut self, id: ProductId) -> Result<&mut Product, PortError> {
        self.work
            .products
            .get_mut(&id)
            .ok_or_else(|| PortError::not_found("Product", id))
    }

    fn allocation_mut(
        &mut self,
        id: ProductAllocationId,
    ) -> Result<&mut ProductAllocation, PortError> {
        self.work
            .allocations
            .get_mut(&id)
            .ok_or_else(|| PortError::not_found("ProductAllocation", id))
    }

    fn warranty_mut(&mut self, id: WarrantyId) -> Result<&mut Warranty, PortError> {
        self.work
            .warranties
            .get_mut(&id)
            .ok_or_else(|| PortError::not_found("Warranty", id))
    }

    fn warranty_part_mut(&mut self, id: WarrantyPartId) -> Result<&mut WarrantyPart, PortError> {
        self.work
            .warranty_parts
            .get_mut(&id)
            .ok_or_else(|| PortError::not_found("WarrantyPart", id))
    }

    fn claim_mut(&mut self, id: ClaimId) -> Result<&mut Claim, PortError> {
        self.work
            .claims
            .get_mut(&id)
            .ok_or_else(|| PortError::not_found("Claim", id))
    }

    fn claim_part_mut(&mut self, id: ClaimPartId) -> Result<&mut ClaimWarrantyPart, PortError> {
        self.work
            .claim_parts
            .get_mut(&id)
            .ok_or_else(|| PortError::not_found("ClaimWarrantyPart", id))
    }

    fn check_warranty_part_refs(
        &self,
        warranty: WarrantyId,
        allocation: ProductAllocationId,
        car_part: CarPartId,
    ) -> Result<(), PortError> {
        if !self.work.warranties.contains_key(&warranty) {
            return Err(PortError::conflict(format!(
                "warranty {} does not exist",
                warranty
            )));
        }
        if !self.work.allocations.contains_key(&allocation) {
            return Err(PortError::conflict(format!(
                "product allocation {} does not exist",
                allocation
            )));
        }
        if !self.work.car_parts.iter().any(|c| c.id == car_part) {
            return Err(PortError::conflict(format!(
                "car part {} does not exist",
                car_part
            )));
        }
        Ok(())
    }

    fn check_allocation_refs(&self, allocation: &NewProductAllocation) -> Result<(), PortError> {
        if !self.work.products.contains_key(&allocation.product_id) {
            return Err(PortError::conflict(format!(
                "product {} does not exist",
                allocation.product_id
            )));
        }
        if !self.work.shops.contains_key(&allocation.shop_id) {
            return Err(PortError::conflict(format!(
                "shop {} does not exist",
                allocation.shop_id
            )));
        }
        Ok(())
    }

    fn check_unique_serial(&self, serial: &str, except: Option<ProductId>) -> Result<(), PortError> {
        let taken = self
            .work
            .products
            .values()
            .any(|p| p.film_serial_number == serial && Some(p.id) != except);
        if taken {
            return Err(PortError::conflict(format!(
                "film serial number {} already exists",
                serial
            )));
        }
        Ok(())
    }

    fn check_unique_branch_code(&self, code: &str, except: Option<ShopId>) -> Result<(), PortError> {
        let taken = self
            .work
            .shops
            .values()
            .any(|s| s.branch_code == code && Some(s.id) != except);
        if taken {
            return Err(PortError::conflict(format!(
                "branch code {} already exists",
                code
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl SequenceSource for MemoryUnitOfWork {
    async fn latest_code(
        &mut self,
        sequence: CodeSequence,
        prefix: &str,
    ) -> Result<Option<String>, PortError> {
        let state = &self.work;
        Ok(match sequence {
            CodeSequence::BranchCode => {
                highest_code(state.shops.values().map(|s| s.branch_code.as_str()), prefix)
            }
            CodeSequence::WarrantyNo => highest_code(
                state.warranties.values().map(|w| w.warranty_no.as_str()),
                prefix,
            ),
            CodeSequence::ClaimNo => {
                highest_code(state.claims.values().map(|c| c.claim_no.as_str()), prefix)
            }
        })
    }

    async fn lock_prefix(&mut self, sequence: CodeSequence, prefix: &str) -> Result<(), PortError> {
        // The whole store is already held by this unit of work
        debug!(%sequence, prefix, "prefix lock (implicit)");
        Ok(())
    }
}

#[async_trait]
impl WarrantyUnitOfWork for MemoryUnitOfWork {
    async fn list_states(&mut self) -> Result<Vec<MalaysianState>, PortError> {
        Ok(self.work.states.clone())
    }

    async fn get_state(&mut self, id: StateId) -> Result<MalaysianState, PortError> {
        self.work
            .states
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or_else(|| PortError::not_found("MalaysianState", id))
    }

    async fn list_car_parts(&mut self) -> Result<Vec<CarPart>, PortError> {
        Ok(self.work.car_parts.clone())
    }

    async fn get_car_part(&mut self, id: CarPartId) -> Result<CarPart, PortError> {
        self.work
            .car_parts
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(|| PortError::not_found("CarPart", id))
    }

    async fn list_shops(&mut self) -> Result<Vec<Shop>, PortError> {
        Ok(self.work.shops.values().cloned().collect())
    }

    async fn get_shop(&mut self, id: ShopId) -> Result<Shop, PortError> {
        self.work
            .shops
            .get(&id)
            .cloned()
            .ok_or_else(|| PortError::not_found("Shop", id))
    }

    async fn insert_shop(&mut self, shop: NewShop) -> Result<Shop, PortError> {
        self.write(WriteKind::InsertShop)?;
        let branch_code = shop
            .branch_code
            .ok_or_else(|| PortError::validation_field("branch code is required", "branch_code"))?;
        self.check_unique_branch_code(&branch_code, None)?;

        let id = ShopId::new(self.work.next_id("shops"));
        let now = self.work.now();
        let created = Shop {
            id,
            company_name: shop.company_name,
            company_registration_number: shop.company_registration_number,
            company_license_image_url: shop.company_license_image_url,
            company_contact_number: shop.company_contact_number,
            company_email: shop.company_email,
            company_website_url: shop.company_website_url,
            shop_name: shop.shop_name,
            shop_address: shop.shop_address,
            msia_state_id: shop.msia_state_id,
            branch_code,
            shop_image_url: shop.shop_image_url,
            pic_name: shop.pic_name,
            pic_position: shop.pic_position,
            pic_contact_number: shop.pic_contact_number,
            pic_email: shop.pic_email,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        self.work.shops.insert(id, created.clone());
        Ok(created)
    }

    async fn update_shop(&mut self, id: ShopId, change: ShopChange) -> Result<Shop, PortError> {
        self.write(WriteKind::UpdateShop)?;
        self.check_unique_branch_code(&change.branch_code, Some(id))?;
        let now = self.work.now();
        let shop = self.shop_mut(id)?;
        shop.company_name = change.company_name;
        shop.company_registration_number = change.company_registration_number;
        shop.company_license_image_url = change.company_license_image_url;
        shop.company_contact_number = change.company_contact_number;
        shop.company_email = change.company_email;
        shop.company_website_url = change.company_website_url;
        shop.shop_name = change.shop_name;
        shop.shop_address = change.shop_address;
        shop.msia_state_id = change.msia_state_id;
        shop.branch_code = change.branch_code;
        shop.shop_image_url = change.shop_image_url;
        shop.pic_name = change.pic_name;
        shop.pic_position = change.pic_position;
        shop.pic_contact_number = change.pic_contact_number;
        shop.pic_email = change.pic_email;
        shop.is_active = change.is_active;
        shop.updated_at = now;
        Ok(shop.clone())
    }

    async fn insert_user(&mut self, user: NewUser) -> Result<User, PortError> {
        self.write(WriteKind::InsertUser)?;
        if self.work.users.values().any(|u| u.username == user.username) {
            return Err(PortError::conflict(format!(
                "username {} already exists",
                user.username
            )));
        }
        if let Some(shop) = user.shop_id {
            if !self.work.shops.contains_key(&shop) {
                return Err(PortError::conflict(format!("shop {} does not exist", shop)));
            }
        }
        let id = UserId::new(self.work.next_id("users"));
        let now = self.work.now();
        let created = User {
            id,
            shop_id: user.shop_id,
            username: user.username,
            role: user.role,
            password_hash: user.password_hash,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        self.work.users.insert(id, created.clone());
        Ok(created)
    }

    async fn get_user(&mut self, id: UserId) -> Result<User, PortError> {
        self.work
            .users
            .get(&id)
            .cloned()
            .ok_or_else(|| PortError::not_found("User", id))
    }

    async fn find_user_by_username(&mut self, username: &str) -> Result<Option<User>, PortError> {
        Ok(self
            .work
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn set_user_password(
        &mut self,
        id: UserId,
        password_hash: String,
    ) -> Result<User, PortError> {
        self.write(WriteKind::SetUserPassword)?;
        let now = self.work.now();
        let user = self
            .work
            .users
            .get_mut(&id)
            .ok_or_else(|| PortError::not_found("User", id))?;
        user.password_hash = password_hash;
        user.updated_at = now;
        Ok(user.clone())
    }

    async fn list_products(&mut self) -> Result<Vec<Product>, PortError> {
        Ok(self.work.products.values().cloned().collect())
    }

    async fn get_product(&mut self, id: ProductId) -> Result<Product, PortError> {
        self.work
            .products
            .get(&id)
            .cloned()
            .ok_or_else(|| PortError::not_found("Product", id))
    }

    async fn insert_product(&mut self, product: NewProduct) -> Result<Product, PortError> {
        self.write(WriteKind::InsertProduct)?;
        self.check_unique_serial(&product.film_serial_number, None)?;
        let id = ProductId::new(self.work.next_id("products"));
        let now = self.work.now();
        let created = Product {
            id,
            brand: product.brand,
            film_type: product.film_type,
            series: product.series,
            name: product.name,
            warranty_in_months: product.warranty_in_months,
            film_serial_number: product.film_serial_number,
            film_quantity: product.film_quantity,
            shipment_number: product.shipment_number,
            description: product.description,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        self.work.products.insert(id, created.clone());
        Ok(created)
    }

    async fn update_product(
        &mut self,
        id: ProductId,
        change: ProductChange,
    ) -> Result<Product, PortError> {
        self.write(WriteKind::UpdateProduct)?;
        self.check_unique_serial(&change.film_serial_number, Some(id))?;
        let now = self.work.now();
        let product = self.product_mut(id)?;
        product.brand = change.brand;
        product.film_type = change.film_type;
        product.series = change.series;
        product.name = change.name;
        product.warranty_in_months = change.warranty_in_months;
        product.film_serial_number = change.film_serial_number;
        product.film_quantity = change.film_quantity;
        product.shipment_number = change.shipment_number;
        product.description = change.description;
        product.is_active = change.is_active;
        product.updated_at = now;
        Ok(product.clone())
    }

    async fn list_product_allocations(&mut self) -> Result<Vec<ProductAllocation>, PortError> {
        Ok(self.work.allocations.values().cloned().collect())
    }

    async fn get_product_allocation(
        &mut self,
        id: ProductAllocationId,
    ) -> Result<ProductAllocation, PortError> {
        self.work
            .allocations
            .get(&id)
            .cloned()
            .ok_or_else(|| PortError::not_found("ProductAllocation", id))
    }

    async fn insert_product_allocation(
        &mut self,
        allocation: NewProductAllocation,
    ) -> Result<ProductAllocation, PortError> {
        self.write(WriteKind::InsertProductAllocation)?;
        self.check_allocation_refs(&allocation)?;
        let id = ProductAllocationId::new(self.work.next_id("product_allocations"));
        let now = self.work.now();
        let created = ProductAllocation {
            id,
            product_id: allocation.product_id,
            shop_id: allocation.shop_id,
            film_quantity: allocation.film_quantity,
            allocation_date: allocation.allocation_date,
            created_at: now,
            updated_at: now,
        };
        self.work.allocations.insert(id, created.clone());
        Ok(created)
    }

    async fn update_product_allocation(
        &mut self,
        id: ProductAllocationId,
        change: NewProductAllocation,
    ) -> Result<ProductAllocation, PortError> {
        self.write(WriteKind::UpdateProductAllocation)?;
        self.check_allocation_refs(&change)?;
        let now = self.work.now();
        let allocation = self.allocation_mut(id)?;
        allocation.product_id = change.product_id;
        allocation.shop_id = change.shop_id;
        allocation.film_quantity = change.film_quantity;
        allocation.allocation_date = change.allocation_date;
        allocation.updated_at = now;
        Ok(allocation.clone())
    }

    async fn list_shop_products(&mut self, shop: ShopId) -> Result<Vec<ShopProduct>, PortError> {
        let state = &self.work;
        Ok(state
            .allocations
            .values()
            .filter(|a| a.shop_id == shop)
            .filter_map(|a| {
                state
                    .products
                    .get(&a.product_id)
                    .map(|p| ShopProduct::new(a, p))
            })
            .collect())
    }

    async fn list_warranties(&mut self) -> Result<Vec<Warranty>, PortError> {
        Ok(self.work.warranties.values().cloned().collect())
    }

    async fn list_warranties_by_shop(&mut self, shop: ShopId) -> Result<Vec<Warranty>, PortError> {
        Ok(self
            .work
            .warranties
            .values()
            .filter(|w| w.shop_id == shop)
            .cloned()
            .collect())
    }

    async fn get_warranty(&mut self, id: WarrantyId) -> Result<Warranty, PortError> {
        self.work
            .warranties
            .get(&id)
            .cloned()
            .ok_or_else(|| PortError::not_found("Warranty", id))
    }

    async fn search_warranties(&mut self, term: &str) -> Result<Vec<Warranty>, PortError> {
        Ok(self
            .work
            .warranties
            .values()
            .filter(|w| {
                w.warranty_no.eq_ignore_ascii_case(term) || w.car_plate_no.eq_ignore_ascii_case(term)
            })
            .cloned()
            .collect())
    }

    async fn insert_warranty(&mut self, warranty: NewWarranty) -> Result<Warranty, PortError> {
        self.write(WriteKind::InsertWarranty)?;
        let warranty_no = warranty
            .warranty_no
            .ok_or_else(|| PortError::validation_field("warranty number is required", "warranty_no"))?;
        if self.work.warranties.values().any(|w| w.warranty_no == warranty_no) {
            return Err(PortError::conflict(format!(
                "warranty number {} already exists",
                warranty_no
            )));
        }
        if !self.work.shops.contains_key(&warranty.shop_id) {
            return Err(PortError::conflict(format!(
                "shop {} does not exist",
                warranty.shop_id
            )));
        }

        let id = WarrantyId::new(self.work.next_id("warranties"));
        let now = self.work.now();
        let created = Warranty {
            id,
            shop_id: warranty.shop_id,
            client_name: warranty.client_name,
            client_contact: warranty.client_contact,
            client_email: warranty.client_email,
            car_brand: warranty.car_brand,
            car_model: warranty.car_model,
            car_colour: warranty.car_colour,
            car_plate_no: warranty.car_plate_no,
            car_chassis_no: warranty.car_chassis_no,
            installation_date: warranty.installation_date,
            reference_no: warranty.reference_no,
            warranty_no,
            invoice_attachment_url: warranty.invoice_attachment_url,
            is_active: true,
            approval_status: ApprovalStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        self.work.warranties.insert(id, created.clone());
        Ok(created)
    }

    async fn update_warranty(
        &mut self,
        id: WarrantyId,
        change: WarrantyChange,
    ) -> Result<Warranty, PortError> {
        self.write(WriteKind::UpdateWarranty)?;
        let now = self.work.now();
        let warranty = self.warranty_mut(id)?;
        warranty.client_name = change.client_name;
        warranty.client_contact = change.client_contact;
        warranty.client_email = change.client_email;
        warranty.car_brand = change.car_brand;
        warranty.car_model = change.car_model;
        warranty.car_colour = change.car_colour;
        warranty.car_plate_no = change.car_plate_no;
        warranty.car_chassis_no = change.car_chassis_no;
        warranty.installation_date = change.installation_date;
        warranty.reference_no = change.reference_no;
        warranty.invoice_attachment_url = change.invoice_attachment_url;
        warranty.updated_at = now;
        Ok(warranty.clone())
    }

    async fn set_warranty_approval(
        &mut self,
        id: WarrantyId,
        status: ApprovalStatus,
    ) -> Result<Warranty, PortError> {
        self.write(WriteKind::SetWarrantyApproval)?;
        let now = self.work.now();
        let warranty = self.warranty_mut(id)?;
        warranty.approval_status = status;
        warranty.updated_at = now;
        Ok(warranty.clone())
    }

    async fn list_warranty_parts(
        &mut self,
        warranty: WarrantyId,
    ) -> Result<Vec<WarrantyPart>, PortError> {
        Ok(self
            .work
            .warranty_parts
            .values()
            .filter(|p| p.warranty_id == warranty)
            .cloned()
            .collect())
    }

    async fn get_warranty_part(&mut self, id: WarrantyPartId) -> Result<WarrantyPart, PortError> {
        self.work
            .warranty_parts
            .get(&id)
            .cloned()
            .ok_or_else(|| PortError::not_found("WarrantyPart", id))
    }

    async fn insert_warranty_part(
        &mut self,
        warranty: WarrantyId,
        part: NewWarrantyPart,
    ) -> Result<WarrantyPart, PortError> {
        self.write(WriteKind::InsertWarrantyPart)?;
        self.check_warranty_part_refs(warranty, part.product_allocation_id, part.car_part_id)?;

        let id = WarrantyPartId::new(self.work.next_id("warranty_parts"));
        let now = self.work.now();
        let created = WarrantyPart {
            id,
            warranty_id: warranty,
            product_allocation_id: part.product_allocation_id,
            car_part_id: part.car_part_id,
            installation_image_url: part.installation_image_url,
            approval_status: ApprovalStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        self.work.warranty_parts.insert(id, created.clone());
        Ok(created)
    }

    async fn update_warranty_part(
        &mut self,
        warranty: WarrantyId,
        id: WarrantyPartId,
        change: WarrantyPartChange,
    ) -> Result<WarrantyPart, PortError> {
        self.write(WriteKind::UpdateWarrantyPart)?;
        self.check_warranty_part_refs(
            warranty,
            change.product_allocation_id,
            change.car_part_id,
        )?;
        let now = self.work.now();
        let part = self.warranty_part_mut(id)?;
        if part.warranty_id != warranty {
            return Err(PortError::not_found("WarrantyPart", id));
        }
        part.product_allocation_id = change.product_allocation_id;
        part.car_part_id = change.car_part_id;
        part.installation_image_url = change.installation_image_url;
        part.updated_at = now;
        Ok(part.clone())
    }

    async fn set_warranty_part_approval(
        &mut self,
        id: WarrantyPartId,
        status: ApprovalStatus,
    ) -> Result<WarrantyPart, PortError> {
        self.write(WriteKind::SetWarrantyPartApproval)?;
        let now = self.work.now();
        let part = self.warranty_part_mut(id)?;
        part.approval_status = status;
        part.updated_at = now;
        Ok(part.clone())
    }

    async fn delete_warranty_part(&mut self, id: WarrantyPartId) -> Result<(), PortError> {
        self.write(WriteKind::DeleteWarrantyPart)?;
        if self.work.claim_parts.values().any(|c| c.warranty_part_id == id) {
            return Err(PortError::conflict(format!(
                "warranty part {} is referenced by a claim",
                id
            )));
        }
        self.work
            .warranty_parts
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| PortError::not_found("WarrantyPart", id))
    }

    async fn commit(self: Box<Self>) -> Result<(), PortError> {
        self.write(WriteKind::Commit)?;
        let MemoryUnitOfWork {
            mut guard, work, ..
        } = *self;
        *guard = work;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), PortError> {
        Ok(())
    }
}

#[async_trait]
impl ClaimsUnitOfWork for MemoryUnitOfWork {
    async fn list_claims(&mut self) -> Result<Vec<Claim>, PortError> {
        Ok(self.work.claims.values().cloned().collect())
    }

    async fn list_claims_by_shop(&mut self, shop: ShopId) -> Result<Vec<Claim>, PortError> {
        let state = &self.work;
        Ok(state
            .claims
            .values()
            .filter(|c| {
                state
                    .warranties
                    .get(&c.warranty_id)
                    .is_some_and(|w| w.shop_id == shop)
            })
            .cloned()
            .collect())
    }

    async fn get_claim(&mut self, id: ClaimId) -> Result<Claim, PortError> {
        self.work
            .claims
            .get(&id)
            .cloned()
            .ok_or_else(|| PortError::not_found("Claim", id))
    }

    async fn insert_claim(&mut self, claim: NewClaim) -> Result<Claim, PortError> {
        self.write(WriteKind::InsertClaim)?;
        let claim_no = claim
            .claim_no
            .ok_or_else(|| PortError::validation_field("claim number is required", "claim_no"))?;
        if self.work.claims.values().any(|c| c.claim_no == claim_no) {
            return Err(PortError::conflict(format!(
                "claim number {} already exists",
                claim_no
            )));
        }
        if !self.work.warranties.contains_key(&claim.warranty_id) {
            return Err(PortError::conflict(format!(
                "warranty {} does not exist",
                claim.warranty_id
            )));
        }

        let id = ClaimId::new(self.work.next_id("claims"));
        let now = self.work.now();
        let created = Claim {
            id,
            warranty_id: claim.warranty_id,
            claim_no,
            claim_date: claim.claim_date,
            approval_status: ApprovalStatus::Pending,
            status: LifecycleStatus::Open,
            created_at: now,
            updated_at: now,
        };
        self.work.claims.insert(id, created.clone());
        Ok(created)
    }

    async fn update_claim(&mut self, id: ClaimId, change: ClaimChange) -> Result<Claim, PortError> {
        self.write(WriteKind::UpdateClaim)?;
        let now = self.work.now();
        let claim = self.claim_mut(id)?;
        claim.claim_date = change.claim_date;
        claim.updated_at = now;
        Ok(claim.clone())
    }

    async fn set_claim_approval(
        &mut self,
        id: ClaimId,
        status: ApprovalStatus,
    ) -> Result<Claim, PortError> {
        self.write(WriteKind::SetClaimApproval)?;
        let now = self.work.now();
        let claim = self.claim_mut(id)?;
        claim.approval_status = status;
        claim.updated_at = now;
        Ok(claim.clone())
    }

    async fn set_claim_status(
        &mut self,
        id: ClaimId,
        status: LifecycleStatus,
    ) -> Result<Claim, PortError> {
        self.write(WriteKind::SetClaimStatus)?;
        let now = self.work.now();
        let claim = self.claim_mut(id)?;
        claim.status = status;
        claim.updated_at = now;
        Ok(claim.clone())
    }

    async fn list_claim_parts(
        &mut self,
        claim: ClaimId,
    ) -> Result<Vec<ClaimWarrantyPart>, PortError> {
        Ok(self
            .work
            .claim_parts
            .values()
            .filter(|p| p.claim_id == claim)
            .cloned()
            .collect())
    }

    async fn get_claim_part(&mut self, id: ClaimPartId) -> Result<ClaimWarrantyPart, PortError> {
        self.work
            .claim_parts
            .get(&id)
            .cloned()
            .ok_or_else(|| PortError::not_found("ClaimWarrantyPart", id))
    }

    async fn insert_claim_part(
        &mut self,
        claim: ClaimId,
        part: NewClaimPart,
    ) -> Result<ClaimWarrantyPart, PortError> {
        self.write(WriteKind::InsertClaimPart)?;
        if !self.work.claims.contains_key(&claim) {
            return Err(PortError::conflict(format!("claim {} does not exist", claim)));
        }
        if !self.work.warranty_parts.contains_key(&part.warranty_part_id) {
            return Err(PortError::conflict(format!(
                "warranty part {} does not exist",
                part.warranty_part_id
            )));
        }

        let id = ClaimPartId::new(self.work.next_id("claim_parts"));
        let now = self.work.now();
        let created = ClaimWarrantyPart {
            id,
            claim_id: claim,
            warranty_part_id: part.warranty_part_id,
            damaged_image_url: part.damaged_image_url,
            remarks: part.remarks,
            resolution_date: part.resolution_date,
            resolution_image_url: part.resolution_image_url,
            approval_status: ApprovalStatus::Pending,
            status: LifecycleStatus::Open,
            created_at: now,
            updated_at: now,
        };
        self.work.claim_parts.insert(id, created.clone());
        Ok(created)
    }

    async fn update_claim_part(
        &mut self,
        claim: ClaimId,
        id: ClaimPartId,
        change: ClaimPartChange,
    ) -> Result<ClaimWarrantyPart, PortError> {
        self.write(WriteKind::UpdateClaimPart)?;
        if !self.work.warranty_parts.contains_key(&change.warranty_part_id) {
            return Err(PortError::conflict(format!(
                "warranty part {} does not exist",
                change.warranty_part_id
            )));
        }
        let now = self.work.now();
        let part = self.claim_part_mut(id)?;
        if part.claim_id != claim {
            return Err(PortError::not_found("ClaimWarrantyPart", id));
        }
        part.warranty_part_id = change.warranty_part_id;
        part.damaged_image_url = change.damaged_image_url;
        part.remarks = change.remarks;
        part.resolution_date = change.resolution_date;
        part.resolution_image_url = change.resolution_image_url;
        part.updated_at = now;
        Ok(part.clone())
    }

    async fn set_claim_part_approval(
        &mut self,
        id: ClaimPartId,
        status: ApprovalStatus,
    ) -> Result<ClaimWarrantyPart, PortError> {
        self.write(WriteKind::SetClaimPartApproval)?;
        let now = self.work.now();
        let part = self.claim_part_mut(id)?;
        part.approval_status = status;
        part.updated_at = now;
        Ok(part.clone())
    }

    async fn set_claim_part_status(
        &mut self,
        id: ClaimPartId,
        status: LifecycleStatus,
    ) -> Result<ClaimWarrantyPart, PortError> {
        self.write(WriteKind::SetClaimPartStatus)?;
        let now = self.work.now();
        let part = self.claim_part_mut(id)?;
        part.status = status;
        part.updated_at = now;
        Ok(part.clone())
    }

    async fn delete_claim_part(&mut self, id: ClaimPartId) -> Result<(), PortError> {
        self.write(WriteKind::DeleteClaimPart)?;
        self.work
            .claim_parts
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| PortError::not_found("ClaimWarrantyPart", id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_highest_code_prefers_longer_suffix() {
        let codes = ["JH09", "JH99", "JH100", "KL200"];
        assert_eq!(
            highest_code(codes.iter().copied(), "JH"),
            Some("JH100".to_string())
        );
        assert_eq!(highest_code(codes.iter().copied(), "PG"), None);
    }

    #[test]
    fn test_ids_are_counted_per_table() {
        let mut state = MemoryState::default();
        assert_eq!(state.next_id("shops"), 1);
        assert_eq!(state.next_id("shops"), 2);
        assert_eq!(state.next_id("products"), 1);
    }

    #[test]
    fn test_clock_is_strictly_increasing() {
        let mut state = MemoryState::default();
        let a = state.now();
        let b = state.now();
        let c = state.now();
        assert!(a < b && b < c);
    }

    #[test]
    fn test_fault_fires_once_on_nth_write() {
        let mut plan = FaultPlan::default();
        plan.pending.insert(WriteKind::InsertWarrantyPart, 2);
        assert!(plan.record(WriteKind::InsertWarrantyPart).is_ok());
        assert!(plan.record(WriteKind::InsertWarrantyPart).is_err());
        assert!(plan.record(WriteKind::InsertWarrantyPart).is_ok());
        assert_eq!(plan.seen[&WriteKind::InsertWarrantyPart], 3);
    }

    #[tokio::test]
    async fn test_dropped_unit_of_work_discards_writes() {
        let gateway = MemoryGateway::new();
        {
            let mut uow = WarrantyPort::begin(&gateway).await.unwrap();
            uow.insert_shop(NewShop {
                branch_code: Some("JH01".into()),
                ..NewShop::default()
            })
            .await
            .unwrap();
        }
        assert_eq!(gateway.shop_count().await, 0);
    }

    #[tokio::test]
    async fn test_commit_publishes_writes() {
        let gateway = MemoryGateway::new();
        let mut uow = WarrantyPort::begin(&gateway).await.unwrap();
        uow.insert_shop(NewShop {
            branch_code: Some("JH01".into()),
            ..NewShop::default()
        })
        .await
        .unwrap();
        uow.commit().await.unwrap();
        assert_eq!(gateway.shop_count().await, 1);
    }
}
