//! Application services for shops, accounts, stock and warranties
//!
//! Every operation opens one unit of work, performs its reads and writes,
//! and commits once. Returning early with `?` drops the unit of work, which
//! rolls it back.

use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use core_kernel::{
    cascade_from_parent, create_with_children, preview_code, recompute_from_child, reserve_code,
    resync_parent, update_with_children, ApprovalStatus, CodeSequence, ProductAllocationId,
    ProductId, ShopId, UserId, WarrantyId, WarrantyPartId,
};

use crate::account::{
    check_password_strength, hash_password, verify_password, NewAccount, NewUser, User, UserRole,
};
use crate::axes::{WarrantyApprovalAxis, WarrantyComposite};
use crate::error::WarrantyError;
use crate::numbering::{branch_code_prefix, split_branch_and_date, warranty_no_prefix};
use crate::ports::{WarrantyPort, WarrantyUnitOfWork};
use crate::product::{
    NewProduct, NewProductAllocation, Product, ProductAllocation, ProductChange, ShopProduct,
};
use crate::shop::{shop_login_username, MalaysianState, NewShop, Shop, ShopChange};
use crate::warranty::{
    CarPart, NewWarranty, NewWarrantyPart, Warranty, WarrantyChange, WarrantyPart,
    WarrantyPartChange, WarrantyWithParts,
};

/// Ends a read-only unit of work and hands back what it read
async fn finish_read<T>(uow: Box<dyn WarrantyUnitOfWork>, value: T) -> Result<T, WarrantyError> {
    uow.rollback().await?;
    Ok(value)
}

async fn load_composite(
    uow: &mut dyn WarrantyUnitOfWork,
    id: WarrantyId,
) -> Result<WarrantyWithParts, WarrantyError> {
    let parent = uow.get_warranty(id).await?;
    let children = uow.list_warranty_parts(id).await?;
    Ok(WarrantyWithParts { parent, children })
}

// ============================================================================
// Shops
// ============================================================================

/// Shop registration and maintenance
pub struct ShopService {
    port: Arc<dyn WarrantyPort>,
    default_password: String,
}

impl ShopService {
    /// Creates the service
    ///
    /// # Arguments
    ///
    /// * `port` - the warranty store
    /// * `default_password` - initial password of every shop login
    pub fn new(port: Arc<dyn WarrantyPort>, default_password: impl Into<String>) -> Self {
        Self {
            port,
            default_password: default_password.into(),
        }
    }

    #[instrument(skip(self))]
    pub async fn list_states(&self) -> Result<Vec<MalaysianState>, WarrantyError> {
        let mut uow = self.port.begin().await?;
        let states = uow.list_states().await?;
        finish_read(uow, states).await
    }

    #[instrument(skip(self))]
    pub async fn list_shops(&self) -> Result<Vec<Shop>, WarrantyError> {
        let mut uow = self.port.begin().await?;
        let shops = uow.list_shops().await?;
        finish_read(uow, shops).await
    }

    #[instrument(skip(self), fields(shop_id = %id))]
    pub async fn get_shop(&self, id: ShopId) -> Result<Shop, WarrantyError> {
        let mut uow = self.port.begin().await?;
        let shop = uow.get_shop(id).await?;
        finish_read(uow, shop).await
    }

    /// Returns the branch code the next shop in the state would receive
    ///
    /// The value is advisory; concurrent registrations may take it first.
    #[instrument(skip(self))]
    pub async fn preview_branch_code(&self, state_code: &str) -> Result<String, WarrantyError> {
        let prefix = branch_code_prefix(state_code)?;
        let mut uow = self.port.begin().await?;
        let code = preview_code(&mut *uow, CodeSequence::BranchCode, &prefix).await?;
        finish_read(uow, code).await
    }

    /// Registers a shop together with its `shop_admin` login
    ///
    /// A missing branch code is generated from the shop's state inside the
    /// same unit of work. The shop and its login are committed together.
    #[instrument(skip(self, shop), fields(shop_name = %shop.shop_name))]
    pub async fn create_shop(&self, mut shop: NewShop) -> Result<Shop, WarrantyError> {
        shop.validate()?;
        let password_hash = hash_password(&self.default_password)?;

        let mut uow = self.port.begin().await?;

        let branch_code = match shop.branch_code.take() {
            Some(code) => code.trim().to_ascii_uppercase(),
            None => {
                let state_id = shop.msia_state_id.ok_or_else(|| {
                    WarrantyError::validation("a state is required to generate a branch code")
                })?;
                let state = uow.get_state(state_id).await?;
                let prefix = branch_code_prefix(&state.code)?;
                reserve_code(&mut *uow, CodeSequence::BranchCode, &prefix).await?
            }
        };
        shop.branch_code = Some(branch_code.clone());

        let created = uow.insert_shop(shop).await?;
        let login = uow
            .insert_user(NewUser {
                shop_id: Some(created.id),
                username: shop_login_username(&created.branch_code),
                role: UserRole::ShopAdmin,
                password_hash,
            })
            .await?;

        uow.commit().await?;
        info!(shop_id = %created.id, branch_code = %branch_code, username = %login.username, "shop registered");
        Ok(created)
    }

    #[instrument(skip(self, change), fields(shop_id = %id))]
    pub async fn update_shop(&self, id: ShopId, mut change: ShopChange) -> Result<Shop, WarrantyError> {
        change.validate()?;
        change.branch_code = change.branch_code.trim().to_ascii_uppercase();

        let mut uow = self.port.begin().await?;
        let updated = uow.update_shop(id, change).await?;
        uow.commit().await?;
        Ok(updated)
    }
}

// ============================================================================
// Accounts
// ============================================================================

/// Login accounts: credential checks, administration and password changes
pub struct AccountService {
    port: Arc<dyn WarrantyPort>,
}

impl AccountService {
    pub fn new(port: Arc<dyn WarrantyPort>) -> Self {
        Self { port }
    }

    /// Verifies a username and password against the stored hash
    ///
    /// Unknown users and wrong passwords produce the same error.
    #[instrument(skip(self, password))]
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<User, WarrantyError> {
        let mut uow = self.port.begin().await?;
        let user = uow.find_user_by_username(username.trim()).await?;
        uow.rollback().await?;

        let user = user.ok_or(WarrantyError::InvalidCredentials)?;
        if !verify_password(password, &user.password_hash)? {
            warn!(username, "password mismatch");
            return Err(WarrantyError::InvalidCredentials);
        }
        if !user.is_active {
            return Err(WarrantyError::AccountDisabled);
        }
        Ok(user)
    }

    #[instrument(skip(self), fields(user_id = %id))]
    pub async fn get_user(&self, id: UserId) -> Result<User, WarrantyError> {
        let mut uow = self.port.begin().await?;
        let user = uow.get_user(id).await?;
        finish_read(uow, user).await
    }

    #[instrument(skip(self))]
    pub async fn get_user_by_username(&self, username: &str) -> Result<User, WarrantyError> {
        let username = username.trim();
        let mut uow = self.port.begin().await?;
        let user = uow.find_user_by_username(username).await?;
        let user = finish_read(uow, user).await?;
        user.ok_or_else(|| WarrantyError::not_found("User", username))
    }

    /// Creates a login; the password is hashed before it reaches the store
    #[instrument(skip(self, account), fields(username = %account.username, role = %account.role))]
    pub async fn create_user(&self, account: NewAccount) -> Result<User, WarrantyError> {
        account.validate()?;
        let password_hash = hash_password(&account.password)?;

        let mut uow = self.port.begin().await?;
        if let Some(shop) = account.shop_id {
            uow.get_shop(shop).await?;
        }
        let created = uow
            .insert_user(NewUser {
                shop_id: account.shop_id,
                username: account.username.trim().to_string(),
                role: account.role,
                password_hash,
            })
            .await?;
        uow.commit().await?;
        info!(user_id = %created.id, username = %created.username, "account created");
        Ok(created)
    }

    /// Replaces a password after checking the current one
    #[instrument(skip(self, current, new_password), fields(user_id = %id))]
    pub async fn change_password(
        &self,
        id: UserId,
        current: &str,
        new_password: &str,
    ) -> Result<User, WarrantyError> {
        check_password_strength(new_password)?;

        let mut uow = self.port.begin().await?;
        let user = uow.get_user(id).await?;
        if !verify_password(current, &user.password_hash)? {
            warn!(user_id = %id, "current password mismatch");
            return Err(WarrantyError::InvalidCredentials);
        }
        let password_hash = hash_password(new_password)?;
        let updated = uow.set_user_password(id, password_hash).await?;
        uow.commit().await?;
        info!(user_id = %id, "password changed");
        Ok(updated)
    }
}

// ============================================================================
// Products and stock
// ============================================================================

/// Film product catalogue and the stock allocated to shops
pub struct ProductService {
    port: Arc<dyn WarrantyPort>,
}

impl ProductService {
    pub fn new(port: Arc<dyn WarrantyPort>) -> Self {
        Self { port }
    }

    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<Product>, WarrantyError> {
        let mut uow = self.port.begin().await?;
        let products = uow.list_products().await?;
        finish_read(uow, products).await
    }

    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: ProductId) -> Result<Product, WarrantyError> {
        let mut uow = self.port.begin().await?;
        let product = uow.get_product(id).await?;
        finish_read(uow, product).await
    }

    #[instrument(skip(self, product), fields(serial = %product.film_serial_number))]
    pub async fn create_product(&self, mut product: NewProduct) -> Result<Product, WarrantyError> {
        product.validate()?;
        product.film_serial_number = product.film_serial_number.trim().to_string();

        let mut uow = self.port.begin().await?;
        let created = uow.insert_product(product).await?;
        uow.commit().await?;
        info!(product_id = %created.id, "product registered");
        Ok(created)
    }

    #[instrument(skip(self, change), fields(product_id = %id))]
    pub async fn update_product(
        &self,
        id: ProductId,
        mut change: ProductChange,
    ) -> Result<Product, WarrantyError> {
        change.validate()?;
        change.film_serial_number = change.film_serial_number.trim().to_string();

        let mut uow = self.port.begin().await?;
        let updated = uow.update_product(id, change).await?;
        uow.commit().await?;
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn list_allocations(&self) -> Result<Vec<ProductAllocation>, WarrantyError> {
        let mut uow = self.port.begin().await?;
        let allocations = uow.list_product_allocations().await?;
        finish_read(uow, allocations).await
    }

    #[instrument(skip(self), fields(allocation_id = %id))]
    pub async fn get_allocation(
        &self,
        id: ProductAllocationId,
    ) -> Result<ProductAllocation, WarrantyError> {
        let mut uow = self.port.begin().await?;
        let allocation = uow.get_product_allocation(id).await?;
        finish_read(uow, allocation).await
    }

    /// Hands stock of a product to a shop
    ///
    /// An unknown product or shop is reported as not found rather than as a
    /// foreign-key conflict.
    #[instrument(skip(self, allocation), fields(product_id = %allocation.product_id, shop_id = %allocation.shop_id))]
    pub async fn allocate(
        &self,
        allocation: NewProductAllocation,
    ) -> Result<ProductAllocation, WarrantyError> {
        allocation.validate()?;

        let mut uow = self.port.begin().await?;
        uow.get_product(allocation.product_id).await?;
        uow.get_shop(allocation.shop_id).await?;
        let created = uow.insert_product_allocation(allocation).await?;
        uow.commit().await?;
        info!(allocation_id = %created.id, quantity = created.film_quantity, "stock allocated");
        Ok(created)
    }

    #[instrument(skip(self, change), fields(allocation_id = %id))]
    pub async fn update_allocation(
        &self,
        id: ProductAllocationId,
        change: NewProductAllocation,
    ) -> Result<ProductAllocation, WarrantyError> {
        change.validate()?;

        let mut uow = self.port.begin().await?;
        uow.get_product(change.product_id).await?;
        uow.get_shop(change.shop_id).await?;
        let updated = uow.update_product_allocation(id, change).await?;
        uow.commit().await?;
        Ok(updated)
    }

    /// Products a shop can register warranty parts against
    #[instrument(skip(self), fields(shop_id = %shop))]
    pub async fn list_shop_products(&self, shop: ShopId) -> Result<Vec<ShopProduct>, WarrantyError> {
        let mut uow = self.port.begin().await?;
        uow.get_shop(shop).await?;
        let products = uow.list_shop_products(shop).await?;
        finish_read(uow, products).await
    }
}

// ============================================================================
// Warranties
// ============================================================================

/// Warranty registration, composite updates and approval
pub struct WarrantyService {
    port: Arc<dyn WarrantyPort>,
}

impl WarrantyService {
    pub fn new(port: Arc<dyn WarrantyPort>) -> Self {
        Self { port }
    }

    #[instrument(skip(self))]
    pub async fn list_warranties(&self) -> Result<Vec<Warranty>, WarrantyError> {
        let mut uow = self.port.begin().await?;
        let warranties = uow.list_warranties().await?;
        finish_read(uow, warranties).await
    }

    #[instrument(skip(self), fields(shop_id = %shop))]
    pub async fn list_by_shop(&self, shop: ShopId) -> Result<Vec<Warranty>, WarrantyError> {
        let mut uow = self.port.begin().await?;
        let warranties = uow.list_warranties_by_shop(shop).await?;
        finish_read(uow, warranties).await
    }

    #[instrument(skip(self), fields(warranty_id = %id))]
    pub async fn get_warranty(&self, id: WarrantyId) -> Result<WarrantyWithParts, WarrantyError> {
        let mut uow = self.port.begin().await?;
        let composite = load_composite(&mut *uow, id).await?;
        finish_read(uow, composite).await
    }

    #[instrument(skip(self), fields(warranty_id = %id))]
    pub async fn list_parts(&self, id: WarrantyId) -> Result<Vec<WarrantyPart>, WarrantyError> {
        let mut uow = self.port.begin().await?;
        uow.get_warranty(id).await?;
        let parts = uow.list_warranty_parts(id).await?;
        finish_read(uow, parts).await
    }

    /// Exact lookup by warranty number or plate number, with parts
    #[instrument(skip(self))]
    pub async fn search(&self, term: &str) -> Result<Vec<WarrantyWithParts>, WarrantyError> {
        let term = term.trim();
        if term.is_empty() {
            return Err(WarrantyError::validation("search term is required"));
        }

        let mut uow = self.port.begin().await?;
        let mut results = Vec::new();
        for parent in uow.search_warranties(term).await? {
            let children = uow.list_warranty_parts(parent.id).await?;
            results.push(WarrantyWithParts { parent, children });
        }
        finish_read(uow, results).await
    }

    #[instrument(skip(self))]
    pub async fn list_car_parts(&self) -> Result<Vec<CarPart>, WarrantyError> {
        let mut uow = self.port.begin().await?;
        let parts = uow.list_car_parts().await?;
        finish_read(uow, parts).await
    }

    /// Returns the warranty number the next warranty would receive
    #[instrument(skip(self))]
    pub async fn preview_warranty_no(
        &self,
        branch_code: &str,
        installation_date: NaiveDate,
    ) -> Result<String, WarrantyError> {
        let prefix = warranty_no_prefix(branch_code, installation_date);
        let mut uow = self.port.begin().await?;
        let code = preview_code(&mut *uow, CodeSequence::WarrantyNo, &prefix).await?;
        finish_read(uow, code).await
    }

    /// Same as [`Self::preview_warranty_no`] for a `BRANCH-DATE` path key
    pub async fn preview_warranty_no_for_key(&self, key: &str) -> Result<String, WarrantyError> {
        let (branch_code, installation_date) = split_branch_and_date(key)?;
        self.preview_warranty_no(&branch_code, installation_date).await
    }

    /// Registers a warranty and all of its parts atomically
    ///
    /// Without a warranty number in the request, the next number for the
    /// shop's branch and installation date is reserved in the same unit of
    /// work.
    #[instrument(skip(self, warranty, parts), fields(shop_id = %warranty.shop_id, parts = parts.len()))]
    pub async fn create_warranty(
        &self,
        mut warranty: NewWarranty,
        parts: Vec<NewWarrantyPart>,
    ) -> Result<WarrantyWithParts, WarrantyError> {
        warranty.validate(&parts)?;

        let mut uow = self.port.begin().await?;

        let warranty_no = match warranty.warranty_no.take() {
            Some(no) => no.trim().to_ascii_uppercase(),
            None => {
                let shop = uow.get_shop(warranty.shop_id).await?;
                let prefix = warranty_no_prefix(&shop.branch_code, warranty.installation_date);
                reserve_code(&mut *uow, CodeSequence::WarrantyNo, &prefix).await?
            }
        };
        warranty.warranty_no = Some(warranty_no);

        let composite =
            create_with_children(&mut WarrantyComposite::new(&mut *uow), warranty, parts).await?;

        uow.commit().await?;
        info!(
            warranty_id = %composite.parent.id,
            warranty_no = %composite.parent.warranty_no,
            "warranty registered"
        );
        Ok(composite)
    }

    /// Updates a warranty and reconciles its parts against the payload
    ///
    /// Parts absent from the payload are deleted, parts repeating a car part
    /// collapse to the most recently updated one, and the warranty's approval
    /// is re-derived from whatever parts remain.
    #[instrument(skip(self, change, parts), fields(warranty_id = %id, parts = parts.len()))]
    pub async fn update_warranty(
        &self,
        id: WarrantyId,
        change: WarrantyChange,
        parts: Vec<WarrantyPartChange>,
    ) -> Result<WarrantyWithParts, WarrantyError> {
        change.validate()?;

        let mut uow = self.port.begin().await?;
        update_with_children(&mut WarrantyComposite::new(&mut *uow), id, change, parts).await?;
        resync_parent(&mut WarrantyApprovalAxis::new(&mut *uow), id).await?;
        let composite = load_composite(&mut *uow, id).await?;
        uow.commit().await?;
        Ok(composite)
    }

    /// Sets the warranty's approval and copies it onto every part
    #[instrument(skip(self), fields(warranty_id = %id, status = %status))]
    pub async fn set_approval(
        &self,
        id: WarrantyId,
        status: ApprovalStatus,
    ) -> Result<WarrantyWithParts, WarrantyError> {
        let mut uow = self.port.begin().await?;
        cascade_from_parent(&mut WarrantyApprovalAxis::new(&mut *uow), id, status).await?;
        let composite = load_composite(&mut *uow, id).await?;
        uow.commit().await?;
        Ok(composite)
    }

    /// Sets one part's approval and re-derives the warranty's
    #[instrument(skip(self), fields(part_id = %id, status = %status))]
    pub async fn set_part_approval(
        &self,
        id: WarrantyPartId,
        status: ApprovalStatus,
    ) -> Result<WarrantyWithParts, WarrantyError> {
        let mut uow = self.port.begin().await?;
        let update =
            recompute_from_child(&mut WarrantyApprovalAxis::new(&mut *uow), id, status).await?;
        let composite = load_composite(&mut *uow, update.parent).await?;
        uow.commit().await?;
        Ok(composite)
    }

    /// Adds one part to an existing warranty
    #[instrument(skip(self, part), fields(warranty_id = %warranty))]
    pub async fn add_part(
        &self,
        warranty: WarrantyId,
        part: NewWarrantyPart,
    ) -> Result<WarrantyPart, WarrantyError> {
        let mut uow = self.port.begin().await?;
        uow.get_warranty(warranty).await?;
        let created = uow.insert_warranty_part(warranty, part).await?;
        resync_parent(&mut WarrantyApprovalAxis::new(&mut *uow), warranty).await?;
        uow.commit().await?;
        Ok(created)
    }

    /// Replaces the fields of one part, keeping its approval
    #[instrument(skip(self, change), fields(part_id = %id))]
    pub async fn update_part(
        &self,
        id: WarrantyPartId,
        mut change: WarrantyPartChange,
    ) -> Result<WarrantyPart, WarrantyError> {
        change.id = Some(id);

        let mut uow = self.port.begin().await?;
        let existing = uow.get_warranty_part(id).await?;
        let updated = uow
            .update_warranty_part(existing.warranty_id, id, change)
            .await?;
        uow.commit().await?;
        Ok(updated)
    }
}
