//! PostgreSQL gateway integration tests
//!
//! Each test starts its own PostgreSQL container, so they need Docker and
//! are ignored by default. Run with `cargo test -p infra_db -- --ignored`.

use std::sync::Arc;

use core_kernel::{
    ApprovalStatus, CodeSequence, HealthCheckable, LifecycleStatus, PortError,
    ProductAllocationId, SequenceSource, ShopId,
};
use domain_claims::{ClaimApprovalMode, ClaimService, ClaimsPort};
use domain_warranty::{AccountService, ProductService, ShopService, WarrantyPort, WarrantyService};
use infra_db::PgGateway;
use test_utils::{
    car_part, create_isolated_test_database, date, new_allocation, new_claim, new_claim_part,
    new_product, new_shop, new_warranty, new_warranty_part, TestDatabase, FIRST_ALLOCATION,
};

async fn database() -> TestDatabase {
    create_isolated_test_database()
        .await
        .expect("PostgreSQL container should start")
}

/// A shop created through the service plus one film allocation (id 1)
async fn shop_with_allocation(gateway: &PgGateway) -> ShopId {
    let shops = ShopService::new(Arc::new(gateway.clone()), "password@profilm");
    let shop = shops.create_shop(new_shop("Tint Pro")).await.unwrap();
    let products = ProductService::new(Arc::new(gateway.clone()));
    let product = products.create_product(new_product("CX70-0001")).await.unwrap();
    let allocation = products
        .allocate(new_allocation(product.id, shop.id))
        .await
        .unwrap();
    assert_eq!(allocation.id, FIRST_ALLOCATION);
    shop.id
}

#[tokio::test]
#[ignore]
async fn test_reference_data_is_seeded() {
    let db = database().await;
    let gateway = db.gateway();

    let mut uow = WarrantyPort::begin(&gateway).await.unwrap();
    let states = uow.list_states().await.unwrap();
    let parts = uow.list_car_parts().await.unwrap();
    uow.rollback().await.unwrap();

    assert_eq!(states.len(), 16);
    assert_eq!(states[0].code, "JH");
    assert_eq!(parts.len(), 9);
    assert!(gateway.health_check().await.is_healthy());
}

#[tokio::test]
#[ignore]
async fn test_latest_code_orders_by_length_then_text() {
    let db = database().await;
    let gateway = db.gateway();

    let mut uow = WarrantyPort::begin(&gateway).await.unwrap();
    for code in ["JH09", "JH99", "JH100"] {
        let mut shop = new_shop(code);
        shop.branch_code = Some(code.to_string());
        uow.insert_shop(shop).await.unwrap();
    }
    let latest = uow.latest_code(CodeSequence::BranchCode, "JH").await.unwrap();
    let none = uow.latest_code(CodeSequence::BranchCode, "KL").await.unwrap();
    uow.rollback().await.unwrap();

    assert_eq!(latest.as_deref(), Some("JH100"));
    assert_eq!(none, None);
}

#[tokio::test]
#[ignore]
async fn test_dropped_unit_of_work_rolls_back() {
    let db = database().await;
    let gateway = db.gateway();

    {
        let mut uow = WarrantyPort::begin(&gateway).await.unwrap();
        let mut shop = new_shop("Dropped");
        shop.branch_code = Some("JH01".into());
        uow.insert_shop(shop).await.unwrap();
    }

    let mut uow = WarrantyPort::begin(&gateway).await.unwrap();
    assert!(uow.list_shops().await.unwrap().is_empty());
    uow.rollback().await.unwrap();
}

#[tokio::test]
#[ignore]
async fn test_duplicate_branch_code_is_conflict() {
    let db = database().await;
    let gateway = db.gateway();

    let mut uow = WarrantyPort::begin(&gateway).await.unwrap();
    let mut first = new_shop("First");
    first.branch_code = Some("JH01".into());
    uow.insert_shop(first.clone()).await.unwrap();
    let err = uow.insert_shop(first).await.unwrap_err();
    assert!(err.is_conflict(), "got {err:?}");
}

#[tokio::test]
#[ignore]
async fn test_warranty_and_claim_flow() {
    let db = database().await;
    let gateway = db.gateway();
    let shop = shop_with_allocation(&gateway).await;

    let warranties = WarrantyService::new(Arc::new(gateway.clone()));
    let created = warranties
        .create_warranty(
            new_warranty(shop, date(2024, 11, 25)),
            vec![
                new_warranty_part(car_part("FWS")),
                new_warranty_part(car_part("R1")),
            ],
        )
        .await
        .unwrap();
    assert_eq!(created.parent.warranty_no, "JH01-24112501");
    assert_eq!(created.children.len(), 2);

    for part in &created.children {
        warranties
            .set_part_approval(part.id, ApprovalStatus::Approved)
            .await
            .unwrap();
    }
    let approved = warranties.get_warranty(created.parent.id).await.unwrap();
    assert_eq!(approved.parent.approval_status, ApprovalStatus::Approved);

    let claims = ClaimService::new(Arc::new(gateway.clone()), ClaimApprovalMode::TriState);
    let claim = claims
        .create_claim(
            new_claim(created.parent.id, date(2024, 12, 1)),
            vec![new_claim_part(created.children[0].id)],
        )
        .await
        .unwrap();
    assert_eq!(claim.parent.claim_no, "C241201-JH01-24112501-01");

    let closed = claims
        .set_part_status(claim.children[0].id, LifecycleStatus::Closed)
        .await
        .unwrap();
    assert_eq!(closed.parent.status, LifecycleStatus::Closed);
}

#[tokio::test]
#[ignore]
async fn test_claimed_warranty_part_cannot_be_deleted() {
    let db = database().await;
    let gateway = db.gateway();
    let shop = shop_with_allocation(&gateway).await;

    let mut uow = ClaimsPort::begin(&gateway).await.unwrap();
    let mut warranty = new_warranty(shop, date(2024, 11, 25));
    warranty.warranty_no = Some("JH01-24112501".into());
    let warranty = uow.insert_warranty(warranty).await.unwrap();
    let part = uow
        .insert_warranty_part(warranty.id, new_warranty_part(car_part("FWS")))
        .await
        .unwrap();
    let mut claim = new_claim(warranty.id, date(2024, 12, 1));
    claim.claim_no = Some("C241201-JH01-24112501-01".into());
    let claim = uow.insert_claim(claim).await.unwrap();
    uow.insert_claim_part(claim.id, new_claim_part(part.id))
        .await
        .unwrap();

    let err = uow.delete_warranty_part(part.id).await.unwrap_err();
    assert!(matches!(err, PortError::Conflict { .. }), "got {err:?}");
}

#[tokio::test]
#[ignore]
async fn test_shop_products_join_allocations() {
    let db = database().await;
    let gateway = db.gateway();
    let shop = shop_with_allocation(&gateway).await;

    let products = ProductService::new(Arc::new(gateway.clone()));
    let listed = products.list_shop_products(shop).await.unwrap();

    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].allocation_id, FIRST_ALLOCATION);
    assert_eq!(listed[0].film_serial_number, "CX70-0001");
    assert_eq!(listed[0].allocated_quantity, 10);

    let err = products
        .create_product(new_product("CX70-0001"))
        .await
        .unwrap_err();
    assert!(matches!(err, domain_warranty::WarrantyError::Port(ref e) if e.is_conflict()));
}

#[tokio::test]
#[ignore]
async fn test_part_with_unknown_allocation_violates_foreign_key() {
    let db = database().await;
    let gateway = db.gateway();
    let shop = shop_with_allocation(&gateway).await;

    let mut uow = WarrantyPort::begin(&gateway).await.unwrap();
    let mut warranty = new_warranty(shop, date(2024, 11, 25));
    warranty.warranty_no = Some("JH01-24112501".into());
    let warranty = uow.insert_warranty(warranty).await.unwrap();
    let mut part = new_warranty_part(car_part("FWS"));
    part.product_allocation_id = ProductAllocationId::new(404);

    let err = uow.insert_warranty_part(warranty.id, part).await.unwrap_err();
    assert!(matches!(err, PortError::Conflict { .. }), "got {err:?}");
}

#[tokio::test]
#[ignore]
async fn test_password_change_is_persisted() {
    let db = database().await;
    let gateway = db.gateway();
    shop_with_allocation(&gateway).await;

    let accounts = AccountService::new(Arc::new(gateway.clone()));
    let user = accounts.get_user_by_username("jh01").await.unwrap();
    accounts
        .change_password(user.id, "password@profilm", "tinted-glass-9")
        .await
        .unwrap();

    assert!(accounts.authenticate("jh01", "tinted-glass-9").await.is_ok());
    assert!(accounts.authenticate("jh01", "password@profilm").await.is_err());
}
