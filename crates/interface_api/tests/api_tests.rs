//! Router tests against the in-memory gateway

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use domain_claims::ClaimApprovalMode;
use domain_warranty::{hash_password, NewUser, UserRole, WarrantyPort};
use interface_api::config::ApiConfig;
use interface_api::storage::LocalDiskStorage;
use interface_api::{create_router, AppState};
use test_utils::{car_part, MemoryGateway, FIRST_ALLOCATION, JOHOR};

const ADMIN_PASSWORD: &str = "head-office-secret";

struct TestApp {
    router: Router,
    upload_root: PathBuf,
}

impl TestApp {
    async fn new(mode: ClaimApprovalMode) -> Self {
        let gateway = MemoryGateway::new();
        seed_admin(&gateway).await;

        let upload_root = std::env::temp_dir().join(format!("warranty-api-{}", Uuid::new_v4()));
        let config = ApiConfig {
            claim_approval_mode: mode,
            upload_dir: upload_root.display().to_string(),
            upload_base_url: "https://cdn.example.com/files".into(),
            ..ApiConfig::default()
        };
        let storage = Arc::new(LocalDiskStorage::new(&upload_root, &config.upload_base_url));

        Self {
            router: create_router(AppState::new(gateway, storage, config)),
            upload_root,
        }
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        self.dispatch(builder.body(body).unwrap()).await
    }

    async fn dispatch(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    async fn login(&self, username: &str, password: &str) -> String {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/v1/auth/login",
                None,
                Some(json!({ "username": username, "password": password })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["accessToken"].as_str().unwrap().to_string()
    }

    async fn admin_token(&self) -> String {
        self.login("admin", ADMIN_PASSWORD).await
    }

    /// Registers a Johor shop, stocks it with one product and returns its
    /// id and branch code
    ///
    /// The first shop of an app receives allocation [`FIRST_ALLOCATION`].
    async fn create_shop(&self, admin: &str) -> (i64, String) {
        let (status, body) = self
            .send(Method::POST, "/api/v1/shops", Some(admin), Some(shop_body()))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        let shop_id = body["id"].as_i64().unwrap();
        let branch_code = body["branchCode"].as_str().unwrap().to_string();

        let product = self.create_product(admin, &format!("CX70-{branch_code}")).await;
        let (status, allocation) = self
            .send(
                Method::POST,
                "/api/v1/product-allocations",
                Some(admin),
                Some(allocation_body(product["id"].as_i64().unwrap(), shop_id)),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{allocation}");
        (shop_id, branch_code)
    }

    async fn create_product(&self, admin: &str, serial: &str) -> Value {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/v1/products",
                Some(admin),
                Some(product_body(serial)),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body
    }

    async fn create_warranty(&self, token: &str, shop_id: i64, codes: &[&str]) -> Value {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/v1/warranties",
                Some(token),
                Some(warranty_body(shop_id, codes)),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.upload_root);
    }
}

async fn seed_admin(gateway: &MemoryGateway) {
    let mut uow = WarrantyPort::begin(gateway).await.unwrap();
    uow.insert_user(NewUser {
        shop_id: None,
        username: "admin".into(),
        role: UserRole::Admin,
        password_hash: hash_password(ADMIN_PASSWORD).unwrap(),
    })
    .await
    .unwrap();
    uow.commit().await.unwrap();
}

fn shop_body() -> Value {
    json!({
        "companyName": "Tint Works Sdn Bhd",
        "companyRegistrationNumber": "202401012345",
        "companyContactNumber": "+60 7-222 1234",
        "companyEmail": "office@tintworks.my",
        "shopName": "Tint Works JB",
        "shopAddress": "12 Jalan Tebrau, Johor Bahru",
        "msiaStateId": JOHOR.value(),
        "picName": "Aisyah Rahman",
        "picContactNumber": "+60 12-345 6789",
        "picEmail": "aisyah@tintworks.my"
    })
}

fn product_body(serial: &str) -> Value {
    json!({
        "brand": "Profilm",
        "filmType": "Solar Film",
        "series": "Ceramic",
        "name": "CX70",
        "warrantyInMonths": 60,
        "filmSerialNumber": serial,
        "filmQuantity": 30,
        "shipmentNumber": "SHP-2411"
    })
}

fn allocation_body(product_id: i64, shop_id: i64) -> Value {
    json!({
        "productId": product_id,
        "shopId": shop_id,
        "filmQuantity": 10,
        "allocationDate": "2024-11-01"
    })
}

fn warranty_body(shop_id: i64, codes: &[&str]) -> Value {
    let parts: Vec<Value> = codes
        .iter()
        .map(|code| {
            json!({
                "productAllocationId": FIRST_ALLOCATION.value(),
                "carPartId": car_part(code).value(),
                "installationImageUrl": format!("https://cdn.example.com/files/installation_images/{code}.jpg")
            })
        })
        .collect();
    json!({
        "shopId": shop_id,
        "clientName": "Tan Wei Ming",
        "clientContact": "+60 16-111 2222",
        "clientEmail": "weiming@example.com",
        "carBrand": "Perodua",
        "carModel": "Myvi",
        "carColour": "Red",
        "carPlateNo": "JQA 1234",
        "carChassisNo": "PM2M602S001234567",
        "installationDate": "2024-11-25",
        "parts": parts
    })
}

// ============================================================================
// Authentication
// ============================================================================

#[tokio::test]
async fn test_login_returns_token_pair_and_user() {
    let app = TestApp::new(ClaimApprovalMode::TriState).await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "username": "admin", "password": ADMIN_PASSWORD })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tokenType"], "Bearer");
    assert_eq!(body["expiresIn"], 15 * 60);
    assert_eq!(body["user"]["role"], "admin");
    assert!(body["refreshToken"].as_str().is_some());
    assert!(body["user"].get("passwordHash").is_none());
}

#[tokio::test]
async fn test_wrong_password_is_unauthorized() {
    let app = TestApp::new(ClaimApprovalMode::TriState).await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "username": "admin", "password": "guess" })),
        )
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_refresh_accepts_only_refresh_tokens() {
    let app = TestApp::new(ClaimApprovalMode::TriState).await;
    let (_, login) = app
        .send(
            Method::POST,
            "/api/v1/auth/login",
            None,
            Some(json!({ "username": "admin", "password": ADMIN_PASSWORD })),
        )
        .await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/v1/auth/refresh",
            None,
            Some(json!({ "refreshToken": login["refreshToken"] })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["accessToken"].as_str().is_some());

    let (status, _) = app
        .send(
            Method::POST,
            "/api/v1/auth/refresh",
            None,
            Some(json!({ "refreshToken": login["accessToken"] })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_protected_routes_require_a_token() {
    let app = TestApp::new(ClaimApprovalMode::TriState).await;

    let (status, body) = app.send(Method::GET, "/api/v1/warranties", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());

    let (status, _) = app
        .send(Method::GET, "/api/v1/warranties", Some("not-a-jwt"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_health_endpoints() {
    let app = TestApp::new(ClaimApprovalMode::TriState).await;

    let (status, body) = app.send(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = app.send(Method::GET, "/health/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
}

// ============================================================================
// Shops
// ============================================================================

#[tokio::test]
async fn test_shop_registration_creates_login_and_numbers_branches() {
    let app = TestApp::new(ClaimApprovalMode::TriState).await;
    let admin = app.admin_token().await;

    let (_, branch_code) = app.create_shop(&admin).await;
    assert_eq!(branch_code, "JH01");

    let shop_token = app.login("jh01", "password@profilm").await;
    let (status, body) = app
        .send(
            Method::GET,
            "/api/v1/shops/generate-branch-code/jh",
            Some(&shop_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["branchCode"], "JH02");

    let (status, body) = app
        .send(Method::GET, "/api/v1/shops/states", Some(&shop_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 16);
}

#[tokio::test]
async fn test_shop_logins_cannot_register_shops() {
    let app = TestApp::new(ClaimApprovalMode::TriState).await;
    let admin = app.admin_token().await;
    app.create_shop(&admin).await;
    let shop_token = app.login("jh01", "password@profilm").await;

    let (status, body) = app
        .send(Method::POST, "/api/v1/shops", Some(&shop_token), Some(shop_body()))
        .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_invalid_shop_email_is_unprocessable() {
    let app = TestApp::new(ClaimApprovalMode::TriState).await;
    let admin = app.admin_token().await;
    let mut body = shop_body();
    body["picEmail"] = json!("not-an-email");

    let (status, body) = app
        .send(Method::POST, "/api/v1/shops", Some(&admin), Some(body))
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("pic_email"));
}

// ============================================================================
// Users
// ============================================================================

#[tokio::test]
async fn test_admin_creates_login_and_looks_it_up() {
    let app = TestApp::new(ClaimApprovalMode::TriState).await;
    let admin = app.admin_token().await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/v1/users",
            Some(&admin),
            Some(json!({ "username": "auditor", "role": "admin", "password": "audit-2024" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert!(body.get("passwordHash").is_none());
    let id = body["id"].as_i64().unwrap();

    let (status, found) = app
        .send(Method::GET, "/api/v1/users/by-username/auditor", Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found["id"], id);

    let (status, by_id) = app
        .send(Method::GET, &format!("/api/v1/users/{id}"), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(by_id["username"], "auditor");

    app.login("auditor", "audit-2024").await;
}

#[tokio::test]
async fn test_duplicate_username_is_conflict() {
    let app = TestApp::new(ClaimApprovalMode::TriState).await;
    let admin = app.admin_token().await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/v1/users",
            Some(&admin),
            Some(json!({ "username": "admin", "role": "admin", "password": "another-1" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_shop_login_changes_own_password() {
    let app = TestApp::new(ClaimApprovalMode::TriState).await;
    let admin = app.admin_token().await;
    app.create_shop(&admin).await;
    let shop_token = app.login("jh01", "password@profilm").await;
    let (_, me) = app
        .send(Method::GET, "/api/v1/users/by-username/jh01", Some(&admin), None)
        .await;
    let id = me["id"].as_i64().unwrap();

    let (status, _) = app
        .send(
            Method::PUT,
            &format!("/api/v1/users/{id}/password"),
            Some(&shop_token),
            Some(json!({ "currentPassword": "wrong", "newPassword": "tinted-glass-9" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .send(
            Method::PUT,
            &format!("/api/v1/users/{id}/password"),
            Some(&shop_token),
            Some(json!({ "currentPassword": "password@profilm", "newPassword": "tinted-glass-9" })),
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    app.login("jh01", "tinted-glass-9").await;
}

#[tokio::test]
async fn test_shop_login_cannot_touch_other_accounts() {
    let app = TestApp::new(ClaimApprovalMode::TriState).await;
    let admin = app.admin_token().await;
    app.create_shop(&admin).await;
    let shop_token = app.login("jh01", "password@profilm").await;
    let (_, admin_user) = app
        .send(Method::GET, "/api/v1/users/by-username/admin", Some(&admin), None)
        .await;
    let admin_id = admin_user["id"].as_i64().unwrap();

    let (status, _) = app
        .send(
            Method::PUT,
            &format!("/api/v1/users/{admin_id}/password"),
            Some(&shop_token),
            Some(json!({ "currentPassword": ADMIN_PASSWORD, "newPassword": "taken-over-1" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .send(Method::GET, "/api/v1/users/by-username/admin", Some(&shop_token), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

// ============================================================================
// Products and stock
// ============================================================================

#[tokio::test]
async fn test_stock_flows_to_shop_product_list() {
    let app = TestApp::new(ClaimApprovalMode::TriState).await;
    let admin = app.admin_token().await;
    let (shop_id, _) = app.create_shop(&admin).await;
    let shop_token = app.login("jh01", "password@profilm").await;

    let (status, listed) = app
        .send(
            Method::GET,
            &format!("/api/v1/product-allocations/products-by-shop/{shop_id}"),
            Some(&shop_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let listed = listed.as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["id"], FIRST_ALLOCATION.value());
    assert_eq!(listed[0]["filmSerialNumber"], "CX70-JH01");
    assert_eq!(listed[0]["filmQuantity"], 10);
    assert_eq!(listed[0]["warrantyInMonths"], 60);

    let (status, product) = app
        .send(Method::GET, "/api/v1/products/1", Some(&shop_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(product["isActive"], true);

    let (status, allocation) = app
        .send(
            Method::GET,
            &format!("/api/v1/product-allocations/{}", FIRST_ALLOCATION.value()),
            Some(&shop_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(allocation["allocationDate"], "2024-11-01");
}

#[tokio::test]
async fn test_shop_logins_cannot_manage_stock() {
    let app = TestApp::new(ClaimApprovalMode::TriState).await;
    let admin = app.admin_token().await;
    let (shop_id, _) = app.create_shop(&admin).await;
    let shop_token = app.login("jh01", "password@profilm").await;

    let (status, _) = app
        .send(
            Method::POST,
            "/api/v1/products",
            Some(&shop_token),
            Some(product_body("CX70-9999")),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .send(
            Method::POST,
            "/api/v1/product-allocations",
            Some(&shop_token),
            Some(allocation_body(1, shop_id)),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_product_update_and_duplicate_serial() {
    let app = TestApp::new(ClaimApprovalMode::TriState).await;
    let admin = app.admin_token().await;
    let product = app.create_product(&admin, "CX70-0001").await;
    let id = product["id"].as_i64().unwrap();

    let mut update = product_body("CX70-0001");
    update["name"] = json!("CX70 Plus");
    update["isActive"] = json!(false);
    let (status, body) = app
        .send(
            Method::PUT,
            &format!("/api/v1/products/{id}"),
            Some(&admin),
            Some(update),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["name"], "CX70 Plus");
    assert_eq!(body["isActive"], false);

    let (status, _) = app
        .send(
            Method::POST,
            "/api/v1/products",
            Some(&admin),
            Some(product_body("CX70-0001")),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_allocation_for_unknown_shop_is_not_found() {
    let app = TestApp::new(ClaimApprovalMode::TriState).await;
    let admin = app.admin_token().await;
    let product = app.create_product(&admin, "CX70-0001").await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/v1/product-allocations",
            Some(&admin),
            Some(allocation_body(product["id"].as_i64().unwrap(), 404)),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}

// ============================================================================
// Warranties
// ============================================================================

#[tokio::test]
async fn test_warranty_part_with_unknown_allocation_is_conflict() {
    let app = TestApp::new(ClaimApprovalMode::TriState).await;
    let admin = app.admin_token().await;
    let (shop_id, _) = app.create_shop(&admin).await;

    let mut body = warranty_body(shop_id, &["FWS"]);
    body["parts"][0]["productAllocationId"] = json!(404);
    let (status, error) = app
        .send(Method::POST, "/api/v1/warranties", Some(&admin), Some(body))
        .await;
    assert_eq!(status, StatusCode::CONFLICT, "{error}");

    let (_, listed) = app
        .send(Method::GET, "/api/v1/warranties", Some(&admin), None)
        .await;
    assert!(listed.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_create_warranty_generates_number_and_camel_case_body() {
    let app = TestApp::new(ClaimApprovalMode::TriState).await;
    let admin = app.admin_token().await;
    let (shop_id, _) = app.create_shop(&admin).await;
    let shop_token = app.login("jh01", "password@profilm").await;

    let created = app
        .create_warranty(&shop_token, shop_id, &["FWS", "R1", "L1"])
        .await;

    assert_eq!(created["warrantyNo"], "JH01-24112501");
    assert_eq!(created["carPlateNo"], "JQA 1234");
    assert_eq!(created["installationDate"], "2024-11-25");
    assert_eq!(created["approvalStatus"], "PENDING");
    assert_eq!(created["parts"].as_array().unwrap().len(), 3);

    let (status, body) = app
        .send(
            Method::GET,
            "/api/v1/warranties/generate-warranty-no/JH01-241125",
            Some(&shop_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["warrantyNo"], "JH01-24112502");
}

#[tokio::test]
async fn test_public_search_needs_no_token() {
    let app = TestApp::new(ClaimApprovalMode::TriState).await;
    let admin = app.admin_token().await;
    let (shop_id, _) = app.create_shop(&admin).await;
    app.create_warranty(&admin, shop_id, &["FWS"]).await;

    let (status, body) = app
        .send(Method::GET, "/api/v1/warranties/search?q=jh01-24112501", None, None)
        .await;

    assert_eq!(status, StatusCode::OK);
    let found = body.as_array().unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0]["parts"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_unknown_warranty_is_not_found() {
    let app = TestApp::new(ClaimApprovalMode::TriState).await;
    let admin = app.admin_token().await;

    let (status, body) = app
        .send(Method::GET, "/api/v1/warranties/999", Some(&admin), None)
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_duplicate_warranty_number_is_conflict() {
    let app = TestApp::new(ClaimApprovalMode::TriState).await;
    let admin = app.admin_token().await;
    let (shop_id, _) = app.create_shop(&admin).await;
    let mut body = warranty_body(shop_id, &["FWS"]);
    body["warrantyNo"] = json!("JH01-24112577");

    let (first, _) = app
        .send(Method::POST, "/api/v1/warranties", Some(&admin), Some(body.clone()))
        .await;
    let (second, error) = app
        .send(Method::POST, "/api/v1/warranties", Some(&admin), Some(body))
        .await;

    assert_eq!(first, StatusCode::CREATED);
    assert_eq!(second, StatusCode::CONFLICT);
    assert!(error["error"].is_string());
}

#[tokio::test]
async fn test_malformed_date_is_bad_request() {
    let app = TestApp::new(ClaimApprovalMode::TriState).await;
    let admin = app.admin_token().await;
    let (shop_id, _) = app.create_shop(&admin).await;
    let mut body = warranty_body(shop_id, &["FWS"]);
    body["installationDate"] = json!("25/11/2024");

    let (status, _) = app
        .send(Method::POST, "/api/v1/warranties", Some(&admin), Some(body))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_warranty_approval_cascades_and_follows_parts() {
    let app = TestApp::new(ClaimApprovalMode::TriState).await;
    let admin = app.admin_token().await;
    let (shop_id, _) = app.create_shop(&admin).await;
    let shop_token = app.login("jh01", "password@profilm").await;
    let created = app.create_warranty(&shop_token, shop_id, &["FWS", "R1"]).await;
    let id = created["id"].as_i64().unwrap();
    let first_part = created["parts"][0]["id"].as_i64().unwrap();

    let (status, _) = app
        .send(
            Method::PUT,
            &format!("/api/v1/warranties/{id}/approval"),
            Some(&shop_token),
            Some(json!({ "approvalStatus": "APPROVED" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .send(
            Method::PUT,
            &format!("/api/v1/warranties/{id}/approval"),
            Some(&admin),
            Some(json!({ "approvalStatus": "APPROVED" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["approvalStatus"], "APPROVED");
    assert!(body["parts"]
        .as_array()
        .unwrap()
        .iter()
        .all(|p| p["approvalStatus"] == "APPROVED"));

    let (status, body) = app
        .send(
            Method::PUT,
            &format!("/api/v1/warranty-parts/{first_part}/approval"),
            Some(&admin),
            Some(json!({ "approvalStatus": "REJECTED" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["approvalStatus"], "PENDING");
}

#[tokio::test]
async fn test_update_warranty_adds_parts_without_id() {
    let app = TestApp::new(ClaimApprovalMode::TriState).await;
    let admin = app.admin_token().await;
    let (shop_id, _) = app.create_shop(&admin).await;
    let created = app.create_warranty(&admin, shop_id, &["FWS"]).await;
    let id = created["id"].as_i64().unwrap();

    let mut update = warranty_body(shop_id, &["R1"]);
    update["carColour"] = json!("Blue");
    update["parts"]
        .as_array_mut()
        .unwrap()
        .push(json!({
            "id": created["parts"][0]["id"],
            "productAllocationId": FIRST_ALLOCATION.value(),
            "carPartId": car_part("FWS").value()
        }));

    let (status, body) = app
        .send(
            Method::PUT,
            &format!("/api/v1/warranties/{id}"),
            Some(&admin),
            Some(update),
        )
        .await;

    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["carColour"], "Blue");
    assert_eq!(body["warrantyNo"], "JH01-24112501");
    assert_eq!(body["parts"].as_array().unwrap().len(), 2);
}

// ============================================================================
// Claims
// ============================================================================

#[tokio::test]
async fn test_claim_numbering_and_lifecycle() {
    let app = TestApp::new(ClaimApprovalMode::TriState).await;
    let admin = app.admin_token().await;
    let (shop_id, _) = app.create_shop(&admin).await;
    let shop_token = app.login("jh01", "password@profilm").await;
    let warranty = app.create_warranty(&shop_token, shop_id, &["FWS", "R1"]).await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/v1/claims/generate-claim-no",
            Some(&shop_token),
            Some(json!({ "warrantyNo": "JH01-24112501", "claimDate": "241201" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["claimNo"], "C241201-JH01-24112501-01");

    let (status, claim) = app
        .send(
            Method::POST,
            "/api/v1/claims",
            Some(&shop_token),
            Some(json!({
                "warrantyId": warranty["id"],
                "claimDate": "2024-12-01",
                "parts": [{
                    "warrantyPartId": warranty["parts"][0]["id"],
                    "damagedImageUrl": "https://cdn.example.com/files/damaged_images/fws.jpg",
                    "remarks": "Bubbling near the edge"
                }]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{claim}");
    assert_eq!(claim["claimNo"], "C241201-JH01-24112501-01");
    assert_eq!(claim["status"], "Open");
    assert_eq!(claim["approvalStatus"], "PENDING");

    let part_id = claim["parts"][0]["id"].as_i64().unwrap();
    let (status, body) = app
        .send(
            Method::PUT,
            &format!("/api/v1/claim-parts/{part_id}/status"),
            Some(&shop_token),
            Some(json!({ "status": "Closed" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Closed");
    assert_eq!(body["parts"][0]["status"], "Closed");
}

#[tokio::test]
async fn test_claim_part_from_another_warranty_is_unprocessable() {
    let app = TestApp::new(ClaimApprovalMode::TriState).await;
    let admin = app.admin_token().await;
    let (shop_id, _) = app.create_shop(&admin).await;
    let first = app.create_warranty(&admin, shop_id, &["FWS"]).await;
    let second = app.create_warranty(&admin, shop_id, &["RWS"]).await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/v1/claims",
            Some(&admin),
            Some(json!({
                "warrantyId": first["id"],
                "claimDate": "2024-12-01",
                "parts": [{
                    "warrantyPartId": second["parts"][0]["id"],
                    "damagedImageUrl": "https://cdn.example.com/files/damaged_images/rws.jpg"
                }]
            })),
        )
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_boolean_claim_approval() {
    let app = TestApp::new(ClaimApprovalMode::Boolean).await;
    let admin = app.admin_token().await;
    let (shop_id, _) = app.create_shop(&admin).await;
    let warranty = app.create_warranty(&admin, shop_id, &["FWS"]).await;
    let (_, claim) = app
        .send(
            Method::POST,
            "/api/v1/claims",
            Some(&admin),
            Some(json!({
                "warrantyId": warranty["id"],
                "claimDate": "2024-12-01",
                "parts": [{
                    "warrantyPartId": warranty["parts"][0]["id"],
                    "damagedImageUrl": "https://cdn.example.com/files/damaged_images/fws.jpg"
                }]
            })),
        )
        .await;
    let id = claim["id"].as_i64().unwrap();

    let (status, _) = app
        .send(
            Method::PUT,
            &format!("/api/v1/claims/{id}/approval"),
            Some(&admin),
            Some(json!({ "approvalStatus": "REJECTED" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .send(
            Method::PUT,
            &format!("/api/v1/claims/{id}/approval"),
            Some(&admin),
            Some(json!({ "isApproved": true })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isApproved"], true);
    assert_eq!(body["parts"][0]["isApproved"], true);
}

// ============================================================================
// Uploads
// ============================================================================

#[tokio::test]
async fn test_upload_stores_bytes_under_folder() {
    let app = TestApp::new(ClaimApprovalMode::TriState).await;
    let admin = app.admin_token().await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/uploads/damaged_images/crack%20photo.jpg")
        .header(header::AUTHORIZATION, format!("Bearer {admin}"))
        .header(header::CONTENT_TYPE, "image/jpeg")
        .body(Body::from(vec![0xFF, 0xD8, 0xFF]))
        .unwrap();
    let (status, body) = app.dispatch(request).await;

    assert_eq!(status, StatusCode::CREATED, "{body}");
    let url = body["url"].as_str().unwrap();
    assert!(url.starts_with("https://cdn.example.com/files/damaged_images/"));
    assert!(url.ends_with("-crack_photo.jpg"));
}

#[tokio::test]
async fn test_upload_to_unknown_folder_is_rejected() {
    let app = TestApp::new(ClaimApprovalMode::TriState).await;
    let admin = app.admin_token().await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/uploads/secrets/a.jpg")
        .header(header::AUTHORIZATION, format!("Bearer {admin}"))
        .body(Body::from("x"))
        .unwrap();
    let (status, _) = app.dispatch(request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

