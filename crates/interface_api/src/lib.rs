//! HTTP API Layer
//!
//! REST API of the film warranty system, built on Axum.
//!
//! # Architecture
//!
//! - **Handlers**: one module per resource, each a thin call into a service
//! - **Middleware**: bearer authentication and audit logging
//! - **DTOs**: camelCase request/response bodies and their domain conversions
//! - **Error Handling**: every failure leaves as `{"error": "<message>"}`
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::{create_router, AppState};
//!
//! let state = AppState::new(gateway, storage, config);
//! axum::serve(listener, create_router(state)).await?;
//! ```

pub mod auth;
pub mod config;
pub mod dto;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod storage;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use core_kernel::HealthCheckable;
use domain_claims::{ClaimService, ClaimsPort};
use domain_warranty::{
    AccountService, ObjectStorage, ProductService, ShopService, WarrantyPort, WarrantyService,
};

use crate::auth::TokenIssuer;
use crate::config::ApiConfig;
use crate::handlers::{
    auth as auth_handlers, claims, health, products, shops, uploads, users, warranties,
};
use crate::middleware::{audit_middleware, auth_middleware};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub shops: Arc<ShopService>,
    pub accounts: Arc<AccountService>,
    pub products: Arc<ProductService>,
    pub warranties: Arc<WarrantyService>,
    pub claims: Arc<ClaimService>,
    pub storage: Arc<dyn ObjectStorage>,
    pub tokens: Arc<TokenIssuer>,
    pub health: Arc<dyn HealthCheckable>,
    pub config: ApiConfig,
}

impl AppState {
    /// Wires every service onto one gateway
    pub fn new<G>(gateway: G, storage: Arc<dyn ObjectStorage>, config: ApiConfig) -> Self
    where
        G: WarrantyPort + ClaimsPort + HealthCheckable + Clone + 'static,
    {
        let warranty_port: Arc<dyn WarrantyPort> = Arc::new(gateway.clone());
        let claims_port: Arc<dyn ClaimsPort> = Arc::new(gateway.clone());

        Self {
            shops: Arc::new(ShopService::new(
                warranty_port.clone(),
                config.default_shop_password.clone(),
            )),
            accounts: Arc::new(AccountService::new(warranty_port.clone())),
            products: Arc::new(ProductService::new(warranty_port.clone())),
            warranties: Arc::new(WarrantyService::new(warranty_port)),
            claims: Arc::new(ClaimService::new(claims_port, config.claim_approval_mode)),
            storage,
            tokens: Arc::new(TokenIssuer::new(&config)),
            health: Arc::new(gateway),
            config,
        }
    }
}

/// Creates the main API router
///
/// Everything lives under `/api/v1`. Login, refresh and the warranty search
/// are public; every other route needs an access token.
pub fn create_router(state: AppState) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/auth/login", post(auth_handlers::login))
        .route("/auth/refresh", post(auth_handlers::refresh))
        .route("/warranties/search", get(warranties::search));

    let shop_routes = Router::new()
        .route("/", get(shops::list_shops).post(shops::create_shop))
        .route("/states", get(shops::list_states))
        .route("/generate-branch-code/:state_code", get(shops::generate_branch_code))
        .route("/:id", get(shops::get_shop).put(shops::update_shop));

    let user_routes = Router::new()
        .route("/", post(users::create_user))
        .route("/by-username/:username", get(users::get_user_by_username))
        .route("/:id", get(users::get_user))
        .route("/:id/password", put(users::change_password));

    let product_routes = Router::new()
        .route("/", get(products::list_products).post(products::create_product))
        .route("/:id", get(products::get_product).put(products::update_product));

    let allocation_routes = Router::new()
        .route(
            "/",
            get(products::list_allocations).post(products::create_allocation),
        )
        .route("/products-by-shop/:shop_id", get(products::list_shop_products))
        .route(
            "/:id",
            get(products::get_allocation).put(products::update_allocation),
        );

    let warranty_routes = Router::new()
        .route("/", get(warranties::list_warranties).post(warranties::create_warranty))
        .route("/car-parts", get(warranties::list_car_parts))
        .route("/by-shop/:shop_id", get(warranties::list_by_shop))
        .route("/generate-warranty-no/:key", get(warranties::generate_warranty_no))
        .route("/:id", get(warranties::get_warranty).put(warranties::update_warranty))
        .route("/:id/parts", get(warranties::list_parts))
        .route("/:id/approval", put(warranties::set_approval));

    let warranty_part_routes = Router::new()
        .route("/", post(warranties::add_part))
        .route("/:id", put(warranties::update_part))
        .route("/:id/approval", put(warranties::set_part_approval));

    let claim_routes = Router::new()
        .route("/", get(claims::list_claims).post(claims::create_claim))
        .route("/by-shop/:shop_id", get(claims::list_by_shop))
        .route("/generate-claim-no", post(claims::generate_claim_no))
        .route("/:id", get(claims::get_claim).put(claims::update_claim))
        .route("/:id/parts", get(claims::list_parts))
        .route("/:id/approval", put(claims::set_approval))
        .route("/:id/status", put(claims::set_status));

    let claim_part_routes = Router::new()
        .route("/", post(claims::add_part))
        .route("/:id", put(claims::update_part))
        .route("/:id/approval", put(claims::set_part_approval))
        .route("/:id/status", put(claims::set_part_status));

    let upload_routes = Router::new()
        .route("/:folder/:filename", post(uploads::upload))
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes));

    // Protected API routes
    let protected_routes = Router::new()
        .nest("/shops", shop_routes)
        .nest("/users", user_routes)
        .nest("/products", product_routes)
        .nest("/product-allocations", allocation_routes)
        .nest("/warranties", warranty_routes)
        .nest("/warranty-parts", warranty_part_routes)
        .nest("/claims", claim_routes)
        .nest("/claim-parts", claim_part_routes)
        .nest("/uploads", upload_routes)
        .layer(axum_middleware::from_fn(audit_middleware))
        .layer(axum_middleware::from_fn_with_state(state.clone(), auth_middleware));

    let timeout = state.config.request_timeout();

    Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
        .nest("/api/v1", public_routes.merge(protected_routes))
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
