pub mod api;
pub mod config;
pub mod entities;
pub mod infrastructure;
pub mod services;
pub mod utils;

use crate::config::AppConfig;
use crate::services::notifier::Notifier;
use axum::{
    Router,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post, put},
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::auth::register,
        api::handlers::auth::verify_email,
        api::handlers::auth::resend_verification,
        api::handlers::auth::login,
        api::handlers::auth::me,
        api::handlers::items::list_items,
        api::handlers::items::get_item,
        api::handlers::items::create_item,
        api::handlers::items::update_item,
        api::handlers::items::delete_item,
        api::handlers::claims::submit_claim,
        api::handlers::claims::my_claims,
        api::handlers::claims::claims_for_my_items,
        api::handlers::claims::get_claim,
        api::handlers::marketplace::list_marketplace,
        api::handlers::marketplace::get_marketplace_item,
        api::handlers::marketplace::claim_marketplace_item,
        api::handlers::marketplace::my_claimed_items,
        api::handlers::admin::list_pending_claims,
        api::handlers::admin::approve_claim,
        api::handlers::admin::reject_claim,
        api::handlers::admin::list_found_items,
        api::handlers::admin::list_expiring_items,
        api::handlers::admin::extend_hold,
        api::handlers::admin::promote_to_marketplace,
        api::handlers::admin::get_stats,
        api::handlers::health::health_check,
    ),
    components(
        schemas(
            api::handlers::auth::RegisterRequest,
            api::handlers::auth::RegisterResponse,
            api::handlers::auth::ResendVerificationRequest,
            api::handlers::auth::LoginRequest,
            api::handlers::auth::UserResponse,
            api::handlers::auth::AuthResponse,
            api::handlers::auth::MessageResponse,
            api::handlers::items::ItemResponse,
            api::handlers::claims::ClaimResponse,
            api::handlers::marketplace::MarketplaceItemResponse,
            api::handlers::marketplace::MarketplaceClaimResponse,
            api::handlers::admin::AdminItemResponse,
            api::handlers::admin::StatsResponse,
            api::handlers::health::HealthResponse,
            services::item_service::ReportItemRequest,
            services::item_service::UpdateItemRequest,
            services::claim_service::ClaimRequest,
            services::claim_service::ReviewRequest,
            services::marketplace_service::PromoteRequest,
        )
    ),
    tags(
        (name = "auth", description = "Registration, verification and login"),
        (name = "items", description = "Lost and found reports"),
        (name = "claims", description = "Ownership claims"),
        (name = "marketplace", description = "First-come-first-served marketplace"),
        (name = "admin", description = "Moderation endpoints"),
        (name = "system", description = "Health and diagnostics")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub notifier: Arc<dyn Notifier>,
    pub config: AppConfig,
}

pub fn create_app(state: AppState) -> Router {
    use api::handlers::{admin, auth, claims, health, items, marketplace};
    use api::middleware::auth::{admin_middleware, auth_middleware};
    use api::middleware::request_id::request_id_middleware;

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(health::health_check))
        .route("/auth/register", post(auth::register))
        .route("/auth/verify-email/:token", get(auth::verify_email))
        .route("/auth/resend-verification", post(auth::resend_verification))
        .route("/auth/login", post(auth::login))
        .route(
            "/auth/me",
            get(auth::me).layer(from_fn_with_state(
                state.clone(),
                auth_middleware,
            )),
        )
        .route("/items", get(items::list_items))
        .route(
            "/items",
            post(items::create_item).layer(from_fn_with_state(
                state.clone(),
                auth_middleware,
            )),
        )
        .route("/items/:id", get(items::get_item))
        .route(
            "/items/:id",
            put(items::update_item)
                .delete(items::delete_item)
                .layer(from_fn_with_state(state.clone(), auth_middleware)),
        )
        .route(
            "/claims",
            post(claims::submit_claim).layer(from_fn_with_state(
                state.clone(),
                auth_middleware,
            )),
        )
        .route(
            "/claims/my-claims",
            get(claims::my_claims).layer(from_fn_with_state(
                state.clone(),
                auth_middleware,
            )),
        )
        .route(
            "/claims/for-my-items",
            get(claims::claims_for_my_items).layer(from_fn_with_state(
                state.clone(),
                auth_middleware,
            )),
        )
        .route(
            "/claims/:id",
            get(claims::get_claim).layer(from_fn_with_state(
                state.clone(),
                auth_middleware,
            )),
        )
        .route("/marketplace", get(marketplace::list_marketplace))
        .route(
            "/marketplace/my/claimed",
            get(marketplace::my_claimed_items).layer(from_fn_with_state(
                state.clone(),
                auth_middleware,
            )),
        )
        .route("/marketplace/:id", get(marketplace::get_marketplace_item))
        .route(
            "/marketplace/:id/claim",
            post(marketplace::claim_marketplace_item).layer(from_fn_with_state(
                state.clone(),
                auth_middleware,
            )),
        )
        .route(
            "/admin/claims/pending",
            get(admin::list_pending_claims)
                .layer(from_fn(admin_middleware))
                .layer(from_fn_with_state(state.clone(), auth_middleware)),
        )
        .route(
            "/admin/claims/:id/approve",
            put(admin::approve_claim)
                .layer(from_fn(admin_middleware))
                .layer(from_fn_with_state(state.clone(), auth_middleware)),
        )
        .route(
            "/admin/claims/:id/reject",
            put(admin::reject_claim)
                .layer(from_fn(admin_middleware))
                .layer(from_fn_with_state(state.clone(), auth_middleware)),
        )
        .route(
            "/admin/items/found",
            get(admin::list_found_items)
                .layer(from_fn(admin_middleware))
                .layer(from_fn_with_state(state.clone(), auth_middleware)),
        )
        .route(
            "/admin/items/expiring",
            get(admin::list_expiring_items)
                .layer(from_fn(admin_middleware))
                .layer(from_fn_with_state(state.clone(), auth_middleware)),
        )
        .route(
            "/admin/items/:id/extend",
            put(admin::extend_hold)
                .layer(from_fn(admin_middleware))
                .layer(from_fn_with_state(state.clone(), auth_middleware)),
        )
        .route(
            "/admin/items/:id/to-marketplace",
            post(admin::promote_to_marketplace)
                .layer(from_fn(admin_middleware))
                .layer(from_fn_with_state(state.clone(), auth_middleware)),
        )
        .route(
            "/admin/stats",
            get(admin::get_stats)
                .layer(from_fn(admin_middleware))
                .layer(from_fn_with_state(state.clone(), auth_middleware)),
        )
        .layer(from_fn(request_id_middleware))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
                .expose_headers(Any),
        )
        .with_state(state)
}
