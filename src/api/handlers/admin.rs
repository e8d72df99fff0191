use crate::api::error::AppError;
use crate::api::handlers::claims::ClaimResponse;
use crate::api::handlers::items::ItemResponse;
use crate::api::handlers::marketplace::MarketplaceItemResponse;
use crate::entities::{claims, items, marketplace_items};
use crate::services::claim_service::{ClaimService, ReviewRequest};
use crate::services::item_service::ItemService;
use crate::services::marketplace_service::{MarketplaceService, PromoteRequest};
use crate::utils::auth::Claims;
use crate::utils::validation::days_until_expiry;
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use chrono::{Duration, Utc};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Listings flagged as "expiring" when this close to the deadline.
const EXPIRING_FLAG_DAYS: i64 = 3;

#[derive(Serialize, ToSchema)]
pub struct AdminItemResponse {
    #[serde(flatten)]
    pub item: ItemResponse,
    /// True when the hold period runs out within the next few days
    pub is_expiring: bool,
}

impl From<items::Model> for AdminItemResponse {
    fn from(item: items::Model) -> Self {
        let is_expiring = item.status == "active"
            && item
                .expires_at
                .is_some_and(|expires_at| {
                    let days = days_until_expiry(expires_at, Utc::now());
                    days >= 0 && days <= EXPIRING_FLAG_DAYS
                });
        Self {
            item: item.into(),
            is_expiring,
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct FoundItemFilter {
    /// Restrict to a single status ("active", "claimed", "expired", "marketplace")
    pub status: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct StatsResponse {
    pub total_lost_items: u64,
    pub total_found_items: u64,
    pub active_found_items: u64,
    pub pending_claims: u64,
    pub approved_claims: u64,
    pub marketplace_items: u64,
    pub expiring_items: u64,
}

#[utoipa::path(
    get,
    path = "/admin/claims/pending",
    responses(
        (status = 200, description = "Claims awaiting review", body = [ClaimResponse]),
        (status = 403, description = "Admin access required")
    ),
    security(("jwt" = [])),
    tag = "admin"
)]
pub async fn list_pending_claims(
    State(state): State<crate::AppState>,
) -> Result<Json<Vec<ClaimResponse>>, AppError> {
    let results = ClaimService::list_pending(&state.db).await?;
    Ok(Json(
        results
            .into_iter()
            .map(|(claim, item)| ClaimResponse::from_parts(claim, item))
            .collect(),
    ))
}

#[utoipa::path(
    put,
    path = "/admin/claims/{id}/approve",
    params(("id" = String, Path, description = "Claim id")),
    request_body = ReviewRequest,
    responses(
        (status = 200, description = "Claim approved, item marked claimed", body = ClaimResponse),
        (status = 404, description = "Claim not found"),
        (status = 409, description = "Claim already processed or item not active")
    ),
    security(("jwt" = [])),
    tag = "admin"
)]
pub async fn approve_claim(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    Json(payload): Json<ReviewRequest>,
) -> Result<Json<ClaimResponse>, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let claim = ClaimService::approve(
        &state.db,
        &state.notifier,
        &id,
        &claims.sub,
        payload.review_notes,
    )
    .await?;
    Ok(Json(ClaimResponse::from_parts(claim, None)))
}

#[utoipa::path(
    put,
    path = "/admin/claims/{id}/reject",
    params(("id" = String, Path, description = "Claim id")),
    request_body = ReviewRequest,
    responses(
        (status = 200, description = "Claim rejected, item stays active", body = ClaimResponse),
        (status = 404, description = "Claim not found"),
        (status = 409, description = "Claim already processed")
    ),
    security(("jwt" = [])),
    tag = "admin"
)]
pub async fn reject_claim(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    Json(payload): Json<ReviewRequest>,
) -> Result<Json<ClaimResponse>, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let claim = ClaimService::reject(
        &state.db,
        &state.notifier,
        &id,
        &claims.sub,
        payload.review_notes,
    )
    .await?;
    Ok(Json(ClaimResponse::from_parts(claim, None)))
}

#[utoipa::path(
    get,
    path = "/admin/items/found",
    params(FoundItemFilter),
    responses(
        (status = 200, description = "Found-item inventory", body = [AdminItemResponse])
    ),
    security(("jwt" = [])),
    tag = "admin"
)]
pub async fn list_found_items(
    State(state): State<crate::AppState>,
    Query(filter): Query<FoundItemFilter>,
) -> Result<Json<Vec<AdminItemResponse>>, AppError> {
    let items = ItemService::list_found(&state.db, filter.status).await?;
    Ok(Json(items.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/admin/items/expiring",
    responses(
        (status = 200, description = "Active found items expiring within the window, soonest first", body = [AdminItemResponse])
    ),
    security(("jwt" = [])),
    tag = "admin"
)]
pub async fn list_expiring_items(
    State(state): State<crate::AppState>,
) -> Result<Json<Vec<AdminItemResponse>>, AppError> {
    let items =
        ItemService::list_expiring_soon(&state.db, state.config.expiring_soon_days).await?;
    Ok(Json(items.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    put,
    path = "/admin/items/{id}/extend",
    params(("id" = String, Path, description = "Item id")),
    responses(
        (status = 200, description = "Hold period extended", body = AdminItemResponse),
        (status = 404, description = "Item not found"),
        (status = 409, description = "Item is not active")
    ),
    security(("jwt" = [])),
    tag = "admin"
)]
pub async fn extend_hold(
    State(state): State<crate::AppState>,
    Path(id): Path<String>,
) -> Result<Json<AdminItemResponse>, AppError> {
    let item =
        ItemService::extend_hold(&state.db, &id, state.config.hold_extension_days).await?;
    Ok(Json(item.into()))
}

#[utoipa::path(
    post,
    path = "/admin/items/{id}/to-marketplace",
    params(("id" = String, Path, description = "Item id")),
    request_body = PromoteRequest,
    responses(
        (status = 200, description = "Item promoted into the marketplace", body = MarketplaceItemResponse),
        (status = 404, description = "Item not found"),
        (status = 409, description = "Already listed or item not active")
    ),
    security(("jwt" = [])),
    tag = "admin"
)]
pub async fn promote_to_marketplace(
    State(state): State<crate::AppState>,
    Path(id): Path<String>,
    Json(payload): Json<PromoteRequest>,
) -> Result<Json<MarketplaceItemResponse>, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let listing = MarketplaceService::promote(&state.db, &id, payload).await?;
    let (listing, item) = MarketplaceService::get(&state.db, &listing.id).await?;
    Ok(Json(MarketplaceItemResponse::from_parts(listing, item)))
}

#[utoipa::path(
    get,
    path = "/admin/stats",
    responses(
        (status = 200, description = "Dashboard counters; read-only snapshot", body = StatsResponse)
    ),
    security(("jwt" = [])),
    tag = "admin"
)]
pub async fn get_stats(
    State(state): State<crate::AppState>,
) -> Result<Json<StatsResponse>, AppError> {
    let db = &state.db;
    let now = Utc::now();
    let expiring_cutoff = now + Duration::days(state.config.expiring_soon_days);

    let total_lost_items = items::Entity::find()
        .filter(items::Column::ItemType.eq("lost"))
        .filter(items::Column::Status.eq("active"))
        .count(db)
        .await?;
    let total_found_items = items::Entity::find()
        .filter(items::Column::ItemType.eq("found"))
        .count(db)
        .await?;
    let active_found_items = items::Entity::find()
        .filter(items::Column::ItemType.eq("found"))
        .filter(items::Column::Status.eq("active"))
        .count(db)
        .await?;
    let pending_claims = claims::Entity::find()
        .filter(claims::Column::Status.eq("pending"))
        .count(db)
        .await?;
    let approved_claims = claims::Entity::find()
        .filter(claims::Column::Status.eq("approved"))
        .count(db)
        .await?;
    let marketplace_items = marketplace_items::Entity::find()
        .filter(marketplace_items::Column::Status.eq("available"))
        .count(db)
        .await?;
    let expiring_items = items::Entity::find()
        .filter(items::Column::ItemType.eq("found"))
        .filter(items::Column::Status.eq("active"))
        .filter(items::Column::ExpiresAt.lte(expiring_cutoff))
        .filter(items::Column::ExpiresAt.gt(now))
        .count(db)
        .await?;

    Ok(Json(StatsResponse {
        total_lost_items,
        total_found_items,
        active_found_items,
        pending_claims,
        approved_claims,
        marketplace_items,
        expiring_items,
    }))
}
