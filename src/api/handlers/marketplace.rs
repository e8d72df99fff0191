use crate::api::error::AppError;
use crate::api::handlers::items::ItemResponse;
use crate::entities::{items, marketplace_items};
use crate::services::marketplace_service::{MarketplaceFilters, MarketplaceService};
use crate::utils::auth::Claims;
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct MarketplaceItemResponse {
    pub id: String,
    pub item_id: String,
    pub pickup_location: Option<String>,
    pub price: Option<f64>,
    pub status: String,
    pub listed_at: chrono::DateTime<chrono::Utc>,
    pub claimed_by: Option<String>,
    pub claimed_at: Option<chrono::DateTime<chrono::Utc>>,
    /// The found item backing this listing
    pub item: Option<ItemResponse>,
}

impl MarketplaceItemResponse {
    pub fn from_parts(listing: marketplace_items::Model, item: Option<items::Model>) -> Self {
        Self {
            id: listing.id,
            item_id: listing.item_id,
            pickup_location: listing.pickup_location,
            price: listing.price,
            status: listing.status,
            listed_at: listing.listed_at,
            claimed_by: listing.claimed_by,
            claimed_at: listing.claimed_at,
            item: item.map(Into::into),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct MarketplaceClaimResponse {
    pub message: String,
    pub item: MarketplaceItemResponse,
    pub pickup_location: Option<String>,
}

#[utoipa::path(
    get,
    path = "/marketplace",
    params(MarketplaceFilters),
    responses(
        (status = 200, description = "Available marketplace listings", body = [MarketplaceItemResponse])
    ),
    tag = "marketplace"
)]
pub async fn list_marketplace(
    State(state): State<crate::AppState>,
    Query(filters): Query<MarketplaceFilters>,
) -> Result<Json<Vec<MarketplaceItemResponse>>, AppError> {
    let results = MarketplaceService::list_available(&state.db, &filters).await?;
    Ok(Json(
        results
            .into_iter()
            .map(|(listing, item)| MarketplaceItemResponse::from_parts(listing, item))
            .collect(),
    ))
}

#[utoipa::path(
    get,
    path = "/marketplace/{id}",
    params(("id" = String, Path, description = "Listing id")),
    responses(
        (status = 200, description = "Listing detail", body = MarketplaceItemResponse),
        (status = 404, description = "Listing not found")
    ),
    tag = "marketplace"
)]
pub async fn get_marketplace_item(
    State(state): State<crate::AppState>,
    Path(id): Path<String>,
) -> Result<Json<MarketplaceItemResponse>, AppError> {
    let (listing, item) = MarketplaceService::get(&state.db, &id).await?;
    Ok(Json(MarketplaceItemResponse::from_parts(listing, item)))
}

#[utoipa::path(
    post,
    path = "/marketplace/{id}/claim",
    params(("id" = String, Path, description = "Listing id")),
    responses(
        (status = 200, description = "Listing claimed by the caller", body = MarketplaceClaimResponse),
        (status = 404, description = "Listing not found"),
        (status = 409, description = "Someone else claimed it first")
    ),
    security(("jwt" = [])),
    tag = "marketplace"
)]
pub async fn claim_marketplace_item(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<MarketplaceClaimResponse>, AppError> {
    let listing = MarketplaceService::claim(&state.db, &state.notifier, &id, &claims.sub).await?;
    let pickup_location = listing.pickup_location.clone();
    let (listing, item) = MarketplaceService::get(&state.db, &listing.id).await?;

    Ok(Json(MarketplaceClaimResponse {
        message: "Item claimed successfully!".to_string(),
        item: MarketplaceItemResponse::from_parts(listing, item),
        pickup_location,
    }))
}

#[utoipa::path(
    get,
    path = "/marketplace/my/claimed",
    responses(
        (status = 200, description = "Listings claimed by the current user", body = [MarketplaceItemResponse])
    ),
    security(("jwt" = [])),
    tag = "marketplace"
)]
pub async fn my_claimed_items(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<MarketplaceItemResponse>>, AppError> {
    let results = MarketplaceService::list_claimed_by(&state.db, &claims.sub).await?;
    Ok(Json(
        results
            .into_iter()
            .map(|(listing, item)| MarketplaceItemResponse::from_parts(listing, item))
            .collect(),
    ))
}
