use crate::api::error::AppError;
use crate::api::handlers::items::ItemResponse;
use crate::entities::{claims, items};
use crate::services::claim_service::{ClaimRequest, ClaimService};
use crate::utils::auth::Claims;
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Serialize;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Serialize, ToSchema)]
pub struct ClaimResponse {
    pub id: String,
    pub item_id: String,
    pub claimant_id: String,
    pub description: String,
    pub verification_details: String,
    pub status: String,
    pub reviewed_by: Option<String>,
    pub review_notes: Option<String>,
    pub reviewed_at: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    /// The item this claim targets, when it still exists
    pub item: Option<ItemResponse>,
}

impl ClaimResponse {
    pub fn from_parts(claim: claims::Model, item: Option<items::Model>) -> Self {
        Self {
            id: claim.id,
            item_id: claim.item_id,
            claimant_id: claim.claimant_id,
            description: claim.description,
            verification_details: claim.verification_details,
            status: claim.status,
            reviewed_by: claim.reviewed_by,
            review_notes: claim.review_notes,
            reviewed_at: claim.reviewed_at,
            created_at: claim.created_at,
            item: item.map(Into::into),
        }
    }
}

#[utoipa::path(
    post,
    path = "/claims",
    request_body = ClaimRequest,
    responses(
        (status = 201, description = "Claim submitted", body = ClaimResponse),
        (status = 400, description = "Item is no longer available"),
        (status = 404, description = "Item not found"),
        (status = 409, description = "Duplicate pending claim")
    ),
    security(("jwt" = [])),
    tag = "claims"
)]
pub async fn submit_claim(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<ClaimRequest>,
) -> Result<(StatusCode, Json<ClaimResponse>), AppError> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let claim = ClaimService::submit(&state.db, &state.notifier, &claims.sub, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(ClaimResponse::from_parts(claim, None)),
    ))
}

#[utoipa::path(
    get,
    path = "/claims/my-claims",
    responses(
        (status = 200, description = "Claims the current user submitted", body = [ClaimResponse])
    ),
    security(("jwt" = [])),
    tag = "claims"
)]
pub async fn my_claims(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<ClaimResponse>>, AppError> {
    let results = ClaimService::list_mine(&state.db, &claims.sub).await?;
    Ok(Json(
        results
            .into_iter()
            .map(|(claim, item)| ClaimResponse::from_parts(claim, item))
            .collect(),
    ))
}

#[utoipa::path(
    get,
    path = "/claims/for-my-items",
    responses(
        (status = 200, description = "Claims on items the current user reported", body = [ClaimResponse])
    ),
    security(("jwt" = [])),
    tag = "claims"
)]
pub async fn claims_for_my_items(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<ClaimResponse>>, AppError> {
    let results = ClaimService::list_for_owned_items(&state.db, &claims.sub).await?;
    Ok(Json(
        results
            .into_iter()
            .map(|(claim, item)| ClaimResponse::from_parts(claim, item))
            .collect(),
    ))
}

#[utoipa::path(
    get,
    path = "/claims/{id}",
    params(("id" = String, Path, description = "Claim id")),
    responses(
        (status = 200, description = "Claim detail", body = ClaimResponse),
        (status = 403, description = "Not the claimant or item owner"),
        (status = 404, description = "Claim not found")
    ),
    security(("jwt" = [])),
    tag = "claims"
)]
pub async fn get_claim(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<ClaimResponse>, AppError> {
    let (claim, item) = ClaimService::get_authorized(&state.db, &id, &claims.sub).await?;
    Ok(Json(ClaimResponse::from_parts(claim, item)))
}
