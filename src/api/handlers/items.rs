use crate::api::error::AppError;
use crate::api::handlers::auth::MessageResponse;
use crate::entities::items;
use crate::services::item_service::{ItemFilters, ItemService, ReportItemRequest, UpdateItemRequest};
use crate::utils::auth::Claims;
use crate::utils::validation::days_until_expiry;
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Serialize, ToSchema)]
pub struct ItemResponse {
    pub id: String,
    #[serde(rename = "type")]
    pub item_type: String,
    pub title: String,
    pub description: String,
    pub category: String,
    pub location: String,
    pub date: chrono::DateTime<Utc>,
    pub image_url: Option<String>,
    pub contact_email: String,
    pub contact_phone: Option<String>,
    pub status: String,
    pub user_id: String,
    pub expires_at: Option<chrono::DateTime<Utc>>,
    /// Found items only, computed at read time; negative once past expiry
    pub days_until_expiry: Option<i64>,
    pub created_at: Option<chrono::DateTime<Utc>>,
}

impl From<items::Model> for ItemResponse {
    fn from(item: items::Model) -> Self {
        let days = item
            .expires_at
            .map(|expires_at| days_until_expiry(expires_at, Utc::now()));
        Self {
            id: item.id,
            item_type: item.item_type,
            title: item.title,
            description: item.description,
            category: item.category,
            location: item.location,
            date: item.date,
            image_url: item.image_url,
            contact_email: item.contact_email,
            contact_phone: item.contact_phone,
            status: item.status,
            user_id: item.user_id,
            expires_at: item.expires_at,
            days_until_expiry: days,
            created_at: item.created_at,
        }
    }
}

#[utoipa::path(
    get,
    path = "/items",
    params(ItemFilters),
    responses(
        (status = 200, description = "Browse lost and found reports", body = [ItemResponse])
    ),
    tag = "items"
)]
pub async fn list_items(
    State(state): State<crate::AppState>,
    Query(filters): Query<ItemFilters>,
) -> Result<Json<Vec<ItemResponse>>, AppError> {
    let items = ItemService::list_active(&state.db, &filters).await?;
    Ok(Json(items.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/items/{id}",
    params(("id" = String, Path, description = "Item id")),
    responses(
        (status = 200, description = "Item detail", body = ItemResponse),
        (status = 404, description = "Item not found")
    ),
    tag = "items"
)]
pub async fn get_item(
    State(state): State<crate::AppState>,
    Path(id): Path<String>,
) -> Result<Json<ItemResponse>, AppError> {
    let item = ItemService::get(&state.db, &id).await?;
    Ok(Json(item.into()))
}

#[utoipa::path(
    post,
    path = "/items",
    request_body = ReportItemRequest,
    responses(
        (status = 201, description = "Item reported", body = ItemResponse),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Unauthorized")
    ),
    security(("jwt" = [])),
    tag = "items"
)]
pub async fn create_item(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<ReportItemRequest>,
) -> Result<(StatusCode, Json<ItemResponse>), AppError> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let item_type = payload.item_type.clone();
    let item = match item_type.as_str() {
        "lost" => ItemService::report_lost(&state.db, &claims.sub, payload).await?,
        "found" => {
            ItemService::report_found(
                &state.db,
                &claims.sub,
                payload,
                state.config.hold_period_days,
            )
            .await?
        }
        other => {
            return Err(AppError::BadRequest(format!(
                "Unknown item type '{}', expected \"lost\" or \"found\"",
                other
            )));
        }
    };

    Ok((StatusCode::CREATED, Json(item.into())))
}

#[utoipa::path(
    put,
    path = "/items/{id}",
    params(("id" = String, Path, description = "Item id")),
    request_body = UpdateItemRequest,
    responses(
        (status = 200, description = "Item updated", body = ItemResponse),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Item not found")
    ),
    security(("jwt" = [])),
    tag = "items"
)]
pub async fn update_item(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateItemRequest>,
) -> Result<Json<ItemResponse>, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let item = ItemService::update_owned(
        &state.db,
        &id,
        &claims.sub,
        payload,
        state.config.hold_period_days,
    )
    .await?;
    Ok(Json(item.into()))
}

#[utoipa::path(
    delete,
    path = "/items/{id}",
    params(("id" = String, Path, description = "Item id")),
    responses(
        (status = 200, description = "Item deleted", body = MessageResponse),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Item not found"),
        (status = 409, description = "Item has pending claims")
    ),
    security(("jwt" = [])),
    tag = "items"
)]
pub async fn delete_item(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    ItemService::delete_owned(&state.db, &id, &claims.sub).await?;
    Ok(Json(MessageResponse {
        message: "Item deleted".to_string(),
    }))
}
