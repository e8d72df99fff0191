use crate::api::error::AppError;
use crate::entities::{claims, items, prelude::*};
use crate::utils::validation::date_to_utc;
use chrono::{Duration, NaiveDate, Utc};
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    ModelTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct ReportItemRequest {
    /// "lost" or "found"
    #[serde(rename = "type")]
    pub item_type: String,
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,
    #[validate(length(min = 1, message = "Category is required"))]
    pub category: String,
    #[validate(length(min = 1, message = "Location is required"))]
    pub location: String,
    /// Date the item was lost or found (YYYY-MM-DD)
    pub date: NaiveDate,
    pub image_url: Option<String>,
    #[validate(email(message = "Invalid contact email"))]
    pub contact_email: String,
    pub contact_phone: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UpdateItemRequest {
    #[validate(length(min = 1, message = "Title cannot be empty"))]
    pub title: Option<String>,
    #[validate(length(min = 1, message = "Description cannot be empty"))]
    pub description: Option<String>,
    #[validate(length(min = 1, message = "Category cannot be empty"))]
    pub category: Option<String>,
    #[validate(length(min = 1, message = "Location cannot be empty"))]
    pub location: Option<String>,
    pub date: Option<NaiveDate>,
    pub image_url: Option<String>,
    #[validate(email(message = "Invalid contact email"))]
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ItemFilters {
    /// Restrict to "lost" or "found" reports
    #[serde(rename = "type")]
    pub item_type: Option<String>,
    pub category: Option<String>,
    pub location: Option<String>,
    /// Case-insensitive substring search over title/description/category/location
    pub search: Option<String>,
}

pub struct ItemService;

impl ItemService {
    pub async fn report_lost(
        db: &DatabaseConnection,
        owner_id: &str,
        input: ReportItemRequest,
    ) -> Result<items::Model, AppError> {
        Self::insert(db, owner_id, input, None).await
    }

    /// Found items carry an expiry: date found + hold period.
    pub async fn report_found(
        db: &DatabaseConnection,
        owner_id: &str,
        input: ReportItemRequest,
        hold_period_days: i64,
    ) -> Result<items::Model, AppError> {
        let expires_at = date_to_utc(input.date) + Duration::days(hold_period_days);
        Self::insert(db, owner_id, input, Some(expires_at)).await
    }

    async fn insert(
        db: &DatabaseConnection,
        owner_id: &str,
        input: ReportItemRequest,
        expires_at: Option<chrono::DateTime<Utc>>,
    ) -> Result<items::Model, AppError> {
        let item = items::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            item_type: Set(input.item_type),
            title: Set(input.title),
            description: Set(input.description),
            category: Set(input.category),
            location: Set(input.location),
            date: Set(date_to_utc(input.date)),
            image_url: Set(input.image_url),
            contact_email: Set(input.contact_email),
            contact_phone: Set(input.contact_phone),
            status: Set("active".to_string()),
            user_id: Set(owner_id.to_string()),
            expires_at: Set(expires_at),
            created_at: Set(Some(Utc::now())),
        };

        Ok(item.insert(db).await?)
    }

    /// Public browse. Marketplace items are listed through the marketplace,
    /// not here.
    pub async fn list_active(
        db: &DatabaseConnection,
        filters: &ItemFilters,
    ) -> Result<Vec<items::Model>, AppError> {
        let mut query = Items::find().filter(items::Column::Status.ne("marketplace"));

        if let Some(item_type) = &filters.item_type {
            query = query.filter(items::Column::ItemType.eq(item_type));
        }
        if let Some(category) = &filters.category {
            query = query.filter(items::Column::Category.eq(category));
        }
        if let Some(location) = &filters.location {
            query = query.filter(items::Column::Location.eq(location));
        }
        if let Some(search) = &filters.search {
            query = query.filter(Self::search_condition(search));
        }

        Ok(query
            .order_by_desc(items::Column::CreatedAt)
            .all(db)
            .await?)
    }

    fn search_condition(search: &str) -> Condition {
        let pattern = format!("%{}%", search.to_lowercase());
        let column = |col: items::Column| Expr::col((items::Entity, col));
        Condition::any()
            .add(Expr::expr(Func::lower(column(items::Column::Title))).like(&pattern))
            .add(Expr::expr(Func::lower(column(items::Column::Description))).like(&pattern))
            .add(Expr::expr(Func::lower(column(items::Column::Category))).like(&pattern))
            .add(Expr::expr(Func::lower(column(items::Column::Location))).like(&pattern))
    }

    pub async fn get(db: &DatabaseConnection, item_id: &str) -> Result<items::Model, AppError> {
        Items::find_by_id(item_id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Item not found".to_string()))
    }

    pub async fn update_owned(
        db: &DatabaseConnection,
        item_id: &str,
        requester_id: &str,
        patch: UpdateItemRequest,
        hold_period_days: i64,
    ) -> Result<items::Model, AppError> {
        let item = Self::get(db, item_id).await?;
        if item.user_id != requester_id {
            return Err(AppError::Forbidden("Not authorized".to_string()));
        }

        let is_found = item.item_type == "found";
        let mut active: items::ActiveModel = item.into();

        if let Some(title) = patch.title {
            active.title = Set(title);
        }
        if let Some(description) = patch.description {
            active.description = Set(description);
        }
        if let Some(category) = patch.category {
            active.category = Set(category);
        }
        if let Some(location) = patch.location {
            active.location = Set(location);
        }
        if let Some(date) = patch.date {
            let date = date_to_utc(date);
            active.date = Set(date);
            // The hold period is anchored to the date found.
            if is_found {
                active.expires_at = Set(Some(date + Duration::days(hold_period_days)));
            }
        }
        if let Some(image_url) = patch.image_url {
            active.image_url = Set(Some(image_url));
        }
        if let Some(contact_email) = patch.contact_email {
            active.contact_email = Set(contact_email);
        }
        if let Some(contact_phone) = patch.contact_phone {
            active.contact_phone = Set(Some(contact_phone));
        }

        Ok(active.update(db).await?)
    }

    /// Deletion is blocked while any claim on the item is still pending;
    /// terminal claims keep their item reference.
    pub async fn delete_owned(
        db: &DatabaseConnection,
        item_id: &str,
        requester_id: &str,
    ) -> Result<(), AppError> {
        let item = Self::get(db, item_id).await?;
        if item.user_id != requester_id {
            return Err(AppError::Forbidden("Not authorized".to_string()));
        }

        let pending = Claims::find()
            .filter(claims::Column::ItemId.eq(item_id))
            .filter(claims::Column::Status.eq("pending"))
            .count(db)
            .await?;
        if pending > 0 {
            return Err(AppError::Conflict(
                "Item has pending claims and cannot be deleted".to_string(),
            ));
        }

        item.delete(db).await?;
        Ok(())
    }

    /// Conditional status flip out of "active". Works inside a transaction,
    /// so a caller can tie it to its own writes.
    async fn transition<C: ConnectionTrait>(
        conn: &C,
        item_id: &str,
        to_status: &str,
    ) -> Result<(), AppError> {
        let result = Items::update_many()
            .col_expr(items::Column::Status, Expr::value(to_status))
            .filter(items::Column::Id.eq(item_id))
            .filter(items::Column::Status.eq("active"))
            .exec(conn)
            .await?;

        if result.rows_affected == 0 {
            return Err(AppError::InvalidTransition(
                "Item is not active".to_string(),
            ));
        }
        Ok(())
    }

    pub async fn mark_claimed<C: ConnectionTrait>(conn: &C, item_id: &str) -> Result<(), AppError> {
        Self::transition(conn, item_id, "claimed").await
    }

    pub async fn mark_expired<C: ConnectionTrait>(conn: &C, item_id: &str) -> Result<(), AppError> {
        Self::transition(conn, item_id, "expired").await
    }

    pub async fn mark_marketplace<C: ConnectionTrait>(
        conn: &C,
        item_id: &str,
    ) -> Result<(), AppError> {
        Self::transition(conn, item_id, "marketplace").await
    }

    pub async fn extend_hold(
        db: &DatabaseConnection,
        item_id: &str,
        extra_days: i64,
    ) -> Result<items::Model, AppError> {
        let item = Self::get(db, item_id).await?;
        if item.status != "active" {
            return Err(AppError::InvalidTransition(
                "Can only extend active items".to_string(),
            ));
        }
        let Some(expires_at) = item.expires_at else {
            return Err(AppError::InvalidTransition(
                "Lost items do not expire".to_string(),
            ));
        };

        let mut active: items::ActiveModel = item.into();
        active.expires_at = Set(Some(expires_at + Duration::days(extra_days)));
        Ok(active.update(db).await?)
    }

    pub async fn list_found(
        db: &DatabaseConnection,
        status: Option<String>,
    ) -> Result<Vec<items::Model>, AppError> {
        let mut query = Items::find().filter(items::Column::ItemType.eq("found"));
        if let Some(status) = status {
            query = query.filter(items::Column::Status.eq(status));
        }

        Ok(query
            .order_by_desc(items::Column::CreatedAt)
            .all(db)
            .await?)
    }

    /// Active found items whose hold period runs out within the window,
    /// soonest first. Expiry is evaluated against the clock at read time.
    pub async fn list_expiring_soon(
        db: &DatabaseConnection,
        within_days: i64,
    ) -> Result<Vec<items::Model>, AppError> {
        let now = Utc::now();
        let cutoff = now + Duration::days(within_days);

        Ok(Items::find()
            .filter(items::Column::ItemType.eq("found"))
            .filter(items::Column::Status.eq("active"))
            .filter(items::Column::ExpiresAt.lte(cutoff))
            .filter(items::Column::ExpiresAt.gt(now))
            .order_by_asc(items::Column::ExpiresAt)
            .all(db)
            .await?)
    }
}
