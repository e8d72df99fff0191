use crate::api::error::AppError;
use crate::entities::{items, marketplace_items, prelude::*};
use crate::services::item_service::ItemService;
use crate::services::notifier::Notifier;
use chrono::Utc;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct PromoteRequest {
    /// Where the item can be picked up once claimed
    pub pickup_location: Option<String>,
    /// Asking price for a priced listing
    #[validate(range(min = 0.0, message = "Price cannot be negative"))]
    pub price: Option<f64>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct MarketplaceFilters {
    pub category: Option<String>,
    /// Case-insensitive substring search over the backing item
    pub search: Option<String>,
}

pub struct MarketplaceService;

impl MarketplaceService {
    /// Move an active item into the marketplace. The listing insert and the
    /// item's active -> marketplace flip commit in one transaction. At most
    /// one listing may ever exist per source item.
    pub async fn promote(
        db: &DatabaseConnection,
        item_id: &str,
        input: PromoteRequest,
    ) -> Result<marketplace_items::Model, AppError> {
        if input.pickup_location.is_none() && input.price.is_none() {
            return Err(AppError::BadRequest(
                "Pickup location or price required".to_string(),
            ));
        }

        let txn = db.begin().await?;

        Items::find_by_id(item_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Item not found".to_string()))?;

        // The unique index on item_id backstops this check under races.
        let existing = MarketplaceItems::find()
            .filter(marketplace_items::Column::ItemId.eq(item_id))
            .one(&txn)
            .await?;
        if existing.is_some() {
            return Err(AppError::Conflict(
                "Item is already listed on the marketplace".to_string(),
            ));
        }

        ItemService::mark_marketplace(&txn, item_id).await?;

        let listing = marketplace_items::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            item_id: Set(item_id.to_string()),
            pickup_location: Set(input.pickup_location),
            price: Set(input.price),
            status: Set("available".to_string()),
            listed_at: Set(Utc::now()),
            claimed_by: Set(None),
            claimed_at: Set(None),
            created_at: Set(Some(Utc::now())),
        };
        let listing = listing.insert(&txn).await?;

        txn.commit().await?;
        Ok(listing)
    }

    pub async fn list_available(
        db: &DatabaseConnection,
        filters: &MarketplaceFilters,
    ) -> Result<Vec<(marketplace_items::Model, Option<items::Model>)>, AppError> {
        let mut query = MarketplaceItems::find()
            .filter(marketplace_items::Column::Status.eq("available"))
            .find_also_related(Items);

        if let Some(category) = &filters.category {
            query = query.filter(items::Column::Category.eq(category));
        }
        if let Some(search) = &filters.search {
            let pattern = format!("%{}%", search.to_lowercase());
            query = query.filter(
                Condition::any()
                    .add(
                        Expr::expr(Func::lower(Expr::col((items::Entity, items::Column::Title))))
                            .like(&pattern),
                    )
                    .add(
                        Expr::expr(Func::lower(Expr::col((
                            items::Entity,
                            items::Column::Description,
                        ))))
                        .like(&pattern),
                    ),
            );
        }

        Ok(query
            .order_by_desc(marketplace_items::Column::ListedAt)
            .all(db)
            .await?)
    }

    pub async fn get(
        db: &DatabaseConnection,
        listing_id: &str,
    ) -> Result<(marketplace_items::Model, Option<items::Model>), AppError> {
        MarketplaceItems::find_by_id(listing_id)
            .find_also_related(Items)
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Marketplace item not found".to_string()))
    }

    /// First come, first served. A single conditional update flips
    /// available -> claimed, so concurrent attempts cannot both win: every
    /// loser sees zero rows affected and gets a definite `AlreadyClaimed`.
    pub async fn claim(
        db: &DatabaseConnection,
        notifier: &Arc<dyn Notifier>,
        listing_id: &str,
        user_id: &str,
    ) -> Result<marketplace_items::Model, AppError> {
        let result = MarketplaceItems::update_many()
            .col_expr(marketplace_items::Column::Status, Expr::value("claimed"))
            .col_expr(
                marketplace_items::Column::ClaimedBy,
                Expr::value(Some(user_id.to_string())),
            )
            .col_expr(
                marketplace_items::Column::ClaimedAt,
                Expr::value(Some(Utc::now())),
            )
            .filter(marketplace_items::Column::Id.eq(listing_id))
            .filter(marketplace_items::Column::Status.eq("available"))
            .exec(db)
            .await?;

        if result.rows_affected == 0 {
            // Lost the race, or the listing never existed.
            return match MarketplaceItems::find_by_id(listing_id).one(db).await? {
                Some(_) => Err(AppError::AlreadyClaimed(
                    "Someone else just claimed this item".to_string(),
                )),
                None => Err(AppError::NotFound(
                    "Marketplace item not found".to_string(),
                )),
            };
        }

        let listing = MarketplaceItems::find_by_id(listing_id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Marketplace item not found".to_string()))?;

        let winner = Users::find_by_id(user_id).one(db).await?;
        let item = Items::find_by_id(&listing.item_id).one(db).await?;
        if let (Some(winner), Some(item)) = (winner, item) {
            let notifier = notifier.clone();
            let pickup = listing.pickup_location.clone();
            tokio::spawn(async move {
                if let Err(e) = notifier
                    .send_listing_claimed(&winner.email, &winner.name, &item.title, pickup.as_deref())
                    .await
                {
                    tracing::warn!("Listing-claimed notification failed: {}", e);
                }
            });
        }

        Ok(listing)
    }

    pub async fn list_claimed_by(
        db: &DatabaseConnection,
        user_id: &str,
    ) -> Result<Vec<(marketplace_items::Model, Option<items::Model>)>, AppError> {
        Ok(MarketplaceItems::find()
            .filter(marketplace_items::Column::ClaimedBy.eq(user_id))
            .find_also_related(Items)
            .order_by_desc(marketplace_items::Column::ClaimedAt)
            .all(db)
            .await?)
    }
}
