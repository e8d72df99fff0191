use crate::api::error::AppError;
use crate::entities::{claims, items, prelude::*};
use crate::services::item_service::ItemService;
use crate::services::notifier::Notifier;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct ClaimRequest {
    pub item_id: String,
    #[validate(length(min = 10, message = "Please provide a detailed description"))]
    pub description: String,
    #[validate(length(min = 1, message = "Verification details are required"))]
    pub verification_details: String,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct ReviewRequest {
    pub review_notes: Option<String>,
}

pub struct ClaimService;

impl ClaimService {
    /// Submit an ownership claim against an active item. A claimant may hold
    /// at most one pending claim per item; different claimants may compete.
    pub async fn submit(
        db: &DatabaseConnection,
        notifier: &Arc<dyn Notifier>,
        claimant_id: &str,
        input: ClaimRequest,
    ) -> Result<claims::Model, AppError> {
        let item = Items::find_by_id(&input.item_id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Item not found".to_string()))?;

        if item.status != "active" {
            return Err(AppError::ItemUnavailable(
                "Item is no longer available for claiming".to_string(),
            ));
        }

        let existing = Claims::find()
            .filter(claims::Column::ItemId.eq(&input.item_id))
            .filter(claims::Column::ClaimantId.eq(claimant_id))
            .filter(claims::Column::Status.eq("pending"))
            .one(db)
            .await?;
        if existing.is_some() {
            return Err(AppError::DuplicateClaim(
                "You already have a pending claim on this item".to_string(),
            ));
        }

        let claim = claims::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            item_id: Set(input.item_id),
            claimant_id: Set(claimant_id.to_string()),
            description: Set(input.description),
            verification_details: Set(input.verification_details),
            status: Set("pending".to_string()),
            reviewed_by: Set(None),
            review_notes: Set(None),
            reviewed_at: Set(None),
            created_at: Set(Some(Utc::now())),
        };
        let claim = claim.insert(db).await?;

        // Heads-up to the finder, best effort.
        if let Some(owner) = Users::find_by_id(&item.user_id).one(db).await? {
            let notifier = notifier.clone();
            let title = item.title.clone();
            tokio::spawn(async move {
                if let Err(e) = notifier
                    .send_claim_submitted(&owner.email, &owner.name, &title)
                    .await
                {
                    tracing::warn!("Claim-submitted notification failed: {}", e);
                }
            });
        }

        Ok(claim)
    }

    /// Approve a pending claim. The claim update and the item's
    /// active -> claimed flip commit in one transaction; if the item is no
    /// longer active the whole approval rolls back.
    pub async fn approve(
        db: &DatabaseConnection,
        notifier: &Arc<dyn Notifier>,
        claim_id: &str,
        reviewer_id: &str,
        notes: Option<String>,
    ) -> Result<claims::Model, AppError> {
        let txn = db.begin().await?;

        let claim = Claims::find_by_id(claim_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Claim not found".to_string()))?;
        if claim.status != "pending" {
            return Err(AppError::AlreadyProcessed(
                "Claim already processed".to_string(),
            ));
        }

        ItemService::mark_claimed(&txn, &claim.item_id).await?;

        let item_id = claim.item_id.clone();
        let mut active: claims::ActiveModel = claim.into();
        active.status = Set("approved".to_string());
        active.reviewed_by = Set(Some(reviewer_id.to_string()));
        active.review_notes = Set(notes.clone());
        active.reviewed_at = Set(Some(Utc::now()));
        let updated = active.update(&txn).await?;

        let claimant = Users::find_by_id(&updated.claimant_id).one(&txn).await?;
        let item = Items::find_by_id(&item_id).one(&txn).await?;

        txn.commit().await?;

        if let (Some(claimant), Some(item)) = (claimant, item) {
            let notifier = notifier.clone();
            tokio::spawn(async move {
                if let Err(e) = notifier
                    .send_claim_approved(&claimant.email, &claimant.name, &item.title, notes.as_deref())
                    .await
                {
                    tracing::warn!("Approval notification failed: {}", e);
                }
            });
        }

        Ok(updated)
    }

    /// Reject a pending claim. The item stays active and open to other claims.
    pub async fn reject(
        db: &DatabaseConnection,
        notifier: &Arc<dyn Notifier>,
        claim_id: &str,
        reviewer_id: &str,
        notes: Option<String>,
    ) -> Result<claims::Model, AppError> {
        let claim = Claims::find_by_id(claim_id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Claim not found".to_string()))?;
        if claim.status != "pending" {
            return Err(AppError::AlreadyProcessed(
                "Claim already processed".to_string(),
            ));
        }

        let item_id = claim.item_id.clone();
        let mut active: claims::ActiveModel = claim.into();
        active.status = Set("rejected".to_string());
        active.reviewed_by = Set(Some(reviewer_id.to_string()));
        active.review_notes = Set(notes.clone());
        active.reviewed_at = Set(Some(Utc::now()));
        let updated = active.update(db).await?;

        let claimant = Users::find_by_id(&updated.claimant_id).one(db).await?;
        let item = Items::find_by_id(&item_id).one(db).await?;
        if let (Some(claimant), Some(item)) = (claimant, item) {
            let notifier = notifier.clone();
            tokio::spawn(async move {
                if let Err(e) = notifier
                    .send_claim_rejected(&claimant.email, &claimant.name, &item.title, notes.as_deref())
                    .await
                {
                    tracing::warn!("Rejection notification failed: {}", e);
                }
            });
        }

        Ok(updated)
    }

    pub async fn list_mine(
        db: &DatabaseConnection,
        claimant_id: &str,
    ) -> Result<Vec<(claims::Model, Option<items::Model>)>, AppError> {
        Ok(Claims::find()
            .filter(claims::Column::ClaimantId.eq(claimant_id))
            .find_also_related(Items)
            .order_by_desc(claims::Column::CreatedAt)
            .all(db)
            .await?)
    }

    /// Claims submitted against items the given user reported.
    pub async fn list_for_owned_items(
        db: &DatabaseConnection,
        owner_id: &str,
    ) -> Result<Vec<(claims::Model, Option<items::Model>)>, AppError> {
        Ok(Claims::find()
            .find_also_related(Items)
            .filter(items::Column::UserId.eq(owner_id))
            .order_by_desc(claims::Column::CreatedAt)
            .all(db)
            .await?)
    }

    /// Readable by the claimant or the item owner only.
    pub async fn get_authorized(
        db: &DatabaseConnection,
        claim_id: &str,
        requester_id: &str,
    ) -> Result<(claims::Model, Option<items::Model>), AppError> {
        let (claim, item) = Claims::find_by_id(claim_id)
            .find_also_related(Items)
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Claim not found".to_string()))?;

        let is_claimant = claim.claimant_id == requester_id;
        let is_item_owner = item
            .as_ref()
            .is_some_and(|item| item.user_id == requester_id);
        if !is_claimant && !is_item_owner {
            return Err(AppError::Forbidden("Not authorized".to_string()));
        }

        Ok((claim, item))
    }

    pub async fn list_pending(
        db: &DatabaseConnection,
    ) -> Result<Vec<(claims::Model, Option<items::Model>)>, AppError> {
        Ok(Claims::find()
            .filter(claims::Column::Status.eq("pending"))
            .find_also_related(Items)
            .order_by_desc(claims::Column::CreatedAt)
            .all(db)
            .await?)
    }
}
