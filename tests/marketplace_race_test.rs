use chrono::{Days, Utc};
use lost_found_backend::api::error::AppError;
use lost_found_backend::entities::{prelude::*, users};
use lost_found_backend::infrastructure::database;
use lost_found_backend::services::item_service::{ItemService, ReportItemRequest};
use lost_found_backend::services::marketplace_service::{
    MarketplaceFilters, MarketplaceService, PromoteRequest,
};
use lost_found_backend::services::notifier::{LogNotifier, Notifier};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use std::sync::Arc;
use uuid::Uuid;

async fn setup_test_db() -> DatabaseConnection {
    unsafe {
        std::env::set_var("DATABASE_URL", "sqlite::memory:");
    }
    let db = sea_orm::Database::connect("sqlite::memory:").await.unwrap();
    database::run_migrations(&db).await.unwrap();
    db
}

fn notifier() -> Arc<dyn Notifier> {
    Arc::new(LogNotifier)
}

async fn create_user(db: &DatabaseConnection, email: &str) -> users::Model {
    let user = users::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        email: Set(email.to_string()),
        name: Set(email.split('@').next().unwrap().to_string()),
        password_hash: Set("unused-in-service-tests".to_string()),
        role: Set("user".to_string()),
        is_verified: Set(true),
        verification_token: Set(None),
        verification_token_expires: Set(None),
        created_at: Set(Some(Utc::now())),
    };
    user.insert(db).await.unwrap()
}

fn found_request(title: &str) -> ReportItemRequest {
    ReportItemRequest {
        item_type: "found".to_string(),
        title: title.to_string(),
        description: "Unclaimed past its hold period".to_string(),
        category: "Misc".to_string(),
        location: "Union".to_string(),
        date: Utc::now().date_naive() - Days::new(31),
        image_url: None,
        contact_email: "finder@illinois.edu".to_string(),
        contact_phone: None,
    }
}

fn pickup(location: &str) -> PromoteRequest {
    PromoteRequest {
        pickup_location: Some(location.to_string()),
        price: None,
    }
}

#[tokio::test]
async fn test_concurrent_claims_have_exactly_one_winner() {
    let db = setup_test_db().await;
    let notifier = notifier();
    let finder = create_user(&db, "finder@illinois.edu").await;

    let item = ItemService::report_found(&db, &finder.id, found_request("Bike Lock"), 30)
        .await
        .unwrap();
    let listing = MarketplaceService::promote(&db, &item.id, pickup("Union desk"))
        .await
        .unwrap();

    const CONTENDERS: usize = 20;
    let mut handles = Vec::new();
    for n in 0..CONTENDERS {
        let db = db.clone();
        let notifier = notifier.clone();
        let listing_id = listing.id.clone();
        let user_id = format!("user-{n}");
        handles.push(tokio::spawn(async move {
            MarketplaceService::claim(&db, &notifier, &listing_id, &user_id)
                .await
                .map(|listing| listing.claimed_by)
        }));
    }

    let mut winners = Vec::new();
    let mut losses = 0;
    for result in futures::future::join_all(handles).await {
        match result.unwrap() {
            Ok(claimed_by) => winners.push(claimed_by.unwrap()),
            Err(AppError::AlreadyClaimed(_)) => losses += 1,
            Err(other) => panic!("unexpected race outcome: {other:?}"),
        }
    }

    assert_eq!(winners.len(), 1);
    assert_eq!(losses, CONTENDERS - 1);

    // The stored listing records exactly the one winner.
    let stored = MarketplaceItems::find_by_id(&listing.id)
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, "claimed");
    assert_eq!(stored.claimed_by.as_deref(), Some(winners[0].as_str()));
    assert!(stored.claimed_at.is_some());
}

#[tokio::test]
async fn test_claim_after_resolution_is_a_definite_loss() {
    let db = setup_test_db().await;
    let notifier = notifier();
    let finder = create_user(&db, "finder@illinois.edu").await;
    let alice = create_user(&db, "alice@illinois.edu").await;
    let bob = create_user(&db, "bob@illinois.edu").await;

    let item = ItemService::report_found(&db, &finder.id, found_request("Desk Lamp"), 30)
        .await
        .unwrap();
    let listing = MarketplaceService::promote(&db, &item.id, pickup("Front desk"))
        .await
        .unwrap();

    MarketplaceService::claim(&db, &notifier, &listing.id, &alice.id)
        .await
        .unwrap();

    let err = MarketplaceService::claim(&db, &notifier, &listing.id, &bob.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::AlreadyClaimed(_)));

    // Claimed listings drop out of the public browse.
    let available = MarketplaceService::list_available(&db, &MarketplaceFilters::default())
        .await
        .unwrap();
    assert!(available.is_empty());

    let mine = MarketplaceService::list_claimed_by(&db, &alice.id)
        .await
        .unwrap();
    assert_eq!(mine.len(), 1);
}

#[tokio::test]
async fn test_claim_unknown_listing_is_not_found() {
    let db = setup_test_db().await;
    let notifier = notifier();

    let err = MarketplaceService::claim(&db, &notifier, "missing", "user-1")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn test_promotion_rules() {
    let db = setup_test_db().await;
    let finder = create_user(&db, "finder@illinois.edu").await;

    let item = ItemService::report_found(&db, &finder.id, found_request("Textbook"), 30)
        .await
        .unwrap();

    // Pickup location or price is required
    let err = MarketplaceService::promote(
        &db,
        &item.id,
        PromoteRequest {
            pickup_location: None,
            price: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    // Promotion flips the item out of the regular listings
    MarketplaceService::promote(&db, &item.id, pickup("Union desk"))
        .await
        .unwrap();
    let item_after = ItemService::get(&db, &item.id).await.unwrap();
    assert_eq!(item_after.status, "marketplace");

    // One listing per source item, ever
    let err = MarketplaceService::promote(&db, &item.id, pickup("Union desk"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));

    // Non-active items cannot be promoted
    let claimed = ItemService::report_found(&db, &finder.id, found_request("Mug"), 30)
        .await
        .unwrap();
    ItemService::mark_claimed(&db, &claimed.id).await.unwrap();
    let err = MarketplaceService::promote(&db, &claimed.id, pickup("Union desk"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition(_)));

    // A priced listing without a pickup location is the other promotion path
    let priced = ItemService::report_found(&db, &finder.id, found_request("Skateboard"), 30)
        .await
        .unwrap();
    let listing = MarketplaceService::promote(
        &db,
        &priced.id,
        PromoteRequest {
            pickup_location: None,
            price: Some(25.0),
        },
    )
    .await
    .unwrap();
    assert_eq!(listing.price, Some(25.0));
    assert_eq!(listing.status, "available");
}
