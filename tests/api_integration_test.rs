use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use chrono::{Days, Utc};
use http_body_util::BodyExt;
use lost_found_backend::config::AppConfig;
use lost_found_backend::entities::{prelude::*, users};
use lost_found_backend::infrastructure::database;
use lost_found_backend::services::notifier::LogNotifier;
use lost_found_backend::{AppState, create_app};
use sea_orm::{ColumnTrait, Database, EntityTrait, QueryFilter};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

async fn setup_test_db() -> sea_orm::DatabaseConnection {
    unsafe {
        std::env::set_var("DATABASE_URL", "sqlite::memory:");
    }
    let db = Database::connect("sqlite::memory:").await.unwrap();
    database::run_migrations(&db).await.unwrap();
    db
}

fn test_state(db: sea_orm::DatabaseConnection) -> AppState {
    AppState {
        db,
        notifier: Arc::new(LogNotifier),
        config: AppConfig::development(),
    }
}

async fn request(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

/// Registers, pulls the verification token out of the DB, verifies and logs
/// in. Returns the bearer token.
async fn register_and_login(
    app: &Router,
    db: &sea_orm::DatabaseConnection,
    name: &str,
    email: &str,
) -> String {
    let (status, _) = request(
        app,
        "POST",
        "/auth/register",
        None,
        Some(json!({"name": name, "email": email, "password": "password123"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let user = Users::find()
        .filter(users::Column::Email.eq(email))
        .one(db)
        .await
        .unwrap()
        .unwrap();
    let token = user.verification_token.clone().unwrap();

    let (status, _) = request(
        app,
        "GET",
        &format!("/auth/verify-email/{}", token),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = request(
        app,
        "POST",
        "/auth/login",
        None,
        Some(json!({"email": email, "password": "password123"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_full_api_flow() {
    let db = setup_test_db().await;

    // Seed the admin account the way production startup does.
    unsafe {
        std::env::set_var("ADMIN_EMAIL", "admin@illinois.edu");
        std::env::set_var("ADMIN_PASSWORD", "Admin123!");
    }
    lost_found_backend::infrastructure::seed::seed_initial_admin(&db)
        .await
        .unwrap();

    let state = test_state(db.clone());
    let app = create_app(state);

    // 1. Non-institutional email is rejected before any record is created
    let (status, body) = request(
        &app,
        "POST",
        "/auth/register",
        None,
        Some(json!({"name": "Eve", "email": "eve@gmail.com", "password": "password123"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("illinois.edu"));
    let eve = Users::find()
        .filter(users::Column::Email.eq("eve@gmail.com"))
        .one(&db)
        .await
        .unwrap();
    assert!(eve.is_none());

    // 2. Register a finder; unverified login is refused with a marker
    let (status, _) = request(
        &app,
        "POST",
        "/auth/register",
        None,
        Some(json!({"name": "Finn", "email": "finn@illinois.edu", "password": "password123"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = request(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({"email": "finn@illinois.edu", "password": "password123"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["needs_verification"], json!(true));

    // 3. Verify and log in
    let finn = Users::find()
        .filter(users::Column::Email.eq("finn@illinois.edu"))
        .one(&db)
        .await
        .unwrap()
        .unwrap();
    let verification_token = finn.verification_token.clone().unwrap();
    let (status, _) = request(
        &app,
        "GET",
        &format!("/auth/verify-email/{}", verification_token),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Token is single use
    let (status, _) = request(
        &app,
        "GET",
        &format!("/auth/verify-email/{}", verification_token),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = request(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({"email": "finn@illinois.edu", "password": "password123"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let finn_token = body["token"].as_str().unwrap().to_string();
    assert_eq!(body["user"]["role"], json!("user"));

    let (status, body) = request(&app, "GET", "/auth/me", Some(&finn_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], json!("finn@illinois.edu"));

    // 4. Report a found item; expiry is computed from the date found
    let date_found = (Utc::now().date_naive() - Days::new(5)).to_string();
    let (status, body) = request(
        &app,
        "POST",
        "/items",
        Some(&finn_token),
        Some(json!({
            "type": "found",
            "title": "Blue Backpack",
            "description": "Found near the library entrance",
            "category": "Bags",
            "location": "Main Library",
            "date": date_found,
            "contact_email": "finn@illinois.edu"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    let item_id = body["id"].as_str().unwrap().to_string();
    assert_eq!(body["status"], json!("active"));
    assert_eq!(body["days_until_expiry"], json!(25));

    // Unauthenticated report is refused
    let (status, _) = request(
        &app,
        "POST",
        "/items",
        None,
        Some(json!({
            "type": "lost",
            "title": "Keys",
            "description": "Lost keys",
            "category": "Keys",
            "location": "Quad",
            "date": date_found,
            "contact_email": "finn@illinois.edu"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // 5. Public browse sees the item
    let (status, body) = request(&app, "GET", "/items?type=found", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, _) = request(&app, "GET", "/items?search=backpack", None, None).await;
    assert_eq!(status, StatusCode::OK);

    // 6. A second user claims the item
    let cleo_token = register_and_login(&app, &db, "Cleo", "cleo@illinois.edu").await;

    let (status, _) = request(
        &app,
        "PUT",
        &format!("/items/{}", item_id),
        Some(&cleo_token),
        Some(json!({"title": "Hijacked"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = request(
        &app,
        "POST",
        "/claims",
        Some(&cleo_token),
        Some(json!({
            "item_id": item_id,
            "description": "That is my backpack, lost it on Tuesday",
            "verification_details": "It has a red keychain on the left zipper"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    let claim_id = body["id"].as_str().unwrap().to_string();

    // Same claimant cannot file a second pending claim on the same item
    let (status, _) = request(
        &app,
        "POST",
        "/claims",
        Some(&cleo_token),
        Some(json!({
            "item_id": item_id,
            "description": "That is my backpack, lost it on Tuesday",
            "verification_details": "It has a red keychain on the left zipper"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = request(&app, "GET", "/claims/my-claims", Some(&cleo_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, body) = request(
        &app,
        "GET",
        "/claims/for-my-items",
        Some(&finn_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    // 7. Moderation requires the admin role
    let (status, _) = request(&app, "GET", "/admin/claims/pending", Some(&cleo_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = request(
        &app,
        "POST",
        "/auth/login",
        None,
        Some(json!({"email": "admin@illinois.edu", "password": "Admin123!"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let admin_token = body["token"].as_str().unwrap().to_string();

    let (status, body) = request(&app, "GET", "/admin/claims/pending", Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    // 8. Approval cascades to the item
    let (status, body) = request(
        &app,
        "PUT",
        &format!("/admin/claims/{}/approve", claim_id),
        Some(&admin_token),
        Some(json!({"review_notes": "Keychain matches the photo"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["status"], json!("approved"));

    let (status, body) = request(&app, "GET", &format!("/items/{}", item_id), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("claimed"));

    // Re-approving is a definite 409
    let (status, _) = request(
        &app,
        "PUT",
        &format!("/admin/claims/{}/approve", claim_id),
        Some(&admin_token),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // The resolved item cannot be claimed again
    let (status, _) = request(
        &app,
        "POST",
        "/claims",
        Some(&finn_token),
        Some(json!({
            "item_id": item_id,
            "description": "Actually it might have been mine after all",
            "verification_details": "Blue with straps"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // 9. Promote a second found item into the marketplace
    let (status, body) = request(
        &app,
        "POST",
        "/items",
        Some(&finn_token),
        Some(json!({
            "type": "found",
            "title": "Black Umbrella",
            "description": "Left behind in lecture hall 2",
            "category": "Accessories",
            "location": "Everitt Hall",
            "date": date_found,
            "contact_email": "finn@illinois.edu"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let umbrella_id = body["id"].as_str().unwrap().to_string();

    let (status, body) = request(
        &app,
        "POST",
        &format!("/admin/items/{}/to-marketplace", umbrella_id),
        Some(&admin_token),
        Some(json!({"pickup_location": "Union desk 12"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    let listing_id = body["id"].as_str().unwrap().to_string();
    assert_eq!(body["status"], json!("available"));

    // Promoting the same item again conflicts
    let (status, _) = request(
        &app,
        "POST",
        &format!("/admin/items/{}/to-marketplace", umbrella_id),
        Some(&admin_token),
        Some(json!({"pickup_location": "Union desk 12"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // The item no longer shows in the regular browse
    let (status, body) = request(&app, "GET", "/items", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(
        body.as_array()
            .unwrap()
            .iter()
            .all(|item| item["id"] != json!(umbrella_id))
    );

    // 10. First come, first served
    let (status, body) = request(&app, "GET", "/marketplace", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, body) = request(
        &app,
        "POST",
        &format!("/marketplace/{}/claim", listing_id),
        Some(&cleo_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["pickup_location"], json!("Union desk 12"));

    let (status, _) = request(
        &app,
        "POST",
        &format!("/marketplace/{}/claim", listing_id),
        Some(&finn_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = request(
        &app,
        "GET",
        "/marketplace/my/claimed",
        Some(&cleo_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    // 11. Dashboard counters line up
    let (status, body) = request(&app, "GET", "/admin/stats", Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_found_items"], json!(2));
    assert_eq!(body["pending_claims"], json!(0));
    assert_eq!(body["approved_claims"], json!(1));
    assert_eq!(body["marketplace_items"], json!(0));
}

#[tokio::test]
async fn test_unknown_fields_rejected() {
    let db = setup_test_db().await;
    let app = create_app(test_state(db));

    let (status, _) = request(
        &app,
        "POST",
        "/auth/register",
        None,
        Some(json!({
            "name": "Finn",
            "email": "finn2@illinois.edu",
            "password": "password123",
            "role": "admin"
        })),
    )
    .await;
    // Payloads carry only the declared fields; privilege escalation via
    // unknown fields is refused at deserialization.
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_invalid_token_rejected() {
    let db = setup_test_db().await;
    let app = create_app(test_state(db));

    let (status, _) = request(&app, "GET", "/auth/me", Some("garbage-token"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = request(&app, "GET", "/auth/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
