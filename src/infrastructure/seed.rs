use crate::entities::{prelude::*, users};
use argon2::{
    Argon2,
    password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use std::env;
use tracing::info;
use uuid::Uuid;

/// Idempotent bootstrap of the initial admin account from
/// ADMIN_EMAIL / ADMIN_PASSWORD. Skipped when either is unset.
pub async fn seed_initial_admin(db: &DatabaseConnection) -> anyhow::Result<()> {
    let (Ok(email), Ok(password)) = (env::var("ADMIN_EMAIL"), env::var("ADMIN_PASSWORD")) else {
        return Ok(());
    };
    let email = email.trim().to_lowercase();

    let existing = Users::find()
        .filter(users::Column::Email.eq(&email))
        .one(db)
        .await?;
    if existing.is_some() {
        info!("🌱 Admin account already exists, skipping seed");
        return Ok(());
    }

    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash admin password: {}", e))?
        .to_string();

    let admin = users::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        email: Set(email.clone()),
        name: Set("System Admin".to_string()),
        password_hash: Set(password_hash),
        role: Set("admin".to_string()),
        is_verified: Set(true),
        verification_token: Set(None),
        verification_token_expires: Set(None),
        created_at: Set(Some(Utc::now())),
    };
    admin.insert(db).await?;

    info!("🌱 Seeded admin account: {}", email);
    Ok(())
}
