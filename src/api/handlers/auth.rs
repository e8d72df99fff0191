use crate::api::error::AppError;
use crate::entities::{prelude::*, users};
use crate::utils::auth::{Claims, create_jwt};
use crate::utils::validation::{generate_verification_token, is_institutional_email};
use argon2::{
    Argon2,
    password_hash::{PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{Duration, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

#[derive(Deserialize, ToSchema, Validate)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct RegisterResponse {
    pub message: String,
    pub email: String,
}

#[derive(Deserialize, ToSchema, Validate)]
#[serde(deny_unknown_fields)]
pub struct ResendVerificationRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

#[derive(Deserialize, ToSchema, Validate)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: String,
    pub is_verified: bool,
}

#[derive(Serialize, ToSchema)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserResponse,
}

#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl From<users::Model> for UserResponse {
    fn from(user: users::Model) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            is_verified: user.is_verified,
        }
    }
}

#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered, verification email sent", body = RegisterResponse),
        (status = 400, description = "Validation failed"),
        (status = 409, description = "Email already registered")
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<crate::AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let email = payload.email.trim().to_lowercase();
    if !is_institutional_email(&email, &state.config.allowed_email_domain) {
        return Err(AppError::BadRequest(format!(
            "Only @{} email addresses are allowed",
            state.config.allowed_email_domain
        )));
    }

    let existing = Users::find()
        .filter(users::Column::Email.eq(&email))
        .one(&state.db)
        .await?;
    if let Some(existing) = existing {
        if !existing.is_verified {
            return Err(AppError::Conflict(
                "Email already registered but not verified. Please check your email for the verification link.".to_string(),
            ));
        }
        return Err(AppError::Conflict("User already exists".to_string()));
    }

    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(payload.password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(e.to_string()))?
        .to_string();

    let verification_token = generate_verification_token();
    let token_expiry = Utc::now() + Duration::hours(state.config.verification_token_hours);

    let user = users::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        email: Set(email.clone()),
        name: Set(payload.name.clone()),
        password_hash: Set(password_hash),
        role: Set("user".to_string()),
        is_verified: Set(false),
        verification_token: Set(Some(verification_token.clone())),
        verification_token_expires: Set(Some(token_expiry)),
        created_at: Set(Some(Utc::now())),
    };
    user.insert(&state.db).await?;

    let notifier = state.notifier.clone();
    let name = payload.name;
    let to = email.clone();
    tokio::spawn(async move {
        if let Err(e) = notifier
            .send_verification(&to, &name, &verification_token)
            .await
        {
            tracing::warn!("Verification email failed: {}", e);
        }
    });

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "Registration successful! Please check your email to verify your account."
                .to_string(),
            email,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/auth/verify-email/{token}",
    params(("token" = String, Path, description = "Email verification token")),
    responses(
        (status = 200, description = "Email verified", body = MessageResponse),
        (status = 400, description = "Invalid or expired verification link")
    ),
    tag = "auth"
)]
pub async fn verify_email(
    State(state): State<crate::AppState>,
    Path(token): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let user = Users::find()
        .filter(users::Column::VerificationToken.eq(&token))
        .filter(users::Column::VerificationTokenExpires.gt(Utc::now()))
        .one(&state.db)
        .await?
        .ok_or_else(|| {
            AppError::BadRequest("Invalid or expired verification link".to_string())
        })?;

    let email = user.email.clone();
    let name = user.name.clone();

    let mut active: users::ActiveModel = user.into();
    active.is_verified = Set(true);
    active.verification_token = Set(None);
    active.verification_token_expires = Set(None);
    active.update(&state.db).await?;

    let notifier = state.notifier.clone();
    tokio::spawn(async move {
        if let Err(e) = notifier.send_welcome(&email, &name).await {
            tracing::warn!("Welcome email failed: {}", e);
        }
    });

    Ok(Json(MessageResponse {
        message: "Email verified successfully! You can now login.".to_string(),
    }))
}

#[utoipa::path(
    post,
    path = "/auth/resend-verification",
    request_body = ResendVerificationRequest,
    responses(
        (status = 200, description = "Verification email sent", body = MessageResponse),
        (status = 400, description = "Email already verified"),
        (status = 404, description = "User not found")
    ),
    tag = "auth"
)]
pub async fn resend_verification(
    State(state): State<crate::AppState>,
    Json(payload): Json<ResendVerificationRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let user = Users::find()
        .filter(users::Column::Email.eq(payload.email.trim().to_lowercase()))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    if user.is_verified {
        return Err(AppError::BadRequest("Email already verified".to_string()));
    }

    let verification_token = generate_verification_token();
    let token_expiry = Utc::now() + Duration::hours(state.config.verification_token_hours);

    let email = user.email.clone();
    let name = user.name.clone();

    let mut active: users::ActiveModel = user.into();
    active.verification_token = Set(Some(verification_token.clone()));
    active.verification_token_expires = Set(Some(token_expiry));
    active.update(&state.db).await?;

    let notifier = state.notifier.clone();
    tokio::spawn(async move {
        if let Err(e) = notifier
            .send_verification(&email, &name, &verification_token)
            .await
        {
            tracing::warn!("Verification email failed: {}", e);
        }
    });

    Ok(Json(MessageResponse {
        message: "Verification email sent! Please check your inbox.".to_string(),
    }))
}

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 403, description = "Email not verified")
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<crate::AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Response, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let user = Users::find()
        .filter(users::Column::Email.eq(payload.email.trim().to_lowercase()))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid credentials".to_string()))?;

    if !user.is_verified {
        return Ok((
            StatusCode::FORBIDDEN,
            Json(json!({
                "error": "Please verify your email before logging in. Check your inbox for the verification link.",
                "needs_verification": true,
            })),
        )
            .into_response());
    }

    let argon2 = Argon2::default();
    let parsed_hash = argon2::PasswordHash::new(&user.password_hash)
        .map_err(|e| AppError::Internal(e.to_string()))?;
    argon2
        .verify_password(payload.password.as_bytes(), &parsed_hash)
        .map_err(|_| AppError::Unauthorized("Invalid credentials".to_string()))?;

    let token = create_jwt(
        &user.id,
        &user.email,
        &user.role,
        &state.config.jwt_secret,
        state.config.token_expiry_days,
    )
    .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(AuthResponse {
        token,
        user: user.into(),
    })
    .into_response())
}

#[utoipa::path(
    get,
    path = "/auth/me",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(("jwt" = [])),
    tag = "auth"
)]
pub async fn me(
    State(state): State<crate::AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<UserResponse>, AppError> {
    let user = Users::find_by_id(&claims.sub)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(user.into()))
}
