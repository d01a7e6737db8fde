//! Handlers for the `/auth` resource (signup, login, refresh, logout, me).

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use portal_core::error::CoreError;
use portal_core::roles::{is_known_role, ROLE_ADMIN};
use portal_core::types::DbId;
use portal_db::models::session::CreateSession;
use portal_db::models::user::{CreateUser, UserResponse};
use portal_db::repositories::{RoleRepo, SessionRepo, UserRepo};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::auth::jwt::{generate_access_token, generate_refresh_token, hash_refresh_token};
use crate::auth::password::{hash_password, validate_password_strength, verify_password};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Consecutive failed logins that lock an account.
const MAX_FAILED_ATTEMPTS: i32 = 5;

/// How long a locked account stays locked.
const LOCK_DURATION_MINS: i64 = 15;

const INVALID_CREDENTIALS: &str = "Invalid email or password";

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(email(message = "Enter a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, max = 120, message = "Display name must be 1-120 characters"))]
    pub display_name: String,
    pub password: String,
    /// `"admin"` (default) or `"staff"`.
    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Returned by signup, login and refresh.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    pub user: UserResponse,
}

fn unauthorized(msg: &str) -> AppError {
    AppError::Core(CoreError::Unauthorized(msg.to_string()))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/signup
///
/// Create a staff account and sign it in. Disabled with 403 when
/// `SIGNUP_ENABLED=false`.
pub async fn signup(
    State(state): State<AppState>,
    Json(input): Json<SignupRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<AuthResponse>>)> {
    if !state.config.signup_enabled {
        return Err(AppError::Core(CoreError::Forbidden(
            "Signup is disabled".into(),
        )));
    }

    input
        .validate()
        .map_err(|e| AppError::Core(CoreError::Validation(e.to_string())))?;
    validate_password_strength(&input.password)
        .map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;

    let role_name = input.role.as_deref().unwrap_or(ROLE_ADMIN);
    if !is_known_role(role_name) {
        return Err(AppError::Core(CoreError::Validation(format!(
            "Unknown role '{role_name}'"
        ))));
    }
    let role = RoleRepo::find_by_name(&state.pool, role_name)
        .await?
        .ok_or_else(|| AppError::InternalError(format!("Role '{role_name}' is not seeded")))?;

    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    let user = UserRepo::create(
        &state.pool,
        &CreateUser {
            email: input.email.trim().to_string(),
            display_name: input.display_name.trim().to_string(),
            password_hash,
            role_id: role.id,
        },
    )
    .await?;

    tracing::info!(user_id = user.id, role = %role.name, "User signed up");

    let response = create_auth_response(&state, UserResponse::from_user(&user, role.name)).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: response })))
}

/// POST /api/v1/auth/login
///
/// Email + password. Five consecutive failures lock the account for 15
/// minutes.
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<DataResponse<AuthResponse>>> {
    let user = UserRepo::find_by_email(&state.pool, input.email.trim())
        .await?
        .ok_or_else(|| unauthorized(INVALID_CREDENTIALS))?;

    if !user.is_active {
        return Err(AppError::Core(CoreError::Forbidden(
            "Account is deactivated".into(),
        )));
    }

    if user.locked_until.is_some_and(|until| until > Utc::now()) {
        return Err(AppError::Core(CoreError::Forbidden(
            "Account is temporarily locked. Try again later.".into(),
        )));
    }

    let password_valid = verify_password(&input.password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;

    if !password_valid {
        let failures = UserRepo::increment_failed_login(&state.pool, user.id).await?;
        if failures >= MAX_FAILED_ATTEMPTS {
            let until = Utc::now() + chrono::Duration::minutes(LOCK_DURATION_MINS);
            UserRepo::lock_account(&state.pool, user.id, until).await?;
            tracing::warn!(user_id = user.id, failures, "Account locked after failed logins");
        }
        return Err(unauthorized(INVALID_CREDENTIALS));
    }

    UserRepo::record_successful_login(&state.pool, user.id).await?;
    let role = RoleRepo::resolve_name(&state.pool, user.role_id).await?;

    tracing::info!(user_id = user.id, "User logged in");

    let response = create_auth_response(&state, UserResponse::from_user(&user, role)).await?;
    Ok(Json(DataResponse { data: response }))
}

/// POST /api/v1/auth/refresh
///
/// Trade a live refresh token for a new pair. The old session is revoked.
pub async fn refresh(
    State(state): State<AppState>,
    Json(input): Json<RefreshRequest>,
) -> AppResult<Json<DataResponse<AuthResponse>>> {
    let token_hash = hash_refresh_token(&input.refresh_token);

    let session = SessionRepo::consume_refresh_token(&state.pool, &token_hash)
        .await?
        .ok_or_else(|| unauthorized("Invalid or expired refresh token"))?;

    let user = UserRepo::find_by_id(&state.pool, session.user_id)
        .await?
        .ok_or_else(|| unauthorized("User no longer exists"))?;

    if !user.is_active {
        return Err(AppError::Core(CoreError::Forbidden(
            "Account is deactivated".into(),
        )));
    }

    let role = RoleRepo::resolve_name(&state.pool, user.role_id).await?;
    let response = create_auth_response(&state, UserResponse::from_user(&user, role)).await?;
    Ok(Json(DataResponse { data: response }))
}

/// POST /api/v1/auth/logout
///
/// Revoke every session of the caller. Returns 204.
pub async fn logout(State(state): State<AppState>, auth: AuthUser) -> AppResult<StatusCode> {
    let revoked = SessionRepo::revoke_all_for_user(&state.pool, auth.user_id).await?;
    tracing::info!(user_id = auth.user_id, revoked, "User logged out");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/auth/me
pub async fn me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<DataResponse<UserResponse>>> {
    let user = UserRepo::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: auth.user_id,
        }))?;
    let role = RoleRepo::resolve_name(&state.pool, user.role_id).await?;
    Ok(Json(DataResponse {
        data: UserResponse::from_user(&user, role),
    }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Issue a token pair for `user` and persist the refresh session.
async fn create_auth_response(state: &AppState, user: UserResponse) -> AppResult<AuthResponse> {
    let jwt = &state.config.jwt;
    let access_token = generate_access_token(user.id, &user.role, jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

    let (refresh_token, refresh_hash) = generate_refresh_token();
    persist_session(state, user.id, refresh_hash).await?;

    Ok(AuthResponse {
        access_token,
        refresh_token,
        expires_in: jwt.access_token_ttl_secs(),
        user,
    })
}

async fn persist_session(state: &AppState, user_id: DbId, refresh_hash: String) -> AppResult<()> {
    SessionRepo::create(
        &state.pool,
        &CreateSession {
            user_id,
            refresh_token_hash: refresh_hash,
            expires_at: state.config.jwt.refresh_expires_at(Utc::now()),
            user_agent: None,
            ip_address: None,
        },
    )
    .await?;
    Ok(())
}
