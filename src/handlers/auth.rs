//! # Account Endpoint Handlers
//!
//! Registration, login and logout. Sessions double as the anonymous
//! identity, so login attaches the user to the caller's existing session
//! when one is present instead of minting a new one.

use axum::{
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode, header::CACHE_CONTROL, header::SET_COOKIE},
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use sea_orm::Set;
use serde::Deserialize;
use serde_json::{Map, json};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::{
    clear_session_cookie, generate_salt, hash_password, resolve_identity, session_cookie,
    session_token_from_headers, verify_password,
};
use crate::error::{ApiError, validation_error};
use crate::handlers::types::UserInfo;
use crate::models::{session, user};
use crate::repositories::{SessionRepository, UserRepository};
use crate::server::AppState;

/// Request payload for registration
#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    #[schema(example = "aziza")]
    pub username: String,
    #[schema(example = "aziza@example.com")]
    pub email: String,
    pub password: String,
}

/// Register a new account and log it in
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created and logged in", body = UserInfo),
        (status = 400, description = "Validation failed (including duplicate username/email)", body = ApiError)
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<RegisterRequest>,
) -> Result<Response, ApiError> {
    let username = request.username.trim();
    let email = request.email.trim();

    let mut field_errors = Map::new();
    if username.is_empty() {
        field_errors.insert("username".into(), json!("cannot be empty"));
    }
    if !email.contains('@') {
        field_errors.insert("email".into(), json!("must be a valid email address"));
    }
    if request.password.len() < 8 {
        field_errors.insert("password".into(), json!("must be at least 8 characters"));
    }

    let users = UserRepository::new(&state.db);
    if field_errors.is_empty() {
        // Duplicates are reported as field errors rather than conflicts.
        if users.find_by_username(username).await?.is_some() {
            field_errors.insert("username".into(), json!("already taken"));
        }
        if users.find_by_email(email).await?.is_some() {
            field_errors.insert("email".into(), json!("already registered"));
        }
    }

    if !field_errors.is_empty() {
        return Err(validation_error(
            "Registration failed",
            serde_json::Value::Object(field_errors),
        ));
    }

    let salt = generate_salt();
    let password_hash = hash_password(&state.config.auth_secret, &salt, &request.password);
    let created = users
        .create(user::ActiveModel {
            id: Set(Uuid::new_v4()),
            username: Set(username.to_string()),
            email: Set(email.to_string()),
            password_hash: Set(password_hash),
            salt: Set(salt),
            created_at: Set(Utc::now().into()),
        })
        .await?;

    tracing::info!(user = %created.username, "Registered account");
    let set_cookie = login_session(&state, &headers, created.id).await?;

    let info: UserInfo = created.into();
    Ok(with_session_cookie(
        (StatusCode::CREATED, Json(info)).into_response(),
        set_cookie,
    ))
}

/// Request payload for login
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Log an existing account in
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = UserInfo),
        (status = 400, description = "Invalid credentials", body = ApiError)
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    let invalid = || {
        validation_error(
            "Login failed",
            json!({"credentials": "invalid username or password"}),
        )
    };

    let user = UserRepository::new(&state.db)
        .find_by_username(request.username.trim())
        .await?
        .ok_or_else(invalid)?;

    if !verify_password(
        &state.config.auth_secret,
        &user.salt,
        &request.password,
        &user.password_hash,
    ) {
        return Err(invalid());
    }

    tracing::info!(user = %user.username, "Logged in");
    let set_cookie = login_session(&state, &headers, user.id).await?;

    let info: UserInfo = user.into();
    Ok(with_session_cookie(
        (StatusCode::OK, Json(info)).into_response(),
        set_cookie,
    ))
}

/// Log out: drop the session row and clear the cookie
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 204, description = "Logged out")
    ),
    tag = "auth"
)]
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    if let Some(token) = session_token_from_headers(&headers) {
        SessionRepository::new(&state.db).delete(token).await?;
        tracing::debug!(session = %token, "Deleted session");
    }

    let mut response = StatusCode::NO_CONTENT.into_response();
    let response_headers = response.headers_mut();
    if let Ok(cookie) = HeaderValue::from_str(&clear_session_cookie()) {
        response_headers.insert(SET_COOKIE, cookie);
    }
    response_headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache, no-store"));
    Ok(response)
}

/// Attach the user to the caller's session, minting one when absent.
///
/// Returns the `Set-Cookie` value when a session was minted.
async fn login_session(
    state: &AppState,
    headers: &HeaderMap,
    user_id: Uuid,
) -> Result<Option<String>, ApiError> {
    let sessions = SessionRepository::new(&state.db);

    if let Some(identity) = resolve_identity(&state.db, headers).await? {
        sessions.attach_user(identity.session_token(), user_id).await?;
        return Ok(None);
    }

    let token = Uuid::new_v4();
    sessions
        .create(session::ActiveModel {
            token: Set(token),
            user_id: Set(Some(user_id)),
            created_at: Set(Utc::now().into()),
        })
        .await?;
    Ok(Some(session_cookie(token)))
}

fn with_session_cookie(mut response: Response, set_cookie: Option<String>) -> Response {
    if let Some(cookie) = set_cookie {
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            response.headers_mut().insert(SET_COOKIE, value);
        }
    }
    response
}
