//! # Authentication and Identity
//!
//! This module provides session-based identity resolution (registered users
//! and anonymous visitors), password hashing, and operator bearer
//! authentication for administrative endpoints.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, header::AUTHORIZATION, header::COOKIE},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use hmac::{Hmac, Mac};
use rand::RngCore;
use sea_orm::{DatabaseConnection, Set};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::error::{ApiError, unauthorized};
use crate::models::session;
use crate::repositories::SessionRepository;
use crate::server::AppState;

type HmacSha256 = Hmac<Sha256>;

/// Name of the identity cookie handed to every visitor.
pub const SESSION_COOKIE: &str = "tezlik_session";

/// Requesting identity, resolved from the session cookie.
///
/// History and deletion are scoped by this: a registered user owns rows with
/// their user id, an anonymous visitor owns rows carrying their session
/// token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Identity {
    User { user_id: Uuid, session: Uuid },
    Anonymous { session: Uuid },
}

impl Identity {
    pub fn session_token(&self) -> Uuid {
        match self {
            Identity::User { session, .. } => *session,
            Identity::Anonymous { session } => *session,
        }
    }

    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            Identity::User { user_id, .. } => Some(*user_id),
            Identity::Anonymous { .. } => None,
        }
    }
}

/// Extract the session token from the request's cookie header, if present.
pub fn session_token_from_headers(headers: &HeaderMap) -> Option<Uuid> {
    let raw = headers.get(COOKIE)?.to_str().ok()?;
    for pair in raw.split(';') {
        if let Some((name, value)) = pair.trim().split_once('=') {
            if name == SESSION_COOKIE {
                return value.trim().parse().ok();
            }
        }
    }
    None
}

/// Resolve the caller's identity from the session cookie.
///
/// Returns `None` when no cookie is present or the token matches no session
/// row (stale cookies are treated as absent, not as errors).
pub async fn resolve_identity(
    db: &DatabaseConnection,
    headers: &HeaderMap,
) -> Result<Option<Identity>, ApiError> {
    let Some(token) = session_token_from_headers(headers) else {
        return Ok(None);
    };

    let repo = SessionRepository::new(db);
    let Some(session) = repo.find_by_token(token).await? else {
        return Ok(None);
    };

    Ok(Some(match session.user_id {
        Some(user_id) => Identity::User {
            user_id,
            session: session.token,
        },
        None => Identity::Anonymous {
            session: session.token,
        },
    }))
}

/// Resolve the caller's identity, minting a fresh anonymous session when
/// none exists.
///
/// The second element is the `Set-Cookie` value to attach to the response
/// when a session was minted.
pub async fn ensure_identity(
    db: &DatabaseConnection,
    headers: &HeaderMap,
) -> Result<(Identity, Option<String>), ApiError> {
    if let Some(identity) = resolve_identity(db, headers).await? {
        return Ok((identity, None));
    }

    let repo = SessionRepository::new(db);
    let token = Uuid::new_v4();
    repo.create(session::ActiveModel {
        token: Set(token),
        user_id: Set(None),
        created_at: Set(Utc::now().into()),
    })
    .await?;

    tracing::debug!(session = %token, "Minted anonymous session");
    Ok((Identity::Anonymous { session: token }, Some(session_cookie(token))))
}

/// Build the `Set-Cookie` value for a session token.
pub fn session_cookie(token: Uuid) -> String {
    format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, token)
}

/// Build the `Set-Cookie` value that clears the session cookie.
pub fn clear_session_cookie() -> String {
    format!("{}=; Path=/; HttpOnly; Max-Age=0", SESSION_COOKIE)
}

/// Generate a random hex salt for password hashing.
pub fn generate_salt() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Hash a password with the server secret and a per-user salt.
pub fn hash_password(secret: &str, salt: &str, password: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts keys of any length");
    mac.update(salt.as_bytes());
    mac.update(password.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Verify a password against a stored hash in constant time.
pub fn verify_password(secret: &str, salt: &str, password: &str, stored_hash: &str) -> bool {
    let computed = hash_password(secret, salt, password);
    ConstantTimeEq::ct_eq(computed.as_bytes(), stored_hash.as_bytes()).into()
}

/// Middleware guarding administrative endpoints with operator bearer tokens.
pub async fn operator_auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(request.headers())?;
    validate_operator_token(&state.config, token)?;

    tracing::info!("Authenticated operator request");
    Ok(next.run(request).await)
}

fn extract_bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    headers
        .get(AUTHORIZATION)
        .ok_or_else(|| unauthorized(Some("Missing Authorization header")))
        .and_then(|value| {
            value
                .to_str()
                .map_err(|_| unauthorized(Some("Invalid Authorization header")))
        })
        .and_then(|header| {
            header
                .strip_prefix("Bearer ")
                .ok_or_else(|| unauthorized(Some("Authorization header must use Bearer scheme")))
        })
}

fn validate_operator_token(config: &AppConfig, token: &str) -> Result<(), ApiError> {
    let is_valid = config
        .operator_tokens
        .iter()
        .any(|configured| ConstantTimeEq::ct_eq(token.as_bytes(), configured.as_bytes()).into());

    if is_valid {
        Ok(())
    } else {
        Err(unauthorized(Some("Invalid bearer token")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn cookie_parsing_finds_session_token() {
        let token = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&format!("other=1; {}={}; x=y", SESSION_COOKIE, token)).unwrap(),
        );
        assert_eq!(session_token_from_headers(&headers), Some(token));
    }

    #[test]
    fn cookie_parsing_ignores_garbage() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("tezlik_session=not-a-uuid; other"),
        );
        assert_eq!(session_token_from_headers(&headers), None);
        assert_eq!(session_token_from_headers(&HeaderMap::new()), None);
    }

    #[test]
    fn password_hash_round_trip() {
        let salt = generate_salt();
        let hash = hash_password("secret", &salt, "hunter2");
        assert!(verify_password("secret", &salt, "hunter2", &hash));
        assert!(!verify_password("secret", &salt, "hunter3", &hash));
        assert!(!verify_password("other-secret", &salt, "hunter2", &hash));
    }

    #[test]
    fn salts_are_unique() {
        assert_ne!(generate_salt(), generate_salt());
    }

    #[test]
    fn operator_token_validation() {
        let config = AppConfig {
            operator_tokens: vec!["tok-a".to_string(), "tok-b".to_string()],
            ..Default::default()
        };
        assert!(validate_operator_token(&config, "tok-b").is_ok());
        assert!(validate_operator_token(&config, "tok-c").is_err());

        let empty = AppConfig::default();
        assert!(validate_operator_token(&empty, "anything").is_err());
    }

    #[test]
    fn bearer_extraction() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer tok"));
        assert_eq!(extract_bearer_token(&headers).unwrap(), "tok");

        let mut basic = HeaderMap::new();
        basic.insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert!(extract_bearer_token(&basic).is_err());
        assert!(extract_bearer_token(&HeaderMap::new()).is_err());
    }
}
