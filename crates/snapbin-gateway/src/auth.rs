// SPDX-FileCopyrightText: 2026 Snapbin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! JWT issuance, verification, and the bearer-token middleware.

use std::time::Duration;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use snapbin_core::SnapbinError;

use crate::response::ApiError;
use crate::server::AppState;

/// Claims carried in every access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    pub username: String,
    /// Expiry (unix seconds).
    pub exp: i64,
    /// Issued-at (unix seconds).
    pub iat: i64,
}

/// HS256 signer/verifier around the configured secret.
pub struct JwtManager {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    token_ttl: Duration,
}

impl std::fmt::Debug for JwtManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtManager")
            .field("secret", &"[redacted]")
            .field("token_ttl", &self.token_ttl)
            .finish()
    }
}

impl JwtManager {
    pub fn new(secret: &str, token_ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            token_ttl,
        }
    }

    /// Issue a token for a logged-in user.
    pub fn generate(&self, user_id: i64, username: &str) -> Result<String, SnapbinError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            user_id,
            username: username.to_string(),
            exp: now + self.token_ttl.as_secs() as i64,
            iat: now,
        };
        jsonwebtoken::encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| SnapbinError::Internal(format!("token signing failed: {e}")))
    }

    /// Verify a token's signature and expiry, returning its claims.
    pub fn verify(&self, token: &str) -> Result<Claims, SnapbinError> {
        jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| SnapbinError::Auth(format!("invalid token: {e}")))
    }
}

/// The authenticated caller, inserted as a request extension by
/// [`auth_middleware`] for protected handlers to extract.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i64,
    pub username: String,
}

/// Middleware enforcing `Authorization: Bearer <token>` on protected routes.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = request
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let Some(header) = header else {
        return Err(ApiError::unauthorized("authorization header is required"));
    };
    let Some(token) = header.strip_prefix("Bearer ") else {
        return Err(ApiError::unauthorized("invalid authorization header format"));
    };

    let claims = state
        .jwt
        .verify(token)
        .map_err(|_| ApiError::unauthorized("invalid or expired token"))?;

    request.extensions_mut().insert(AuthUser {
        user_id: claims.user_id,
        username: claims.username,
    });
    Ok(next.run(request).await)
}
