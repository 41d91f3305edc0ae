//! Admin login and bearer-token middleware
//!
//! Protected routes require `Authorization: Bearer <token>` where the token
//! was issued by `POST /api/login`.
//! - Missing or non-Bearer header: 401
//! - Bad signature or expired token: 403

use axum::{
    extract::{rejection::JsonRejection, Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use requestline_common::api::{issue_token, secrets_match, verify_token};
use requestline_common::time::{epoch_millis, now};

use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub token: String,
}

/// POST /api/login
pub async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<LoginResponse>> {
    let Some(expected) = state.auth.password.as_deref().filter(|p| !p.is_empty()) else {
        return Err(ApiError::Internal("Admin password not set".to_string()));
    };

    let Json(body) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    if !secrets_match(&body.password, expected) {
        warn!("Admin login rejected");
        return Err(ApiError::Unauthorized("Invalid password".to_string()));
    }

    info!("Admin logged in");
    Ok(Json(LoginResponse {
        success: true,
        token: issue_token(&state.auth.token_secret, epoch_millis(now())),
    }))
}

/// Require a valid admin token
pub async fn auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| {
            ApiError::Unauthorized("Authorization header missing or invalid".to_string())
        })?;

    if let Err(e) = verify_token(token, &state.auth.token_secret, epoch_millis(now())) {
        debug!(error = %e, "Admin token rejected");
        return Err(ApiError::Forbidden("Token expired or invalid".to_string()));
    }

    Ok(next.run(request).await)
}
