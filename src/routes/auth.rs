/// Authentication Routes
///
/// Login, access token refresh and refresh token revocation. Refresh and revoke take the
/// refresh token from `Authorization: Bearer <refresh_token>`.

use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::auth::{bearer_token, ttl_from_seconds, Authenticator};
use crate::error::{AppError, ErrorContext};
use crate::models::User;

/// User login request
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    /// Optional shorter access token lifetime; capped at one hour
    pub expires_in_seconds: Option<i64>,
}

/// The user plus both tokens
#[derive(Serialize)]
pub struct LoginResponse {
    #[serde(flatten)]
    pub user: User,
    pub token: String,
    pub refresh_token: String,
}

#[derive(Serialize)]
pub struct RefreshResponse {
    pub token: String,
}

/// POST /api/login
///
/// # Errors
/// - 401: Invalid credentials (email not found or wrong password, indistinguishable)
/// - 500: Internal server error
pub async fn login(
    form: web::Json<LoginRequest>,
    authenticator: web::Data<Authenticator>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_login");
    let form = form.into_inner();

    let requested_ttl = form.expires_in_seconds.map(ttl_from_seconds);
    let session = authenticator
        .login(form.email.trim(), &form.password, requested_ttl)
        .await?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = %session.user.id,
        access_token_expires_at = %session.access_token_expires_at,
        "Login succeeded"
    );

    Ok(HttpResponse::Ok().json(LoginResponse {
        user: session.user,
        token: session.access_token,
        refresh_token: session.refresh_token,
    }))
}

/// POST /api/refresh
///
/// Mints a new one-hour access token. The refresh token itself is not rotated.
///
/// # Errors
/// - 401: Missing, unknown, revoked or expired refresh token
pub async fn refresh(
    req: HttpRequest,
    authenticator: web::Data<Authenticator>,
) -> Result<HttpResponse, AppError> {
    let refresh_token = bearer_token(req.headers())?;
    let access = authenticator.refresh(refresh_token).await?;

    Ok(HttpResponse::Ok().json(RefreshResponse {
        token: access.token,
    }))
}

/// POST /api/revoke
///
/// Always 204: whether the token existed, was already revoked or was missing altogether
/// is not disclosed.
pub async fn revoke(req: HttpRequest, authenticator: web::Data<Authenticator>) -> HttpResponse {
    match bearer_token(req.headers()) {
        Ok(refresh_token) => authenticator.revoke(refresh_token).await,
        Err(e) => tracing::info!(reason = %e, "Revoke called without a refresh token"),
    }

    HttpResponse::NoContent().finish()
}
