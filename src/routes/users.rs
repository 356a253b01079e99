/// User Routes
///
/// Registration and profile update. Responses serialize `User`, which never includes
/// the password hash.

use actix_web::{web, HttpResponse};
use serde::Deserialize;

use crate::auth::{hash_password, AuthenticatedUser};
use crate::error::{AppError, ErrorContext};
use crate::models::NewUser;
use crate::store::Store;
use crate::validators::{validate_email, validate_password};

/// Body of both registration and update
#[derive(Deserialize)]
pub struct UserRequest {
    pub email: String,
    pub password: String,
}

/// POST /api/users
///
/// # Errors
/// - 400: Invalid email or password
/// - 409: Email already registered
/// - 500: Internal server error
pub async fn register(
    form: web::Json<UserRequest>,
    store: web::Data<dyn Store>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_registration");

    let email = validate_email(&form.email)?;
    validate_password(&form.password)?;
    let hashed_password = hash_password(&form.password).await?;

    let user = store
        .create_user(NewUser {
            email,
            hashed_password,
        })
        .await?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = %user.id,
        "User registered successfully"
    );

    Ok(HttpResponse::Created().json(user))
}

/// PUT /api/users
///
/// Replace the caller's email and password.
///
/// # Errors
/// - 400: Invalid email or password
/// - 401: Missing or invalid access token
/// - 404: The account no longer exists
/// - 409: Email taken by another account
pub async fn update(
    caller: AuthenticatedUser,
    form: web::Json<UserRequest>,
    store: web::Data<dyn Store>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("user_update").with_user_id(caller.0);

    let email = validate_email(&form.email)?;
    validate_password(&form.password)?;
    let hashed_password = hash_password(&form.password).await?;

    let user = store
        .update_user(caller.0, &email, &hashed_password)
        .await?
        .ok_or(AppError::NotFound("User"))?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = ?context.user_id,
        "User updated successfully"
    );

    Ok(HttpResponse::Ok().json(user))
}
