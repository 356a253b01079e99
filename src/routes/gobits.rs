/// Gobit Routes
///
/// Anyone may read gobits; writing requires an access token and deleting requires
/// being the author.

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::{authorize_owner, AuthenticatedUser};
use crate::error::{AppError, ErrorContext, ValidationError};
use crate::models::SortOrder;
use crate::store::Store;
use crate::validators::validate_gobit_body;

#[derive(Deserialize)]
pub struct GobitRequest {
    pub body: String,
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub author_id: Option<String>,
    pub sort: Option<String>,
}

fn parse_id(raw: &str, field: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim())
        .map_err(|_| ValidationError::InvalidFormat(field.to_string()).into())
}

/// POST /api/gobits
///
/// # Errors
/// - 400: Empty body or longer than 140 characters
/// - 401: Missing or invalid access token
pub async fn create_gobit(
    caller: AuthenticatedUser,
    form: web::Json<GobitRequest>,
    store: web::Data<dyn Store>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("create_gobit").with_user_id(caller.0);

    let body = validate_gobit_body(&form.body)?;
    let gobit = store.create_gobit(&body, caller.0).await?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = %caller.0,
        gobit_id = %gobit.id,
        "Gobit created"
    );

    Ok(HttpResponse::Created().json(gobit))
}

/// GET /api/gobits?author_id=<uuid>&sort=asc|desc
///
/// Oldest first unless `sort=desc`.
pub async fn list_gobits(
    query: web::Query<ListQuery>,
    store: web::Data<dyn Store>,
) -> Result<HttpResponse, AppError> {
    let author = match query.author_id.as_deref() {
        Some(raw) if !raw.is_empty() => Some(parse_id(raw, "author_id")?),
        _ => None,
    };
    let order = match query.sort.as_deref() {
        Some("desc") => SortOrder::Descending,
        _ => SortOrder::Ascending,
    };

    let gobits = store.list_gobits(author, order).await?;
    Ok(HttpResponse::Ok().json(gobits))
}

/// GET /api/gobits/{gobit_id}
pub async fn get_gobit(
    path: web::Path<String>,
    store: web::Data<dyn Store>,
) -> Result<HttpResponse, AppError> {
    let id = parse_id(&path, "gobit id")?;

    let gobit = store
        .get_gobit(id)
        .await?
        .ok_or(AppError::NotFound("Gobit"))?;

    Ok(HttpResponse::Ok().json(gobit))
}

/// DELETE /api/gobits/{gobit_id}
///
/// # Errors
/// - 401: Missing or invalid access token
/// - 403: Caller is not the author
/// - 404: No such gobit
pub async fn delete_gobit(
    caller: AuthenticatedUser,
    path: web::Path<String>,
    store: web::Data<dyn Store>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("delete_gobit").with_user_id(caller.0);
    let id = parse_id(&path, "gobit id")?;

    let gobit = store
        .get_gobit(id)
        .await?
        .ok_or(AppError::NotFound("Gobit"))?;
    authorize_owner(gobit.user_id, caller.0)?;

    // Gone between the read and the delete
    if !store.delete_gobit(id, caller.0).await? {
        return Err(AppError::NotFound("Gobit"));
    }

    tracing::info!(
        request_id = %context.request_id,
        user_id = %caller.0,
        gobit_id = %id,
        "Gobit deleted"
    );

    Ok(HttpResponse::NoContent().finish())
}
