/// Admin Routes
///
/// Hit counter page and the development-only reset.

use actix_web::{web, HttpResponse};

use crate::configuration::Platform;
use crate::error::{AppError, AuthError, ErrorContext};
use crate::metrics::HitCounter;
use crate::store::Store;

/// GET /admin/metrics
pub async fn metrics(hits: web::Data<HitCounter>) -> HttpResponse {
    let body = format!(
        r#"<html>
  <body>
    <h1>Welcome, Gohost Admin</h1>
    <p>Gohost has been visited {} times!</p>
  </body>
</html>"#,
        hits.get()
    );

    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(body)
}

/// POST /admin/reset
///
/// Zeroes the hit counter and deletes every user, which cascades to their refresh
/// tokens and gobits.
///
/// # Errors
/// - 403: The server is not running with `platform: dev`
/// - 500/503: The store could not be cleared
pub async fn reset(
    platform: web::Data<Platform>,
    hits: web::Data<HitCounter>,
    store: web::Data<dyn Store>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("admin_reset");

    if **platform != Platform::Dev {
        tracing::warn!(
            request_id = %context.request_id,
            "Reset attempted outside the dev platform"
        );
        return Err(AuthError::Forbidden.into());
    }

    hits.reset();
    store.reset_all_users().await?;

    tracing::info!(request_id = %context.request_id, "Hits reset and all users deleted");

    Ok(HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body(format!("Hits reset to {} and all users deleted", hits.get())))
}
