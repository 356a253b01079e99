/// Billing Webhook
///
/// Called by the payment provider with `Authorization: ApiKey <key>`. Only
/// `user.upgraded` does anything; every other event is acknowledged and ignored so the
/// provider does not retry it.

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::WebhookCaller;
use crate::error::{AppError, ErrorContext};
use crate::store::Store;

const USER_UPGRADED: &str = "user.upgraded";

#[derive(Deserialize, Default)]
pub struct WebhookData {
    #[serde(default)]
    pub user_id: String,
}

#[derive(Deserialize)]
pub struct WebhookRequest {
    #[serde(default)]
    pub event: String,
    #[serde(default)]
    pub data: WebhookData,
}

/// POST /api/strip/webhooks
///
/// # Errors
/// - 401: Missing or wrong API key
/// - 404: `user.upgraded` for an unknown user
pub async fn billing_webhook(
    _caller: WebhookCaller,
    form: web::Json<WebhookRequest>,
    store: web::Data<dyn Store>,
) -> Result<HttpResponse, AppError> {
    let context = ErrorContext::new("billing_webhook");

    if form.event != USER_UPGRADED {
        tracing::debug!(request_id = %context.request_id, event = %form.event, "Ignoring webhook event");
        return Ok(HttpResponse::NoContent().finish());
    }

    let user_id = match Uuid::parse_str(&form.data.user_id) {
        Ok(id) => id,
        Err(e) => {
            tracing::warn!(
                request_id = %context.request_id,
                error = %e,
                "Webhook carried an unparseable user id; acknowledging without change"
            );
            return Ok(HttpResponse::NoContent().finish());
        }
    };

    store
        .upgrade_membership(user_id)
        .await?
        .ok_or(AppError::NotFound("User"))?;

    tracing::info!(
        request_id = %context.request_id,
        user_id = %user_id,
        "User upgraded to Gohost Red"
    );

    Ok(HttpResponse::NoContent().finish())
}
