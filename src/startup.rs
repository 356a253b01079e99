use actix_files as fs;
use actix_web::dev::{Server, Service};
use actix_web::error::JsonPayloadError;
use actix_web::{middleware::Logger, web, App, HttpServer};
use std::net::TcpListener;
use std::sync::Arc;

use crate::auth::{AccessTokenCodec, Authenticator, RefreshTokenStore};
use crate::configuration::{Settings, MAX_REFRESH_TOKEN_EXPIRY_DAYS};
use crate::error::{AppError, ValidationError};
use crate::metrics::HitCounter;
use crate::middleware::RequestLogger;
use crate::routes::{
    billing_webhook, create_gobit, delete_gobit, get_gobit, health_check, list_gobits, login,
    metrics, refresh, register, reset, revoke, update, validate,
};
use crate::store::Store;

/// A body sent as anything but JSON is 415. Malformed JSON gets the same 400 shape as any
/// other validation failure.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        tracing::debug!(error = %err, "Rejected request body");
        match err {
            JsonPayloadError::ContentType => AppError::UnsupportedMediaType.into(),
            _ => {
                AppError::from(ValidationError::InvalidFormat("request body".to_string())).into()
            }
        }
    })
}

pub fn run(
    listener: TcpListener,
    store: Arc<dyn Store>,
    settings: &Settings,
) -> Result<Server, std::io::Error> {
    let refresh_lifetime = settings.jwt.refresh_token_lifetime().ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!(
                "jwt.refresh_token_expiry_days must be between 1 and {}, got {}",
                MAX_REFRESH_TOKEN_EXPIRY_DAYS, settings.jwt.refresh_token_expiry_days
            ),
        )
    })?;

    let codec = AccessTokenCodec::new(&settings.jwt);
    let refresh_tokens = RefreshTokenStore::new(store.clone(), refresh_lifetime);
    let authenticator = Authenticator::new(store.clone(), codec.clone(), refresh_tokens);

    let authenticator = web::Data::new(authenticator);
    let codec = web::Data::new(codec);
    let webhook = web::Data::new(settings.webhook.clone());
    let platform = web::Data::new(settings.application.platform);
    let store: web::Data<dyn Store> = web::Data::from(store);
    let hits = web::Data::new(HitCounter::new());
    let static_dir = settings.application.static_dir.clone();

    let server = HttpServer::new(move || {
        let counted_hits = hits.clone();

        App::new()
            // Global middleware
            .wrap(Logger::default())
            .wrap(RequestLogger)

            // Shared state
            .app_data(json_config())
            .app_data(authenticator.clone())
            .app_data(codec.clone())
            .app_data(webhook.clone())
            .app_data(platform.clone())
            .app_data(store.clone())
            .app_data(hits.clone())

            .route("/api/healthz", web::get().to(health_check))
            .route("/admin/metrics", web::get().to(metrics))
            .route("/admin/reset", web::post().to(reset))
            .route("/api/validate", web::post().to(validate))
            .service(
                web::resource("/api/users")
                    .route(web::post().to(register))
                    .route(web::put().to(update)),
            )
            .route("/api/login", web::post().to(login))
            .route("/api/refresh", web::post().to(refresh))
            .route("/api/revoke", web::post().to(revoke))
            .service(
                web::resource("/api/gobits")
                    .route(web::post().to(create_gobit))
                    .route(web::get().to(list_gobits)),
            )
            .service(
                web::resource("/api/gobits/{gobit_id}")
                    .route(web::get().to(get_gobit))
                    .route(web::delete().to(delete_gobit)),
            )
            .route("/api/strip/webhooks", web::post().to(billing_webhook))

            // Static files, every request counted
            .service(
                web::scope("/app")
                    .wrap_fn(move |req, srv| {
                        counted_hits.increment();
                        srv.call(req)
                    })
                    .service(fs::Files::new("/", &static_dir).index_file("index.html")),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
