use gohost::configuration::{get_configuration, DatabaseSettings};
use gohost::startup::run;
use gohost::store::{InMemoryStore, PgStore, Store};
use gohost::telemetry::init_telemetry;
use secrecy::ExposeSecret;
use sqlx::postgres::PgPoolOptions;
use std::net::TcpListener;
use std::sync::Arc;

async fn build_store(database: &DatabaseSettings) -> std::io::Result<Arc<dyn Store>> {
    if database.in_memory {
        tracing::warn!("Using in-memory store; all data is lost on shutdown");
        return Ok(Arc::new(InMemoryStore::new()));
    }

    tracing::info!("Attempting to connect to database");
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(database.connection_string().expose_secret())
        .await
        .map_err(|e| {
            tracing::error!("Failed to create connection pool: {}", e);
            std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "Database connection error",
            )
        })?;
    tracing::info!("Database connection pool created successfully");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to run migrations: {}", e);
            std::io::Error::new(std::io::ErrorKind::Other, "Database migration error")
        })?;
    tracing::info!("Database migrations applied");

    Ok(Arc::new(PgStore::new(pool)))
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    init_telemetry();

    tracing::info!("Starting application");

    let configuration = match get_configuration() {
        Ok(config) => {
            tracing::info!("Configuration loaded successfully");
            config
        }
        Err(e) => {
            tracing::error!("Failed to read configuration: {}", e);
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "Configuration error",
            ));
        }
    };

    let store = build_store(&configuration.database).await?;

    let address = format!(
        "{}:{}",
        configuration.application.host, configuration.application.port
    );
    tracing::info!("Binding server to address: {}", address);

    let listener = TcpListener::bind(&address)?;
    tracing::info!(
        platform = ?configuration.application.platform,
        "Server listening on: {}",
        address
    );

    let server = run(listener, store, &configuration)?;
    tracing::info!("Server started successfully");

    server.await
}
