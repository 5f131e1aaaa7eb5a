use std::net::TcpListener;
use std::sync::Arc;

use factions_auth::accounts::PgAccountStore;
use factions_auth::auth::{unknown_account_hash, BcryptVerifier, TokenService};
use factions_auth::configuration::get_configuration;
use factions_auth::startup::run;
use factions_auth::telemetry::init_telemetry;
use sqlx::postgres::PgPoolOptions;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let configuration = get_configuration().map_err(|e| {
        eprintln!("Failed to read configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "Configuration error")
    })?;

    init_telemetry(
        &configuration.application.log_level,
        configuration.application.log_format,
    );
    tracing::info!("Configuration loaded successfully");

    let tokens = TokenService::from_settings(&configuration.jwt).map_err(|e| {
        tracing::error!("Invalid JWT configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "JWT configuration error")
    })?;
    tracing::info!(
        algorithm = %configuration.jwt.algorithm,
        access_token_expiry = tokens.access_lifetime_secs(),
        refresh_token_expiry = tokens.refresh_lifetime_secs(),
        "Token service ready"
    );

    // Built lazily; do it now so the first unknown-email login is not slower.
    let _ = unknown_account_hash();

    tracing::info!("Attempting to connect to database");
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&configuration.database.connection_string())
        .await
        .map_err(|e| {
            tracing::error!("Failed to create connection pool: {}", e);
            std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "Database connection error",
            )
        })?;
    tracing::info!("Database connection pool created successfully");

    let address = format!(
        "{}:{}",
        configuration.application.host, configuration.application.port
    );
    let listener = TcpListener::bind(&address)?;
    tracing::info!("Server listening on: {}", address);

    let server = run(
        listener,
        Arc::new(tokens),
        Arc::new(PgAccountStore::new(pool)),
        Arc::new(BcryptVerifier),
    )?;

    server.await
}
