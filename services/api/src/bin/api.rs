//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{
        DbAdapter, DisabledIdentityProvider, GoogleBooksProvider, HttpIdentityProvider,
        MemoryStore, NationalLibraryProvider, OpenLibraryProvider,
    },
    config::Config,
    error::ApiError,
    service::CatalogLookup,
    web::{build_router, AppState},
};
use book_tracker_core::ports::{
    BookStore, CatalogProvider, IdentityProvider, SessionStore, UserStore,
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const USER_AGENT: &str = concat!("book-tracker/", env!("CARGO_PKG_VERSION"));

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations ---
    let (users, sessions, books): (Arc<dyn UserStore>, Arc<dyn SessionStore>, Arc<dyn BookStore>) =
        match &config.database_url {
            Some(url) => {
                info!("Connecting to database...");
                let db_pool = PgPoolOptions::new().max_connections(5).connect(url).await?;
                let db_adapter = Arc::new(DbAdapter::new(db_pool));
                info!("Running database migrations...");
                db_adapter.run_migrations().await?;
                info!("Database migrations complete.");
                (
                    db_adapter.clone() as Arc<dyn UserStore>,
                    db_adapter.clone() as Arc<dyn SessionStore>,
                    db_adapter as Arc<dyn BookStore>,
                )
            }
            None => {
                warn!("DATABASE_URL is not set; data is kept in memory and lost on restart");
                let store = Arc::new(MemoryStore::new());
                (
                    store.clone() as Arc<dyn UserStore>,
                    store.clone() as Arc<dyn SessionStore>,
                    store as Arc<dyn BookStore>,
                )
            }
        };

    // --- 3. Initialize Outbound Adapters ---
    let http_client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .connect_timeout(Duration::from_secs(5))
        .build()
        .map_err(|e| ApiError::Internal(format!("Failed to build HTTP client: {}", e)))?;

    let providers: Vec<Arc<dyn CatalogProvider>> = vec![
        Arc::new(GoogleBooksProvider::new(
            http_client.clone(),
            config.google_books_api_key.clone(),
        )),
        Arc::new(OpenLibraryProvider::new(http_client.clone())),
        Arc::new(NationalLibraryProvider::new(http_client.clone())),
    ];
    let catalog = CatalogLookup::new(providers, config.catalog_timeout);

    let identity: Arc<dyn IdentityProvider> = match &config.identity_session_url {
        Some(url) => {
            info!(url = %url, "Federated sign-in enabled");
            Arc::new(HttpIdentityProvider::new(http_client.clone(), url.clone()))
        }
        None => Arc::new(DisabledIdentityProvider),
    };

    // --- 4. Build the Shared AppState and Router ---
    let app_state = Arc::new(AppState::new(
        config.clone(),
        users,
        sessions,
        books,
        catalog,
        identity,
    ));
    let app = build_router(app_state);

    // --- 5. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
