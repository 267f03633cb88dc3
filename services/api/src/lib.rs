//! Stockroom API service
//!
//! REST backend for the inventory demo: registration and login, product
//! CRUD with image upload, and a simulated checkout that validates and
//! decrements stock per cart line.

use anyhow::Result;
use sqlx::PgPool;
use tracing::info;
use tracing_subscriber::EnvFilter;

pub mod checkout;
pub mod error;
pub mod extract;
pub mod images;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod validation;

use crate::images::ImageStore;
use crate::jwt::{JwtConfig, JwtService};
use crate::repositories::{ProductRepository, UserRepository};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub jwt_service: JwtService,
    pub user_repository: UserRepository,
    pub product_repository: ProductRepository,
    pub image_store: ImageStore,
}

/// Initialize infrastructure and serve the API until shutdown.
pub async fn run() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting stockroom API service");

    // Initialize database connection pool
    let db_config = common::database::DatabaseConfig::from_env()?;
    let pool = common::database::init_pool(&db_config).await?;

    // Check database connectivity
    if common::database::health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    common::database::run_migrations(&pool, sqlx::migrate!("./migrations")).await?;

    // Initialize JWT service
    let jwt_config = JwtConfig::from_env()?;
    let jwt_service = JwtService::new(&jwt_config);

    // Initialize the image store and make sure the uploads directory exists
    let uploads_dir = std::env::var("UPLOADS_DIR").unwrap_or_else(|_| "uploads".to_string());
    let image_store = ImageStore::new(uploads_dir);
    image_store.ensure_root().await?;

    let user_repository = UserRepository::new(pool.clone());
    let product_repository = ProductRepository::new(pool.clone());

    let app_state = AppState {
        db_pool: pool,
        jwt_service,
        user_repository,
        product_repository,
        image_store,
    };

    // Start the web server
    let app = routes::create_router(app_state);

    let port = std::env::var("PORT").unwrap_or_else(|_| "3001".to_string());
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("API service listening on {addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
