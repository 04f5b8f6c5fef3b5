pub mod application;
pub mod auth;
pub mod config;
pub mod db;
pub mod domain;
pub mod errors;
pub mod handlers;
pub mod infrastructure;
pub mod schema;
pub mod state;

use std::sync::Arc;

use actix_web::{middleware::Logger, web, App, HttpServer};
use diesel::r2d2::PoolError;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use thiserror::Error;

use crate::auth::AuthKeys;
use crate::config::{AppConfig, ConfigError};
use crate::infrastructure::pg_store::DieselUnitOfWork;
use crate::infrastructure::receipt_pdf::PdfReceiptRenderer;
use crate::infrastructure::staged_cart::StagedCartCodec;
use crate::state::AppState;

pub use db::{create_pool, DbPool};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to create database connection pool: {0}")]
    Pool(#[from] PoolError),

    #[error("Failed to run database migrations: {0}")]
    Migrations(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Run any pending Diesel migrations against the pool's database.
pub fn run_migrations(pool: &DbPool) -> Result<(), StartupError> {
    let mut conn = pool.get()?;
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|e| StartupError::Migrations(e.to_string()))?;
    log::info!("Applied {} pending migration(s)", applied.len());
    Ok(())
}

/// Build and return an actix-web `Server` bound to the configured address.
///
/// The caller is responsible for `.await`-ing (or `tokio::spawn`-ing) the
/// returned server.
pub fn build_server(
    pool: DbPool,
    config: &AppConfig,
) -> std::io::Result<actix_web::dev::Server> {
    let state = web::Data::new(AppState::new(
        DieselUnitOfWork::new(pool),
        Arc::new(PdfReceiptRenderer::new(config.receipt_line_limit)),
        StagedCartCodec::new(config.staged_cart_secret.as_bytes()),
    ));
    let keys = web::Data::new(AuthKeys::new(config.jwt_secret.as_bytes()));

    Ok(HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .app_data(keys.clone())
            .wrap(Logger::default())
            .route("/api-docs/openapi.json", web::get().to(handlers::openapi_json))
            .configure(handlers::configure_purchases::<DieselUnitOfWork>)
            .configure(handlers::configure_cart::<DieselUnitOfWork>)
    })
    .bind((config.host.clone(), config.port))?
    .run())
}
