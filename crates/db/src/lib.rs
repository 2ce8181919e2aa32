//! Warehouse access.
//!
//! The warehouse speaks the Postgres wire protocol, so the pool is a plain
//! `sqlx` Postgres pool built from the job's provisioned credentials.

use lgr_core::credentials::Credentials;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};

pub mod models;
pub mod repositories;

pub type DbPool = sqlx::PgPool;

/// Connection options for the warehouse described by `credentials`.
pub fn connect_options(credentials: &Credentials) -> PgConnectOptions {
    PgConnectOptions::new()
        .host(&credentials.hostname)
        .port(credentials.port)
        .database(&credentials.db)
        .username(&credentials.user)
        .password(&credentials.password)
}

/// Open a small pool against the job's warehouse.
///
/// A job issues its queries strictly one after another, so one connection
/// is enough.
pub async fn create_pool(credentials: &Credentials) -> Result<DbPool, sqlx::Error> {
    tracing::debug!(
        host = %credentials.hostname,
        port = credentials.port,
        db = %credentials.db,
        "Connecting to warehouse"
    );
    PgPoolOptions::new()
        .max_connections(1)
        .connect_with(connect_options(credentials))
        .await
}

/// Quote an SQL identifier, doubling any embedded quotes.
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}
