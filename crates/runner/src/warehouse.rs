//! Access to the warehouse's list of produced files.
//!
//! The orchestrator talks to [`Warehouse`] and [`OutputCatalog`] so that
//! tests can run the whole job without a database.

use async_trait::async_trait;
use lgr_core::credentials::Credentials;
use lgr_core::manifest::OutputFileRecord;
use lgr_db::repositories::OutputFileRepo;
use lgr_db::DbPool;

use crate::error::RunError;

/// Opens a catalogue connection with the job's credentials.
#[async_trait]
pub trait Warehouse: Send + Sync {
    async fn open(&self, credentials: &Credentials) -> Result<Box<dyn OutputCatalog>, RunError>;
}

/// The job schema's `r__file_names` table.
#[async_trait]
pub trait OutputCatalog: Send + Sync {
    /// Every produced file, in query order.
    async fn output_files(&self) -> Result<Vec<OutputFileRecord>, RunError>;

    /// Write back the storage id of an uploaded file.
    async fn record_file_id(&self, record: &OutputFileRecord, file_id: i64) -> Result<(), RunError>;
}

/// Postgres-protocol warehouse.
#[derive(Debug, Default, Clone, Copy)]
pub struct PgWarehouse;

#[async_trait]
impl Warehouse for PgWarehouse {
    async fn open(&self, credentials: &Credentials) -> Result<Box<dyn OutputCatalog>, RunError> {
        let pool = lgr_db::create_pool(credentials).await?;
        Ok(Box::new(PgCatalog {
            pool,
            schema: credentials.schema.clone(),
        }))
    }
}

struct PgCatalog {
    pool: DbPool,
    schema: String,
}

#[async_trait]
impl OutputCatalog for PgCatalog {
    async fn output_files(&self) -> Result<Vec<OutputFileRecord>, RunError> {
        Ok(OutputFileRepo::list(&self.pool, &self.schema).await?)
    }

    async fn record_file_id(&self, record: &OutputFileRecord, file_id: i64) -> Result<(), RunError> {
        OutputFileRepo::set_id(&self.pool, &self.schema, record, file_id).await?;
        tracing::debug!(name = %record.name, file_id, "File id recorded");
        Ok(())
    }
}
