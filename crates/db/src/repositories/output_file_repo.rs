//! Repository for the `r__file_names` table.
//!
//! The job script writes one row per produced file into this table in the
//! job's schema. The runner reads it back after a successful run and, in the
//! upload flow, records the storage id of each uploaded file.

use lgr_core::manifest::OutputFileRecord;
use sqlx::PgPool;

use crate::models::output_file::OutputFileRow;
use crate::quote_ident;

/// Name of the table listing produced files.
pub const FILE_NAMES_TABLE: &str = "r__file_names";

/// Provides query operations for the produced-files table.
pub struct OutputFileRepo;

impl OutputFileRepo {
    /// `SELECT` statement listing produced files in `schema`.
    pub fn select_sql(schema: &str) -> String {
        format!(
            "SELECT name, value FROM {}.{}",
            quote_ident(schema),
            quote_ident(FILE_NAMES_TABLE)
        )
    }

    /// `UPDATE` statement storing a file's storage id in `schema`.
    pub fn update_id_sql(schema: &str) -> String {
        format!(
            "UPDATE {}.{} SET id = $1 WHERE name = $2 AND value = $3",
            quote_ident(schema),
            quote_ident(FILE_NAMES_TABLE)
        )
    }

    /// List produced files in the order the warehouse returns them.
    pub async fn list(pool: &PgPool, schema: &str) -> Result<Vec<OutputFileRecord>, sqlx::Error> {
        let sql = Self::select_sql(schema);
        let rows: Vec<OutputFileRow> = sqlx::query_as(&sql).fetch_all(pool).await?;
        tracing::debug!(count = rows.len(), schema, "Output files listed");
        Ok(rows.into_iter().map(OutputFileRecord::from).collect())
    }

    /// Record the storage id assigned to an uploaded file.
    pub async fn set_id(
        pool: &PgPool,
        schema: &str,
        record: &OutputFileRecord,
        file_id: i64,
    ) -> Result<(), sqlx::Error> {
        let sql = Self::update_id_sql(schema);
        sqlx::query(&sql)
            .bind(file_id)
            .bind(&record.name)
            .bind(&record.value)
            .execute(pool)
            .await?;

        Ok(())
    }
}
