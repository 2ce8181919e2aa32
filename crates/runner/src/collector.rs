//! Result collection: moves or uploads every file the script reported.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use lgr_core::manifest::{FileManifest, OutputFileRecord};
use lgr_core::output::{safe_file_name, store_locally};
use lgr_storage::{FileUploadOptions, StorageApiClient};

use crate::error::RunError;
use crate::warehouse::OutputCatalog;

/// Where one produced file ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredOutput {
    /// Moved into the local output directory.
    Local(PathBuf),
    /// Uploaded; the storage-assigned id.
    Remote(i64),
}

/// Destination for produced files.
#[async_trait]
pub trait FileSink: Send + Sync {
    async fn store(
        &self,
        work_dir: &Path,
        record: &OutputFileRecord,
        file_tags: &[String],
    ) -> Result<StoredOutput, RunError>;
}

/// Moves files into `<data>/out/files` and writes a manifest beside each.
#[derive(Debug, Clone)]
pub struct LocalFileSink {
    out_dir: PathBuf,
}

impl LocalFileSink {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }
}

#[async_trait]
impl FileSink for LocalFileSink {
    async fn store(
        &self,
        work_dir: &Path,
        record: &OutputFileRecord,
        file_tags: &[String],
    ) -> Result<StoredOutput, RunError> {
        let dest = store_locally(work_dir, &self.out_dir, record, file_tags).await?;
        tracing::debug!(name = %record.name, dest = %dest.display(), "Output file stored");
        Ok(StoredOutput::Local(dest))
    }
}

/// Uploads files to the Storage API.
pub struct StorageFileSink {
    client: StorageApiClient,
}

impl StorageFileSink {
    pub fn new(client: StorageApiClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl FileSink for StorageFileSink {
    async fn store(
        &self,
        work_dir: &Path,
        record: &OutputFileRecord,
        file_tags: &[String],
    ) -> Result<StoredOutput, RunError> {
        let path = work_dir.join(safe_file_name(&record.value)?);
        let manifest = FileManifest::for_record(record, file_tags);
        let options = FileUploadOptions {
            is_public: manifest.is_public,
            is_permanent: manifest.is_permanent,
            is_sliced: false,
            notify: manifest.notify,
            tags: manifest.tags,
        };
        let stored = self.client.upload_file(&path, &options).await?;
        tracing::debug!(name = %record.name, file_id = stored.id, "Output file uploaded");
        Ok(StoredOutput::Remote(stored.id))
    }
}

/// Store every file listed in `catalog`, in catalogue order.
///
/// Uploaded files get their id written back to the catalogue. The first
/// failure stops collection; files already stored stay where they are.
pub async fn collect_outputs(
    catalog: &dyn OutputCatalog,
    sink: &dyn FileSink,
    work_dir: &Path,
    file_tags: &[String],
) -> Result<Vec<StoredOutput>, RunError> {
    let records = catalog.output_files().await?;
    let mut stored = Vec::with_capacity(records.len());

    for record in &records {
        let output = sink.store(work_dir, record, file_tags).await?;
        if let StoredOutput::Remote(file_id) = output {
            catalog.record_file_id(record, file_id).await?;
        }
        stored.push(output);
    }

    tracing::info!(count = stored.len(), "Output files collected");
    Ok(stored)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use assert_matches::assert_matches;
    use lgr_core::error::CoreError;
    use lgr_core::manifest::PRODUCT_TAG;
    use lgr_core::output::manifest_path;

    use super::*;

    #[derive(Default)]
    struct Catalog {
        records: Vec<OutputFileRecord>,
        ids: Mutex<Vec<(String, i64)>>,
    }

    #[async_trait]
    impl OutputCatalog for Catalog {
        async fn output_files(&self) -> Result<Vec<OutputFileRecord>, RunError> {
            Ok(self.records.clone())
        }

        async fn record_file_id(&self, record: &OutputFileRecord, file_id: i64) -> Result<(), RunError> {
            self.ids
                .lock()
                .expect("lock")
                .push((record.name.clone(), file_id));
            Ok(())
        }
    }

    /// Pretends to upload by assigning sequential ids.
    struct CountingUpload;

    #[async_trait]
    impl FileSink for CountingUpload {
        async fn store(
            &self,
            _work_dir: &Path,
            record: &OutputFileRecord,
            _file_tags: &[String],
        ) -> Result<StoredOutput, RunError> {
            Ok(StoredOutput::Remote(record.value.len() as i64))
        }
    }

    fn record(name: &str, value: &str) -> OutputFileRecord {
        OutputFileRecord {
            name: name.into(),
            value: value.into(),
        }
    }

    #[tokio::test]
    async fn local_sink_moves_every_file() {
        let work = tempfile::tempdir().expect("work");
        let out = tempfile::tempdir().expect("out");
        for name in ["a.csv", "b.png"] {
            std::fs::write(work.path().join(name), name).expect("write");
        }
        let catalog = Catalog {
            records: vec![record("table", "a.csv"), record("plot", "b.png")],
            ..Default::default()
        };

        let stored = collect_outputs(
            &catalog,
            &LocalFileSink::new(out.path()),
            work.path(),
            &["t".into()],
        )
        .await
        .expect("collect");

        assert_eq!(
            stored,
            vec![
                StoredOutput::Local(out.path().join("a.csv")),
                StoredOutput::Local(out.path().join("b.png")),
            ]
        );
        let manifest: FileManifest = serde_json::from_slice(
            &std::fs::read(manifest_path(&out.path().join("b.png"))).expect("manifest"),
        )
        .expect("parse");
        assert_eq!(manifest.tags, vec!["t", "plot", PRODUCT_TAG]);
        assert!(catalog.ids.lock().expect("lock").is_empty());
    }

    #[tokio::test]
    async fn remote_ids_are_written_back() {
        let catalog = Catalog {
            records: vec![record("a", "x.csv"), record("b", "yy.csv")],
            ..Default::default()
        };
        collect_outputs(&catalog, &CountingUpload, Path::new("/unused"), &[])
            .await
            .expect("collect");
        assert_eq!(
            *catalog.ids.lock().expect("lock"),
            vec![("a".to_string(), 5), ("b".to_string(), 6)]
        );
    }

    #[tokio::test]
    async fn first_failure_stops_collection() {
        let work = tempfile::tempdir().expect("work");
        let out = tempfile::tempdir().expect("out");
        std::fs::write(work.path().join("first.csv"), "1").expect("write");
        let catalog = Catalog {
            records: vec![
                record("first", "first.csv"),
                record("missing", "missing.csv"),
                record("never", "never.csv"),
            ],
            ..Default::default()
        };

        let result =
            collect_outputs(&catalog, &LocalFileSink::new(out.path()), work.path(), &[]).await;

        assert_matches!(result, Err(RunError::Core(CoreError::Io(_))));
        assert!(out.path().join("first.csv").exists());
    }
}
