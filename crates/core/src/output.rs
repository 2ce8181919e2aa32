//! Local output directory handling.
//!
//! Produced files are moved from the working directory into
//! `<data>/out/files/` and a JSON manifest is written beside each one.

use std::path::{Path, PathBuf};

use crate::error::CoreError;
use crate::manifest::{FileManifest, OutputFileRecord, MANIFEST_EXTENSION};

/// Output directory for files, relative to the data directory.
pub fn files_dir(data_dir: &Path) -> PathBuf {
    data_dir.join("out").join("files")
}

/// Move `from` to `to`.
///
/// Falls back to copy-and-delete when a plain rename fails, which is what
/// happens when the working directory lives on another filesystem. If the
/// copy fails too, its error is returned and no partial `to` is left.
pub async fn move_file(from: &Path, to: &Path) -> Result<(), CoreError> {
    if let Some(parent) = to.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    match tokio::fs::rename(from, to).await {
        Ok(()) => Ok(()),
        Err(rename_err) => {
            tracing::debug!(error = %rename_err, from = %from.display(), "Rename failed, copying");
            if let Err(copy_err) = tokio::fs::copy(from, to).await {
                // Drop whatever part of `to` the copy managed to write.
                let _ = tokio::fs::remove_file(to).await;
                return Err(CoreError::Io(copy_err));
            }
            tokio::fs::remove_file(from).await?;
            Ok(())
        }
    }
}

/// Path of the manifest that accompanies `file`.
pub fn manifest_path(file: &Path) -> PathBuf {
    let mut name = file.as_os_str().to_owned();
    name.push(".");
    name.push(MANIFEST_EXTENSION);
    PathBuf::from(name)
}

/// Write `manifest` as pretty JSON next to `file`.
pub async fn write_manifest(file: &Path, manifest: &FileManifest) -> Result<PathBuf, CoreError> {
    let path = manifest_path(file);
    let body = serde_json::to_vec_pretty(manifest)
        .map_err(|e| CoreError::Internal(format!("Cannot encode manifest: {e}")))?;
    tokio::fs::write(&path, body).await?;
    Ok(path)
}

/// Move one produced file into `out_dir` and write its manifest.
///
/// Returns the destination path of the file.
pub async fn store_locally(
    work_dir: &Path,
    out_dir: &Path,
    record: &OutputFileRecord,
    file_tags: &[String],
) -> Result<PathBuf, CoreError> {
    let file_name = safe_file_name(&record.value)?;
    let dest = out_dir.join(file_name);
    move_file(&work_dir.join(file_name), &dest).await?;
    write_manifest(&dest, &FileManifest::for_record(record, file_tags)).await?;
    Ok(dest)
}

/// Reject file names that would escape the working or output directory.
pub fn safe_file_name(value: &str) -> Result<&str, CoreError> {
    let path = Path::new(value);
    let mut components = path.components();
    match (components.next(), components.next()) {
        (Some(std::path::Component::Normal(_)), None) => Ok(value),
        _ => Err(CoreError::Input(format!(
            "Output file name '{value}' must be a plain file name."
        ))),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
