//! Working directory and script materializer.
//!
//! Each job gets its own `run-<uuid>` working directory. The job's script
//! body is written there as `script.R` before the interpreter is invoked.

use std::path::{Path, PathBuf};

use crate::error::CoreError;
use crate::job::ScriptBody;

/// File name of the materialized job script.
pub const SCRIPT_FILE: &str = "script.R";

/// Log file the interpreter may leave in the working directory in debug mode.
pub const DEBUG_ARTIFACT: &str = "debug.log";

/// A per-job scratch directory owned by a single run.
#[derive(Debug)]
pub struct WorkDir {
    path: PathBuf,
}

impl WorkDir {
    /// Create a fresh `run-<uuid>` directory below `root`.
    pub async fn create(root: &Path) -> Result<Self, CoreError> {
        let path = root.join(format!("run-{}", uuid::Uuid::new_v4()));
        tokio::fs::create_dir_all(&path).await?;
        tracing::debug!(path = %path.display(), "Working directory created");
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the debug artifact inside this directory.
    pub fn debug_artifact(&self) -> PathBuf {
        self.path.join(DEBUG_ARTIFACT)
    }

    /// Delete the directory and everything left in it.
    pub async fn remove(self) -> Result<(), CoreError> {
        tokio::fs::remove_dir_all(&self.path).await?;
        Ok(())
    }
}

/// Write the script body to `script.R` in `dir` and return its path.
///
/// The file is written, never interpreted, so no escaping is applied.
pub async fn materialize(dir: &Path, body: &ScriptBody) -> Result<PathBuf, CoreError> {
    let path = dir.join(SCRIPT_FILE);
    tokio::fs::write(&path, body.render()).await?;
    tracing::debug!(path = %path.display(), "Script materialized");
    Ok(path)
}
