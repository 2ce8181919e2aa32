//! Remote file storage client.
//!
//! Wraps the Storage API file upload endpoint using [`reqwest`]. Used by the
//! upload flow, where produced files go to remote storage instead of the
//! local output directory.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

/// HTTP request timeout for one upload.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(600);

/// Errors from the storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageApiError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The Storage API returned a non-2xx status code.
    #[error("Storage API error ({status}): {body}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The local file could not be read.
    #[error("Cannot read {path}: {source}")]
    File {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Upload flags and tags for one file.
#[derive(Debug, Clone, Default)]
pub struct FileUploadOptions {
    pub is_public: bool,
    pub is_permanent: bool,
    pub is_sliced: bool,
    pub notify: bool,
    pub tags: Vec<String>,
}

/// Storage API response describing an uploaded file.
#[derive(Debug, Clone, Deserialize)]
pub struct StoredFile {
    /// Storage-assigned file id.
    pub id: i64,
}

/// HTTP client for the Storage API.
pub struct StorageApiClient {
    client: reqwest::Client,
    api_url: String,
    token: String,
    run_id: String,
}

impl StorageApiClient {
    /// Create a client.
    ///
    /// * `api_url` - Base URL, e.g. `https://connection.keboola.com`.
    pub fn new(
        api_url: impl Into<String>,
        token: impl Into<String>,
        run_id: impl Into<String>,
    ) -> Result<Self, StorageApiError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            run_id: run_id.into(),
        })
    }

    /// Upload the file at `path` and return its storage id.
    pub async fn upload_file(
        &self,
        path: &Path,
        options: &FileUploadOptions,
    ) -> Result<StoredFile, StorageApiError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|source| StorageApiError::File {
                path: path.display().to_string(),
                source,
            })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut form = reqwest::multipart::Form::new()
            .text("isPublic", flag(options.is_public))
            .text("isPermanent", flag(options.is_permanent))
            .text("isSliced", flag(options.is_sliced))
            .text("notify", flag(options.notify))
            .text("name", file_name.clone());
        for tag in &options.tags {
            form = form.text("tags[]", tag.clone());
        }
        form = form.part(
            "file",
            reqwest::multipart::Part::bytes(bytes).file_name(file_name.clone()),
        );

        tracing::debug!(file = %file_name, tags = ?options.tags, "Uploading file");

        let response = self
            .client
            .post(format!("{}/v2/storage/files", self.api_url))
            .header("X-StorageApi-Token", &self.token)
            .header("X-KBC-RunId", &self.run_id)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(StorageApiError::ApiError {
                status: status.as_u16(),
                body,
            });
        }

        let stored = response.json::<StoredFile>().await?;
        tracing::info!(file = %file_name, id = stored.id, "File uploaded");
        Ok(stored)
    }
}

fn flag(value: bool) -> &'static str {
    if value {
        "1"
    } else {
        "0"
    }
}
