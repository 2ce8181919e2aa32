//! Output file records and their manifests.

use serde::{Deserialize, Serialize};

/// Tag added to every file this runner produces.
pub const PRODUCT_TAG: &str = "LuckyGuess";

/// Extension of the sidecar manifest written next to each output file.
pub const MANIFEST_EXTENSION: &str = "manifest";

/// One produced file as reported by the script's file table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputFileRecord {
    /// Logical name (tag) the script gave the file.
    pub name: String,
    /// File name inside the working directory.
    pub value: String,
}

/// Sidecar metadata describing how downstream storage should classify a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileManifest {
    pub name: String,
    pub is_public: bool,
    pub is_permanent: bool,
    pub notify: bool,
    pub tags: Vec<String>,
}

impl FileManifest {
    /// Manifest for `record` under the fixed policy: private, permanent,
    /// no notification.
    pub fn for_record(record: &OutputFileRecord, file_tags: &[String]) -> Self {
        Self {
            name: record.value.clone(),
            is_public: false,
            is_permanent: true,
            notify: false,
            tags: merge_tags(file_tags, &record.name),
        }
    }
}

/// Configured tags (trimmed, in order), then the logical name, then
/// [`PRODUCT_TAG`].
pub fn merge_tags(file_tags: &[String], logical_name: &str) -> Vec<String> {
    file_tags
        .iter()
        .map(|tag| tag.trim().to_string())
        .chain([logical_name.to_string(), PRODUCT_TAG.to_string()])
        .collect()
}
