//! Job descriptor loading and validation.
//!
//! The descriptor is `config.json` in the job's data directory. It is parsed
//! into a loose [`JobDescriptor`] and then validated into a [`JobConfig`].
//! All validation happens here, before any credential lookup or subprocess
//! invocation takes place.

use std::fmt;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::error::CoreError;

/// File name of the job descriptor inside the data directory.
pub const DESCRIPTOR_FILE: &str = "config.json";

// ---------------------------------------------------------------------------
// Descriptor (raw)
// ---------------------------------------------------------------------------

/// Script body as given in the descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ScriptBody {
    /// One entry per script line.
    Lines(Vec<String>),
    /// The whole script as a single string.
    Text(String),
}

impl ScriptBody {
    /// Render the body into the text written to disk.
    ///
    /// Lines are each terminated by `\n`; a single string is trimmed.
    pub fn render(&self) -> String {
        match self {
            Self::Lines(lines) => lines.iter().map(|line| format!("{line}\n")).collect(),
            Self::Text(text) => text.trim().to_string(),
        }
    }
}

/// The `parameters` section of the descriptor.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DescriptorParameters {
    #[serde(default)]
    pub script: Option<ScriptBody>,
    #[serde(default, rename = "sourceTable")]
    pub source_table: Option<String>,
    #[serde(default, rename = "scriptParameters", alias = "scriptParams")]
    pub script_parameters: Option<Value>,
    #[serde(default)]
    pub debug: Option<Value>,
}

/// Raw job descriptor exactly as deserialized from `config.json`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobDescriptor {
    #[serde(default)]
    pub parameters: DescriptorParameters,
    #[serde(default, rename = "fileTags")]
    pub file_tags: Option<Value>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default, rename = "runId")]
    pub run_id: Option<String>,
}

impl JobDescriptor {
    /// Parse a descriptor from its JSON text.
    pub fn parse(text: &str) -> Result<Self, CoreError> {
        serde_json::from_str(text)
            .map_err(|e| CoreError::Input(format!("{DESCRIPTOR_FILE} is not valid: {e}")))
    }
}

/// Values the descriptor may omit and the deployment supplies instead.
#[derive(Debug, Clone, Default)]
pub struct JobEnvironment {
    /// Auth token from the environment (`KBC_TOKENID`).
    pub token: Option<String>,
    /// Run identifier from the environment (`KBC_RUNID`).
    pub run_id: Option<String>,
    /// Debug mode used when the descriptor does not set one.
    pub debug_default: bool,
}

// ---------------------------------------------------------------------------
// JobConfig (validated)
// ---------------------------------------------------------------------------

/// A validated job configuration. Read-only once built.
#[derive(Clone)]
pub struct JobConfig {
    pub script: ScriptBody,
    pub source_table: String,
    pub script_parameters: Value,
    pub file_tags: Vec<String>,
    pub debug: bool,
    pub token: String,
    pub run_id: String,
}

impl fmt::Debug for JobConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobConfig")
            .field("script", &self.script)
            .field("source_table", &self.source_table)
            .field("script_parameters", &self.script_parameters)
            .field("file_tags", &self.file_tags)
            .field("debug", &self.debug)
            .field("token", &"*****")
            .field("run_id", &self.run_id)
            .finish()
    }
}

impl JobConfig {
    /// Read and validate `config.json` from `data_dir`.
    pub async fn load(data_dir: &Path, env: &JobEnvironment) -> Result<Self, CoreError> {
        let is_dir = tokio::fs::metadata(data_dir)
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false);
        if !is_dir {
            return Err(CoreError::Input(
                "Data directory does not exist or is not directory.".into(),
            ));
        }

        let path = data_dir.join(DESCRIPTOR_FILE);
        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CoreError::Input(format!(
                    "{DESCRIPTOR_FILE} is not present in data directory."
                )));
            }
            Err(e) => return Err(CoreError::Io(e)),
        };

        Self::from_descriptor(JobDescriptor::parse(&text)?, env)
    }

    /// Validate a parsed descriptor, filling gaps from `env`.
    pub fn from_descriptor(desc: JobDescriptor, env: &JobEnvironment) -> Result<Self, CoreError> {
        let params = desc.parameters;

        let debug_mode = match params.debug {
            Some(value) => is_truthy(&value),
            None => env.debug_default,
        };

        let file_tags = match desc.file_tags {
            Some(Value::Array(tags)) => tags
                .into_iter()
                .map(|tag| match tag {
                    Value::String(s) => s,
                    other => other.to_string(),
                })
                .collect(),
            _ => Vec::new(),
        };

        let source_table = non_empty(params.source_table).ok_or_else(|| {
            CoreError::Input("Source table must be provided in configuration.".into())
        })?;

        let script_parameters = match params.script_parameters {
            None | Some(Value::Null) => Value::Object(Default::default()),
            Some(value) => value,
        };

        let script = params
            .script
            .filter(|body| !body.render().is_empty())
            .ok_or_else(|| CoreError::Input("Script content is empty.".into()))?;

        let token = non_empty(desc.token)
            .or_else(|| non_empty(env.token.clone()))
            .ok_or_else(|| {
                CoreError::Input(
                    "Storage API token must be provided in configuration or in \
                     environment variable KBC_TOKENID."
                        .into(),
                )
            })?;

        let run_id = non_empty(desc.run_id)
            .or_else(|| non_empty(env.run_id.clone()))
            .unwrap_or_default();

        tracing::debug!(debug_mode, "Debug mode set");
        tracing::debug!(?file_tags, "Output file tags set");
        tracing::debug!(source_table = %source_table, "Source table set");
        tracing::debug!(%script_parameters, "Script parameters set");
        tracing::debug!(run_id = %run_id, "Run ID set");

        Ok(Self {
            script,
            source_table,
            script_parameters,
            file_tags,
            debug: debug_mode,
            token,
            run_id,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// Loose boolean coercion for the descriptor's `debug` flag.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !(s.is_empty() || s == "0" || s.eq_ignore_ascii_case("false")),
        Value::Null => false,
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
