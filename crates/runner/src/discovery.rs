//! Parameter discovery for catalogue scripts.
//!
//! Each catalogue script declares its parameters by printing `name => value`
//! lines when run through `wrapperParams.R`.

use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use lgr_core::command::{CommandSpec, Interpreter};
use lgr_core::error::CoreError;
use lgr_core::scripting::params::{parse_parameter_lines, ParameterSchema};
use lgr_core::scripting::subprocess::run_command;
use serde::Serialize;

use crate::error::RunError;

/// Scripts in the script directory that are plumbing, not catalogue entries.
pub const EXCLUDED_SCRIPTS: [&str; 4] = ["wrapper", "redshift", "RStudioRunner", "wrapperParams"];

const SCRIPT_EXTENSION: &str = "R";

/// One catalogue entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScriptEntry {
    pub name: String,
    pub parameters: ParameterSchema,
}

/// Run the parameter wrapper for the catalogue script `name`.
///
/// stdout and stderr are both parsed. The streams are captured on separate
/// pipes, so every stderr line comes after every stdout line regardless of
/// the order the interpreter wrote them in. A non-zero exit is an execution
/// error whose message is every output line joined with a space.
pub async fn discover_parameters(
    interpreter: &Interpreter,
    name: &str,
) -> Result<ParameterSchema, RunError> {
    let script = script_path(interpreter, name).await?;
    tracing::info!(script = %script.display(), "Attempting to run script");

    let command = CommandSpec::for_parameter_discovery(interpreter, &script);
    tracing::debug!(command = %command.masked_line(), "Executing command line");
    let output = run_command(&command).await?;
    tracing::debug!(exit_code = output.exit_code, "Execution done");

    let lines: Vec<&str> = output.stdout.lines().chain(output.stderr.lines()).collect();
    if !output.succeeded() {
        let message = lines.join(" ");
        tracing::error!("The command failed with message: {message}");
        return Err(CoreError::Execution(message).into());
    }

    tracing::info!("RScript successful: {}", lines.join(" "));
    Ok(parse_parameter_lines(lines))
}

/// Every catalogue script in the script directory with its parameters,
/// keyed and sorted by name.
pub async fn list_scripts(
    interpreter: &Interpreter,
) -> Result<BTreeMap<String, ScriptEntry>, RunError> {
    let mut names = Vec::new();
    let mut entries = tokio::fs::read_dir(&interpreter.script_dir)
        .await
        .map_err(CoreError::from)?;
    while let Some(entry) = entries.next_entry().await.map_err(CoreError::from)? {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some(SCRIPT_EXTENSION) {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        if !EXCLUDED_SCRIPTS.contains(&stem) {
            names.push(stem.to_string());
        }
    }
    names.sort();

    let mut catalogue = BTreeMap::new();
    for name in names {
        let parameters = discover_parameters(interpreter, &name).await?;
        catalogue.insert(name.clone(), ScriptEntry { name, parameters });
    }
    Ok(catalogue)
}

/// Resolve `name` to `<script dir>/<name>.R`, which must exist.
async fn script_path(interpreter: &Interpreter, name: &str) -> Result<PathBuf, RunError> {
    let path = interpreter
        .script_dir
        .join(format!("{name}.{SCRIPT_EXTENSION}"));
    let plain_name = !name.is_empty() && Path::new(name).file_name() == Some(OsStr::new(name));
    let exists = tokio::fs::metadata(&path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false);
    if !plain_name || !exists {
        return Err(CoreError::Input(format!(
            "I cannot find R script {}, verify that 'script' is an existing R script.",
            path.display()
        ))
        .into());
    }
    Ok(path)
}
