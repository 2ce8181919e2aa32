//! Interpreter command construction.
//!
//! Builds the argument vector for `Rscript`. Every argument is handed to the
//! child process as its own token; nothing passes through a shell, so paths,
//! credentials and the JSON parameter blob need no escaping.

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::credentials::Credentials;

/// Interpreter flag that disables loading and saving of session state.
pub const VANILLA_FLAG: &str = "--vanilla";

/// Wrapper that adapts a job script to the runner's invocation contract.
pub const JOB_WRAPPER: &str = "wrapper.R";

/// Wrapper that prints a script's declared parameters as `key => value` lines.
pub const PARAMS_WRAPPER: &str = "wrapperParams.R";

/// Locations of the interpreter and its fixed collaborators.
#[derive(Debug, Clone)]
pub struct Interpreter {
    /// The `Rscript` executable.
    pub executable: PathBuf,
    /// Directory holding the wrapper scripts and catalogue scripts.
    pub script_dir: PathBuf,
    /// JDBC driver artifact passed to the job wrapper.
    pub db_driver: PathBuf,
}

impl Interpreter {
    pub fn job_wrapper(&self) -> PathBuf {
        self.script_dir.join(JOB_WRAPPER)
    }

    pub fn params_wrapper(&self) -> PathBuf {
        self.script_dir.join(PARAMS_WRAPPER)
    }
}

/// Per-job inputs that vary between runs.
#[derive(Debug, Clone, Copy)]
pub struct JobInvocation<'a> {
    pub script: &'a Path,
    pub work_dir: &'a Path,
    pub source_table: &'a str,
    pub parameters: &'a Value,
    pub debug: bool,
}

/// A fully assembled interpreter invocation.
#[derive(Clone)]
pub struct CommandSpec {
    program: PathBuf,
    args: Vec<String>,
    secret: Option<String>,
}

impl CommandSpec {
    /// Build the job command in the wrapper's fixed argument order.
    pub fn for_job(
        interpreter: &Interpreter,
        credentials: &Credentials,
        job: JobInvocation<'_>,
    ) -> Self {
        let args = vec![
            VANILLA_FLAG.to_string(),
            path_arg(&interpreter.job_wrapper()),
            path_arg(job.script),
            path_arg(&interpreter.db_driver),
            credentials.jdbc_url(),
            credentials.user.clone(),
            credentials.password.clone(),
            credentials.schema.clone(),
            path_arg(job.work_dir),
            job.source_table.to_string(),
            job.parameters.to_string(),
            if job.debug { "1" } else { "0" }.to_string(),
        ];

        Self {
            program: interpreter.executable.clone(),
            args,
            secret: Some(credentials.password.clone()).filter(|p| !p.is_empty()),
        }
    }

    /// Build the parameter-discovery command for `script`.
    pub fn for_parameter_discovery(interpreter: &Interpreter, script: &Path) -> Self {
        Self {
            program: interpreter.executable.clone(),
            args: vec![
                VANILLA_FLAG.to_string(),
                path_arg(&interpreter.params_wrapper()),
                path_arg(script),
            ],
            secret: None,
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// A `tokio` command ready to be spawned.
    pub fn to_command(&self) -> tokio::process::Command {
        let mut cmd = tokio::process::Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }

    /// Human-readable command line with the password masked.
    ///
    /// Only for diagnostics; the child process never sees this string.
    pub fn masked_line(&self) -> String {
        let line = std::iter::once(path_arg(&self.program))
            .chain(self.args.iter().cloned())
            .map(|arg| quote_for_display(&arg))
            .collect::<Vec<_>>()
            .join(" ");
        match &self.secret {
            Some(secret) => line.replace(secret.as_str(), crate::credentials::PASSWORD_MASK),
            None => line,
        }
    }
}

impl std::fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.masked_line())
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn quote_for_display(arg: &str) -> String {
    if !arg.is_empty() && !arg.contains(|c: char| c.is_whitespace() || c == '\'' || c == '"') {
        return arg.to_string();
    }
    format!("'{}'", arg.replace('\'', r"'\''"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
