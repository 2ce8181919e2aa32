//! Shared execution types.
//!
//! [`ScriptOutput`] is the captured result of one interpreter invocation and
//! [`ScriptError`] covers the ways an invocation can fail to produce one.

use std::fmt;

use crate::error::CoreError;

/// Captured output from an interpreter invocation.
#[derive(Debug, Clone)]
pub struct ScriptOutput {
    /// Complete stdout captured from the process.
    pub stdout: String,
    /// Complete stderr captured from the process.
    pub stderr: String,
    /// Process exit code (`-1` if killed by signal).
    pub exit_code: i32,
    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

impl ScriptOutput {
    pub fn succeeded(&self) -> bool {
        self.exit_code == 0
    }
}

/// Errors that prevent an invocation from producing a [`ScriptOutput`].
#[derive(Debug)]
pub enum ScriptError {
    /// The interpreter executable could not be found.
    NotFound(String),
    /// The interpreter exists but could not be executed.
    PermissionDenied(String),
    /// Any other I/O failure while spawning or waiting for the process.
    IoError(std::io::Error),
}

impl ScriptError {
    /// Classify a spawn failure for `program`.
    pub fn from_spawn(program: &str, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(program.to_string()),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(program.to_string()),
            _ => Self::IoError(err),
        }
    }
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(path) => write!(f, "Interpreter not found: {path}"),
            Self::PermissionDenied(path) => write!(f, "Permission denied: {path}"),
            Self::IoError(err) => write!(f, "I/O error: {err}"),
        }
    }
}

impl std::error::Error for ScriptError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::IoError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ScriptError> for CoreError {
    fn from(err: ScriptError) -> Self {
        match err {
            ScriptError::IoError(e) => CoreError::Io(e),
            // A missing interpreter is a deployment problem, not the job's.
            other => CoreError::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_not_found() {
        let err = ScriptError::NotFound("/usr/bin/Rscript".to_string());
        assert_eq!(err.to_string(), "Interpreter not found: /usr/bin/Rscript");
    }

    #[test]
    fn spawn_errors_are_classified() {
        let nf = ScriptError::from_spawn("R", std::io::Error::from(std::io::ErrorKind::NotFound));
        assert!(matches!(nf, ScriptError::NotFound(p) if p == "R"));
        let pd = ScriptError::from_spawn(
            "R",
            std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        );
        assert!(matches!(pd, ScriptError::PermissionDenied(_)));
        let other = ScriptError::from_spawn("R", std::io::Error::other("boom"));
        assert!(std::error::Error::source(&other).is_some());
    }

    #[test]
    fn converts_to_internal_core_error() {
        let err: CoreError = ScriptError::NotFound("R".into()).into();
        assert!(matches!(err, CoreError::Internal(msg) if msg == "Interpreter not found: R"));
    }
}
