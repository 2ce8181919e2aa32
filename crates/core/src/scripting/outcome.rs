//! Classification of a finished job run.
//!
//! A run ends in exactly one terminal state:
//!
//! | Exit | Debug | `debug.log` | State |
//! |------|-------|-------------|-------|
//! | 0    | any   | any         | [`RunOutcome::Success`] |
//! | != 0 | on    | present     | [`RunOutcome::DebugFailure`] |
//! | != 0 | on    | absent      | [`RunOutcome::PlainFailure`] |
//! | != 0 | off   | any         | [`RunOutcome::PlainFailure`] with the JRE hint check |
//!
//! No state is retried and no failure is partial. Every failure report has
//! the warehouse password masked before it is logged or returned.

use std::path::Path;

use super::executor::ScriptOutput;
use crate::credentials::Credentials;
use crate::error::CoreError;

/// Prefix added when the failure looks like a broken Java installation.
pub const JAVA_HOME_HINT: &str =
    "Cannot load Java JRE, verify that JAVA_HOME path is correct. Stack: ";

/// Marker placed between stdout and stderr in a failure report.
pub const STDERR_MARKER: &str = "Additional error: ";

/// Terminal state of a job run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The interpreter exited with 0; carries the intermediate identifiers.
    Success(Vec<String>),
    /// Debug run failed and left a debug artifact; carries its content.
    DebugFailure(String),
    /// Any other failure; carries the composed report.
    PlainFailure(String),
}

impl RunOutcome {
    /// Collapse into the job result: identifiers or a user-facing error.
    pub fn into_result(self) -> Result<Vec<String>, CoreError> {
        match self {
            Self::Success(ids) => Ok(ids),
            Self::DebugFailure(report) | Self::PlainFailure(report) => {
                Err(CoreError::Execution(report))
            }
        }
    }
}

/// Classify a finished run.
///
/// `debug_artifact` is only consulted for failed debug runs. It is decoded
/// lossily, so interpreter output in a legacy encoding still yields a report.
pub async fn classify(
    output: &ScriptOutput,
    debug: bool,
    debug_artifact: &Path,
    credentials: &Credentials,
) -> Result<RunOutcome, CoreError> {
    if output.succeeded() {
        let ids = parse_intermediate_ids(&output.stdout);
        tracing::info!(intermediate = %output.stdout.trim(), "R-script successful");
        return Ok(RunOutcome::Success(ids));
    }

    if debug {
        match tokio::fs::read(debug_artifact).await {
            Ok(bytes) => {
                let content = credentials.mask(&String::from_utf8_lossy(&bytes));
                tracing::error!("The command failed with the following errors:");
                for line in content.lines() {
                    tracing::error!("{line}");
                }
                return Ok(RunOutcome::DebugFailure(content));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(CoreError::Io(e)),
        }

        let report = credentials.mask(&compose_report(output));
        tracing::error!("The command failed with the following errors:");
        for line in report.split('\n') {
            tracing::error!("{line}");
        }
        return Ok(RunOutcome::PlainFailure(report));
    }

    let report = credentials.mask(&compose_report(output));
    tracing::error!("The command failed with message {report}");
    if looks_like_missing_jre(&report) {
        return Ok(RunOutcome::PlainFailure(format!("{JAVA_HOME_HINT}{report}")));
    }
    Ok(RunOutcome::PlainFailure(report))
}

/// Split the success payload on commas, trimming each identifier.
pub fn parse_intermediate_ids(stdout: &str) -> Vec<String> {
    stdout
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}

/// Stdout, followed by stderr behind [`STDERR_MARKER`] when there is any.
fn compose_report(output: &ScriptOutput) -> String {
    if output.stderr.is_empty() {
        output.stdout.clone()
    } else {
        format!("{}{STDERR_MARKER}{}", output.stdout, output.stderr)
    }
}

fn looks_like_missing_jre(report: &str) -> bool {
    let lower = report.to_lowercase();
    lower.contains("unable to load shared object") && lower.contains("rjava")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use assert_matches::assert_matches;

    use super::*;

    fn output(exit_code: i32, stdout: &str, stderr: &str) -> ScriptOutput {
        ScriptOutput {
            stdout: stdout.into(),
            stderr: stderr.into(),
            exit_code,
            duration_ms: 1,
        }
    }

    fn no_artifact() -> PathBuf {
        PathBuf::from("/nonexistent/run/debug.log")
    }

    fn creds() -> Credentials {
        Credentials {
            hostname: "wh.example.com".into(),
            port: crate::credentials::REDSHIFT_DB_PORT,
            db: "sapi_1".into(),
            schema: "tapi_1".into(),
            user: "u1".into(),
            password: "hunter2".into(),
        }
    }

    #[tokio::test]
    async fn success_returns_trimmed_ids() {
        let outcome = classify(&output(0, "tbl1, tbl2", ""), false, &no_artifact(), &creds())
            .await
            .expect("classify");
        assert_eq!(outcome, RunOutcome::Success(vec!["tbl1".into(), "tbl2".into()]));
    }

    #[tokio::test]
    async fn success_ignores_stderr_and_debug() {
        let outcome = classify(&output(0, " a ,b\n", "warning"), true, &no_artifact(), &creds())
            .await
            .expect("classify");
        assert_eq!(outcome.into_result().expect("ok"), vec!["a", "b"]);
    }

    #[test]
    fn empty_stdout_yields_no_ids() {
        assert!(parse_intermediate_ids("").is_empty());
        assert!(parse_intermediate_ids(" \n").is_empty());
    }

    #[tokio::test]
    async fn debug_failure_reports_artifact_content_exactly() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let artifact = dir.path().join("debug.log");
        std::fs::write(&artifact, "line one\nline two\n").expect("write artifact");

        let outcome = classify(&output(1, "stdout text", "stderr text"), true, &artifact, &creds())
            .await
            .expect("classify");
        assert_eq!(outcome, RunOutcome::DebugFailure("line one\nline two\n".into()));
        assert_matches!(
            outcome.into_result(),
            Err(CoreError::Execution(msg)) if msg == "line one\nline two\n"
        );
    }

    #[tokio::test]
    async fn debug_failure_without_artifact_composes_output() {
        let outcome = classify(&output(1, "out", "err"), true, &no_artifact(), &creds())
            .await
            .expect("classify");
        assert_eq!(outcome, RunOutcome::PlainFailure("outAdditional error: err".into()));
    }

    #[tokio::test]
    async fn debug_failure_never_adds_jre_hint() {
        let outcome = classify(
            &output(1, "", "unable to load shared object rJava.so"),
            true,
            &no_artifact(),
            &creds(),
        )
        .await
        .expect("classify");
        assert_matches!(outcome, RunOutcome::PlainFailure(msg) if !msg.starts_with(JAVA_HOME_HINT));
    }

    #[tokio::test]
    async fn plain_failure_without_stderr_is_stdout_only() {
        let outcome = classify(&output(2, "just stdout", ""), false, &no_artifact(), &creds())
            .await
            .expect("classify");
        assert_eq!(outcome, RunOutcome::PlainFailure("just stdout".into()));
    }

    #[tokio::test]
    async fn plain_failure_ignores_artifact() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let artifact = dir.path().join("debug.log");
        std::fs::write(&artifact, "should not be read").expect("write artifact");
        let outcome = classify(&output(1, "o", ""), false, &artifact, &creds())
            .await
            .expect("classify");
        assert_eq!(outcome, RunOutcome::PlainFailure("o".into()));
    }

    #[tokio::test]
    async fn missing_jre_gets_hint_prefix() {
        let stderr = "Error : .onLoad failed: Unable to load shared object '/usr/lib/R/RJAVA/libs/rJava.so'";
        let outcome = classify(&output(1, "", stderr), false, &no_artifact(), &creds())
            .await
            .expect("classify");
        let RunOutcome::PlainFailure(msg) = outcome else {
            panic!("expected plain failure");
        };
        assert!(msg.starts_with(JAVA_HOME_HINT));
        assert!(msg.ends_with(&format!("{STDERR_MARKER}{stderr}")));
    }

    #[tokio::test]
    async fn shared_object_error_without_rjava_has_no_hint() {
        let outcome = classify(
            &output(1, "", "unable to load shared object libfoo.so"),
            false,
            &no_artifact(),
            &creds(),
        )
        .await
        .expect("classify");
        assert_matches!(outcome, RunOutcome::PlainFailure(msg) if msg.starts_with(STDERR_MARKER));
    }

    #[tokio::test]
    async fn password_is_masked_in_failure_reports() {
        let stderr = "Error in dbConnect(drv, url, 'u1', 'hunter2') : FATAL";
        let outcome = classify(&output(1, "", stderr), false, &no_artifact(), &creds())
            .await
            .expect("classify");
        assert_eq!(
            outcome,
            RunOutcome::PlainFailure(format!(
                "{STDERR_MARKER}Error in dbConnect(drv, url, 'u1', '*****') : FATAL"
            ))
        );

        let dir = tempfile::tempdir().expect("create temp dir");
        let artifact = dir.path().join("debug.log");
        std::fs::write(&artifact, "connect as hunter2 failed\n").expect("write artifact");
        let outcome = classify(&output(1, "", ""), true, &artifact, &creds())
            .await
            .expect("classify");
        assert_eq!(outcome, RunOutcome::DebugFailure("connect as ***** failed\n".into()));
    }

    #[tokio::test]
    async fn non_utf8_artifact_is_decoded_lossily() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let artifact = dir.path().join("debug.log");
        // Latin-1 "Fehler: ungültig".
        std::fs::write(&artifact, b"Fehler: ung\xfcltig\n").expect("write artifact");

        let outcome = classify(&output(1, "", ""), true, &artifact, &creds())
            .await
            .expect("classify");
        assert_eq!(
            outcome,
            RunOutcome::DebugFailure("Fehler: ung\u{FFFD}ltig\n".into())
        );
    }
}
