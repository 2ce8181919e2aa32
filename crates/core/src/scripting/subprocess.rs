//! Subprocess management.
//!
//! Provides [`run_command`], which spawns a [`CommandSpec`] as a child
//! process, captures stdout and stderr separately and waits for it to exit.
//! There is no timeout: the interpreter may take arbitrarily long.

use std::process::Stdio;
use std::time::Instant;

use tokio::io::{AsyncRead, AsyncReadExt};

use super::executor::{ScriptError, ScriptOutput};
use crate::command::CommandSpec;

/// Maximum stdout or stderr size kept per stream (10 MiB).
///
/// Anything beyond this is still read, so the child never blocks on a
/// full pipe, but it is discarded and a warning is logged once.
const MAX_OUTPUT_BYTES: usize = 10 * 1024 * 1024;

/// Spawn `spec`, capture its output and wait for it to exit.
pub async fn run_command(spec: &CommandSpec) -> Result<ScriptOutput, ScriptError> {
    let mut cmd = spec.to_command();
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let start = Instant::now();

    let mut child = cmd
        .spawn()
        .map_err(|e| ScriptError::from_spawn(&spec.program().to_string_lossy(), e))?;

    // Drain both pipes concurrently so `child.wait()` can borrow `child`.
    let stdout_task = tokio::spawn(read_stream(child.stdout.take(), "stdout", MAX_OUTPUT_BYTES));
    let stderr_task = tokio::spawn(read_stream(child.stderr.take(), "stderr", MAX_OUTPUT_BYTES));

    let status = child.wait().await.map_err(ScriptError::IoError)?;

    let duration_ms = start.elapsed().as_millis() as u64;
    let stdout_bytes = stdout_task.await.unwrap_or_default();
    let stderr_bytes = stderr_task.await.unwrap_or_default();

    Ok(ScriptOutput {
        stdout: String::from_utf8_lossy(&stdout_bytes).into_owned(),
        stderr: String::from_utf8_lossy(&stderr_bytes).into_owned(),
        exit_code: status.code().unwrap_or(-1),
        duration_ms,
    })
}

/// Read a whole stream, keeping at most `limit` bytes.
async fn read_stream<R: AsyncRead + Unpin>(
    handle: Option<R>,
    stream: &'static str,
    limit: usize,
) -> Vec<u8> {
    let mut kept = Vec::new();
    let Some(mut h) = handle else {
        return kept;
    };
    let mut truncated = false;
    let mut chunk = [0u8; 8192];
    loop {
        match h.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                let room = limit.saturating_sub(kept.len());
                if n > room && !truncated {
                    truncated = true;
                    tracing::warn!(stream, limit, "Interpreter output truncated");
                }
                kept.extend_from_slice(&chunk[..n.min(room)]);
            }
        }
    }
    kept
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
