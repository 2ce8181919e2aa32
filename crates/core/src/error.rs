/// Domain errors raised while preparing and running a job.
///
/// `Input` and `Execution` carry messages meant for the person who
/// configured the job; the other variants are application failures.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Missing or malformed job configuration.
    #[error("{0}")]
    Input(String),

    /// The external interpreter failed; the message is the composed report.
    #[error("{0}")]
    Execution(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}
