use lgr_core::error::CoreError;
use lgr_core::scripting::executor::ScriptError;
use lgr_events::EventError;
use lgr_provisioning::ProvisioningError;
use lgr_storage::StorageApiError;

/// Any failure that ends a run.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// A domain-level error from `lgr_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Provisioning(#[from] ProvisioningError),

    /// A warehouse error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Storage(#[from] StorageApiError),

    /// The event sink could not be constructed.
    #[error("Event sink error: {0}")]
    Events(#[from] EventError),
}

impl From<ScriptError> for RunError {
    fn from(err: ScriptError) -> Self {
        Self::Core(err.into())
    }
}

/// Coarse classification used for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad job configuration; the message is shown to the job's author.
    Input,
    /// The script failed; the message is shown to the job's author.
    Execution,
    /// Anything else; reported as a generic application error.
    Internal,
}

impl RunError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RunError::Core(CoreError::Input(_)) => ErrorKind::Input,
            RunError::Core(CoreError::Execution(_)) => ErrorKind::Execution,
            RunError::Provisioning(ProvisioningError::MissingCredentials) => ErrorKind::Input,
            _ => ErrorKind::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        assert_eq!(
            RunError::from(CoreError::Input("Script content is empty.".into())).kind(),
            ErrorKind::Input
        );
        assert_eq!(
            RunError::from(CoreError::Execution("boom".into())).kind(),
            ErrorKind::Execution
        );
        assert_eq!(
            RunError::from(ProvisioningError::MissingCredentials).kind(),
            ErrorKind::Input
        );
        assert_eq!(
            RunError::from(sqlx::Error::PoolTimedOut).kind(),
            ErrorKind::Internal
        );
        assert_eq!(
            RunError::from(ScriptError::NotFound("Rscript".into())).kind(),
            ErrorKind::Internal
        );
    }

    #[test]
    fn user_facing_messages_are_verbatim() {
        let err = RunError::from(ProvisioningError::MissingCredentials);
        assert_eq!(err.to_string(), "I cannot get credentials for Redshift database.");
    }
}
