//! CLI-level errors (wraps infrastructure errors)

use thiserror::Error;

use crate::application::ApplicationError;
use crate::domain::DomainError;
use crate::infrastructure::InfraError;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Infra(#[from] InfraError),

    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("{0}")]
    Usage(String),
}

impl From<ApplicationError> for CliError {
    fn from(e: ApplicationError) -> Self {
        CliError::Infra(InfraError::Application(e))
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::InvalidArgs(_) | CliError::Usage(_) => crate::exitcode::USAGE,
            CliError::Infra(e) => match e {
                InfraError::Io { .. } => crate::exitcode::IOERR,
                InfraError::Serialize(_) => crate::exitcode::SOFTWARE,
                InfraError::Application(app) => match app {
                    ApplicationError::DataDirNotFound(_) => crate::exitcode::NOINPUT,
                    ApplicationError::CampaignNotFound(_) => crate::exitcode::NOINPUT,
                    ApplicationError::InvalidCampaignFile { .. } => crate::exitcode::DATAERR,
                    ApplicationError::Config { .. } => crate::exitcode::CONFIG,
                    ApplicationError::Domain(DomainError::InvalidLayout { .. }) => {
                        crate::exitcode::CONFIG
                    }
                    ApplicationError::Domain(DomainError::InvalidParticipant(_)) => {
                        crate::exitcode::DATAERR
                    }
                    ApplicationError::OperationFailed { .. } => crate::exitcode::IOERR,
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_missing_campaign_when_mapping_exit_code_then_noinput() {
        let err: CliError = ApplicationError::CampaignNotFound("c9".into()).into();
        assert_eq!(err.exit_code(), crate::exitcode::NOINPUT);
        assert_eq!(err.to_string(), "campaign not found: c9");
    }

    #[test]
    fn given_invalid_layout_when_mapping_exit_code_then_config() {
        let err: CliError = ApplicationError::from(DomainError::InvalidLayout {
            field: "row_height",
            value: -1.0,
        })
        .into();
        assert_eq!(err.exit_code(), crate::exitcode::CONFIG);
    }
}
