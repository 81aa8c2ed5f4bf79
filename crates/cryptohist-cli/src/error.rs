use cryptohist_core::CoreError;
use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Validation(#[from] cryptohist_core::ValidationError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Store(#[from] cryptohist_core::WarehouseError),

    #[error("strict mode failed: {failed_ranges} range(s) could not be fetched")]
    StrictModeViolation { failed_ranges: usize },

    #[error("{0}")]
    Prompt(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Validation(_) | Self::Prompt(_) => 2,
            Self::Core(error) => match error {
                CoreError::InvalidDateFormat { .. }
                | CoreError::InvalidRange { .. }
                | CoreError::UnsupportedFormat { .. }
                | CoreError::Validation(_) => 2,
                CoreError::EmptySeries => 3,
                CoreError::UpstreamUnavailable { .. } => 4,
                CoreError::Serialization(_) => 6,
                CoreError::Store(_) => 7,
                CoreError::Io(_) => 10,
            },
            Self::StrictModeViolation { .. } => 5,
            Self::Store(_) => 7,
            Self::Io(_) => 10,
        }
    }
}
