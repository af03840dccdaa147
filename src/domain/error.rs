//! Domain error types.

/// Top-level error type for crosstrader.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("price data unavailable: {reason}")]
    DataUnavailable { reason: String },

    #[error("insufficient history: have {have} points, need {need}")]
    InsufficientHistory { have: usize, need: usize },

    #[error("trade export error: {reason}")]
    Export { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SignalError {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        SignalError::DataUnavailable {
            reason: reason.into(),
        }
    }

    pub fn invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        SignalError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    /// Recoverable errors skip a cycle instead of stopping the process.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SignalError::DataUnavailable { .. } | SignalError::InsufficientHistory { .. }
        )
    }
}

impl From<csv::Error> for SignalError {
    fn from(err: csv::Error) -> Self {
        SignalError::Export {
            reason: err.to_string(),
        }
    }
}

impl From<&SignalError> for std::process::ExitCode {
    fn from(err: &SignalError) -> Self {
        let code: u8 = match err {
            SignalError::Io(_) | SignalError::Export { .. } => 1,
            SignalError::ConfigParse { .. } | SignalError::ConfigInvalid { .. } => 2,
            SignalError::DataUnavailable { .. } | SignalError::InsufficientHistory { .. } => 3,
        };
        std::process::ExitCode::from(code)
    }
}
