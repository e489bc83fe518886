//! Domain error types.

/// Top-level error type for chartdesk.
#[derive(Debug, thiserror::Error)]
pub enum DeskError {
    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("database query error: {reason}")]
    DatabaseQuery { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("no data for {symbol}: {reason}")]
    DataUnavailable { symbol: String, reason: String },

    #[error("invalid input: {reason}")]
    Validation { reason: String },

    #[error("computation failed: {reason}")]
    Computation { reason: String },

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl DeskError {
    pub fn data_unavailable(symbol: &str, reason: impl Into<String>) -> Self {
        DeskError::DataUnavailable {
            symbol: symbol.to_string(),
            reason: reason.into(),
        }
    }

    pub fn validation(reason: impl Into<String>) -> Self {
        DeskError::Validation {
            reason: reason.into(),
        }
    }
}

impl From<r2d2::Error> for DeskError {
    fn from(e: r2d2::Error) -> Self {
        DeskError::Database {
            reason: e.to_string(),
        }
    }
}

impl From<rusqlite::Error> for DeskError {
    fn from(e: rusqlite::Error) -> Self {
        DeskError::DatabaseQuery {
            reason: e.to_string(),
        }
    }
}

impl From<&DeskError> for std::process::ExitCode {
    fn from(err: &DeskError) -> Self {
        let code: u8 = match err {
            DeskError::Io(_) | DeskError::Serialization(_) => 1,
            DeskError::ConfigParse { .. }
            | DeskError::ConfigMissing { .. }
            | DeskError::ConfigInvalid { .. } => 2,
            DeskError::Database { .. } | DeskError::DatabaseQuery { .. } => 3,
            DeskError::Validation { .. } => 4,
            DeskError::DataUnavailable { .. } | DeskError::Computation { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
