//! Domain error types.

/// Top-level error type for stockscreen.
#[derive(Debug, thiserror::Error)]
pub enum ScreenerError {
    #[error("record not found: {key}")]
    NotFound { key: String },

    #[error("store unavailable: {reason}")]
    StoreUnavailable { reason: String },

    #[error("store query error: {reason}")]
    StoreQuery { reason: String },

    #[error("corrupt record {key}: {reason}")]
    CorruptRecord { key: String, reason: String },

    #[error("provider {provider} fetch failed: {reason}")]
    ProviderFetch { provider: String, reason: String },

    #[error("report generation failed: {reason}")]
    ReportGeneration { reason: String },

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

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ScreenerError {
    /// True for failures that must abort the whole cycle rather than one record.
    pub fn is_fatal_to_cycle(&self) -> bool {
        matches!(
            self,
            ScreenerError::StoreUnavailable { .. } | ScreenerError::StoreQuery { .. }
        )
    }
}

impl From<&ScreenerError> for std::process::ExitCode {
    fn from(err: &ScreenerError) -> Self {
        let code: u8 = match err {
            ScreenerError::Io(_) => 1,
            ScreenerError::ConfigParse { .. }
            | ScreenerError::ConfigMissing { .. }
            | ScreenerError::ConfigInvalid { .. } => 2,
            ScreenerError::NotFound { .. }
            | ScreenerError::StoreUnavailable { .. }
            | ScreenerError::StoreQuery { .. }
            | ScreenerError::CorruptRecord { .. } => 3,
            ScreenerError::ProviderFetch { .. } => 4,
            ScreenerError::ReportGeneration { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
