/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid fetch_batch_size: {configured} (min: {min_limit}, max: {max_limit})")]
    FetchBatchSize {
        configured: u32,
        min_limit: u32,
        max_limit: u32,
    },
    #[error("Invalid peek_count: {configured} (min: {min_limit}, max: {max_limit})")]
    PeekCount {
        configured: u32,
        min_limit: u32,
        max_limit: u32,
    },
    #[error("Invalid {field}: {configured} (min: {min_limit}, max: {max_limit})")]
    ReceiveTimeout {
        field: &'static str,
        configured: u64,
        min_limit: u64,
        max_limit: u64,
    },
    #[error("Invalid logging.level: {configured}")]
    LogLevel { configured: String },
}

impl ConfigValidationError {
    pub fn user_message(&self) -> String {
        match self {
            ConfigValidationError::FetchBatchSize {
                configured,
                min_limit,
                max_limit,
            } => format!(
                "Fetch batch size out of range!\n\
                Your configured value: {configured}\n\
                Valid range: {min_limit} - {max_limit}\n\
                Please update fetch_batch_size in config.toml."
            ),
            ConfigValidationError::PeekCount {
                configured,
                min_limit,
                max_limit,
            } => format!(
                "Peek count out of range!\n\
                Your configured value: {configured}\n\
                Valid range: {min_limit} - {max_limit}\n\
                Please update peek_count in config.toml."
            ),
            ConfigValidationError::ReceiveTimeout {
                field,
                configured,
                min_limit,
                max_limit,
            } => format!(
                "Receive timeout out of range!\n\
                Your configured value: {configured} seconds\n\
                Valid range: {min_limit} - {max_limit} seconds\n\
                Please update {field} in config.toml."
            ),
            ConfigValidationError::LogLevel { configured } => format!(
                "Unknown log level '{configured}'!\n\
                Use one of: trace, debug, info, warn, error."
            ),
        }
    }
}

/// Failure to produce a usable [`AppConfig`](super::AppConfig)
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    Load(String),
    #[error("Failed to deserialize config: {0}")]
    Deserialize(String),
    #[error("Configuration is invalid: {}", join(.0))]
    Invalid(Vec<ConfigValidationError>),
}

fn join(errors: &[ConfigValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
