use crate::config::ConfigError;
use server::service_bus_manager::ServiceBusError;

/// Errors surfaced by the command-line front-end. Any of them ends the process
/// with exit status 1; a message that could not be located is not an error and
/// never reaches here.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Invalid arguments: {0}")]
    Usage(String),

    #[error("Service Bus error: {0}")]
    ServiceBus(#[from] ServiceBusError),

    #[error("Update check failed: {0}")]
    UpdateCheck(String),

    #[error("Failed to render output: {0}")]
    Output(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;

