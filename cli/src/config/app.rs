use super::limits::*;
use super::validation::ConfigValidationError;
use serde::Deserialize;
use server::lock_cycle::LockCycleConfig;

const DEFAULT_RELEASES_URL: &str = "https://api.github.com/repos/busctl/busctl/releases/latest";

/// Main application configuration
#[derive(Debug, Deserialize, Default, Clone)]
pub struct AppConfig {
    #[serde(flatten, default)]
    lock_cycle: LockCycleConfig,
    #[serde(default)]
    servicebus: ServicebusConfig,
    #[serde(default)]
    logging: LoggingConfig,
    #[serde(default)]
    update_check: UpdateCheckConfig,
}

impl AppConfig {
    /// Validate the configuration against defined limits
    pub fn validate(&self) -> Result<(), Vec<ConfigValidationError>> {
        let mut errors = Vec::new();

        let batch = self.lock_cycle.fetch_batch_size();
        if !(MIN_BATCH_SIZE..=AZURE_SERVICE_BUS_MAX_BATCH_SIZE).contains(&batch) {
            errors.push(ConfigValidationError::FetchBatchSize {
                configured: batch,
                min_limit: MIN_BATCH_SIZE,
                max_limit: AZURE_SERVICE_BUS_MAX_BATCH_SIZE,
            });
        }

        let peek = self.lock_cycle.peek_count();
        if !(MIN_BATCH_SIZE..=AZURE_SERVICE_BUS_MAX_BATCH_SIZE).contains(&peek) {
            errors.push(ConfigValidationError::PeekCount {
                configured: peek,
                min_limit: MIN_BATCH_SIZE,
                max_limit: AZURE_SERVICE_BUS_MAX_BATCH_SIZE,
            });
        }

        for (field, configured) in [
            (
                "bulk_receive_timeout_secs",
                self.lock_cycle.bulk_receive_timeout_secs(),
            ),
            (
                "search_receive_timeout_secs",
                self.lock_cycle.search_receive_timeout_secs(),
            ),
        ] {
            if !(MIN_RECEIVE_TIMEOUT_SECS..=MAX_RECEIVE_TIMEOUT_SECS).contains(&configured) {
                errors.push(ConfigValidationError::ReceiveTimeout {
                    field,
                    configured,
                    min_limit: MIN_RECEIVE_TIMEOUT_SECS,
                    max_limit: MAX_RECEIVE_TIMEOUT_SECS,
                });
            }
        }

        if self.logging.level_filter().is_none() {
            errors.push(ConfigValidationError::LogLevel {
                configured: self.logging.level().to_string(),
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    pub fn lock_cycle(&self) -> &LockCycleConfig {
        &self.lock_cycle
    }

    pub fn servicebus(&self) -> &ServicebusConfig {
        &self.servicebus
    }

    pub fn logging(&self) -> &LoggingConfig {
        &self.logging
    }

    pub fn update_check(&self) -> &UpdateCheckConfig {
        &self.update_check
    }
}

/// Service Bus configuration
#[derive(Debug, Deserialize, Default, Clone)]
pub struct ServicebusConfig {
    connection_string: Option<String>,
}

impl ServicebusConfig {
    /// The namespace connection string, if one is configured and not blank
    pub fn connection_string(&self) -> Option<&str> {
        self.connection_string
            .as_deref()
            .filter(|s| !s.trim().is_empty())
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct LoggingConfig {
    level: Option<String>,
    file: Option<String>,
}

impl LoggingConfig {
    pub fn level(&self) -> &str {
        self.level.as_deref().unwrap_or("info")
    }

    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    /// The configured level, or `None` when it is not a known level name
    pub fn level_filter(&self) -> Option<log::LevelFilter> {
        match self.level().to_lowercase().as_str() {
            "trace" => Some(log::LevelFilter::Trace),
            "debug" => Some(log::LevelFilter::Debug),
            "info" => Some(log::LevelFilter::Info),
            "warn" => Some(log::LevelFilter::Warn),
            "error" => Some(log::LevelFilter::Error),
            "off" => Some(log::LevelFilter::Off),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct UpdateCheckConfig {
    enabled: Option<bool>,
    releases_url: Option<String>,
}

impl UpdateCheckConfig {
    pub fn enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }

    /// GitHub "latest release" API endpoint
    pub fn releases_url(&self) -> &str {
        self.releases_url.as_deref().unwrap_or(DEFAULT_RELEASES_URL)
    }
}
