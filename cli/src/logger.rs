use crate::config::LoggingConfig;
use fern::colors::{Color, ColoredLevelConfig};
use log::LevelFilter;
use std::fs::OpenOptions;

const DEFAULT_LOG_FILE: &str = "busctl.log";

/// Installs the global logger.
///
/// Lines go to the configured file, or `busctl.log` in the working directory
/// when none is configured. If the file cannot be opened, logging falls back
/// to stderr so command output on stdout stays clean.
pub fn setup_logger(logging: &LoggingConfig) -> Result<(), log::SetLoggerError> {
    let log_level = logging.level_filter().unwrap_or(LevelFilter::Info);

    let colors = ColoredLevelConfig::new()
        .trace(Color::BrightBlack)
        .debug(Color::BrightBlue)
        .info(Color::Green)
        .warn(Color::Yellow)
        .error(Color::Red);

    let base_config = fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                colors.color(record.level()),
                record.target(),
                message
            ))
        })
        .level(log_level)
        // The AMQP stack is chatty at debug level
        .level_for("fe2o3_amqp", log_level.min(LevelFilter::Warn))
        .level_for("azservicebus", log_level.min(LevelFilter::Warn));

    let file_path = logging.file().unwrap_or(DEFAULT_LOG_FILE);
    match OpenOptions::new().create(true).append(true).open(file_path) {
        Ok(file) => base_config.chain(file).apply()?,
        Err(e) => {
            eprintln!("Warning: Failed to open log file '{file_path}': {e}");
            eprintln!("Logging to stderr instead.");
            base_config.chain(std::io::stderr()).apply()?;
        }
    }

    log::debug!("Logger initialized with level: {}", logging.level());
    Ok(())
}
