use std::{path::PathBuf, sync::Mutex};

use clap::ValueEnum;
use color_eyre::Result;
use tracing_error::ErrorLayer;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

lazy_static::lazy_static! {
    pub static ref LOG_FILE: String = format!("{}.log", env!("CARGO_PKG_NAME"));
}

/// `--logging` values
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

/// Initialize logging with default settings (WARN level)
pub fn init() -> Result<()> {
    init_with(None, None)
}

/// Log file used when no custom path is given
pub fn default_log_path() -> Result<PathBuf> {
    Ok(std::env::current_dir()?.join(LOG_FILE.as_str()))
}

/// Initialize logging with custom path and/or level
pub fn init_with(custom_log_path: Option<PathBuf>, level: Option<tracing::Level>) -> Result<()> {
    let log_path = match custom_log_path {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            path
        }
        None => default_log_path()?,
    };

    // CLI level overrides RUST_LOG; otherwise WARN
    let env_filter = EnvFilter::builder()
        .with_default_directive(level.unwrap_or(tracing::Level::WARN).into())
        .from_env_lossy();

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;
    let file_subscriber = fmt::layer()
        .with_file(true)
        .with_line_number(true)
        .with_writer(Mutex::new(file))
        .with_target(false)
        .with_ansi(false)
        .with_filter(env_filter);

    tracing_subscriber::registry()
        .with(file_subscriber)
        .with(ErrorLayer::default())
        .try_init()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_log_file_name() {
        assert_eq!(LOG_FILE.as_str(), "wiggletui.log");
    }

    #[test]
    fn test_levels() {
        assert_eq!(tracing::Level::from(LogLevel::Debug), tracing::Level::DEBUG);
        assert_eq!(LogLevel::from_str("warn", true), Ok(LogLevel::Warn));
    }

    #[test]
    fn test_init_creates_log_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("wiggletui.log");
        init_with(Some(path.clone()), Some(tracing::Level::INFO)).unwrap();
        tracing::info!("hello from the test");
        assert!(path.exists());
    }
}
