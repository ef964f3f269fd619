use log::LevelFilter;
use serde_derive::Deserialize;

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

/// Thin facade over the `log` macros so call sites read the same in every module.
#[derive(Debug, Clone, Copy, Default)]
pub struct Logger;

impl Logger {
    pub fn init(level: LogLevel) {
        // RUST_LOG still wins when set, handy for one-off debugging of a single run.
        let mut builder = env_logger::Builder::new();
        builder.filter_level(level.into());
        builder.parse_env("RUST_LOG");
        if builder.try_init().is_err() {
            eprintln!("Logger already initialised, keeping the existing one");
        }
    }

    pub fn new() -> Self {
        Self
    }

    pub fn info(&self, message: &str) {
        log::info!("{}", message);
    }

    pub fn warn(&self, message: &str) {
        log::warn!("{}", message);
    }

    pub fn error(&self, message: &str) {
        log::error!("{}", message);
    }

    pub fn debug(&self, message: &str) {
        log::debug!("{}", message);
    }
}
