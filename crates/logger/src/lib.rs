//! Logging infrastructure for capi.
//!
//! A thread-safe logger with a file sink and an in-memory ring of recent
//! entries (shown in the Log tab). It also backs the `log` crate facade, so
//! library crates log through `log::info!` and friends.

use chrono::Local;
use std::collections::VecDeque;
use std::fs::{self, OpenOptions};
use std::io::Write as IoWrite;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};

/// Log entry
#[derive(Debug, Clone)]
pub struct LogEntry {
    /// Timestamp in HH:MM:SS format
    pub timestamp: String,
    pub level: LogLevel,
    /// Module path of the caller when logged through the `log` facade
    pub target: Option<String>,
    pub message: String,
}

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn to_str(self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }

    fn to_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Error => log::LevelFilter::Error,
        }
    }
}

impl From<log::Level> for LogLevel {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Error => LogLevel::Error,
            log::Level::Warn => LogLevel::Warn,
            log::Level::Info => LogLevel::Info,
            log::Level::Debug | log::Level::Trace => LogLevel::Debug,
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(format!("Unknown log level: {}", s)),
        }
    }
}

#[derive(Debug)]
struct Logger {
    entries: VecDeque<LogEntry>,
    max_entries: usize,
    min_level: LogLevel,
    file_path: PathBuf,
}

impl Logger {
    fn new(file_path: PathBuf, max_entries: usize, min_level: LogLevel) -> Self {
        if let Some(parent) = file_path.parent() {
            let _ = fs::create_dir_all(parent);
        }

        // Each run starts with a fresh file
        if let Ok(mut file) = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&file_path)
        {
            let _ = writeln!(
                file,
                "=== Capi Log Start {} ===",
                Local::now().format("%Y-%m-%d %H:%M:%S")
            );
        }

        Self {
            entries: VecDeque::new(),
            max_entries,
            min_level,
            file_path,
        }
    }

    fn add_entry(&mut self, level: LogLevel, target: Option<String>, message: String) {
        if level < self.min_level {
            return;
        }

        let entry = LogEntry {
            timestamp: Local::now().format("%H:%M:%S").to_string(),
            level,
            target,
            message,
        };

        // File may have been removed while running; recreate it
        if let Ok(mut file) = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.file_path)
        {
            let _ = match &entry.target {
                Some(target) => writeln!(
                    file,
                    "[{}] {} {}: {}",
                    entry.timestamp,
                    level.to_str(),
                    target,
                    entry.message
                ),
                None => writeln!(
                    file,
                    "[{}] {}: {}",
                    entry.timestamp,
                    level.to_str(),
                    entry.message
                ),
            };
        }

        self.entries.push_back(entry);
        while self.entries.len() > self.max_entries {
            self.entries.pop_front();
        }
    }
}

static LOGGER: OnceLock<Mutex<Logger>> = OnceLock::new();

fn with_logger(f: impl FnOnce(&mut Logger)) {
    if let Some(logger) = LOGGER.get() {
        if let Ok(mut logger) = logger.lock() {
            f(&mut logger);
        }
    }
}

/// Forwards `log` records into the global logger.
struct LogBridge;

impl log::Log for LogBridge {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        LOGGER
            .get()
            .and_then(|l| l.lock().ok().map(|l| LogLevel::from(metadata.level()) >= l.min_level))
            .unwrap_or(false)
    }

    fn log(&self, record: &log::Record) {
        let level = LogLevel::from(record.level());
        let target = record.target().to_string();
        let message = record.args().to_string();
        with_logger(|l| l.add_entry(level, Some(target), message));
    }

    fn flush(&self) {}
}

static BRIDGE: LogBridge = LogBridge;

/// Initialize the global logger.
///
/// Must be called once at startup before anything is logged; later calls
/// are ignored. Messages logged before `init` are dropped.
pub fn init(file_path: PathBuf, max_entries: usize, min_level: LogLevel) {
    if LOGGER.get().is_some() {
        return;
    }
    LOGGER.get_or_init(|| Mutex::new(Logger::new(file_path, max_entries, min_level)));
    if log::set_logger(&BRIDGE).is_ok() {
        log::set_max_level(min_level.to_filter());
    }
}

/// Change the minimum level at runtime.
pub fn set_min_level(level: LogLevel) {
    with_logger(|l| l.min_level = level);
    log::set_max_level(level.to_filter());
}

pub fn debug(message: impl Into<String>) {
    with_logger(|l| l.add_entry(LogLevel::Debug, None, message.into()));
}

pub fn info(message: impl Into<String>) {
    with_logger(|l| l.add_entry(LogLevel::Info, None, message.into()));
}

pub fn warn(message: impl Into<String>) {
    with_logger(|l| l.add_entry(LogLevel::Warn, None, message.into()));
}

pub fn error(message: impl Into<String>) {
    with_logger(|l| l.add_entry(LogLevel::Error, None, message.into()));
}

/// Snapshot of the in-memory entries, oldest first.
pub fn entries() -> Vec<LogEntry> {
    LOGGER
        .get()
        .and_then(|l| l.lock().ok().map(|l| l.entries.iter().cloned().collect()))
        .unwrap_or_default()
}
