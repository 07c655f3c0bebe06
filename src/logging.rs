/// Structured logging for the water-monitoring service.
///
/// Provides context-rich logging with subsystem and household identifiers,
/// timestamps, and severity levels. Supports both console output and
/// file-based logging for daemon operations.

use chrono::Utc;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::sync::Mutex;

use crate::model::ChannelKind;
use crate::monitor::CycleSummary;

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warning),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("unknown log level: {}", other)),
        }
    }
}

// ---------------------------------------------------------------------------
// Subsystems
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Gateway,
    Classifier,
    Alert,
    Notify,
    Db,
    System,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Component::Gateway => write!(f, "GATEWAY"),
            Component::Classifier => write!(f, "CLASSIFY"),
            Component::Alert => write!(f, "ALERT"),
            Component::Notify => write!(f, "NOTIFY"),
            Component::Db => write!(f, "DB"),
            Component::System => write!(f, "SYS"),
        }
    }
}

// ---------------------------------------------------------------------------
// Failure Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureType {
    /// Expected failure - a meter may be offline or the gateway in a
    /// maintenance window.
    Expected,
    /// Unexpected failure - indicates service degradation or a
    /// configuration issue.
    Unexpected,
    /// Unknown - cannot determine if this is expected or not.
    Unknown,
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureType::Expected => write!(f, "EXPECTED"),
            FailureType::Unexpected => write!(f, "UNEXPECTED"),
            FailureType::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

// ---------------------------------------------------------------------------
// Logger
// ---------------------------------------------------------------------------

/// Global logger instance
static LOGGER: Mutex<Option<Logger>> = Mutex::new(None);

pub struct Logger {
    /// Minimum log level to display
    min_level: LogLevel,
    /// Optional file path for logging
    log_file: Option<String>,
    /// Whether to include timestamps in console output
    console_timestamps: bool,
}

impl Logger {
    /// Initialize the global logger
    pub fn init(min_level: LogLevel, log_file: Option<String>, console_timestamps: bool) {
        let logger = Logger {
            min_level,
            log_file,
            console_timestamps,
        };

        *LOGGER.lock().unwrap() = Some(logger);
    }

    fn log(
        &self,
        level: LogLevel,
        component: &Component,
        household_id: Option<&str>,
        message: &str,
    ) {
        if level < self.min_level {
            return;
        }

        let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
        let household_part = household_id.map(|h| format!(" [{}]", h)).unwrap_or_default();
        let log_entry = format!(
            "{} {} {}{}: {}",
            timestamp, level, component, household_part, message
        );

        // Console output
        if self.console_timestamps {
            match level {
                LogLevel::Error | LogLevel::Warning => eprintln!("{}", log_entry),
                LogLevel::Info => println!("   {}", message),
                LogLevel::Debug => println!("   [DEBUG] {}", message),
            }
        } else {
            match level {
                LogLevel::Error => eprintln!("   ✗ {}{}: {}", component, household_part, message),
                LogLevel::Warning => eprintln!("   ⚠ {}{}: {}", component, household_part, message),
                LogLevel::Info => println!("   {}", message),
                LogLevel::Debug => {} // Skip debug in non-timestamp mode
            }
        }

        // File output
        if let Some(ref path) = self.log_file {
            if let Err(e) = Self::append_to_file(path, &log_entry) {
                eprintln!("Failed to write to log file {}: {}", path, e);
            }
        }
    }

    fn append_to_file(path: &str, entry: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{}", entry)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Public Logging Functions
// ---------------------------------------------------------------------------

/// Initialize the global logger
pub fn init_logger(min_level: LogLevel, log_file: Option<&str>, console_timestamps: bool) {
    Logger::init(min_level, log_file.map(String::from), console_timestamps);
}

/// Log a general informational message
pub fn info(component: Component, household_id: Option<&str>, message: &str) {
    if let Some(logger) = LOGGER.lock().unwrap().as_ref() {
        logger.log(LogLevel::Info, &component, household_id, message);
    }
}

/// Log a warning message
pub fn warn(component: Component, household_id: Option<&str>, message: &str) {
    if let Some(logger) = LOGGER.lock().unwrap().as_ref() {
        logger.log(LogLevel::Warning, &component, household_id, message);
    }
}

/// Log an error message
pub fn error(component: Component, household_id: Option<&str>, message: &str) {
    if let Some(logger) = LOGGER.lock().unwrap().as_ref() {
        logger.log(LogLevel::Error, &component, household_id, message);
    }
}

/// Log a debug message
pub fn debug(component: Component, household_id: Option<&str>, message: &str) {
    if let Some(logger) = LOGGER.lock().unwrap().as_ref() {
        logger.log(LogLevel::Debug, &component, household_id, message);
    }
}

// ---------------------------------------------------------------------------
// Failure Classification Helpers
// ---------------------------------------------------------------------------

/// Classify a device-gateway failure based on the error text.
pub fn classify_gateway_failure(error_message: &str) -> FailureType {
    // Meters drop off the gateway routinely (battery, coverage); the
    // gateway itself erroring is another matter.
    if error_message.contains("No data available") {
        FailureType::Unknown
    } else if error_message.contains("HTTP error") {
        FailureType::Unexpected
    } else if error_message.contains("Parse error") {
        FailureType::Unexpected
    } else {
        FailureType::Unknown
    }
}

/// Log a device-gateway failure with automatic classification.
pub fn log_gateway_failure(operation: &str, err: &dyn std::error::Error) {
    let error_msg = err.to_string();
    let failure_type = classify_gateway_failure(&error_msg);

    let message = format!("{} failed [{}]: {}", operation, failure_type, error_msg);

    match failure_type {
        FailureType::Expected => debug(Component::Gateway, None, &message),
        FailureType::Unexpected => error(Component::Gateway, None, &message),
        FailureType::Unknown => warn(Component::Gateway, None, &message),
    }
}

/// Log a notification delivery failure. Always a warning: per-recipient
/// delivery failures are non-fatal to the alerting pipeline.
pub fn log_notify_failure(channel: ChannelKind, recipient_id: &str, err: &dyn std::error::Error) {
    warn(
        Component::Notify,
        None,
        &format!("{} delivery to {} failed: {}", channel, recipient_id, err),
    );
}

// ---------------------------------------------------------------------------
// Cycle Summary Logging
// ---------------------------------------------------------------------------

/// Log a summary of one monitoring cycle.
pub fn log_cycle_summary(summary: &CycleSummary) {
    let message = format!(
        "Cycle complete: {} readings, {} anomalies, {} alerts created, {} notification failures",
        summary.readings, summary.anomalies, summary.alerts_created, summary.notify_failures
    );

    if summary.notify_failures > 0 {
        warn(Component::System, None, &message);
    } else {
        info(Component::System, None, &message);
    }
}
