/// Structured logging for the map generator
///
/// Provides context-rich logging tagged with the pipeline stage and an
/// optional context (input line, bucket label, file path), with timestamps
/// and severity levels. Supports console output and an append-only log file.

use chrono::Utc;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::str::FromStr;
use std::sync::Mutex;

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

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warning),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("unknown log level '{}'", other)),
        }
    }
}

// ---------------------------------------------------------------------------
// Pipeline Stages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Config,
    Load,
    Group,
    Center,
    Render,
    System,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Config => write!(f, "CONFIG"),
            Stage::Load => write!(f, "LOAD"),
            Stage::Group => write!(f, "GROUP"),
            Stage::Center => write!(f, "CENTER"),
            Stage::Render => write!(f, "RENDER"),
            Stage::System => write!(f, "SYS"),
        }
    }
}

// ---------------------------------------------------------------------------
// Logger Configuration
// ---------------------------------------------------------------------------

/// Global logger instance
static LOGGER: Mutex<Option<Logger>> = Mutex::new(None);

pub struct Logger {
    /// Minimum log level to display
    min_level: LogLevel,
    /// Optional file path for logging
    log_file: Option<String>,
}

impl Logger {
    /// Initialize the global logger
    pub fn init(min_level: LogLevel, log_file: Option<String>) {
        let logger = Logger {
            min_level,
            log_file,
        };

        if let Ok(mut slot) = LOGGER.lock() {
            *slot = Some(logger);
        }
    }

    fn format_entry(level: LogLevel, stage: Stage, context: Option<&str>, message: &str) -> String {
        let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
        let context_part = context.map(|c| format!(" [{}]", c)).unwrap_or_default();
        format!("{} {} {}{}: {}", timestamp, level, stage, context_part, message)
    }

    /// Console rendering of an entry. Info prints the bare message; every
    /// other level carries the stage tag and context.
    fn console_line(
        level: LogLevel,
        stage: Stage,
        context: Option<&str>,
        message: &str,
    ) -> String {
        let context_part = context.map(|c| format!(" [{}]", c)).unwrap_or_default();
        match level {
            LogLevel::Error => format!("   ✗ {}{}: {}", stage, context_part, message),
            LogLevel::Warning => format!("   ⚠ {}{}: {}", stage, context_part, message),
            LogLevel::Info => format!("   {}", message),
            LogLevel::Debug => format!("   [DEBUG] {}{}: {}", stage, context_part, message),
        }
    }

    fn log(&self, level: LogLevel, stage: Stage, context: Option<&str>, message: &str) {
        if level < self.min_level {
            return;
        }

        // Console output
        let line = Self::console_line(level, stage, context, message);
        match level {
            LogLevel::Error | LogLevel::Warning => eprintln!("{}", line),
            LogLevel::Info | LogLevel::Debug => println!("{}", line),
        }

        // File output
        if let Some(ref path) = self.log_file {
            let log_entry = Self::format_entry(level, stage, context, message);
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
pub fn init_logger(min_level: LogLevel, log_file: Option<&str>) {
    Logger::init(min_level, log_file.map(String::from));
}

fn dispatch(level: LogLevel, stage: Stage, context: Option<&str>, message: &str) {
    if let Ok(guard) = LOGGER.lock() {
        if let Some(logger) = guard.as_ref() {
            logger.log(level, stage, context, message);
        }
    }
}

/// Log a general informational message
pub fn info(stage: Stage, context: Option<&str>, message: &str) {
    dispatch(LogLevel::Info, stage, context, message);
}

/// Log a warning message
pub fn warn(stage: Stage, context: Option<&str>, message: &str) {
    dispatch(LogLevel::Warning, stage, context, message);
}

/// Log an error message
pub fn error(stage: Stage, context: Option<&str>, message: &str) {
    dispatch(LogLevel::Error, stage, context, message);
}

/// Log a debug message
pub fn debug(stage: Stage, context: Option<&str>, message: &str) {
    dispatch(LogLevel::Debug, stage, context, message);
}

// ---------------------------------------------------------------------------
// Structured Row Logging
// ---------------------------------------------------------------------------

/// Log a row dropped by the loader because a field could not be parsed.
pub fn log_row_rejection(line: u64, err: &dyn std::error::Error) {
    let context = format!("line {}", line);
    warn(Stage::Load, Some(&context), &format!("row dropped: {}", err));
}

// ---------------------------------------------------------------------------
// Run Summary Logging
// ---------------------------------------------------------------------------

/// Log the outcome of a generation run.
///
/// Escalates to a warning when rows were dropped so a partially usable
/// survey file is visible in the log without aborting the run.
pub fn log_run_summary(valid: usize, classified: usize, dropped: usize) {
    let message = format!(
        "Run complete: {}/{} valid rows classified, {} rows dropped",
        classified, valid, dropped
    );

    if dropped == 0 && classified == valid {
        info(Stage::System, None, &message);
    } else {
        warn(Stage::System, None, &message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warning);
        assert!(LogLevel::Warning < LogLevel::Error);
    }

    #[test]
    fn test_log_level_parsing() {
        assert_eq!("debug".parse::<LogLevel>(), Ok(LogLevel::Debug));
        assert_eq!(" INFO ".parse::<LogLevel>(), Ok(LogLevel::Info));
        assert_eq!("warn".parse::<LogLevel>(), Ok(LogLevel::Warning));
        assert_eq!("Warning".parse::<LogLevel>(), Ok(LogLevel::Warning));
        assert_eq!("error".parse::<LogLevel>(), Ok(LogLevel::Error));
        assert!("verbose".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_entry_format_includes_stage_and_context() {
        let entry =
            Logger::format_entry(LogLevel::Warning, Stage::Load, Some("line 7"), "row dropped");
        assert!(entry.ends_with("WARN LOAD [line 7]: row dropped"), "got: {}", entry);

        let entry = Logger::format_entry(LogLevel::Info, Stage::Render, None, "done");
        assert!(entry.ends_with("INFO RENDER: done"), "got: {}", entry);
    }

    #[test]
    fn test_debug_entries_reach_the_console() {
        let line = Logger::console_line(LogLevel::Debug, Stage::Group, Some("WEP"), "3 markers");
        assert_eq!(line, "   [DEBUG] GROUP [WEP]: 3 markers");

        let line = Logger::console_line(LogLevel::Info, Stage::Load, None, "info line");
        assert_eq!(line, "   info line");

        let line = Logger::console_line(LogLevel::Warning, Stage::Load, Some("line 3"), "dropped");
        assert_eq!(line, "   ⚠ LOAD [line 3]: dropped");
    }

    #[test]
    fn test_debug_level_writes_debug_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("debug.log");
        let logger = Logger {
            min_level: LogLevel::Debug,
            log_file: Some(path.to_str().unwrap().to_string()),
        };

        logger.log(LogLevel::Debug, Stage::Group, Some("WEP"), "3 markers");

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.trim_end().ends_with("DEBUG GROUP [WEP]: 3 markers"));
    }

    #[test]
    fn test_file_logging_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.log");
        let path_str = path.to_str().unwrap().to_string();
        let logger = Logger {
            min_level: LogLevel::Info,
            log_file: Some(path_str),
        };

        logger.log(LogLevel::Info, Stage::Load, None, "first");
        logger.log(LogLevel::Debug, Stage::Load, None, "filtered out");
        logger.log(LogLevel::Error, Stage::Render, Some("map.html"), "second");

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("INFO LOAD: first"));
        assert!(lines[1].ends_with("ERROR RENDER [map.html]: second"));
    }
}
