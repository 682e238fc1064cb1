/// Run configuration.
///
/// Everything a generation run needs is resolved once, up front, into a
/// `Config` that is passed explicitly into the pipeline. Sources, from
/// lowest to highest precedence:
///
///   1. built-in defaults
///   2. an optional TOML file
///   3. environment variables (a `.env` file is honored)
///   4. command line overrides
///
/// The map provider API key is only read from the environment or the
/// command line. It is never accepted from the TOML file, which tends to be
/// committed next to the survey data.
///
/// # Environment injection
/// `Config::resolve` takes the environment as a lookup function rather than
/// reading `std::env` itself, so tests stay deterministic.

use crate::ingest::csv_loader::LoaderOptions;
use crate::logging::LogLevel;
use crate::model::MapError;
use crate::render::page::{PageOptions, DEFAULT_TITLE, DEFAULT_ZOOM};
use serde::Deserialize;
use std::path::{Component, Path, PathBuf};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const ENV_API_KEY: &str = "WARDRIVE_MAP_API_KEY";
pub const ENV_INPUT: &str = "WARDRIVE_MAP_INPUT";
pub const ENV_OUTPUT: &str = "WARDRIVE_MAP_OUTPUT";
pub const ENV_LOG_LEVEL: &str = "WARDRIVE_MAP_LOG_LEVEL";

pub const DEFAULT_INPUT: &str = "wifi_data.csv";
pub const DEFAULT_OUTPUT: &str = "map.html";

/// Highest zoom level the map provider serves.
pub const MAX_ZOOM: u8 = 22;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Fully resolved configuration for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    /// Optional JSON run summary written after the page.
    pub summary_path: Option<PathBuf>,
    pub api_key: String,
    pub zoom: u8,
    pub title: String,
    pub delimiter: u8,
    pub skip_lines: usize,
    pub log_level: LogLevel,
    pub log_file: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_path: PathBuf::from(DEFAULT_INPUT),
            output_path: PathBuf::from(DEFAULT_OUTPUT),
            summary_path: None,
            api_key: String::new(),
            zoom: DEFAULT_ZOOM,
            title: DEFAULT_TITLE.to_string(),
            delimiter: b',',
            skip_lines: 0,
            log_level: LogLevel::Info,
            log_file: None,
        }
    }
}

/// Shape of the optional TOML configuration file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub summary: Option<PathBuf>,
    pub zoom: Option<u8>,
    pub title: Option<String>,
    pub delimiter: Option<String>,
    pub skip_lines: Option<usize>,
    pub log_level: Option<String>,
    pub log_file: Option<String>,
}

/// Values given on the command line. `None` leaves the lower layers alone.
#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    pub input: Option<PathBuf>,
    pub output: Option<PathBuf>,
    pub summary: Option<PathBuf>,
    pub api_key: Option<String>,
    pub zoom: Option<u8>,
    pub title: Option<String>,
    pub delimiter: Option<String>,
    pub skip_lines: Option<usize>,
    pub log_level: Option<String>,
    pub log_file: Option<String>,
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

impl Config {
    /// Resolves configuration from the process environment, loading `.env`
    /// from the working directory if present.
    pub fn from_env(
        config_file: Option<&Path>,
        overrides: &ConfigOverrides,
    ) -> Result<Self, MapError> {
        dotenv::dotenv().ok();
        let file = match config_file {
            Some(path) => Some(load_file_config(path)?),
            None => None,
        };
        Self::resolve(file, |key| std::env::var(key).ok(), overrides)
    }

    /// Layers defaults, file, environment and overrides, then validates.
    pub fn resolve<F>(
        file: Option<FileConfig>,
        env: F,
        overrides: &ConfigOverrides,
    ) -> Result<Self, MapError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();
        let mut delimiter: Option<String> = None;
        let mut log_level: Option<String> = None;

        if let Some(file) = file {
            if let Some(v) = file.input {
                config.input_path = v;
            }
            if let Some(v) = file.output {
                config.output_path = v;
            }
            if let Some(v) = file.summary {
                config.summary_path = Some(v);
            }
            if let Some(v) = file.zoom {
                config.zoom = v;
            }
            if let Some(v) = file.title {
                config.title = v;
            }
            if let Some(v) = file.skip_lines {
                config.skip_lines = v;
            }
            if let Some(v) = file.log_file {
                config.log_file = Some(v);
            }
            delimiter = file.delimiter.or(delimiter);
            log_level = file.log_level.or(log_level);
        }

        let non_blank = |key: &str| env(key).filter(|v| !v.trim().is_empty());
        if let Some(v) = non_blank(ENV_INPUT) {
            config.input_path = PathBuf::from(v);
        }
        if let Some(v) = non_blank(ENV_OUTPUT) {
            config.output_path = PathBuf::from(v);
        }
        if let Some(v) = non_blank(ENV_API_KEY) {
            config.api_key = v;
        }
        log_level = non_blank(ENV_LOG_LEVEL).or(log_level);

        if let Some(v) = &overrides.input {
            config.input_path = v.clone();
        }
        if let Some(v) = &overrides.output {
            config.output_path = v.clone();
        }
        if let Some(v) = &overrides.summary {
            config.summary_path = Some(v.clone());
        }
        if let Some(v) = &overrides.api_key {
            config.api_key = v.clone();
        }
        if let Some(v) = overrides.zoom {
            config.zoom = v;
        }
        if let Some(v) = &overrides.title {
            config.title = v.clone();
        }
        if let Some(v) = overrides.skip_lines {
            config.skip_lines = v;
        }
        if let Some(v) = &overrides.log_file {
            config.log_file = Some(v.clone());
        }
        delimiter = overrides.delimiter.clone().or(delimiter);
        log_level = overrides.log_level.clone().or(log_level);

        if let Some(raw) = delimiter {
            config.delimiter = parse_delimiter(&raw)?;
        }
        if let Some(raw) = log_level {
            config.log_level = raw.parse().map_err(MapError::Config)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Checks values no layer can be trusted to get right.
    pub fn validate(&self) -> Result<(), MapError> {
        if self.api_key.trim().is_empty() {
            return Err(MapError::Config(format!(
                "map API key is required: set {} or pass --api-key",
                ENV_API_KEY
            )));
        }
        if self.zoom > MAX_ZOOM {
            return Err(MapError::Config(format!(
                "zoom must be between 0 and {}, got {}",
                MAX_ZOOM, self.zoom
            )));
        }
        if !self.delimiter.is_ascii() || matches!(self.delimiter, b'"' | b'\n' | b'\r') {
            return Err(MapError::Config(format!(
                "unusable delimiter byte 0x{:02X}",
                self.delimiter
            )));
        }
        if same_path(&self.input_path, &self.output_path) {
            return Err(MapError::Config(format!(
                "output path {} would overwrite the input",
                self.output_path.display()
            )));
        }
        Ok(())
    }

    pub fn loader_options(&self) -> LoaderOptions {
        LoaderOptions {
            delimiter: self.delimiter,
            skip_lines: self.skip_lines,
        }
    }

    pub fn page_options(&self) -> PageOptions {
        PageOptions {
            api_key: self.api_key.clone(),
            zoom: self.zoom,
            title: self.title.clone(),
        }
    }
}

/// True when both paths name the same file.
///
/// Existing files are compared by canonical path so links and `..` resolve.
/// Otherwise the paths are made absolute against the working directory and
/// compared with `.` and `..` components resolved.
fn same_path(a: &Path, b: &Path) -> bool {
    if let (Ok(a), Ok(b)) = (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        return a == b;
    }
    lexical_absolute(a) == lexical_absolute(b)
}

fn lexical_absolute(path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };

    let mut out = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Reads and parses a TOML configuration file.
pub fn load_file_config(path: &Path) -> Result<FileConfig, MapError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| MapError::Config(format!("cannot read {}: {}", path.display(), e)))?;
    toml::from_str(&text)
        .map_err(|e| MapError::Config(format!("invalid config file {}: {}", path.display(), e)))
}

/// Accepts a single ASCII character, or `tab` / `\t` for a tab.
pub fn parse_delimiter(raw: &str) -> Result<u8, MapError> {
    match raw {
        "tab" | "\\t" | "\t" => return Ok(b'\t'),
        _ => {}
    }
    match raw.as_bytes() {
        [byte] if byte.is_ascii() => Ok(*byte),
        _ => Err(MapError::Config(format!(
            "delimiter must be a single ASCII character, got '{}'",
            raw
        ))),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
