/// Core data types for the wardriving map generator.
///
/// This module defines the shared domain model imported by all other modules:
/// observations read from the survey file, the fixed set of encryption
/// classes, coordinates and the map center, and the error taxonomy.
/// It contains no I/O.

use serde::ser::{Serialize, SerializeTuple, Serializer};
use std::fmt;

// ---------------------------------------------------------------------------
// Required input columns
// ---------------------------------------------------------------------------

/// Header of the latitude column, in WGS84 degrees.
pub const COL_LATITUDE: &str = "CurrentLatitude";

/// Header of the longitude column, in WGS84 degrees.
pub const COL_LONGITUDE: &str = "CurrentLongitude";

/// Header of the free-text encryption column.
pub const COL_ENCRYPTION: &str = "Encryption";

/// All required columns, in the order they are checked.
pub const REQUIRED_COLUMNS: [&str; 3] = [COL_LATITUDE, COL_LONGITUDE, COL_ENCRYPTION];

// ---------------------------------------------------------------------------
// Observation types
// ---------------------------------------------------------------------------

/// One validated row of the survey file.
///
/// `encryption` keeps the original case of the input so that log output
/// matches what the operator sees in the file; classification lowercases it.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub latitude: f64,
    pub longitude: f64,
    pub encryption: String,
}

/// Encryption classes shown on the map. The set is closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EncryptionClass {
    Open,
    Wep,
    Wpa,
    Wpa2,
    Unknown,
}

impl EncryptionClass {
    /// Canonical order: bucket order in the page and button order in the menu.
    pub const ALL: [EncryptionClass; 5] = [
        EncryptionClass::Open,
        EncryptionClass::Wep,
        EncryptionClass::Wpa,
        EncryptionClass::Wpa2,
        EncryptionClass::Unknown,
    ];

    /// Display label, also the key of the bucket in the embedded data.
    pub fn label(self) -> &'static str {
        match self {
            EncryptionClass::Open => "Open",
            EncryptionClass::Wep => "WEP",
            EncryptionClass::Wpa => "WPA",
            EncryptionClass::Wpa2 => "WPA2",
            EncryptionClass::Unknown => "Unknown",
        }
    }

    /// Lowercase token an encryption value must equal to land in this class.
    pub fn token(self) -> &'static str {
        match self {
            EncryptionClass::Open => "none",
            EncryptionClass::Wep => "wep",
            EncryptionClass::Wpa => "wpa",
            EncryptionClass::Wpa2 => "wpa2",
            EncryptionClass::Unknown => "unknown",
        }
    }

    /// Marker fill color.
    pub fn color(self) -> &'static str {
        match self {
            EncryptionClass::Open => "red",
            EncryptionClass::Wep => "blue",
            EncryptionClass::Wpa => "purple",
            EncryptionClass::Wpa2 => "green",
            EncryptionClass::Unknown => "orange",
        }
    }

    /// Case-insensitive exact match against the class tokens.
    ///
    /// `"WPA2"` and `"wpa2"` both classify as `Wpa2`; `"wpa2-personal"` and
    /// `"unknown-type"` classify as nothing. Only the literal token `unknown`
    /// reaches the `Unknown` class.
    pub fn classify(raw: &str) -> Option<EncryptionClass> {
        let lowered = raw.to_lowercase();
        Self::ALL.into_iter().find(|class| class.token() == lowered)
    }
}

impl fmt::Display for EncryptionClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A single marker position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

/// Serialized as `[lat, lng]`, the shape the page script destructures.
impl Serialize for Coordinate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut pair = serializer.serialize_tuple(2)?;
        pair.serialize_element(&self.latitude)?;
        pair.serialize_element(&self.longitude)?;
        pair.end()
    }
}

/// Initial map center: unweighted mean of all classified coordinates.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct MapCenter {
    pub latitude: f64,
    pub longitude: f64,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can arise while turning a survey file into a map page.
#[derive(Debug, Clone, PartialEq)]
pub enum MapError {
    /// A required column header is absent from the input.
    MissingColumn(String),
    /// No row survived filtering and classification, so there is no center.
    NoData,
    /// A required field is present but not parseable. Recoverable: the
    /// loader drops the row and records this value in its report.
    DataFormat { line: u64, column: String, value: String },
    /// Reading the input or writing the output failed.
    Io(String),
    /// The input is not well-formed delimited text.
    Csv(String),
    /// The page could not be assembled.
    Render(String),
    /// Configuration is missing or invalid.
    Config(String),
}

impl fmt::Display for MapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapError::MissingColumn(column) => {
                write!(f, "Schema error: input must contain '{}' column", column)
            }
            MapError::NoData => write!(
                f,
                "No data: no valid latitude and longitude data found in the input"
            ),
            MapError::DataFormat { line, column, value } => write!(
                f,
                "Data format error on line {}: {} value '{}' is not a finite number",
                line, column, value
            ),
            MapError::Io(msg) => write!(f, "I/O error: {}", msg),
            MapError::Csv(msg) => write!(f, "CSV error: {}", msg),
            MapError::Render(msg) => write!(f, "Render error: {}", msg),
            MapError::Config(msg) => write!(f, "Config error: {}", msg),
        }
    }
}

impl std::error::Error for MapError {}

impl From<std::io::Error> for MapError {
    fn from(err: std::io::Error) -> Self {
        MapError::Io(err.to_string())
    }
}

impl From<csv::Error> for MapError {
    fn from(err: csv::Error) -> Self {
        MapError::Csv(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_is_case_insensitive() {
        for raw in ["WPA2", "wpa2", "Wpa2"] {
            assert_eq!(EncryptionClass::classify(raw), Some(EncryptionClass::Wpa2));
        }
        assert_eq!(EncryptionClass::classify("NONE"), Some(EncryptionClass::Open));
        assert_eq!(EncryptionClass::classify("Unknown"), Some(EncryptionClass::Unknown));
    }

    #[test]
    fn test_classify_requires_exact_match() {
        assert_eq!(EncryptionClass::classify("wpa2-personal"), None);
        assert_eq!(EncryptionClass::classify("unknown-type"), None);
        assert_eq!(EncryptionClass::classify("wp"), None);
        assert_eq!(EncryptionClass::classify("open"), None);
        assert_eq!(EncryptionClass::classify(""), None);
    }

    #[test]
    fn test_labels_tokens_and_colors_are_distinct() {
        let mut labels = std::collections::HashSet::new();
        let mut tokens = std::collections::HashSet::new();
        let mut colors = std::collections::HashSet::new();
        for class in EncryptionClass::ALL {
            assert!(labels.insert(class.label()));
            assert!(tokens.insert(class.token()));
            assert!(colors.insert(class.color()));
            assert_eq!(class.token(), class.token().to_lowercase());
        }
    }

    #[test]
    fn test_color_table() {
        assert_eq!(EncryptionClass::Open.color(), "red");
        assert_eq!(EncryptionClass::Wep.color(), "blue");
        assert_eq!(EncryptionClass::Wpa.color(), "purple");
        assert_eq!(EncryptionClass::Wpa2.color(), "green");
        assert_eq!(EncryptionClass::Unknown.color(), "orange");
    }

    #[test]
    fn test_coordinate_serializes_as_pair() {
        let c = Coordinate { latitude: 37.5, longitude: -122.25 };
        assert_eq!(serde_json::to_string(&c).unwrap(), "[37.5,-122.25]");
    }

    #[test]
    fn test_missing_column_message_names_column() {
        let err = MapError::MissingColumn(COL_ENCRYPTION.to_string());
        assert!(err.to_string().contains("'Encryption'"));
    }
}
