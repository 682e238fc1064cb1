/// Survey file loader and validator
///
/// Reads a delimited export of wireless-network observations (one row per
/// sighting) and produces the validated `Observation`s the rest of the
/// pipeline works on. Only three columns matter:
/// `CurrentLatitude`, `CurrentLongitude` and `Encryption`. Every other
/// column is ignored.
///
/// Row policy:
/// - a missing or blank required field drops the row silently (counted)
/// - a latitude/longitude that is not a finite number drops the row with a
///   logged data format warning (counted and recorded)

use crate::logging;
use crate::model::{MapError, Observation, COL_LATITUDE, COL_LONGITUDE, REQUIRED_COLUMNS};
use csv::{ReaderBuilder, StringRecord};
use std::path::Path;

// ============================================================================
// Options and Report
// ============================================================================

/// How to read the input file.
#[derive(Debug, Clone, PartialEq)]
pub struct LoaderOptions {
    /// Field delimiter byte.
    pub delimiter: u8,
    /// Lines to discard before the header row. Some survey apps write a
    /// banner line above the column headers.
    pub skip_lines: usize,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            skip_lines: 0,
        }
    }
}

/// Result of loading a survey file.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadReport {
    /// Valid observations in input order.
    pub observations: Vec<Observation>,
    /// Data rows read, valid or not.
    pub total_rows: usize,
    /// Rows dropped because a required field was absent or blank.
    pub dropped_missing: usize,
    /// Rows dropped because a coordinate did not parse.
    pub dropped_malformed: usize,
    /// One `MapError::DataFormat` per malformed row.
    pub rejections: Vec<MapError>,
}

/// Column positions of the required fields within a record.
struct ColumnIndex {
    latitude: usize,
    longitude: usize,
    encryption: usize,
}

impl ColumnIndex {
    /// Locates the required columns, failing on the first one absent.
    fn from_headers(headers: &StringRecord) -> Result<Self, MapError> {
        let mut found = [0usize; 3];
        for (slot, column) in found.iter_mut().zip(REQUIRED_COLUMNS) {
            *slot = headers
                .iter()
                .position(|h| h == column)
                .ok_or_else(|| MapError::MissingColumn(column.to_string()))?;
        }

        Ok(ColumnIndex {
            latitude: found[0],
            longitude: found[1],
            encryption: found[2],
        })
    }
}

// ============================================================================
// Loading
// ============================================================================

/// Reads and validates the survey file at `path`.
///
/// Fails with `MapError::MissingColumn` before any row is examined when a
/// required header is absent. Malformed rows never fail the load.
pub fn load_observations(path: &Path, options: &LoaderOptions) -> Result<LoadReport, MapError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| MapError::Io(format!("cannot read {}: {}", path.display(), e)))?;

    logging::debug(
        logging::Stage::Load,
        Some(&path.display().to_string()),
        &format!("read {} bytes", text.len()),
    );

    parse_observations(&text, options)
}

/// Validates survey data already held in memory.
pub fn parse_observations(text: &str, options: &LoaderOptions) -> Result<LoadReport, MapError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let body = skip_preamble(text, options.skip_lines);

    let mut reader = ReaderBuilder::new()
        .delimiter(options.delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(body.as_bytes());

    let headers = reader.headers()?.clone();
    let columns = ColumnIndex::from_headers(&headers)?;

    let mut report = LoadReport {
        observations: Vec::new(),
        total_rows: 0,
        dropped_missing: 0,
        dropped_malformed: 0,
        rejections: Vec::new(),
    };

    for result in reader.records() {
        let record = result?;
        report.total_rows += 1;

        // Positions count from the start of `body`; report file line numbers.
        let line = record.position().map(|p| p.line()).unwrap_or(0) + options.skip_lines as u64;

        let (Some(lat_raw), Some(lng_raw), Some(encryption)) = (
            field(&record, columns.latitude),
            field(&record, columns.longitude),
            field(&record, columns.encryption),
        ) else {
            report.dropped_missing += 1;
            continue;
        };

        let parsed = parse_coordinate(lat_raw, line, COL_LATITUDE)
            .and_then(|lat| parse_coordinate(lng_raw, line, COL_LONGITUDE).map(|lng| (lat, lng)));

        match parsed {
            Ok((latitude, longitude)) => report.observations.push(Observation {
                latitude,
                longitude,
                encryption: encryption.to_string(),
            }),
            Err(err) => {
                logging::log_row_rejection(line, &err);
                report.dropped_malformed += 1;
                report.rejections.push(err);
            }
        }
    }

    logging::info(
        logging::Stage::Load,
        None,
        &format!(
            "Loaded {} valid rows of {} ({} missing values, {} malformed)",
            report.observations.len(),
            report.total_rows,
            report.dropped_missing,
            report.dropped_malformed
        ),
    );

    Ok(report)
}

// ============================================================================
// Field Helpers
// ============================================================================

/// Drops the first `count` lines of `text`.
fn skip_preamble(text: &str, count: usize) -> &str {
    let mut rest = text;
    for _ in 0..count {
        match rest.find('\n') {
            Some(idx) => rest = &rest[idx + 1..],
            None => return "",
        }
    }
    rest
}

/// Returns the trimmed field, or `None` when it is absent or blank.
fn field(record: &StringRecord, idx: usize) -> Option<&str> {
    record.get(idx).map(str::trim).filter(|s| !s.is_empty())
}

/// Parses a coordinate in degrees. Non-finite values are rejected because
/// they cannot be placed on the map nor averaged into a center.
fn parse_coordinate(raw: &str, line: u64, column: &str) -> Result<f64, MapError> {
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(MapError::DataFormat {
            line,
            column: column.to_string(),
            value: raw.to_string(),
        }),
    }
}

// ============================================================================
// Tests
// ============================================================================
