/// End-to-end map generation.
///
/// One synchronous pass: load, group, center, render, write. Every step
/// that can reject the input runs before the output file is touched, so a
/// failed run leaves any previous page in place.

use crate::analysis::center::compute_center;
use crate::analysis::grouping::group_by_encryption;
use crate::config::Config;
use crate::ingest::csv_loader::load_observations;
use crate::logging::{self, Stage};
use crate::model::{MapCenter, MapError};
use crate::render::page::{render_page, write_page};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;

/// What a successful run produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub generated_at: DateTime<Utc>,
    pub output_path: PathBuf,
    /// Data rows in the input.
    pub total_rows: usize,
    /// Rows with all three fields present and parseable.
    pub valid_rows: usize,
    /// Valid rows that landed in a bucket.
    pub classified_rows: usize,
    /// Valid rows whose encryption value matched no bucket.
    pub unclassified_rows: usize,
    pub dropped_missing: usize,
    pub dropped_malformed: usize,
    /// Marker count per bucket label, in menu order.
    pub bucket_counts: Vec<(String, usize)>,
    pub center: MapCenter,
}

/// Generates the map page described by `config`.
pub fn generate_map(config: &Config) -> Result<RunSummary, MapError> {
    let input = config.input_path.display().to_string();
    logging::info(Stage::Load, Some(&input), "Reading survey file");

    let report = load_observations(&config.input_path, &config.loader_options())?;

    let grouped = group_by_encryption(&report.observations);
    for (class, count) in grouped.counts() {
        logging::debug(Stage::Group, Some(class.label()), &format!("{} markers", count));
    }
    if grouped.unclassified() > 0 {
        logging::warn(
            Stage::Group,
            None,
            &format!(
                "{} rows excluded: encryption value matched no known type",
                grouped.unclassified()
            ),
        );
    }

    let center = compute_center(&grouped)?;
    logging::info(
        Stage::Center,
        None,
        &format!("Map center at ({:.6}, {:.6})", center.latitude, center.longitude),
    );

    let html = render_page(&grouped, &center, &config.page_options())?;
    write_page(&config.output_path, &html)?;
    logging::info(
        Stage::Render,
        Some(&config.output_path.display().to_string()),
        &format!("Wrote {} bytes", html.len()),
    );

    let summary = RunSummary {
        generated_at: Utc::now(),
        output_path: config.output_path.clone(),
        total_rows: report.total_rows,
        valid_rows: report.observations.len(),
        classified_rows: grouped.classified_count(),
        unclassified_rows: grouped.unclassified(),
        dropped_missing: report.dropped_missing,
        dropped_malformed: report.dropped_malformed,
        bucket_counts: grouped
            .counts()
            .into_iter()
            .map(|(class, n)| (class.label().to_string(), n))
            .collect(),
        center,
    };

    logging::log_run_summary(
        summary.valid_rows,
        summary.classified_rows,
        summary.dropped_missing + summary.dropped_malformed,
    );

    // The page is already in place; a summary failure must not fail the run.
    if let Some(path) = &config.summary_path {
        if let Err(e) = write_summary(path, &summary) {
            logging::warn(
                Stage::System,
                Some(&path.display().to_string()),
                &format!("run summary not written: {}", e),
            );
        }
    }

    Ok(summary)
}

/// Writes the run summary as pretty-printed JSON.
pub fn write_summary(path: &std::path::Path, summary: &RunSummary) -> Result<(), MapError> {
    let json =
        serde_json::to_string_pretty(summary).map_err(|e| MapError::Render(e.to_string()))?;
    std::fs::write(path, json)
        .map_err(|e| MapError::Io(format!("cannot write {}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn config_in(dir: &std::path::Path, csv: &str) -> Config {
        let input = dir.join("wifi_data.csv");
        fs::write(&input, csv).unwrap();
        Config {
            input_path: input,
            output_path: dir.join("map.html"),
            api_key: "test-key".to_string(),
            ..Config::default()
        }
    }

    #[test]
    fn test_summary_counts_are_consistent() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(
            dir.path(),
            "CurrentLatitude,CurrentLongitude,Encryption\n\
             1.0,1.0,none\n\
             2.0,2.0,wpa2\n\
             3.0,3.0,WPA2\n\
             4.0,4.0,wpa3\n\
             ,5.0,wep\n\
             x,6.0,wep\n",
        );

        let summary = generate_map(&config).unwrap();

        assert_eq!(summary.total_rows, 6);
        assert_eq!(summary.valid_rows, 4);
        assert_eq!(summary.classified_rows, 3);
        assert_eq!(summary.unclassified_rows, 1);
        assert_eq!(summary.dropped_missing, 1);
        assert_eq!(summary.dropped_malformed, 1);
        let bucket_total: usize = summary.bucket_counts.iter().map(|(_, n)| n).sum();
        assert_eq!(bucket_total, summary.classified_rows);
        assert_eq!(summary.valid_rows - summary.classified_rows, summary.unclassified_rows);
        assert_eq!(summary.bucket_counts[3], ("WPA2".to_string(), 2));
        assert_eq!(summary.center, MapCenter { latitude: 2.0, longitude: 2.0 });
    }

    #[test]
    fn test_summary_file_is_written_when_configured() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(
            dir.path(),
            "CurrentLatitude,CurrentLongitude,Encryption\n1.0,2.0,wep\n",
        );
        config.summary_path = Some(dir.path().join("summary.json"));

        generate_map(&config).unwrap();

        let written = fs::read_to_string(dir.path().join("summary.json")).unwrap();
        let json: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(json["classified_rows"], 1);
        assert_eq!(json["center"]["latitude"], 1.0);
        assert_eq!(json["bucket_counts"][1][0], "WEP");
    }

    #[test]
    fn test_summary_write_failure_keeps_successful_run() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_in(
            dir.path(),
            "CurrentLatitude,CurrentLongitude,Encryption\n1.0,2.0,wep\n",
        );
        config.summary_path = Some(dir.path().join("missing-dir").join("summary.json"));

        let summary = generate_map(&config).expect("page written, run should succeed");

        assert_eq!(summary.classified_rows, 1);
        assert!(config.output_path.exists());
        assert!(!dir.path().join("missing-dir").exists());
    }

    #[test]
    fn test_no_data_leaves_existing_output_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(
            dir.path(),
            "CurrentLatitude,CurrentLongitude,Encryption\n1.0,2.0,wpa2-personal\n",
        );
        fs::write(&config.output_path, "previous page").unwrap();

        assert_eq!(generate_map(&config), Err(MapError::NoData));
        assert_eq!(fs::read_to_string(&config.output_path).unwrap(), "previous page");
    }
}
