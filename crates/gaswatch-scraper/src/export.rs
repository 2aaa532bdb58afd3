//! Snapshot CSV files.
//!
//! Every run writes `gas_<slug>_<YYYY-MM-DD>_<HH-MM>.csv` into the history
//! directory and overwrites `latest_<slug>.csv`. Files are written to a
//! temporary sibling and renamed into place, so readers never observe a
//! partial snapshot.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use gaswatch_core::StationRecord;

use crate::error::ExportError;

pub const CSV_HEADER: [&str; 9] = [
    "City", "Zip", "Station", "Address", "Base", "Net", "Discount", "Lat", "Long",
];

/// Timestamp part of a snapshot file name; sorts chronologically as text.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M";

#[must_use]
pub fn snapshot_file_name(slug: &str, at: NaiveDateTime) -> String {
    format!("gas_{slug}_{}.csv", at.format(TIMESTAMP_FORMAT))
}

#[must_use]
pub fn latest_file_name(slug: &str) -> String {
    format!("latest_{slug}.csv")
}

/// Where a run's files ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportPaths {
    pub history: PathBuf,
    pub latest: PathBuf,
}

/// Writes the history snapshot and the latest pointer for one run.
///
/// # Errors
///
/// Returns [`ExportError`] if a directory cannot be created or either file
/// cannot be written.
pub fn export_snapshot(
    records: &[StationRecord],
    slug: &str,
    history_dir: &Path,
    latest_dir: &Path,
    at: NaiveDateTime,
) -> Result<ExportPaths, ExportError> {
    for dir in [history_dir, latest_dir] {
        fs::create_dir_all(dir).map_err(|source| ExportError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let history = history_dir.join(snapshot_file_name(slug, at));
    write_csv(records, &history)?;
    let latest = latest_dir.join(latest_file_name(slug));
    write_csv(records, &latest)?;

    tracing::info!(
        records = records.len(),
        history = %history.display(),
        latest = %latest.display(),
        "snapshot written"
    );
    Ok(ExportPaths { history, latest })
}

/// Writes `records` to `path` through a temporary file in the same directory.
///
/// # Errors
///
/// Returns [`ExportError`] on any I/O or CSV failure; `path` is left
/// untouched in that case.
pub fn write_csv(records: &[StationRecord], path: &Path) -> Result<(), ExportError> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let io_err = |source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    };
    let csv_err = |source| ExportError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let tmp = tempfile::NamedTempFile::new_in(dir).map_err(io_err)?;
    let mut writer = csv::Writer::from_writer(tmp);
    writer.write_record(CSV_HEADER).map_err(csv_err)?;
    for record in records {
        writer.write_record(csv_row(record)).map_err(csv_err)?;
    }
    let tmp = writer
        .into_inner()
        .map_err(|e| io_err(e.into_error()))?;
    tmp.persist(path).map_err(|e| io_err(e.error))?;
    Ok(())
}

fn csv_row(record: &StationRecord) -> [String; 9] {
    [
        record.city.clone(),
        record.zip.clone(),
        record.station.clone(),
        record.address.clone(),
        format!("{:.2}", record.base_price),
        format!("{:.2}", record.net_price),
        record.discount_rule.clone(),
        record.latitude.map(|v| v.to_string()).unwrap_or_default(),
        record.longitude.map(|v| v.to_string()).unwrap_or_default(),
    ]
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use super::*;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(7, 5, 59)
            .unwrap()
    }

    fn record(station: &str, base: &str, discount: &str, rule: &str) -> StationRecord {
        StationRecord::new(
            "Severn".to_string(),
            "21144".to_string(),
            station.to_string(),
            "8 Ridge Road, 21144".to_string(),
            Decimal::from_str(base).unwrap(),
            Decimal::from_str(discount).unwrap(),
            rule.to_string(),
            None,
        )
    }

    #[test]
    fn file_names_follow_convention() {
        assert_eq!(
            snapshot_file_name("Long_Island_East_End", at()),
            "gas_Long_Island_East_End_2024-03-09_07-05.csv"
        );
        assert_eq!(latest_file_name("Custom_Radius_21144"), "latest_Custom_Radius_21144.csv");
    }

    #[test]
    fn writes_header_and_formatted_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let mut geocoded = record("Royal Farms", "3.29", "0.10", "Royal Farms");
        geocoded.latitude = Some(39.1);
        geocoded.longitude = Some(-76.7);
        let records = vec![geocoded, record("Wawa", "3.30", "0", "-")];

        write_csv(&records, &path).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines[0], "City,Zip,Station,Address,Base,Net,Discount,Lat,Long");
        assert_eq!(
            lines[1],
            "Severn,21144,Royal Farms,\"8 Ridge Road, 21144\",3.29,3.19,Royal Farms,39.1,-76.7"
        );
        assert_eq!(lines[2], "Severn,21144,Wawa,\"8 Ridge Road, 21144\",3.30,3.30,-,,");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn export_creates_history_and_latest() {
        let dir = tempfile::tempdir().unwrap();
        let history_dir = dir.path().join("history");
        let records = vec![record("Exxon", "3.49", "0.03", "Exxon")];

        let paths =
            export_snapshot(&records, "Severn_Test", &history_dir, dir.path(), at()).unwrap();

        assert_eq!(
            paths.history,
            history_dir.join("gas_Severn_Test_2024-03-09_07-05.csv")
        );
        assert_eq!(paths.latest, dir.path().join("latest_Severn_Test.csv"));
        assert_eq!(
            fs::read_to_string(&paths.history).unwrap(),
            fs::read_to_string(&paths.latest).unwrap()
        );
    }

    #[test]
    fn latest_is_overwritten_and_no_temp_files_remain() {
        let dir = tempfile::tempdir().unwrap();
        let history_dir = dir.path().join("history");

        export_snapshot(
            &[record("Exxon", "3.49", "0.03", "Exxon")],
            "Z",
            &history_dir,
            dir.path(),
            at(),
        )
        .unwrap();
        let later = at() + chrono::Duration::minutes(90);
        export_snapshot(
            &[record("Shell", "3.59", "0.05", "Shell")],
            "Z",
            &history_dir,
            dir.path(),
            later,
        )
        .unwrap();

        let latest = fs::read_to_string(dir.path().join("latest_Z.csv")).unwrap();
        assert!(latest.contains("Shell"));
        assert!(!latest.contains("Exxon"));

        let mut history: Vec<String> = fs::read_dir(&history_dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        history.sort();
        assert_eq!(
            history,
            vec!["gas_Z_2024-03-09_07-05.csv", "gas_Z_2024-03-09_08-35.csv"]
        );

        let stray: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|name| name != "history" && name != "latest_Z.csv")
            .collect();
        assert!(stray.is_empty(), "unexpected files: {stray:?}");
    }
}
