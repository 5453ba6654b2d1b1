//! Test run reporting.
//!
//! [`TestReport`] is an append-only, timestamped record of every executed
//! step. Records can stream to a live log file as they happen (tail -f
//! friendly) and the full sequence can be exported any number of times as
//! JSON plus CSV without disturbing the live log.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::transport::Status;

/// Timestamp format for individual records.
const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format for default (start-time-derived) session identifiers.
const SESSION_ID_FORMAT: &str = "%Y%m%d-%H%M%S";

/// Prefix applied to caller metadata keys to keep them clear of core fields.
const META_PREFIX: &str = "meta_";

/// Core record fields, in export column order.
const CORE_FIELDS: [&str; 7] = [
    "ts",
    "session_id",
    "uut_id",
    "name",
    "status",
    "output",
    "error",
];

/// One executed step. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRecord {
    pub ts: String,
    pub session_id: String,
    pub uut_id: Option<String>,
    pub name: String,
    pub status: Status,
    pub output: Option<String>,
    pub error: Option<String>,
    /// `meta_<key>` extensions, flattened into the record on export.
    #[serde(flatten)]
    pub meta: BTreeMap<String, serde_json::Value>,
}

/// Append-only log of test steps for one run.
///
/// Insertion order is chronological order and is the authoritative step
/// sequence for audit.
#[derive(Debug)]
pub struct TestReport {
    records: Vec<ReportRecord>,
    uut_id: Option<String>,
    session_id: String,
    live_log_path: Option<PathBuf>,
}

impl TestReport {
    /// Create an empty report with a start-time-derived session id.
    pub fn new(uut_id: Option<&str>) -> Self {
        Self {
            records: Vec::new(),
            uut_id: uut_id.map(str::to_string),
            session_id: chrono::Local::now().format(SESSION_ID_FORMAT).to_string(),
            live_log_path: None,
        }
    }

    pub fn records(&self) -> &[ReportRecord] {
        &self.records
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn uut_id(&self) -> Option<&str> {
        self.uut_id.as_deref()
    }

    /// Update identifiers in place; callable before or during a run.
    pub fn set_meta(&mut self, uut_id: Option<&str>, session_id: Option<&str>) {
        if let Some(uut_id) = uut_id {
            self.uut_id = Some(uut_id.to_string());
        }
        if let Some(session_id) = session_id {
            self.session_id = session_id.to_string();
        }
    }

    /// Stream every subsequent record to `path` as one JSON line each.
    ///
    /// Creates parent directories as needed and opens the file in append
    /// mode, so distinct runs writing to distinct paths never interleave.
    pub fn attach_live_log(&mut self, path: impl AsRef<Path>, header: bool) -> io::Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        if header {
            let mut f = OpenOptions::new().create(true).append(true).open(path)?;
            writeln!(
                f,
                "# live log session={} uut={}",
                self.session_id,
                self.uut_id.as_deref().unwrap_or("-")
            )?;
        }
        self.live_log_path = Some(path.to_path_buf());
        Ok(())
    }

    /// Append one step.
    ///
    /// Metadata keys are namespaced with `meta_`. Live-log write failures
    /// are logged and swallowed; appending itself never fails.
    pub fn log_result(
        &mut self,
        name: &str,
        status: Status,
        output: Option<&str>,
        error: Option<&str>,
        meta: Option<BTreeMap<String, serde_json::Value>>,
    ) {
        let mut namespaced = BTreeMap::new();
        if let Some(meta) = meta {
            for (key, value) in meta {
                namespaced.insert(format!("{META_PREFIX}{key}"), value);
            }
        }
        let record = ReportRecord {
            ts: chrono::Local::now().format(TS_FORMAT).to_string(),
            session_id: self.session_id.clone(),
            uut_id: self.uut_id.clone(),
            name: name.to_string(),
            status,
            output: output.map(str::to_string),
            error: error.map(str::to_string),
            meta: namespaced,
        };
        self.append_live_line(&record);
        self.records.push(record);
    }

    fn append_live_line(&self, record: &ReportRecord) {
        let Some(path) = self.live_log_path.as_ref() else {
            return;
        };
        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .and_then(|mut f| match serde_json::to_string(record) {
                Ok(line) => writeln!(f, "{line}"),
                Err(e) => Err(io::Error::new(io::ErrorKind::InvalidData, e)),
            });
        if let Err(e) = result {
            warn!(path = %path.display(), error = %e, "live log append failed");
        }
    }

    /// Write the full record sequence as a pretty JSON array.
    ///
    /// An empty report still writes an empty array.
    pub fn to_json(&self, path: impl AsRef<Path>) -> io::Result<()> {
        let path = path.as_ref();
        ensure_parent(path)?;
        let f = File::create(path)?;
        serde_json::to_writer_pretty(f, &self.records)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    /// Write the record sequence as CSV.
    ///
    /// The header row is the key set of the first record; an empty report
    /// writes nothing at all.
    pub fn to_csv(&self, path: impl AsRef<Path>) -> io::Result<()> {
        let Some(first) = self.records.first() else {
            return Ok(());
        };
        let path = path.as_ref();
        ensure_parent(path)?;

        let meta_keys: Vec<&str> = first.meta.keys().map(String::as_str).collect();
        let mut writer = csv::Writer::from_path(path).map_err(csv_to_io)?;
        writer
            .write_record(CORE_FIELDS.iter().copied().chain(meta_keys.iter().copied()))
            .map_err(csv_to_io)?;

        for record in &self.records {
            let mut row: Vec<String> = vec![
                record.ts.clone(),
                record.session_id.clone(),
                record.uut_id.clone().unwrap_or_default(),
                record.name.clone(),
                record.status.to_string(),
                record.output.clone().unwrap_or_default(),
                record.error.clone().unwrap_or_default(),
            ];
            for key in &meta_keys {
                row.push(match record.meta.get(*key) {
                    Some(serde_json::Value::String(s)) => s.clone(),
                    Some(value) => value.to_string(),
                    None => String::new(),
                });
            }
            writer.write_record(&row).map_err(csv_to_io)?;
        }
        writer.flush()
    }

    /// Write `<basename>.json` and `<basename>.csv` under `directory`.
    ///
    /// Creates the directory if absent. Callable repeatedly, e.g. for
    /// mid-run snapshots; the live log is untouched.
    pub fn export_artifacts(&self, directory: impl AsRef<Path>, basename: &str) -> io::Result<()> {
        let directory = directory.as_ref();
        fs::create_dir_all(directory)?;
        self.to_json(directory.join(format!("{basename}.json")))?;
        self.to_csv(directory.join(format!("{basename}.csv")))?;
        debug!(
            dir = %directory.display(),
            records = self.records.len(),
            "artifacts exported"
        );
        Ok(())
    }
}

fn ensure_parent(path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

fn csv_to_io(e: csv::Error) -> io::Error {
    io::Error::new(io::ErrorKind::Other, e)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_report() -> TestReport {
        let mut report = TestReport::new(Some("UUT-XYZ"));
        report.set_meta(None, Some("S1"));
        report.log_result("ping", Status::Ok, Some("pong"), None, None);
        report.log_result("read_voltage", Status::Error, None, Some("timeout"), None);
        report
    }

    #[test]
    fn test_session_id_defaults_to_timestamp_shape() {
        let report = TestReport::new(None);
        // e.g. 20260806-142501
        assert_eq!(report.session_id().len(), 15);
        assert!(report.session_id().chars().nth(8) == Some('-'));
    }

    #[test]
    fn test_set_meta_updates_in_place() {
        let mut report = TestReport::new(None);
        report.set_meta(Some("UUT-9"), Some("S-OVERRIDE"));
        assert_eq!(report.uut_id(), Some("UUT-9"));
        assert_eq!(report.session_id(), "S-OVERRIDE");
        // None leaves existing values alone
        report.set_meta(None, None);
        assert_eq!(report.uut_id(), Some("UUT-9"));
    }

    #[test]
    fn test_records_append_in_order() {
        let report = sample_report();
        let names: Vec<&str> = report.records().iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["ping", "read_voltage"]);
        assert_eq!(report.records()[0].uut_id.as_deref(), Some("UUT-XYZ"));
    }

    #[test]
    fn test_meta_keys_are_namespaced() {
        let mut report = TestReport::new(None);
        let mut meta = BTreeMap::new();
        meta.insert("fixture".to_string(), serde_json::json!("bench-3"));
        report.log_result("ping", Status::Ok, Some("pong"), None, Some(meta));

        let record = &report.records()[0];
        assert!(record.meta.contains_key("meta_fixture"));
        let json = serde_json::to_value(record).unwrap();
        assert_eq!(json["meta_fixture"], "bench-3");
    }

    #[test]
    fn test_export_artifacts_json_and_csv() {
        let dir = tempfile::tempdir().unwrap();
        let report = sample_report();
        report.export_artifacts(dir.path().join("artifacts"), "run").unwrap();

        let json = fs::read_to_string(dir.path().join("artifacts/run.json")).unwrap();
        let data: Vec<ReportRecord> = serde_json::from_str(&json).unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data[0].uut_id.as_deref(), Some("UUT-XYZ"));
        assert_eq!(data[1].error.as_deref(), Some("timeout"));

        let csv_text = fs::read_to_string(dir.path().join("artifacts/run.csv")).unwrap();
        let lines: Vec<&str> = csv_text.lines().collect();
        assert_eq!(lines.len(), 3, "header plus one row per record");
        assert_eq!(lines[0], "ts,session_id,uut_id,name,status,output,error");
        assert!(lines[1].contains("ping") && lines[1].contains("OK"));
        assert!(lines[2].contains("read_voltage") && lines[2].contains("ERROR"));
    }

    #[test]
    fn test_empty_report_exports() {
        let dir = tempfile::tempdir().unwrap();
        let report = TestReport::new(None);
        report.export_artifacts(dir.path(), "report").unwrap();

        let json = fs::read_to_string(dir.path().join("report.json")).unwrap();
        assert_eq!(json.trim(), "[]");
        assert!(!dir.path().join("report.csv").exists(), "csv export is a no-op");
    }

    #[test]
    fn test_export_is_repeatable() {
        let dir = tempfile::tempdir().unwrap();
        let mut report = sample_report();
        report.export_artifacts(dir.path(), "report").unwrap();
        report.log_result("read_status", Status::Ok, Some("uptime=1.0s"), None, None);
        report.export_artifacts(dir.path(), "report").unwrap();

        let json = fs::read_to_string(dir.path().join("report.json")).unwrap();
        let data: Vec<ReportRecord> = serde_json::from_str(&json).unwrap();
        assert_eq!(data.len(), 3);
    }

    #[test]
    fn test_live_log_streams_one_line_per_step() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs/live.log");

        let mut report = TestReport::new(Some("UUT-7"));
        report.set_meta(None, Some("S2"));
        report.attach_live_log(&path, true).unwrap();
        report.log_result("ping", Status::Ok, Some("pong"), None, None);
        report.log_result("reset_device", Status::Ok, Some("reset"), None, None);

        let text = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "# live log session=S2 uut=UUT-7");
        let first: ReportRecord = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(first.name, "ping");
        assert_eq!(first.status, Status::Ok);
    }

    #[test]
    fn test_live_log_without_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("live.log");

        let mut report = TestReport::new(None);
        report.attach_live_log(&path, false).unwrap();
        report.log_result("ping", Status::Ok, Some("pong"), None, None);

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert!(!text.starts_with('#'));
    }

    #[test]
    fn test_roundtrip_uut_id_through_export() {
        let dir = tempfile::tempdir().unwrap();
        let mut report = TestReport::new(None);
        report.set_meta(Some("UUT-ROUNDTRIP"), None);
        report.log_result("ping", Status::Ok, Some("pong"), None, None);
        report.export_artifacts(dir.path(), "report").unwrap();

        let json = fs::read_to_string(dir.path().join("report.json")).unwrap();
        let data: Vec<ReportRecord> = serde_json::from_str(&json).unwrap();
        assert_eq!(data[0].uut_id.as_deref(), Some("UUT-ROUNDTRIP"));
    }

    #[test]
    fn test_csv_includes_meta_columns_of_first_record() {
        let dir = tempfile::tempdir().unwrap();
        let mut report = TestReport::new(None);
        let mut meta = BTreeMap::new();
        meta.insert("slot".to_string(), serde_json::json!(3));
        report.log_result("ping", Status::Ok, Some("pong"), None, Some(meta));
        report.to_csv(dir.path().join("run.csv")).unwrap();

        let text = fs::read_to_string(dir.path().join("run.csv")).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "ts,session_id,uut_id,name,status,output,error,meta_slot"
        );
        assert!(lines.next().unwrap().ends_with(",3"));
    }
}
