//! Fixed smoke-test sequence.
//!
//! Runs the diagnostic vocabulary in order against one transport, validates
//! numeric readings against acceptance ranges, and records every step. A
//! failing step is logged and the sequence continues; only transport
//! construction can abort a run.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::checkers::check_numeric_str;
use crate::error::TransportResult;
use crate::report::TestReport;
use crate::transport::{Response, Status, Transport, TransportConfig};

/// Acceptance ranges for the numeric steps, in volts, celsius and amps.
const VOLTAGE_RANGE: (f64, f64) = (12.0, 13.0);
const TEMPERATURE_RANGE: (f64, f64) = (20.0, 40.0);
const CURRENT_RANGE: (f64, f64) = (0.5, 2.0);

/// Result of one smoke run.
#[derive(Debug)]
pub struct SmokeOutcome {
    pub report: TestReport,
    /// True iff every logged step is OK.
    pub passed: bool,
    /// Session-scoped directory holding live log and exported artifacts.
    pub out_dir: PathBuf,
}

/// Run the fixed smoke sequence against the configured transport.
///
/// Artifacts land under `out_root/<uut_id>/<session_id>/`, with `live.log`
/// streaming while the run is in progress.
pub fn run_smoke_tests(
    config: &TransportConfig,
    uut_id: &str,
    out_root: impl AsRef<Path>,
) -> TransportResult<SmokeOutcome> {
    let mut talker = Transport::connect(config)?;
    let mut report = TestReport::new(Some(uut_id));

    let out_dir = out_root.as_ref().join(uut_id).join(report.session_id());
    fs::create_dir_all(&out_dir)?;
    report.attach_live_log(out_dir.join("live.log"), true)?;
    info!(uut = uut_id, session = report.session_id(), "smoke run started");

    let resp = exec(&mut talker, "ping");
    log_plain(&mut report, "ping", resp);

    let resp = exec(&mut talker, "read_voltage");
    log_checked(&mut report, "read_voltage", resp, VOLTAGE_RANGE);

    let resp = exec(&mut talker, "read_temperature");
    log_checked(&mut report, "read_temperature", resp, TEMPERATURE_RANGE);

    let resp = exec(&mut talker, "read_current");
    log_checked(&mut report, "read_current", resp, CURRENT_RANGE);

    let resp = exec(&mut talker, "read_status");
    log_plain(&mut report, "read_status", resp);

    let resp = exec(&mut talker, "reset_device");
    log_plain(&mut report, "reset_device", resp);

    talker.close();
    report.export_artifacts(&out_dir, "report")?;

    let passed = report.records().iter().all(|r| r.status == Status::Ok);
    info!(uut = uut_id, passed, "smoke run finished");
    Ok(SmokeOutcome {
        report,
        passed,
        out_dir,
    })
}

/// Flatten transport errors into ERROR responses: per-step failures are
/// logged, never propagated.
fn exec(talker: &mut Transport, command: &str) -> Response {
    talker
        .send(command)
        .unwrap_or_else(|e| Response::error(e.to_string()))
}

/// Log a step that passes iff the transport said OK.
fn log_plain(report: &mut TestReport, name: &str, resp: Response) {
    if resp.is_ok() {
        report.log_result(name, Status::Ok, Some(resp.payload.as_str()), None, None);
    } else {
        report.log_result(name, Status::Error, None, Some(resp.payload.as_str()), None);
    }
}

/// Log a numeric step: pass iff the transport said OK and the payload parses
/// into the inclusive range.
fn log_checked(report: &mut TestReport, name: &str, resp: Response, (lo, hi): (f64, f64)) {
    if resp.is_ok() && check_numeric_str(&resp.payload, lo, hi) {
        report.log_result(name, Status::Ok, Some(resp.payload.as_str()), None, None);
    } else if resp.is_ok() {
        // Well-formed exchange, unacceptable reading.
        let annotated = format!("out-of-range: {}", resp.payload);
        report.log_result(name, Status::Error, None, Some(annotated.as_str()), None);
    } else {
        report.log_result(name, Status::Error, None, Some(resp.payload.as_str()), None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_checked_distinguishes_failure_kinds() {
        let mut report = TestReport::new(None);
        log_checked(&mut report, "read_voltage", Response::ok("11.0"), (12.0, 13.0));
        log_checked(
            &mut report,
            "read_voltage",
            Response::error("timeout/no response"),
            (12.0, 13.0),
        );
        log_checked(&mut report, "read_voltage", Response::ok("12.5"), (12.0, 13.0));

        let records = report.records();
        assert_eq!(records[0].error.as_deref(), Some("out-of-range: 11.0"));
        assert_eq!(records[1].error.as_deref(), Some("timeout/no response"));
        assert_eq!(records[2].output.as_deref(), Some("12.5"));
        assert_eq!(records[2].error, None);
    }

    #[test]
    fn test_log_checked_parse_failure_is_out_of_range() {
        let mut report = TestReport::new(None);
        log_checked(&mut report, "read_current", Response::ok("n/a"), (0.5, 2.0));
        assert_eq!(
            report.records()[0].error.as_deref(),
            Some("out-of-range: n/a")
        );
    }
}
