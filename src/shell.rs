//! Command-execution surface for an interactive diagnostics shell.
//!
//! [`DiagShell::execute_command`] is the boundary an input loop drives: it
//! handles the shell built-ins, falls through to the transport vocabulary,
//! and logs every executed command to the report. The line-editing loop
//! itself (prompting, history) lives outside this crate.

use crate::error::TransportResult;
use crate::report::TestReport;
use crate::transport::{Status, Transport, TransportConfig};

const TRANSPORT_COMMANDS: [&str; 6] = [
    "ping",
    "read_voltage",
    "read_temperature",
    "read_current",
    "read_status",
    "reset_device",
];

/// Shell session: one transport, one report, a running flag.
pub struct DiagShell {
    talker: Transport,
    report: TestReport,
    running: bool,
}

impl DiagShell {
    pub fn new(config: &TransportConfig, uut_id: Option<&str>) -> TransportResult<Self> {
        Ok(Self {
            talker: Transport::connect(config)?,
            report: TestReport::new(uut_id),
            running: true,
        })
    }

    /// Execute one input line.
    ///
    /// Built-ins are handled before transport commands. Every executed
    /// command is logged (help and exit acknowledgements included); unknown
    /// commands and blank lines are not.
    pub fn execute_command(&mut self, line: &str) -> (Status, String) {
        let mut parts = line.trim().split_whitespace();
        let Some(cmd) = parts.next() else {
            return (Status::Ok, String::new());
        };
        let args = parts.collect::<Vec<_>>().join(" ");

        let lowered = cmd.to_lowercase();
        let (status, output) = match lowered.as_str() {
            "set_uut" => self.cmd_set_uut(&args),
            "save" => self.cmd_save(&args),
            "help" => self.cmd_help(),
            "exit" | "quit" => self.cmd_exit(),
            name if TRANSPORT_COMMANDS.contains(&name) => match self.talker.send(name) {
                Ok(resp) => (resp.status, resp.payload),
                Err(e) => (Status::Error, e.to_string()),
            },
            _ => return (Status::Error, format!("unknown command: {cmd}")),
        };

        let output_ref = output.as_str();
        self.report.log_result(
            cmd,
            status,
            if status.is_ok() { Some(output_ref) } else { None },
            if status.is_ok() { None } else { Some(output_ref) },
            None,
        );
        (status, output)
    }

    fn cmd_help(&self) -> (Status, String) {
        let mut commands: Vec<&str> = TRANSPORT_COMMANDS.to_vec();
        commands.extend(["set_uut", "save", "help", "exit", "quit"]);
        commands.sort_unstable();
        (
            Status::Ok,
            format!(
                "commands: {}\n  set_uut <ID>  | save <dir>",
                commands.join(", ")
            ),
        )
    }

    fn cmd_exit(&mut self) -> (Status, String) {
        self.running = false;
        (Status::Ok, "bye".to_string())
    }

    fn cmd_set_uut(&mut self, args: &str) -> (Status, String) {
        let uut = args.trim();
        if uut.is_empty() {
            return (Status::Error, "usage: set_uut <UUT_ID>".to_string());
        }
        self.report.set_meta(Some(uut), None);
        (Status::Ok, format!("uut_id set to {uut}"))
    }

    fn cmd_save(&mut self, args: &str) -> (Status, String) {
        let directory = if args.trim().is_empty() {
            "./results"
        } else {
            args.trim()
        };
        let subdir = std::path::Path::new(directory)
            .join(self.report.uut_id().unwrap_or("UUT-UNKNOWN"))
            .join(self.report.session_id());
        match self.report.export_artifacts(&subdir, "report") {
            Ok(()) => (
                Status::Ok,
                format!("saved JSON/CSV to {}", subdir.display()),
            ),
            Err(e) => (Status::Error, format!("save failed: {e}")),
        }
    }

    /// False once `exit`/`quit` has been executed.
    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn report(&self) -> &TestReport {
        &self.report
    }

    /// Release the transport. Idempotent.
    pub fn close(&mut self) {
        self.talker.close();
    }
}
