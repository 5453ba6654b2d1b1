use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use botdiags::config::ConfigLoader;
use botdiags::runner::run_smoke_tests;
use botdiags::transport::TransportMode;

/// Bot diagnostics smoke test runner.
#[derive(Parser, Debug)]
#[command(
    version,
    about = "Bot diagnostics smoke test runner",
    long_about = "Runs the fixed diagnostics smoke sequence against a DUT over the selected \
transport and writes live log, JSON and CSV artifacts to a session-scoped directory."
)]
struct Args {
    /// Transport mode.
    #[arg(long, value_enum)]
    mode: Option<TransportMode>,

    /// UUT identifier.
    #[arg(long)]
    uut: Option<String>,

    /// Root directory for artifacts.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Serial port path (line_serial / prompt_serial).
    #[arg(long)]
    port: Option<String>,

    /// Serial baud rate.
    #[arg(long)]
    baud: Option<u32>,

    /// Per-exchange timeout in seconds.
    #[arg(long)]
    timeout: Option<f64>,

    /// Prompt regular expression (prompt modes).
    #[arg(long)]
    prompt: Option<String>,

    /// SSH host, `host` or `host:port` (prompt_ssh).
    #[arg(long)]
    host: Option<String>,

    /// SSH user (prompt_ssh).
    #[arg(long)]
    user: Option<String>,

    /// SSH private key file (prompt_ssh).
    #[arg(long)]
    key: Option<PathBuf>,

    /// Explicit config file path (otherwise standard resolution).
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let loader = match &args.config {
        Some(path) => ConfigLoader::load_from(path)?,
        None => ConfigLoader::load()?,
    };
    let config = loader.into_config();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .init();

    let mut transport = config.transport;
    if let Some(mode) = args.mode {
        transport.mode = mode;
    }
    if args.port.is_some() {
        transport.port = args.port;
    }
    if let Some(baud) = args.baud {
        transport.baud = baud;
    }
    if let Some(timeout) = args.timeout {
        transport.timeout_ms = (timeout * 1000.0) as u64;
    }
    if let Some(prompt) = args.prompt {
        transport.prompt = prompt;
    }
    if args.host.is_some() {
        transport.host = args.host;
    }
    if args.user.is_some() {
        transport.user = args.user;
    }
    if args.key.is_some() {
        transport.key_file = args.key;
    }
    // The DUT password only ever comes from the environment.
    transport.password = std::env::var("DIAG_PASS").ok();

    let uut_id = args.uut.unwrap_or(config.runner.uut_id);
    let out_root = args.out.unwrap_or(config.runner.out_root);

    let outcome = run_smoke_tests(&transport, &uut_id, &out_root)?;
    println!(
        "Ran {} steps. All good? {}",
        outcome.report.records().len(),
        outcome.passed
    );
    println!("Artifacts: {}", outcome.out_dir.display());

    if !outcome.passed {
        std::process::exit(1);
    }
    Ok(())
}
