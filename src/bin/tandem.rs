//! Tandem command line runner (feature-gated).

use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tandem::observability::{LogLevel, init_logging};
use tandem::{Error, ModelConfig, Orchestrator, RunReport};

/// Process exit codes.
struct ExitCode;

impl ExitCode {
    const SUCCESS: i32 = 0;
    const USER_ERROR: i32 = 1;
    const RUNTIME_ERROR: i32 = 2;
    const ORACLE_VIOLATION: i32 = 11;
}

#[derive(Parser, Debug)]
#[command(
    name = "tandem",
    version,
    about = "Run the two-resource mutual exclusion model"
)]
struct Cli {
    /// TOML configuration file; flags override its values
    #[arg(long = "config")]
    config: Option<PathBuf>,

    /// Seed for simulated durations (random when omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// Number of workers
    #[arg(long)]
    workers: Option<usize>,

    /// Resources in each of the two pools
    #[arg(long = "resources")]
    resources: Option<usize>,

    /// Cycles each worker performs
    #[arg(long)]
    cycles: Option<u32>,

    /// Give up waiting for workers after this many seconds
    #[arg(long = "timeout-secs")]
    timeout_secs: Option<u64>,

    /// Log level when RUST_LOG is unset
    #[arg(long = "log-level", value_enum, default_value_t = LogLevel::Info)]
    log_level: LogLevel,

    /// Print the run report as JSON on stdout
    #[arg(long)]
    json: bool,

    /// Spawn the workers and exit without waiting for them
    #[arg(long)]
    detach: bool,
}

impl Cli {
    fn model_config(&self) -> Result<ModelConfig, Error> {
        let mut config = match &self.config {
            Some(path) => ModelConfig::from_file(path)?,
            None => ModelConfig::default(),
        };
        if let Some(seed) = self.seed {
            config = config.with_seed(seed);
        }
        if let Some(workers) = self.workers {
            config = config.with_workers(workers);
        }
        if let Some(resources) = self.resources {
            config = config.with_resources_per_kind(resources);
        }
        if let Some(cycles) = self.cycles {
            config = config.with_cycles(cycles);
        }
        Ok(config)
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_level);
    let mut stdout = io::stdout().lock();
    std::process::exit(run(&cli, &mut stdout));
}

fn run(cli: &Cli, out: &mut impl Write) -> i32 {
    let orchestrator = match cli.model_config().and_then(Orchestrator::new) {
        Ok(orchestrator) => orchestrator,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::USER_ERROR;
        }
    };

    let handle = match orchestrator.spawn() {
        Ok(handle) => handle,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::RUNTIME_ERROR;
        }
    };

    if cli.detach {
        let seed = handle.seed();
        handle.detach();
        return match writeln!(out, "seed {seed}") {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => {
                eprintln!("error: failed to write output: {err}");
                ExitCode::RUNTIME_ERROR
            }
        };
    }

    let joined = match cli.timeout_secs {
        Some(secs) => handle.join_timeout(Duration::from_secs(secs)),
        None => handle.join(),
    };
    let report = match joined {
        Ok(report) => report,
        Err(err) => {
            eprintln!("error: {err}");
            return ExitCode::RUNTIME_ERROR;
        }
    };

    if let Err(err) = write_report(&report, cli.json, out) {
        eprintln!("error: failed to write report: {err}");
        return ExitCode::RUNTIME_ERROR;
    }
    verdict(&report)
}

fn write_report(report: &RunReport, json: bool, out: &mut impl Write) -> io::Result<()> {
    if json {
        serde_json::to_writer_pretty(&mut *out, report)?;
        return writeln!(out);
    }

    writeln!(
        out,
        "seed {} | {} workers | {} cycles each | {:?}",
        report.seed,
        report.workers.len(),
        report.cycles,
        report.elapsed
    )?;
    for worker in &report.workers {
        writeln!(
            out,
            "  {:<4} {}+{}  cycles {:>3}  contended {:>3}  waited {:?}",
            worker.id.to_string(),
            worker.resource_a,
            worker.resource_b,
            worker.cycles_completed,
            worker.contended_acquisitions,
            worker.total_wait
        )?;
    }
    for resource in &report.resources {
        writeln!(
            out,
            "  {:<4} acquired {:>3}  contended {:>3}",
            resource.id.to_string(),
            resource.acquisitions,
            resource.contended_acquisitions
        )?;
    }
    writeln!(out, "  {} events traced", report.trace.len())
}

/// Exit code for a finished run: success, or an oracle violation.
fn verdict(report: &RunReport) -> i32 {
    match report.verify() {
        Ok(()) => ExitCode::SUCCESS,
        Err(violations) => {
            for violation in &violations {
                eprintln!("violation: {violation}");
            }
            ExitCode::ORACLE_VIOLATION
        }
    }
}
