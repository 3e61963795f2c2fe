use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use emu::SessionConfig;
use emu::cache::CacheSize;
use tracing::warn;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

mod cases;
mod report;

use cases::Program;

#[derive(Parser, Debug)]
#[command(name = "armemu", version)]
#[command(about = "Runs the sample programs on the ARM emulator and compares them with native Rust")]
struct Args {
    /// Number of instruction cache slots, a power of two up to 1024
    #[arg(short, long, default_value_t = CacheSize::DEFAULT.get())]
    cache_size: u32,

    /// Instructions a single call may execute before it is considered non-terminating
    #[arg(long, default_value_t = SessionConfig::DEFAULT_MAX_INSTRUCTIONS)]
    max_instructions: u64,

    /// Print the results as JSON instead of text
    #[arg(long, action = ArgAction::SetTrue)]
    json: bool,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Run only this program
    #[arg(long, value_enum)]
    program: Option<Program>,
}

fn init_tracing(log_file: Option<&PathBuf>) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match log_file {
        Some(path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("creating log file {}", path.display()))?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(writer)
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(io::stderr)
                .init();
            Ok(None)
        }
    }
}

fn cache_size(requested: u32) -> CacheSize {
    CacheSize::new(requested).unwrap_or_else(|err| {
        warn!(%err, "using the default of {}", CacheSize::DEFAULT.get());
        CacheSize::DEFAULT
    })
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();
    let _guard = init_tracing(args.log_file.as_ref())?;

    let config = SessionConfig {
        cache_size: cache_size(args.cache_size),
        max_instructions: args.max_instructions,
        ..SessionConfig::default()
    };

    let programs = args
        .program
        .map_or_else(|| Program::ALL.to_vec(), |p| vec![p]);

    let reports: Vec<_> = programs
        .into_iter()
        .flat_map(Program::cases)
        .map(|case| case.run(&config))
        .collect();

    let mut out = io::stdout().lock();
    if args.json {
        report::write_json(&mut out, &reports).context("writing JSON report")?;
    } else {
        for case in &reports {
            report::write_case(&mut out, case).context("writing report")?;
        }
    }

    let failed = reports.iter().filter(|r| !r.passed()).count();
    if !args.json {
        writeln!(out)?;
        writeln!(out, "{} cases, {failed} failed", reports.len())?;
    }
    out.flush()?;

    if failed == 0 {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
