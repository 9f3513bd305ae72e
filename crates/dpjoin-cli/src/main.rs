//! dpjoin CLI - batch join-subset enumerator

mod cli;
mod driver;
mod extract;
mod output;

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::Args;

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(&args) {
        Ok(report) => {
            if report.stopped_early || (args.stop_on_error && report.has_errors()) {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(err) => {
            eprintln!("dpjoin: error: {err:#}");
            ExitCode::from(1)
        }
    }
}

fn run(args: &Args) -> anyhow::Result<driver::DriverReport> {
    driver::run(
        &args.input,
        &args.output,
        args.semicolon_separated,
        args.stop_on_error,
        args.max_level,
        args.dialect.into(),
        args.verbose,
    )
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
