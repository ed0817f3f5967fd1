mod buffer;
mod classifier;
mod cli;
mod config;
mod dumper;
mod error;
mod pattern;
mod process;
mod record;
mod signal;
mod supervisor;
mod trigger;

use clap::Parser;

use cli::Cli;
use config::Config;

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let code = match Config::from_cli(cli).and_then(supervisor::run) {
        Ok(()) => exitcode::OK,
        Err(e) => {
            tracing::error!("{e}");
            e.exit_code()
        }
    };
    std::process::exit(code);
}
