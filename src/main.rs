use clap::Parser;
use std::process::ExitCode;
use tradelens::cli::{init_tracing, run, Cli};

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = init_tracing(&cli.log_level) {
        eprintln!("error: {e}");
        return ExitCode::from(2);
    }
    run(cli)
}
