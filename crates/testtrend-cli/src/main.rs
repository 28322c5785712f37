use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
pub mod exit_codes;

use cli::args::Cli;
use cli::commands::dispatch;

fn main() {
    // stdout carries the dataset; logs go to stderr
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let code = match dispatch(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("fatal: {e:?}");
            exit_codes::for_error(&e)
        }
    };
    std::process::exit(code);
}
