use super::super::args::*;
use crate::exit_codes::EXIT_SUCCESS;

pub fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    match cli.cmd {
        Command::Trend(args) => super::trend::run(args),
        Command::Projects(args) => super::projects::run(args),
        Command::Summary(args) => super::summary::run(args),
        Command::TopFailed(args) => super::trend::run_top_failed(args),
        Command::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(EXIT_SUCCESS)
        }
    }
}
