mod commands;
mod terminal;

use commands::{CommandLine, Commands, resolve, scan};
use sonde_common::config::Config;
use terminal::{logging, print};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let commands = CommandLine::parse_args();

    logging::init_logging(commands.quiet);

    match commands.command {
        Commands::Scan(args) => {
            let cfg: Config = args.to_config(commands.quiet);
            cfg.validate()?;
            print::header("starting scanner", cfg.quiet);
            scan::scan(args, &cfg).await
        }
        Commands::Resolve { target, limit } => {
            print::header("resolving target", commands.quiet);
            resolve::resolve(target, limit).await
        }
    }
}
