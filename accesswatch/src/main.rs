use accesswatch_core::cli;
use accesswatch_core::logging::init_logging;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "accesswatch",
    version,
    about = "accesswatch: live HTTP access log statistics and traffic alerts"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Follow an access log and print stats and alerts
    Run(cli::run::RunArgs),

    /// Configuration tooling
    Config {
        #[command(subcommand)]
        cmd: cli::conf::ConfigCmd,
    },

    /// Append synthetic traffic to an access log
    Loadgen(cli::loadgen::LoadgenArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Run(args) => {
            let _guard = init_logging(args.log_format, args.log_file.as_deref())?;
            cli::run::run(args).await
        }

        Command::Config { cmd } => {
            init_logging(None, None)?;
            cli::conf::run(cmd)
        }

        Command::Loadgen(args) => {
            init_logging(None, None)?;
            cli::loadgen::run(args).await
        }
    }
}
