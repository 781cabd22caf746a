mod cmd_run;
mod cmd_sources;
mod config;
mod logging;

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

use crate::config::{FileConfig, Overrides};

#[derive(Parser)]
#[command(
    name = "closeout",
    version,
    about = "Weekly closed-issue reports across tracked projects"
)]
struct Cli {
    /// Config file (YAML). Defaults to ./closeout.yaml when present.
    #[arg(long, global = true, env = "CLOSEOUT_CONFIG")]
    config: Option<PathBuf>,
    /// More log output on stderr (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch closed issues, filter to the window and write the report
    Run {
        #[command(flatten)]
        overrides: Overrides,
        /// Print the report instead of writing the output file
        #[arg(long)]
        stdout: bool,
    },
    /// Show which issue source a run would use and why others were skipped
    Sources {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let file = FileConfig::discover(cli.config.as_deref())?;
    match cli.cmd {
        Command::Run { overrides, stdout } => {
            let settings = file.into_settings(&overrides)?;
            cmd_run::execute(&settings, stdout)
        }
        Command::Sources { json } => cmd_sources::execute(&file, json),
    }
}

/// Single-threaded runtime; projects are fetched one at a time anyway.
pub(crate) fn runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}
