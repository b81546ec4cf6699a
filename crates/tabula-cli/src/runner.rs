use clap::Parser;

use crate::table::{run_table_command, TableCommand};

#[derive(Parser)]
#[command(version, name = "tabula", about = "Manage tables on a remote SQL server")]
struct Cli {
    /// Log at debug level unless `RUST_LOG` is set
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: TableCommand,
}

pub fn main(args: Vec<String>) -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse_from(args);
    let log_filter = if cli.verbose { "debug" } else { "info" };
    run_table_command(cli.command, log_filter)
}
