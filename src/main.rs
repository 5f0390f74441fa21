//! visaprep: data preparation CLI for visa approval models

use anyhow::Result;
use clap::Parser;
use console::style;

use visaprep::cli::{commands, Cli, Commands};
use visaprep::utils::init_logging;

fn main() {
    if let Err(err) = run() {
        eprintln!();
        eprintln!("    {} {}", style("✗").red().bold(), style(&err).red().bold());
        for cause in err.chain().skip(1) {
            eprintln!("      {} {}", style("caused by:").dim(), cause);
        }
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let log_dir = (!cli.no_log_file).then_some(cli.log_dir.as_path());
    let _guard = init_logging(cli.verbose, log_dir)?;

    match &cli.command {
        Commands::Run(args) => commands::run_pipeline(args),
        Commands::CheckSchema { schema } => commands::check_schema(schema),
        Commands::Inspect { path } => commands::inspect(path),
    }
}
