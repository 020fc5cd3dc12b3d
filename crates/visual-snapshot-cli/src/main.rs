//! vsnap CLI
//!
//! ```bash
//! vsnap compare -s shot.png --test-file tests/login.rs --test-name 'test_login[chromium]' --tab main
//! vsnap compare ... --update-snapshots         # overwrite the baseline
//! vsnap diff before.png after.png --out d.png  # direct comparison
//! ```

use clap::Parser;
use std::process::ExitCode;
use visual_snapshot_cli::{
    handlers, logging, Cli, CliConfig, CliResult, ColorChoice, Commands, FileConfig, Reporter,
    Verbosity,
};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    let config = build_config(&cli)?;
    logging::init_tracing(&config);

    let reporter = Reporter::new(config.color.should_color(), config.verbosity.is_quiet());
    match &cli.command {
        Commands::Compare(args) => handlers::run_compare(&config, args, &reporter),
        Commands::Diff(args) => handlers::run_diff(&config, args, &reporter),
    }
}

fn build_config(cli: &Cli) -> CliResult<CliConfig> {
    let verbosity = if cli.quiet {
        Verbosity::Quiet
    } else {
        match cli.verbose {
            0 => Verbosity::Normal,
            1 => Verbosity::Verbose,
            _ => Verbosity::Debug,
        }
    };

    let color: ColorChoice = cli.color.clone().into();
    let file = cli
        .config
        .as_deref()
        .map(FileConfig::load)
        .transpose()?
        .unwrap_or_default();

    Ok(CliConfig::new()
        .with_verbosity(verbosity)
        .with_color(color)
        .with_log_json(cli.log_json)
        .with_file(file))
}
