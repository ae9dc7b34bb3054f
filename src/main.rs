//! Main entry point for tabsync CLI

use clap::Parser;
use tabsync::cli::Cli;
use tabsync::commands::execute_command;
use tabsync::config::EngineConfig;

fn main() {
    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let cli = Cli::parse();

    if cli.verbose {
        log::set_max_level(log::LevelFilter::Debug);
    }

    let config = match EngineConfig::load_or_default(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = execute_command(cli.command, config) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
