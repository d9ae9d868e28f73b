use anyhow::Result;
use clap::Parser;

use coach_learn::cli::Cli;
use coach_learn::config::ConfigService;
use coach_learn::error::classify_error;
use coach_learn::interrupt;
use coach_learn::service::LearnService;

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        let (code, message) = classify_error(&e);
        eprintln!("\n{message}");
        std::process::exit(code);
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn serialize_output(value: &impl serde::Serialize, pretty: bool) -> Result<String> {
    if pretty {
        Ok(serde_json::to_string_pretty(value)?)
    } else {
        Ok(serde_json::to_string(value)?)
    }
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

fn run(cli: Cli) -> Result<()> {
    if cli.init_config {
        let config_path = cli.config.unwrap_or_else(ConfigService::default_path);
        ConfigService::generate_at(&config_path)?;
        eprintln!("Configuration file created at: {}", config_path.display());
        return Ok(());
    }

    let config = ConfigService::load(cli.config.as_deref())?;
    coach_learn::logger::init(&config, cli.debug || config.debug)?;
    interrupt::install()?;

    let cwd = std::env::current_dir()?;
    let service = LearnService::from_config(config);
    let summary = service.learn(&cwd, &cli.filters)?;

    println!("{}", serialize_output(&summary, cli.pretty)?);
    Ok(())
}
