use anyhow::Context;
use busctl::commands::{self, Cli};
use busctl::config;
use busctl::logger;
use busctl::output::Outcome;
use clap::Parser;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(1)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = match config::load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(config::ConfigError::Invalid(errors)) => {
            for error in &errors {
                eprintln!("{}\n", error.user_message());
            }
            anyhow::bail!("{} configuration value(s) out of range", errors.len());
        }
        Err(e) => return Err(e).context("Failed to load configuration"),
    };

    logger::setup_logger(config.logging()).context("Failed to initialize logger")?;

    let rendered = commands::run(&cli, &config).await?;
    match rendered.outcome {
        Outcome::Success => println!("{}", rendered.text),
        Outcome::NotFound => {
            if cli.json {
                println!("{}", rendered.text);
            } else {
                eprintln!("{}", rendered.text);
            }
        }
    }

    Ok(ExitCode::from(rendered.outcome.exit_code() as u8))
}
