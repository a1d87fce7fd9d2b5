use clap::Parser;
use owo_colors::{OwoColorize, Style};
use scheduler_core::error::CoreError;
use scheduler_core::recurrence::{parse_date, resolve, RecurrenceError};
use scheduler_server::cli::{Cli, Commands, NextDateCommand};
use scheduler_server::config::Config;
use scheduler_server::{api, telemetry};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        handle_error(e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command.unwrap_or_default() {
        Commands::NextDate(command) => next_date(command),
        Commands::Serve(command) => {
            let mut config = Config::load(cli.config.as_deref())?;
            command.apply(&mut config);
            telemetry::init(&config.log_filter);
            config.validate()?;
            api::serve(config).await
        }
    }
}

fn next_date(command: NextDateCommand) -> anyhow::Result<()> {
    let now = parse_date(&command.now)
        .map_err(|_| RecurrenceError::InvalidDate(command.now.clone()))?;
    let next = resolve(now, &command.date, &command.repeat)?;
    println!("{}", next);
    Ok(())
}

fn handle_error(err: anyhow::Error) {
    let error_style = Style::new().red().bold();

    match err.downcast_ref::<CoreError>() {
        Some(CoreError::InvalidTimezone(tz)) => {
            eprintln!(
                "{} Unknown timezone {}; set `timezone` or TODO_TIMEZONE",
                "Error:".style(error_style),
                tz.yellow()
            );
        }
        Some(core_error) if core_error.is_storage_failure() => {
            let cause = std::error::Error::source(core_error)
                .map(|c| c.to_string())
                .unwrap_or_default();
            eprintln!("{} {}: {}", "Error:".style(error_style), core_error, cause);
        }
        _ => eprintln!("{} {:#}", "Error:".style(error_style), err),
    }
}
