mod cli;
mod config;
mod plugin;

use std::path::Path;

use crate::cli::ConfigCommand;
use crate::plugin::{read_note, zero_based, Plugin};
use clap::Parser;
use color_eyre::Result;
use hamster_notes_core::timer::{self, CommandError, TimerCommands};
use hamster_notes_dbus::DbusConnector;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Entry point wiring the CLI to the Hamster session-bus connector.
#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();

    let cli = cli::Cli::parse();
    let config = config::load()?;
    match cli.command {
        cli::Command::Start {
            file,
            line,
            dry_run: true,
        } => preview(&file, line).await?,
        cli::Command::Start { file, line, .. } => {
            let document = read_note(&file).await?;
            let mut plugin = load_plugin(config).await;
            let outcome = plugin.start_timer(&document, line).await;
            plugin.unload();
            let started = outcome.unwrap_or_else(|err| notify_and_exit(&err));
            println!("Started: {}", started.description);
        }
        cli::Command::Stop => {
            let mut plugin = load_plugin(config).await;
            let outcome = plugin.stop_timer().await;
            plugin.unload();
            outcome.unwrap_or_else(|err| notify_and_exit(&err));
            println!("Stopped tracking");
        }
        cli::Command::Health => run_health_check(config).await,
        cli::Command::Version => print_version(),
        cli::Command::Config(cmd) => handle_config(cmd, config)?,
    }

    Ok(())
}

fn init_tracing() {
    // Respect user-provided filters, default to info to avoid noisy stdout.
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

fn print_version() {
    println!("hamster-notes {}", env!("CARGO_PKG_VERSION"));
}

async fn load_plugin(config: config::Config) -> Plugin<DbusConnector> {
    let connector = DbusConnector::new(config.tracker.clone());
    Plugin::load(config, connector).await
}

/// Show a command failure to the user and end the process.
fn notify_and_exit(err: &CommandError) -> ! {
    eprintln!("{err}");
    std::process::exit(1);
}

async fn preview(file: &Path, line: u32) -> Result<()> {
    let document = read_note(file).await?;
    let fact =
        timer::preview(&document, zero_based(line)).unwrap_or_else(|err| notify_and_exit(&err));
    println!("{fact}");
    Ok(())
}

/// Reports whether the daemon answered on the session bus.
async fn run_health_check(config: config::Config) {
    let mut timer = TimerCommands::new(DbusConnector::new(config.tracker));
    match timer.connect().await {
        Ok(()) => println!("Hamster: ok"),
        Err(err) => notify_and_exit(&err),
    }
}

fn handle_config(cmd: ConfigCommand, mut config: config::Config) -> Result<()> {
    match cmd {
        ConfigCommand::Init => {
            let path = config::write_default_if_missing(&config)?;
            println!("Config initialized at {}", path.display());
        }
        ConfigCommand::Show => {
            print!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigCommand::Set { value } => {
            config.my_setting = value;
            let path = config::save(&config)?;
            println!("Saved setting to {}", path.display());
        }
    }
    Ok(())
}
