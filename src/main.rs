use budget_tracker::args::{Args, Command};
use budget_tracker::{commands, ChatMode, Config, Result};
use clap::Parser;
use std::process::ExitCode;
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let home = args.common().budget_home().path();

    // When BUDGET_CHAT_TEST_MODE is set and non-empty the chat answers offline, otherwise it
    // calls the configured chat service.
    let mode = ChatMode::from_env();

    let _: () = match args.command() {
        Command::Init => commands::init(home).await?.print(),
        Command::Add(add_args) => {
            let config = Config::load(home).await?;
            commands::add(config, add_args.clone()).await?.print()
        }
        Command::Delete(delete_args) => {
            let config = Config::load(home).await?;
            commands::delete(config, delete_args.clone()).await?.print()
        }
        Command::List(list_args) => {
            let config = Config::load(home).await?;
            commands::list(config, list_args.clone()).await?.print()
        }
        Command::Months => commands::months(Config::load(home).await?).await?.print(),
        Command::Summary => commands::summary(Config::load(home).await?).await?.print(),
        Command::Categories(categories_args) => {
            let config = Config::load(home).await?;
            commands::categories(config, categories_args.clone())
                .await?
                .print()
        }
        Command::Chat(chat_args) => {
            let config = Config::load(home).await?;
            commands::chat(config, mode, chat_args.clone())
                .await?
                .print()
        }
    };
    Ok(())
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        // RUST_LOG exists; use it.
        Some(_) => EnvFilter::from_default_env(),
        // Otherwise apply the level to this crate and binary only.
        None => EnvFilter::new(format!(
            "{}={},{}={}",
            env!("CARGO_CRATE_NAME"),
            level,
            env!("CARGO_BIN_NAME"),
            level
        )),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
