use anyhow::{Context, Result};
use autocommit::app::build_committer;
use autocommit::cli::{CliArgs, Command};
use autocommit::config::Config;
use autocommit::daemon;
use autocommit_core::Trigger;
use chrono::Utc;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();
    init_tracing(cli_args.verbose);

    let config = Config::from_cli_and_file(&cli_args)?;
    info!(
        "Using repository {} (remote: {})",
        config.resolved_repo_path().display(),
        config.remote
    );

    match cli_args.resolved_command() {
        Command::Run { trigger } => {
            let committer = build_committer(&config);
            let trigger = Trigger::from(trigger);
            let report = tokio::task::spawn_blocking(move || committer.run(trigger))
                .await
                .context("Run panicked")??;
            println!("{}", report);
        }
        Command::Daemon => {
            daemon::run(build_committer(&config), config.schedule).await?;
        }
        Command::Next { count } => {
            for time in config.schedule.upcoming(Utc::now()).take(usize::from(count)) {
                println!("{}", time.format("%Y-%m-%d %H:%M:%S UTC"));
            }
        }
    }

    Ok(())
}
