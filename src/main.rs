use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use subwatch::app::AppContext;
use subwatch::cli::{commands, Cli, Commands};
use subwatch::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let ctx = AppContext::new(config, cli.db)?;

    match cli.command {
        Commands::Watch {
            subreddits,
            interval,
        } => {
            commands::watch(&ctx, &subreddits, interval.as_deref()).await?;
        }
        Commands::Fetch { subreddit } => {
            commands::fetch(&ctx, &subreddit).await?;
        }
        Commands::Baseline { subreddit, refresh } => {
            commands::baseline(&ctx, &subreddit, refresh).await?;
        }
    }

    Ok(())
}
