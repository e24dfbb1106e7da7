use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;

use crate::app::{AppContext, Result, SubwatchError};
use crate::config::{format_interval, parse_interval};
use crate::domain::{Baseline, Post};

pub async fn watch(ctx: &AppContext, subreddits: &[String], interval: Option<&str>) -> Result<()> {
    let interval = resolve_interval(ctx, interval)?;
    let cancel = CancellationToken::new();

    let mut pollers = Vec::with_capacity(subreddits.len());
    for subreddit in subreddits {
        pollers.push(Arc::new(ctx.poller(subreddit)?));
    }

    println!(
        "Watching {} every {} (Ctrl-C to stop)",
        pollers
            .iter()
            .map(|p| format!("r/{}", p.subreddit()))
            .collect::<Vec<_>>()
            .join(", "),
        format_interval(interval)
    );

    let mut tasks = Vec::new();
    for poller in &pollers {
        let mut rx = poller.subscribe();
        let subreddit = poller.subreddit().to_string();
        tasks.push(tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(posts) => print_batch(&subreddit, &posts),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(subreddit = %subreddit, skipped, "Printer fell behind");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }));
        tasks.push(poller.clone().spawn(interval, cancel.clone()));
    }

    let shutdown = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => println!("\nStopping..."),
            Err(e) => tracing::error!(error = %e, "Could not listen for Ctrl-C"),
        }
        shutdown.cancel();
    });

    cancel.cancelled().await;
    // Printers exit once every handle to their poller is gone.
    drop(pollers);
    for result in join_all(tasks).await {
        if let Err(e) = result {
            tracing::error!(error = %e, "Watch task panicked");
        }
    }

    Ok(())
}

pub async fn fetch(ctx: &AppContext, subreddit: &str) -> Result<()> {
    let poller = ctx.poller(subreddit)?;
    let posts = poller.fetch_all(&CancellationToken::new()).await?;

    if posts.is_empty() {
        println!("No posts");
        return Ok(());
    }

    for post in &posts {
        println!("{}", format_post(post));
    }
    println!("{} posts", posts.len());
    Ok(())
}

pub async fn baseline(ctx: &AppContext, subreddit: &str, refresh: bool) -> Result<()> {
    let poller = ctx.poller(subreddit)?;

    let baseline = if refresh {
        poller.refresh_baseline(&CancellationToken::new()).await?
    } else {
        ctx.service
            .load::<Baseline>(&Baseline::store_key(poller.subreddit()), false)?
            .map(Arc::new)
    };

    match baseline {
        Some(baseline) if !baseline.is_empty() => {
            let ttl = ctx
                .config
                .polling
                .baseline_ttl()
                .map_err(|e| SubwatchError::Config(e.to_string()))?;
            let status = if baseline.is_fresh(ttl) { "" } else { " (expired)" };
            println!(
                "Baseline for r/{}: {} titles, built {}{}",
                poller.subreddit(),
                baseline.len(),
                baseline.built_at().format("%Y-%m-%d %H:%M:%S UTC"),
                status
            );
        }
        _ => println!("No baseline for r/{}", poller.subreddit()),
    }
    Ok(())
}

fn resolve_interval(ctx: &AppContext, interval: Option<&str>) -> Result<Duration> {
    let interval = match interval {
        Some(s) => parse_interval(s).map_err(SubwatchError::Config)?,
        None => ctx
            .config
            .polling
            .interval()
            .map_err(|e| SubwatchError::Config(e.to_string()))?,
    };

    if interval.is_zero() {
        return Err(SubwatchError::Config(
            "polling interval must be greater than zero".into(),
        ));
    }
    Ok(interval)
}

fn print_batch(subreddit: &str, posts: &[Post]) {
    println!("{} new in r/{}:", posts.len(), subreddit);
    for post in posts {
        println!("  {}", format_post(post));
    }
}

fn format_post(post: &Post) -> String {
    let nsfw = if post.over_18 { " [nsfw]" } else { "" };
    format!(
        "{}{} - {} ({} comments)\n    {}",
        post.title,
        nsfw,
        post.display_author(),
        post.num_comments,
        post.url
    )
}
