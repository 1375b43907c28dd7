//! Command-line front end for the shortener core.
//!
//! Every command bootstraps the core from the environment, runs, and then
//! shuts the core down so buffered redirect events reach the store.
//!
//! # Usage
//!
//! ```bash
//! shortener shorten https://example.com/page
//! shortener shorten https://example.com/page --alias promo
//! shortener resolve promo --user-agent "curl/8.0"
//! shortener redirects promo
//! shortener stats promo --from "2025-01-01 00:00:00" --user-agent Firefox --page 2
//! shortener check
//! shortener load promo --requests 10000 --concurrency 50
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::{DateTime, NaiveDateTime, Utc};
use clap::{Parser, Subcommand};
use colored::*;
use tokio::task::JoinSet;

use shortener::bootstrap;
use shortener::config;
use shortener::domain::entities::{NewShortLink, RedirectEvent};
use shortener::domain::repositories::RedirectFilter;
use shortener::error::AppError;
use shortener::state::AppState;
use shortener::telemetry;

/// URL shortener core CLI.
#[derive(Parser)]
#[command(name = "shortener")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a short link
    Shorten {
        /// Absolute URL to shorten
        url: String,

        /// Requested alias (synthesized when omitted)
        #[arg(short, long)]
        alias: Option<String>,
    },

    /// Resolve an alias and record a redirect
    Resolve {
        alias: String,

        #[arg(short = 'u', long)]
        user_agent: Option<String>,
    },

    /// List every recorded redirect for an alias
    Redirects { alias: String },

    /// Show filtered, paginated redirect statistics
    Stats {
        alias: String,

        /// Start of the range (RFC 3339 or "YYYY-MM-DD HH:MM:SS", UTC)
        #[arg(long, value_parser = parse_timestamp)]
        from: Option<DateTime<Utc>>,

        /// End of the range (RFC 3339 or "YYYY-MM-DD HH:MM:SS", UTC)
        #[arg(long, value_parser = parse_timestamp)]
        to: Option<DateTime<Utc>>,

        /// Keep only user agents containing this substring
        #[arg(short = 'u', long)]
        user_agent: Option<String>,

        #[arg(short, long, default_value_t = 1)]
        page: i64,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Check database and cache connectivity
    Check,

    /// Drive concurrent resolve-and-record traffic against one alias
    Load {
        alias: String,

        #[arg(short = 'n', long, default_value_t = 1000)]
        requests: usize,

        #[arg(short, long, default_value_t = 10)]
        concurrency: usize,

        #[arg(short = 'u', long, default_value = "shortener-load")]
        user_agent: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let config = config::load_from_env()?;
    telemetry::init(&config)?;
    config.print_summary();

    let state = bootstrap::build(&config).await?;

    let outcome = run(cli.command, &state).await;
    state.shutdown().await;

    outcome
}

async fn run(command: Commands, state: &AppState) -> Result<()> {
    match command {
        Commands::Shorten { url, alias } => shorten(state, url, alias).await,
        Commands::Resolve { alias, user_agent } => {
            resolve(state, &alias, user_agent.as_deref()).await
        }
        Commands::Redirects { alias } => list_redirects(state, &alias).await,
        Commands::Stats {
            alias,
            from,
            to,
            user_agent,
            page,
            json,
        } => {
            let filter = RedirectFilter::new(alias)
                .with_date_range(from, to)
                .with_user_agent(user_agent)
                .with_page(page);
            stats(state, filter, json).await
        }
        Commands::Check => check(state).await,
        Commands::Load {
            alias,
            requests,
            concurrency,
            user_agent,
        } => load(state, alias, requests, concurrency, user_agent).await,
    }
}

async fn shorten(state: &AppState, url: String, alias: Option<String>) -> Result<()> {
    let request = match alias {
        Some(alias) => NewShortLink::with_alias(alias, url),
        None => NewShortLink::generated(url),
    };

    let link = state.allocate(request).await.map_err(report)?;

    println!("{}", "✅ Short link created".green().bold());
    println!("  Alias:    {}", link.alias.bright_yellow().bold());
    println!("  Original: {}", link.original.cyan());

    Ok(())
}

async fn resolve(state: &AppState, alias: &str, user_agent: Option<&str>) -> Result<()> {
    let original = state.redirect(alias, user_agent).await.map_err(report)?;
    println!("{original}");
    Ok(())
}

async fn list_redirects(state: &AppState, alias: &str) -> Result<()> {
    let events = state.stats.redirects(alias).await.map_err(report)?;

    println!("{} {}", "📋 Redirects for".bright_blue().bold(), alias.cyan());
    println!();
    print_events(&events);
    println!();
    println!("  Total: {}", events.len().to_string().bright_white().bold());

    Ok(())
}

async fn stats(state: &AppState, filter: RedirectFilter, json: bool) -> Result<()> {
    let page = filter.page;
    let view = state.stats.aggregated(filter).await.map_err(report)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&view)?);
        return Ok(());
    }

    println!(
        "{} {}",
        "📊 Statistics for".bright_blue().bold(),
        view.alias.cyan()
    );
    println!();
    print_events(&view.items);
    println!();
    println!(
        "  Total: {}  Page: {}",
        view.total.to_string().bright_green().bold(),
        page.to_string().bright_white()
    );

    Ok(())
}

fn print_events(events: &[RedirectEvent]) {
    println!(
        "  {:<20} {}",
        "Occurred".bright_white().bold(),
        "User agent".bright_white().bold()
    );
    println!("  {}", "─".repeat(60).bright_black());

    for event in events {
        println!(
            "  {:<20} {}",
            event
                .occurred_at
                .format("%Y-%m-%d %H:%M:%S")
                .to_string()
                .bright_black(),
            event.user_agent
        );
    }
}

async fn check(state: &AppState) -> Result<()> {
    println!("{}", "🔌 Connectivity".bright_blue().bold());
    println!();

    let health = state.check_health().await;

    let status = |ok: bool| if ok { "OK".green() } else { "UNAVAILABLE".red() };
    println!("  Database: {}", status(health.database));
    println!("  Cache:    {}", status(health.cache));

    if !health.database {
        anyhow::bail!("database is unreachable");
    }
    Ok(())
}

async fn load(
    state: &AppState,
    alias: String,
    requests: usize,
    concurrency: usize,
    user_agent: String,
) -> Result<()> {
    println!(
        "{} {} requests, {} workers",
        "🚀 Load".bright_blue().bold(),
        requests.to_string().bright_white(),
        concurrency.to_string().bright_white()
    );

    let remaining = Arc::new(AtomicUsize::new(requests));
    let failures = Arc::new(AtomicUsize::new(0));
    let alias: Arc<str> = alias.into();
    let user_agent: Arc<str> = user_agent.into();

    let start = Instant::now();
    let mut workers = JoinSet::new();

    for _ in 0..concurrency.max(1) {
        let state = state.clone();
        let remaining = Arc::clone(&remaining);
        let failures = Arc::clone(&failures);
        let alias = Arc::clone(&alias);
        let user_agent = Arc::clone(&user_agent);

        workers.spawn(async move {
            let mut busy = Duration::ZERO;
            while remaining
                .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
                .is_ok()
            {
                let started = Instant::now();
                if state.redirect(&alias, Some(user_agent.as_ref())).await.is_err() {
                    failures.fetch_add(1, Ordering::Relaxed);
                }
                busy += started.elapsed();
            }
            busy
        });
    }

    let mut busy = Duration::ZERO;
    while let Some(worker) = workers.join_next().await {
        busy += worker?;
    }

    let elapsed = start.elapsed();
    let failed = failures.load(Ordering::Relaxed);
    let average = if requests > 0 {
        busy.as_secs_f64() * 1000.0 / requests as f64
    } else {
        0.0
    };

    println!();
    println!("  Total time:  {} ms", elapsed.as_millis().to_string().bright_green());
    println!("  Avg latency: {} ms", format!("{average:.3}").bright_green());
    println!(
        "  Failures:    {}",
        if failed == 0 {
            failed.to_string().green()
        } else {
            failed.to_string().red()
        }
    );

    Ok(())
}

/// Prints a core error with its code and converts it for `main`.
fn report(error: AppError) -> anyhow::Error {
    eprintln!(
        "{} {} {}",
        "❌".red(),
        format!("[{}]", error.code()).red().bold(),
        error
    );
    error.into()
}

fn parse_timestamp(input: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(input) {
        return Ok(ts.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(input, "%Y-%m-%d %H:%M:%S")
        .map(|ts| ts.and_utc())
        .map_err(|_| {
            format!("expected RFC 3339 or 'YYYY-MM-DD HH:MM:SS', got '{input}'")
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2025, 3, 1, 12, 30, 0).unwrap();

        assert_eq!(parse_timestamp("2025-03-01 12:30:00").unwrap(), expected);
        assert_eq!(parse_timestamp("2025-03-01T12:30:00Z").unwrap(), expected);
        assert_eq!(
            parse_timestamp("2025-03-01T14:30:00+02:00").unwrap(),
            expected
        );
        assert!(parse_timestamp("01/03/2025").is_err());
    }

    #[test]
    fn test_cli_parses_stats_filters() {
        let cli = Cli::try_parse_from([
            "shortener",
            "stats",
            "promo",
            "--from",
            "2025-01-01 00:00:00",
            "--user-agent",
            "Firefox",
            "--page",
            "2",
            "--json",
        ])
        .unwrap();

        match cli.command {
            Commands::Stats {
                alias,
                from,
                to,
                user_agent,
                page,
                json,
            } => {
                assert_eq!(alias, "promo");
                assert!(from.is_some());
                assert!(to.is_none());
                assert_eq!(user_agent.as_deref(), Some("Firefox"));
                assert_eq!(page, 2);
                assert!(json);
            }
            _ => panic!("expected stats command"),
        }
    }
}
