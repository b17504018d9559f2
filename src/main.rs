mod error;

use crate::error::{ErrorKind, Result};
use clap::{Parser, Subcommand};
use exn::ResultExt;
use gelo_blacklist::{Context, Coordinator, SinkHandle, Summary};
use gelo_cache::ItemCache;
use gelo_config::Config;
use gelo_queue::{AdmissionQueue, HttpFetcher, QueueEvent};
use gelo_storage::BackendHandle;
use gelo_storage::backend::{LocalBackend, MemoryBackend, ReadOnlyBackend};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gelo", version, about = "Blacklist gallery posts by tag rules")]
struct Cli {
    #[command(subcommand)]
    command: Command,
    /// Config file (TOML, YAML or JSON)
    #[arg(long, global = true, env = "GELO_CONFIG")]
    config: Option<PathBuf>,
    /// Never write to durable storage
    #[arg(long, global = true)]
    dry_run: bool,
    /// More logging (-v debug, -vv trace). `RUST_LOG` takes precedence.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Classify posts with the selected rule set
    Check {
        /// Select this rule set first
        #[arg(long)]
        rule_set: Option<String>,
        /// Post ids
        #[arg(required = true)]
        ids: Vec<u64>,
    },
    /// Manage rule sets
    #[command(subcommand)]
    RuleSets(RuleSetsCommand),
    /// Print the rules a file parses into
    Parse { file: PathBuf },
}

#[derive(Subcommand)]
enum RuleSetsCommand {
    List,
    /// Add or replace a rule set with the contents of a file, and select it
    Save { name: String, file: PathBuf },
    Remove { name: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Command::Parse { file } = &cli.command {
        let text = read_text(file).await?;
        for rule in gelo_rules::parse(&text) {
            println!("{}", rule.label());
        }
        return Ok(());
    }

    let config = Config::load(cli.config.as_deref()).or_raise(|| ErrorKind::Config)?;
    let (mut coordinator, cache) = build(&config, cli.dry_run).await?;
    coordinator.activate().await.or_raise(|| ErrorKind::Blacklist)?;

    match cli.command {
        Command::Check { rule_set, ids } => {
            if let Some(name) = rule_set {
                coordinator.select_rule_set(&name).await.or_raise(|| ErrorKind::Blacklist)?;
            }
            let report = coordinator.apply(ids).await.or_raise(|| ErrorKind::Blacklist)?;
            for (id, blacklisted) in &report.decisions {
                let verdict = if report.failed.contains(id) {
                    "unresolved"
                } else if *blacklisted {
                    "blacklisted"
                } else {
                    "visible"
                };
                println!("{id}\t{verdict}");
            }
            print_summary(&coordinator.summary());
        },
        Command::RuleSets(RuleSetsCommand::List) => {
            let active = coordinator.active().map(|set| set.name.clone());
            for set in coordinator.rule_sets().await.or_raise(|| ErrorKind::Blacklist)? {
                let marker = if active.as_deref() == Some(set.name.as_str()) { "*" } else { " " };
                let lock = if set.read_only { " (read-only)" } else { "" };
                println!("{marker} {}{lock}", set.name);
            }
        },
        Command::RuleSets(RuleSetsCommand::Save { name, file }) => {
            let text = read_text(&file).await?;
            coordinator.save_rule_set(&name, &text).await.or_raise(|| ErrorKind::Blacklist)?;
            println!("Saved {name:?} ({} rules)", coordinator.rules().len());
        },
        Command::RuleSets(RuleSetsCommand::Remove { name }) => {
            coordinator.remove_rule_set(&name).await.or_raise(|| ErrorKind::Blacklist)?;
            println!("Removed {name:?}");
        },
        Command::Parse { .. } => {},
    }

    if let Err(err) = cache.persist().await {
        tracing::warn!(error = %err, "Could not save the post cache");
    }
    Ok(())
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn,gelo=info",
        1 => "info,gelo=debug",
        _ => "debug,gelo=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).with_writer(std::io::stderr).init();
}

async fn build(config: &Config, dry_run: bool) -> Result<(Coordinator, ItemCache)> {
    let data_dir = config.data_dir().or_raise(|| ErrorKind::Config)?;
    let data_dir = std::path::absolute(&data_dir).map_err(|_| ErrorKind::Storage(data_dir.display().to_string()))?;
    let local = LocalBackend::new("local", &data_dir).or_raise(|| ErrorKind::Storage(data_dir.display().to_string()))?;
    let mut durable: BackendHandle = Arc::new(local);
    if dry_run {
        tracing::info!("Dry run, durable storage is read-only");
        durable = Arc::new(ReadOnlyBackend::new(durable));
    }
    let session: BackendHandle = Arc::new(MemoryBackend::new("session"));

    let fetcher = HttpFetcher::new().or_raise(|| ErrorKind::Fetcher)?;
    let queue = AdmissionQueue::new(Arc::new(fetcher), config.queue.clone());
    let mut events = queue.subscribe();
    tokio::spawn(async move {
        while let Ok(QueueEvent::RateLimited) = events.recv().await {
            tracing::warn!("Rate limited, backing off");
        }
    });

    let cache = ItemCache::open(queue, durable.clone(), config.cache.clone())
        .await
        .or_raise(|| ErrorKind::Storage(data_dir.display().to_string()))?;
    let sink: SinkHandle = Arc::new(|id: u64, blacklisted: bool| {
        tracing::debug!(id, blacklisted, "Visibility changed");
    });
    let coordinator = Coordinator::new(Context {
        cache: cache.clone(),
        durable,
        session,
        sink,
        settings: config.blacklist.clone(),
    });
    Ok((coordinator, cache))
}

async fn read_text(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path).await.or_raise(|| ErrorKind::Read(path.display().to_string()))
}

fn print_summary(summary: &Summary) {
    println!(
        "\n{}: {} of {} posts blacklisted",
        summary.rule_set.as_deref().unwrap_or("(none)"),
        summary.blacklisted,
        summary.total
    );
    for rule in &summary.rules {
        let state = if rule.disabled { " (disabled)" } else { "" };
        println!("  [{}] {} x{}{state}", rule.index, rule.label, rule.hits);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_takes_numeric_ids() {
        let cli = Cli::try_parse_from(["gelo", "check", "--rule-set", "mine", "1", "42"]).unwrap();
        let Command::Check { rule_set, ids } = cli.command else {
            panic!("expected check");
        };
        assert_eq!(rule_set.as_deref(), Some("mine"));
        assert_eq!(ids, vec![1, 42]);
    }

    #[test]
    fn check_rejects_bad_ids() {
        assert!(Cli::try_parse_from(["gelo", "check", "1", "abc"]).is_err());
        assert!(Cli::try_parse_from(["gelo", "check", "-5"]).is_err());
        assert!(Cli::try_parse_from(["gelo", "check"]).is_err());
    }
}
