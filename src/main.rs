use anyhow::{Context, Result};
use clap::Parser;
use showsync::config::{AppConfig, CliConfig, FileConfig};
use showsync::{EventDataLoader, HttpShowFeed, SqliteEventStore, SyncSettings};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to the SQLite events database file.
    #[clap(value_parser = parse_path)]
    pub events_db: PathBuf,

    /// Upstream show id to synchronize. May be given multiple times.
    #[clap(long = "show-id", required = true)]
    pub show_ids: Vec<i64>,

    /// Base URL of the upstream feed.
    #[clap(long)]
    pub base_url: Option<String>,

    /// Source tag recorded on external references.
    #[clap(long)]
    pub source: Option<String>,

    /// Owning group for events created from this feed.
    #[clap(long)]
    pub group_id: Option<i64>,

    /// Timeout in seconds for upstream feed requests.
    #[clap(long)]
    pub timeout_sec: Option<u64>,

    /// Re-sync the given shows on this interval instead of exiting.
    #[clap(long)]
    pub poll_interval_sec: Option<u64>,

    /// Path to a TOML config file; its values override CLI arguments.
    #[clap(long)]
    pub config: Option<PathBuf>,
}

impl CliArgs {
    fn to_cli_config(&self) -> CliConfig {
        CliConfig {
            db_path: Some(self.events_db.clone()),
            base_url: self.base_url.clone(),
            source: self.source.clone(),
            group_id: self.group_id,
            timeout_sec: self.timeout_sec,
            poll_interval_sec: self.poll_interval_sec,
        }
    }
}

fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .unwrap();

    info!(
        "showsync {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH")
    );

    let file_config = cli_args
        .config
        .as_deref()
        .map(FileConfig::load)
        .transpose()?;
    let config = AppConfig::resolve(&cli_args.to_cli_config(), file_config)?;

    info!("Opening SQLite events database at {:?}...", config.db_path);
    let store = Arc::new(SqliteEventStore::open(&config.db_path)?);

    let feed = Arc::new(HttpShowFeed::new(
        &config.feed.base_url,
        config.feed.timeout,
    )?);
    let loader = EventDataLoader::new(
        store.clone(),
        feed,
        SyncSettings {
            source: config.feed.source.clone(),
            group_id: config.feed.group_id,
        },
    );

    match config.poll_interval {
        None => {
            for &show_id in &cli_args.show_ids {
                loader
                    .load_event_data(show_id)
                    .with_context(|| format!("sync of show {} failed", show_id))?;
            }
            info!(
                "Events db now holds {} events, {} venues, {} leaders, {} time slots, {} sessions",
                store.events_count(),
                store.venues_count(),
                store.leaders_count(),
                store.time_slots_count(),
                store.sessions_count(),
            );
            Ok(())
        }
        Some(interval) => {
            info!(
                "Polling {} show(s) from {} every {}s",
                cli_args.show_ids.len(),
                config.feed.base_url,
                interval.as_secs()
            );
            loop {
                for &show_id in &cli_args.show_ids {
                    // Retry policy in polling mode is simply the next tick.
                    if let Err(e) = loader.load_event_data(show_id) {
                        error!("Sync of show {} failed: {:#}", show_id, anyhow::Error::from(e));
                    }
                }
                std::thread::sleep(interval);
            }
        }
    }
}
