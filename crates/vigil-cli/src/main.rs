//! `vigil` — watch the deletion and removal lifecycle of Reddit submissions.
//!
//! # Usage
//!
//! ```text
//! vigil init Advice+AmItheAsshole --hours 24
//! vigil update
//! vigil query -r Advice --after 2025-08-01 --before 2025-08-02 -l 50 --sample
//! ```
//!
//! `init` seeds one watch target per subreddit from the historical index,
//! `update` runs one reconciliation cycle over every registered target
//! (schedule it with cron or launchd), and `query` produces a one-shot
//! deletion report. Only run one invocation at a time per data directory;
//! the stores assume a single writer.

mod report;

use std::{
  collections::HashSet,
  path::{Path, PathBuf},
  time::Duration,
};

use anyhow::{Context as _, Result};
use chrono::{NaiveDate, NaiveTime, Utc};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::EnvFilter;
use vigil_core::WatchEntry;
use vigil_sources::{
  FetchConfig, Fetcher, IndexClient, IndexQuery, LiveClient, SnapshotCache,
  collect_sampled, collect_sequential,
};
use vigil_store_sqlite::SqliteStore;
use vigil_watch::{
  Registry, registry::target_label, rotate, run_cycle, table,
};

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
  name = "vigil",
  version,
  about = "Watch the deletion/removal status of Reddit submissions"
)]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "vigil.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Start watching `+`-delimited subreddits.
  Init {
    /// Subreddits to initialise, e.g. `Advice+AmItheAsshole`.
    subreddits: String,

    /// Previous hours of submissions to seed each watch with.
    #[arg(long, default_value_t = 24)]
    hours: i64,

    /// Cap on seeded submissions per subreddit.
    #[arg(short, long, default_value_t = 1000)]
    limit: usize,
  },

  /// Run one reconciliation cycle over every registered watch target.
  Update,

  /// One-shot historical query resolved against the live source, as CSV.
  Query {
    /// Subreddit to query.
    #[arg(short = 'r', long)]
    subreddit: String,

    /// Submissions after this date (YYYY-MM-DD).
    #[arg(short, long)]
    after: NaiveDate,

    /// Submissions before this date (YYYY-MM-DD); defaults to now.
    #[arg(short, long)]
    before: Option<NaiveDate>,

    #[arg(short, long, default_value_t = 5)]
    limit: usize,

    /// Sample the whole range uniformly instead of taking the earliest
    /// submissions.
    #[arg(long)]
    sample: bool,

    /// Reply-count threshold, e.g. `>0`. Updated as the index ingests
    /// replies, unlike `score`.
    #[arg(short = 'n', long)]
    comments_num: Option<String>,

    /// Skip live lookups entirely; index data only.
    #[arg(long)]
    skip: bool,

    /// Only resolve apparent throwaway accounts against the live source.
    #[arg(short = 't', long)]
    throwaway_only: bool,
  },
}

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime settings, deserialised from `vigil.toml` with `VIGIL_*`
/// environment overrides.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct Settings {
  data_dir:             PathBuf,
  registry_file:        String,
  cache_file:           String,
  index_base_url:       String,
  live_base_url:        String,
  user_agent:           String,
  rate_limit_secs:      u64,
  retry_backoff_secs:   u64,
  request_timeout_secs: u64,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      data_dir:             PathBuf::from("."),
      registry_file:        "watch.toml".into(),
      cache_file:           "snapshots.db".into(),
      index_base_url:       "https://api.pushshift.io".into(),
      live_base_url:        "https://api.reddit.com".into(),
      user_agent:           concat!("vigil/", env!("CARGO_PKG_VERSION")).into(),
      rate_limit_secs:      2,
      retry_backoff_secs:   300,
      request_timeout_secs: 30,
    }
  }
}

impl Settings {
  fn registry_path(&self) -> PathBuf { self.data_dir.join(&self.registry_file) }

  fn cache_path(&self) -> PathBuf { self.data_dir.join(&self.cache_file) }

  fn fetch_config(&self) -> FetchConfig {
    FetchConfig {
      user_agent:    self.user_agent.clone(),
      min_delay:     Duration::from_secs(self.rate_limit_secs),
      retry_backoff: Duration::from_secs(self.retry_backoff_secs),
      timeout:       Duration::from_secs(self.request_timeout_secs),
    }
  }
}

fn load_settings(path: &Path) -> Result<Settings> {
  let settings = config::Config::builder()
    .add_source(config::File::from(path.to_path_buf()).required(false))
    .add_source(config::Environment::with_prefix("VIGIL"))
    .build()
    .context("failed to read config file")?;
  settings
    .try_deserialize()
    .context("failed to deserialise settings")
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let settings = load_settings(&cli.config)?;
  std::fs::create_dir_all(&settings.data_dir)
    .with_context(|| format!("creating data dir {:?}", settings.data_dir))?;

  let fetcher = Fetcher::new(&settings.fetch_config())?;

  match cli.command {
    Command::Init { subreddits, hours, limit } => {
      cmd_init(&settings, fetcher, &subreddits, hours, limit).await
    }
    Command::Update => cmd_update(&settings, fetcher).await,
    Command::Query {
      subreddit,
      after,
      before,
      limit,
      sample,
      comments_num,
      skip,
      throwaway_only,
    } => {
      cmd_query(
        &settings,
        fetcher,
        QueryArgs {
          subreddit,
          after,
          before,
          limit,
          sample,
          comments_num,
          skip,
          throwaway_only,
        },
      )
      .await
    }
  }
}

// ─── init ─────────────────────────────────────────────────────────────────────

async fn cmd_init(
  settings: &Settings,
  fetcher: Fetcher,
  subreddits: &str,
  hours: i64,
  limit: usize,
) -> Result<()> {
  let index = IndexClient::new(fetcher.clone(), &settings.index_base_url);
  let live = LiveClient::new(fetcher, &settings.live_base_url);
  let store = SqliteStore::open(settings.cache_path())
    .await
    .context("opening snapshot cache")?;
  let cache = SnapshotCache::new(store, live);

  let mut registry = Registry::load(&settings.registry_path())?;
  let now = Utc::now();

  for subreddit in subreddits.split('+').filter(|s| !s.is_empty()) {
    info!(subreddit, hours, "initialising watch");

    let mut query = IndexQuery::new(subreddit, limit);
    query.after = Some(now - chrono::Duration::hours(hours));
    query.before = Some(now);
    let batch = collect_sequential(&index, &query).await?;

    // Boundary entries repeat across pages; the watch table wants one row
    // per identifier.
    let mut seen = HashSet::new();
    let mut entries: Vec<WatchEntry> = batch
      .submissions
      .iter()
      .filter(|s| seen.insert(s.id.clone()))
      .map(|s| WatchEntry::begin(s, now))
      .collect();

    let latest = settings
      .data_dir
      .join(table::table_file_name(subreddit, now, entries.len()));
    table::write_table(&latest, &entries)?;
    registry.insert(target_label(subreddit, now), latest.clone());
    info!(subreddit, entries = entries.len(), path = %latest.display(), "watch table created");

    // First cycle immediately, so the archive history starts at day zero.
    run_cycle(&cache, &mut entries, now).await?;
    let fresh = updated_path(&latest);
    table::write_table(&fresh, &entries)?;
    rotate::init_archive(&latest, now)?;
    rotate::rotate(&latest, &fresh, now)?;
  }

  registry.save(&settings.registry_path())?;
  Ok(())
}

// ─── update ───────────────────────────────────────────────────────────────────

async fn cmd_update(settings: &Settings, fetcher: Fetcher) -> Result<()> {
  let registry = Registry::load(&settings.registry_path())?;
  if registry.is_empty() {
    anyhow::bail!("no watch targets registered; run `vigil init` first");
  }

  let live = LiveClient::new(fetcher, &settings.live_base_url);
  let store = SqliteStore::open(settings.cache_path())
    .await
    .context("opening snapshot cache")?;
  let cache = SnapshotCache::new(store, live);

  for (label, latest) in &registry.targets {
    info!(label = %label, path = %latest.display(), "updating watch target");

    let mut entries = table::read_table(latest)
      .with_context(|| format!("reading watch table {}", latest.display()))?;
    let now = Utc::now();
    let outcome = run_cycle(&cache, &mut entries, now).await?;

    let fresh = updated_path(latest);
    table::write_table(&fresh, &entries)?;
    rotate::rotate(latest, &fresh, now)?;

    info!(
      label = %label,
      checked = outcome.checked,
      transitions = outcome.transitions,
      missing = outcome.missing,
      "target updated"
    );
  }
  Ok(())
}

fn updated_path(latest: &Path) -> PathBuf {
  let name = latest.file_name().unwrap_or_default().to_string_lossy();
  latest.with_file_name(format!("updated-{name}"))
}

// ─── query ────────────────────────────────────────────────────────────────────

struct QueryArgs {
  subreddit:      String,
  after:          NaiveDate,
  before:         Option<NaiveDate>,
  limit:          usize,
  sample:         bool,
  comments_num:   Option<String>,
  skip:           bool,
  throwaway_only: bool,
}

async fn cmd_query(
  settings: &Settings,
  fetcher: Fetcher,
  args: QueryArgs,
) -> Result<()> {
  let after = args.after.and_time(NaiveTime::MIN).and_utc();
  let before = match args.before {
    Some(date) => date.and_time(NaiveTime::MIN).and_utc(),
    None => Utc::now(),
  };
  anyhow::ensure!(after < before, "--after must precede --before");

  let index = IndexClient::new(fetcher.clone(), &settings.index_base_url);
  let mut query = IndexQuery::new(args.subreddit.as_str(), args.limit);
  query.after = Some(after);
  query.before = Some(before);
  query.num_comments = args.comments_num.clone();

  let batch = if args.sample {
    collect_sampled(&index, &query).await?
  } else {
    collect_sequential(&index, &query).await?
  };
  info!(
    collected = batch.submissions.len(),
    total = batch.total,
    duplicates = batch.duplicate_ids.len(),
    "historical batch collected"
  );

  let resolved = if args.skip {
    Default::default()
  } else {
    let live = LiveClient::new(fetcher, &settings.live_base_url);
    let store = SqliteStore::open(settings.cache_path())
      .await
      .context("opening snapshot cache")?;
    let cache = SnapshotCache::new(store, live);

    let ids: Vec<String> = batch
      .submissions
      .iter()
      .filter(|s| !args.throwaway_only || report::is_throwaway(&s.author))
      .map(|s| s.id.clone())
      .collect();
    cache.resolve(&ids).await?
  };

  let rows = report::build_rows(&batch, &resolved);
  let path = settings.data_dir.join(report::report_file_name(
    &args.subreddit,
    after,
    before,
    args.limit,
    rows.len(),
    args.comments_num.as_deref(),
    args.sample,
    args.throwaway_only,
  ));
  report::export(&path, &rows)?;
  info!(rows = rows.len(), path = %path.display(), "report written");
  Ok(())
}
