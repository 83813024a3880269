//! `muster` — SIS roster import and directory inspection.
//!
//! # Usage
//!
//! ```text
//! muster --db school.db import roster.csv
//! muster --db school.db export -o users.csv
//! muster --db school.db batches
//! muster --db school.db changes <batch-id>
//! muster --db school.db custom add staff-pjones --given Pat --family Jones
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use chrono::Utc;
use clap::{Parser, Subcommand};
use muster_core::{
  reconcile,
  record::{DirectoryRecord, RecordStatus},
  store::DirectoryStore,
};
use muster_store_sqlite::SqliteDirectory;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

// ─── CLI args ────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
  name = "muster",
  version,
  about = "SIS roster import and directory inspection"
)]
struct Cli {
  /// Path to the directory database.
  #[arg(long, env = "MUSTER_DB", default_value = "muster.db")]
  db: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Reconcile the directory against an SIS roster export.
  Import {
    /// Path to the roster CSV.
    file: PathBuf,

    /// Print the summary as JSON.
    #[arg(long)]
    json: bool,
  },

  /// Write the canonical directory CSV.
  Export {
    /// Output file; stdout when omitted.
    #[arg(short, long)]
    output: Option<PathBuf>,
  },

  /// List import batches, newest first.
  Batches,

  /// Show the change-log entries recorded by one batch.
  Changes { batch_id: Uuid },

  /// Manage operator-owned custom records.
  Custom {
    #[command(subcommand)]
    command: CustomCommand,
  },
}

#[derive(Subcommand)]
enum CustomCommand {
  /// Create or replace a custom record.
  Add {
    /// Record identifier; the managed `u` + 6-digit pattern is reserved.
    identifier: String,

    #[arg(long)]
    given: String,

    #[arg(long)]
    family: String,

    #[arg(long)]
    email: Option<String>,

    /// Create the record suspended instead of active.
    #[arg(long)]
    suspended: bool,
  },

  /// List custom records.
  List,
}

// ─── Entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();

  let store = SqliteDirectory::open(&cli.db).await.with_context(|| {
    format!("failed to open directory database at {}", cli.db.display())
  })?;

  match cli.command {
    Command::Import { file, json } => import(&store, &file, json).await,
    Command::Export { output } => export(&store, output.as_deref()).await,
    Command::Batches => batches(&store).await,
    Command::Changes { batch_id } => changes(&store, batch_id).await,
    Command::Custom { command } => match command {
      CustomCommand::Add {
        identifier,
        given,
        family,
        email,
        suspended,
      } => {
        custom_add(&store, &identifier, &given, &family, email.as_deref(), suspended)
          .await
      }
      CustomCommand::List => custom_list(&store).await,
    },
  }
}

// ─── Commands ────────────────────────────────────────────────────────────────

async fn import(store: &SqliteDirectory, file: &Path, json: bool) -> anyhow::Result<()> {
  let data = std::fs::read(file)
    .with_context(|| format!("reading roster file {}", file.display()))?;
  let roster = muster_roster::parse(&data).context("parsing roster file")?;
  if roster.skipped > 0 {
    tracing::warn!(skipped = roster.skipped, "dropped rows with unusable ids");
  }

  let summary = reconcile::reconcile(store, &roster.rows)
    .await
    .context("reconciliation failed; no changes were applied")?;

  if json {
    println!("{}", serde_json::to_string_pretty(&summary)?);
  } else {
    println!(
      "created {}, updated {}, suspended {} (batch {})",
      summary.created, summary.updated, summary.suspended, summary.batch_id
    );
  }
  Ok(())
}

async fn export(store: &SqliteDirectory, output: Option<&Path>) -> anyhow::Result<()> {
  let records = store.list_records().await?;
  let csv = muster_roster::to_csv(&records)?;

  match output {
    Some(path) => {
      std::fs::write(path, &csv)
        .with_context(|| format!("writing {}", path.display()))?;
      tracing::info!(records = records.len(), "directory exported");
    }
    None => print!("{csv}"),
  }
  Ok(())
}

async fn batches(store: &SqliteDirectory) -> anyhow::Result<()> {
  for batch in store.list_batches().await? {
    println!("{}  {}", batch.batch_id, batch.imported_at.to_rfc3339());
  }
  Ok(())
}

async fn changes(store: &SqliteDirectory, batch_id: Uuid) -> anyhow::Result<()> {
  for entry in store.changes(batch_id).await? {
    println!(
      "{}  {:<12}  {} -> {}",
      entry.identifier,
      entry.field.column_name(),
      entry.old_value.as_deref().unwrap_or("-"),
      entry.new_value.as_deref().unwrap_or("-"),
    );
  }
  Ok(())
}

async fn custom_add(
  store: &SqliteDirectory,
  identifier: &str,
  given: &str,
  family: &str,
  email: Option<&str>,
  suspended: bool,
) -> anyhow::Result<()> {
  let status = if suspended {
    RecordStatus::Suspended
  } else {
    RecordStatus::Active
  };
  let record = DirectoryRecord::custom(identifier, given, family, email, status, Utc::now())
    .context("invalid custom record")?;

  store.put_record(&record).await?;
  tracing::info!(identifier = %record.identifier, "custom record saved");
  Ok(())
}

async fn custom_list(store: &SqliteDirectory) -> anyhow::Result<()> {
  for rec in store.list_records().await? {
    if rec.is_managed() {
      continue;
    }
    println!(
      "{:<20}  {:<24}  {}  [{}]",
      rec.identifier,
      rec.display_name,
      rec.email.as_deref().unwrap_or("-"),
      rec.status.as_str(),
    );
  }
  Ok(())
}
