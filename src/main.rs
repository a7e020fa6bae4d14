//! `journal-digest` command line.
//!
//! Reads a JSON array of journal entries and prints either per-entry
//! summaries or one combined digest as JSON on stdout. Provider settings
//! come from `JOURNAL_DIGEST_*` environment variables; logs go to stderr.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Serialize;
use uuid::Uuid;

use journal_digest::config::{ConfigError, ProviderConfig, RateLimitConfig, APP_NAME, APP_VERSION};
use journal_digest::{
    project_summary, CombinedSummaryOptions, EntrySummarizer, HttpLlmProvider,
    InMemoryRateLimiter, JournalEntry, LlmProvider, ShareScope, SharedSummaryView, SummaryError,
    SummaryOptions, SummaryPeriod,
};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("Cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid entries file: {0}")]
    Entries(#[from] serde_json::Error),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Summary(#[from] SummaryError),
}

#[derive(Debug, Parser)]
#[command(name = "journal-digest", version, about = "Summarize journal entries for a care team.")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Summarize each entry on its own.
    Summarize {
        /// JSON file holding an array of entries.
        #[arg(long, value_name = "FILE")]
        input: PathBuf,
        /// Add a mood analysis to each summary.
        #[arg(long)]
        mood_analysis: bool,
        /// Scope the output is projected to.
        #[arg(long, default_value = "FULL_ACCESS")]
        scope: ShareScope,
        /// Rate-limit key of the requesting user.
        #[arg(long, value_name = "KEY")]
        user: Option<String>,
    },
    /// Merge all entries into one digest for a period.
    Digest {
        #[arg(long, value_name = "FILE")]
        input: PathBuf,
        /// week, month or quarter.
        #[arg(long, default_value = "week")]
        period: SummaryPeriod,
        /// Finish with a short narrative overview.
        #[arg(long)]
        narrative: bool,
        #[arg(long, value_name = "KEY")]
        user: Option<String>,
    },
}

/// Per-entry output line of `summarize`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EntryOutput {
    entry_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<SharedSummaryView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorOutput>,
}

#[derive(Serialize)]
struct ErrorOutput {
    code: &'static str,
    message: &'static str,
}

#[tokio::main]
async fn main() -> ExitCode {
    journal_digest::init_tracing();
    let cli = Cli::parse();

    let run_id = Uuid::new_v4();
    tracing::info!(%run_id, "{} v{} starting", APP_NAME, APP_VERSION);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(%run_id, error = %e, "Run failed");
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let summarizer = build_summarizer()?;

    match cli.command {
        Command::Summarize {
            input,
            mood_analysis,
            scope,
            user,
        } => {
            let entries = load_entries(&input)?;
            let options = SummaryOptions {
                include_mood_analysis: mood_analysis,
                rate_limit_key: user,
                ..Default::default()
            };
            let mut outputs = Vec::with_capacity(entries.len());
            for entry in &entries {
                let output = match summarizer
                    .generate_entry_summary(
                        &entry.title,
                        &entry.content,
                        entry.mood.as_deref(),
                        &entry.tags,
                        &options,
                    )
                    .await
                {
                    Ok(result) => EntryOutput {
                        entry_id: entry.id,
                        summary: project_summary(&result, scope),
                        error: None,
                    },
                    // No provider is fatal for every entry; stop early.
                    Err(SummaryError::ProviderUnavailable) => {
                        return Err(SummaryError::ProviderUnavailable.into())
                    }
                    Err(e) => EntryOutput {
                        entry_id: entry.id,
                        summary: None,
                        error: Some(ErrorOutput {
                            code: e.code(),
                            message: e.user_message(),
                        }),
                    },
                };
                outputs.push(output);
            }
            print_json(&outputs)
        }
        Command::Digest {
            input,
            period,
            narrative,
            user,
        } => {
            let entries = load_entries(&input)?;
            let options = CombinedSummaryOptions {
                summary: SummaryOptions {
                    rate_limit_key: user,
                    ..Default::default()
                },
                include_narrative: narrative,
                reference_time: None,
            };
            let outcome = summarizer
                .generate_combined_summary(&entries, period, &options)
                .await?;
            print_json(&outcome)
        }
    }
}

fn build_summarizer() -> Result<EntrySummarizer, CliError> {
    let provider: Option<Arc<dyn LlmProvider>> = match ProviderConfig::from_env() {
        Some(config) => Some(Arc::new(HttpLlmProvider::new(&config)?)),
        None => {
            tracing::warn!("JOURNAL_DIGEST_API_KEY not set, summaries unavailable");
            None
        }
    };
    let limiter = InMemoryRateLimiter::new(RateLimitConfig::from_env()?);
    Ok(EntrySummarizer::new(provider).with_rate_limiter(Arc::new(limiter)))
}

fn load_entries(path: &Path) -> Result<Vec<JournalEntry>, CliError> {
    let raw = std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let entries: Vec<JournalEntry> = serde_json::from_str(&raw)?;
    tracing::info!(count = entries.len(), "Entries loaded");
    Ok(entries)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
