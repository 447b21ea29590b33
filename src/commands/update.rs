//! Reconciliation flow: refresh stream URLs of the working playlist from the
//! remote name-matched source first, then the local `tvg-id` keyed files.

use anyhow::{Context, Result};

use crate::config::Config;
use crate::models::ReconcileReport;
use crate::services::aliases::AliasTable;
use crate::services::dead_ledger::DeadLedger;
use crate::services::fetcher::PlaylistFetcher;
use crate::services::m3u_parser::{load_playlist, save_playlist};
use crate::services::reconciler::Reconciler;
use crate::services::upstream_index::{load_upstream_sources, ExactIndex, FuzzyIndex};

/// Fetch and index the remote source. Any failure degrades to an empty index.
async fn build_fuzzy_index(config: &Config, url: &str, aliases: &AliasTable) -> FuzzyIndex {
    let fetcher = match PlaylistFetcher::new(
        &config.user_agent,
        config.fetch_timeout_ms,
        config.fetch_max_retries,
    ) {
        Ok(fetcher) => fetcher,
        Err(e) => {
            tracing::warn!("Fuzzy source disabled, HTTP client unavailable: {}", e);
            return FuzzyIndex::default();
        }
    };

    match fetcher.fetch_text(url).await {
        Ok(text) => {
            let index = FuzzyIndex::from_text(&text, aliases);
            if index.is_empty() {
                tracing::warn!("Fuzzy source {} has no usable entries", url);
            } else {
                tracing::info!("Fuzzy source indexed: {} keys from {}", index.len(), url);
            }
            index
        }
        Err(e) => {
            tracing::warn!(
                "Fuzzy source {} unavailable ({}), using exact matches only",
                url,
                e
            );
            FuzzyIndex::default()
        }
    }
}

pub async fn run(config: &Config, use_fuzzy: bool) -> Result<ReconcileReport> {
    let mut playlist = load_playlist(&config.playlist_path).await?;
    if playlist.is_empty() {
        tracing::warn!("{} has no channels", config.playlist_path.display());
    } else {
        tracing::info!(
            "Loaded {} channels from {}",
            playlist.len(),
            config.playlist_path.display()
        );
    }

    let sources = load_upstream_sources(&config.streams_dir, &config.upstream_files).await?;
    let exact = ExactIndex::build(&sources);
    let source_names: Vec<&str> = sources.iter().map(|s| s.name.as_str()).collect();
    if exact.is_empty() {
        tracing::warn!(
            "No channel ids found in {} (files: {:?})",
            config.streams_dir.display(),
            source_names
        );
    } else {
        tracing::info!(
            "Exact index: {} channel ids from {:?}",
            exact.len(),
            source_names
        );
    }

    let aliases = match &config.alias_file {
        Some(path) => AliasTable::load(path).await?,
        None => AliasTable::builtin(),
    };
    if aliases.is_empty() {
        tracing::debug!("Alias table is empty, fuzzy keys are used as-is");
    }

    let fuzzy = match (&config.fuzzy_source_url, use_fuzzy) {
        (Some(url), true) => build_fuzzy_index(config, url, &aliases).await,
        _ => {
            tracing::info!("Fuzzy source disabled");
            FuzzyIndex::default()
        }
    };

    // The update flow only maintains a ledger the probing flow has created
    let ledger_existed = tokio::fs::try_exists(&config.dead_ledger_path)
        .await
        .unwrap_or(false);
    let mut ledger = DeadLedger::load(&config.dead_ledger_path).await?;
    if !ledger.is_empty() {
        tracing::info!("Excluding {} recorded dead URLs", ledger.len());
    }

    let report = Reconciler::new(&fuzzy, &exact, &config.placeholder_url)
        .run(&mut playlist.entries, &mut ledger);

    save_playlist(&config.playlist_path, &playlist)
        .await
        .context("Failed to save updated playlist")?;

    if ledger_existed {
        ledger
            .persist(&config.dead_ledger_path)
            .await
            .context("Failed to save dead ledger")?;
    }

    Ok(report)
}
