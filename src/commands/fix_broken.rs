//! Probing flow: test every eligible stream, park dead ones on the placeholder
//! URL and remember them in the dead ledger so `update` will not pick them again.

use anyhow::{Context, Result};

use crate::config::Config;
use crate::models::{ChannelEntry, DeadStream, Liveness, ProbeReport};
use crate::services::dead_ledger::DeadLedger;
use crate::services::m3u_parser::{load_playlist, save_playlist};
use crate::services::prober::{probe_all, HttpProber, Prober, SkipPolicy};

/// Probe eligible entries and apply the verdicts.
///
/// Probes run concurrently; verdicts are applied afterwards in playlist order,
/// one per entry.
pub async fn check_entries<P: Prober>(
    prober: &P,
    entries: &mut [ChannelEntry],
    ledger: &mut DeadLedger,
    policy: &SkipPolicy,
    concurrency: usize,
) -> ProbeReport {
    let mut report = ProbeReport {
        total: entries.len(),
        ..Default::default()
    };

    let targets: Vec<(usize, String)> = entries
        .iter()
        .enumerate()
        .filter(|(_, entry)| !policy.should_skip(entry))
        .map(|(idx, entry)| (idx, entry.url.clone()))
        .collect();
    report.skipped = report.total - targets.len();

    tracing::info!(
        "{} channels, skipping {} (tagged or placeholder), probing {}",
        report.total,
        report.skipped,
        targets.len()
    );

    let mut results = probe_all(prober, targets, concurrency).await;
    results.sort_by_key(|(idx, _)| *idx);

    for (idx, liveness) in results {
        let entry = &mut entries[idx];
        let channel_id = entry.channel_id();
        report.record(liveness);

        match liveness {
            Liveness::Dead => {
                tracing::warn!("[dead] {}  {}", entry.label_for_report(), entry.url);
                ledger.record_dead(&channel_id, &entry.url);
                report.dead_streams.push(DeadStream {
                    channel: entry.label_for_report(),
                    url: entry.url.clone(),
                });
                entry.url = policy.placeholder().to_string();
            }
            Liveness::Alive => {
                if ledger.recorded_dead(&channel_id) == Some(entry.url.as_str()) {
                    tracing::info!("[recovered] {}", entry.label_for_report());
                    ledger.clear(&channel_id);
                    report.recovered.push(channel_id);
                }
            }
            Liveness::Unknown => {
                tracing::warn!(
                    "[unknown] {} kept, probe inconclusive: {}",
                    entry.label_for_report(),
                    entry.url
                );
            }
        }
    }

    report.ledger_size = ledger.len();
    report
}

pub async fn run(config: &Config) -> Result<ProbeReport> {
    let mut playlist = load_playlist(&config.playlist_path).await?;
    let mut ledger = DeadLedger::load(&config.dead_ledger_path).await?;

    let policy = SkipPolicy::new(&config.placeholder_url, &config.skip_labels)
        .context("Invalid SKIP_LABELS pattern")?;
    let prober = HttpProber::new(
        &config.user_agent,
        config.probe_timeout_ms,
        config.probe_range_bytes,
    )
    .context("Failed to create HTTP client")?;

    let report = check_entries(
        &prober,
        &mut playlist.entries,
        &mut ledger,
        &policy,
        config.probe_concurrency,
    )
    .await;

    // Dead URLs must be on record before the playlist forgets them
    ledger
        .persist(&config.dead_ledger_path)
        .await
        .context("Failed to save dead ledger")?;
    save_playlist(&config.playlist_path, &playlist)
        .await
        .context("Failed to save probed playlist")?;

    Ok(report)
}
