use crate::models::{ChannelEntry, MatchSource, ReconcileReport, StreamChange, UpstreamEntry};
use crate::services::dead_ledger::DeadLedger;
use crate::services::m3u_parser::normalized_name;
use crate::services::upstream_index::{ExactIndex, FuzzyIndex};

/// Outcome of candidate selection for one entry
enum Pick<'a> {
    Accepted(&'a UpstreamEntry, MatchSource),
    /// Every source that knew the channel offered its recorded dead URL
    Excluded,
    Nothing,
}

/// Matches working-playlist entries against the upstream indexes.
///
/// The fuzzy (name-keyed) source strictly dominates the exact (`tvg-id`-keyed) one:
/// once a usable fuzzy candidate is found the exact index is not consulted,
/// even when the fuzzy candidate changes nothing.
pub struct Reconciler<'a> {
    fuzzy: &'a FuzzyIndex,
    exact: &'a ExactIndex,
    placeholder: &'a str,
}

impl<'a> Reconciler<'a> {
    pub fn new(fuzzy: &'a FuzzyIndex, exact: &'a ExactIndex, placeholder: &'a str) -> Self {
        Self {
            fuzzy,
            exact,
            placeholder,
        }
    }

    fn pick(&self, name_key: &str, channel_id: &str, known_dead: Option<&str>) -> Pick<'a> {
        let usable = |candidate: &UpstreamEntry| known_dead != Some(candidate.url.as_str());
        let mut excluded = false;

        if let Some(candidate) = self.fuzzy.lookup(name_key, channel_id) {
            if usable(candidate) {
                return Pick::Accepted(candidate, MatchSource::Fuzzy);
            }
            excluded = true;
        }

        if let Some(candidate) = self.exact.lookup(channel_id) {
            if usable(candidate) {
                return Pick::Accepted(candidate, MatchSource::Exact);
            }
            excluded = true;
        }

        if excluded {
            Pick::Excluded
        } else {
            Pick::Nothing
        }
    }

    /// Update entries in place. Only `url` and `directives` ever change;
    /// order and metadata lines are untouched.
    pub fn run(&self, entries: &mut [ChannelEntry], ledger: &mut DeadLedger) -> ReconcileReport {
        let mut report = ReconcileReport::default();

        for entry in entries.iter_mut() {
            let channel_id = entry.channel_id();
            let name_key = normalized_name(&entry.display_name());
            let is_placeholder = entry.is_placeholder(self.placeholder);
            let known_dead = ledger.recorded_dead(&channel_id).map(str::to_string);

            match self.pick(&name_key, &channel_id, known_dead.as_deref()) {
                Pick::Accepted(candidate, source) => {
                    let old_url = entry.url.clone();
                    if entry.adopt_stream(candidate) {
                        let channel = entry.label_for_report();
                        tracing::info!("[update:{}] {}", source, channel);
                        if old_url != entry.url {
                            tracing::info!("    old: {}", old_url);
                            tracing::info!("    new: {}", entry.url);
                        }
                        match source {
                            MatchSource::Fuzzy => report.updated_fuzzy += 1,
                            MatchSource::Exact => report.updated_exact += 1,
                        }
                        report.changes.push(StreamChange {
                            channel,
                            old_url,
                            new_url: entry.url.clone(),
                            source,
                        });
                    } else {
                        report.unchanged += 1;
                    }

                    if known_dead.is_some() && ledger.clear(&channel_id) {
                        tracing::info!("Dead record cleared for {}", channel_id);
                        report.cleared.push(channel_id);
                    }
                }
                Pick::Excluded => {
                    tracing::debug!(
                        "Only the recorded dead URL is offered for {}",
                        entry.label_for_report()
                    );
                    report.unchanged += 1;
                    if is_placeholder {
                        report.unresolved.push(entry.label_for_report());
                    }
                }
                Pick::Nothing => {
                    report.unchanged += 1;
                    if is_placeholder {
                        report.unresolved.push(entry.label_for_report());
                    } else {
                        report.unmatched.push(entry.label_for_report());
                    }
                }
            }
        }

        report
    }
}
