//! Lookup maps over upstream playlists.
//!
//! - [`ExactIndex`]: `tvg-id` → entry, built from the local priority-ordered files.
//! - [`FuzzyIndex`]: normalized display name (and `tvg-id`) → entry, built from the
//!   remote source and widened with the alias table.
//!
//! Both keep the first entry seen for a key; later duplicates are discarded.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{SyncError, SyncResult};
use crate::models::UpstreamEntry;
use crate::services::aliases::AliasTable;
use crate::services::m3u_parser::{self, normalized_name};

/// One parsed upstream file
#[derive(Debug, Clone)]
pub struct UpstreamSource {
    pub name: String,
    pub entries: Vec<UpstreamEntry>,
}

/// Read the upstream files in priority order. Missing files are skipped.
pub async fn load_upstream_sources(dir: &Path, files: &[String]) -> SyncResult<Vec<UpstreamSource>> {
    let mut sources = Vec::with_capacity(files.len());

    for file in files {
        let path: PathBuf = dir.join(file);
        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("Upstream file {} not found, skipping", path.display());
                continue;
            }
            Err(source) => return Err(SyncError::ReadUpstream { path, source }),
        };

        let entries = m3u_parser::parse(&text).entries;
        tracing::debug!("Upstream {}: {} entries", file, entries.len());
        sources.push(UpstreamSource {
            name: file.clone(),
            entries,
        });
    }

    Ok(sources)
}

#[derive(Debug, Clone, Default)]
pub struct ExactIndex {
    by_id: HashMap<String, UpstreamEntry>,
}

impl ExactIndex {
    /// Fold sources in priority order, then file order, keeping the first entry per id
    pub fn build(sources: &[UpstreamSource]) -> Self {
        let mut by_id = HashMap::new();

        for source in sources {
            for entry in &source.entries {
                let id = entry.channel_id();
                if id.is_empty() || by_id.contains_key(&id) {
                    continue;
                }
                by_id.insert(id, entry.clone());
            }
        }

        Self { by_id }
    }

    pub fn lookup(&self, channel_id: &str) -> Option<&UpstreamEntry> {
        if channel_id.is_empty() {
            return None;
        }
        self.by_id.get(channel_id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct FuzzyIndex {
    by_key: HashMap<String, UpstreamEntry>,
}

impl FuzzyIndex {
    pub fn build(entries: &[UpstreamEntry], aliases: &AliasTable) -> Self {
        let mut by_key: HashMap<String, UpstreamEntry> = HashMap::new();

        for entry in entries {
            let name_key = normalized_name(&entry.display_name());
            if !name_key.is_empty() && !by_key.contains_key(&name_key) {
                by_key.insert(name_key, entry.clone());
            }

            let id = entry.channel_id();
            if !id.is_empty() && !by_key.contains_key(&id) {
                by_key.insert(id, entry.clone());
            }
        }

        for (canonical, alternates) in aliases.groups() {
            if let Some(found) = by_key.get(canonical).cloned() {
                for alias in alternates {
                    if !by_key.contains_key(alias) {
                        by_key.insert(alias.clone(), found.clone());
                    }
                }
            } else if let Some(found) = alternates.iter().find_map(|alias| by_key.get(alias).cloned()) {
                // First alias that resolved stands in for the canonical name
                by_key.insert(canonical.to_string(), found);
            }
        }

        Self { by_key }
    }

    /// Parse remote playlist text and index it
    pub fn from_text(text: &str, aliases: &AliasTable) -> Self {
        Self::build(&m3u_parser::parse(text).entries, aliases)
    }

    /// Look up by normalized display name, falling back to channel id
    pub fn lookup(&self, name_key: &str, channel_id: &str) -> Option<&UpstreamEntry> {
        let by_name = if name_key.is_empty() {
            None
        } else {
            self.by_key.get(name_key)
        };

        by_name.or_else(|| {
            if channel_id.is_empty() {
                None
            } else {
                self.by_key.get(channel_id)
            }
        })
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}
