use serde::{Deserialize, Serialize};

use crate::services::m3u_parser;

/// Single playlist record: the #EXTINF line, its directive lines and the stream URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelEntry {
    /// Full `#EXTINF:` descriptor line, never rewritten
    pub metadata: String,
    /// Auxiliary lines (#EXTVLCOPT, #KODIPROP, ...) kept in original order
    #[serde(default)]
    pub directives: Vec<String>,
    pub url: String,
}

/// Upstream playlists share the working playlist's shape but are only ever read
pub type UpstreamEntry = ChannelEntry;

impl ChannelEntry {
    pub fn new(metadata: impl Into<String>, directives: Vec<String>, url: impl Into<String>) -> Self {
        Self {
            metadata: metadata.into(),
            directives,
            url: url.into(),
        }
    }

    /// `tvg-id` attribute, empty when absent
    pub fn channel_id(&self) -> String {
        m3u_parser::channel_id(&self.metadata)
    }

    pub fn display_name(&self) -> String {
        m3u_parser::display_name(&self.metadata)
    }

    /// Bracketed tags in the display name, e.g. `[Geo-blocked]`
    pub fn labels(&self) -> Vec<String> {
        m3u_parser::labels(&self.metadata)
    }

    pub fn is_placeholder(&self, placeholder: &str) -> bool {
        self.url == placeholder
    }

    /// Take over the stream URL and directives of `candidate`.
    /// Returns false when nothing would change.
    pub fn adopt_stream(&mut self, candidate: &UpstreamEntry) -> bool {
        if self.url == candidate.url && self.directives == candidate.directives {
            return false;
        }
        self.url = candidate.url.clone();
        self.directives = candidate.directives.clone();
        true
    }

    /// Name used in logs and reports
    pub fn label_for_report(&self) -> String {
        let name = self.display_name();
        let id = self.channel_id();
        match (name.is_empty(), id.is_empty()) {
            (false, false) => format!("{} ({})", name, id),
            (false, true) => name,
            (true, false) => id,
            (true, true) => self.metadata.clone(),
        }
    }
}

/// Parsed playlist: header line plus ordered entries
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Playlist {
    /// First line of the file (usually `#EXTM3U ...`), carried through untouched
    pub header: String,
    pub entries: Vec<ChannelEntry>,
}

impl Playlist {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
