//! Persistent record of stream URLs confirmed dead, keyed by `tvg-id`.
//!
//! Stored as a pretty-printed JSON object (`{ "CCTV5.cn": "http://dead/url" }`).
//! A missing file is an empty ledger.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{SyncError, SyncResult};
use crate::services::storage::write_atomic;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeadLedger {
    records: BTreeMap<String, String>,
}

impl DeadLedger {
    pub async fn load(path: &Path) -> SyncResult<Self> {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No dead ledger at {}, starting empty", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(SyncError::ReadLedger {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let ledger: Self = serde_json::from_str(&content).map_err(|source| SyncError::InvalidLedger {
            path: path.to_path_buf(),
            source,
        })?;

        tracing::debug!("Loaded {} dead ledger records", ledger.len());
        Ok(ledger)
    }

    pub async fn persist(&self, path: &Path) -> SyncResult<()> {
        let content = serde_json::to_string_pretty(self)?;
        write_atomic(path, &content).await
    }

    /// Dead URL recorded for a channel, if any
    pub fn recorded_dead(&self, channel_id: &str) -> Option<&str> {
        if channel_id.is_empty() {
            return None;
        }
        self.records.get(channel_id).map(String::as_str)
    }

    /// Upsert. Entries without a channel id cannot be tracked and are ignored.
    pub fn record_dead(&mut self, channel_id: &str, url: &str) {
        if channel_id.is_empty() {
            return;
        }
        self.records.insert(channel_id.to_string(), url.to_string());
    }

    /// Remove the record for a channel, returning whether one existed
    pub fn clear(&mut self, channel_id: &str) -> bool {
        self.records.remove(channel_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_clear() {
        let mut ledger = DeadLedger::default();
        ledger.record_dead("CCTV5.cn", "http://old");
        ledger.record_dead("CCTV5.cn", "http://older");
        ledger.record_dead("", "http://ignored");

        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.recorded_dead("CCTV5.cn"), Some("http://older"));
        assert_eq!(ledger.recorded_dead(""), None);

        assert!(ledger.clear("CCTV5.cn"));
        assert!(!ledger.clear("CCTV5.cn"));
        assert!(ledger.is_empty());
    }

    #[tokio::test]
    async fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = DeadLedger::load(&dir.path().join("china.dead.json")).await.unwrap();
        assert!(ledger.is_empty());
    }

    #[tokio::test]
    async fn test_persist_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("china.dead.json");

        let mut ledger = DeadLedger::default();
        ledger.record_dead("CCTV5.cn", "http://dead/5");
        ledger.record_dead("CCTV1.cn", "http://dead/1");
        ledger.persist(&path).await.unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            written,
            "{\n  \"CCTV1.cn\": \"http://dead/1\",\n  \"CCTV5.cn\": \"http://dead/5\"\n}"
        );

        let reloaded = DeadLedger::load(&path).await.unwrap();
        assert_eq!(reloaded, ledger);
    }

    #[tokio::test]
    async fn test_load_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("china.dead.json");
        std::fs::write(&path, "[1, 2]").unwrap();

        let err = DeadLedger::load(&path).await.unwrap_err();
        assert!(matches!(err, SyncError::InvalidLedger { .. }));
    }
}
