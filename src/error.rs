use std::path::PathBuf;

use thiserror::Error;

/// Failures that abort a run. Everything recoverable (malformed playlist lines,
/// transient probe errors, an unreachable fuzzy source) is handled where it occurs.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("failed to read playlist {}", .path.display())]
    ReadPlaylist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read upstream playlist {}", .path.display())]
    ReadUpstream {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read dead ledger {}", .path.display())]
    ReadLedger {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("dead ledger {} is not a JSON object of strings", .path.display())]
    InvalidLedger {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to read alias file {}", .path.display())]
    ReadAliases {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("alias file {} is not a JSON object of string arrays", .path.display())]
    InvalidAliases {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to write {}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode dead ledger")]
    EncodeLedger(#[from] serde_json::Error),
}

pub type SyncResult<T> = Result<T, SyncError>;
