use std::path::{Path, PathBuf};
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;

use crate::error::{SyncError, SyncResult};

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Replace `path` with `content` via a sibling temp file and rename,
/// so a failed run never leaves a half-written playlist or ledger behind.
pub async fn write_atomic(path: &Path, content: &str) -> SyncResult<()> {
    let tmp = tmp_path(path);
    let wrap = |source| SyncError::Write {
        path: path.to_path_buf(),
        source,
    };

    let mut file = File::create(&tmp).await.map_err(wrap)?;
    file.write_all(content.as_bytes()).await.map_err(wrap)?;
    file.sync_all().await.map_err(wrap)?;
    drop(file);

    if let Err(e) = fs::rename(&tmp, path).await {
        let _ = fs::remove_file(&tmp).await;
        return Err(wrap(e));
    }

    Ok(())
}
