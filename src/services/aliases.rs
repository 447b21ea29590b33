use std::path::Path;

use crate::error::{SyncError, SyncResult};
use crate::services::m3u_parser::normalized_name;

/// CCTV channel numbers and their Chinese titles as they appear in curated playlists
const CCTV_CHANNELS: &[(&str, &str)] = &[
    ("1", "综合"),
    ("2", "财经"),
    ("3", "综艺"),
    ("4", "中文国际"),
    ("5", "体育"),
    ("5+", "体育赛事"),
    ("6", "电影"),
    ("7", "国防军事"),
    ("8", "电视剧"),
    ("9", "纪录"),
    ("10", "科教"),
    ("11", "戏曲"),
    ("12", "社会与法"),
    ("13", "新闻"),
    ("14", "少儿"),
    ("15", "音乐"),
    ("17", "农业农村"),
];

const EXTRA_ALIASES: &[(&str, &[&str])] = &[
    ("cgtn", &["cgtnenglish", "cgtn英语"]),
    ("cgtn纪录", &["cgtndocumentary", "cgtn记录"]),
    ("cctv5+", &["cctv5plus"]),
];

/// Canonical normalized name mapped to alternate spellings.
/// Only the fuzzy index consults it. Group order and alias order are significant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasTable {
    groups: Vec<(String, Vec<String>)>,
}

impl AliasTable {
    pub fn new<I, A>(groups: I) -> Self
    where
        I: IntoIterator<Item = (String, A)>,
        A: IntoIterator<Item = String>,
    {
        let groups = groups
            .into_iter()
            .map(|(canonical, aliases)| {
                let aliases = aliases
                    .into_iter()
                    .map(|alias| normalized_name(&alias))
                    .filter(|alias| !alias.is_empty())
                    .collect();
                (normalized_name(&canonical), aliases)
            })
            .filter(|(canonical, _)| !canonical.is_empty())
            .collect();

        Self { groups }
    }

    /// Built-in spellings for CCTV and CGTN channels
    pub fn builtin() -> Self {
        let cctv = CCTV_CHANNELS.iter().map(|(num, title)| {
            (
                format!("cctv{}", num),
                vec![
                    format!("cctv-{}", num),
                    format!("cctv-{}{}", num, title),
                    format!("cctv{}{}", num, title),
                ],
            )
        });
        let extra = EXTRA_ALIASES.iter().map(|(canonical, aliases)| {
            (
                canonical.to_string(),
                aliases.iter().map(|a| a.to_string()).collect::<Vec<_>>(),
            )
        });

        Self::new(cctv.chain(extra))
    }

    /// Read a JSON object of `"canonical": ["alias", ...]` groups, kept in document order
    pub async fn load(path: &Path) -> SyncResult<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| SyncError::ReadAliases {
                path: path.to_path_buf(),
                source,
            })?;

        let invalid = |source| SyncError::InvalidAliases {
            path: path.to_path_buf(),
            source,
        };

        let raw: serde_json::Map<String, serde_json::Value> =
            serde_json::from_str(&content).map_err(invalid)?;
        let groups = raw
            .into_iter()
            .map(|(canonical, aliases)| {
                serde_json::from_value::<Vec<String>>(aliases).map(|aliases| (canonical, aliases))
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(invalid)?;

        let table = Self::new(groups);
        tracing::info!("Loaded {} alias groups from {}", table.len(), path.display());
        Ok(table)
    }

    pub fn groups(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.groups
            .iter()
            .map(|(canonical, aliases)| (canonical.as_str(), aliases.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}
