use std::env;
use std::path::PathBuf;

/// Upstream file names in priority order (earlier files win)
pub const DEFAULT_UPSTREAM_FILES: &[&str] = &[
    "cn.m3u",
    "cn_cctv.m3u",
    "cn_cgtn.m3u",
    "cn_112114.m3u",
    "cn_yeslivetv.m3u",
];

pub const DEFAULT_FUZZY_SOURCE_URL: &str =
    "https://raw.githubusercontent.com/fanmingming/live/main/tv/m3u/ipv6.m3u";

/// Marks a channel whose stream is known dead and awaits a replacement
pub const DEFAULT_PLACEHOLDER_URL: &str = "http://0.0.0.0";

pub const DEFAULT_SKIP_LABELS: &[&str] = &["地区限制", "非全天直播", "Geo-blocked", "Not 24/7"];

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    // Files
    pub playlist_path: PathBuf,
    pub dead_ledger_path: PathBuf,
    pub streams_dir: PathBuf,
    pub upstream_files: Vec<String>,
    pub alias_file: Option<PathBuf>,

    // Fuzzy source
    pub fuzzy_source_url: Option<String>,
    pub fetch_timeout_ms: u64,
    pub fetch_max_retries: u32,

    // Probing
    pub placeholder_url: String,
    pub probe_concurrency: usize,
    pub probe_timeout_ms: u64,
    pub probe_range_bytes: u64,
    pub skip_labels: Vec<String>,

    // Misc
    pub user_agent: String,
}

fn list_var(name: &str, default: &[&str]) -> Vec<String> {
    match env::var(name) {
        Ok(raw) => split_list(&raw),
        Err(_) => default.iter().map(|s| s.to_string()).collect(),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        Self {
            // Files
            playlist_path: env::var("PLAYLIST_PATH")
                .unwrap_or_else(|_| "china.m3u".to_string())
                .into(),
            dead_ledger_path: env::var("DEAD_LEDGER_PATH")
                .unwrap_or_else(|_| "china.dead.json".to_string())
                .into(),
            streams_dir: env::var("STREAMS_DIR")
                .unwrap_or_else(|_| "streams".to_string())
                .into(),
            upstream_files: list_var("UPSTREAM_FILES", DEFAULT_UPSTREAM_FILES),
            alias_file: env::var("ALIAS_FILE")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from),

            // Fuzzy source - empty value disables it
            fuzzy_source_url: match env::var("FUZZY_SOURCE_URL") {
                Ok(v) if v.trim().is_empty() => None,
                Ok(v) => Some(v.trim().to_string()),
                Err(_) => Some(DEFAULT_FUZZY_SOURCE_URL.to_string()),
            },
            fetch_timeout_ms: env::var("FETCH_TIMEOUT_MS")
                .unwrap_or_else(|_| "30000".to_string())
                .parse()
                .unwrap_or(30_000), // 30 seconds
            fetch_max_retries: env::var("FETCH_MAX_RETRIES")
                .unwrap_or_else(|_| "2".to_string())
                .parse()
                .unwrap_or(2),

            // Probing
            placeholder_url: env::var("PLACEHOLDER_URL")
                .unwrap_or_else(|_| DEFAULT_PLACEHOLDER_URL.to_string()),
            probe_concurrency: env::var("PROBE_CONCURRENCY")
                .unwrap_or_else(|_| "8".to_string())
                .parse()
                .unwrap_or(8),
            probe_timeout_ms: env::var("PROBE_TIMEOUT_MS")
                .unwrap_or_else(|_| "12000".to_string())
                .parse()
                .unwrap_or(12_000), // 12 seconds
            probe_range_bytes: env::var("PROBE_RANGE_BYTES")
                .unwrap_or_else(|_| "1024".to_string())
                .parse()
                .unwrap_or(1024),
            skip_labels: list_var("SKIP_LABELS", DEFAULT_SKIP_LABELS),

            // Misc
            user_agent: env::var("USER_AGENT")
                .unwrap_or_else(|_| "Mozilla/5.0 (compatible; IPTV checker)".to_string()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_list() {
        assert_eq!(
            split_list(" cn.m3u, ,cn_cctv.m3u ,"),
            vec!["cn.m3u".to_string(), "cn_cctv.m3u".to_string()]
        );
        assert!(split_list("").is_empty());
    }

    #[test]
    fn test_list_var_default() {
        let files = list_var("PLAYLIST_SYNC_TEST_UNSET_VARIABLE", DEFAULT_UPSTREAM_FILES);
        assert_eq!(files.len(), 5);
        assert_eq!(files[0], "cn.m3u");
    }
}
