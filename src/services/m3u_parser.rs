use lazy_static::lazy_static;
use regex::Regex;
use std::path::Path;

use crate::error::{SyncError, SyncResult};
use crate::models::{ChannelEntry, Playlist};
use crate::services::storage::write_atomic;

const EXTINF_PREFIX: &str = "#EXTINF";

lazy_static! {
    /// Regex to parse EXTINF attributes (tvg-id="...", group-title="...", etc)
    static ref ATTR_REGEX: Regex = Regex::new(r#"(\w+(?:-\w+)*)="([^"]*)""#).unwrap();

    /// Bracketed tags in a display name: [Geo-blocked], [Not 24/7], [地区限制]
    static ref LABEL_REGEX: Regex = Regex::new(r"\[([^\]]+)\]").unwrap();

    /// Tags stripped before name comparison, ASCII and full-width brackets alike
    static ref TAG_REGEX: Regex = Regex::new(r"\[[^\]]*\]|\([^)]*\)|【[^】]*】|（[^）]*）").unwrap();

    /// Resolution annotations that do not distinguish channels.
    /// Group 1 catches CCTV-4K / CCTV-8K, where the marker is the channel itself.
    static ref RESOLUTION_REGEX: Regex = Regex::new(
        r"(?i)\b(cctv-?[48]k)\b|\b(?:\d{3,4}[pi]|[48]k|uhd|fhd|hd|sd)\b|超高清|高清|超清|标清|蓝光"
    )
    .unwrap();
}

/// Split an EXTINF line into (attribute header, title) at the first comma
/// outside a quoted attribute value. Commas inside `group-title="a,b"` do not count.
fn split_extinf(line: &str) -> (&str, Option<&str>) {
    let mut in_quotes = false;
    for (idx, ch) in line.char_indices() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => return (&line[..idx], Some(&line[idx + 1..])),
            _ => {}
        }
    }
    (line, None)
}

/// Value of a named EXTINF attribute, first occurrence wins
pub fn attribute(metadata: &str, key: &str) -> Option<String> {
    let (header, _) = split_extinf(metadata);
    ATTR_REGEX
        .captures_iter(header)
        .find(|caps| caps.get(1).map(|m| m.as_str()) == Some(key))
        .and_then(|caps| caps.get(2).map(|m| m.as_str().to_string()))
}

/// `tvg-id` of an EXTINF line; empty string when missing or unparseable
pub fn channel_id(metadata: &str) -> String {
    attribute(metadata, "tvg-id").unwrap_or_default()
}

/// Free text after the attribute header, trimmed
pub fn display_name(metadata: &str) -> String {
    split_extinf(metadata)
        .1
        .map(|title| title.trim().to_string())
        .unwrap_or_default()
}

pub fn labels(metadata: &str) -> Vec<String> {
    let name = display_name(metadata);
    LABEL_REGEX
        .captures_iter(&name)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
        .collect()
}

/// Comparison key for name-based matching.
/// Drops bracketed tags and resolution markers, removes whitespace, lower-cases.
/// Best effort: "CCTV-1 HD [Geo-blocked]" and "cctv-1" collide on purpose.
pub fn normalized_name(name: &str) -> String {
    let without_tags = TAG_REGEX.replace_all(name, " ");
    let without_resolution = RESOLUTION_REGEX.replace_all(&without_tags, |caps: &regex::Captures| {
        caps.get(1)
            .map_or_else(|| " ".to_string(), |channel| channel.as_str().to_string())
    });
    without_resolution
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

fn is_directive(line: &str) -> bool {
    line.starts_with('#') && !line.starts_with(EXTINF_PREFIX)
}

/// Parse playlist text.
///
/// The first line is kept as the header. Every `#EXTINF` line opens an entry,
/// `#`-prefixed lines directly below it are its directives, and the next line
/// must be the stream URL. Entries without a URL are dropped.
pub fn parse(text: &str) -> Playlist {
    let lines: Vec<&str> = text.split('\n').map(str::trim_end).collect();
    let header = lines.first().copied().unwrap_or_default().to_string();

    let mut entries = Vec::new();
    let mut i = 1;

    while i < lines.len() {
        let line = lines[i];
        if !line.starts_with(EXTINF_PREFIX) {
            i += 1;
            continue;
        }

        let metadata = line.to_string();
        let mut directives = Vec::new();
        i += 1;

        while i < lines.len() && is_directive(lines[i]) {
            directives.push(lines[i].to_string());
            i += 1;
        }

        // A blank line or a new #EXTINF here leaves the entry without URL: drop it.
        // The loop re-examines line i, so an interrupting #EXTINF still opens its own entry.
        if let Some(url) = lines.get(i) {
            if !url.is_empty() && !url.starts_with('#') {
                entries.push(ChannelEntry::new(metadata, directives, *url));
                i += 1;
            }
        }
    }

    Playlist { header, entries }
}

/// Render a playlist: header, then metadata, directives and URL per entry,
/// with a trailing newline
pub fn serialize(playlist: &Playlist) -> String {
    let mut out = String::with_capacity(playlist.header.len() + playlist.entries.len() * 160);
    out.push_str(&playlist.header);
    out.push('\n');

    for entry in &playlist.entries {
        out.push_str(&entry.metadata);
        out.push('\n');
        for directive in &entry.directives {
            out.push_str(directive);
            out.push('\n');
        }
        out.push_str(&entry.url);
        out.push('\n');
    }

    out
}

pub async fn load_playlist(path: &Path) -> SyncResult<Playlist> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| SyncError::ReadPlaylist {
            path: path.to_path_buf(),
            source,
        })?;
    let playlist = parse(&text);
    tracing::debug!("Loaded {} entries from {}", playlist.len(), path.display());
    Ok(playlist)
}

pub async fn save_playlist(path: &Path, playlist: &Playlist) -> SyncResult<()> {
    write_atomic(path, &serialize(playlist)).await?;
    tracing::debug!("Wrote {} entries to {}", playlist.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = concat!(
        "#EXTM3U x-tvg-url=\"https://epg.example/e.xml\"\n",
        "#EXTINF:-1 tvg-id=\"CCTV1.cn\" tvg-logo=\"http://logo/1.png\" group-title=\"央视\",CCTV-1 综合\n",
        "http://a.example/cctv1.m3u8\n",
        "#EXTINF:-1 tvg-id=\"CCTV5.cn\" group-title=\"央视\",CCTV-5 体育 [Geo-blocked]\n",
        "#EXTVLCOPT:http-referrer=http://ref.example/\n",
        "#EXTVLCOPT:http-user-agent=Mozilla/5.0\n",
        "http://b.example/cctv5.m3u8\n",
        "#EXTINF:-1 group-title=\"卫视\",湖南卫视\n",
        "http://0.0.0.0\n",
    );

    #[test]
    fn test_parse_entries() {
        let playlist = parse(SAMPLE);

        assert_eq!(playlist.header, "#EXTM3U x-tvg-url=\"https://epg.example/e.xml\"");
        assert_eq!(playlist.len(), 3);

        let cctv5 = &playlist.entries[1];
        assert_eq!(cctv5.channel_id(), "CCTV5.cn");
        assert_eq!(cctv5.directives.len(), 2);
        assert_eq!(cctv5.url, "http://b.example/cctv5.m3u8");

        assert_eq!(playlist.entries[2].channel_id(), "");
        assert_eq!(playlist.entries[2].url, "http://0.0.0.0");
    }

    #[test]
    fn test_round_trip_is_byte_identical() {
        let playlist = parse(SAMPLE);
        assert_eq!(serialize(&playlist), SAMPLE);
        assert_eq!(parse(&serialize(&playlist)), playlist);
    }

    #[test]
    fn test_parse_drops_entry_without_url() {
        let text = concat!(
            "#EXTM3U\n",
            "#EXTINF:-1 tvg-id=\"a\",A\n",
            "#EXTVLCOPT:http-referrer=http://ref/\n",
            "\n",
            "#EXTINF:-1 tvg-id=\"b\",B\n",
            "http://b\n",
            "#EXTINF:-1 tvg-id=\"c\",C\n",
        );
        let playlist = parse(text);

        assert_eq!(playlist.len(), 1);
        assert_eq!(playlist.entries[0].channel_id(), "b");
    }

    #[test]
    fn test_parse_interrupting_extinf_opens_new_entry() {
        let text = "#EXTM3U\n#EXTINF:-1 tvg-id=\"a\",A\n#EXTINF:-1 tvg-id=\"b\",B\nhttp://b\n";
        let playlist = parse(text);

        assert_eq!(playlist.len(), 1);
        assert_eq!(playlist.entries[0].channel_id(), "b");
        assert!(playlist.entries[0].directives.is_empty());
    }

    #[test]
    fn test_parse_crlf_and_empty_input() {
        let playlist = parse("#EXTM3U\r\n#EXTINF:-1,A\r\nhttp://a\r\n");
        assert_eq!(playlist.header, "#EXTM3U");
        assert_eq!(playlist.entries[0].url, "http://a");

        let empty = parse("");
        assert_eq!(empty.header, "");
        assert!(empty.is_empty());
        assert_eq!(serialize(&empty), "\n");
    }

    #[test]
    fn test_channel_id() {
        assert_eq!(channel_id(r#"#EXTINF:-1 tvg-id="CCTV1.cn",CCTV-1"#), "CCTV1.cn");
        assert_eq!(channel_id(r#"#EXTINF:-1 tvg-id="",CCTV-1"#), "");
        assert_eq!(channel_id("#EXTINF:-1,CCTV-1"), "");
        assert_eq!(channel_id("garbage \"line"), "");
        // x-tvg-id is a different attribute
        assert_eq!(channel_id(r#"#EXTINF:-1 x-tvg-id="nope" tvg-id="yes",N"#), "yes");
        // attribute-looking text in the title is ignored
        assert_eq!(channel_id(r#"#EXTINF:-1,Name tvg-id="fake""#), "");
    }

    #[test]
    fn test_display_name() {
        assert_eq!(
            display_name(r#"#EXTINF:-1 group-title="News, Intl" tvg-id="x",  CGTN, English "#),
            "CGTN, English"
        );
        assert_eq!(display_name("#EXTINF:-1 tvg-id=\"x\""), "");
    }

    #[test]
    fn test_labels() {
        let line = r#"#EXTINF:-1 tvg-id="x" group-title="[ignored]",Channel [Geo-blocked] [Not 24/7]"#;
        assert_eq!(labels(line), vec!["Geo-blocked", "Not 24/7"]);
        assert!(labels("#EXTINF:-1,Plain").is_empty());
    }

    #[test]
    fn test_normalized_name() {
        assert_eq!(normalized_name("CCTV-1 综合 [Geo-blocked]"), "cctv-1综合");
        assert_eq!(normalized_name("CCTV1 HD"), "cctv1");
        assert_eq!(normalized_name("CCTV5+ 1080p"), "cctv5+");
        assert_eq!(normalized_name("湖南卫视 高清"), "湖南卫视");
        assert_eq!(normalized_name("Phoenix (Hong Kong) 4K"), "phoenix");
        assert_eq!(normalized_name("  "), "");
    }

    #[test]
    fn test_normalized_name_keeps_uhd_channel_designator() {
        assert_eq!(normalized_name("CCTV-4K"), "cctv-4k");
        assert_eq!(normalized_name("CCTV-8K 超高清"), "cctv-8k");
        assert_eq!(normalized_name("CCTV4K 超高清"), "cctv4k");
        assert_eq!(normalized_name("CCTV1 4K"), "cctv1");
        assert_eq!(normalized_name("东方卫视 超高清"), "东方卫视");
    }

    #[tokio::test]
    async fn test_load_and_save_playlist() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("china.m3u");
        std::fs::write(&path, SAMPLE).unwrap();

        let mut playlist = load_playlist(&path).await.unwrap();
        playlist.entries[0].url = "http://new.example/cctv1.m3u8".to_string();
        save_playlist(&path, &playlist).await.unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("#EXTM3U x-tvg-url="));
        assert!(written.contains("http://new.example/cctv1.m3u8\n"));
        assert!(!written.contains("http://a.example/cctv1.m3u8"));
    }

    #[tokio::test]
    async fn test_load_missing_playlist_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_playlist(&dir.path().join("absent.m3u")).await.unwrap_err();
        assert!(matches!(err, SyncError::ReadPlaylist { .. }));
    }
}
