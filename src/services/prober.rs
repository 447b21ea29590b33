//! Stream liveness checks.
//!
//! A probe requests only the first bytes of a stream and maps the outcome to
//! [`Liveness`]. Only definitive answers (connection-level failures, 404, 410)
//! count as dead; timeouts, 403 and 5xx are reported as unknown so a flaky
//! origin never loses its URL.

use futures::stream::{self, StreamExt};
use regex::Regex;
use reqwest::{header, Client};
use std::future::Future;
use std::time::Duration;
use url::Url;

use crate::models::{ChannelEntry, Liveness};

/// Injected liveness capability
pub trait Prober {
    fn probe(&self, url: &str) -> impl Future<Output = Liveness>;
}

/// Map an HTTP status to a verdict
pub fn classify_status(status: u16) -> Liveness {
    match status {
        404 | 410 => Liveness::Dead,
        403 => Liveness::Unknown,
        s if s >= 500 => Liveness::Unknown,
        _ => Liveness::Alive,
    }
}

/// Map a transport failure to a verdict.
/// Refused, unresolved, unreachable and TLS handshake failures all surface as connect errors.
pub fn classify_error(err: &reqwest::Error) -> Liveness {
    if err.is_timeout() {
        Liveness::Unknown
    } else if err.is_connect() {
        Liveness::Dead
    } else {
        Liveness::Unknown
    }
}

/// reqwest-backed prober issuing ranged GET requests
pub struct HttpProber {
    client: Client,
    range: String,
}

impl HttpProber {
    pub fn new(user_agent: &str, timeout_ms: u64, range_bytes: u64) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_millis(timeout_ms))
            .gzip(false)
            // Many IPTV origins run self-signed certs; a bad cert is not a dead stream
            .danger_accept_invalid_certs(true)
            .build()?;

        Ok(Self {
            client,
            range: format!("bytes=0-{}", range_bytes.saturating_sub(1)),
        })
    }
}

impl Prober for HttpProber {
    async fn probe(&self, url: &str) -> Liveness {
        match Url::parse(url) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
            _ => {
                tracing::debug!("Cannot probe non-HTTP URL {}", url);
                return Liveness::Unknown;
            }
        }

        let result = self
            .client
            .get(url)
            .header(header::RANGE, &self.range)
            .send()
            .await;

        // The body is never read; dropping the response closes the stream.
        let liveness = match result {
            Ok(resp) => classify_status(resp.status().as_u16()),
            Err(err) => {
                tracing::debug!("Probe error for {}: {}", url, err);
                classify_error(&err)
            }
        };

        tracing::debug!("Probe {} -> {}", url, liveness);
        liveness
    }
}

/// Decides which entries are never probed
#[derive(Debug, Clone)]
pub struct SkipPolicy {
    placeholder: String,
    patterns: Vec<Regex>,
}

impl SkipPolicy {
    pub fn new(placeholder: &str, label_patterns: &[String]) -> Result<Self, regex::Error> {
        let patterns = label_patterns
            .iter()
            .map(|p| Regex::new(p))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            placeholder: placeholder.to_string(),
            patterns,
        })
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    /// Placeholders are already known dead; tagged entries (geo-blocked,
    /// part-time broadcasts) cannot be judged from here
    pub fn should_skip(&self, entry: &ChannelEntry) -> bool {
        if entry.is_placeholder(&self.placeholder) {
            return true;
        }
        let labels = entry.labels().join(" ");
        !labels.is_empty() && self.patterns.iter().any(|p| p.is_match(&labels))
    }
}

/// Probe `(index, url)` targets with at most `concurrency` requests in flight.
/// Results come back in completion order.
pub async fn probe_all<P: Prober>(
    prober: &P,
    targets: Vec<(usize, String)>,
    concurrency: usize,
) -> Vec<(usize, Liveness)> {
    stream::iter(targets)
        .map(|(idx, url)| async move { (idx, prober.probe(&url).await) })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await
}

/// Canned verdicts keyed by URL; anything unlisted is alive
#[cfg(test)]
pub struct StaticProber {
    pub verdicts: std::collections::HashMap<String, Liveness>,
    pub calls: std::sync::Mutex<Vec<String>>,
}

#[cfg(test)]
impl StaticProber {
    pub fn new(verdicts: &[(&str, Liveness)]) -> Self {
        Self {
            verdicts: verdicts.iter().map(|(u, l)| (u.to_string(), *l)).collect(),
            calls: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl Prober for StaticProber {
    async fn probe(&self, url: &str) -> Liveness {
        self.calls.lock().unwrap().push(url.to_string());
        self.verdicts.get(url).copied().unwrap_or(Liveness::Alive)
    }
}
