use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tracing::debug;

use crate::aggregate::Sample;
use crate::config::SourceConfig;

/// Reading durations in seconds keyed by epoch timestamp.
pub type ReadTimes = BTreeMap<i64, u64>;

/// Provider of raw reading-time samples.
pub trait ReadTimeSource: Send + Sync {
    /// Fetch the full timestamp -> duration mapping.
    fn fetch(&self) -> impl std::future::Future<Output = Result<ReadTimes>> + Send;
}

/// Turns fetched read times into aggregator input.
pub fn samples(read_times: &ReadTimes) -> impl Iterator<Item = Sample> + '_ {
    read_times.iter().map(|(&timestamp, &seconds)| Sample { timestamp, seconds })
}

/// HTTP client for the WeRead reading summary endpoint.
pub struct WeReadClient {
    http: reqwest::Client,
    endpoint: String,
    cookie: String,
}

impl WeReadClient {
    /// Create a new client. Requires a session cookie.
    pub fn new(cfg: &SourceConfig) -> Result<Self> {
        cfg.validate()?;

        let timeout = if cfg.timeout.is_zero() {
            Duration::from_secs(10)
        } else {
            cfg.timeout
        };

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("building HTTP client")?;

        Ok(Self {
            http,
            endpoint: cfg.endpoint.clone(),
            cookie: cfg.cookie.clone(),
        })
    }
}

impl ReadTimeSource for WeReadClient {
    async fn fetch(&self) -> Result<ReadTimes> {
        debug!(endpoint = %self.endpoint, "fetching read times");
        let start = Instant::now();

        let response = self
            .http
            .get(&self.endpoint)
            .header("Accept", "application/json")
            .header("Cookie", &self.cookie)
            .send()
            .await
            .with_context(|| format!("requesting {}", self.endpoint))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("unexpected status {} from {}: {}", status, self.endpoint, body);
        }

        let body = response
            .text()
            .await
            .with_context(|| format!("reading response from {}", self.endpoint))?;

        let read_times = parse_summary(&body)?;

        debug!(
            samples = read_times.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "fetched read times",
        );

        Ok(read_times)
    }
}

/// Reads a reading summary JSON document from disk.
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ReadTimeSource for FileSource {
    async fn fetch(&self) -> Result<ReadTimes> {
        debug!(path = %self.path.display(), "reading read times from file");

        let data = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("reading {}", self.path.display()))?;

        parse_summary(&data).with_context(|| format!("parsing {}", self.path.display()))
    }
}

// --- JSON response structures ---

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryResponse {
    read_times: Option<BTreeMap<String, f64>>,
    #[serde(default)]
    err_code: Option<i64>,
    #[serde(default)]
    err_msg: Option<String>,
}

/// Parse a reading summary body into timestamp -> seconds.
///
/// The body is a JSON object with a `readTimes` map whose keys are decimal
/// epoch seconds. Durations may be fractional and are truncated to whole
/// seconds; negative or non-finite durations are rejected. Keys that name
/// the same timestamp (`"0100"` and `"100"`) are summed. An error payload or
/// a missing map is a failure.
pub fn parse_summary(body: &str) -> Result<ReadTimes> {
    let resp: SummaryResponse =
        serde_json::from_str(body).context("decoding reading summary JSON")?;

    let Some(raw) = resp.read_times else {
        match (resp.err_code, resp.err_msg) {
            (Some(code), Some(msg)) => bail!("summary returned error {code}: {msg}"),
            (Some(code), None) => bail!("summary returned error {code}"),
            _ => bail!("summary is missing readTimes"),
        }
    };

    let mut read_times = ReadTimes::new();
    for (key, duration) in raw {
        let timestamp = key
            .trim()
            .parse::<i64>()
            .with_context(|| format!("parsing timestamp key {key:?}"))?;
        let seconds = whole_seconds(duration)
            .with_context(|| format!("duration for timestamp key {key:?}"))?;

        let total = read_times.entry(timestamp).or_insert(0);
        *total = total.saturating_add(seconds);
    }

    Ok(read_times)
}

/// Truncates a JSON duration to whole seconds.
fn whole_seconds(duration: f64) -> Result<u64> {
    if !duration.is_finite() || duration < 0.0 {
        bail!("invalid duration {duration}");
    }
    // `as` saturates at u64::MAX for out-of-range floats.
    Ok(duration.trunc() as u64)
}
