//! Structured metric logging
//!
//! Metrics are logged at info level as `METRIC: {json}` lines, where the
//! payload carries `type`, `metric`, `value` and `tags`. Counters and timers
//! emit when dropped, so wrapping an operation in one is enough to report it.
//!
//! ```rust,ignore
//! let mut counter = record_counter(Some("orders"));
//! for record in records {
//!     write_record("orders", &record)?;
//!     counter.increment(1);
//! }
//! // dropped here: emits the final record count
//! ```

use crate::types::{JsonObject, JsonValue};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::LazyLock;
use std::time::{Duration, Instant};

/// Number of records fetched
pub const RECORD_COUNT: &str = "record_count";
/// Number of bytes fetched
pub const BYTE_COUNT: &str = "byte_count";
/// Duration of an operation
pub const DURATION: &str = "duration";
/// Duration of one HTTP request
pub const HTTP_REQUEST_DURATION: &str = "http_request_duration";
/// Number of HTTP requests
pub const HTTP_REQUEST_COUNT: &str = "http_request_count";

/// Tag naming the endpoint or source
pub const TAG_ENDPOINT: &str = "endpoint";
/// Tag carrying an HTTP status code
pub const TAG_HTTP_STATUS_CODE: &str = "http_status_code";
/// Tag carrying the operation [`Status`]
pub const TAG_STATUS: &str = "status";

/// How often a [`Counter`] emits while being incremented
pub const DEFAULT_LOG_INTERVAL: Duration = Duration::from_secs(60);

/// Regex for info-level metric log lines
static METRIC_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:.*\s)?INFO\s+(?:\S+:\s+)?METRIC: (.*)$").unwrap());

/// Kind of metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricType {
    Counter,
    Timer,
}

/// Outcome of a measured operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Running,
    Succeeded,
    Failed,
}

impl Status {
    /// The wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Running => "running",
            Status::Succeeded => "succeeded",
            Status::Failed => "failed",
        }
    }
}

/// Build the payload of one metric line
pub fn metric_payload(
    metric_type: MetricType,
    metric: &str,
    value: impl Into<JsonValue>,
    tags: JsonObject,
) -> JsonValue {
    json!({
        "type": metric_type,
        "metric": metric,
        "value": value.into(),
        "tags": tags,
    })
}

/// Log one metric at info level
pub fn log_metric(metric_type: MetricType, metric: &str, value: impl Into<JsonValue>, tags: JsonObject) {
    let payload = metric_payload(metric_type, metric, value, tags);
    tracing::info!("METRIC: {payload}");
}

/// Extract the payload from a metric log line.
///
/// Lines that are not info-level metrics yield `None`, as do malformed
/// payloads (which are logged).
pub fn parse_metrics(line: &str) -> Option<JsonValue> {
    let captures = METRIC_LINE.captures(line.trim_end())?;
    match serde_json::from_str(&captures[1]) {
        Ok(payload) => Some(payload),
        Err(e) => {
            tracing::warn!("Error parsing metric: {e}");
            None
        }
    }
}

fn endpoint_tags(endpoint: Option<&str>) -> JsonObject {
    let mut tags = JsonObject::new();
    if let Some(endpoint) = endpoint.filter(|e| !e.is_empty()) {
        tags.insert(TAG_ENDPOINT.to_string(), endpoint.into());
    }
    tags
}

// ============================================================================
// Counter
// ============================================================================

/// Counts items, emitting the running total every log interval and once more
/// when dropped
#[derive(Debug)]
pub struct Counter {
    metric: String,
    endpoint: Option<String>,
    log_interval: Duration,
    value: u64,
    last_log_time: Instant,
}

impl Counter {
    /// Create a counter for `metric`
    pub fn new(metric: impl Into<String>, endpoint: Option<&str>) -> Self {
        Self {
            metric: metric.into(),
            endpoint: endpoint.map(str::to_string),
            log_interval: DEFAULT_LOG_INTERVAL,
            value: 0,
            last_log_time: Instant::now(),
        }
    }

    /// Set how often the counter emits while being incremented
    #[must_use]
    pub fn with_log_interval(mut self, interval: Duration) -> Self {
        self.log_interval = interval;
        self
    }

    /// Add `amount` to the count
    pub fn increment(&mut self, amount: u64) {
        self.value += amount;
        if self.last_log_time.elapsed() > self.log_interval {
            self.pop_metric();
        }
    }

    /// The count since the last emission
    pub fn value(&self) -> u64 {
        self.value
    }

    fn pop_metric(&mut self) {
        let value = std::mem::take(&mut self.value);
        self.last_log_time = Instant::now();
        let mut tags = JsonObject::new();
        tags.insert(
            TAG_ENDPOINT.to_string(),
            self.endpoint.clone().map_or(JsonValue::Null, JsonValue::from),
        );
        log_metric(MetricType::Counter, &self.metric, value, tags);
    }
}

impl Drop for Counter {
    fn drop(&mut self) {
        self.pop_metric();
    }
}

/// Counter for records retrieved from the source
pub fn record_counter(endpoint: Option<&str>) -> Counter {
    Counter::new(RECORD_COUNT, endpoint)
}

// ============================================================================
// Timer
// ============================================================================

/// Measures an operation, emitting its duration in seconds when dropped
#[derive(Debug)]
pub struct Timer {
    metric: String,
    endpoint: Option<String>,
    start: Instant,
    http_status_code: Option<u16>,
    failed: bool,
}

impl Timer {
    /// Start timing `metric`
    pub fn new(metric: impl Into<String>, endpoint: Option<&str>) -> Self {
        Self {
            metric: metric.into(),
            endpoint: endpoint.map(str::to_string),
            start: Instant::now(),
            http_status_code: None,
            failed: false,
        }
    }

    /// Record the response status code
    pub fn set_http_status_code(&mut self, code: u16) {
        self.http_status_code = Some(code);
    }

    /// Report the operation as failed
    pub fn mark_failed(&mut self) {
        self.failed = true;
    }

    /// Time since the timer started
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        let status = if self.failed || std::thread::panicking() {
            Status::Failed
        } else {
            Status::Succeeded
        };
        let mut tags = endpoint_tags(self.endpoint.as_deref());
        tags.insert(TAG_STATUS.to_string(), status.as_str().into());
        if let Some(code) = self.http_status_code {
            tags.insert(TAG_HTTP_STATUS_CODE.to_string(), code.into());
        }
        log_metric(
            MetricType::Timer,
            &self.metric,
            self.elapsed().as_secs_f64(),
            tags,
        );
    }
}

/// Timer for HTTP requests to an endpoint
pub fn http_request_timer(endpoint: Option<&str>) -> Timer {
    Timer::new(HTTP_REQUEST_DURATION, endpoint)
}

// ============================================================================
// Operation Counter
// ============================================================================

/// Counts one operation, emitting a count of 1 tagged with its outcome when
/// dropped
#[derive(Debug)]
pub struct OperationCounter {
    metric: String,
    endpoint: Option<String>,
    http_status_code: Option<u16>,
    failed: bool,
}

impl OperationCounter {
    /// Create a counter for `metric`
    pub fn new(metric: impl Into<String>, endpoint: Option<&str>) -> Self {
        Self {
            metric: metric.into(),
            endpoint: endpoint.map(str::to_string),
            http_status_code: None,
            failed: false,
        }
    }

    /// Record the response status code
    pub fn set_http_status_code(&mut self, code: u16) {
        self.http_status_code = Some(code);
    }

    /// Report the operation as failed
    pub fn mark_failed(&mut self) {
        self.failed = true;
    }
}

impl Drop for OperationCounter {
    fn drop(&mut self) {
        let mut tags = endpoint_tags(self.endpoint.as_deref());
        let status = if self.failed || std::thread::panicking() {
            Status::Failed
        } else {
            Status::Succeeded
        };
        tags.insert(TAG_STATUS.to_string(), status.as_str().into());
        if let Some(code) = self.http_status_code {
            tags.insert(TAG_HTTP_STATUS_CODE.to_string(), code.into());
        }
        log_metric(MetricType::Counter, &self.metric, 1, tags);
    }
}

/// Counter for HTTP requests to an endpoint
pub fn http_request_counter(endpoint: Option<&str>) -> OperationCounter {
    OperationCounter::new(HTTP_REQUEST_COUNT, endpoint)
}
