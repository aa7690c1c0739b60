//! Structured JSON-lines logging.
//!
//! Every record is one JSON object on stdout with a run id, a monotonically
//! increasing sequence number, a level and a domain. `LOG_LEVEL` sets the
//! minimum level, `LOG_DOMAINS` (comma-separated or "all") the domains.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::process;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;
use std::time::Instant;

// =============================================================================
// Log Levels
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
    Fatal = 5,
}

impl Level {
    pub fn from_env() -> Self {
        std::env::var("LOG_LEVEL")
            .ok()
            .and_then(|v| Level::parse(&v))
            .unwrap_or(Level::Info)
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Some(Level::Trace),
            "debug" => Some(Level::Debug),
            "info" => Some(Level::Info),
            "warn" => Some(Level::Warn),
            "error" => Some(Level::Error),
            "fatal" => Some(Level::Fatal),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Trace => "trace",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Fatal => "fatal",
        }
    }
}

// =============================================================================
// Log Domains (categories for filtering)
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Data,      // Dataset loading and manifests
    Selection, // Incomplete or rejected selections
    Pipeline,  // Filter / coerce / group recomputations
    Http,      // Requests and responses
    System,    // Startup, shutdown
    Profile,   // Timing scopes
}

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Data => "data",
            Domain::Selection => "selection",
            Domain::Pipeline => "pipeline",
            Domain::Http => "http",
            Domain::System => "system",
            Domain::Profile => "profile",
        }
    }

    /// `None` or `"all"` enables every domain.
    pub fn enabled_in(&self, domains: Option<&str>) -> bool {
        match domains {
            None | Some("all") => true,
            Some(list) => list.split(',').any(|d| d.trim() == self.as_str()),
        }
    }
}

fn should_emit(level: Level, min_level: Level, domain: Domain, domains: Option<&str>) -> bool {
    level >= min_level && domain.enabled_in(domains)
}

// =============================================================================
// Run context
// =============================================================================

static LOG_SEQ: AtomicU64 = AtomicU64::new(0);
static RUN_ID: OnceLock<String> = OnceLock::new();

fn next_seq() -> u64 {
    LOG_SEQ.fetch_add(1, Ordering::SeqCst)
}

pub fn run_id() -> &'static str {
    RUN_ID.get_or_init(|| {
        std::env::var("RUN_ID")
            .unwrap_or_else(|_| format!("r-{}-{}", ts_epoch_ms(), process::id()))
    })
}

fn split_fields(mut fields: Map<String, Value>) -> (Map<String, Value>, Map<String, Value>) {
    let mut top = Map::new();
    for key in ["chart", "dataset", "path", "msg"] {
        if let Some(value) = fields.remove(key) {
            top.insert(key.to_string(), value);
        }
    }
    (top, fields)
}

// =============================================================================
// Core logging functions
// =============================================================================

/// RFC3339 timestamp with milliseconds
pub fn ts_now() -> String {
    Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

pub fn ts_epoch_ms() -> u64 {
    Utc::now().timestamp_millis() as u64
}

/// Emit a structured log entry
pub fn log(level: Level, domain: Domain, event: &str, fields: Map<String, Value>) {
    let domains = std::env::var("LOG_DOMAINS").ok();
    if !should_emit(level, Level::from_env(), domain, domains.as_deref()) {
        return;
    }
    println!("{}", render_record(level, domain, event, fields));
}

fn render_record(level: Level, domain: Domain, event: &str, fields: Map<String, Value>) -> String {
    let (mut top, data) = split_fields(fields);
    let msg = top.remove("msg").unwrap_or(Value::String(String::new()));

    let mut entry = Map::new();
    entry.insert("ts".to_string(), json!(ts_now()));
    entry.insert("run_id".to_string(), json!(run_id()));
    entry.insert("seq".to_string(), json!(next_seq()));
    entry.insert("lvl".to_string(), json!(level.as_str().to_uppercase()));
    entry.insert("component".to_string(), json!(domain.as_str()));
    entry.insert("event".to_string(), json!(event));
    entry.insert("msg".to_string(), msg);
    for (k, v) in top {
        entry.insert(k, v);
    }
    entry.insert("data".to_string(), Value::Object(data));
    Value::Object(entry).to_string()
}

pub fn obj(pairs: &[(&str, Value)]) -> Map<String, Value> {
    let mut map = Map::new();
    for (k, v) in pairs {
        map.insert((*k).to_string(), v.clone());
    }
    map
}

pub fn v_str(s: &str) -> Value {
    Value::String(s.to_string())
}

pub fn v_num(n: f64) -> Value {
    json!(n)
}

// =============================================================================
// Domain-Specific Logging Helpers
// =============================================================================

pub fn log_dataset_loaded(dataset: &str, path: &str, rows: usize, columns: usize) {
    log(
        Level::Info,
        Domain::Data,
        "dataset_loaded",
        obj(&[
            ("dataset", v_str(dataset)),
            ("path", v_str(path)),
            ("rows", json!(rows)),
            ("columns", json!(columns)),
        ]),
    );
}

pub fn log_load_failed(dataset: &str, err: &str) {
    log(
        Level::Fatal,
        Domain::Data,
        "load_failed",
        obj(&[("dataset", v_str(dataset)), ("msg", v_str(err))]),
    );
}

/// A recomputation was requested but the selection could not drive one.
pub fn log_selection_skipped(chart: &str, reason: &str) {
    log(
        Level::Debug,
        Domain::Selection,
        "no_update",
        obj(&[("chart", v_str(chart)), ("reason", v_str(reason))]),
    );
}

pub fn log_recompute(chart: &str, measure: &str, rows_in: usize, rows_out: usize, series: usize) {
    log(
        Level::Debug,
        Domain::Pipeline,
        "recompute",
        obj(&[
            ("chart", v_str(chart)),
            ("measure", v_str(measure)),
            ("rows_in", json!(rows_in)),
            ("rows_out", json!(rows_out)),
            ("series", json!(series)),
        ]),
    );
}

pub fn log_request(method: &str, path: &str, status: u16) {
    log(
        Level::Debug,
        Domain::Http,
        "request",
        obj(&[
            ("path", v_str(path)),
            ("method", v_str(method)),
            ("status", json!(status)),
        ]),
    );
}

pub fn log_lifecycle(event: &str, msg: &str) {
    log(Level::Info, Domain::System, event, obj(&[("msg", v_str(msg))]));
}

// =============================================================================
// Profiling Scope
// =============================================================================

/// Profiling scope that emits structured timing on drop.
pub struct ProfileScope {
    label: &'static str,
    context: Map<String, Value>,
    started: Instant,
}

impl ProfileScope {
    pub fn new(label: &'static str) -> Self {
        Self::with_context(label, &[])
    }

    pub fn with_context(label: &'static str, fields: &[(&str, Value)]) -> Self {
        Self {
            label,
            context: obj(fields),
            started: Instant::now(),
        }
    }
}

impl Drop for ProfileScope {
    fn drop(&mut self) {
        let elapsed_ms = self.started.elapsed().as_secs_f64() * 1000.0;
        let mut fields = std::mem::take(&mut self.context);
        fields.insert("label".to_string(), v_str(self.label));
        fields.insert("elapsed_ms".to_string(), v_num(elapsed_ms));
        log(Level::Trace, Domain::Profile, "profile", fields);
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_ordering() {
        assert!(Level::Trace < Level::Debug);
        assert!(Level::Debug < Level::Info);
        assert!(Level::Info < Level::Warn);
        assert!(Level::Warn < Level::Error);
        assert!(Level::Error < Level::Fatal);
    }

    #[test]
    fn test_level_parse_is_case_insensitive() {
        assert_eq!(Level::parse("WARN"), Some(Level::Warn));
        assert_eq!(Level::parse(" debug "), Some(Level::Debug));
        assert_eq!(Level::parse("loud"), None);
    }

    #[test]
    fn test_domain_filter() {
        assert!(Domain::Http.enabled_in(None));
        assert!(Domain::Http.enabled_in(Some("all")));
        assert!(Domain::Http.enabled_in(Some("data, http")));
        assert!(!Domain::Pipeline.enabled_in(Some("data,http")));
        assert!(!Domain::Data.enabled_in(Some("")));
    }

    #[test]
    fn test_level_gating() {
        assert!(should_emit(Level::Warn, Level::Info, Domain::Http, None));
        assert!(should_emit(Level::Info, Level::Info, Domain::Http, None));
        assert!(!should_emit(Level::Debug, Level::Info, Domain::Http, None));
        assert!(!should_emit(Level::Fatal, Level::Trace, Domain::Data, Some("system")));
    }

    #[test]
    fn test_obj_helper() {
        let m = obj(&[("key", v_str("value")), ("num", v_num(42.0))]);
        assert_eq!(m.get("key").unwrap(), "value");
        assert_eq!(m.get("num").unwrap(), 42.0);
    }

    #[test]
    fn test_seq_increments() {
        let s1 = next_seq();
        let s2 = next_seq();
        assert!(s2 > s1);
    }

    #[test]
    fn test_record_hoists_known_keys() {
        let line = render_record(
            Level::Info,
            Domain::Pipeline,
            "recompute",
            obj(&[("chart", v_str("regional-merged")), ("rows_in", json!(3))]),
        );
        let v: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(v["chart"], "regional-merged");
        assert_eq!(v["component"], "pipeline");
        assert_eq!(v["lvl"], "INFO");
        assert_eq!(v["data"]["rows_in"], 3);
    }
}
