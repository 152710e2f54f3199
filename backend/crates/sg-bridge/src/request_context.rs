use std::sync::atomic::{AtomicU64, Ordering};

use uuid::Uuid;

static REQUEST_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Request context for correlation and tracing
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Correlation ID, taken from the proxy's request id when present
    pub correlation_id: String,
    /// Sequence number within this server instance
    pub request_seq: u64,
    pub route: &'static str,
    /// Start time for latency tracking
    pub started_at: std::time::Instant,
}

impl RequestContext {
    pub fn new(route: &'static str, upstream_request_id: Option<&str>) -> Self {
        let request_seq = REQUEST_COUNTER.fetch_add(1, Ordering::SeqCst);

        let correlation_id = match upstream_request_id.map(str::trim) {
            Some(id) if !id.is_empty() && id.len() <= 128 && id.is_ascii() => id.to_string(),
            _ => format!("req-{}-{}", request_seq, Uuid::new_v4().as_simple()),
        };

        Self {
            correlation_id,
            request_seq,
            route,
            started_at: std::time::Instant::now(),
        }
    }

    pub fn elapsed(&self) -> std::time::Duration {
        self.started_at.elapsed()
    }

    /// Prefix for log lines: `[req=<id>]`
    pub fn log_prefix(&self) -> String {
        format!(
            "[req={}]",
            &self.correlation_id[..12.min(self.correlation_id.len())]
        )
    }
}
