//! Metrics instrumentation for slaac-dns.
//!
//! All metrics are prefixed with `slaac_dns.`

use metrics::{counter, histogram};
use std::time::Instant;

/// Record a handled query.
pub fn record_query(qtype: &str, result: QueryResult, duration: std::time::Duration) {
    let result_str = match result {
        QueryResult::Answered => "answered",
        QueryResult::Relayed => "relayed",
        QueryResult::NxDomain => "nxdomain",
        QueryResult::FormErr => "formerr",
        QueryResult::ServFail => "servfail",
    };

    counter!("slaac_dns.query.count", "type" => qtype.to_string(), "result" => result_str)
        .increment(1);
    histogram!("slaac_dns.query.duration.seconds", "type" => qtype.to_string())
        .record(duration.as_secs_f64());
}

/// How a query was resolved, for metrics.
#[derive(Debug, Clone, Copy)]
pub enum QueryResult {
    /// Answer synthesized locally.
    Answered,
    /// Answer relayed from an upstream resolver.
    Relayed,
    /// Name or address outside every configured network.
    NxDomain,
    /// Request failed the decode contract.
    FormErr,
    /// Unexpected internal error.
    ServFail,
}

/// Record the outcome of one upstream delegation.
pub fn record_upstream(outcome: UpstreamOutcome) {
    let outcome_str = match outcome {
        UpstreamOutcome::Answered => "answered",
        UpstreamOutcome::NoAnswer => "no_answer",
    };

    counter!("slaac_dns.upstream.count", "outcome" => outcome_str).increment(1);
}

/// Upstream delegation outcomes.
#[derive(Debug, Clone, Copy)]
pub enum UpstreamOutcome {
    /// Upstream supplied a PTR answer that was relayed.
    Answered,
    /// Upstream failed or answered negatively; synthesis took over.
    NoAnswer,
}

/// Helper for timing operations.
pub struct Timer {
    start: Instant,
}

impl Timer {
    /// Start a new timer.
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get elapsed duration since timer start.
    pub fn elapsed(&self) -> std::time::Duration {
        self.start.elapsed()
    }
}
