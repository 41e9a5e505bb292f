//! Metrics definitions for the Gatekeeper service.
//!
//! All metrics follow Prometheus naming conventions:
//! - `gk_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded:
//! - `method`: standard HTTP methods, everything else is `OTHER`
//! - `endpoint`: the fixed route table, everything else is `/other`
//! - `caller`: `authenticated` or an [`auth_core::AuthFailure`] label
//! - `outcome`: `success` or an [`auth_core::AuthFailure`] label
//! - `policy`: registered policy names
//! - `path` on page hits: a configured `truncateUrls` prefix, otherwise the
//!   `endpoint` value
//!
//! Client addresses and raw paths go to logs only.

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Initialize Prometheus metrics recorder and return the handle
/// for serving metrics via HTTP.
///
/// Must be called before any metrics are recorded.
///
/// # Errors
///
/// Returns error if Prometheus recorder fails to install (e.g., already installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Prefix("gk_http_request".to_string()),
            &[
                0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.200, 0.500, 1.000, 2.000,
            ],
        )
        .map_err(|e| format!("Failed to set HTTP request buckets: {e}"))?
        .set_buckets_for_metric(
            Matcher::Full("gk_page_duration_seconds".to_string()),
            &[0.001, 0.005, 0.010, 0.050, 0.100, 0.500, 1.000, 5.000],
        )
        .map_err(|e| format!("Failed to set page duration buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {e}"))
}

// ============================================================================
// HTTP Request Metrics
// ============================================================================

/// Record HTTP request completion
///
/// Metric: `gk_http_requests_total`
/// Labels: `method`, `endpoint`, `status` (numeric code), `caller`
///
/// Metric: `gk_http_request_duration_seconds`
/// Labels: `method`, `endpoint`, `status_class`
///
/// Includes framework-level responses (404, 405) and policy rejections.
pub fn record_http_request(
    method: &str,
    path: &str,
    status_code: u16,
    caller: &'static str,
    duration: Duration,
) {
    let method = normalize_method(method);
    let endpoint = normalize_endpoint(path);

    histogram!("gk_http_request_duration_seconds",
        "method" => method,
        "endpoint" => endpoint,
        "status_class" => categorize_status_code(status_code)
    )
    .record(duration.as_secs_f64());

    counter!("gk_http_requests_total",
        "method" => method,
        "endpoint" => endpoint,
        "status" => status_code.to_string(),
        "caller" => caller
    )
    .increment(1);
}

fn normalize_method(method: &str) -> &'static str {
    match method {
        "GET" => "GET",
        "HEAD" => "HEAD",
        "POST" => "POST",
        "PUT" => "PUT",
        "PATCH" => "PATCH",
        "DELETE" => "DELETE",
        "OPTIONS" => "OPTIONS",
        _ => "OTHER",
    }
}

fn categorize_status_code(status_code: u16) -> &'static str {
    match status_code {
        200..=299 => "success",
        401 | 403 => "denied",
        408 | 504 => "timeout",
        _ => "error",
    }
}

/// Maps a request path onto the fixed route table.
#[must_use]
pub fn normalize_endpoint(path: &str) -> &'static str {
    match path {
        "/" => "/",
        "/health" => "/health",
        "/metrics" => "/metrics",
        "/api/v1/me" => "/api/v1/me",
        "/api/v1/admin/identities" => "/api/v1/admin/identities",
        "/api/v1/lebowski" => "/api/v1/lebowski",
        _ => "/other",
    }
}

// ============================================================================
// Authentication Metrics
// ============================================================================

/// Record one authentication attempt
///
/// Metric: `gk_auth_attempts_total`
/// Labels: `outcome`
pub fn record_auth_attempt(outcome: &'static str) {
    counter!("gk_auth_attempts_total", "outcome" => outcome).increment(1);
}

/// Record a policy gate decision
///
/// Metric: `gk_policy_decisions_total`
/// Labels: `policy`, `decision` (`allow`, `unauthorized`, `forbidden`)
pub fn record_policy_decision(policy: &str, decision: &'static str) {
    counter!("gk_policy_decisions_total",
        "policy" => policy.to_string(),
        "decision" => decision
    )
    .increment(1);
}

// ============================================================================
// Request Logging Metrics
// ============================================================================

/// Record a page hit
///
/// Metric: `gk_page_hits_total`, `gk_page_duration_seconds`
/// Labels: `path`
///
/// `truncated` is the matching `truncateUrls` prefix; without one the path
/// is reduced to its route table entry.
pub fn record_page_hit(path: &str, truncated: Option<String>, duration: Duration) {
    let label = truncated.unwrap_or_else(|| normalize_endpoint(path).to_string());

    histogram!("gk_page_duration_seconds", "path" => label.clone())
        .record(duration.as_secs_f64());
    counter!("gk_page_hits_total", "path" => label).increment(1);
}

// ============================================================================
// Error Metrics
// ============================================================================

/// Record an unhandled error (a handler or middleware panic)
///
/// Metric: `gk_critical_errors_total`
pub fn record_critical_error() {
    counter!("gk_critical_errors_total").increment(1);
}

// ============================================================================
// Identity Reload Metrics
// ============================================================================

/// Record an identity reload attempt
///
/// Metric: `gk_identity_reloads_total`
/// Labels: `status` (`success`, `error`)
pub fn record_identity_reload(status: &'static str) {
    counter!("gk_identity_reloads_total", "status" => status).increment(1);
}

/// Set the number of identities in the active snapshot
///
/// Metric: `gk_registered_identities`
#[allow(clippy::cast_precision_loss)]
pub fn set_registered_identities(count: usize) {
    gauge!("gk_registered_identities").set(count as f64);
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use metrics_exporter_prometheus::PrometheusRecorder;

    fn render(record: impl FnOnce()) -> String {
        let recorder: PrometheusRecorder = PrometheusBuilder::new().build_recorder();
        metrics::with_local_recorder(&recorder, record);
        recorder.handle().render()
    }

    fn series(rendered: &str, metric: &str) -> Vec<String> {
        let prefix = format!("{metric}{{");
        rendered
            .lines()
            .filter(|line| line.starts_with(&prefix))
            .map(ToString::to_string)
            .collect()
    }

    #[test]
    fn test_record_http_request_labels() {
        let rendered = render(|| {
            record_http_request("GET", "/health", 200, "header_missing", Duration::from_millis(5));
            record_http_request(
                "GET",
                "/api/v1/admin/identities",
                403,
                "authenticated",
                Duration::from_millis(3),
            );
        });

        let requests = series(&rendered, "gk_http_requests_total");
        assert_eq!(requests.len(), 2);
        assert!(requests.iter().any(|line| line.contains(r#"endpoint="/health""#)
            && line.contains(r#"status="200""#)
            && line.contains(r#"caller="header_missing""#)));
        assert!(requests.iter().any(|line| line
            .contains(r#"endpoint="/api/v1/admin/identities""#)
            && line.contains(r#"status="403""#)
            && line.contains(r#"caller="authenticated""#)));
        assert!(rendered.contains(r#"status_class="denied""#));
    }

    #[test]
    fn test_record_http_request_bounds_method_and_endpoint() {
        let rendered = render(|| {
            for i in 0..25 {
                record_http_request(
                    &format!("CUSTOM{i}"),
                    &format!("/scan/{i}"),
                    404,
                    "header_missing",
                    Duration::from_millis(1),
                );
            }
        });

        let requests = series(&rendered, "gk_http_requests_total");
        assert_eq!(requests.len(), 1);
        let line = requests.first().unwrap();
        assert!(line.contains(r#"method="OTHER""#));
        assert!(line.contains(r#"endpoint="/other""#));
        assert!(line.ends_with(" 25"));
    }

    #[test]
    fn test_categorize_status_code() {
        assert_eq!(categorize_status_code(200), "success");
        assert_eq!(categorize_status_code(204), "success");
        assert_eq!(categorize_status_code(401), "denied");
        assert_eq!(categorize_status_code(403), "denied");
        assert_eq!(categorize_status_code(408), "timeout");
        assert_eq!(categorize_status_code(504), "timeout");
        assert_eq!(categorize_status_code(404), "error");
        assert_eq!(categorize_status_code(500), "error");
    }

    #[test]
    fn test_normalize_endpoint_known_paths() {
        assert_eq!(normalize_endpoint("/health"), "/health");
        assert_eq!(normalize_endpoint("/metrics"), "/metrics");
        assert_eq!(normalize_endpoint("/api/v1/me"), "/api/v1/me");
        assert_eq!(
            normalize_endpoint("/api/v1/admin/identities"),
            "/api/v1/admin/identities"
        );
        assert_eq!(normalize_endpoint("/api/v1/lebowski"), "/api/v1/lebowski");
    }

    #[test]
    fn test_normalize_endpoint_unknown_paths() {
        assert_eq!(normalize_endpoint("/api/v1/me/extra"), "/other");
        assert_eq!(normalize_endpoint("/wp-admin"), "/other");
        assert_eq!(normalize_endpoint(""), "/other");
    }

    #[test]
    fn test_page_hits_use_truncated_or_route_label() {
        let rendered = render(|| {
            record_page_hit(
                "/api/v1/admin/identities",
                Some("/api/v1/admin".to_string()),
                Duration::from_millis(4),
            );
            record_page_hit("/api/v1/me", None, Duration::from_millis(4));
            for i in 0..50 {
                record_page_hit(&format!("/scan/{i}"), None, Duration::from_millis(1));
            }
        });

        let hits = series(&rendered, "gk_page_hits_total");
        assert_eq!(hits.len(), 3);
        assert!(rendered.contains(r#"gk_page_hits_total{path="/api/v1/admin"} 1"#));
        assert!(rendered.contains(r#"gk_page_hits_total{path="/api/v1/me"} 1"#));
        assert!(rendered.contains(r#"gk_page_hits_total{path="/other"} 50"#));
        assert!(!rendered.contains("/scan/"));
    }

    #[test]
    fn test_other_recorders() {
        let rendered = render(|| {
            record_auth_attempt("success");
            record_auth_attempt("header_missing");
            record_policy_decision("Admin", "forbidden");
            record_identity_reload("success");
            record_critical_error();
            set_registered_identities(3);
        });

        assert!(rendered.contains(r#"gk_auth_attempts_total{outcome="success"} 1"#));
        assert!(rendered.contains(r#"gk_auth_attempts_total{outcome="header_missing"} 1"#));
        assert!(rendered
            .contains(r#"gk_policy_decisions_total{policy="Admin",decision="forbidden"} 1"#));
        assert!(rendered.contains(r#"gk_identity_reloads_total{status="success"} 1"#));
        assert!(rendered.contains("gk_critical_errors_total 1"));
        assert!(rendered.contains("gk_registered_identities 3"));
    }
}
