//! HTTP 指标注册表
//!
//! 每个 `HttpTelemetry` 持有独立的 Prometheus recorder，不安装为全局
//! recorder，测试之间互不干扰。所有写入都通过 `with_local_recorder` 完成。

use std::time::Duration;

use contracts::DispatchSnapshot;
use metrics::{
    counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram,
    with_local_recorder, Unit,
};
use metrics_exporter_prometheus::{
    BuildError, Matcher, PrometheusBuilder, PrometheusHandle, PrometheusRecorder,
};
use thiserror::Error;

pub const HTTP_REQUESTS_TOTAL: &str = "http_requests_total";
pub const HTTP_REQUEST_DURATION_SECONDS: &str = "http_request_duration_seconds";
pub const HTTP_REQUESTS_IN_FLIGHT: &str = "http_requests_in_flight";
pub const HTTP_ERRORS_TOTAL: &str = "http_errors_total";
pub const RATE_LIMIT_HITS_TOTAL: &str = "rate_limit_hits_total";
pub const USERS_ACTIVE_TOTAL: &str = "users_active_total";
pub const DISPATCH_PENDING: &str = "dispatch_pending";
pub const DISPATCH_WRITTEN_TOTAL: &str = "dispatch_written_total";
pub const DISPATCH_OVERFLOW_TOTAL: &str = "dispatch_overflow_total";
pub const DISPATCH_FAILURES_TOTAL: &str = "dispatch_failures_total";

/// 请求延迟直方图桶 (秒)
pub const LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

/// Telemetry construction errors
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("failed to build prometheus recorder: {0}")]
    Build(#[from] BuildError),
}

/// HTTP 请求与分发器指标
pub struct HttpTelemetry {
    recorder: PrometheusRecorder,
    handle: PrometheusHandle,
}

impl HttpTelemetry {
    pub fn new() -> Result<Self, TelemetryError> {
        let recorder = PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Full(HTTP_REQUEST_DURATION_SECONDS.to_string()),
                LATENCY_BUCKETS,
            )?
            .build_recorder();
        let handle = recorder.handle();
        let telemetry = Self { recorder, handle };
        telemetry.describe();
        Ok(telemetry)
    }

    fn describe(&self) {
        with_local_recorder(&self.recorder, || {
            describe_counter!(HTTP_REQUESTS_TOTAL, "Total HTTP requests");
            describe_histogram!(
                HTTP_REQUEST_DURATION_SECONDS,
                Unit::Seconds,
                "HTTP request latency"
            );
            describe_gauge!(HTTP_REQUESTS_IN_FLIGHT, "Requests currently being served");
            describe_counter!(HTTP_ERRORS_TOTAL, "HTTP responses with status >= 400");
            describe_counter!(RATE_LIMIT_HITS_TOTAL, "Requests rejected by the admission gate");
            describe_gauge!(USERS_ACTIVE_TOTAL, "Users currently stored");
            describe_gauge!(DISPATCH_PENDING, "Payloads queued but not yet written");
            describe_counter!(DISPATCH_WRITTEN_TOTAL, "Payloads written to the primary sink");
            describe_counter!(DISPATCH_OVERFLOW_TOTAL, "Payloads routed to the overflow sink");
            describe_counter!(DISPATCH_FAILURES_TOTAL, "Primary sink write failures");
        });
    }

    /// Increment the in-flight gauge until the guard drops
    pub fn track_in_flight(&self) -> InFlightGuard<'_> {
        with_local_recorder(&self.recorder, || {
            gauge!(HTTP_REQUESTS_IN_FLIGHT).increment(1.0);
        });
        InFlightGuard { telemetry: self }
    }

    /// Record one finished request
    pub fn record_request(&self, method: &str, route: &str, status: u16, elapsed: Duration) {
        let method = method.to_string();
        let route = route.to_string();
        with_local_recorder(&self.recorder, || {
            histogram!(
                HTTP_REQUEST_DURATION_SECONDS,
                "method" => method.clone(),
                "route" => route.clone()
            )
            .record(elapsed.as_secs_f64());
            counter!(
                HTTP_REQUESTS_TOTAL,
                "method" => method.clone(),
                "route" => route.clone(),
                "status" => status.to_string()
            )
            .increment(1);
            if let Some(class) = error_class(status) {
                counter!(
                    HTTP_ERRORS_TOTAL,
                    "method" => method,
                    "route" => route,
                    "class" => class
                )
                .increment(1);
            }
        });
    }

    pub fn record_rate_limited(&self) {
        with_local_recorder(&self.recorder, || {
            counter!(RATE_LIMIT_HITS_TOTAL).increment(1);
        });
    }

    pub fn set_active_users(&self, count: usize) {
        with_local_recorder(&self.recorder, || {
            gauge!(USERS_ACTIVE_TOTAL).set(count as f64);
        });
    }

    /// Publish a dispatcher's counters (read at scrape time)
    pub fn record_dispatch(&self, dispatcher: &str, snapshot: &DispatchSnapshot) {
        let name = dispatcher.to_string();
        with_local_recorder(&self.recorder, || {
            gauge!(DISPATCH_PENDING, "dispatcher" => name.clone()).set(snapshot.pending as f64);
            counter!(DISPATCH_WRITTEN_TOTAL, "dispatcher" => name.clone())
                .absolute(snapshot.written_count);
            counter!(DISPATCH_OVERFLOW_TOTAL, "dispatcher" => name.clone())
                .absolute(snapshot.overflow_count);
            counter!(DISPATCH_FAILURES_TOTAL, "dispatcher" => name)
                .absolute(snapshot.failure_count);
        });
    }

    /// Prometheus text exposition
    pub fn render(&self) -> String {
        self.handle.render()
    }

    fn leave_in_flight(&self) {
        with_local_recorder(&self.recorder, || {
            gauge!(HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);
        });
    }
}

impl std::fmt::Debug for HttpTelemetry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTelemetry").finish_non_exhaustive()
    }
}

/// Decrements the in-flight gauge on drop
#[must_use = "dropping the guard ends the in-flight span immediately"]
pub struct InFlightGuard<'a> {
    telemetry: &'a HttpTelemetry,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.telemetry.leave_in_flight();
    }
}

fn error_class(status: u16) -> Option<&'static str> {
    match status {
        400..=499 => Some("client"),
        500..=599 => Some("server"),
        _ => None,
    }
}

/// Look up one sample in a text exposition
///
/// Matches the metric name exactly and requires every given label pair to be
/// present. Returns `None` when no series matches.
pub fn find_sample(rendered: &str, metric: &str, labels: &[(&str, &str)]) -> Option<f64> {
    rendered
        .lines()
        .filter(|line| !line.starts_with('#'))
        .find_map(|line| {
            let (series, value) = line.rsplit_once(' ')?;
            let (name, label_set) = match series.split_once('{') {
                Some((name, rest)) => (name, rest.strip_suffix('}')?),
                None => (series, ""),
            };
            if name != metric {
                return None;
            }
            let present: Vec<(&str, &str)> = label_set
                .split(',')
                .filter_map(|pair| {
                    let (k, v) = pair.split_once('=')?;
                    Some((k, v.trim_matches('"')))
                })
                .collect();
            labels
                .iter()
                .all(|wanted| present.contains(wanted))
                .then(|| value.parse().ok())
                .flatten()
        })
}
