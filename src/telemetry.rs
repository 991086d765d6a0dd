use anyhow::Result;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::time::Duration;

pub const METRIC_CYCLES: &str = "pulse_dash_cycles_total";
pub const METRIC_CYCLE_FAILURES: &str = "pulse_dash_cycle_failures_total";
pub const METRIC_CYCLE_TIME: &str = "pulse_dash_cycle_seconds";
pub const METRIC_TOKEN_FALLBACKS: &str = "pulse_dash_token_fallbacks_total";
pub const METRIC_STALE_CYCLES: &str = "pulse_dash_stale_cycles_total";
pub const METRIC_PRICE_FETCHES: &str = "pulse_dash_price_fetches_total";
pub const METRIC_PRICE_MISSES: &str = "pulse_dash_price_misses_total";
pub const METRIC_ENDPOINT_FAILURES: &str = "pulse_dash_subgraph_endpoint_failures_total";
pub const METRIC_TRACKED_TOKENS: &str = "pulse_dash_tracked_tokens";

/// Serve `/metrics` on `port` and register metric descriptions.
pub fn install_exporter(port: u16) -> Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .install()?;
    describe();
    Ok(())
}

fn describe() {
    describe_counter!(METRIC_CYCLES, "Completed refresh cycles");
    describe_counter!(METRIC_CYCLE_FAILURES, "Refresh cycles that failed outright");
    describe_histogram!(METRIC_CYCLE_TIME, "Refresh cycle duration in seconds");
    describe_counter!(METRIC_TOKEN_FALLBACKS, "Tokens published as fallback records");
    describe_counter!(METRIC_STALE_CYCLES, "Cycle results discarded as superseded");
    describe_counter!(METRIC_PRICE_FETCHES, "Price fetches issued to the subgraph");
    describe_counter!(METRIC_PRICE_MISSES, "Price fetches that produced no data");
    describe_counter!(METRIC_ENDPOINT_FAILURES, "Subgraph endpoint attempts that failed");
    describe_gauge!(METRIC_TRACKED_TOKENS, "Tokens in the configured list");
}

pub fn record_cycle(elapsed: Duration, tokens: usize) {
    counter!(METRIC_CYCLES, 1);
    histogram!(METRIC_CYCLE_TIME, elapsed.as_secs_f64());
    gauge!(METRIC_TRACKED_TOKENS, tokens as f64);
}

pub fn record_token_fallback(symbol: &str) {
    counter!(METRIC_TOKEN_FALLBACKS, 1, "token" => symbol.to_string());
}

pub fn record_cycle_failure() {
    counter!(METRIC_CYCLE_FAILURES, 1);
}

pub fn record_stale_cycle() {
    counter!(METRIC_STALE_CYCLES, 1);
}

pub fn record_price_fetch(found: bool) {
    counter!(METRIC_PRICE_FETCHES, 1);
    if !found {
        counter!(METRIC_PRICE_MISSES, 1);
    }
}

pub fn record_endpoint_failure(endpoint: &str) {
    counter!(METRIC_ENDPOINT_FAILURES, 1, "endpoint" => endpoint.to_string());
}
