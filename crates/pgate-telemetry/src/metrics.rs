//! Prometheus metrics for the trade popup gate.
//!
//! # Panics
//!
//! Metric registration uses `unwrap()`. Registration only fails on duplicate
//! metric names, which is a startup bug, and only runs during static
//! initialization.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_int_counter, register_int_gauge, CounterVec, Encoder,
    IntCounter, IntGauge, TextEncoder,
};

use crate::error::{TelemetryError, TelemetryResult};

/// Popups opened.
pub static POPUPS_OPENED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("pgate_popups_opened_total", "Total trade popups opened").unwrap()
});

/// Signals rejected by gating.
/// Labels: reason (exchange_busy/already_open)
pub static LAUNCH_REJECTED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "pgate_launch_rejected_total",
        "Total signals rejected without opening a popup",
        &["reason"]
    )
    .unwrap()
});

/// Popup open failures.
/// Labels: kind (blocked/unexpected/config)
pub static LAUNCH_FAILED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "pgate_launch_failed_total",
        "Total popup open failures",
        &["kind"]
    )
    .unwrap()
});

/// Open popup entries removed by expiry.
pub static POPUPS_EXPIRED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "pgate_popups_expired_total",
        "Total open popup entries removed by expiry"
    )
    .unwrap()
});

/// Completion events handled.
pub static TRADES_COMPLETED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "pgate_trades_completed_total",
        "Total TRADE_CLOSED events handled"
    )
    .unwrap()
});

/// Failed backend notifications.
pub static NOTIFY_FAILED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "pgate_notify_failed_total",
        "Total failed completion notifications"
    )
    .unwrap()
});

/// Popups presumed open.
pub static OPEN_POPUPS: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!("pgate_open_popups", "Popups currently presumed open").unwrap()
});

/// Active trade present (1) or not (0).
pub static ACTIVE_TRADE: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!("pgate_active_trade", "Active trade present (1=yes)").unwrap()
});

/// Metrics recording facade.
pub struct Metrics;

impl Metrics {
    pub fn popup_opened() {
        POPUPS_OPENED_TOTAL.inc();
    }

    pub fn launch_rejected(reason: &str) {
        LAUNCH_REJECTED_TOTAL.with_label_values(&[reason]).inc();
    }

    pub fn launch_failed(kind: &str) {
        LAUNCH_FAILED_TOTAL.with_label_values(&[kind]).inc();
    }

    pub fn popup_expired() {
        POPUPS_EXPIRED_TOTAL.inc();
    }

    pub fn trade_completed() {
        TRADES_COMPLETED_TOTAL.inc();
    }

    pub fn notify_failed() {
        NOTIFY_FAILED_TOTAL.inc();
    }

    /// Update registry gauges.
    pub fn registry_state(open_popups: usize, has_active: bool) {
        OPEN_POPUPS.set(open_popups as i64);
        ACTIVE_TRADE.set(i64::from(has_active));
    }
}

/// Render all registered metrics in the Prometheus text format.
pub fn render_metrics() -> TelemetryResult<String> {
    let encoder = TextEncoder::new();
    let families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&families, &mut buffer)
        .map_err(|e| TelemetryError::Metrics(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::Metrics(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_increment() {
        let before = LAUNCH_REJECTED_TOTAL
            .with_label_values(&["exchange_busy"])
            .get();
        Metrics::launch_rejected("exchange_busy");
        let after = LAUNCH_REJECTED_TOTAL
            .with_label_values(&["exchange_busy"])
            .get();
        assert_eq!(after - before, 1.0);
    }

    #[test]
    fn test_registry_gauges() {
        Metrics::registry_state(3, true);
        assert_eq!(OPEN_POPUPS.get(), 3);
        assert_eq!(ACTIVE_TRADE.get(), 1);
    }

    #[test]
    fn test_render_contains_metric_names() {
        Metrics::popup_opened();
        let text = render_metrics().unwrap();
        assert!(text.contains("pgate_popups_opened_total"));
    }

    #[test]
    fn test_popups_opened_has_no_client_labels() {
        Metrics::popup_opened();
        let text = render_metrics().unwrap();
        let series: Vec<&str> = text
            .lines()
            .filter(|line| line.starts_with("pgate_popups_opened_total"))
            .collect();
        assert_eq!(series.len(), 1);
        assert!(!series[0].contains('{'));
    }
}
