//! Canary Rollback Watchdog
//!
//! Samples the canary exception counter on a fixed interval. When the
//! increase over one window exceeds the threshold, the canary is demoted and
//! all traffic returns to the baseline until restart.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use super::canary::{CanarySelector, Variant};
use super::metrics::InferenceMetrics;

/// Exceptions added during the window exceed the threshold
pub fn should_rollback(previous: u64, current: u64, threshold: u64) -> bool {
    current.saturating_sub(previous) > threshold
}

pub struct RollbackWatchdog {
    selector: Arc<CanarySelector>,
    metrics: Arc<InferenceMetrics>,
    threshold: u64,
    interval: Duration,
}

impl RollbackWatchdog {
    pub fn new(
        selector: Arc<CanarySelector>,
        metrics: Arc<InferenceMetrics>,
        threshold: u64,
        interval: Duration,
    ) -> Self {
        Self { selector, metrics, threshold, interval }
    }

    /// One evaluation; returns the counter value to compare against next time
    /// and whether the canary was demoted.
    pub fn check(&self, previous: u64) -> (u64, bool) {
        let current = self.metrics.exceptions(Variant::Canary);
        let added = current.saturating_sub(previous);

        if should_rollback(previous, current, self.threshold) {
            log::warn!(
                "Rollback triggered - {} canary exceptions in {:?}, restoring baseline",
                added,
                self.interval
            );
            self.selector.demote();
            return (current, true);
        }

        log::debug!("No rollback needed ({} canary exceptions this window)", added);
        (current, false)
    }

    /// Run until the canary is demoted
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.tick().await;
            let mut previous = self.metrics.exceptions(Variant::Canary);

            loop {
                ticker.tick().await;
                let (current, demoted) = self.check(previous);
                if demoted {
                    break;
                }
                previous = current;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::canary::VariantSelector;

    fn setup(threshold: u64, interval: Duration) -> (RollbackWatchdog, Arc<CanarySelector>, Arc<InferenceMetrics>) {
        let selector = Arc::new(CanarySelector::new(0.5, 42).unwrap());
        let metrics = Arc::new(InferenceMetrics::new().unwrap());
        let watchdog = RollbackWatchdog::new(selector.clone(), metrics.clone(), threshold, interval);
        (watchdog, selector, metrics)
    }

    #[test]
    fn test_should_rollback() {
        assert!(!should_rollback(0, 5, 5));
        assert!(should_rollback(0, 6, 5));
        assert!(!should_rollback(10, 12, 5));
        // Counter reset never triggers
        assert!(!should_rollback(10, 0, 5));
    }

    #[test]
    fn test_check_demotes_on_spike() {
        let (watchdog, selector, metrics) = setup(2, Duration::from_secs(300));

        metrics.record_exception(Variant::Canary);
        let (previous, demoted) = watchdog.check(0);
        assert_eq!(previous, 1);
        assert!(!demoted);

        for _ in 0..3 {
            metrics.record_exception(Variant::Canary);
        }
        let (_, demoted) = watchdog.check(previous);
        assert!(demoted);
        assert_eq!(selector.split(), 0.0);
        assert_eq!(selector.choose().variant, Variant::Baseline);
    }

    #[test]
    fn test_baseline_exceptions_ignored() {
        let (watchdog, selector, metrics) = setup(0, Duration::from_secs(300));
        metrics.record_exception(Variant::Baseline);

        let (_, demoted) = watchdog.check(0);
        assert!(!demoted);
        assert_eq!(selector.split(), 0.5);
    }

    #[tokio::test]
    async fn test_spawned_watchdog_stops_after_demotion() {
        let (watchdog, selector, metrics) = setup(1, Duration::from_millis(20));
        let task = watchdog.spawn();

        // Let the watchdog take its first sample
        tokio::time::sleep(Duration::from_millis(30)).await;
        for _ in 0..5 {
            metrics.record_exception(Variant::Canary);
        }

        tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .expect("watchdog should finish after demotion")
            .unwrap();
        assert_eq!(selector.split(), 0.0);
    }
}
