//! Detection Aggregator for Privacy Guard.
//!
//! Per-tab rolling counters and the alert policy. A tab's counters change only
//! through [`DetectionAggregator::record_event`] (one increment) and
//! [`DetectionAggregator::reset`] (all zero).

use std::sync::Arc;

use serde::Serialize;
use tracing::warn;

use crate::types::detection::{AggregateCounts, Category};
use crate::types::session::SiteIdentity;
use crate::types::tab::TabId;

/// Fires once each time the total lands on a multiple of `step`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertPolicy {
    step: u64,
}

impl AlertPolicy {
    pub fn new(step: u64) -> Self {
        Self { step: step.max(1) }
    }

    pub fn step(&self) -> u64 {
        self.step
    }

    /// `last_alerted` is the highest total that already produced an alert.
    pub fn should_alert(&self, total: u64, last_alerted: u64) -> bool {
        total >= self.step && total % self.step == 0 && total > last_alerted
    }
}

impl Default for AlertPolicy {
    fn default() -> Self {
        Self::new(10)
    }
}

/// Result of recording one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordOutcome {
    pub total: u64,
    pub alert: bool,
}

/// Counter state machine owned by a single tab.
#[derive(Debug, Clone)]
pub struct DetectionAggregator {
    counts: AggregateCounts,
    last_alerted: u64,
    policy: AlertPolicy,
}

impl DetectionAggregator {
    pub fn new(policy: AlertPolicy) -> Self {
        Self {
            counts: AggregateCounts::default(),
            last_alerted: 0,
            policy,
        }
    }

    pub fn record_event(&mut self, category: Category) -> RecordOutcome {
        self.counts.increment(category);
        let total = self.counts.total();
        let alert = self.policy.should_alert(total, self.last_alerted);
        if alert {
            self.last_alerted = total;
        }
        RecordOutcome { total, alert }
    }

    pub fn reset(&mut self) {
        self.counts = AggregateCounts::default();
        self.last_alerted = 0;
    }

    pub fn counts(&self) -> AggregateCounts {
        self.counts
    }

    pub fn total(&self) -> u64 {
        self.counts.total()
    }
}

impl Default for DetectionAggregator {
    fn default() -> Self {
        Self::new(AlertPolicy::default())
    }
}

/// A threat alert raised by the aggregator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThreatAlert {
    pub tab_id: TabId,
    pub site: SiteIdentity,
    pub total: u64,
}

impl ThreatAlert {
    pub fn message(&self) -> String {
        format!(
            "{} privacy threats detected on {}. Click extension for details.",
            self.total, self.site
        )
    }
}

/// Receives alerts. The host decides how to surface them.
pub trait AlertSink: Send + Sync {
    fn notify(&self, alert: &ThreatAlert);
}

impl<T: AlertSink + ?Sized> AlertSink for Arc<T> {
    fn notify(&self, alert: &ThreatAlert) {
        (**self).notify(alert)
    }
}

/// Default sink: a warning in the log.
pub struct LogAlertSink;

impl AlertSink for LogAlertSink {
    fn notify(&self, alert: &ThreatAlert) {
        warn!(tab_id = alert.tab_id, site = %alert.site, total = alert.total, "{}", alert.message());
    }
}
