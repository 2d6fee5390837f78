//! Token-guarded entry point that hands a check cycle to the background executor.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use constant_time_eq::constant_time_eq;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::cycle::{CycleOrchestrator, CycleSummary};

/// Result of a trigger attempt.
#[derive(Debug)]
pub enum TriggerDecision {
    /// A cycle was spawned. Dropping the handle leaves it running.
    Accepted {
        /// 1-based sequence number of the cycle within this gate.
        cycle: u64,
        handle: JoinHandle<Option<CycleSummary>>,
    },
    Rejected,
}

pub struct TriggerGate {
    secret: Option<String>,
    orchestrator: Arc<CycleOrchestrator>,
    scheduled: AtomicU64,
}

impl TriggerGate {
    /// An empty `secret` counts as unconfigured and rejects every call.
    pub fn new(secret: Option<String>, orchestrator: Arc<CycleOrchestrator>) -> Self {
        let secret = secret.filter(|s| !s.is_empty());
        if secret.is_none() {
            warn!("No cron secret configured; check cycle triggers will be rejected.");
        }
        Self { secret, orchestrator, scheduled: AtomicU64::new(0) }
    }

    /// Schedules one cycle if `provided_token` matches the configured secret.
    ///
    /// Returns without waiting for the cycle. Overlapping cycles are allowed.
    pub fn trigger(&self, provided_token: &str) -> TriggerDecision {
        let Some(secret) = self.secret.as_deref() else {
            return TriggerDecision::Rejected;
        };
        if !tokens_match(secret, provided_token) {
            warn!("Rejected check cycle trigger with an invalid token.");
            return TriggerDecision::Rejected;
        }

        let cycle_number = self.scheduled.fetch_add(1, Ordering::Relaxed) + 1;
        let orchestrator = self.orchestrator.clone();
        info!(cycle = cycle_number, "Check cycle scheduled.");

        let handle = tokio::spawn(async move {
            match orchestrator.run_cycle().await {
                Ok(summary) => Some(summary),
                Err(e) => {
                    error!(cycle = cycle_number, error = %e, "Triggered check cycle failed to load targets.");
                    None
                }
            }
        });

        TriggerDecision::Accepted { cycle: cycle_number, handle }
    }
}

fn tokens_match(expected: &str, provided: &str) -> bool {
    constant_time_eq(expected.as_bytes(), provided.as_bytes())
}
