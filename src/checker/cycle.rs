//! One check cycle: probe every target concurrently and record each outcome.

use std::sync::Arc;
use std::time::Duration;

use sea_orm::{DatabaseConnection, DbErr};
use serde::Serialize;
use tokio::task::JoinSet;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{error, info, warn};

use super::outcome::Outcome;
use super::probe::Probe;
use super::recorder::{OutcomeRecorder, RecordStatus};
use crate::db::entities::target;
use crate::db::services::target_service;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleSummary {
    /// Size of the target snapshot taken at cycle start.
    pub targets_checked: usize,
    pub recorded: usize,
    /// Targets deleted while their probe was in flight.
    pub skipped: usize,
    pub failed: usize,
}

/// Terminal state of a single target's check within a cycle.
#[derive(Debug)]
enum CheckStatus {
    Recorded,
    Skipped,
    Failed,
}

pub struct CycleOrchestrator {
    db: DatabaseConnection,
    probe: Arc<dyn Probe>,
    recorder: OutcomeRecorder,
}

impl CycleOrchestrator {
    pub fn new(db: DatabaseConnection, probe: Arc<dyn Probe>) -> Self {
        let recorder = OutcomeRecorder::new(db.clone());
        Self { db, probe, recorder }
    }

    /// Probes every current target and waits until all of them are recorded.
    ///
    /// Only the initial snapshot query can fail the cycle; per-target problems
    /// are counted in the summary and never touch sibling targets.
    pub async fn run_cycle(&self) -> Result<CycleSummary, DbErr> {
        info!("Starting URL check cycle...");
        let targets = target_service::list_targets(&self.db).await?;

        if targets.is_empty() {
            info!("No URLs to check.");
            return Ok(CycleSummary::default());
        }

        let mut summary = CycleSummary { targets_checked: targets.len(), ..Default::default() };

        let mut checks = JoinSet::new();
        for target in targets {
            let probe = self.probe.clone();
            let recorder = self.recorder.clone();
            checks.spawn(check_target(probe, recorder, target));
        }

        while let Some(joined) = checks.join_next().await {
            match joined {
                Ok(CheckStatus::Recorded) => summary.recorded += 1,
                Ok(CheckStatus::Skipped) => summary.skipped += 1,
                Ok(CheckStatus::Failed) => summary.failed += 1,
                Err(e) => {
                    error!(error = %e, "Check task ended abnormally.");
                    summary.failed += 1;
                }
            }
        }

        info!(
            targets_checked = summary.targets_checked,
            recorded = summary.recorded,
            skipped = summary.skipped,
            failed = summary.failed,
            "URL check cycle finished."
        );
        Ok(summary)
    }

    /// Runs a cycle every `period` until the task is dropped.
    pub async fn start_periodic_cycles(self: Arc<Self>, period: Duration) {
        info!(interval_seconds = period.as_secs(), "Periodic check cycles started.");
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            if let Err(e) = self.run_cycle().await {
                error!(error = %e, "Scheduled check cycle could not load targets.");
            }
        }
    }
}

async fn check_target(
    probe: Arc<dyn Probe>,
    recorder: OutcomeRecorder,
    target: target::Model,
) -> CheckStatus {
    let outcome = probe.probe(&target.url).await;

    match &outcome {
        Outcome::Up { status_code, .. } => {
            info!(target_id = target.id, url = %target.url, status = status_code, "SUCCESS");
        }
        Outcome::HttpFailure { status_code, .. } => {
            warn!(target_id = target.id, url = %target.url, status = status_code, "FAIL");
        }
        Outcome::TransportFailure { error_kind } => {
            warn!(target_id = target.id, url = %target.url, error = %error_kind, "FAIL");
        }
    }

    match recorder.record(target.id, &outcome).await {
        Ok(RecordStatus::Recorded) => CheckStatus::Recorded,
        Ok(RecordStatus::TargetMissing) => CheckStatus::Skipped,
        Err(e) => {
            error!(target_id = target.id, error = %e, "Failed to record check outcome.");
            CheckStatus::Failed
        }
    }
}
