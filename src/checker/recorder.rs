//! Commits probe outcomes: one log row plus the target's counters, atomically.

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{DatabaseConnection, DbErr, TransactionTrait};

use super::outcome::Outcome;
use crate::db::entities::target;
use crate::db::services::{check_log_service, target_service};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordStatus {
    Recorded,
    /// The target was deleted before its outcome could be stored.
    TargetMissing,
}

#[derive(Debug, Clone)]
pub struct OutcomeRecorder {
    db: DatabaseConnection,
}

impl OutcomeRecorder {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Stores `outcome` for `target_id`.
    ///
    /// Each call runs in its own transaction whose first statement is the
    /// counter update, so the target's lock is held before anything else
    /// happens. Recordings for the same target serialize. On any error nothing
    /// is persisted.
    pub async fn record(&self, target_id: i32, outcome: &Outcome) -> Result<RecordStatus, DbErr> {
        let now = Utc::now();
        let entry = outcome.to_log_entry(now);
        let is_up = outcome.is_up();
        let last_status = entry.status_code;

        let txn = self.db.begin().await?;

        let counter = if is_up {
            target::Column::UptimeCount
        } else {
            target::Column::DowntimeCount
        };
        let found = target_service::lock_and_update(&txn, target_id, |update| {
            update
                .col_expr(counter, Expr::col(counter).add(1))
                .col_expr(target::Column::LastStatusCode, Expr::value(last_status))
                .col_expr(target::Column::LastCheckedAt, Expr::value(now))
        })
        .await?;

        if !found {
            txn.rollback().await?;
            return Ok(RecordStatus::TargetMissing);
        }

        check_log_service::append_log(&txn, target_id, &entry).await?;
        txn.commit().await?;

        Ok(RecordStatus::Recorded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_util::{file_db, memory_db};

    #[tokio::test]
    async fn test_up_outcome_increments_uptime() {
        let db = memory_db().await;
        let target = target_service::create_target(&db, "https://up.example.com", "owner-up")
            .await
            .unwrap();
        let recorder = OutcomeRecorder::new(db.clone());

        let status = recorder
            .record(target.id, &Outcome::Up { status_code: 200, response_time_ms: 20.0 })
            .await
            .unwrap();
        assert_eq!(status, RecordStatus::Recorded);

        let reloaded = target_service::get_target(&db, target.id).await.unwrap().unwrap();
        assert_eq!(reloaded.uptime_count, 1);
        assert_eq!(reloaded.downtime_count, 0);
        assert_eq!(reloaded.last_status_code, Some(200));
        assert!(reloaded.last_checked_at.is_some());

        let logs = check_log_service::get_logs_for_target(&db, target.id, 10).await.unwrap();
        assert_eq!(logs.len(), 1);
        assert!(logs[0].is_up);
        assert_eq!(logs[0].status_code, Some(200));
        assert!(logs[0].error_message.is_none());
    }

    #[tokio::test]
    async fn test_transport_failure_clears_last_status() {
        let db = memory_db().await;
        let target = target_service::create_target(&db, "https://flaky.example.com", "owner-f")
            .await
            .unwrap();
        let recorder = OutcomeRecorder::new(db.clone());

        recorder
            .record(target.id, &Outcome::HttpFailure { status_code: 502, response_time_ms: 8.0 })
            .await
            .unwrap();
        recorder
            .record(target.id, &Outcome::TransportFailure { error_kind: "dns".to_string() })
            .await
            .unwrap();

        let reloaded = target_service::get_target(&db, target.id).await.unwrap().unwrap();
        assert_eq!(reloaded.downtime_count, 2);
        assert_eq!(reloaded.uptime_count, 0);
        assert_eq!(reloaded.last_status_code, None);

        let logs = check_log_service::get_logs_for_target(&db, target.id, 10).await.unwrap();
        assert_eq!(logs.len(), 2);
        let newest = &logs[0];
        assert!(!newest.is_up);
        assert!(newest.status_code.is_none());
        assert!(newest.response_time_ms.is_none());
        assert_eq!(newest.error_message.as_deref(), Some("Request Error: dns"));
    }

    #[tokio::test]
    async fn test_missing_target_is_a_no_op() {
        let db = memory_db().await;
        let recorder = OutcomeRecorder::new(db.clone());

        let status = recorder
            .record(999, &Outcome::Up { status_code: 200, response_time_ms: 1.0 })
            .await
            .unwrap();

        assert_eq!(status, RecordStatus::TargetMissing);
        assert_eq!(check_log_service::count_logs_for_target(&db, 999).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_recordings_lose_no_updates() {
        let (db, _dir) = file_db().await;
        let target = target_service::create_target(&db, "https://busy.example.com", "owner-b")
            .await
            .unwrap();
        let recorder = OutcomeRecorder::new(db.clone());

        let mut handles = Vec::new();
        for i in 0..40 {
            let recorder = recorder.clone();
            let target_id = target.id;
            handles.push(tokio::spawn(async move {
                let outcome = if i % 2 == 0 {
                    Outcome::Up { status_code: 200, response_time_ms: 5.0 }
                } else {
                    Outcome::HttpFailure { status_code: 500, response_time_ms: 5.0 }
                };
                recorder.record(target_id, &outcome).await.unwrap()
            }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap(), RecordStatus::Recorded);
        }

        let reloaded = target_service::get_target(&db, target.id).await.unwrap().unwrap();
        assert_eq!(reloaded.uptime_count, 20);
        assert_eq!(reloaded.downtime_count, 20);
        assert_eq!(
            check_log_service::count_logs_for_target(&db, target.id).await.unwrap(),
            40
        );
    }
}
