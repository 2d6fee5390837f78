//! Append-only check history.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};

use crate::db::entities::{check_log, prelude::*};

/// How many log rows the detail view returns by default.
pub const DEFAULT_LOG_LIMIT: u64 = 100;

/// One probe attempt as it is written to `check_logs`.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub is_up: bool,
    pub status_code: Option<i32>,
    pub response_time_ms: Option<f64>,
    pub error_message: Option<String>,
}

/// Inserts a log row. Pass the transaction that also mutates the target's
/// counters so both land atomically.
pub async fn append_log<C: ConnectionTrait>(
    conn: &C,
    target_id: i32,
    entry: &LogEntry,
) -> Result<check_log::Model, DbErr> {
    let new_log = check_log::ActiveModel {
        target_id: Set(target_id),
        timestamp: Set(entry.timestamp),
        is_up: Set(entry.is_up),
        status_code: Set(entry.status_code),
        response_time_ms: Set(entry.response_time_ms),
        error_message: Set(entry.error_message.clone()),
        ..Default::default()
    };

    new_log.insert(conn).await
}

/// Latest logs for a target, newest first.
pub async fn get_logs_for_target<C: ConnectionTrait>(
    db: &C,
    target_id: i32,
    limit: u64,
) -> Result<Vec<check_log::Model>, DbErr> {
    CheckLog::find()
        .filter(check_log::Column::TargetId.eq(target_id))
        .order_by_desc(check_log::Column::Timestamp)
        .order_by_desc(check_log::Column::Id)
        .limit(limit)
        .all(db)
        .await
}

pub async fn count_logs_for_target<C: ConnectionTrait>(
    db: &C,
    target_id: i32,
) -> Result<u64, DbErr> {
    CheckLog::find()
        .filter(check_log::Column::TargetId.eq(target_id))
        .count(db)
        .await
}
