//! Service for managing monitored targets.
//!
//! Covers submission (with URL and ownership validation), lookups, owner-only
//! deletion and the locked read-modify-write used when recording checks.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set, SqlErr, TransactionTrait, UpdateMany,
};
use thiserror::Error;
use url::Url;

use crate::db::entities::{check_log, prelude::*, target};

#[derive(Debug, Error)]
pub enum TargetServiceError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("An owner can only monitor one URL at a time.")]
    DuplicateOwner,
    #[error("This URL is already being monitored.")]
    DuplicateUrl,
    #[error("Target {0} not found")]
    NotFound(i32),
    #[error("Only the owner of target {0} may delete it")]
    Forbidden(i32),
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Checks that `raw` is an absolute http(s) URL with a host.
pub fn validate_target_url(raw: &str) -> Result<Url, TargetServiceError> {
    let url = Url::parse(raw.trim()).map_err(|e| TargetServiceError::InvalidUrl(e.to_string()))?;

    match url.scheme() {
        "http" | "https" => {}
        other => {
            return Err(TargetServiceError::InvalidUrl(format!(
                "unsupported scheme '{other}'"
            )));
        }
    }

    if url.host_str().map(str::is_empty).unwrap_or(true) {
        return Err(TargetServiceError::InvalidUrl("missing host".to_string()));
    }

    Ok(url)
}

/// All targets, most recently created first.
pub async fn list_targets<C: ConnectionTrait>(db: &C) -> Result<Vec<target::Model>, DbErr> {
    Target::find()
        .order_by_desc(target::Column::CreatedAt)
        .order_by_desc(target::Column::Id)
        .all(db)
        .await
}

pub async fn get_target<C: ConnectionTrait>(
    db: &C,
    target_id: i32,
) -> Result<Option<target::Model>, DbErr> {
    Target::find_by_id(target_id).one(db).await
}

pub async fn find_target_by_owner<C: ConnectionTrait>(
    db: &C,
    owner: &str,
) -> Result<Option<target::Model>, DbErr> {
    Target::find()
        .filter(target::Column::Owner.eq(owner))
        .one(db)
        .await
}

pub async fn find_target_by_url<C: ConnectionTrait>(
    db: &C,
    url: &str,
) -> Result<Option<target::Model>, DbErr> {
    Target::find()
        .filter(target::Column::Url.eq(url))
        .one(db)
        .await
}

/// Registers a new target for `owner`.
///
/// The URL is stored exactly as submitted (trimmed) so that duplicate checks
/// compare what users actually typed.
pub async fn create_target(
    db: &DatabaseConnection,
    url: &str,
    owner: &str,
) -> Result<target::Model, TargetServiceError> {
    let url = url.trim();
    validate_target_url(url)?;

    if find_target_by_owner(db, owner).await?.is_some() {
        return Err(TargetServiceError::DuplicateOwner);
    }
    if find_target_by_url(db, url).await?.is_some() {
        return Err(TargetServiceError::DuplicateUrl);
    }

    let new_target = target::ActiveModel {
        url: Set(url.to_string()),
        owner: Set(owner.to_string()),
        created_at: Set(Utc::now()),
        last_checked_at: Set(None),
        last_status_code: Set(None),
        uptime_count: Set(0),
        downtime_count: Set(0),
        ..Default::default()
    };

    match new_target.insert(db).await {
        Ok(model) => Ok(model),
        // A concurrent submission won the race between our checks and the insert.
        Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            if find_target_by_owner(db, owner).await?.is_some() {
                Err(TargetServiceError::DuplicateOwner)
            } else {
                Err(TargetServiceError::DuplicateUrl)
            }
        }
        Err(e) => Err(e.into()),
    }
}

/// Deletes a target and its whole check history, provided `owner` submitted it.
pub async fn delete_target(
    db: &DatabaseConnection,
    target_id: i32,
    owner: &str,
) -> Result<(), TargetServiceError> {
    let txn = db.begin().await?;

    // The write goes first so the transaction holds the lock before it reads.
    let deleted = Target::delete_many()
        .filter(target::Column::Id.eq(target_id))
        .filter(target::Column::Owner.eq(owner))
        .exec(&txn)
        .await?;

    if deleted.rows_affected == 0 {
        let exists = Target::find_by_id(target_id).one(&txn).await?.is_some();
        txn.rollback().await?;
        return Err(if exists {
            TargetServiceError::Forbidden(target_id)
        } else {
            TargetServiceError::NotFound(target_id)
        });
    }

    // Explicit cascade: not every backend enforces the foreign key action.
    CheckLog::delete_many()
        .filter(check_log::Column::TargetId.eq(target_id))
        .exec(&txn)
        .await?;

    txn.commit().await?;
    Ok(())
}

/// Atomic read-modify-write of one target.
///
/// `mutator` adds column expressions to an `UPDATE` scoped to `target_id`; the
/// expressions may read the row's current values (`Expr::col(..).add(1)`).
/// The statement takes the row lock on PostgreSQL and the write lock on
/// SQLite, held until the surrounding transaction ends. Returns `false` when
/// the row is absent.
pub async fn lock_and_update<C, F>(conn: &C, target_id: i32, mutator: F) -> Result<bool, DbErr>
where
    C: ConnectionTrait,
    F: FnOnce(UpdateMany<Target>) -> UpdateMany<Target>,
{
    let result = mutator(Target::update_many())
        .filter(target::Column::Id.eq(target_id))
        .exec(conn)
        .await?;

    Ok(result.rows_affected > 0)
}

#[cfg(test)]
mod tests {
    use sea_orm::sea_query::Expr;

    use super::*;
    use crate::db::services::check_log_service::{self, LogEntry};
    use crate::db::test_util::{file_db, memory_db};

    #[tokio::test]
    async fn test_create_and_list_newest_first() {
        let db = memory_db().await;

        let first = create_target(&db, "https://first.example.com", "10.0.0.1")
            .await
            .unwrap();
        let second = create_target(&db, "https://second.example.com", "10.0.0.2")
            .await
            .unwrap();

        assert_eq!(first.uptime_count, 0);
        assert_eq!(first.downtime_count, 0);
        assert!(first.last_checked_at.is_none());

        let listed = list_targets(&db).await.unwrap();
        let ids: Vec<i32> = listed.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[tokio::test]
    async fn test_list_targets_is_idempotent() {
        let db = memory_db().await;
        create_target(&db, "https://a.example.com", "owner-a").await.unwrap();
        create_target(&db, "https://b.example.com", "owner-b").await.unwrap();

        let once = list_targets(&db).await.unwrap();
        let twice = list_targets(&db).await.unwrap();
        assert_eq!(once, twice);
    }

    #[tokio::test]
    async fn test_create_rejects_duplicates_and_bad_urls() {
        let db = memory_db().await;
        create_target(&db, "https://taken.example.com", "owner-1")
            .await
            .unwrap();

        let same_owner = create_target(&db, "https://other.example.com", "owner-1").await;
        assert!(matches!(same_owner, Err(TargetServiceError::DuplicateOwner)));

        let same_url = create_target(&db, "https://taken.example.com", "owner-2").await;
        assert!(matches!(same_url, Err(TargetServiceError::DuplicateUrl)));

        for bad in ["not a url", "ftp://example.com/file", "example.com", "http://"] {
            let result = create_target(&db, bad, "owner-3").await;
            assert!(
                matches!(result, Err(TargetServiceError::InvalidUrl(_))),
                "expected {bad:?} to be rejected"
            );
        }

        assert_eq!(list_targets(&db).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_requires_owner_and_removes_logs() {
        let db = memory_db().await;
        let target = create_target(&db, "https://gone.example.com", "owner-x")
            .await
            .unwrap();
        let entry = LogEntry {
            timestamp: Utc::now(),
            is_up: true,
            status_code: Some(200),
            response_time_ms: Some(12.5),
            error_message: None,
        };
        check_log_service::append_log(&db, target.id, &entry).await.unwrap();

        let forbidden = delete_target(&db, target.id, "someone-else").await;
        assert!(matches!(forbidden, Err(TargetServiceError::Forbidden(_))));
        assert!(get_target(&db, target.id).await.unwrap().is_some());

        delete_target(&db, target.id, "owner-x").await.unwrap();
        assert!(get_target(&db, target.id).await.unwrap().is_none());
        assert_eq!(
            check_log_service::count_logs_for_target(&db, target.id)
                .await
                .unwrap(),
            0
        );

        let missing = delete_target(&db, target.id, "owner-x").await;
        assert!(matches!(missing, Err(TargetServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_lock_and_update_missing_row() {
        let db = memory_db().await;
        let found = lock_and_update(&db, 42, |update| {
            update.col_expr(
                target::Column::UptimeCount,
                Expr::col(target::Column::UptimeCount).add(1),
            )
        })
        .await
        .unwrap();
        assert!(!found);
    }

    #[tokio::test]
    async fn test_lock_and_update_applies_mutation() {
        let db = memory_db().await;
        let target = create_target(&db, "https://count.example.com", "owner-c")
            .await
            .unwrap();

        for _ in 0..2 {
            let found = lock_and_update(&db, target.id, |update| {
                update
                    .col_expr(
                        target::Column::DowntimeCount,
                        Expr::col(target::Column::DowntimeCount).add(1),
                    )
                    .col_expr(target::Column::LastStatusCode, Expr::value(Some(503)))
            })
            .await
            .unwrap();
            assert!(found);
        }

        let reloaded = get_target(&db, target.id).await.unwrap().unwrap();
        assert_eq!(reloaded.downtime_count, 2);
        assert_eq!(reloaded.uptime_count, 0);
        assert_eq!(reloaded.last_status_code, Some(503));
    }

    #[tokio::test]
    async fn test_lock_and_update_serializes_pooled_transactions() {
        let (db, _dir) = file_db().await;
        let target = create_target(&db, "https://pooled.example.com", "owner-p")
            .await
            .unwrap();

        let mut handles = Vec::new();
        for _ in 0..40 {
            let db = db.clone();
            let target_id = target.id;
            handles.push(tokio::spawn(async move {
                let txn = db.begin().await?;
                let found = lock_and_update(&txn, target_id, |update| {
                    update.col_expr(
                        target::Column::UptimeCount,
                        Expr::col(target::Column::UptimeCount).add(1),
                    )
                })
                .await?;
                txn.commit().await?;
                Ok::<_, DbErr>(found)
            }));
        }
        for handle in handles {
            assert!(handle.await.unwrap().unwrap());
        }

        let reloaded = get_target(&db, target.id).await.unwrap().unwrap();
        assert_eq!(reloaded.uptime_count, 40);
    }
}
