//! Persistence layer: entities, schema bootstrap and the data-access services.

pub mod entities;
pub mod services;

use std::time::Duration;

use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, Schema};
use tracing::info;

use crate::config::ServerConfig;
use crate::db::entities::prelude::*;

/// Opens the connection pool described by the configuration.
pub async fn connect(config: &ServerConfig) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(config.database_url.to_owned());
    opt.max_connections(config.max_connections)
        .connect_timeout(Duration::from_secs(10))
        .sqlx_logging(false);

    Database::connect(opt).await
}

/// Creates the `targets` and `check_logs` tables if they do not exist yet.
pub async fn ensure_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);

    db.execute(backend.build(schema.create_table_from_entity(Target).if_not_exists()))
        .await?;
    db.execute(backend.build(schema.create_table_from_entity(CheckLog).if_not_exists()))
        .await?;

    info!("Database schema is ready.");
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_util {
    use super::*;

    /// Fresh in-memory SQLite database with the schema applied.
    ///
    /// A single pooled connection keeps the in-memory database alive for the
    /// whole test.
    pub async fn memory_db() -> DatabaseConnection {
        let mut opt = ConnectOptions::new("sqlite::memory:");
        opt.max_connections(1)
            .min_connections(1)
            .sqlx_logging(false);
        let db = Database::connect(opt).await.expect("connect to in-memory sqlite");
        ensure_schema(&db).await.expect("create schema");
        db
    }

    /// File-backed SQLite database behind a multi-connection pool, so that
    /// concurrent transactions really overlap. Keep the directory alive for
    /// as long as the connection is used.
    pub async fn file_db() -> (DatabaseConnection, tempfile::TempDir) {
        let dir = tempfile::tempdir().expect("create temp dir");
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("uptime.db").display());
        let mut opt = ConnectOptions::new(url);
        opt.max_connections(8)
            .min_connections(4)
            .sqlx_logging(false);
        let db = Database::connect(opt).await.expect("connect to file sqlite");
        ensure_schema(&db).await.expect("create schema");
        (db, dir)
    }
}
