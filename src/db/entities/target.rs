use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[sea_orm(table_name = "targets")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub url: String,
    /// Submitter identity; one owner monitors at most one URL.
    #[sea_orm(unique)]
    pub owner: String,
    pub created_at: ChronoDateTimeUtc,
    #[sea_orm(nullable)]
    pub last_checked_at: Option<ChronoDateTimeUtc>,
    #[sea_orm(nullable)]
    pub last_status_code: Option<i32>,
    pub uptime_count: i32,
    pub downtime_count: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::check_log::Entity")]
    CheckLog,
}

impl Related<super::check_log::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CheckLog.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
