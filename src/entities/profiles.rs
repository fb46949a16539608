use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Parent record of an owner scope. Created lazily on the owner's first
/// write and never deleted.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "profiles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::file_records::Entity")]
    FileRecords,
}

impl Related<super::file_records::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FileRecords.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
