use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "sync_stats")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub tld: String,
    pub inserted: i64,
    pub updated: i64,
    pub total_changes: i64,
    pub sync_time: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
