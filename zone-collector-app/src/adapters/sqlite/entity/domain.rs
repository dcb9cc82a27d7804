use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "domains")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub tld: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub domain: String,
    pub fqdn: String,
    pub first_seen: String,
    pub last_seen: String,
    /// JSON arrays of record values, one column per tracked type.
    pub ns: String,
    pub a: String,
    pub aaaa: String,
    pub ds: String,
    pub source: String,
    pub zone_file_date: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
