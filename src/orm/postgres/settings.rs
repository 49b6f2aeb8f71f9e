//! Key/value settings (Postgres layout)

use crate::model::Setting;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "cms_settings")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub key: String,
    pub value: String,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Setting {
    fn from(m: Model) -> Self {
        Setting {
            key: m.key,
            value: m.value,
            created_at: super::unstamp(m.created_at),
            updated_at: super::unstamp(m.updated_at),
        }
    }
}
