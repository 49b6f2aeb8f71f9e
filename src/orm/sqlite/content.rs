//! Content rows (SQLite layout)

use crate::model::{content::document_to_map, ContentItem};
use sea_orm::entity::prelude::*;
use sea_orm::ActiveValue::Set;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "cms_content")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(column_name = "type")]
    pub kind: String,
    pub collection: String,
    pub data: String,
    pub status: String,
    pub sort_order: i32,
    pub created_at: i64,
    pub updated_at: i64,
    pub published_at: Option<i64>,
    pub created_by: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::content_translations::Entity")]
    Translations,
}

impl Related<super::content_translations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Translations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for ContentItem {
    type Error = DbErr;

    fn try_from(m: Model) -> Result<Self, DbErr> {
        Ok(ContentItem {
            kind: m.kind.parse().map_err(DbErr::Custom)?,
            status: m.status.parse().map_err(DbErr::Custom)?,
            data: document_to_map(super::undoc(m.data)),
            id: m.id,
            collection: m.collection,
            sort_order: m.sort_order,
            created_at: super::unstamp(m.created_at),
            updated_at: super::unstamp(m.updated_at),
            published_at: m.published_at.map(super::unstamp),
            created_by: m.created_by,
        })
    }
}

impl From<&ContentItem> for ActiveModel {
    fn from(item: &ContentItem) -> Self {
        ActiveModel {
            id: Set(item.id.clone()),
            kind: Set(item.kind.as_str().to_owned()),
            collection: Set(item.collection.clone()),
            data: Set(super::doc_map(&item.data)),
            status: Set(item.status.as_str().to_owned()),
            sort_order: Set(item.sort_order),
            created_at: Set(super::stamp(item.created_at)),
            updated_at: Set(super::stamp(item.updated_at)),
            published_at: Set(item.published_at.map(super::stamp)),
            created_by: Set(item.created_by.clone()),
        }
    }
}
