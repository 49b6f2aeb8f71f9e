//! Per-locale content overrides (Postgres layout)

use crate::model::{content::document_to_map, ContentTranslation};
use sea_orm::entity::prelude::*;
use sea_orm::ActiveValue::Set;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "cms_content_translations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub content_id: String,
    pub locale: String,
    #[sea_orm(column_type = "JsonBinary")]
    pub data: Json,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::content::Entity",
        from = "Column::ContentId",
        to = "super::content::Column::Id",
        on_delete = "Cascade"
    )]
    Content,
}

impl Related<super::content::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Content.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for ContentTranslation {
    fn from(m: Model) -> Self {
        ContentTranslation {
            id: m.id,
            content_id: m.content_id,
            locale: m.locale,
            data: document_to_map(super::undoc(m.data)),
            created_at: super::unstamp(m.created_at),
            updated_at: super::unstamp(m.updated_at),
        }
    }
}

impl From<&ContentTranslation> for ActiveModel {
    fn from(t: &ContentTranslation) -> Self {
        ActiveModel {
            id: Set(t.id.clone()),
            content_id: Set(t.content_id.clone()),
            locale: Set(t.locale.clone()),
            data: Set(super::doc_map(&t.data)),
            created_at: Set(super::stamp(t.created_at)),
            updated_at: Set(super::stamp(t.updated_at)),
        }
    }
}
