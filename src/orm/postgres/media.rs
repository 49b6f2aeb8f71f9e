//! Uploaded media (Postgres layout)

use crate::model::MediaItem;
use sea_orm::entity::prelude::*;
use sea_orm::ActiveValue::Set;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "cms_media")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub filename: String,
    pub original_name: String,
    pub mime_type: String,
    pub size: i64,
    pub path: String,
    pub url: Option<String>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub alt: Option<String>,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub metadata: Option<Json>,
    pub created_at: DateTime,
    pub created_by: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for MediaItem {
    fn from(m: Model) -> Self {
        MediaItem {
            id: m.id,
            filename: m.filename,
            original_name: m.original_name,
            mime_type: m.mime_type,
            size: m.size,
            path: m.path,
            url: m.url,
            width: m.width,
            height: m.height,
            alt: m.alt,
            metadata: m.metadata.map(super::undoc),
            created_at: super::unstamp(m.created_at),
            created_by: m.created_by,
        }
    }
}

impl From<&MediaItem> for ActiveModel {
    fn from(item: &MediaItem) -> Self {
        ActiveModel {
            id: Set(item.id.clone()),
            filename: Set(item.filename.clone()),
            original_name: Set(item.original_name.clone()),
            mime_type: Set(item.mime_type.clone()),
            size: Set(item.size),
            path: Set(item.path.clone()),
            url: Set(item.url.clone()),
            width: Set(item.width),
            height: Set(item.height),
            alt: Set(item.alt.clone()),
            metadata: Set(item.metadata.as_ref().map(super::doc)),
            created_at: Set(super::stamp(item.created_at)),
            created_by: Set(item.created_by.clone()),
        }
    }
}
