//! CMS accounts (SQLite layout)

use crate::model::CmsUser;
use sea_orm::entity::prelude::*;
use sea_orm::ActiveValue::Set;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "cms_users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub username: String,
    pub password_hash: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub avatar: Option<String>,
    pub locale: Option<String>,
    pub role: String,
    pub role_id: Option<String>,
    pub active: bool,
    pub last_login: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::roles::Entity",
        from = "Column::RoleId",
        to = "super::roles::Column::Id",
        on_delete = "SetNull"
    )]
    Role,
}

impl Related<super::roles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Role.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for CmsUser {
    fn from(m: Model) -> Self {
        CmsUser {
            id: m.id,
            username: m.username,
            password_hash: m.password_hash,
            email: m.email,
            name: m.name,
            avatar: m.avatar,
            locale: m.locale,
            role: m.role,
            role_id: m.role_id,
            active: m.active,
            last_login: m.last_login.map(super::unstamp),
            created_at: super::unstamp(m.created_at),
            updated_at: super::unstamp(m.updated_at),
        }
    }
}

impl From<&CmsUser> for ActiveModel {
    fn from(user: &CmsUser) -> Self {
        ActiveModel {
            id: Set(user.id.clone()),
            username: Set(user.username.clone()),
            password_hash: Set(user.password_hash.clone()),
            email: Set(user.email.clone()),
            name: Set(user.name.clone()),
            avatar: Set(user.avatar.clone()),
            locale: Set(user.locale.clone()),
            role: Set(user.role.clone()),
            role_id: Set(user.role_id.clone()),
            active: Set(user.active),
            last_login: Set(user.last_login.map(super::stamp)),
            created_at: Set(super::stamp(user.created_at)),
            updated_at: Set(super::stamp(user.updated_at)),
        }
    }
}
