//! Roles and their permission documents (Postgres layout)

use crate::model::Role;
use sea_orm::entity::prelude::*;
use sea_orm::ActiveValue::Set;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "cms_roles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(unique)]
    pub name: String,
    pub display_name: String,
    pub description: Option<String>,
    #[sea_orm(column_type = "JsonBinary")]
    pub permissions: Json,
    pub is_system: bool,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::users::Entity")]
    Users,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Role {
    type Error = DbErr;

    fn try_from(m: Model) -> Result<Self, DbErr> {
        let permissions = serde_json::from_value(super::undoc(m.permissions))
            .map_err(|e| DbErr::Custom(format!("role {} has invalid permissions: {}", m.name, e)))?;
        Ok(Role {
            id: m.id,
            name: m.name,
            display_name: m.display_name,
            description: m.description,
            permissions,
            is_system: m.is_system,
            created_at: super::unstamp(m.created_at),
            updated_at: super::unstamp(m.updated_at),
        })
    }
}

impl TryFrom<&Role> for ActiveModel {
    type Error = DbErr;

    fn try_from(role: &Role) -> Result<Self, DbErr> {
        let permissions = serde_json::to_value(&role.permissions)
            .map_err(|e| DbErr::Custom(e.to_string()))?;
        Ok(ActiveModel {
            id: Set(role.id.clone()),
            name: Set(role.name.clone()),
            display_name: Set(role.display_name.clone()),
            description: Set(role.description.clone()),
            permissions: Set(super::doc(&permissions)),
            is_system: Set(role.is_system),
            created_at: Set(super::stamp(role.created_at)),
            updated_at: Set(super::stamp(role.updated_at)),
        })
    }
}
