//! `Store` over sea-orm, shared by both backends.
//!
//! The two entity sets under `crate::orm` have the same entity and column
//! names and differ only in column types, so a single body serves both. Each
//! backend supplies `stamp`/`unstamp`/`doc_map` for its own encodings.

macro_rules! sea_store {
    ($store:ident, $orm:ident, $driver:expr) => {
        #[async_trait::async_trait]
        impl $crate::db::Store for $store {
            fn driver(&self) -> $crate::db::Driver {
                $driver
            }

            async fn list_content(
                &self,
                filter: &$crate::db::ContentFilter,
                order: $crate::db::ContentOrder,
                paging: Option<$crate::db::Paging>,
            ) -> $crate::error::CmsResult<(Vec<$crate::model::ContentItem>, u64)> {
                use $crate::db::ContentSortField;
                use $crate::orm::$orm::content;
                use sea_orm::{EntityTrait, Order, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect};
                use sea_orm::ColumnTrait;

                let mut query = content::Entity::find()
                    .filter(content::Column::Kind.eq(filter.kind.as_str()))
                    .filter(content::Column::Collection.eq(filter.collection.as_str()));
                if let Some(status) = filter.status {
                    query = query.filter(content::Column::Status.eq(status.as_str()));
                }

                let total = query.clone().count(&self.db).await? as u64;

                let column = match order.field {
                    ContentSortField::CreatedAt => content::Column::CreatedAt,
                    ContentSortField::UpdatedAt => content::Column::UpdatedAt,
                    ContentSortField::PublishedAt => content::Column::PublishedAt,
                    ContentSortField::SortOrder => content::Column::SortOrder,
                    ContentSortField::Status => content::Column::Status,
                };
                let direction = if order.descending { Order::Desc } else { Order::Asc };
                query = query
                    .order_by(column, direction.clone())
                    .order_by(content::Column::Id, direction);

                if let Some(paging) = paging {
                    match paging.offset() {
                        Some(offset) => query = query.limit(paging.per_page).offset(offset),
                        None => return Ok((Vec::new(), total)),
                    }
                }

                let items = query
                    .all(&self.db)
                    .await?
                    .into_iter()
                    .map($crate::model::ContentItem::try_from)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok((items, total))
            }

            async fn find_content(
                &self,
                kind: $crate::model::ContentKind,
                collection: &str,
                id: &str,
            ) -> $crate::error::CmsResult<Option<$crate::model::ContentItem>> {
                use $crate::orm::$orm::content;
                use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

                content::Entity::find_by_id(id.to_owned())
                    .filter(content::Column::Kind.eq(kind.as_str()))
                    .filter(content::Column::Collection.eq(collection))
                    .one(&self.db)
                    .await?
                    .map($crate::model::ContentItem::try_from)
                    .transpose()
                    .map_err(Into::into)
            }

            async fn find_singleton(
                &self,
                name: &str,
            ) -> $crate::error::CmsResult<Option<$crate::model::ContentItem>> {
                use $crate::orm::$orm::content;
                use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};

                content::Entity::find()
                    .filter(content::Column::Kind.eq($crate::model::ContentKind::Singleton.as_str()))
                    .filter(content::Column::Collection.eq(name))
                    .order_by_asc(content::Column::CreatedAt)
                    .one(&self.db)
                    .await?
                    .map($crate::model::ContentItem::try_from)
                    .transpose()
                    .map_err(Into::into)
            }

            async fn insert_content(
                &self,
                item: &$crate::model::ContentItem,
            ) -> $crate::error::CmsResult<()> {
                use $crate::orm::$orm::content;
                use sea_orm::EntityTrait;

                content::Entity::insert(content::ActiveModel::from(item))
                    .exec(&self.db)
                    .await
                    .map_err(|e| $crate::db::map_unique(e, "Content already exists"))?;
                Ok(())
            }

            async fn update_content(
                &self,
                item: &$crate::model::ContentItem,
            ) -> $crate::error::CmsResult<()> {
                use $crate::orm::$orm::{content, stamp, doc_map};
                use sea_orm::{sea_query::Expr, ColumnTrait, EntityTrait, QueryFilter};

                content::Entity::update_many()
                    .col_expr(content::Column::Data, Expr::value(doc_map(&item.data)))
                    .col_expr(content::Column::Status, Expr::value(item.status.as_str()))
                    .col_expr(content::Column::SortOrder, Expr::value(item.sort_order))
                    .col_expr(content::Column::UpdatedAt, Expr::value(stamp(item.updated_at)))
                    .col_expr(
                        content::Column::PublishedAt,
                        Expr::value(item.published_at.map(stamp)),
                    )
                    .filter(content::Column::Id.eq(item.id.as_str()))
                    .exec(&self.db)
                    .await?;
                Ok(())
            }

            async fn delete_content(&self, id: &str) -> $crate::error::CmsResult<bool> {
                use $crate::orm::$orm::{content, content_translations};
                use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, TransactionTrait};

                let txn = self.db.begin().await?;
                content_translations::Entity::delete_many()
                    .filter(content_translations::Column::ContentId.eq(id))
                    .exec(&txn)
                    .await?;
                let res = content::Entity::delete_many()
                    .filter(content::Column::Id.eq(id))
                    .exec(&txn)
                    .await?;
                txn.commit().await?;
                Ok(res.rows_affected > 0)
            }

            async fn translations_for(
                &self,
                content_id: &str,
            ) -> $crate::error::CmsResult<Vec<$crate::model::ContentTranslation>> {
                use $crate::orm::$orm::content_translations as tr;
                use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};

                Ok(tr::Entity::find()
                    .filter(tr::Column::ContentId.eq(content_id))
                    .order_by_asc(tr::Column::Locale)
                    .all(&self.db)
                    .await?
                    .into_iter()
                    .map(Into::into)
                    .collect())
            }

            async fn translations_in_locale(
                &self,
                content_ids: &[String],
                locale: &str,
            ) -> $crate::error::CmsResult<Vec<$crate::model::ContentTranslation>> {
                use $crate::orm::$orm::content_translations as tr;
                use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

                if content_ids.is_empty() {
                    return Ok(Vec::new());
                }
                Ok(tr::Entity::find()
                    .filter(tr::Column::Locale.eq(locale))
                    .filter(tr::Column::ContentId.is_in(content_ids.iter().cloned()))
                    .all(&self.db)
                    .await?
                    .into_iter()
                    .map(Into::into)
                    .collect())
            }

            async fn find_translation(
                &self,
                content_id: &str,
                locale: &str,
            ) -> $crate::error::CmsResult<Option<$crate::model::ContentTranslation>> {
                use $crate::orm::$orm::content_translations as tr;
                use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

                Ok(tr::Entity::find()
                    .filter(tr::Column::ContentId.eq(content_id))
                    .filter(tr::Column::Locale.eq(locale))
                    .one(&self.db)
                    .await?
                    .map(Into::into))
            }

            async fn insert_translation(
                &self,
                translation: &$crate::model::ContentTranslation,
            ) -> $crate::error::CmsResult<()> {
                use $crate::orm::$orm::content_translations as tr;
                use sea_orm::EntityTrait;

                tr::Entity::insert(tr::ActiveModel::from(translation))
                    .exec(&self.db)
                    .await
                    .map_err(|e| {
                        $crate::db::map_unique(e, "Translation for this locale already exists")
                    })?;
                Ok(())
            }

            async fn update_translation(
                &self,
                translation: &$crate::model::ContentTranslation,
            ) -> $crate::error::CmsResult<()> {
                use $crate::orm::$orm::{content_translations as tr, doc_map, stamp};
                use sea_orm::{sea_query::Expr, ColumnTrait, EntityTrait, QueryFilter};

                tr::Entity::update_many()
                    .col_expr(tr::Column::Data, Expr::value(doc_map(&translation.data)))
                    .col_expr(tr::Column::UpdatedAt, Expr::value(stamp(translation.updated_at)))
                    .filter(tr::Column::Id.eq(translation.id.as_str()))
                    .exec(&self.db)
                    .await?;
                Ok(())
            }

            async fn insert_media(
                &self,
                item: &$crate::model::MediaItem,
            ) -> $crate::error::CmsResult<()> {
                use $crate::orm::$orm::media;
                use sea_orm::EntityTrait;

                media::Entity::insert(media::ActiveModel::from(item))
                    .exec(&self.db)
                    .await?;
                Ok(())
            }

            async fn find_media(
                &self,
                id: &str,
            ) -> $crate::error::CmsResult<Option<$crate::model::MediaItem>> {
                use $crate::orm::$orm::media;
                use sea_orm::EntityTrait;

                Ok(media::Entity::find_by_id(id.to_owned())
                    .one(&self.db)
                    .await?
                    .map(Into::into))
            }

            async fn list_media(
                &self,
                filter: &$crate::db::MediaFilter,
            ) -> $crate::error::CmsResult<(Vec<$crate::model::MediaItem>, u64)> {
                use $crate::db::MediaSortField;
                use $crate::orm::$orm::media;
                use sea_orm::{
                    ColumnTrait, Condition, EntityTrait, Order, PaginatorTrait, QueryFilter,
                    QueryOrder, QuerySelect,
                };

                let mut query = media::Entity::find();
                if let Some(prefix) = filter.type_prefix.as_deref() {
                    query = query.filter(media::Column::MimeType.starts_with(prefix));
                }
                if let Some(search) = filter.search.as_deref() {
                    query = query.filter(
                        Condition::any()
                            .add(media::Column::Filename.contains(search))
                            .add(media::Column::OriginalName.contains(search))
                            .add(media::Column::Alt.contains(search)),
                    );
                }

                let total = query.clone().count(&self.db).await? as u64;

                let column = match filter.order_by {
                    MediaSortField::CreatedAt => media::Column::CreatedAt,
                    MediaSortField::Filename => media::Column::Filename,
                    MediaSortField::Size => media::Column::Size,
                };
                let direction = if filter.descending { Order::Desc } else { Order::Asc };
                let offset = match filter.paging.offset() {
                    Some(offset) => offset,
                    None => return Ok((Vec::new(), total)),
                };
                let items = query
                    .order_by(column, direction)
                    .limit(filter.paging.per_page)
                    .offset(offset)
                    .all(&self.db)
                    .await?
                    .into_iter()
                    .map(Into::into)
                    .collect();
                Ok((items, total))
            }

            async fn delete_media(&self, id: &str) -> $crate::error::CmsResult<bool> {
                use $crate::orm::$orm::media;
                use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

                let res = media::Entity::delete_many()
                    .filter(media::Column::Id.eq(id))
                    .exec(&self.db)
                    .await?;
                Ok(res.rows_affected > 0)
            }

            async fn find_user(
                &self,
                id: &str,
            ) -> $crate::error::CmsResult<Option<$crate::model::CmsUser>> {
                use $crate::orm::$orm::users;
                use sea_orm::EntityTrait;

                Ok(users::Entity::find_by_id(id.to_owned())
                    .one(&self.db)
                    .await?
                    .map(Into::into))
            }

            async fn find_user_by_username(
                &self,
                username: &str,
            ) -> $crate::error::CmsResult<Option<$crate::model::CmsUser>> {
                use $crate::orm::$orm::users;
                use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

                Ok(users::Entity::find()
                    .filter(users::Column::Username.eq(username))
                    .one(&self.db)
                    .await?
                    .map(Into::into))
            }

            async fn find_user_by_email(
                &self,
                email: &str,
            ) -> $crate::error::CmsResult<Option<$crate::model::CmsUser>> {
                use $crate::orm::$orm::users;
                use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

                Ok(users::Entity::find()
                    .filter(users::Column::Email.eq(email))
                    .one(&self.db)
                    .await?
                    .map(Into::into))
            }

            async fn list_users(&self) -> $crate::error::CmsResult<Vec<$crate::model::CmsUser>> {
                use $crate::orm::$orm::users;
                use sea_orm::{EntityTrait, QueryOrder};

                Ok(users::Entity::find()
                    .order_by_asc(users::Column::CreatedAt)
                    .all(&self.db)
                    .await?
                    .into_iter()
                    .map(Into::into)
                    .collect())
            }

            async fn insert_user(
                &self,
                user: &$crate::model::CmsUser,
            ) -> $crate::error::CmsResult<()> {
                use $crate::orm::$orm::users;
                use sea_orm::EntityTrait;

                users::Entity::insert(users::ActiveModel::from(user))
                    .exec(&self.db)
                    .await
                    .map_err(|e| $crate::db::map_unique(e, "Username already exists"))?;
                Ok(())
            }

            async fn record_login(
                &self,
                id: &str,
                at: chrono::DateTime<chrono::Utc>,
            ) -> $crate::error::CmsResult<()> {
                use $crate::orm::$orm::{stamp, users};
                use sea_orm::{sea_query::Expr, ColumnTrait, EntityTrait, QueryFilter};

                users::Entity::update_many()
                    .col_expr(users::Column::LastLogin, Expr::value(Some(stamp(at))))
                    .filter(users::Column::Id.eq(id))
                    .exec(&self.db)
                    .await?;
                Ok(())
            }

            async fn set_user_role(
                &self,
                id: &str,
                role: &str,
                role_id: Option<&str>,
            ) -> $crate::error::CmsResult<()> {
                use $crate::orm::$orm::{stamp, users};
                use sea_orm::{sea_query::Expr, ColumnTrait, EntityTrait, QueryFilter};

                users::Entity::update_many()
                    .col_expr(users::Column::Role, Expr::value(role))
                    .col_expr(users::Column::RoleId, Expr::value(role_id.map(str::to_owned)))
                    .col_expr(users::Column::UpdatedAt, Expr::value(stamp(chrono::Utc::now())))
                    .filter(users::Column::Id.eq(id))
                    .exec(&self.db)
                    .await?;
                Ok(())
            }

            async fn users_without_role_id(
                &self,
            ) -> $crate::error::CmsResult<Vec<$crate::model::CmsUser>> {
                use $crate::orm::$orm::users;
                use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

                Ok(users::Entity::find()
                    .filter(users::Column::RoleId.is_null())
                    .all(&self.db)
                    .await?
                    .into_iter()
                    .map(Into::into)
                    .collect())
            }

            async fn list_roles(&self) -> $crate::error::CmsResult<Vec<$crate::model::Role>> {
                use $crate::orm::$orm::roles;
                use sea_orm::{EntityTrait, QueryOrder};

                roles::Entity::find()
                    .order_by_desc(roles::Column::IsSystem)
                    .order_by_asc(roles::Column::Name)
                    .all(&self.db)
                    .await?
                    .into_iter()
                    .map($crate::model::Role::try_from)
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(Into::into)
            }

            async fn find_role(
                &self,
                id: &str,
            ) -> $crate::error::CmsResult<Option<$crate::model::Role>> {
                use $crate::orm::$orm::roles;
                use sea_orm::EntityTrait;

                roles::Entity::find_by_id(id.to_owned())
                    .one(&self.db)
                    .await?
                    .map($crate::model::Role::try_from)
                    .transpose()
                    .map_err(Into::into)
            }

            async fn find_role_by_name(
                &self,
                name: &str,
            ) -> $crate::error::CmsResult<Option<$crate::model::Role>> {
                use $crate::orm::$orm::roles;
                use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

                roles::Entity::find()
                    .filter(roles::Column::Name.eq(name))
                    .one(&self.db)
                    .await?
                    .map($crate::model::Role::try_from)
                    .transpose()
                    .map_err(Into::into)
            }

            async fn insert_role(&self, role: &$crate::model::Role) -> $crate::error::CmsResult<()> {
                use $crate::orm::$orm::roles;
                use sea_orm::EntityTrait;

                roles::Entity::insert(roles::ActiveModel::try_from(role)?)
                    .exec(&self.db)
                    .await
                    .map_err(|e| $crate::db::map_unique(e, "Role name already exists"))?;
                Ok(())
            }

            async fn update_role(&self, role: &$crate::model::Role) -> $crate::error::CmsResult<()> {
                use $crate::orm::$orm::roles;
                use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

                roles::Entity::update_many()
                    .set(roles::ActiveModel::try_from(role)?)
                    .filter(roles::Column::Id.eq(role.id.as_str()))
                    .exec(&self.db)
                    .await
                    .map_err(|e| $crate::db::map_unique(e, "Role name already exists"))?;
                Ok(())
            }

            async fn delete_role(
                &self,
                id: &str,
                reassign_to: Option<&str>,
            ) -> $crate::error::CmsResult<bool> {
                use $crate::orm::$orm::{roles, users};
                use sea_orm::{
                    sea_query::Expr, ColumnTrait, EntityTrait, QueryFilter, TransactionTrait,
                };

                let txn = self.db.begin().await?;
                users::Entity::update_many()
                    .col_expr(
                        users::Column::RoleId,
                        Expr::value(reassign_to.map(str::to_owned)),
                    )
                    .filter(users::Column::RoleId.eq(id))
                    .exec(&txn)
                    .await?;
                let res = roles::Entity::delete_many()
                    .filter(roles::Column::Id.eq(id))
                    .exec(&txn)
                    .await?;
                txn.commit().await?;
                Ok(res.rows_affected > 0)
            }

            async fn get_setting(
                &self,
                key: &str,
            ) -> $crate::error::CmsResult<Option<$crate::model::Setting>> {
                use $crate::orm::$orm::settings;
                use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

                Ok(settings::Entity::find()
                    .filter(settings::Column::Key.eq(key))
                    .one(&self.db)
                    .await?
                    .map(Into::into))
            }

            async fn put_setting(&self, key: &str, value: &str) -> $crate::error::CmsResult<()> {
                use $crate::orm::$orm::{settings, stamp};
                use sea_orm::ActiveValue::{NotSet, Set};
                use sea_orm::{sea_query::Expr, ColumnTrait, EntityTrait, QueryFilter};

                let now = stamp(chrono::Utc::now());
                let res = settings::Entity::update_many()
                    .col_expr(settings::Column::Value, Expr::value(value))
                    .col_expr(settings::Column::UpdatedAt, Expr::value(now.clone()))
                    .filter(settings::Column::Key.eq(key))
                    .exec(&self.db)
                    .await?;
                if res.rows_affected == 0 {
                    settings::Entity::insert(settings::ActiveModel {
                        id: NotSet,
                        key: Set(key.to_owned()),
                        value: Set(value.to_owned()),
                        created_at: Set(now.clone()),
                        updated_at: Set(now),
                    })
                    .exec(&self.db)
                    .await?;
                }
                Ok(())
            }
        }
    };
}

pub(crate) use sea_store;
