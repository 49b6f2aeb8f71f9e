use super::query::{
    parse_sort, title_matches, ContentPatch, ContentWithTranslations, ListQuery, NewContent, Page,
    Translations, DEFAULT_SORT,
};
use crate::cms_config::{CompiledSchema, ContentModel};
use crate::db::{ContentFilter, Store};
use crate::error::{CmsError, CmsResult};
use crate::fields::{sanitize, ValidationErrors};
use crate::model::content::merge_locale;
use crate::model::{ContentItem, ContentKind, ContentStatus, ContentTranslation};
use chrono::Utc;
use serde_json::{Map, Value};
use std::sync::Arc;
use uuid::Uuid;

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Content and translation access on top of a [`Store`], with every write
/// sanitized and validated against the content model.
#[derive(Clone)]
pub struct ContentRepository {
    store: Arc<dyn Store>,
    model: Arc<ContentModel>,
}

impl ContentRepository {
    pub fn new(store: Arc<dyn Store>, model: Arc<ContentModel>) -> Self {
        Self { store, model }
    }

    pub fn model(&self) -> &ContentModel {
        &self.model
    }

    /// Sanitizes then validates a full document.
    fn process(schema: &CompiledSchema, data: Map<String, Value>) -> CmsResult<Map<String, Value>> {
        let cleaned = sanitize(data, &schema.fields);
        Ok(schema.validator.validate(cleaned)?)
    }

    /// Sanitizes and validates every translation up front so a bad locale
    /// fails the request before anything is written.
    fn process_translations(
        &self,
        schema: &CompiledSchema,
        translations: Translations,
    ) -> CmsResult<Translations> {
        let mut errors = ValidationErrors::new();
        let mut out = Translations::new();

        for (locale, data) in translations {
            let prefix = format!("translations.{}", locale);
            if !self.model.config().has_locale(&locale) {
                errors.add(prefix, format!("Unknown locale \"{}\"", locale));
                continue;
            }
            let cleaned = sanitize(data, &schema.fields);
            match schema.validator.validate_partial(cleaned) {
                Ok(valid) => {
                    out.insert(locale, valid);
                }
                Err(e) => errors.extend_prefixed(&prefix, e),
            }
        }

        if errors.is_empty() {
            Ok(out)
        } else {
            Err(CmsError::Validation(errors))
        }
    }

    /// Updates the locale row in place when present, otherwise inserts one.
    async fn upsert_translations(&self, content_id: &str, translations: Translations) -> CmsResult<()> {
        let now = Utc::now();
        for (locale, data) in translations {
            match self.store.find_translation(content_id, &locale).await? {
                Some(mut existing) => {
                    existing.data = data;
                    existing.updated_at = now;
                    self.store.update_translation(&existing).await?;
                }
                None => {
                    self.store
                        .insert_translation(&ContentTranslation {
                            id: new_id(),
                            content_id: content_id.to_owned(),
                            locale,
                            data,
                            created_at: now,
                            updated_at: now,
                        })
                        .await?;
                }
            }
        }
        Ok(())
    }

    async fn with_translations(
        &self,
        mut item: ContentItem,
        locale: Option<&str>,
    ) -> CmsResult<ContentWithTranslations> {
        let translations: Translations = self
            .store
            .translations_for(&item.id)
            .await?
            .into_iter()
            .map(|t| (t.locale, t.data))
            .collect();
        if let Some(overlay) = locale.and_then(|l| translations.get(l)) {
            item.data = merge_locale(item.data, overlay);
        }
        Ok(ContentWithTranslations { item, translations })
    }

    pub async fn list_collection(
        &self,
        name: &str,
        query: &ListQuery,
    ) -> CmsResult<Page<ContentItem>> {
        let collection = self.model.collection_config(name)?;
        let sort = match (&query.sort, &collection.default_sort) {
            (Some(sort), _) => sort.clone(),
            (None, Some(default)) => default.as_signed(),
            (None, None) => DEFAULT_SORT.to_string(),
        };
        let paging = query.paging();
        let filter = ContentFilter {
            kind: ContentKind::Collection,
            collection: name.to_owned(),
            status: query.status.as_status(),
        };

        let (mut items, total) = self
            .store
            .list_content(&filter, parse_sort(&sort), Some(paging))
            .await?;

        if let Some(locale) = query.locale.as_deref() {
            let ids: Vec<String> = items.iter().map(|i| i.id.clone()).collect();
            let translations = self.store.translations_in_locale(&ids, locale).await?;
            for item in items.iter_mut() {
                if let Some(t) = translations.iter().find(|t| t.content_id == item.id) {
                    item.data = merge_locale(std::mem::take(&mut item.data), &t.data);
                }
            }
        }

        if let Some(search) = query.search.as_deref() {
            items.retain(|item| title_matches(&item.data, search));
        }

        Ok(Page::new(items, total, paging))
    }

    pub async fn get_by_id(
        &self,
        collection: &str,
        id: &str,
        locale: Option<&str>,
    ) -> CmsResult<ContentWithTranslations> {
        self.model.collection(collection)?;
        let item = self
            .store
            .find_content(ContentKind::Collection, collection, id)
            .await?
            .ok_or_else(|| CmsError::not_found("Content"))?;
        self.with_translations(item, locale).await
    }

    /// Inserts a new item and its translations, returning the new id.
    pub async fn create(
        &self,
        collection: &str,
        input: NewContent,
        created_by: Option<&str>,
    ) -> CmsResult<String> {
        let schema = self.model.collection(collection)?;
        let data = Self::process(schema, input.data)?;
        let translations = self.process_translations(schema, input.translations)?;

        let now = Utc::now();
        let item = ContentItem {
            id: new_id(),
            kind: ContentKind::Collection,
            collection: collection.to_owned(),
            data,
            status: input.status,
            sort_order: 0,
            created_at: now,
            updated_at: now,
            published_at: (input.status == ContentStatus::Published).then_some(now),
            created_by: created_by.map(str::to_owned),
        };
        self.store.insert_content(&item).await?;
        self.upsert_translations(&item.id, translations).await?;

        log::debug!("Created {} item {}", collection, item.id);
        Ok(item.id)
    }

    pub async fn update(&self, collection: &str, id: &str, patch: ContentPatch) -> CmsResult<()> {
        let schema = self.model.collection(collection)?;
        let mut item = self
            .store
            .find_content(ContentKind::Collection, collection, id)
            .await?
            .ok_or_else(|| CmsError::not_found("Content"))?;

        if let Some(data) = patch.data {
            item.data = Self::process(schema, data)?;
        }
        let translations = self.process_translations(schema, patch.translations)?;

        let now = Utc::now();
        if let Some(status) = patch.status {
            item.status = status;
            if status == ContentStatus::Published && item.published_at.is_none() {
                item.published_at = Some(now);
            }
        }
        item.updated_at = now;

        self.store.update_content(&item).await?;
        self.upsert_translations(&item.id, translations).await
    }

    pub async fn delete(&self, collection: &str, id: &str) -> CmsResult<()> {
        self.model.collection(collection)?;
        if self
            .store
            .find_content(ContentKind::Collection, collection, id)
            .await?
            .is_none()
        {
            return Err(CmsError::not_found("Content"));
        }
        if !self.store.delete_content(id).await? {
            return Err(CmsError::not_found("Content"));
        }
        Ok(())
    }

    /// The singleton row with translations, or `None` before its first save.
    pub async fn get_singleton(
        &self,
        name: &str,
        locale: Option<&str>,
    ) -> CmsResult<Option<ContentWithTranslations>> {
        self.model.singleton(name)?;
        match self.store.find_singleton(name).await? {
            Some(item) => Ok(Some(self.with_translations(item, locale).await?)),
            None => Ok(None),
        }
    }

    async fn overwrite_singleton(
        &self,
        mut item: ContentItem,
        data: Map<String, Value>,
    ) -> CmsResult<String> {
        let now = Utc::now();
        item.data = data;
        item.status = ContentStatus::Published;
        item.published_at = item.published_at.or(Some(now));
        item.updated_at = now;
        self.store.update_content(&item).await?;
        Ok(item.id)
    }

    /// Creates the singleton on first call and updates it afterwards. The row
    /// is always published.
    pub async fn upsert_singleton(
        &self,
        name: &str,
        data: Map<String, Value>,
        translations: Translations,
        created_by: Option<&str>,
    ) -> CmsResult<String> {
        let schema = self.model.singleton(name)?;
        let data = Self::process(schema, data)?;
        let translations = self.process_translations(schema, translations)?;
        let now = Utc::now();

        let id = match self.store.find_singleton(name).await? {
            Some(item) => self.overwrite_singleton(item, data).await?,
            None => {
                let item = ContentItem {
                    id: new_id(),
                    kind: ContentKind::Singleton,
                    collection: name.to_owned(),
                    data,
                    status: ContentStatus::Published,
                    sort_order: 0,
                    created_at: now,
                    updated_at: now,
                    published_at: Some(now),
                    created_by: created_by.map(str::to_owned),
                };
                match self.store.insert_content(&item).await {
                    Ok(()) => item.id,
                    // A concurrent request created the row first.
                    Err(CmsError::Conflict(_)) => {
                        let existing = self
                            .store
                            .find_singleton(name)
                            .await?
                            .ok_or_else(|| CmsError::not_found(format!("Singleton {}", name)))?;
                        self.overwrite_singleton(existing, item.data).await?
                    }
                    Err(e) => return Err(e),
                }
            }
        };

        self.upsert_translations(&id, translations).await?;
        Ok(id)
    }
}
