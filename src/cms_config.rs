//! Content model: locales, collections and singletons with their field
//! schemas. Loaded once from a JSON file and compiled into validators.

use crate::error::{CmsError, CmsResult};
use crate::fields::{build_validator, FieldsSchema, Validator};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DefaultSort {
    pub field: String,
    pub direction: SortDirection,
}

impl DefaultSort {
    /// Signed form accepted by list queries, e.g. `-createdAt`.
    pub fn as_signed(&self) -> String {
        match self.direction {
            SortDirection::Asc => self.field.clone(),
            SortDirection::Desc => format!("-{}", self.field),
        }
    }
}

fn yes() -> bool {
    true
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionConfig {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_plural: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug_field: Option<String>,
    pub fields: FieldsSchema,
    #[serde(default = "yes")]
    pub timestamps: bool,
    #[serde(default)]
    pub soft_delete: bool,
    #[serde(default = "yes")]
    pub publishable: bool,
    #[serde(default)]
    pub sortable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_sort: Option<DefaultSort>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SingletonConfig {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub fields: FieldsSchema,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CmsConfig {
    pub locales: Vec<String>,
    pub default_locale: String,
    #[serde(default)]
    pub collections: BTreeMap<String, CollectionConfig>,
    #[serde(default)]
    pub singletons: BTreeMap<String, SingletonConfig>,
}

impl Default for CmsConfig {
    fn default() -> Self {
        Self {
            locales: vec!["en".to_string()],
            default_locale: "en".to_string(),
            collections: BTreeMap::new(),
            singletons: BTreeMap::new(),
        }
    }
}

impl CmsConfig {
    pub fn from_json(text: &str) -> CmsResult<Self> {
        let config: CmsConfig = serde_json::from_str(text)
            .map_err(|e| CmsError::Configuration(format!("invalid content model: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads the model file. A missing file yields the empty default model.
    pub fn load(path: impl AsRef<Path>) -> CmsResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            log::warn!(
                "Content model {} not found; starting with no collections",
                path.display()
            );
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path).map_err(|e| {
            CmsError::Configuration(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&text)
    }

    pub fn validate(&self) -> CmsResult<()> {
        if self.locales.is_empty() {
            return Err(CmsError::Configuration(
                "At least one locale must be defined".to_string(),
            ));
        }
        if self.default_locale.is_empty() {
            return Err(CmsError::Configuration(
                "Default locale must be defined".to_string(),
            ));
        }
        if !self.locales.contains(&self.default_locale) {
            return Err(CmsError::Configuration(
                "Default locale must be included in locales array".to_string(),
            ));
        }
        for (name, collection) in &self.collections {
            if collection.fields.is_empty() {
                return Err(CmsError::Configuration(format!(
                    "Collection \"{}\" must have at least one field",
                    name
                )));
            }
        }
        for (name, singleton) in &self.singletons {
            if singleton.fields.is_empty() {
                return Err(CmsError::Configuration(format!(
                    "Singleton \"{}\" must have at least one field",
                    name
                )));
            }
        }
        Ok(())
    }

    pub fn has_locale(&self, locale: &str) -> bool {
        self.locales.iter().any(|l| l == locale)
    }
}

/// A schema together with its compiled validator.
#[derive(Debug)]
pub struct CompiledSchema {
    pub fields: FieldsSchema,
    pub validator: Validator,
}

impl CompiledSchema {
    fn compile(fields: &FieldsSchema) -> CmsResult<Self> {
        Ok(Self {
            fields: fields.clone(),
            validator: build_validator(fields)?,
        })
    }
}

/// The validated [`CmsConfig`] with every schema compiled up front.
#[derive(Debug)]
pub struct ContentModel {
    config: CmsConfig,
    collections: BTreeMap<String, CompiledSchema>,
    singletons: BTreeMap<String, CompiledSchema>,
}

impl ContentModel {
    pub fn new(config: CmsConfig) -> CmsResult<Self> {
        config.validate()?;

        let mut collections = BTreeMap::new();
        for (name, collection) in &config.collections {
            let compiled = CompiledSchema::compile(&collection.fields).map_err(|e| {
                CmsError::Configuration(format!("collection {}: {}", name, e))
            })?;
            collections.insert(name.clone(), compiled);
        }

        let mut singletons = BTreeMap::new();
        for (name, singleton) in &config.singletons {
            let compiled = CompiledSchema::compile(&singleton.fields).map_err(|e| {
                CmsError::Configuration(format!("singleton {}: {}", name, e))
            })?;
            singletons.insert(name.clone(), compiled);
        }

        Ok(Self {
            config,
            collections,
            singletons,
        })
    }

    pub fn config(&self) -> &CmsConfig {
        &self.config
    }

    pub fn default_locale(&self) -> &str {
        &self.config.default_locale
    }

    pub fn collection_config(&self, name: &str) -> CmsResult<&CollectionConfig> {
        self.config
            .collections
            .get(name)
            .ok_or_else(|| CmsError::not_found(format!("Collection \"{}\"", name)))
    }

    pub fn collection(&self, name: &str) -> CmsResult<&CompiledSchema> {
        self.collections
            .get(name)
            .ok_or_else(|| CmsError::not_found(format!("Collection \"{}\"", name)))
    }

    pub fn singleton(&self, name: &str) -> CmsResult<&CompiledSchema> {
        self.singletons
            .get(name)
            .ok_or_else(|| CmsError::not_found(format!("Singleton \"{}\"", name)))
    }

    pub fn collection_names(&self) -> Vec<&str> {
        self.config.collections.keys().map(String::as_str).collect()
    }

    pub fn singleton_names(&self) -> Vec<&str> {
        self.config.singletons.keys().map(String::as_str).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MODEL: &str = r#"{
        "locales": ["en", "es"],
        "defaultLocale": "en",
        "collections": {
            "posts": {
                "label": "Post",
                "labelPlural": "Posts",
                "titleField": "title",
                "defaultSort": { "field": "publishedAt", "direction": "desc" },
                "fields": {
                    "title": { "type": "text", "label": "Title", "required": true },
                    "slug": { "type": "slug", "label": "Slug", "from": "title" }
                }
            }
        },
        "singletons": {
            "homepage": {
                "label": "Homepage",
                "fields": { "headline": { "type": "text", "label": "Headline" } }
            }
        }
    }"#;

    #[test]
    fn test_parse_model() {
        let config = CmsConfig::from_json(MODEL).unwrap();
        let posts = &config.collections["posts"];
        assert_eq!(posts.label_plural.as_deref(), Some("Posts"));
        assert!(posts.publishable);
        assert!(posts.timestamps);
        assert!(!posts.sortable);
        assert_eq!(posts.default_sort.as_ref().unwrap().as_signed(), "-publishedAt");
        assert!(config.has_locale("es"));
        assert!(!config.has_locale("fr"));
    }

    #[test]
    fn test_default_locale_must_be_listed() {
        let err = CmsConfig::from_json(r#"{ "locales": ["en"], "defaultLocale": "fr" }"#)
            .unwrap_err();
        assert!(err.to_string().contains("Default locale must be included"));
    }

    #[test]
    fn test_collections_need_fields() {
        let err = CmsConfig::from_json(
            r#"{ "locales": ["en"], "defaultLocale": "en",
                 "collections": { "posts": { "label": "Post", "fields": {} } } }"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("Collection \"posts\""));
    }

    #[test]
    fn test_no_locales_is_rejected() {
        let err =
            CmsConfig::from_json(r#"{ "locales": [], "defaultLocale": "en" }"#).unwrap_err();
        assert!(matches!(err, CmsError::Configuration(_)));
    }

    #[test]
    fn test_model_lookup() {
        let model = ContentModel::new(CmsConfig::from_json(MODEL).unwrap()).unwrap();
        assert!(model.collection("posts").is_ok());
        assert!(matches!(model.collection("pages"), Err(CmsError::NotFound(_))));
        assert!(model.singleton("homepage").is_ok());
        assert_eq!(model.collection_names(), vec!["posts"]);
        assert_eq!(model.default_locale(), "en");
    }

    #[test]
    fn test_load_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = CmsConfig::load(dir.path().join("cms.json")).unwrap();
        assert_eq!(config, CmsConfig::default());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MODEL.as_bytes()).unwrap();
        let config = CmsConfig::load(file.path()).unwrap();
        assert_eq!(config.locales, vec!["en", "es"]);
    }
}
