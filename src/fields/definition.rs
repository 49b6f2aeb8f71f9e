//! Declarative field definitions.
//!
//! A content type is described by a [`FieldsSchema`], an ordered map of field
//! name to [`FieldDefinition`]. Definitions are loaded from the content model
//! file and drive both validation and sanitizing.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Map of field name to definition. `repeater` and `group` nest one of these.
pub type FieldsSchema = BTreeMap<String, FieldDefinition>;

/// Display width hint for admin forms.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldWidth {
    Full,
    Half,
    Third,
    Quarter,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOperator {
    Equals,
    NotEquals,
    Contains,
    NotContains,
    Empty,
    NotEmpty,
}

/// Show/hide rule evaluated by editors. Stored and returned as-is.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldCondition {
    pub field: String,
    pub operator: ConditionOperator,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

/// Attributes shared by every field type.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldBase {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translatable: Option<bool>,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub readonly: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<FieldWidth>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<FieldCondition>,
}

/// Option for select, radio and checkbox fields.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SelectOption {
    pub label: String,
    pub value: Value,
    #[serde(default)]
    pub disabled: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextField {
    #[serde(flatten)]
    pub base: FieldBase,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub pattern: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextareaField {
    #[serde(flatten)]
    pub base: FieldBase,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub rows: Option<u32>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NumberField {
    #[serde(flatten)]
    pub base: FieldBase,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub step: Option<f64>,
    pub decimals: Option<u32>,
}

/// Fields with no type-specific attributes (email, url, date, json, ...).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PlainField {
    #[serde(flatten)]
    pub base: FieldBase,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordField {
    #[serde(flatten)]
    pub base: FieldBase,
    pub min_length: Option<usize>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectField {
    #[serde(flatten)]
    pub base: FieldBase,
    #[serde(default)]
    pub options: Vec<SelectOption>,
    #[serde(default)]
    pub multiple: bool,
    #[serde(default)]
    pub searchable: bool,
}

/// Radio and checkbox fields.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceField {
    #[serde(flatten)]
    pub base: FieldBase,
    #[serde(default)]
    pub options: Vec<SelectOption>,
    #[serde(default)]
    pub inline: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BooleanField {
    #[serde(flatten)]
    pub base: FieldBase,
    pub label_on: Option<String>,
    pub label_off: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RichtextField {
    #[serde(flatten)]
    pub base: FieldBase,
    #[serde(default)]
    pub toolbar: Vec<String>,
    pub min_height: Option<u32>,
    pub max_height: Option<u32>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkdownField {
    #[serde(flatten)]
    pub base: FieldBase,
    #[serde(default)]
    pub preview: bool,
    pub rows: Option<u32>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeField {
    #[serde(flatten)]
    pub base: FieldBase,
    pub language: Option<String>,
    #[serde(default)]
    pub line_numbers: bool,
    pub rows: Option<u32>,
}

/// Image and file fields.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaField {
    #[serde(flatten)]
    pub base: FieldBase,
    #[serde(default)]
    pub accept: Vec<String>,
    pub max_size: Option<u64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryField {
    #[serde(flatten)]
    pub base: FieldBase,
    #[serde(default)]
    pub accept: Vec<String>,
    pub max_size: Option<u64>,
    pub max_items: Option<usize>,
    #[serde(default)]
    pub sortable: bool,
}

/// Date, datetime and time fields. Bounds are compared as ISO strings.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TemporalField {
    #[serde(flatten)]
    pub base: FieldBase,
    pub min: Option<String>,
    pub max: Option<String>,
    pub format: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Relationship {
    #[default]
    OneToOne,
    OneToMany,
    ManyToMany,
}

impl Relationship {
    pub fn is_many(self) -> bool {
        !matches!(self, Relationship::OneToOne)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationField {
    #[serde(flatten)]
    pub base: FieldBase,
    pub collection: String,
    #[serde(default)]
    pub relationship: Relationship,
    pub display_field: Option<String>,
    #[serde(default)]
    pub search_fields: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepeaterField {
    #[serde(flatten)]
    pub base: FieldBase,
    pub fields: FieldsSchema,
    pub min: Option<usize>,
    pub max: Option<usize>,
    #[serde(default)]
    pub collapsed: bool,
    pub item_label: Option<String>,
    #[serde(default)]
    pub sortable: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupField {
    #[serde(flatten)]
    pub base: FieldBase,
    pub fields: FieldsSchema,
    #[serde(default)]
    pub collapsed: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlugSeparator {
    #[default]
    #[serde(rename = "-")]
    Dash,
    #[serde(rename = "_")]
    Underscore,
}

impl SlugSeparator {
    pub fn as_char(self) -> char {
        match self {
            SlugSeparator::Dash => '-',
            SlugSeparator::Underscore => '_',
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlugField {
    #[serde(flatten)]
    pub base: FieldBase,
    pub from: Option<String>,
    pub prefix: Option<String>,
    #[serde(default)]
    pub separator: SlugSeparator,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ColorField {
    #[serde(flatten)]
    pub base: FieldBase,
    pub format: Option<String>,
    #[serde(default)]
    pub alpha: bool,
    #[serde(default)]
    pub presets: Vec<String>,
}

/// Every field type the CMS knows about.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FieldDefinition {
    Text(TextField),
    Textarea(TextareaField),
    Number(NumberField),
    Email(PlainField),
    Url(PlainField),
    Password(PasswordField),
    Select(SelectField),
    Radio(ChoiceField),
    Checkbox(ChoiceField),
    Boolean(BooleanField),
    Richtext(RichtextField),
    Markdown(MarkdownField),
    Code(CodeField),
    Image(MediaField),
    File(MediaField),
    Gallery(GalleryField),
    Date(TemporalField),
    Datetime(TemporalField),
    Time(TemporalField),
    Relation(RelationField),
    Json(PlainField),
    Repeater(RepeaterField),
    Group(GroupField),
    Color(ColorField),
    Slug(SlugField),
    Icon(PlainField),
}

impl FieldDefinition {
    pub fn base(&self) -> &FieldBase {
        use FieldDefinition::*;
        match self {
            Text(f) => &f.base,
            Textarea(f) => &f.base,
            Number(f) => &f.base,
            Email(f) | Url(f) | Json(f) | Icon(f) => &f.base,
            Password(f) => &f.base,
            Select(f) => &f.base,
            Radio(f) | Checkbox(f) => &f.base,
            Boolean(f) => &f.base,
            Richtext(f) => &f.base,
            Markdown(f) => &f.base,
            Code(f) => &f.base,
            Image(f) | File(f) => &f.base,
            Gallery(f) => &f.base,
            Date(f) | Datetime(f) | Time(f) => &f.base,
            Relation(f) => &f.base,
            Repeater(f) => &f.base,
            Group(f) => &f.base,
            Color(f) => &f.base,
            Slug(f) => &f.base,
        }
    }

    /// The serialized `type` tag.
    pub fn type_name(&self) -> &'static str {
        use FieldDefinition::*;
        match self {
            Text(_) => "text",
            Textarea(_) => "textarea",
            Number(_) => "number",
            Email(_) => "email",
            Url(_) => "url",
            Password(_) => "password",
            Select(_) => "select",
            Radio(_) => "radio",
            Checkbox(_) => "checkbox",
            Boolean(_) => "boolean",
            Richtext(_) => "richtext",
            Markdown(_) => "markdown",
            Code(_) => "code",
            Image(_) => "image",
            File(_) => "file",
            Gallery(_) => "gallery",
            Date(_) => "date",
            Datetime(_) => "datetime",
            Time(_) => "time",
            Relation(_) => "relation",
            Json(_) => "json",
            Repeater(_) => "repeater",
            Group(_) => "group",
            Color(_) => "color",
            Slug(_) => "slug",
            Icon(_) => "icon",
        }
    }

    pub fn is_required(&self) -> bool {
        self.base().required
    }

    /// Whether editors translate this field per locale. An explicit
    /// `translatable` flag wins over the per-type default.
    pub fn is_translatable(&self) -> bool {
        self.base().translatable.unwrap_or_else(|| {
            matches!(
                self,
                FieldDefinition::Text(_)
                    | FieldDefinition::Textarea(_)
                    | FieldDefinition::Richtext(_)
                    | FieldDefinition::Markdown(_)
                    | FieldDefinition::Code(_)
            )
        })
    }

    /// Whether the stored value is a JSON array or object rather than a scalar.
    pub fn is_json_valued(&self) -> bool {
        matches!(
            self,
            FieldDefinition::Checkbox(_)
                | FieldDefinition::Gallery(_)
                | FieldDefinition::Json(_)
                | FieldDefinition::Repeater(_)
                | FieldDefinition::Group(_)
        )
    }

    /// Nested schema for layout fields.
    pub fn nested(&self) -> Option<&FieldsSchema> {
        match self {
            FieldDefinition::Repeater(f) => Some(&f.fields),
            FieldDefinition::Group(f) => Some(&f.fields),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_tagged_definitions() {
        let schema: FieldsSchema = serde_json::from_value(json!({
            "title": { "type": "text", "required": true, "maxLength": 120 },
            "slug": { "type": "slug", "from": "title", "separator": "_" },
            "tags": {
                "type": "checkbox",
                "options": [
                    { "label": "Rust", "value": "rust" },
                    { "label": "Go", "value": "go" }
                ]
            },
            "author": { "type": "relation", "collection": "people", "relationship": "many-to-many" }
        }))
        .unwrap();

        match &schema["title"] {
            FieldDefinition::Text(f) => {
                assert!(f.base.required);
                assert_eq!(f.max_length, Some(120));
            }
            other => panic!("unexpected {:?}", other),
        }
        match &schema["slug"] {
            FieldDefinition::Slug(f) => {
                assert_eq!(f.from.as_deref(), Some("title"));
                assert_eq!(f.separator, SlugSeparator::Underscore);
            }
            other => panic!("unexpected {:?}", other),
        }
        match &schema["author"] {
            FieldDefinition::Relation(f) => assert!(f.relationship.is_many()),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(schema["tags"].type_name(), "checkbox");
    }

    #[test]
    fn test_nested_repeater_schema() {
        let field: FieldDefinition = serde_json::from_value(json!({
            "type": "repeater",
            "min": 1,
            "fields": {
                "caption": { "type": "text" },
                "meta": { "type": "group", "fields": { "alt": { "type": "text" } } }
            }
        }))
        .unwrap();

        let nested = field.nested().unwrap();
        assert!(nested["meta"].nested().unwrap().contains_key("alt"));
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let parsed = serde_json::from_value::<FieldDefinition>(json!({ "type": "hologram" }));
        assert!(parsed.is_err());
    }

    #[test]
    fn test_translatable_defaults() {
        let text: FieldDefinition = serde_json::from_value(json!({ "type": "text" })).unwrap();
        let number: FieldDefinition = serde_json::from_value(json!({ "type": "number" })).unwrap();
        let pinned: FieldDefinition =
            serde_json::from_value(json!({ "type": "text", "translatable": false })).unwrap();

        assert!(text.is_translatable());
        assert!(!number.is_translatable());
        assert!(!pinned.is_translatable());
        assert!(!text.is_json_valued());
    }
}
