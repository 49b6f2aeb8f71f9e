//! Content sanitizing: HTML allow-listing for richtext and slug normalization.

use super::definition::{FieldDefinition, FieldsSchema, SlugSeparator};
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};

const ALLOWED_TAGS: &[&str] = &[
    "p", "br", "strong", "b", "em", "i", "u", "s", "strike", "a", "ul", "ol", "li", "h1", "h2",
    "h3", "h4", "h5", "h6", "blockquote", "pre", "code", "img", "hr", "table", "thead", "tbody",
    "tr", "th", "td", "span", "div",
];

const ALLOWED_ATTRIBUTES: &[&str] = &["href", "src", "alt", "title", "class", "target", "rel", "style"];

fn html_policy() -> ammonia::Builder<'static> {
    let mut builder = ammonia::Builder::default();
    builder
        .tags(ALLOWED_TAGS.iter().copied().collect::<HashSet<_>>())
        .tag_attributes(HashMap::new())
        .generic_attributes(ALLOWED_ATTRIBUTES.iter().copied().collect::<HashSet<_>>())
        // `rel` is an allowed attribute, so ammonia must not manage it.
        .link_rel(None);
    builder
}

/// Strips everything outside the richtext allow-list. Scripts, event handlers
/// and unknown attributes are removed; `javascript:` URLs are dropped.
pub fn sanitize_html(html: &str) -> String {
    html_policy().clean(html).to_string()
}

/// Lowercase, ASCII-only slug joined by `separator`.
pub fn slugify(text: &str, separator: SlugSeparator) -> String {
    let slug = slug::slugify(text);
    match separator {
        SlugSeparator::Dash => slug,
        SlugSeparator::Underscore => slug.replace('-', "_"),
    }
}

fn slug_source(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Applies per-field transforms to `data`.
///
/// * `richtext` strings are HTML sanitized.
/// * `slug` values are normalized; an empty or missing slug is derived from
///   its `from` field when that field has a value, otherwise left as-is.
/// * `repeater` and `group` values are processed recursively.
///
/// Keys without a definition pass through untouched.
pub fn sanitize(data: Map<String, Value>, schema: &FieldsSchema) -> Map<String, Value> {
    let mut out = data.clone();

    for (name, field) in schema {
        match field {
            FieldDefinition::Richtext(_) => {
                if let Some(Value::String(html)) = data.get(name) {
                    out.insert(name.clone(), Value::String(sanitize_html(html)));
                }
            }
            FieldDefinition::Slug(f) => {
                let supplied = data.get(name).and_then(slug_source);
                let derived = || {
                    f.from
                        .as_ref()
                        .and_then(|from| data.get(from))
                        .and_then(slug_source)
                };
                if let Some(text) = supplied.or_else(derived) {
                    out.insert(name.clone(), Value::String(slugify(&text, f.separator)));
                }
            }
            FieldDefinition::Repeater(f) => {
                if let Some(Value::Array(items)) = data.get(name) {
                    let processed = items
                        .iter()
                        .map(|item| match item {
                            Value::Object(map) => Value::Object(sanitize(map.clone(), &f.fields)),
                            other => other.clone(),
                        })
                        .collect();
                    out.insert(name.clone(), Value::Array(processed));
                }
            }
            FieldDefinition::Group(f) => {
                if let Some(Value::Object(map)) = data.get(name) {
                    out.insert(name.clone(), Value::Object(sanitize(map.clone(), &f.fields)));
                }
            }
            _ => {}
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema(value: Value) -> FieldsSchema {
        serde_json::from_value(value).unwrap()
    }

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_sanitize_html_strips_scripts_and_handlers() {
        let clean = sanitize_html(r#"<p onclick="steal()">Hi<script>alert(1)</script></p>"#);
        assert_eq!(clean, "<p>Hi</p>");
    }

    #[test]
    fn test_sanitize_html_keeps_allowed_markup() {
        let html = r#"<h2 class="lead">Title</h2><a href="https://example.com" rel="nofollow" target="_blank">x</a>"#;
        let clean = sanitize_html(html);
        assert!(clean.contains(r#"<h2 class="lead">"#));
        assert!(clean.contains(r#"href="https://example.com""#));
        assert!(clean.contains(r#"rel="nofollow""#));
    }

    #[test]
    fn test_sanitize_html_drops_unknown_tags_and_attributes() {
        let clean = sanitize_html(r#"<iframe src="x"></iframe><img src="a.png" data-x="1" width="3">"#);
        assert!(!clean.contains("iframe"));
        assert!(!clean.contains("data-x"));
        assert!(!clean.contains("width"));
        assert!(clean.contains(r#"src="a.png""#));
    }

    #[test]
    fn test_sanitize_html_is_idempotent() {
        let inputs = [
            r#"<p>Plain <strong>bold</strong> &amp; <em>em</em></p>"#,
            r#"<ul><li><a href="/x" title="t">one</a></li></ul><script>x()</script>"#,
            r#"<table><thead><tr><th>h</th></tr></thead><tbody><tr><td style="color:red">d</td></tr></tbody></table>"#,
        ];
        for input in inputs {
            let once = sanitize_html(input);
            assert_eq!(sanitize_html(&once), once);
        }
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello, World!", SlugSeparator::Dash), "hello-world");
        assert_eq!(slugify("Hello, World!", SlugSeparator::Underscore), "hello_world");
        assert_eq!(slugify("  Crème Brûlée  ", SlugSeparator::Dash), "creme-brulee");
    }

    #[test]
    fn test_slug_derived_from_source_field() {
        let schema = schema(json!({
            "title": { "type": "text" },
            "slug": { "type": "slug", "from": "title" }
        }));

        let out = sanitize(object(json!({ "title": "Hello, World!" })), &schema);
        assert_eq!(out["slug"], json!("hello-world"));

        let out = sanitize(object(json!({ "title": "Hello", "slug": "" })), &schema);
        assert_eq!(out["slug"], json!("hello"));
    }

    #[test]
    fn test_supplied_slug_is_normalized() {
        let schema = schema(json!({
            "title": { "type": "text" },
            "slug": { "type": "slug", "from": "title" }
        }));
        let out = sanitize(object(json!({ "title": "Ignored", "slug": "My Custom Slug" })), &schema);
        assert_eq!(out["slug"], json!("my-custom-slug"));
    }

    #[test]
    fn test_slug_without_source_keeps_value() {
        let schema = schema(json!({ "slug": { "type": "slug", "from": "title" } }));
        let out = sanitize(object(json!({ "slug": null })), &schema);
        assert_eq!(out["slug"], Value::Null);

        let out = sanitize(Map::new(), &schema);
        assert!(!out.contains_key("slug"));
    }

    #[test]
    fn test_nested_richtext_is_sanitized() {
        let schema = schema(json!({
            "blocks": {
                "type": "repeater",
                "fields": { "body": { "type": "richtext" } }
            },
            "hero": {
                "type": "group",
                "fields": { "intro": { "type": "richtext" } }
            }
        }));

        let out = sanitize(
            object(json!({
                "blocks": [{ "body": "<p>a<script>b</script></p>" }],
                "hero": { "intro": "<b onmouseover=\"x\">hi</b>" },
                "untouched": "<script>kept as data</script>"
            })),
            &schema,
        );

        assert_eq!(out["blocks"][0]["body"], json!("<p>a</p>"));
        assert_eq!(out["hero"]["intro"], json!("<b>hi</b>"));
        assert_eq!(out["untouched"], json!("<script>kept as data</script>"));
    }
}
