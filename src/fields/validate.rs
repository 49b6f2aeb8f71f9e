//! Schema-driven validation of content data.
//!
//! A [`Validator`] is compiled once per schema (regex patterns included) and
//! then checks JSON objects. Unknown keys at the top level pass through;
//! unknown keys inside `group` and `repeater` values are dropped.

use super::definition::{FieldDefinition, FieldsSchema, SelectOption};
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Violations keyed by dotted field path, e.g. `items.0.caption`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for a single violation.
    pub fn single(path: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(path, message);
        errors
    }

    pub fn add(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.0.entry(path.into()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Messages recorded for a path.
    pub fn field(&self, path: &str) -> Option<&[String]> {
        self.0.get(path).map(Vec::as_slice)
    }

    /// Merges errors under a path prefix, used for translations (`es.title`).
    pub fn extend_prefixed(&mut self, prefix: &str, other: ValidationErrors) {
        for (path, messages) in other.0 {
            let key = format!("{}.{}", prefix, path);
            self.0.entry(key).or_default().extend(messages);
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (path, messages) in &self.0 {
            for message in messages {
                if !first {
                    write!(f, "; ")?;
                }
                write!(f, "{}: {}", path, message)?;
                first = false;
            }
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

#[derive(Clone, Copy, Debug)]
enum TextFormat {
    Plain,
    Email,
    Url,
}

#[derive(Debug)]
enum Rule {
    Text {
        format: TextFormat,
        min_length: Option<usize>,
        max_length: Option<usize>,
        pattern: Option<Regex>,
    },
    Number {
        min: Option<f64>,
        max: Option<f64>,
    },
    Boolean,
    OneOf(Vec<Value>),
    ManyOf(Vec<Value>),
    NullableString,
    StringList {
        max_items: Option<usize>,
    },
    Temporal {
        min: Option<String>,
        max: Option<String>,
    },
    Object,
    Group(Validator),
    Repeater {
        item: Validator,
        min: Option<usize>,
        max: Option<usize>,
    },
}

#[derive(Debug)]
struct FieldRule {
    required: bool,
    rule: Rule,
}

/// Compiled checker for one [`FieldsSchema`].
#[derive(Debug, Default)]
pub struct Validator {
    rules: BTreeMap<String, FieldRule>,
}

/// Error raised when a schema cannot be compiled, e.g. a bad regex pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaError {
    pub path: String,
    pub message: String,
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "field `{}`: {}", self.path, self.message)
    }
}

impl std::error::Error for SchemaError {}

fn option_values(options: &[SelectOption]) -> Vec<Value> {
    options.iter().map(|o| o.value.clone()).collect()
}

fn text_rule(min_length: Option<usize>, max_length: Option<usize>) -> Rule {
    Rule::Text {
        format: TextFormat::Plain,
        min_length,
        max_length,
        pattern: None,
    }
}

/// Compiles a validator for `schema`.
pub fn build_validator(schema: &FieldsSchema) -> Result<Validator, SchemaError> {
    build_at(schema, "")
}

fn build_at(schema: &FieldsSchema, prefix: &str) -> Result<Validator, SchemaError> {
    let mut rules = BTreeMap::new();

    for (name, field) in schema {
        let path = join(prefix, name);
        let rule = match field {
            FieldDefinition::Text(f) => {
                let pattern = match &f.pattern {
                    Some(p) => Some(Regex::new(p).map_err(|e| SchemaError {
                        path: path.clone(),
                        message: format!("invalid pattern: {}", e),
                    })?),
                    None => None,
                };
                Rule::Text {
                    format: TextFormat::Plain,
                    min_length: f.min_length,
                    max_length: f.max_length,
                    pattern,
                }
            }
            FieldDefinition::Textarea(f) => text_rule(f.min_length, f.max_length),
            FieldDefinition::Password(f) => text_rule(f.min_length, None),
            FieldDefinition::Slug(f) => text_rule(f.min_length, f.max_length),
            FieldDefinition::Email(_) => Rule::Text {
                format: TextFormat::Email,
                min_length: None,
                max_length: None,
                pattern: None,
            },
            FieldDefinition::Url(_) => Rule::Text {
                format: TextFormat::Url,
                min_length: None,
                max_length: None,
                pattern: None,
            },
            FieldDefinition::Richtext(_)
            | FieldDefinition::Markdown(_)
            | FieldDefinition::Code(_)
            | FieldDefinition::Color(_)
            | FieldDefinition::Icon(_) => text_rule(None, None),
            FieldDefinition::Number(f) => Rule::Number {
                min: f.min,
                max: f.max,
            },
            FieldDefinition::Boolean(_) => Rule::Boolean,
            FieldDefinition::Select(f) if f.multiple => Rule::ManyOf(option_values(&f.options)),
            FieldDefinition::Select(f) => Rule::OneOf(option_values(&f.options)),
            FieldDefinition::Radio(f) => Rule::OneOf(option_values(&f.options)),
            FieldDefinition::Checkbox(f) => Rule::ManyOf(option_values(&f.options)),
            FieldDefinition::Image(_) | FieldDefinition::File(_) => Rule::NullableString,
            FieldDefinition::Gallery(f) => Rule::StringList {
                max_items: f.max_items,
            },
            FieldDefinition::Date(f) | FieldDefinition::Datetime(f) | FieldDefinition::Time(f) => {
                Rule::Temporal {
                    min: f.min.clone(),
                    max: f.max.clone(),
                }
            }
            FieldDefinition::Relation(f) if f.relationship.is_many() => {
                Rule::StringList { max_items: None }
            }
            FieldDefinition::Relation(_) => Rule::NullableString,
            FieldDefinition::Json(_) => Rule::Object,
            FieldDefinition::Group(f) => Rule::Group(build_at(&f.fields, &path)?),
            FieldDefinition::Repeater(f) => Rule::Repeater {
                item: build_at(&f.fields, &path)?,
                min: f.min,
                max: f.max,
            },
        };

        rules.insert(
            name.clone(),
            FieldRule {
                required: field.is_required(),
                rule,
            },
        );
    }

    Ok(Validator { rules })
}

fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_owned()
    } else {
        format!("{}.{}", prefix, name)
    }
}

fn type_label(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl Validator {
    /// Checks a full document. Required fields must be present.
    pub fn validate(&self, data: Map<String, Value>) -> Result<Map<String, Value>, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let out = self.check_object(data, "", true, false, &mut errors);
        if errors.is_empty() {
            Ok(out)
        } else {
            Err(errors)
        }
    }

    /// Checks a partial document such as a locale translation, where only the
    /// translated fields are present. Types are checked, presence is not.
    pub fn validate_partial(
        &self,
        data: Map<String, Value>,
    ) -> Result<Map<String, Value>, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let out = self.check_object(data, "", true, true, &mut errors);
        if errors.is_empty() {
            Ok(out)
        } else {
            Err(errors)
        }
    }

    fn check_object(
        &self,
        mut data: Map<String, Value>,
        prefix: &str,
        passthrough: bool,
        partial: bool,
        errors: &mut ValidationErrors,
    ) -> Map<String, Value> {
        let mut out = Map::new();

        for (name, field) in &self.rules {
            let path = join(prefix, name);
            match data.remove(name) {
                None => {
                    if field.required && !partial {
                        errors.add(path, "Required");
                    }
                }
                Some(Value::Null) => {
                    let nullable = matches!(field.rule, Rule::NullableString);
                    if field.required && !partial && !nullable {
                        errors.add(path, "Required");
                    } else {
                        out.insert(name.clone(), Value::Null);
                    }
                }
                Some(value) => {
                    let value = field.rule.check(value, &path, partial, errors);
                    out.insert(name.clone(), value);
                }
            }
        }

        if passthrough {
            out.extend(data);
        }
        out
    }
}

impl Rule {
    fn check(&self, value: Value, path: &str, partial: bool, errors: &mut ValidationErrors) -> Value {
        match self {
            Rule::Text {
                format,
                min_length,
                max_length,
                pattern,
            } => {
                let s = match value.as_str() {
                    Some(s) => s,
                    None => {
                        errors.add(path, format!("Expected string, received {}", type_label(&value)));
                        return value;
                    }
                };
                let length = s.chars().count();
                if let Some(min) = min_length.filter(|m| *m > 0) {
                    if length < min {
                        errors.add(path, format!("Must be at least {} characters", min));
                    }
                }
                if let Some(max) = max_length.filter(|m| *m > 0) {
                    if length > max {
                        errors.add(path, format!("Must be at most {} characters", max));
                    }
                }
                match format {
                    TextFormat::Email if !validator::validate_email(s) => {
                        errors.add(path, "Invalid email")
                    }
                    TextFormat::Url if !validator::validate_url(s) => errors.add(path, "Invalid url"),
                    _ => {}
                }
                if let Some(re) = pattern {
                    if !re.is_match(s) {
                        errors.add(path, "Does not match the required pattern");
                    }
                }
            }
            Rule::Number { min, max } => match value.as_f64() {
                Some(n) => {
                    if let Some(min) = min {
                        if n < *min {
                            errors.add(path, format!("Must be greater than or equal to {}", min));
                        }
                    }
                    if let Some(max) = max {
                        if n > *max {
                            errors.add(path, format!("Must be less than or equal to {}", max));
                        }
                    }
                }
                None => errors.add(path, format!("Expected number, received {}", type_label(&value))),
            },
            Rule::Boolean => {
                if !value.is_boolean() {
                    errors.add(path, format!("Expected boolean, received {}", type_label(&value)));
                }
            }
            Rule::OneOf(options) => {
                if !options.contains(&value) {
                    errors.add(path, "Invalid option");
                }
            }
            Rule::ManyOf(options) => match value.as_array() {
                Some(items) => {
                    for (i, item) in items.iter().enumerate() {
                        if !options.contains(item) {
                            errors.add(format!("{}.{}", path, i), "Invalid option");
                        }
                    }
                }
                None => errors.add(path, format!("Expected array, received {}", type_label(&value))),
            },
            Rule::NullableString => {
                if !value.is_string() {
                    errors.add(path, format!("Expected string, received {}", type_label(&value)));
                }
            }
            Rule::StringList { max_items } => match value.as_array() {
                Some(items) => {
                    for (i, item) in items.iter().enumerate() {
                        if !item.is_string() {
                            errors.add(format!("{}.{}", path, i), "Expected string");
                        }
                    }
                    if let Some(max) = max_items {
                        if items.len() > *max {
                            errors.add(path, format!("Must contain at most {} items", max));
                        }
                    }
                }
                None => errors.add(path, format!("Expected array, received {}", type_label(&value))),
            },
            Rule::Temporal { min, max } => match value.as_str() {
                Some(s) => {
                    if let Some(min) = min {
                        if s < min.as_str() {
                            errors.add(path, format!("Must not be before {}", min));
                        }
                    }
                    if let Some(max) = max {
                        if s > max.as_str() {
                            errors.add(path, format!("Must not be after {}", max));
                        }
                    }
                }
                None => errors.add(path, format!("Expected string, received {}", type_label(&value))),
            },
            Rule::Object => {
                if !value.is_object() {
                    errors.add(path, format!("Expected object, received {}", type_label(&value)));
                }
            }
            Rule::Group(nested) => {
                return match value {
                    Value::Object(map) => {
                        Value::Object(nested.check_object(map, path, false, partial, errors))
                    }
                    other => {
                        errors.add(path, format!("Expected object, received {}", type_label(&other)));
                        other
                    }
                };
            }
            Rule::Repeater { item, min, max } => {
                return match value {
                    Value::Array(items) => {
                        if let Some(min) = min.filter(|m| *m > 0) {
                            if items.len() < min {
                                errors.add(path, format!("Must contain at least {} items", min));
                            }
                        }
                        if let Some(max) = max.filter(|m| *m > 0) {
                            if items.len() > max {
                                errors.add(path, format!("Must contain at most {} items", max));
                            }
                        }
                        let checked = items
                            .into_iter()
                            .enumerate()
                            .map(|(i, entry)| {
                                let entry_path = format!("{}.{}", path, i);
                                match entry {
                                    Value::Object(map) => Value::Object(item.check_object(
                                        map,
                                        &entry_path,
                                        false,
                                        partial,
                                        errors,
                                    )),
                                    other => {
                                        errors.add(
                                            entry_path,
                                            format!("Expected object, received {}", type_label(&other)),
                                        );
                                        other
                                    }
                                }
                            })
                            .collect();
                        Value::Array(checked)
                    }
                    other => {
                        errors.add(path, format!("Expected array, received {}", type_label(&other)));
                        other
                    }
                };
            }
        }
        value
    }
}
