// 📐 Shape Layer - Form Schema Validation
// Validates posted form data against a schema picked by operation context

use crate::error::{AdminError, Result};
use serde::Serialize;
use std::collections::HashMap;

/// Context name of the comment edit form
pub const COMMENT_FORM: &str = "comment";

// ============================================================================
// VALIDATION RESULT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
    pub context: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.context, self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

pub type ValidationResult = std::result::Result<ValidData, Vec<ValidationError>>;

// ============================================================================
// FIELD RULES
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// Trimmed text, at most `max_length` characters
    Text { max_length: usize },
    /// Integer not smaller than `min`
    Integer { min: i64 },
    /// "0" or "1"
    Flag,
}

#[derive(Debug, Clone)]
pub struct FieldRule {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    /// Used when the field is optional and absent
    pub default: Option<&'static str>,
}

impl FieldRule {
    pub fn required(name: &'static str, kind: FieldKind) -> Self {
        FieldRule {
            name,
            kind,
            required: true,
            default: None,
        }
    }

    pub fn optional(name: &'static str, kind: FieldKind, default: Option<&'static str>) -> Self {
        FieldRule {
            name,
            kind,
            required: false,
            default,
        }
    }
}

/// A validated, filtered field value
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Flag(bool),
}

/// Form data that passed validation. Unknown posted keys are dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidData {
    values: HashMap<&'static str, FieldValue>,
}

impl ValidData {
    pub fn text(&self, field: &str) -> Option<&str> {
        match self.values.get(field) {
            Some(FieldValue::Text(value)) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn integer(&self, field: &str) -> Option<i64> {
        match self.values.get(field) {
            Some(FieldValue::Integer(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn flag(&self, field: &str) -> Option<bool> {
        match self.values.get(field) {
            Some(FieldValue::Flag(value)) => Some(*value),
            _ => None,
        }
    }
}

// ============================================================================
// FORM SCHEMA
// ============================================================================

#[derive(Debug, Clone)]
pub struct FormSchema {
    pub context: String,
    pub fields: Vec<FieldRule>,
}

impl FormSchema {
    pub fn new(context: &str, fields: Vec<FieldRule>) -> Self {
        FormSchema {
            context: context.to_string(),
            fields,
        }
    }

    /// Schema of the comment edit form
    pub fn comment(max_length: usize) -> Self {
        FormSchema::new(
            COMMENT_FORM,
            vec![
                FieldRule::optional("id", FieldKind::Integer { min: 0 }, None),
                FieldRule::required("comment", FieldKind::Text { max_length }),
                FieldRule::required("project_id", FieldKind::Integer { min: 1 }),
                FieldRule::required("user_id", FieldKind::Integer { min: 1 }),
                FieldRule::optional("published", FieldKind::Flag, Some("1")),
            ],
        )
    }

    /// Validate posted data, collecting every field error
    pub fn validate(&self, data: &HashMap<String, String>) -> ValidationResult {
        let mut errors = Vec::new();
        let mut valid = ValidData::default();

        for rule in &self.fields {
            let raw = data
                .get(rule.name)
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .or(rule.default);

            let Some(raw) = raw else {
                if rule.required {
                    errors.push(self.error(rule.name, "Required field is empty"));
                }
                continue;
            };

            match self.filter(rule, raw) {
                Ok(value) => {
                    valid.values.insert(rule.name, value);
                }
                Err(message) => errors.push(self.error(rule.name, &message)),
            }
        }

        if errors.is_empty() {
            Ok(valid)
        } else {
            Err(errors)
        }
    }

    fn filter(&self, rule: &FieldRule, raw: &str) -> std::result::Result<FieldValue, String> {
        match &rule.kind {
            FieldKind::Text { max_length } => {
                let length = raw.chars().count();
                if length > *max_length {
                    return Err(format!(
                        "Must be at most {} characters, got {}",
                        max_length, length
                    ));
                }
                Ok(FieldValue::Text(raw.to_string()))
            }
            FieldKind::Integer { min } => {
                let value: i64 = raw
                    .parse()
                    .map_err(|_| format!("Must be a whole number, got '{}'", raw))?;
                if value < *min {
                    return Err(format!("Must be at least {}, got {}", min, value));
                }
                Ok(FieldValue::Integer(value))
            }
            FieldKind::Flag => match raw {
                "0" => Ok(FieldValue::Flag(false)),
                "1" => Ok(FieldValue::Flag(true)),
                other => Err(format!("Must be 0 or 1, got '{}'", other)),
            },
        }
    }

    fn error(&self, field: &str, message: &str) -> ValidationError {
        ValidationError {
            field: field.to_string(),
            message: message.to_string(),
            context: self.context.clone(),
        }
    }
}

// ============================================================================
// FORM REGISTRY
// ============================================================================

/// Validation schemas keyed by operation context
#[derive(Debug, Clone, Default)]
pub struct FormRegistry {
    schemas: HashMap<String, FormSchema>,
}

impl FormRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every form the admin handlers use
    pub fn with_defaults(comment_max_length: usize) -> Self {
        let mut registry = Self::new();
        registry.register(FormSchema::comment(comment_max_length));
        registry
    }

    pub fn register(&mut self, schema: FormSchema) {
        self.schemas.insert(schema.context.clone(), schema);
    }

    /// Load the schema for `context`; a missing schema is fatal
    pub fn load(&self, context: &str) -> Result<&FormSchema> {
        self.schemas
            .get(context)
            .ok_or_else(|| AdminError::FormLoad(format!("no form registered for '{}'", context)))
    }
}
