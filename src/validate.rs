//! Closed-shape response validation and wire-to-domain renaming.
//!
//! A [`TypeRule`] lists the fields of one domain type. Each [`FieldRule`]
//! gives the domain name, the wire name (when it differs), whether the field
//! is required or nullable, and its [`Kind`]. [`validate`] walks a parsed
//! JSON payload against a rule in a single recursive pass and either returns
//! the payload re-keyed with domain names, or every violation it found, each
//! with a dotted path such as `entries.0.subentries.1.label`.
//!
//! Rules are closed: a wire field no rule names is an error, never silently
//! dropped.
//!
//! Typed access goes through the [`Schema`] trait and three entry points that
//! accept exactly the same inputs:
//!
//! - [`check`] returns a [`ValidationOutcome`],
//! - [`parse`] returns `Result<_, Error>`,
//! - [`is_valid`] returns `bool`.

use crate::Error;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::fmt;

/// Constraints on the contents of a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringFormat {
    /// A hyphenated UUID.
    Uuid,
    /// An RFC 3339 timestamp.
    DateTime,
}

/// The shape a field value must have.
#[derive(Debug, Clone, PartialEq)]
pub enum Kind {
    /// Any JSON value, passed through untouched.
    Any,
    /// A whole number.
    Integer,
    /// Any number.
    Number,
    /// Any string.
    String,
    /// `true` or `false`.
    Boolean,
    /// One of a closed set of string literals.
    Enum(&'static [&'static str]),
    /// A string in a given format.
    Format(StringFormat),
    /// A nested object.
    Object(TypeRule),
    /// An array whose elements all have the given kind.
    Array(Box<Kind>),
    /// An object whose `tag` field selects which rule applies to the rest.
    Union {
        /// The discriminator field, same name on the wire and in the domain.
        tag: &'static str,
        /// Tag value and rule for each variant. The rules do not list the tag.
        variants: Vec<(&'static str, TypeRule)>,
    },
}

impl Kind {
    /// Shorthand for `Kind::Array(Box::new(kind))`.
    pub fn array(kind: Kind) -> Self {
        Kind::Array(Box::new(kind))
    }

    fn describe(&self) -> &'static str {
        match self {
            Kind::Any => "any",
            Kind::Integer => "integer",
            Kind::Number => "number",
            Kind::String | Kind::Enum(_) | Kind::Format(_) => "string",
            Kind::Boolean => "boolean",
            Kind::Object(_) | Kind::Union { .. } => "object",
            Kind::Array(_) => "array",
        }
    }
}

/// The rule for a single field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRule {
    /// The field name in the domain shape.
    pub name: &'static str,
    /// The field name in the wire shape.
    pub wire_name: &'static str,
    /// The field's kind.
    pub kind: Kind,
    /// Whether the field must be present.
    pub required: bool,
    /// Whether `null` is accepted.
    pub nullable: bool,
}

impl FieldRule {
    /// A field that must be present.
    pub fn required(name: &'static str, kind: Kind) -> Self {
        Self {
            name,
            wire_name: name,
            kind,
            required: true,
            nullable: false,
        }
    }

    /// A field that may be absent.
    pub fn optional(name: &'static str, kind: Kind) -> Self {
        Self {
            required: false,
            ..Self::required(name, kind)
        }
    }

    /// Sets the wire name when it differs from the domain name.
    pub fn wire(mut self, wire_name: &'static str) -> Self {
        self.wire_name = wire_name;
        self
    }

    /// Accepts `null` as a value.
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }
}

/// The closed field set of one domain type.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeRule {
    name: &'static str,
    fields: Vec<FieldRule>,
}

impl TypeRule {
    /// Creates a rule from its fields, in declaration order.
    pub fn new(name: &'static str, fields: Vec<FieldRule>) -> Self {
        Self { name, fields }
    }

    /// The domain type name, used in logs.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The field rules in declaration order.
    pub fn fields(&self) -> &[FieldRule] {
        &self.fields
    }

    /// The domain field names in declaration order.
    pub fn domain_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|f| f.name)
    }

    fn declares_wire(&self, key: &str) -> bool {
        self.fields.iter().any(|f| f.wire_name == key)
    }

    /// Renames a domain-shaped value back to the wire shape.
    ///
    /// Keys not named by the rule are dropped. Values of the wrong kind are
    /// copied as they are; run [`validate`] on the result if that matters.
    pub fn to_wire(&self, domain: &Value) -> Value {
        let Some(object) = domain.as_object() else {
            return domain.clone();
        };

        let mut out = Map::new();
        for field in &self.fields {
            if let Some(value) = object.get(field.name) {
                out.insert(field.wire_name.to_string(), kind_to_wire(value, &field.kind));
            }
        }
        Value::Object(out)
    }
}

fn kind_to_wire(value: &Value, kind: &Kind) -> Value {
    match (kind, value) {
        (Kind::Object(rule), Value::Object(_)) => rule.to_wire(value),
        (Kind::Array(inner), Value::Array(items)) => {
            Value::Array(items.iter().map(|item| kind_to_wire(item, inner)).collect())
        }
        (Kind::Union { tag, variants }, Value::Object(object)) => {
            let tag_value = object.get(*tag).and_then(Value::as_str);
            match variants.iter().find(|(name, _)| Some(*name) == tag_value) {
                Some((name, rule)) => {
                    let mut wire = rule.to_wire(value);
                    if let Some(map) = wire.as_object_mut() {
                        map.insert(tag.to_string(), Value::String(name.to_string()));
                    }
                    wire
                }
                None => value.clone(),
            }
        }
        _ => value.clone(),
    }
}

/// One violated rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Dotted path to the field, using wire names and array indices.
    pub path: String,
    /// What was wrong.
    pub message: String,
}

impl FieldError {
    /// Creates a field error.
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

/// Every rule a payload violated, plus the payload itself.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("Validation failed: {}", join_errors(.errors))]
pub struct ValidationError {
    errors: Vec<FieldError>,
    data: Value,
}

fn join_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationError {
    /// Creates a validation error.
    pub fn new(errors: Vec<FieldError>, data: Value) -> Self {
        Self { errors, data }
    }

    /// The violations, in the order they were found.
    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// The payload that failed validation.
    pub fn data(&self) -> &Value {
        &self.data
    }
}

/// The result of validating a payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationOutcome<T> {
    /// All rules held; the value is in domain shape.
    Valid(T),
    /// At least one rule was violated.
    Invalid(ValidationError),
}

impl<T> ValidationOutcome<T> {
    /// Returns `true` for [`ValidationOutcome::Valid`].
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationOutcome::Valid(_))
    }

    /// Converts into a `Result`.
    pub fn into_result(self) -> Result<T, ValidationError> {
        match self {
            ValidationOutcome::Valid(value) => Ok(value),
            ValidationOutcome::Invalid(err) => Err(err),
        }
    }

    /// Maps the valid value.
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> ValidationOutcome<U> {
        match self {
            ValidationOutcome::Valid(value) => ValidationOutcome::Valid(f(value)),
            ValidationOutcome::Invalid(err) => ValidationOutcome::Invalid(err),
        }
    }
}

/// Validates `value` against `rule` and renames it to the domain shape.
///
/// All violations are collected; a bad field does not stop its siblings from
/// being checked.
///
/// # Examples
///
/// ```
/// use apiwire::validate::{validate, FieldRule, Kind, TypeRule};
/// use serde_json::json;
///
/// let rule = TypeRule::new("Upload", vec![
///     FieldRule::required("fileId", Kind::String).wire("file_id"),
///     FieldRule::required("url", Kind::String),
/// ]);
///
/// let domain = validate(&json!({"file_id": "f1", "url": "http://x"}), &rule).unwrap();
/// assert_eq!(domain, json!({"fileId": "f1", "url": "http://x"}));
///
/// let errors = validate(&json!({"file_id": 1}), &rule).unwrap_err();
/// assert_eq!(errors[0].path, "file_id");
/// assert_eq!(errors[1].path, "url");
/// ```
pub fn validate(value: &Value, rule: &TypeRule) -> Result<Value, Vec<FieldError>> {
    let mut errors = Vec::new();
    let out = check_object(value, rule, "", None, &mut errors);
    if errors.is_empty() {
        Ok(out)
    } else {
        Err(errors)
    }
}

/// Untyped variant of [`check`]: validates and keeps the domain-shaped JSON.
pub fn validate_value(value: &Value, rule: &TypeRule) -> ValidationOutcome<Value> {
    match validate(value, rule) {
        Ok(domain) => ValidationOutcome::Valid(domain),
        Err(errors) => ValidationOutcome::Invalid(ValidationError::new(errors, value.clone())),
    }
}

fn join_path(parent: &str, child: &str) -> String {
    if parent.is_empty() {
        child.to_string()
    } else {
        format!("{}.{}", parent, child)
    }
}

fn received(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn type_mismatch(expected: &str, value: &Value) -> String {
    format!("Expected {}, received {}", expected, received(value))
}

fn check_object(
    value: &Value,
    rule: &TypeRule,
    path: &str,
    tag: Option<&str>,
    errors: &mut Vec<FieldError>,
) -> Value {
    let Some(object) = value.as_object() else {
        errors.push(FieldError::new(path, type_mismatch("object", value)));
        return Value::Null;
    };

    let mut out = Map::new();

    for field in &rule.fields {
        let field_path = join_path(path, field.wire_name);
        match object.get(field.wire_name) {
            None => {
                if field.required {
                    errors.push(FieldError::new(field_path, "Required"));
                }
            }
            Some(Value::Null) if field.nullable => {
                out.insert(field.name.to_string(), Value::Null);
            }
            Some(v) => {
                if let Some(converted) = check_kind(v, &field.kind, &field_path, errors) {
                    out.insert(field.name.to_string(), converted);
                }
            }
        }
    }

    for key in object.keys() {
        if Some(key.as_str()) != tag && !rule.declares_wire(key) {
            errors.push(FieldError::new(join_path(path, key), "Unrecognized key"));
        }
    }

    Value::Object(out)
}

fn check_kind(
    value: &Value,
    kind: &Kind,
    path: &str,
    errors: &mut Vec<FieldError>,
) -> Option<Value> {
    let mismatch = |errors: &mut Vec<FieldError>| {
        errors.push(FieldError::new(path, type_mismatch(kind.describe(), value)));
        None
    };

    match kind {
        Kind::Any => Some(value.clone()),
        Kind::Integer => match value {
            Value::Number(n) if n.is_i64() || n.is_u64() => Some(value.clone()),
            Value::Number(n) => match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 => {
                    Some(Value::from(f as i64))
                }
                Some(f) if f.fract() == 0.0 => {
                    errors.push(FieldError::new(path, "Integer out of range"));
                    None
                }
                _ => {
                    errors.push(FieldError::new(path, "Expected integer, received float"));
                    None
                }
            },
            _ => mismatch(errors),
        },
        Kind::Number => match value {
            Value::Number(_) => Some(value.clone()),
            _ => mismatch(errors),
        },
        Kind::String => match value {
            Value::String(_) => Some(value.clone()),
            _ => mismatch(errors),
        },
        Kind::Boolean => match value {
            Value::Bool(_) => Some(value.clone()),
            _ => mismatch(errors),
        },
        Kind::Enum(allowed) => match value {
            Value::String(s) if allowed.iter().any(|a| *a == s.as_str()) => Some(value.clone()),
            Value::String(s) => {
                errors.push(FieldError::new(
                    path,
                    format!(
                        "Invalid enum value. Expected {}, received '{}'",
                        quote_all(allowed),
                        s
                    ),
                ));
                None
            }
            _ => mismatch(errors),
        },
        Kind::Format(format) => match value {
            Value::String(s) if format_matches(*format, s) => Some(value.clone()),
            Value::String(_) => {
                let message = match format {
                    StringFormat::Uuid => "Invalid uuid",
                    StringFormat::DateTime => "Invalid datetime",
                };
                errors.push(FieldError::new(path, message));
                None
            }
            _ => mismatch(errors),
        },
        Kind::Object(rule) => {
            let before = errors.len();
            let out = check_object(value, rule, path, None, errors);
            (errors.len() == before).then_some(out)
        }
        Kind::Array(inner) => {
            let Value::Array(items) = value else {
                return mismatch(errors);
            };
            let before = errors.len();
            let out: Vec<Value> = items
                .iter()
                .enumerate()
                .filter_map(|(i, item)| check_kind(item, inner, &join_path(path, &i.to_string()), errors))
                .collect();
            (errors.len() == before).then_some(Value::Array(out))
        }
        Kind::Union { tag, variants } => {
            let Value::Object(object) = value else {
                return mismatch(errors);
            };
            let tag_value = object.get(*tag).and_then(Value::as_str);
            let Some((name, rule)) = variants.iter().find(|(name, _)| Some(*name) == tag_value) else {
                let names: Vec<&str> = variants.iter().map(|(name, _)| *name).collect();
                errors.push(FieldError::new(
                    join_path(path, tag),
                    format!("Invalid discriminator value. Expected {}", quote_all(&names)),
                ));
                return None;
            };

            let before = errors.len();
            let mut out = check_object(value, rule, path, Some(*tag), errors);
            if errors.len() != before {
                return None;
            }
            if let Some(map) = out.as_object_mut() {
                map.insert(tag.to_string(), Value::String(name.to_string()));
            }
            Some(out)
        }
    }
}

fn quote_all(values: &[&str]) -> String {
    values
        .iter()
        .map(|v| format!("'{}'", v))
        .collect::<Vec<_>>()
        .join(" | ")
}

fn format_matches(format: StringFormat, s: &str) -> bool {
    match format {
        StringFormat::Uuid => s.len() == 36 && uuid::Uuid::parse_str(s).is_ok(),
        StringFormat::DateTime => chrono::DateTime::parse_from_rfc3339(s).is_ok(),
    }
}

/// A domain type with a validation rule.
///
/// Implementors are usually zero-sized markers next to the domain type they
/// describe; `Output` is the domain type, deserialized from the renamed value.
pub trait Schema {
    /// The domain type produced on success.
    type Output: DeserializeOwned;

    /// The rule for the wire payload.
    fn rule() -> &'static TypeRule;
}

/// Validates `value` as `S`, returning the outcome as a value.
pub fn check<S: Schema>(value: &Value) -> ValidationOutcome<S::Output> {
    let rule = S::rule();
    match validate(value, rule) {
        Ok(domain) => match serde_json::from_value::<S::Output>(domain) {
            Ok(typed) => ValidationOutcome::Valid(typed),
            Err(e) => {
                tracing::error!(
                    schema = rule.name(),
                    error = %e,
                    "Validated payload does not fit its domain type"
                );
                ValidationOutcome::Invalid(ValidationError::new(
                    vec![FieldError::new("", e.to_string())],
                    value.clone(),
                ))
            }
        },
        Err(errors) => ValidationOutcome::Invalid(ValidationError::new(errors, value.clone())),
    }
}

/// Validates `value` as `S`, turning a failure into [`Error::Validation`].
///
/// # Errors
///
/// Returns [`Error::Validation`] listing every violation.
pub fn parse<S: Schema>(value: &Value) -> Result<S::Output, Error> {
    check::<S>(value).into_result().map_err(Error::Validation)
}

/// Returns `true` if `value` is a valid `S`.
pub fn is_valid<S: Schema>(value: &Value) -> bool {
    check::<S>(value).is_valid()
}
