//! Request body encoding for JSON and multipart payloads.
//!
//! JSON payloads are serialized verbatim. Multipart payloads are described as
//! an ordered list of fields whose leaf kind ([`FormValue`]) is decided by the
//! request type when it builds its [`FormFields`], then flattened into a
//! [`MultipartPayload`] by [`encode`]:
//!
//! - binary values become file parts,
//! - arrays become repeated parts under the same name,
//! - objects and nested arrays become a single `application/json` part,
//! - scalars become text parts,
//! - absent fields are skipped.
//!
//! A caller that already has a [`MultipartPayload`] can pass it through
//! [`RequestBody::Multipart`] and skip the flattening.

use crate::{Error, Result};
use bytes::Bytes;
use serde::Serialize;
use serde_json::Value;
use std::fmt::Display;

const JSON_MIME: &str = "application/json";

/// Binary content for a file part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    /// The file contents.
    pub data: Bytes,
    /// The file name reported to the server.
    pub file_name: Option<String>,
    /// The MIME type of the part.
    pub content_type: Option<String>,
}

impl FilePart {
    /// Creates a file part with no name or content type.
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            file_name: None,
            content_type: None,
        }
    }

    /// Sets the file name.
    pub fn file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }

    /// Sets the MIME type.
    pub fn content_type(mut self, mime: impl Into<String>) -> Self {
        self.content_type = Some(mime.into());
        self
    }
}

/// The encodable kinds of a multipart field.
#[derive(Debug, Clone, PartialEq)]
pub enum FormValue {
    /// Sent as a text part.
    Scalar(String),
    /// Sent as a file part.
    Binary(FilePart),
    /// Sent as one `application/json` part.
    Object(Value),
    /// Expanded into one part per element.
    Array(Vec<FormValue>),
}

impl FormValue {
    /// Creates a scalar value from anything displayable.
    pub fn scalar(value: impl Display) -> Self {
        FormValue::Scalar(value.to_string())
    }

    /// Maps a JSON value onto a form value. `null` maps to `None`.
    pub fn from_json(value: Value) -> Option<Self> {
        match value {
            Value::Null => None,
            Value::String(s) => Some(FormValue::Scalar(s)),
            Value::Bool(b) => Some(FormValue::Scalar(b.to_string())),
            Value::Number(n) => Some(FormValue::Scalar(n.to_string())),
            Value::Array(items) => Some(FormValue::Array(
                items.into_iter().filter_map(FormValue::from_json).collect(),
            )),
            object @ Value::Object(_) => Some(FormValue::Object(object)),
        }
    }
}

/// Ordered multipart fields, before flattening.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormFields {
    fields: Vec<(String, Option<FormValue>)>,
}

impl FormFields {
    /// Creates an empty field list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field. `None` is kept in order but skipped on encoding.
    pub fn field(mut self, name: impl Into<String>, value: Option<FormValue>) -> Self {
        self.fields.push((name.into(), value));
        self
    }

    /// Adds a scalar field.
    pub fn text(self, name: impl Into<String>, value: Option<impl Display>) -> Self {
        self.field(name, value.map(FormValue::scalar))
    }

    /// Adds a binary field.
    pub fn file(self, name: impl Into<String>, file: FilePart) -> Self {
        self.field(name, Some(FormValue::Binary(file)))
    }

    /// Adds a field from any serializable value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SerializationFailed`] if `value` cannot be serialized.
    pub fn json<T: Serialize>(self, name: impl Into<String>, value: Option<&T>) -> Result<Self> {
        let value = match value {
            Some(v) => serde_json::to_value(v)
                .map_err(|e| Error::SerializationFailed(e.to_string()))?,
            None => Value::Null,
        };
        Ok(self.field(name, FormValue::from_json(value)))
    }

    /// Iterates over the fields in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&FormValue>)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_ref()))
    }
}

/// Request types that are sent as multipart forms.
pub trait ToForm {
    /// Describes the request as ordered form fields.
    fn to_form(&self) -> Result<FormFields>;
}

/// The content of a single multipart part.
#[derive(Debug, Clone, PartialEq)]
pub enum PartContent {
    /// A plain text part.
    Text(String),
    /// A serialized JSON document sent with `application/json`.
    Json(String),
    /// A file part.
    Binary(FilePart),
}

/// A named multipart part.
#[derive(Debug, Clone, PartialEq)]
pub struct Part {
    /// The form field name.
    pub name: String,
    /// The part content.
    pub content: PartContent,
}

/// A fully flattened multipart body.
///
/// Cheap to clone (binary data is reference counted), so each retry attempt
/// can build its own `reqwest` form from it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultipartPayload {
    parts: Vec<Part>,
}

impl MultipartPayload {
    /// Creates an empty payload.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a text part.
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(name, PartContent::Text(value.into()));
        self
    }

    /// Appends a file part.
    pub fn file(mut self, name: impl Into<String>, file: FilePart) -> Self {
        self.push(name, PartContent::Binary(file));
        self
    }

    /// Appends a part.
    pub fn push(&mut self, name: impl Into<String>, content: PartContent) {
        self.parts.push(Part {
            name: name.into(),
            content,
        });
    }

    /// The parts in order.
    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// Builds a `reqwest` form. Forms are consumed on send, so this is called
    /// once per attempt.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigurationError`] if a part carries an invalid MIME type.
    pub fn to_form(&self) -> Result<reqwest::multipart::Form> {
        use reqwest::multipart::{Form, Part as FormPart};

        let mut form = Form::new();
        for part in &self.parts {
            let built = match &part.content {
                PartContent::Text(text) => FormPart::text(text.clone()),
                PartContent::Json(doc) => FormPart::text(doc.clone())
                    .mime_str(JSON_MIME)
                    .map_err(|e| Error::ConfigurationError(format!("Invalid mime: {}", e)))?,
                PartContent::Binary(file) => {
                    let mut built = FormPart::bytes(file.data.to_vec());
                    if let Some(name) = &file.file_name {
                        built = built.file_name(name.clone());
                    }
                    if let Some(mime) = &file.content_type {
                        built = built.mime_str(mime).map_err(|e| {
                            Error::ConfigurationError(format!("Invalid mime: {}", e))
                        })?;
                    }
                    built
                }
            };
            form = form.part(part.name.clone(), built);
        }
        Ok(form)
    }
}

/// A logical request payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestBody {
    /// No body.
    #[default]
    Empty,
    /// Serialized as JSON text.
    Json(Value),
    /// Flattened into a multipart form.
    Form(FormFields),
    /// An already-built multipart form, sent as is.
    Multipart(MultipartPayload),
}

impl RequestBody {
    /// Serializes a JSON payload. `None` yields [`RequestBody::Empty`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::SerializationFailed`] if `payload` cannot be serialized.
    pub fn json<T: Serialize>(payload: Option<&T>) -> Result<Self> {
        match payload {
            Some(payload) => serde_json::to_value(payload)
                .map(RequestBody::Json)
                .map_err(|e| Error::SerializationFailed(e.to_string())),
            None => Ok(RequestBody::Empty),
        }
    }

    /// Describes a multipart payload through its [`ToForm`] impl.
    pub fn form<T: ToForm>(payload: &T) -> Result<Self> {
        payload.to_form().map(RequestBody::Form)
    }
}

/// A body ready to be attached to an attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum EncodedBody {
    /// No body.
    Empty,
    /// JSON text.
    Json(Bytes),
    /// Multipart parts.
    Multipart(MultipartPayload),
}

/// Encodes a logical payload into a transmittable body.
///
/// # Errors
///
/// Returns [`Error::SerializationFailed`] if a JSON document cannot be written.
pub fn encode(body: RequestBody) -> Result<EncodedBody> {
    match body {
        RequestBody::Empty => Ok(EncodedBody::Empty),
        RequestBody::Json(value) => serde_json::to_vec(&value)
            .map(|bytes| EncodedBody::Json(Bytes::from(bytes)))
            .map_err(|e| Error::SerializationFailed(e.to_string())),
        RequestBody::Form(fields) => encode_form(fields).map(EncodedBody::Multipart),
        RequestBody::Multipart(payload) => Ok(EncodedBody::Multipart(payload)),
    }
}

fn encode_form(fields: FormFields) -> Result<MultipartPayload> {
    let mut payload = MultipartPayload::new();

    for (name, value) in fields.fields {
        let Some(value) = value else {
            continue;
        };

        match value {
            FormValue::Array(items) => {
                for item in items {
                    let content = match item {
                        FormValue::Binary(file) => PartContent::Binary(file),
                        FormValue::Scalar(text) => PartContent::Text(text),
                        FormValue::Object(object) => PartContent::Json(to_json(&object)?),
                        nested @ FormValue::Array(_) => {
                            PartContent::Json(to_json(&nested_to_json(nested)?)?)
                        }
                    };
                    payload.push(name.clone(), content);
                }
            }
            FormValue::Binary(file) => payload.push(name, PartContent::Binary(file)),
            FormValue::Object(object) => payload.push(name, PartContent::Json(to_json(&object)?)),
            FormValue::Scalar(text) => payload.push(name, PartContent::Text(text)),
        }
    }

    Ok(payload)
}

// Binary leaves inside nested arrays have no JSON form.
fn nested_to_json(value: FormValue) -> Result<Value> {
    match value {
        FormValue::Scalar(s) => Ok(Value::String(s)),
        FormValue::Object(v) => Ok(v),
        FormValue::Array(items) => items
            .into_iter()
            .map(nested_to_json)
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        FormValue::Binary(_) => Err(Error::SerializationFailed(
            "binary file inside a nested array cannot be sent as a JSON part".to_string(),
        )),
    }
}

fn to_json(value: &Value) -> Result<String> {
    serde_json::to_string(value).map_err(|e| Error::SerializationFailed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_payload_is_verbatim() {
        let body = RequestBody::json(Some(&json!({"username": "a", "password": "b"}))).unwrap();
        match encode(body).unwrap() {
            EncodedBody::Json(bytes) => {
                let round: Value = serde_json::from_slice(&bytes).unwrap();
                assert_eq!(round, json!({"username": "a", "password": "b"}));
            }
            other => panic!("Expected JSON body, got {:?}", other),
        }
    }

    #[test]
    fn test_absent_json_payload_has_no_body() {
        let body = RequestBody::json(None::<&Value>).unwrap();
        assert_eq!(encode(body).unwrap(), EncodedBody::Empty);
    }

    #[test]
    fn test_form_flattening() {
        let file = FilePart::new(&b"hello"[..])
            .file_name("hello.txt")
            .content_type("text/plain");
        let fields = FormFields::new()
            .file("file", file.clone())
            .text("description", Some("greeting"))
            .text("folder", None::<&str>)
            .json("tags", Some(&vec!["a", "b"]))
            .unwrap()
            .json("metadata", Some(&json!({"source": "cli"})))
            .unwrap();

        let payload = match encode(RequestBody::Form(fields)).unwrap() {
            EncodedBody::Multipart(p) => p,
            other => panic!("Expected multipart, got {:?}", other),
        };

        let names: Vec<&str> = payload.parts().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["file", "description", "tags", "tags", "metadata"]);
        assert_eq!(payload.parts()[0].content, PartContent::Binary(file));
        assert_eq!(payload.parts()[1].content, PartContent::Text("greeting".into()));
        assert_eq!(payload.parts()[2].content, PartContent::Text("a".into()));
        assert_eq!(
            payload.parts()[4].content,
            PartContent::Json(r#"{"source":"cli"}"#.into())
        );
    }

    #[test]
    fn test_array_elements_keep_their_kind() {
        let fields = FormFields::new().field(
            "items",
            Some(FormValue::Array(vec![
                FormValue::Binary(FilePart::new(vec![1u8, 2, 3])),
                FormValue::Object(json!({"k": 1})),
                FormValue::scalar(7),
                FormValue::Array(vec![FormValue::scalar("x")]),
            ])),
        );

        let payload = match encode(RequestBody::Form(fields)).unwrap() {
            EncodedBody::Multipart(p) => p,
            other => panic!("Expected multipart, got {:?}", other),
        };
        let contents: Vec<&PartContent> = payload.parts().iter().map(|p| &p.content).collect();
        assert!(matches!(contents[0], PartContent::Binary(_)));
        assert_eq!(contents[1], &PartContent::Json(r#"{"k":1}"#.into()));
        assert_eq!(contents[2], &PartContent::Text("7".into()));
        assert_eq!(contents[3], &PartContent::Json(r#"["x"]"#.into()));
    }

    #[test]
    fn test_binary_inside_nested_array_is_rejected() {
        let fields = FormFields::new().field(
            "items",
            Some(FormValue::Array(vec![FormValue::Array(vec![
                FormValue::scalar("x"),
                FormValue::Binary(FilePart::new(vec![9u8])),
            ])])),
        );

        let result = encode(RequestBody::Form(fields));
        assert!(matches!(result, Err(Error::SerializationFailed(_))));
    }

    #[test]
    fn test_prebuilt_payload_bypasses_encoding() {
        let prebuilt = MultipartPayload::new().text("raw", "value");
        let encoded = encode(RequestBody::Multipart(prebuilt.clone())).unwrap();
        assert_eq!(encoded, EncodedBody::Multipart(prebuilt));
    }

    #[test]
    fn test_null_json_field_is_skipped() {
        let fields = FormFields::new()
            .json("maybe", Some(&Value::Null))
            .unwrap();
        match encode(RequestBody::Form(fields)).unwrap() {
            EncodedBody::Multipart(p) => assert!(p.parts().is_empty()),
            other => panic!("Expected multipart, got {:?}", other),
        }
    }

    #[test]
    fn test_payload_builds_reqwest_form() {
        let payload = MultipartPayload::new()
            .text("a", "1")
            .file("f", FilePart::new(vec![0u8]).content_type("application/octet-stream"));
        assert!(payload.to_form().is_ok());

        let bad = MultipartPayload::new().file("f", FilePart::new(vec![0u8]).content_type("not a mime"));
        assert!(matches!(bad.to_form(), Err(Error::ConfigurationError(_))));
    }
}
