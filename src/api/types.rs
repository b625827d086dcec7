//! Request and response types of the entries service.
//!
//! Response types are in domain shape (camelCase) and are produced by
//! validating the wire payload with the matching schema in
//! [`schemas`](super::schemas). Request types serialize straight to the wire
//! shape.

use crate::body::{FilePart, FormFields, FormValue, ToForm};
use crate::brand::Branded;
use crate::path::Query;
use crate::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

/// Credentials for `POST /auth/login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    /// Account name.
    pub username: String,
    /// Plain-text password.
    pub password: String,
}

impl LoginRequest {
    /// Creates credentials for `username`.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// A successful login.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LoginResponse {
    /// Bearer token for later calls.
    pub access_token: String,
    /// When `access_token` stops being accepted.
    pub expires_at: DateTime<Utc>,
    /// The signed-in account.
    pub user: User,
}

/// What an account may do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full access.
    Admin,
    /// Can edit their own entries.
    Member,
    /// Read only.
    Viewer,
}

/// An account.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct User {
    /// Account id.
    pub id: Uuid,
    /// Account name.
    pub username: String,
    /// Account role.
    pub role: Role,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

/// Publication state of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    /// Not yet visible.
    Draft,
    /// Visible.
    Published,
    /// Hidden from default listings.
    Archived,
}

impl EntryStatus {
    /// The wire spelling.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryStatus::Draft => "draft",
            EntryStatus::Published => "published",
            EntryStatus::Archived => "archived",
        }
    }
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A content block of an entry, discriminated by `type`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Block {
    /// Plain text.
    Text {
        /// The text.
        body: String,
    },
    /// A hyperlink.
    Link {
        /// Link target.
        url: String,
        /// Display text, if any.
        #[serde(default)]
        label: Option<String>,
    },
}

/// A checklist item of an entry.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Subentry {
    /// Id, unique within the entry.
    pub id: i64,
    /// Item text.
    pub label: String,
    /// Zero-based order within the entry.
    pub position: i64,
    /// Whether the item is checked off.
    pub done: bool,
    /// When the item was checked off.
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

/// An entry with its subentries and content blocks.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Entry {
    /// Entry id.
    pub id: Uuid,
    /// Entry title.
    pub title: String,
    /// Publication state.
    pub status: EntryStatus,
    /// When the entry was created.
    pub created_at: DateTime<Utc>,
    /// When the entry was last changed, if ever.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    /// Free-form labels.
    pub tags: Vec<String>,
    /// Checklist items.
    pub subentries: Vec<Subentry>,
    /// Content blocks, in order.
    pub blocks: Vec<Block>,
    /// Private note.
    #[serde(default)]
    pub note: Option<String>,
}

impl Entry {
    /// The entry id, tagged as coming from a validated entry.
    pub fn entry_id(&self) -> EntryId {
        Branded::new(self.id)
    }
}

/// One page of `GET /entries`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EntryList {
    /// Entries on this page.
    pub entries: Vec<Entry>,
    /// Number of entries across all pages.
    pub total: i64,
    /// Cursor for the next page, absent on the last one.
    #[serde(default)]
    pub next_cursor: Option<String>,
}

/// A stored file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FileUploadResponse {
    /// Id of the stored file.
    pub file_id: String,
    /// Where the file can be downloaded.
    pub url: String,
}

impl FileUploadResponse {
    /// The stored file's id, tagged as coming from a validated upload.
    pub fn file_id(&self) -> FileId {
        Branded::new(self.file_id.clone())
    }
}

/// Brand for ids taken from a validated [`Entry`].
pub enum EntryIdBrand {}

/// Brand for ids taken from a validated [`FileUploadResponse`].
pub enum FileIdBrand {}

/// An entry id known to come from the server.
pub type EntryId = Branded<Uuid, EntryIdBrand>;

/// A file id known to come from the server.
pub type FileId = Branded<String, FileIdBrand>;

/// Body of `POST /entries`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateEntryRequest {
    /// Entry title.
    pub title: String,
    /// Initial state. The server defaults to draft.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<EntryStatus>,
    /// Free-form labels.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Private note.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl CreateEntryRequest {
    /// Creates a request with only a title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            status: None,
            tags: Vec::new(),
            note: None,
        }
    }
}

/// Body of `PUT /entries/{entry_id}`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpdateEntryRequest {
    /// New title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// New state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<EntryStatus>,
    /// Replacement labels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    /// New note.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Query of `GET /entries`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListEntriesQuery {
    /// Page size.
    pub limit: Option<u32>,
    /// `next_cursor` of the previous page.
    pub cursor: Option<String>,
    /// Only entries in this state.
    pub status: Option<EntryStatus>,
    /// Whether archived entries are listed.
    pub include_archived: Option<bool>,
}

impl ListEntriesQuery {
    /// The query parameters, skipping unset ones.
    pub fn to_query(&self) -> Query {
        Query::new()
            .param("limit", self.limit)
            .param("cursor", self.cursor.as_deref())
            .param("status", self.status)
            .param("include_archived", self.include_archived)
    }
}

/// Body of `POST /files`.
#[derive(Debug, Clone, PartialEq)]
pub struct FileUploadRequest {
    /// The file contents.
    pub file: FilePart,
    /// Short description.
    pub description: Option<String>,
    /// Labels, one part each.
    pub tags: Vec<String>,
    /// Free-form attributes, sent as one JSON part.
    pub metadata: Option<Value>,
}

impl FileUploadRequest {
    /// Creates an upload of `file` with no extra fields.
    pub fn new(file: FilePart) -> Self {
        Self {
            file,
            description: None,
            tags: Vec::new(),
            metadata: None,
        }
    }
}

impl ToForm for FileUploadRequest {
    fn to_form(&self) -> Result<FormFields> {
        let tags = (!self.tags.is_empty())
            .then(|| FormValue::Array(self.tags.iter().map(FormValue::scalar).collect()));

        FormFields::new()
            .file("file", self.file.clone())
            .text("description", self.description.as_deref())
            .field("tags", tags)
            .json("metadata", self.metadata.as_ref())
    }
}
