//! Validation rules for the entries service payloads.
//!
//! Wire names are snake_case, domain names camelCase. Each marker type ties a
//! rule to the domain type in [`types`](super::types) it produces.

use super::types::{Entry, EntryList, FileUploadResponse, LoginRequest, LoginResponse, Subentry, User};
use crate::validate::{FieldRule, Kind, Schema, StringFormat, TypeRule};
use once_cell::sync::Lazy;

const ROLES: &[&str] = &["admin", "member", "viewer"];
const ENTRY_STATUSES: &[&str] = &["draft", "published", "archived"];

fn datetime() -> Kind {
    Kind::Format(StringFormat::DateTime)
}

fn login_request_rule() -> TypeRule {
    TypeRule::new(
        "LoginRequest",
        vec![
            FieldRule::required("username", Kind::String),
            FieldRule::required("password", Kind::String),
        ],
    )
}

fn user_rule() -> TypeRule {
    TypeRule::new(
        "User",
        vec![
            FieldRule::required("id", Kind::Format(StringFormat::Uuid)),
            FieldRule::required("username", Kind::String),
            FieldRule::required("role", Kind::Enum(ROLES)),
            FieldRule::required("createdAt", datetime()).wire("created_at"),
        ],
    )
}

fn login_response_rule() -> TypeRule {
    TypeRule::new(
        "LoginResponse",
        vec![
            FieldRule::required("accessToken", Kind::String).wire("access_token"),
            FieldRule::required("expiresAt", datetime()).wire("expires_at"),
            FieldRule::required("user", Kind::Object(user_rule())),
        ],
    )
}

fn subentry_rule() -> TypeRule {
    TypeRule::new(
        "Subentry",
        vec![
            FieldRule::required("id", Kind::Integer),
            FieldRule::required("label", Kind::String),
            FieldRule::required("position", Kind::Integer),
            FieldRule::required("done", Kind::Boolean),
            FieldRule::optional("completedAt", datetime())
                .wire("completed_at")
                .nullable(),
        ],
    )
}

fn block_kind() -> Kind {
    Kind::Union {
        tag: "type",
        variants: vec![
            (
                "text",
                TypeRule::new("TextBlock", vec![FieldRule::required("body", Kind::String)]),
            ),
            (
                "link",
                TypeRule::new(
                    "LinkBlock",
                    vec![
                        FieldRule::required("url", Kind::String),
                        FieldRule::optional("label", Kind::String),
                    ],
                ),
            ),
        ],
    }
}

fn entry_rule() -> TypeRule {
    TypeRule::new(
        "Entry",
        vec![
            FieldRule::required("id", Kind::Format(StringFormat::Uuid)),
            FieldRule::required("title", Kind::String),
            FieldRule::required("status", Kind::Enum(ENTRY_STATUSES)),
            FieldRule::required("createdAt", datetime()).wire("created_at"),
            FieldRule::optional("updatedAt", datetime())
                .wire("updated_at")
                .nullable(),
            FieldRule::required("tags", Kind::array(Kind::String)),
            FieldRule::required("subentries", Kind::array(Kind::Object(subentry_rule()))),
            FieldRule::required("blocks", Kind::array(block_kind())),
            FieldRule::optional("note", Kind::String).nullable(),
        ],
    )
}

fn entry_list_rule() -> TypeRule {
    TypeRule::new(
        "EntryList",
        vec![
            FieldRule::required("entries", Kind::array(Kind::Object(entry_rule()))),
            FieldRule::required("total", Kind::Integer),
            FieldRule::optional("nextCursor", Kind::String)
                .wire("next_cursor")
                .nullable(),
        ],
    )
}

fn file_upload_response_rule() -> TypeRule {
    TypeRule::new(
        "FileUploadResponse",
        vec![
            FieldRule::required("fileId", Kind::String).wire("file_id"),
            FieldRule::required("url", Kind::String),
        ],
    )
}

macro_rules! schema {
    ($(#[$doc:meta])* $marker:ident => $output:ty, $build:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy)]
        pub enum $marker {}

        impl Schema for $marker {
            type Output = $output;

            fn rule() -> &'static TypeRule {
                static RULE: Lazy<TypeRule> = Lazy::new($build);
                &RULE
            }
        }
    };
}

schema!(
    /// `{ username, password }`
    LoginRequestSchema => LoginRequest, login_request_rule
);
schema!(
    /// `{ access_token, expires_at, user }`
    LoginResponseSchema => LoginResponse, login_response_rule
);
schema!(UserSchema => User, user_rule);
schema!(SubentrySchema => Subentry, subentry_rule);
schema!(EntrySchema => Entry, entry_rule);
schema!(EntryListSchema => EntryList, entry_list_rule);
schema!(
    /// `{ file_id, url }`
    FileUploadResponseSchema => FileUploadResponse, file_upload_response_rule
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::{Block, EntryStatus, Role};
    use crate::validate::{check, is_valid, parse, validate, ValidationOutcome};
    use crate::Error;
    use serde_json::{json, Value};
    use std::collections::BTreeSet;

    fn entry_json() -> Value {
        json!({
            "id": "0b5c6c2e-4f0e-4a51-9d3b-2f1a6f3e8c10",
            "title": "Groceries",
            "status": "published",
            "created_at": "2024-03-01T09:30:00Z",
            "updated_at": null,
            "tags": ["home"],
            "subentries": [
                {"id": 1, "label": "Milk", "position": 0, "done": true,
                 "completed_at": "2024-03-02T08:00:00+01:00"},
                {"id": 2, "label": "Bread", "position": 1, "done": false}
            ],
            "blocks": [
                {"type": "text", "body": "Before noon"},
                {"type": "link", "url": "https://shop.example.com"}
            ]
        })
    }

    #[test]
    fn test_login_request_accepts_complete_payload() {
        let request = parse::<LoginRequestSchema>(&json!({"username": "a", "password": "b"})).unwrap();
        assert_eq!(request, LoginRequest::new("a", "b"));
    }

    #[test]
    fn test_login_request_reports_missing_password() {
        match check::<LoginRequestSchema>(&json!({"username": "a"})) {
            ValidationOutcome::Invalid(error) => {
                assert_eq!(error.errors().len(), 1);
                assert_eq!(error.errors()[0].path, "password");
                assert_eq!(error.errors()[0].message, "Required");
            }
            ValidationOutcome::Valid(_) => panic!("Expected a validation failure"),
        }
    }

    #[test]
    fn test_file_upload_response_is_renamed() {
        let payload = json!({"file_id": "f1", "url": "https://cdn.example.com/f1"});
        let domain = validate(&payload, FileUploadResponseSchema::rule()).unwrap();
        assert_eq!(
            domain,
            json!({"fileId": "f1", "url": "https://cdn.example.com/f1"})
        );

        let typed = parse::<FileUploadResponseSchema>(&payload).unwrap();
        assert_eq!(typed.file_id().as_str(), "f1");
    }

    #[test]
    fn test_entry_parses_into_domain_type() {
        let entry = parse::<EntrySchema>(&entry_json()).unwrap();
        assert_eq!(entry.status, EntryStatus::Published);
        assert_eq!(entry.subentries.len(), 2);
        assert!(entry.subentries[0].completed_at.is_some());
        assert!(entry.subentries[1].completed_at.is_none());
        assert!(entry.updated_at.is_none());
        assert_eq!(
            entry.blocks,
            vec![
                Block::Text {
                    body: "Before noon".to_string()
                },
                Block::Link {
                    url: "https://shop.example.com".to_string(),
                    label: None
                },
            ]
        );
        assert_eq!(*entry.entry_id(), entry.id);
    }

    fn full_entry_json() -> Value {
        let mut entry = entry_json();
        entry["note"] = json!("Bring bags");
        entry
    }

    fn user_json() -> Value {
        json!({
            "id": "0b5c6c2e-4f0e-4a51-9d3b-2f1a6f3e8c10",
            "username": "ada",
            "role": "member",
            "created_at": "2023-01-01T00:00:00Z"
        })
    }

    // `payload` carries every field the rule declares.
    fn assert_rule_matches_type<S: Schema>(payload: Value) {
        let domain = validate(&payload, S::rule()).unwrap();
        let keys: BTreeSet<&str> = domain.as_object().unwrap().keys().map(String::as_str).collect();
        let expected: BTreeSet<&str> = S::rule().domain_names().collect();
        assert_eq!(keys, expected, "{}", S::rule().name());

        if let Err(e) = parse::<S>(&payload) {
            panic!("{} does not fit its domain type: {}", S::rule().name(), e);
        }
    }

    #[test]
    fn test_domain_keys_match_rule() {
        assert_rule_matches_type::<LoginRequestSchema>(json!({"username": "a", "password": "b"}));
        assert_rule_matches_type::<UserSchema>(user_json());
        assert_rule_matches_type::<LoginResponseSchema>(json!({
            "access_token": "t0k",
            "expires_at": "2024-03-01T10:00:00Z",
            "user": user_json()
        }));
        assert_rule_matches_type::<SubentrySchema>(json!({
            "id": 7,
            "label": "Milk",
            "position": 0,
            "done": true,
            "completed_at": "2024-03-02T08:00:00Z"
        }));
        assert_rule_matches_type::<EntrySchema>(full_entry_json());
        assert_rule_matches_type::<EntryListSchema>(json!({
            "entries": [full_entry_json()],
            "total": 1,
            "next_cursor": "c2"
        }));
        assert_rule_matches_type::<FileUploadResponseSchema>(json!({
            "file_id": "f-1",
            "url": "https://files.example.com/f-1"
        }));
    }

    #[test]
    fn test_field_missing_from_domain_type_is_rejected() {
        let mut fields = user_rule().fields().to_vec();
        fields.push(FieldRule::optional("nickname", Kind::String));
        let wider = TypeRule::new("User", fields);

        let mut payload = user_json();
        payload["nickname"] = json!("countess");
        let domain = validate(&payload, &wider).unwrap();
        assert!(serde_json::from_value::<User>(domain).is_err());
    }

    #[test]
    fn test_entry_roundtrip_is_stable() {
        let rule = EntrySchema::rule();
        let domain = validate(&entry_json(), rule).unwrap();
        let again = validate(&rule.to_wire(&domain), rule).unwrap();
        assert_eq!(domain, again);
    }

    #[test]
    fn test_unknown_block_type() {
        let mut payload = entry_json();
        payload["blocks"][1]["type"] = json!("video");

        let errors = validate(&payload, EntrySchema::rule()).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path, "blocks.1.type");
        assert_eq!(
            errors[0].message,
            "Invalid discriminator value. Expected 'text' | 'link'"
        );
    }

    #[test]
    fn test_entry_list_collects_every_error() {
        let payload = json!({
            "entries": [{"id": "nope"}],
            "total": "3",
            "next_cursor": null
        });

        match parse::<EntryListSchema>(&payload) {
            Err(Error::Validation(error)) => {
                let paths: Vec<&str> = error.errors().iter().map(|e| e.path.as_str()).collect();
                assert_eq!(
                    paths,
                    vec![
                        "entries.0.id",
                        "entries.0.title",
                        "entries.0.status",
                        "entries.0.created_at",
                        "entries.0.tags",
                        "entries.0.subentries",
                        "entries.0.blocks",
                        "total",
                    ]
                );
                assert_eq!(error.data(), &payload);
            }
            other => panic!("Expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_login_response_nested_user() {
        let payload = json!({
            "access_token": "t0k",
            "expires_at": "2024-03-01T10:00:00Z",
            "user": {
                "id": "0b5c6c2e-4f0e-4a51-9d3b-2f1a6f3e8c10",
                "username": "ada",
                "role": "admin",
                "created_at": "2023-01-01T00:00:00Z"
            }
        });
        let response = parse::<LoginResponseSchema>(&payload).unwrap();
        assert_eq!(response.access_token, "t0k");
        assert_eq!(response.user.role, Role::Admin);

        let mut bad = payload.clone();
        bad["user"]["role"] = json!("owner");
        assert!(!is_valid::<LoginResponseSchema>(&bad));
    }
}
