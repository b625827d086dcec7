//! Endpoint descriptors for the entries service.

use crate::metadata::{BodyKind, Endpoint};
use http::Method;

/// `POST /auth/login`
pub static LOGIN: Endpoint = Endpoint {
    name: "login",
    method: Method::POST,
    path: "/auth/login",
    path_params: &[],
    query_params: &[],
    body: BodyKind::Json,
};

/// `GET /auth/me`
pub static CURRENT_USER: Endpoint = Endpoint {
    name: "current_user",
    method: Method::GET,
    path: "/auth/me",
    path_params: &[],
    query_params: &[],
    body: BodyKind::None,
};

/// `GET /entries`
pub static LIST_ENTRIES: Endpoint = Endpoint {
    name: "list_entries",
    method: Method::GET,
    path: "/entries",
    path_params: &[],
    query_params: &["limit", "cursor", "status", "include_archived"],
    body: BodyKind::None,
};

/// `GET /entries/{entry_id}`
pub static GET_ENTRY: Endpoint = Endpoint {
    name: "get_entry",
    method: Method::GET,
    path: "/entries/{entry_id}",
    path_params: &["entry_id"],
    query_params: &[],
    body: BodyKind::None,
};

/// `POST /entries`
pub static CREATE_ENTRY: Endpoint = Endpoint {
    name: "create_entry",
    method: Method::POST,
    path: "/entries",
    path_params: &[],
    query_params: &[],
    body: BodyKind::Json,
};

/// `PUT /entries/{entry_id}`
pub static UPDATE_ENTRY: Endpoint = Endpoint {
    name: "update_entry",
    method: Method::PUT,
    path: "/entries/{entry_id}",
    path_params: &["entry_id"],
    query_params: &[],
    body: BodyKind::Json,
};

/// `DELETE /entries/{entry_id}`, answered with 204.
pub static DELETE_ENTRY: Endpoint = Endpoint {
    name: "delete_entry",
    method: Method::DELETE,
    path: "/entries/{entry_id}",
    path_params: &["entry_id"],
    query_params: &[],
    body: BodyKind::None,
};

/// `GET /entries/{entry_id}/subentries/{subentry_id}`
pub static GET_SUBENTRY: Endpoint = Endpoint {
    name: "get_subentry",
    method: Method::GET,
    path: "/entries/{entry_id}/subentries/{subentry_id}",
    path_params: &["entry_id", "subentry_id"],
    query_params: &[],
    body: BodyKind::None,
};

/// `POST /files`
pub static UPLOAD_FILE: Endpoint = Endpoint {
    name: "upload_file",
    method: Method::POST,
    path: "/files",
    path_params: &[],
    query_params: &[],
    body: BodyKind::Multipart,
};

/// `HEAD /health`
pub static HEALTH: Endpoint = Endpoint {
    name: "health",
    method: Method::HEAD,
    path: "/health",
    path_params: &[],
    query_params: &[],
    body: BodyKind::None,
};

/// Every endpoint of the service.
pub static ALL: [&Endpoint; 10] = [
    &LOGIN,
    &CURRENT_USER,
    &LIST_ENTRIES,
    &GET_ENTRY,
    &CREATE_ENTRY,
    &UPDATE_ENTRY,
    &DELETE_ENTRY,
    &GET_SUBENTRY,
    &UPLOAD_FILE,
    &HEALTH,
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::placeholders;

    #[test]
    fn test_declared_path_params_match_templates() {
        for endpoint in ALL {
            assert_eq!(
                placeholders(endpoint.path),
                endpoint.path_params,
                "{}",
                endpoint.name
            );
        }
    }

    #[test]
    fn test_endpoint_names_are_unique() {
        let mut names: Vec<&str> = ALL.iter().map(|e| e.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), ALL.len());
    }
}
