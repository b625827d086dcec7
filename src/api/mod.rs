//! Typed client for the entries service.
//!
//! [`ApiClient`] has one method per endpoint in [`endpoints`]. Required path
//! parameters are arguments, optional query parameters come in a query
//! struct, and every method takes [`RequestOptions`] last. Responses are
//! validated against the schemas in [`schemas`] and come back in domain
//! shape.
//!
//! # Examples
//!
//! ```no_run
//! use apiwire::api::{ApiClient, LoginRequest};
//! use apiwire::ClientConfig;
//!
//! # async fn example() -> Result<(), apiwire::Error> {
//! let api = ApiClient::new(ClientConfig::new("https://api.example.com"))?;
//!
//! let login = api
//!     .login(&LoginRequest::new("ada", "secret"), Default::default())
//!     .await?;
//! if let Some(session) = login.into_data() {
//!     api.set_token(&session.access_token)?;
//! }
//!
//! let me = api.current_user(Default::default()).await?;
//! println!("{:?}", me.data);
//! # Ok(())
//! # }
//! ```

pub mod endpoints;
pub mod schemas;
mod types;

pub use types::*;

use crate::body::RequestBody;
use crate::metadata::{Call, RequestOptions};
use crate::{Client, ClientConfig, Response, Result};
use schemas::{
    EntryListSchema, EntrySchema, FileUploadResponseSchema, LoginResponseSchema, SubentrySchema,
    UserSchema,
};
use uuid::Uuid;

/// The entries service client.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
}

impl ApiClient {
    /// Creates a client from `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL or a default header is invalid.
    pub fn new(config: ClientConfig) -> Result<Self> {
        Ok(Self::from_client(Client::new(config)?))
    }

    /// Wraps an already configured [`Client`].
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    /// The underlying client.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Authenticates later calls with `token`.
    ///
    /// # Errors
    ///
    /// Returns an error if `token` is not a valid header value.
    pub fn set_token(&self, token: &str) -> Result<()> {
        self.client.set_bearer_token(token)
    }

    /// Stops authenticating later calls.
    pub fn clear_token(&self) {
        self.client.clear_bearer_token();
    }

    /// `POST /auth/login`
    pub async fn login(
        &self,
        credentials: &LoginRequest,
        options: RequestOptions,
    ) -> Result<Response<Option<LoginResponse>>> {
        let call = Call::new(&endpoints::LOGIN)
            .body(RequestBody::json(Some(credentials))?)
            .options(options);
        self.client.send::<LoginResponseSchema>(call).await
    }

    /// `GET /auth/me`
    pub async fn current_user(&self, options: RequestOptions) -> Result<Response<Option<User>>> {
        let call = Call::new(&endpoints::CURRENT_USER).options(options);
        self.client.send::<UserSchema>(call).await
    }

    /// `GET /entries`
    pub async fn list_entries(
        &self,
        query: ListEntriesQuery,
        options: RequestOptions,
    ) -> Result<Response<Option<EntryList>>> {
        let call = Call::new(&endpoints::LIST_ENTRIES)
            .query(query.to_query())
            .options(options);
        self.client.send::<EntryListSchema>(call).await
    }

    /// `GET /entries/{entry_id}`
    pub async fn get_entry(
        &self,
        entry_id: Uuid,
        options: RequestOptions,
    ) -> Result<Response<Option<Entry>>> {
        let call = Call::new(&endpoints::GET_ENTRY)
            .path_param("entry_id", entry_id)
            .options(options);
        self.client.send::<EntrySchema>(call).await
    }

    /// `POST /entries`
    pub async fn create_entry(
        &self,
        entry: &CreateEntryRequest,
        options: RequestOptions,
    ) -> Result<Response<Option<Entry>>> {
        let call = Call::new(&endpoints::CREATE_ENTRY)
            .body(RequestBody::json(Some(entry))?)
            .options(options);
        self.client.send::<EntrySchema>(call).await
    }

    /// `PUT /entries/{entry_id}`
    pub async fn update_entry(
        &self,
        entry_id: Uuid,
        changes: &UpdateEntryRequest,
        options: RequestOptions,
    ) -> Result<Response<Option<Entry>>> {
        let call = Call::new(&endpoints::UPDATE_ENTRY)
            .path_param("entry_id", entry_id)
            .body(RequestBody::json(Some(changes))?)
            .options(options);
        self.client.send::<EntrySchema>(call).await
    }

    /// `DELETE /entries/{entry_id}`
    pub async fn delete_entry(&self, entry_id: Uuid, options: RequestOptions) -> Result<Response<()>> {
        let call = Call::new(&endpoints::DELETE_ENTRY)
            .path_param("entry_id", entry_id)
            .options(options);
        self.client.send_empty(call).await
    }

    /// `GET /entries/{entry_id}/subentries/{subentry_id}`
    pub async fn get_subentry(
        &self,
        entry_id: Uuid,
        subentry_id: i64,
        options: RequestOptions,
    ) -> Result<Response<Option<Subentry>>> {
        let call = Call::new(&endpoints::GET_SUBENTRY)
            .path_param("entry_id", entry_id)
            .path_param("subentry_id", subentry_id)
            .options(options);
        self.client.send::<SubentrySchema>(call).await
    }

    /// `POST /files`
    pub async fn upload_file(
        &self,
        upload: &FileUploadRequest,
        options: RequestOptions,
    ) -> Result<Response<Option<FileUploadResponse>>> {
        let call = Call::new(&endpoints::UPLOAD_FILE)
            .body(RequestBody::form(upload)?)
            .options(options);
        self.client.send::<FileUploadResponseSchema>(call).await
    }

    /// `HEAD /health`
    pub async fn health(&self, options: RequestOptions) -> Result<Response<()>> {
        let call = Call::new(&endpoints::HEALTH).options(options);
        self.client.send_empty(call).await
    }
}
