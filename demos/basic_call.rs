//! Basic example: log in, list entries, create one and delete it again.
//!
//! This example shows how to:
//! - Load a client configuration from JSON
//! - Authenticate with a bearer token
//! - Call endpoints with query parameters, bodies and path parameters
//! - Inspect validation failures and response metadata
//!
//! Run with: `APIWIRE_BASE_URL=http://localhost:8080 cargo run --example basic_call`

use apiwire::api::{ApiClient, CreateEntryRequest, ListEntriesQuery, LoginRequest};
use apiwire::{ClientConfig, Error, RequestOptions};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("apiwire=debug,basic_call=info")),
        )
        .init();

    let base_url =
        std::env::var("APIWIRE_BASE_URL").unwrap_or_else(|_| "http://localhost:8080".to_string());
    let config: ClientConfig = serde_json::from_value(serde_json::json!({
        "base_url": base_url,
        "timeout_ms": 5000,
        "retries": 2,
        "retry_delay_ms": 250,
        "default_headers": { "user-agent": "apiwire-demo/0.1" }
    }))
    .map_err(|e| Error::ConfigurationError(e.to_string()))?;

    let api = ApiClient::new(config)?;

    println!("=== Login ===");
    let login = api
        .login(&LoginRequest::new("demo", "demo"), RequestOptions::default())
        .await?;
    if let Some(session) = login.into_data() {
        println!("Signed in as {} until {}", session.user.username, session.expires_at);
        api.set_token(&session.access_token)?;
    }
    println!();

    println!("=== List Entries ===");
    let query = ListEntriesQuery {
        limit: Some(10),
        ..Default::default()
    };
    match api.list_entries(query, RequestOptions::default()).await {
        Ok(response) => {
            println!("Request latency: {:?}", response.latency);
            println!("Attempts: {}", response.attempts);
            if let Some(list) = response.into_data() {
                for entry in &list.entries {
                    println!("{} [{}] {}", entry.id, entry.status, entry.title);
                }
            }
        }
        Err(Error::Validation(error)) => {
            eprintln!("The service sent an unexpected payload:");
            for field in error.errors() {
                eprintln!("  {}: {}", field.path, field.message);
            }
        }
        Err(e) => return Err(e),
    }
    println!();

    println!("=== Create and Delete ===");
    let created = api
        .create_entry(&CreateEntryRequest::new("From the demo"), RequestOptions::default())
        .await?;
    println!("Status code: {}", created.status);
    println!("Raw response length: {} bytes", created.raw_body.len());

    if let Some(entry) = created.into_data() {
        let deleted = api.delete_entry(entry.id, RequestOptions::default()).await?;
        println!("Deleted {} with status {}", entry.id, deleted.status);
    }

    api.clear_token();
    Ok(())
}
