//! Partner solicitation source. Fetches raw records and unwraps the response
//! envelope; normalizing the records is the pipeline's job.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::info;

use crate::errors::TriageError;

const WRAPPER_KEY: &str = "solicitation";

#[async_trait]
pub trait SolicitationSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<Value>, TriageError>;
}

pub struct PartnerApiClient {
    client: Client,
    url: String,
}

impl PartnerApiClient {
    pub fn new(url: String, timeout_secs: u64) -> Result<Self, TriageError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| TriageError::Source(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl SolicitationSource for PartnerApiClient {
    async fn fetch(&self) -> Result<Vec<Value>, TriageError> {
        info!("Fetching solicitations from: {}", self.url);

        let payload: Value = self
            .client
            .get(&self.url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| TriageError::Source(format!("Request failed: {e}")))?
            .json()
            .await
            .map_err(|e| TriageError::Source(format!("Response is not JSON: {e}")))?;

        let records = unwrap_payload(payload);
        info!("Retrieved {} solicitation(s)", records.len());
        Ok(records)
    }
}

/// A list yields one record per item, an object yields one record; each is
/// taken from under the `"solicitation"` key when present. Anything else yields none.
pub fn unwrap_payload(payload: Value) -> Vec<Value> {
    match payload {
        Value::Array(items) => items.into_iter().map(unwrap_item).collect(),
        item @ Value::Object(_) => vec![unwrap_item(item)],
        _ => Vec::new(),
    }
}

fn unwrap_item(item: Value) -> Value {
    match item {
        Value::Object(mut map) if map.contains_key(WRAPPER_KEY) => {
            map.remove(WRAPPER_KEY).unwrap_or(Value::Null)
        }
        other => other,
    }
}
