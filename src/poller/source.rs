//! Where poll samples come from

use std::future::Future;
use std::time::Duration;

use serde_json::Value;

use crate::error::{RelayError, RelayResult};

/// A source of comparable JSON samples
pub trait SnapshotSource: Send + Sync {
    fn fetch(&self) -> impl Future<Output = RelayResult<Value>> + Send;
}

/// GETs a JSON document over HTTP
///
/// Any 2xx response with a JSON body is a sample. Other statuses, bodies
/// that do not parse and requests exceeding the timeout are errors.
#[derive(Clone, Debug)]
pub struct HttpJsonSource {
    client: reqwest::Client,
    url: String,
}

impl HttpJsonSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> RelayResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, url))
    }

    pub fn with_client(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn get(&self) -> RelayResult<Value> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(map_request_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(RelayError::Status(status.as_u16()));
        }

        let body = response.bytes().await.map_err(map_request_error)?;
        Ok(serde_json::from_slice(&body)?)
    }
}

impl SnapshotSource for HttpJsonSource {
    fn fetch(&self) -> impl Future<Output = RelayResult<Value>> + Send {
        self.get()
    }
}

fn map_request_error(e: reqwest::Error) -> RelayError {
    if e.is_timeout() {
        RelayError::Timeout
    } else {
        RelayError::Http(e)
    }
}
