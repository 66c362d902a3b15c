use std::sync::Arc;
use std::time::Duration;

use gust_instruments::{OperationRecord, Reporter, Tags};

use crate::error::ClientError;
use crate::request::{RequestSpec, UserPayload};
use crate::response::HttpResponse;

/// Client for the users API that measures every request it sends.
///
/// Each request is reported as an operation named after its method and path, tagged with the
/// scenario and group it was sent from. Requests are never retried.
#[derive(Debug, Clone)]
pub struct UsersApiClient {
    base_url: String,
    client: reqwest::Client,
    reporter: Arc<Reporter>,
}

impl UsersApiClient {
    pub fn new(base_url: impl Into<String>, reporter: Arc<Reporter>) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(ClientError::Build)?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
            reporter,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn create_user(
        &self,
        payload: &UserPayload,
        tags: Tags,
    ) -> Result<HttpResponse, ClientError> {
        self.send(RequestSpec::create_user(payload)?, tags).await
    }

    pub async fn update_user(
        &self,
        id: u64,
        payload: &UserPayload,
        tags: Tags,
    ) -> Result<HttpResponse, ClientError> {
        self.send(RequestSpec::update_user(id, payload)?, tags).await
    }

    /// Send a request and wait for the full response body.
    pub async fn send(&self, spec: RequestSpec, tags: Tags) -> Result<HttpResponse, ClientError> {
        let raw_url = format!("{}{}", self.base_url, spec.path);
        let url = url::Url::parse(&raw_url).map_err(|source| ClientError::InvalidUrl {
            url: raw_url.clone(),
            source,
        })?;
        let operation_id = spec.operation_id();

        let mut request = self.client.request(spec.method, url).body(spec.body.clone());
        for (name, value) in &spec.headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let mut record =
            OperationRecord::new(operation_id.clone(), tags).with_bytes_sent(spec.body.len() as u64);

        let result = async {
            let response = request.send().await?;
            let status = response.status().as_u16();
            let headers = HttpResponse::capture_headers(response.headers());
            let body = response.text().await?;
            Ok::<_, reqwest::Error>(HttpResponse {
                status,
                headers,
                body,
            })
        }
        .await;

        match result {
            Ok(response) => {
                record.finish(Some(response.status), response.body.len() as u64);
                self.reporter.add_operation(record);
                log::trace!("{} returned {}", operation_id, response.status);
                Ok(response)
            }
            Err(source) => {
                record.finish(None, 0);
                self.reporter.add_operation(record);
                Err(ClientError::Transport {
                    operation: operation_id,
                    source,
                })
            }
        }
    }
}
