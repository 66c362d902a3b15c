/// Failures that prevent a request from producing a response.
///
/// A response with an unexpected status is not an error here, it is returned to the caller and
/// counted as a failed request.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Invalid request URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("Failed to encode request body: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("Request {operation} failed: {source}")]
    Transport {
        operation: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),
}
