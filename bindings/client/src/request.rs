use reqwest::Method;
use serde::Serialize;

use crate::error::ClientError;

/// Body of the create and update user requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserPayload {
    pub name: String,
    pub job: String,
}

impl UserPayload {
    pub fn new(name: impl Into<String>, job: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            job: job.into(),
        }
    }
}

/// Everything needed to send one request, relative to the target's base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSpec {
    pub method: Method,
    pub path: String,
    /// JSON text
    pub body: String,
    pub headers: Vec<(String, String)>,
}

impl RequestSpec {
    /// `POST /api/users` with the payload as a JSON body.
    pub fn create_user(payload: &UserPayload) -> Result<Self, ClientError> {
        Self::json(Method::POST, "/api/users".to_string(), payload)
    }

    /// `PUT /api/users/{id}` with the payload as a JSON body.
    pub fn update_user(id: u64, payload: &UserPayload) -> Result<Self, ClientError> {
        Self::json(Method::PUT, format!("/api/users/{id}"), payload)
    }

    fn json(method: Method, path: String, payload: &impl Serialize) -> Result<Self, ClientError> {
        Ok(Self {
            method,
            path,
            body: serde_json::to_string(payload)?,
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
        })
    }

    /// Name the request is measured under, for example `POST /api/users`.
    pub fn operation_id(&self) -> String {
        format!("{} {}", self.method, self.path)
    }
}
