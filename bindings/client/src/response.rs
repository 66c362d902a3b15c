use std::collections::BTreeMap;

use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;

/// A captured response. Header names are canonicalised, see [canonical_header_name].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl HttpResponse {
    /// Parse the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_str(&self.body)
    }

    /// Look up a header by its exact, canonical name, for example `X-Powered-By`.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }

    /// The `Content-Type` header.
    pub fn content_type(&self) -> Option<&str> {
        self.header("Content-Type")
    }

    /// Repeated headers are joined with `, `.
    pub(crate) fn capture_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
        let mut captured = BTreeMap::<String, String>::new();
        for (name, value) in headers {
            let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
            captured
                .entry(canonical_header_name(name.as_str()))
                .and_modify(|existing| {
                    existing.push_str(", ");
                    existing.push_str(&value);
                })
                .or_insert(value);
        }
        captured
    }
}

/// Upper case the first letter of each dash separated part, lower case the rest. `content-type`
/// becomes `Content-Type`.
pub fn canonical_header_name(name: &str) -> String {
    name.split('-')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderValue, CONTENT_TYPE, SET_COOKIE};

    #[test]
    fn canonical_names() {
        assert_eq!("Content-Type", canonical_header_name("content-type"));
        assert_eq!("Content-Type", canonical_header_name("CONTENT-TYPE"));
        assert_eq!("X-Powered-By", canonical_header_name("x-powered-by"));
        assert_eq!("Etag", canonical_header_name("ETag"));
    }

    #[test]
    fn repeated_headers_are_joined() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.append(SET_COOKIE, HeaderValue::from_static("a=1"));
        headers.append(SET_COOKIE, HeaderValue::from_static("b=2"));

        let captured = HttpResponse::capture_headers(&headers);

        assert_eq!(Some("application/json"), captured.get("Content-Type").map(String::as_str));
        assert_eq!(Some("a=1, b=2"), captured.get("Set-Cookie").map(String::as_str));
    }

    #[test]
    fn header_lookup_is_exact() {
        let response = HttpResponse {
            headers: BTreeMap::from([
                (
                    "Content-Type".to_string(),
                    "application/json; charset=utf-8".to_string(),
                ),
                ("X-Powered-By".to_string(), "Express".to_string()),
            ]),
            ..Default::default()
        };

        assert_eq!(Some("Express"), response.header("X-Powered-By"));
        assert!(response.header("x-powered-by").is_none());
        assert_eq!(
            Some("application/json; charset=utf-8"),
            response.content_type()
        );
    }
}
