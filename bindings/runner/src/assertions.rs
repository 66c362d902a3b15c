//! Checks run against every users API response.
//!
//! Each check records one labelled pass/fail result through a [CheckRecorder]. A body that is not
//! valid JSON is an error rather than a failed check, the error is returned and nothing is
//! recorded for that check.

use std::fmt::{Display, Formatter};

use anyhow::Context;
use gust_runner::prelude::{CheckRecorder, GustResult};
use serde::Deserialize;
use serde_json::Value;
use users_api_instrumented::prelude::{HttpResponse, UserPayload};

pub const HEADERS_MATCH_LABEL: &str = "Headers Match Expected Values";

/// Headers sent with every request and expected back on every response.
pub const DEFAULT_HEADERS: [(&str, &str); 1] = [("Content-Type", "application/json")];

/// The body returned by the create and update endpoints. Every field is optional, a comparison
/// against a field that is not present fails.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub name: Option<Value>,
    pub job: Option<Value>,
    pub id: Option<Value>,
    pub created_at: Option<Value>,
    pub updated_at: Option<Value>,
}

impl UserRecord {
    /// Parse a response body. Valid JSON that is not an object has none of the fields.
    pub fn from_response(response: &HttpResponse) -> GustResult<Self> {
        let value: Value = response
            .json()
            .context("Response body is not valid JSON")?;
        Ok(serde_json::from_value(value).unwrap_or_default())
    }

    pub fn field(&self, field: UserField) -> Option<&Value> {
        match field {
            UserField::Name => self.name.as_ref(),
            UserField::Job => self.job.as_ref(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserField {
    Name,
    Job,
}

impl UserField {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserField::Name => "name",
            UserField::Job => "job",
        }
    }
}

pub fn status_label(expected: u16) -> String {
    format!("Correct Status code is {expected}")
}

pub fn body_field_label(field: UserField, expected: &str) -> String {
    format!("Response body field '{}' same with '{}'", field.as_str(), expected)
}

/// Passes when the status matches. The body must still be valid JSON, otherwise an error is
/// returned and the check is not recorded.
pub fn assert_response_code<C: CheckRecorder>(
    checker: &C,
    response: &HttpResponse,
    expected: u16,
) -> GustResult<bool> {
    checker.check(&status_label(expected), || {
        let _: Value = response
            .json()
            .context("Response body is not valid JSON")?;
        Ok(response.status == expected)
    })
}

/// Passes when every expected header is present with the expected value. `Content-Type` is found
/// whatever the case of the expected name and only needs to start with the expected value,
/// ignoring case, so that a charset suffix is accepted. Every other header must match its
/// canonical name and value exactly.
pub fn assert_response_header<C: CheckRecorder>(
    checker: &C,
    response: &HttpResponse,
    expected: &[(&str, &str)],
) -> GustResult<bool> {
    checker.check(HEADERS_MATCH_LABEL, || {
        match first_header_mismatch(response, expected) {
            Ok(()) => Ok(true),
            Err(mismatch) => {
                log::error!("{mismatch}");
                Ok(false)
            }
        }
    })
}

/// The first expected header that the response does not satisfy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderMismatch {
    pub name: String,
    pub expected: String,
    pub actual: Option<String>,
}

impl Display for HeaderMismatch {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Expected header '{}: {}', but found '{}: {}'",
            self.name,
            self.expected,
            self.name,
            self.actual.as_deref().unwrap_or("(missing)")
        )
    }
}

/// Compare headers in order and stop at the first one that does not match.
pub fn first_header_mismatch(
    response: &HttpResponse,
    expected: &[(&str, &str)],
) -> Result<(), HeaderMismatch> {
    for (name, value) in expected {
        let actual = if name.eq_ignore_ascii_case("content-type") {
            let actual = response.content_type();
            if actual.is_some_and(|a| a.to_lowercase().starts_with(&value.to_lowercase())) {
                continue;
            }
            actual
        } else {
            response.header(name)
        };

        if actual != Some(*value) {
            return Err(HeaderMismatch {
                name: name.to_string(),
                expected: value.to_string(),
                actual: actual.map(str::to_string),
            });
        }
    }

    Ok(())
}

/// Passes when the field in the create response body is the expected string.
pub fn assert_response_body_create<C: CheckRecorder>(
    checker: &C,
    response: &HttpResponse,
    field: UserField,
    expected: &str,
) -> GustResult<bool> {
    assert_body_field(checker, response, field, expected)
}

/// Passes when the field in the update response body is the expected string.
pub fn assert_response_body_update<C: CheckRecorder>(
    checker: &C,
    response: &HttpResponse,
    field: UserField,
    expected: &str,
) -> GustResult<bool> {
    assert_body_field(checker, response, field, expected)
}

fn assert_body_field<C: CheckRecorder>(
    checker: &C,
    response: &HttpResponse,
    field: UserField,
    expected: &str,
) -> GustResult<bool> {
    checker.check(&body_field_label(field, expected), || {
        let record = UserRecord::from_response(response)?;
        Ok(matches!(record.field(field), Some(Value::String(actual)) if actual == expected))
    })
}

/// Headers, status 201, then the `name` and `job` fields of a create response.
pub fn verify_created_user<C: CheckRecorder>(
    checker: &C,
    response: &HttpResponse,
    payload: &UserPayload,
) -> GustResult<()> {
    assert_response_header(checker, response, &DEFAULT_HEADERS)?;
    verify_created_user_status_and_body(checker, response, payload)
}

/// Status 201, then the `name` and `job` fields of a create response. Headers are not checked.
pub fn verify_created_user_status_and_body<C: CheckRecorder>(
    checker: &C,
    response: &HttpResponse,
    payload: &UserPayload,
) -> GustResult<()> {
    assert_response_code(checker, response, 201)?;
    assert_response_body_create(checker, response, UserField::Name, &payload.name)?;
    assert_response_body_create(checker, response, UserField::Job, &payload.job)?;
    Ok(())
}

/// Headers, status 200, then the `name` and `job` fields of an update response.
pub fn verify_updated_user<C: CheckRecorder>(
    checker: &C,
    response: &HttpResponse,
    payload: &UserPayload,
) -> GustResult<()> {
    assert_response_header(checker, response, &DEFAULT_HEADERS)?;
    verify_updated_user_status_and_body(checker, response, payload)
}

/// Status 200, then the `name` and `job` fields of an update response. Headers are not checked.
pub fn verify_updated_user_status_and_body<C: CheckRecorder>(
    checker: &C,
    response: &HttpResponse,
    payload: &UserPayload,
) -> GustResult<()> {
    assert_response_code(checker, response, 200)?;
    assert_response_body_update(checker, response, UserField::Name, &payload.name)?;
    assert_response_body_update(checker, response, UserField::Job, &payload.job)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::collections::BTreeMap;

    #[derive(Default)]
    struct RecordingChecker(RefCell<Vec<(String, bool)>>);

    impl CheckRecorder for RecordingChecker {
        fn record_check(&self, name: &str, passed: bool) {
            self.0.borrow_mut().push((name.to_string(), passed));
        }
    }

    impl RecordingChecker {
        fn recorded(&self) -> Vec<(String, bool)> {
            self.0.borrow().clone()
        }
    }

    fn response(status: u16, content_type: Option<&str>, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: content_type
                .map(|v| BTreeMap::from([("Content-Type".to_string(), v.to_string())]))
                .unwrap_or_default(),
            body: body.to_string(),
        }
    }

    #[test]
    fn created_user_passes_every_check() {
        let checker = RecordingChecker::default();
        let response = response(
            201,
            Some("application/json; charset=utf-8"),
            r#"{"name":"morpheus","job":"leader","id":"7","createdAt":"2024-01-01T00:00:00Z"}"#,
        );

        verify_created_user(&checker, &response, &UserPayload::new("morpheus", "leader")).unwrap();

        assert_eq!(
            vec![
                ("Headers Match Expected Values".to_string(), true),
                ("Correct Status code is 201".to_string(), true),
                ("Response body field 'name' same with 'morpheus'".to_string(), true),
                ("Response body field 'job' same with 'leader'".to_string(), true),
            ],
            checker.recorded()
        );
    }

    #[test]
    fn unexpected_status_fails_the_check() {
        let checker = RecordingChecker::default();
        let response = response(500, None, "{}");

        assert!(!assert_response_code(&checker, &response, 200).unwrap());
        assert_eq!(
            vec![("Correct Status code is 200".to_string(), false)],
            checker.recorded()
        );
    }

    #[test]
    fn status_check_errors_on_malformed_body() {
        let checker = RecordingChecker::default();
        let response = response(201, Some("text/html"), "<html>not json</html>");

        assert!(assert_response_code(&checker, &response, 201).is_err());
        assert!(checker.recorded().is_empty());
    }

    #[test]
    fn body_check_errors_on_malformed_body() {
        let checker = RecordingChecker::default();
        let response = response(201, None, "not json");

        assert!(
            assert_response_body_create(&checker, &response, UserField::Name, "morpheus").is_err()
        );
        assert!(checker.recorded().is_empty());
    }

    #[test]
    fn absent_field_fails_the_check() {
        let checker = RecordingChecker::default();
        let response = response(200, None, r#"{"name":"morpheus"}"#);

        assert!(
            !assert_response_body_update(&checker, &response, UserField::Job, "zion resident")
                .unwrap()
        );
        assert_eq!(
            vec![(
                "Response body field 'job' same with 'zion resident'".to_string(),
                false
            )],
            checker.recorded()
        );
    }

    #[test]
    fn field_comparison_is_strict() {
        let checker = RecordingChecker::default();
        let response = response(200, None, r#"{"name":"Morpheus","job":1}"#);

        assert!(!assert_response_body_update(&checker, &response, UserField::Name, "morpheus").unwrap());
        assert!(!assert_response_body_update(&checker, &response, UserField::Job, "1").unwrap());
    }

    #[test]
    fn non_object_body_has_no_fields() {
        let checker = RecordingChecker::default();
        let response = response(200, None, r#"["morpheus"]"#);

        assert!(!assert_response_body_update(&checker, &response, UserField::Name, "morpheus").unwrap());
    }

    #[test]
    fn content_type_matches_by_prefix_ignoring_case() {
        let checker = RecordingChecker::default();
        let response = response(201, Some("Application/JSON; charset=utf-8"), "{}");

        assert!(assert_response_header(&checker, &response, &DEFAULT_HEADERS).unwrap());
    }

    #[test]
    fn other_headers_must_match_exactly() {
        let checker = RecordingChecker::default();
        let mut response = response(201, Some("application/json"), "{}");
        response
            .headers
            .insert("X-Powered-By".to_string(), "Express".to_string());

        assert!(assert_response_header(&checker, &response, &[("X-Powered-By", "Express")]).unwrap());
        assert!(!assert_response_header(&checker, &response, &[("X-Powered-By", "express")]).unwrap());
    }

    #[test]
    fn header_names_other_than_content_type_are_case_sensitive() {
        let checker = RecordingChecker::default();
        let mut response = response(201, Some("application/json"), "{}");
        response
            .headers
            .insert("X-Powered-By".to_string(), "Express".to_string());

        assert!(!assert_response_header(&checker, &response, &[("x-powered-by", "Express")]).unwrap());
        assert!(assert_response_header(&checker, &response, &[("content-type", "application/json")]).unwrap());
    }

    #[test]
    fn first_mismatching_header_is_reported() {
        let mut response = response(201, Some("text/html"), "{}");
        response
            .headers
            .insert("X-Powered-By".to_string(), "Express".to_string());

        let mismatch = first_header_mismatch(
            &response,
            &[
                ("X-Powered-By", "Express"),
                ("Content-Type", "application/json"),
                ("X-Request-Id", "abc"),
            ],
        )
        .unwrap_err();

        assert_eq!(
            HeaderMismatch {
                name: "Content-Type".to_string(),
                expected: "application/json".to_string(),
                actual: Some("text/html".to_string()),
            },
            mismatch
        );
        assert_eq!(
            "Expected header 'Content-Type: application/json', but found 'Content-Type: text/html'",
            mismatch.to_string()
        );
    }

    #[test]
    fn missing_header_is_reported_as_missing() {
        let response = response(201, Some("application/json"), "{}");

        let mismatch = first_header_mismatch(&response, &[("X-Request-Id", "abc")]).unwrap_err();

        assert_eq!(
            "Expected header 'X-Request-Id: abc', but found 'X-Request-Id: (missing)'",
            mismatch.to_string()
        );
    }

    #[test]
    fn missing_header_is_a_mismatch() {
        let checker = RecordingChecker::default();
        let response = response(201, None, "{}");

        assert!(!assert_response_header(&checker, &response, &DEFAULT_HEADERS).unwrap());
        assert_eq!(
            vec![("Headers Match Expected Values".to_string(), false)],
            checker.recorded()
        );
    }

    #[test]
    fn status_and_body_variant_skips_headers() {
        let checker = RecordingChecker::default();
        let response = response(200, None, r#"{"name":"morpheus","job":"zion resident"}"#);

        verify_updated_user_status_and_body(
            &checker,
            &response,
            &UserPayload::new("morpheus", "zion resident"),
        )
        .unwrap();

        let recorded = checker.recorded();
        assert_eq!(3, recorded.len());
        assert!(recorded.iter().all(|(_, passed)| *passed));
    }
}
