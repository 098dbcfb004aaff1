//! Request plumbing shared by the platform clients.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{BookingClientError, BookingStep, Platform};

/// Longest response body kept in an error.
const BODY_SNIPPET_CHARS: usize = 500;

pub(crate) fn snippet(body: &str) -> String {
    body.chars().take(BODY_SNIPPET_CHARS).collect()
}

/// Build a header map, rejecting credentials that are not valid header values.
pub(crate) fn header_map(
    platform: Platform,
    headers: &[(&'static str, String)],
) -> Result<HeaderMap, BookingClientError> {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        let value = HeaderValue::from_str(value).map_err(|_| BookingClientError::NotConfigured {
            platform,
            message: format!("value for header '{}' contains invalid characters", name),
        })?;
        map.insert(HeaderName::from_static(name), value);
    }
    Ok(map)
}

/// Build a client that sends `headers` on every request.
pub(crate) fn build_client(
    platform: Platform,
    headers: HeaderMap,
    timeout: Duration,
) -> Result<Client, BookingClientError> {
    Client::builder()
        .default_headers(headers)
        .timeout(timeout)
        .cookie_store(true)
        .build()
        .map_err(|e| BookingClientError::NotConfigured {
            platform,
            message: format!("failed to create HTTP client: {}", e),
        })
}

/// Send a request and return the body of a 2xx response.
pub(crate) async fn send(
    platform: Platform,
    step: BookingStep,
    request: RequestBuilder,
) -> Result<String, BookingClientError> {
    let response = request
        .send()
        .await
        .map_err(|source| BookingClientError::Transport {
            platform,
            step,
            source,
        })?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|source| BookingClientError::Transport {
            platform,
            step,
            source,
        })?;

    debug!(%platform, %step, status = status.as_u16(), "platform response");

    if !status.is_success() {
        return Err(BookingClientError::Status {
            platform,
            step,
            status: status.as_u16(),
            body: snippet(&body),
        });
    }

    Ok(body)
}

/// Decode a response body, mapping schema mismatches to protocol errors.
pub(crate) fn decode<T: DeserializeOwned>(
    platform: Platform,
    step: BookingStep,
    body: &str,
) -> Result<T, BookingClientError> {
    serde_json::from_str(body).map_err(|e| BookingClientError::Protocol {
        platform,
        step,
        message: format!("failed to parse response: {} (body: {})", e, snippet(body)),
    })
}

pub(crate) fn missing(platform: Platform, step: BookingStep, field: &str) -> BookingClientError {
    BookingClientError::Protocol {
        platform,
        step,
        message: format!("response missing {}", field),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snippet_truncates_long_bodies() {
        let body = "x".repeat(2000);
        assert_eq!(snippet(&body).len(), BODY_SNIPPET_CHARS);
        assert_eq!(snippet("short"), "short");
    }

    #[test]
    fn test_header_map_rejects_control_characters() {
        let result = header_map(Platform::Resy, &[("x-resy-auth-token", "bad\ntoken".to_string())]);
        assert!(matches!(result, Err(BookingClientError::NotConfigured { .. })));
    }

    #[test]
    fn test_decode_reports_protocol_error() {
        let result: Result<serde_json::Value, _> =
            decode(Platform::OpenTable, BookingStep::Lock, "<html>blocked</html>");
        match result {
            Err(BookingClientError::Protocol { step, message, .. }) => {
                assert_eq!(step, BookingStep::Lock);
                assert!(message.contains("blocked"));
            }
            other => panic!("expected protocol error, got {:?}", other),
        }
    }
}
