// src/api/parser.rs
//! Decoding of WordPress REST responses.
//!
//! Everything that turns bytes and headers into typed values or classified
//! errors lives here. Cache hits go through the same decoding as live
//! responses.

use super::client::ApiResponse;
use crate::constants::{ERROR_BODY_PREVIEW_LENGTH, TOTAL_ITEMS_HEADER, TOTAL_PAGES_HEADER};
use crate::error::{RemoteErrorCode, RequestError};
use crate::model::Page;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

/// Error body shape: `{code, message, data: {status}}`.
#[derive(Debug, Deserialize)]
struct RemoteErrorBody {
    code: String,
    #[serde(default)]
    message: String,
}

/// Parses a 2xx body. A missing, `null` or non-JSON body is a contract
/// violation by the remote and becomes `InvalidResponse`.
pub fn parse_success_body(endpoint: &str, body: &str) -> Result<Value, RequestError> {
    if body.trim().is_empty() {
        return Err(RequestError::InvalidResponse {
            endpoint: endpoint.to_string(),
            reason: "empty body".to_string(),
        });
    }

    let value: Value = serde_json::from_str(body).map_err(|e| {
        log::error!("Failed to parse response from {}: {}", endpoint, e);
        RequestError::InvalidResponse {
            endpoint: endpoint.to_string(),
            reason: format!("malformed JSON: {}", e),
        }
    })?;

    if value.is_null() {
        return Err(RequestError::InvalidResponse {
            endpoint: endpoint.to_string(),
            reason: "body is null".to_string(),
        });
    }

    Ok(value)
}

/// Classifies a non-2xx response.
///
/// Prefers the structured WordPress error body; falls back to
/// `HTTP_ERROR` with the status line when there is none.
pub fn parse_error_response(endpoint: &str, status: StatusCode, body: &str) -> RequestError {
    if let Ok(remote) = serde_json::from_str::<RemoteErrorBody>(body) {
        return RequestError::HttpStatus {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
            code: RemoteErrorCode::from_api_response(&remote.code),
            message: remote.message,
        };
    }

    if !body.trim().is_empty() {
        log::debug!(
            "Unstructured error body from {}: {}",
            endpoint,
            preview(body)
        );
    }

    RequestError::HttpStatus {
        endpoint: endpoint.to_string(),
        status: status.as_u16(),
        code: RemoteErrorCode::HttpError,
        message: format!(
            "{} {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("Unknown Status")
        ),
    }
}

/// Reads `X-WP-Total` and `X-WP-TotalPages`; unparseable values count as absent.
pub fn pagination_from_headers(headers: &HeaderMap) -> (Option<u64>, Option<u32>) {
    let read = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .map(str::to_string)
    };
    let total = read(TOTAL_ITEMS_HEADER).and_then(|v| v.parse().ok());
    let total_pages = read(TOTAL_PAGES_HEADER).and_then(|v| v.parse().ok());
    (total, total_pages)
}

/// Decodes a JSON value into a typed model.
pub fn decode<T: DeserializeOwned>(endpoint: &str, value: Value) -> Result<T, RequestError> {
    serde_json::from_value(value).map_err(|e| {
        log::error!("Unexpected response shape from {}: {}", endpoint, e);
        RequestError::InvalidResponse {
            endpoint: endpoint.to_string(),
            reason: format!("unexpected shape: {}", e),
        }
    })
}

/// Decodes a collection response into one page of results.
///
/// Missing pagination headers default to one page and zero items.
pub fn decode_page<T: DeserializeOwned>(
    endpoint: &str,
    response: ApiResponse,
    current_page: u32,
) -> Result<Page<T>, RequestError> {
    let items: Vec<T> = decode(endpoint, response.body)?;
    Ok(Page {
        items,
        total_pages: response.total_pages.unwrap_or(1),
        total_items: response.total.unwrap_or(0),
        current_page,
    })
}

fn preview(body: &str) -> &str {
    match body.char_indices().nth(ERROR_BODY_PREVIEW_LENGTH) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}
