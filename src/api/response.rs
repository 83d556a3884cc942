use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{extract_error_message, ApiError};

/// Read a response, turning non-OK statuses into `ApiError` and unwrapping
/// the `{"success": true, "data": ...}` envelope when present.
pub async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(ApiError::from_status(status, &body));
    }

    decode_body(status, &body)
}

/// Decode a successful body. Empty bodies (204 and friends) decode as `null`,
/// so `()` and `Option<_>` targets work without special casing.
pub fn decode_body<T: DeserializeOwned>(status: StatusCode, body: &str) -> Result<T, ApiError> {
    let value: Value = if body.trim().is_empty() {
        Value::Null
    } else {
        serde_json::from_str(body)?
    };

    let payload = unwrap_envelope(status, value)?;
    serde_json::from_value(payload).map_err(ApiError::from)
}

fn unwrap_envelope(status: StatusCode, value: Value) -> Result<Value, ApiError> {
    match value {
        Value::Object(mut map) if map.get("success").is_some_and(Value::is_boolean) => {
            if map.get("success") == Some(&Value::Bool(false)) {
                // Some handlers report failures with a 200
                let message = extract_error_message(&Value::Object(map).to_string())
                    .unwrap_or_else(|| "Request failed".to_string());
                return Err(ApiError::Http { status: status.as_u16(), message });
            }
            Ok(map.remove("data").unwrap_or(Value::Null))
        }
        other => Ok(other),
    }
}
