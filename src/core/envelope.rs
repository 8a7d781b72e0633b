use crate::utils::error::{ErrorDetail, Result, SnsApiError};
use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// API Gateway 觸發的事件。只解析 `body`，其餘欄位原樣保留 (hello 會回傳整個事件)
///
/// `body` 以原始 JSON 值接收，不是字串時由 handler 回傳 500 envelope
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiRequest {
    #[serde(default)]
    pub body: Option<Value>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ApiRequest {
    pub fn with_body(body: impl Into<String>) -> Self {
        Self {
            body: Some(Value::String(body.into())),
            extra: serde_json::Map::new(),
        }
    }

    /// Parses the JSON-encoded string body into `T`.
    pub fn json_body<T: DeserializeOwned>(&self) -> Result<T> {
        match &self.body {
            None | Some(Value::Null) => Err(SnsApiError::missing_field("body")),
            Some(Value::String(body)) => Ok(serde_json::from_str(body)?),
            Some(other) => Err(SnsApiError::InvalidBody(serde_json::Error::custom(format!(
                "expected a JSON-encoded string body, got {}",
                value_kind(other)
            )))),
        }
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// HTTP-style result returned to the trigger: `{ statusCode, body }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    pub status_code: u16,
    pub body: String,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    message: &'a str,
    err: ErrorDetail,
}

impl ApiResponse {
    pub fn ok<T: Serialize>(body: &T) -> Self {
        match serde_json::to_string_pretty(body) {
            Ok(body) => Self {
                status_code: 200,
                body,
            },
            Err(e) => Self::error("Could not serialize response.", &SnsApiError::from(e)),
        }
    }

    pub fn error(message: &str, err: &SnsApiError) -> Self {
        let payload = ErrorBody {
            message,
            err: ErrorDetail::from(err),
        };
        let body = serde_json::to_string_pretty(&payload)
            .unwrap_or_else(|_| format!("{{\n  \"message\": {:?}\n}}", message));
        Self {
            status_code: 500,
            body,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    pub fn json_body(&self) -> Result<serde_json::Value> {
        Ok(serde_json::from_str(&self.body)?)
    }
}
