use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SnsApiError {
    #[error("Invalid request body: {0}")]
    InvalidBody(#[from] serde_json::Error),

    #[error("Request is missing required field: {field}")]
    MissingField { field: String },

    #[error("Request validation error: {message}")]
    ValidationError { message: String },

    #[error("{operation} failed: {message}")]
    ServiceError {
        operation: String,
        code: Option<String>,
        message: String,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid configuration value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },
}

impl SnsApiError {
    /// 錯誤類別標籤，回應中的 `err.type` 使用
    pub fn kind(&self) -> &'static str {
        match self {
            SnsApiError::InvalidBody(_) => "InvalidBody",
            SnsApiError::MissingField { .. } => "MissingField",
            SnsApiError::ValidationError { .. } => "ValidationError",
            SnsApiError::ServiceError { .. } => "ServiceError",
            SnsApiError::IoError(_) => "IoError",
            SnsApiError::MissingConfigError { .. }
            | SnsApiError::InvalidConfigValueError { .. }
            | SnsApiError::ConfigValidationError { .. } => "ConfigError",
        }
    }

    /// Upstream service error code, when the failure came from SNS.
    pub fn code(&self) -> Option<&str> {
        match self {
            SnsApiError::ServiceError { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    pub fn missing_field(field: &str) -> Self {
        SnsApiError::MissingField {
            field: field.to_string(),
        }
    }
}

/// Serialized form of a request-level error, embedded as `err` in 500 bodies.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorDetail {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub message: String,
}

impl From<&SnsApiError> for ErrorDetail {
    fn from(err: &SnsApiError) -> Self {
        Self {
            kind: err.kind().to_string(),
            code: err.code().map(str::to_string),
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SnsApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_body_from_serde() {
        let err: SnsApiError = serde_json::from_str::<serde_json::Value>("{not json")
            .unwrap_err()
            .into();
        assert_eq!(err.kind(), "InvalidBody");
        assert!(err.to_string().starts_with("Invalid request body"));
    }

    #[test]
    fn test_error_detail_keeps_service_code() {
        let err = SnsApiError::ServiceError {
            operation: "CreateTopic".to_string(),
            code: Some("AuthorizationError".to_string()),
            message: "not authorized".to_string(),
        };
        let detail = ErrorDetail::from(&err);

        assert_eq!(detail.kind, "ServiceError");
        assert_eq!(detail.code.as_deref(), Some("AuthorizationError"));
        assert_eq!(detail.message, "CreateTopic failed: not authorized");

        let json = serde_json::to_value(&detail).unwrap();
        assert_eq!(json["type"], "ServiceError");
    }

    #[test]
    fn test_error_detail_omits_missing_code() {
        let detail = ErrorDetail::from(&SnsApiError::missing_field("topicArn"));
        let json = serde_json::to_value(&detail).unwrap();
        assert!(json.get("code").is_none());
        assert_eq!(json["message"], "Request is missing required field: topicArn");
    }
}
