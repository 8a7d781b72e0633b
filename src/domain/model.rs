use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// SNS 傳輸協定 (目前僅支援 email / sms)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Email,
    Sms,
}

impl Protocol {
    /// Protocol identifier understood by SNS.
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Email => "email",
            Protocol::Sms => "sms",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = EndpointError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "email" => Ok(Protocol::Email),
            "sms" => Ok(Protocol::Sms),
            other => Err(EndpointError::UnknownProtocol {
                endpoint_type: other.to_string(),
            }),
        }
    }
}

/// 要訂閱的端點。`type` 保留原始字串，未知類型在 fan-out 時逐一回報
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    #[serde(rename = "type")]
    pub endpoint_type: String,
    pub value: String,
}

impl Endpoint {
    pub fn new(endpoint_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            endpoint_type: endpoint_type.into(),
            value: value.into(),
        }
    }

    pub fn email(address: impl Into<String>) -> Self {
        Self::new("email", address)
    }

    pub fn sms(phone_number: impl Into<String>) -> Self {
        Self::new("sms", phone_number)
    }

    pub fn protocol(&self) -> std::result::Result<Protocol, EndpointError> {
        self.endpoint_type.parse()
    }

    /// 解析請求中的單一端點項目；格式錯誤只影響該位置，不會讓整個請求失敗
    pub fn from_value(value: &serde_json::Value) -> std::result::Result<Self, EndpointError> {
        serde_json::from_value(value.clone()).map_err(|e| EndpointError::InvalidEndpoint {
            reason: e.to_string(),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionRequest {
    #[serde(default)]
    pub topic_arn: Option<String>,
    /// Raw entries; each is parsed into an [`Endpoint`] on its own.
    #[serde(default)]
    pub endpoints: Option<Vec<serde_json::Value>>,
}

/// Parameters of a single SNS `Subscribe` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscribeInput {
    pub protocol: Protocol,
    pub topic_arn: String,
    pub endpoint: String,
    pub return_subscription_arn: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeOutput {
    /// `pending confirmation` until the endpoint confirms, unless
    /// `return_subscription_arn` was requested.
    pub subscription_arn: Option<String>,
}

/// 單一端點的失敗原因
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum EndpointError {
    #[error("Unknown endpoint type '{endpoint_type}', expected one of: email, sms")]
    #[serde(rename_all = "camelCase")]
    UnknownProtocol { endpoint_type: String },

    #[error("Malformed endpoint: {reason}")]
    InvalidEndpoint { reason: String },

    #[error("Subscribe rejected by service: {message}")]
    Service {
        code: Option<String>,
        message: String,
    },

    #[error("Subscribe did not complete before the invocation deadline")]
    Incomplete,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum EndpointOutcome {
    #[serde(rename_all = "camelCase")]
    Subscribed { subscription_arn: Option<String> },
    Failed { error: EndpointError },
}

impl EndpointOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, EndpointOutcome::Subscribed { .. })
    }

    pub fn error(&self) -> Option<&EndpointError> {
        match self {
            EndpointOutcome::Subscribed { .. } => None,
            EndpointOutcome::Failed { error } => Some(error),
        }
    }
}

impl From<std::result::Result<SubscribeOutput, EndpointError>> for EndpointOutcome {
    fn from(result: std::result::Result<SubscribeOutput, EndpointError>) -> Self {
        match result {
            Ok(output) => EndpointOutcome::Subscribed {
                subscription_arn: output.subscription_arn,
            },
            Err(error) => EndpointOutcome::Failed { error },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum AggregateStatus {
    Succeeded,
    PartiallyFailed,
    Failed,
}

impl AggregateStatus {
    /// 全部成功 (含空集合) 為 Succeeded，全部失敗為 Failed，其餘 PartiallyFailed
    pub fn from_outcomes(outcomes: &[EndpointOutcome]) -> Self {
        let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
        if succeeded == outcomes.len() {
            AggregateStatus::Succeeded
        } else if succeeded == 0 {
            AggregateStatus::Failed
        } else {
            AggregateStatus::PartiallyFailed
        }
    }
}

/// Outcomes line up positionally with the endpoints of the request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionResult {
    pub per_endpoint_outcome: Vec<EndpointOutcome>,
    pub aggregate_status: AggregateStatus,
}

impl SubscriptionResult {
    pub fn from_outcomes(outcomes: Vec<EndpointOutcome>) -> Self {
        let aggregate_status = AggregateStatus::from_outcomes(&outcomes);
        Self {
            per_endpoint_outcome: outcomes,
            aggregate_status,
        }
    }

    pub fn failed_count(&self) -> usize {
        self.per_endpoint_outcome
            .iter()
            .filter(|o| !o.is_success())
            .count()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTopicRequest {
    #[serde(default)]
    pub topic_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTopicInput {
    pub name: String,
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTopicOutput {
    pub topic_arn: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishRequest {
    #[serde(default)]
    pub topic_arn: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub sender_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishInput {
    pub topic_arn: String,
    pub message: String,
    pub subject: Option<String>,
    pub sender_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishOutput {
    pub message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence_number: Option<String>,
}
