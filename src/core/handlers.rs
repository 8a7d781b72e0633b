use crate::core::envelope::{ApiRequest, ApiResponse};
use crate::core::fanout::FanoutCoordinator;
use crate::core::{
    AggregateStatus, CreateTopicInput, CreateTopicRequest, EndpointOutcome, NotificationService,
    PublishInput, PublishOutput, PublishRequest, SubscriptionRequest,
};
use crate::utils::error::{Result, SnsApiError};
use crate::utils::validation::validate_topic_name;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use tokio::time::Instant;

/// SMS sender IDs are at most 11 characters.
const SENDER_ID_MAX_LEN: usize = 11;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerKind {
    Hello,
    CreateTopic,
    Subscribe,
    Publish,
}

impl HandlerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            HandlerKind::Hello => "hello",
            HandlerKind::CreateTopic => "create-topic",
            HandlerKind::Subscribe => "subscribe",
            HandlerKind::Publish => "publish",
        }
    }
}

impl fmt::Display for HandlerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HandlerKind {
    type Err = SnsApiError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "hello" => Ok(HandlerKind::Hello),
            "create-topic" | "createTopic" => Ok(HandlerKind::CreateTopic),
            "subscribe" | "subscribeToTopic" => Ok(HandlerKind::Subscribe),
            "publish" | "publishMessage" => Ok(HandlerKind::Publish),
            other => Err(SnsApiError::InvalidConfigValueError {
                field: "handler".to_string(),
                value: other.to_string(),
                reason: "Expected one of: hello, create-topic, subscribe, publish".to_string(),
            }),
        }
    }
}

#[derive(Serialize)]
struct HelloBody<'a> {
    message: &'static str,
    input: &'a ApiRequest,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateTopicBody {
    message: String,
    topic_arn: Option<String>,
}

#[derive(Serialize)]
struct SubscribeBody {
    message: String,
    status: AggregateStatus,
    responses: Vec<EndpointOutcome>,
}

#[derive(Serialize)]
struct PublishBody {
    message: &'static str,
    res: PublishOutput,
}

/// The request handlers, bound to one notification service.
pub struct SnsApi<N: NotificationService> {
    service: N,
}

impl<N: NotificationService> SnsApi<N> {
    pub fn new(service: N) -> Self {
        Self { service }
    }

    pub fn service(&self) -> &N {
        &self.service
    }

    /// 依 handler 種類分派事件
    pub async fn handle(
        &self,
        kind: HandlerKind,
        event: &ApiRequest,
        deadline: Option<Instant>,
    ) -> ApiResponse {
        tracing::debug!(handler = %kind, "Handling event");
        match kind {
            HandlerKind::Hello => self.hello(event).await,
            HandlerKind::CreateTopic => self.create_topic(event).await,
            HandlerKind::Subscribe => self.subscribe_to_topic(event, deadline).await,
            HandlerKind::Publish => self.publish_message(event).await,
        }
    }

    pub async fn hello(&self, event: &ApiRequest) -> ApiResponse {
        tracing::info!(event = ?event, "Received hello event");
        ApiResponse::ok(&HelloBody {
            message: "Hello from sns-api!",
            input: event,
        })
    }

    pub async fn create_topic(&self, event: &ApiRequest) -> ApiResponse {
        match self.try_create_topic(event).await {
            Ok(body) => ApiResponse::ok(&body),
            Err(e) => {
                tracing::error!(error = %e, "❌ Could not create topic");
                ApiResponse::error("Could not create topic.", &e)
            }
        }
    }

    async fn try_create_topic(&self, event: &ApiRequest) -> Result<CreateTopicBody> {
        let request: CreateTopicRequest = event.json_body()?;
        let topic_name = request
            .topic_name
            .ok_or_else(|| SnsApiError::missing_field("topicName"))?;
        validate_topic_name(&topic_name)?;

        // DisplayName 會出現在 email 訊息的寄件者名稱
        let output = self
            .service
            .create_topic(CreateTopicInput {
                name: topic_name.clone(),
                display_name: topic_name.clone(),
            })
            .await?;

        tracing::info!(topic_name = %topic_name, topic_arn = ?output.topic_arn, "✅ Topic created");
        Ok(CreateTopicBody {
            message: format!(
                "Successfully created topic with the following name, {}",
                topic_name
            ),
            topic_arn: output.topic_arn,
        })
    }

    pub async fn subscribe_to_topic(
        &self,
        event: &ApiRequest,
        deadline: Option<Instant>,
    ) -> ApiResponse {
        match self.try_subscribe_to_topic(event, deadline).await {
            Ok(body) => ApiResponse::ok(&body),
            Err(e) => {
                tracing::error!(error = %e, "❌ Subscription request rejected");
                ApiResponse::error("Subscription was unsuccessful.", &e)
            }
        }
    }

    async fn try_subscribe_to_topic(
        &self,
        event: &ApiRequest,
        deadline: Option<Instant>,
    ) -> Result<SubscribeBody> {
        let request: SubscriptionRequest = event.json_body()?;
        let topic_arn = required_string(request.topic_arn, "topicArn")?;
        let endpoints = request
            .endpoints
            .ok_or_else(|| SnsApiError::missing_field("endpoints"))?;

        let result = FanoutCoordinator::new(&self.service)
            .with_deadline(deadline)
            .subscribe_raw(&topic_arn, &endpoints)
            .await;

        let total = result.per_endpoint_outcome.len();
        let message = match result.aggregate_status {
            AggregateStatus::Succeeded => "Successfully subscribed endpoints!".to_string(),
            AggregateStatus::PartiallyFailed => format!(
                "Subscribed {} of {} endpoints.",
                total - result.failed_count(),
                total
            ),
            AggregateStatus::Failed => "No endpoints could be subscribed.".to_string(),
        };

        Ok(SubscribeBody {
            message,
            status: result.aggregate_status,
            responses: result.per_endpoint_outcome,
        })
    }

    pub async fn publish_message(&self, event: &ApiRequest) -> ApiResponse {
        match self.try_publish_message(event).await {
            Ok(body) => ApiResponse::ok(&body),
            Err(e) => {
                tracing::error!(error = %e, "❌ Could not publish message");
                ApiResponse::error("Could not publish message.", &e)
            }
        }
    }

    async fn try_publish_message(&self, event: &ApiRequest) -> Result<PublishBody> {
        let request: PublishRequest = event.json_body()?;
        let topic_arn = required_string(request.topic_arn, "topicArn")?;
        let message = required_string(request.message, "message")?;
        let sender_id = request.sender_id.as_deref().and_then(normalize_sender_id);

        tracing::debug!(
            topic_arn = %topic_arn,
            has_subject = request.subject.is_some(),
            sender_id = ?sender_id,
            "Publishing message"
        );
        let res = self
            .service
            .publish(PublishInput {
                topic_arn,
                message,
                subject: request.subject,
                sender_id,
            })
            .await?;

        tracing::info!(message_id = ?res.message_id, "✅ Message published");
        Ok(PublishBody {
            message: "Successfully sent message to topic!",
            res,
        })
    }
}

fn required_string(value: Option<String>, field: &str) -> Result<String> {
    let value = value.ok_or_else(|| SnsApiError::missing_field(field))?;
    if value.trim().is_empty() {
        return Err(SnsApiError::ValidationError {
            message: format!("{} cannot be empty", field),
        });
    }
    Ok(value)
}

/// Sender IDs: first 11 characters, spaces dropped, uppercased.
/// `None` when nothing is left.
pub fn normalize_sender_id(raw: &str) -> Option<String> {
    let normalized: String = raw
        .chars()
        .take(SENDER_ID_MAX_LEN)
        .filter(|c| *c != ' ')
        .collect::<String>()
        .to_uppercase();
    (!normalized.is_empty()).then_some(normalized)
}
