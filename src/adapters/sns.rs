use crate::core::{
    CreateTopicInput, CreateTopicOutput, NotificationService, PublishInput, PublishOutput,
    SubscribeInput, SubscribeOutput,
};
use crate::utils::error::{Result, SnsApiError};
use aws_config::BehaviorVersion;
use aws_sdk_sns::config::Region;
use aws_sdk_sns::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_sns::types::MessageAttributeValue;
use aws_sdk_sns::Client as SnsClient;

/// Message attribute SNS reads the SMS sender ID from.
pub const SENDER_ID_ATTRIBUTE: &str = "AWS.SNS.SMS.SenderID";

#[derive(Debug, Clone)]
pub struct SnsNotificationService {
    client: SnsClient,
}

impl SnsNotificationService {
    pub fn new(client: SnsClient) -> Self {
        Self { client }
    }

    /// 使用預設的 AWS 憑證鏈建立 client，`endpoint_url` 可指向 LocalStack 等替代端點
    pub async fn from_env(region: &str, endpoint_url: Option<&str>) -> Self {
        let shared_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .load()
            .await;

        let mut builder = aws_sdk_sns::config::Builder::from(&shared_config);
        if let Some(url) = endpoint_url {
            tracing::debug!(endpoint_url = url, "Using custom SNS endpoint");
            builder = builder.endpoint_url(url);
        }

        Self::new(SnsClient::from_conf(builder.build()))
    }
}

#[async_trait::async_trait]
impl NotificationService for SnsNotificationService {
    async fn create_topic(&self, input: CreateTopicInput) -> Result<CreateTopicOutput> {
        let output = self
            .client
            .create_topic()
            .name(&input.name)
            .attributes("DisplayName", &input.display_name)
            .send()
            .await
            .map_err(|e| service_error("CreateTopic", e))?;

        Ok(CreateTopicOutput {
            topic_arn: output.topic_arn().map(str::to_string),
        })
    }

    async fn subscribe(&self, input: SubscribeInput) -> Result<SubscribeOutput> {
        let output = self
            .client
            .subscribe()
            .protocol(input.protocol.as_str())
            .topic_arn(&input.topic_arn)
            .endpoint(&input.endpoint)
            .return_subscription_arn(input.return_subscription_arn)
            .send()
            .await
            .map_err(|e| service_error("Subscribe", e))?;

        Ok(SubscribeOutput {
            subscription_arn: output.subscription_arn().map(str::to_string),
        })
    }

    async fn publish(&self, input: PublishInput) -> Result<PublishOutput> {
        let mut request = self
            .client
            .publish()
            .topic_arn(&input.topic_arn)
            .message(&input.message)
            .set_subject(input.subject.clone());

        if let Some(sender_id) = &input.sender_id {
            let attribute = MessageAttributeValue::builder()
                .data_type("String")
                .string_value(sender_id)
                .build()
                .map_err(|e| SnsApiError::ValidationError {
                    message: format!("Invalid sender ID attribute: {}", e),
                })?;
            request = request.message_attributes(SENDER_ID_ATTRIBUTE, attribute);
        }

        let output = request
            .send()
            .await
            .map_err(|e| service_error("Publish", e))?;

        Ok(PublishOutput {
            message_id: output.message_id().map(str::to_string),
            sequence_number: output.sequence_number().map(str::to_string),
        })
    }
}

/// 保留 SNS 回傳的錯誤代碼與訊息，不做任何轉譯
fn service_error<E, R>(operation: &str, err: SdkError<E, R>) -> SnsApiError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    let code = err.code().map(str::to_string);
    let message = err
        .message()
        .map(str::to_string)
        .unwrap_or_else(|| DisplayErrorContext(&err).to_string());

    SnsApiError::ServiceError {
        operation: operation.to_string(),
        code,
        message,
    }
}
