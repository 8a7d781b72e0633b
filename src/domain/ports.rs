use crate::domain::model::{
    CreateTopicInput, CreateTopicOutput, PublishInput, PublishOutput, SubscribeInput,
    SubscribeOutput,
};
use crate::utils::error::Result;
use async_trait::async_trait;

/// 外部通知服務 (SNS) 的抽象介面。實作必須可被多個並行呼叫共用
#[async_trait]
pub trait NotificationService: Send + Sync {
    async fn create_topic(&self, input: CreateTopicInput) -> Result<CreateTopicOutput>;
    async fn subscribe(&self, input: SubscribeInput) -> Result<SubscribeOutput>;
    async fn publish(&self, input: PublishInput) -> Result<PublishOutput>;
}
