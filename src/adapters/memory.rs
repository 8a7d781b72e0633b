use crate::core::{
    CreateTopicInput, CreateTopicOutput, NotificationService, Protocol, PublishInput,
    PublishOutput, SubscribeInput, SubscribeOutput,
};
use crate::utils::error::{Result, SnsApiError};
use std::collections::BTreeMap;
use tokio::sync::Mutex;

const LOCAL_ACCOUNT_ID: &str = "000000000000";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionRecord {
    pub topic_arn: String,
    pub protocol: Protocol,
    pub endpoint: String,
    pub subscription_arn: String,
}

#[derive(Debug, Default)]
struct State {
    // topic name -> topic arn
    topics: BTreeMap<String, String>,
    subscriptions: Vec<SubscriptionRecord>,
    published: Vec<PublishInput>,
    next_id: u64,
}

impl State {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn has_topic(&self, topic_arn: &str) -> bool {
        self.topics.values().any(|arn| arn == topic_arn)
    }
}

/// Local stand-in for SNS used by dry runs. Nothing is delivered; topics,
/// subscriptions and published messages are only recorded in memory.
#[derive(Debug)]
pub struct InMemoryNotificationService {
    region: String,
    require_existing_topics: bool,
    state: Mutex<State>,
}

impl InMemoryNotificationService {
    pub fn new(region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            require_existing_topics: true,
            state: Mutex::new(State::default()),
        }
    }

    /// Accept subscribe/publish calls for topics this instance never created.
    /// A one-shot dry run has no earlier create-topic call to rely on.
    pub fn accept_unknown_topics(mut self) -> Self {
        self.require_existing_topics = false;
        self
    }

    pub fn topic_arn(&self, topic_name: &str) -> String {
        format!("arn:aws:sns:{}:{}:{}", self.region, LOCAL_ACCOUNT_ID, topic_name)
    }

    pub async fn subscriptions(&self) -> Vec<SubscriptionRecord> {
        self.state.lock().await.subscriptions.clone()
    }

    pub async fn published(&self) -> Vec<PublishInput> {
        self.state.lock().await.published.clone()
    }

    fn not_found(operation: &str, topic_arn: &str) -> SnsApiError {
        SnsApiError::ServiceError {
            operation: operation.to_string(),
            code: Some("NotFound".to_string()),
            message: format!("Topic does not exist: {}", topic_arn),
        }
    }
}

#[async_trait::async_trait]
impl NotificationService for InMemoryNotificationService {
    async fn create_topic(&self, input: CreateTopicInput) -> Result<CreateTopicOutput> {
        let topic_arn = self.topic_arn(&input.name);
        let mut state = self.state.lock().await;
        // 與 SNS 相同：重複建立同名主題回傳既有 ARN
        let arn = state
            .topics
            .entry(input.name)
            .or_insert(topic_arn)
            .clone();

        Ok(CreateTopicOutput {
            topic_arn: Some(arn),
        })
    }

    async fn subscribe(&self, input: SubscribeInput) -> Result<SubscribeOutput> {
        let mut state = self.state.lock().await;
        if self.require_existing_topics && !state.has_topic(&input.topic_arn) {
            return Err(Self::not_found("Subscribe", &input.topic_arn));
        }

        let id = state.next_id();
        let subscription_arn = format!("{}:{:08x}", input.topic_arn, id);
        state.subscriptions.push(SubscriptionRecord {
            topic_arn: input.topic_arn,
            protocol: input.protocol,
            endpoint: input.endpoint,
            subscription_arn: subscription_arn.clone(),
        });

        // email 需要收件者確認，sms 立即生效
        let returned = match input.protocol {
            Protocol::Email if !input.return_subscription_arn => "pending confirmation".to_string(),
            _ => subscription_arn,
        };
        Ok(SubscribeOutput {
            subscription_arn: Some(returned),
        })
    }

    async fn publish(&self, input: PublishInput) -> Result<PublishOutput> {
        let mut state = self.state.lock().await;
        if self.require_existing_topics && !state.has_topic(&input.topic_arn) {
            return Err(Self::not_found("Publish", &input.topic_arn));
        }

        let id = state.next_id();
        let sequence_number = input
            .topic_arn
            .ends_with(".fifo")
            .then(|| format!("{:020}", id));
        state.published.push(input);

        Ok(PublishOutput {
            message_id: Some(format!("00000000-0000-0000-0000-{:012x}", id)),
            sequence_number,
        })
    }
}
