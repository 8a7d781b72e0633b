pub mod envelope;
pub mod fanout;
pub mod handlers;

pub use crate::domain::model::{
    AggregateStatus, CreateTopicInput, CreateTopicOutput, CreateTopicRequest, Endpoint,
    EndpointError, EndpointOutcome, Protocol, PublishInput, PublishOutput, PublishRequest,
    SubscribeInput, SubscribeOutput, SubscriptionRequest, SubscriptionResult,
};
pub use crate::domain::ports::NotificationService;
pub use crate::utils::error::Result;
