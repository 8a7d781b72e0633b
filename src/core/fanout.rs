use crate::core::{
    Endpoint, EndpointError, EndpointOutcome, NotificationService, SubscribeInput,
    SubscriptionResult,
};
use crate::utils::error::SnsApiError;
use futures::future::join_all;
use tokio::time::Instant;

/// Subscribes a list of endpoints to one topic concurrently.
///
/// Every subscribe call is dispatched before any of them is awaited, and the
/// outcome of endpoint `i` always lands in slot `i` of the result no matter
/// which call finishes first. A failing endpoint never aborts its siblings.
pub struct FanoutCoordinator<'a, N: NotificationService + ?Sized> {
    service: &'a N,
    deadline: Option<Instant>,
}

impl<'a, N: NotificationService + ?Sized> FanoutCoordinator<'a, N> {
    pub fn new(service: &'a N) -> Self {
        Self {
            service,
            deadline: None,
        }
    }

    /// Calls still pending at `deadline` are abandoned and reported as
    /// [`EndpointError::Incomplete`].
    pub fn with_deadline(mut self, deadline: Option<Instant>) -> Self {
        self.deadline = deadline;
        self
    }

    pub async fn subscribe_all(&self, topic_arn: &str, endpoints: &[Endpoint]) -> SubscriptionResult {
        let entries = endpoints.iter().cloned().map(Ok).collect();
        self.fan_out(topic_arn, entries).await
    }

    /// Same as [`subscribe_all`](Self::subscribe_all) for endpoints still in
    /// their JSON form. An entry that is not a well-formed endpoint fails in
    /// its own slot and the remaining entries are dispatched as usual.
    pub async fn subscribe_raw(&self, topic_arn: &str, entries: &[serde_json::Value]) -> SubscriptionResult {
        let entries = entries.iter().map(Endpoint::from_value).collect();
        self.fan_out(topic_arn, entries).await
    }

    async fn fan_out(
        &self,
        topic_arn: &str,
        entries: Vec<std::result::Result<Endpoint, EndpointError>>,
    ) -> SubscriptionResult {
        tracing::info!(
            topic_arn,
            endpoints = entries.len(),
            "Fanning out subscribe requests"
        );

        let dispatches: Vec<_> = entries
            .iter()
            .enumerate()
            .map(|(index, entry)| self.subscribe_one(index, topic_arn, entry))
            .collect();
        let outcomes = join_all(dispatches).await;

        let result = SubscriptionResult::from_outcomes(outcomes);
        tracing::info!(
            status = ?result.aggregate_status,
            failed = result.failed_count(),
            total = result.per_endpoint_outcome.len(),
            "Subscribe fan-out finished"
        );
        result
    }

    async fn subscribe_one(
        &self,
        index: usize,
        topic_arn: &str,
        entry: &std::result::Result<Endpoint, EndpointError>,
    ) -> EndpointOutcome {
        // 格式錯誤或未知類型在本地就拒絕，不送到 SNS
        let (endpoint, protocol) = match entry.clone().and_then(|e| e.protocol().map(|p| (e, p))) {
            Ok(parsed) => parsed,
            Err(error) => {
                tracing::warn!(index, "Skipping endpoint: {}", error);
                return EndpointOutcome::Failed { error };
            }
        };

        let input = SubscribeInput {
            protocol,
            topic_arn: topic_arn.to_string(),
            endpoint: endpoint.value,
            return_subscription_arn: false,
        };

        tracing::debug!(index, %protocol, "Dispatching subscribe request");
        let call = self.service.subscribe(input);

        let result = match self.deadline {
            Some(deadline) => match tokio::time::timeout_at(deadline, call).await {
                Ok(result) => result.map_err(into_endpoint_error),
                Err(_) => Err(EndpointError::Incomplete),
            },
            None => call.await.map_err(into_endpoint_error),
        };

        if let Err(error) = &result {
            tracing::warn!(index, %protocol, "Subscribe failed: {}", error);
        }
        result.into()
    }
}

fn into_endpoint_error(err: SnsApiError) -> EndpointError {
    match err {
        SnsApiError::ServiceError { code, message, .. } => EndpointError::Service { code, message },
        other => EndpointError::Service {
            code: None,
            message: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{
        AggregateStatus, CreateTopicInput, CreateTopicOutput, PublishInput, PublishOutput,
        Protocol, SubscribeOutput,
    };
    use crate::utils::error::Result;
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::{Barrier, Mutex};

    /// Mock service: 依端點值設定延遲或失敗，並記錄所有呼叫
    #[derive(Default)]
    struct MockService {
        calls: Arc<Mutex<Vec<SubscribeInput>>>,
        completions: Arc<Mutex<Vec<String>>>,
        delays: HashMap<String, Duration>,
        failures: HashMap<String, String>,
        barrier: Option<Arc<Barrier>>,
    }

    impl MockService {
        fn with_delay(mut self, endpoint: &str, delay: Duration) -> Self {
            self.delays.insert(endpoint.to_string(), delay);
            self
        }

        fn with_failure(mut self, endpoint: &str, message: &str) -> Self {
            self.failures.insert(endpoint.to_string(), message.to_string());
            self
        }

        fn with_barrier(mut self, parties: usize) -> Self {
            self.barrier = Some(Arc::new(Barrier::new(parties)));
            self
        }
    }

    #[async_trait::async_trait]
    impl NotificationService for MockService {
        async fn create_topic(&self, _input: CreateTopicInput) -> Result<CreateTopicOutput> {
            unimplemented!("not used by the fan-out")
        }

        async fn subscribe(&self, input: SubscribeInput) -> Result<SubscribeOutput> {
            let endpoint = input.endpoint.clone();
            self.calls.lock().await.push(input);

            if let Some(barrier) = &self.barrier {
                barrier.wait().await;
            }
            if let Some(delay) = self.delays.get(&endpoint) {
                tokio::time::sleep(*delay).await;
            }
            self.completions.lock().await.push(endpoint.clone());

            if let Some(message) = self.failures.get(&endpoint) {
                return Err(SnsApiError::ServiceError {
                    operation: "Subscribe".to_string(),
                    code: Some("InvalidParameter".to_string()),
                    message: message.clone(),
                });
            }
            Ok(SubscribeOutput {
                subscription_arn: Some(format!("arn:test:{}", endpoint)),
            })
        }

        async fn publish(&self, _input: PublishInput) -> Result<PublishOutput> {
            unimplemented!("not used by the fan-out")
        }
    }

    const TOPIC: &str = "arn:aws:sns:us-east-1:123456789012:alerts";

    #[tokio::test]
    async fn test_empty_endpoints_succeed() {
        let service = MockService::default();
        let result = FanoutCoordinator::new(&service).subscribe_all(TOPIC, &[]).await;

        assert!(result.per_endpoint_outcome.is_empty());
        assert_eq!(result.aggregate_status, AggregateStatus::Succeeded);
        assert!(service.calls.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_email_and_sms_both_succeed() {
        let service = MockService::default();
        let endpoints = vec![Endpoint::email("a@x.com"), Endpoint::sms("+15551234567")];

        let result = FanoutCoordinator::new(&service)
            .subscribe_all(TOPIC, &endpoints)
            .await;

        assert_eq!(result.aggregate_status, AggregateStatus::Succeeded);
        assert_eq!(
            result.per_endpoint_outcome,
            vec![
                EndpointOutcome::Subscribed {
                    subscription_arn: Some("arn:test:a@x.com".to_string())
                },
                EndpointOutcome::Subscribed {
                    subscription_arn: Some("arn:test:+15551234567".to_string())
                },
            ]
        );

        let calls = service.calls.lock().await;
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].protocol, Protocol::Email);
        assert_eq!(calls[1].protocol, Protocol::Sms);
        assert!(calls.iter().all(|c| c.topic_arn == TOPIC));
        assert!(calls.iter().all(|c| !c.return_subscription_arn));
    }

    #[tokio::test]
    async fn test_unknown_type_is_per_endpoint_error() {
        let service = MockService::default();
        let endpoints = vec![Endpoint::new("unknown", "x")];

        let result = FanoutCoordinator::new(&service)
            .subscribe_all(TOPIC, &endpoints)
            .await;

        assert_eq!(result.aggregate_status, AggregateStatus::Failed);
        assert_eq!(
            result.per_endpoint_outcome[0].error(),
            Some(&EndpointError::UnknownProtocol {
                endpoint_type: "unknown".to_string()
            })
        );
        // never dispatched
        assert!(service.calls.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_mixed_outcomes_partially_fail() {
        let service = MockService::default().with_failure("bad@x.com", "Invalid parameter: Email");
        let endpoints = vec![
            Endpoint::email("good@x.com"),
            Endpoint::email("bad@x.com"),
            Endpoint::new("fax", "555"),
            Endpoint::sms("+15551234567"),
        ];

        let result = FanoutCoordinator::new(&service)
            .subscribe_all(TOPIC, &endpoints)
            .await;

        assert_eq!(result.aggregate_status, AggregateStatus::PartiallyFailed);
        assert_eq!(result.per_endpoint_outcome.len(), endpoints.len());
        assert!(result.per_endpoint_outcome[0].is_success());
        assert_eq!(
            result.per_endpoint_outcome[1].error(),
            Some(&EndpointError::Service {
                code: Some("InvalidParameter".to_string()),
                message: "Invalid parameter: Email".to_string(),
            })
        );
        assert!(matches!(
            result.per_endpoint_outcome[2].error(),
            Some(EndpointError::UnknownProtocol { .. })
        ));
        assert!(result.per_endpoint_outcome[3].is_success());
        assert_eq!(result.failed_count(), 2);
    }

    #[tokio::test]
    async fn test_all_failures_fail() {
        let service = MockService::default()
            .with_failure("a@x.com", "rejected")
            .with_failure("+15550000000", "rejected");
        let endpoints = vec![Endpoint::email("a@x.com"), Endpoint::sms("+15550000000")];

        let result = FanoutCoordinator::new(&service)
            .subscribe_all(TOPIC, &endpoints)
            .await;

        assert_eq!(result.aggregate_status, AggregateStatus::Failed);
        assert_eq!(result.failed_count(), 2);
    }

    #[tokio::test]
    async fn test_outcomes_follow_input_order_not_completion_order() {
        let service = MockService::default()
            .with_delay("first@x.com", Duration::from_millis(150))
            .with_delay("second@x.com", Duration::from_millis(75));
        let endpoints = vec![
            Endpoint::email("first@x.com"),
            Endpoint::email("second@x.com"),
            Endpoint::email("third@x.com"),
        ];

        let result = FanoutCoordinator::new(&service)
            .subscribe_all(TOPIC, &endpoints)
            .await;

        let completions = service.completions.lock().await.clone();
        assert_eq!(completions, vec!["third@x.com", "second@x.com", "first@x.com"]);

        let arns: Vec<_> = result
            .per_endpoint_outcome
            .iter()
            .map(|o| match o {
                EndpointOutcome::Subscribed { subscription_arn } => subscription_arn.clone().unwrap(),
                EndpointOutcome::Failed { error } => panic!("unexpected failure: {}", error),
            })
            .collect();
        assert_eq!(
            arns,
            vec!["arn:test:first@x.com", "arn:test:second@x.com", "arn:test:third@x.com"]
        );
    }

    #[tokio::test]
    async fn test_all_calls_in_flight_before_any_completes() {
        // 三個呼叫都必須先到達 barrier，循序 await 會在這裡卡住
        let service = MockService::default().with_barrier(3);
        let endpoints = vec![
            Endpoint::email("a@x.com"),
            Endpoint::email("b@x.com"),
            Endpoint::sms("+15551234567"),
        ];

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            FanoutCoordinator::new(&service).subscribe_all(TOPIC, &endpoints),
        )
        .await
        .expect("subscribe calls were not dispatched concurrently");

        assert_eq!(result.aggregate_status, AggregateStatus::Succeeded);
    }

    #[tokio::test]
    async fn test_deadline_marks_pending_calls_incomplete() {
        let service = MockService::default().with_delay("slow@x.com", Duration::from_secs(30));
        let endpoints = vec![Endpoint::email("slow@x.com"), Endpoint::email("fast@x.com")];
        let deadline = Instant::now() + Duration::from_millis(100);

        let result = FanoutCoordinator::new(&service)
            .with_deadline(Some(deadline))
            .subscribe_all(TOPIC, &endpoints)
            .await;

        assert_eq!(
            result.per_endpoint_outcome[0].error(),
            Some(&EndpointError::Incomplete)
        );
        assert!(result.per_endpoint_outcome[1].is_success());
        assert_eq!(result.aggregate_status, AggregateStatus::PartiallyFailed);
    }

    #[tokio::test]
    async fn test_malformed_entry_fails_only_its_slot() {
        let service = MockService::default();
        let entries = vec![
            serde_json::json!({"type": "email", "value": "a@x.com"}),
            serde_json::json!({"type": null, "value": "x"}),
            serde_json::json!({"value": "y"}),
            serde_json::json!({"type": "sms", "value": "+15551234567"}),
        ];

        let result = FanoutCoordinator::new(&service)
            .subscribe_raw(TOPIC, &entries)
            .await;

        assert_eq!(result.aggregate_status, AggregateStatus::PartiallyFailed);
        assert_eq!(result.per_endpoint_outcome.len(), 4);
        assert!(result.per_endpoint_outcome[0].is_success());
        assert!(matches!(
            result.per_endpoint_outcome[1].error(),
            Some(EndpointError::InvalidEndpoint { .. })
        ));
        assert!(matches!(
            result.per_endpoint_outcome[2].error(),
            Some(EndpointError::InvalidEndpoint { .. })
        ));
        assert!(result.per_endpoint_outcome[3].is_success());

        let calls = service.calls.lock().await;
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].endpoint, "a@x.com");
        assert_eq!(calls[1].endpoint, "+15551234567");
    }

    #[tokio::test]
    async fn test_repeated_endpoint_is_dispatched_each_time() {
        let service = MockService::default();
        let endpoints = vec![Endpoint::email("a@x.com"), Endpoint::email("a@x.com")];

        let result = FanoutCoordinator::new(&service)
            .subscribe_all(TOPIC, &endpoints)
            .await;

        assert_eq!(result.per_endpoint_outcome.len(), 2);
        assert_eq!(service.calls.lock().await.len(), 2);
    }
}
