use crate::core::handlers::HandlerKind;
use crate::utils::error::{Result, SnsApiError};
use crate::utils::validation::{
    validate_aws_region, validate_range, validate_required_field, validate_url, Validate,
};
use std::env;
use std::time::Duration;
use tokio::time::Instant;

const DEFAULT_REGION: &str = "us-east-1";
const DEFAULT_DEADLINE_MARGIN_MS: u64 = 500;
const MAX_DEADLINE_MARGIN_MS: u64 = 60_000;

#[derive(Debug, Clone)]
pub struct LambdaConfig {
    pub handler: HandlerKind,
    pub region: String,
    pub endpoint_url: Option<String>,
    pub deadline_margin_ms: u64,
}

impl LambdaConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// 從任意 key/value 來源讀取設定 (測試時不必修改行程環境變數)
    pub fn from_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let handler = validate_required_field("SNS_API_HANDLER", &lookup("SNS_API_HANDLER"))?
            .parse::<HandlerKind>()?;

        let deadline_margin_ms = match lookup("SNS_DEADLINE_MARGIN_MS") {
            Some(raw) => raw
                .parse()
                .map_err(|_| SnsApiError::InvalidConfigValueError {
                    field: "SNS_DEADLINE_MARGIN_MS".to_string(),
                    value: raw.clone(),
                    reason: "Expected a whole number of milliseconds".to_string(),
                })?,
            None => DEFAULT_DEADLINE_MARGIN_MS,
        };

        Ok(Self {
            handler,
            region: lookup("AWS_REGION").unwrap_or_else(|| DEFAULT_REGION.to_string()),
            endpoint_url: lookup("SNS_ENDPOINT_URL").filter(|url| !url.is_empty()),
            deadline_margin_ms,
        })
    }

    /// Deadline for the subscribe fan-out, leaving `deadline_margin_ms` of the
    /// invocation's remaining time to build and return the response.
    pub fn fanout_deadline(&self, remaining: Duration) -> Instant {
        let budget = remaining.saturating_sub(Duration::from_millis(self.deadline_margin_ms));
        Instant::now() + budget
    }
}

impl Validate for LambdaConfig {
    fn validate(&self) -> Result<()> {
        validate_aws_region("AWS_REGION", &self.region)?;

        if let Some(url) = &self.endpoint_url {
            validate_url("SNS_ENDPOINT_URL", url)?;
        }

        validate_range(
            "SNS_DEADLINE_MARGIN_MS",
            self.deadline_margin_ms,
            0,
            MAX_DEADLINE_MARGIN_MS,
        )?;

        tracing::info!("✅ Lambda configuration validation passed");
        Ok(())
    }
}
