pub mod lambda;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::core::envelope::ApiRequest;
#[cfg(feature = "cli")]
use crate::core::handlers::HandlerKind;
#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use crate::utils::validation::{validate_aws_region, validate_range, validate_url, Validate};
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use std::path::PathBuf;
#[cfg(feature = "cli")]
use std::time::Duration;
#[cfg(feature = "cli")]
use toml_config::SnsApiToml;

#[cfg(feature = "cli")]
const DEFAULT_REGION: &str = "us-east-1";

/// Runs one handler locally with the given JSON body and prints the response envelope.
#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "sns-api")]
#[command(about = "Invoke the SNS request handlers from the command line")]
pub struct CliConfig {
    #[arg(long, help = "hello | create-topic | subscribe | publish")]
    pub handler: HandlerKind,

    #[arg(long, conflicts_with = "body_file", help = "Inline JSON request body")]
    pub body: Option<String>,

    #[arg(long, help = "Read the JSON request body from a file")]
    pub body_file: Option<PathBuf>,

    #[arg(long, help = "TOML configuration file")]
    pub config: Option<PathBuf>,

    #[arg(long)]
    pub region: Option<String>,

    #[arg(long, help = "Custom SNS endpoint, e.g. http://localhost:4566")]
    pub endpoint_url: Option<String>,

    #[arg(long, help = "Abandon pending subscribe calls after this many milliseconds")]
    pub deadline_ms: Option<u64>,

    #[arg(long, help = "Use an in-memory notification service instead of SNS")]
    pub dry_run: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

/// Effective service settings: command line flags over the TOML file over defaults.
#[cfg(feature = "cli")]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSettings {
    pub region: String,
    pub endpoint_url: Option<String>,
    pub deadline: Option<Duration>,
}

#[cfg(feature = "cli")]
impl CliConfig {
    pub fn resolve(&self) -> Result<ServiceSettings> {
        let file = match &self.config {
            Some(path) => {
                let file = SnsApiToml::from_file(path)?;
                file.validate()?;
                file
            }
            None => SnsApiToml::default(),
        };

        Ok(ServiceSettings {
            region: self
                .region
                .clone()
                .or(file.aws.region)
                .unwrap_or_else(|| DEFAULT_REGION.to_string()),
            endpoint_url: self.endpoint_url.clone().or(file.aws.endpoint_url),
            deadline: self
                .deadline_ms
                .or(file.fanout.deadline_ms)
                .map(Duration::from_millis),
        })
    }

    /// 組出與 API Gateway 相同形狀的事件
    pub fn event(&self) -> Result<ApiRequest> {
        let body = match (&self.body, &self.body_file) {
            (Some(body), _) => Some(body.clone()),
            (None, Some(path)) => Some(std::fs::read_to_string(path)?),
            (None, None) => None,
        };

        Ok(ApiRequest {
            body: body.map(serde_json::Value::String),
            ..ApiRequest::default()
        })
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        if let Some(region) = &self.region {
            validate_aws_region("region", region)?;
        }
        if let Some(url) = &self.endpoint_url {
            validate_url("endpoint_url", url)?;
        }
        if let Some(deadline_ms) = self.deadline_ms {
            validate_range("deadline_ms", deadline_ms, 1, 15 * 60 * 1000)?;
        }
        Ok(())
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn parse(args: &[&str]) -> CliConfig {
        let mut argv = vec!["sns-api"];
        argv.extend_from_slice(args);
        CliConfig::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_parse_handler_and_body() {
        let config = parse(&["--handler", "subscribe", "--body", r#"{"topicArn": "arn"}"#]);
        assert_eq!(config.handler, HandlerKind::Subscribe);

        let event = config.event().unwrap();
        assert_eq!(event.body.as_ref().and_then(|b| b.as_str()), Some(r#"{"topicArn": "arn"}"#));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_unknown_handler() {
        assert!(CliConfig::try_parse_from(["sns-api", "--handler", "nope"]).is_err());
    }

    #[test]
    fn test_resolve_defaults() {
        let settings = parse(&["--handler", "hello"]).resolve().unwrap();
        assert_eq!(
            settings,
            ServiceSettings {
                region: "us-east-1".to_string(),
                endpoint_url: None,
                deadline: None,
            }
        );
    }

    #[test]
    fn test_flags_override_config_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(
            b"[aws]\nregion = \"eu-west-1\"\nendpoint_url = \"http://localhost:4566\"\n\n[fanout]\ndeadline_ms = 3000\n",
        )
        .unwrap();
        let path = file.path().to_str().unwrap();

        let settings = parse(&["--handler", "subscribe", "--config", path, "--region", "us-west-2"])
            .resolve()
            .unwrap();

        assert_eq!(settings.region, "us-west-2");
        assert_eq!(settings.endpoint_url.as_deref(), Some("http://localhost:4566"));
        assert_eq!(settings.deadline, Some(Duration::from_millis(3000)));
    }

    #[test]
    fn test_body_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(br#"{"topicName": "alerts"}"#).unwrap();
        let path = file.path().to_str().unwrap();

        let event = parse(&["--handler", "create-topic", "--body-file", path])
            .event()
            .unwrap();
        assert_eq!(event.body.as_ref().and_then(|b| b.as_str()), Some(r#"{"topicName": "alerts"}"#));
    }
}
