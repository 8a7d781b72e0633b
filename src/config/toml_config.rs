use crate::utils::error::{Result, SnsApiError};
use crate::utils::validation::{validate_aws_region, validate_range, validate_url, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;

const MAX_DEADLINE_MS: u64 = 15 * 60 * 1000;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnsApiToml {
    #[serde(default)]
    pub aws: AwsConfig,
    #[serde(default)]
    pub fanout: FanoutConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AwsConfig {
    pub region: Option<String>,
    pub endpoint_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FanoutConfig {
    /// Upper bound for one subscribe fan-out; pending calls are reported as
    /// incomplete once it passes.
    pub deadline_ms: Option<u64>,
}

fn env_var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is a valid regex"))
}

impl SnsApiToml {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(SnsApiError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| SnsApiError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${AWS_REGION})，未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> String {
        env_var_pattern()
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .to_string()
    }
}

impl Validate for SnsApiToml {
    fn validate(&self) -> Result<()> {
        if let Some(region) = &self.aws.region {
            validate_aws_region("aws.region", region)?;
        }
        if let Some(url) = &self.aws.endpoint_url {
            validate_url("aws.endpoint_url", url)?;
        }
        if let Some(deadline_ms) = self.fanout.deadline_ms {
            validate_range("fanout.deadline_ms", deadline_ms, 1, MAX_DEADLINE_MS)?;
        }
        Ok(())
    }
}
