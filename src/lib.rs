pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{CliConfig, ServiceSettings};

pub use adapters::{InMemoryNotificationService, SnsNotificationService};
pub use config::lambda::LambdaConfig;
pub use crate::core::envelope::{ApiRequest, ApiResponse};
pub use crate::core::fanout::FanoutCoordinator;
pub use crate::core::handlers::{HandlerKind, SnsApi};
pub use utils::error::{Result, SnsApiError};
