use clap::Parser;
use sns_api::core::NotificationService;
use sns_api::utils::{logger, validation::Validate};
use sns_api::{
    ApiRequest, ApiResponse, CliConfig, HandlerKind, InMemoryNotificationService, ServiceSettings,
    SnsApi, SnsNotificationService,
};
use tokio::time::Instant;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(config.verbose);

    tracing::info!("Starting sns-api CLI");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e);
        std::process::exit(1);
    }

    let settings = config.resolve()?;
    let event = config.event()?;
    tracing::debug!("Resolved settings: {:?}", settings);

    let response = if config.dry_run {
        tracing::info!("🧪 Dry run: nothing is sent to SNS");
        let api = SnsApi::new(
            InMemoryNotificationService::new(settings.region.clone()).accept_unknown_topics(),
        );
        let response = invoke(&api, config.handler, &settings, &event).await;
        tracing::info!(
            subscriptions = api.service().subscriptions().await.len(),
            published = api.service().published().await.len(),
            "🧪 Dry run recorded calls"
        );
        response
    } else {
        let service =
            SnsNotificationService::from_env(&settings.region, settings.endpoint_url.as_deref())
                .await;
        invoke(&SnsApi::new(service), config.handler, &settings, &event).await
    };

    println!("{}", serde_json::to_string_pretty(&response)?);

    if !response.is_success() {
        std::process::exit(2);
    }
    Ok(())
}

async fn invoke<N: NotificationService>(
    api: &SnsApi<N>,
    handler: HandlerKind,
    settings: &ServiceSettings,
    event: &ApiRequest,
) -> ApiResponse {
    let deadline = settings.deadline.map(|budget| Instant::now() + budget);
    api.handle(handler, event, deadline).await
}
