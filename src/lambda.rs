#[cfg(feature = "lambda")]
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
#[cfg(feature = "lambda")]
use sns_api::utils::{logger, validation::Validate};
#[cfg(feature = "lambda")]
use sns_api::{ApiRequest, ApiResponse, LambdaConfig, SnsApi, SnsNotificationService};
#[cfg(feature = "lambda")]
use std::time::SystemTime;

#[cfg(feature = "lambda")]
async fn function_handler(
    api: &SnsApi<SnsNotificationService>,
    config: &LambdaConfig,
    event: LambdaEvent<ApiRequest>,
) -> Result<ApiResponse, Error> {
    let LambdaEvent {
        payload: request,
        context,
    } = event;
    tracing::info!(
        request_id = %context.request_id,
        handler = %config.handler,
        "Handling invocation"
    );

    // Lambda 提供的 deadline 扣掉安全餘裕後作為 fan-out 的截止時間
    let remaining = context
        .deadline()
        .duration_since(SystemTime::now())
        .unwrap_or_default();
    let deadline = config.fanout_deadline(remaining);

    let response = api.handle(config.handler, &request, Some(deadline)).await;

    tracing::info!(status_code = response.status_code, "Invocation finished");
    Ok(response)
}

#[cfg(feature = "lambda")]
#[tokio::main]
async fn main() -> Result<(), Error> {
    logger::init_lambda_logger();

    let config = LambdaConfig::from_env()?;
    config.validate()?;

    // client 在冷啟動時建立一次，之後的呼叫共用
    let service =
        SnsNotificationService::from_env(&config.region, config.endpoint_url.as_deref()).await;
    let api = SnsApi::new(service);

    let api = &api;
    let config = &config;
    run(service_fn(move |event: LambdaEvent<ApiRequest>| async move {
        function_handler(api, config, event).await
    }))
    .await
}
