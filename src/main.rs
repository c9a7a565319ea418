use recipe_api::{
    configuration::get_configuration,
    startup,
    telemetry::{get_subscriber, init_subscriber},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = get_configuration()?;

    let subscriber = get_subscriber(
        settings.telemetry.service_name.clone(),
        settings.telemetry.log_filter.clone(),
        settings.telemetry.otlp_endpoint.as_deref(),
        std::io::stdout,
    )?;
    init_subscriber(subscriber)?;

    let result = startup::run(settings).await;
    opentelemetry::global::shutdown_tracer_provider();
    result
}
