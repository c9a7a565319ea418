use opentelemetry_otlp::WithExportConfig;
use tracing::{Subscriber, subscriber::set_global_default};
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_log::LogTracer;
use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt};

use opentelemetry::KeyValue;
use opentelemetry_otlp::SpanExporter;
use opentelemetry_sdk::{Resource, runtime, trace as sdktrace};

use opentelemetry_semantic_conventions::resource::SERVICE_NAME;

/// Build the OTLP tracer and register its provider globally so that
/// `opentelemetry::global::shutdown_tracer_provider` flushes it on exit.
fn otlp_tracer(name: &str, endpoint: &str) -> anyhow::Result<sdktrace::Tracer> {
    let exporter = SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()?;

    let resource = Resource::new(vec![
        KeyValue::new(SERVICE_NAME, name.to_owned()),
        KeyValue::new("environment", std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "local".into())),
    ]);

    let tracer_provider = sdktrace::TracerProvider::builder()
        .with_batch_exporter(exporter, runtime::Tokio)
        .with_resource(resource)
        .build();

    let tracer = opentelemetry::trace::TracerProvider::tracer(&tracer_provider, "recipe-api-tracer");
    opentelemetry::global::set_tracer_provider(tracer_provider);
    Ok(tracer)
}

/// Compose the subscriber: env filter, optional OTLP export, bunyan JSON lines.
///
/// `RUST_LOG` wins over `env_filter` when set. The OTLP layer is only added
/// when `otlp_endpoint` is given, and must then be called inside a tokio runtime.
pub fn get_subscriber<Sink>(
    name: String,
    env_filter: String,
    otlp_endpoint: Option<&str>,
    sink: Sink,
) -> anyhow::Result<impl Subscriber + Send + Sync>
where
    Sink: for<'a> tracing_subscriber::fmt::MakeWriter<'a> + Sync + Send + 'static,
{
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(env_filter));

    let telemetry_layer = match otlp_endpoint {
        Some(endpoint) => {
            Some(tracing_opentelemetry::layer().with_tracer(otlp_tracer(&name, endpoint)?))
        }
        None => None,
    };

    Ok(Registry::default()
        .with(env_filter)
        .with(telemetry_layer)
        .with(JsonStorageLayer)
        .with(BunyanFormattingLayer::new(name, sink)))
}

pub fn init_subscriber(subscriber: impl Subscriber + Send + Sync) -> anyhow::Result<()> {
    LogTracer::init()?;
    set_global_default(subscriber)?;
    Ok(())
}
