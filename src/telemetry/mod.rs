//! Tracing and OpenTelemetry setup.
//!
//! Log events go to stdout through a `tracing-subscriber` fmt layer. When
//! `otel.enabled` is set, spans such as `resolver.resolve` and `engine.notify`
//! are also exported over OTLP gRPC.
//!
//! # Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `TEMPLATE_ENGINE__OTEL__ENABLED` | Enable OpenTelemetry tracing | `false` |
//! | `TEMPLATE_ENGINE__OTEL__ENDPOINT` | OTLP gRPC endpoint | `http://localhost:4317` |
//! | `TEMPLATE_ENGINE__OTEL__SERVICE_NAME` | Service name in traces | `notification-template-engine` |
//! | `TEMPLATE_ENGINE__OTEL__SAMPLING_RATIO` | Trace sampling ratio (0.0-1.0) | `1.0` |
//! | `RUST_LOG` | Log filter | `info` |

use opentelemetry::trace::TracerProvider;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{
    runtime,
    trace::{RandomIdGenerator, Sampler, TracerProvider as SdkTracerProvider},
    Resource,
};
use tracing_opentelemetry::OpenTelemetrySpanExt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::OtelConfig;

/// Result type for telemetry operations
pub type TelemetryResult<T> = Result<T, TelemetryError>;

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("Failed to build OTLP exporter: {0}")]
    ExporterBuild(String),
    #[error("Failed to install tracing subscriber: {0}")]
    SubscriberInit(String),
}

/// Keeps the tracer provider alive; flushes pending spans on drop.
pub struct TelemetryGuard {
    provider: Option<SdkTracerProvider>,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.provider.take() {
            tracing::info!("Shutting down OpenTelemetry tracer provider");
            if let Err(e) = provider.shutdown() {
                eprintln!("OpenTelemetry shutdown failed: {e}");
            }
        }
    }
}

/// Install the global tracing subscriber.
///
/// Keep the returned guard alive for the lifetime of the process.
pub fn init_telemetry(config: &OtelConfig) -> TelemetryResult<TelemetryGuard> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if !config.enabled {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()
            .map_err(|e| TelemetryError::SubscriberInit(e.to_string()))?;

        tracing::info!("Tracing initialized (OpenTelemetry disabled)");
        return Ok(TelemetryGuard { provider: None });
    }

    let provider = init_otel_tracer(config)?;
    let tracer = provider.tracer(config.service_name.clone());
    let otel_layer = tracing_opentelemetry::layer().with_tracer(tracer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(otel_layer)
        .try_init()
        .map_err(|e| TelemetryError::SubscriberInit(e.to_string()))?;

    tracing::info!(
        endpoint = %config.endpoint,
        service_name = %config.service_name,
        sampling_ratio = %config.sampling_ratio,
        "OpenTelemetry tracing initialized"
    );

    Ok(TelemetryGuard {
        provider: Some(provider),
    })
}

fn sampler(ratio: f64) -> Sampler {
    if ratio >= 1.0 {
        Sampler::AlwaysOn
    } else if ratio <= 0.0 {
        Sampler::AlwaysOff
    } else {
        Sampler::TraceIdRatioBased(ratio)
    }
}

fn init_otel_tracer(config: &OtelConfig) -> TelemetryResult<SdkTracerProvider> {
    use opentelemetry::KeyValue;

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(&config.endpoint)
        .build()
        .map_err(|e| TelemetryError::ExporterBuild(e.to_string()))?;

    let provider = SdkTracerProvider::builder()
        .with_batch_exporter(exporter, runtime::Tokio)
        .with_sampler(sampler(config.sampling_ratio))
        .with_id_generator(RandomIdGenerator::default())
        .with_resource(Resource::new(vec![
            KeyValue::new(
                opentelemetry_semantic_conventions::resource::SERVICE_NAME,
                config.service_name.clone(),
            ),
            KeyValue::new(
                opentelemetry_semantic_conventions::resource::SERVICE_VERSION,
                env!("CARGO_PKG_VERSION"),
            ),
        ]))
        .build();

    Ok(provider)
}

/// Attach OpenTelemetry attributes to a `tracing` span.
///
/// A no-op when no OpenTelemetry layer is installed.
pub fn record_attributes<I>(span: &tracing::Span, attributes: I)
where
    I: IntoIterator<Item = opentelemetry::KeyValue>,
{
    for attribute in attributes {
        span.set_attribute(attribute.key, attribute.value);
    }
}

/// Span attributes for template resolution and rendering
pub mod attributes {
    use opentelemetry::KeyValue;
    use uuid::Uuid;

    use crate::notification::Channel;
    use crate::resolver::ResolutionTier;

    pub fn tenant_id(id: &str) -> KeyValue {
        KeyValue::new("tenant.id", id.to_string())
    }

    pub fn application_id(id: &str) -> KeyValue {
        KeyValue::new("application.id", id.to_string())
    }

    pub fn channel(channel: Channel) -> KeyValue {
        KeyValue::new("notification.channel", channel.as_str())
    }

    pub fn template_type(t: &str) -> KeyValue {
        KeyValue::new("template.type", t.to_string())
    }

    pub fn locale(locale: &str) -> KeyValue {
        KeyValue::new("template.locale", locale.to_string())
    }

    /// Tier that served a resolution
    pub fn tier(tier: ResolutionTier) -> KeyValue {
        KeyValue::new("template.tier", tier.as_str())
    }

    pub fn notification_id(id: Uuid) -> KeyValue {
        KeyValue::new("notification.id", id.to_string())
    }

    pub fn placeholder_count(count: usize) -> KeyValue {
        KeyValue::new("template.placeholder_count", count as i64)
    }
}
