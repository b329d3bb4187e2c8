use crate::config::Config;
use anyhow::Context;
use metrics::{describe_counter, Unit};
use opentelemetry::{global, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{runtime, trace as sdktrace, Resource};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

const DEFAULT_FILTER: &str = "autocrm=debug,tower_http=debug";

/// Flushes pending OTLP spans when dropped at the end of `main`.
pub struct ObservabilityGuard;

impl Drop for ObservabilityGuard {
    fn drop(&mut self) {
        shutdown();
    }
}

pub fn init(config: &Config) -> anyhow::Result<ObservabilityGuard> {
    init_tracing(config)?;
    init_metrics(config)?;
    Ok(ObservabilityGuard)
}

fn init_tracing(config: &Config) -> anyhow::Result<()> {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_thread_ids(true)
        .with_target(true);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_FILTER.into());

    if let Some(endpoint) = &config.otel_exporter_endpoint {
        let exporter = opentelemetry_otlp::new_exporter()
            .tonic()
            .with_endpoint(endpoint);

        let tracer = opentelemetry_otlp::new_pipeline()
            .tracing()
            .with_exporter(exporter)
            .with_trace_config(sdktrace::config().with_resource(Resource::new(vec![
                KeyValue::new("service.name", config.service_name.clone()),
            ])))
            .install_batch(runtime::Tokio)
            .context("failed to install OTLP pipeline")?;

        Registry::default()
            .with(env_filter)
            .with(fmt_layer)
            .with(tracing_opentelemetry::layer().with_tracer(tracer))
            .try_init()
            .context("failed to install tracing subscriber")?;

        tracing::info!(%endpoint, "OTLP trace export enabled");
    } else {
        Registry::default()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .context("failed to install tracing subscriber")?;
    }

    Ok(())
}

fn init_metrics(config: &Config) -> anyhow::Result<()> {
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], config.metrics_port))
        .install()
        .context("failed to start Prometheus exporter")?;

    describe_counter!(
        "autocrm_tickets_created_total",
        Unit::Count,
        "Tickets created"
    );
    describe_counter!(
        "autocrm_messages_created_total",
        Unit::Count,
        "Messages posted on tickets"
    );
    describe_counter!(
        "autocrm_ai_requests_total",
        Unit::Count,
        "AI reply and check chain runs by chain and outcome"
    );
    describe_counter!(
        "autocrm_doc_chunks_indexed_total",
        Unit::Count,
        "Help document chunks embedded and stored"
    );
    describe_counter!(
        "autocrm_sign_in_total",
        Unit::Count,
        "Sign-in attempts by outcome"
    );

    tracing::info!(port = config.metrics_port, "Prometheus exporter started");
    Ok(())
}

pub fn shutdown() {
    global::shutdown_tracer_provider();
}
