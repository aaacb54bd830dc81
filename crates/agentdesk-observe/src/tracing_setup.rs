//! Tracing subscriber initialization with structured logging and optional
//! OpenTelemetry trace export.
//!
//! # Usage
//!
//! ```no_run
//! use agentdesk_observe::tracing_setup::{TracingOptions, init_tracing};
//!
//! // Human-readable logs at `info`
//! init_tracing(TracingOptions::default()).unwrap();
//! ```
//!
//! ```no_run
//! use agentdesk_observe::tracing_setup::{TracingOptions, init_tracing};
//!
//! // JSON lines at `debug`, plus spans exported to stdout
//! init_tracing(TracingOptions { verbosity: 1, json: true, otel: true }).unwrap();
//! ```

use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::trace::SdkTracerProvider;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use std::sync::OnceLock;

/// Stores the OTel tracer provider so it can be shut down cleanly on exit.
static TRACER_PROVIDER: OnceLock<SdkTracerProvider> = OnceLock::new();

/// How the global subscriber should render and export events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingOptions {
    /// `-v` count: 0 = info, 1 = debug, 2+ = trace. Ignored when `RUST_LOG` is set.
    pub verbosity: u8,
    /// Emit JSON lines instead of the human format.
    pub json: bool,
    /// Bridge spans to OpenTelemetry with the stdout exporter.
    pub otel: bool,
}

impl TracingOptions {
    /// Filter used when `RUST_LOG` is unset. HTTP internals stay at `warn`
    /// unless tracing everything.
    pub fn default_directive(&self) -> &'static str {
        match self.verbosity {
            0 => "info,hyper=warn,reqwest=warn,sqlx=warn",
            1 => "debug,hyper=warn,reqwest=warn,sqlx=warn",
            _ => "trace",
        }
    }

    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.default_directive()))
    }
}

/// Initialize the global tracing subscriber.
///
/// - Installs a `fmt` layer with target visibility and span close timing,
///   human-readable or JSON per [`TracingOptions::json`].
/// - When `otel` is set, additionally bridges tracing spans to OpenTelemetry
///   using a stdout exporter.
/// - Respects `RUST_LOG`, falling back to [`TracingOptions::default_directive`].
///
/// # Errors
///
/// Returns an error if the global subscriber has already been set.
pub fn init_tracing(options: TracingOptions) -> Result<(), Box<dyn std::error::Error>> {
    let fmt_layer = if options.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_span_events(FmtSpan::CLOSE)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_span_events(FmtSpan::CLOSE)
            .boxed()
    };

    let registry = tracing_subscriber::registry()
        .with(options.env_filter())
        .with(fmt_layer);

    if options.otel {
        let provider = SdkTracerProvider::builder()
            .with_simple_exporter(opentelemetry_stdout::SpanExporter::default())
            .build();
        let tracer = provider.tracer("agentdesk");
        let otel_layer = tracing_opentelemetry::layer().with_tracer(tracer);

        let _ = TRACER_PROVIDER.set(provider.clone());
        opentelemetry::global::set_tracer_provider(provider);

        registry.with(otel_layer).try_init()?;
    } else {
        registry.try_init()?;
    }

    Ok(())
}

/// Flush pending spans and shut down the OpenTelemetry tracer provider.
/// No-op when OTel was not enabled.
pub fn shutdown_tracing() {
    if let Some(provider) = TRACER_PROVIDER.get()
        && let Err(e) = provider.shutdown()
    {
        eprintln!("Warning: OTel tracer provider shutdown error: {e}");
    }
}
