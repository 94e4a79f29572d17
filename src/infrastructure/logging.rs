use tracing::Subscriber;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

use crate::config::{LogFormat, LoggingConfig};

/// Where log lines go and how chatty the formatter is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sink {
    /// Long-running server: stdout, span close events
    Server,
    /// One-shot batch run: stderr, so stdout only carries the report
    Cli,
}

/// Install the global subscriber for the API server
pub fn init_logging(config: &LoggingConfig) {
    install(config, Sink::Server);
    tracing::info!(level = %config.level, format = ?config.format, "Logging initialized");
}

/// Install the global subscriber for `evaluate` runs
pub fn init_cli_logging(config: &LoggingConfig) {
    install(config, Sink::Cli);
}

fn install(config: &LoggingConfig, sink: Sink) {
    tracing_subscriber::registry()
        .with(filter(&config.level))
        .with(format_layer(&config.format, sink))
        .init();
}

/// `RUST_LOG` wins over the configured level
fn filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

fn format_layer<S>(format: &LogFormat, sink: Sink) -> Box<dyn Layer<S> + Send + Sync>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    match (format, sink) {
        (LogFormat::Json, Sink::Server) => fmt::layer()
            .json()
            .with_span_events(FmtSpan::CLOSE)
            .boxed(),
        (LogFormat::Pretty, Sink::Server) => fmt::layer()
            .pretty()
            .with_target(true)
            .with_span_events(FmtSpan::CLOSE)
            .boxed(),
        (LogFormat::Json, Sink::Cli) => fmt::layer().json().with_writer(std::io::stderr).boxed(),
        (LogFormat::Pretty, Sink::Cli) => fmt::layer()
            .compact()
            .with_target(false)
            .with_writer(std::io::stderr)
            .boxed(),
    }
}
