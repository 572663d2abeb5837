//! Logging setup for hosts embedding the registry.
//!
//! Installs a `tracing-subscriber` registry with a single fmt layer and
//! bridges the `log` facade (used throughout this crate) into tracing, so
//! registry log lines carry the span context of the tracker that produced
//! them.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::error::LoggingError;

/// Output format of the fmt layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

impl LogFormat {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" | "jsonl" => LogFormat::Json,
            _ => LogFormat::Compact,
        }
    }
}

/// Builds the filter from `RUST_LOG` if set, else from `level`.
pub fn build_env_filter(level: &str) -> Result<EnvFilter, LoggingError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(level).map_err(|e| LoggingError::InvalidFilter {
        filter: level.to_string(),
        reason: e.to_string(),
    })
}

/// Installs the global subscriber.
///
/// Returns `LoggingError::AlreadyInitialized` if a tracing subscriber was
/// already set; the existing one stays in place. Once the subscriber is in
/// place, `log` records are bridged into it unless the host already installed
/// its own `log` logger, in which case that logger keeps receiving them.
pub fn init_logging(level: &str, format: LogFormat) -> Result<(), LoggingError> {
    let filter = build_env_filter(level)?;

    let fmt_layer: Box<dyn Layer<Registry> + Send + Sync> = match format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => tracing_subscriber::fmt::layer()
            .compact()
            .with_target(true)
            .boxed(),
    };

    let subscriber = tracing_subscriber::registry().with(fmt_layer.with_filter(filter));
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|_| LoggingError::AlreadyInitialized)?;

    if tracing_log::LogTracer::init().is_err() {
        tracing::warn!("A log logger is already installed; log records bypass tracing");
    }
    Ok(())
}
