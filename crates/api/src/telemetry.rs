//! Tracing setup: console output plus the plain-text activity log.

use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use anyhow::Context;
use tracing::Subscriber;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, filter, fmt};

use relay_common::ACTIVITY_TARGET;

const DEFAULT_FILTER: &str =
    "relay_api=debug,relay_store=debug,relay_notifier=debug,relay::activity=info,tower_http=debug";

/// Install the global subscriber. Activity events are also appended to `log_file`.
pub fn init(log_file: &Path) -> anyhow::Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .with_context(|| format!("opening activity log {}", log_file.display()))?;

    let console = fmt::layer().with_filter(
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)),
    );

    tracing_subscriber::registry()
        .with(console)
        .with(activity_layer(file))
        .try_init()?;

    Ok(())
}

/// One timestamped plain-text line per activity event.
fn activity_layer<S>(file: File) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fmt::layer()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .with_filter(filter::filter_fn(|meta| meta.target() == ACTIVITY_TARGET))
}
