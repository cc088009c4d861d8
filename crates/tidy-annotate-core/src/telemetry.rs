//! Tracing initialisation for the tidy-annotate binary.
//!
//! Log output goes to stderr: stdout carries the workflow-command lines that
//! the CI runner parses, and the two streams must not mix.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Filter honouring `RUST_LOG`, defaulting to `level`.
pub fn env_filter(level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()))
}

/// Install the global subscriber writing to stderr, as JSON when `json` is set.
///
/// Only the first call takes effect.
pub fn init_tracing(json: bool, level: Level) {
    let registry = tracing_subscriber::registry().with(env_filter(level));
    let layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let installed = if json {
        registry.with(layer.json()).try_init()
    } else {
        registry.with(layer).try_init()
    };
    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
