//! Bootstrap utilities for services embedding the store.

use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable holding the tracing filter directive.
pub const LOG_ENV: &str = "VERSION_SNAPSHOT_LOG";

/// Initialize tracing with VERSION_SNAPSHOT_LOG environment variable.
///
/// Defaults to "info" level if VERSION_SNAPSHOT_LOG is not set.
/// Panics if a global subscriber is already installed.
pub fn init_tracing() {
    subscriber().init();
}

/// Like [`init_tracing`], but reports an already-installed subscriber as an
/// error instead of panicking.
pub fn try_init_tracing() -> Result<(), TryInitError> {
    subscriber().try_init()
}

fn subscriber() -> impl SubscriberInitExt {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_env(LOG_ENV)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
}
