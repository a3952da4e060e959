//! Console logging for the boundmap CLI.
//!
//! Events go to stderr so stdout stays free for replay output. `RUST_LOG`
//! overrides the level chosen from the verbose flag.

use std::io;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};

/// Directive used when `RUST_LOG` is unset
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "boundmap=debug,info"
    } else {
        "info"
    }
}

/// Install the global subscriber.
///
/// # Errors
///
/// Returns error if a global subscriber is already set
pub fn init(verbose: bool) -> Result<(), TryInitError> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_target(verbose);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .try_init()
}
