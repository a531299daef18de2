//! Tracing subscriber setup.

use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Install a `tracing` subscriber filtered by `RUST_LOG`.
///
/// Does nothing unless `RUST_LOG` is set, and only the first call has any
/// effect. Hosts that install their own subscriber should not call this.
///
/// ```text
/// RUST_LOG=mallard_cast=debug cargo test
/// RUST_LOG=mallard_cast::compat=trace cargo test
/// ```
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            // A host may already own the global subscriber
            let _ = tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .try_init();
        }
    });
}
