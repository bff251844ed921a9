//! Tracing subscriber setup for binaries embedding the adapter.

use tracing_subscriber::EnvFilter;

pub const DEFAULT_LOG_DIRECTIVE: &str = "odata_adapter=info";

/// `RUST_LOG` when set, otherwise `default_directive`. Safe to call more than once.
pub fn init_tracing(default_directive: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
