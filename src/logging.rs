//! Structured logging setup shared by the binary, tests and benches.

use once_cell::sync::OnceCell;
use tracing_subscriber::{EnvFilter, fmt};

static INITIALIZED: OnceCell<()> = OnceCell::new();

/// Installs the global subscriber once. Later calls are no-ops.
///
/// An explicit `filter` wins; otherwise `PBP_LOG`, then `RUST_LOG`, then
/// `"warn"`. Output goes to stderr so stdout stays a clean record stream.
pub fn init(filter: Option<&str>) {
    INITIALIZED.get_or_init(|| {
        let filter = match filter {
            Some(directives) => EnvFilter::new(directives),
            None => std::env::var("PBP_LOG")
                .or_else(|_| std::env::var("RUST_LOG"))
                .map(EnvFilter::new)
                .unwrap_or_else(|_| EnvFilter::new("warn")),
        };

        fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init()
            .ok();
    });
}
