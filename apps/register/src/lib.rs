//! # Tally Register Library
//!
//! The billing counter: a console front end over the bill engine.
//!
//! ## Module Organization
//! ```text
//! tally_register/
//! ├── lib.rs          ◄─── You are here (logging & startup)
//! ├── config.rs       ◄─── Store, backend and scanner settings
//! ├── state.rs        ◄─── Shared bill + backend round trips
//! ├── scanner.rs      ◄─── Camera scanner polling task
//! ├── console.rs      ◄─── Command parsing, rendering, input loop
//! └── error.rs        ◄─── Error type shown to the cashier
//! ```
//!
//! ## Startup Sequence
//! 1. Initialize tracing (logging to stderr, the bill goes to stdout)
//! 2. Load configuration
//! 3. Build the HTTP backend client
//! 4. Load the product catalog (an empty catalog if the server is down)
//! 5. Run the console until `quit` or end of input

pub mod config;
pub mod console;
pub mod error;
pub mod scanner;
pub mod state;

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use tally_client::{BillingBackend, HttpBackend};
use tally_core::Catalog;

use config::RegisterConfig;
use console::Console;
use error::AppResult;
use state::BillState;

/// Runs the register.
///
/// `config_path` is an explicit config file; when given it must load
/// cleanly. Without it the platform default is tried and any problem
/// falls back to defaults.
pub async fn run(config_path: Option<PathBuf>) -> AppResult<()> {
    init_tracing();

    let config = match config_path {
        Some(path) => RegisterConfig::load(Some(path))?,
        None => RegisterConfig::load_or_default(None),
    };
    info!(
        tenant_id = %config.tenant_id(),
        api_url = %config.backend.api_url,
        "Starting Tally register"
    );

    let backend: Arc<dyn BillingBackend> = Arc::new(HttpBackend::new(&config.backend_config())?);

    let state = BillState::new(Catalog::default());
    match state.reload_catalog(backend.as_ref()).await {
        Ok(count) => info!(count, "Catalog loaded"),
        Err(e) => warn!(error = %e, "Catalog unavailable, starting empty (use 'reload')"),
    }

    Console::new(state, backend, config).run().await
}

/// Log filter used when `RUST_LOG` is not set.
const DEFAULT_LOG_FILTER: &str = "info,tally=debug";

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=tally=trace` - Show trace for tally crates only
/// - Default: INFO level, DEBUG for tally crates
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    log_subscriber(filter).init();
}

fn log_subscriber(filter: EnvFilter) -> impl tracing::Subscriber + Send + Sync + 'static {
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::Level;

    #[test]
    fn test_default_filter_quiets_dependencies() {
        let subscriber = log_subscriber(EnvFilter::new(DEFAULT_LOG_FILTER));

        tracing::subscriber::with_default(subscriber, || {
            assert!(!tracing::enabled!(target: "hyper::proto", Level::TRACE));
            assert!(!tracing::enabled!(target: "reqwest::connect", Level::DEBUG));
            assert!(tracing::enabled!(target: "reqwest::connect", Level::INFO));
            assert!(tracing::enabled!(target: "tally_core::editor", Level::DEBUG));
            assert!(!tracing::enabled!(target: "tally_core::editor", Level::TRACE));
        });
    }
}
