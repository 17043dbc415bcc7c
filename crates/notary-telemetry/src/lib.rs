//! Logging setup for notary binaries.
//!
//! `init_tracing` installs a `tracing-subscriber` registry with an
//! `EnvFilter`, a plain or JSON formatter, and optionally the
//! [`AuditEventLayer`].

pub mod audit_layer;

pub use audit_layer::{AuditEventLayer, AuditRecord};

use notary_core::config::LoggingConfig;
use notary_core::error::{NotaryError, Result};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Installs the global subscriber.
///
/// `RUST_LOG` takes precedence over `config.filter`. Logs go to stderr so
/// that command output on stdout stays machine-readable.
///
/// # Errors
///
/// `Config` if the filter does not parse or a global subscriber is already set.
pub fn init_tracing(
    config: &LoggingConfig,
    audit: Option<mpsc::UnboundedSender<AuditRecord>>,
) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.filter)
            .map_err(|e| NotaryError::config(format!("invalid log filter '{}': {e}", config.filter)))?,
    };

    let json = config.json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
    });
    let plain = (!config.json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .with(plain)
        .with(audit.map(AuditEventLayer::new))
        .try_init()
        .map_err(|e| NotaryError::config(format!("tracing already initialized: {e}")))
}
