//! Rabbit farm record-keeping server.
//!
//! The [`backend`] module holds the domain services, their storage and the
//! REST API. The binary in `main.rs` loads configuration, starts logging and
//! serves [`backend::create_router`].

pub mod backend;

use tracing_subscriber::EnvFilter;

/// Install the tracing subscriber. `RUST_LOG` overrides the default `info`
/// level; `log` records from the backend are captured as well.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if let Err(e) = tracing_subscriber::fmt().with_env_filter(filter).try_init() {
        eprintln!("Logging already initialized: {}", e);
    }
}
