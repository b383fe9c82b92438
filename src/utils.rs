//! Utility functions shared by the binaries and the engine.
//!

use anyhow::Result;
use bytes::Bytes;
use tracing_subscriber::EnvFilter;

/// Read an entire [`Bytes`] slice into a [`String`].
///
/// Returns an error if the slice contains invalid UTF-8.
pub fn string_from_bytes(buf: Bytes) -> Result<String> {
    Ok(String::from_utf8(buf.as_ref().into())?)
}

/// Installs the global fmt subscriber. `RUST_LOG` overrides the `info`
/// default; `log` records are bridged into it.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
