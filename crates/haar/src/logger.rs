//! `tracing` subscriber setup for the examples.

use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

/// Install a formatted subscriber.
///
/// `RUST_LOG` wins when set; otherwise `level` (default `info`) applies to
/// this crate and the engine, with everything else at `warn`.
pub fn init_logging(level: Option<&str>) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(f) => f,
        Err(_) => {
            let level = level.unwrap_or("info");
            EnvFilter::try_new(format!("warn,haar={level},haar_core={level}"))?
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow!("installing tracing subscriber: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_malformed_level() {
        if std::env::var_os("RUST_LOG").is_none() {
            assert!(init_logging(Some("not a level!")).is_err());
        }
    }
}
