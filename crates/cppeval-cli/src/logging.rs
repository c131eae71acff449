//! Subscriber setup
//!
//! INFO by default, DEBUG with `--debug`, `RUST_LOG` wins over both. Batch
//! runs additionally copy every line to a timestamped log file.

use anyhow::Context;
use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// `evaluation_<YYYYmmdd_HHMMSS>.log` in the working directory
pub(crate) fn log_file_name() -> PathBuf {
    PathBuf::from(format!(
        "evaluation_{}.log",
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    ))
}

pub(crate) fn default_level(debug: bool) -> &'static str {
    if debug {
        "debug"
    } else {
        "info"
    }
}

/// Install the global subscriber
pub(crate) fn init(debug: bool, log_file: Option<PathBuf>) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level(debug)));

    let file_layer = match &log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create log file {}", path.display()))?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(file_layer)
        .try_init()
        .context("failed to install tracing subscriber")?;

    if let Some(path) = log_file {
        tracing::debug!("Logging to {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_file_is_timestamped() {
        let name = log_file_name();
        let name = name.to_string_lossy();
        assert!(name.starts_with("evaluation_"));
        assert!(name.ends_with(".log"));
        // evaluation_ + 8 digits + _ + 6 digits + .log
        assert_eq!(name.len(), "evaluation_".len() + 15 + ".log".len());
    }

    #[test]
    fn debug_raises_level() {
        assert_eq!(default_level(false), "info");
        assert_eq!(default_level(true), "debug");
    }
}
