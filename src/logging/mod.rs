//! Logging and output control
//!
//! This module provides the [`Logger`] handle that every operation struct carries.
//! Diagnostics are emitted as `tracing` events so the host process decides where
//! they go; the listing helpers print user-facing tables for the CLI.

use tracing_subscriber::EnvFilter;

/// Logger responsible for diagnostics and user-visible output.
///
/// Which diagnostics appear is decided by the installed `tracing` filter
/// (see [`init_tracing`]); `quiet` only silences the printed listings.
#[derive(Debug, Clone, Default)]
pub struct Logger {
    pub quiet: bool,
}

impl Logger {
    pub fn new() -> Self {
        Self { quiet: false }
    }

    pub fn new_quiet() -> Self {
        Self { quiet: true }
    }

    pub fn verbose(&self, message: &str) {
        tracing::debug!(target: "registry", "{}", message);
    }

    /// Detailed information, emitted at trace level
    pub fn detail(&self, message: &str) {
        tracing::trace!(target: "registry", "{}", message);
    }

    pub fn info(&self, message: &str) {
        tracing::info!(target: "registry", "{}", message);
    }

    pub fn success(&self, message: &str) {
        tracing::info!(target: "registry", outcome = "ok", "{}", message);
    }

    pub fn warning(&self, message: &str) {
        tracing::warn!(target: "registry", "{}", message);
    }

    pub fn error(&self, message: &str) {
        tracing::error!(target: "registry", "{}", message);
    }

    /// Main section heading
    pub fn section(&self, title: &str) {
        if !self.quiet {
            println!("\n=== {} ===", title);
        }
    }

    /// Sub-section heading
    pub fn subsection(&self, title: &str) {
        if !self.quiet {
            println!("\n--- {} ---", title);
        }
    }

    /// Key-value pair summary display
    pub fn summary_kv(&self, title: &str, items: &[(&str, String)]) {
        if !self.quiet {
            self.subsection(title);
            for (key, value) in items {
                println!("  {}: {}", key, value);
            }
        }
    }

    // Structured list output
    pub fn list(&self, title: &str, items: &[String]) {
        if !self.quiet {
            self.subsection(title);
            for (i, item) in items.iter().enumerate() {
                println!("  {}. {}", i + 1, item);
            }

            if items.is_empty() {
                println!("  (No items to display)");
            }
        }
    }
}

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` wins when set; otherwise the level is `info`, or `debug` for verbose runs.
pub fn init_tracing(verbose: bool) -> anyhow::Result<()> {
    let default_level = if verbose { "debug,registry=trace" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to init tracing: {}", e))?;

    tracing::debug!("Tracing initialized (verbose = {})", verbose);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_quiet_logger_flags() {
        let logger = Logger::new_quiet();
        assert!(logger.quiet);
        assert!(!Logger::new().quiet);
        // Listing on a quiet logger prints nothing and must not panic
        logger.list("Repositories", &["test1".to_string()]);
    }

    #[test]
    fn test_debug_and_trace_follow_the_subscriber_filter() {
        let buf = SharedBuf::default();
        let writer = buf.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new("registry=trace"))
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        let logger = Logger::new();
        tracing::subscriber::with_default(subscriber, || {
            logger.verbose("listing tags for test1");
            logger.detail("blob sha256:abc is 1024 bytes");
        });

        let output = String::from_utf8(buf.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("listing tags for test1"));
        assert!(output.contains("blob sha256:abc is 1024 bytes"));
    }

    #[test]
    fn test_info_filter_hides_debug() {
        let buf = SharedBuf::default();
        let writer = buf.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new("info"))
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        let logger = Logger::new();
        tracing::subscriber::with_default(subscriber, || {
            logger.verbose("hidden");
            logger.info("shown");
        });

        let output = String::from_utf8(buf.0.lock().unwrap().clone()).unwrap();
        assert!(!output.contains("hidden"));
        assert!(output.contains("shown"));
    }
}
