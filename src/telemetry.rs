//! Logging setup
//!
//! Console logs go to stderr so stdout carries only command output. An optional
//! log directory receives JSON logs through a daily rolling file.

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_FILE_PREFIX: &str = "story_agent.log";

/// Keeps the file writer flushing until dropped
pub struct Telemetry {
    _file_guard: Option<WorkerGuard>,
}

impl Telemetry {
    /// Install the global subscriber. `RUST_LOG` overrides the default filter.
    pub fn init(log_dir: Option<&Path>, verbose: bool) -> anyhow::Result<Self> {
        let make_env_filter = || {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                if verbose {
                    EnvFilter::new("debug,hyper=info,reqwest=info,h2=info,rustls=info")
                } else {
                    EnvFilter::new("warn")
                }
            })
        };

        let console = fmt::layer()
            .with_target(false)
            .compact()
            .with_writer(std::io::stderr);

        let file_guard = if let Some(log_dir) = log_dir {
            std::fs::create_dir_all(log_dir)?;
            let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

            tracing_subscriber::registry()
                .with(make_env_filter())
                .with(console)
                .with(fmt::layer().json().with_writer(non_blocking))
                .try_init()
                .ok();
            Some(guard)
        } else {
            tracing_subscriber::registry()
                .with(make_env_filter())
                .with(console)
                .try_init()
                .ok();
            None
        };

        tracing::debug!(
            log_dir = ?log_dir.map(|d| d.display().to_string()),
            verbose = verbose,
            "Telemetry initialized"
        );

        Ok(Self {
            _file_guard: file_guard,
        })
    }
}
