//! Logging and tracing initialization.
//!
//! Event creators log under the `inkframe_event_core::creators` target, so
//! their verbosity can be raised without flooding the rest of a run.

use std::fs::OpenOptions;
use std::sync::Mutex;

use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LoggingConfig;
use crate::error::{InkframeError, InkframeResult};

/// Target prefix shared by every event creator.
pub const CREATOR_TARGET: &str = "inkframe_event_core::creators";

/// Filter directives for `config`: the base level, plus a creator override
/// when one is set.
pub fn filter_directives(config: &LoggingConfig) -> String {
    match &config.creator_level {
        Some(level) => format!("{},{CREATOR_TARGET}={level}", config.level),
        None => config.level.clone(),
    }
}

/// Initialize the tracing subscriber with the given configuration.
///
/// `RUST_LOG` takes precedence over the configured directives. With a log
/// file set, output is appended to it without ANSI colors.
pub fn init_logging(config: &LoggingConfig) -> InkframeResult<()> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(filter_directives(config))
            .map_err(|e| InkframeError::config(format!("invalid log filter: {e}")))?,
    };

    let (writer, ansi) = match &config.file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            (BoxMakeWriter::new(Mutex::new(file)), false)
        }
        None => (BoxMakeWriter::new(std::io::stdout), true),
    };

    if config.json {
        let subscriber = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .with_writer(writer)
            .json()
            .finish();
        tracing::subscriber::set_global_default(subscriber).ok();
    } else {
        let subscriber = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .with_writer(writer)
            .with_ansi(ansi)
            .with_target(true)
            .with_thread_names(true)
            .with_file(false)
            .with_line_number(false)
            .finish();
        tracing::subscriber::set_global_default(subscriber).ok();
    }
    Ok(())
}

/// Initialize logging with defaults (useful for tests and quick scripts).
pub fn init_default_logging() {
    init_logging(&LoggingConfig::default()).ok();
}
