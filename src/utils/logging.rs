//! Tracing subscriber setup for binaries and tests that embed the protocol.
//!
//! The library itself only emits `tracing` events; nothing is printed unless the
//! embedding application installs a subscriber, either its own or the one built here.

use crate::config::LoggingConfig;
use crate::error::{ProtocolError, Result};
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing::info;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};

/// Install a global fmt subscriber described by `config`.
///
/// Only one global subscriber can exist per process; calling this again returns
/// [`ProtocolError::ConfigError`] rather than replacing or panicking.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let problems = config.validate();
    if !problems.is_empty() {
        return Err(ProtocolError::ConfigError(problems.join("; ")));
    }

    let file = match (config.log_to_file, config.log_file_path.as_deref()) {
        (true, Some(path)) => Some(
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| ProtocolError::ConfigError(format!("Failed to open log file: {e}")))?,
        ),
        _ => None,
    };

    let writer = match file {
        Some(file) if config.log_to_console => {
            BoxMakeWriter::new(std::io::stderr.and(Mutex::new(file)))
        }
        Some(file) => BoxMakeWriter::new(Mutex::new(file)),
        None => BoxMakeWriter::new(std::io::stderr),
    };

    let builder = tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_target(true)
        .with_writer(writer);

    let installed = if config.json_format {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    installed.map_err(|e| {
        ProtocolError::ConfigError(format!("Failed to install tracing subscriber: {e}"))
    })?;

    info!(app = %config.app_name, level = %config.log_level, "logging initialized");
    Ok(())
}
