//! Logger setup

use log::info;
use std::path::Path;
use thiserror::Error;

pub use log::LevelFilter;

/// Errors associated with initialising the logger.
#[derive(Debug, Error)]
pub enum LoggerInitError {
    #[error("Error initialising the log file: {0}")]
    LogFile(#[from] std::io::Error),

    #[error("An error occured while setting up the logger: {0}")]
    Fern(#[from] log::SetLoggerError),
}

/// Initialise the logger for this execution.
///
/// Records go to stdout and, if `log_file` is given, are appended to that
/// file as well. Must only be called once per process.
pub fn logger_init(min_level: LevelFilter, log_file: Option<&Path>) -> Result<(), LoggerInitError> {
    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            // Include the target for debug and trace output only
            if record.level() > log::Level::Info {
                out.finish(format_args!(
                    "[{} {:5}] {}: {}",
                    chrono::Local::now().format("%H:%M:%S%.3f"),
                    record.level(),
                    record.target(),
                    message
                ))
            } else {
                out.finish(format_args!(
                    "[{} {:5}] {}",
                    chrono::Local::now().format("%H:%M:%S%.3f"),
                    record.level(),
                    message
                ))
            }
        })
        .level(min_level)
        .chain(std::io::stdout());

    if let Some(path) = log_file {
        dispatch = dispatch.chain(fern::log_file(path)?);
    }

    dispatch.apply()?;

    info!("Logging initialised");
    info!("    Log level: {:?}", min_level);
    if let Some(path) = log_file {
        info!("    Log file path: {:?}", path);
    }

    Ok(())
}
