//! File writer for the logger

use crate::logger::config::FileConfig;
use crate::logger::error::LoggerError;
use std::fs::{File, OpenOptions};
use std::sync::Mutex;

/// Opens the configured log file, creating parent directories as needed.
///
/// `Mutex<File>` implements `MakeWriter`, so the result plugs straight into a
/// `fmt::layer().with_writer(..)`.
pub fn open_log_file(config: &FileConfig) -> Result<Mutex<File>, LoggerError> {
    if let Some(parent) = config.path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    let mut options = OpenOptions::new();
    options.create(true);
    if config.append {
        options.append(true);
    } else {
        options.write(true).truncate(true);
    }

    let file = options.open(&config.path).map_err(|e| {
        LoggerError::config(format!(
            "cannot open log file {}: {}",
            config.path.display(),
            e
        ))
    })?;
    Ok(Mutex::new(file))
}
