//! Logging setup.
//!
//! Standard output carries the credential document, so log records go to
//! `aws_mfa_log.txt` in the state directory, or to standard error when that
//! file cannot be opened.

use std::{
    fs::{File, OpenOptions},
    path::Path,
};

use anyhow::{Context, Result};
use env_logger::{Builder, Target};
use log::LevelFilter;

pub const LOG_FILE_NAME: &str = "aws_mfa_log.txt";

/// Opens the log file in append mode, creating it owner-only.
pub fn open_log_file(dir: &Path) -> Result<File> {
    let path = dir.join(LOG_FILE_NAME);
    let mut options = OpenOptions::new();
    options.create(true).append(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options
        .open(&path)
        .with_context(|| format!("opening log file {}", path.display()))
}

/// Installs the global logger at INFO, overridable through `RUST_LOG`.
///
/// Returns the reason file logging is unavailable, if it is.
pub fn init(dir: &Path) -> Option<anyhow::Error> {
    let mut builder = Builder::new();
    builder.filter_level(LevelFilter::Info).parse_default_env();

    let fallback = match open_log_file(dir) {
        Ok(file) => {
            builder.target(Target::Pipe(Box::new(file)));
            None
        }
        Err(e) => {
            builder.target(Target::Stderr);
            Some(e)
        }
    };

    builder.init();
    fallback
}
