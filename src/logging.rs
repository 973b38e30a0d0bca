//! Console logging for the command-line tool

use crate::errors::{FociError, Result};
use log4rs::{
    append::console::{ConsoleAppender, Target},
    config::{Appender, Root},
    encode::pattern::PatternEncoder,
    Config,
};

/// Route `log` records at or above `level` to stderr
///
/// # Errors
///
/// Returns an error if a logger is already installed.
pub fn init_logging(level: log::LevelFilter) -> Result<()> {
    let stderr = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{h({d(%Y-%m-%d %H:%M:%S)} [{l}] {M})} - {m}{n}",
        )))
        .target(Target::Stderr)
        .build();

    let config = Config::builder()
        .appender(Appender::builder().build("stderr", Box::new(stderr)))
        .build(Root::builder().appender("stderr").build(level))
        .map_err(|e| FociError::Generic(format!("Failed to configure logger: {}", e)))?;

    log4rs::init_config(config)
        .map_err(|e| FociError::Generic(format!("Failed to initialize logger: {}", e)))?;
    Ok(())
}
