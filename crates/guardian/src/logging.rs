//! Daily-rotating log file kept next to console output.
//!
//! Files are named `guardian.<date>.log`; only the newest
//! [`LOG_FILES_KEPT`] survive a rotation.

use std::path::Path;
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};

pub const DEFAULT_LOG_DIR: &str = "logs";
pub const LOG_FILES_KEPT: usize = 7;

/// Build the rotating appender, creating `dir` if needed.
pub fn file_appender(dir: &Path) -> Result<RollingFileAppender, InitError> {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("guardian")
        .filename_suffix("log")
        .max_log_files(LOG_FILES_KEPT)
        .build(dir)
}
