pub mod temp;

use anyhow::{Context, Result};
use chrono::Local;
use std::path::PathBuf;
use which::which;

/// Finds an external executable in the system PATH, failing with guidance
/// when the tool is not installed.
pub fn find_executable(tool: &str) -> Result<PathBuf> {
    which(tool).with_context(|| {
        format!("{tool} executable not found in PATH. Please ensure it is installed and in your PATH.")
    })
}

/// Default artifact file name for a backup started now, e.g.
/// `mysql_dump_20240131_154500.sql`.
pub fn timestamped_file_name(prefix: &str, extension: &str) -> String {
    let date = Local::now().format("%Y%m%d_%H%M%S");
    format!("{prefix}_{date}.{extension}")
}
