pub mod http;

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Directory holding `config.json`. `SMSBRIDGE_HOME` wins over `~/.smsbridge`.
pub fn get_smsbridge_home() -> Result<PathBuf> {
    if let Some(home) = std::env::var_os("SMSBRIDGE_HOME") {
        return Ok(PathBuf::from(home));
    }
    Ok(dirs::home_dir()
        .context("Could not determine home directory")?
        .join(".smsbridge"))
}
