use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// `$CARTOLA_HOME`, else `~/.cartola`
pub fn cartola_home() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("CARTOLA_HOME") {
        return Ok(PathBuf::from(dir));
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".cartola"))
}

pub fn ensure_cartola_home() -> Result<PathBuf> {
    let dir = cartola_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}
