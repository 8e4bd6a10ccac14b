//! Path Utilities
//!
//! Resolves the failscope configuration directory (`~/.failscope/`).

use std::path::PathBuf;

use crate::utils::error::{AppError, AppResult};

/// Get the user's home directory
pub fn home_dir() -> AppResult<PathBuf> {
    dirs::home_dir().ok_or_else(|| AppError::config("Could not determine home directory"))
}

/// Get the failscope directory (~/.failscope/)
pub fn failscope_dir() -> AppResult<PathBuf> {
    Ok(home_dir()?.join(".failscope"))
}

/// Get the config file path (~/.failscope/config.json)
pub fn config_path() -> AppResult<PathBuf> {
    Ok(failscope_dir()?.join("config.json"))
}
