//! Path management for notary configuration and data files.
//!
//! # Directory Structure
//!
//! ```text
//! <config_dir>/notary/          # e.g. ~/.config/notary/
//! └── config.toml               # Application configuration
//!
//! <data_dir>/notary/            # e.g. ~/.local/share/notary/ (or storage.data_dir)
//! ├── sessions/                 # One TOML file per session aggregate
//! │   └── <session-id>.toml
//! └── tokens.toml               # Issued access tokens
//! ```

use notary_core::error::{NotaryError, Result};
use std::path::{Path, PathBuf};

const APP_DIR: &str = "notary";

pub struct NotaryPaths;

impl NotaryPaths {
    /// Returns the notary configuration directory.
    ///
    /// # Errors
    ///
    /// `Config` when the platform has no configuration directory.
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or_else(|| NotaryError::config("Cannot find configuration directory"))
    }

    /// Returns the default data directory (used when `storage.data_dir` is unset).
    pub fn data_dir() -> Result<PathBuf> {
        dirs::data_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or_else(|| NotaryError::config("Cannot find data directory"))
    }

    pub fn config_file() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    pub fn sessions_dir(data_dir: &Path) -> PathBuf {
        data_dir.join("sessions")
    }

    pub fn tokens_file(data_dir: &Path) -> PathBuf {
        data_dir.join("tokens.toml")
    }
}
