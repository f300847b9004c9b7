//! Configuration file discovery and session-cookie persistence.
//!
//! The config file is TOML:
//!
//! ```toml
//! [api]
//! base_url = "https://papers.example.org"
//! timeout_secs = 30
//! ```
//!
//! Lookup order: `$PAPERSCOPE_CONFIG`, then
//! `<user config dir>/paperscope/config.toml`, then `./paperscope.toml`.

use std::fs;
use std::io;
use std::path::PathBuf;

/// Locate the configuration file, if any exists
pub fn find_config_file() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("PAPERSCOPE_CONFIG") {
        let path = PathBuf::from(path);
        if path.exists() {
            return Some(path);
        }
    }

    if let Some(config_dir) = dirs::config_dir() {
        let path = config_dir.join("paperscope").join("config.toml");
        if path.exists() {
            return Some(path);
        }
    }

    let local = PathBuf::from("paperscope.toml");
    local.exists().then_some(local)
}

/// Persists the session cookie between CLI invocations.
///
/// The cookie returned by the login endpoint is written to a file under the
/// user config dir and replayed on later runs; a forced logout deletes it.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    /// Store at the default per-user location
    pub fn new() -> Self {
        let base = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            path: base.join("paperscope").join("session"),
        }
    }

    /// Store at an explicit path
    pub fn at(path: PathBuf) -> Self {
        Self { path }
    }

    /// Where the cookie lives
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Read the persisted cookie, if one exists
    pub fn load(&self) -> Option<String> {
        match fs::read_to_string(&self.path) {
            Ok(cookie) => {
                let cookie = cookie.trim().to_string();
                (!cookie.is_empty()).then_some(cookie)
            }
            Err(_) => None,
        }
    }

    /// Persist `cookie`, creating parent directories as needed
    pub fn save(&self, cookie: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, cookie)
    }

    /// Delete the persisted cookie; missing files are not an error
    pub fn clear(&self) -> io::Result<()> {
        match fs::remove_file(&self.path) {
            Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err),
            _ => Ok(()),
        }
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
