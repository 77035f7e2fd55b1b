//! Credentials file handling
//!
//! The auth file is two plaintext lines: username then password. The
//! password is handed over by value exactly once and dropped as soon as the
//! login call has used it; best-effort hygiene, not a security guarantee.

use std::path::Path;

use crate::error::{CliError, Result};

/// Login credentials read from an auth file
#[derive(Debug)]
pub struct Credentials {
    pub username: String,
    password: Option<String>,
}

impl Credentials {
    /// Read credentials from a two-line file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            CliError::credentials(format!("cannot read '{}': {}", path.display(), e))
        })?;

        let mut lines = content.lines();
        let username = lines
            .next()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                CliError::credentials(format!("'{}' is missing the username line", path.display()))
            })?
            .to_string();
        let password = lines
            .next()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                CliError::credentials(format!("'{}' is missing the password line", path.display()))
            })?
            .to_string();

        Ok(Self {
            username,
            password: Some(password),
        })
    }

    /// Move the password out; callable once
    pub fn take_password(&mut self) -> Result<String> {
        self.password
            .take()
            .ok_or_else(|| CliError::credentials("password already consumed".to_string()))
    }
}
