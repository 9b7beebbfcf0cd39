//! Two-scope secret lookup for the transmission token
//!
//! Script scope is the process environment (a `.env` file is loaded at
//! startup); user scope is a `secrets.toml` under the user config
//! directory. Script scope wins.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub const TOKEN_KEY: &str = "SPARKPOST_TOKEN";

/// The transmission API token, or an error telling the operator where to
/// put it
pub fn sparkpost_token() -> Result<String> {
    lookup(TOKEN_KEY)?.with_context(|| {
        format!(
            "{} is not configured; set it in the environment or in {}",
            TOKEN_KEY,
            secrets_path()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|_| "the user secrets file".to_string())
        )
    })
}

/// Look a key up in script scope first, then user scope
pub fn lookup(key: &str) -> Result<Option<String>> {
    if let Ok(value) = env::var(key) {
        if !value.is_empty() {
            return Ok(Some(value));
        }
    }
    user_scope(key, &secrets_path()?)
}

fn secrets_path() -> Result<PathBuf> {
    let base = dirs::config_dir().context("No user config directory available")?;
    Ok(base.join("orderwatch").join("secrets.toml"))
}

fn user_scope(key: &str, path: &Path) -> Result<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read secrets file: {}", path.display()))?;
    let table: toml::Table = raw
        .parse()
        .with_context(|| format!("Invalid secrets file: {}", path.display()))?;
    Ok(table
        .get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .map(str::to_string))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_scope_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secrets.toml");
        fs::write(&path, "SPARKPOST_TOKEN = \"abc123\"\n").unwrap();

        assert_eq!(
            user_scope(TOKEN_KEY, &path).unwrap(),
            Some("abc123".to_string())
        );
        assert_eq!(user_scope("OTHER_KEY", &path).unwrap(), None);
    }

    #[test]
    fn test_user_scope_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            user_scope(TOKEN_KEY, &dir.path().join("nope.toml")).unwrap(),
            None
        );
    }

    #[test]
    fn test_user_scope_empty_value_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secrets.toml");
        fs::write(&path, "SPARKPOST_TOKEN = \"\"\n").unwrap();
        assert_eq!(user_scope(TOKEN_KEY, &path).unwrap(), None);
    }
}
