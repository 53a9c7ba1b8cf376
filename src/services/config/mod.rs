//! Process configuration loaded once at startup from the environment
//! (optionally seeded from a `.env` file).

use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::services::stl::{ArchiveLimits, MeshAllowList, StlLayout};

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?} ({reason})")]
    Invalid {
        key: String,
        value: String,
        reason: String,
    },
}

/// Settings for the examination STL extraction pipeline.
#[derive(Debug, Clone)]
pub struct StlConfig {
    /// Media sub-area extracted meshes are written under.
    pub subdir: String,
    pub layout: StlLayout,
    pub fetch_timeout: Duration,
    pub limits: ArchiveLimits,
    pub allow_list: MeshAllowList,
}

impl Default for StlConfig {
    fn default() -> Self {
        Self {
            subdir: "stl_files".into(),
            layout: StlLayout::default(),
            fetch_timeout: Duration::from_secs(30),
            limits: ArchiveLimits::default(),
            allow_list: MeshAllowList::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub media_root: PathBuf,
    /// Public URL prefix of the media store, always `/.../`.
    pub media_url: String,
    /// Where uploaded archives are fetched from. `None` means "the host the request came in on".
    pub blob_base_url: Option<String>,
    pub max_upload_bytes: usize,
    pub stl: StlConfig,
}

impl AppConfig {
    /// Load from the process environment, reading `.env` first if present.
    pub fn load() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            log::debug!("No .env file loaded: {e}");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Missing keys fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = StlConfig::default();

        let allow_list = match lookup("STL_ALLOWED_FILES") {
            Some(raw) => parse_allow_list(&raw)?,
            None => defaults.allow_list,
        };

        let stl = StlConfig {
            subdir: try_load(&lookup, "STL_SUBDIR", defaults.subdir)?
                .trim_matches('/')
                .to_string(),
            layout: try_load(&lookup, "STL_LAYOUT", defaults.layout)?,
            fetch_timeout: Duration::from_secs(try_load(
                &lookup,
                "STL_FETCH_TIMEOUT_SECS",
                defaults.fetch_timeout.as_secs(),
            )?),
            limits: ArchiveLimits {
                max_archive_bytes: try_load(
                    &lookup,
                    "STL_MAX_ARCHIVE_BYTES",
                    defaults.limits.max_archive_bytes,
                )?,
                max_entry_bytes: try_load(
                    &lookup,
                    "STL_MAX_ENTRY_BYTES",
                    defaults.limits.max_entry_bytes,
                )?,
            },
            allow_list,
        };

        if stl.subdir.is_empty() {
            return Err(invalid("STL_SUBDIR", "", "must not be empty"));
        }
        if stl.fetch_timeout.is_zero() {
            return Err(invalid("STL_FETCH_TIMEOUT_SECS", "0", "must be at least 1 second"));
        }
        check_byte_limit("STL_MAX_ARCHIVE_BYTES", stl.limits.max_archive_bytes)?;
        check_byte_limit("STL_MAX_ENTRY_BYTES", stl.limits.max_entry_bytes)?;

        Ok(Self {
            port: try_load(&lookup, "PORT", 8000u16)?,
            database_url: try_load(&lookup, "DATABASE_URL", "sqlite://footscan.db".to_string())?,
            media_root: PathBuf::from(try_load(&lookup, "MEDIA_ROOT", "media".to_string())?),
            media_url: normalize_url_prefix(&try_load(&lookup, "MEDIA_URL", "/media/".to_string())?),
            blob_base_url: lookup("BLOB_BASE_URL")
                .map(|v| v.trim().trim_end_matches('/').to_string())
                .filter(|v| !v.is_empty()),
            max_upload_bytes: try_load(&lookup, "MAX_UPLOAD_BYTES", 512 * 1024 * 1024usize)?,
            stl,
        })
    }
}

fn invalid(key: &str, value: &str, reason: impl Display) -> ConfigError {
    ConfigError::Invalid {
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn try_load<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + Display,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|e| {
            log::warn!("Invalid {key} value: {e}");
            invalid(key, &raw, e)
        }),
        None => {
            log::info!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}

/// Upper bound for configured byte limits. Archives are held in memory.
const MAX_BYTE_LIMIT: u64 = 64 * 1024 * 1024 * 1024;

fn check_byte_limit(key: &str, value: u64) -> Result<(), ConfigError> {
    if value == 0 || value > MAX_BYTE_LIMIT {
        return Err(invalid(
            key,
            &value.to_string(),
            format!("must be between 1 and {MAX_BYTE_LIMIT}"),
        ));
    }
    Ok(())
}

fn parse_allow_list(raw: &str) -> Result<MeshAllowList, ConfigError> {
    let names: Vec<&str> = raw
        .split(',')
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .collect();

    if names.is_empty() {
        return Err(invalid("STL_ALLOWED_FILES", raw, "no file names given"));
    }
    if let Some(bad) = names.iter().find(|n| !sanitize_filename::is_sanitized(n)) {
        return Err(invalid("STL_ALLOWED_FILES", raw, format!("unsafe file name {bad:?}")));
    }

    Ok(MeshAllowList::new(names))
}

/// `media`, `/media`, `media/` all become `/media/`.
fn normalize_url_prefix(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{trimmed}/")
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
