//! Resolve configuration and cache directories for `texpreview`.
//!
//! Environment overrides win; otherwise the platform locations provided by the
//! `directories` crate are used.

use std::env;
use std::path::PathBuf;

use anyhow::{Result, anyhow};
use directories::ProjectDirs;

const QUALIFIER: &str = "io";
const ORGANIZATION: &str = "texpreview";
const APPLICATION: &str = "texpreview";

const CONFIG_DIR_ENV: &str = "TEXPREVIEW_CONFIG_DIR";
const CACHE_DIR_ENV: &str = "TEXPREVIEW_CACHE_DIR";

/// Subdirectory of the cache holding the generated source and PDF.
const WORK_SUBDIR: &str = "tex";

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION)
        .ok_or_else(|| anyhow!("unable to determine project directories for texpreview"))
}

/// Resolve an override directory from an environment variable.
///
/// An empty value counts as unset.
fn dir_from_env(name: &str) -> Option<PathBuf> {
    let value = env::var_os(name)?;
    if value.is_empty() {
        None
    } else {
        Some(PathBuf::from(value))
    }
}

/// Return the configuration directory used to persist user preferences.
pub fn get_config_dir() -> Result<PathBuf> {
    if let Some(dir) = dir_from_env(CONFIG_DIR_ENV) {
        return Ok(dir);
    }

    Ok(project_dirs()?.config_local_dir().to_path_buf())
}

/// Return the per-user cache directory.
pub fn get_cache_dir() -> Result<PathBuf> {
    if let Some(dir) = dir_from_env(CACHE_DIR_ENV) {
        return Ok(dir);
    }

    Ok(project_dirs()?.cache_dir().to_path_buf())
}

/// Working directory for compiler runs, falling back to the system temp dir
/// when no cache directory can be determined.
pub fn default_work_dir() -> PathBuf {
    get_cache_dir()
        .unwrap_or_else(|_| env::temp_dir().join(APPLICATION))
        .join(WORK_SUBDIR)
}
