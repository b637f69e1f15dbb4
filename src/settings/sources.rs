use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use log::debug;
use texpreview::{SessionOptions, app_dirs};

use crate::cli::CliArgs;

/// Prefix of environment overrides, e.g. `TEXPREVIEW__TEX__EXECUTABLE`.
const ENV_PREFIX: &str = "texpreview";
/// Keys whose environment values are comma separated lists.
const LIST_KEYS: &[&str] = &["tex.flags"];

/// Build a [`Config`] from the session defaults, config files and `TEXPREVIEW__*`
/// environment variables, lowest precedence first.
pub(super) fn build_config(cli: &CliArgs) -> Result<Config> {
    let mut builder = with_session_defaults(Config::builder())?;

    if !cli.no_config {
        for path in default_config_files() {
            if path.is_file() {
                debug!("reading config file {}", path.display());
            }
            builder = builder.add_source(File::from(path).required(false));
        }
    }

    for path in &cli.config {
        debug!("reading config file {}", path.display());
        builder = builder.add_source(File::from(path.clone()).required(true));
    }

    let mut environment = Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .try_parsing(true)
        .list_separator(",");
    for key in LIST_KEYS {
        environment = environment.with_list_parse_key(key);
    }
    builder = builder.add_source(environment);

    builder.build().context("failed to read texpreview configuration")
}

/// Seed the builder with [`SessionOptions::default`] so every key has a value.
fn with_session_defaults(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>> {
    let defaults = SessionOptions::default();
    let builder = builder
        .set_default("tex.executable", defaults.executable)?
        .set_default("tex.flags", defaults.flags)?
        .set_default("tex.work_dir", defaults.work_dir.to_string_lossy().into_owned())?
        .set_default("placement.min_width", defaults.min_width)?
        .set_default("editor.initial_formula", defaults.initial_formula)?;
    Ok(builder)
}

/// Config files consulted unless `--no-config` is given: the user config and
/// `.texpreview.toml`/`texpreview.toml` in the current directory.
pub(super) fn default_config_files() -> Vec<PathBuf> {
    let mut files = Vec::new();

    if let Ok(dir) = app_dirs::get_config_dir() {
        files.push(dir.join("config.toml"));
    }

    if let Ok(current_dir) = env::current_dir() {
        files.push(current_dir.join(".texpreview.toml"));
        files.push(current_dir.join("texpreview.toml"));
    }

    files
}
