use anyhow::{Context, Result};
use log::debug;

use super::raw::RawConfig;
use super::resolved::ResolvedConfig;
use super::sources::build_config;
use crate::cli::CliArgs;

/// Resolve the session settings: defaults, config files, `TEXPREVIEW__*`
/// variables, then command-line flags.
pub fn load(cli: &CliArgs) -> Result<ResolvedConfig> {
    let mut raw: RawConfig = build_config(cli)?
        .try_deserialize()
        .context("invalid texpreview configuration")?;
    raw.apply_cli_overrides(cli);

    let resolved = raw.resolve()?;
    debug!("session options: {:?}", resolved.session);
    Ok(resolved)
}
