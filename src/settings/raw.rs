use std::path::PathBuf;

use anyhow::{Result, ensure};
use serde::Deserialize;
use texpreview::SessionOptions;

use crate::cli::CliArgs;

use super::resolved::ResolvedConfig;

/// Mirror of the configuration file representation before CLI overrides and
/// validation are applied.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(super) struct RawConfig {
    tex: TexSection,
    placement: PlacementSection,
    editor: EditorSection,
}

/// Compiler invocation settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct TexSection {
    executable: Option<String>,
    flags: Option<Vec<String>>,
    work_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct PlacementSection {
    min_width: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct EditorSection {
    initial_formula: Option<String>,
}

impl RawConfig {
    /// Apply CLI overrides on top of the raw configuration values.
    pub(super) fn apply_cli_overrides(&mut self, cli: &CliArgs) {
        if let Some(executable) = cli.executable.clone() {
            self.tex.executable = Some(executable);
        }
        if let Some(work_dir) = cli.work_dir.clone() {
            self.tex.work_dir = Some(work_dir);
        }
        if let Some(min_width) = cli.min_width {
            self.placement.min_width = Some(min_width);
        }
    }

    /// Validate the raw values and fill in defaults.
    pub(super) fn resolve(self) -> Result<ResolvedConfig> {
        let defaults = SessionOptions::default();

        let executable = self
            .tex
            .executable
            .map(|value| value.trim().to_string())
            .unwrap_or(defaults.executable);
        ensure!(!executable.is_empty(), "tex.executable must not be empty");

        let min_width = self.placement.min_width.unwrap_or(defaults.min_width);
        ensure!(
            min_width.is_finite() && min_width > 0.0,
            "placement.min_width must be a positive number (got {min_width})"
        );

        let flags = self
            .tex
            .flags
            .map(|flags| {
                flags
                    .into_iter()
                    .map(|flag| flag.trim().to_string())
                    .filter(|flag| !flag.is_empty())
                    .collect()
            })
            .unwrap_or(defaults.flags);

        Ok(ResolvedConfig {
            session: SessionOptions {
                executable,
                flags,
                work_dir: self.tex.work_dir.unwrap_or(defaults.work_dir),
                initial_formula: self
                    .editor
                    .initial_formula
                    .unwrap_or(defaults.initial_formula),
                min_width,
            },
        })
    }
}
