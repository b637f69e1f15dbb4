use log::{info, warn};

use super::artifact::RenderArtifact;
use crate::error::RenderError;

/// Inline message shown while the current formula cannot be rendered.
pub const INVALID_FORMULA_MESSAGE: &str = "The formula is empty when rendered or invalid.";

/// Receives everything the preview pipeline wants to show the user.
pub trait PreviewSink {
    /// A new preview finished rendering.
    fn show_preview(&mut self, artifact: &RenderArtifact, formula: &str);

    /// Inline error indicator; `None` clears it.
    fn set_error_text(&mut self, text: Option<&str>);

    /// Whether the formula may currently be confirmed.
    fn set_confirm_enabled(&mut self, enabled: bool);

    /// An error that deserves a dialog.
    fn report_error(&mut self, error: &RenderError);
}

/// Sink that only writes to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl PreviewSink for LogSink {
    fn show_preview(&mut self, artifact: &RenderArtifact, formula: &str) {
        info!("preview updated for {formula:?}: {artifact:?}");
    }

    fn set_error_text(&mut self, text: Option<&str>) {
        if let Some(text) = text {
            info!("{text}");
        }
    }

    fn set_confirm_enabled(&mut self, _enabled: bool) {}

    fn report_error(&mut self, error: &RenderError) {
        warn!("{error}");
    }
}

impl<S: PreviewSink + ?Sized> PreviewSink for &mut S {
    fn show_preview(&mut self, artifact: &RenderArtifact, formula: &str) {
        (**self).show_preview(artifact, formula);
    }

    fn set_error_text(&mut self, text: Option<&str>) {
        (**self).set_error_text(text);
    }

    fn set_confirm_enabled(&mut self, enabled: bool) {
        (**self).set_confirm_enabled(enabled);
    }

    fn report_error(&mut self, error: &RenderError) {
        (**self).report_error(error);
    }
}
