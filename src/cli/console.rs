use log::info;
use texpreview::{PreviewSink, RenderArtifact, RenderError};

/// Reports preview progress on stderr, standing in for the editor dialog.
#[derive(Debug, Default)]
pub(crate) struct ConsoleSink {
    error_text: Option<String>,
}

impl PreviewSink for ConsoleSink {
    fn show_preview(&mut self, artifact: &RenderArtifact, formula: &str) {
        match artifact.first_page() {
            Some(page) => eprintln!(
                "preview: {formula} ({:.1} x {:.1} pt)",
                page.width, page.height
            ),
            None => eprintln!("preview: {formula} (no pages)"),
        }
    }

    fn set_error_text(&mut self, text: Option<&str>) {
        let text = text.map(str::to_string);
        if text != self.error_text {
            if let Some(message) = &text {
                eprintln!("{message}");
            }
            self.error_text = text;
        }
    }

    fn set_confirm_enabled(&mut self, enabled: bool) {
        info!("confirm {}", if enabled { "enabled" } else { "disabled" });
    }

    fn report_error(&mut self, error: &RenderError) {
        eprintln!("error: {error}");
    }
}
