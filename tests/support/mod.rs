use std::fs;
use std::path::PathBuf;

use lopdf::{Document, Object, dictionary};
use tempfile::TempDir;
use texpreview::{PreviewSink, RenderArtifact, RenderError};

/// Serialize a one-page PDF of the given size.
pub fn fixture_pdf(width: i64, height: i64) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(width),
            Object::Integer(height),
        ],
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::from(page_id)],
            "Count" => Object::Integer(1),
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("serialize fixture pdf");
    bytes
}

/// A shell script posing as `pdflatex`.
///
/// Like `pdflatex` it exits 1 when the source file is missing. It records the
/// formula line of every source it is given, exits 1 for formulas containing
/// `bad`, 2 for formulas containing `crash`, and otherwise
/// copies a fixture PDF into its working directory after `delay` seconds.
pub struct FakeCompiler {
    _dir: TempDir,
    pub path: PathBuf,
    pub log: PathBuf,
}

impl FakeCompiler {
    pub fn new(delay: &str) -> Self {
        Self::with_page(delay, 60, 20)
    }

    pub fn with_page(delay: &str, width: i64, height: i64) -> Self {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().expect("tempdir");
        let fixture = dir.path().join("fixture.pdf");
        fs::write(&fixture, fixture_pdf(width, height)).expect("write fixture");
        let log = dir.path().join("calls.log");
        let path = dir.path().join("fakelatex");

        let script = format!(
            r#"#!/bin/sh
for arg; do src="$arg"; done
[ -f "$src" ] || exit 1
formula=$(sed -n 6p "$src")
printf '%s\n' "$formula" >> '{log}'
case "$formula" in
  *bad*) exit 1 ;;
  *crash*) exit 2 ;;
esac
sleep {delay}
cp '{fixture}' tex.pdf
"#,
            log = log.display(),
            fixture = fixture.display(),
        );
        fs::write(&path, script).expect("write script");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).expect("chmod");

        Self {
            _dir: dir,
            path,
            log,
        }
    }

    /// Formulas the script was invoked with, in order.
    pub fn calls(&self) -> Vec<String> {
        fs::read_to_string(&self.log)
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }
}

#[derive(Debug, Default)]
pub struct RecordingSink {
    pub previews: Vec<String>,
    pub errors: Vec<String>,
    pub error_text: Option<String>,
    pub confirm_enabled: Vec<bool>,
}

impl PreviewSink for RecordingSink {
    fn show_preview(&mut self, _artifact: &RenderArtifact, formula: &str) {
        self.previews.push(formula.to_string());
    }

    fn set_error_text(&mut self, text: Option<&str>) {
        self.error_text = text.map(str::to_string);
    }

    fn set_confirm_enabled(&mut self, enabled: bool) {
        self.confirm_enabled.push(enabled);
    }

    fn report_error(&mut self, error: &RenderError) {
        self.errors.push(error.to_string());
    }
}
