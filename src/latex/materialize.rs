//! Turning a compiled formula into a placeable document image.

use serde::Serialize;

use super::artifact::RenderArtifact;
use crate::error::RenderError;

/// Width used when neither the rendering nor the replaced element has one.
pub const DEFAULT_MIN_WIDTH: f64 = 10.0;

/// Position and size of the element a new formula image replaces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PlacementHint {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// A formula image ready to be placed on a layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TexImage {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(skip)]
    pub pdf: Vec<u8>,
}

/// Computes placement geometry for rendered formulas.
#[derive(Debug, Clone, Copy)]
pub struct ImageMaterializer {
    hint: Option<PlacementHint>,
    min_width: f64,
}

impl ImageMaterializer {
    pub fn new(hint: Option<PlacementHint>) -> Self {
        Self {
            hint,
            min_width: DEFAULT_MIN_WIDTH,
        }
    }

    pub fn with_min_width(mut self, min_width: f64) -> Self {
        self.min_width = min_width;
        self
    }

    /// Build the image for `formula` from its first rendered page.
    ///
    /// A replaced element with a height keeps that height and takes the
    /// rendering's aspect ratio; otherwise the page's own size is used.
    pub fn materialize(
        &self,
        artifact: &RenderArtifact,
        formula: &str,
    ) -> Result<TexImage, RenderError> {
        let page = artifact.first_page().ok_or_else(|| {
            RenderError::artifact_load(artifact.path(), "rendered document has no pages")
        })?;
        let hint = self.hint.unwrap_or_default();

        let (width, height) = if hint.height != 0.0 {
            let ratio = page.aspect_ratio();
            let width = if ratio != 0.0 {
                hint.height * ratio
            } else if hint.width != 0.0 {
                hint.width
            } else {
                self.min_width
            };
            (width, hint.height)
        } else {
            (page.width, page.height)
        };

        Ok(TexImage {
            text: formula.to_string(),
            x: hint.x,
            y: hint.y,
            width,
            height,
            pdf: artifact.bytes().to_vec(),
        })
    }
}
