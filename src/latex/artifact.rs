//! Decoded compiler output.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use lopdf::{Document, Object, ObjectId};

use crate::error::RenderError;

/// Page trees deeper than this are treated as malformed.
const MAX_PAGE_TREE_DEPTH: usize = 32;

/// Size of a page in PDF points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
}

impl PageSize {
    /// Width over height, or zero when the ratio is not a finite number.
    pub fn aspect_ratio(&self) -> f64 {
        let ratio = self.width / self.height;
        if ratio.is_finite() { ratio } else { 0.0 }
    }
}

/// A successfully compiled formula: the decoded PDF plus the bytes it was
/// decoded from.
///
/// Artifacts are never edited; a newer render replaces the whole value.
pub struct RenderArtifact {
    path: Option<PathBuf>,
    document: Document,
    bytes: Vec<u8>,
    pages: Vec<PageSize>,
}

impl RenderArtifact {
    /// Read and decode the PDF at `path`.
    pub fn load(path: &Path) -> Result<Self, RenderError> {
        let origin = Some(path);
        if !path.exists() {
            return Err(RenderError::artifact_load(origin, "file does not exist"));
        }
        let bytes = fs::read(path).map_err(|err| RenderError::artifact_load(origin, err))?;
        let mut artifact =
            Self::from_bytes(bytes).map_err(|reason| RenderError::artifact_load(origin, reason))?;
        artifact.path = Some(path.to_path_buf());
        Ok(artifact)
    }

    /// Decode PDF bytes that are already in memory.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, String> {
        let document = Document::load_mem(&bytes).map_err(|err| err.to_string())?;
        let pages = document
            .get_pages()
            .into_values()
            .map(|page_id| {
                page_size(&document, page_id)
                    .ok_or_else(|| format!("page {} {} has no usable MediaBox", page_id.0, page_id.1))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            path: None,
            document,
            bytes,
            pages,
        })
    }

    /// The file the artifact was loaded from.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn first_page(&self) -> Option<PageSize> {
        self.pages.first().copied()
    }

    /// The raw PDF, as stored alongside an inserted image.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn document(&self) -> &Document {
        &self.document
    }
}

impl fmt::Debug for RenderArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderArtifact")
            .field("path", &self.path)
            .field("bytes", &self.bytes.len())
            .field("pages", &self.pages)
            .finish()
    }
}

/// Resolve a page's MediaBox, following `Parent` links for inherited values.
fn page_size(document: &Document, page_id: ObjectId) -> Option<PageSize> {
    let mut current = page_id;
    for _ in 0..MAX_PAGE_TREE_DEPTH {
        let dict = document.get_dictionary(current).ok()?;
        if let Ok(media_box) = dict.get(b"MediaBox") {
            return media_box_size(document, media_box);
        }
        current = dict.get(b"Parent").and_then(Object::as_reference).ok()?;
    }
    None
}

fn media_box_size(document: &Document, object: &Object) -> Option<PageSize> {
    let values = resolve(document, object).as_array().ok()?;
    if values.len() != 4 {
        return None;
    }
    let mut coords = [0.0_f64; 4];
    for (slot, value) in coords.iter_mut().zip(values) {
        *slot = number(resolve(document, value))?;
    }
    Some(PageSize {
        width: (coords[2] - coords[0]).abs(),
        height: (coords[3] - coords[1]).abs(),
    })
}

fn resolve<'a>(document: &'a Document, object: &'a Object) -> &'a Object {
    match object {
        Object::Reference(id) => document.get_object(*id).unwrap_or(object),
        other => other,
    }
}

fn number(object: &Object) -> Option<f64> {
    match object {
        Object::Integer(value) => Some(*value as f64),
        Object::Real(value) => Some(f64::from(*value)),
        _ => None,
    }
}
