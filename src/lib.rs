//! Asynchronous LaTeX formula previews for note documents.
//!
//! The root module re-exports the pieces embedders need: the preview
//! controller and its collaborators, the document interface and the session
//! that ties them together.

pub mod app_dirs;
pub mod document;
pub mod error;
pub mod latex;
pub mod logging;
pub mod session;

pub use document::{DocumentHost, Element, ElementId, MemoryDocument, SelectedElement, TextElement, UndoAction};
pub use error::RenderError;
pub use latex::{
    Completion, CompletionOutcome, ExitOutcome, ImageMaterializer, PipelineEvent, PipelineState,
    PlacementHint, PreviewController, PreviewSink, RenderArtifact, RenderBackend, RenderKind,
    TexImage, TexRunner,
};
pub use session::{LatexSession, SessionOptions, SessionOutcome};
