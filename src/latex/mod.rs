//! Formula rendering: source generation, the compiler runner, the preview
//! state machine and image materialization.

pub mod artifact;
pub mod controller;
pub mod events;
pub mod materialize;
pub mod runner;
pub mod sink;
pub mod slot;
pub mod template;

pub use artifact::{PageSize, RenderArtifact};
pub use controller::{CompletionOutcome, PipelineState, PreviewController};
pub use events::{Completion, ExitOutcome, PipelineEvent};
pub use materialize::{DEFAULT_MIN_WIDTH, ImageMaterializer, PlacementHint, TexImage};
pub use runner::{RenderBackend, TexRunner, find_executable, find_executable_in};
pub use sink::{INVALID_FORMULA_MESSAGE, LogSink, PreviewSink};
pub use slot::{RenderKind, RenderRequest, RenderSlot};
