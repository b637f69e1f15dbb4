use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Failures produced while rendering a formula.
///
/// [`RenderError::InvalidFormula`] is an expected state of the editing flow and is
/// never surfaced through [`PreviewSink::report_error`](crate::PreviewSink::report_error);
/// every other variant is.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The typesetting executable could not be located.
    #[error(
        "could not find {name} in PATH; please install it first and make sure it's in the PATH"
    )]
    ExecutableNotFound { name: String },

    /// The generated source file could not be written.
    #[error("could not save .tex file {}: {source}", path.display())]
    FileWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The compiler process (or its completion watcher) could not be started.
    #[error("could not start {}: {source}", program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The compiler rejected the formula, or it rendered to nothing.
    #[error("the formula is empty when rendered or invalid")]
    InvalidFormula,

    /// The compiler exited abnormally for a reason other than the formula.
    #[error("{program} encountered an error: {description}")]
    ProcessFault {
        program: String,
        code: Option<i32>,
        description: String,
    },

    /// The compiled output could not be read or decoded. `path` is unset for
    /// documents decoded from memory.
    #[error("could not load LaTeX PDF {}: {reason}", origin(path.as_deref()))]
    ArtifactLoad {
        path: Option<PathBuf>,
        reason: String,
    },
}

impl RenderError {
    pub(crate) fn artifact_load(path: Option<&Path>, reason: impl ToString) -> Self {
        Self::ArtifactLoad {
            path: path.map(Path::to_path_buf),
            reason: reason.to_string(),
        }
    }

    /// Whether the error should be shown to the user as a dialog.
    pub fn is_surfaced(&self) -> bool {
        !matches!(self, Self::InvalidFormula)
    }

    /// Whether the preview pipeline has already shown this error through its
    /// [`PreviewSink`](crate::PreviewSink), as a dialog or as the inline
    /// invalid-formula text. Only a failed executable lookup happens before
    /// any pipeline exists.
    pub fn reaches_sink(&self) -> bool {
        !matches!(self, Self::ExecutableNotFound { .. })
    }
}

fn origin(path: Option<&Path>) -> String {
    match path {
        Some(path) => format!("file {}", path.display()),
        None => "from memory".to_string(),
    }
}
