use std::process::ExitStatus;

/// How a compiler process ended, as far as the pipeline cares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitOutcome {
    Success,
    /// Exit code 1: the formula did not compile or rendered to nothing.
    InvalidFormula,
    /// Any other non-zero or abnormal termination.
    Fault {
        code: Option<i32>,
        description: String,
    },
}

impl ExitOutcome {
    pub fn from_status(status: ExitStatus) -> Self {
        match status.code() {
            Some(0) => Self::Success,
            Some(1) => Self::InvalidFormula,
            Some(code) => Self::Fault {
                code: Some(code),
                description: format!("exit code: {code}"),
            },
            None => Self::Fault {
                code: None,
                description: format!("terminated abnormally ({status})"),
            },
        }
    }

    pub fn from_code(code: i32) -> Self {
        match code {
            0 => Self::Success,
            1 => Self::InvalidFormula,
            code => Self::Fault {
                code: Some(code),
                description: format!("exit code: {code}"),
            },
        }
    }
}

/// Delivered exactly once for every dispatched render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub id: u64,
    pub outcome: ExitOutcome,
}

/// Messages processed by the editing event loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineEvent {
    /// The formula text was replaced by the editor.
    Edited(String),
    RenderFinished(Completion),
    /// The user asked to insert the current formula.
    Confirm,
    Cancel,
}
