//! The preview state machine.
//!
//! The controller is either idle or waiting on exactly one compiler run. Edits
//! made while a run is outstanding only update the formula text; when the run
//! completes the controller notices that the rendered snapshot is stale and
//! immediately dispatches a fresh preview, so the preview converges on the last
//! text typed without ever running two compilers at once.

use std::fs;

use log::{debug, warn};

use super::artifact::RenderArtifact;
use super::events::{Completion, ExitOutcome};
use super::materialize::{ImageMaterializer, TexImage};
use super::runner::RenderBackend;
use super::sink::{INVALID_FORMULA_MESSAGE, PreviewSink};
use super::slot::{RenderKind, RenderRequest, RenderSlot};
use crate::error::RenderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Busy,
}

/// What handling a completion amounted to.
#[derive(Debug)]
pub enum CompletionOutcome {
    /// The completion did not belong to the outstanding request.
    Ignored,
    /// A preview artifact replaced the cached one.
    Previewed,
    /// The compiler rejected the formula.
    Invalid,
    /// A final render produced an image ready for insertion.
    Materialized(TexImage),
    /// A surfaced failure (compiler fault or unreadable output).
    Failed(RenderError),
}

pub struct PreviewController<B, S> {
    backend: B,
    sink: S,
    slot: RenderSlot,
    materializer: ImageMaterializer,
    formula: String,
    valid: bool,
    next_id: u64,
}

impl<B: RenderBackend, S: PreviewSink> PreviewController<B, S> {
    pub fn new(
        backend: B,
        sink: S,
        materializer: ImageMaterializer,
        formula: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            sink,
            slot: RenderSlot::new(),
            materializer,
            formula: formula.into(),
            valid: true,
            next_id: 0,
        }
    }

    pub fn formula(&self) -> &str {
        &self.formula
    }

    pub fn state(&self) -> PipelineState {
        if self.slot.is_busy() {
            PipelineState::Busy
        } else {
            PipelineState::Idle
        }
    }

    pub fn is_busy(&self) -> bool {
        self.slot.is_busy()
    }

    /// Whether the last completed render accepted the formula.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Confirmation is possible once the pipeline is idle on a valid formula.
    pub fn can_confirm(&self) -> bool {
        !self.is_busy() && self.valid
    }

    pub fn in_flight(&self) -> Option<&RenderRequest> {
        self.slot.in_flight()
    }

    /// The most recent preview, if any.
    pub fn artifact(&self) -> Option<&RenderArtifact> {
        self.slot.artifact()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Content-changed entry point: store the new text and request a preview.
    pub fn set_formula(&mut self, formula: impl Into<String>) -> Result<bool, RenderError> {
        self.formula = formula.into();
        self.trigger(RenderKind::Preview)
    }

    /// Dispatch a render of the current formula.
    ///
    /// Returns `Ok(false)` without doing anything while another render is
    /// outstanding. Dispatch failures are reported to the sink and leave the
    /// pipeline idle.
    pub fn trigger(&mut self, kind: RenderKind) -> Result<bool, RenderError> {
        if let Some(request) = self.slot.in_flight() {
            debug!("render {} still running, not dispatching {kind:?}", request.id);
            return Ok(false);
        }

        let id = self.next_id.wrapping_add(1);
        match self.backend.start(id, &self.formula) {
            Ok(pid) => {
                self.next_id = id;
                let begun = self.slot.begin(RenderRequest {
                    id,
                    kind,
                    formula: self.formula.clone(),
                    pid,
                });
                debug_assert!(begun.is_ok(), "slot was idle before dispatch");
                self.refresh_indicators();
                Ok(true)
            }
            Err(err) => {
                debug!("render {id}: dispatch failed: {err}");
                self.sink.report_error(&err);
                self.refresh_indicators();
                Err(err)
            }
        }
    }

    /// Completion entry point, called once per dispatched render.
    pub fn on_render_complete(&mut self, completion: Completion) -> CompletionOutcome {
        let Some(request) = self.slot.finish(completion.id) else {
            warn!("ignoring completion for unknown render {}", completion.id);
            return CompletionOutcome::Ignored;
        };

        let outcome = match completion.outcome {
            ExitOutcome::Success => {
                self.valid = true;
                self.accept_output(&request)
            }
            ExitOutcome::InvalidFormula => {
                debug!("render {}: formula rejected", request.id);
                self.valid = false;
                self.slot.invalidate();
                self.discard_output();
                CompletionOutcome::Invalid
            }
            ExitOutcome::Fault { code, description } => {
                self.valid = false;
                let err = RenderError::ProcessFault {
                    program: self.backend.program_name(),
                    code,
                    description,
                };
                debug!("render {}: {err}", request.id);
                self.sink.report_error(&err);
                self.discard_output();
                CompletionOutcome::Failed(err)
            }
        };

        self.refresh_indicators();

        if request.kind == RenderKind::Preview && request.formula != self.formula {
            debug!("render {}: formula changed while busy, re-rendering", request.id);
            // Dispatch failures were already reported to the sink.
            let _ = self.trigger(RenderKind::Preview);
        }

        outcome
    }

    fn accept_output(&mut self, request: &RenderRequest) -> CompletionOutcome {
        let loaded = RenderArtifact::load(&self.backend.output_path());
        let result = match request.kind {
            RenderKind::Preview => loaded.map(|artifact| {
                self.slot.replace(artifact);
                if let Some(artifact) = self.slot.artifact() {
                    self.sink.show_preview(artifact, &request.formula);
                }
                CompletionOutcome::Previewed
            }),
            RenderKind::Final => loaded
                .and_then(|artifact| self.materializer.materialize(&artifact, &request.formula))
                .map(CompletionOutcome::Materialized),
        };

        result.unwrap_or_else(|err| {
            debug!("render {}: {err}", request.id);
            self.sink.report_error(&err);
            CompletionOutcome::Failed(err)
        })
    }

    fn discard_output(&self) {
        let path = self.backend.output_path();
        if path.exists()
            && let Err(err) = fs::remove_file(&path)
        {
            warn!("could not remove stale output {}: {err}", path.display());
        }
    }

    fn refresh_indicators(&mut self) {
        let enabled = self.can_confirm();
        self.sink.set_confirm_enabled(enabled);
        self.sink
            .set_error_text((!self.valid).then_some(INVALID_FORMULA_MESSAGE));
    }
}
