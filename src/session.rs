//! The "edit formula" tool flow.
//!
//! A session picks up the selected formula (or text) from the document, keeps a
//! live preview while the formula is edited, and on confirmation renders the
//! final image and swaps it into the document with an undo step.

use std::path::PathBuf;
use std::sync::mpsc::{Receiver, Sender};

use log::{debug, info};

use crate::app_dirs;
use crate::document::{DocumentHost, ElementId, SelectedElement, UndoAction, with_lock};
use crate::error::RenderError;
use crate::latex::runner::{DEFAULT_EXECUTABLE, NONSTOP_FLAG};
use crate::latex::{
    CompletionOutcome, DEFAULT_MIN_WIDTH, ImageMaterializer, PipelineEvent, PreviewController,
    PreviewSink, RenderBackend, RenderKind, TexImage, TexRunner, find_executable,
};

/// Formula offered when nothing usable is selected.
pub const DEFAULT_FORMULA: &str = "x^2";

/// Settings for a [`LatexSession`].
#[derive(Debug, Clone, PartialEq)]
pub struct SessionOptions {
    /// Executable name looked up on the `PATH`, or a path to it.
    pub executable: String,
    pub flags: Vec<String>,
    /// Directory holding the generated source and the compiled PDF.
    pub work_dir: PathBuf,
    pub initial_formula: String,
    pub min_width: f64,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            executable: DEFAULT_EXECUTABLE.to_string(),
            flags: vec![NONSTOP_FLAG.to_string()],
            work_dir: app_dirs::default_work_dir(),
            initial_formula: DEFAULT_FORMULA.to_string(),
            min_width: DEFAULT_MIN_WIDTH,
        }
    }
}

/// How a session ended.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutcome {
    /// A new formula image replaced the selection.
    Inserted { element: ElementId, image: TexImage },
    /// The confirmed formula was blank or identical to the starting one.
    Unchanged,
    Cancelled,
}

pub struct LatexSession {
    options: SessionOptions,
}

impl LatexSession {
    pub fn new(options: SessionOptions) -> Self {
        Self { options }
    }

    /// Run the tool with the configured compiler.
    ///
    /// `events` must be the sending half of `inbox`; compiler completions are
    /// delivered through it. The session returns after a `Cancel` or once a
    /// `Confirm` has been fully processed. The runner keeps a sender alive, so
    /// editors must end the session explicitly.
    pub fn run<D, S>(
        &self,
        document: &mut D,
        sink: S,
        events: Sender<PipelineEvent>,
        inbox: &Receiver<PipelineEvent>,
    ) -> Result<SessionOutcome, RenderError>
    where
        D: DocumentHost + ?Sized,
        S: PreviewSink,
    {
        let executable = find_executable(&self.options.executable)?;
        debug!("using {}", executable.display());
        let runner = TexRunner::new(executable, &self.options.work_dir, events)
            .with_flags(self.options.flags.clone());
        self.run_with(document, runner, sink, inbox)
    }

    /// Run the tool against an arbitrary render backend.
    pub fn run_with<D, B, S>(
        &self,
        document: &mut D,
        backend: B,
        sink: S,
        inbox: &Receiver<PipelineEvent>,
    ) -> Result<SessionOutcome, RenderError>
    where
        D: DocumentHost + ?Sized,
        B: RenderBackend,
        S: PreviewSink,
    {
        let (selected, initial) = self.inspect_selection(document);
        let materializer = ImageMaterializer::new(selected.as_ref().map(SelectedElement::bounds))
            .with_min_width(self.options.min_width);
        let mut controller = PreviewController::new(backend, sink, materializer, initial.clone());

        // Dispatch failures are reported through the sink; editing continues.
        let _ = controller.trigger(RenderKind::Preview);

        let Some(confirmed) = edit_until_confirmed(&mut controller, inbox)? else {
            return Ok(SessionOutcome::Cancelled);
        };

        if confirmed.trim().is_empty() || confirmed == initial {
            info!("formula unchanged, nothing to insert");
            return Ok(SessionOutcome::Unchanged);
        }

        controller.trigger(RenderKind::Final)?;
        let Some(image) = wait_for_final(&mut controller, inbox)? else {
            return Ok(SessionOutcome::Cancelled);
        };

        let element = replace_selection(document, selected, image.clone());
        info!("inserted formula {:?} as element {element}", image.text);
        Ok(SessionOutcome::Inserted { element, image })
    }

    /// Render `formula` straight to the document with the configured
    /// compiler, skipping the interactive preview.
    pub fn insert_formula<D, S>(
        &self,
        document: &mut D,
        sink: S,
        formula: &str,
        events: Sender<PipelineEvent>,
        inbox: &Receiver<PipelineEvent>,
    ) -> Result<SessionOutcome, RenderError>
    where
        D: DocumentHost + ?Sized,
        S: PreviewSink,
    {
        let executable = find_executable(&self.options.executable)?;
        let runner = TexRunner::new(executable, &self.options.work_dir, events)
            .with_flags(self.options.flags.clone());
        self.insert_formula_with(document, runner, sink, formula, inbox)
    }

    /// [`insert_formula`](Self::insert_formula) against an arbitrary backend.
    pub fn insert_formula_with<D, B, S>(
        &self,
        document: &mut D,
        backend: B,
        sink: S,
        formula: &str,
        inbox: &Receiver<PipelineEvent>,
    ) -> Result<SessionOutcome, RenderError>
    where
        D: DocumentHost + ?Sized,
        B: RenderBackend,
        S: PreviewSink,
    {
        let (selected, _) = self.inspect_selection(document);
        if formula.trim().is_empty() {
            return Ok(SessionOutcome::Unchanged);
        }

        let materializer = ImageMaterializer::new(selected.as_ref().map(SelectedElement::bounds))
            .with_min_width(self.options.min_width);
        let mut controller = PreviewController::new(backend, sink, materializer, formula);
        controller.trigger(RenderKind::Final)?;
        let Some(image) = wait_for_final(&mut controller, inbox)? else {
            return Ok(SessionOutcome::Cancelled);
        };

        let element = replace_selection(document, selected, image.clone());
        Ok(SessionOutcome::Inserted { element, image })
    }

    fn inspect_selection<D>(&self, document: &mut D) -> (Option<SelectedElement>, String)
    where
        D: DocumentHost + ?Sized,
    {
        let selected = with_lock(document, |doc| doc.selected_element());
        let initial = selected
            .as_ref()
            .map(SelectedElement::initial_formula)
            .filter(|formula| !formula.is_empty())
            .unwrap_or_else(|| self.options.initial_formula.clone());
        // The old element can only be replaced once it is no longer selected.
        document.clear_selection();
        (selected, initial)
    }
}

/// Process edits and previews until the user confirms or cancels.
///
/// A confirmation that arrives while a render is outstanding takes effect once
/// the pipeline is idle again.
fn edit_until_confirmed<B, S>(
    controller: &mut PreviewController<B, S>,
    inbox: &Receiver<PipelineEvent>,
) -> Result<Option<String>, RenderError>
where
    B: RenderBackend,
    S: PreviewSink,
{
    let mut confirm_requested = false;
    loop {
        let Ok(event) = inbox.recv() else {
            debug!("event channel closed while editing");
            return Ok(None);
        };
        match event {
            PipelineEvent::Edited(formula) => {
                let _ = controller.set_formula(formula);
            }
            PipelineEvent::RenderFinished(completion) => {
                controller.on_render_complete(completion);
            }
            PipelineEvent::Confirm => confirm_requested = true,
            PipelineEvent::Cancel => return Ok(None),
        }

        if confirm_requested && !controller.is_busy() {
            return if controller.is_valid() {
                Ok(Some(controller.formula().to_string()))
            } else {
                Err(RenderError::InvalidFormula)
            };
        }
    }
}

fn wait_for_final<B, S>(
    controller: &mut PreviewController<B, S>,
    inbox: &Receiver<PipelineEvent>,
) -> Result<Option<TexImage>, RenderError>
where
    B: RenderBackend,
    S: PreviewSink,
{
    loop {
        let Ok(event) = inbox.recv() else {
            return Ok(None);
        };
        match event {
            PipelineEvent::RenderFinished(completion) => {
                match controller.on_render_complete(completion) {
                    CompletionOutcome::Materialized(image) => return Ok(Some(image)),
                    CompletionOutcome::Invalid => return Err(RenderError::InvalidFormula),
                    CompletionOutcome::Failed(err) => return Err(err),
                    CompletionOutcome::Ignored | CompletionOutcome::Previewed => {}
                }
            }
            PipelineEvent::Cancel => return Ok(None),
            PipelineEvent::Edited(_) | PipelineEvent::Confirm => {}
        }
    }
}

fn replace_selection<D>(
    document: &mut D,
    selected: Option<SelectedElement>,
    image: TexImage,
) -> ElementId
where
    D: DocumentHost + ?Sized,
{
    if let Some(old) = selected {
        document.delete_element(old.id());
    }

    let (page, layer, element) = with_lock(document, |doc| {
        let (page, layer) = doc.current_layer();
        (page, layer, doc.add_image(image))
    });
    document.add_undo_action(UndoAction::Insert {
        page,
        layer,
        element,
    });
    document.select(element);
    element
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::path::PathBuf;
    use std::sync::mpsc;

    use super::*;
    use crate::document::{Element, MemoryDocument, TextElement};
    use crate::latex::artifact::fixtures::single_page_pdf;
    use crate::latex::{Completion, ExitOutcome, LogSink};

    /// Completes every render immediately with the next scripted exit code.
    struct ScriptedBackend {
        dir: PathBuf,
        codes: VecDeque<i32>,
        events: Sender<PipelineEvent>,
        formulas: Vec<String>,
    }

    impl RenderBackend for ScriptedBackend {
        fn start(&mut self, id: u64, formula: &str) -> Result<u32, RenderError> {
            self.formulas.push(formula.to_string());
            let code = self.codes.pop_front().unwrap_or(0);
            if code == 0 {
                std::fs::write(self.output_path(), single_page_pdf(40, 10)).unwrap();
            }
            self.events
                .send(PipelineEvent::RenderFinished(Completion {
                    id,
                    outcome: ExitOutcome::from_code(code),
                }))
                .unwrap();
            Ok(id as u32)
        }

        fn output_path(&self) -> PathBuf {
            self.dir.join("tex.pdf")
        }

        fn program_name(&self) -> String {
            "scripted".into()
        }
    }

    fn run_script(
        document: &mut MemoryDocument,
        codes: &[i32],
        script: Vec<PipelineEvent>,
    ) -> Result<SessionOutcome, RenderError> {
        let dir = tempfile::tempdir().unwrap();
        let (tx, rx) = mpsc::channel();
        let backend = ScriptedBackend {
            dir: dir.path().to_path_buf(),
            codes: codes.iter().copied().collect(),
            events: tx.clone(),
            formulas: Vec::new(),
        };
        for event in script {
            tx.send(event).unwrap();
        }
        let session = LatexSession::new(SessionOptions {
            work_dir: dir.path().to_path_buf(),
            ..SessionOptions::default()
        });
        session.run_with(document, backend, LogSink, &rx)
    }

    #[test]
    fn confirming_a_new_formula_inserts_it_with_undo() {
        let mut doc = MemoryDocument::new();
        let outcome = run_script(
            &mut doc,
            &[],
            vec![PipelineEvent::Edited("a+b".into()), PipelineEvent::Confirm],
        )
        .unwrap();

        let SessionOutcome::Inserted { element, image } = outcome else {
            panic!("expected an insertion, got {outcome:?}");
        };
        assert_eq!(image.text, "a+b");
        assert_eq!(doc.selection(), Some(element));
        assert!(!doc.is_locked());
        assert_eq!(
            doc.undo_actions(),
            &[UndoAction::Insert {
                page: 0,
                layer: 0,
                element
            }]
        );
        assert!(doc.undo());
        assert!(doc.element(element).is_none());
    }

    #[test]
    fn unchanged_formula_inserts_nothing() {
        let mut doc = MemoryDocument::new();
        let outcome = run_script(&mut doc, &[], vec![PipelineEvent::Confirm]).unwrap();
        assert_eq!(outcome, SessionOutcome::Unchanged);

        let blank = run_script(
            &mut doc,
            &[],
            vec![PipelineEvent::Edited("   ".into()), PipelineEvent::Confirm],
        )
        .unwrap();
        assert_eq!(blank, SessionOutcome::Unchanged);
        assert_eq!(doc.elements().count(), 0);
    }

    #[test]
    fn selected_text_is_replaced_at_its_position() {
        let mut doc = MemoryDocument::new();
        let old = doc.push_element(Element::Text(TextElement {
            text: "v".into(),
            x: 5.0,
            y: 6.0,
            width: 7.0,
            height: 20.0,
        }));
        doc.select(old);

        let outcome = run_script(
            &mut doc,
            &[],
            vec![PipelineEvent::Edited("v^2".into()), PipelineEvent::Confirm],
        )
        .unwrap();
        let SessionOutcome::Inserted { image, .. } = outcome else {
            panic!("expected an insertion");
        };
        assert_eq!((image.x, image.y), (5.0, 6.0));
        assert_eq!((image.width, image.height), (80.0, 20.0));
        assert!(doc.element(old).is_none());
        assert_eq!(doc.undo_actions().len(), 2);
    }

    #[test]
    fn confirming_an_invalid_formula_fails() {
        let mut doc = MemoryDocument::new();
        let err = run_script(
            &mut doc,
            &[0, 1],
            vec![PipelineEvent::Edited("\\frac{".into()), PipelineEvent::Confirm],
        )
        .unwrap_err();
        assert!(matches!(err, RenderError::InvalidFormula));
        assert_eq!(doc.elements().count(), 0);
    }

    #[test]
    fn direct_insertion_skips_the_preview() {
        let dir = tempfile::tempdir().unwrap();
        let (tx, rx) = mpsc::channel();
        let backend = ScriptedBackend {
            dir: dir.path().to_path_buf(),
            codes: VecDeque::new(),
            events: tx,
            formulas: Vec::new(),
        };
        let mut doc = MemoryDocument::new();
        let session = LatexSession::new(SessionOptions::default());

        let outcome = session
            .insert_formula_with(&mut doc, backend, LogSink, "x^2", &rx)
            .unwrap();
        let SessionOutcome::Inserted { element, image } = outcome else {
            panic!("expected an insertion");
        };
        assert_eq!(image.text, "x^2");
        assert!(matches!(doc.element(element), Some(Element::Tex(stored)) if stored.text == "x^2"));
    }

    #[test]
    fn cancel_leaves_the_document_alone() {
        let mut doc = MemoryDocument::new();
        let outcome = run_script(
            &mut doc,
            &[],
            vec![PipelineEvent::Edited("q".into()), PipelineEvent::Cancel],
        )
        .unwrap();
        assert_eq!(outcome, SessionOutcome::Cancelled);
        assert!(doc.undo_actions().is_empty());
    }
}
