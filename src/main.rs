mod cli;
mod settings;

use std::io::{self, BufRead};
use std::process::ExitCode;
use std::sync::mpsc::{self, Sender};
use std::thread;

use anyhow::{Context, Result};
use cli::{
    Command, ConsoleSink, OutputFormat, SelectionArgs, parse_cli, print_json, print_plain,
    shown_by_sink,
};
use log::debug;
use settings::ResolvedConfig;
use texpreview::{
    DocumentHost, Element, LatexSession, MemoryDocument, PipelineEvent, SessionOutcome, TexImage,
    logging,
};

fn main() -> Result<ExitCode> {
    let cli = parse_cli();
    logging::initialize(cli.verbose);

    let resolved = settings::load(&cli)?;

    if cli.print_config {
        resolved.print_summary();
    }

    let result = match &cli.command {
        Command::Render { formula, selection } => run_render(resolved, formula, selection),
        Command::Watch { selection } => run_watch(resolved, selection),
    };
    let outcome = match result {
        Ok(outcome) => outcome,
        Err(err) if shown_by_sink(&err) => {
            debug!("{err:#}");
            return Ok(ExitCode::FAILURE);
        }
        Err(err) => return Err(err),
    };

    match cli.output {
        OutputFormat::Plain => print_plain(&outcome),
        OutputFormat::Json => print_json(&outcome)?,
    }

    Ok(ExitCode::SUCCESS)
}

/// Render a single formula and place it in a scratch document.
fn run_render(
    settings: ResolvedConfig,
    formula: &str,
    selection: &SelectionArgs,
) -> Result<SessionOutcome> {
    let mut document = scratch_document(selection);
    let session = LatexSession::new(settings.session);
    let (events, inbox) = mpsc::channel();

    session
        .insert_formula(&mut document, ConsoleSink::default(), formula, events, &inbox)
        .with_context(|| format!("failed to render {formula:?}"))
}

/// Feed stdin lines to an editing session as formula edits; EOF confirms.
fn run_watch(settings: ResolvedConfig, selection: &SelectionArgs) -> Result<SessionOutcome> {
    let mut document = scratch_document(selection);
    let session = LatexSession::new(settings.session);
    let (events, inbox) = mpsc::channel();

    let input = events.clone();
    thread::Builder::new()
        .name("stdin-edits".into())
        .spawn(move || forward_stdin(input))
        .context("failed to start the stdin reader")?;

    session
        .run(&mut document, ConsoleSink::default(), events, &inbox)
        .context("formula session failed")
}

fn forward_stdin(events: Sender<PipelineEvent>) {
    for line in io::stdin().lock().lines() {
        let Ok(line) = line else {
            break;
        };
        if events.send(PipelineEvent::Edited(line)).is_err() {
            return;
        }
    }
    debug!("stdin closed, confirming");
    let _ = events.send(PipelineEvent::Confirm);
}

/// A one-page document, optionally holding a selected formula to replace.
fn scratch_document(selection: &SelectionArgs) -> MemoryDocument {
    let mut document = MemoryDocument::new();
    if let Some(text) = &selection.replace {
        let id = document.push_element(Element::Tex(TexImage {
            text: text.clone(),
            x: selection.x,
            y: selection.y,
            width: selection.width,
            height: selection.height,
            pdf: Vec::new(),
        }));
        document.select(id);
    }
    document
}
