use anyhow::Result;
use serde_json::json;
use texpreview::{RenderError, SessionOutcome};

/// Print a plain-text representation of the session outcome.
pub(crate) fn print_plain(outcome: &SessionOutcome) {
    match outcome {
        SessionOutcome::Inserted { element, image } => println!(
            "inserted element {element}: {} at ({}, {}) size {} x {}",
            image.text, image.x, image.y, image.width, image.height
        ),
        SessionOutcome::Unchanged => println!("Formula unchanged, nothing inserted"),
        SessionOutcome::Cancelled => println!("Cancelled"),
    }
}

/// Format the session outcome as a JSON string.
pub(crate) fn format_outcome_json(outcome: &SessionOutcome) -> Result<String> {
    let payload = match outcome {
        SessionOutcome::Inserted { element, image } => json!({
            "status": "inserted",
            "element": element,
            "image": image,
            "pdf_bytes": image.pdf.len(),
        }),
        SessionOutcome::Unchanged => json!({ "status": "unchanged" }),
        SessionOutcome::Cancelled => json!({ "status": "cancelled" }),
    };

    Ok(serde_json::to_string_pretty(&payload)?)
}

/// Print the JSON representation of the session outcome.
pub(crate) fn print_json(outcome: &SessionOutcome) -> Result<()> {
    println!("{}", format_outcome_json(outcome)?);
    Ok(())
}

/// Whether the console sink already printed `err` while the session ran.
pub(crate) fn shown_by_sink(err: &anyhow::Error) -> bool {
    err.downcast_ref::<RenderError>().is_some_and(RenderError::reaches_sink)
}

#[cfg(test)]
mod tests {
    use anyhow::Context;
    use serde_json::Value;
    use texpreview::TexImage;

    use super::*;

    #[test]
    fn json_format_includes_the_placement() {
        let outcome = SessionOutcome::Inserted {
            element: 3,
            image: TexImage {
                text: "x^2".into(),
                x: 1.0,
                y: 2.0,
                width: 30.0,
                height: 10.0,
                pdf: vec![1, 2, 3],
            },
        };

        let json = format_outcome_json(&outcome).expect("json");
        let value: Value = serde_json::from_str(&json).expect("parse");
        assert_eq!(value["status"], "inserted");
        assert_eq!(value["element"], 3);
        assert_eq!(value["image"]["text"], "x^2");
        assert_eq!(value["image"]["width"], 30.0);
        assert_eq!(value["pdf_bytes"], 3);
        assert!(value["image"].get("pdf").is_none());
    }

    #[test]
    fn json_format_reports_unchanged_sessions() {
        let json = format_outcome_json(&SessionOutcome::Unchanged).expect("json");
        let value: Value = serde_json::from_str(&json).expect("parse");
        assert_eq!(value["status"], "unchanged");
    }

    #[test]
    fn pipeline_errors_are_not_printed_twice() {
        let fault: Result<()> = Err(RenderError::ProcessFault {
            program: "pdflatex".into(),
            code: Some(3),
            description: "exit code 3".into(),
        })
        .context("failed to render \"x\"");
        assert!(shown_by_sink(&fault.unwrap_err()));

        let missing = anyhow::Error::new(RenderError::ExecutableNotFound {
            name: "pdflatex".into(),
        });
        assert!(!shown_by_sink(&missing));
        assert!(!shown_by_sink(&anyhow::anyhow!("bad config")));
    }
}
