//! Validate command - check a legal document against the schema

use console::style;
use std::path::Path;
use yamdiff_core::CoreError;
use yamdiff_engine::EngineError;

use crate::display;
use crate::error::{CliError, Result};

pub fn run(path: &Path, json: bool) -> Result<()> {
    let text = std::fs::read_to_string(path)?;

    match yamdiff_engine::validate(&text) {
        Ok(doc) => {
            if json {
                let output = serde_json::json!({
                    "valid": true,
                    "document": {
                        "id": doc.id,
                        "title": doc.title,
                        "type": doc.doc_type.as_str(),
                        "language": doc.language,
                        "version": doc.version.number,
                        "sections": doc.section_count(),
                    },
                    "errors": [],
                });
                println!("{}", serde_json::to_string_pretty(&output).unwrap_or_default());
            } else {
                println!(
                    "{} {} v{} ({} section(s))",
                    style("✓").green().bold(),
                    doc.title,
                    doc.version.number,
                    doc.section_count()
                );
                println!("{}", style("Validation passed").green().bold());
            }
            Ok(())
        }
        Err(EngineError::Core(CoreError::Validation { errors })) => {
            if json {
                let output = serde_json::json!({
                    "valid": false,
                    "errors": errors.iter().map(|e| {
                        serde_json::json!({ "path": e.path, "message": e.message })
                    }).collect::<Vec<_>>(),
                });
                println!("{}", serde_json::to_string_pretty(&output).unwrap_or_default());
            } else {
                display::print_validation_errors(&errors);
            }
            Err(CliError::Validation { errors })
        }
        Err(other) => Err(other.into()),
    }
}
