//! Diff command - compare two YAML documents

use console::style;
use std::path::Path;
use yamdiff_core::{CoreError, IdentityRule};
use yamdiff_engine::{EngineError, FormatFilters, FormatStyle, Mode};

use crate::display;
use crate::error::{CliError, Result};

#[allow(clippy::too_many_arguments)]
pub fn run(
    old: &Path,
    new: &Path,
    mode: &str,
    rule_specs: &[String],
    format: &str,
    output: Option<&Path>,
    include_unchanged: bool,
    kinds: &[String],
) -> Result<()> {
    let mode: Mode = mode.parse().map_err(CliError::usage)?;
    let format_style: FormatStyle = format.parse().map_err(CliError::from)?;
    let rules = rule_specs
        .iter()
        .map(|spec| IdentityRule::parse(spec))
        .collect::<std::result::Result<Vec<_>, CoreError>>()?;

    let old_text = std::fs::read_to_string(old)?;
    let new_text = std::fs::read_to_string(new)?;

    let report = match yamdiff_engine::diff(&old_text, &new_text, mode, &rules) {
        Ok(report) => report,
        Err(EngineError::Core(CoreError::Validation { errors })) => {
            display::print_validation_errors(&errors);
            return Err(CliError::Validation { errors });
        }
        Err(other) => return Err(other.into()),
    };

    let filters = FormatFilters {
        include_unchanged,
        kinds: if kinds.is_empty() {
            None
        } else {
            Some(kinds.to_vec())
        },
    };

    match output {
        Some(path) => {
            let rendered = yamdiff_engine::format(&report, format_style, &filters);
            std::fs::write(path, rendered)?;
            println!(
                "{} wrote report to {}",
                style("✓").green().bold(),
                path.display()
            );
        }
        None if format_style == FormatStyle::Text => {
            display::print_report(&report, &filters);
        }
        None => {
            print!("{}", yamdiff_engine::format(&report, format_style, &filters));
        }
    }

    Ok(())
}
