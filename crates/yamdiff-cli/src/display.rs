//! Colored terminal rendering of diff reports
//!
//! Colors are handled by `console`, which disables styling when stdout
//! is not a terminal, so piped output stays clean.

use console::{Style, style};
use similar::{ChangeTag, TextDiff};
use yamdiff_core::ValidationErrorInfo;
use yamdiff_engine::{
    DiffReport, FormatFilters, GenericChange, GenericChangeKind, SectionChange, SectionChangeKind,
};

/// Print a report for a human, one line per change, with a closing
/// summary line.
pub fn print_report(report: &DiffReport, filters: &FormatFilters) {
    match report {
        DiffReport::General { changes } => {
            for change in changes {
                if filters.keeps(change.kind.as_str()) {
                    print_generic(change);
                }
            }
        }
        DiffReport::LegalDocument { changes } => {
            for change in changes {
                if filters.keeps(change.kind.as_str()) {
                    print_section(change);
                }
            }
        }
    }
    println!();
    println!("{}", style(report.summary()).bold());
}

fn generic_symbol(kind: GenericChangeKind) -> (&'static str, Style) {
    match kind {
        GenericChangeKind::KeyAdded | GenericChangeKind::ItemAdded => ("+", Style::new().green()),
        GenericChangeKind::KeyRemoved | GenericChangeKind::ItemRemoved => {
            ("-", Style::new().red())
        }
        GenericChangeKind::ValueChanged | GenericChangeKind::ItemChanged => {
            ("~", Style::new().yellow())
        }
        GenericChangeKind::TypeChanged => ("!", Style::new().magenta()),
        GenericChangeKind::KeyRenamed => ("r", Style::new().cyan()),
        GenericChangeKind::KeyMoved | GenericChangeKind::ItemMoved => ("»", Style::new().cyan()),
        GenericChangeKind::Unchanged => ("=", Style::new().dim()),
    }
}

fn print_generic(change: &GenericChange) {
    let (symbol, line_style) = generic_symbol(change.kind);
    let detail = match change.kind {
        GenericChangeKind::ValueChanged => format!(
            "{}: {} -> {}",
            change.path,
            value_text(&change.old_value),
            value_text(&change.new_value)
        ),
        GenericChangeKind::TypeChanged => format!(
            "{}: {} -> {}",
            change.path,
            change
                .old_value
                .as_ref()
                .map_or("?", |n| n.value.type_name()),
            change
                .new_value
                .as_ref()
                .map_or("?", |n| n.value.type_name()),
        ),
        GenericChangeKind::KeyRenamed => format!(
            "{}: {} -> {}",
            change.path,
            change.old_key.as_deref().unwrap_or("?"),
            change.new_key.as_deref().unwrap_or("?"),
        ),
        GenericChangeKind::KeyMoved | GenericChangeKind::ItemMoved => format!(
            "{} -> {}",
            change
                .old_path
                .as_ref()
                .map_or_else(|| change.path.to_string(), ToString::to_string),
            change
                .new_path
                .as_ref()
                .map_or_else(|| change.path.to_string(), ToString::to_string),
        ),
        _ => change.path.to_string(),
    };
    println!(
        "  {} {} {}",
        style(symbol).bold(),
        style(change.kind.as_str()).bold(),
        line_style.apply_to(detail)
    );
}

fn section_symbol(kind: SectionChangeKind) -> (&'static str, Style) {
    match kind {
        SectionChangeKind::SectionAdded => ("+", Style::new().green()),
        SectionChangeKind::SectionRemoved => ("-", Style::new().red()),
        SectionChangeKind::ContentChanged | SectionChangeKind::TitleChanged => {
            ("~", Style::new().yellow())
        }
        SectionChangeKind::SectionMoved => ("»", Style::new().cyan()),
        SectionChangeKind::Unchanged => ("=", Style::new().dim()),
    }
}

fn print_section(change: &SectionChange) {
    let (symbol, line_style) = section_symbol(change.kind);
    let location = change
        .new_marker_path
        .as_ref()
        .or(change.old_marker_path.as_ref())
        .map_or_else(|| change.marker.clone(), |path| path.join("/"));

    let detail = match change.kind {
        SectionChangeKind::SectionMoved => format!(
            "{} -> {}",
            change
                .old_marker_path
                .as_ref()
                .map_or_else(|| "?".to_string(), |p| p.join("/")),
            change
                .new_marker_path
                .as_ref()
                .map_or_else(|| "?".to_string(), |p| p.join("/")),
        ),
        SectionChangeKind::TitleChanged => format!(
            "{location}: {} -> {}",
            change.old_title.as_deref().unwrap_or("-"),
            change.new_title.as_deref().unwrap_or("-"),
        ),
        _ => location,
    };
    println!(
        "  {} {} {} {}",
        style(symbol).bold(),
        style(change.kind.as_str()).bold(),
        line_style.apply_to(detail),
        style(format!("[{}]", change.section_id)).dim()
    );

    // Inline line diff of the content for edited sections
    if change.kind == SectionChangeKind::ContentChanged {
        let old_content = change.old_content.as_deref().unwrap_or("");
        let new_content = change.new_content.as_deref().unwrap_or("");
        let diff = TextDiff::from_lines(old_content, new_content);
        for line in diff.iter_all_changes() {
            let (prefix, prefix_style) = match line.tag() {
                ChangeTag::Delete => ("-", Style::new().red()),
                ChangeTag::Insert => ("+", Style::new().green()),
                ChangeTag::Equal => (" ", Style::new().dim()),
            };
            println!(
                "      {}{}",
                prefix,
                prefix_style.apply_to(line.value().trim_end())
            );
        }
    }
}

/// Print a validation report, one line per failed field.
pub fn print_validation_errors(errors: &[ValidationErrorInfo]) {
    for error in errors {
        println!(
            "  {} {}: {}",
            style("✗").red().bold(),
            style(&error.path).bold(),
            error.message
        );
    }
    println!();
    println!(
        "{}",
        style(format!("{} validation error(s)", errors.len()))
            .red()
            .bold()
    );
}

fn value_text(node: &Option<yamdiff_core::Node>) -> String {
    match node {
        Some(node) => {
            let text = node.value.projection();
            if node.value.as_str().is_some() {
                format!("{text:?}")
            } else {
                text
            }
        }
        None => "-".to_string(),
    }
}
