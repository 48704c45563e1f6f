//! Plain-text rendering of views for stdout.

use seolens::{CountedField, Operation, View};

/// Indent for nested lines (one level).
const INDENT: &str = "  ";

fn counted_line(f: &CountedField) -> String {
    let flag = if f.over_limit { " (over limit)" } else { "" };
    format!(
        "{} [{}/{}{}]\n{}{}",
        f.label, f.count, f.limit, flag, INDENT, f.value
    )
}

/// Formats a view for the terminal. Deterministic; no colors.
pub fn format_view(view: &View) -> String {
    match view {
        View::Prose { body } => body.clone(),
        View::Copyable { title, body } => format!("{}\n\n{}", title, body),
        View::Disclosures { items } => items
            .iter()
            .enumerate()
            .map(|(i, item)| format!("{}. {}\n{}{}", i + 1, item.summary, INDENT, item.detail))
            .collect::<Vec<_>>()
            .join("\n\n"),
        View::CountedFields { fields } => fields
            .iter()
            .map(counted_line)
            .collect::<Vec<_>>()
            .join("\n\n"),
        View::Unsupported { title, message } => format!("{}: {}", title, message),
    }
}

/// One line per operation: `value<TAB>label`.
pub fn format_operations() -> String {
    Operation::ALL
        .iter()
        .map(|op| format!("{}\t{}", op.as_str(), op.label()))
        .collect::<Vec<_>>()
        .join("\n")
}
