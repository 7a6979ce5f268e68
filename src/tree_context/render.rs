use colored::*;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write;
use std::ops::Range;

use super::ContextOptions;

const MATCH_MARKER: &str = "█";
const CONTEXT_MARKER: &str = "│";

/// Renders the shown lines, collapsing each hidden run into one ellipsis.
///
/// Returns `None` when nothing is shown.
pub(crate) fn render(
    lines: &[String],
    show: &BTreeSet<usize>,
    interest: &BTreeSet<usize>,
    match_spans: &BTreeMap<usize, Vec<Range<usize>>>,
    options: &ContextOptions,
) -> Option<String> {
    if show.is_empty() {
        return None;
    }

    let ellipsis = if options.line_number {
        "...⋮...\n"
    } else {
        "⋮...\n"
    };

    let mut output = String::new();
    let mut dots = false;

    for (i, line) in lines.iter().enumerate() {
        if !show.contains(&i) {
            if dots {
                output.push_str(ellipsis);
                dots = false;
            }
            continue;
        }

        if options.line_number {
            let _ = write!(output, "{:3}", i + 1);
        }

        if interest.contains(&i) {
            if options.color {
                output.push_str(&MATCH_MARKER.red().to_string());
            } else {
                output.push_str(MATCH_MARKER);
            }
        } else {
            output.push_str(CONTEXT_MARKER);
        }

        match match_spans.get(&i) {
            Some(spans) if options.color => output.push_str(&highlight_matches(line, spans)),
            _ => output.push_str(line),
        }
        output.push('\n');

        dots = true;
    }

    Some(output)
}

/// Highlight regex matches in a line
fn highlight_matches(line: &str, spans: &[Range<usize>]) -> String {
    let mut last_end = 0;
    let mut highlighted = String::new();

    for span in spans.iter().filter(|span| !span.is_empty()) {
        highlighted.push_str(&line[last_end..span.start]);
        highlighted.push_str(&line[span.clone()].red().bold().to_string());
        last_end = span.end;
    }
    highlighted.push_str(&line[last_end..]);
    highlighted
}
