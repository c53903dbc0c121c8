//! Heuristic classification of parse failures.
//!
//! The grammar engine's own messages are accurate but rarely actionable
//! ("could not find expected ':'"). This module looks at the offending
//! source line and tries to say what the author most likely did wrong:
//! a literal tab, an unquoted template expression, a stray colon inside a
//! value, a quoting mistake. Heuristics run in order and the first match
//! wins; a firing heuristic overrides the reported column with its own fire
//! point. This is best-effort pattern matching, not a re-parse.

use crate::error::{ErrorKind, Failure, LoadError, format_source_context};
use marked_origin::Origin;
use once_cell::sync::Lazy;
use regex::Regex;

/// Convert an internal failure into the single user-facing error.
pub(crate) fn classify(source: &str, base: &Origin, failure: Failure) -> LoadError {
    match failure {
        Failure::Unexpected { message } => LoadError {
            kind: ErrorKind::Unexpected,
            message: collapse_whitespace(&message),
            origin: None,
            source_context: None,
            help_text: None,
        },

        // the constructor fully understands these; no heuristics
        Failure::Structural { message, origin } => {
            let line0 = origin.line_num().saturating_sub(base.line_num());
            let col0 = origin.col_num().map_or(0, |c| c.saturating_sub(1));
            LoadError {
                kind: ErrorKind::Structural,
                source_context: format_source_context(source, line0, col0),
                origin: Some(origin),
                message,
                help_text: None,
            }
        }

        Failure::Syntax {
            context,
            problem,
            note,
            pos,
        } => {
            let line = source.split('\n').nth(pos.line0);
            let refined = line.and_then(examine_line);

            let (col0, message, help_text) = match refined {
                Some(finding) => (finding.col0, finding.message, finding.help_text),
                None => (
                    pos.col0,
                    fallback_message(context.as_deref(), &problem, note.as_deref()),
                    None,
                ),
            };

            let origin = Origin::new(
                base.path().map(str::to_string),
                base.line_num() + pos.line0,
                Some(col0 + 1),
            );
            LoadError {
                kind: ErrorKind::Syntax,
                message,
                source_context: format_source_context(source, pos.line0, col0),
                origin: Some(origin),
                help_text,
            }
        }
    }
}

/// What a heuristic concluded about a line.
struct Finding {
    /// Fire point, 0-based character column.
    col0: usize,
    message: String,
    help_text: Option<String>,
}

/// Optional list/dict preamble: indentation, `- ` markers, one `key: `.
static PREAMBLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?:-\s+)*(?:[^:\s][^:]*:\s+)?").unwrap());

/// Run the line heuristics in order; first match wins.
fn examine_line(line: &str) -> Option<Finding> {
    check_tab(line)
        .or_else(|| check_unquoted_template(line))
        .or_else(|| check_colon_in_value(line))
        .or_else(|| check_quoting(line))
}

fn check_tab(line: &str) -> Option<Finding> {
    let byte_idx = line.find('\t')?;
    Some(Finding {
        col0: line[..byte_idx].chars().count(),
        message: "Tabs are usually invalid in YAML.".to_string(),
        help_text: Some("Use spaces to indent instead of tabs.".to_string()),
    })
}

fn check_unquoted_template(line: &str) -> Option<Finding> {
    let preamble = PREAMBLE_RE.find(line).map_or("", |m| m.as_str());
    let rest = &line[preamble.len()..];
    if !rest.starts_with("{{") {
        return None;
    }
    Some(Finding {
        col0: preamble.chars().count(),
        message: "This may be an issue with missing quotes around a template expression."
            .to_string(),
        help_text: Some(
            "Always quote template expression brackets when they start a value:\n\n    \
             items:\n      - {{ item }}\n\nShould be written as:\n\n    \
             items:\n      - \"{{ item }}\""
                .to_string(),
        ),
    })
}

fn check_colon_in_value(line: &str) -> Option<Finding> {
    // a line that *starts* with a colon is something else entirely
    if line.trim_start().starts_with(':') {
        return None;
    }
    let preamble = PREAMBLE_RE.find(line).map_or("", |m| m.as_str());
    let mut chars: Vec<char> = line[preamble.len()..].chars().collect();
    mask_one_quoted_run(&mut chars);

    // a colon followed by a space (or ending the line) starts a new mapping
    // entry as far as the grammar is concerned
    let rel = (0..chars.len()).find(|&i| {
        chars[i] == ':' && (i + 1 == chars.len() || chars[i + 1] == ' ')
    })?;
    Some(Finding {
        col0: preamble.chars().count() + rel,
        message: "This may be an issue with an unquoted colon in the value.".to_string(),
        help_text: Some(
            "Values containing a colon followed by a space must be quoted:\n\n    \
             description: two parts: quoted\n\nShould be written as:\n\n    \
             description: \"two parts: quoted\""
                .to_string(),
        ),
    })
}

/// Replace the first complete quoted run with a same-length placeholder so
/// colons inside it cannot fire the colon heuristic.
fn mask_one_quoted_run(chars: &mut [char]) {
    let Some(start) = chars.iter().position(|c| *c == '"' || *c == '\'') else {
        return;
    };
    let quote = chars[start];
    let Some(len) = chars[start + 1..].iter().position(|c| *c == quote) else {
        return;
    };
    for c in &mut chars[start..start + len + 2] {
        *c = 'x';
    }
}

fn check_quoting(line: &str) -> Option<Finding> {
    let preamble = PREAMBLE_RE.find(line).map_or("", |m| m.as_str());
    let value = line[preamble.len()..].trim_end();
    let mut value_chars = value.chars();
    let first = value_chars.next()?;
    if first != '"' && first != '\'' {
        return None;
    }
    let last = value_chars.next_back();
    let col0 = preamble.chars().count();

    if last != Some(first) {
        return Some(Finding {
            col0,
            message: "The value appears to start with a quote that doesn't close.".to_string(),
            help_text: Some(
                "When a value starts with a quote, the quote must end the value:\n\n    \
                 raw: \"foo\" in bar\n\nShould be written as:\n\n    \
                 raw: '\"foo\" in bar'"
                    .to_string(),
            ),
        });
    }
    if value.matches(first).count() > 2 {
        return Some(Finding {
            col0,
            message: "The value is quoted with a character that also appears inside it."
                .to_string(),
            help_text: Some(
                "Use the other quote character around the value, or double the quotes \
                 inside it:\n\n    say: 'it''s fine'"
                    .to_string(),
            ),
        });
    }
    None
}

/// Join the structured fields of a position-bearing grammar error into one
/// sentence-cased message.
fn fallback_message(context: Option<&str>, problem: &str, note: Option<&str>) -> String {
    let joined = [context, Some(problem), note]
        .into_iter()
        .flatten()
        .map(|part| ensure_sentence(part.trim()))
        .collect::<Vec<_>>()
        .join(" ");
    collapse_whitespace(&joined)
}

fn ensure_sentence(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 1);
    let mut chars = text.chars();
    if let Some(first) = chars.next() {
        out.extend(first.to_uppercase());
        out.push_str(chars.as_str());
    }
    if !out.ends_with(['.', '!', '?']) {
        out.push('.');
    }
    out
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
