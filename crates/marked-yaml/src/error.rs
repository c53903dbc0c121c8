//! Failure taxonomy and the public error type.
//!
//! Internally, everything that can go wrong during a load is a [`Failure`]:
//!
//! - `Structural`: raised by the constructor itself for fully-understood
//!   conditions (duplicate key under the `Error` policy, `!vault` on a
//!   non-string). The classifier reports these verbatim.
//! - `Syntax`: grammar-level problems carrying a source position, including
//!   scan errors from the grammar engine, unhashable mapping keys and
//!   unknown tags. These go through the classifier's heuristics.
//! - `Unexpected`: everything else; no position, reported as plain text.
//!
//! Exactly one conversion happens, at the loader boundary: a `Failure`
//! becomes a [`LoadError`], the single user-facing error type.

use crate::node::Pos;
use marked_origin::Origin;
use yaml_rust2::ScanError;

/// Result alias for the construction layer.
pub type Result<T> = std::result::Result<T, LoadError>;

/// An internal failure, prior to classification.
#[derive(Debug, Clone)]
pub(crate) enum Failure {
    Structural {
        message: String,
        origin: Origin,
    },
    Syntax {
        context: Option<String>,
        problem: String,
        note: Option<String>,
        pos: Pos,
    },
    Unexpected {
        message: String,
    },
}

impl Failure {
    pub fn structural(message: impl Into<String>, origin: Origin) -> Self {
        Failure::Structural {
            message: message.into(),
            origin,
        }
    }

    pub fn syntax_at(pos: Pos, problem: impl Into<String>) -> Self {
        Failure::Syntax {
            context: None,
            problem: problem.into(),
            note: None,
            pos,
        }
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Failure::Unexpected {
            message: message.into(),
        }
    }

    pub fn from_scan_error(err: ScanError) -> Self {
        Failure::Syntax {
            context: None,
            problem: err.info().to_string(),
            note: None,
            pos: Pos::from_marker(err.marker()),
        }
    }

    pub fn is_position_bearing(&self) -> bool {
        !matches!(self, Failure::Unexpected { .. })
    }
}

/// Which class of failure a [`LoadError`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Raised directly by the constructor; the message is authoritative.
    Structural,
    /// A grammar-level problem, possibly refined by a heuristic.
    Syntax,
    /// Anything else; no source position available.
    Unexpected,
}

/// The single user-facing parsing error.
///
/// Carries a normalized message, the best-known [`Origin`], a formatted
/// multi-line excerpt of the offending source, and optional help text with a
/// corrective example.
#[derive(Debug, Clone, thiserror::Error)]
#[error("YAML parsing failed: {message}")]
pub struct LoadError {
    pub(crate) kind: ErrorKind,
    pub(crate) message: String,
    pub(crate) origin: Option<Origin>,
    pub(crate) source_context: Option<String>,
    pub(crate) help_text: Option<String>,
}

impl LoadError {
    /// Which class of failure produced this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The normalized one-line message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The best-known source position.
    pub fn origin(&self) -> Option<&Origin> {
        self.origin.as_ref()
    }

    /// A formatted excerpt of the offending source, when a position is known.
    pub fn source_context(&self) -> Option<&str> {
        self.source_context.as_deref()
    }

    /// Optional guidance with a corrective example.
    pub fn help_text(&self) -> Option<&str> {
        self.help_text.as_deref()
    }

    /// Full multi-line rendering: message, position, source excerpt, help.
    pub fn render(&self) -> String {
        let mut out = format!("YAML parsing failed: {}", self.message);
        if let Some(origin) = &self.origin {
            out.push_str(&format!("\n\nThe error appears to be at {origin}."));
        }
        if let Some(context) = &self.source_context {
            out.push_str("\n\nThe offending line appears to be:\n\n");
            out.push_str(context);
        }
        if let Some(help) = &self.help_text {
            out.push_str("\n\n");
            out.push_str(help);
        }
        out
    }
}

/// Format the source excerpt for an error at `line0`/`col0` (0-based,
/// document-relative): the previous line, the offending line, and a caret.
pub(crate) fn format_source_context(source: &str, line0: usize, col0: usize) -> Option<String> {
    let lines: Vec<&str> = source.split('\n').collect();
    let line = lines.get(line0)?;

    let mut out = String::new();
    if line0 > 0 {
        if let Some(prev) = lines.get(line0 - 1) {
            out.push_str(prev);
            out.push('\n');
        }
    }
    out.push_str(line);
    out.push('\n');
    // caret indented in characters to match the column
    let caret_col = col0.min(line.chars().count());
    out.extend(std::iter::repeat_n(' ', caret_col));
    out.push_str("^ here");
    Some(out)
}
