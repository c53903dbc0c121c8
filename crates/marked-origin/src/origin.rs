//! Immutable source-position records.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a constructed value came from.
///
/// `Origin` pairs an optional document identity (usually a file path, but any
/// caller-supplied name works) with a 1-based line number and an optional
/// 1-based column number. It is immutable: the `with_*` methods return a new
/// `Origin` with the given field replaced.
///
/// A line number of 0 is normalized to 1 on construction, so an `Origin` is
/// always safe to feed into "line N of the source" arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Origin {
    /// Document identity: a path or caller-supplied stream name.
    path: Option<String>,

    /// Line number (1-based).
    line_num: usize,

    /// Column number (1-based, in characters not bytes).
    col_num: Option<usize>,
}

impl Origin {
    /// Create a new `Origin`.
    ///
    /// A `line_num` of 0 is normalized to 1.
    pub fn new(path: Option<String>, line_num: usize, col_num: Option<usize>) -> Self {
        Self {
            path,
            line_num: line_num.max(1),
            col_num,
        }
    }

    /// The document identity, if known.
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Line number (1-based).
    pub fn line_num(&self) -> usize {
        self.line_num
    }

    /// Column number (1-based), if known.
    pub fn col_num(&self) -> Option<usize> {
        self.col_num
    }

    /// Return a copy with the path replaced.
    pub fn with_path(&self, path: Option<String>) -> Self {
        Self {
            path,
            ..self.clone()
        }
    }

    /// Return a copy with the line number replaced (0 normalized to 1).
    pub fn with_line_num(&self, line_num: usize) -> Self {
        Self {
            line_num: line_num.max(1),
            ..self.clone()
        }
    }

    /// Return a copy with the column number replaced.
    pub fn with_col_num(&self, col_num: Option<usize>) -> Self {
        Self {
            col_num,
            ..self.clone()
        }
    }
}

impl Default for Origin {
    fn default() -> Self {
        Self {
            path: None,
            line_num: 1,
            col_num: None,
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.path.as_deref().unwrap_or("<data>"), self.line_num)?;
        if let Some(col) = self.col_num {
            write!(f, ":{col}")?;
        }
        Ok(())
    }
}
