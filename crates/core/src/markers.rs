//! Opt-in gate and per-method marker resolution.
//!
//! A file is folded only when a documentation comment carries the activation
//! marker. Inside each method, a pair of single-line marker comments can
//! narrow the folded range; without them the whole body is scanned.

use serde::Serialize;

use crate::types::{LineBounds, Markers};

/// A single-line (end-of-line) comment and the line it sits on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineComment {
    pub line: usize,
    pub text: String,
}

impl LineComment {
    pub fn new(line: usize, text: impl Into<String>) -> Self {
        Self { line, text: text.into() }
    }
}

/// Does this documentation comment opt the file into indentation folding?
pub fn is_activated(doc_comment: &str, marker: &str) -> bool {
    doc_comment.contains(marker)
}

/// Resolve the line range to scan for one method body.
///
/// The first start marker moves the start to the line after it and the first
/// end marker sets the end to its own line; later duplicates are ignored.
/// Without a start marker the body bounds are used and a lone end marker has
/// no effect. A start marker without an end marker scans to the end of the body.
pub fn resolve_bounds(comments: &[LineComment], body: LineBounds, markers: Markers<'_>) -> LineBounds {
    let mut start = None;
    let mut end = None;

    for comment in comments {
        if start.is_some() && end.is_some() {
            break;
        }
        if start.is_none() && comment.text.contains(markers.start) {
            start = Some(comment.line + 1);
        } else if end.is_none() && comment.text.contains(markers.end) {
            end = Some(comment.line);
        }
    }

    match start {
        Some(start) => LineBounds::new(start, end.unwrap_or(body.end)),
        None => body,
    }
}
