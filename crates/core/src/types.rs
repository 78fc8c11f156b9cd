//! Core types shared across indentfold: per-line indentation records, line
//! bounds, fold results, folding configuration and per-file reports.

use serde::Serialize;
use std::collections::HashSet;
use std::path::PathBuf;

/// Default number of leading spaces that make up one indentation level.
pub const DEFAULT_TAB_SIZE: usize = 4;

/// Marker that opts a file into indentation-based folding when it appears in a doc comment.
pub const ACTIVATION_MARKER: &str = "use indentation-based folding strategy";

/// Single-line comment marker that starts the folded range of a method body.
pub const START_MARKER: &str = "indentation-based folding start";

/// Single-line comment marker that ends the folded range of a method body.
pub const END_MARKER: &str = "indentation-based folding end";

/// Maximum file size (in bytes) that will be read into memory during a scan.
pub const MAX_FILE_READ: usize = 512 * 1024;

// ---------------------------------------------------------------------------
// Line records
// ---------------------------------------------------------------------------

/// Indentation of a single line, computed fresh for every scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineIndent {
    /// 0-based line number in the source.
    pub line: usize,
    /// Leading spaces divided by the tab size.
    pub level: usize,
    /// Whether the trimmed line is empty.
    pub blank: bool,
}

/// Inclusive range of 0-based line numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LineBounds {
    pub start: usize,
    pub end: usize,
}

impl LineBounds {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// True when the range holds no lines (`end < start`).
    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }

    /// A range of exactly two lines, which can never hold a fold.
    pub fn is_degenerate(&self) -> bool {
        self.start.checked_add(1) == Some(self.end)
    }
}

// ---------------------------------------------------------------------------
// Fold results
// ---------------------------------------------------------------------------

/// A fold expressed in line numbers, as produced by the block finder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineBlock {
    pub start_line: usize,
    pub end_line: usize,
    pub placeholder: String,
}

/// A collapsible region in byte offsets, ready to hand to an editor.
///
/// `start_offset` points at the start of the opening line (or past its
/// indentation under [`StartOffsetPolicy::SkipIndent`]); `end_offset` is the
/// end of the closing line, line terminator excluded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FoldRegion {
    pub start_offset: usize,
    pub end_offset: usize,
    pub placeholder: String,
    pub start_line: usize,
    pub end_line: usize,
}

impl FoldRegion {
    /// Indentation folds are always shown expanded when a file is opened.
    pub fn collapsed_by_default(&self) -> bool {
        false
    }
}

// ---------------------------------------------------------------------------
// Folding configuration
// ---------------------------------------------------------------------------

/// Where a fold region starts on its opening line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StartOffsetPolicy {
    /// Start of the line, including leading whitespace.
    #[default]
    LineStart,
    /// After `level * tab_size` columns of indentation.
    SkipIndent,
}

impl StartOffsetPolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "line-start" => Some(StartOffsetPolicy::LineStart),
            "skip-indent" => Some(StartOffsetPolicy::SkipIndent),
            _ => None,
        }
    }
}

/// Runtime configuration for folding. Loaded from .indentfold.toml or defaults.
#[derive(Debug, Clone)]
pub struct FoldConfig {
    pub root: PathBuf,
    pub tab_size: usize,
    pub start_offset: StartOffsetPolicy,
    pub activation_marker: String,
    pub start_marker: String,
    pub end_marker: String,
    /// When false, files are folded even without the activation marker.
    pub require_activation: bool,
    /// File extensions to fold during a project scan. Empty = every brace-based language.
    pub extensions: HashSet<String>,
    /// Directory names to skip during the project walk.
    pub skip_dirs: HashSet<String>,
}

impl FoldConfig {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            tab_size: DEFAULT_TAB_SIZE,
            start_offset: StartOffsetPolicy::LineStart,
            activation_marker: ACTIVATION_MARKER.to_string(),
            start_marker: START_MARKER.to_string(),
            end_marker: END_MARKER.to_string(),
            require_activation: true,
            extensions: HashSet::new(),
            skip_dirs: [".git", "node_modules", "target", "build", "out", ".gradle", ".idea"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    /// Marker strings used when resolving per-method bounds.
    pub fn markers(&self) -> Markers<'_> {
        Markers { start: &self.start_marker, end: &self.end_marker }
    }
}

impl Default for FoldConfig {
    fn default() -> Self {
        Self::new(PathBuf::from("."))
    }
}

/// Borrowed start/end marker pair.
#[derive(Debug, Clone, Copy)]
pub struct Markers<'a> {
    pub start: &'a str,
    pub end: &'a str,
}

impl Default for Markers<'static> {
    fn default() -> Self {
        Markers { start: START_MARKER, end: END_MARKER }
    }
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// Folds found in one file of a project scan.
#[derive(Debug, Clone, Serialize)]
pub struct FileFolds {
    pub path: String,
    pub activated: bool,
    pub units: usize,
    pub regions: Vec<FoldRegion>,
}
