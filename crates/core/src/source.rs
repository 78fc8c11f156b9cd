//! Source access seams for the block finder.
//!
//! The finder never touches a document directly. It reads lines through a
//! [`LineSource`] and asks a [`CommentClassifier`] whether a line starts with a
//! comment, so editors, tree-sitter and plain line arrays can all drive it.

// ---------------------------------------------------------------------------
// Capability traits
// ---------------------------------------------------------------------------

/// Random access to line text and line offsets.
pub trait LineSource {
    fn line_count(&self) -> usize;

    /// Text of a line without its terminator, or `None` past the end.
    fn line_text(&self, line: usize) -> Option<&str>;

    /// Byte offset of the first character of a line.
    fn line_start_offset(&self, line: usize) -> Option<usize>;

    /// Byte offset just past the last character of a line, terminator excluded.
    fn line_end_offset(&self, line: usize) -> Option<usize> {
        let start = self.line_start_offset(line)?;
        Some(start + self.line_text(line)?.len())
    }
}

/// Answers whether the first token on a line is a comment.
pub trait CommentClassifier {
    fn is_comment_line(&self, line: usize) -> bool;
}

impl<F> CommentClassifier for F
where
    F: Fn(usize) -> bool,
{
    fn is_comment_line(&self, line: usize) -> bool {
        self(line)
    }
}

/// Classifier for sources without comments.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoComments;

impl CommentClassifier for NoComments {
    fn is_comment_line(&self, _line: usize) -> bool {
        false
    }
}

/// Per-line comment flags computed ahead of time (e.g. by an outline scan).
#[derive(Debug, Clone, Default)]
pub struct CommentLines(pub Vec<bool>);

impl CommentClassifier for CommentLines {
    fn is_comment_line(&self, line: usize) -> bool {
        self.0.get(line).copied().unwrap_or(false)
    }
}

// ---------------------------------------------------------------------------
// In-memory source
// ---------------------------------------------------------------------------

/// Owned text split into lines, with the byte offset of every line start.
///
/// Lines are split on `\n`; a trailing `\r` is kept out of the line text so
/// CRLF files report the same line content as LF files.
#[derive(Debug, Clone)]
pub struct TextSource {
    text: String,
    /// (start offset, text length) per line.
    lines: Vec<(usize, usize)>,
}

impl TextSource {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let mut lines = Vec::new();
        let mut start = 0;
        for segment in text.split('\n') {
            let len = segment.strip_suffix('\r').unwrap_or(segment).len();
            lines.push((start, len));
            start += segment.len() + 1;
        }
        // "a\nb\n" has two lines, not three
        if text.ends_with('\n') {
            lines.pop();
        }
        Self { text, lines }
    }

    /// Build a source from individual lines joined with `\n`.
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined: Vec<String> = lines.into_iter().map(|l| l.as_ref().to_string()).collect();
        Self::new(joined.join("\n"))
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl LineSource for TextSource {
    fn line_count(&self) -> usize {
        self.lines.len()
    }

    fn line_text(&self, line: usize) -> Option<&str> {
        let &(start, len) = self.lines.get(line)?;
        self.text.get(start..start + len)
    }

    fn line_start_offset(&self, line: usize) -> Option<usize> {
        self.lines.get(line).map(|&(start, _)| start)
    }

    fn line_end_offset(&self, line: usize) -> Option<usize> {
        self.lines.get(line).map(|&(start, len)| start + len)
    }
}

impl<T: LineSource + ?Sized> LineSource for &T {
    fn line_count(&self) -> usize {
        (**self).line_count()
    }

    fn line_text(&self, line: usize) -> Option<&str> {
        (**self).line_text(line)
    }

    fn line_start_offset(&self, line: usize) -> Option<usize> {
        (**self).line_start_offset(line)
    }

    fn line_end_offset(&self, line: usize) -> Option<usize> {
        (**self).line_end_offset(line)
    }
}
