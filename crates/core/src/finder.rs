//! Indentation block finder: pairs a line with the next line at the same
//! indentation level once a deeper-indented line has opened a block.
//!
//! The scan is a single pass over the bounded line range. Each opener does a
//! linear search for its closer, so pathological inputs are quadratic.

use tracing::trace;

use crate::source::{CommentClassifier, LineSource};
use crate::types::*;

/// Finds indentation-delimited fold regions in a bounded line range.
#[derive(Debug, Clone, Copy)]
pub struct IndentationBlockFinder {
    tab_size: usize,
    start_offset: StartOffsetPolicy,
}

impl Default for IndentationBlockFinder {
    fn default() -> Self {
        Self { tab_size: DEFAULT_TAB_SIZE, start_offset: StartOffsetPolicy::LineStart }
    }
}

impl IndentationBlockFinder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a finder from folding configuration.
    pub fn from_config(config: &FoldConfig) -> Self {
        Self::default().tab_size(config.tab_size).start_offset(config.start_offset)
    }

    /// Set the number of spaces per indentation level. Zero is treated as one.
    pub fn tab_size(mut self, tab_size: usize) -> Self {
        self.tab_size = tab_size.max(1);
        self
    }

    pub fn start_offset(mut self, policy: StartOffsetPolicy) -> Self {
        self.start_offset = policy;
        self
    }

    /// Indentation level of a line: literal leading spaces / tab size.
    /// Tabs are not expanded and stop the count.
    pub fn indent_level(&self, text: &str) -> usize {
        let spaces = text.bytes().take_while(|&b| b == b' ').count();
        spaces / self.tab_size
    }

    /// Scan `bounds` and return every fold as a pair of line numbers.
    ///
    /// Blank lines and lines the classifier reports as comments never open or
    /// close a block. Regions come out ordered by start line and may nest.
    pub fn find_blocks<S, C>(&self, source: &S, bounds: LineBounds, comments: &C) -> Vec<LineBlock>
    where
        S: LineSource + ?Sized,
        C: CommentClassifier + ?Sized,
    {
        let indents = self.line_indents(source, bounds);
        let excluded = |record: &LineIndent| record.blank || comments.is_comment_line(record.line);

        let mut blocks = Vec::new();
        for i in 0..indents.len().saturating_sub(1) {
            let current = indents[i];
            let next = indents[i + 1];

            if excluded(&current) {
                continue;
            }
            if next.level <= current.level {
                continue;
            }

            // The line right after the opener is deeper by construction, so the
            // search starts one further.
            let closer = indents
                .iter()
                .skip(i + 2)
                .find(|candidate| candidate.level == current.level && !excluded(candidate));

            match closer {
                Some(end) => {
                    let text = source.line_text(current.line).unwrap_or("");
                    blocks.push(LineBlock {
                        start_line: current.line,
                        end_line: end.line,
                        placeholder: placeholder_text(text),
                    });
                }
                None => trace!(line = current.line, level = current.level, "Block opener without closer"),
            }
        }
        blocks
    }

    /// Scan `bounds` and return every fold in byte offsets.
    pub fn find_fold_regions<S, C>(
        &self,
        source: &S,
        bounds: LineBounds,
        comments: &C,
    ) -> Vec<FoldRegion>
    where
        S: LineSource + ?Sized,
        C: CommentClassifier + ?Sized,
    {
        self.find_blocks(source, bounds, comments)
            .into_iter()
            .filter_map(|block| self.to_region(source, block))
            .collect()
    }

    fn to_region<S: LineSource + ?Sized>(&self, source: &S, block: LineBlock) -> Option<FoldRegion> {
        let line_start = source.line_start_offset(block.start_line)?;
        let start_offset = match self.start_offset {
            StartOffsetPolicy::LineStart => line_start,
            StartOffsetPolicy::SkipIndent => {
                let text = source.line_text(block.start_line)?;
                line_start + self.indent_level(text) * self.tab_size
            }
        };
        let end_offset = source.line_end_offset(block.end_line)?;
        Some(FoldRegion {
            start_offset,
            end_offset,
            placeholder: block.placeholder,
            start_line: block.start_line,
            end_line: block.end_line,
        })
    }

    /// Indentation records for `bounds`, clamped to the lines the source has.
    fn line_indents<S: LineSource + ?Sized>(&self, source: &S, bounds: LineBounds) -> Vec<LineIndent> {
        if bounds.is_empty() || bounds.is_degenerate() {
            return Vec::new();
        }
        let last = bounds.end.min(source.line_count().saturating_sub(1));
        if source.line_count() == 0 || last < bounds.start {
            return Vec::new();
        }

        (bounds.start..=last)
            .map_while(|line| {
                let text = source.line_text(line)?;
                Some(LineIndent { line, level: self.indent_level(text), blank: text.trim().is_empty() })
            })
            .collect()
    }
}

/// Placeholder shown for a collapsed block, derived from its opening line.
///
/// Chained calls keep the name after the first dot (`foo.bar(baz)` becomes
/// `.bar...`); lines without a dot keep their first five characters.
pub fn placeholder_text(line: &str) -> String {
    let stripped = line.trim_start();

    if let Some((_, after_dot)) = stripped.split_once('.') {
        let segment: String = after_dot.chars().take_while(|&c| is_name_char(c)).collect();
        return format!(".{segment}...");
    }

    let head: String = stripped.chars().take(5).collect();
    format!("{head}...")
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{NoComments, TextSource};

    fn finder() -> IndentationBlockFinder {
        IndentationBlockFinder::new()
    }

    fn whole(src: &TextSource) -> LineBounds {
        LineBounds::new(0, src.line_count() - 1)
    }

    #[test]
    fn indent_counts_only_spaces() {
        let f = finder();
        assert_eq!(f.indent_level(""), 0);
        assert_eq!(f.indent_level("   x"), 0);
        assert_eq!(f.indent_level("    x"), 1);
        assert_eq!(f.indent_level("         x"), 2);
        assert_eq!(f.indent_level("\t\tx"), 0);
        assert_eq!(f.indent_level("    \tx"), 1);
        assert_eq!(f.tab_size(2).indent_level("    x"), 2);
    }

    #[test]
    fn if_block_folds_to_same_level_line() {
        let src = TextSource::from_lines(["def f():", "    if x:", "        return 1", "    return 2"]);
        let blocks = finder().find_blocks(&src, whole(&src), &NoComments);
        assert_eq!(
            blocks,
            vec![LineBlock { start_line: 1, end_line: 3, placeholder: "if x:...".into() }]
        );
    }

    #[test]
    fn trailing_blank_line_changes_nothing() {
        let src = TextSource::from_lines(["def f():", "    if x:", "        return 1", "    return 2", ""]);
        let blocks = finder().find_blocks(&src, whole(&src), &NoComments);
        assert_eq!(blocks.len(), 1);
        assert_eq!((blocks[0].start_line, blocks[0].end_line), (1, 3));
    }

    #[test]
    fn two_line_range_is_always_empty() {
        let src = TextSource::from_lines(["a", "    b", "a", "    b", "a"]);
        assert!(finder().find_blocks(&src, LineBounds::new(0, 1), &NoComments).is_empty());
        assert!(finder().find_blocks(&src, LineBounds::new(2, 3), &NoComments).is_empty());
    }

    #[test]
    fn empty_and_inverted_ranges_are_empty() {
        let src = TextSource::from_lines(["a", "    b", "a", "x"]);
        assert!(finder().find_blocks(&src, LineBounds::new(3, 1), &NoComments).is_empty());
        assert!(finder().find_blocks(&src, LineBounds::new(10, 20), &NoComments).is_empty());
    }

    #[test]
    fn opener_without_closer_is_skipped() {
        let src = TextSource::from_lines(["a", "    b", "        c", "    d", "        e", "        f"]);
        // "a" and "d" never see their level again; "b" closes at "d".
        let blocks = finder().find_blocks(&src, whole(&src), &NoComments);
        assert_eq!(blocks.len(), 1);
        assert_eq!((blocks[0].start_line, blocks[0].end_line), (1, 3));
    }

    #[test]
    fn blank_or_comment_endpoints_are_suppressed() {
        let src = TextSource::from_lines([
            "    // note",
            "        x",
            "    y",
            "    z",
            "        w",
            "    // closing comment",
            "    ",
            "    v",
            "end",
        ]);
        let comments = |line: usize| matches!(line, 0 | 5);
        let blocks = finder().find_blocks(&src, whole(&src), &comments);
        // Line 0 is a comment opener: suppressed. Line 3 skips the comment and
        // the blank line, then closes at line 7.
        assert_eq!(blocks.len(), 1);
        assert_eq!((blocks[0].start_line, blocks[0].end_line), (3, 7));
        assert!(blocks.iter().all(|b| !comments(b.start_line) && !comments(b.end_line)));
    }

    #[test]
    fn blank_opener_is_suppressed() {
        let src = TextSource::from_lines(["", "    x", "", "    y", "z"]);
        assert!(finder().find_blocks(&src, whole(&src), &NoComments).is_empty());
    }

    #[test]
    fn nested_blocks_overlap() {
        let src = TextSource::from_lines([
            "for a:",
            "    for b:",
            "        c",
            "    d",
            "e",
            "}",
        ]);
        let blocks = finder().find_blocks(&src, whole(&src), &NoComments);
        let pairs: Vec<_> = blocks.iter().map(|b| (b.start_line, b.end_line)).collect();
        assert_eq!(pairs, vec![(0, 4), (1, 3)]);
    }

    #[test]
    fn every_block_satisfies_the_indent_invariant() {
        let lines = [
            "a",
            "    b",
            "        c",
            "            d",
            "        e",
            "    f",
            "        g",
            "    h",
            "i",
            "    j",
            "k",
            "}",
        ];
        let src = TextSource::from_lines(lines);
        let f = finder();
        let blocks = f.find_blocks(&src, whole(&src), &NoComments);
        assert!(!blocks.is_empty());
        for b in &blocks {
            let level = f.indent_level(lines[b.start_line]);
            assert_eq!(level, f.indent_level(lines[b.end_line]));
            assert!((b.start_line + 1..b.end_line).any(|l| f.indent_level(lines[l]) > level));
        }
        let starts: Vec<_> = blocks.iter().map(|b| b.start_line).collect();
        let mut sorted = starts.clone();
        sorted.sort();
        assert_eq!(starts, sorted);
    }

    #[test]
    fn scan_is_deterministic() {
        let src = TextSource::from_lines(["a", "    b", "a", "    b", "a", "x"]);
        let first = finder().find_blocks(&src, whole(&src), &NoComments);
        let second = finder().find_blocks(&src, whole(&src), &NoComments);
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn bounds_past_the_source_are_clamped() {
        let src = TextSource::from_lines(["a", "    b", "a", "x"]);
        let blocks = finder().find_blocks(&src, LineBounds::new(0, 40), &NoComments);
        assert_eq!(blocks.len(), 1);
        assert_eq!((blocks[0].start_line, blocks[0].end_line), (0, 2));
    }

    #[test]
    fn ranges_at_the_top_of_the_line_space_are_empty() {
        let src = TextSource::from_lines(["a", "    b", "a"]);
        let f = finder();
        assert!(f.find_blocks(&src, LineBounds::new(usize::MAX, usize::MAX), &NoComments).is_empty());
        assert!(f.find_blocks(&src, LineBounds::new(usize::MAX - 1, usize::MAX), &NoComments).is_empty());
        assert!(f.find_blocks(&src, LineBounds::new(7, usize::MAX), &NoComments).is_empty());
        assert!(LineBounds::new(usize::MAX - 1, usize::MAX).is_degenerate());
        assert!(!LineBounds::new(usize::MAX, usize::MAX).is_degenerate());
    }

    #[test]
    fn regions_use_line_offsets() {
        let src = TextSource::from_lines(["x", "    if a:", "        b", "    c", "y"]);
        let regions = finder().find_fold_regions(&src, whole(&src), &NoComments);
        assert_eq!(regions.len(), 2);
        let r = regions.iter().find(|r| r.start_line == 1).unwrap();
        assert_eq!(r.start_offset, 2);
        assert_eq!(r.end_offset, src.line_end_offset(3).unwrap());
        assert_eq!(&src.text()[r.start_offset..r.end_offset], "    if a:\n        b\n    c");
        assert!(!r.collapsed_by_default());

        let skipping = finder().start_offset(StartOffsetPolicy::SkipIndent);
        let regions = skipping.find_fold_regions(&src, whole(&src), &NoComments);
        assert_eq!(regions[0].start_offset, 0);
        assert_eq!(regions[1].start_offset, 6);
    }

    #[test]
    fn placeholder_prefers_dot_segment() {
        assert_eq!(placeholder_text("foo.bar(baz)"), ".bar...");
        assert_eq!(placeholder_text("    html.div().attr(x)"), ".div...");
        assert_eq!(placeholder_text(".start()"), ".start...");
    }

    #[test]
    fn placeholder_falls_back_to_five_chars() {
        assert_eq!(placeholder_text("    if x:"), "if x:...");
        assert_eq!(placeholder_text("while (running) {"), "while...");
        assert_eq!(placeholder_text("  ab"), "ab...");
        assert_eq!(placeholder_text("end.."), "....");
    }

    #[test]
    fn placeholder_is_bounded_by_line_length() {
        for line in ["x", "foo.bar", "a.b.c", "abcdefgh", "  .", "é.ü", "ümläuts"] {
            let p = placeholder_text(line);
            assert!(p.ends_with("..."));
            assert!(p.chars().count() <= line.trim_start().chars().count() + 3, "{line} -> {p}");
        }
    }
}
