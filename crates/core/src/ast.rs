//! tree-sitter outline backend for Java.
//!
//! Produces the same [`Outline`] as the lexer in [`crate::outline`], but from
//! a real syntax tree: doc comments, method and constructor bodies, and
//! comment nodes come straight from the grammar. Feature-gated behind
//! `treesitter` to keep the default build lean.

use tree_sitter::{Node, Parser};
use tracing::debug;

use crate::markers::LineComment;
use crate::outline::{LanguageFamily, Outline, Unit};
use crate::source::CommentLines;

/// Parse a Java file into an outline. Returns `None` for other extensions
/// or when the parser cannot produce a tree.
pub fn parse_outline(content: &str, ext: &str) -> Option<Outline> {
    if ext != "java" {
        return None;
    }
    let mut parser = Parser::new();
    parser.set_language(&tree_sitter_java::LANGUAGE.into()).ok()?;
    let tree = parser.parse(content, None)?;

    let lines: Vec<&str> = content.split('\n').collect();
    let mut out = TreeOutline {
        source: content.as_bytes(),
        lines: &lines,
        doc_comments: Vec::new(),
        units: Vec::new(),
        line_comments: Vec::new(),
        comment_lines: vec![false; lines.len()],
    };
    out.walk(&tree.root_node());

    out.units.sort_by_key(|u| u.open_offset);
    for unit in &mut out.units {
        unit.line_comments = out
            .line_comments
            .iter()
            .filter(|(offset, _)| *offset > unit.open_offset && *offset < unit.close_offset)
            .map(|(_, comment)| comment.clone())
            .collect();
    }

    debug!(units = out.units.len(), docs = out.doc_comments.len(), "tree-sitter outline built");

    Some(Outline {
        family: LanguageFamily::BraceBased,
        doc_comments: out.doc_comments,
        units: out.units,
        comment_lines: CommentLines(out.comment_lines),
    })
}

struct TreeOutline<'a> {
    source: &'a [u8],
    lines: &'a [&'a str],
    doc_comments: Vec<String>,
    units: Vec<Unit>,
    /// (byte offset, comment)
    line_comments: Vec<(usize, LineComment)>,
    comment_lines: Vec<bool>,
}

impl TreeOutline<'_> {
    fn walk(&mut self, node: &Node) {
        match node.kind() {
            "line_comment" => {
                let text = node.utf8_text(self.source).unwrap_or("").trim_end_matches('\r');
                let row = node.start_position().row;
                self.line_comments.push((node.start_byte(), LineComment::new(row, text)));
                self.mark_comment(node);
            }
            "block_comment" => {
                let text = node.utf8_text(self.source).unwrap_or("");
                if text.starts_with("/**") && text != "/**/" {
                    self.doc_comments.push(text.to_string());
                }
                self.mark_comment(node);
            }
            "method_declaration" | "constructor_declaration" | "compact_constructor_declaration" => {
                self.push_unit(node);
            }
            _ => {}
        }

        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            self.walk(&child);
        }
    }

    fn push_unit(&mut self, node: &Node) {
        let Some(body) = node.child_by_field_name("body") else {
            return;
        };
        let name = node
            .child_by_field_name("name")
            .and_then(|n| n.utf8_text(self.source).ok())
            .unwrap_or_default()
            .to_string();
        self.units.push(Unit {
            name,
            header_line: node.start_position().row,
            open_line: body.start_position().row,
            close_line: body.end_position().row,
            line_comments: Vec::new(),
            open_offset: body.start_byte(),
            close_offset: body.end_byte().saturating_sub(1),
        });
    }

    /// Mark lines whose first token belongs to this comment node.
    fn mark_comment(&mut self, node: &Node) {
        let start = node.start_position();
        let end = node.end_position();

        let first_col = self
            .lines
            .get(start.row)
            .map(|l| l.len() - l.trim_start().len())
            .unwrap_or(usize::MAX);
        if first_col == start.column {
            self.set_comment(start.row);
        }
        for row in start.row + 1..=end.row {
            self.set_comment(row);
        }
    }

    fn set_comment(&mut self, row: usize) {
        if let Some(flag) = self.comment_lines.get_mut(row) {
            *flag = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::CommentClassifier;

    #[test]
    fn java_outline_matches_lexer() {
        let src = "/**\n * use indentation-based folding strategy\n */\nclass A {\n    A() {\n        init();\n    }\n\n    void run() {\n        // indentation-based folding start\n        go();\n    }\n}\n";
        let tree = parse_outline(src, "java").unwrap();
        let lexed = crate::outline::outline(src, "java");

        assert_eq!(tree.doc_comments, lexed.doc_comments);
        let names: Vec<_> = tree.units.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, vec!["A", "run"]);
        for (a, b) in tree.units.iter().zip(&lexed.units) {
            assert_eq!((a.open_line, a.close_line), (b.open_line, b.close_line));
            assert_eq!(a.line_comments, b.line_comments);
        }
        for line in 0..13 {
            assert_eq!(
                tree.comment_lines.is_comment_line(line),
                lexed.comment_lines.is_comment_line(line),
                "line {line}"
            );
        }
    }

    #[test]
    fn other_languages_are_not_parsed() {
        assert!(parse_outline("fn main() {}", "rs").is_none());
    }
}
