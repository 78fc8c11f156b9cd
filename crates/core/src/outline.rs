//! Source outline: doc comments, method bodies and comment lines.
//!
//! A lightweight lexer stands in for an IDE syntax tree. One pass over the
//! file tracks comments, string literals and braces, and records everything
//! the folding pipeline needs from the host: the file's documentation
//! comments, every method-like unit with a braced body, the single-line
//! comments in source order, and which lines start with a comment.

use serde::Serialize;
use tracing::trace;

use crate::markers::LineComment;
use crate::source::CommentLines;
use crate::types::LineBounds;

// ---------------------------------------------------------------------------
// Language family classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LanguageFamily {
    BraceBased,
    IndentBased,
    Unknown,
}

pub fn classify_language(ext: &str) -> LanguageFamily {
    match ext {
        // Brace-based languages
        "h" | "hpp" | "hxx" | "cpp" | "cxx" | "cc" | "c" | "cs" | "java" | "kt" | "scala"
        | "rs" | "go" | "js" | "ts" | "jsx" | "tsx" | "mjs" | "cjs" | "swift" | "groovy"
        | "dart" | "php" => LanguageFamily::BraceBased,
        // Indent-based languages
        "py" | "pyi" | "rb" | "yaml" | "yml" => LanguageFamily::IndentBased,
        _ => LanguageFamily::Unknown,
    }
}

/// Comment delimiters of a language family.
#[derive(Debug, Clone, Copy)]
pub struct CommentSyntax {
    pub line: &'static [&'static str],
    pub block: Option<(&'static str, &'static str)>,
    /// Prefix that turns a block comment into a documentation comment.
    pub doc: Option<&'static str>,
}

impl CommentSyntax {
    pub fn for_family(family: LanguageFamily) -> Self {
        match family {
            LanguageFamily::BraceBased => CommentSyntax {
                line: &["//"],
                block: Some(("/*", "*/")),
                doc: Some("/**"),
            },
            LanguageFamily::IndentBased => CommentSyntax { line: &["#"], block: None, doc: None },
            LanguageFamily::Unknown => CommentSyntax { line: &["#", "//"], block: None, doc: None },
        }
    }

    pub fn for_ext(ext: &str) -> Self {
        Self::for_family(classify_language(ext))
    }
}

// ---------------------------------------------------------------------------
// Outline types
// ---------------------------------------------------------------------------

/// A method-like construct with a braced body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Unit {
    pub name: String,
    /// Line where the declaration starts (annotations included).
    pub header_line: usize,
    /// Line holding the opening brace of the body.
    pub open_line: usize,
    /// Line holding the closing brace of the body.
    pub close_line: usize,
    /// Single-line comments inside the body, in source order.
    pub line_comments: Vec<LineComment>,
    #[serde(skip)]
    pub open_offset: usize,
    #[serde(skip)]
    pub close_offset: usize,
}

impl Unit {
    /// Lines from the one after the opening brace through the closing brace.
    pub fn body_bounds(&self) -> LineBounds {
        LineBounds::new(self.open_line + 1, self.close_line)
    }
}

/// Everything the folding pipeline needs to know about one file.
#[derive(Debug, Clone)]
pub struct Outline {
    pub family: LanguageFamily,
    /// Documentation comments in source order, delimiters included.
    pub doc_comments: Vec<String>,
    pub units: Vec<Unit>,
    pub comment_lines: CommentLines,
}

impl Outline {
    pub fn first_doc_comment(&self) -> Option<&str> {
        self.doc_comments.first().map(String::as_str)
    }
}

/// Build the outline of a file. Units are only discovered for brace-based languages.
pub fn outline(content: &str, ext: &str) -> Outline {
    let family = classify_language(ext);
    let mut lexer = Lexer::new(content, family);
    lexer.run();
    lexer.finish()
}

// ---------------------------------------------------------------------------
// Lexer
// ---------------------------------------------------------------------------

struct Frame {
    /// Method name and header line when the brace opens a method body.
    method: Option<(String, usize)>,
    open_line: usize,
    open_offset: usize,
}

struct Lexer<'a> {
    src: &'a str,
    family: LanguageFamily,
    syntax: CommentSyntax,
    line: usize,
    line_has_token: bool,
    comment_lines: Vec<bool>,
    /// (byte offset, comment)
    line_comments: Vec<(usize, LineComment)>,
    doc_comments: Vec<String>,
    header: String,
    header_line: Option<usize>,
    frames: Vec<Frame>,
    units: Vec<Unit>,
}

impl<'a> Lexer<'a> {
    fn new(src: &'a str, family: LanguageFamily) -> Self {
        Self {
            src,
            family,
            syntax: CommentSyntax::for_family(family),
            line: 0,
            line_has_token: false,
            comment_lines: vec![false],
            line_comments: Vec::new(),
            doc_comments: Vec::new(),
            header: String::new(),
            header_line: None,
            frames: Vec::new(),
            units: Vec::new(),
        }
    }

    fn run(&mut self) {
        let src = self.src;
        let syntax = self.syntax;
        let len = src.len();
        let mut i = 0;

        while i < len {
            let rest = &src[i..];
            let Some(c) = rest.chars().next() else { break };

            if c == '\n' {
                self.newline();
                i += 1;
                continue;
            }
            if c.is_whitespace() {
                self.header_space();
                i += c.len_utf8();
                continue;
            }

            if let Some(prefix) = syntax.line.iter().find(|p| rest.starts_with(**p)) {
                let end = rest.find('\n').map_or(len, |n| i + n);
                self.mark_token(true);
                let text = src[i..end].trim_end_matches('\r');
                self.line_comments.push((i, LineComment::new(self.line, text)));
                trace!(line = self.line, prefix = *prefix, "Line comment");
                i = end;
                continue;
            }

            if let Some((open, close)) = syntax.block {
                if rest.starts_with(open) {
                    let body = i + open.len();
                    let end = src[body..].find(close).map_or(len, |n| body + n + close.len());
                    let text = &src[i..end];
                    if syntax.doc.is_some_and(|doc| text.starts_with(doc)) && text != "/**/" {
                        self.doc_comments.push(text.to_string());
                    }
                    self.walk_span(i, end, true);
                    self.header_space();
                    i = end;
                    continue;
                }
            }

            if let Some(end) = self.string_end(i) {
                self.walk_span(i, end, false);
                self.header_code("\"\"");
                i = end;
                continue;
            }

            self.mark_token(false);
            match c {
                '{' => self.open_brace(i),
                '}' => self.close_brace(i),
                ';' => self.reset_header(),
                _ => {
                    let mut buf = [0u8; 4];
                    self.header_code(c.encode_utf8(&mut buf));
                }
            }
            i += c.len_utf8();
        }
    }

    fn finish(mut self) -> Outline {
        self.units.sort_by_key(|u| u.open_offset);

        for unit in &mut self.units {
            unit.line_comments = self
                .line_comments
                .iter()
                .filter(|(offset, _)| *offset > unit.open_offset && *offset < unit.close_offset)
                .map(|(_, comment)| comment.clone())
                .collect();
        }

        Outline {
            family: self.family,
            doc_comments: self.doc_comments,
            units: self.units,
            comment_lines: CommentLines(self.comment_lines),
        }
    }

    fn newline(&mut self) {
        self.line += 1;
        self.line_has_token = false;
        self.comment_lines.push(false);
        self.header_space();
    }

    /// Record the first token of the current line.
    fn mark_token(&mut self, is_comment: bool) {
        if !self.line_has_token {
            self.line_has_token = true;
            if is_comment {
                self.comment_lines[self.line] = true;
            }
        }
    }

    /// Step over a comment or string literal, keeping line bookkeeping current.
    fn walk_span(&mut self, start: usize, end: usize, is_comment: bool) {
        let src = self.src;
        for c in src[start..end].chars() {
            if c == '\n' {
                self.line += 1;
                self.line_has_token = false;
                self.comment_lines.push(false);
            } else if !c.is_whitespace() {
                self.mark_token(is_comment);
            }
        }
    }

    /// End offset of a string or char literal starting at `i`, if one starts there.
    fn string_end(&self, i: usize) -> Option<usize> {
        let rest = &self.src[i..];
        let quote = rest.chars().next()?;

        for triple in ["\"\"\"", "'''"] {
            if rest.starts_with(triple) && (triple == "\"\"\"" || self.family != LanguageFamily::BraceBased) {
                let body = i + 3;
                return Some(self.src[body..].find(triple).map_or(self.src.len(), |n| body + n + 3));
            }
        }

        match quote {
            '"' => Some(i + quoted_len(rest, '"', false)),
            '`' if self.family == LanguageFamily::BraceBased => Some(i + quoted_len(rest, '`', true)),
            '\'' if self.family == LanguageFamily::BraceBased => char_literal_len(rest).map(|n| i + n),
            '\'' => Some(i + quoted_len(rest, '\'', false)),
            _ => None,
        }
    }

    fn header_code(&mut self, text: &str) {
        if self.header_line.is_none() {
            self.header_line = Some(self.line);
        }
        self.header.push_str(text);
    }

    fn header_space(&mut self) {
        if !self.header.is_empty() && !self.header.ends_with(' ') {
            self.header.push(' ');
        }
    }

    fn reset_header(&mut self) {
        self.header.clear();
        self.header_line = None;
    }

    fn open_brace(&mut self, offset: usize) {
        let method = if self.family == LanguageFamily::BraceBased {
            method_name(&self.header).map(|name| (name, self.header_line.unwrap_or(self.line)))
        } else {
            None
        };
        self.frames.push(Frame { method, open_line: self.line, open_offset: offset });
        self.reset_header();
    }

    fn close_brace(&mut self, offset: usize) {
        if let Some(frame) = self.frames.pop() {
            if let Some((name, header_line)) = frame.method {
                self.units.push(Unit {
                    name,
                    header_line,
                    open_line: frame.open_line,
                    close_line: self.line,
                    line_comments: Vec::new(),
                    open_offset: frame.open_offset,
                    close_offset: offset,
                });
            }
        }
        self.reset_header();
    }
}

/// Length of a quoted literal including both quotes. Unterminated literals
/// stop at the end of the line unless `multiline` is set.
fn quoted_len(rest: &str, quote: char, multiline: bool) -> usize {
    let mut escaped = false;
    for (idx, c) in rest.char_indices().skip(1) {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == quote {
            return idx + c.len_utf8();
        } else if c == '\n' && !multiline {
            return idx;
        }
    }
    rest.len()
}

/// Char literals like `'a'` or `'\n'`; anything else (Rust lifetimes) is code.
fn char_literal_len(rest: &str) -> Option<usize> {
    let mut chars = rest.char_indices().skip(1);
    let (_, first) = chars.next()?;
    match first {
        '\n' | '\'' => None,
        '\\' => chars
            .take(10)
            .take_while(|&(_, c)| c != '\n')
            .skip(1)
            .find(|&(_, c)| c == '\'')
            .map(|(idx, _)| idx + 1),
        _ => match chars.next()? {
            (idx, '\'') => Some(idx + 1),
            _ => None,
        },
    }
}

// ---------------------------------------------------------------------------
// Method header recognition
// ---------------------------------------------------------------------------

const CONTROL_KEYWORDS: &[&str] = &[
    "if", "for", "while", "switch", "catch", "synchronized", "try", "else", "do", "return",
    "new", "throw", "using", "lock", "foreach", "fixed", "when", "match", "loop", "unsafe",
    "sizeof", "typeof", "with", "await", "assert", "case", "defer", "go", "select", "super",
    "this",
];

const TYPE_KEYWORDS: &[&str] = &[
    "class", "interface", "enum", "record", "struct", "trait", "impl", "namespace", "object",
    "union", "extension", "mod",
];

const FN_KEYWORDS: &[&str] = &["fn", "func", "fun", "function", "def"];

/// Modifiers that may follow a parameter list before the body opens.
const SIGNATURE_SUFFIXES: &[&str] =
    &["throws", "const", "override", "noexcept", "final", "where", "mutable", "async", ":"];

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Name of the method declared by the text in front of a `{`, if it is one.
pub fn method_name(header: &str) -> Option<String> {
    let h = strip_annotations(header.trim());
    let paren = h.find('(')?;
    let before = h[..paren].trim_end();
    let words: Vec<&str> = before.split(|c: char| !is_ident_char(c)).filter(|w| !w.is_empty()).collect();

    if words.iter().any(|w| TYPE_KEYWORDS.contains(w)) {
        return None;
    }

    if let Some(pos) = words.iter().position(|w| FN_KEYWORDS.contains(w)) {
        if let Some(name) = words.get(pos + 1) {
            return Some(name.to_string());
        }
        // Go receivers: `func (s *Server) Name(`
        let close = matching_paren(h, paren)?;
        let name: String = h[close + 1..].trim_start().chars().take_while(|&c| is_ident_char(c)).collect();
        return (!name.is_empty()).then_some(name);
    }

    // Lambdas and assignments: `x -> {`, `Runnable r = new Runnable() {`
    if h.contains("->") || before.contains('=') {
        return None;
    }

    let before = strip_generic_suffix(before);
    let name = before
        .rsplit(|c: char| !is_ident_char(c))
        .next()
        .filter(|n| !n.is_empty())?;
    if CONTROL_KEYWORDS.contains(&name) || name.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    let prefix = before[..before.len() - name.len()].trim_end();
    // call chains (`list.forEach(`) and anonymous classes (`new Foo(`)
    if prefix.ends_with('.') || prefix.split(|c: char| !is_ident_char(c)).any(|w| w == "new") {
        return None;
    }

    let close = matching_paren(h, paren)?;
    let rest = h[close + 1..].trim();
    if rest.is_empty() || SIGNATURE_SUFFIXES.iter().any(|s| rest.starts_with(s)) {
        Some(name.to_string())
    } else {
        None
    }
}

fn strip_annotations(mut h: &str) -> &str {
    while let Some(rest) = h.strip_prefix('@') {
        let ident_len = rest.find(|c: char| !(is_ident_char(c) || c == '.')).unwrap_or(rest.len());
        let after = rest[ident_len..].trim_start();
        h = if after.starts_with('(') {
            match matching_paren(after, 0) {
                Some(close) => after[close + 1..].trim_start(),
                None => return "",
            }
        } else {
            after
        };
    }
    h
}

/// `List<T> foo<T>` -> `List<T> foo`
fn strip_generic_suffix(s: &str) -> &str {
    if !s.ends_with('>') {
        return s;
    }
    let mut depth = 0usize;
    for (idx, c) in s.char_indices().rev() {
        match c {
            '>' => depth += 1,
            '<' => {
                depth -= 1;
                if depth == 0 {
                    return s[..idx].trim_end();
                }
            }
            _ => {}
        }
    }
    s
}

/// Byte index of the `)` matching the `(` at `open`.
fn matching_paren(s: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (idx, b) in s.bytes().enumerate().skip(open) {
        match b {
            b'(' => depth += 1,
            b')' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(idx);
                }
            }
            _ => {}
        }
    }
    None
}
