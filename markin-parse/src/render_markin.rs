//! Canonical Markin renderer.
//!
//! Output reparses to an equivalent tree. It is not byte-identical to the
//! source: list markers are normalised to `- ` and `1. `, indentation is
//! rebuilt from nesting, and text is escaped wherever a character would
//! otherwise be read as markup.

use crate::parse::ParseMode;
use crate::types::{Block, Document, Inline, List, ListEntry, Paragraph};

/// Characters that always need a backslash inside text.
const ALWAYS_ESCAPED: &str = "\\`*_![";

/// Characters that open a block when they begin a line.
const LINE_START_ESCAPED: &str = "#-+>";

/// Render `doc` as strict-mode Markin.
pub fn to_markin(doc: &Document) -> String {
    to_markin_with(doc, ParseMode::Strict)
}

/// Render `doc` using the emphasis delimiters of `mode`.
///
/// Blocks are separated by a blank line and the output ends with a newline
/// (an empty document renders as the empty string).
pub fn to_markin_with(doc: &Document, mode: ParseMode) -> String {
    let mut out = String::new();
    let mut previous: Option<&Block> = None;

    for block in &doc.blocks {
        if let Some(previous) = previous {
            // A single blank line would continue the first quote.
            if matches!((previous, block), (Block::BlockQuote(_), Block::BlockQuote(_))) {
                out.push_str("\n\n\n");
            } else {
                out.push_str("\n\n");
            }
        }
        out.push_str(&render_block(block, mode));
        previous = Some(block);
    }

    if !out.is_empty() {
        out.push('\n');
    }
    out
}

fn render_block(block: &Block, mode: ParseMode) -> String {
    match block {
        Block::Header(header) => format!(
            "{} {}",
            "#".repeat(header.level() as usize),
            render_inlines(&header.content, mode, "\n")
        ),
        Block::Paragraph(paragraph) => render_inlines(paragraph, mode, "\n"),
        Block::CodeBlock(code) => {
            let language = code.language().unwrap_or("");
            if code.content.is_empty() {
                format!("```{language}\n```")
            } else {
                format!("```{language}\n{}\n```", code.content)
            }
        }
        Block::BlockQuote(quote) => {
            let paragraphs: Vec<String> = quote
                .content
                .iter()
                .map(|paragraph| format!("> {}", render_inlines(paragraph, mode, "\n> ")))
                .collect();
            paragraphs.join("\n>\n")
        }
        Block::List(list) => render_list(list, mode, 0),
        Block::HorizontalRule(_) => "---".to_string(),
        Block::TableOfContents(_) => "%TOC".to_string(),
    }
}

fn render_list(list: &List, mode: ParseMode, level: usize) -> String {
    let indent = "  ".repeat(level);
    let marker = if list.ordered { "1. " } else { "- " };
    let lines: Vec<String> = list
        .entries
        .iter()
        .map(|entry| match entry {
            ListEntry::Paragraph(paragraph) => {
                format!("{indent}{marker}{}", render_inlines(paragraph, mode, "\n"))
            }
            ListEntry::List(nested) => render_list(nested, mode, level + 1),
        })
        .collect();
    lines.join("\n")
}

/// Render paragraph content, putting `line_break` between consecutive text
/// runs (each run after the first started a new source line) and in place
/// of any newline inside a run.
fn render_inlines(paragraph: &Paragraph, mode: ParseMode, line_break: &str) -> String {
    let mut out = String::new();
    let mut line_start = true;
    let mut previous_was_text = false;

    for inline in &paragraph.content {
        match inline {
            Inline::Text(text) => {
                if previous_was_text {
                    out.push_str(line_break);
                    line_start = true;
                }
                for (i, line) in text.content.split('\n').enumerate() {
                    if i > 0 {
                        out.push_str(line_break);
                        line_start = true;
                    }
                    out.push_str(&escape_text(line, line_start));
                    line_start = false;
                }
                previous_was_text = true;
            }
            other => {
                out.push_str(&render_inline(other, mode));
                previous_was_text = false;
                line_start = false;
            }
        }
    }

    out
}

fn render_inline(inline: &Inline, mode: ParseMode) -> String {
    match inline {
        Inline::Text(text) => escape_text(&text.content, false),
        Inline::Bold(bold) => {
            let delimiter = match mode {
                ParseMode::Strict => "*",
                ParseMode::Markdown => "**",
            };
            format!("{delimiter}{}{delimiter}", render_inline(&bold.content, mode))
        }
        Inline::Italic(italic) => format!("_{}_", render_inline(&italic.content, mode)),
        Inline::Code(code) => format!("`{}`", code.content),
        Inline::Link(link) => format!("[{}]({})", link.caption, link.url),
        Inline::Image(image) => format!("![{}]({})", image.caption, image.url),
    }
}

/// Backslash-escape `text` so it reparses as the same text run.
///
/// At the start of a line, block markers (`#`, `-`, `+`, `>` or `N.`) after any
/// leading whitespace are escaped as well.
pub fn escape_text(text: &str, at_line_start: bool) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    if at_line_start {
        let body = rest.trim_start_matches([' ', '\t']);
        out.push_str(&rest[..rest.len() - body.len()]);
        rest = body;

        if rest.starts_with(|c| LINE_START_ESCAPED.contains(c)) {
            out.push('\\');
        } else {
            let digits = rest.len() - rest.trim_start_matches(|c: char| c.is_ascii_digit()).len();
            if digits > 0 && rest[digits..].starts_with('.') {
                out.push_str(&rest[..digits]);
                out.push_str("\\.");
                rest = &rest[digits + 1..];
            }
        }
    }

    for c in rest.chars() {
        if ALWAYS_ESCAPED.contains(c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
