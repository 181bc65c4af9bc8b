//! ANSI terminal renderer.
//!
//! Produces colored terminal output using the `colored` crate. Markup
//! delimiters are replaced by styling: bold is bold, italic is italic,
//! headers are colored by level.

use colored::{ColoredString, Colorize};

use crate::types::{Block, Document, Inline, List, ListEntry, Paragraph};

/// Render `doc` as ANSI-colored terminal text.
pub fn to_terminal(doc: &Document) -> String {
    let mut parts: Vec<String> = Vec::new();

    for block in &doc.blocks {
        parts.push(render_block(block, doc));
    }

    parts.join("\n\n")
}

fn render_block(block: &Block, doc: &Document) -> String {
    match block {
        Block::Header(header) => {
            let text = format!("{} {}", "#".repeat(header.level() as usize), render_inlines(&header.content));
            format!("{}", header_style(header.level(), &text))
        }
        Block::Paragraph(paragraph) => render_inlines(paragraph),
        Block::CodeBlock(code) => {
            let rule = "\u{2500}".repeat(3); // ───
            let label = code.language().unwrap_or("code");
            let mut lines = vec![format!("{} {}", rule.dimmed(), label.dimmed())];
            for line in code.content.lines() {
                lines.push(format!("  {}", line.yellow()));
            }
            lines.push(format!("{}", rule.dimmed()));
            lines.join("\n")
        }
        Block::BlockQuote(quote) => {
            let border = format!("{}", "\u{2502}".cyan()); // │
            let mut lines = Vec::new();
            for (i, paragraph) in quote.content.iter().enumerate() {
                if i > 0 {
                    lines.push(border.clone());
                }
                for line in render_inlines(paragraph).lines() {
                    lines.push(format!("{border} {line}"));
                }
            }
            lines.join("\n")
        }
        Block::List(list) => render_list(list, 0),
        Block::HorizontalRule(_) => format!("{}", "\u{2500}".repeat(40).dimmed()),
        Block::TableOfContents(_) => {
            let mut lines = vec![format!("{}", "Contents".bold())];
            let base = doc.headers().map(|header| header.level()).min().unwrap_or(1);
            for header in doc.headers() {
                let indent = "  ".repeat(usize::from(header.level() - base));
                lines.push(format!("{indent}\u{2022} {}", header.content.to_plain_text())); // •
            }
            lines.join("\n")
        }
    }
}

fn render_list(list: &List, level: usize) -> String {
    let indent = "  ".repeat(level);
    let mut number = 0;
    let lines: Vec<String> = list
        .entries
        .iter()
        .map(|entry| match entry {
            ListEntry::Paragraph(paragraph) => {
                let marker = if list.ordered {
                    number += 1;
                    format!("{number}.")
                } else {
                    "\u{2022}".to_string()
                };
                format!("{indent}{} {}", marker.dimmed(), render_inlines(paragraph))
            }
            ListEntry::List(nested) => render_list(nested, level + 1),
        })
        .collect();
    lines.join("\n")
}

fn render_inlines(paragraph: &Paragraph) -> String {
    let mut out = String::new();
    let mut previous_was_text = false;
    for inline in &paragraph.content {
        let is_text = matches!(inline, Inline::Text(_));
        if is_text && previous_was_text {
            out.push('\n');
        }
        out.push_str(&render_inline(inline));
        previous_was_text = is_text;
    }
    out
}

fn render_inline(inline: &Inline) -> String {
    match inline {
        Inline::Text(text) => text.content.clone(),
        Inline::Bold(bold) => format!("{}", render_inline(&bold.content).bold()),
        Inline::Italic(italic) => format!("{}", render_inline(&italic.content).italic()),
        Inline::Code(code) => format!("{}", code.content.yellow()),
        Inline::Link(link) => format!("{} ({})", link.caption.underline(), link.url.blue()),
        Inline::Image(image) => format!("[image: {}] ({})", image.caption, image.url.blue()),
    }
}

fn header_style(level: u8, text: &str) -> ColoredString {
    match level {
        1 => text.bold().magenta(),
        2 => text.bold().cyan(),
        3 => text.bold().green(),
        _ => text.bold(),
    }
}
