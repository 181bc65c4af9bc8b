//! Debug trace renderer.
//!
//! Dumps the tree one node per line, indented two spaces per level. Two
//! trees are structurally equal exactly when their traces are equal, which is
//! how tests compare trees (nodes themselves compare by identity).

use std::fmt::Write;

use crate::types::{Block, Document, Inline, List, ListEntry, Paragraph};

/// Render an indented structural dump of `doc`.
pub fn to_debug_string(doc: &Document) -> String {
    let mut out = String::from("BLOCKS(\n");
    for block in &doc.blocks {
        write_block(&mut out, block, 1);
    }
    out.push_str(")\n");
    out
}

fn indent(out: &mut String, level: usize) {
    out.push_str(&"  ".repeat(level));
}

fn write_block(out: &mut String, block: &Block, level: usize) {
    match block {
        Block::Header(header) => {
            indent(out, level);
            let _ = writeln!(out, "HEADER(level: {},", header.level());
            write_paragraph(out, &header.content, level + 1);
            indent(out, level);
            out.push_str(")\n");
        }
        Block::Paragraph(paragraph) => write_paragraph(out, paragraph, level),
        Block::CodeBlock(code) => {
            indent(out, level);
            let _ = writeln!(
                out,
                "CODEBLOCK(language: {}, content: {:?})",
                code.language().unwrap_or("N/A"),
                code.content
            );
        }
        Block::BlockQuote(quote) => {
            indent(out, level);
            out.push_str("BLOCKQUOTE(\n");
            for paragraph in &quote.content {
                write_paragraph(out, paragraph, level + 1);
            }
            indent(out, level);
            out.push_str(")\n");
        }
        Block::List(list) => write_list(out, list, level),
        Block::HorizontalRule(_) => {
            indent(out, level);
            out.push_str("HORIZONTALRULE()\n");
        }
        Block::TableOfContents(_) => {
            indent(out, level);
            out.push_str("TOC()\n");
        }
    }
}

fn write_list(out: &mut String, list: &List, level: usize) {
    indent(out, level);
    let _ = writeln!(out, "LIST(ordered: {},", list.ordered);
    for entry in &list.entries {
        match entry {
            ListEntry::Paragraph(paragraph) => write_paragraph(out, paragraph, level + 1),
            ListEntry::List(nested) => write_list(out, nested, level + 1),
        }
    }
    indent(out, level);
    out.push_str(")\n");
}

fn write_paragraph(out: &mut String, paragraph: &Paragraph, level: usize) {
    indent(out, level);
    out.push_str("PARAGRAPH(\n");
    for inline in &paragraph.content {
        write_inline(out, inline, level + 1);
    }
    indent(out, level);
    out.push_str(")\n");
}

fn write_inline(out: &mut String, inline: &Inline, level: usize) {
    indent(out, level);
    match inline {
        Inline::Text(text) => {
            let _ = writeln!(out, "TEXT({:?})", text.content);
        }
        Inline::Bold(bold) => {
            out.push_str("BOLD(\n");
            write_inline(out, &bold.content, level + 1);
            indent(out, level);
            out.push_str(")\n");
        }
        Inline::Italic(italic) => {
            out.push_str("ITALIC(\n");
            write_inline(out, &italic.content, level + 1);
            indent(out, level);
            out.push_str(")\n");
        }
        Inline::Code(code) => {
            let _ = writeln!(out, "CODE({:?})", code.content);
        }
        Inline::Link(link) => {
            let _ = writeln!(out, "LINK(url: {:?}, caption: {:?})", link.url, link.caption);
        }
        Inline::Image(image) => {
            let _ = writeln!(out, "IMAGE(url: {:?}, caption: {:?})", image.url, image.caption);
        }
    }
}
