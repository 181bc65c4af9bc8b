//! Flat text extraction.
//!
//! Strips all formatting, keeping only what a reader would see. Used for
//! header anchors and by view layers that need a plain label for a node.

use crate::types::{Inline, Paragraph};

impl Paragraph {
    /// Concatenated text of all inline content. Source line breaks (two
    /// consecutive text runs) become `\n`.
    pub fn to_plain_text(&self) -> String {
        let mut out = String::new();
        let mut previous_was_text = false;
        for inline in &self.content {
            let is_text = matches!(inline, Inline::Text(_));
            if is_text && previous_was_text {
                out.push('\n');
            }
            inline.write_plain_text(&mut out);
            previous_was_text = is_text;
        }
        out
    }
}

impl Inline {
    pub fn to_plain_text(&self) -> String {
        let mut out = String::new();
        self.write_plain_text(&mut out);
        out
    }

    fn write_plain_text(&self, out: &mut String) {
        match self {
            Inline::Text(text) => out.push_str(&text.content),
            Inline::Bold(bold) => bold.content.write_plain_text(out),
            Inline::Italic(italic) => italic.content.write_plain_text(out),
            Inline::Code(code) => out.push_str(&code.content),
            Inline::Link(link) => out.push_str(&link.caption),
            Inline::Image(image) => out.push_str(&image.caption),
        }
    }
}
