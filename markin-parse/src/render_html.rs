//! HTML renderer.
//!
//! Produces a semantic HTML fragment. All text and attribute values are
//! HTML-escaped. The table of contents is resolved against the document's
//! top-level headers at render time.

use crate::types::{Block, Document, Header, Inline, List, ListEntry, Paragraph};

/// Settings for full-page rendering.
#[derive(Debug, Clone, Default)]
pub struct PageConfig {
    /// Page title. Falls back to the first header's text, then "Markin".
    pub title: Option<String>,
    /// Language code for `<html lang>` (default: "en").
    pub lang: Option<String>,
    /// External stylesheet URL. When unset the built-in stylesheet is
    /// embedded.
    pub stylesheet: Option<String>,
    /// Path of the Markin source published next to the page, advertised via
    /// `<link rel="alternate">`.
    pub source_path: Option<String>,
}

/// Render `doc` as an HTML fragment, one top-level element per line.
pub fn to_html(doc: &Document) -> String {
    let parts: Vec<String> = doc
        .blocks
        .iter()
        .map(|block| render_block(block, doc))
        .filter(|html| !html.is_empty())
        .collect();
    parts.join("\n")
}

/// Render `doc` as a complete HTML page.
pub fn to_html_page(doc: &Document, config: &PageConfig) -> String {
    let body = to_html(doc);
    let lang = config.lang.as_deref().unwrap_or("en");

    // Explicit config > first header > fallback
    let title = config
        .title
        .clone()
        .or_else(|| doc.headers().next().map(|header| header.content.to_plain_text()))
        .unwrap_or_else(|| "Markin".to_string());

    let mut head_extra = String::new();
    if let Some(source) = &config.source_path {
        head_extra.push_str(&format!(
            "\n    <link rel=\"alternate\" type=\"text/markin\" href=\"{}\">",
            escape_html(source)
        ));
    }
    match &config.stylesheet {
        Some(href) => head_extra.push_str(&format!(
            "\n    <link rel=\"stylesheet\" href=\"{}\">",
            escape_html(href)
        )),
        None => head_extra.push_str(&format!("\n    <style>{MARKIN_CSS}</style>")),
    }

    format!(
        r#"<!DOCTYPE html>
<html lang="{lang}">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <meta name="generator" content="markin">
    <title>{title}</title>{head_extra}
</head>
<body>
<article class="markin">
{body}
</article>
</body>
</html>
"#,
        lang = escape_html(lang),
        title = escape_html(&title),
        head_extra = head_extra,
        body = body,
    )
}

/// Built-in stylesheet for standalone pages.
const MARKIN_CSS: &str = r#"
body { margin: 0; background: #fdfdfc; color: #1f2328; font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif; }
.markin { max-width: 46rem; margin: 0 auto; padding: 2rem 1.5rem 4rem; line-height: 1.65; }
.markin h1, .markin h2, .markin h3 { line-height: 1.25; margin: 1.75rem 0 0.75rem; }
.markin h2 { padding-bottom: 0.3rem; border-bottom: 1px solid #d8dee4; }
.markin a { color: #0969da; text-decoration: none; }
.markin a:hover { text-decoration: underline; }
.markin blockquote { margin: 1rem 0; padding: 0 1rem; color: #59636e; border-left: 0.25rem solid #d1d9e0; }
.markin code { font-family: "SF Mono", "Fira Code", monospace; font-size: 0.875em; background: #eff1f3; padding: 0.15em 0.35em; border-radius: 4px; }
.markin pre { background: #f6f8fa; padding: 1rem; overflow-x: auto; border-radius: 6px; }
.markin pre code { background: transparent; padding: 0; }
.markin hr { border: none; border-top: 1px solid #d8dee4; margin: 2rem 0; }
.markin img { max-width: 100%; }
.markin .table-of-contents { list-style: none; padding-left: 0; }
.markin .table-of-contents ul { list-style: none; padding-left: 1.25rem; }
"#;

/// Escape HTML special characters.
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn render_block(block: &Block, doc: &Document) -> String {
    match block {
        Block::Header(header) => {
            let level = header.level();
            format!(
                "<h{level} id=\"{}\">{}</h{level}>",
                escape_html(&header.anchor_id()),
                render_inlines(&header.content)
            )
        }
        Block::Paragraph(paragraph) => format!("<p>{}</p>", render_inlines(paragraph)),
        Block::CodeBlock(code) => {
            let class_attr = code
                .language()
                .map(|lang| format!(" class=\"language-{}\"", escape_html(lang)))
                .unwrap_or_default();
            format!(
                "<pre><code{class_attr}>{}</code></pre>",
                escape_html(&code.content)
            )
        }
        Block::BlockQuote(quote) => {
            let paragraphs: Vec<String> = quote
                .content
                .iter()
                .map(|paragraph| format!("<p>{}</p>", render_inlines(paragraph)))
                .collect();
            format!("<blockquote>\n{}\n</blockquote>", paragraphs.join("\n"))
        }
        Block::List(list) => render_list(list),
        Block::HorizontalRule(_) => "<hr>".to_string(),
        Block::TableOfContents(_) => render_table_of_contents(doc),
    }
}

fn render_list(list: &List) -> String {
    let tag = if list.ordered { "ol" } else { "ul" };
    let items: Vec<String> = list
        .entries
        .iter()
        .map(|entry| match entry {
            ListEntry::Paragraph(paragraph) => format!("<li>{}</li>", render_inlines(paragraph)),
            ListEntry::List(nested) => format!("<li>{}</li>", render_list(nested)),
        })
        .collect();
    format!("<{tag}>\n{}\n</{tag}>", items.join("\n"))
}

/// Nested `<ul>` of links to every top-level header.
///
/// The first header sets the base level. Each step deeper opens one nested
/// list; each step shallower closes one, never above the base.
fn render_table_of_contents(doc: &Document) -> String {
    let headers: Vec<&Header> = doc.headers().collect();
    let Some(first) = headers.first() else {
        return String::new();
    };

    let mut lines = vec!["<ul class=\"table-of-contents\">".to_string()];
    let mut depth = 0usize;
    let mut previous = first.level();

    for header in &headers {
        let level = header.level();
        if level > previous {
            for _ in previous..level {
                lines.push("<li><ul>".to_string());
            }
            depth += usize::from(level - previous);
        } else if level < previous {
            let closes = usize::from(previous - level).min(depth);
            for _ in 0..closes {
                lines.push("</ul></li>".to_string());
            }
            depth -= closes;
        }
        lines.push(format!(
            "<li><a href=\"#{}\">{}</a></li>",
            escape_html(&header.anchor_id()),
            escape_html(&header.content.to_plain_text())
        ));
        previous = level;
    }

    for _ in 0..depth {
        lines.push("</ul></li>".to_string());
    }
    lines.push("</ul>".to_string());
    lines.join("\n")
}

/// Inline content; consecutive text runs are separate source lines and are
/// joined with a newline.
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
        Inline::Text(text) => escape_html(&text.content),
        Inline::Bold(bold) => format!("<strong>{}</strong>", render_inline(&bold.content)),
        Inline::Italic(italic) => format!("<em>{}</em>", render_inline(&italic.content)),
        Inline::Code(code) => format!("<code>{}</code>", escape_html(&code.content)),
        Inline::Link(link) => format!(
            "<a href=\"{}\">{}</a>",
            escape_html(&link.url),
            escape_html(&link.caption)
        ),
        Inline::Image(image) => format!(
            "<img src=\"{}\" alt=\"{}\">",
            escape_html(&image.url),
            escape_html(&image.caption)
        ),
    }
}
