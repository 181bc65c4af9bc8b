//! `markin-parse`: parser for the Markin markup language.
//!
//! Markin is a small Markdown-like language: headers, emphasis, lists, block
//! quotes, fenced code, links, images, horizontal rules and a `%TOC`
//! placeholder. This crate turns Markin source into a typed [`Document`] tree
//! and renders that tree back to Markin, to HTML, to a debug trace, to JSON
//! and (with the `terminal` feature) to ANSI-styled text.
//!
//! # Quick start
//!
//! ```
//! let doc = markin_parse::parse("# Hello\n\nSome *bold* text.").unwrap();
//! assert_eq!(doc.blocks.len(), 2);
//! assert!(doc.to_html().starts_with("<h1 id=\"hello\">Hello</h1>"));
//! ```

pub mod error;
pub mod parse;
pub mod render_debug;
pub mod render_html;
pub mod render_markin;
#[cfg(feature = "terminal")]
pub mod render_term;
pub mod scanner;
pub mod text;
pub mod types;
pub mod wire;

pub use error::*;
pub use parse::{
    DEFAULT_MAX_NESTING_DEPTH, ParseMode, ParseOptions, ParseTrace, Parser, TraceEvent, TraceLog,
    parse, parse_with_mode,
};
pub use types::*;

pub use render_html::PageConfig;

impl Document {
    /// Render this document as strict-mode Markin.
    pub fn to_markin(&self) -> String {
        render_markin::to_markin(self)
    }

    /// Render this document as Markin using the delimiters of `mode`.
    pub fn to_markin_with(&self, mode: ParseMode) -> String {
        render_markin::to_markin_with(self, mode)
    }

    /// Render the indented structural dump used in tests and diagnostics.
    pub fn to_debug_string(&self) -> String {
        render_debug::to_debug_string(self)
    }

    /// Render this document as an HTML fragment.
    pub fn to_html(&self) -> String {
        render_html::to_html(self)
    }

    /// Render this document as a complete HTML page.
    pub fn to_html_page(&self, config: &PageConfig) -> String {
        render_html::to_html_page(self, config)
    }

    /// Render this document as ANSI-colored terminal text.
    #[cfg(feature = "terminal")]
    pub fn to_terminal(&self) -> String {
        render_term::to_terminal(self)
    }
}
