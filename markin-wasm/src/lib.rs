//! WASM bindings for `markin-parse`.
//!
//! Exposes the Markin parser to JavaScript via wasm-bindgen.
//! Call `parse()` with a string to get the JSON wire form, or use
//! `render_html()` / `render_markin()` for rendered output.

use markin_parse::{Document, ParseError, ParseMode, Parser};
use wasm_bindgen::prelude::*;

fn mode(markdown: bool) -> ParseMode {
    if markdown {
        ParseMode::Markdown
    } else {
        ParseMode::Strict
    }
}

fn error_json(err: &ParseError) -> serde_json::Value {
    let location = err.location();
    serde_json::json!({
        "message": err.to_string(),
        "line": location.line,
        "column": location.column,
        "offset": location.offset,
    })
}

fn parse_document(input: &str, markdown: bool) -> Result<Document, ParseError> {
    Parser::with_mode(mode(markdown)).parse(input)
}

/// Parse a Markin string and return the result as JSON.
///
/// Returns `{ document }` on success, where `document` is the tagged wire
/// form, or `{ error: { message, line, column, offset } }` on failure.
#[wasm_bindgen]
pub fn parse(input: &str, markdown: bool) -> String {
    match parse_document(input, markdown) {
        Ok(doc) => serde_json::json!({ "document": doc }).to_string(),
        Err(err) => serde_json::json!({ "error": error_json(&err) }).to_string(),
    }
}

/// Parse a Markin string and return the wire form as a JavaScript object.
///
/// Throws the error message on a parse failure.
#[wasm_bindgen(js_name = parseToObject)]
pub fn parse_to_object(input: &str, markdown: bool) -> Result<JsValue, JsValue> {
    let doc = parse_document(input, markdown).map_err(|err| JsValue::from_str(&err.to_string()))?;
    serde_wasm_bindgen::to_value(&doc).map_err(JsValue::from)
}

/// Parse a Markin string and return an HTML fragment.
///
/// A parse failure renders as an HTML-escaped `<pre class="markin-error">`.
#[wasm_bindgen]
pub fn render_html(input: &str, markdown: bool) -> String {
    match parse_document(input, markdown) {
        Ok(doc) => doc.to_html(),
        Err(err) => format!(
            "<pre class=\"markin-error\">{}</pre>",
            markin_parse::render_html::escape_html(&err.to_string())
        ),
    }
}

/// Parse a Markin string and return a complete styled HTML page.
#[wasm_bindgen]
pub fn render_html_page(input: &str, markdown: bool, title: Option<String>) -> Result<String, JsValue> {
    let doc = parse_document(input, markdown).map_err(|err| JsValue::from_str(&err.to_string()))?;
    let config = markin_parse::PageConfig {
        title,
        ..Default::default()
    };
    Ok(doc.to_html_page(&config))
}

/// Parse a Markin string and render it back as canonical strict Markin.
#[wasm_bindgen]
pub fn render_markin(input: &str, markdown: bool) -> Result<String, JsValue> {
    parse_document(input, markdown)
        .map(|doc| doc.to_markin())
        .map_err(|err| JsValue::from_str(&err.to_string()))
}

/// Parse a Markin string and return the indented structural dump.
#[wasm_bindgen]
pub fn render_debug(input: &str, markdown: bool) -> Result<String, JsValue> {
    parse_document(input, markdown)
        .map(|doc| doc.to_debug_string())
        .map_err(|err| JsValue::from_str(&err.to_string()))
}
