//! Recursive-descent parser.
//!
//! Block productions are tried in a fixed priority order (table of contents,
//! header, code block, block quote, list, horizontal rule, paragraph) and the
//! first one that matches wins. Inline productions work the same way inside
//! paragraphs (bold, italic, image, link, code, text). A production that does
//! not match restores the scanner position so the next alternative starts
//! from the same place.
//!
//! Inline failures are soft: an opening `*` with no closer simply makes the
//! bold production decline. The parser remembers the farthest such failure,
//! and if no alternative ends up accepting the input the whole parse fails
//! with that recorded cause.

use serde::{Deserialize, Serialize};

use crate::error::{Location, ParseError};
use crate::scanner::Scanner;
use crate::types::{
    Block, BlockQuote, Bold, Code, CodeBlock, Document, Header, HorizontalRule, Image, Inline,
    Italic, Link, List, ListEntry, Paragraph, TableOfContents, Text,
};

/// Which emphasis delimiters the grammar accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseMode {
    /// Markin-native: `*bold*`, `_italic_`.
    #[default]
    Strict,
    /// Also accepts Markdown's `**bold**`/`__bold__` and `*italic*`/`_italic_`.
    Markdown,
}

impl ParseMode {
    fn bold_delimiters(self) -> &'static [&'static str] {
        match self {
            ParseMode::Strict => &["*"],
            ParseMode::Markdown => &["**", "__"],
        }
    }

    fn italic_delimiters(self) -> &'static [&'static str] {
        match self {
            ParseMode::Strict => &["_"],
            ParseMode::Markdown => &["*", "_"],
        }
    }
}

/// Default bound on list nesting.
pub const DEFAULT_MAX_NESTING_DEPTH: usize = 32;

/// Settings fixed for the lifetime of one parse call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseOptions {
    pub mode: ParseMode,
    /// Deepest list nesting accepted before failing with
    /// [`ParseError::NestingTooDeep`].
    pub max_nesting_depth: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            mode: ParseMode::Strict,
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
        }
    }
}

/// Receives an event each time the parser tries a production.
pub trait ParseTrace {
    /// `offset` is the byte position the production starts at and
    /// `lookahead` the next few characters of input.
    fn enter(&mut self, production: &'static str, offset: usize, lookahead: &str);
}

/// One recorded production attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceEvent {
    pub production: &'static str,
    pub offset: usize,
    pub lookahead: String,
}

/// A [`ParseTrace`] that keeps every event in memory.
#[derive(Debug, Default)]
pub struct TraceLog {
    pub events: Vec<TraceEvent>,
}

impl TraceLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of the productions tried, in order.
    pub fn productions(&self) -> Vec<&'static str> {
        self.events.iter().map(|event| event.production).collect()
    }
}

impl ParseTrace for TraceLog {
    fn enter(&mut self, production: &'static str, offset: usize, lookahead: &str) {
        self.events.push(TraceEvent {
            production,
            offset,
            lookahead: lookahead.to_string(),
        });
    }
}

/// Parses Markin text into a [`Document`].
///
/// A `Parser` only holds options, so one instance can be shared and reused;
/// each call scans its own copy of the input.
#[derive(Debug, Clone, Copy, Default)]
pub struct Parser {
    options: ParseOptions,
}

impl Parser {
    pub fn new(options: ParseOptions) -> Self {
        Parser { options }
    }

    /// A parser with default options in the given mode.
    pub fn with_mode(mode: ParseMode) -> Self {
        Parser::new(ParseOptions {
            mode,
            ..ParseOptions::default()
        })
    }

    pub fn options(&self) -> ParseOptions {
        self.options
    }

    pub fn parse(&self, input: &str) -> Result<Document, ParseError> {
        self.run(input, None)
    }

    /// Parse while reporting every production attempt to `trace`.
    pub fn parse_traced(
        &self,
        input: &str,
        trace: &mut dyn ParseTrace,
    ) -> Result<Document, ParseError> {
        self.run(input, Some(trace))
    }

    fn run(&self, input: &str, trace: Option<&mut dyn ParseTrace>) -> Result<Document, ParseError> {
        // Locations refer to the LF-normalized text. A final newline
        // guarantees the last line is terminated.
        let text = format!("{}\n", input.replace("\r\n", "\n"));
        let mut engine = Engine {
            scanner: Scanner::new(&text),
            options: self.options,
            trace,
            failure: None,
        };
        engine.parse_document()
    }
}

/// Parse `input` in strict mode with default options.
pub fn parse(input: &str) -> Result<Document, ParseError> {
    Parser::default().parse(input)
}

/// Parse `input` in the given mode with default options.
pub fn parse_with_mode(input: &str, mode: ParseMode) -> Result<Document, ParseError> {
    Parser::with_mode(mode).parse(input)
}

// ------------------------------------------------------------------
// Engine
// ------------------------------------------------------------------

const LOOKAHEAD_CHARS: usize = 20;

const HEADER_PREFIXES: [(&str, u8); 6] = [
    ("###### ", 6),
    ("##### ", 5),
    ("#### ", 4),
    ("### ", 3),
    ("## ", 2),
    ("# ", 1),
];

const DIGITS: &str = "0123456789";

#[derive(Debug, Clone, Copy)]
enum FailureKind {
    Unterminated(&'static str),
    Malformed,
}

#[derive(Debug, Clone, Copy)]
struct Failure {
    offset: usize,
    kind: FailureKind,
}

/// State of a single parse call.
struct Engine<'a, 't> {
    scanner: Scanner<'a>,
    options: ParseOptions,
    trace: Option<&'t mut dyn ParseTrace>,
    failure: Option<Failure>,
}

impl<'a> Engine<'a, '_> {
    fn enter(&mut self, production: &'static str) {
        if let Some(trace) = self.trace.as_mut() {
            trace.enter(
                production,
                self.scanner.position(),
                self.scanner.peek_ahead(LOOKAHEAD_CHARS),
            );
        }
    }

    /// Run `f`, restoring the scanner position if it declines.
    fn attempt<T>(&mut self, f: impl FnOnce(&mut Self) -> Option<T>) -> Option<T> {
        let mark = self.scanner.mark();
        let result = f(self);
        if result.is_none() {
            self.scanner.reset(mark);
        }
        result
    }

    /// As [`Engine::attempt`] for productions that can also fail hard.
    fn try_attempt<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<Option<T>, ParseError>,
    ) -> Result<Option<T>, ParseError> {
        let mark = self.scanner.mark();
        let result = f(self)?;
        if result.is_none() {
            self.scanner.reset(mark);
        }
        Ok(result)
    }

    /// Remember a failure unless one further into the input is already known.
    fn record(&mut self, offset: usize, kind: FailureKind) {
        if self.failure.is_none_or(|known| offset > known.offset) {
            self.failure = Some(Failure { offset, kind });
        }
    }

    fn location(&self, offset: usize) -> Location {
        Location::from_offset(self.scanner.source(), offset)
    }

    fn block_error(&self, block_start: usize) -> ParseError {
        match self.failure {
            Some(Failure { offset, kind }) if offset >= block_start => {
                let location = self.location(offset);
                match kind {
                    FailureKind::Unterminated(delimiter) => {
                        ParseError::UnterminatedInlineDelimiter {
                            delimiter: delimiter.to_string(),
                            location,
                        }
                    }
                    FailureKind::Malformed => ParseError::MalformedParagraph { location },
                }
            }
            _ => ParseError::UnparsableBlock {
                location: self.location(block_start),
            },
        }
    }

    // --------------------------------------------------------------
    // Blocks
    // --------------------------------------------------------------

    fn parse_document(&mut self) -> Result<Document, ParseError> {
        self.enter("document");
        let mut blocks = Vec::new();

        loop {
            if self.scanner.consume_blank_line_remainder() {
                continue;
            }
            let block_start = self.scanner.position();
            self.failure = None;
            if let Some(block) = self.parse_block()? {
                blocks.push(block);
            } else if self.scanner.is_at_end() {
                break;
            } else {
                return Err(self.block_error(block_start));
            }
        }

        Ok(Document::new(blocks))
    }

    fn parse_block(&mut self) -> Result<Option<Block>, ParseError> {
        self.enter("block");

        if let Some(toc) = self.parse_table_of_contents() {
            return Ok(Some(Block::TableOfContents(toc)));
        }
        if let Some(header) = self.parse_header() {
            return Ok(Some(Block::Header(header)));
        }
        if let Some(code_block) = self.parse_code_block() {
            return Ok(Some(Block::CodeBlock(code_block)));
        }
        if let Some(quote) = self.parse_block_quote() {
            return Ok(Some(Block::BlockQuote(quote)));
        }
        if let Some(list) = self.parse_list(None, 0)? {
            return Ok(Some(Block::List(list)));
        }
        if let Some(rule) = self.parse_horizontal_rule() {
            return Ok(Some(Block::HorizontalRule(rule)));
        }
        Ok(self.parse_paragraph(None).map(Block::Paragraph))
    }

    /// `%TOC` alone on its line.
    fn parse_table_of_contents(&mut self) -> Option<TableOfContents> {
        self.enter("table_of_contents");
        self.attempt(|p| {
            (p.scanner.consume_literal("%TOC") && p.scanner.consume_blank_line_remainder())
                .then(TableOfContents::new)
        })
    }

    fn parse_header(&mut self) -> Option<Header> {
        self.enter("header");
        self.attempt(|p| {
            let level = HEADER_PREFIXES
                .iter()
                .find(|(prefix, _)| p.scanner.consume_literal(prefix))
                .map(|&(_, level)| level)?;
            let content = p.parse_paragraph(None)?;
            Some(Header::new(level, content))
        })
    }

    fn parse_code_block(&mut self) -> Option<CodeBlock> {
        self.enter("code_block");
        self.attempt(|p| {
            let scanner = &mut p.scanner;
            if !scanner.consume_literal("```") {
                return None;
            }
            let language = scanner.consume_rest_of_line();
            if !scanner.consume_newline() {
                return None;
            }
            let content = if scanner.consume_literal("```") {
                ""
            } else {
                scanner.consume_until_and_skip("\n```")?
            };
            // Anything after the closing fence on its line is ignored.
            scanner.skip_through_newline();
            Some(CodeBlock::new(Some(language), content))
        })
    }

    fn parse_block_quote(&mut self) -> Option<BlockQuote> {
        self.enter("block_quote");
        self.attempt(|p| {
            if !p.scanner.consume_literal(">") {
                return None;
            }
            p.scanner.consume_horizontal_whitespace();

            let mut content = vec![p.parse_paragraph(Some(">"))?];
            while let Some(paragraph) = p.attempt(|p| {
                if !p.scan_quote_separator() {
                    return None;
                }
                p.parse_paragraph(Some(">"))
            }) {
                content.push(paragraph);
            }
            Some(BlockQuote::new(content))
        })
    }

    /// After a quote paragraph, consume the blank separator line and the
    /// `>` of the next non-blank quote line. Empty `>` lines may repeat. A
    /// second blank line without `>` ends the quote.
    fn scan_quote_separator(&mut self) -> bool {
        self.scanner
            .attempt(|s| {
                if !s.consume_blank_line_remainder() {
                    return None;
                }
                loop {
                    if !s.consume_literal(">") {
                        return None;
                    }
                    s.consume_horizontal_whitespace();
                    if !s.consume_blank_line_remainder() {
                        return Some(());
                    }
                }
            })
            .is_some()
    }

    /// Parse a list whose entries sit at `level` (the first line's level
    /// when `None`). Deeper lines become nested list entries; a shallower
    /// line ends this list.
    fn parse_list(&mut self, level: Option<usize>, depth: usize) -> Result<Option<List>, ParseError> {
        self.enter("list");
        if depth > self.options.max_nesting_depth {
            return Err(ParseError::NestingTooDeep {
                max_depth: self.options.max_nesting_depth,
                location: self.location(self.scanner.position()),
            });
        }

        self.try_attempt(|p| {
            let mut ordered = None;
            let mut entries = Vec::new();
            let mut current = level;

            loop {
                let line_start = p.scanner.mark();
                let Some((line_level, line_ordered)) = p.scan_list_marker() else {
                    return Ok(None);
                };
                p.scanner.reset(line_start);

                match current {
                    Some(current) if line_level < current => break,
                    Some(current) if line_level > current => {
                        let Some(nested) = p.parse_list(Some(line_level), depth + 1)? else {
                            return Ok(None);
                        };
                        // Sublists that meet without an entry between them
                        // are one sublist.
                        if let Some(ListEntry::List(previous)) = entries.last_mut() {
                            previous.entries.extend(nested.entries);
                        } else {
                            entries.push(ListEntry::List(nested));
                        }
                    }
                    _ => {
                        let Some(entry) = p.parse_list_entry() else {
                            return Ok(None);
                        };
                        ordered.get_or_insert(line_ordered);
                        entries.push(ListEntry::Paragraph(entry));
                        current = Some(line_level);
                    }
                }

                if p.scanner.at_blank_line() || p.scanner.is_at_end() {
                    break;
                }
            }

            Ok((!entries.is_empty()).then(|| List::new(ordered.unwrap_or(false), entries)))
        })
    }

    /// Leading indentation and a `- ` or `N. ` marker. Returns the nesting
    /// level (two columns per level, a tab counting as two) and whether the
    /// marker is ordered.
    fn scan_list_marker(&mut self) -> Option<(usize, bool)> {
        self.scanner.attempt(|s| {
            let width: usize = s
                .consume_horizontal_whitespace()
                .map_or(0, |ws| ws.chars().map(|c| if c == '\t' { 2 } else { 1 }).sum());
            let level = width / 2;
            if s.consume_literal("- ") {
                Some((level, false))
            } else if s.consume_while(DIGITS).is_some() && s.consume_literal(". ") {
                Some((level, true))
            } else {
                None
            }
        })
    }

    /// One list entry: the marker line plus any continuation lines, up to a
    /// line starting another marker, a blank line, or the end of input.
    fn parse_list_entry(&mut self) -> Option<Paragraph> {
        self.enter("list_entry");
        self.attempt(|p| {
            p.scan_list_marker()?;

            let mut content = Vec::new();
            let mut same_line = true;
            loop {
                if let Some(inline) = p.parse_inline() {
                    push_inline(&mut content, inline, same_line);
                    same_line = true;
                } else if p.scanner.consume_newline() {
                    same_line = false;
                    let line_start = p.scanner.mark();
                    if p.scan_list_marker().is_some() {
                        p.scanner.reset(line_start);
                        break;
                    }
                    p.scanner.consume_horizontal_whitespace();
                    if p.scanner.at_blank_line() || p.scanner.is_at_end() {
                        break;
                    }
                } else if p.scanner.is_at_end() {
                    break;
                } else {
                    p.record(p.scanner.position(), FailureKind::Malformed);
                    return None;
                }
            }

            (!content.is_empty()).then(|| Paragraph::new(content))
        })
    }

    fn parse_horizontal_rule(&mut self) -> Option<HorizontalRule> {
        self.enter("horizontal_rule");
        self.attempt(|p| {
            (p.scanner.consume_rest_of_line() == "---" && p.scanner.consume_newline())
                .then(HorizontalRule::new)
        })
    }

    /// Inline content up to a blank line or the end of input.
    ///
    /// With a `line_prefix` (block quotes) every continuation line must start
    /// with the prefix; a line without it ends the paragraph only if blank.
    fn parse_paragraph(&mut self, line_prefix: Option<&str>) -> Option<Paragraph> {
        self.enter("paragraph");
        self.attempt(|p| {
            let mut content = Vec::new();
            let mut same_line = true;
            loop {
                if let Some(inline) = p.parse_inline() {
                    push_inline(&mut content, inline, same_line);
                    same_line = true;
                } else if p.scanner.consume_newline() {
                    same_line = false;
                    if let Some(prefix) = line_prefix {
                        if p.scanner.consume_literal(prefix) {
                            p.scanner.consume_horizontal_whitespace();
                        } else if !(p.scanner.at_blank_line() || p.scanner.is_at_end()) {
                            return None;
                        }
                    }
                    if p.scanner.at_blank_line() {
                        break;
                    }
                } else if p.scanner.is_at_end() {
                    break;
                } else {
                    p.record(p.scanner.position(), FailureKind::Malformed);
                    return None;
                }
            }
            (!content.is_empty()).then(|| Paragraph::new(content))
        })
    }

    // --------------------------------------------------------------
    // Inlines
    // --------------------------------------------------------------

    fn parse_inline(&mut self) -> Option<Inline> {
        if let Some(bold) = self.parse_bold() {
            return Some(Inline::Bold(bold));
        }
        if let Some(italic) = self.parse_italic() {
            return Some(Inline::Italic(italic));
        }
        if let Some(image) = self.parse_image() {
            return Some(Inline::Image(image));
        }
        if let Some(link) = self.parse_link() {
            return Some(Inline::Link(link));
        }
        if let Some(code) = self.parse_code() {
            return Some(Inline::Code(code));
        }
        self.parse_text().map(Inline::Text)
    }

    fn parse_bold(&mut self) -> Option<Bold> {
        self.enter("bold");
        let delimiters = self.options.mode.bold_delimiters();
        self.parse_delimited(delimiters).map(|text| Bold::new(Inline::Text(text)))
    }

    fn parse_italic(&mut self) -> Option<Italic> {
        self.enter("italic");
        let delimiters = self.options.mode.italic_delimiters();
        self.parse_delimited(delimiters).map(|text| Italic::new(Inline::Text(text)))
    }

    /// A text run between an opening delimiter from `delimiters` and the same
    /// delimiter closing it. Emphasis content is a single run, never nested.
    fn parse_delimited(&mut self, delimiters: &[&'static str]) -> Option<Text> {
        let start = self.scanner.position();
        self.attempt(|p| {
            let open = p.scanner.consume_any_literal(delimiters)?;
            if let Some(text) = p.parse_text() {
                if p.scanner.consume_literal(open) {
                    return Some(text);
                }
            }
            p.record(start, FailureKind::Unterminated(open));
            None
        })
    }

    fn parse_image(&mut self) -> Option<Image> {
        self.enter("image");
        self.attempt(|p| {
            if !p.scanner.consume_literal("![") {
                return None;
            }
            let (caption, url) = p.parse_link_target()?;
            Some(Image::new(caption, url))
        })
    }

    fn parse_link(&mut self) -> Option<Link> {
        self.enter("link");
        self.attempt(|p| {
            if !p.scanner.consume_literal("[") {
                return None;
            }
            let (caption, url) = p.parse_link_target()?;
            Some(Link::new(caption, url))
        })
    }

    /// `caption](url)`, both parts non-empty and confined to one line.
    fn parse_link_target(&mut self) -> Option<(&'a str, &'a str)> {
        let caption = self.scanner.consume_until_any("]\n")?;
        if !self.scanner.consume_literal("](") {
            return None;
        }
        let url = self.scanner.consume_until_any(")\n")?;
        self.scanner.consume_literal(")").then_some((caption, url))
    }

    fn parse_code(&mut self) -> Option<Code> {
        self.enter("code");
        let start = self.scanner.position();
        self.attempt(|p| {
            if !p.scanner.consume_literal("`") {
                return None;
            }
            if let Some(content) = p.scanner.consume_until_any("`\n") {
                if p.scanner.consume_literal("`") {
                    return Some(Code::new(content));
                }
            }
            p.record(start, FailureKind::Unterminated("`"));
            None
        })
    }

    fn parse_text(&mut self) -> Option<Text> {
        self.enter("text");
        self.scanner.scan_inline_text().map(Text::new)
    }
}

/// Append `inline`, merging it into a preceding text run on the same line.
///
/// Two consecutive `Text` elements in a paragraph always mean a line break in
/// the source. A line break next to any other inline is kept as a `\n`
/// inside the neighbouring text run, or as a `Text("\n")` of its own between
/// two non-text inlines.
fn push_inline(content: &mut Vec<Inline>, inline: Inline, same_line: bool) {
    let after_text = match content.last() {
        None => {
            content.push(inline);
            return;
        }
        Some(last) => matches!(last, Inline::Text(_)),
    };

    match inline {
        Inline::Text(mut next) => {
            if same_line && after_text {
                if let Some(Inline::Text(last)) = content.last_mut() {
                    last.content.push_str(&next.content);
                    return;
                }
            } else if !same_line && !after_text {
                next.content.insert(0, '\n');
            }
            content.push(Inline::Text(next));
        }
        other => {
            if !same_line {
                match content.last_mut() {
                    Some(Inline::Text(last)) => last.content.push('\n'),
                    _ => content.push(Inline::text("\n")),
                }
            }
            content.push(other);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render_debug::to_debug_string;
    use pretty_assertions::assert_eq;

    fn debug(input: &str) -> String {
        to_debug_string(&parse(input).expect("input should parse"))
    }

    fn debug_markdown(input: &str) -> String {
        to_debug_string(&parse_with_mode(input, ParseMode::Markdown).expect("input should parse"))
    }

    #[test]
    fn empty_input_has_no_blocks() {
        assert!(parse("").unwrap().blocks.is_empty());
        assert!(parse("\n\n   \n\t\n").unwrap().blocks.is_empty());
    }

    #[test]
    fn header_levels() {
        for level in 1..=6u8 {
            let input = format!("{} Title", "#".repeat(level as usize));
            let doc = parse(&input).unwrap();
            match &doc.blocks[..] {
                [Block::Header(header)] => assert_eq!(header.level(), level),
                other => panic!("Expected a single header, got {other:?}"),
            }
        }
    }

    #[test]
    fn seven_hashes_is_not_a_header() {
        let doc = parse("####### Too deep").unwrap();
        match &doc.blocks[..] {
            [Block::Paragraph(paragraph)] => {
                assert_eq!(paragraph.to_plain_text(), "####### Too deep");
            }
            other => panic!("Expected a paragraph, got {other:?}"),
        }
    }

    #[test]
    fn header_without_space_is_paragraph() {
        let doc = parse("#hashtag").unwrap();
        assert!(matches!(&doc.blocks[..], [Block::Paragraph(_)]));
    }

    #[test]
    fn header_with_inline_content() {
        assert_eq!(
            debug("## A _fine_ day"),
            concat!(
                "BLOCKS(\n",
                "  HEADER(level: 2,\n",
                "    PARAGRAPH(\n",
                "      TEXT(\"A \")\n",
                "      ITALIC(\n",
                "        TEXT(\"fine\")\n",
                "      )\n",
                "      TEXT(\" day\")\n",
                "    )\n",
                "  )\n",
                ")\n",
            )
        );
    }

    #[test]
    fn paragraph_lines_become_separate_text_runs() {
        assert_eq!(
            debug("first line\nsecond line\n\nnext paragraph"),
            concat!(
                "BLOCKS(\n",
                "  PARAGRAPH(\n",
                "    TEXT(\"first line\")\n",
                "    TEXT(\"second line\")\n",
                "  )\n",
                "  PARAGRAPH(\n",
                "    TEXT(\"next paragraph\")\n",
                "  )\n",
                ")\n",
            )
        );
    }

    #[test]
    fn text_runs_on_one_line_are_merged() {
        assert_eq!(
            debug("Hello! [not a link] done"),
            concat!(
                "BLOCKS(\n",
                "  PARAGRAPH(\n",
                "    TEXT(\"Hello! [not a link] done\")\n",
                "  )\n",
                ")\n",
            )
        );
    }

    #[test]
    fn strict_mode_single_star_is_bold() {
        assert_eq!(
            debug("This is *bold*."),
            concat!(
                "BLOCKS(\n",
                "  PARAGRAPH(\n",
                "    TEXT(\"This is \")\n",
                "    BOLD(\n",
                "      TEXT(\"bold\")\n",
                "    )\n",
                "    TEXT(\".\")\n",
                "  )\n",
                ")\n",
            )
        );
    }

    #[test]
    fn markdown_mode_single_star_is_italic() {
        assert_eq!(
            debug_markdown("This is *bold*."),
            concat!(
                "BLOCKS(\n",
                "  PARAGRAPH(\n",
                "    TEXT(\"This is \")\n",
                "    ITALIC(\n",
                "      TEXT(\"bold\")\n",
                "    )\n",
                "    TEXT(\".\")\n",
                "  )\n",
                ")\n",
            )
        );
    }

    #[test]
    fn markdown_mode_double_delimiters_are_bold() {
        let doc = parse_with_mode("**stars** and __unders__", ParseMode::Markdown).unwrap();
        let Block::Paragraph(paragraph) = &doc.blocks[0] else {
            panic!("Expected paragraph");
        };
        let kinds: Vec<_> = paragraph.content.iter().map(Inline::element_type).collect();
        assert_eq!(
            kinds,
            vec![
                crate::types::ElementType::Bold,
                crate::types::ElementType::Text,
                crate::types::ElementType::Bold,
            ]
        );
    }

    #[test]
    fn markdown_mode_requires_matching_closer() {
        let err = parse_with_mode("**mixed__", ParseMode::Markdown).unwrap_err();
        assert!(
            matches!(err, ParseError::UnterminatedInlineDelimiter { ref delimiter, .. } if delimiter == "**"),
            "got {err:?}"
        );
    }

    #[test]
    fn strict_mode_double_star_is_an_error() {
        let err = parse("**not bold**").unwrap_err();
        assert!(matches!(err, ParseError::UnterminatedInlineDelimiter { .. }), "got {err:?}");
    }

    #[test]
    fn inline_code_link_and_image() {
        assert_eq!(
            debug("Run `cargo *test*` or see [docs](https://x.io/a_b) ![logo](logo.png)"),
            concat!(
                "BLOCKS(\n",
                "  PARAGRAPH(\n",
                "    TEXT(\"Run \")\n",
                "    CODE(\"cargo *test*\")\n",
                "    TEXT(\" or see \")\n",
                "    LINK(url: \"https://x.io/a_b\", caption: \"docs\")\n",
                "    TEXT(\" \")\n",
                "    IMAGE(url: \"logo.png\", caption: \"logo\")\n",
                "  )\n",
                ")\n",
            )
        );
    }

    #[test]
    fn empty_link_caption_falls_back_to_text() {
        assert_eq!(
            debug("[](nowhere)"),
            concat!(
                "BLOCKS(\n",
                "  PARAGRAPH(\n",
                "    TEXT(\"[](nowhere)\")\n",
                "  )\n",
                ")\n",
            )
        );
    }

    #[test]
    fn escapes_decode_to_bare_characters() {
        assert_eq!(
            debug(r"2 \* 3 \_ \` \\ \# \!"),
            concat!(
                "BLOCKS(\n",
                "  PARAGRAPH(\n",
                "    TEXT(\"2 * 3 _ ` \\\\ # !\")\n",
                "  )\n",
                ")\n",
            )
        );
    }

    #[test]
    fn code_block_is_verbatim() {
        let doc = parse("```rust  \nlet *a* = _b_ + `c`;\n\n# not a header\n```").unwrap();
        match &doc.blocks[..] {
            [Block::CodeBlock(code)] => {
                assert_eq!(code.language(), Some("rust"));
                assert_eq!(code.content, "let *a* = _b_ + `c`;\n\n# not a header");
            }
            other => panic!("Expected a code block, got {other:?}"),
        }
    }

    #[test]
    fn code_block_without_language() {
        let doc = parse("```   \nplain\n```\n").unwrap();
        let Block::CodeBlock(code) = &doc.blocks[0] else {
            panic!("Expected code block");
        };
        assert_eq!(code.language(), None);
        assert_eq!(code.content, "plain");
    }

    #[test]
    fn code_block_tolerates_trailing_text_after_fence() {
        let doc = parse("```\na\n```` trailing\nafter").unwrap();
        assert_eq!(doc.blocks.len(), 2);
        assert!(matches!(&doc.blocks[1], Block::Paragraph(_)));
    }

    #[test]
    fn empty_code_block() {
        let doc = parse("```\n```").unwrap();
        let Block::CodeBlock(code) = &doc.blocks[0] else {
            panic!("Expected code block");
        };
        assert_eq!(code.content, "");

        let doc = parse("```\n\n```").unwrap();
        let Block::CodeBlock(code) = &doc.blocks[0] else {
            panic!("Expected code block");
        };
        assert_eq!(code.content, "");
    }

    #[test]
    fn unclosed_code_block_is_an_error() {
        let err = parse("```\nnever closed").unwrap_err();
        assert!(matches!(err, ParseError::UnterminatedInlineDelimiter { ref delimiter, .. } if delimiter == "`"));
    }

    #[test]
    fn table_of_contents_marker() {
        let doc = parse("%TOC  \n\n# One").unwrap();
        assert!(matches!(doc.blocks[0], Block::TableOfContents(_)));
        assert!(matches!(doc.blocks[1], Block::Header(_)));
    }

    #[test]
    fn table_of_contents_with_trailing_text_is_paragraph() {
        let doc = parse("%TOC please").unwrap();
        match &doc.blocks[..] {
            [Block::Paragraph(paragraph)] => assert_eq!(paragraph.to_plain_text(), "%TOC please"),
            other => panic!("Expected a paragraph, got {other:?}"),
        }
    }

    #[test]
    fn horizontal_rule_exact_line() {
        let doc = parse("above\n\n---\n\nbelow").unwrap();
        assert_eq!(doc.blocks.len(), 3);
        assert!(matches!(doc.blocks[1], Block::HorizontalRule(_)));

        let doc = parse("----").unwrap();
        assert!(matches!(doc.blocks[0], Block::Paragraph(_)));
    }

    #[test]
    fn block_quote_paragraphs() {
        assert_eq!(
            debug("> First line\n> second line\n>\n> Third\n\nAfter"),
            concat!(
                "BLOCKS(\n",
                "  BLOCKQUOTE(\n",
                "    PARAGRAPH(\n",
                "      TEXT(\"First line\")\n",
                "      TEXT(\"second line\")\n",
                "    )\n",
                "    PARAGRAPH(\n",
                "      TEXT(\"Third\")\n",
                "    )\n",
                "  )\n",
                "  PARAGRAPH(\n",
                "    TEXT(\"After\")\n",
                "  )\n",
                ")\n",
            )
        );
    }

    #[test]
    fn block_quote_at_end_of_input() {
        let doc = parse("> last words").unwrap();
        assert!(matches!(&doc.blocks[..], [Block::BlockQuote(quote)] if quote.content.len() == 1));
    }

    #[test]
    fn block_quote_lazy_line_falls_back_to_paragraph() {
        let doc = parse("> quoted\nnot quoted").unwrap();
        assert!(matches!(&doc.blocks[..], [Block::Paragraph(_)]));
    }

    #[test]
    fn blank_line_between_quote_paragraphs_needs_a_marker_after_it() {
        let two_paragraphs = concat!(
            "BLOCKS(\n",
            "  BLOCKQUOTE(\n",
            "    PARAGRAPH(\n",
            "      TEXT(\"a\")\n",
            "    )\n",
            "    PARAGRAPH(\n",
            "      TEXT(\"b\")\n",
            "    )\n",
            "  )\n",
            ")\n",
        );
        assert_eq!(debug("> a\n>\n> b"), two_paragraphs);
        assert_eq!(debug("> a\n\n> b"), two_paragraphs);
        assert_eq!(debug("> a\n \n> b"), two_paragraphs);
        assert_eq!(debug("> a\n>\n>\n> b"), two_paragraphs);

        let doc = parse("> a\n\n\n> b").unwrap();
        assert_eq!(doc.blocks.len(), 2);
        assert!(doc.blocks.iter().all(|block| matches!(block, Block::BlockQuote(_))));
    }

    #[test]
    fn whitespace_line_after_quote_is_not_quoted() {
        assert_eq!(
            debug(">%\n "),
            concat!(
                "BLOCKS(\n",
                "  BLOCKQUOTE(\n",
                "    PARAGRAPH(\n",
                "      TEXT(\"%\")\n",
                "    )\n",
                "  )\n",
                ")\n",
            )
        );
    }

    #[test]
    fn broken_later_quote_paragraph_is_not_swallowed() {
        let err = parse("> a\n\n> *b").unwrap_err();
        match err {
            ParseError::UnterminatedInlineDelimiter { location, .. } => assert_eq!(location.line, 3),
            other => panic!("Expected UnterminatedInlineDelimiter, got {other:?}"),
        }
    }

    #[test]
    fn quote_marker_can_be_escaped() {
        assert_eq!(
            debug("\\> not quoted"),
            concat!(
                "BLOCKS(\n",
                "  PARAGRAPH(\n",
                "    TEXT(\"> not quoted\")\n",
                "  )\n",
                ")\n",
            )
        );
    }

    #[test]
    fn line_break_after_inline_is_kept_in_next_text() {
        assert_eq!(
            debug("see *this*\nand that"),
            concat!(
                "BLOCKS(\n",
                "  PARAGRAPH(\n",
                "    TEXT(\"see \")\n",
                "    BOLD(\n",
                "      TEXT(\"this\")\n",
                "    )\n",
                "    TEXT(\"\\nand that\")\n",
                "  )\n",
                ")\n",
            )
        );
    }

    #[test]
    fn line_break_before_inline_is_kept_in_previous_text() {
        assert_eq!(
            debug("> quoted\n*emphasis*"),
            concat!(
                "BLOCKS(\n",
                "  PARAGRAPH(\n",
                "    TEXT(\"> quoted\\n\")\n",
                "    BOLD(\n",
                "      TEXT(\"emphasis\")\n",
                "    )\n",
                "  )\n",
                ")\n",
            )
        );
    }

    #[test]
    fn line_break_between_inlines_is_a_text_of_its_own() {
        assert_eq!(
            debug("*a*\n`b`"),
            concat!(
                "BLOCKS(\n",
                "  PARAGRAPH(\n",
                "    BOLD(\n",
                "      TEXT(\"a\")\n",
                "    )\n",
                "    TEXT(\"\\n\")\n",
                "    CODE(\"b\")\n",
                "  )\n",
                ")\n",
            )
        );
    }

    #[test]
    fn crlf_line_endings_are_normalized() {
        let doc = parse("%TOC\r\n# Title\r\n\r\nline one\r\nline two\r\n").unwrap();
        match &doc.blocks[..] {
            [Block::TableOfContents(_), Block::Header(header), Block::Paragraph(paragraph)] => {
                assert_eq!(header.anchor_id(), "title");
                assert_eq!(paragraph.to_plain_text(), "line one\nline two");
            }
            other => panic!("Expected TOC, header and paragraph, got {other:?}"),
        }
    }

    #[test]
    fn nested_list_is_an_entry() {
        assert_eq!(
            debug("- A\n  - B\n- C"),
            concat!(
                "BLOCKS(\n",
                "  LIST(ordered: false,\n",
                "    PARAGRAPH(\n",
                "      TEXT(\"A\")\n",
                "    )\n",
                "    LIST(ordered: false,\n",
                "      PARAGRAPH(\n",
                "        TEXT(\"B\")\n",
                "      )\n",
                "    )\n",
                "    PARAGRAPH(\n",
                "      TEXT(\"C\")\n",
                "    )\n",
                "  )\n",
                ")\n",
            )
        );
    }

    #[test]
    fn adjacent_sublists_are_merged() {
        assert_eq!(
            debug("- A\n    - B\n  - C"),
            concat!(
                "BLOCKS(\n",
                "  LIST(ordered: false,\n",
                "    PARAGRAPH(\n",
                "      TEXT(\"A\")\n",
                "    )\n",
                "    LIST(ordered: false,\n",
                "      PARAGRAPH(\n",
                "        TEXT(\"B\")\n",
                "      )\n",
                "      PARAGRAPH(\n",
                "        TEXT(\"C\")\n",
                "      )\n",
                "    )\n",
                "  )\n",
                ")\n",
            )
        );
    }

    #[test]
    fn tab_indentation_counts_as_one_level() {
        let doc = parse("- A\n\t- B").unwrap();
        let Block::List(list) = &doc.blocks[0] else {
            panic!("Expected list");
        };
        assert_eq!(list.entries.len(), 2);
        assert!(matches!(list.entries[1], ListEntry::List(_)));
    }

    #[test]
    fn ordered_list_any_number() {
        let doc = parse("1. one\n7. two\n42. three").unwrap();
        match &doc.blocks[..] {
            [Block::List(list)] => {
                assert!(list.ordered);
                assert_eq!(list.entries.len(), 3);
            }
            other => panic!("Expected an ordered list, got {other:?}"),
        }
    }

    #[test]
    fn list_marker_without_content_is_not_a_list() {
        let doc = parse("- \n").unwrap();
        assert!(
            !doc.blocks.iter().any(|block| matches!(block, Block::List(_))),
            "blocks: {:?}",
            doc.blocks
        );
    }

    #[test]
    fn list_entry_continuation_line() {
        assert_eq!(
            debug("- first\n  continued\n- second"),
            concat!(
                "BLOCKS(\n",
                "  LIST(ordered: false,\n",
                "    PARAGRAPH(\n",
                "      TEXT(\"first\")\n",
                "      TEXT(\"continued\")\n",
                "    )\n",
                "    PARAGRAPH(\n",
                "      TEXT(\"second\")\n",
                "    )\n",
                "  )\n",
                ")\n",
            )
        );
    }

    #[test]
    fn blank_line_separates_lists() {
        let doc = parse("- a\n\n- b").unwrap();
        assert_eq!(doc.blocks.len(), 2);
        assert!(doc.blocks.iter().all(|block| matches!(block, Block::List(_))));
    }

    #[test]
    fn deeply_nested_list_hits_depth_limit() {
        let input = "- a\n  - b\n    - c\n      - d";
        let parser = Parser::new(ParseOptions {
            max_nesting_depth: 2,
            ..ParseOptions::default()
        });
        let err = parser.parse(input).unwrap_err();
        match err {
            ParseError::NestingTooDeep { max_depth, location } => {
                assert_eq!(max_depth, 2);
                assert_eq!(location.line, 4);
            }
            other => panic!("Expected NestingTooDeep, got {other:?}"),
        }
        assert!(parse(input).is_ok());
    }

    #[test]
    fn unterminated_bold_reports_location() {
        let err = parse("Fine line.\nThis is *bold.").unwrap_err();
        assert_eq!(
            err,
            ParseError::UnterminatedInlineDelimiter {
                delimiter: "*".into(),
                location: Location { offset: 19, line: 2, column: 9 },
            }
        );
    }

    #[test]
    fn unterminated_inline_code() {
        let err = parse("a `b").unwrap_err();
        assert!(matches!(err, ParseError::UnterminatedInlineDelimiter { ref delimiter, .. } if delimiter == "`"));
    }

    #[test]
    fn stray_backslash_is_malformed_paragraph() {
        let err = parse("ok\n\nbad \\q escape").unwrap_err();
        match err {
            ParseError::MalformedParagraph { location } => {
                assert_eq!(location.line, 3);
                assert_eq!(location.column, 5);
            }
            other => panic!("Expected MalformedParagraph, got {other:?}"),
        }
    }

    #[test]
    fn failure_is_all_or_nothing() {
        assert!(parse("# Good\n\nStill good\n\n*broken").is_err());
    }

    #[test]
    fn trace_reports_productions() {
        let mut log = TraceLog::new();
        Parser::default().parse_traced("# Hi", &mut log).unwrap();
        let productions = log.productions();
        assert_eq!(productions.first(), Some(&"document"));
        assert!(productions.contains(&"header"));
        assert!(productions.contains(&"text"));
        let header = log.events.iter().find(|e| e.production == "header").unwrap();
        assert_eq!(header.offset, 0);
        assert_eq!(header.lookahead, "# Hi\n");
    }

    #[test]
    fn parser_is_reusable() {
        let parser = Parser::with_mode(ParseMode::Markdown);
        assert_eq!(parser.options().mode, ParseMode::Markdown);
        let first = parser.parse("*a*").unwrap();
        let second = parser.parse("*a*").unwrap();
        assert_eq!(to_debug_string(&first), to_debug_string(&second));
        assert_ne!(first.id(), second.id());
    }
}
