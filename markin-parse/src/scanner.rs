//! Position-addressable character scanner.
//!
//! The parser backtracks by taking a [`Mark`] before trying a production and
//! resetting to it on failure. Every operation here that fails leaves the
//! position exactly where it was.

/// Characters that may be escaped with a backslash inside text.
pub const ESCAPABLE: &str = "\\`*_{}[]()#+-.!>";

/// Characters that end a plain text run.
const TEXT_STOP: &str = "\\`*_![\n";

const HORIZONTAL_WHITESPACE: &str = " \t";

/// Saved scanner position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mark(usize);

/// Reader over an immutable text buffer with a byte-offset cursor.
#[derive(Debug, Clone)]
pub struct Scanner<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(text: &'a str) -> Self {
        Scanner { text, pos: 0 }
    }

    /// Current byte offset.
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn source(&self) -> &'a str {
        self.text
    }

    pub fn mark(&self) -> Mark {
        Mark(self.pos)
    }

    pub fn reset(&mut self, mark: Mark) {
        self.pos = mark.0;
    }

    /// Run `f` and roll back to the starting position if it yields `None`.
    pub fn attempt<T>(&mut self, f: impl FnOnce(&mut Self) -> Option<T>) -> Option<T> {
        let mark = self.mark();
        let result = f(self);
        if result.is_none() {
            self.reset(mark);
        }
        result
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.text.len()
    }

    /// Unconsumed remainder of the buffer.
    pub fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    /// Up to `count` characters from the current position, without consuming.
    pub fn peek_ahead(&self, count: usize) -> &'a str {
        let rest = self.rest();
        let end = rest
            .char_indices()
            .nth(count)
            .map_or(rest.len(), |(i, _)| i);
        &rest[..end]
    }

    fn peek_char(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// Consume `literal` if the buffer matches it here.
    pub fn consume_literal(&mut self, literal: &str) -> bool {
        if self.rest().starts_with(literal) {
            self.pos += literal.len();
            true
        } else {
            false
        }
    }

    /// Consume the first of `literals` that matches, returning it.
    pub fn consume_any_literal<'l>(&mut self, literals: &[&'l str]) -> Option<&'l str> {
        literals
            .iter()
            .copied()
            .find(|literal| self.consume_literal(literal))
    }

    /// Whether `literal` follows, without consuming it.
    pub fn lookahead(&mut self, literal: &str) -> bool {
        let mark = self.mark();
        let matched = self.consume_literal(literal);
        self.reset(mark);
        matched
    }

    /// Consume a maximal run of characters from `charset`.
    ///
    /// Returns `None` when not even one character matched.
    pub fn consume_while(&mut self, charset: &str) -> Option<&'a str> {
        let rest = self.rest();
        let len = rest
            .char_indices()
            .find(|&(_, c)| !charset.contains(c))
            .map_or(rest.len(), |(i, _)| i);
        if len == 0 {
            return None;
        }
        self.pos += len;
        Some(&rest[..len])
    }

    /// Consume up to (not including) the first character from `charset`.
    ///
    /// Returns `None` when that would consume nothing.
    pub fn consume_until_any(&mut self, charset: &str) -> Option<&'a str> {
        let rest = self.rest();
        let len = rest.find(|c: char| charset.contains(c)).unwrap_or(rest.len());
        if len == 0 {
            return None;
        }
        self.pos += len;
        Some(&rest[..len])
    }

    /// Consume up to (not including) the first occurrence of `literal`.
    ///
    /// Returns `None`, consuming nothing, when `literal` never occurs.
    pub fn consume_until(&mut self, literal: &str) -> Option<&'a str> {
        let rest = self.rest();
        let len = rest.find(literal)?;
        self.pos += len;
        Some(&rest[..len])
    }

    /// As [`Scanner::consume_until`], then also consume `literal` itself.
    pub fn consume_until_and_skip(&mut self, literal: &str) -> Option<&'a str> {
        let text = self.consume_until(literal)?;
        self.pos += literal.len();
        Some(text)
    }

    /// Everything up to the next newline (or the end), possibly empty.
    pub fn consume_rest_of_line(&mut self) -> &'a str {
        let rest = self.rest();
        let len = rest.find('\n').unwrap_or(rest.len());
        self.pos += len;
        &rest[..len]
    }

    pub fn consume_horizontal_whitespace(&mut self) -> Option<&'a str> {
        self.consume_while(HORIZONTAL_WHITESPACE)
    }

    pub fn consume_newline(&mut self) -> bool {
        self.consume_literal("\n")
    }

    /// Consume trailing spaces/tabs and then a newline.
    pub fn consume_blank_line_remainder(&mut self) -> bool {
        self.attempt(|s| {
            s.consume_horizontal_whitespace();
            s.consume_newline().then_some(())
        })
        .is_some()
    }

    /// Whether the rest of the current line is blank, without consuming.
    pub fn at_blank_line(&mut self) -> bool {
        let mark = self.mark();
        let blank = self.consume_blank_line_remainder();
        self.reset(mark);
        blank
    }

    /// Discard everything through the next newline.
    pub fn skip_through_newline(&mut self) -> bool {
        self.attempt(|s| {
            s.consume_rest_of_line();
            s.consume_newline().then_some(())
        })
        .is_some()
    }

    /// Consume `\` followed by an escapable character, yielding the bare
    /// character.
    pub fn consume_escape(&mut self) -> Option<char> {
        let mut chars = self.rest().chars();
        if chars.next() != Some('\\') {
            return None;
        }
        let escaped = chars.next().filter(|&c| ESCAPABLE.contains(c))?;
        self.pos += 1 + escaped.len_utf8();
        Some(escaped)
    }

    /// Scan a run of plain text with escapes decoded.
    ///
    /// The run may begin with a literal `!` or `[`; image and link parsing
    /// gets the first chance at those, and when it declines they are text.
    /// After that the run stops at any of `` \ ` * _ ! [ `` or a newline,
    /// except that a backslash escape is decoded and the run continues.
    pub fn scan_inline_text(&mut self) -> Option<String> {
        let mut text = String::new();

        if self.consume_literal("!") {
            text.push('!');
        }
        if self.consume_literal("[") {
            text.push('[');
        }

        loop {
            if let Some(escaped) = self.consume_escape() {
                text.push(escaped);
            } else if let Some(run) = self.consume_until_any(TEXT_STOP) {
                text.push_str(run);
            } else {
                break;
            }
        }

        if text.is_empty() { None } else { Some(text) }
    }

    /// Whether the next character is a newline or the buffer is exhausted.
    pub fn at_line_end(&self) -> bool {
        matches!(self.peek_char(), None | Some('\n'))
    }
}
