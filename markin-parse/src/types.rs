use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(1);

/// Stable identity of a node instance.
///
/// Assigned once at construction and never reused within a process, so view
/// layers can diff trees by identity rather than by structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    fn next() -> Self {
        NodeId(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

/// Discriminant naming the concrete variant of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementType {
    #[serde(rename = "DocumentElement")]
    Document,
    #[serde(rename = "HeaderElement")]
    Header,
    #[serde(rename = "ParagraphElement")]
    Paragraph,
    #[serde(rename = "CodeBlockElement")]
    CodeBlock,
    #[serde(rename = "BlockQuoteElement")]
    BlockQuote,
    #[serde(rename = "ListElement")]
    List,
    #[serde(rename = "HorizontalRuleElement")]
    HorizontalRule,
    #[serde(rename = "TableOfContentsElement")]
    TableOfContents,
    #[serde(rename = "TextElement")]
    Text,
    #[serde(rename = "BoldElement")]
    Bold,
    #[serde(rename = "ItalicElement")]
    Italic,
    #[serde(rename = "CodeElement")]
    Code,
    #[serde(rename = "LinkElement")]
    Link,
    #[serde(rename = "ImageElement")]
    Image,
}

impl ElementType {
    /// Wire-format name of this discriminant.
    pub fn as_str(self) -> &'static str {
        match self {
            ElementType::Document => "DocumentElement",
            ElementType::Header => "HeaderElement",
            ElementType::Paragraph => "ParagraphElement",
            ElementType::CodeBlock => "CodeBlockElement",
            ElementType::BlockQuote => "BlockQuoteElement",
            ElementType::List => "ListElement",
            ElementType::HorizontalRule => "HorizontalRuleElement",
            ElementType::TableOfContents => "TableOfContentsElement",
            ElementType::Text => "TextElement",
            ElementType::Bold => "BoldElement",
            ElementType::Italic => "ItalicElement",
            ElementType::Code => "CodeElement",
            ElementType::Link => "LinkElement",
            ElementType::Image => "ImageElement",
        }
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Nodes compare and hash by identity. Two structurally equal nodes built
// separately are different nodes.
macro_rules! identity_eq {
    ($($node:ty),* $(,)?) => {
        $(
            impl PartialEq for $node {
                fn eq(&self, other: &Self) -> bool {
                    self.id == other.id
                }
            }

            impl Eq for $node {}

            impl Hash for $node {
                fn hash<H: Hasher>(&self, state: &mut H) {
                    self.id.hash(state);
                }
            }

            impl $node {
                /// Identity of this node instance.
                pub fn id(&self) -> NodeId {
                    self.id
                }
            }
        )*
    };
}

identity_eq!(
    Document,
    Header,
    Paragraph,
    CodeBlock,
    BlockQuote,
    List,
    HorizontalRule,
    TableOfContents,
    Text,
    Bold,
    Italic,
    Code,
    Link,
    Image,
);

/// Root of a parsed Markin document.
#[derive(Debug)]
pub struct Document {
    id: NodeId,
    /// Ordered sequence of blocks in the document body.
    pub blocks: Vec<Block>,
}

impl Document {
    pub fn new(blocks: Vec<Block>) -> Self {
        Document {
            id: NodeId::next(),
            blocks,
        }
    }

    pub fn element_type(&self) -> ElementType {
        ElementType::Document
    }

    /// Top-level headers in document order, as used by the table of contents.
    pub fn headers(&self) -> impl Iterator<Item = &Header> {
        self.blocks.iter().filter_map(|block| match block {
            Block::Header(header) => Some(header),
            _ => None,
        })
    }
}

/// A block-level element.
#[derive(Debug, PartialEq, Eq, Hash)]
pub enum Block {
    Header(Header),
    Paragraph(Paragraph),
    CodeBlock(CodeBlock),
    BlockQuote(BlockQuote),
    List(List),
    HorizontalRule(HorizontalRule),
    TableOfContents(TableOfContents),
}

impl Block {
    pub fn element_type(&self) -> ElementType {
        match self {
            Block::Header(_) => ElementType::Header,
            Block::Paragraph(_) => ElementType::Paragraph,
            Block::CodeBlock(_) => ElementType::CodeBlock,
            Block::BlockQuote(_) => ElementType::BlockQuote,
            Block::List(_) => ElementType::List,
            Block::HorizontalRule(_) => ElementType::HorizontalRule,
            Block::TableOfContents(_) => ElementType::TableOfContents,
        }
    }

    pub fn id(&self) -> NodeId {
        match self {
            Block::Header(node) => node.id,
            Block::Paragraph(node) => node.id,
            Block::CodeBlock(node) => node.id,
            Block::BlockQuote(node) => node.id,
            Block::List(node) => node.id,
            Block::HorizontalRule(node) => node.id,
            Block::TableOfContents(node) => node.id,
        }
    }
}

/// Headers come in six levels: `# Largest` through `###### Smallest`.
#[derive(Debug)]
pub struct Header {
    id: NodeId,
    level: u8,
    pub content: Paragraph,
}

impl Header {
    /// Create a header. `level` is clamped to `1..=6`.
    pub fn new(level: u8, content: Paragraph) -> Self {
        Header {
            id: NodeId::next(),
            level: level.clamp(1, 6),
            content,
        }
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    /// Identifier suitable for an HTML anchor.
    ///
    /// Lowercases the flat text and replaces every character outside
    /// `[a-z0-9]` with `-`.
    pub fn anchor_id(&self) -> String {
        self.content
            .to_plain_text()
            .to_lowercase()
            .chars()
            .map(|c| {
                if c.is_ascii_lowercase() || c.is_ascii_digit() {
                    c
                } else {
                    '-'
                }
            })
            .collect()
    }
}

/// A run of inline content. Also used as a list entry and header body.
#[derive(Debug)]
pub struct Paragraph {
    id: NodeId,
    pub content: Vec<Inline>,
}

impl Paragraph {
    pub fn new(content: Vec<Inline>) -> Self {
        Paragraph {
            id: NodeId::next(),
            content,
        }
    }
}

/// Fenced code, kept verbatim.
#[derive(Debug)]
pub struct CodeBlock {
    id: NodeId,
    language: Option<String>,
    pub content: String,
}

impl CodeBlock {
    /// Create a code block. The language tag is trimmed; an empty tag
    /// becomes `None`.
    pub fn new(language: Option<&str>, content: impl Into<String>) -> Self {
        let language = language
            .map(str::trim)
            .filter(|lang| !lang.is_empty())
            .map(str::to_string);
        CodeBlock {
            id: NodeId::next(),
            language,
            content: content.into(),
        }
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }
}

/// Quoted paragraphs, each line prefixed with `>`.
#[derive(Debug)]
pub struct BlockQuote {
    id: NodeId,
    pub content: Vec<Paragraph>,
}

impl BlockQuote {
    pub fn new(content: Vec<Paragraph>) -> Self {
        BlockQuote {
            id: NodeId::next(),
            content,
        }
    }
}

/// Ordered (`1. `) or unordered (`- `) list. Nested lists are entries.
#[derive(Debug)]
pub struct List {
    id: NodeId,
    pub ordered: bool,
    pub entries: Vec<ListEntry>,
}

impl List {
    pub fn new(ordered: bool, entries: Vec<ListEntry>) -> Self {
        List {
            id: NodeId::next(),
            ordered,
            entries,
        }
    }
}

/// One entry of a list: either inline content or a nested list.
#[derive(Debug, PartialEq, Eq, Hash)]
pub enum ListEntry {
    Paragraph(Paragraph),
    List(List),
}

impl ListEntry {
    pub fn element_type(&self) -> ElementType {
        match self {
            ListEntry::Paragraph(_) => ElementType::Paragraph,
            ListEntry::List(_) => ElementType::List,
        }
    }
}

/// A line consisting of exactly `---`.
#[derive(Debug)]
pub struct HorizontalRule {
    id: NodeId,
}

impl HorizontalRule {
    pub fn new() -> Self {
        HorizontalRule { id: NodeId::next() }
    }
}

impl Default for HorizontalRule {
    fn default() -> Self {
        Self::new()
    }
}

/// The `%TOC` placeholder, resolved against the document's headers at
/// render time.
#[derive(Debug)]
pub struct TableOfContents {
    id: NodeId,
}

impl TableOfContents {
    pub fn new() -> Self {
        TableOfContents { id: NodeId::next() }
    }
}

impl Default for TableOfContents {
    fn default() -> Self {
        Self::new()
    }
}

/// An inline element.
#[derive(Debug, PartialEq, Eq, Hash)]
pub enum Inline {
    Text(Text),
    Bold(Bold),
    Italic(Italic),
    Code(Code),
    Link(Link),
    Image(Image),
}

impl Inline {
    pub fn element_type(&self) -> ElementType {
        match self {
            Inline::Text(_) => ElementType::Text,
            Inline::Bold(_) => ElementType::Bold,
            Inline::Italic(_) => ElementType::Italic,
            Inline::Code(_) => ElementType::Code,
            Inline::Link(_) => ElementType::Link,
            Inline::Image(_) => ElementType::Image,
        }
    }

    pub fn id(&self) -> NodeId {
        match self {
            Inline::Text(node) => node.id,
            Inline::Bold(node) => node.id,
            Inline::Italic(node) => node.id,
            Inline::Code(node) => node.id,
            Inline::Link(node) => node.id,
            Inline::Image(node) => node.id,
        }
    }

    /// Shorthand for `Inline::Text(Text::new(content))`.
    pub fn text(content: impl Into<String>) -> Self {
        Inline::Text(Text::new(content))
    }
}

/// Plain text with escapes already decoded.
#[derive(Debug)]
pub struct Text {
    id: NodeId,
    pub content: String,
}

impl Text {
    pub fn new(content: impl Into<String>) -> Self {
        Text {
            id: NodeId::next(),
            content: content.into(),
        }
    }
}

/// `*bold*` (or `**bold**` / `__bold__` in Markdown mode).
#[derive(Debug)]
pub struct Bold {
    id: NodeId,
    pub content: Box<Inline>,
}

impl Bold {
    pub fn new(content: Inline) -> Self {
        Bold {
            id: NodeId::next(),
            content: Box::new(content),
        }
    }
}

/// `_italic_` (or `*italic*` in Markdown mode).
#[derive(Debug)]
pub struct Italic {
    id: NodeId,
    pub content: Box<Inline>,
}

impl Italic {
    pub fn new(content: Inline) -> Self {
        Italic {
            id: NodeId::next(),
            content: Box::new(content),
        }
    }
}

/// `` `inline code` ``, kept verbatim.
#[derive(Debug)]
pub struct Code {
    id: NodeId,
    pub content: String,
}

impl Code {
    pub fn new(content: impl Into<String>) -> Self {
        Code {
            id: NodeId::next(),
            content: content.into(),
        }
    }
}

/// `[caption](url)`
#[derive(Debug)]
pub struct Link {
    id: NodeId,
    pub caption: String,
    pub url: String,
}

impl Link {
    pub fn new(caption: impl Into<String>, url: impl Into<String>) -> Self {
        Link {
            id: NodeId::next(),
            caption: caption.into(),
            url: url.into(),
        }
    }
}

/// `![caption](url)`
#[derive(Debug)]
pub struct Image {
    id: NodeId,
    pub caption: String,
    pub url: String,
}

impl Image {
    pub fn new(caption: impl Into<String>, url: impl Into<String>) -> Self {
        Image {
            id: NodeId::next(),
            caption: caption.into(),
            url: url.into(),
        }
    }
}
