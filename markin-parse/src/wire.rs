//! JSON wire form.
//!
//! Every node is an object carrying an `"elementType"` discriminant plus its
//! own fields. Decoding is lenient toward forward-compatible additions: an
//! array element with an unknown discriminant, or one not allowed in that
//! array (a text node among blocks, say), is skipped. Anything that would
//! leave the tree invalid is an error.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::WireError;
use crate::types::{
    Block, BlockQuote, Bold, Code, CodeBlock, Document, Header, HorizontalRule, Image, Inline,
    Italic, Link, List, ListEntry, Paragraph, TableOfContents, Text,
};

/// Serialized shape of a node.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "elementType")]
enum WireNode {
    #[serde(rename = "DocumentElement")]
    Document { blocks: Vec<WireNode> },
    #[serde(rename = "HeaderElement")]
    Header { level: u64, content: Box<WireNode> },
    #[serde(rename = "ParagraphElement")]
    Paragraph { content: Vec<WireNode> },
    #[serde(rename = "CodeBlockElement")]
    CodeBlock {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        language: Option<String>,
        content: String,
    },
    #[serde(rename = "BlockQuoteElement")]
    BlockQuote { content: Vec<WireNode> },
    #[serde(rename = "ListElement")]
    List { ordered: bool, entries: Vec<WireNode> },
    #[serde(rename = "HorizontalRuleElement")]
    HorizontalRule {},
    #[serde(rename = "TableOfContentsElement")]
    TableOfContents {},
    #[serde(rename = "TextElement")]
    Text { content: String },
    #[serde(rename = "BoldElement")]
    Bold { content: Box<WireNode> },
    #[serde(rename = "ItalicElement")]
    Italic { content: Box<WireNode> },
    #[serde(rename = "CodeElement")]
    Code { content: String },
    #[serde(rename = "LinkElement")]
    Link { caption: String, url: String },
    #[serde(rename = "ImageElement")]
    Image { caption: String, url: String },
    #[serde(other)]
    Unknown,
}

impl WireNode {
    fn name(&self) -> &'static str {
        match self {
            WireNode::Document { .. } => "DocumentElement",
            WireNode::Header { .. } => "HeaderElement",
            WireNode::Paragraph { .. } => "ParagraphElement",
            WireNode::CodeBlock { .. } => "CodeBlockElement",
            WireNode::BlockQuote { .. } => "BlockQuoteElement",
            WireNode::List { .. } => "ListElement",
            WireNode::HorizontalRule {} => "HorizontalRuleElement",
            WireNode::TableOfContents {} => "TableOfContentsElement",
            WireNode::Text { .. } => "TextElement",
            WireNode::Bold { .. } => "BoldElement",
            WireNode::Italic { .. } => "ItalicElement",
            WireNode::Code { .. } => "CodeElement",
            WireNode::Link { .. } => "LinkElement",
            WireNode::Image { .. } => "ImageElement",
            WireNode::Unknown => "an unknown element",
        }
    }
}

// ------------------------------------------------------------------
// Encoding
// ------------------------------------------------------------------

fn encode_document(doc: &Document) -> WireNode {
    WireNode::Document {
        blocks: doc.blocks.iter().map(encode_block).collect(),
    }
}

fn encode_block(block: &Block) -> WireNode {
    match block {
        Block::Header(header) => WireNode::Header {
            level: u64::from(header.level()),
            content: Box::new(encode_paragraph(&header.content)),
        },
        Block::Paragraph(paragraph) => encode_paragraph(paragraph),
        Block::CodeBlock(code) => WireNode::CodeBlock {
            language: code.language().map(str::to_string),
            content: code.content.clone(),
        },
        Block::BlockQuote(quote) => WireNode::BlockQuote {
            content: quote.content.iter().map(encode_paragraph).collect(),
        },
        Block::List(list) => encode_list(list),
        Block::HorizontalRule(_) => WireNode::HorizontalRule {},
        Block::TableOfContents(_) => WireNode::TableOfContents {},
    }
}

fn encode_list(list: &List) -> WireNode {
    WireNode::List {
        ordered: list.ordered,
        entries: list
            .entries
            .iter()
            .map(|entry| match entry {
                ListEntry::Paragraph(paragraph) => encode_paragraph(paragraph),
                ListEntry::List(nested) => encode_list(nested),
            })
            .collect(),
    }
}

fn encode_paragraph(paragraph: &Paragraph) -> WireNode {
    WireNode::Paragraph {
        content: paragraph.content.iter().map(encode_inline).collect(),
    }
}

fn encode_inline(inline: &Inline) -> WireNode {
    match inline {
        Inline::Text(text) => WireNode::Text {
            content: text.content.clone(),
        },
        Inline::Bold(bold) => WireNode::Bold {
            content: Box::new(encode_inline(&bold.content)),
        },
        Inline::Italic(italic) => WireNode::Italic {
            content: Box::new(encode_inline(&italic.content)),
        },
        Inline::Code(code) => WireNode::Code {
            content: code.content.clone(),
        },
        Inline::Link(link) => WireNode::Link {
            caption: link.caption.clone(),
            url: link.url.clone(),
        },
        Inline::Image(image) => WireNode::Image {
            caption: image.caption.clone(),
            url: image.url.clone(),
        },
    }
}

// ------------------------------------------------------------------
// Decoding
// ------------------------------------------------------------------

fn decode_document(node: WireNode) -> Result<Document, WireError> {
    match node {
        WireNode::Document { blocks } => {
            let mut decoded = Vec::with_capacity(blocks.len());
            for node in blocks {
                if let Some(block) = decode_block(node)? {
                    decoded.push(block);
                }
            }
            Ok(Document::new(decoded))
        }
        other => Err(WireError::UnexpectedElement {
            expected: "DocumentElement",
            found: other.name().to_string(),
        }),
    }
}

/// `None` for nodes that are not blocks.
fn decode_block(node: WireNode) -> Result<Option<Block>, WireError> {
    let block = match node {
        WireNode::Header { level, content } => {
            let level = u8::try_from(level)
                .ok()
                .filter(|level| (1..=6).contains(level))
                .ok_or(WireError::InvalidHeaderLevel(level))?;
            Block::Header(Header::new(level, decode_paragraph(*content)?))
        }
        paragraph @ WireNode::Paragraph { .. } => Block::Paragraph(decode_paragraph(paragraph)?),
        WireNode::CodeBlock { language, content } => {
            Block::CodeBlock(CodeBlock::new(language.as_deref(), content))
        }
        WireNode::BlockQuote { content } => {
            let mut paragraphs = Vec::new();
            for node in content {
                if matches!(node, WireNode::Paragraph { .. }) {
                    paragraphs.push(decode_paragraph(node)?);
                }
            }
            if paragraphs.is_empty() {
                return Err(WireError::EmptyContainer("BlockQuoteElement"));
            }
            Block::BlockQuote(BlockQuote::new(paragraphs))
        }
        list @ WireNode::List { .. } => Block::List(decode_list(list)?),
        WireNode::HorizontalRule {} => Block::HorizontalRule(HorizontalRule::new()),
        WireNode::TableOfContents {} => Block::TableOfContents(TableOfContents::new()),
        _ => return Ok(None),
    };
    Ok(Some(block))
}

fn decode_list(node: WireNode) -> Result<List, WireError> {
    let (ordered, entries) = match node {
        WireNode::List { ordered, entries } => (ordered, entries),
        other => {
            return Err(WireError::UnexpectedElement {
                expected: "ListElement",
                found: other.name().to_string(),
            });
        }
    };

    let mut decoded = Vec::with_capacity(entries.len());
    for entry in entries {
        match entry {
            paragraph @ WireNode::Paragraph { .. } => {
                decoded.push(ListEntry::Paragraph(decode_paragraph(paragraph)?));
            }
            nested @ WireNode::List { .. } => decoded.push(ListEntry::List(decode_list(nested)?)),
            _ => {}
        }
    }
    if decoded.is_empty() {
        return Err(WireError::EmptyContainer("ListElement"));
    }
    Ok(List::new(ordered, decoded))
}

fn decode_paragraph(node: WireNode) -> Result<Paragraph, WireError> {
    let content = match node {
        WireNode::Paragraph { content } => content,
        other => {
            return Err(WireError::UnexpectedElement {
                expected: "ParagraphElement",
                found: other.name().to_string(),
            });
        }
    };

    let mut inlines = Vec::with_capacity(content.len());
    for node in content {
        if let Some(inline) = decode_inline(node)? {
            inlines.push(inline);
        }
    }
    if inlines.is_empty() {
        return Err(WireError::EmptyContainer("ParagraphElement"));
    }
    Ok(Paragraph::new(inlines))
}

/// `None` for nodes that are not inlines.
fn decode_inline(node: WireNode) -> Result<Option<Inline>, WireError> {
    let inline = match node {
        WireNode::Text { content } => Inline::Text(Text::new(content)),
        WireNode::Bold { content } => Inline::Bold(Bold::new(decode_inline_child(*content)?)),
        WireNode::Italic { content } => Inline::Italic(Italic::new(decode_inline_child(*content)?)),
        WireNode::Code { content } => Inline::Code(Code::new(content)),
        WireNode::Link { caption, url } => Inline::Link(Link::new(caption, url)),
        WireNode::Image { caption, url } => Inline::Image(Image::new(caption, url)),
        _ => return Ok(None),
    };
    Ok(Some(inline))
}

/// The single child of an emphasis node, which must be an inline.
fn decode_inline_child(node: WireNode) -> Result<Inline, WireError> {
    let name = node.name();
    decode_inline(node)?.ok_or_else(|| WireError::UnexpectedElement {
        expected: "an inline element",
        found: name.to_string(),
    })
}

// ------------------------------------------------------------------
// Public surface
// ------------------------------------------------------------------

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        encode_document(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let node = WireNode::deserialize(deserializer)?;
        decode_document(node).map_err(D::Error::custom)
    }
}

impl Document {
    /// Encode this document in the compact JSON wire form.
    pub fn to_json(&self) -> Result<String, WireError> {
        Ok(serde_json::to_string(&encode_document(self))?)
    }

    /// Encode this document in the indented JSON wire form.
    pub fn to_json_pretty(&self) -> Result<String, WireError> {
        Ok(serde_json::to_string_pretty(&encode_document(self))?)
    }

    /// Decode a document from its JSON wire form.
    pub fn from_json(json: &str) -> Result<Self, WireError> {
        let node: WireNode = serde_json::from_str(json)?;
        decode_document(node)
    }
}
