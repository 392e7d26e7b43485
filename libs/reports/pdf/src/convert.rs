//! XHTML to text blocks.
//!
//! The rendered report is parsed as XML, so it must be well-formed: void
//! elements are written `<br/>`, every other element is closed, and the only
//! named entities are the five XML ones plus `&nbsp;`.

use crate::error::ConversionError;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::mem;
use tracing::trace;

/// Elements whose content never reaches the page.
const SKIPPED: &[&str] = &["head", "style", "script", "title"];

/// Elements that end the current line and start a new one.
const BLOCKS: &[&str] = &[
    "html",
    "body",
    "p",
    "div",
    "section",
    "article",
    "header",
    "footer",
    "blockquote",
    "pre",
    "ul",
    "ol",
    "table",
    "thead",
    "tbody",
    "tfoot",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// `h1` to `h6`
    Heading(u8),
    Text,
    ListItem,
    TableRow,
    /// Horizontal rule, carries no text
    Rule,
}

/// One line-wrapped unit of page content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub kind: BlockKind,
    pub text: String,
}

impl Block {
    pub fn new(kind: BlockKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

/// Parse `xhtml` into blocks, in document order.
pub fn xhtml_to_blocks(xhtml: &str) -> Result<Vec<Block>, ConversionError> {
    let prepared = xhtml.replace("&nbsp;", "&#160;");
    let mut reader = Reader::from_str(&prepared);
    reader.config_mut().trim_text(false);

    let mut collector = Collector::default();
    loop {
        let event = reader.read_event().map_err(|source| ConversionError::Markup {
            position: reader.buffer_position() as u64,
            source,
        })?;

        match event {
            Event::Start(e) => collector.open(&e),
            Event::Empty(e) => collector.empty(&e),
            Event::End(e) => collector.close(&String::from_utf8_lossy(e.local_name().as_ref())),
            Event::Text(e) => {
                if !collector.skipping() {
                    let text = e.unescape().map_err(|source| ConversionError::Markup {
                        position: reader.buffer_position() as u64,
                        source,
                    })?;
                    collector.text(&text);
                }
            }
            Event::CData(e) => {
                if !collector.skipping() {
                    let raw = e.into_inner();
                    collector.text(std::str::from_utf8(&raw)?);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    collector.finish()
}

#[derive(Default)]
struct Collector {
    blocks: Vec<Block>,
    open: Vec<String>,
    skip_depth: usize,
    kind: Option<BlockKind>,
    current: String,
}

impl Collector {
    fn skipping(&self) -> bool {
        self.skip_depth > 0
    }

    fn open(&mut self, e: &BytesStart<'_>) {
        let name = element_name(e);
        if SKIPPED.contains(&name.as_str()) {
            self.skip_depth += 1;
        }
        if !self.skipping() {
            self.start_element(&name);
        }
        self.open.push(name);
    }

    fn empty(&mut self, e: &BytesStart<'_>) {
        if self.skipping() {
            return;
        }
        match element_name(e).as_str() {
            "br" => self.flush(),
            "hr" => {
                self.flush();
                self.blocks.push(Block::new(BlockKind::Rule, ""));
            }
            name if is_block(name) => self.flush(),
            _ => {}
        }
    }

    fn close(&mut self, name: &str) {
        let name = name.to_ascii_lowercase();
        self.open.pop();

        if SKIPPED.contains(&name.as_str()) {
            self.skip_depth = self.skip_depth.saturating_sub(1);
            return;
        }
        if self.skipping() {
            return;
        }
        if is_block(&name) || name == "li" || name == "tr" || heading_level(&name).is_some() {
            self.flush();
            self.kind = None;
        }
    }

    fn start_element(&mut self, name: &str) {
        if let Some(level) = heading_level(name) {
            self.flush();
            self.kind = Some(BlockKind::Heading(level));
        } else if name == "li" {
            self.flush();
            self.kind = Some(BlockKind::ListItem);
        } else if name == "tr" {
            self.flush();
            self.kind = Some(BlockKind::TableRow);
        } else if name == "td" || name == "th" {
            if !self.current.trim().is_empty() {
                self.current.push_str(" | ");
            }
        } else if is_block(name) {
            self.flush();
        }
    }

    fn text(&mut self, text: &str) {
        self.current.push_str(text);
    }

    fn flush(&mut self) {
        let raw = mem::take(&mut self.current);
        let text = raw.split_ascii_whitespace().collect::<Vec<_>>().join(" ");
        if text.is_empty() {
            return;
        }

        let kind = self.kind.unwrap_or(BlockKind::Text);
        let text = match kind {
            BlockKind::ListItem => format!("- {}", text),
            _ => text,
        };
        trace!(?kind, text = %text, "Block");
        self.blocks.push(Block::new(kind, text));
    }

    fn finish(mut self) -> Result<Vec<Block>, ConversionError> {
        if let Some(unclosed) = self.open.pop() {
            return Err(ConversionError::UnclosedElement(unclosed));
        }
        self.flush();
        Ok(self.blocks)
    }
}

fn element_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).to_ascii_lowercase()
}

fn is_block(name: &str) -> bool {
    BLOCKS.contains(&name)
}

fn heading_level(name: &str) -> Option<u8> {
    match name.as_bytes() {
        [b'h', level @ b'1'..=b'6'] => Some(level - b'0'),
        _ => None,
    }
}
