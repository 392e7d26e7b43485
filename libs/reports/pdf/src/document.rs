//! One PDF document bound to an output sink.
//!
//! A [`DocumentSession`] is opened per render. It lays blocks out onto pages
//! with the standard Helvetica fonts and writes the whole document to the sink
//! when closed. Closing happens exactly once: explicitly through
//! [`DocumentSession::close`], or on drop.

use crate::convert::{Block, BlockKind};
use crate::error::{ConversionError, PdfError, PdfResult};
use crate::layout::PageLayout;
use chrono::{DateTime, Utc};
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId, Stream, StringFormat, dictionary};
use std::io::Write;
use tracing::{debug, warn};

const PRODUCER: &str = "reports";
const REGULAR: &str = "F1";
const BOLD: &str = "F2";
const LINE_SPACING: f32 = 1.4;

/// Metadata written to the document information dictionary.
#[derive(Debug, Clone)]
pub struct DocumentInfo {
    pub title: String,
    pub author: String,
    pub created: DateTime<Utc>,
}

impl DocumentInfo {
    pub fn new(title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            created: Utc::now(),
        }
    }
}

pub struct DocumentSession<'a, W: Write> {
    sink: &'a mut W,
    layout: PageLayout,
    document: Document,
    pages_id: ObjectId,
    resources_id: ObjectId,
    page_ids: Vec<ObjectId>,
    page: Content,
    cursor: f32,
    closed: bool,
}

impl<'a, W: Write> DocumentSession<'a, W> {
    /// Bind a new document to `sink`.
    ///
    /// The sink is flushed once up front so an unusable sink is reported
    /// before any content is produced.
    pub fn open(sink: &'a mut W, layout: PageLayout) -> PdfResult<Self> {
        sink.flush().map_err(PdfError::DocumentWriteInit)?;

        let mut document = Document::with_version("1.7");
        let pages_id = document.new_object_id();

        let regular = document.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let bold = document.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica-Bold",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = document.add_object(dictionary! {
            "Font" => dictionary! {
                REGULAR => regular,
                BOLD => bold,
            },
        });

        let catalog_id = document.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        document.trailer.set("Root", catalog_id);

        Ok(Self {
            sink,
            layout,
            document,
            pages_id,
            resources_id,
            page_ids: Vec::new(),
            page: Content { operations: vec![] },
            cursor: layout.top(),
            closed: false,
        })
    }

    pub fn layout(&self) -> &PageLayout {
        &self.layout
    }

    /// Pages laid out so far, including the one being filled.
    pub fn page_count(&self) -> usize {
        self.page_ids.len() + 1
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn set_info(&mut self, info: &DocumentInfo) {
        let created = info.created.format("D:%Y%m%d%H%M%S+00'00'").to_string();
        let info_id = self.document.add_object(dictionary! {
            "Title" => Object::String(to_latin1(&info.title), StringFormat::Literal),
            "Author" => Object::String(to_latin1(&info.author), StringFormat::Literal),
            "Producer" => Object::String(PRODUCER.as_bytes().to_vec(), StringFormat::Literal),
            "CreationDate" => Object::String(created.into_bytes(), StringFormat::Literal),
        });
        self.document.trailer.set("Info", info_id);
    }

    /// Lay out blocks after whatever was written before, breaking pages at the bottom margin.
    pub fn write_blocks(&mut self, blocks: &[Block]) -> Result<(), ConversionError> {
        for block in blocks {
            let style = BlockStyle::of(block.kind);
            if block.kind == BlockKind::Rule {
                self.rule(style)?;
                continue;
            }

            let width = self.layout.content_width() - style.indent;
            for line in wrap(&block.text, width, style) {
                self.line(&line, style)?;
            }
            self.cursor -= style.space_after;
        }
        Ok(())
    }

    /// Write the document to the sink. Later calls do nothing.
    pub fn close(&mut self) -> PdfResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        self.finish_page().map_err(PdfError::write)?;
        let kids: Vec<Object> = self.page_ids.iter().map(|id| Object::from(*id)).collect();
        self.document.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => self.page_ids.len() as i64,
            }),
        );

        self.document.save_to(&mut *self.sink).map_err(PdfError::write)?;
        self.sink.flush().map_err(PdfError::write)?;

        debug!(pages = %self.page_ids.len(), "PDF document closed");
        Ok(())
    }

    fn line(&mut self, text: &str, style: BlockStyle) -> Result<(), ConversionError> {
        let height = style.size * LINE_SPACING;
        self.ensure_room(height)?;
        self.cursor -= height;

        let font = if style.bold { BOLD } else { REGULAR };
        let x = self.layout.margins.left + style.indent;
        let ops = &mut self.page.operations;
        ops.push(Operation::new("BT", vec![]));
        ops.push(Operation::new(
            "Tf",
            vec![Object::Name(font.as_bytes().to_vec()), style.size.into()],
        ));
        ops.push(Operation::new("Td", vec![x.into(), self.cursor.into()]));
        ops.push(Operation::new(
            "Tj",
            vec![Object::String(to_latin1(text), StringFormat::Literal)],
        ));
        ops.push(Operation::new("ET", vec![]));
        Ok(())
    }

    fn rule(&mut self, style: BlockStyle) -> Result<(), ConversionError> {
        self.ensure_room(style.size)?;
        self.cursor -= style.size / 2.0;

        let left = self.layout.margins.left;
        let right = left + self.layout.content_width();
        let ops = &mut self.page.operations;
        ops.push(Operation::new("w", vec![0.5_f32.into()]));
        ops.push(Operation::new("m", vec![left.into(), self.cursor.into()]));
        ops.push(Operation::new("l", vec![right.into(), self.cursor.into()]));
        ops.push(Operation::new("S", vec![]));

        self.cursor -= style.size / 2.0;
        Ok(())
    }

    fn ensure_room(&mut self, height: f32) -> Result<(), ConversionError> {
        let page_is_empty = self.page.operations.is_empty();
        if self.cursor - height < self.layout.margins.bottom && !page_is_empty {
            self.finish_page()?;
            self.cursor = self.layout.top();
        }
        Ok(())
    }

    fn finish_page(&mut self) -> Result<(), ConversionError> {
        let content = std::mem::replace(&mut self.page, Content { operations: vec![] });
        let stream = Stream::new(dictionary! {}, content.encode()?);
        let content_id = self.document.add_object(stream);

        let page_id = self.document.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![
                0.into(),
                0.into(),
                self.layout.width().into(),
                self.layout.height().into(),
            ],
            "Contents" => content_id,
            "Resources" => self.resources_id,
        });
        self.page_ids.push(page_id);
        Ok(())
    }
}

impl<W: Write> Drop for DocumentSession<'_, W> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(error = %e, "Failed to close PDF document on drop");
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct BlockStyle {
    size: f32,
    bold: bool,
    indent: f32,
    space_after: f32,
}

impl BlockStyle {
    fn of(kind: BlockKind) -> Self {
        let (size, bold, indent, space_after) = match kind {
            BlockKind::Heading(1) => (20.0, true, 0.0, 8.0),
            BlockKind::Heading(2) => (16.0, true, 0.0, 6.0),
            BlockKind::Heading(3) => (14.0, true, 0.0, 4.0),
            BlockKind::Heading(_) => (12.0, true, 0.0, 4.0),
            BlockKind::Text => (11.0, false, 0.0, 4.0),
            BlockKind::ListItem => (11.0, false, 12.0, 2.0),
            BlockKind::TableRow => (10.0, false, 0.0, 2.0),
            BlockKind::Rule => (12.0, false, 0.0, 0.0),
        };
        Self {
            size,
            bold,
            indent,
            space_after,
        }
    }
}

/// Approximate advance width of `c` in thousandths of an em.
fn glyph_width(c: char, bold: bool) -> f32 {
    let regular = match c {
        ' ' | '!' | ',' | '.' | '/' | ':' | ';' | '[' | ']' | '\\' | 'f' | 't' => 278.0,
        '\'' | '|' | 'i' | 'j' | 'l' => 222.0,
        '(' | ')' | '-' | '"' | '`' | 'r' => 333.0,
        'm' | 'M' => 833.0,
        'w' | 'C' | 'D' | 'H' | 'N' | 'R' | 'U' => 722.0,
        'W' => 944.0,
        'G' | 'O' | 'Q' => 778.0,
        '@' => 1015.0,
        'I' => 278.0,
        'J' | 'c' | 'k' | 's' | 'v' | 'x' | 'y' | 'z' => 500.0,
        'A' | 'B' | 'E' | 'K' | 'P' | 'S' | 'V' | 'X' | 'Y' => 667.0,
        'F' | 'T' | 'Z' => 611.0,
        'L' => 556.0,
        '0'..='9' | 'a' | 'b' | 'd' | 'e' | 'g' | 'h' | 'n' | 'o' | 'p' | 'q' | 'u' => 556.0,
        _ => 600.0,
    };
    if bold { regular * 1.06 } else { regular }
}

fn text_width(text: &str, style: BlockStyle) -> f32 {
    text.chars().map(|c| glyph_width(c, style.bold)).sum::<f32>() * style.size / 1000.0
}

/// Greedy word wrap. A word wider than the line is split between characters.
fn wrap(text: &str, width: f32, style: BlockStyle) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();

    for word in text.split(' ').filter(|w| !w.is_empty()) {
        let candidate = if line.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", line, word)
        };
        if text_width(&candidate, style) <= width {
            line = candidate;
            continue;
        }

        if !line.is_empty() {
            lines.push(std::mem::take(&mut line));
        }
        for c in word.chars() {
            line.push(c);
            if text_width(&line, style) > width && line.chars().count() > 1 {
                line.pop();
                lines.push(std::mem::replace(&mut line, c.to_string()));
            }
        }
    }

    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

/// Latin-1 bytes; characters outside it become `?`.
fn to_latin1(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{Margins, PageSize};

    fn count(haystack: &[u8], needle: &[u8]) -> usize {
        haystack.windows(needle.len()).filter(|w| *w == needle).count()
    }

    #[test]
    fn test_close_writes_once() {
        let mut out = Vec::new();
        {
            let mut session = DocumentSession::open(&mut out, PageLayout::default()).unwrap();
            session.set_info(&DocumentInfo::new("Quarterly", "Reports"));
            session
                .write_blocks(&[Block::new(BlockKind::Text, "Hello")])
                .unwrap();
            session.close().unwrap();
            session.close().unwrap();
            assert!(session.is_closed());
        }

        assert!(out.starts_with(b"%PDF-1.7"));
        assert_eq!(count(&out, b"%%EOF"), 1);
        assert!(count(&out, b"(Quarterly)") >= 1);
    }

    #[test]
    fn test_drop_closes_document() {
        let mut out = Vec::new();
        {
            let mut session = DocumentSession::open(&mut out, PageLayout::default()).unwrap();
            session
                .write_blocks(&[Block::new(BlockKind::Heading(1), "Title")])
                .unwrap();
        }

        assert_eq!(count(&out, b"%%EOF"), 1);
    }

    #[test]
    fn test_empty_document_has_one_page() {
        let mut out = Vec::new();
        let mut session = DocumentSession::open(&mut out, PageLayout::default()).unwrap();
        session.close().unwrap();
        assert_eq!(session.page_ids.len(), 1);
    }

    #[test]
    fn test_pagination() {
        let layout = PageLayout::new(
            PageSize::Custom {
                width: 300.0,
                height: 200.0,
            },
            Margins::new(20.0, 20.0, 20.0, 20.0),
        );
        let blocks: Vec<Block> = (0..30)
            .map(|i| Block::new(BlockKind::Text, format!("line {}", i)))
            .collect();

        let mut out = Vec::new();
        let mut session = DocumentSession::open(&mut out, layout).unwrap();
        session.write_blocks(&blocks).unwrap();
        assert!(session.page_count() > 1);
        session.close().unwrap();
    }

    #[test]
    fn test_wrap_respects_width() {
        let style = BlockStyle::of(BlockKind::Text);
        let text = "the quick brown fox jumps over the lazy dog ".repeat(10);

        let lines = wrap(&text, 200.0, style);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(text_width(line, style) <= 200.0, "too wide: {line}");
        }
        assert_eq!(lines.join(" "), text.trim_end());
    }

    #[test]
    fn test_wrap_splits_long_words() {
        let style = BlockStyle::of(BlockKind::Text);
        let lines = wrap(&"x".repeat(100), 50.0, style);
        assert!(lines.len() > 1);
        assert_eq!(lines.concat().len(), 100);
    }

    #[test]
    fn test_latin1_mapping() {
        assert_eq!(to_latin1("café €"), vec![b'c', b'a', b'f', 0xE9, b' ', b'?']);
    }
}
