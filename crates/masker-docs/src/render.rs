//! Markdown → PDF rendering
//!
//! Output is plain typeset text on A4 pages using the viewer-provided CJK
//! font `STSong-Light` (Adobe-GB1, `UniGB-UCS2-H`), so nothing is embedded.
//! Markdown is parsed with `pulldown-cmark`. Headings get larger type, list
//! items keep their bullets, table rows are flattened to cell text and code
//! blocks are set verbatim.

use lazy_static::lazy_static;
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat, dictionary};
use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use regex::Regex;

use crate::error::Result;

const PAGE_WIDTH: f32 = 595.28;
const PAGE_HEIGHT: f32 = 841.89;
/// 2 cm
const MARGIN: f32 = 56.69;
const BODY_SIZE: f32 = 12.0;
const CODE_SIZE: f32 = 10.0;
const LINE_SPACING: f32 = 1.6;
const BLOCK_GAP: f32 = BODY_SIZE * 0.5;
const LIST_INDENT: f32 = 12.0;
const QUOTE_INDENT: f32 = 18.0;

lazy_static! {
    // Raw HTML passes through the parser untouched; parse services emit tables this way
    static ref ROW_END: Regex = Regex::new(r"(?i)</tr\s*>").expect("row pattern is valid");
    static ref CELL_END: Regex = Regex::new(r"(?i)</t[dh]\s*>").expect("cell pattern is valid");
    static ref TAG: Regex = Regex::new(r"<[^>]+>").expect("tag pattern is valid");
}

/// A laid-out line of text
#[derive(Debug, Clone, PartialEq)]
struct Line {
    text: String,
    size: f32,
    indent: f32,
    /// Extra space above the line
    gap: f32,
}

/// Render Markdown into a PDF document
pub fn markdown_to_pdf(markdown: &str) -> Result<Vec<u8>> {
    let lines = layout(markdown);
    let pages = paginate(&lines);

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = add_cjk_font(&mut doc);
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids = Vec::with_capacity(pages.len());
    for page in &pages {
        let content = Content {
            operations: page_operations(page),
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(Object::Reference(page_id));
    }

    let pages_dict = dictionary! {
        "Type" => "Pages",
        "Count" => Object::Integer(kids.len() as i64),
        "Kids" => kids,
        "Resources" => resources_id,
        "MediaBox" => vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Real(PAGE_WIDTH),
            Object::Real(PAGE_HEIGHT),
        ],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut out = Vec::new();
    doc.save_to(&mut out)?;
    Ok(out)
}

fn add_cjk_font(doc: &mut Document) -> ObjectId {
    let descriptor_id = doc.add_object(dictionary! {
        "Type" => "FontDescriptor",
        "FontName" => "STSong-Light",
        "Flags" => Object::Integer(6),
        "FontBBox" => vec![
            Object::Integer(-25),
            Object::Integer(-254),
            Object::Integer(1000),
            Object::Integer(880),
        ],
        "ItalicAngle" => Object::Integer(0),
        "Ascent" => Object::Integer(880),
        "Descent" => Object::Integer(-120),
        "CapHeight" => Object::Integer(880),
        "StemV" => Object::Integer(93),
    });

    let mut system_info = Dictionary::new();
    system_info.set("Registry", Object::string_literal("Adobe"));
    system_info.set("Ordering", Object::string_literal("GB1"));
    system_info.set("Supplement", Object::Integer(2));

    let descendant_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "CIDFontType0",
        "BaseFont" => "STSong-Light",
        "CIDSystemInfo" => system_info,
        "FontDescriptor" => descriptor_id,
        "DW" => Object::Integer(1000),
        // Half-width Latin range of Adobe-GB1
        "W" => vec![Object::Integer(1), Object::Integer(95), Object::Integer(500)],
    });

    doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type0",
        "BaseFont" => "STSong-Light-UniGB-UCS2-H",
        "Encoding" => "UniGB-UCS2-H",
        "DescendantFonts" => vec![Object::Reference(descendant_id)],
    })
}

fn page_operations(lines: &[(f32, &Line)]) -> Vec<Operation> {
    let mut ops = Vec::with_capacity(lines.len() * 5);
    for (y, line) in lines {
        ops.push(Operation::new("BT", vec![]));
        ops.push(Operation::new("Tf", vec!["F1".into(), Object::Real(line.size)]));
        ops.push(Operation::new(
            "Td",
            vec![Object::Real(MARGIN + line.indent), Object::Real(*y)],
        ));
        ops.push(Operation::new(
            "Tj",
            vec![Object::String(encode_ucs2(&line.text), StringFormat::Hexadecimal)],
        ));
        ops.push(Operation::new("ET", vec![]));
    }
    ops
}

/// Place lines top to bottom, starting a new page when one fills up
fn paginate(lines: &[Line]) -> Vec<Vec<(f32, &Line)>> {
    let mut pages = vec![Vec::new()];
    let mut y = PAGE_HEIGHT - MARGIN;

    for line in lines {
        let advance = line.gap + line.size * LINE_SPACING;
        if y - advance < MARGIN {
            pages.push(Vec::new());
            y = PAGE_HEIGHT - MARGIN;
        }
        y -= advance;
        if let Some(page) = pages.last_mut() {
            page.push((y + line.size * (LINE_SPACING - 1.0), line));
        }
    }

    pages
}

/// UCS-2 big-endian; chars outside the BMP become `?`
fn encode_ucs2(text: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(text.len() * 2);
    for c in text.chars() {
        let c = if c == '\t' { ' ' } else { c };
        let unit = u16::try_from(u32::from(c)).unwrap_or(u16::from(b'?'));
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    bytes
}

fn char_width(c: char, size: f32) -> f32 {
    if c.is_ascii() { size * 0.5 } else { size }
}

/// Greedy wrap to `width` points, preferring to break after a space
fn wrap(text: &str, size: f32, width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current: Vec<char> = Vec::new();
    let mut current_width = 0.0;

    for c in text.chars() {
        let w = char_width(c, size);
        if current_width + w > width && !current.is_empty() {
            let split = match current.iter().rposition(|&ch| ch == ' ') {
                Some(i) if i > 0 && c.is_ascii_alphanumeric() => i + 1,
                _ => current.len(),
            };
            let rest = current.split_off(split);
            lines.push(current.iter().collect::<String>().trim_end().to_string());
            current = rest;
            current_width = current.iter().map(|&ch| char_width(ch, size)).sum();
        }
        current.push(c);
        current_width += w;
    }
    if !current.is_empty() {
        lines.push(current.into_iter().collect());
    }

    lines
}

/// `*` is the mask char: escape it so runs of stars never become emphasis.
///
/// A leading `* ` list marker is kept.
fn escape_mask_chars(markdown: &str) -> String {
    let mut out = String::with_capacity(markdown.len() + 16);
    for line in markdown.split_inclusive('\n') {
        let mut body = line.trim_start();
        out.push_str(&line[..line.len() - body.len()]);
        if let Some(rest) = body.strip_prefix("* ") {
            out.push_str("* ");
            body = rest;
        }
        out.push_str(&body.replace('*', "\\*"));
    }
    out
}

/// Code keeps backslashes literally, so undo the escaping there
fn unescape_mask_chars(code: &str) -> String {
    code.replace("\\*", "*")
}

/// Flatten an HTML fragment to text, one line per table row
fn strip_html(html: &str) -> String {
    let text = ROW_END.replace_all(html, "\n");
    let text = CELL_END.replace_all(&text, "  ");
    TAG.replace_all(&text, "").into_owned()
}

fn heading_size(level: HeadingLevel) -> f32 {
    match level {
        HeadingLevel::H1 => 20.0,
        HeadingLevel::H2 => 17.0,
        HeadingLevel::H3 => 15.0,
        _ => 13.0,
    }
}

fn layout(markdown: &str) -> Vec<Line> {
    let source = escape_mask_chars(markdown);
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let mut layout = Layout::new(PAGE_WIDTH - 2.0 * MARGIN);
    for event in Parser::new_ext(&source, options) {
        layout.event(event);
    }
    layout.finish()
}

/// Turns parser events into wrapped lines
struct Layout {
    width: f32,
    lines: Vec<Line>,
    /// Inline text of the block being built
    text: String,
    size: f32,
    /// Space owed above the next line
    gap: f32,
    /// Next number of each open list, `None` for bullets
    lists: Vec<Option<u64>>,
    quotes: usize,
    code: Option<String>,
    cells: Vec<String>,
}

impl Layout {
    fn new(width: f32) -> Self {
        Self {
            width,
            lines: Vec::new(),
            text: String::new(),
            size: BODY_SIZE,
            gap: 0.0,
            lists: Vec::new(),
            quotes: 0,
            code: None,
            cells: Vec::new(),
        }
    }

    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => match self.code.as_mut() {
                Some(code) => code.push_str(&unescape_mask_chars(&text)),
                None => self.text.push_str(&text),
            },
            Event::Code(code) => self.text.push_str(&unescape_mask_chars(&code)),
            Event::Html(html) | Event::InlineHtml(html) => {
                for (i, part) in strip_html(&html).split('\n').enumerate() {
                    if i > 0 {
                        self.flush();
                    }
                    self.text.push_str(part);
                }
            }
            Event::SoftBreak => self.text.push(' '),
            Event::HardBreak => self.flush(),
            Event::Rule => self.end_block(),
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Heading { level, .. } => {
                self.flush();
                self.size = heading_size(level);
                self.gap += BLOCK_GAP;
            }
            Tag::List(first) => {
                self.flush();
                self.lists.push(first);
            }
            Tag::Item => {
                self.flush();
                let marker = match self.lists.last_mut() {
                    Some(Some(n)) => {
                        let marker = format!("{}. ", n);
                        *n += 1;
                        marker
                    }
                    _ => "· ".to_string(),
                };
                self.text.push_str(&marker);
            }
            Tag::BlockQuote { .. } => {
                self.flush();
                self.quotes += 1;
            }
            Tag::CodeBlock { .. } => {
                self.flush();
                self.code = Some(String::new());
            }
            Tag::TableHead | Tag::TableRow => self.cells.clear(),
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Heading { .. } => {
                self.flush();
                self.size = BODY_SIZE;
                self.gap = BLOCK_GAP;
            }
            TagEnd::Paragraph | TagEnd::HtmlBlock | TagEnd::Table => self.end_block(),
            TagEnd::Item => self.flush(),
            TagEnd::List { .. } => {
                self.flush();
                self.lists.pop();
                if self.lists.is_empty() {
                    self.gap = BLOCK_GAP;
                }
            }
            TagEnd::BlockQuote { .. } => {
                self.flush();
                self.quotes = self.quotes.saturating_sub(1);
                self.gap = BLOCK_GAP;
            }
            TagEnd::CodeBlock => {
                let code = self.code.take().unwrap_or_default();
                let indent = self.indent() + LIST_INDENT;
                for line in code.lines() {
                    self.push(line.trim_end(), CODE_SIZE, indent);
                }
                self.gap = BLOCK_GAP;
            }
            TagEnd::TableCell => {
                let cell = std::mem::take(&mut self.text);
                self.cells.push(cell.trim().to_string());
            }
            TagEnd::TableHead | TagEnd::TableRow => {
                self.text = self.cells.join("  ");
                self.cells.clear();
                self.flush();
            }
            _ => {}
        }
    }

    fn indent(&self) -> f32 {
        LIST_INDENT * self.lists.len() as f32 + QUOTE_INDENT * self.quotes as f32
    }

    fn end_block(&mut self) {
        self.flush();
        self.gap = BLOCK_GAP;
    }

    fn flush(&mut self) {
        let text = std::mem::take(&mut self.text);
        let text = text.trim();
        if !text.is_empty() {
            self.push(text, self.size, self.indent());
        }
    }

    fn push(&mut self, text: &str, size: f32, indent: f32) {
        for wrapped in wrap(text, size, self.width - indent) {
            self.lines.push(Line {
                text: wrapped,
                size,
                indent,
                gap: std::mem::take(&mut self.gap),
            });
        }
    }

    fn finish(mut self) -> Vec<Line> {
        self.flush();
        self.lines
    }
}
