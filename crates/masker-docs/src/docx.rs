//! WordprocessingML text runs and `.docx` packaging
//!
//! `word/document.xml` is never re-serialized. Text runs are located with a
//! regex over the raw XML and only their contents are spliced, so namespace
//! prefixes, declarations and all other markup survive byte for byte.

use lazy_static::lazy_static;
use regex::Regex;
use std::io::{Cursor, Read, Write};
use std::ops::Range;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

use crate::error::{Error, Result};

pub const DOCUMENT_XML: &str = "word/document.xml";

lazy_static! {
    static ref TEXT_RUN: Regex = Regex::new(r"<w:t(?:\s[^>]*)?>([^<]*)</w:t>").expect("text run pattern is valid");
    static ref ENTITY: Regex = Regex::new(r"&(#x[0-9A-Fa-f]+|#[0-9]+|[A-Za-z]+);").expect("entity pattern is valid");
}

/// One `<w:t>` element's content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRun {
    /// Byte range of the escaped content inside the XML
    pub xml_range: Range<usize>,
    /// Decoded text
    pub text: String,
    /// Char offset of `text` in the concatenated document text
    pub start: usize,
    pub end: usize,
}

impl TextRun {
    pub fn char_len(&self) -> usize {
        self.end - self.start
    }
}

/// Collect the non-empty text runs of `xml` in document order
pub fn extract_runs(xml: &str) -> Vec<TextRun> {
    let mut runs = Vec::new();
    let mut pos = 0;

    for caps in TEXT_RUN.captures_iter(xml) {
        let Some(content) = caps.get(1) else {
            continue;
        };
        if content.is_empty() {
            continue;
        }

        let text = decode_entities(content.as_str());
        let len = text.chars().count();
        runs.push(TextRun {
            xml_range: content.range(),
            text,
            start: pos,
            end: pos + len,
        });
        pos += len;
    }

    runs
}

pub fn full_text(runs: &[TextRun]) -> String {
    runs.iter().map(|r| r.text.as_str()).collect()
}

/// Write new run texts back into `xml`.
///
/// `new_texts[i]` replaces `runs[i]`; `None` leaves the run untouched.
pub fn splice_runs(xml: &str, runs: &[TextRun], new_texts: &[Option<String>]) -> String {
    let mut out = String::with_capacity(xml.len());
    let mut prev = 0;

    for (run, new_text) in runs.iter().zip(new_texts) {
        let Some(new_text) = new_text else {
            continue;
        };
        out.push_str(&xml[prev..run.xml_range.start]);
        out.push_str(&escape_text(new_text));
        prev = run.xml_range.end;
    }
    out.push_str(&xml[prev..]);

    out
}

pub fn decode_entities(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }

    ENTITY
        .replace_all(raw, |caps: &regex::Captures| {
            let name = &caps[1];
            let decoded = match name {
                "lt" => Some('<'),
                "gt" => Some('>'),
                "amp" => Some('&'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ => name
                    .strip_prefix("#x")
                    .map(|hex| u32::from_str_radix(hex, 16))
                    .or_else(|| name.strip_prefix('#').map(str::parse::<u32>))
                    .and_then(|n| n.ok())
                    .and_then(char::from_u32),
            };
            decoded.map_or_else(|| caps[0].to_string(), String::from)
        })
        .into_owned()
}

pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Read `word/document.xml` out of a `.docx` archive
pub fn read_document_xml(docx: &[u8]) -> Result<String> {
    let mut archive = ZipArchive::new(Cursor::new(docx))?;
    let mut file = archive.by_name(DOCUMENT_XML)?;

    let mut xml = String::new();
    file.read_to_string(&mut xml)
        .map_err(|e| Error::Format(format!("{} is not UTF-8: {}", DOCUMENT_XML, e)))?;
    Ok(xml)
}

/// Rebuild the archive with a new `word/document.xml`.
///
/// Every other entry is copied raw, keeping its compression and metadata.
pub fn repack(docx: &[u8], document_xml: &str) -> Result<Vec<u8>> {
    let mut archive = ZipArchive::new(Cursor::new(docx))?;
    let mut writer = ZipWriter::new(Cursor::new(Vec::with_capacity(docx.len())));
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    for i in 0..archive.len() {
        let entry = archive.by_index_raw(i)?;
        if entry.name() == DOCUMENT_XML {
            drop(entry);
            writer.start_file(DOCUMENT_XML, options)?;
            writer.write_all(document_xml.as_bytes())?;
        } else {
            writer.raw_copy_file(entry)?;
        }
    }

    let cursor = writer.finish()?;
    Ok(cursor.into_inner())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub const SAMPLE_XML: &str = concat!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
        r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:w14="http://schemas.microsoft.com/office/word/2010/wordml">"#,
        r#"<w:body><w:p><w:r><w:t>张三的电话</w:t></w:r><w:r><w:rPr><w:b/></w:rPr><w:t xml:space="preserve">1381234</w:t></w:r>"#,
        r#"<w:r><w:t>5678</w:t></w:r><w:r><w:tab/><w:t>，A&amp;B</w:t></w:r><w:r><w:t></w:t></w:r></w:p></w:body></w:document>"#,
    );

    /// Minimal docx: content types, a styles part and the document
    pub fn sample_docx(xml: &str) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        writer.start_file("[Content_Types].xml", options).unwrap();
        writer.write_all(b"<Types/>").unwrap();
        writer.start_file(DOCUMENT_XML, options).unwrap();
        writer.write_all(xml.as_bytes()).unwrap();
        writer.start_file("word/styles.xml", options).unwrap();
        writer.write_all(b"<w:styles/>").unwrap();

        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_extract_runs() {
        let runs = extract_runs(SAMPLE_XML);
        let texts: Vec<&str> = runs.iter().map(|r| r.text.as_str()).collect();

        assert_eq!(texts, vec!["张三的电话", "1381234", "5678", "，A&B"]);
        assert_eq!((runs[1].start, runs[1].end), (5, 12));
        assert_eq!(full_text(&runs), "张三的电话13812345678，A&B");
    }

    #[test]
    fn test_entities() {
        assert_eq!(decode_entities("a&lt;b&gt;&amp;&#20013;&#x6587;&bogus;"), "a<b>&中文&bogus;");
        assert_eq!(escape_text("a<b>&c"), "a&lt;b&gt;&amp;c");
    }

    #[test]
    fn test_splice_preserves_markup() {
        let runs = extract_runs(SAMPLE_XML);
        let new_texts = vec![Some("*三的电话".to_string()), None, None, Some("<x>".to_string())];

        let xml = splice_runs(SAMPLE_XML, &runs, &new_texts);

        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="#));
        assert!(xml.contains("xmlns:w14="));
        assert!(xml.contains("<w:t>*三的电话</w:t>"));
        assert!(xml.contains(r#"<w:t xml:space="preserve">1381234</w:t>"#));
        assert!(xml.contains("<w:t>&lt;x&gt;</w:t>"));
    }

    #[test]
    fn test_repack_replaces_document_only() {
        let docx = sample_docx(SAMPLE_XML);
        assert_eq!(read_document_xml(&docx).unwrap(), SAMPLE_XML);

        let repacked = repack(&docx, "<w:document/>").unwrap();
        assert_eq!(read_document_xml(&repacked).unwrap(), "<w:document/>");

        let mut archive = ZipArchive::new(Cursor::new(repacked)).unwrap();
        assert_eq!(archive.len(), 3);
        let mut styles = String::new();
        archive.by_name("word/styles.xml").unwrap().read_to_string(&mut styles).unwrap();
        assert_eq!(styles, "<w:styles/>");
    }

    #[test]
    fn test_not_a_docx() {
        assert!(matches!(read_document_xml(b"plain text"), Err(Error::Zip(_))));
    }
}
