//! Char/byte offset conversion
//!
//! Entity offsets on the wire are char (Unicode scalar) offsets, while `regex`
//! reports byte offsets. `CharIndex` converts between the two for one text.

/// Lookup table from char index to byte offset for a single string
#[derive(Debug, Clone)]
pub struct CharIndex {
    /// Byte offset of every char, followed by the total byte length
    byte_offsets: Vec<usize>,
}

impl CharIndex {
    pub fn new(text: &str) -> Self {
        let mut byte_offsets: Vec<usize> = text.char_indices().map(|(b, _)| b).collect();
        byte_offsets.push(text.len());
        Self { byte_offsets }
    }

    /// Number of chars in the indexed text
    pub fn char_len(&self) -> usize {
        self.byte_offsets.len() - 1
    }

    /// Convert a byte offset to a char offset.
    ///
    /// Offsets inside a multi-byte char round up to the next char.
    pub fn to_char(&self, byte: usize) -> usize {
        match self.byte_offsets.binary_search(&byte) {
            Ok(i) | Err(i) => i.min(self.char_len()),
        }
    }

    /// Convert a char offset to a byte offset, clamping to the text length
    pub fn to_byte(&self, ch: usize) -> usize {
        self.byte_offsets[ch.min(self.char_len())]
    }

    /// Slice `text` by char offsets
    pub fn slice<'a>(&self, text: &'a str, start: usize, end: usize) -> &'a str {
        let start = self.to_byte(start);
        let end = self.to_byte(end).max(start);
        &text[start..end]
    }
}
