//! Sentence-aware chunking for model inference

/// Sentence terminators; each stays attached to the sentence it ends
const DELIMITERS: [char; 5] = ['\n', '。', '！', '？', '；'];

/// A contiguous slice of the source text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub text: String,
    /// Char offset of the chunk in the source text
    pub offset: usize,
}

impl Chunk {
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Split `text` into chunks of whole sentences, at most `max_len` chars each.
///
/// A sentence longer than `max_len` is kept whole in its own chunk.
/// A `max_len` of 0 means [`DEFAULT_MAX_CHUNK_LEN`](crate::DEFAULT_MAX_CHUNK_LEN).
pub fn split_into_chunks(text: &str, max_len: usize) -> Vec<Chunk> {
    let max_len = match max_len {
        0 => crate::DEFAULT_MAX_CHUNK_LEN,
        n => n,
    };
    let mut chunks = Vec::new();

    let mut current = String::new();
    let mut current_len = 0;
    let mut current_start = 0;
    let mut pos = 0;

    for sentence in text.split_inclusive(|c| DELIMITERS.contains(&c)) {
        let len = sentence.chars().count();

        if current_len > 0 && current_len + len > max_len {
            chunks.push(Chunk {
                text: std::mem::take(&mut current),
                offset: current_start,
            });
            current_len = 0;
        }

        if current_len == 0 {
            current_start = pos;
        }
        current.push_str(sentence);
        current_len += len;
        pos += len;
    }

    if current_len > 0 {
        chunks.push(Chunk {
            text: current,
            offset: current_start,
        });
    }

    chunks
}
