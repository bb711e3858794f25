//! Fixed-size character chunking.
//!
//! Windows are measured in characters (Unicode scalar values), never bytes,
//! so multi-byte text is never split inside a code point.

use crate::types::{ChunkMetadata, DocumentChunk, LoadedDocument};
use uuid::Uuid;

pub struct TextChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextChunker {
    /// `chunk_overlap` must be smaller than `chunk_size`; config validation
    /// guarantees this for configured chunkers.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        assert!(chunk_size > 0, "chunk_size must be positive");
        assert!(
            chunk_overlap < chunk_size,
            "chunk_overlap must be smaller than chunk_size"
        );
        Self {
            chunk_size,
            chunk_overlap,
        }
    }

    /// Split one text into overlapping windows.
    ///
    /// Consecutive windows share exactly `chunk_overlap` characters; the last
    /// window ends at the end of the text.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let chars: Vec<char> = text.chars().collect();
        let step = self.chunk_size - self.chunk_overlap;
        let mut chunks = Vec::new();

        for start in (0..chars.len()).step_by(step) {
            let end = (start + self.chunk_size).min(chars.len());
            chunks.push(chars[start..end].iter().collect());
            if end == chars.len() {
                break;
            }
        }

        chunks
    }

    /// Split every document, numbering chunks across the whole file.
    pub fn split_documents(&self, documents: &[LoadedDocument]) -> Vec<DocumentChunk> {
        let mut chunks = Vec::new();

        for document in documents {
            for content in self.chunk(&document.content) {
                let sequence = chunks.len();
                chunks.push(DocumentChunk {
                    id: Uuid::new_v4().to_string(),
                    content,
                    metadata: ChunkMetadata {
                        origin: document.metadata.clone(),
                        sequence,
                    },
                    embedding: None,
                });
            }
        }

        chunks
    }
}

impl Default for TextChunker {
    fn default() -> Self {
        Self::new(1000, 200)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SourceMetadata;

    fn numbered_text(len: usize) -> String {
        (0..len)
            .map(|i| char::from(b'a' + (i % 26) as u8))
            .collect()
    }

    fn doc(content: &str, page: Option<u32>) -> LoadedDocument {
        LoadedDocument {
            content: content.to_string(),
            metadata: SourceMetadata {
                source: "notes.txt".into(),
                page,
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_short_text_is_single_chunk() {
        let chunker = TextChunker::default();
        let chunks = chunker.chunk("hello world");
        assert_eq!(chunks, vec!["hello world".to_string()]);
    }

    #[test]
    fn test_blank_text_has_no_chunks() {
        let chunker = TextChunker::default();
        assert!(chunker.chunk("").is_empty());
        assert!(chunker.chunk("  \n\t ").is_empty());
    }

    #[test]
    fn test_chunks_never_exceed_size() {
        let chunker = TextChunker::new(1000, 200);
        let text = numbered_text(5321);

        for chunk in chunker.chunk(&text) {
            assert!(chunk.chars().count() <= 1000);
        }
    }

    #[test]
    fn test_consecutive_chunks_overlap_exactly() {
        let chunker = TextChunker::new(1000, 200);
        let text = numbered_text(4000);
        let chunks = chunker.chunk(&text);

        assert_eq!(chunks.len(), 5);
        for pair in chunks.windows(2) {
            let prev: Vec<char> = pair[0].chars().collect();
            let next: Vec<char> = pair[1].chars().collect();
            let tail: String = prev[prev.len() - 200..].iter().collect();
            let head: String = next[..200].iter().collect();
            assert_eq!(tail, head);
        }
    }

    #[test]
    fn test_last_chunk_ends_at_text_end() {
        let chunker = TextChunker::new(10, 3);
        let chunks = chunker.chunk("abcdefghijklmnopq");

        assert_eq!(chunks, vec!["abcdefghij", "hijklmnopq"]);
    }

    #[test]
    fn test_exact_fit_does_not_emit_tail_chunk() {
        let chunker = TextChunker::new(10, 2);
        let chunks = chunker.chunk("0123456789");
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn test_multibyte_text_counts_characters() {
        let chunker = TextChunker::new(4, 1);
        let chunks = chunker.chunk("ééééééé");

        assert_eq!(chunks, vec!["éééé", "éééé"]);
    }

    #[test]
    fn test_chunking_is_deterministic() {
        let chunker = TextChunker::new(100, 20);
        let docs = vec![doc(&numbered_text(950), Some(1)), doc("tail page", Some(2))];

        let first: Vec<_> = chunker
            .split_documents(&docs)
            .into_iter()
            .map(|c| (c.content, c.metadata))
            .collect();
        let second: Vec<_> = chunker
            .split_documents(&docs)
            .into_iter()
            .map(|c| (c.content, c.metadata))
            .collect();

        assert_eq!(first, second);
    }

    #[test]
    fn test_split_documents_numbers_across_documents() {
        let chunker = TextChunker::new(10, 2);
        let docs = vec![
            doc("abcdefghijklmnop", Some(1)),
            doc("   ", Some(2)),
            doc("qrstu", Some(3)),
        ];

        let chunks = chunker.split_documents(&docs);

        assert_eq!(chunks.len(), 3);
        let sequences: Vec<usize> = chunks.iter().map(|c| c.metadata.sequence).collect();
        assert_eq!(sequences, vec![0, 1, 2]);
        assert_eq!(chunks[0].metadata.origin.page, Some(1));
        assert_eq!(chunks[2].metadata.origin.page, Some(3));
        assert_eq!(chunks[2].content, "qrstu");
        assert!(chunks.iter().all(|c| c.embedding.is_none()));
    }

    #[test]
    #[should_panic(expected = "chunk_overlap must be smaller")]
    fn test_overlap_must_be_smaller_than_size() {
        TextChunker::new(10, 10);
    }
}
