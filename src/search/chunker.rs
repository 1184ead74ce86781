use std::collections::VecDeque;

use crate::config::ChunkingConfig;
use crate::types::{DocKind, Document};

use super::store::content_hash;

/// Chunk text plus provenance, before embedding.
#[derive(Debug, Clone)]
pub struct ChunkDraft {
    pub text: String,
    pub source_name: String,
    pub kind: DocKind,
    pub page_range: Option<(usize, usize)>,
    pub seq: usize,
    pub hash: String,
}

/// Separator hierarchy: paragraph, line, sentence, word. Splits prefer the
/// earliest boundary kind that fits.
const SEPARATORS: [&str; 4] = ["\n\n", "\n", ". ", " "];

/// Recursive character splitter with overlap. Sizes are measured in
/// characters, not bytes; the corpus is not ASCII.
pub struct Chunker {
    chunk_size: usize,
    chunk_overlap: usize,
    min_chunk_size: usize,
}

impl Chunker {
    pub fn new(chunk_size: usize, chunk_overlap: usize, min_chunk_size: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
            min_chunk_size,
        }
    }

    pub fn from_config(config: &ChunkingConfig) -> Self {
        Self::new(config.chunk_size, config.chunk_overlap, config.min_chunk_size)
    }

    /// Split documents into chunk drafts. Pieces shorter than the minimum
    /// after whitespace trimming are discarded here and never reach the
    /// index; the `>=` comparison is inclusive.
    pub fn chunk_documents(&self, documents: &[Document]) -> Vec<ChunkDraft> {
        let mut drafts = Vec::new();

        for doc in documents {
            let pieces = self.split_text(&doc.raw_text, &SEPARATORS);
            let kept = pieces
                .into_iter()
                .filter(|p| p.trim().chars().count() >= self.min_chunk_size);

            for (seq, text) in kept.enumerate() {
                drafts.push(ChunkDraft {
                    hash: content_hash(&text),
                    source_name: doc.source_name.clone(),
                    kind: doc.kind,
                    page_range: doc.page_range,
                    seq,
                    text,
                });
            }
        }

        drafts
    }

    fn split_text(&self, text: &str, separators: &[&str]) -> Vec<String> {
        if text.chars().count() <= self.chunk_size {
            return vec![text.to_string()];
        }

        let found = separators
            .iter()
            .position(|sep| text.contains(sep));

        let Some(sep_idx) = found else {
            return self.split_by_window(text);
        };

        let sep = separators[sep_idx];
        let remaining = &separators[sep_idx + 1..];

        let mut out = Vec::new();
        let mut small: Vec<String> = Vec::new();

        for piece in text.split(sep).filter(|p| !p.is_empty()) {
            if piece.chars().count() <= self.chunk_size {
                small.push(piece.to_string());
            } else {
                // Flush accumulated small pieces, then recurse into the
                // oversized one with finer separators.
                if !small.is_empty() {
                    out.extend(self.merge_pieces(&small, sep));
                    small.clear();
                }
                out.extend(self.split_text(piece, remaining));
            }
        }

        if !small.is_empty() {
            out.extend(self.merge_pieces(&small, sep));
        }

        out
    }

    /// Greedily pack pieces into windows of at most `chunk_size` characters,
    /// carrying a tail of at most `chunk_overlap` characters into the next
    /// window so cut phrases stay retrievable.
    fn merge_pieces(&self, pieces: &[String], sep: &str) -> Vec<String> {
        let sep_len = sep.chars().count();
        let mut chunks = Vec::new();
        let mut window: VecDeque<(String, usize)> = VecDeque::new();
        let mut window_chars = 0usize;

        let joined = |w: &VecDeque<(String, usize)>, chars: usize| -> usize {
            if w.is_empty() {
                0
            } else {
                chars + sep_len * (w.len() - 1)
            }
        };

        for piece in pieces {
            let piece_len = piece.chars().count();

            if !window.is_empty() && joined(&window, window_chars) + sep_len + piece_len > self.chunk_size {
                chunks.push(join_window(&window, sep));

                while !window.is_empty()
                    && (joined(&window, window_chars) > self.chunk_overlap
                        || joined(&window, window_chars) + sep_len + piece_len > self.chunk_size)
                {
                    if let Some((_, dropped)) = window.pop_front() {
                        window_chars -= dropped;
                    }
                }
            }

            window.push_back((piece.clone(), piece_len));
            window_chars += piece_len;
        }

        if !window.is_empty() {
            chunks.push(join_window(&window, sep));
        }

        chunks
    }

    /// Last resort for text with no separators at all: fixed character
    /// windows advancing by `chunk_size - chunk_overlap`.
    fn split_by_window(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        let step = self.chunk_size.saturating_sub(self.chunk_overlap).max(1);

        let mut out = Vec::new();
        let mut start = 0;
        while start < chars.len() {
            let end = (start + self.chunk_size).min(chars.len());
            out.push(chars[start..end].iter().collect());
            if end == chars.len() {
                break;
            }
            start += step;
        }
        out
    }
}

fn join_window(window: &VecDeque<(String, usize)>, sep: &str) -> String {
    window
        .iter()
        .map(|(p, _)| p.as_str())
        .collect::<Vec<_>>()
        .join(sep)
}
