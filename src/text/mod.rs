//! Input text handling: reading, normalization, statistics and chunking.

pub mod chunker;

use std::path::Path;

use serde::Serialize;

use crate::error::SpeechError;

pub use chunker::{split_into_chunks, TextChunk, DEFAULT_MAX_CHUNK_CHARS};

/// Read a text file as UTF-8, falling back to Latin-1 for legacy files.
pub fn read_text_file(path: &Path) -> Result<String, SpeechError> {
    let bytes = std::fs::read(path).map_err(|e| SpeechError::file_access(path, e))?;
    match String::from_utf8(bytes) {
        Ok(text) => Ok(text),
        Err(e) => {
            log::warn!(
                "{} is not valid UTF-8, decoding as Latin-1",
                path.display()
            );
            Ok(e.into_bytes().iter().map(|&b| char::from(b)).collect())
        }
    }
}

/// Tidy whitespace before synthesis.
///
/// Tabs become spaces, runs of spaces collapse to one, and three or more
/// consecutive newlines collapse to a single blank line.
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut newlines = 0usize;

    for ch in text.chars() {
        let ch = if ch == '\t' { ' ' } else { ch };
        match ch {
            '\n' => {
                newlines += 1;
                if newlines <= 2 {
                    out.push('\n');
                }
            }
            ' ' if out.ends_with(' ') => {}
            _ => {
                newlines = 0;
                out.push(ch);
            }
        }
    }

    out
}

/// Number of whitespace-separated words.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Size figures for a text, as shown before a conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextStats {
    pub characters: usize,
    pub words: usize,
    pub paragraphs: usize,
    /// Synthesis requests the text needs at the given chunk limit.
    pub chunks: usize,
}

impl TextStats {
    /// Fails only for a zero `max_chunk_chars`.
    pub fn of(text: &str, max_chunk_chars: usize) -> Result<Self, SpeechError> {
        let paragraphs = text
            .split("\n\n")
            .filter(|p| !p.trim().is_empty())
            .count();
        let chunks = split_into_chunks(text, max_chunk_chars)?
            .iter()
            .filter(|c| !c.speakable().is_empty())
            .count();

        Ok(Self {
            characters: text.chars().count(),
            words: word_count(text),
            paragraphs,
            chunks,
        })
    }
}
