use crate::error::SpeechError;

/// Default maximum chunk size in characters per synthesis request.
pub const DEFAULT_MAX_CHUNK_CHARS: usize = 5000;

/// Characters that end a sentence when followed by whitespace.
const SENTENCE_ENDS: &[char] = &['.', '!', '?', '…'];

/// One ordered fragment of a text.
///
/// `text` is an exact slice of the input, trailing boundary whitespace
/// included, so concatenating every chunk yields the input unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextChunk<'a> {
    pub index: usize,
    pub text: &'a str,
    /// Length of `text` in characters.
    pub char_len: usize,
}

impl<'a> TextChunk<'a> {
    /// The chunk without surrounding whitespace, as sent to the API.
    pub fn speakable(&self) -> &'a str {
        self.text.trim()
    }
}

/// Split `text` into chunks of at most `max_chars` characters.
///
/// Boundaries are tried in a fixed order: paragraph break, line break and
/// sentence end (each only if the cut falls past half the window), then the
/// last whitespace anywhere in the window, then a hard cut at the window end.
///
/// A zero `max_chars` is rejected with [`SpeechError::InvalidParameter`].
pub fn split_into_chunks(text: &str, max_chars: usize) -> Result<Vec<TextChunk<'_>>, SpeechError> {
    if max_chars == 0 {
        return Err(SpeechError::InvalidParameter(
            "chunk size must be positive".to_string(),
        ));
    }

    let mut chunks = Vec::new();
    let mut rest = text;

    while !rest.is_empty() {
        let window_end = byte_offset_of_char(rest, max_chars);
        let cut = if window_end == rest.len() {
            window_end
        } else {
            find_cut(&rest[..window_end], max_chars)
        };

        let piece = &rest[..cut];
        chunks.push(TextChunk {
            index: chunks.len(),
            text: piece,
            char_len: piece.chars().count(),
        });
        rest = &rest[cut..];
    }

    Ok(chunks)
}

/// Byte offset just past the first `n` characters of `s`, or `s.len()`.
fn byte_offset_of_char(s: &str, n: usize) -> usize {
    s.char_indices().nth(n).map(|(i, _)| i).unwrap_or(s.len())
}

/// Pick the byte offset to cut `window` at. Always in `1..=window.len()`.
fn find_cut(window: &str, max_chars: usize) -> usize {
    let min_chars = max_chars / 2;
    let past_half = |cut: usize| window[..cut].chars().count() > min_chars;

    if let Some(pos) = window.rfind("\n\n") {
        let cut = pos + 2;
        if past_half(cut) {
            return cut;
        }
    }

    if let Some(pos) = window.rfind('\n') {
        let cut = pos + 1;
        if past_half(cut) {
            return cut;
        }
    }

    if let Some(cut) = last_sentence_end(window) {
        if past_half(cut) {
            return cut;
        }
    }

    if let Some((pos, ch)) = window.char_indices().rev().find(|(_, c)| c.is_whitespace()) {
        let cut = pos + ch.len_utf8();
        if pos > 0 {
            return cut;
        }
    }

    window.len()
}

/// Offset just past the whitespace that follows the last sentence end.
fn last_sentence_end(window: &str) -> Option<usize> {
    let mut after_ws: Option<usize> = None;
    for (pos, ch) in window.char_indices().rev() {
        if SENTENCE_ENDS.contains(&ch) {
            if let Some(cut) = after_ws {
                return Some(cut);
            }
        }
        after_ws = if ch.is_whitespace() {
            Some(pos + ch.len_utf8())
        } else {
            None
        };
    }
    None
}
