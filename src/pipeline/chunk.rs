//! Fixed-width text chunking.
//!
//! The summarisation endpoint has a bounded context window, so long
//! documents are cut into windows of `max_chars` characters and summarised
//! one by one. Cuts ignore word and sentence boundaries: concatenating the
//! chunks in order must give back the input exactly.
//!
//! Lengths are counted in `char`s, not bytes, so a cut never lands inside a
//! multi-byte code point.

/// Split `text` into consecutive slices of at most `max_chars` characters.
///
/// Every slice except the last holds exactly `max_chars` characters. An
/// empty input yields no chunks. A `max_chars` of 0 is treated as 1.
pub fn split_into_chunks(text: &str, max_chars: usize) -> Vec<&str> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::with_capacity(chunk_count(text.len(), max_chars));
    let mut rest = text;

    while !rest.is_empty() {
        let cut = rest
            .char_indices()
            .nth(max_chars)
            .map(|(byte_idx, _)| byte_idx)
            .unwrap_or(rest.len());
        let (head, tail) = rest.split_at(cut);
        chunks.push(head);
        rest = tail;
    }

    chunks
}

/// `ceil(len / max_chars)`, i.e. how many chunks `len` characters produce.
pub fn chunk_count(len: usize, max_chars: usize) -> usize {
    len.div_ceil(max_chars.max(1))
}
