/// Deterministic, model-free token estimate shared by the context manager and
/// the embedder so "chat-time" and "embed-time" token accounting never drift.
///
/// Splits on Unicode whitespace, then further splits runs of ASCII
/// punctuation off of each chunk, mirroring (loosely) how a BPE tokenizer
/// treats punctuation as its own tokens. Not meant to match any specific
/// provider's tokenizer exactly — only to be stable and monotonic.
pub fn count_tokens(text: &str) -> u32 {
    tokens(text).count() as u32
}

/// Yields the token strings themselves, for callers that tokenize once and
/// derive both a count and a feature set from the same pass (the embedder).
pub fn tokens(text: &str) -> impl Iterator<Item = &str> {
    text.split_whitespace().flat_map(split_punctuation)
}

fn split_punctuation(word: &str) -> impl Iterator<Item = &str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    let bytes = word.as_bytes();
    let is_punct = |b: u8| b.is_ascii_punctuation();

    let mut idx = 0;
    let mut in_punct_run = bytes.first().map(|&b| is_punct(b)).unwrap_or(false);
    while idx < word.len() {
        let ch_len = word[idx..].chars().next().map(|c| c.len_utf8()).unwrap_or(1);
        let this_is_punct = word.as_bytes()[idx] < 128 && is_punct(word.as_bytes()[idx]);
        if this_is_punct != in_punct_run {
            if idx > start {
                pieces.push(&word[start..idx]);
            }
            start = idx;
            in_punct_run = this_is_punct;
        }
        idx += ch_len;
    }
    if start < word.len() {
        pieces.push(&word[start..]);
    }
    pieces.into_iter()
}
