/// Closed stopword list removed from full-text queries before they're sent to
/// the lexical index. Deliberately small and fixed rather than locale-aware.
const STOPWORDS: &[&str] = &[
    "a", "an", "the", "and", "or", "but", "is", "are", "was", "were", "be", "been", "being", "to",
    "of", "in", "on", "at", "for", "with", "as", "by", "that", "this", "it", "i", "you", "my",
    "your", "do", "does", "did", "what", "which", "who", "whom",
];

pub fn strip_stopwords(query: &str) -> String {
    query
        .split_whitespace()
        .filter(|w| !STOPWORDS.contains(&w.to_lowercase().as_str()))
        .collect::<Vec<_>>()
        .join(" ")
}
