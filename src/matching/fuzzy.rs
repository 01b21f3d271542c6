//! Individual fuzzy rules. All inputs are expected to be lowercased and
//! accent-folded already.

/// Positional character overlap: share of positions holding the same char,
/// relative to the longer string.
pub(super) fn positional_similarity(a: &[char], b: &[char]) -> f64 {
    let longer = a.len().max(b.len());
    if longer == 0 {
        return 0.0;
    }
    let same = a.iter().zip(b.iter()).filter(|(x, y)| x == y).count();
    same as f64 / longer as f64
}

/// True if some word of the text is a near-miss spelling of `keyword`.
pub(super) fn token_match<'a>(
    keyword: &str,
    words: impl IntoIterator<Item = &'a str>,
    threshold: f64,
) -> bool {
    let kw: Vec<char> = keyword.chars().collect();
    words.into_iter().any(|word| {
        let token: Vec<char> = word.chars().collect();
        if token.is_empty() || token.len().abs_diff(kw.len()) > 2 {
            return false;
        }
        positional_similarity(&kw, &token) > threshold
    })
}

/// True if enough of the space-separated parts of `keyword` occur in `text`.
/// Parts of two chars or fewer are ignored; a keyword with no remaining parts
/// never matches.
pub(super) fn parts_match(keyword: &str, text: &str, ratio: f64) -> bool {
    let parts: Vec<&str> = keyword
        .split_whitespace()
        .filter(|p| p.chars().count() > 2)
        .collect();
    if parts.is_empty() {
        return false;
    }
    let needed = (parts.len() as f64 * ratio).ceil() as usize;
    let found = parts.iter().filter(|p| text.contains(*p)).count();
    found >= needed.max(1)
}

/// True if any contiguous fragment of `keyword` covering `ratio` of its
/// length appears in `text`.
pub(super) fn fragment_match(keyword: &str, text: &str, ratio: f64) -> bool {
    let chars: Vec<char> = keyword.chars().collect();
    let window = ((chars.len() as f64 * ratio).ceil() as usize).clamp(1, chars.len().max(1));
    if chars.len() < window {
        return false;
    }
    chars
        .windows(window)
        .map(|w| w.iter().collect::<String>())
        .filter(|frag| !frag.trim().is_empty())
        .any(|frag| text.contains(&frag))
}

/// Split text into words with leading/trailing punctuation removed.
pub(super) fn words(text: &str) -> impl Iterator<Item = &str> {
    text.split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|w| !w.is_empty())
}
