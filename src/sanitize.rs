/// Longest title `sanitize` returns, in characters
pub const MAX_TITLE_CHARS: usize = 100;

const ELLIPSIS: &str = "...";

const FORBIDDEN: [char; 9] = ['\\', '/', '*', '?', ':', '"', '<', '>', '|'];

/// Strip characters that common filesystems reject and cap the length.
///
/// Titles longer than 100 characters after stripping keep their first 97 characters
/// followed by `...`. Lengths count `char`s, so multi-byte titles are never split.
pub fn sanitize(raw: &str) -> String {
    let cleaned: String = raw.chars().filter(|c| !FORBIDDEN.contains(c)).collect();

    if cleaned.chars().count() <= MAX_TITLE_CHARS {
        return cleaned;
    }

    let keep = MAX_TITLE_CHARS - ELLIPSIS.len();
    let mut truncated: String = cleaned.chars().take(keep).collect();
    truncated.push_str(ELLIPSIS);
    truncated
}
