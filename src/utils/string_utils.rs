//! UTF-8-safe truncation and text helpers
//!
//! Summaries, hero titles and event messages are cut from arbitrary page
//! text, so every cut has to land on a character boundary.

/// Truncate to at most `max_chars` characters (not bytes).
///
/// ```
/// # use carrot_discovery::utils::string_utils::safe_truncate_chars;
/// assert_eq!(safe_truncate_chars("Discovery", 4), "Disc");
/// assert_eq!(safe_truncate_chars("héllo", 2), "hé");
/// assert_eq!(safe_truncate_chars("Hi", 100), "Hi");
/// ```
#[inline]
pub fn safe_truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        None => s,
        Some((byte_idx, _)) => &s[..byte_idx],
    }
}

/// Byte index of the last word boundary within the first `max_chars`
/// characters.
///
/// Whitespace always counts as a boundary, as does any character in
/// `boundary_chars`. Falls back to the `max_chars`-th character when no
/// boundary exists, or the string length when it is shorter.
///
/// ```
/// # use carrot_discovery::utils::string_utils::safe_truncate_boundary;
/// let text = "Rovers clinch the league title";
/// let idx = safe_truncate_boundary(text, 20, ",;:");
/// assert_eq!(&text[..idx], "Rovers clinch the");
/// ```
pub fn safe_truncate_boundary(s: &str, max_chars: usize, boundary_chars: &str) -> usize {
    let Some((max_byte_idx, _)) = s.char_indices().nth(max_chars) else {
        return s.len();
    };

    s[..max_byte_idx]
        .rfind(|c: char| c.is_whitespace() || boundary_chars.contains(c))
        .unwrap_or(max_byte_idx)
}

/// Truncate at a word boundary and append an ellipsis when anything was cut.
///
/// The ellipsis counts toward `max_chars`.
#[must_use]
pub fn truncate_with_ellipsis(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    if max_chars == 0 {
        return String::new();
    }
    let end = safe_truncate_boundary(s, max_chars - 1, ",;:");
    format!("{}…", s[..end].trim_end())
}

/// Collapse runs of whitespace into single spaces and trim the ends.
#[must_use]
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Case-insensitive containment check used by the entity gate.
#[must_use]
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    let needle = needle.trim();
    if needle.is_empty() {
        return false;
    }
    haystack.to_lowercase().contains(&needle.to_lowercase())
}
