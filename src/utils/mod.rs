pub mod constants;
pub mod string_utils;

pub use constants::*;
pub use string_utils::{
    collapse_whitespace, contains_ignore_case, safe_truncate_boundary, safe_truncate_chars,
    truncate_with_ellipsis,
};

/// Host of a URL, lower-cased, without a leading `www.`.
///
/// Returns an empty string when the input does not parse or has no host.
#[must_use]
pub fn extract_domain(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(strip_www))
        .unwrap_or_default()
}

/// Lower-case a host and drop a leading `www.`.
#[must_use]
pub fn strip_www(host: &str) -> String {
    let host = host.to_lowercase();
    match host.strip_prefix("www.") {
        Some(rest) if !rest.is_empty() => rest.to_string(),
        _ => host,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_domain() {
        assert_eq!(extract_domain("https://Example.Com/path"), "example.com");
        assert_eq!(extract_domain("https://www.example.com/"), "example.com");
        assert_eq!(extract_domain("http://sub.domain.org:8080/"), "sub.domain.org");
        assert_eq!(extract_domain("invalid-url"), "");
    }
}
