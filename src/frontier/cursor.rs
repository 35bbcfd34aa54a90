//! Pagination of candidate cursors
//!
//! Cursors are URLs; advancing rewrites one query parameter and leaves the
//! rest of the URL (including parameter order) alone.

use url::Url;

use super::candidate::SearchMethod;

/// Next cursor for `method`. Direct cursors and unparseable URLs come back
/// unchanged.
#[must_use]
pub fn advance_cursor(cursor: &str, method: SearchMethod, page_size: u32) -> String {
    let Some(param) = method.pagination_param() else {
        return cursor.to_string();
    };
    let Ok(mut url) = Url::parse(cursor) else {
        log::debug!("Cursor is not a URL, leaving unchanged: {cursor}");
        return cursor.to_string();
    };

    let (default, step) = match method {
        SearchMethod::Rss => (1u64, 1u64),
        _ => (0u64, u64::from(page_size.max(1))),
    };

    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let current = pairs
        .iter()
        .find(|(k, _)| k == param)
        .and_then(|(_, v)| v.parse::<u64>().ok())
        .unwrap_or(default);
    let next = (current + step).to_string();

    match pairs.iter_mut().find(|(k, _)| k == param) {
        Some(pair) => pair.1 = next,
        None => pairs.push((param.to_string(), next)),
    }

    url.query_pairs_mut().clear().extend_pairs(&pairs);
    url.to_string()
}

/// Current pagination value of a cursor, if present.
#[must_use]
pub fn cursor_position(cursor: &str, method: SearchMethod) -> Option<u64> {
    let param = method.pagination_param()?;
    Url::parse(cursor)
        .ok()?
        .query_pairs()
        .find(|(k, _)| k == param)
        .and_then(|(_, v)| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rss_increments_page() {
        let next = advance_cursor("https://feeds.example/rss?page=2&lang=en", SearchMethod::Rss, 10);
        assert_eq!(next, "https://feeds.example/rss?page=3&lang=en");
    }

    #[test]
    fn rss_without_page_starts_at_two() {
        let next = advance_cursor("https://feeds.example/rss", SearchMethod::Rss, 10);
        assert_eq!(cursor_position(&next, SearchMethod::Rss), Some(2));
    }

    #[test]
    fn api_offset_moves_by_page_size() {
        let next = advance_cursor(
            "https://en.wikipedia.org/w/api.php?action=query&offset=20",
            SearchMethod::Api,
            10,
        );
        assert_eq!(cursor_position(&next, SearchMethod::Api), Some(30));
        assert!(next.contains("action=query"));
    }

    #[test]
    fn search_start_added_when_missing() {
        let next = advance_cursor("https://export.arxiv.org/api/query?q=x", SearchMethod::Search, 25);
        assert_eq!(cursor_position(&next, SearchMethod::Search), Some(25));
    }

    #[test]
    fn direct_and_garbage_unchanged() {
        assert_eq!(
            advance_cursor("https://a.example/x", SearchMethod::Direct, 10),
            "https://a.example/x"
        );
        assert_eq!(advance_cursor("not a url", SearchMethod::Rss, 10), "not a url");
    }
}
