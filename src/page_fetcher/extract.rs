//! Readable text extraction from article HTML

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use crate::utils::string_utils::collapse_whitespace;

static OG_TITLE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("meta[property='og:title']")
        .expect("BUG: hardcoded CSS selector \"meta[property='og:title']\" is invalid")
});

static TITLE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("title").expect("BUG: hardcoded CSS selector 'title' is invalid")
});

static H1_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("h1").expect("BUG: hardcoded CSS selector 'h1' is invalid")
});

static HEADING_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("h1, h2, h3").expect("BUG: hardcoded CSS selector 'h1, h2, h3' is invalid")
});

static BLOCK_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("p, li, blockquote, h1, h2, h3")
        .expect("BUG: hardcoded CSS selector 'p, li, blockquote, h1, h2, h3' is invalid")
});

static MAIN_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("main").expect("BUG: hardcoded CSS selector 'main' is invalid")
});

static ARTICLE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("article").expect("BUG: hardcoded CSS selector 'article' is invalid")
});

static ROLE_MAIN_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("[role='main']")
        .expect("BUG: hardcoded CSS selector \"[role='main']\" is invalid")
});

static BODY_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("body").expect("BUG: hardcoded CSS selector 'body' is invalid")
});

/// Page chrome whose text never counts as article body
const SKIPPED_ANCESTORS: &[&str] = &["nav", "header", "footer", "aside", "script", "style", "form"];

/// Blocks whose nested blocks are already covered by the outer text
const CONTAINER_BLOCKS: &[&str] = &["li", "blockquote"];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedContent {
    pub title: String,
    pub headings: Vec<String>,
    pub text: String,
}

fn element_text(element: &ElementRef) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

fn extract_title(document: &Html) -> String {
    let og = document
        .select(&OG_TITLE_SELECTOR)
        .next()
        .and_then(|m| m.value().attr("content"))
        .map(collapse_whitespace)
        .filter(|t| !t.is_empty());
    if let Some(title) = og {
        return title;
    }

    [&*TITLE_SELECTOR, &*H1_SELECTOR]
        .into_iter()
        .find_map(|selector| {
            document
                .select(selector)
                .next()
                .map(|el| element_text(&el))
                .filter(|t| !t.is_empty())
        })
        .unwrap_or_default()
}

fn main_container(document: &Html) -> Option<ElementRef<'_>> {
    [&*MAIN_SELECTOR, &*ARTICLE_SELECTOR, &*ROLE_MAIN_SELECTOR, &*BODY_SELECTOR]
        .into_iter()
        .find_map(|selector| document.select(selector).next())
}

fn is_skipped(element: &ElementRef) -> bool {
    element.ancestors().filter_map(ElementRef::wrap).any(|ancestor| {
        let name = ancestor.value().name();
        SKIPPED_ANCESTORS.contains(&name) || CONTAINER_BLOCKS.contains(&name)
    })
}

/// Title, section headings and body text of an HTML page.
///
/// Body text is taken from the first of `main`, `article`, `[role=main]`
/// or `body`, one block per line.
#[must_use]
pub fn extract_content(html: &str) -> ExtractedContent {
    let document = Html::parse_document(html);
    let title = extract_title(&document);

    let Some(container) = main_container(&document) else {
        return ExtractedContent {
            title,
            ..Default::default()
        };
    };

    let headings = container
        .select(&HEADING_SELECTOR)
        .filter(|el| !is_skipped(el))
        .map(|el| element_text(&el))
        .filter(|t| !t.is_empty())
        .collect();

    let text = container
        .select(&BLOCK_SELECTOR)
        .filter(|el| !is_skipped(el))
        .map(|el| element_text(&el))
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    ExtractedContent { title, headings, text }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><head>
        <title>Fallback title</title>
        <meta property="og:title" content="  Harbour  festival returns ">
      </head><body>
        <nav><ul><li>Home</li><li>News</li></ul></nav>
        <main>
          <h1>Harbour festival returns</h1>
          <p>Boats   filled the bay on Saturday.</p>
          <h2>Crowds</h2>
          <ul><li>Over <b>ten thousand</b> visitors</li><li><p>Record lantern count</p></li></ul>
          <aside><p>Advertisement</p></aside>
        </main>
        <footer><p>Copyright</p></footer>
      </body></html>"#;

    #[test]
    fn og_title_preferred() {
        assert_eq!(extract_content(PAGE).title, "Harbour festival returns");
    }

    #[test]
    fn body_skips_chrome() {
        let content = extract_content(PAGE);
        assert_eq!(
            content.text,
            "Harbour festival returns\nBoats filled the bay on Saturday.\nCrowds\nOver ten thousand visitors\nRecord lantern count"
        );
        assert_eq!(content.headings, vec!["Harbour festival returns", "Crowds"]);
    }

    #[test]
    fn title_falls_back_to_h1() {
        let content = extract_content("<html><body><h1>Only heading</h1><p>Text</p></body></html>");
        assert_eq!(content.title, "Only heading");
        assert_eq!(content.text, "Only heading\nText");
    }
}
