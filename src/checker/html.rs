// src/checker/html.rs
// =============================================================================
// This module extracts hyperlinks from email HTML.
//
// We use the `scraper` crate which:
// - Parses HTML into a DOM (Document Object Model)
// - Supports CSS selectors for finding elements
// - Is built on html5ever, which recovers from unclosed or misnested tags
//   the same way a browser does, so bad markup never becomes an error
//
// Unlike a site crawler we do NOT resolve or filter the links: an email has no
// base URL, and a `mailto:` or relative href is exactly the kind of thing QA
// should report as unreachable.
// =============================================================================

use scraper::{Html, Selector};

// Extracts every anchor href from an HTML document
//
// Parameters:
//   html: the raw email HTML (borrowed as &str)
//
// Returns: Vec<String> of href values in document order, duplicates kept
//
// Example:
//   html = "<a href='https://a.com'>A</a><a>no href</a><a href='https://a.com'>again</a>"
//   result = ["https://a.com", "https://a.com"]
pub fn extract_links(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);

    // "a[href]" only matches anchors that carry the attribute at all.
    // The selector is a constant, so parsing it cannot fail at runtime.
    let selector = Selector::parse("a[href]").unwrap();

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        // href="" is present but empty; it is skipped like a missing attribute
        .filter(|href| !href.is_empty())
        .map(str::to_string)
        .collect()
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why is the returned Vec owned (Vec<String>) and not borrowed?
//    - scraper::Html is not Send, so it must be dropped before the caller
//      awaits any network request inside a multi-threaded server task
//    - Copying the hrefs out lets the document go out of scope right here
//
// 2. Does document.select() keep document order?
//    - Yes, it walks the tree depth-first in source order
// -----------------------------------------------------------------------------
