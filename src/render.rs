//! Wiki HTML → plain text and anchors, built on `scraper`.

use std::sync::LazyLock;

use scraper::{node::Node, ElementRef, Html, Selector};

/// Site chrome that sits inside the content root on PRTS pages.
const STRIP_SELECTORS: &[&str] = &[
    ".navbox",
    ".navbox-group",
    ".navbox-list",
    ".navbox-subgroup",
    "table.navbox",
    ".catlinks",
    ".printfooter",
    ".mw-footer",
    "#catlinks",
    ".mw-hidden-catlinks",
    ".navigation-not-searchable",
];

static STRIP: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    STRIP_SELECTORS
        .iter()
        .map(|s| Selector::parse(s).expect("valid strip selector"))
        .collect()
});
static CONTENT_ROOT: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".mw-parser-output").expect("valid selector"));
static ANCHOR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a").expect("valid selector"));
static TITLE: LazyLock<Selector> = LazyLock::new(|| Selector::parse("title").expect("valid selector"));

/// Suffix the wiki appends to every `<title>`.
const TITLE_SUFFIX: &str = " - PRTS";

/// Text of the content root with navigation boxes and footers removed.
/// Empty when the page has no content root.
pub fn story_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut out = String::new();
    for root in document.select(&CONTENT_ROOT) {
        collect_text(root, &mut out);
    }
    out
}

fn collect_text(el: ElementRef<'_>, out: &mut String) {
    if STRIP.iter().any(|sel| sel.matches(&el)) {
        return;
    }
    for child in el.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    collect_text(child_el, out);
                }
            }
            _ => {}
        }
    }
}

/// Every `(text, href)` pair on the page, text trimmed. Anchors without an
/// href are skipped.
pub fn anchors(html: &str) -> Vec<(String, String)> {
    let document = Html::parse_document(html);
    document
        .select(&ANCHOR)
        .filter_map(|a| {
            let href = a.value().attr("href")?;
            let text = a.text().collect::<String>();
            Some((text.trim().to_string(), href.to_string()))
        })
        .collect()
}

/// Canonical page title from `<title>`, without the site suffix.
pub fn page_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let raw = document.select(&TITLE).next()?.text().collect::<String>();
    let title = raw.split(TITLE_SUFFIX).next().unwrap_or("").trim();
    if title.is_empty() {
        None
    } else {
        Some(title.to_string())
    }
}
