use scraper::{Html, Selector};
use url::Url;

use super::PageMeta;

/// Favicon `rel` values, in order of preference
const ICON_RELS: [&str; 3] = ["icon", "shortcut icon", "apple-touch-icon"];

/// Extract a title and absolute favicon URL from an HTML page
pub fn extract_metadata(html: &str, page_url: &Url) -> PageMeta {
    let document = Html::parse_document(html);

    PageMeta {
        title: extract_title(&document),
        favicon: find_icon_href(&document)
            .and_then(|href| page_url.join(&href).ok())
            .map(String::from)
            .unwrap_or_else(|| fallback_favicon(page_url)),
    }
}

/// `<scheme>://<host[:port]>/favicon.ico`, or empty for opaque origins
pub fn fallback_favicon(page_url: &Url) -> String {
    match page_url.origin() {
        origin @ url::Origin::Tuple(..) => format!("{}/favicon.ico", origin.ascii_serialization()),
        url::Origin::Opaque(_) => String::new(),
    }
}

fn extract_title(document: &Html) -> String {
    let Ok(sel) = Selector::parse("title") else {
        return String::new();
    };
    document
        .select(&sel)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

/// First non-empty href for the most preferred rel that has one
fn find_icon_href(document: &Html) -> Option<String> {
    let sel = Selector::parse("link[rel][href]").ok()?;
    let links: Vec<(String, String)> = document
        .select(&sel)
        .filter_map(|el| {
            let rel = el.value().attr("rel")?;
            let href = el.value().attr("href")?.trim();
            Some((normalize_rel(rel), href.to_string()))
        })
        .collect();

    ICON_RELS.iter().find_map(|wanted| {
        links
            .iter()
            .find(|(rel, href)| rel == wanted && !href.is_empty())
            .map(|(_, href)| href.clone())
    })
}

/// Lowercase and collapse whitespace so `Shortcut  Icon` matches
fn normalize_rel(rel: &str) -> String {
    rel.split_whitespace()
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}
