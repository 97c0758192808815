use scraper::{Html, Selector};

use crate::denylist::is_denylisted;
use crate::extract::names::title_case;

const TITLE_SUFFIX: &str = " | Y Combinator";

/// Entity name: ordered pure strategies, first non-empty wins. The slug
/// derivation is the last resort; a page that defeats even that yields no
/// record at all.
pub fn extract_name(doc: &Html, slug: &str) -> Option<String> {
    let strategies: &[fn(&Html) -> Option<String>] =
        &[name_from_h1, name_from_title, name_from_og_title];
    strategies
        .iter()
        .find_map(|s| s(doc))
        .or_else(|| name_from_slug(slug))
}

fn name_from_h1(doc: &Html) -> Option<String> {
    let sel = Selector::parse("h1").unwrap();
    doc.select(&sel)
        .map(|el| collapse(&el.text().collect::<Vec<_>>().join(" ")))
        .find(|t| !t.is_empty())
}

fn name_from_title(doc: &Html) -> Option<String> {
    let sel = Selector::parse("title").unwrap();
    let title = doc.select(&sel).next()?.text().collect::<String>();
    let cleaned = collapse(title.replace(TITLE_SUFFIX, "").trim());
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

fn name_from_og_title(doc: &Html) -> Option<String> {
    let sel = Selector::parse(r#"meta[property="og:title"]"#).unwrap();
    let content = doc.select(&sel).next()?.value().attr("content")?;
    let cleaned = collapse(content.replace(TITLE_SUFFIX, "").trim());
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

fn name_from_slug(slug: &str) -> Option<String> {
    let name = slug
        .split('-')
        .filter(|t| !t.is_empty())
        .map(title_case)
        .collect::<Vec<_>>()
        .join(" ");
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// Primary website: first denylist-filtered absolute URL across the
/// strategy chain. Empty when every outbound link is a known non-primary
/// domain.
pub fn extract_website(doc: &Html) -> Option<String> {
    let strategies: &[fn(&Html) -> Option<String>] =
        &[site_from_anchor_scan, site_from_data_attr, site_from_website_class];
    strategies.iter().find_map(|s| s(doc))
}

fn site_from_anchor_scan(doc: &Html) -> Option<String> {
    let sel = Selector::parse(r#"a[href^="http"]"#).unwrap();
    doc.select(&sel)
        .filter_map(|el| el.value().attr("href"))
        .find(|href| !is_denylisted(href))
        .map(str::to_string)
}

fn site_from_data_attr(doc: &Html) -> Option<String> {
    let sel = Selector::parse("[data-website]").unwrap();
    doc.select(&sel)
        .filter_map(|el| el.value().attr("data-website"))
        .map(str::trim)
        .find(|v| !v.is_empty() && !is_denylisted(v))
        .map(str::to_string)
}

fn site_from_website_class(doc: &Html) -> Option<String> {
    let sel = Selector::parse(".website a, a.website").unwrap();
    doc.select(&sel)
        .filter_map(|el| el.value().attr("href"))
        .find(|href| href.starts_with("http") && !is_denylisted(href))
        .map(str::to_string)
}

fn collapse(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn h1_wins_over_title() {
        let doc = Html::parse_document(
            "<html><head><title>Acme | Y Combinator</title></head><body><h1>Acme Labs</h1></body></html>",
        );
        assert_eq!(extract_name(&doc, "acme-labs").as_deref(), Some("Acme Labs"));
    }

    #[test]
    fn title_suffix_is_stripped() {
        let doc = Html::parse_document(
            "<html><head><title>Acme Labs | Y Combinator</title></head><body></body></html>",
        );
        assert_eq!(extract_name(&doc, "acme-labs").as_deref(), Some("Acme Labs"));
    }

    #[test]
    fn slug_is_last_resort() {
        let doc = Html::parse_document("<html><body><p>nothing here</p></body></html>");
        assert_eq!(extract_name(&doc, "quiet-river").as_deref(), Some("Quiet River"));
    }

    #[test]
    fn website_skips_denylisted_links() {
        let doc = Html::parse_document(
            r#"<body>
                <a href="https://www.ycombinator.com/companies">YC</a>
                <a href="https://twitter.com/acme">tw</a>
                <a href="https://www.acme.dev">site</a>
            </body>"#,
        );
        assert_eq!(extract_website(&doc).as_deref(), Some("https://www.acme.dev"));
    }

    #[test]
    fn website_empty_when_all_denylisted() {
        let doc = Html::parse_document(
            r#"<body><a href="https://www.linkedin.com/company/acme">li</a></body>"#,
        );
        assert_eq!(extract_website(&doc), None);
    }

    #[test]
    fn data_attribute_fallback() {
        let doc = Html::parse_document(r#"<body><div data-website="https://acme.dev"></div></body>"#);
        assert_eq!(extract_website(&doc).as_deref(), Some("https://acme.dev"));
    }
}
