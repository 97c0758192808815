use std::collections::HashSet;

use scraper::{ElementRef, Html, Selector};

use crate::denylist::PLATFORM_ACCOUNT;
use crate::extract::names::{is_plausible_name, profile_slug, resolve_slug_name};

/// How far up the DOM the heading/handle search may climb from a profile
/// link. Founder cards are shallow; beyond this the search would start
/// picking up page-level chrome.
const MAX_ANCESTOR_LEVELS: usize = 4;

/// Section titles that sit near founder cards and must never be read as a
/// person's name.
const SECTION_TITLES: &[&str] = &[
    "active founders",
    "former founders",
    "inactive founders",
    "founders",
    "latest news",
    "company launches",
    "news",
    "jobs",
];

/// One founder as extracted from a detail page. The tuple stays paired:
/// a name, its profile link, and its handle always travel together.
#[derive(Debug, Clone)]
pub struct Founder {
    pub name: Option<String>,
    pub profile_url: String,
    pub handle_url: Option<String>,
}

/// Collect founder identities from every distinct profile link on the page.
/// Name resolution tries the slug first and falls back to the nearest
/// plausible heading within a bounded ancestor walk.
pub fn extract_founders(doc: &Html) -> Vec<Founder> {
    let profile_sel = Selector::parse(r#"a[href*="linkedin.com/in/"]"#).unwrap();

    let mut seen_profiles: HashSet<String> = HashSet::new();
    let mut seen_names: HashSet<String> = HashSet::new();
    let mut founders = Vec::new();

    for anchor in doc.select(&profile_sel) {
        let Some(href) = anchor.value().attr("href") else { continue };
        if !seen_profiles.insert(profile_key(href)) {
            continue;
        }

        let name = resolve_slug_name(href, &seen_names)
            .or_else(|| heading_fallback(anchor, &seen_names));
        if let Some(n) = &name {
            seen_names.insert(n.clone());
        }

        founders.push(Founder {
            name,
            profile_url: href.to_string(),
            handle_url: social_handle(anchor),
        });
    }

    founders
}

/// Dedup key: the profile path, ignoring scheme/host variants, query
/// string, and trailing slash.
fn profile_key(href: &str) -> String {
    match profile_slug(href) {
        Some(slug) => format!("/in/{}", slug),
        None => {
            let end = href.find(['?', '#']).unwrap_or(href.len());
            href[..end].trim_end_matches('/').to_string()
        }
    }
}

/// Nearest heading-level text in the ancestor chain that survives the
/// section-title filter and the plausibility gate.
fn heading_fallback(anchor: ElementRef, seen_names: &HashSet<String>) -> Option<String> {
    let heading_sel = Selector::parse("h1, h2, h3, h4, h5").unwrap();

    for node in anchor.ancestors().take(MAX_ANCESTOR_LEVELS) {
        let Some(container) = ElementRef::wrap(node) else { continue };
        for heading in container.select(&heading_sel) {
            let text = heading
                .text()
                .collect::<Vec<_>>()
                .join(" ")
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ");
            if text.is_empty() || is_section_title(&text) {
                continue;
            }
            if is_plausible_name(&text, seen_names) {
                return Some(text);
            }
        }
    }
    None
}

fn is_section_title(text: &str) -> bool {
    let lower = text.to_lowercase();
    SECTION_TITLES.iter().any(|t| lower == *t)
}

/// First outbound social link in the same bounded container, skipping the
/// platform's own account.
fn social_handle(anchor: ElementRef) -> Option<String> {
    let link_sel = Selector::parse("a[href]").unwrap();

    for node in anchor.ancestors().take(MAX_ANCESTOR_LEVELS) {
        let Some(container) = ElementRef::wrap(node) else { continue };
        for link in container.select(&link_sel) {
            let Some(href) = link.value().attr("href") else { continue };
            if !is_social_profile(href) {
                continue;
            }
            if handle_of(href).is_some_and(|h| !h.eq_ignore_ascii_case(PLATFORM_ACCOUNT)) {
                return Some(href.to_string());
            }
        }
    }
    None
}

fn is_social_profile(href: &str) -> bool {
    let host = href.split("://").nth(1).unwrap_or(href);
    let host = &host[..host.find('/').unwrap_or(host.len())];
    host.contains("twitter.com") || host == "x.com" || host.ends_with(".x.com")
}

/// Account name from a social URL: the first path segment after the host.
pub fn handle_of(href: &str) -> Option<&str> {
    let after_host = href.split("://").nth(1)?;
    let path = &after_host[after_host.find('/')?..];
    let segment = path
        .trim_start_matches('/')
        .split(['/', '?', '#'])
        .next()?
        .trim_start_matches('@');
    if segment.is_empty() {
        None
    } else {
        Some(segment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names_of(founders: &[Founder]) -> Vec<Option<&str>> {
        founders.iter().map(|f| f.name.as_deref()).collect()
    }

    #[test]
    fn slug_resolution_is_primary() {
        let doc = Html::parse_document(
            r#"<body><div>
                <a href="https://www.linkedin.com/in/emre-kaplaner-7b3a3b15b/">in</a>
            </div></body>"#,
        );
        let founders = extract_founders(&doc);
        assert_eq!(names_of(&founders), vec![Some("Emre Kaplaner")]);
    }

    #[test]
    fn profile_links_dedup_by_path() {
        let doc = Html::parse_document(
            r#"<body>
                <a href="https://www.linkedin.com/in/jane-doe-91b2c3d4e">a</a>
                <a href="https://linkedin.com/in/jane-doe-91b2c3d4e/?utm_source=yc">b</a>
            </body>"#,
        );
        assert_eq!(extract_founders(&doc).len(), 1);
    }

    #[test]
    fn heading_fallback_when_slug_fails() {
        // Slug "zq" is too short to resolve; the card heading supplies the name.
        let doc = Html::parse_document(
            r#"<body><section>
                <div class="card">
                    <h3>Wei Zhang</h3>
                    <a href="https://www.linkedin.com/in/zq">profile</a>
                </div>
            </section></body>"#,
        );
        let founders = extract_founders(&doc);
        assert_eq!(names_of(&founders), vec![Some("Wei Zhang")]);
    }

    #[test]
    fn section_titles_never_become_names() {
        let doc = Html::parse_document(
            r#"<body><section>
                <h2>Active Founders</h2>
                <div><a href="https://www.linkedin.com/in/xy">profile</a></div>
            </section></body>"#,
        );
        let founders = extract_founders(&doc);
        assert_eq!(names_of(&founders), vec![None]);
    }

    #[test]
    fn social_handle_from_same_card() {
        let doc = Html::parse_document(
            r#"<body><div class="card">
                <h3>Jane Doe</h3>
                <a href="https://www.linkedin.com/in/jane-doe-91b2c3d4e">in</a>
                <a href="https://twitter.com/janedoe">tw</a>
            </div></body>"#,
        );
        let founders = extract_founders(&doc);
        assert_eq!(
            founders[0].handle_url.as_deref(),
            Some("https://twitter.com/janedoe")
        );
    }

    #[test]
    fn platform_account_is_not_a_founder_handle() {
        let doc = Html::parse_document(
            r#"<body><div class="card">
                <a href="https://www.linkedin.com/in/jane-doe-91b2c3d4e">in</a>
                <a href="https://twitter.com/ycombinator">official</a>
            </div></body>"#,
        );
        let founders = extract_founders(&doc);
        assert_eq!(founders[0].handle_url, None);
    }

    #[test]
    fn handle_of_handles_x_and_at() {
        assert_eq!(handle_of("https://x.com/@janedoe?ref=yc"), Some("janedoe"));
        assert_eq!(handle_of("https://twitter.com/janedoe/status/1"), Some("janedoe"));
        assert_eq!(handle_of("https://x.com/"), None);
    }
}
