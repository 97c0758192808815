use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};
use tracing::debug;
use url::Url;

use crate::cohort::{BatchFilter, Membership};

// Raw-source scan: matches both plain and JSON-escaped link paths, so
// detail links living in hydration payloads are found even when they never
// made it into anchor structure. The broad capture is narrowed by
// `canonical_id` afterwards.
static PATH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?:\\/|/)companies(?:\\/|/)([^"'<>\s\\?#)]+)"#).unwrap());

const LISTING_ROOT: &str = "https://www.ycombinator.com/companies";

/// The collection's own index name; a link whose path tail equals it is a
/// self-link, not a detail page.
const COLLECTION_INDEX: &str = "companies";

/// Sub-indexes that share the collection's path prefix.
const SUB_INDEXES: &[&str] = &["industry", "location", "founders"];

const ASSET_EXTENSIONS: &[&str] = &[
    ".png", ".jpg", ".jpeg", ".gif", ".svg", ".webp", ".ico", ".css", ".js", ".json",
];

/// Weak cohort signal read off a listing card, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CohortHint {
    Unknown,
    Matches,
    Excludes,
}

impl CohortHint {
    pub fn as_str(self) -> &'static str {
        match self {
            CohortHint::Unknown => "unknown",
            CohortHint::Matches => "matches",
            CohortHint::Excludes => "excludes",
        }
    }
}

/// A candidate detail link discovered on the index page. Immutable;
/// consumed exactly once to either skip or queue a detail fetch.
#[derive(Debug, Clone)]
pub struct ListingEntry {
    pub canonical_id: String,
    pub detail_url: String,
    pub cohort_hint: CohortHint,
}

/// Extract the ordered-unique set of candidate detail links from a listing
/// document. Three redundant strategies are unioned; dedup is by canonical
/// id with first occurrence winning, so the result is stable no matter how
/// many strategies rediscover the same company.
pub fn harvest_listing(html: &str, base_url: &str, filter: &BatchFilter) -> Vec<ListingEntry> {
    let doc = Html::parse_document(html);
    let mut seen: HashSet<String> = HashSet::new();
    let mut entries: Vec<ListingEntry> = Vec::new();

    // ── Strategy (a): structured anchors ──
    let anchor_sel = Selector::parse(r#"a[href*="/companies/"]"#).unwrap();
    for el in doc.select(&anchor_sel) {
        let Some(href) = el.value().attr("href") else { continue };
        if href.contains("/companies?") {
            continue;
        }
        let Some(id) = canonical_id(href) else { continue };
        let card_text: String = el.text().collect::<Vec<_>>().join(" ");
        push_entry(&mut entries, &mut seen, id, base_url, hint_from_text(&card_text, filter));
    }
    let structured = entries.len();

    // ── Strategy (b): card-like containers ──
    let card_sel = Selector::parse(
        r#"[class*="CompanyCard"], [class*="company-card"], [data-testid*="company"]"#,
    )
    .unwrap();
    let inner_anchor = Selector::parse("a[href]").unwrap();
    for card in doc.select(&card_sel) {
        let card_text: String = card.text().collect::<Vec<_>>().join(" ");
        let hint = hint_from_text(&card_text, filter);
        for a in card.select(&inner_anchor) {
            let Some(href) = a.value().attr("href") else { continue };
            if href.contains("/companies?") {
                continue;
            }
            let Some(id) = canonical_id(href) else { continue };
            push_entry(&mut entries, &mut seen, id, base_url, hint);
        }
    }
    let with_cards = entries.len();

    // ── Strategy (c): raw-text scan ──
    for caps in PATH_RE.captures_iter(html) {
        let Some(id) = canonical_id(&format!("/companies/{}", &caps[1])) else { continue };
        push_entry(&mut entries, &mut seen, id, base_url, CohortHint::Unknown);
    }

    debug!(
        structured,
        cards = with_cards - structured,
        raw = entries.len() - with_cards,
        total = entries.len(),
        "harvested listing"
    );
    entries
}

fn push_entry(
    entries: &mut Vec<ListingEntry>,
    seen: &mut HashSet<String>,
    id: String,
    base_url: &str,
    hint: CohortHint,
) {
    if seen.insert(id.clone()) {
        let detail_url = detail_url(base_url, &id);
        entries.push(ListingEntry {
            canonical_id: id,
            detail_url,
            cohort_hint: hint,
        });
    }
}

/// Dedup key for a detail link: the path tail after the collection root,
/// query/fragment stripped, trailing slash trimmed. `None` for self-links,
/// collection sub-indexes, and asset URLs that happen to carry the prefix.
pub fn canonical_id(href: &str) -> Option<String> {
    let tail = href.split("/companies/").nth(1)?;
    let end = tail.find(['?', '#']).unwrap_or(tail.len());
    let first = tail[..end].trim_matches('/').split('/').next()?;

    if first.is_empty() || first == COLLECTION_INDEX {
        return None;
    }
    if SUB_INDEXES.contains(&first) {
        return None;
    }
    let lower = first.to_lowercase();
    if lower.contains('.') || ASSET_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
        return None;
    }
    Some(first.to_string())
}

fn detail_url(base_url: &str, id: &str) -> String {
    Url::parse(base_url)
        .and_then(|base| base.join(&format!("/companies/{}", id)))
        .map(|u| u.to_string())
        .unwrap_or_else(|_| format!("{}/{}", LISTING_ROOT, id))
}

fn hint_from_text(text: &str, filter: &BatchFilter) -> CohortHint {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return CohortHint::Unknown;
    }
    match filter.classify(trimmed) {
        Membership::Included => CohortHint::Matches,
        Membership::Excluded => CohortHint::Excludes,
        Membership::Undetermined => CohortHint::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cohort::BatchFilter;

    const BASE: &str = "https://www.ycombinator.com/companies?batch=W25";

    fn ids(entries: &[ListingEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.canonical_id.as_str()).collect()
    }

    #[test]
    fn unions_and_dedups_strategies() {
        let html = r#"
            <a href="/companies/acme-labs"><span>Acme Labs</span><span>W25</span></a>
            <a href="/companies/acme-labs">Acme Labs again</a>
            <div class="CompanyCard"><a href="/companies/borealis">Borealis (Winter 2015)</a></div>
            <a href="/companies?batch=W25">All companies</a>
            <img src="/companies/acme-labs.png">
            <script>{"path":"\/companies\/hydration-co","x":1}</script>
        "#;
        let filter = BatchFilter::default_targets();
        let entries = harvest_listing(html, BASE, &filter);
        assert_eq!(ids(&entries), vec!["acme-labs", "borealis", "hydration-co"]);

        assert_eq!(entries[0].cohort_hint, CohortHint::Matches);
        assert_eq!(entries[1].cohort_hint, CohortHint::Excludes);
        assert_eq!(entries[2].cohort_hint, CohortHint::Unknown);
        assert_eq!(
            entries[0].detail_url,
            "https://www.ycombinator.com/companies/acme-labs"
        );
    }

    #[test]
    fn harvest_is_idempotent() {
        let html = r#"
            <a href="/companies/zeta">Zeta</a>
            <div data-testid="company-row"><a href="/companies/zeta?utm=1">Zeta</a></div>
            <script>"\/companies\/zeta"</script>
        "#;
        let filter = BatchFilter::default_targets();
        let first = harvest_listing(html, BASE, &filter);
        let second = harvest_listing(html, BASE, &filter);
        assert_eq!(ids(&first), ids(&second));
        assert_eq!(ids(&first), vec!["zeta"]);
    }

    #[test]
    fn rejects_self_link_and_sub_indexes() {
        assert_eq!(canonical_id("/companies/companies"), None);
        assert_eq!(canonical_id("/companies/industry/Fintech"), None);
        assert_eq!(canonical_id("/companies/location/san-francisco"), None);
        assert_eq!(canonical_id("/companies/"), None);
    }

    #[test]
    fn rejects_asset_urls() {
        assert_eq!(canonical_id("/companies/logo.png"), None);
        assert_eq!(canonical_id("/companies/chunk.js"), None);
        assert_eq!(canonical_id("https://cdn.site/companies/pic.webp?w=64"), None);
    }

    #[test]
    fn canonical_id_strips_query_fragment_and_slash() {
        assert_eq!(canonical_id("/companies/acme/"), Some("acme".into()));
        assert_eq!(canonical_id("/companies/acme?x=1"), Some("acme".into()));
        assert_eq!(canonical_id("/companies/acme#team"), Some("acme".into()));
        assert_eq!(
            canonical_id("https://www.ycombinator.com/companies/acme"),
            Some("acme".into())
        );
    }

    #[test]
    fn partial_html_still_harvests() {
        // A scroll that expired mid-load hands over truncated markup.
        let html = r#"<a href="/companies/early-bird">Early Bird</a><div class="CompanyCa"#;
        let filter = BatchFilter::default_targets();
        let entries = harvest_listing(html, BASE, &filter);
        assert_eq!(ids(&entries), vec!["early-bird"]);
    }

    #[test]
    fn listing_fixture() {
        let html = std::fs::read_to_string("tests/fixtures/listing.html").unwrap();
        let filter = BatchFilter::default_targets();
        let entries = harvest_listing(&html, BASE, &filter);
        let got = ids(&entries);
        assert!(got.contains(&"lumenkite"));
        assert!(got.contains(&"driftloom"));
        assert!(got.contains(&"quietriver"));
        // Hydration-only company found by the raw scan.
        assert!(got.contains(&"emberfox"));
        // Excluded-batch card keeps its hint for the fetch-stage gate.
        let old = entries.iter().find(|e| e.canonical_id == "quietriver").unwrap();
        assert_eq!(old.cohort_hint, CohortHint::Excludes);
        // No duplicates.
        let unique: HashSet<&str> = got.iter().copied().collect();
        assert_eq!(unique.len(), got.len());
    }
}
