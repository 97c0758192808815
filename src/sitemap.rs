use anyhow::{Context, Result};
use tracing::info;

use crate::harvest::{canonical_id, CohortHint, ListingEntry};

const COMPANIES_SITEMAP_URL: &str = "https://www.ycombinator.com/companies/sitemap";

/// Sitemap seeding: the fallback harvest source when the rendered listing
/// yields nothing (or `init --sitemap` asks for it outright). Entries carry
/// no cohort hint; the detail-stage gate decides membership.
pub async fn fetch_entries(client: &reqwest::Client) -> Result<Vec<ListingEntry>> {
    info!("Fetching companies sitemap: {}", COMPANIES_SITEMAP_URL);
    let xml = client
        .get(COMPANIES_SITEMAP_URL)
        .send()
        .await?
        .text()
        .await
        .context("Failed to fetch companies sitemap")?;

    let entries = parse_entries(&xml);
    info!("Company pages in sitemap: {}", entries.len());
    Ok(entries)
}

/// Pull every <loc> URL out of a urlset document and keep the ones that
/// canonicalize to a company detail page.
fn parse_entries(xml: &str) -> Vec<ListingEntry> {
    let mut reader = quick_xml::Reader::from_str(xml);
    let mut entries = Vec::new();
    let mut in_loc = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(e)) if e.name().as_ref() == b"loc" => {
                in_loc = true;
            }
            Ok(quick_xml::events::Event::Text(e)) if in_loc => {
                if let Ok(url) = e.unescape() {
                    if let Some(id) = canonical_id(&url) {
                        entries.push(ListingEntry {
                            detail_url: url.trim().to_string(),
                            canonical_id: id,
                            cohort_hint: CohortHint::Unknown,
                        });
                    }
                }
            }
            Ok(quick_xml::events::Event::End(e)) if e.name().as_ref() == b"loc" => {
                in_loc = false;
            }
            Ok(quick_xml::events::Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
        buf.clear();
    }
    entries
}
