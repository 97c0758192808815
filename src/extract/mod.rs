pub mod company;
pub mod founders;
pub mod names;

use std::sync::atomic::{AtomicUsize, Ordering};

use scraper::Html;
use tracing::warn;

use crate::cohort::{BatchFilter, Membership};
use crate::db::FetchedPage;
use founders::Founder;

/// Progress counters shared across the extraction fan-out. Extraction is
/// stateless per page; these are the only cross-page state and they are
/// updated atomically.
#[derive(Default)]
pub struct ExtractCounters {
    pub processed: AtomicUsize,
    pub skipped: AtomicUsize,
    pub dropped: AtomicUsize,
    pub founders_found: AtomicUsize,
}

impl ExtractCounters {
    pub fn processed(&self) -> usize {
        self.processed.load(Ordering::Relaxed)
    }
    pub fn skipped(&self) -> usize {
        self.skipped.load(Ordering::Relaxed)
    }
    pub fn dropped(&self) -> usize {
        self.dropped.load(Ordering::Relaxed)
    }
    pub fn founders_found(&self) -> usize {
        self.founders_found.load(Ordering::Relaxed)
    }
}

/// Everything one detail page yields before normalization.
#[derive(Debug)]
pub struct CompanyRecord {
    pub slug: String,
    pub url: String,
    pub name: String,
    pub website_raw: Option<String>,
    pub batch: Option<String>,
    pub founders: Vec<Founder>,
}

#[derive(Debug)]
pub enum PageOutcome {
    Extracted(CompanyRecord),
    SkippedCohort { slug: String, batch: Option<String> },
    Dropped { slug: String },
}

/// Turn one fetched detail page into a record, a cohort skip, or a drop.
/// Never errors; the worst case for a page is an incomplete or absent
/// record.
pub fn process_page(
    page: &FetchedPage,
    filter: &BatchFilter,
    counters: &ExtractCounters,
) -> PageOutcome {
    let doc = Html::parse_document(&page.html);

    // Detail-stage cohort gate over the page's rendered text. Only a
    // definite exclusion signal skips; no signal means included.
    let page_text: String = doc.root_element().text().collect::<Vec<_>>().join(" ");
    let batch = BatchFilter::first_signal(&page_text).map(|b| b.label());
    if filter.classify(&page_text) == Membership::Excluded {
        counters.skipped.fetch_add(1, Ordering::Relaxed);
        return PageOutcome::SkippedCohort {
            slug: page.slug.clone(),
            batch,
        };
    }

    let Some(name) = company::extract_name(&doc, &page.slug) else {
        warn!("No company name found for {}", page.url);
        counters.dropped.fetch_add(1, Ordering::Relaxed);
        return PageOutcome::Dropped {
            slug: page.slug.clone(),
        };
    };

    let website_raw = company::extract_website(&doc);
    let founders = founders::extract_founders(&doc);

    counters.processed.fetch_add(1, Ordering::Relaxed);
    counters
        .founders_found
        .fetch_add(founders.iter().filter(|f| f.name.is_some()).count(), Ordering::Relaxed);

    PageOutcome::Extracted(CompanyRecord {
        slug: page.slug.clone(),
        url: page.url.clone(),
        name,
        website_raw,
        batch,
        founders,
    })
}

// ── Tests ──
