mod cohort;
mod db;
mod denylist;
mod extract;
mod fetch;
mod harvest;
mod normalize;
mod render;
mod scroll;
mod sitemap;

use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};
use tracing::{info, warn};

use cohort::BatchFilter;
use harvest::CohortHint;
use scroll::ScrollPolicy;

const LISTING_ROOT: &str = "https://www.ycombinator.com/companies";

#[derive(Parser)]
#[command(name = "yc_harvest", about = "YC company directory crawler and record extractor")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the listing, harvest detail links, populate the queue
    Init {
        /// Listing start URL, repeatable (default: companies directory
        /// filtered to the target batches)
        #[arg(long)]
        url: Vec<String>,
        /// Target batch, e.g. "Winter 2025" or "W25" (repeatable)
        #[arg(short, long)]
        batch: Vec<String>,
        /// Seed from the companies sitemap instead of the rendered listing
        #[arg(long)]
        sitemap: bool,
    },
    /// Fetch unvisited detail pages
    Fetch {
        /// Max pages to fetch (default: all unvisited)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Extract records from fetched detail pages
    Extract {
        /// Max pages to process (default: all unprocessed)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        /// Target batch for the detail-stage gate (repeatable)
        #[arg(short, long)]
        batch: Vec<String>,
    },
    /// Init + fetch + extract in one pipeline
    Run {
        /// Max detail pages to fetch+extract
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        #[arg(short, long)]
        batch: Vec<String>,
        #[arg(long)]
        url: Vec<String>,
        #[arg(long)]
        sitemap: bool,
    },
    /// Show crawl statistics
    Stats,
    /// Extracted records table
    Records {
        /// Max rows to display
        #[arg(short = 'n', long, default_value = "50")]
        limit: usize,
    },
    /// Emit the record stream as JSONL (display plus raw link forms)
    Export {
        #[arg(short, long, default_value = "data/records.jsonl")]
        out: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { url, batch, sitemap } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let filter = BatchFilter::from_args(&batch)?;
            init_queue(&conn, url, &filter, sitemap).await?;
            Ok(())
        }
        Commands::Fetch { limit } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let pages = db::fetch_unvisited(&conn, limit)?;
            if pages.is_empty() {
                println!("No unvisited pages. Run 'init' first or all pages are fetched.");
                return Ok(());
            }
            println!("Fetching {} detail pages (streaming to DB)...", pages.len());
            let stats = fetch::fetch_pages_streaming(&conn, pages).await?;
            println!(
                "Done: {} fetched ({} ok, {} errors).",
                stats.total, stats.ok, stats.errors
            );
            Ok(())
        }
        Commands::Extract { limit, batch } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let filter = BatchFilter::from_args(&batch)?;
            let pages = db::fetch_unextracted(&conn, limit)?;
            if pages.is_empty() {
                println!("No unprocessed pages. Run 'fetch' first.");
                return Ok(());
            }
            println!("Extracting {} pages...", pages.len());
            extract_pages(&conn, &pages, &filter)?;
            Ok(())
        }
        Commands::Run { limit, batch, url, sitemap } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let filter = BatchFilter::from_args(&batch)?;

            // Phase 1: harvest the listing into the queue
            init_queue(&conn, url, &filter, sitemap).await?;

            // Phase 2: fetch
            let pages = db::fetch_unvisited(&conn, limit)?;
            if pages.is_empty() {
                println!("Queue is empty; nothing to fetch.");
                return Ok(());
            }
            let t_fetch = Instant::now();
            println!("Pipeline: fetching {} detail pages...", pages.len());
            let stats = fetch::fetch_pages_streaming(&conn, pages).await?;
            println!(
                "Fetched {} pages ({} ok, {} errors) in {:.1}s",
                stats.total, stats.ok, stats.errors, t_fetch.elapsed().as_secs_f64()
            );

            // Phase 3: extract
            let unextracted = db::fetch_unextracted(&conn, None)?;
            if unextracted.is_empty() {
                println!("Nothing to extract (all fetched pages had errors).");
                return Ok(());
            }
            println!("Extracting {} pages...", unextracted.len());
            extract_pages(&conn, &unextracted, &filter)?;
            Ok(())
        }
        Commands::Stats => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let s = db::get_stats(&conn)?;
            println!("Total queued:   {}", s.total);
            println!("Visited:        {}", s.visited);
            println!("Unvisited:      {}", s.unvisited);
            println!("Listing-pruned: {}", s.pruned);
            println!("Fetched:        {}", s.fetched);
            println!("Errors:         {}", s.errors);
            println!("Extracted:      {}", s.extracted);
            println!("Cohort-skipped: {}", s.skipped);
            Ok(())
        }
        Commands::Records { limit } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let records = db::fetch_records(&conn, Some(limit))?;
            if records.is_empty() {
                println!("No records extracted yet.");
                return Ok(());
            }

            println!(
                "{:>3} | {:<22} | {:<12} | {:<26} | {:<30} | {:<20}",
                "#", "Company", "Batch", "Website", "Founders", "Handles"
            );
            println!("{}", "-".repeat(126));
            for (i, r) in records.iter().enumerate() {
                let founders = join_founder_names(r);
                let handles = join_founder_handles(r);
                println!(
                    "{:>3} | {:<22} | {:<12} | {:<26} | {:<30} | {:<20}",
                    i + 1,
                    truncate(&r.name, 22),
                    truncate(r.batch.as_deref().unwrap_or("-"), 12),
                    truncate(&r.website, 26),
                    truncate(&founders, 30),
                    truncate(&handles, 20),
                );
            }
            println!("\n{} records | slug: /companies/<slug>", records.len());
            Ok(())
        }
        Commands::Export { out } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            let records = db::fetch_records(&conn, None)?;
            if records.is_empty() {
                println!("No records to export.");
                return Ok(());
            }
            let count = export_jsonl(&records, &out)?;
            println!("Exported {} records to {}", count, out.display());
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

/// Harvest the start listings and queue their entries. Entries the
/// listing-stage gate marked as excluded are queued with their hint so the
/// fetch stage prunes them; everything else proceeds.
async fn init_queue(
    conn: &rusqlite::Connection,
    urls: Vec<String>,
    filter: &BatchFilter,
    use_sitemap: bool,
) -> anyhow::Result<()> {
    let client = fetch::http_client()?;

    let entries = if use_sitemap {
        sitemap::fetch_entries(&client).await?
    } else {
        let urls = if urls.is_empty() {
            vec![listing_url_for(filter)]
        } else {
            urls
        };

        let mut entries = Vec::new();
        for (listing_url, rendered) in render_listings(urls).await? {
            let html = match rendered {
                Ok(outcome) if !outcome.html.is_empty() => {
                    if !outcome.complete {
                        info!(
                            "Scroll budget expired before {} stabilized; using partial content",
                            listing_url
                        );
                    }
                    outcome.html
                }
                other => {
                    if let Err(e) = other {
                        warn!("Rendering failed for {} ({}); fetching without JavaScript", listing_url, e);
                    } else {
                        warn!("Rendering returned empty content for {}; fetching without JavaScript", listing_url);
                    }
                    match render::fetch_listing_plain(&client, &listing_url).await {
                        Ok(body) => body,
                        Err(e) => {
                            warn!("Listing fetch failed for {}: {}", listing_url, e);
                            continue;
                        }
                    }
                }
            };
            entries.extend(harvest::harvest_listing(&html, &listing_url, filter));
        }

        if entries.is_empty() {
            warn!("Listings yielded no entries; falling back to sitemap seeding");
            entries = sitemap::fetch_entries(&client).await?;
        }
        entries
    };

    let pruned = entries
        .iter()
        .filter(|e| e.cohort_hint == CohortHint::Excludes)
        .count();
    let inserted = db::insert_entries(conn, &entries)?;
    println!(
        "Queued {} new detail pages ({} found, {} cohort-pruned at listing stage)",
        inserted,
        entries.len(),
        pruned
    );
    Ok(())
}

/// One rendering session shared across every start URL, torn down when the
/// blocking task returns. If the browser cannot start, each listing is
/// reported failed and the caller degrades to unrendered fetches.
async fn render_listings(
    urls: Vec<String>,
) -> anyhow::Result<Vec<(String, anyhow::Result<render::RenderOutcome>)>> {
    let rendered = tokio::task::spawn_blocking(move || match render::Renderer::launch() {
        Ok(renderer) => urls
            .into_iter()
            .map(|u| {
                let outcome = renderer.render_listing(&u, ScrollPolicy::default());
                (u, outcome)
            })
            .collect(),
        Err(e) => {
            let msg = e.to_string();
            urls.into_iter()
                .map(|u| (u, Err(anyhow::anyhow!("browser session unavailable: {}", msg))))
                .collect::<Vec<_>>()
        }
    })
    .await?;
    Ok(rendered)
}

/// Listing URL with the target batches as query facets, matching how the
/// directory itself filters.
fn listing_url_for(filter: &BatchFilter) -> String {
    match url::Url::parse(LISTING_ROOT) {
        Ok(mut u) => {
            {
                let mut pairs = u.query_pairs_mut();
                for label in filter.target_labels() {
                    pairs.append_pair("batch", &label);
                }
            }
            u.to_string()
        }
        Err(_) => LISTING_ROOT.to_string(),
    }
}

fn extract_pages(
    conn: &rusqlite::Connection,
    pages: &[db::FetchedPage],
    filter: &BatchFilter,
) -> anyhow::Result<()> {
    use indicatif::{ProgressBar, ProgressStyle};
    use rayon::prelude::*;

    let pb = ProgressBar::new(pages.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")?
            .progress_chars("#>-"),
    );

    let counters = extract::ExtractCounters::default();

    for chunk in pages.chunks(200) {
        let outcomes: Vec<_> = chunk
            .par_iter()
            .map(|p| extract::process_page(p, filter, &counters))
            .collect();

        let mut companies = Vec::new();
        let mut founders = Vec::new();
        let mut skips = Vec::new();

        for outcome in outcomes {
            match outcome {
                extract::PageOutcome::Extracted(record) => {
                    let (company, founder_rows) = normalize_record(record);
                    companies.push(company);
                    founders.extend(founder_rows);
                }
                extract::PageOutcome::SkippedCohort { slug, batch } => {
                    skips.push(db::SkipRow { slug, batch });
                }
                extract::PageOutcome::Dropped { .. } => {}
            }
        }

        db::save_records(conn, &companies, &founders, &skips)?;
        pb.inc(chunk.len() as u64);
    }

    pb.finish_and_clear();
    println!(
        "Extracted {} records ({} named founders); {} cohort-skipped, {} dropped.",
        counters.processed(),
        counters.founders_found(),
        counters.skipped(),
        counters.dropped(),
    );
    Ok(())
}

/// Normalization boundary: raw extraction output becomes display values,
/// with the raw URLs retained alongside for export hyperlinks.
fn normalize_record(record: extract::CompanyRecord) -> (db::RecordRow, Vec<db::FounderRecordRow>) {
    let website = record
        .website_raw
        .as_deref()
        .and_then(normalize::format_website)
        .unwrap_or_default();

    let founders = record
        .founders
        .into_iter()
        .map(|f| {
            let linkedin = Some(normalize::format_profile_links(&f.profile_url))
                .filter(|s| !s.is_empty());
            let twitter = f.handle_url.as_deref().and_then(normalize::format_handle);
            db::FounderRecordRow {
                company_slug: record.slug.clone(),
                name: f
                    .name
                    .map(|n| normalize::clean_founder_name(&n))
                    .filter(|n| !n.is_empty()),
                linkedin,
                linkedin_raw: f.profile_url,
                twitter,
                twitter_raw: f.handle_url,
            }
        })
        .collect();

    let company = db::RecordRow {
        slug: record.slug,
        url: record.url,
        name: record.name,
        batch: record.batch,
        website,
        website_raw: record.website_raw,
    };
    (company, founders)
}

fn join_founder_names(record: &db::RecordOut) -> String {
    record
        .founders
        .iter()
        .filter_map(|f| f.name.as_deref())
        .collect::<Vec<_>>()
        .join(", ")
}

fn join_founder_profiles(record: &db::RecordOut) -> String {
    record
        .founders
        .iter()
        .filter_map(|f| f.linkedin.as_deref())
        .collect::<Vec<_>>()
        .join(", ")
}

fn join_founder_handles(record: &db::RecordOut) -> String {
    record
        .founders
        .iter()
        .filter_map(|f| f.twitter.as_deref())
        .collect::<Vec<_>>()
        .join(", ")
}

/// One JSON object per record: the display strings the exporter shows, the
/// per-founder tuples, and the raw URLs its hyperlinks are built from.
fn export_jsonl(records: &[db::RecordOut], out: &PathBuf) -> anyhow::Result<usize> {
    if let Some(parent) = out.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(out)?;
    let mut writer = std::io::BufWriter::new(file);
    let exported_at = chrono::Utc::now().to_rfc3339();

    for r in records {
        let line = serde_json::json!({
            "slug": r.slug,
            "url": r.url,
            "company_name": r.name,
            "batch": r.batch,
            "company_website": r.website,
            "company_website_raw": r.website_raw,
            "founders_name": join_founder_names(r),
            "founders_linkedin": join_founder_profiles(r),
            "founders_twitter": join_founder_handles(r),
            "founders": &r.founders,
            "exported_at": exported_at,
        });
        writeln!(writer, "{}", line)?;
    }
    Ok(records.len())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
