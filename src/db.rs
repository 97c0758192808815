use std::collections::HashMap;

use anyhow::Result;
use rusqlite::Connection;

use crate::harvest::ListingEntry;

const DB_PATH: &str = "data/yc_harvest.sqlite";

pub fn connect() -> Result<Connection> {
    std::fs::create_dir_all("data")?;
    let conn = Connection::open(DB_PATH)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS pages (
            id          INTEGER PRIMARY KEY,
            url         TEXT UNIQUE NOT NULL,
            slug        TEXT NOT NULL,
            cohort_hint TEXT NOT NULL DEFAULT 'unknown'
                        CHECK(cohort_hint IN ('unknown','matches','excludes')),
            visited     BOOLEAN NOT NULL DEFAULT 0,
            visited_at  TEXT,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_pages_visited ON pages(visited);
        CREATE UNIQUE INDEX IF NOT EXISTS idx_pages_slug ON pages(slug);

        CREATE TABLE IF NOT EXISTS page_data (
            id         INTEGER PRIMARY KEY,
            page_id    INTEGER NOT NULL REFERENCES pages(id),
            url        TEXT NOT NULL,
            slug       TEXT NOT NULL,
            html       TEXT,
            status     INTEGER,
            error      TEXT,
            latency_ms INTEGER,
            fetched_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_page_data_slug ON page_data(slug);

        -- Extracted records: display form plus the raw side-channel the
        -- export collaborator needs for hyperlinks.
        CREATE TABLE IF NOT EXISTS companies (
            slug        TEXT PRIMARY KEY,
            url         TEXT NOT NULL,
            name        TEXT NOT NULL,
            batch       TEXT,
            website     TEXT NOT NULL DEFAULT '',
            website_raw TEXT,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS founders (
            id           INTEGER PRIMARY KEY,
            company_slug TEXT NOT NULL REFERENCES companies(slug),
            name         TEXT,
            linkedin     TEXT,
            linkedin_raw TEXT NOT NULL,
            twitter      TEXT,
            twitter_raw  TEXT,
            UNIQUE(company_slug, linkedin_raw)
        );
        CREATE INDEX IF NOT EXISTS idx_founders_company ON founders(company_slug);

        -- Pages ruled out by the detail-stage cohort gate; kept so they are
        -- not re-extracted and so stats can report them.
        CREATE TABLE IF NOT EXISTS cohort_skips (
            slug       TEXT PRIMARY KEY,
            batch      TEXT,
            skipped_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        ",
    )?;
    Ok(())
}

// ── Queueing ──

pub fn insert_entries(conn: &Connection, entries: &[ListingEntry]) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;
    let mut count = 0;
    {
        let mut stmt = tx.prepare(
            "INSERT OR IGNORE INTO pages (url, slug, cohort_hint) VALUES (?1, ?2, ?3)",
        )?;
        for e in entries {
            count += stmt.execute(rusqlite::params![
                e.detail_url,
                e.canonical_id,
                e.cohort_hint.as_str(),
            ])?;
        }
    }
    tx.commit()?;
    Ok(count)
}

/// Unvisited queue minus the entries the listing-stage gate pruned.
pub fn fetch_unvisited(
    conn: &Connection,
    limit: Option<usize>,
) -> Result<Vec<(i64, String, String)>> {
    let sql = format!(
        "SELECT id, url, slug FROM pages
         WHERE visited = 0 AND cohort_hint != 'excludes'
         ORDER BY id{}",
        match limit {
            Some(n) => format!(" LIMIT {}", n),
            None => String::new(),
        }
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub struct FetchRow {
    pub page_id: i64,
    pub url: String,
    pub slug: String,
    pub html: Option<String>,
    pub status: Option<i32>,
    pub error: Option<String>,
    pub latency_ms: Option<i64>,
}

// ── Extraction ──

pub struct FetchedPage {
    pub page_data_id: i64,
    pub slug: String,
    pub url: String,
    pub html: String,
}

pub fn fetch_unextracted(conn: &Connection, limit: Option<usize>) -> Result<Vec<FetchedPage>> {
    let sql = format!(
        "SELECT pd.id, pd.slug, pd.url, pd.html
         FROM page_data pd
         LEFT JOIN companies c ON c.slug = pd.slug
         LEFT JOIN cohort_skips s ON s.slug = pd.slug
         WHERE pd.html IS NOT NULL AND c.slug IS NULL AND s.slug IS NULL
         ORDER BY pd.id{}",
        match limit {
            Some(n) => format!(" LIMIT {}", n),
            None => String::new(),
        }
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([], |row| {
            Ok(FetchedPage {
                page_data_id: row.get(0)?,
                slug: row.get(1)?,
                url: row.get(2)?,
                html: row.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ── Records ──

pub struct RecordRow {
    pub slug: String,
    pub url: String,
    pub name: String,
    pub batch: Option<String>,
    pub website: String,
    pub website_raw: Option<String>,
}

pub struct FounderRecordRow {
    pub company_slug: String,
    pub name: Option<String>,
    pub linkedin: Option<String>,
    pub linkedin_raw: String,
    pub twitter: Option<String>,
    pub twitter_raw: Option<String>,
}

pub struct SkipRow {
    pub slug: String,
    pub batch: Option<String>,
}

pub fn save_records(
    conn: &Connection,
    companies: &[RecordRow],
    founders: &[FounderRecordRow],
    skips: &[SkipRow],
) -> Result<()> {
    let tx = conn.unchecked_transaction()?;
    {
        let mut c_stmt = tx.prepare(
            "INSERT OR REPLACE INTO companies (slug, url, name, batch, website, website_raw)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;
        for c in companies {
            c_stmt.execute(rusqlite::params![
                c.slug, c.url, c.name, c.batch, c.website, c.website_raw,
            ])?;
        }

        let mut f_stmt = tx.prepare(
            "INSERT OR IGNORE INTO founders
             (company_slug, name, linkedin, linkedin_raw, twitter, twitter_raw)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;
        for f in founders {
            f_stmt.execute(rusqlite::params![
                f.company_slug, f.name, f.linkedin, f.linkedin_raw, f.twitter, f.twitter_raw,
            ])?;
        }

        let mut s_stmt = tx.prepare(
            "INSERT OR IGNORE INTO cohort_skips (slug, batch) VALUES (?1, ?2)",
        )?;
        for s in skips {
            s_stmt.execute(rusqlite::params![s.slug, s.batch])?;
        }
    }
    tx.commit()?;
    Ok(())
}

// ── Record output ──

#[derive(serde::Serialize)]
pub struct FounderOut {
    pub name: Option<String>,
    pub linkedin: Option<String>,
    pub linkedin_raw: String,
    pub twitter: Option<String>,
    pub twitter_raw: Option<String>,
}

#[derive(serde::Serialize)]
pub struct RecordOut {
    pub slug: String,
    pub url: String,
    pub name: String,
    pub batch: Option<String>,
    pub website: String,
    pub website_raw: Option<String>,
    pub founders: Vec<FounderOut>,
}

pub fn fetch_records(conn: &Connection, limit: Option<usize>) -> Result<Vec<RecordOut>> {
    let sql = format!(
        "SELECT slug, url, name, batch, website, website_raw
         FROM companies ORDER BY slug{}",
        match limit {
            Some(n) => format!(" LIMIT {}", n),
            None => String::new(),
        }
    );
    let mut stmt = conn.prepare(&sql)?;
    let mut records = stmt
        .query_map([], |row| {
            Ok(RecordOut {
                slug: row.get(0)?,
                url: row.get(1)?,
                name: row.get(2)?,
                batch: row.get(3)?,
                website: row.get(4)?,
                website_raw: row.get(5)?,
                founders: Vec::new(),
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut f_stmt = conn.prepare(
        "SELECT company_slug, name, linkedin, linkedin_raw, twitter, twitter_raw
         FROM founders ORDER BY id",
    )?;
    let mut by_slug: HashMap<String, Vec<FounderOut>> = HashMap::new();
    let founder_rows = f_stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            FounderOut {
                name: row.get(1)?,
                linkedin: row.get(2)?,
                linkedin_raw: row.get(3)?,
                twitter: row.get(4)?,
                twitter_raw: row.get(5)?,
            },
        ))
    })?;
    for row in founder_rows {
        let (slug, founder) = row?;
        by_slug.entry(slug).or_default().push(founder);
    }

    for record in &mut records {
        if let Some(founders) = by_slug.remove(&record.slug) {
            record.founders = founders;
        }
    }
    Ok(records)
}

// ── Stats ──

pub struct Stats {
    pub total: usize,
    pub visited: usize,
    pub unvisited: usize,
    pub pruned: usize,
    pub fetched: usize,
    pub errors: usize,
    pub extracted: usize,
    pub skipped: usize,
}

pub fn get_stats(conn: &Connection) -> Result<Stats> {
    let total: usize = conn.query_row("SELECT COUNT(*) FROM pages", [], |r| r.get(0))?;
    let visited: usize =
        conn.query_row("SELECT COUNT(*) FROM pages WHERE visited = 1", [], |r| r.get(0))?;
    let pruned: usize = conn.query_row(
        "SELECT COUNT(*) FROM pages WHERE cohort_hint = 'excludes'",
        [],
        |r| r.get(0),
    )?;
    let fetched: usize = conn.query_row("SELECT COUNT(*) FROM page_data", [], |r| r.get(0))?;
    let errors: usize = conn.query_row(
        "SELECT COUNT(*) FROM page_data WHERE error IS NOT NULL",
        [],
        |r| r.get(0),
    )?;
    let extracted: usize =
        conn.query_row("SELECT COUNT(*) FROM companies", [], |r| r.get(0))?;
    let skipped: usize =
        conn.query_row("SELECT COUNT(*) FROM cohort_skips", [], |r| r.get(0))?;
    Ok(Stats {
        total,
        visited,
        unvisited: total - visited,
        pruned,
        fetched,
        errors,
        extracted,
        skipped,
    })
}

// ── Tests ──
