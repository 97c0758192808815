use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use headless_chrome::{Browser, LaunchOptions, Tab};
use tracing::{debug, info, warn};

use crate::scroll::{ScrollPhase, ScrollPolicy, ScrollSampler};

const NAV_TIMEOUT: Duration = Duration::from_secs(10);
const HYDRATION_WAIT: Duration = Duration::from_secs(3);
const FIRST_LINK_WAIT: Duration = Duration::from_secs(10);
const FIRST_LINK_POLL: Duration = Duration::from_millis(500);

/// Scrolls and reports the new content height in one round trip.
const SCROLL_JS: &str =
    "window.scrollTo(0, document.body.scrollHeight); document.body.scrollHeight";

/// Count of detail links currently in the DOM, excluding query links and
/// assets that share the path prefix.
const LINK_COUNT_JS: &str = r#"
Array.from(document.querySelectorAll('a[href*="/companies/"]')).filter(a => {
    const href = a.getAttribute('href') || '';
    return href.includes('/companies/') &&
           !href.includes('companies?') &&
           !href.match(/\.(png|jpg|jpeg|gif|svg|webp|ico|css|js|json)$/i);
}).length
"#;

pub struct RenderOutcome {
    pub html: String,
    pub complete: bool,
    pub attempts: u32,
    pub link_count: u64,
}

/// One shared browser session for the whole crawl, created lazily on first
/// need. Dropping it tears the Chrome process down; navigation and
/// scrolling are inherently sequential on the single tab position.
pub struct Renderer {
    browser: Browser,
}

impl Renderer {
    /// Launch a headless session. Failure here is not fatal to the crawl;
    /// the caller degrades to a plain fetch of the listing.
    pub fn launch() -> Result<Self> {
        let mut builder = LaunchOptions::default_builder();
        builder
            .headless(true)
            .window_size(Some((1920, 1080)))
            .idle_browser_timeout(Duration::from_secs(600));
        if in_container() {
            builder.sandbox(false);
        }
        let options = builder
            .build()
            .map_err(|e| anyhow::anyhow!("launch options: {}", e))?;
        let browser = Browser::new(options).context("Failed to launch headless browser")?;
        Ok(Renderer { browser })
    }

    /// Navigate, wait for hydration, scroll until the content height is
    /// stable or the policy expires, and hand back the expanded document.
    /// Per-evaluation failures are swallowed as "no data from this query";
    /// the worst case is partial content, never an aborted crawl.
    pub fn render_listing(&self, url: &str, policy: ScrollPolicy) -> Result<RenderOutcome> {
        let tab = self.browser.new_tab().context("Failed to open tab")?;
        tab.set_default_timeout(NAV_TIMEOUT);

        // Waited navigation first; on timeout retry without waiting and
        // work with whatever the tab managed to load.
        let navigated = tab
            .navigate_to(url)
            .and_then(|_| tab.wait_until_navigated().map(|_| ()));
        if let Err(e) = navigated {
            warn!("Navigation wait failed for {}: {}; retrying without wait", url, e);
            let _ = tab.navigate_to(url);
        }

        std::thread::sleep(HYDRATION_WAIT);
        self.wait_for_first_link(&tab);

        let mut sampler = ScrollSampler::new(policy);
        let started = Instant::now();
        let mut complete = false;

        loop {
            match sampler.tick(started.elapsed()) {
                ScrollPhase::Expired => break,
                ScrollPhase::Checking => {
                    if let Some(height) = self.eval_u64(&tab, SCROLL_JS) {
                        if sampler.observe_height(height) == ScrollPhase::Stable {
                            complete = true;
                            break;
                        }
                        if let Some(count) = self.eval_u64(&tab, LINK_COUNT_JS) {
                            debug!("scroll sample: height={} links={}", height, count);
                        }
                    }
                }
                _ => {
                    let _ = tab.evaluate(SCROLL_JS, false);
                }
            }
            std::thread::sleep(sampler.pause());
        }

        let link_count = self.eval_u64(&tab, LINK_COUNT_JS).unwrap_or(0);
        let html = tab.get_content().unwrap_or_default();
        info!(
            "Scroll expansion finished after {} attempts in {:.1}s ({}); {} detail links in DOM",
            sampler.attempts(),
            started.elapsed().as_secs_f64(),
            if complete { "height stable" } else { "budget expired" },
            link_count
        );

        Ok(RenderOutcome {
            html,
            complete,
            attempts: sampler.attempts(),
            link_count,
        })
    }

    /// Bounded poll for the first detail link; the React app needs a
    /// moment before scrolling does anything useful. Failure is fine.
    fn wait_for_first_link(&self, tab: &Arc<Tab>) {
        let deadline = Instant::now() + FIRST_LINK_WAIT;
        while Instant::now() < deadline {
            if self.eval_u64(tab, LINK_COUNT_JS).is_some_and(|n| n > 0) {
                return;
            }
            std::thread::sleep(FIRST_LINK_POLL);
        }
        warn!("No detail links appeared within {:?}; continuing anyway", FIRST_LINK_WAIT);
    }

    fn eval_u64(&self, tab: &Arc<Tab>, js: &str) -> Option<u64> {
        tab.evaluate(js, false).ok()?.value?.as_u64()
    }
}

fn in_container() -> bool {
    Path::new("/.dockerenv").exists() || std::env::var("YC_HARVEST_CONTAINER").is_ok()
}

/// Degraded listing fetch for when the browser session cannot start: the
/// unrendered HTML still feeds the raw-text harvest strategy.
pub async fn fetch_listing_plain(client: &reqwest::Client, url: &str) -> Result<String> {
    let body = client
        .get(url)
        .send()
        .await?
        .text()
        .await
        .context("Failed to fetch listing without rendering")?;
    Ok(body)
}
