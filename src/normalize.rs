use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::denylist::{is_denylisted, PLATFORM_ACCOUNT};
use crate::extract::founders::handle_of;
use crate::extract::names::profile_slug;

static DOMAIN_LIKE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9.-]*\.[A-Za-z]{2,}$").unwrap());
static EMBEDDED_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(https?://\S+|www\.\S+)").unwrap());
static PLATFORM_MENTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(on\s+)?(linkedin|twitter)\b:?").unwrap());
static DUP_SEPARATORS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[,;|]{2,}").unwrap());

/// Canonical display form of a company website: bare host with a forced
/// `www.` prefix. The caller keeps the raw URL alongside; export
/// hyperlinks are built from the raw form, never re-derived from this one.
pub fn format_website(raw: &str) -> Option<String> {
    let host = extract_host(raw)?;
    let bare = host.strip_prefix("www.").unwrap_or(&host);
    let display = format!("www.{}", bare);
    // Re-check after extraction: the raw link may have smuggled in a
    // denylisted domain that earlier selection missed.
    if is_denylisted(&display) {
        None
    } else {
        Some(display)
    }
}

fn extract_host(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(url) = Url::parse(trimmed) {
        return url.host_str().map(|h| h.to_lowercase());
    }
    if DOMAIN_LIKE_RE.is_match(trimmed) {
        return Some(trimmed.to_lowercase());
    }
    None
}

/// Presentation cleanup for a founder name pulled out of loose markup.
pub fn clean_founder_name(raw: &str) -> String {
    let stripped = EMBEDDED_URL_RE.replace_all(raw, " ");
    let stripped = PLATFORM_MENTION_RE.replace_all(&stripped, " ");
    let collapsed = DUP_SEPARATORS_RE.replace_all(&stripped, ",");
    collapsed
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_matches(|c: char| matches!(c, ',' | ';' | '|' | '(' | ')') || c.is_whitespace())
        .to_string()
}

/// `linkedin.com/in/<username>` short form. Comma-joined multi-value input
/// is formatted element-wise; values with no recognizable username drop out.
pub fn format_profile_links(raw: &str) -> String {
    raw.split(',')
        .filter_map(|part| format_profile_link(part.trim()))
        .collect::<Vec<_>>()
        .join(", ")
}

fn format_profile_link(one: &str) -> Option<String> {
    let user = profile_slug(one)?;
    if user.is_empty() {
        None
    } else {
        Some(format!("linkedin.com/in/{}", user))
    }
}

/// `@username` short form for social handles. Accepts full profile URLs or
/// bare handles; the platform's own account never survives. Comma-joined
/// multi-value supported.
pub fn format_handles(raw: &str) -> String {
    raw.split(',')
        .filter_map(|part| format_handle(part.trim()))
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn format_handle(one: &str) -> Option<String> {
    if one.is_empty() {
        return None;
    }
    let user = if one.contains("://") {
        handle_of(one)?.to_string()
    } else {
        // Strip any leading @ before re-adding so the form never doubles.
        one.trim_start_matches('@').to_string()
    };
    if user.is_empty() || user.eq_ignore_ascii_case(PLATFORM_ACCOUNT) {
        return None;
    }
    Some(format!("@{}", user))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn website_canonical_form() {
        assert_eq!(
            format_website("https://www.example.com/path?x=1").as_deref(),
            Some("www.example.com")
        );
        assert_eq!(format_website("https://example.com").as_deref(), Some("www.example.com"));
        assert_eq!(format_website("example.com").as_deref(), Some("www.example.com"));
    }

    #[test]
    fn website_denylist_blanks_field() {
        assert_eq!(format_website("https://www.ycombinator.com/companies/acme"), None);
        assert_eq!(format_website("linkedin.com"), None);
    }

    #[test]
    fn website_garbage_is_dropped() {
        assert_eq!(format_website("not a url"), None);
        assert_eq!(format_website(""), None);
    }

    #[test]
    fn founder_name_cleanup() {
        assert_eq!(
            clean_founder_name("Jane  Doe   (https://janedoe.dev)"),
            "Jane Doe"
        );
        assert_eq!(clean_founder_name("Jane Doe on LinkedIn"), "Jane Doe");
        assert_eq!(clean_founder_name("Jane,, Doe"), "Jane, Doe");
    }

    #[test]
    fn profile_link_short_form() {
        assert_eq!(
            format_profile_links("https://www.linkedin.com/in/jane-doe-91b2c3d4e/?utm=x"),
            "linkedin.com/in/jane-doe-91b2c3d4e"
        );
    }

    #[test]
    fn profile_links_multi_value() {
        let joined = "https://linkedin.com/in/jane, not-a-profile, https://www.linkedin.com/in/wei/";
        assert_eq!(
            format_profile_links(joined),
            "linkedin.com/in/jane, linkedin.com/in/wei"
        );
    }

    #[test]
    fn handle_short_form_never_doubles() {
        assert_eq!(format_handle("@janedoe").as_deref(), Some("@janedoe"));
        assert_eq!(format_handle("janedoe").as_deref(), Some("@janedoe"));
        assert_eq!(
            format_handle("https://twitter.com/janedoe").as_deref(),
            Some("@janedoe")
        );
        assert_eq!(
            format_handle("https://x.com/@janedoe").as_deref(),
            Some("@janedoe")
        );
    }

    #[test]
    fn platform_account_dropped() {
        assert_eq!(format_handle("https://twitter.com/ycombinator"), None);
        assert_eq!(format_handle("@ycombinator"), None);
    }

    #[test]
    fn handles_multi_value() {
        assert_eq!(
            format_handles("@janedoe, https://x.com/weiz, @ycombinator"),
            "@janedoe, @weiz"
        );
    }
}
