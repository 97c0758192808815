/// Domains never accepted as a company's own site or a founder's handle:
/// the platform itself, social networks, and map/auth/asset hosts that
/// show up as outbound links on detail pages.
pub const DENYLIST: &[&str] = &[
    "ycombinator.com",
    "workatastartup.com",
    "startupschool.org",
    "linkedin.com",
    "twitter.com",
    "x.com",
    "facebook.com",
    "instagram.com",
    "youtube.com",
    "crunchbase.com",
    "maps.google",
    "accounts.google",
    "fonts.google",
    "googleapis.com",
    "gstatic.com",
    "cloudfront.net",
];

/// The platform's own account name on social networks. A handle link that
/// points at this account belongs to the site chrome, not a founder.
pub const PLATFORM_ACCOUNT: &str = "ycombinator";

/// Substring match over the full URL or bare domain, case-insensitive.
pub fn is_denylisted(url: &str) -> bool {
    let lower = url.to_lowercase();
    DENYLIST.iter().any(|d| lower.contains(d))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_and_socials_rejected() {
        assert!(is_denylisted("https://www.ycombinator.com/companies/stripe"));
        assert!(is_denylisted("https://www.LinkedIn.com/in/someone"));
        assert!(is_denylisted("https://x.com/someone"));
    }

    #[test]
    fn ordinary_sites_pass() {
        assert!(!is_denylisted("https://www.stripe.com"));
        assert!(!is_denylisted("example.io"));
    }

    #[test]
    fn asset_hosts_rejected() {
        assert!(is_denylisted("https://d1a2b3.cloudfront.net/logo.png"));
        assert!(is_denylisted("https://maps.google.com/?q=sf"));
    }
}
