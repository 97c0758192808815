use std::collections::HashSet;

/// Phrases that mark a candidate string as site chrome or a section title
/// rather than a person's name. Checked case-insensitively as substrings.
const NON_NAME_PHRASES: &[&str] = &[
    "founder",
    "y combinator",
    "latest news",
    "company launches",
    "demo day",
    "jobs at",
    "view all",
    "sign in",
    "sign up",
    "log in",
    "apply now",
    "privacy",
    "terms",
    "contact",
    "about us",
    "careers",
    "hacker news",
    "bookface",
    "linkedin",
    "twitter",
    "instagram",
    "facebook",
    "github",
    "profile",
    "website",
];

const STOPWORDS: &[&str] = &[
    "the", "and", "for", "with", "from", "this", "that", "our", "your", "all", "new", "more",
    "team", "meet",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenKind {
    Name,
    Identifier,
}

/// Profile slugs encode "first-last-opaqueid" with no delimiter between the
/// name and the id. The id is reliably higher-entropy (digit-dense, mixed
/// alphanumeric) than a name token, which is the only robust discriminator
/// without a name dictionary. First matching rule wins.
fn classify_token(tok: &str) -> TokenKind {
    let len = tok.chars().count();
    let digits = tok.chars().filter(|c| c.is_ascii_digit()).count();
    let letters = tok.chars().filter(|c| c.is_alphabetic()).count();
    let digit_frac = if len == 0 { 0.0 } else { digits as f64 / len as f64 };
    let leading_digit = tok.chars().next().is_some_and(|c| c.is_ascii_digit());
    let has_uppercase = tok.chars().any(|c| c.is_uppercase());

    if digits == len && len > 6 {
        return TokenKind::Identifier;
    }
    if (len >= 8 && letters > 0 && digits > 0 && digit_frac > 0.3) || (len >= 9 && digits >= 3) {
        return TokenKind::Identifier;
    }
    if len >= 8 && digits > 0 && letters <= 2 {
        return TokenKind::Identifier;
    }
    if (6..8).contains(&len)
        && digits > 0
        && letters > 0
        && (leading_digit || digit_frac > 0.4)
    {
        return TokenKind::Identifier;
    }
    if len >= 7 && digits >= 3 && !has_uppercase {
        return TokenKind::Identifier;
    }
    TokenKind::Name
}

/// The path segment immediately after the profile-root marker, with query
/// string, fragment, and trailing slash stripped.
pub fn profile_slug(profile_url: &str) -> Option<&str> {
    let after = profile_url.split("/in/").nth(1)?;
    let end = after
        .find(['/', '?', '#'])
        .unwrap_or(after.len());
    let slug = &after[..end];
    if slug.is_empty() {
        None
    } else {
        Some(slug)
    }
}

/// Reconstruct a human name from a profile URL's slug. Returns `None` when
/// the slug does not resolve to a plausible name, in which case the caller
/// falls through to the DOM heading fallback.
pub fn resolve_slug_name(profile_url: &str, seen: &HashSet<String>) -> Option<String> {
    let slug = profile_slug(profile_url)?;
    let tokens: Vec<&str> = slug.split('-').filter(|t| !t.is_empty()).collect();

    // Accumulate name tokens left to right; the opaque suffix is assumed
    // contiguous, so everything after the first identifier token is dropped.
    let mut kept: Vec<&str> = Vec::new();
    for tok in &tokens {
        if classify_token(tok) == TokenKind::Identifier {
            break;
        }
        kept.push(tok);
    }

    // Single-character tokens survive only as middle initials (strictly
    // between two longer tokens) or when the whole name is that short.
    let filtered: Vec<&str> = if kept.len() <= 2 {
        kept.clone()
    } else {
        kept.iter()
            .enumerate()
            .filter(|(i, tok)| {
                tok.chars().count() > 1
                    || (*i > 0
                        && *i + 1 < kept.len()
                        && kept[i - 1].chars().count() > 1
                        && kept[i + 1].chars().count() > 1)
            })
            .map(|(_, tok)| *tok)
            .collect()
    };

    let mut name = match filtered.len() {
        0 => return None,
        1 if filtered[0].chars().count() >= 4 => title_case(filtered[0]),
        1 => return None,
        _ => filtered
            .iter()
            .map(|t| title_case(t))
            .collect::<Vec<_>>()
            .join(" "),
    };

    // A slug like "johnsmith81739" can slip past the classifier as one
    // token; strip the trailing digit-dense suffix it carries.
    if !name.contains(' ') {
        name = strip_trailing_identifier(&name);
    }

    if is_plausible_name(&name, seen) {
        Some(name)
    } else {
        None
    }
}

fn strip_trailing_identifier(word: &str) -> String {
    let digits = word.chars().filter(|c| c.is_ascii_digit()).count();
    if digits < 2 {
        return word.to_string();
    }
    match word.find(|c: char| c.is_ascii_digit()) {
        Some(pos) if pos >= 4 => word[..pos].to_string(),
        _ => word.to_string(),
    }
}

pub(crate) fn title_case(tok: &str) -> String {
    let mut chars = tok.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

/// Plausibility gate for any candidate name, whether slug-derived or pulled
/// from a DOM heading. `seen` holds names already accepted for the page
/// (exact, case-sensitive dedup).
pub fn is_plausible_name(candidate: &str, seen: &HashSet<String>) -> bool {
    let text = candidate.trim();
    let len = text.chars().count();
    if !(2..=80).contains(&len) {
        return false;
    }

    let lower = text.to_lowercase();
    if NON_NAME_PHRASES.iter().any(|p| lower.contains(p)) {
        return false;
    }
    if lower.contains("http") || lower.contains("://") || lower.contains("www.") {
        return false;
    }
    if lower.contains(".com") || text.contains('@') {
        return false;
    }
    if seen.contains(text) {
        return false;
    }

    let tokens: Vec<&str> = text.split_whitespace().collect();
    if tokens.is_empty() || tokens.len() > 5 {
        return false;
    }
    if tokens.len() == 1 && tokens[0].chars().count() < 3 {
        return false;
    }
    if !text.chars().any(|c| c.is_alphabetic()) {
        return false;
    }
    if !text.chars().any(|c| c.is_alphabetic() && c.is_uppercase()) {
        return false;
    }
    match tokens[0].chars().next() {
        Some(first) if first.is_uppercase() => {}
        _ => return false,
    }
    if tokens
        .iter()
        .all(|t| STOPWORDS.contains(&t.to_lowercase().as_str()))
    {
        return false;
    }
    if tokens.len() == 1 {
        let tok = tokens[0];
        let digit_count = tok.chars().filter(|c| c.is_ascii_digit()).count();
        if digit_count >= 2 && !tok.chars().any(|c| c.is_uppercase()) {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(url: &str) -> Option<String> {
        resolve_slug_name(url, &HashSet::new())
    }

    #[test]
    fn drops_opaque_identifier_suffix() {
        assert_eq!(
            resolve("https://www.linkedin.com/in/emre-kaplaner-7b3a3b15b/"),
            Some("Emre Kaplaner".to_string())
        );
    }

    #[test]
    fn single_token_slug_of_four_or_more() {
        assert_eq!(
            resolve("https://linkedin.com/in/johnsmith"),
            Some("Johnsmith".to_string())
        );
    }

    #[test]
    fn short_single_token_fails() {
        assert_eq!(resolve("https://linkedin.com/in/ab"), None);
    }

    #[test]
    fn middle_initial_is_kept() {
        assert_eq!(
            resolve("https://www.linkedin.com/in/jo-x-smith"),
            Some("Jo X Smith".to_string())
        );
    }

    #[test]
    fn all_digit_slug_fails() {
        assert_eq!(resolve("https://linkedin.com/in/12345678"), None);
    }

    #[test]
    fn digit_sparse_tail_inside_single_token() {
        // Two digits is below every classifier threshold; the trailing
        // suffix strip catches it instead.
        assert_eq!(
            resolve("https://linkedin.com/in/johnsmith81"),
            Some("Johnsmith".to_string())
        );
    }

    #[test]
    fn query_and_trailing_slash_ignored() {
        assert_eq!(
            resolve("https://www.linkedin.com/in/ana-lucia-vargas-9a81b2c3/?utm=x"),
            Some("Ana Lucia Vargas".to_string())
        );
    }

    #[test]
    fn classifier_token_cases() {
        assert_eq!(classify_token("7b3a3b15b"), TokenKind::Identifier);
        assert_eq!(classify_token("1234567"), TokenKind::Identifier);
        assert_eq!(classify_token("9a81b2c3"), TokenKind::Identifier);
        assert_eq!(classify_token("kaplaner"), TokenKind::Name);
        assert_eq!(classify_token("emre"), TokenKind::Name);
        assert_eq!(classify_token("x"), TokenKind::Name);
        // Leading digit, mixed, mid length.
        assert_eq!(classify_token("4ab9cd"), TokenKind::Identifier);
        // Lowercase, long, digit-heavy.
        assert_eq!(classify_token("abc1d2e3f"), TokenKind::Identifier);
    }

    #[test]
    fn validity_rejections() {
        let seen = HashSet::new();
        assert!(!is_plausible_name("Active Founders", &seen));
        assert!(!is_plausible_name("linkedin.com/in/foo", &seen));
        assert!(!is_plausible_name("tl;dr", &seen));
        assert!(!is_plausible_name("ab12cd34", &seen));
        assert!(!is_plausible_name("a", &seen));
        assert!(!is_plausible_name("The And", &seen));
        assert!(!is_plausible_name("jane@example.org", &seen));
        assert!(!is_plausible_name("One Two Three Four Five Six", &seen));
    }

    #[test]
    fn validity_acceptances() {
        let seen = HashSet::new();
        assert!(is_plausible_name("Jane Doe", &seen));
        assert!(is_plausible_name("Müller", &seen));
        assert!(is_plausible_name("Jean-Luc Picard", &seen));
    }

    #[test]
    fn accumulated_names_dedup() {
        let mut seen = HashSet::new();
        seen.insert("Jane Doe".to_string());
        assert!(!is_plausible_name("Jane Doe", &seen));
        assert!(is_plausible_name("Jane Roe", &seen));
    }
}
