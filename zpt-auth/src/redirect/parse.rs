//! Defensive extraction of `{code, state}` from a redirect URI.
//!
//! Custom-scheme redirects do not always arrive well-formed: depending on
//! OS and browser the scheme separator gets mangled (doubled slashes,
//! missing colon, or the whole URI prefixed with `https://`). The policy
//! is fixed: strict parse first, then an ordered list of known prefix
//! rewrites, then a last-resort regex scrape of the raw string. The
//! rewrite list is a workaround for inconsistent URI delivery and is not
//! to be extended speculatively.

use crate::error::AuthError;
use crate::redirect::AuthorizationResponse;
use regex::Regex;
use std::sync::OnceLock;
use url::Url;

/// Ordered (malformed prefix, canonical prefix) rewrites derived from the
/// canonical redirect URI. Each maps one observed corruption of
/// `scheme://rest` back to canonical form.
fn rewrite_rules(canonical: &str) -> Vec<(String, String)> {
    let Some((scheme, rest)) = canonical.split_once("://") else {
        return Vec::new();
    };

    vec![
        // zpt//auth/... (colon lost entirely)
        (format!("{scheme}//{rest}"), canonical.to_string()),
        // zpt:/auth/... (one slash dropped)
        (format!("{scheme}:/{rest}"), canonical.to_string()),
        // zpt:///auth/... (extra slash inserted)
        (format!("{scheme}:///{rest}"), canonical.to_string()),
        // https://zpt//auth/... (browser re-prefixed the custom scheme)
        (format!("https://{scheme}//{rest}"), canonical.to_string()),
        (format!("http://{scheme}//{rest}"), canonical.to_string()),
    ]
}

/// Normalize a possibly-malformed redirect URI. Already-canonical input
/// comes back unchanged (the rules are idempotent).
pub fn normalize(raw: &str, canonical: &str) -> String {
    for (pattern, replacement) in rewrite_rules(canonical) {
        if let Some(suffix) = raw.strip_prefix(&pattern) {
            return format!("{replacement}{suffix}");
        }
    }
    raw.to_string()
}

fn query_params(uri: &Url) -> (Option<String>, Option<String>) {
    let mut code = None;
    let mut state = None;
    for (key, value) in uri.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.to_string()),
            "state" => state = Some(value.to_string()),
            _ => {}
        }
    }
    (code, state)
}

fn code_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?:^|[?&#])code=([^&#\s]+)").expect("valid regex"))
}

fn state_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?:^|[?&#])state=([^&#\s]+)").expect("valid regex"))
}

fn regex_extract(raw: &str) -> (Option<String>, Option<String>) {
    let code = code_regex()
        .captures(raw)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string());
    let state = state_regex()
        .captures(raw)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string());
    (code, state)
}

/// Extract `{code, state}` from a raw redirect string.
///
/// `canonical` is the redirect URI the provider was given; it anchors the
/// rewrite rules. Ambiguous or incomplete input is a structured
/// [`AuthError::MalformedRedirect`], never a silent partial result.
pub fn extract(raw: &str, canonical: &str) -> Result<AuthorizationResponse, AuthError> {
    let raw = raw.trim();

    // Strict parse of the input as delivered.
    if let Ok(uri) = Url::parse(raw) {
        if let (Some(code), Some(state)) = query_params(&uri) {
            return Ok(AuthorizationResponse { code, state });
        }
    }

    // Known malformed prefixes, then strict parse again.
    let normalized = normalize(raw, canonical);
    if let Ok(uri) = Url::parse(&normalized) {
        if let (Some(code), Some(state)) = query_params(&uri) {
            return Ok(AuthorizationResponse { code, state });
        }
    }

    // Last resort: scrape the tokens out of the raw string. Covers bare
    // query fragments pasted without any URI at all.
    match regex_extract(raw) {
        (Some(code), Some(state)) => Ok(AuthorizationResponse { code, state }),
        (None, _) => Err(AuthError::MalformedRedirect(format!(
            "no authorization code found in {raw:?}"
        ))),
        (_, None) => Err(AuthError::MalformedRedirect(format!(
            "no state parameter found in {raw:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CANONICAL: &str = "zpt://auth/callback";

    #[test]
    fn strict_parse_extracts_code_and_state() {
        let response = extract("zpt://auth/callback?state=S1&code=C1", CANONICAL).unwrap();
        assert_eq!(response.code, "C1");
        assert_eq!(response.state, "S1");
    }

    #[test]
    fn normalization_is_idempotent_on_canonical_uris() {
        let uri = "zpt://auth/callback?state=S&code=C";
        assert_eq!(normalize(uri, CANONICAL), uri);
        assert_eq!(normalize(&normalize(uri, CANONICAL), CANONICAL), uri);
    }

    #[test]
    fn missing_colon_form_is_rewritten() {
        let response = extract("zpt//auth/callback?state=S2&code=C2", CANONICAL).unwrap();
        assert_eq!(response.code, "C2");
        assert_eq!(response.state, "S2");
    }

    #[test]
    fn single_slash_form_is_rewritten() {
        let response = extract("zpt:/auth/callback?code=C3&state=S3", CANONICAL).unwrap();
        assert_eq!(response.code, "C3");
        assert_eq!(response.state, "S3");
    }

    #[test]
    fn browser_prefixed_form_is_rewritten() {
        // Observed in the wild: the browser prepends https:// and eats the
        // scheme separator.
        let response = extract("https://zpt//auth/callback?state=S4&code=C4", CANONICAL).unwrap();
        assert_eq!(response.code, "C4");
        assert_eq!(response.state, "S4");
    }

    #[test]
    fn bare_query_fragment_falls_back_to_regex() {
        let response = extract("state=S5&code=C5", CANONICAL).unwrap();
        assert_eq!(response.code, "C5");
        assert_eq!(response.state, "S5");
    }

    #[test]
    fn missing_code_is_a_structured_error() {
        let err = extract("zpt://auth/callback?state=only", CANONICAL).unwrap_err();
        assert!(matches!(err, AuthError::MalformedRedirect(_)));
    }

    #[test]
    fn missing_state_is_a_structured_error() {
        let err = extract("zpt://auth/callback?code=only", CANONICAL).unwrap_err();
        assert!(matches!(err, AuthError::MalformedRedirect(_)));
    }

    #[test]
    fn garbage_input_is_rejected() {
        assert!(extract("not a redirect at all", CANONICAL).is_err());
    }
}
