//! Cookie header parsing for session credentials.

/// Find `name` in a `Cookie` header of `key=value` pairs separated by `;`.
/// Pairs without `=` are skipped; an empty value counts as absent.
pub fn find_cookie<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header
        .split(';')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| key.trim() == name)
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
}

/// Pick the credential for a request: an explicit token wins over the cookie.
pub fn credential_from<'a>(
    explicit: Option<&'a str>,
    cookie_header: Option<&'a str>,
    cookie_name: &str,
) -> Option<&'a str> {
    explicit
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .or_else(|| cookie_header.and_then(|header| find_cookie(header, cookie_name)))
}
