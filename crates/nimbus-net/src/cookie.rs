//! Minimal cookie-header helpers
//!
//! The session transfer step hands the token back in a `Set-Cookie` header;
//! the name match is case-insensitive because the service is not consistent
//! about casing.

/// Extract a named cookie value from a `Set-Cookie` (or `Cookie`) header.
pub fn extract_cookie(header: &str, name: &str) -> Option<String> {
    let lower_header = header.to_ascii_lowercase();
    let needle = format!("{}=", name.to_ascii_lowercase());

    let mut search_from = 0;
    while let Some(found) = lower_header[search_from..].find(&needle) {
        let start = search_from + found;
        // Must begin the header or follow a separator, not be a name suffix
        let preceded_ok = start == 0
            || matches!(lower_header.as_bytes()[start - 1], b';' | b',' | b' ' | b'\t');
        if preceded_ok {
            let value_start = start + needle.len();
            let rest = &header[value_start..];
            let end = rest.find(';').unwrap_or(rest.len());
            let value = rest[..end].trim();
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
        search_from = start + needle.len();
    }

    None
}

/// Build a `Cookie` header value carrying the session token.
pub fn format_cookie(name: &str, token: &str) -> String {
    format!("{}={}", name, token)
}
