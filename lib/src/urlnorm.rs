use url::Url;

/// Produce the canonical form of a URL used for equality and storage.
///
/// Rules:
/// - unparseable input falls back to the lowercased, trimmed original
/// - host is lowercased; path case is preserved
/// - default ports (80/http, 443/https) are dropped
/// - one trailing slash is removed; a bare "/" path is omitted entirely,
///   so `https://x.com/` and `https://x.com` collapse to the same key
/// - query and fragment are preserved verbatim, order-sensitive
pub fn normalize_url(raw: &str) -> String {
    let trimmed = raw.trim();
    let parsed = match Url::parse(trimmed) {
        Ok(u) => u,
        Err(_) => return trimmed.to_lowercase(),
    };

    let host = match parsed.host_str() {
        Some(h) => h.to_ascii_lowercase(),
        None => return trimmed.to_lowercase(),
    };

    let scheme = parsed.scheme();
    let mut out = format!("{}://{}", scheme, host);

    if let Some(port) = parsed.port() {
        let default = match scheme {
            "http" => Some(80),
            "https" => Some(443),
            _ => None,
        };
        if default != Some(port) {
            out.push(':');
            out.push_str(&port.to_string());
        }
    }

    let path = parsed.path();
    let path = if path == "/" {
        ""
    } else {
        path.strip_suffix('/').unwrap_or(path)
    };
    out.push_str(path);

    if let Some(query) = parsed.query() {
        out.push('?');
        out.push_str(query);
    }
    if let Some(fragment) = parsed.fragment() {
        out.push('#');
        out.push_str(fragment);
    }

    out
}

/// Host of a URL with any leading "www." stripped, lowercased. Empty for
/// unparseable input.
pub fn host_of(raw: &str) -> String {
    match Url::parse(raw.trim()) {
        Ok(u) => {
            let host = u.host_str().unwrap_or("").to_ascii_lowercase();
            host.strip_prefix("www.").unwrap_or(&host).to_string()
        }
        Err(_) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("https://x.com/", "https://x.com")]
    #[case("https://x.com", "https://x.com")]
    #[case("HTTPS://X.COM/", "https://x.com")]
    #[case("http://example.com:80/page", "http://example.com/page")]
    #[case("https://example.com:443/page", "https://example.com/page")]
    #[case("https://example.com:8443/page", "https://example.com:8443/page")]
    #[case("https://example.com/a/b/", "https://example.com/a/b")]
    #[case("https://Example.COM/CaseSensitive/Path", "https://example.com/CaseSensitive/Path")]
    #[case("https://example.com/?b=2&a=1", "https://example.com?b=2&a=1")]
    #[case("https://example.com/page#Section", "https://example.com/page#Section")]
    #[case("  https://example.com/page  ", "https://example.com/page")]
    fn test_normalize(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize_url(input), expected);
    }

    #[test]
    fn test_trailing_slash_duplicates_collapse() {
        let a = normalize_url("https://x.com/");
        let b = normalize_url("https://x.com");
        let c = normalize_url("HTTPS://X.COM/");
        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(a, "https://x.com");
    }

    #[test]
    fn test_unparseable_falls_back_to_lowercase_trim() {
        assert_eq!(normalize_url("  Not A Url  "), "not a url");
    }

    #[test]
    fn test_query_order_is_significant() {
        assert_ne!(
            normalize_url("https://x.com/p?a=1&b=2"),
            normalize_url("https://x.com/p?b=2&a=1")
        );
    }

    #[test]
    fn test_extension_scheme_preserved() {
        assert_eq!(
            normalize_url("chrome-extension://abcdef/options.html"),
            "chrome-extension://abcdef/options.html"
        );
    }

    #[rstest]
    #[case("https://www.example.com/page", "example.com")]
    #[case("https://sub.example.com", "sub.example.com")]
    #[case("not a url", "")]
    fn test_host_of(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(host_of(input), expected);
    }
}
