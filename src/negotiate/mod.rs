//! Content negotiation and conditional logic.
//!
//! Pure decisions over request and response headers: whether the client
//! accepts gzip, which byte range it asked for, whether its cached copy is
//! still fresh, and how to label a body nobody labelled. The
//! [`Response`](crate::response::Response) writer strings them together.

mod conditional;
mod range;
mod sniff;

pub use conditional::{Freshness, evaluate as evaluate_conditional, range_still_valid};
pub use range::{ByteRange, RangeError, parse as parse_range};
pub use sniff::{SNIFF_LEN, sniff};

use crate::http::Headers;

/// Returns `true` if the `Accept-Encoding` list contains the `gzip` token.
///
/// Tokens are compared exactly after trimming; `;q=` parameters are ignored,
/// as is each token's position in the list.
///
/// # Examples
///
/// ```
/// use outflow::http::Headers;
/// use outflow::negotiate::gzippable;
///
/// let mut headers = Headers::new();
/// assert!(!gzippable(&headers));
/// headers.set("Accept-Encoding", "br;q=1.0, gzip;q=0.8, *;q=0.1");
/// assert!(gzippable(&headers));
/// ```
pub fn gzippable(request_headers: &Headers) -> bool {
    request_headers
        .get_all("accept-encoding")
        .flat_map(|value| value.split(','))
        .filter_map(|token| token.split(';').next())
        .any(|coding| coding.trim() == "gzip")
}

/// Returns `true` if the client lists `gzip` with `q=0`, refusing it.
///
/// # Examples
///
/// ```
/// use outflow::http::Headers;
/// use outflow::negotiate::{gzip_refused, gzippable};
///
/// let mut headers = Headers::new();
/// headers.set("Accept-Encoding", "gzip;q=0, identity");
/// assert!(gzippable(&headers));
/// assert!(gzip_refused(&headers));
/// ```
pub fn gzip_refused(request_headers: &Headers) -> bool {
    request_headers
        .get_all("accept-encoding")
        .flat_map(|value| value.split(','))
        .filter_map(|token| {
            let mut parts = token.split(';');
            let coding = parts.next()?.trim();
            (coding == "gzip").then_some(parts)
        })
        .any(|params| {
            params
                .filter_map(|param| param.split_once('='))
                .filter(|(key, _)| key.trim().eq_ignore_ascii_case("q"))
                .any(|(_, q)| q.trim().parse::<f32>().is_ok_and(|q| q == 0.0))
        })
}

/// The media type essence: everything before `;`, trimmed and lowercased.
pub fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Returns `true` for media types a minifier knows how to shrink.
pub fn minifiable(content_type: &str) -> bool {
    let essence = essence(content_type);
    matches!(
        essence.as_str(),
        "text/html"
            | "text/css"
            | "text/javascript"
            | "application/javascript"
            | "application/json"
            | "text/xml"
            | "application/xml"
            | "image/svg+xml"
    ) || essence.ends_with("+json")
        || essence.ends_with("+xml")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accepting(value: &str) -> Headers {
        let mut headers = Headers::new();
        headers.set("Accept-Encoding", value);
        headers
    }

    #[test]
    fn gzippable_token_list() {
        assert!(!gzippable(&Headers::new()));
        assert!(gzippable(&accepting("gzip")));
        assert!(!gzippable(&accepting("br")));
        assert!(gzippable(&accepting("gzip, br")));
        assert!(gzippable(&accepting("br, gzip")));
        assert!(gzippable(&accepting("br;q=1.0, gzip;q=0.8, *;q=0.1")));
    }

    #[test]
    fn gzippable_is_exact_token_match() {
        assert!(!gzippable(&accepting("x-gzip")));
        assert!(!gzippable(&accepting("GZIP")));
        assert!(!gzippable(&accepting("gzipped")));
    }

    #[test]
    fn gzippable_spans_repeated_headers() {
        let mut headers = Headers::new();
        headers.insert("Accept-Encoding", "br");
        headers.insert("Accept-Encoding", "gzip");
        assert!(gzippable(&headers));
    }

    #[test]
    fn zero_quality_refuses_gzip() {
        assert!(gzip_refused(&accepting("gzip;q=0")));
        assert!(gzip_refused(&accepting("br, gzip; Q=0.000")));
        assert!(!gzip_refused(&accepting("gzip")));
        assert!(!gzip_refused(&accepting("gzip;q=0.1")));
        assert!(!gzip_refused(&accepting("br;q=0, gzip")));
        assert!(!gzip_refused(&Headers::new()));
    }

    #[test]
    fn minifiable_families() {
        assert!(minifiable("text/html; charset=utf-8"));
        assert!(minifiable("Application/JSON"));
        assert!(minifiable("application/ld+json"));
        assert!(minifiable("image/svg+xml"));
        assert!(!minifiable("text/plain; charset=utf-8"));
        assert!(!minifiable("application/msgpack"));
    }
}
