//! Conditional request evaluation (RFC 9110 §13).

use std::time::SystemTime;

use crate::http::Headers;

/// Outcome of comparing the client's validators with the response's.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// The client's copy is current; answer `304 Not Modified`.
    NotModified,
    /// Send the full representation.
    Modified,
}

/// Evaluates `If-None-Match` and `If-Modified-Since`.
///
/// `If-None-Match` wins when present; `If-Modified-Since` is only consulted
/// without it. Unparseable dates never produce [`Freshness::NotModified`].
pub fn evaluate(request: &Headers, response: &Headers) -> Freshness {
    if let Some(candidates) = request.get("if-none-match") {
        let Some(etag) = response.get("etag") else {
            return Freshness::Modified;
        };
        let matched = candidates
            .split(',')
            .map(str::trim)
            .any(|candidate| candidate == "*" || weak_eq(candidate, etag));
        return if matched {
            Freshness::NotModified
        } else {
            Freshness::Modified
        };
    }

    match (
        date(request, "if-modified-since"),
        date(response, "last-modified"),
    ) {
        (Some(since), Some(modified)) if modified <= since => Freshness::NotModified,
        _ => Freshness::Modified,
    }
}

/// Returns `false` when an `If-Range` validator no longer matches, meaning
/// the whole body must be sent instead of the requested range.
pub fn range_still_valid(request: &Headers, response: &Headers) -> bool {
    let Some(validator) = request.get("if-range").map(str::trim) else {
        return true;
    };
    if validator.starts_with('"') || validator.starts_with("W/") {
        return response
            .get("etag")
            .is_some_and(|etag| strong_eq(validator, etag));
    }
    match (
        httpdate::parse_http_date(validator).ok(),
        date(response, "last-modified"),
    ) {
        (Some(at), Some(modified)) => at == modified,
        _ => false,
    }
}

fn date(headers: &Headers, name: &str) -> Option<SystemTime> {
    headers
        .get(name)
        .and_then(|value| httpdate::parse_http_date(value.trim()).ok())
}

fn weak_eq(a: &str, b: &str) -> bool {
    let strip = |tag: &str| tag.trim().trim_start_matches("W/").to_owned();
    strip(a) == strip(b)
}

fn strong_eq(a: &str, b: &str) -> bool {
    let (a, b) = (a.trim(), b.trim());
    !a.starts_with("W/") && !b.starts_with("W/") && a == b
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPOCH: &str = "Thu, 01 Jan 1970 00:00:00 GMT";
    const LATER: &str = "Sun, 06 Nov 1994 08:49:37 GMT";

    fn headers(pairs: &[(&str, &str)]) -> Headers {
        let mut h = Headers::new();
        for (name, value) in pairs {
            h.insert(*name, *value);
        }
        h
    }

    #[test]
    fn no_validators_is_modified() {
        assert_eq!(evaluate(&Headers::new(), &Headers::new()), Freshness::Modified);
    }

    #[test]
    fn etag_match_is_not_modified() {
        let response = headers(&[("ETag", "\"v1\"")]);
        assert_eq!(
            evaluate(&headers(&[("If-None-Match", "\"v0\", W/\"v1\"")]), &response),
            Freshness::NotModified
        );
        assert_eq!(
            evaluate(&headers(&[("If-None-Match", "*")]), &response),
            Freshness::NotModified
        );
        assert_eq!(
            evaluate(&headers(&[("If-None-Match", "\"v2\"")]), &response),
            Freshness::Modified
        );
    }

    #[test]
    fn if_none_match_overrides_date() {
        let request = headers(&[("If-None-Match", "\"v2\""), ("If-Modified-Since", LATER)]);
        let response = headers(&[("ETag", "\"v1\""), ("Last-Modified", EPOCH)]);
        assert_eq!(evaluate(&request, &response), Freshness::Modified);
    }

    #[test]
    fn modified_since() {
        let response = headers(&[("Last-Modified", EPOCH)]);
        assert_eq!(
            evaluate(&headers(&[("If-Modified-Since", LATER)]), &response),
            Freshness::NotModified
        );
        let response = headers(&[("Last-Modified", LATER)]);
        assert_eq!(
            evaluate(&headers(&[("If-Modified-Since", EPOCH)]), &response),
            Freshness::Modified
        );
        assert_eq!(
            evaluate(&headers(&[("If-Modified-Since", "yesterday")]), &response),
            Freshness::Modified
        );
    }

    #[test]
    fn if_range_validators() {
        let response = headers(&[("ETag", "\"v1\""), ("Last-Modified", EPOCH)]);
        assert!(range_still_valid(&Headers::new(), &response));
        assert!(range_still_valid(&headers(&[("If-Range", "\"v1\"")]), &response));
        assert!(!range_still_valid(&headers(&[("If-Range", "W/\"v1\"")]), &response));
        assert!(range_still_valid(&headers(&[("If-Range", EPOCH)]), &response));
        assert!(!range_still_valid(&headers(&[("If-Range", LATER)]), &response));
    }
}
