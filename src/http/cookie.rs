//! `Set-Cookie` values.

use std::fmt;
use std::time::SystemTime;

/// The `SameSite` cookie attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl SameSite {
    fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "Strict",
            Self::Lax => "Lax",
            Self::None => "None",
        }
    }
}

/// A cookie to be sent with [`Response::set_cookie`](crate::response::Response::set_cookie).
///
/// `Display` renders the header value, attributes after the pair in the
/// conventional order.
///
/// # Examples
///
/// ```
/// use outflow::http::{Cookie, SameSite};
///
/// assert_eq!(Cookie::new("foo", "bar").to_string(), "foo=bar");
///
/// let session = Cookie::new("sid", "abc")
///     .path("/")
///     .http_only(true)
///     .same_site(SameSite::Lax);
/// assert_eq!(session.to_string(), "sid=abc; Path=/; HttpOnly; SameSite=Lax");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cookie {
    name: String,
    value: String,
    path: Option<String>,
    domain: Option<String>,
    expires: Option<SystemTime>,
    max_age: Option<i64>,
    secure: bool,
    http_only: bool,
    same_site: Option<SameSite>,
}

impl Cookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// `true` when the name is a non-empty RFC 9110 token.
    ///
    /// [`Response::set_cookie`](crate::response::Response::set_cookie)
    /// drops cookies that fail this check.
    pub fn has_valid_name(&self) -> bool {
        !self.name.is_empty() && self.name.bytes().all(is_token_byte)
    }

    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    #[must_use]
    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    #[must_use]
    pub fn expires(mut self, at: SystemTime) -> Self {
        self.expires = Some(at);
        self
    }

    /// Sets `Max-Age` in seconds. Negative values render as `Max-Age=0`.
    #[must_use]
    pub fn max_age(mut self, seconds: i64) -> Self {
        self.max_age = Some(seconds);
        self
    }

    #[must_use]
    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    #[must_use]
    pub fn http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    #[must_use]
    pub fn same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = Some(same_site);
        self
    }
}

impl fmt::Display for Cookie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.name, sanitize_value(&self.value))?;
        if let Some(path) = &self.path {
            write!(f, "; Path={}", sanitize_attribute(path))?;
        }
        if let Some(domain) = &self.domain {
            write!(f, "; Domain={}", sanitize_attribute(domain.trim_start_matches('.')))?;
        }
        if let Some(expires) = self.expires {
            write!(f, "; Expires={}", httpdate::fmt_http_date(expires))?;
        }
        if let Some(max_age) = self.max_age {
            write!(f, "; Max-Age={}", max_age.max(0))?;
        }
        if self.http_only {
            f.write_str("; HttpOnly")?;
        }
        if self.secure {
            f.write_str("; Secure")?;
        }
        if let Some(same_site) = self.same_site {
            write!(f, "; SameSite={}", same_site.as_str())?;
        }
        Ok(())
    }
}

fn is_token_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}

// cookie-octet, plus space and comma which force quoting.
fn sanitize_value(value: &str) -> String {
    let kept: String = value
        .chars()
        .filter(|&c| matches!(c, ' '..='~') && !matches!(c, '"' | ';' | '\\'))
        .collect();
    if kept.contains([' ', ',']) {
        format!("\"{kept}\"")
    } else {
        kept
    }
}

fn sanitize_attribute(value: &str) -> String {
    value
        .chars()
        .filter(|&c| matches!(c, ' '..='~') && c != ';')
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};

    #[test]
    fn bare_pair() {
        assert_eq!(Cookie::new("foo", "bar").to_string(), "foo=bar");
    }

    #[test]
    fn all_attributes() {
        let cookie = Cookie::new("id", "7")
            .path("/app")
            .domain(".example.com")
            .expires(UNIX_EPOCH + Duration::from_secs(784_111_777))
            .max_age(-5)
            .secure(true)
            .http_only(true)
            .same_site(SameSite::Strict);
        assert_eq!(
            cookie.to_string(),
            "id=7; Path=/app; Domain=example.com; Expires=Sun, 06 Nov 1994 08:49:37 GMT; \
             Max-Age=0; HttpOnly; Secure; SameSite=Strict"
        );
    }

    #[test]
    fn name_must_be_a_token() {
        assert!(Cookie::new("session_id", "1").has_valid_name());
        assert!(!Cookie::new("", "1").has_valid_name());
        assert!(!Cookie::new("a;b", "1").has_valid_name());
        assert!(!Cookie::new("a b", "1").has_valid_name());
        assert!(!Cookie::new("a\r\n", "1").has_valid_name());
    }

    #[test]
    fn value_and_path_are_sanitized() {
        assert_eq!(
            Cookie::new("a", "x\r\nX-Evil: 1").to_string(),
            "a=\"xX-Evil: 1\""
        );
        assert_eq!(Cookie::new("a", "1;2\"3\\").to_string(), "a=123");
        assert_eq!(Cookie::new("a", "b,c").to_string(), "a=\"b,c\"");
        assert_eq!(
            Cookie::new("a", "1").path("/x;\ny").to_string(),
            "a=1; Path=/xy"
        );
    }
}
