//! Ordered header map with case-insensitive name lookup.
//!
//! Names keep the spelling they were inserted with, which is what ends up on
//! the wire. Lookups ignore ASCII case per RFC 9110 §5.1.

use std::fmt;

/// A case-insensitive, multi-value HTTP header map.
///
/// Entries keep insertion order. [`insert`](Self::insert) appends another
/// value for a name, [`set`](Self::set) replaces every existing value.
///
/// # Examples
///
/// ```
/// use outflow::http::Headers;
///
/// let mut headers = Headers::new();
/// headers.insert("Set-Cookie", "a=1");
/// headers.insert("Set-Cookie", "b=2");
/// headers.set("Content-Type", "text/plain");
/// headers.set("content-type", "text/html; charset=utf-8");
///
/// assert_eq!(headers.get("CONTENT-TYPE"), Some("text/html; charset=utf-8"));
/// let cookies: Vec<_> = headers.get_all("set-cookie").collect();
/// assert_eq!(cookies, vec!["a=1", "b=2"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    inner: Vec<(String, String)>,
}

impl Headers {
    /// Creates an empty header map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a header map with room for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Vec::with_capacity(capacity),
        }
    }

    /// Appends a header entry. Earlier values for the same name are kept.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.inner.push((name.into(), value.into()));
    }

    /// Replaces every value for `name` with a single `value`.
    ///
    /// The new entry takes the position of the first replaced one so the
    /// relative order on the wire stays stable.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self
            .inner
            .iter()
            .position(|(k, _)| k.eq_ignore_ascii_case(&name))
        {
            Some(pos) => {
                let mut index = 0;
                self.inner.retain(|(k, _)| {
                    let keep = index <= pos || !k.eq_ignore_ascii_case(&name);
                    index += 1;
                    keep
                });
                self.inner[pos] = (name, value);
            }
            None => self.inner.push((name, value)),
        }
    }

    /// Sets `name` only when no value is present yet. Returns `true` if it was set.
    pub fn set_default(&mut self, name: impl Into<String>, value: impl Into<String>) -> bool {
        let name = name.into();
        if self.contains(&name) {
            return false;
        }
        self.inner.push((name, value.into()));
        true
    }

    /// Returns the first value for the given header name, or `None`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns every value recorded for `name`, in insertion order.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.inner
            .iter()
            .filter(move |(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Removes all entries for `name`. Returns `true` if anything was removed.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.inner.len();
        self.inner.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.inner.len() < before
    }

    /// Returns `true` if the map holds at least one entry for `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.inner.iter().any(|(k, _)| k.eq_ignore_ascii_case(name))
    }

    /// Returns the total number of entries (not unique names).
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns an iterator over all `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Appends every entry of `other`, replacing names that already exist here.
    pub fn merge_from(&mut self, other: &Headers) {
        for (name, _) in other.iter() {
            self.remove(name);
        }
        self.inner.extend(other.inner.iter().cloned());
    }
}

impl fmt::Display for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in &self.inner {
            write!(f, "{name}: {value}\r\n")?;
        }
        Ok(())
    }
}
