//! `Range: bytes=...` resolution against a body of known length.

use thiserror::Error;

/// A `Range` header that cannot be honored.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeError {
    #[error("malformed range header: {0}")]
    Malformed(String),

    #[error("no requested range overlaps the {size}-byte body")]
    Unsatisfiable { size: u64 },
}

/// One resolved byte range, `start..start + length` of the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub length: u64,
}

impl ByteRange {
    /// Inclusive offset of the last byte.
    pub fn end(&self) -> u64 {
        self.start + self.length - 1
    }

    /// The `Content-Range` value for this range of a `size`-byte body.
    pub fn content_range(&self, size: u64) -> String {
        format!("bytes {}-{}/{}", self.start, self.end(), size)
    }
}

/// Resolves a `Range` header value against a body of `size` bytes.
///
/// Ranges that start past the end are dropped; if that leaves nothing the
/// header is [`RangeError::Unsatisfiable`]. Ends past the body are clamped
/// and suffix ranges (`-N`) count back from the end.
///
/// # Errors
///
/// [`RangeError::Malformed`] for anything that is not a `bytes=` range set,
/// [`RangeError::Unsatisfiable`] when no range overlaps the body.
///
/// # Examples
///
/// ```
/// use outflow::negotiate::{ByteRange, parse_range};
///
/// let ranges = parse_range("bytes=2-", 6).unwrap();
/// assert_eq!(ranges, vec![ByteRange { start: 2, length: 4 }]);
/// assert_eq!(ranges[0].content_range(6), "bytes 2-5/6");
///
/// assert!(parse_range("bytes 1-0", 6).is_err());
/// ```
pub fn parse(header: &str, size: u64) -> Result<Vec<ByteRange>, RangeError> {
    let malformed = || RangeError::Malformed(header.to_owned());

    let set = header.trim().strip_prefix("bytes=").ok_or_else(malformed)?;

    let mut ranges = Vec::new();
    let mut saw_spec = false;
    for spec in set.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        saw_spec = true;
        let (first, last) = spec.split_once('-').ok_or_else(malformed)?;
        let (first, last) = (first.trim(), last.trim());

        if first.is_empty() {
            let suffix: u64 = last.parse().map_err(|_| malformed())?;
            let length = suffix.min(size);
            if length > 0 {
                ranges.push(ByteRange {
                    start: size - length,
                    length,
                });
            }
            continue;
        }

        let start: u64 = first.parse().map_err(|_| malformed())?;
        let end = if last.is_empty() {
            None
        } else {
            let end: u64 = last.parse().map_err(|_| malformed())?;
            if start > end {
                return Err(malformed());
            }
            Some(end)
        };

        if start >= size {
            continue;
        }
        let end = end.map_or(size - 1, |end| end.min(size - 1));
        ranges.push(ByteRange {
            start,
            length: end - start + 1,
        });
    }

    if !saw_spec {
        return Err(malformed());
    }
    if ranges.is_empty() {
        return Err(RangeError::Unsatisfiable { size });
    }
    Ok(ranges)
}
