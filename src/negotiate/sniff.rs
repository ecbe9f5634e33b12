//! Content-type guessing from leading bytes.

/// Bytes inspected by [`sniff`].
pub const SNIFF_LEN: usize = 512;

const HTML_TAGS: &[&[u8]] = &[
    b"<!doctype html",
    b"<html",
    b"<head",
    b"<body",
    b"<script",
    b"<style",
    b"<title",
    b"<iframe",
    b"<table",
    b"<font",
    b"<div",
    b"<h1",
    b"<br",
    b"<p",
    b"<a",
    b"<b",
    b"<!--",
];

const MAGIC: &[(&[u8], &str)] = &[
    (b"%PDF-", "application/pdf"),
    (b"\x89PNG\r\n\x1a\n", "image/png"),
    (b"GIF87a", "image/gif"),
    (b"GIF89a", "image/gif"),
    (b"\xff\xd8\xff", "image/jpeg"),
    (b"PK\x03\x04", "application/zip"),
    (b"\x1f\x8b\x08", "application/x-gzip"),
];

/// Guesses a `Content-Type` from the first [`SNIFF_LEN`] bytes of a body.
///
/// Falls back to `text/plain; charset=utf-8` for anything that looks like
/// text and `application/octet-stream` for binary data.
///
/// # Examples
///
/// ```
/// use outflow::negotiate::sniff;
///
/// assert_eq!(sniff(b"foobar"), "text/plain; charset=utf-8");
/// assert_eq!(sniff(b"  <!DOCTYPE html><html>"), "text/html; charset=utf-8");
/// assert_eq!(sniff(b"\x00\x01\x02"), "application/octet-stream");
/// ```
pub fn sniff(data: &[u8]) -> &'static str {
    let data = &data[..data.len().min(SNIFF_LEN)];

    if let Some((_, mime)) = MAGIC.iter().find(|(magic, _)| data.starts_with(magic)) {
        return *mime;
    }

    let trimmed = trim_leading_whitespace(data);
    if HTML_TAGS.iter().any(|tag| html_tag_at_start(trimmed, tag)) {
        return "text/html; charset=utf-8";
    }
    if trimmed.starts_with(b"<?xml") {
        return "text/xml; charset=utf-8";
    }

    if data.iter().any(|&b| is_binary(b)) {
        "application/octet-stream"
    } else {
        "text/plain; charset=utf-8"
    }
}

fn trim_leading_whitespace(data: &[u8]) -> &[u8] {
    let skip = data
        .iter()
        .take_while(|b| matches!(b, b'\t' | b'\n' | b'\x0c' | b'\r' | b' '))
        .count();
    &data[skip..]
}

// The tag must be followed by a space or `>` (comments by anything).
fn html_tag_at_start(data: &[u8], tag: &[u8]) -> bool {
    if data.len() < tag.len() || !data[..tag.len()].eq_ignore_ascii_case(tag) {
        return false;
    }
    if tag == b"<!--" {
        return true;
    }
    matches!(data.get(tag.len()), Some(b' ' | b'>'))
}

fn is_binary(b: u8) -> bool {
    matches!(b, 0x00..=0x08 | 0x0b | 0x0e..=0x1a | 0x1c..=0x1f)
}
