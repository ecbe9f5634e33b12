//! Encoding registry: one function per wire format.
//!
//! Each encoder turns a value into an [`Encoded`] payload carrying the
//! `Content-Type` it should be served with. Serde formats fail when the
//! value's `Serialize` impl fails; the error is wrapped in
//! [`EncodingError`] with the format that produced it.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub const JSON: &str = "application/json; charset=utf-8";
pub const XML: &str = "application/xml; charset=utf-8";
pub const PROTOBUF: &str = "application/protobuf";
pub const MSGPACK: &str = "application/msgpack";
pub const TOML: &str = "application/toml; charset=utf-8";
pub const YAML: &str = "application/yaml; charset=utf-8";
pub const TEXT: &str = "text/plain; charset=utf-8";
pub const HTML: &str = "text/html; charset=utf-8";

const XML_PROLOG: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";

/// The structured wire formats of the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Xml,
    Protobuf,
    Msgpack,
    Toml,
    Yaml,
}

impl Format {
    /// The `Content-Type` bodies in this format are served with.
    pub fn content_type(self) -> &'static str {
        match self {
            Self::Json => JSON,
            Self::Xml => XML,
            Self::Protobuf => PROTOBUF,
            Self::Msgpack => MSGPACK,
            Self::Toml => TOML,
            Self::Yaml => YAML,
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Json => "JSON",
            Self::Xml => "XML",
            Self::Protobuf => "protobuf",
            Self::Msgpack => "MessagePack",
            Self::Toml => "TOML",
            Self::Yaml => "YAML",
        })
    }
}

/// A value failed to serialize.
#[derive(Debug, Error)]
#[error("{format} encoding failed: {source}")]
pub struct EncodingError {
    pub format: Format,
    #[source]
    pub source: BoxError,
}

impl EncodingError {
    pub fn new(format: Format, source: impl Into<BoxError>) -> Self {
        Self {
            format,
            source: source.into(),
        }
    }
}

/// An encoded body and the media type describing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Encoded {
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

impl Encoded {
    fn new(content_type: &'static str, bytes: Vec<u8>) -> Self {
        Self {
            content_type,
            bytes,
        }
    }
}

/// Encodes `value` as JSON, indented with one tab per level when `pretty`.
///
/// # Examples
///
/// ```
/// use outflow::encoding;
///
/// #[derive(serde::Serialize)]
/// struct Foo { foo: &'static str }
///
/// let compact = encoding::json(&Foo { foo: "bar" }, false).unwrap();
/// assert_eq!(compact.bytes, br#"{"foo":"bar"}"#);
/// let pretty = encoding::json(&Foo { foo: "bar" }, true).unwrap();
/// assert_eq!(pretty.bytes, b"{\n\t\"foo\": \"bar\"\n}");
/// ```
pub fn json<T: Serialize + ?Sized>(value: &T, pretty: bool) -> Result<Encoded, EncodingError> {
    let fail = |e| EncodingError::new(Format::Json, e);
    let bytes = if pretty {
        let mut out = Vec::with_capacity(128);
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"\t");
        let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
        value.serialize(&mut ser).map_err(fail)?;
        out
    } else {
        serde_json::to_vec(value).map_err(fail)?
    };
    Ok(Encoded::new(Format::Json.content_type(), bytes))
}

/// Encodes `value` as an XML document with a UTF-8 prolog.
///
/// The root element is named after the serialized type (honoring
/// `#[serde(rename)]`); `pretty` indents children with one tab per level.
pub fn xml<T: Serialize + ?Sized>(value: &T, pretty: bool) -> Result<Encoded, EncodingError> {
    let mut out = String::from(XML_PROLOG);
    let mut ser = quick_xml::se::Serializer::new(&mut out);
    if pretty {
        ser.indent('\t', 1);
    }
    value
        .serialize(ser)
        .map_err(|e| EncodingError::new(Format::Xml, e))?;
    Ok(Encoded::new(Format::Xml.content_type(), out.into_bytes()))
}

/// Encodes a protobuf message in binary wire form.
pub fn protobuf<M: prost::Message>(message: &M) -> Result<Encoded, EncodingError> {
    let mut out = Vec::with_capacity(message.encoded_len());
    message
        .encode(&mut out)
        .map_err(|e| EncodingError::new(Format::Protobuf, e))?;
    Ok(Encoded::new(Format::Protobuf.content_type(), out))
}

/// Encodes `value` as MessagePack, structs as maps keyed by field name.
pub fn msgpack<T: Serialize + ?Sized>(value: &T) -> Result<Encoded, EncodingError> {
    let bytes = rmp_serde::to_vec_named(value).map_err(|e| EncodingError::new(Format::Msgpack, e))?;
    Ok(Encoded::new(Format::Msgpack.content_type(), bytes))
}

/// Encodes `value` as a TOML document. Only table-like values are representable.
pub fn toml<T: Serialize + ?Sized>(value: &T) -> Result<Encoded, EncodingError> {
    let text = ::toml::to_string(value).map_err(|e| EncodingError::new(Format::Toml, e))?;
    Ok(Encoded::new(Format::Toml.content_type(), text.into_bytes()))
}

/// Encodes `value` as a YAML document.
pub fn yaml<T: Serialize + ?Sized>(value: &T) -> Result<Encoded, EncodingError> {
    let text = serde_yaml::to_string(value).map_err(|e| EncodingError::new(Format::Yaml, e))?;
    Ok(Encoded::new(Format::Yaml.content_type(), text.into_bytes()))
}

/// Wraps plain text. Never fails.
pub fn text(body: impl Into<String>) -> Encoded {
    Encoded::new(TEXT, body.into().into_bytes())
}

/// Wraps HTML markup. Never fails.
pub fn html(markup: impl Into<String>) -> Encoded {
    Encoded::new(HTML, markup.into().into_bytes())
}
