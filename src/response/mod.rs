//! The response writer applications interact with.
//!
//! A [`Response`] collects a status and headers, then exactly one terminal
//! write turns a body source into bytes on a [`ResponseSink`]. Terminal
//! writes are [`write`](Response::write), [`write_stream`](Response::write_stream),
//! [`write_string`](Response::write_string), [`write_html`](Response::write_html),
//! the `write_<format>` encoders, [`render`](Response::render) and
//! [`redirect`](Response::redirect).
//!
//! ## Write path
//!
//! For a seekable body the writer, in order:
//!
//! 1. minifies it when `minify` is on and the media type is minifiable,
//! 2. measures it by seeking to the end and back,
//! 3. labels it (sniffed or `text/plain`) when no `Content-Type` is set,
//! 4. answers `304` when the client's validators are still fresh,
//! 5. narrows it to the requested byte range (`206`),
//! 6. compresses it when the client accepts gzip,
//! 7. commits the headers and copies the body through a pooled buffer.
//!
//! `HEAD` requests get identical headers and no body. Encoded bodies
//! (`write_json` and friends) skip steps 4 and 5. Deferred callbacks run
//! when the terminal write returns, whatever its outcome.

mod deferred;
mod error;
mod sink;

use std::io::{Cursor, SeekFrom, Write as _};

use flate2::Compression;
use flate2::write::GzEncoder;
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeek, AsyncSeekExt, AsyncWriteExt};
use tracing::{debug, warn};

pub use deferred::{Deferred, DeferredFn};
pub use error::ResponseError;
pub use sink::{Recorder, ResponseSink};

use crate::app::App;
use crate::encoding::{self, Encoded};
use crate::http::{Cookie, Headers, Request, StatusCode};
use crate::negotiate::{self, ByteRange, Freshness};
use crate::render::Minifier;

/// A body the writer can measure and re-read: anything readable and seekable.
///
/// `std::io::Cursor` over bytes and `tokio::fs::File` both qualify.
pub trait BodySource: AsyncRead + AsyncSeek + Unpin + Send {}

impl<T: AsyncRead + AsyncSeek + Unpin + Send + ?Sized> BodySource for T {}

// Whether a body may be answered with 304 or narrowed to a range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Conditional {
    Honor,
    Skip,
}

/// One outgoing response, owned by the task handling its request.
///
/// # Examples
///
/// ```
/// use outflow::app::App;
/// use outflow::http::{Method, Request, StatusCode};
/// use outflow::response::{Recorder, Response};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let app = App::default();
/// let request = Request::new(Method::Get, "/");
/// let mut recorder = Recorder::new();
///
/// let mut response = Response::new(&app, &request, &mut recorder);
/// response.write_string("hello").await.unwrap();
/// drop(response);
///
/// assert_eq!(recorder.status(), Some(StatusCode::Ok));
/// assert_eq!(recorder.body(), b"hello");
/// # }
/// ```
pub struct Response<'a> {
    app: &'a App,
    request: &'a Request,
    status: StatusCode,
    headers: Headers,
    committed: bool,
    sink: Box<dyn ResponseSink + 'a>,
    deferred: Deferred<'a>,
}

impl<'a> Response<'a> {
    pub fn new(app: &'a App, request: &'a Request, sink: impl ResponseSink + 'a) -> Self {
        Self {
            app,
            request,
            status: StatusCode::Ok,
            headers: Headers::new(),
            committed: false,
            sink: Box::new(sink),
            deferred: Deferred::new(),
        }
    }

    pub fn request(&self) -> &Request {
        self.request
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// `true` once the status line and headers went to the sink.
    pub fn is_committed(&self) -> bool {
        self.committed
    }

    /// The pending headers (after commit: the headers that were sent).
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Sets the status. Ignored after commit.
    pub fn set_status(&mut self, status: StatusCode) {
        if self.refuse_mutation("status") {
            return;
        }
        self.status = status;
    }

    /// Replaces every value of a header. Ignored after commit.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        if self.refuse_mutation("header") {
            return;
        }
        self.headers.set(name, value);
    }

    /// Appends a header value. Ignored after commit.
    pub fn add_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        if self.refuse_mutation("header") {
            return;
        }
        self.headers.insert(name, value);
    }

    /// Removes a header. Ignored after commit.
    pub fn remove_header(&mut self, name: &str) {
        if self.refuse_mutation("header") {
            return;
        }
        self.headers.remove(name);
    }

    /// Appends a `Set-Cookie` header.
    ///
    /// Cookies whose name is empty or not a token are dropped; see
    /// [`Cookie::has_valid_name`].
    pub fn set_cookie(&mut self, cookie: &Cookie) {
        if !cookie.has_valid_name() {
            debug!(name = %cookie.name(), "cookie with invalid name dropped");
            return;
        }
        self.add_header("Set-Cookie", cookie.to_string());
    }

    /// The transport sink, for collaborators that need to inspect it.
    pub fn sink(&self) -> &dyn ResponseSink {
        &*self.sink
    }

    /// Direct access to the transport sink.
    ///
    /// Bytes written here bypass the writer entirely, including commit
    /// bookkeeping; streaming proxies use it after committing.
    pub fn sink_mut(&mut self) -> &mut (dyn ResponseSink + 'a) {
        &mut *self.sink
    }

    /// Swaps the transport sink, returning the previous one.
    ///
    /// # Errors
    ///
    /// [`ResponseError::Committed`] once headers were sent; the sink is not replaced.
    pub fn set_sink(
        &mut self,
        sink: impl ResponseSink + 'a,
    ) -> Result<Box<dyn ResponseSink + 'a>, ResponseError> {
        if self.committed {
            return Err(ResponseError::Committed);
        }
        Ok(std::mem::replace(&mut self.sink, Box::new(sink)))
    }

    /// Schedules `f` to run when the next terminal write returns.
    pub fn defer(&mut self, f: impl FnOnce() + Send + 'a) {
        self.deferred.push(f);
    }

    /// Like [`defer`](Self::defer); `None` registers nothing.
    pub fn defer_opt<F: FnOnce() + Send + 'a>(&mut self, f: Option<F>) {
        if let Some(f) = f {
            self.deferred.push(f);
        }
    }

    /// Number of callbacks waiting to run.
    pub fn deferred_len(&self) -> usize {
        self.deferred.len()
    }

    /// Writes a seekable body, or only the status and headers for `None`.
    ///
    /// # Errors
    ///
    /// [`ResponseError::Io`] for read, seek or sink failures,
    /// [`ResponseError::Range`] for a malformed or unsatisfiable `Range`,
    /// [`ResponseError::Minify`] when the minifier rejects the body.
    pub async fn write(&mut self, source: Option<&mut dyn BodySource>) -> Result<(), ResponseError> {
        let result = match source {
            Some(source) => self.send(source, Conditional::Honor).await,
            None => self.send_empty().await,
        };
        self.finish(result)
    }

    /// Relays a body that cannot seek, such as an upstream response in a
    /// reverse proxy.
    ///
    /// Ranges, conditional headers and minification are not applied. The
    /// `Content-Type` defaults to `application/octet-stream`, and any
    /// `Content-Length` the caller set is kept unless the body is gzipped.
    pub async fn write_stream(
        &mut self,
        source: &mut (dyn AsyncRead + Unpin + Send),
    ) -> Result<(), ResponseError> {
        let result = self.send_stream(source).await;
        self.finish(result)
    }

    /// Writes text, labelled `text/plain; charset=utf-8` unless a `Content-Type` is set.
    pub async fn write_string(&mut self, text: impl Into<String>) -> Result<(), ResponseError> {
        let encoded = encoding::text(text);
        let result = self.send_labelled(encoded, Conditional::Honor).await;
        self.finish(result)
    }

    /// Writes markup, labelled `text/html; charset=utf-8` unless a `Content-Type` is set.
    pub async fn write_html(&mut self, markup: impl Into<String>) -> Result<(), ResponseError> {
        let encoded = encoding::html(markup);
        let result = self.send_labelled(encoded, Conditional::Honor).await;
        self.finish(result)
    }

    /// Writes `value` as JSON, tab-indented when the app is configured `pretty`.
    pub async fn write_json<T: Serialize + ?Sized>(
        &mut self,
        value: &T,
    ) -> Result<(), ResponseError> {
        let encoded = encoding::json(value, self.app.config().pretty);
        self.send_encoded(encoded).await
    }

    /// Writes `value` as an XML document, tab-indented when the app is configured `pretty`.
    pub async fn write_xml<T: Serialize + ?Sized>(
        &mut self,
        value: &T,
    ) -> Result<(), ResponseError> {
        let encoded = encoding::xml(value, self.app.config().pretty);
        self.send_encoded(encoded).await
    }

    pub async fn write_protobuf<M: prost::Message>(
        &mut self,
        message: &M,
    ) -> Result<(), ResponseError> {
        let encoded = encoding::protobuf(message);
        self.send_encoded(encoded).await
    }

    pub async fn write_msgpack<T: Serialize + ?Sized>(
        &mut self,
        value: &T,
    ) -> Result<(), ResponseError> {
        let encoded = encoding::msgpack(value);
        self.send_encoded(encoded).await
    }

    pub async fn write_toml<T: Serialize + ?Sized>(
        &mut self,
        value: &T,
    ) -> Result<(), ResponseError> {
        let encoded = encoding::toml(value);
        self.send_encoded(encoded).await
    }

    pub async fn write_yaml<T: Serialize + ?Sized>(
        &mut self,
        value: &T,
    ) -> Result<(), ResponseError> {
        let encoded = encoding::yaml(value);
        self.send_encoded(encoded).await
    }

    /// Renders `templates` with `data` through the app's renderer and sends
    /// the result as HTML.
    ///
    /// # Errors
    ///
    /// [`ResponseError::Render`] when no renderer is installed, `data` does
    /// not serialize, or the renderer fails. Nothing is written in that case.
    pub async fn render<T: Serialize + ?Sized>(
        &mut self,
        data: &T,
        templates: &[&str],
    ) -> Result<(), ResponseError> {
        let result = match self.render_body(data, templates) {
            Ok(markup) => {
                let encoded = Encoded {
                    content_type: encoding::HTML,
                    bytes: markup,
                };
                self.send_labelled(encoded, Conditional::Honor).await
            }
            Err(e) => Err(e),
        };
        self.finish(result)
    }

    /// Answers `302 Found` pointing at `url`, with an empty body.
    pub async fn redirect(&mut self, url: &str) -> Result<(), ResponseError> {
        self.set_status(StatusCode::Found);
        self.set_header("Location", url);
        let result = self.send_empty().await;
        self.finish(result)
    }

    fn render_body<T: Serialize + ?Sized>(
        &self,
        data: &T,
        templates: &[&str],
    ) -> Result<Vec<u8>, ResponseError> {
        let renderer = self
            .app
            .renderer()
            .ok_or_else(|| ResponseError::Render("no renderer installed".into()))?;
        let data = serde_json::to_value(data).map_err(|e| ResponseError::Render(e.into()))?;
        renderer
            .render(&data, templates)
            .map_err(ResponseError::Render)
    }

    // Structured encoders never touch the headers unless encoding succeeded.
    async fn send_encoded(
        &mut self,
        encoded: Result<Encoded, encoding::EncodingError>,
    ) -> Result<(), ResponseError> {
        let result = match encoded {
            Ok(encoded) => self.send_labelled(encoded, Conditional::Skip).await,
            Err(e) => {
                debug!(format = %e.format, error = %e, "encoding failed");
                Err(e.into())
            }
        };
        self.finish(result)
    }

    async fn send_labelled(
        &mut self,
        encoded: Encoded,
        conditional: Conditional,
    ) -> Result<(), ResponseError> {
        if self.ignore_second_write() {
            return Ok(());
        }
        self.headers
            .set_default("Content-Type", encoded.content_type);
        let mut body = Cursor::new(encoded.bytes);
        self.send(&mut body, conditional).await
    }

    async fn send_empty(&mut self) -> Result<(), ResponseError> {
        if self.ignore_second_write() {
            return Ok(());
        }
        self.headers.set_default("Content-Length", "0");
        self.commit();
        self.sink.flush().await?;
        Ok(())
    }

    async fn send(
        &mut self,
        source: &mut dyn BodySource,
        conditional: Conditional,
    ) -> Result<(), ResponseError> {
        if self.ignore_second_write() {
            return Ok(());
        }
        let app = self.app;
        let config = app.config();

        let mut minified;
        let source: &mut dyn BodySource = match self.minify_target() {
            Some((content_type, minifier)) => {
                let mut raw = Vec::new();
                source.read_to_end(&mut raw).await?;
                let out = minifier
                    .minify(&content_type, &raw)
                    .map_err(ResponseError::Minify)?;
                debug!(before = raw.len(), after = out.len(), "body minified");
                minified = Cursor::new(out);
                &mut minified
            }
            None => source,
        };

        let size = source.seek(SeekFrom::End(0)).await?;
        source.seek(SeekFrom::Start(0)).await?;

        if !self.headers.contains("content-type") {
            let content_type = if config.sniff_content_type {
                let head = read_head(source).await?;
                source.seek(SeekFrom::Start(0)).await?;
                negotiate::sniff(&head)
            } else {
                encoding::TEXT
            };
            self.headers.set("Content-Type", content_type);
        }

        let mut range = None;
        if conditional == Conditional::Honor
            && self.status == StatusCode::Ok
            && self.request.method().allows_partial()
        {
            if negotiate::evaluate_conditional(self.request.headers(), &self.headers)
                == Freshness::NotModified
            {
                return self.send_not_modified().await;
            }
            range = self.resolve_range(size)?;
            self.headers.set_default("Accept-Ranges", "bytes");
        }

        let (offset, length) = match range {
            Some(r) => (r.start, r.length),
            None => (0, size),
        };
        if let Some(r) = range {
            self.status = StatusCode::PartialContent;
            self.headers.set("Content-Range", r.content_range(size));
            source.seek(SeekFrom::Start(offset)).await?;
        }

        let gzip = self.negotiate_gzip(Some(length));
        if !gzip {
            self.headers.set("Content-Length", length.to_string());
        }

        self.commit();
        if !self.request.method().has_response_body() {
            self.sink.flush().await?;
            return Ok(());
        }

        let mut body = source.take(length);
        self.copy_body(&mut body, gzip).await
    }

    async fn send_stream(
        &mut self,
        source: &mut (dyn AsyncRead + Unpin + Send),
    ) -> Result<(), ResponseError> {
        if self.ignore_second_write() {
            return Ok(());
        }
        self.headers
            .set_default("Content-Type", "application/octet-stream");
        let declared = self
            .headers
            .get("content-length")
            .and_then(|v| v.trim().parse().ok());
        let gzip = self.negotiate_gzip(declared);

        self.commit();
        if !self.request.method().has_response_body() {
            self.sink.flush().await?;
            return Ok(());
        }
        self.copy_body(source, gzip).await
    }

    async fn send_not_modified(&mut self) -> Result<(), ResponseError> {
        debug!(path = %self.request.path(), "validators fresh, answering 304");
        self.status = StatusCode::NotModified;
        for name in ["Content-Type", "Content-Length", "Content-Encoding"] {
            self.headers.remove(name);
        }
        self.commit();
        self.sink.flush().await?;
        Ok(())
    }

    // Single ranges become 206; several are answered with the whole body.
    fn resolve_range(&self, size: u64) -> Result<Option<ByteRange>, ResponseError> {
        let Some(header) = self.request.headers().get("range") else {
            return Ok(None);
        };
        if !negotiate::range_still_valid(self.request.headers(), &self.headers) {
            debug!("If-Range validator stale, sending full body");
            return Ok(None);
        }
        let ranges = negotiate::parse_range(header, size).inspect_err(|e| {
            debug!(range = %header, error = %e, "range rejected");
        })?;
        match ranges.as_slice() {
            [only] => Ok(Some(*only)),
            _ => {
                debug!(count = ranges.len(), "multiple ranges requested, sending full body");
                Ok(None)
            }
        }
    }

    fn minify_target(&self) -> Option<(String, &'a dyn Minifier)> {
        let app = self.app;
        if !app.config().minify {
            return None;
        }
        let minifier = app.minifier()?;
        let content_type = self.headers.get("content-type")?;
        negotiate::minifiable(content_type).then(|| (content_type.to_owned(), minifier))
    }

    // Decides on gzip and rewrites the headers that depend on it.
    fn negotiate_gzip(&mut self, length: Option<u64>) -> bool {
        let config = self.app.config();
        let eligible = config.gzip
            && self.status != StatusCode::PartialContent
            && !self.headers.contains("content-encoding")
            && length.is_none_or(|len| len > 0 && len >= config.gzip_min_length)
            && negotiate::gzippable(self.request.headers())
            && !negotiate::gzip_refused(self.request.headers());
        if !eligible {
            return false;
        }

        debug!(path = %self.request.path(), "gzip negotiated");
        self.headers.set("Content-Encoding", "gzip");
        self.headers.remove("Content-Length");
        let varies = self
            .headers
            .get_all("vary")
            .flat_map(|v| v.split(','))
            .any(|v| v.trim().eq_ignore_ascii_case("accept-encoding"));
        if !varies {
            self.headers.insert("Vary", "Accept-Encoding");
        }
        true
    }

    async fn copy_body(
        &mut self,
        source: &mut (dyn AsyncRead + Unpin + Send),
        gzip: bool,
    ) -> Result<(), ResponseError> {
        let mut buf = self.app.pool().checkout();
        let mut sent = 0u64;

        if gzip {
            let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
            loop {
                let n = source.read(&mut buf[..]).await?;
                if n == 0 {
                    break;
                }
                encoder.write_all(&buf[..n])?;
                let pending = encoder.get_mut();
                if !pending.is_empty() {
                    self.sink.write_all(pending.as_slice()).await?;
                    sent += pending.len() as u64;
                    pending.clear();
                }
            }
            let tail = encoder.finish()?;
            self.sink.write_all(&tail).await?;
            sent += tail.len() as u64;
        } else {
            loop {
                let n = source.read(&mut buf[..]).await?;
                if n == 0 {
                    break;
                }
                self.sink.write_all(&buf[..n]).await?;
                sent += n as u64;
            }
        }

        self.sink.flush().await?;
        debug!(bytes = sent, gzip, "body written");
        Ok(())
    }

    fn commit(&mut self) {
        let sink_headers = self.sink.headers_mut();
        sink_headers.merge_from(&self.headers);
        self.sink.write_status(self.status);
        self.committed = true;
        debug!(
            status = self.status.as_u16(),
            method = %self.request.method(),
            path = %self.request.path(),
            "response committed"
        );
    }

    fn ignore_second_write(&self) -> bool {
        if self.committed {
            warn!(path = %self.request.path(), "terminal write after commit ignored");
        }
        self.committed
    }

    fn refuse_mutation(&self, what: &str) -> bool {
        if self.committed {
            warn!(what, path = %self.request.path(), "mutation after commit ignored");
        }
        self.committed
    }

    fn finish(&mut self, result: Result<(), ResponseError>) -> Result<(), ResponseError> {
        self.deferred.run();
        result
    }
}

impl std::fmt::Debug for Response<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Response")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("committed", &self.committed)
            .field("deferred", &self.deferred)
            .finish()
    }
}

// Fills up to `SNIFF_LEN` bytes, stopping early at end of body.
async fn read_head(source: &mut dyn BodySource) -> std::io::Result<Vec<u8>> {
    let mut head = vec![0; negotiate::SNIFF_LEN];
    let mut filled = 0;
    while filled < head.len() {
        let n = source.read(&mut head[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    head.truncate(filled);
    Ok(head)
}
