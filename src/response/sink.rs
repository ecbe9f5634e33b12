//! The transport side of a response.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::BytesMut;
use tokio::io::AsyncWrite;

use crate::http::{Headers, StatusCode};

/// Where a committed response goes: a header map, one status and body bytes.
///
/// The transport owns the sink. [`Response`](super::Response) copies its
/// pending headers into [`headers_mut`](Self::headers_mut), calls
/// [`write_status`](Self::write_status) once and then streams the body
/// through [`AsyncWrite`].
pub trait ResponseSink: AsyncWrite + Unpin + Send {
    fn headers(&self) -> &Headers;

    fn headers_mut(&mut self) -> &mut Headers;

    /// Sends the status line together with the current headers.
    fn write_status(&mut self, status: StatusCode);
}

impl<S: ResponseSink + ?Sized> ResponseSink for &mut S {
    fn headers(&self) -> &Headers {
        (**self).headers()
    }

    fn headers_mut(&mut self) -> &mut Headers {
        (**self).headers_mut()
    }

    fn write_status(&mut self, status: StatusCode) {
        (**self).write_status(status);
    }
}

impl<S: ResponseSink + ?Sized> ResponseSink for Box<S> {
    fn headers(&self) -> &Headers {
        (**self).headers()
    }

    fn headers_mut(&mut self) -> &mut Headers {
        (**self).headers_mut()
    }

    fn write_status(&mut self, status: StatusCode) {
        (**self).write_status(status);
    }
}

/// An in-memory sink that records what a response sent.
///
/// # Examples
///
/// ```
/// use outflow::http::StatusCode;
/// use outflow::response::{Recorder, ResponseSink};
///
/// let mut rec = Recorder::new();
/// rec.headers_mut().set("Content-Type", "text/plain");
/// rec.write_status(StatusCode::Ok);
/// assert_eq!(rec.status(), Some(StatusCode::Ok));
/// assert!(rec.body().is_empty());
/// ```
#[derive(Debug, Default)]
pub struct Recorder {
    status: Option<StatusCode>,
    status_writes: usize,
    headers: Headers,
    body: BytesMut,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// The status sent, `None` until the response commits.
    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    /// How many times a status line was sent.
    pub fn status_writes(&self) -> usize {
        self.status_writes
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

impl ResponseSink for Recorder {
    fn headers(&self) -> &Headers {
        &self.headers
    }

    fn headers_mut(&mut self) -> &mut Headers {
        &mut self.headers
    }

    fn write_status(&mut self, status: StatusCode) {
        self.status_writes += 1;
        if self.status.is_none() {
            self.status = Some(status);
        }
    }
}

impl AsyncWrite for Recorder {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        self.get_mut().body.extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}
