//! # outflow
//!
//! The outbound half of an HTTP server: everything between "the handler has
//! a value" and "bytes are on the socket".
//!
//! A [`Response`] borrows the process-wide [`App`] and the inbound
//! [`Request`], and writes to whatever transport implements
//! [`ResponseSink`]. One terminal write per response encodes the body,
//! negotiates gzip, answers conditional and range requests, and streams the
//! result through a pooled buffer.
//!
//! ## Quick Start
//!
//! ```rust
//! use outflow::{App, Method, Recorder, Request, Response, StatusCode};
//!
//! #[derive(serde::Serialize)]
//! struct Greeting {
//!     hello: &'static str,
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let app = App::default();
//!     let request = Request::new(Method::Get, "/hello");
//!     let mut recorder = Recorder::new();
//!
//!     let mut response = Response::new(&app, &request, &mut recorder);
//!     response.defer(|| println!("request finished"));
//!     response.write_json(&Greeting { hello: "world" }).await?;
//!     drop(response);
//!
//!     assert_eq!(recorder.status(), Some(StatusCode::Ok));
//!     assert_eq!(recorder.body(), br#"{"hello":"world"}"#);
//!     Ok(())
//! }
//! ```

// ── Request-side primitives ───────────────────────────────────────────────────
pub mod http;

// ── Process-wide state ────────────────────────────────────────────────────────
pub mod app;
pub mod config;
pub mod pool;

// ── Body production and negotiation ──────────────────────────────────────────
pub mod encoding;
pub mod negotiate;
pub mod render;

// ── The writer ────────────────────────────────────────────────────────────────
pub mod response;

// ── Convenience re-exports ────────────────────────────────────────────────────
pub use app::App;
pub use config::{Config, ConfigError};
pub use http::{Cookie, Headers, Method, Request, StatusCode};
pub use pool::BufferPool;
pub use response::{BodySource, Recorder, Response, ResponseError, ResponseSink};
