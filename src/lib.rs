//! Straylight — a pluggable event-adapter layer.
//!
//! One application-level request handler, many hosting platforms. Each
//! platform delivers requests as its own event shape and expects responses in
//! its own shape; an [`adapters::Adapter`] translates the incoming event into
//! the canonical [`types::HttpRequest`] and turns the handler's
//! [`types::HttpResponse`] back into whatever the platform expects on the
//! wire. The [`dispatcher::Dispatcher`] probes the registered adapters and
//! owns the downstream handler seam.
//!
//! See `DESIGN.md` for full architecture documentation.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod adapters;
pub mod dispatcher;
pub mod encoding;
pub mod types;
