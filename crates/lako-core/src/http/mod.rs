//! # Lako Core HTTP Dispatch
//!
//! The application does not route or speak HTTP itself. It sits between two
//! collaborators:
//!
//! - a [`Server`] that accepts connections and hands each request to a
//!   [`RequestHandler`], and
//! - a [`Router`] that fills in a response for a request.
//!
//! The [`Dispatcher`] in between runs the before/after route hooks and
//! contains panics, so one faulty handler produces a 500 for its own request
//! and nothing else.
pub mod dispatch;
pub mod error;
pub mod router;
pub mod server;

use std::sync::Arc;

use axum::body::Bytes;

/// Incoming request with its body fully buffered
pub type Request = axum::http::Request<Bytes>;

/// Outgoing response
pub type Response = axum::http::Response<Vec<u8>>;

/// Hook run before or after the router
pub type Hook = Arc<dyn Fn(&Request, &mut Response) + Send + Sync>;

pub use axum::http::{Method, StatusCode};
pub use dispatch::Dispatcher;
pub use error::HttpError;
pub use router::{RouteTable, Router};
pub use server::{normalize_addr, HttpServer, Server};

/// Anything that turns a request into a response without failing
pub trait RequestHandler: Send + Sync {
    fn handle(&self, request: &Request) -> Response;
}

// Test module declaration
#[cfg(test)]
mod tests;
