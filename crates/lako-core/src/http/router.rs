use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use axum::http::{Method, StatusCode};

use crate::http::{Request, Response};

/// Fills in the response for a request.
///
/// The response arrives as `200 OK` with an empty body, possibly already
/// touched by a before-route hook.
pub trait Router: Send + Sync {
    fn serve_http(&self, request: &Request, response: &mut Response);
}

impl<F> Router for F
where
    F: Fn(&Request, &mut Response) + Send + Sync,
{
    fn serve_http(&self, request: &Request, response: &mut Response) {
        self(request, response)
    }
}

type RouteHandler = Arc<dyn Fn(&Request, &mut Response) + Send + Sync>;

/// Exact (method, path) lookup table. Unmatched requests get a 404.
#[derive(Default, Clone)]
pub struct RouteTable {
    routes: HashMap<(Method, String), RouteHandler>,
}

impl fmt::Debug for RouteTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut routes: Vec<String> = self
            .routes
            .keys()
            .map(|(method, path)| format!("{} {}", method, path))
            .collect();
        routes.sort();
        f.debug_struct("RouteTable").field("routes", &routes).finish()
    }
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler, replacing any existing one for the same route
    pub fn route<F>(mut self, method: Method, path: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&Request, &mut Response) + Send + Sync + 'static,
    {
        self.routes.insert((method, path.into()), Arc::new(handler));
        self
    }

    pub fn get<F>(self, path: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&Request, &mut Response) + Send + Sync + 'static,
    {
        self.route(Method::GET, path, handler)
    }

    pub fn post<F>(self, path: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&Request, &mut Response) + Send + Sync + 'static,
    {
        self.route(Method::POST, path, handler)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl Router for RouteTable {
    fn serve_http(&self, request: &Request, response: &mut Response) {
        let key = (request.method().clone(), request.uri().path().to_string());
        match self.routes.get(&key) {
            Some(handler) => handler(request, response),
            None => {
                log::debug!("No route for {} {}", key.0, key.1);
                *response.status_mut() = StatusCode::NOT_FOUND;
                *response.body_mut() = b"404 page not found\n".to_vec();
            }
        }
    }
}
