use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use axum::http::StatusCode;

use crate::http::router::{RouteTable, Router};
use crate::http::{Hook, Request, RequestHandler, Response};

/// Wraps the router with optional before/after hooks and panic recovery.
///
/// Hooks and router run inside a single recovery boundary: a panic in any of
/// them throws away the partially built response and the caller gets a
/// fresh `500 Internal Server Error` with an empty body instead.
#[derive(Clone)]
pub struct Dispatcher {
    router: Arc<dyn Router>,
    before_route: Option<Hook>,
    after_route: Option<Hook>,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("before_route", &self.before_route.is_some())
            .field("after_route", &self.after_route.is_some())
            .finish_non_exhaustive()
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(Arc::new(RouteTable::new()))
    }
}

impl Dispatcher {
    pub fn new(router: Arc<dyn Router>) -> Self {
        Self {
            router,
            before_route: None,
            after_route: None,
        }
    }

    pub fn router(&self) -> &Arc<dyn Router> {
        &self.router
    }

    pub fn set_router(&mut self, router: Arc<dyn Router>) {
        self.router = router;
    }

    pub fn set_before_route<F>(&mut self, hook: F)
    where
        F: Fn(&Request, &mut Response) + Send + Sync + 'static,
    {
        self.before_route = Some(Arc::new(hook));
    }

    pub fn set_after_route<F>(&mut self, hook: F)
    where
        F: Fn(&Request, &mut Response) + Send + Sync + 'static,
    {
        self.after_route = Some(Arc::new(hook));
    }

    /// Handle one request: before hook, router, after hook.
    pub fn serve_http(&self, request: &Request) -> Response {
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            let mut response = Response::new(Vec::new());
            if let Some(hook) = &self.before_route {
                hook(request, &mut response);
            }
            self.router.serve_http(request, &mut response);
            if let Some(hook) = &self.after_route {
                hook(request, &mut response);
            }
            response
        }));

        match result {
            Ok(response) => response,
            Err(panic_obj) => {
                log::error!(
                    "Recovered from panic while handling {} {}: {}",
                    request.method(),
                    request.uri().path(),
                    panic_message(panic_obj.as_ref())
                );
                internal_server_error()
            }
        }
    }
}

impl RequestHandler for Dispatcher {
    fn handle(&self, request: &Request) -> Response {
        self.serve_http(request)
    }
}

fn internal_server_error() -> Response {
    let mut response = Response::new(Vec::new());
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response
}

fn panic_message(panic_obj: &(dyn Any + Send)) -> String {
    if let Some(s) = panic_obj.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = panic_obj.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic reason".to_string()
    }
}
