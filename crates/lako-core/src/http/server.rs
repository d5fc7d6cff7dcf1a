use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::extract::rejection::BytesRejection;
use axum::extract::{DefaultBodyLimit, State};
use axum::http::{HeaderMap, Method, StatusCode, Uri, Version};
use axum::response::IntoResponse;
use tokio::net::TcpListener;

use crate::http::error::HttpError;
use crate::http::{Request, RequestHandler};
use crate::kernel::constants::DEFAULT_LISTEN_ADDR;
use crate::kernel::error::Result;

/// Largest request body buffered before dispatch
pub const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Accepts connections and feeds each request to a handler until stopped
#[async_trait]
pub trait Server: Send + Sync {
    /// Address used when neither the caller nor the config names one
    fn default_addr(&self) -> &str;

    /// Serve on `addr` until the server shuts down
    async fn listen(&self, addr: &str, handler: Arc<dyn RequestHandler>) -> Result<()>;
}

/// axum-backed server that stops on Ctrl+C
#[derive(Debug, Clone)]
pub struct HttpServer {
    default_addr: String,
    body_limit: usize,
}

impl Default for HttpServer {
    fn default() -> Self {
        Self {
            default_addr: DEFAULT_LISTEN_ADDR.to_string(),
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }
}

#[derive(Clone)]
struct ServeState {
    handler: Arc<dyn RequestHandler>,
}

impl HttpServer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default_addr(mut self, addr: impl Into<String>) -> Self {
        self.default_addr = addr.into();
        self
    }

    /// Bodies over `limit` bytes are answered with `413 Payload Too Large`
    pub fn with_body_limit(mut self, limit: usize) -> Self {
        self.body_limit = limit;
        self
    }

    /// Serve on an already bound listener until `shutdown` resolves
    pub async fn serve<F>(
        &self,
        listener: TcpListener,
        handler: Arc<dyn RequestHandler>,
        shutdown: F,
    ) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let local_addr = listener.local_addr().map_err(HttpError::Serve)?;
        log::info!("HTTP server listening on {}", local_addr);

        let app = axum::Router::new()
            .fallback(dispatch_request)
            .layer(DefaultBodyLimit::max(self.body_limit))
            .with_state(ServeState { handler });

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(HttpError::Serve)?;

        log::info!("HTTP server stopped");
        Ok(())
    }
}

#[async_trait]
impl Server for HttpServer {
    fn default_addr(&self) -> &str {
        &self.default_addr
    }

    async fn listen(&self, addr: &str, handler: Arc<dyn RequestHandler>) -> Result<()> {
        let addr = normalize_addr(addr)?;
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| HttpError::Bind { addr: addr.clone(), source })?;
        self.serve(listener, handler, shutdown_signal()).await
    }
}

/// Turn a host-less address such as `:8080` into `0.0.0.0:8080`
pub fn normalize_addr(addr: &str) -> Result<String> {
    let addr = addr.trim();
    if addr.is_empty() {
        return Err(HttpError::InvalidAddress {
            addr: addr.to_string(),
            reason: "address is empty".to_string(),
        }
        .into());
    }
    if addr.starts_with(':') {
        return Ok(format!("0.0.0.0{}", addr));
    }
    Ok(addr.to_string())
}

async fn dispatch_request(
    State(state): State<ServeState>,
    method: Method,
    uri: Uri,
    version: Version,
    headers: HeaderMap,
    body: std::result::Result<Bytes, BytesRejection>,
) -> axum::response::Response {
    let bytes = match body {
        Ok(bytes) => bytes,
        Err(rejection) => {
            // Oversized bodies come back as 413, unreadable ones as 400
            log::warn!(
                "Rejected body of {} {} ({}): {}",
                method,
                uri,
                rejection.status(),
                rejection.body_text()
            );
            return rejection.into_response();
        }
    };
    let mut request = Request::new(bytes);
    *request.method_mut() = method;
    *request.uri_mut() = uri;
    *request.version_mut() = version;
    *request.headers_mut() = headers;

    // Handlers are synchronous; keep them off the async workers
    let handler = state.handler.clone();
    match tokio::task::spawn_blocking(move || handler.handle(&request)).await {
        Ok(response) => response.map(Body::from).into_response(),
        Err(e) => {
            log::error!("Request task failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to install Ctrl+C handler: {}", e);
        std::future::pending::<()>().await;
    }
    log::info!("Shutdown signal received");
}
