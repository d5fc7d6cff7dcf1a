use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;

use crate::http::{normalize_addr, Dispatcher, HttpError, HttpServer, RouteTable, Server};
use crate::kernel::error::{Error, Result};

async fn raw_request(addr: std::net::SocketAddr, request: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.expect("Failed to connect");
    stream
        .write_all(request.as_bytes())
        .await
        .expect("Failed to write request");
    let mut response = Vec::new();
    stream
        .read_to_end(&mut response)
        .await
        .expect("Failed to read response");
    String::from_utf8_lossy(&response).into_owned()
}

#[test]
fn test_normalize_addr() -> Result<()> {
    assert_eq!(normalize_addr(":8080")?, "0.0.0.0:8080");
    assert_eq!(normalize_addr(" 127.0.0.1:9000 ")?, "127.0.0.1:9000");
    assert_eq!(normalize_addr("localhost:80")?, "localhost:80");
    assert!(matches!(
        normalize_addr("  "),
        Err(Error::Http(HttpError::InvalidAddress { .. }))
    ));
    Ok(())
}

#[test]
fn test_http_server_defaults() {
    let server = HttpServer::new();
    assert_eq!(server.default_addr(), ":8080");
    assert_eq!(HttpServer::new().with_default_addr(":9999").default_addr(), ":9999");
}

#[tokio::test]
async fn test_server_feeds_requests_through_dispatcher() -> Result<()> {
    let routes = RouteTable::new()
        .get("/ping", |_req, res| res.body_mut().extend_from_slice(b"pong"))
        .post("/echo", |req, res| res.body_mut().extend_from_slice(req.body()))
        .get("/boom", |_req, _res| panic!("route failure"));
    let handler = Arc::new(Dispatcher::new(Arc::new(routes)));

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("Failed to bind");
    let addr = listener.local_addr().expect("No local addr");
    let (stop_tx, stop_rx) = oneshot::channel::<()>();

    let server = tokio::spawn(async move {
        HttpServer::new()
            .serve(listener, handler, async move {
                let _ = stop_rx.await;
            })
            .await
    });

    let pong = raw_request(addr, "GET /ping HTTP/1.1\r\nHost: test\r\nConnection: close\r\n\r\n").await;
    assert!(pong.starts_with("HTTP/1.1 200"), "{}", pong);
    assert!(pong.ends_with("pong"), "{}", pong);

    let echo = raw_request(
        addr,
        "POST /echo HTTP/1.1\r\nHost: test\r\nContent-Length: 5\r\nConnection: close\r\n\r\nhello",
    )
    .await;
    assert!(echo.ends_with("hello"), "{}", echo);

    let boom = raw_request(addr, "GET /boom HTTP/1.1\r\nHost: test\r\nConnection: close\r\n\r\n").await;
    assert!(boom.starts_with("HTTP/1.1 500"), "{}", boom);

    let after = raw_request(addr, "GET /ping HTTP/1.1\r\nHost: test\r\nConnection: close\r\n\r\n").await;
    assert!(after.starts_with("HTTP/1.1 200"), "{}", after);

    let missing = raw_request(addr, "GET /nope HTTP/1.1\r\nHost: test\r\nConnection: close\r\n\r\n").await;
    assert!(missing.starts_with("HTTP/1.1 404"), "{}", missing);

    let _ = stop_tx.send(());
    server.await.expect("Server task panicked")?;
    Ok(())
}

#[tokio::test]
async fn test_oversized_body_is_payload_too_large() -> Result<()> {
    let routes = RouteTable::new().post("/echo", |req, res| res.body_mut().extend_from_slice(req.body()));
    let handler = Arc::new(Dispatcher::new(Arc::new(routes)));

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("Failed to bind");
    let addr = listener.local_addr().expect("No local addr");
    let (stop_tx, stop_rx) = oneshot::channel::<()>();

    let server = tokio::spawn(async move {
        HttpServer::new()
            .with_body_limit(8)
            .serve(listener, handler, async move {
                let _ = stop_rx.await;
            })
            .await
    });

    let small = raw_request(
        addr,
        "POST /echo HTTP/1.1\r\nHost: test\r\nContent-Length: 5\r\nConnection: close\r\n\r\nhello",
    )
    .await;
    assert!(small.starts_with("HTTP/1.1 200"), "{}", small);
    assert!(small.ends_with("hello"), "{}", small);

    let large = raw_request(
        addr,
        "POST /echo HTTP/1.1\r\nHost: test\r\nContent-Length: 32\r\nConnection: close\r\n\r\n0123456789abcdef0123456789abcdef",
    )
    .await;
    assert!(large.starts_with("HTTP/1.1 413"), "{}", large);

    let _ = stop_tx.send(());
    server.await.expect("Server task panicked")?;
    Ok(())
}

#[tokio::test]
async fn test_listen_reports_bind_failure() {
    let taken = TcpListener::bind("127.0.0.1:0").await.expect("Failed to bind");
    let addr = taken.local_addr().expect("No local addr").to_string();

    let result = HttpServer::new()
        .listen(&addr, Arc::new(Dispatcher::default()))
        .await;

    match result {
        Err(Error::Http(HttpError::Bind { addr: failed, .. })) => assert_eq!(failed, addr),
        other => panic!("Unexpected result: {:?}", other),
    }
}
