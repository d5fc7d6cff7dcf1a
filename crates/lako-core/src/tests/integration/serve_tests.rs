#![cfg(test)]

use std::sync::Arc;

use axum::body::Bytes;
use axum::http::header::HeaderValue;

use crate::http::{Method, RequestHandler, RouteTable, StatusCode};
use crate::kernel::error::Result;

use super::common::Project;

fn get(path: &str) -> crate::http::Request {
    axum::http::Request::builder()
        .method(Method::GET)
        .uri(path)
        .body(Bytes::new())
        .unwrap()
}

#[tokio::test]
async fn test_booted_app_serves_concurrently_after_panic() -> Result<()> {
    let project = Project::new();
    project.write("app.json", r#"{"name": "served"}"#);

    let mut app = project.app(&["app.json"], &[]).with_router(
        RouteTable::new()
            .get("/ok", |_req, res| res.body_mut().extend_from_slice(b"ok"))
            .get("/panic", |_req, _res| panic!("route panicked")),
    );
    app.set_after_route(|_req, res| {
        res.headers_mut().insert("x-app", HeaderValue::from_static("served"));
    });
    app.boot().await?;

    let app: Arc<dyn RequestHandler> = Arc::new(app);

    let crashed = tokio::task::spawn_blocking({
        let app = Arc::clone(&app);
        move || app.handle(&get("/panic"))
    })
    .await
    .expect("Blocking task failed");
    assert_eq!(crashed.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(crashed.headers().get("x-app").is_none());

    let tasks: Vec<_> = (0..4)
        .map(|_| {
            let app = Arc::clone(&app);
            tokio::task::spawn_blocking(move || app.handle(&get("/ok")))
        })
        .collect();
    for response in futures::future::join_all(tasks).await {
        let response = response.expect("Blocking task failed");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["x-app"], "served");
    }
    Ok(())
}
