//! Helpers shared by the unit tests: ephemeral servers, descriptor files and
//! counting stub upstreams.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::Value;

use crate::membership::types::{NodeDescriptor, RoleTag};
use crate::relay::protocol::{ENDPOINT_HEALTH, HealthResponse};

/// Serves `router` on an ephemeral localhost port.
pub async fn spawn(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

/// A localhost address nothing listens on.
pub async fn unreachable_addr() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

pub fn descriptor(name: RoleTag, id: &str, addr: impl ToString) -> NodeDescriptor {
    NodeDescriptor {
        name,
        instance_id: id.to_string(),
        public_address: addr.to_string(),
    }
}

pub fn write_descriptors(dir: &Path, file: &str, nodes: &[NodeDescriptor]) -> PathBuf {
    let path = dir.join(file);
    std::fs::write(&path, serde_json::to_vec(nodes).unwrap()).unwrap();
    path
}

/// Upstream stub that counts hits and answers every POST with a fixed reply.
#[derive(Clone)]
pub struct StubUpstream {
    pub hits: Arc<AtomicUsize>,
    pub last_body: Arc<tokio::sync::Mutex<Option<Value>>>,
    pub last_headers: Arc<tokio::sync::Mutex<Vec<(String, String)>>>,
}

impl StubUpstream {
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

/// Starts a stub that answers POST `path` with `status` / `reply`.
pub async fn stub_upstream(path: &str, status: StatusCode, reply: Value) -> (SocketAddr, StubUpstream) {
    let stub = StubUpstream {
        hits: Arc::new(AtomicUsize::new(0)),
        last_body: Arc::new(tokio::sync::Mutex::new(None)),
        last_headers: Arc::new(tokio::sync::Mutex::new(Vec::new())),
    };

    let handler_stub = stub.clone();
    let router = Router::new()
        .route(
            path,
            post(
                move |headers: axum::http::HeaderMap, Json(body): Json<Value>| {
                    let stub = handler_stub.clone();
                    let reply = reply.clone();
                    async move {
                        stub.hits.fetch_add(1, Ordering::SeqCst);
                        *stub.last_body.lock().await = Some(body);
                        *stub.last_headers.lock().await = headers
                            .iter()
                            .map(|(k, v)| (k.to_string(), v.to_str().unwrap_or("").to_string()))
                            .collect();
                        (status, Json(reply))
                    }
                },
            ),
        )
        .route(ENDPOINT_HEALTH, get(|| async { Json(HealthResponse::healthy()) }));

    (spawn(router).await, stub)
}

pub fn post_json(path: &str, body: &str) -> Request<Body> {
    Request::post(path)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
