//! Shared helpers for guard integration tests

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use failban::{BanGuard, GuardConfig, LogLevel, RemoteAddr};
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

pub const CLIENT_ADDR: &str = "1.2.3.4:5678";
pub const CLIENT_IP: &str = "1.2.3.4";

pub fn config(number_fails: u32, ban_time: &str) -> GuardConfig {
	GuardConfig {
		number_fails,
		ban_time: ban_time.to_string(),
		client_header: None,
		log_level: LogLevel::Error,
	}
}

pub fn guard(config: &GuardConfig) -> BanGuard {
	let _ = tracing_subscriber::fmt().with_test_writer().try_init();
	BanGuard::new("test", config, &CancellationToken::new()).unwrap()
}

/// Router answering every request with `status`, counting handler calls
pub fn status_router(guard: &BanGuard, status: StatusCode, hits: Arc<AtomicUsize>) -> Router {
	Router::new()
		.fallback(move || {
			hits.fetch_add(1, Ordering::SeqCst);
			async move { status }
		})
		.layer(guard.layer())
}

pub fn request_from(addr: &str) -> Request<Body> {
	let mut req = Request::builder().uri("http://garbage/").body(Body::empty()).unwrap();
	req.extensions_mut().insert(RemoteAddr(addr.to_string()));
	req
}

pub fn request_with_header(name: &str, value: &str) -> Request<Body> {
	Request::builder().uri("http://garbage/").header(name, value).body(Body::empty()).unwrap()
}

pub async fn send(app: &Router, req: Request<Body>) -> StatusCode {
	app.clone().oneshot(req).await.unwrap().status()
}

// vim: ts=4
