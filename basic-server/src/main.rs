use std::env;
use std::net::SocketAddr;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;
use failban::{BanGuard, GuardConfig, init_tracing};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let settings = GuardConfig::from_env()?.build()?;
	init_tracing(settings.log_level);

	let listen = env::var("LISTEN").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
	let shutdown = CancellationToken::new();
	let guard = BanGuard::with_settings("basic-server", settings, &shutdown);

	let app = Router::new()
		.route("/", get(|| async { "ok\n" }))
		.fallback(|| async { StatusCode::NOT_FOUND })
		.layer(guard.layer());

	let listener = TcpListener::bind(&listen).await?;
	info!("Listening on {}", listen);

	let signal = shutdown.clone();
	axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
		.with_graceful_shutdown(async move {
			if let Err(e) = tokio::signal::ctrl_c().await {
				tracing::error!("Failed to listen for shutdown signal: {}", e);
				std::future::pending::<()>().await;
			}
			info!("Shutting down");
			signal.cancel();
		})
		.await?;

	guard.shutdown().await;
	Ok(())
}

// vim: ts=4
