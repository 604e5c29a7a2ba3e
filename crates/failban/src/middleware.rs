//! Ban Guard Middleware
//!
//! Tower layer that rejects banned clients with 403 before the wrapped
//! service runs, and counts client error responses towards a ban.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll};

use axum::body::Body;
use axum::http::{HeaderName, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use futures::future::BoxFuture;
use tokio_util::sync::{CancellationToken, DropGuard};
use tower::{Layer, Service, ServiceExt};
use tracing::Instrument;

use crate::config::{GuardConfig, GuardSettings};
use crate::error::ConfigError;
use crate::identity::resolve_client;
use crate::observer::{ResponseObserver, is_bad_response};
use crate::prelude::*;
use crate::reaper::Reaper;
use crate::table::{BanTable, BanTableStats};

/// Guard statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GuardStats {
	pub table: BanTableStats,
	/// Requests answered with 403 by the guard itself
	pub total_rejected: u64,
	/// Client error responses counted against their client
	pub total_failures_recorded: u64,
}

/// State shared by the guard, its layers and every service instance
struct GuardShared {
	name: Box<str>,
	table: Arc<BanTable>,
	client_header: Option<HeaderName>,
	total_rejected: AtomicU64,
	total_failures: AtomicU64,
}

/// A configured guard with its running reaper.
///
/// Dropping the guard stops the reaper.
pub struct BanGuard {
	shared: Arc<GuardShared>,
	reaper: Reaper,
	_reaper_cancel: DropGuard,
}

impl BanGuard {
	/// Validate `config` and start the guard.
	///
	/// The reaper runs until `shutdown` (or [`BanGuard::shutdown`]) cancels
	/// it. Must be called from within a Tokio runtime.
	pub fn new(
		name: impl Into<Box<str>>,
		config: &GuardConfig,
		shutdown: &CancellationToken,
	) -> Result<Self, ConfigError> {
		let settings = config.build()?;
		Ok(Self::with_settings(name, settings, shutdown))
	}

	pub fn with_settings(
		name: impl Into<Box<str>>,
		settings: GuardSettings,
		shutdown: &CancellationToken,
	) -> Self {
		let name = name.into();
		info!(
			"[{}] Max number failures {}, ban time {:?}, client header {:?}",
			name,
			settings.max_fails,
			settings.ban_time,
			settings.client_header.as_ref().map(HeaderName::as_str)
		);

		let table = Arc::new(BanTable::new(settings.max_fails, settings.ban_time));
		let token = shutdown.child_token();
		let reaper = Reaper::spawn(table.clone(), settings.sweep_interval(), token.clone());

		let shared = Arc::new(GuardShared {
			name,
			table,
			client_header: settings.client_header,
			total_rejected: AtomicU64::new(0),
			total_failures: AtomicU64::new(0),
		});

		Self { shared, reaper, _reaper_cancel: token.drop_guard() }
	}

	pub fn layer(&self) -> BanGuardLayer {
		BanGuardLayer { shared: self.shared.clone() }
	}

	pub fn name(&self) -> &str {
		&self.shared.name
	}

	pub fn table(&self) -> &Arc<BanTable> {
		&self.shared.table
	}

	pub fn reaper(&self) -> &Reaper {
		&self.reaper
	}

	pub fn stats(&self) -> GuardStats {
		GuardStats {
			table: self.shared.table.stats(),
			total_rejected: self.shared.total_rejected.load(Ordering::Relaxed),
			total_failures_recorded: self.shared.total_failures.load(Ordering::Relaxed),
		}
	}

	/// Stop the reaper. Layers already handed out keep working; expired bans
	/// are then only lifted on access.
	pub async fn shutdown(self) {
		self.reaper.stop().await;
	}
}

/// Ban guard middleware layer
#[derive(Clone)]
pub struct BanGuardLayer {
	shared: Arc<GuardShared>,
}

impl<S> Layer<S> for BanGuardLayer {
	type Service = BanGuardService<S>;

	fn layer(&self, inner: S) -> Self::Service {
		BanGuardService { inner, shared: self.shared.clone() }
	}
}

/// Ban guard middleware service
#[derive(Clone)]
pub struct BanGuardService<S> {
	inner: S,
	shared: Arc<GuardShared>,
}

impl<S> Service<Request<Body>> for BanGuardService<S>
where
	S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
	S::Future: Send + 'static,
{
	type Response = S::Response;
	type Error = S::Error;
	type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

	fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
		self.inner.poll_ready(cx)
	}

	fn call(&mut self, req: Request<Body>) -> Self::Future {
		let shared = self.shared.clone();
		let inner = self.inner.clone();
		let span = debug_span!("failban", guard = %shared.name);

		Box::pin(
			async move {
				let client = match resolve_client(&req, shared.client_header.as_ref()) {
					Ok(client) => client,
					Err(e) => {
						// Unidentifiable clients are refused
						warn!("{}", e);
						shared.total_rejected.fetch_add(1, Ordering::Relaxed);
						return Ok(e.into_response());
					}
				};
				debug!("Request from {}", client);

				if shared.table.is_banned(&client) {
					shared.total_rejected.fetch_add(1, Ordering::Relaxed);
					return Ok(StatusCode::FORBIDDEN.into_response());
				}

				let recorder = shared.clone();
				let observed = ResponseObserver::new(inner, move |status: StatusCode| {
					if is_bad_response(status) {
						recorder.table.record_failure(&client);
						recorder.total_failures.fetch_add(1, Ordering::Relaxed);
					}
				});
				observed.oneshot(req).await
			}
			.instrument(span),
		)
	}
}

// vim: ts=4
