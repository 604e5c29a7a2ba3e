//! Response Observer
//!
//! Service decorator that reports the final status code of every response
//! produced by the wrapped service, passing the response through untouched.

use std::task::{Context, Poll};

use axum::http::{Request, Response, StatusCode};
use futures::future::BoxFuture;
use tower::Service;

/// Client error statuses (400..=499) count as failures; nothing else does
pub fn is_bad_response(status: StatusCode) -> bool {
	status.is_client_error()
}

#[derive(Clone)]
pub struct ResponseObserver<S, F> {
	inner: S,
	on_status: F,
}

impl<S, F> ResponseObserver<S, F> {
	pub fn new(inner: S, on_status: F) -> Self {
		Self { inner, on_status }
	}
}

impl<S, F, ReqBody, ResBody> Service<Request<ReqBody>> for ResponseObserver<S, F>
where
	S: Service<Request<ReqBody>, Response = Response<ResBody>> + 'static,
	S::Future: Send + 'static,
	ReqBody: 'static,
	ResBody: 'static,
	F: FnOnce(StatusCode) + Clone + Send + 'static,
{
	type Response = S::Response;
	type Error = S::Error;
	type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

	fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
		self.inner.poll_ready(cx)
	}

	fn call(&mut self, req: Request<ReqBody>) -> Self::Future {
		let fut = self.inner.call(req);
		let on_status = self.on_status.clone();

		Box::pin(async move {
			let response = fut.await?;
			on_status(response.status());
			Ok(response)
		})
	}
}


// vim: ts=4
