//! Error Types
//!
//! Construction-time configuration errors and per-request identity
//! resolution errors.

use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Configuration rejected while building the guard
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
	/// Ban time could not be parsed into a duration
	InvalidBanTime {
		/// The raw value as configured
		value: String,
		/// Why parsing failed
		reason: &'static str,
	},
	/// Client header is not a valid HTTP header name
	InvalidClientHeader(String),
	/// Failure threshold is not an unsigned integer
	InvalidNumberFails(String),
}

impl fmt::Display for ConfigError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ConfigError::InvalidBanTime { value, reason } => {
				write!(f, "invalid ban time {:?}: {}", value, reason)
			}
			ConfigError::InvalidClientHeader(name) => {
				write!(f, "invalid client header name {:?}", name)
			}
			ConfigError::InvalidNumberFails(value) => {
				write!(f, "invalid failure threshold {:?}", value)
			}
		}
	}
}

impl std::error::Error for ConfigError {}

/// The requesting client could not be identified
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
	/// No peer address was attached to the request
	MissingPeerAddr,
	/// Peer address is not in `host:port` form
	MalformedPeerAddr {
		/// The raw peer address
		addr: String,
		/// What is wrong with it
		reason: &'static str,
	},
}

impl fmt::Display for IdentityError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			IdentityError::MissingPeerAddr => {
				write!(f, "failed to extract client IP: no remote address on request")
			}
			IdentityError::MalformedPeerAddr { addr, reason } => {
				write!(f, "failed to extract client IP from remote address {:?}: {}", addr, reason)
			}
		}
	}
}

impl std::error::Error for IdentityError {}

impl IntoResponse for IdentityError {
	fn into_response(self) -> Response {
		StatusCode::FORBIDDEN.into_response()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_identity_error_message() {
		let err = IdentityError::MalformedPeerAddr {
			addr: "1.2.3.4".to_string(),
			reason: "missing port in address",
		};
		let msg = err.to_string();
		assert!(msg.starts_with("failed to extract client IP from remote address"));
		assert!(msg.contains("1.2.3.4"));
	}

	#[test]
	fn test_identity_error_is_forbidden() {
		let response = IdentityError::MissingPeerAddr.into_response();
		assert_eq!(response.status(), StatusCode::FORBIDDEN);
	}
}

// vim: ts=4
