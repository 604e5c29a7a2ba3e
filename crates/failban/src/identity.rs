//! Client Identity
//!
//! Derives the key a request is tracked under: the configured header when
//! present, otherwise the host part of the connection's peer address.

use std::net::SocketAddr;

use axum::extract::ConnectInfo;
use axum::http::{HeaderName, Request};

use crate::error::IdentityError;

/// Raw `host:port` peer address attached to a request.
///
/// For hosts that do not use axum's `ConnectInfo`. `ConnectInfo` wins when
/// both are present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteAddr(pub String);

/// Resolve the identity of the client sending `req`
pub fn resolve_client<B>(
	req: &Request<B>,
	client_header: Option<&HeaderName>,
) -> Result<String, IdentityError> {
	if let Some(header) = client_header {
		// Header values are not guaranteed to be UTF-8
		let value = req.headers().get(header).map(|v| String::from_utf8_lossy(v.as_bytes()));
		if let Some(client) = value.filter(|v| !v.is_empty()) {
			return Ok(client.into_owned());
		}
	}

	if let Some(ConnectInfo(addr)) = req.extensions().get::<ConnectInfo<SocketAddr>>() {
		return Ok(addr.ip().to_string());
	}

	match req.extensions().get::<RemoteAddr>() {
		Some(RemoteAddr(addr)) => split_host(addr).map(str::to_string),
		None => Err(IdentityError::MissingPeerAddr),
	}
}

/// Host part of a `host:port` address. IPv6 hosts must be bracketed.
pub fn split_host(addr: &str) -> Result<&str, IdentityError> {
	let malformed = |reason| IdentityError::MalformedPeerAddr { addr: addr.to_string(), reason };

	let Some(last_colon) = addr.rfind(':') else {
		return Err(malformed("missing port in address"));
	};

	let host = if let Some(bracketed) = addr.strip_prefix('[') {
		let Some(close) = bracketed.find(']') else {
			return Err(malformed("missing ']' in address"));
		};
		// Offset of the byte after ']' in `addr`
		let after = close + 2;
		if after == addr.len() {
			return Err(malformed("missing port in address"));
		}
		if after != last_colon {
			return Err(if addr.as_bytes()[after] == b':' {
				malformed("too many colons in address")
			} else {
				malformed("missing port in address")
			});
		}
		&bracketed[..close]
	} else {
		let host = &addr[..last_colon];
		if host.contains(':') {
			return Err(malformed("too many colons in address"));
		}
		host
	};

	if host.contains(['[', ']']) || addr[last_colon + 1..].contains(['[', ']']) {
		return Err(malformed("unexpected bracket in address"));
	}
	if host.is_empty() {
		return Err(malformed("empty host in address"));
	}

	Ok(host)
}


// vim: ts=4
