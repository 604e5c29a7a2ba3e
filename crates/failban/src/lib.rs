//! Ban guard middleware.
//!
//! Tracks client error (4xx) responses per client and, once a client has
//! produced `number_fails` of them, answers its further requests with 403
//! without calling the wrapped service. Bans expire `ban_time` after the
//! client's last offense; a banned client that keeps knocking keeps pushing
//! that point forward.
//!
//! ```no_run
//! use axum::{Router, routing::get};
//! use failban::{BanGuard, GuardConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> Result<(), failban::ConfigError> {
//! let shutdown = CancellationToken::new();
//! let guard = BanGuard::new("api", &GuardConfig::default(), &shutdown)?;
//! let app: Router = Router::new().route("/", get(|| async { "ok" })).layer(guard.layer());
//! # Ok(())
//! # }
//! ```

#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod identity;
pub mod logging;
pub mod middleware;
pub mod observer;
pub mod prelude;
pub mod reaper;
pub mod record;
pub mod table;

pub use config::{GuardConfig, GuardSettings, parse_duration};
pub use error::{ConfigError, IdentityError};
pub use identity::{RemoteAddr, resolve_client};
pub use logging::{LogLevel, init_tracing};
pub use middleware::{BanGuard, BanGuardLayer, BanGuardService, GuardStats};
pub use observer::{ResponseObserver, is_bad_response};
pub use reaper::Reaper;
pub use record::ClientRecord;
pub use table::{BanTable, BanTableStats};

// vim: ts=4
