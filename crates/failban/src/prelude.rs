//! Common imports used throughout the crate

pub use tracing::{debug, debug_span, info, warn};

// vim: ts=4
