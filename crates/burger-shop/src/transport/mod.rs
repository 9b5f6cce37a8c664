//! Transport layer for the shop.
//!
//! Currently provides a plain TCP line transport.

pub mod tcp;

pub use tcp::{ServeReport, ServerConfig, serve, serve_listener};
