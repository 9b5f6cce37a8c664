//! Wire layer between customers and the shop.
//!
//! - `protocol`: typed requests/responses and session identifiers
//! - `codec`: newline framing over any `AsyncRead`/`AsyncWrite`

pub mod codec;
pub mod protocol;
