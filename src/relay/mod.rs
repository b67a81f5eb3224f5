//! Hop-to-hop Relay
//!
//! Shared wire protocol and the HTTP client every hop uses to talk to the
//! next one. A forward is a single POST with a timeout; failures are folded
//! into structured JSON by [`client::into_reply`] instead of escaping as
//! transport errors.

pub mod client;
pub mod protocol;
