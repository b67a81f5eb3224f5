//! Trusted Host
//!
//! The authenticated boundary between the gatekeeper and the proxy manager.
//! A request is forwarded only after two checks, in order:
//!
//! 1. **Envelope**: `query` and `mode` are present and the mode is DIRECT,
//!    RANDOM or CUSTOMIZED (any case). Failure is a 400.
//! 2. **Credentials**: the `username` / `password` headers equal the single
//!    configured pair. Failure is a 401.
//!
//! Credentials are checked nowhere else in the chain, and they are not
//! forwarded past this hop.

pub mod auth;
pub mod handlers;

#[cfg(test)]
mod tests;
