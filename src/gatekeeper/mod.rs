//! Gatekeeper
//!
//! The only internet-facing hop. It owns one check, the statement allow-list in
//! [`sanitizer`], and relays everything that passes to the trusted host named
//! in its descriptor file, credentials headers included. Rejections happen
//! before the descriptor file is even read.

pub mod handlers;
pub mod sanitizer;
