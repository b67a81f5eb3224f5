//! Proxy Manager
//!
//! Picks the database node that serves a request and relays the statement to it.
//!
//! ## Policies
//! - **DIRECT**: the unique primary, write endpoint.
//! - **RANDOM**: a uniformly random non-primary node, read endpoint.
//! - **CUSTOMIZED**: every non-primary node is probed once (bounded by the
//!   probe timeout); the lowest round trip wins, earlier nodes win ties; read endpoint.
//!
//! Membership is loaded from the descriptor file on every request and passed
//! into [`policy::QueryRouter::route`]; the router itself holds no cluster state.

pub mod handlers;
pub mod policy;
pub mod probe;
