//! Replicated SQL Gateway Cluster Library
//!
//! A client statement travels a fixed chain of HTTP hops before it reaches a
//! database node:
//!
//! `client -> gatekeeper -> trusted host -> proxy manager -> primary | replica`
//!
//! ## Modules
//! - **`gatekeeper`**: public edge. Rejects statements outside the character
//!   allow-list before any downstream call.
//! - **`trusted_host`**: validates the `{query, mode}` envelope and the
//!   `username` / `password` headers.
//! - **`proxy`**: applies the DIRECT, RANDOM or CUSTOMIZED routing policy over
//!   the current membership, probing replica latency when asked to.
//! - **`node`**: executes statements against SQLite. The primary replicates
//!   every write to the other nodes and reports one outcome per node.
//! - **`membership`**: descriptor files (`*_info.json`), re-read on every request.
//! - **`relay`**: wire types and the single-shot HTTP client shared by all hops.
//! - **`config`** / **`server`**: per-role settings and the router wiring used by the binary.

pub mod config;
pub mod error;
pub mod gatekeeper;
pub mod membership;
pub mod node;
pub mod proxy;
pub mod relay;
pub mod server;
pub mod trusted_host;

#[cfg(test)]
pub mod testing;
