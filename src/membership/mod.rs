//! Cluster Membership
//!
//! Node descriptors produced by provisioning and the loader that turns a
//! descriptor file into a [`types::MembershipView`].
//!
//! Every hop keeps one descriptor file: the gatekeeper lists its trusted host,
//! the trusted host lists its proxy manager, and the proxy manager and the
//! primary share the database membership list. Files are read on every
//! request, never cached, so a reprovisioned cluster is picked up without a
//! restart.

pub mod loader;
pub mod types;
