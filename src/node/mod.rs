//! Database Nodes
//!
//! Replicas execute statements locally. The primary does the same for reads,
//! and for writes executes locally before forwarding the statement to every
//! other node in its membership file.
//!
//! `/write` on the primary answers an ordered array of outcomes: its own
//! first, then one per replica in membership order. A replica that fails or
//! cannot be reached shows up as a failed outcome; the reply is still 200.

pub mod database;
pub mod handlers;
pub mod replication;
