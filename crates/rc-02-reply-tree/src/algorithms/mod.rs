//! # Algorithms Module
//!
//! Breadth-first traversal, deadline coordination and broadcast.

pub mod broadcast;
pub mod deadline;
pub mod traversal;

pub use broadcast::publish_to_endpoints;
pub use deadline::with_deadline;
pub use traversal::{measure_reply_tree, reply_round_filter};
