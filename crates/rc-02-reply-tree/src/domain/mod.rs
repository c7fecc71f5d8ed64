//! # Domain Module
//!
//! Core types for reply-tree measurement.

pub mod classifier;
pub mod entities;
pub mod errors;
pub mod invariants;

pub use classifier::*;
pub use entities::*;
pub use errors::*;
pub use invariants::*;
