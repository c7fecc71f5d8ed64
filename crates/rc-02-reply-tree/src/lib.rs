//! # RC-02 Reply Tree
//!
//! Measures how deep and how large the reply tree under a note is, and
//! broadcasts events to many relays at once.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Measurement
//!
//! Level-order traversal: each round asks every read relay for text notes
//! referencing the current frontier, drops excluded authors and notes that
//! only name a frontier event as their thread root, and continues with what
//! is left. `depth` counts non-empty rounds and `leaves` is the running total
//! of replies.
//!
//! The whole traversal races a deadline. On timeout the shared cancellation
//! token fires, in-flight relay queries stop, and the result is `TimedOut`.
//!
//! ## Module Structure
//!
//! ```text
//! rc-02-reply-tree/
//! ├── domain/          # Measurement, Frontier, classifier, errors
//! ├── algorithms/      # Traversal, deadline, broadcast
//! ├── ports/           # ReplyTreeApi (inbound), relay access (outbound), mocks
//! ├── application/     # ReplyTreeService
//! └── config.rs        # MeasureConfig
//! ```

#![warn(clippy::all)]

pub mod algorithms;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;

pub use algorithms::{measure_reply_tree, publish_to_endpoints, reply_round_filter, with_deadline};
pub use application::ReplyTreeService;
pub use config::MeasureConfig;
pub use domain::{
    EndpointResult, EndpointStatus, Frontier, MeasureReplyTreeResult, PublishOutcome,
    PublishReport, ReplyClassifier, ReplyTreeError, ReplyTreeMeasurement,
    RootReferenceClassifier, TraversalContext, DEFAULT_MEASURE_TIMEOUT_SECS,
    DEFAULT_PUBLISH_TIMEOUT_SECS,
};
pub use ports::{
    EventFetcher, InMemoryRelay, MockRelayBehavior, MockRelayConnector, RelayConnector,
    RelayHandle, ReplyTreeApi,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
