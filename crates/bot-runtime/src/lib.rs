//! # Reply-Chain Bot Runtime
//!
//! A Nostr bot that measures how deep and how large the reply tree under a
//! note is. Replying to a note with the trigger phrase asks the bot to
//! measure it.
//!
//! ## Modular Structure
//!
//! - `config` - TOML configuration with environment overrides
//! - `trigger` - Trigger detection
//! - `registry` - In-flight target registry
//! - `composer` - Signed response events
//! - `handler` - Per-trigger flow
//! - `runtime` - Subscription, event loop, shutdown
//! - `adapters/` - rc-02 port implementations over the relay pool
//!
//! ## Trigger Flow
//!
//! ```text
//! read relays ──kind 1──► event loop ──spawn──► TriggerHandler
//!                                                   │
//!                        fetch target ◄─────────────┤
//!                        publish 👌   ◄─────────────┤
//!                        measure (deadline) ◄───────┤
//!                        publish result ◄───────────┘──► write relays
//! ```

pub mod adapters;
pub mod composer;
pub mod config;
pub mod handler;
pub mod logging;
pub mod registry;
pub mod runtime;
pub mod trigger;

pub use composer::ResponseComposer;
pub use config::{BotConfig, ConfigError};
pub use handler::{HandlerError, HandlerOutcome, TriggerHandler};
pub use logging::init_logging;
pub use registry::{InFlightGuard, InFlightRegistry};
pub use runtime::{run_event_loop, BotRuntime};
pub use trigger::{IgnoreReason, TriggerDetector};
