//! Selection state model for the monitoring dashboard selectors.
//!
//! - `state`: four selector families, page context, error map and signal token
//! - `outcome`: per-domain fetch error aggregation
//! - `signal`: dashboard redraw token and its watch-based emitter
//! - `dependency`: typed topology edge clicks
//! - `fetch`: transport and callback seams consumed by the cascade crate

pub mod config;
pub mod dependency;
pub mod error;
pub mod event;
pub mod fetch;
pub mod logging;
pub mod outcome;
pub mod signal;
pub mod state;
pub mod types;

pub use config::{CascadeConfig, LoggingConfig, SelectorSettings};
pub use dependency::*;
pub use error::*;
pub use event::*;
pub use fetch::*;
pub use logging::init_tracing;
pub use outcome::*;
pub use signal::*;
pub use state::*;
pub use types::*;
