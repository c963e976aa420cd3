//! Cascade coordination for the monitoring dashboard selectors.
//!
//! A service pick commits immediately, then refreshes endpoints and instances
//! concurrently and, on dashboard pages, drives the redraw signal or the
//! caller's condition callback once those lists settle. View activation runs
//! the services -> endpoints -> instances chain in sequence.

pub mod command;
pub mod coordinator;
pub mod request;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use command::SelectionCommand;
pub use coordinator::{CascadeHandle, SelectionCoordinator};
pub use request::{ActivateRequest, CompType};

pub use selector_core::{
    DashboardSignal, DurationTime, ErrorDomain, Family, PageContext, SelectOption,
    SelectionEvent, SelectionState,
};
