//! Testing utilities for the page store
//!
//! [`SimFlash`] is an in-memory flash device with scripted faults and call
//! counters. It backs the unit and integration tests of every crate in the
//! workspace.
//!
//! # Example
//!
//! ```
//! use pagestore_durability::testing::{Fault, FaultPlan, SimFlash};
//!
//! let mut flash = SimFlash::new(14, 32);
//! flash.set_plan(FaultPlan {
//!     write: Fault::Times(1),
//!     ..FaultPlan::default()
//! });
//! ```

mod sim_flash;

pub use sim_flash::{CallCounts, Fault, FaultPlan, SimFlash};
