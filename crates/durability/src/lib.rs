//! Durability layer for the page store
//!
//! This crate handles everything that touches flash:
//!
//! - Binary page format: payload plus a CRC-sealed 24-byte header
//! - Page layout: fixed placement of primaries, shadows and cursor pages
//! - Retrying I/O: erase → write → read-back → verify, bounded attempts
//! - Redundancy: fallback reads, mirrored writes, conditional writes
//! - Append-cursor cache: two-phase A/B cursor pages
//! - File-backed flash image for host tooling
//! - Simulated flash with fault injection for tests

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod cursor; // Append-cursor cache (CURSOR-A / CURSOR-B)
pub mod file_flash; // Flash image file driver
pub mod format; // Binary page format
pub mod layout; // Physical placement of records
pub mod redundancy; // Fallback reads and mirrored writes
pub mod retry; // Retry-wrapped adapter primitives
pub mod testing; // Simulated flash and fault plans

// === Re-exports ===
pub use cursor::{read_cursor, write_cursor};
pub use file_flash::FileFlash;
pub use format::{Expectation, PageFault, PageFormat, PageHeader, PageVerdict, RoleMatch};
pub use layout::{PageLayout, Slot};
pub use redundancy::{RecordEngine, RecordRead};
pub use retry::{CommitStage, RetryingIo};
