//! On-flash byte formats.
//!
//! This module centralizes the page serialization logic. Keeping the format
//! separate from the I/O orchestration (how pages are committed, retried and
//! recovered) makes format evolution easier to manage.
//!
//! # Module Structure
//!
//! - `page`: Page header layout, encoding, and structural validation

pub mod page;

pub use page::{Expectation, PageFault, PageFormat, PageHeader, PageVerdict, RoleMatch};
