//! Core types and traits for the flash page store
//!
//! This crate defines the foundational types shared by every layer:
//! - Error: Error type hierarchy (contract, integrity, hardware, data faults)
//! - FlashAdapter: The injected erase/write/read/checksum primitives
//! - Role: Which redundant slot a physical page represents
//! - Cursor: The append-position counters kept in the cursor cache
//! - StorageSettings / StoreOptions: Per-session configuration
//! - Limits: Fixed format constants (header size, magic, family tag)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod limits;
pub mod settings;
pub mod traits;
pub mod types;

pub use error::{AdapterFault, Error, ErrorCategory, Result};
pub use limits::{
    CURSOR_CACHE_PAGES, CURSOR_PAYLOAD_LEN, ERASED_BYTE, MIN_USABLE_PAGES, PAGE_CRC_SEED,
    PAGE_HEADER_SIZE, PAGE_MAGIC, STORAGE_FAMILY_TAG,
};
pub use settings::{SettingsError, StorageSettings, StoreOptions};
pub use traits::{seeded_crc32, FlashAdapter};
pub use types::{Cursor, CursorRead, FlushOutcome, LoadStatus, PageLoad, Role};
