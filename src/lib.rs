//! Pagestore - crash-safe page store for raw flash
//!
//! Pagestore durably stores fixed-size records on block-erasable storage
//! (NOR/NAND flash) without a filesystem. Every record is sealed with a CRC,
//! kept with a fallback copy, and rewritten with a verify-after-write commit,
//! so a power loss or a flipped bit never silently returns bad data.
//!
//! # Quick Start
//!
//! ```
//! use pagestore::testing::SimFlash;
//! use pagestore::{PageStore, Role, StorageSettings, StoreOptions};
//!
//! let settings = StorageSettings::for_testing();
//! let flash = SimFlash::new(settings.total_pages, settings.page_length);
//!
//! let mut store = PageStore::new();
//! store
//!     .init(flash, settings, [vec![0; 32], vec![0; 32]], StoreOptions::new().with_mirror(true))
//!     .unwrap();
//!
//! let (payload, _) = store.active_buffer().unwrap();
//! payload[..4].copy_from_slice(b"boot");
//! store.flush_page_as(Role::Newest, 0, 4).unwrap();
//! ```
//!
//! # Architecture
//!
//! - `pagestore-core`: errors, the [`FlashAdapter`] trait, settings, value types
//! - `pagestore-durability`: page format, layout, retrying I/O, redundancy
//! - `pagestore-engine`: the [`PageStore`] facade
//!
//! Internal layers stay reachable through their crates; this crate re-exports
//! what an application needs.

pub use pagestore_core::{
    seeded_crc32, AdapterFault, Cursor, CursorRead, Error, ErrorCategory, FlashAdapter,
    FlushOutcome, LoadStatus, PageLoad, Result, Role, SettingsError, StorageSettings,
    StoreOptions, ERASED_BYTE, PAGE_HEADER_SIZE,
};
pub use pagestore_durability::{testing, FileFlash};
pub use pagestore_engine::PageStore;
