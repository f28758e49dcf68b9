//! Fixed page-format constants
//!
//! These values are part of the on-flash format. Changing any of them makes
//! every previously written page unreadable, so they are FROZEN for a given
//! storage family.

/// Size of the page header in bytes (byte count, role, index, family tag,
/// format version, total pages, magic, CRC32).
pub const PAGE_HEADER_SIZE: usize = 24;

/// Magic constant identifying a page written by this store: "PGST"
pub const PAGE_MAGIC: u32 = u32::from_le_bytes(*b"PGST");

/// Storage-family tag. Pages carrying another tag belong to a different
/// on-flash family and are rejected as invalid.
pub const STORAGE_FAMILY_TAG: u8 = 0xA7;

/// Seed handed to the checksum primitive for every page CRC
pub const PAGE_CRC_SEED: u32 = 0xFFFF_FFFF;

/// Payload length of a cursor-cache page (two little-endian u32 counters)
pub const CURSOR_PAYLOAD_LEN: usize = 8;

/// Number of physical pages reserved at the top of flash for the cursor cache
pub const CURSOR_CACHE_PAGES: u32 = 2;

/// Minimum number of logical pages a layout must expose
pub const MIN_USABLE_PAGES: u32 = 2;

/// Value of every byte of an erased flash page
pub const ERASED_BYTE: u8 = 0xFF;
