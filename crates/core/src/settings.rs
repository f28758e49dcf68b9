//! Session configuration
//!
//! `StorageSettings` describes the flash geometry and format; `StoreOptions`
//! selects which optional regions (cursor cache, whole-store mirror) the
//! layout reserves. Both are plain values built with the builder pattern and
//! checked with `validate()` before a session starts.

use crate::limits::PAGE_HEADER_SIZE;

/// Per-session storage parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageSettings {
    /// Number of physical pages available to the store
    pub total_pages: u32,

    /// Length of one page in bytes, header included
    pub page_length: usize,

    /// Attempts per commit or read before a stage-specific error is returned
    /// (default: 3)
    pub retry_count: u32,

    /// Format version stamped into every page and expected on read
    /// (default: 1)
    pub format_version: u16,
}

impl StorageSettings {
    /// Create settings for the given geometry with default retry count and
    /// format version.
    pub fn new(total_pages: u32, page_length: usize) -> Self {
        StorageSettings {
            total_pages,
            page_length,
            retry_count: 3,
            format_version: 1,
        }
    }

    /// Set retry count (builder pattern).
    pub fn with_retry_count(mut self, retry_count: u32) -> Self {
        self.retry_count = retry_count;
        self
    }

    /// Set format version (builder pattern).
    pub fn with_format_version(mut self, format_version: u16) -> Self {
        self.format_version = format_version;
        self
    }

    /// Create settings for testing: 14 pages of 32 bytes (8 payload bytes).
    pub fn for_testing() -> Self {
        StorageSettings::new(14, 32)
    }

    /// Bytes available for payload in each page.
    ///
    /// Zero when the page cannot even hold a header.
    pub fn payload_capacity(&self) -> usize {
        self.page_length.saturating_sub(PAGE_HEADER_SIZE)
    }

    /// Validate the settings on their own (capacity is checked against the
    /// chosen `StoreOptions` when the layout is computed).
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.retry_count == 0 {
            return Err(SettingsError::ZeroRetryCount);
        }
        if self.page_length <= PAGE_HEADER_SIZE {
            return Err(SettingsError::PageTooSmall {
                page_length: self.page_length,
            });
        }
        if self.payload_capacity() > u32::MAX as usize {
            return Err(SettingsError::PageTooLarge {
                page_length: self.page_length,
            });
        }
        Ok(())
    }
}

/// Optional layout regions chosen at init.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StoreOptions {
    /// Reserve the two highest pages for the append-cursor cache
    pub cursor_cache: bool,

    /// Keep a shadow copy of every data page in the upper half of the data region
    pub mirror: bool,
}

impl StoreOptions {
    /// Options with no cursor cache and no mirror.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable the cursor cache (builder pattern).
    pub fn with_cursor_cache(mut self, enabled: bool) -> Self {
        self.cursor_cache = enabled;
        self
    }

    /// Enable or disable whole-store mirroring (builder pattern).
    pub fn with_mirror(mut self, enabled: bool) -> Self {
        self.mirror = enabled;
        self
    }
}

/// Settings validation errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    /// Retry count must allow at least one attempt.
    #[error("Retry count must be at least 1")]
    ZeroRetryCount,

    /// Page cannot hold the header plus at least one payload byte.
    #[error("Page length {page_length} must exceed the 24-byte header")]
    PageTooSmall {
        /// Configured page length
        page_length: usize,
    },

    /// Payload capacity does not fit the 32-bit byte-count field.
    #[error("Page length {page_length} exceeds the 32-bit byte-count field")]
    PageTooLarge {
        /// Configured page length
        page_length: usize,
    },

    /// Fewer logical pages than the layout minimum.
    #[error("Layout yields {usable} usable pages, at least {minimum} required")]
    TooFewPages {
        /// Usable pages the layout would provide
        usable: u32,
        /// Minimum required
        minimum: u32,
    },

    /// Mirror mode needs an even number of data pages.
    #[error("Mirror mode needs an even data region, got {data_pages} pages")]
    OddMirrorRegion {
        /// Pages left for data after any cursor-cache reservation
        data_pages: u32,
    },

    /// Cursor cache enabled but the payload cannot hold both counters.
    #[error("Payload capacity {capacity} cannot hold the {needed}-byte cursor")]
    CursorDoesNotFit {
        /// Payload capacity per page
        capacity: usize,
        /// Bytes the cursor needs
        needed: usize,
    },

    /// A supplied working buffer has the wrong length.
    #[error("Working buffer {which} is {actual} bytes, expected exactly {expected}")]
    BufferSize {
        /// Which buffer (0 or 1)
        which: usize,
        /// Length supplied
        actual: usize,
        /// Required length (the page length)
        expected: usize,
    },
}
