//! Physical page placement.
//!
//! Placement is a pure function of the logical index, the role and the mode
//! flags; there is no allocation table on flash.
//!
//! ```text
//! physical page:  0 .. usable        usable .. 2*usable     total-2   total-1
//!                 ┌────────────────┬──────────────────────┬─────────┬─────────┐
//!                 │ primary slots  │ shadow slots (mirror)│ CURSOR-A│ CURSOR-B│
//!                 └────────────────┴──────────────────────┴─────────┴─────────┘
//! ```
//!
//! Without mirroring, the fallback of a NEWEST record at index `i` is the
//! NEWEST-BACKUP record at `i + 1` (wrapping), and vice versa. LOG records
//! have no fallback unless the store is mirrored.

use pagestore_core::{
    Error, Result, Role, SettingsError, StorageSettings, StoreOptions, CURSOR_CACHE_PAGES,
    CURSOR_PAYLOAD_LEN, MIN_USABLE_PAGES,
};

/// One physical instance of a record: the header it carries and where it lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    /// Role stamped into the header
    pub role: Role,
    /// Logical index stamped into the header
    pub index: u32,
    /// Physical page
    pub page: u32,
}

/// Derived placement for one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLayout {
    total_pages: u32,
    usable_pages: u32,
    cursor_cache: bool,
    mirror: bool,
}

impl PageLayout {
    /// Compute the layout, rejecting settings whose capacity does not work out.
    ///
    /// `usable = (cursor_cache ? total - 2 : total) / (mirror ? 2 : 1)`,
    /// which must be at least 2; a mirrored data region must be even.
    pub fn new(
        settings: &StorageSettings,
        options: StoreOptions,
    ) -> std::result::Result<Self, SettingsError> {
        settings.validate()?;

        if options.cursor_cache && settings.payload_capacity() < CURSOR_PAYLOAD_LEN {
            return Err(SettingsError::CursorDoesNotFit {
                capacity: settings.payload_capacity(),
                needed: CURSOR_PAYLOAD_LEN,
            });
        }

        let data_pages = if options.cursor_cache {
            settings.total_pages.saturating_sub(CURSOR_CACHE_PAGES)
        } else {
            settings.total_pages
        };
        let usable_pages = if options.mirror {
            data_pages / 2
        } else {
            data_pages
        };

        if usable_pages < MIN_USABLE_PAGES {
            return Err(SettingsError::TooFewPages {
                usable: usable_pages,
                minimum: MIN_USABLE_PAGES,
            });
        }
        if options.mirror && data_pages % 2 != 0 {
            return Err(SettingsError::OddMirrorRegion { data_pages });
        }

        Ok(PageLayout {
            total_pages: settings.total_pages,
            usable_pages,
            cursor_cache: options.cursor_cache,
            mirror: options.mirror,
        })
    }

    /// Logical pages available to callers.
    pub fn usable_pages(&self) -> u32 {
        self.usable_pages
    }

    /// Physical pages managed by the store.
    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    /// Whether the cursor-cache pages are reserved.
    pub fn cursor_cache_enabled(&self) -> bool {
        self.cursor_cache
    }

    /// Whether every data page has a shadow copy.
    pub fn mirror_enabled(&self) -> bool {
        self.mirror
    }

    /// Reject a logical index outside `[0, usable_pages)`.
    pub fn check_index(&self, index: u32) -> Result<()> {
        if index >= self.usable_pages {
            return Err(Error::invalid_parameter(format!(
                "logical index {} outside [0, {})",
                index, self.usable_pages
            )));
        }
        Ok(())
    }

    /// Primary slot of a data record.
    pub fn primary(&self, role: Role, index: u32) -> Slot {
        Slot {
            role,
            index,
            page: index,
        }
    }

    /// Shadow page of a data record, when mirroring.
    pub fn shadow(&self, index: u32) -> Option<u32> {
        self.mirror.then(|| index + self.usable_pages)
    }

    /// Slot consulted when the primary copy of a data record is unusable.
    pub fn fallback(&self, role: Role, index: u32) -> Option<Slot> {
        if let Some(page) = self.shadow(index) {
            return Some(Slot { role, index, page });
        }
        let counterpart = role.counterpart()?;
        let index = match role {
            Role::Newest => (index + 1) % self.usable_pages,
            Role::NewestBackup => (index + self.usable_pages - 1) % self.usable_pages,
            _ => return None,
        };
        Some(Slot {
            role: counterpart,
            index,
            page: index,
        })
    }

    /// The two cursor-cache slots (A, B), when the cache is enabled.
    ///
    /// Each cursor page records its own physical page as its logical index.
    pub fn cursor_slots(&self) -> Option<(Slot, Slot)> {
        if !self.cursor_cache {
            return None;
        }
        let a = self.total_pages - 2;
        let b = self.total_pages - 1;
        Some((
            Slot {
                role: Role::CursorA,
                index: a,
                page: a,
            },
            Slot {
                role: Role::CursorB,
                index: b,
                page: b,
            },
        ))
    }
}
