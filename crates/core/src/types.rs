//! Value types shared across the page store layers

use crate::limits::CURSOR_PAYLOAD_LEN;
use byteorder::{ByteOrder, LittleEndian};
use std::fmt;

/// Which redundant slot a physical page instance represents.
///
/// The role byte is written into every page header and checked on read, so a
/// page can never be mistaken for a copy playing a different part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Role {
    /// Bulk append-only record, addressed by logical index
    Log = 0x01,
    /// The single "current" record
    Newest = 0x02,
    /// Backup of the current record, mutually recoverable with `Newest`
    NewestBackup = 0x03,
    /// First cursor-cache page (primary copy)
    CursorA = 0x04,
    /// Second cursor-cache page (fallback copy)
    CursorB = 0x05,
}

impl Role {
    /// All roles, in byte order
    pub const ALL: [Role; 5] = [
        Role::Log,
        Role::Newest,
        Role::NewestBackup,
        Role::CursorA,
        Role::CursorB,
    ];

    /// The byte stored in the page header
    pub fn as_byte(self) -> u8 {
        self as u8
    }

    /// Parse a header role byte
    pub fn from_byte(byte: u8) -> Option<Role> {
        Role::ALL.into_iter().find(|role| role.as_byte() == byte)
    }

    /// The role that holds the mutually recoverable copy, if any
    pub fn counterpart(self) -> Option<Role> {
        match self {
            Role::Log => None,
            Role::Newest => Some(Role::NewestBackup),
            Role::NewestBackup => Some(Role::Newest),
            Role::CursorA => Some(Role::CursorB),
            Role::CursorB => Some(Role::CursorA),
        }
    }

    /// Whether this role belongs to the dedicated cursor-cache pages
    pub fn is_cursor(self) -> bool {
        matches!(self, Role::CursorA | Role::CursorB)
    }

    /// Whether this role marks the current record or its backup
    pub fn is_newest_or_backup(self) -> bool {
        matches!(self, Role::Newest | Role::NewestBackup)
    }

    /// Short human-readable name
    pub fn name(self) -> &'static str {
        match self {
            Role::Log => "log",
            Role::Newest => "newest",
            Role::NewestBackup => "newest-backup",
            Role::CursorA => "cursor-a",
            Role::CursorB => "cursor-b",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Append position persisted in the cursor cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cursor {
    /// Logical index of the newest written page
    pub newest_page_index: u32,
    /// Number of logical pages that hold data
    pub filled_page_count: u32,
}

impl Cursor {
    /// Create a cursor
    pub fn new(newest_page_index: u32, filled_page_count: u32) -> Self {
        Cursor {
            newest_page_index,
            filled_page_count,
        }
    }

    /// Serialize to the 8-byte cursor payload
    ///
    /// Format: newest_page_index (u32 LE) + filled_page_count (u32 LE)
    pub fn to_bytes(&self) -> [u8; CURSOR_PAYLOAD_LEN] {
        let mut bytes = [0u8; CURSOR_PAYLOAD_LEN];
        LittleEndian::write_u32(&mut bytes[0..4], self.newest_page_index);
        LittleEndian::write_u32(&mut bytes[4..8], self.filled_page_count);
        bytes
    }

    /// Deserialize from a cursor payload, `None` when fewer than 8 bytes are given
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < CURSOR_PAYLOAD_LEN {
            return None;
        }
        Some(Cursor {
            newest_page_index: LittleEndian::read_u32(&bytes[0..4]),
            filled_page_count: LittleEndian::read_u32(&bytes[4..8]),
        })
    }
}

/// How trustworthy a successfully loaded record is.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    /// The primary copy was valid at the configured format version
    Intact,
    /// The primary copy was unusable and the fallback copy was returned.
    ///
    /// The caller should rewrite the slot to restore full redundancy.
    Recovered,
    /// The primary copy is structurally valid but written with another format
    /// version. The payload is still decoded; the fallback was not consulted.
    ForeignVersion {
        /// Format version found in the page header
        version: u16,
    },
}

impl LoadStatus {
    /// True when the data came from the fallback copy
    pub fn is_recovered(&self) -> bool {
        matches!(self, LoadStatus::Recovered)
    }

    /// True when the page carries a foreign format version
    pub fn is_foreign_version(&self) -> bool {
        matches!(self, LoadStatus::ForeignVersion { .. })
    }
}

/// Result of loading a data page into the active buffer.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLoad {
    /// Number of payload bytes now at the start of the active buffer
    pub byte_count: usize,
    /// Which copy supplied the data
    pub status: LoadStatus,
}

/// Result of reading the cursor cache.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorRead {
    /// Decoded counters
    pub cursor: Cursor,
    /// Which cursor page supplied them
    pub status: LoadStatus,
}

/// Outcome of a conditional flush.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    /// Stored payload already matched; flash was not touched
    Unchanged {
        /// The comparison read had to use the fallback copy
        recovered: bool,
    },
    /// The page was committed
    Written {
        /// The comparison read had to use the fallback copy
        recovered: bool,
    },
}

impl FlushOutcome {
    /// True when the comparison read observed a recovery
    pub fn recovered(&self) -> bool {
        match *self {
            FlushOutcome::Unchanged { recovered } | FlushOutcome::Written { recovered } => {
                recovered
            }
        }
    }

    /// True when flash was erased and programmed
    pub fn was_written(&self) -> bool {
        matches!(self, FlushOutcome::Written { .. })
    }
}
