//! Flash page format.
//!
//! Every physical page carries its payload first and a fixed 24-byte header
//! last, so a caller can fill the payload region of a page-sized buffer in
//! place and the header is stamped behind it without copying.
//!
//! # Page Layout
//!
//! ```text
//! ┌──────────────────────────────┬────────────────┬──────────┬───────────────┐
//! │ Payload (page_length - 24)   │ ByteCount (4)  │ Role (1) │ LogicalIdx (4)│
//! └──────────────────────────────┴────────────────┴──────────┴───────────────┘
//! ┌────────────┬──────────────┬────────────────┬───────────┬──────────┐
//! │ Family (1) │ Version (2)  │ TotalPages (4) │ Magic (4) │ CRC32 (4)│
//! └────────────┴──────────────┴────────────────┴───────────┴──────────┘
//! ```
//!
//! All integers are little-endian. The CRC covers every byte of the page
//! except the CRC field itself.
//!
//! # Validation Order
//!
//! magic → CRC → family tag → role → total pages → byte count → format
//! version. A page that passes everything but the version check is a
//! *foreign version*: structurally sound, written by another format.

use byteorder::{ByteOrder, LittleEndian};
use pagestore_core::{
    Error, Result, Role, StorageSettings, CURSOR_PAYLOAD_LEN, PAGE_HEADER_SIZE, PAGE_MAGIC,
    STORAGE_FAMILY_TAG,
};

// Field offsets relative to the start of the header.
const BYTE_COUNT_OFFSET: usize = 0;
const ROLE_OFFSET: usize = 4;
const INDEX_OFFSET: usize = 5;
const FAMILY_OFFSET: usize = 9;
const VERSION_OFFSET: usize = 10;
const TOTAL_PAGES_OFFSET: usize = 12;
const MAGIC_OFFSET: usize = 16;
const CRC_OFFSET: usize = 20;

/// Decoded page header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageHeader {
    /// Payload bytes in use
    pub byte_count: u32,
    /// Slot role the page was written for
    pub role: Role,
    /// Logical index the page was written for
    pub logical_index: u32,
    /// Format version the page was written with
    pub format_version: u16,
    /// Total page count of the store that wrote it
    pub total_pages: u32,
}

/// Which role bytes a physical slot accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleMatch {
    /// Only this role
    Exactly(Role),
    /// Either the current record or its backup
    NewestOrBackup,
}

impl RoleMatch {
    fn accepts(&self, role: Role) -> bool {
        match *self {
            RoleMatch::Exactly(expected) => role == expected,
            RoleMatch::NewestOrBackup => role.is_newest_or_backup(),
        }
    }
}

/// What the reader expects to find in a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expectation {
    /// Accepted role(s)
    pub role: RoleMatch,
    /// Required byte count, if the slot has a fixed payload size
    pub exact_byte_count: Option<u32>,
}

impl Expectation {
    /// A data slot holding `role`
    pub fn role(role: Role) -> Self {
        Expectation {
            role: RoleMatch::Exactly(role),
            exact_byte_count: None,
        }
    }

    /// A cursor-cache slot: fixed role and exactly the cursor payload length
    pub fn cursor(role: Role) -> Self {
        Expectation {
            role: RoleMatch::Exactly(role),
            exact_byte_count: Some(CURSOR_PAYLOAD_LEN as u32),
        }
    }

    /// Any page marked as the current record or its backup
    pub fn newest_or_backup() -> Self {
        Expectation {
            role: RoleMatch::NewestOrBackup,
            exact_byte_count: None,
        }
    }
}

/// Reason a page failed structural validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PageFault {
    /// Buffer length differs from the configured page length
    #[error("Page buffer is {actual} bytes, expected {expected}")]
    WrongLength {
        /// Length supplied
        actual: usize,
        /// Configured page length
        expected: usize,
    },

    /// Magic constant missing (erased, torn, or never written)
    #[error("Bad magic {found:#010x}")]
    BadMagic {
        /// Value found in the magic field
        found: u32,
    },

    /// CRC over the page does not match the stored CRC
    #[error("Checksum mismatch: stored {stored:08x}, computed {computed:08x}")]
    ChecksumMismatch {
        /// CRC stored in the page
        stored: u32,
        /// CRC computed over the page
        computed: u32,
    },

    /// Page belongs to another storage family
    #[error("Family tag {found:#04x} does not match")]
    FamilyMismatch {
        /// Tag found in the page
        found: u8,
    },

    /// Role byte is unknown or not accepted by this slot
    #[error("Role byte {found:#04x} not accepted for this slot")]
    RoleMismatch {
        /// Role byte found in the page
        found: u8,
    },

    /// Page was written for a store of another size
    #[error("Total pages {found} does not match configured {expected}")]
    TotalPagesMismatch {
        /// Value found in the page
        found: u32,
        /// Configured total
        expected: u32,
    },

    /// Byte count larger than the payload region
    #[error("Byte count {byte_count} exceeds payload capacity {capacity}")]
    ByteCountOverflow {
        /// Byte count found in the page
        byte_count: u32,
        /// Payload capacity
        capacity: usize,
    },

    /// Byte count differs from the slot's fixed payload size
    #[error("Byte count {byte_count}, slot requires exactly {expected}")]
    ByteCountMismatch {
        /// Byte count found in the page
        byte_count: u32,
        /// Required byte count
        expected: u32,
    },
}

/// Outcome of validating one page image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageVerdict {
    /// Valid at the configured format version
    Valid(PageHeader),
    /// Structurally valid but written with another format version
    ForeignVersion(PageHeader),
    /// Not a usable page
    Invalid(PageFault),
}

/// Page codec bound to one session's geometry and format version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageFormat {
    page_length: usize,
    total_pages: u32,
    format_version: u16,
}

impl PageFormat {
    /// Codec for the given settings.
    ///
    /// The settings must already have passed [`StorageSettings::validate`].
    pub fn new(settings: &StorageSettings) -> Self {
        PageFormat {
            page_length: settings.page_length,
            total_pages: settings.total_pages,
            format_version: settings.format_version,
        }
    }

    /// Full page length in bytes.
    pub fn page_length(&self) -> usize {
        self.page_length
    }

    /// Payload bytes per page.
    pub fn payload_capacity(&self) -> usize {
        self.page_length.saturating_sub(PAGE_HEADER_SIZE)
    }

    /// Configured format version.
    pub fn format_version(&self) -> u16 {
        self.format_version
    }

    /// Stamp the header and CRC behind the payload already in `page`.
    ///
    /// `checksum` receives every byte except the CRC field and is called
    /// exactly once.
    pub fn encode<F>(
        &self,
        page: &mut [u8],
        role: Role,
        logical_index: u32,
        byte_count: usize,
        checksum: F,
    ) -> Result<()>
    where
        F: FnOnce(&[u8]) -> Result<u32>,
    {
        if page.len() != self.page_length {
            return Err(Error::invalid_parameter(format!(
                "page buffer is {} bytes, page length is {}",
                page.len(),
                self.page_length
            )));
        }
        if byte_count > self.payload_capacity() {
            return Err(Error::invalid_parameter(format!(
                "byte count {} exceeds payload capacity {}",
                byte_count,
                self.payload_capacity()
            )));
        }

        let crc_at = self.payload_capacity() + CRC_OFFSET;
        {
            let header = &mut page[self.payload_capacity()..];
            LittleEndian::write_u32(&mut header[BYTE_COUNT_OFFSET..], byte_count as u32);
            header[ROLE_OFFSET] = role.as_byte();
            LittleEndian::write_u32(&mut header[INDEX_OFFSET..], logical_index);
            header[FAMILY_OFFSET] = STORAGE_FAMILY_TAG;
            LittleEndian::write_u16(&mut header[VERSION_OFFSET..], self.format_version);
            LittleEndian::write_u32(&mut header[TOTAL_PAGES_OFFSET..], self.total_pages);
            LittleEndian::write_u32(&mut header[MAGIC_OFFSET..], PAGE_MAGIC);
        }

        let crc = checksum(&page[..crc_at])?;
        LittleEndian::write_u32(&mut page[crc_at..], crc);
        Ok(())
    }

    /// Validate `page` against `expect`.
    ///
    /// `checksum` is called at most once, and not at all when the page is
    /// rejected before the CRC check. Only a checksum primitive failure is
    /// returned as `Err`; every content problem is a [`PageVerdict::Invalid`].
    pub fn decode<F>(&self, page: &[u8], expect: &Expectation, checksum: F) -> Result<PageVerdict>
    where
        F: FnOnce(&[u8]) -> Result<u32>,
    {
        if page.len() != self.page_length {
            return Ok(PageVerdict::Invalid(PageFault::WrongLength {
                actual: page.len(),
                expected: self.page_length,
            }));
        }

        let capacity = self.payload_capacity();
        let header = &page[capacity..];

        let magic = LittleEndian::read_u32(&header[MAGIC_OFFSET..]);
        if magic != PAGE_MAGIC {
            return Ok(PageVerdict::Invalid(PageFault::BadMagic { found: magic }));
        }

        let stored = LittleEndian::read_u32(&header[CRC_OFFSET..]);
        let computed = checksum(&page[..capacity + CRC_OFFSET])?;
        if computed != stored {
            return Ok(PageVerdict::Invalid(PageFault::ChecksumMismatch {
                stored,
                computed,
            }));
        }

        let family = header[FAMILY_OFFSET];
        if family != STORAGE_FAMILY_TAG {
            return Ok(PageVerdict::Invalid(PageFault::FamilyMismatch { found: family }));
        }

        let role_byte = header[ROLE_OFFSET];
        let role = match Role::from_byte(role_byte) {
            Some(role) if expect.role.accepts(role) => role,
            _ => return Ok(PageVerdict::Invalid(PageFault::RoleMismatch { found: role_byte })),
        };

        let total_pages = LittleEndian::read_u32(&header[TOTAL_PAGES_OFFSET..]);
        if total_pages != self.total_pages {
            return Ok(PageVerdict::Invalid(PageFault::TotalPagesMismatch {
                found: total_pages,
                expected: self.total_pages,
            }));
        }

        let byte_count = LittleEndian::read_u32(&header[BYTE_COUNT_OFFSET..]);
        if byte_count as usize > capacity {
            return Ok(PageVerdict::Invalid(PageFault::ByteCountOverflow {
                byte_count,
                capacity,
            }));
        }
        if let Some(expected) = expect.exact_byte_count {
            if byte_count != expected {
                return Ok(PageVerdict::Invalid(PageFault::ByteCountMismatch {
                    byte_count,
                    expected,
                }));
            }
        }

        let parsed = PageHeader {
            byte_count,
            role,
            logical_index: LittleEndian::read_u32(&header[INDEX_OFFSET..]),
            format_version: LittleEndian::read_u16(&header[VERSION_OFFSET..]),
            total_pages,
        };

        if parsed.format_version != self.format_version {
            return Ok(PageVerdict::ForeignVersion(parsed));
        }
        Ok(PageVerdict::Valid(parsed))
    }
}
