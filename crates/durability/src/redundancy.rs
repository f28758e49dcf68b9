//! Redundant record reads and writes.
//!
//! Every record lives in a primary slot and, depending on the mode, has a
//! fallback slot (see [`crate::layout`]). Reads fall back only on a content
//! fault of the primary copy; an I/O failure or a foreign format version is
//! reported as is. Writes only ever touch the primary slot and, in mirror
//! mode, its shadow.

use crate::format::{Expectation, PageFormat, PageHeader, PageVerdict, RoleMatch};
use crate::layout::{PageLayout, Slot};
use crate::retry::RetryingIo;
use pagestore_core::{Error, FlashAdapter, FlushOutcome, LoadStatus, Result, Role};
use tracing::{debug, warn};

/// A successfully read record: its header and where it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordRead {
    /// Header of the copy that was returned
    pub header: PageHeader,
    /// Which copy was returned
    pub status: LoadStatus,
}

impl RecordRead {
    /// Payload length of the returned copy
    pub fn byte_count(&self) -> usize {
        self.header.byte_count as usize
    }
}

/// Redundancy and recovery over one session's layout.
pub struct RecordEngine<'a, A: FlashAdapter> {
    io: RetryingIo<'a, A>,
    format: &'a PageFormat,
    layout: &'a PageLayout,
}

impl<'a, A: FlashAdapter> RecordEngine<'a, A> {
    /// Bind an engine to an adapter for the duration of one operation.
    pub fn new(
        adapter: &'a mut A,
        retry_count: u32,
        format: &'a PageFormat,
        layout: &'a PageLayout,
    ) -> Self {
        RecordEngine {
            io: RetryingIo::new(adapter, retry_count),
            format,
            layout,
        }
    }

    /// Placement in use.
    pub fn layout(&self) -> &PageLayout {
        self.layout
    }

    /// Read data record `(role, index)` into `buf`.
    ///
    /// On success `buf` holds the page that was returned, payload first.
    pub fn read_record(&mut self, role: Role, index: u32, buf: &mut [u8]) -> Result<RecordRead> {
        let primary = self.layout.primary(role, index);
        let fallback = self.layout.fallback(role, index);
        self.read_slots(primary, fallback, None, buf)
    }

    /// Read `primary`, falling back to `fallback` on a content fault.
    ///
    /// `exact_byte_count` constrains both copies when the slot has a fixed
    /// payload size.
    pub fn read_slots(
        &mut self,
        primary: Slot,
        fallback: Option<Slot>,
        exact_byte_count: Option<u32>,
        buf: &mut [u8],
    ) -> Result<RecordRead> {
        let expect = |slot: &Slot| Expectation {
            role: RoleMatch::Exactly(slot.role),
            exact_byte_count,
        };

        let fault = match self.query(primary.page, &expect(&primary), buf)? {
            PageVerdict::Valid(header) => {
                return Ok(RecordRead {
                    header,
                    status: LoadStatus::Intact,
                })
            }
            PageVerdict::ForeignVersion(header) => {
                warn!(
                    page = primary.page,
                    role = %primary.role,
                    index = primary.index,
                    version = header.format_version,
                    "Record written with a foreign format version"
                );
                return Ok(RecordRead {
                    header,
                    status: LoadStatus::ForeignVersion {
                        version: header.format_version,
                    },
                });
            }
            PageVerdict::Invalid(fault) => fault,
        };

        warn!(
            page = primary.page,
            role = %primary.role,
            index = primary.index,
            %fault,
            "Primary copy invalid"
        );
        let unrecoverable = Error::UnrecoverableData {
            role: primary.role,
            index: primary.index,
        };
        let fallback = match fallback {
            Some(slot) => slot,
            None => return Err(unrecoverable),
        };

        match self.query(fallback.page, &expect(&fallback), buf)? {
            PageVerdict::Valid(header) => {
                warn!(
                    page = fallback.page,
                    role = %fallback.role,
                    index = fallback.index,
                    "Recovered record from fallback copy"
                );
                Ok(RecordRead {
                    header,
                    status: LoadStatus::Recovered,
                })
            }
            PageVerdict::ForeignVersion(header) => {
                warn!(
                    page = fallback.page,
                    version = header.format_version,
                    "Fallback copy has a foreign format version"
                );
                Err(unrecoverable)
            }
            PageVerdict::Invalid(fault) => {
                warn!(page = fallback.page, %fault, "Fallback copy invalid");
                Err(unrecoverable)
            }
        }
    }

    /// Stamp and commit data record `(role, index)`.
    ///
    /// `image` holds the payload in its first `byte_count` bytes; the header
    /// is written behind it in place. `verify` receives the read-back and is
    /// clobbered.
    pub fn write_record(
        &mut self,
        role: Role,
        index: u32,
        byte_count: usize,
        image: &mut [u8],
        verify: &mut [u8],
    ) -> Result<()> {
        let primary = self.layout.primary(role, index);
        self.stamp(primary, byte_count, image)?;
        self.io.commit(primary.page, image, verify)?;
        if let Some(shadow) = self.layout.shadow(index) {
            self.io.commit(shadow, image, verify)?;
        }
        Ok(())
    }

    /// Write `(role, index)` only if the stored payload differs.
    ///
    /// The comparison read lands in `scratch`. A data fault during the
    /// comparison counts as "different"; hardware faults propagate.
    pub fn write_record_if_different(
        &mut self,
        role: Role,
        index: u32,
        byte_count: usize,
        image: &mut [u8],
        scratch: &mut [u8],
    ) -> Result<FlushOutcome> {
        let recovered = match self.read_record(role, index, scratch) {
            Ok(stored) => {
                let current = !stored.status.is_foreign_version();
                if current
                    && stored.byte_count() == byte_count
                    && scratch[..byte_count] == image[..byte_count]
                {
                    debug!(role = %role, index, "Stored record unchanged, skipping write");
                    return Ok(FlushOutcome::Unchanged {
                        recovered: stored.status.is_recovered(),
                    });
                }
                stored.status.is_recovered()
            }
            Err(Error::UnrecoverableData { .. }) => false,
            Err(e) => return Err(e),
        };

        self.write_record(role, index, byte_count, image, scratch)?;
        Ok(FlushOutcome::Written { recovered })
    }

    /// Whether logical page `index` currently holds a NEWEST or NEWEST-BACKUP
    /// record at the configured version.
    ///
    /// In mirror mode the shadow is checked when the primary is invalid.
    pub fn is_newest_or_backup(&mut self, index: u32, scratch: &mut [u8]) -> Result<bool> {
        let expect = Expectation::newest_or_backup();
        match self.query(index, &expect, scratch)? {
            PageVerdict::Valid(_) => return Ok(true),
            PageVerdict::ForeignVersion(_) => return Ok(false),
            PageVerdict::Invalid(_) => {}
        }
        match self.layout.shadow(index) {
            Some(shadow) => Ok(matches!(
                self.query(shadow, &expect, scratch)?,
                PageVerdict::Valid(_)
            )),
            None => Ok(false),
        }
    }

    /// Stamp the header for `slot` into `image`.
    pub fn stamp(&mut self, slot: Slot, byte_count: usize, image: &mut [u8]) -> Result<()> {
        let io = &mut self.io;
        self.format
            .encode(image, slot.role, slot.index, byte_count, |bytes| io.checksum(bytes))
    }

    /// Commit an already stamped image to one physical page.
    pub fn commit(&mut self, page: u32, image: &[u8], verify: &mut [u8]) -> Result<()> {
        self.io.commit(page, image, verify)
    }

    fn query(&mut self, page: u32, expect: &Expectation, buf: &mut [u8]) -> Result<PageVerdict> {
        self.io.query(page, buf)?;
        let io = &mut self.io;
        self.format.decode(buf, expect, |bytes| io.checksum(bytes))
    }
}
