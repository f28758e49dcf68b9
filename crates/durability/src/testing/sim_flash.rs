//! In-memory NOR flash double
//!
//! Programming can only clear bits (`page[i] &= byte`) and erase sets every
//! byte back to [`ERASED_BYTE`], so a write to a page that was not erased
//! first reads back differently, exactly as on real NOR flash.

use pagestore_core::{seeded_crc32, AdapterFault, FlashAdapter, ERASED_BYTE};

/// When an injected fault fires, counted over the calls it applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Fault {
    /// Never fail
    #[default]
    Never,
    /// Fail every call
    Always,
    /// Fail the first `n` calls, then succeed
    Times(u32),
    /// Succeed the first `n` calls, then fail every call
    After(u32),
}

impl Fault {
    fn fires(&self, seen: u32) -> bool {
        match *self {
            Fault::Never => false,
            Fault::Always => true,
            Fault::Times(n) => seen < n,
            Fault::After(n) => seen >= n,
        }
    }
}

/// Fault injection for each primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FaultPlan {
    /// Erase failures
    pub erase: Fault,
    /// Write failures
    pub write: Fault,
    /// Read failures
    pub read: Fault,
    /// Checksum failures (not filtered by page)
    pub checksum: Fault,
    /// Writes that succeed but leave one bit toggled in the stored page
    pub corrupt_writes: Fault,
    /// Restrict erase/write/read faults to this physical page
    pub only_page: Option<u32>,
}

/// Calls made to each primitive, failed calls included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CallCounts {
    /// `erase` calls
    pub erase: u32,
    /// `write` calls
    pub write: u32,
    /// `read` calls
    pub read: u32,
    /// `checksum` calls
    pub checksum: u32,
}

#[derive(Debug, Default)]
struct PlanProgress {
    erase: u32,
    write: u32,
    read: u32,
    checksum: u32,
    corrupt: u32,
}

/// Simulated flash device.
#[derive(Debug)]
pub struct SimFlash {
    pages: Vec<Vec<u8>>,
    plan: FaultPlan,
    progress: PlanProgress,
    counts: CallCounts,
}

impl SimFlash {
    /// A fully erased device.
    pub fn new(total_pages: u32, page_length: usize) -> Self {
        SimFlash {
            pages: vec![vec![ERASED_BYTE; page_length]; total_pages as usize],
            plan: FaultPlan::default(),
            progress: PlanProgress::default(),
            counts: CallCounts::default(),
        }
    }

    /// Replace the fault plan and restart its call accounting.
    pub fn set_plan(&mut self, plan: FaultPlan) {
        self.plan = plan;
        self.progress = PlanProgress::default();
    }

    /// Stop injecting faults.
    pub fn clear_plan(&mut self) {
        self.set_plan(FaultPlan::default());
    }

    /// Calls made since creation or the last [`reset_counts`](Self::reset_counts).
    pub fn counts(&self) -> CallCounts {
        self.counts
    }

    /// Zero the call counters.
    pub fn reset_counts(&mut self) {
        self.counts = CallCounts::default();
    }

    /// Number of pages.
    pub fn total_pages(&self) -> u32 {
        self.pages.len() as u32
    }

    /// Raw contents of a page.
    ///
    /// # Panics
    ///
    /// Panics if `page` is out of range.
    pub fn page(&self, page: u32) -> &[u8] {
        &self.pages[page as usize]
    }

    /// Mutable raw contents of a page, bypassing flash semantics.
    ///
    /// # Panics
    ///
    /// Panics if `page` is out of range.
    pub fn page_mut(&mut self, page: u32) -> &mut [u8] {
        &mut self.pages[page as usize]
    }

    /// Toggle one bit of a stored page.
    ///
    /// # Panics
    ///
    /// Panics if `page`, `byte` or `bit` is out of range.
    pub fn flip_bit(&mut self, page: u32, byte: usize, bit: u8) {
        assert!(bit < 8, "bit {} out of range", bit);
        self.pages[page as usize][byte] ^= 1 << bit;
    }

    /// Reset a page to the erased state, bypassing the call counters.
    pub fn wipe(&mut self, page: u32) {
        self.pages[page as usize].fill(ERASED_BYTE);
    }

    fn applies_to(&self, page: u32) -> bool {
        self.plan.only_page.map_or(true, |only| only == page)
    }

    fn slot(&mut self, page: u32, len: usize) -> Result<&mut Vec<u8>, AdapterFault> {
        let slot = self
            .pages
            .get_mut(page as usize)
            .ok_or_else(|| AdapterFault::device(format!("page {} out of range", page)))?;
        if slot.len() != len {
            return Err(AdapterFault::device(format!(
                "buffer of {} bytes for a {}-byte page",
                len,
                slot.len()
            )));
        }
        Ok(slot)
    }
}

impl FlashAdapter for SimFlash {
    fn erase(&mut self, page: u32) -> Result<(), AdapterFault> {
        self.counts.erase += 1;
        if self.applies_to(page) {
            let seen = self.progress.erase;
            self.progress.erase += 1;
            if self.plan.erase.fires(seen) {
                return Err(AdapterFault::device("injected erase fault"));
            }
        }
        let len = self.pages.first().map_or(0, Vec::len);
        self.slot(page, len)?.fill(ERASED_BYTE);
        Ok(())
    }

    fn write(&mut self, page: u32, bytes: &[u8]) -> Result<(), AdapterFault> {
        self.counts.write += 1;
        let mut corrupt = false;
        if self.applies_to(page) {
            let seen = self.progress.write;
            self.progress.write += 1;
            if self.plan.write.fires(seen) {
                return Err(AdapterFault::device("injected write fault"));
            }
            let seen = self.progress.corrupt;
            self.progress.corrupt += 1;
            corrupt = self.plan.corrupt_writes.fires(seen);
        }
        let slot = self.slot(page, bytes.len())?;
        for (cell, byte) in slot.iter_mut().zip(bytes) {
            *cell &= *byte;
        }
        if corrupt {
            if let Some(first) = slot.first_mut() {
                *first ^= 0x01;
            }
        }
        Ok(())
    }

    fn read(&mut self, page: u32, buf: &mut [u8]) -> Result<(), AdapterFault> {
        self.counts.read += 1;
        if self.applies_to(page) {
            let seen = self.progress.read;
            self.progress.read += 1;
            if self.plan.read.fires(seen) {
                return Err(AdapterFault::device("injected read fault"));
            }
        }
        let slot = self.slot(page, buf.len())?;
        buf.copy_from_slice(slot);
        Ok(())
    }

    fn checksum(&mut self, seed: u32, bytes: &[u8]) -> Result<u32, AdapterFault> {
        self.counts.checksum += 1;
        let seen = self.progress.checksum;
        self.progress.checksum += 1;
        if self.plan.checksum.fires(seen) {
            return Err(AdapterFault::device("injected checksum fault"));
        }
        Ok(seeded_crc32(seed, bytes))
    }
}
