//! Working buffers owned by a session

use pagestore_core::{Error, Result, SettingsError};

/// The two page-sized buffers a session works in.
///
/// The *active* buffer is the caller's view: payloads are placed there before
/// a flush and appear there after a load. The *scratch* buffer receives
/// read-backs and comparison reads.
#[derive(Debug)]
pub struct WorkBuffers {
    active: Vec<u8>,
    scratch: Vec<u8>,
}

impl WorkBuffers {
    /// Take ownership of two caller-supplied buffers of exactly `page_length`.
    pub fn new(buffers: [Vec<u8>; 2], page_length: usize) -> Result<Self> {
        for (which, buf) in buffers.iter().enumerate() {
            if buf.is_empty() {
                return Err(Error::Pointer("working buffer"));
            }
            if buf.len() != page_length {
                return Err(SettingsError::BufferSize {
                    which,
                    actual: buf.len(),
                    expected: page_length,
                }
                .into());
            }
        }
        let [active, scratch] = buffers;
        Ok(WorkBuffers { active, scratch })
    }

    /// Both buffers, active first.
    pub fn split(&mut self) -> (&mut [u8], &mut [u8]) {
        (&mut self.active, &mut self.scratch)
    }

    /// True while both buffers are exactly `page_length` long.
    pub fn fits(&self, page_length: usize) -> bool {
        self.active.len() == page_length && self.scratch.len() == page_length
    }

    /// Hand the buffers back.
    pub fn into_inner(self) -> [Vec<u8>; 2] {
        [self.active, self.scratch]
    }

    #[cfg(test)]
    pub(crate) fn shrink_scratch(&mut self) {
        self.scratch.pop();
    }
}
