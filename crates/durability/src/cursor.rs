//! Append-cursor cache
//!
//! Two fixed pages at the top of the device hold the same [`Cursor`]. Writes
//! go to CURSOR-A first and to CURSOR-B only once A is committed, so at any
//! moment at least one of them holds a complete value.

use crate::layout::Slot;
use crate::redundancy::RecordEngine;
use pagestore_core::{Cursor, CursorRead, Error, FlashAdapter, Result, CURSOR_PAYLOAD_LEN};
use tracing::debug;

/// Read the cursor, preferring CURSOR-A.
///
/// Both buffers are used as scratch.
pub fn read_cursor<A: FlashAdapter>(
    engine: &mut RecordEngine<'_, A>,
    buf: &mut [u8],
) -> Result<CursorRead> {
    let (a, b) = cursor_slots(engine)?;
    let read = engine.read_slots(a, Some(b), Some(CURSOR_PAYLOAD_LEN as u32), buf)?;
    let cursor = Cursor::from_bytes(&buf[..read.byte_count()])
        .ok_or_else(|| Error::invalid_parameter("cursor payload shorter than 8 bytes"))?;
    Ok(CursorRead {
        cursor,
        status: read.status,
    })
}

/// Commit `cursor` to CURSOR-A, then to CURSOR-B.
///
/// `image` and `verify` are both clobbered. Range checks against the usable
/// page count are the caller's job.
pub fn write_cursor<A: FlashAdapter>(
    engine: &mut RecordEngine<'_, A>,
    cursor: Cursor,
    image: &mut [u8],
    verify: &mut [u8],
) -> Result<()> {
    let (a, b) = cursor_slots(engine)?;
    let payload = cursor.to_bytes();

    for slot in [a, b] {
        image[..CURSOR_PAYLOAD_LEN].copy_from_slice(&payload);
        engine.stamp(slot, CURSOR_PAYLOAD_LEN, image)?;
        engine.commit(slot.page, image, verify)?;
    }
    debug!(
        newest = cursor.newest_page_index,
        filled = cursor.filled_page_count,
        "Cursor committed"
    );
    Ok(())
}

fn cursor_slots<A: FlashAdapter>(engine: &RecordEngine<'_, A>) -> Result<(Slot, Slot)> {
    engine
        .layout()
        .cursor_slots()
        .ok_or_else(|| Error::invalid_parameter("cursor cache is disabled"))
}
