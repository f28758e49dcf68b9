//! Core trait definitions
//!
//! [`FlashAdapter`] is the seam between the page store and the hardware. It is
//! implemented once by a real flash driver and once by a test double; the
//! store never touches flash except through it.

use crate::error::AdapterFault;
use crc32fast::Hasher;

/// Raw page primitives of block-erasable storage.
///
/// Each call is a fallible boundary. The store retries erase, write and read
/// according to its settings; `checksum` is a pure computation and is never
/// retried.
///
/// # Contract
///
/// - `page` is always below the configured total page count
/// - `bytes` and `buf` are always exactly one page long
/// - `write` is only issued to a page erased by the preceding `erase`
pub trait FlashAdapter {
    /// Erase one page (every byte becomes the erased value).
    fn erase(&mut self, page: u32) -> Result<(), AdapterFault>;

    /// Program one full page.
    fn write(&mut self, page: u32, bytes: &[u8]) -> Result<(), AdapterFault>;

    /// Read one full page into `buf`.
    fn read(&mut self, page: u32, buf: &mut [u8]) -> Result<(), AdapterFault>;

    /// Compute a CRC32 of `bytes` starting from `seed`.
    ///
    /// The default is a software CRC32 (IEEE); drivers with a hardware CRC
    /// unit override it.
    fn checksum(&mut self, seed: u32, bytes: &[u8]) -> Result<u32, AdapterFault> {
        Ok(seeded_crc32(seed, bytes))
    }
}

impl<T: FlashAdapter + ?Sized> FlashAdapter for &mut T {
    fn erase(&mut self, page: u32) -> Result<(), AdapterFault> {
        (**self).erase(page)
    }

    fn write(&mut self, page: u32, bytes: &[u8]) -> Result<(), AdapterFault> {
        (**self).write(page, bytes)
    }

    fn read(&mut self, page: u32, buf: &mut [u8]) -> Result<(), AdapterFault> {
        (**self).read(page, buf)
    }

    fn checksum(&mut self, seed: u32, bytes: &[u8]) -> Result<u32, AdapterFault> {
        (**self).checksum(seed, bytes)
    }
}

impl<T: FlashAdapter + ?Sized> FlashAdapter for Box<T> {
    fn erase(&mut self, page: u32) -> Result<(), AdapterFault> {
        (**self).erase(page)
    }

    fn write(&mut self, page: u32, bytes: &[u8]) -> Result<(), AdapterFault> {
        (**self).write(page, bytes)
    }

    fn read(&mut self, page: u32, buf: &mut [u8]) -> Result<(), AdapterFault> {
        (**self).read(page, buf)
    }

    fn checksum(&mut self, seed: u32, bytes: &[u8]) -> Result<u32, AdapterFault> {
        (**self).checksum(seed, bytes)
    }
}

/// CRC32 (IEEE polynomial) of `bytes` with `seed` as the initial state.
///
/// Deterministic: the same seed and input always produce the same output.
pub fn seeded_crc32(seed: u32, bytes: &[u8]) -> u32 {
    let mut hasher = Hasher::new_with_initial(seed);
    hasher.update(bytes);
    hasher.finalize()
}
