//! Retry-wrapped flash I/O.
//!
//! [`RetryingIo`] owns the retry policy for the adapter primitives:
//!
//! - **Commit attempt**: erase → write → read back → compare. Any failure
//!   repeats the whole attempt, up to `retry_count` attempts. The error names
//!   the stage that failed on the final attempt.
//! - **Query attempt**: read, retried up to `retry_count` times on I/O
//!   failure. Decoding is the caller's job and is never retried.
//! - **Checksum**: called once, never retried; a failure aborts the operation.

use pagestore_core::{AdapterFault, Error, FlashAdapter, Result, PAGE_CRC_SEED};
use std::fmt;
use tracing::{debug, trace};

/// Stage of a commit attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitStage {
    /// Page erase
    Erase,
    /// Page program
    Write,
    /// Read-back after program
    Read,
    /// Comparison of the read-back image with the written one
    Verify,
}

impl fmt::Display for CommitStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CommitStage::Erase => "erase",
            CommitStage::Write => "write",
            CommitStage::Read => "read",
            CommitStage::Verify => "verify",
        };
        f.write_str(name)
    }
}

/// Failure of a single commit attempt.
#[derive(Debug)]
enum AttemptFailure {
    Erase(AdapterFault),
    Write(AdapterFault),
    Read(AdapterFault),
    Mismatch,
}

impl AttemptFailure {
    fn stage(&self) -> CommitStage {
        match self {
            AttemptFailure::Erase(_) => CommitStage::Erase,
            AttemptFailure::Write(_) => CommitStage::Write,
            AttemptFailure::Read(_) => CommitStage::Read,
            AttemptFailure::Mismatch => CommitStage::Verify,
        }
    }

    fn into_error(self, page: u32, attempts: u32) -> Error {
        match self {
            AttemptFailure::Erase(source) => Error::Erase {
                page,
                attempts,
                source,
            },
            AttemptFailure::Write(source) => Error::Write {
                page,
                attempts,
                source,
            },
            AttemptFailure::Read(source) => Error::Read {
                page,
                attempts,
                source,
            },
            AttemptFailure::Mismatch => Error::WriteVerifyMismatch { page, attempts },
        }
    }
}

/// Adapter wrapper applying the bounded retry policy.
pub struct RetryingIo<'a, A: FlashAdapter> {
    adapter: &'a mut A,
    retry_count: u32,
}

impl<'a, A: FlashAdapter> RetryingIo<'a, A> {
    /// Wrap `adapter`. A `retry_count` of 0 behaves as 1.
    pub fn new(adapter: &'a mut A, retry_count: u32) -> Self {
        RetryingIo {
            adapter,
            retry_count: retry_count.max(1),
        }
    }

    /// Page CRC of `bytes`. Single call, never retried.
    pub fn checksum(&mut self, bytes: &[u8]) -> Result<u32> {
        self.adapter
            .checksum(PAGE_CRC_SEED, bytes)
            .map_err(Error::Checksum)
    }

    /// Durably place `image` on `page`, verifying the read-back into `verify`.
    ///
    /// `verify` must be as long as `image` and distinct from it.
    pub fn commit(&mut self, page: u32, image: &[u8], verify: &mut [u8]) -> Result<()> {
        let mut attempt = 1;
        loop {
            match self.commit_once(page, image, verify) {
                Ok(()) => {
                    debug!(page, attempt, "Page committed");
                    return Ok(());
                }
                Err(failure) if attempt < self.retry_count => {
                    debug!(
                        page,
                        attempt,
                        stage = %failure.stage(),
                        "Commit attempt failed, retrying"
                    );
                    attempt += 1;
                }
                Err(failure) => {
                    debug!(page, attempt, stage = %failure.stage(), "Commit attempts exhausted");
                    return Err(failure.into_error(page, attempt));
                }
            }
        }
    }

    fn commit_once(
        &mut self,
        page: u32,
        image: &[u8],
        verify: &mut [u8],
    ) -> std::result::Result<(), AttemptFailure> {
        self.adapter.erase(page).map_err(AttemptFailure::Erase)?;
        self.adapter
            .write(page, image)
            .map_err(AttemptFailure::Write)?;
        self.adapter
            .read(page, verify)
            .map_err(AttemptFailure::Read)?;
        if verify != image {
            return Err(AttemptFailure::Mismatch);
        }
        Ok(())
    }

    /// Read `page` into `buf`, retrying I/O failures only.
    pub fn query(&mut self, page: u32, buf: &mut [u8]) -> Result<()> {
        let mut attempt = 1;
        loop {
            match self.adapter.read(page, buf) {
                Ok(()) => {
                    trace!(page, attempt, "Page read");
                    return Ok(());
                }
                Err(fault) if attempt < self.retry_count => {
                    debug!(page, attempt, error = %fault, "Read failed, retrying");
                    attempt += 1;
                }
                Err(fault) => {
                    debug!(page, attempt, error = %fault, "Read attempts exhausted");
                    return Err(Error::Read {
                        page,
                        attempts: attempt,
                        source: fault,
                    });
                }
            }
        }
    }
}
