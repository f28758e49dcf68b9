//! File-backed flash device
//!
//! [`FileFlash`] stores a flash image in a regular file, one page after
//! another, erased bytes `0xFF`. It lets host tooling inspect or prepare
//! images and lets tests exercise a store across process restarts.

use pagestore_core::{AdapterFault, FlashAdapter, ERASED_BYTE};
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Flash image file.
#[derive(Debug)]
pub struct FileFlash {
    file: File,
    path: PathBuf,
    total_pages: u32,
    page_length: usize,
}

impl FileFlash {
    /// Create (or truncate) an image of `total_pages` erased pages.
    pub fn create(
        path: impl AsRef<Path>,
        total_pages: u32,
        page_length: usize,
    ) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        if page_length == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "page length must be non-zero",
            ));
        }

        // Create parent directory if needed
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(true)
            .open(&path)?;

        let erased = vec![ERASED_BYTE; page_length];
        for _ in 0..total_pages {
            file.write_all(&erased)?;
        }
        file.sync_all()?;

        info!(path = %path.display(), total_pages, page_length, "Created flash image");
        Ok(FileFlash {
            file,
            path,
            total_pages,
            page_length,
        })
    }

    /// Open an existing image whose size is a whole number of pages.
    pub fn open(path: impl AsRef<Path>, page_length: usize) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        if page_length == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "page length must be non-zero",
            ));
        }

        let file = OpenOptions::new().read(true).write(true).open(&path)?;
        let len = file.metadata()?.len();
        if len % page_length as u64 != 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("image of {} bytes is not a multiple of {}-byte pages", len, page_length),
            ));
        }
        let total_pages = u32::try_from(len / page_length as u64).map_err(|_| {
            io::Error::new(io::ErrorKind::InvalidData, "image has too many pages")
        })?;

        debug!(path = %path.display(), total_pages, "Opened flash image");
        Ok(FileFlash {
            file,
            path,
            total_pages,
            page_length,
        })
    }

    /// Image file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of pages in the image.
    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    /// Bytes per page.
    pub fn page_length(&self) -> usize {
        self.page_length
    }

    fn seek_to(&mut self, page: u32, len: usize) -> Result<(), AdapterFault> {
        if page >= self.total_pages {
            return Err(AdapterFault::device(format!(
                "page {} out of range ({} pages)",
                page, self.total_pages
            )));
        }
        if len != self.page_length {
            return Err(AdapterFault::device(format!(
                "buffer of {} bytes for a {}-byte page",
                len, self.page_length
            )));
        }
        let offset = page as u64 * self.page_length as u64;
        self.file.seek(SeekFrom::Start(offset))?;
        Ok(())
    }
}

impl FlashAdapter for FileFlash {
    fn erase(&mut self, page: u32) -> Result<(), AdapterFault> {
        self.seek_to(page, self.page_length)?;
        let erased = vec![ERASED_BYTE; self.page_length];
        self.file.write_all(&erased)?;
        self.file.sync_data()?;
        Ok(())
    }

    fn write(&mut self, page: u32, bytes: &[u8]) -> Result<(), AdapterFault> {
        self.seek_to(page, bytes.len())?;
        self.file.write_all(bytes)?;
        self.file.sync_data()?;
        Ok(())
    }

    fn read(&mut self, page: u32, buf: &mut [u8]) -> Result<(), AdapterFault> {
        self.seek_to(page, buf.len())?;
        self.file.read_exact(buf)?;
        Ok(())
    }
}
