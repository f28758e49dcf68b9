//! Shared test utilities for the integration suites.
//!
//! Import via `#[path = "../common/mod.rs"] mod common;` from a suite's main.rs.

#![allow(dead_code)]

use pagestore::{FileFlash, PageStore, StorageSettings, StoreOptions};
use std::fs::OpenOptions;
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Once;
use tracing_subscriber::filter::LevelFilter;
use tempfile::TempDir;

static INIT_TRACING: Once = Once::new();

/// Route library logs to the test output (visible with `--nocapture`).
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(LevelFilter::DEBUG)
            .try_init();
    });
}

/// Geometry used by every suite: 16 pages of 64 bytes (40 payload bytes).
pub fn settings() -> StorageSettings {
    StorageSettings::new(16, 64)
}

/// A temporary directory with a fresh erased flash image.
pub struct ImageFixture {
    pub dir: TempDir,
    pub path: PathBuf,
}

impl ImageFixture {
    pub fn new() -> Self {
        init_tracing();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("flash.img");
        let settings = settings();
        FileFlash::create(&path, settings.total_pages, settings.page_length).unwrap();
        ImageFixture { dir, path }
    }

    /// Open the image as a ready store (simulates a boot).
    pub fn boot(&self, options: StoreOptions) -> PageStore<FileFlash> {
        let settings = settings();
        let flash = FileFlash::open(&self.path, settings.page_length).unwrap();
        let mut store = PageStore::new();
        store
            .init(
                flash,
                settings.clone(),
                [vec![0; settings.page_length], vec![0; settings.page_length]],
                options,
            )
            .unwrap();
        store
    }

    /// Overwrite `bytes` at `offset` within `page`, outside the store.
    pub fn scribble(&self, page: u32, offset: usize, bytes: &[u8]) {
        scribble(&self.path, page, offset, bytes);
    }
}

/// Overwrite part of a page directly in an image file.
pub fn scribble(path: &Path, page: u32, offset: usize, bytes: &[u8]) {
    let page_length = settings().page_length as u64;
    let mut file = OpenOptions::new().write(true).open(path).unwrap();
    file.seek(SeekFrom::Start(page as u64 * page_length + offset as u64))
        .unwrap();
    file.write_all(bytes).unwrap();
    file.sync_all().unwrap();
}

/// Put `payload` in the active buffer and flush it.
pub fn flush<A: pagestore::FlashAdapter>(
    store: &mut PageStore<A>,
    role: pagestore::Role,
    index: u32,
    payload: &[u8],
) {
    let (active, _) = store.active_buffer().unwrap();
    active[..payload.len()].copy_from_slice(payload);
    store.flush_page_as(role, index, payload.len()).unwrap();
}

/// Load a record and copy its payload out of the active buffer.
pub fn load<A: pagestore::FlashAdapter>(
    store: &mut PageStore<A>,
    role: pagestore::Role,
    index: u32,
) -> (pagestore::LoadStatus, Vec<u8>) {
    let load = store.load_page_as(role, index).unwrap();
    let (active, _) = store.active_buffer().unwrap();
    (load.status, active[..load.byte_count].to_vec())
}
