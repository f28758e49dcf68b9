//! Page store facade
//!
//! [`PageStore`] is the only type an application needs. It starts
//! uninitialized; [`PageStore::init`] validates the settings, the buffers and
//! the layout as a whole and only then replaces the session. Every other
//! operation works on the ready session and either succeeds or leaves the
//! session as it was (flash content and the scratch buffer aside).
//!
//! # Example
//!
//! ```
//! use pagestore_core::{Role, StorageSettings, StoreOptions};
//! use pagestore_durability::testing::SimFlash;
//! use pagestore_engine::PageStore;
//!
//! let settings = StorageSettings::for_testing();
//! let flash = SimFlash::new(settings.total_pages, settings.page_length);
//! let buffers = [vec![0u8; 32], vec![0u8; 32]];
//!
//! let mut store = PageStore::new();
//! store.init(flash, settings, buffers, StoreOptions::new()).unwrap();
//!
//! let (payload, _usable) = store.active_buffer().unwrap();
//! payload[..5].copy_from_slice(b"hello");
//! store.flush_page_as(Role::Log, 0, 5).unwrap();
//!
//! let load = store.load_page_as(Role::Log, 0).unwrap();
//! assert_eq!(load.byte_count, 5);
//! ```

use crate::buffers::WorkBuffers;
use pagestore_core::{
    Cursor, CursorRead, Error, FlashAdapter, FlushOutcome, PageLoad, Result, Role,
    StorageSettings, StoreOptions,
};
use pagestore_durability::{read_cursor, write_cursor, PageFormat, PageLayout, RecordEngine};
use tracing::{debug, info};

/// A ready session: everything derived from a successful init.
struct Session<A: FlashAdapter> {
    adapter: A,
    settings: StorageSettings,
    options: StoreOptions,
    format: PageFormat,
    layout: PageLayout,
    buffers: WorkBuffers,
}

impl<A: FlashAdapter> Session<A> {
    /// Re-derive everything from the settings and compare.
    fn check_integrity(&self) -> Result<()> {
        if !self.buffers.fits(self.settings.page_length) {
            return Err(Error::CorruptedContext("working buffer size changed"));
        }
        if self.format != PageFormat::new(&self.settings) {
            return Err(Error::CorruptedContext("page format disagrees with settings"));
        }
        match PageLayout::new(&self.settings, self.options) {
            Ok(layout) if layout == self.layout => Ok(()),
            _ => Err(Error::CorruptedContext("layout disagrees with settings")),
        }
    }

    fn engine(&mut self) -> (RecordEngine<'_, A>, &mut [u8], &mut [u8]) {
        let (active, scratch) = self.buffers.split();
        let engine = RecordEngine::new(
            &mut self.adapter,
            self.settings.retry_count,
            &self.format,
            &self.layout,
        );
        (engine, active, scratch)
    }

    fn check_length(&self, len: usize) -> Result<()> {
        let capacity = self.format.payload_capacity();
        if len > capacity {
            return Err(Error::invalid_parameter(format!(
                "length {} exceeds payload capacity {}",
                len, capacity
            )));
        }
        Ok(())
    }

    fn check_cursor_cache(&self) -> Result<()> {
        if !self.layout.cursor_cache_enabled() {
            return Err(Error::invalid_parameter("cursor cache is disabled"));
        }
        Ok(())
    }
}

fn check_data_role(role: Role) -> Result<()> {
    if role.is_cursor() {
        return Err(Error::invalid_parameter(format!(
            "{} is not a data page role",
            role
        )));
    }
    Ok(())
}

/// Crash-safe page store over a [`FlashAdapter`].
pub struct PageStore<A: FlashAdapter> {
    session: Option<Session<A>>,
}

impl<A: FlashAdapter> Default for PageStore<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: FlashAdapter> PageStore<A> {
    /// An uninitialized store.
    pub fn new() -> Self {
        PageStore { session: None }
    }

    /// Start a session.
    ///
    /// Validates `settings`, both `buffers` (each exactly one page long) and
    /// the capacity `options` imply. On any error the store keeps whatever
    /// session it had before.
    pub fn init(
        &mut self,
        adapter: A,
        settings: StorageSettings,
        buffers: [Vec<u8>; 2],
        options: StoreOptions,
    ) -> Result<()> {
        let buffers = WorkBuffers::new(buffers, settings.page_length)?;
        let layout = PageLayout::new(&settings, options)?;
        let format = PageFormat::new(&settings);

        info!(
            total_pages = settings.total_pages,
            page_length = settings.page_length,
            usable_pages = layout.usable_pages(),
            cursor_cache = options.cursor_cache,
            mirror = options.mirror,
            "Page store initialized"
        );
        self.session = Some(Session {
            adapter,
            settings,
            options,
            format,
            layout,
            buffers,
        });
        Ok(())
    }

    /// True after a successful [`init`](Self::init).
    pub fn is_initialized(&self) -> bool {
        self.session.is_some()
    }

    fn session(&self) -> Result<&Session<A>> {
        let session = self.session.as_ref().ok_or(Error::NotInitialized)?;
        if cfg!(debug_assertions) {
            session.check_integrity()?;
        }
        Ok(session)
    }

    fn session_mut(&mut self) -> Result<&mut Session<A>> {
        let session = self.session.as_mut().ok_or(Error::NotInitialized)?;
        if cfg!(debug_assertions) {
            session.check_integrity()?;
        }
        Ok(session)
    }

    /// Whether the cursor cache pages are reserved.
    pub fn is_cache_mode_enabled(&self) -> Result<bool> {
        Ok(self.session()?.layout.cursor_cache_enabled())
    }

    /// Payload region of the active buffer and the usable logical page count.
    pub fn active_buffer(&mut self) -> Result<(&mut [u8], u32)> {
        let session = self.session_mut()?;
        let usable = session.layout.usable_pages();
        let capacity = session.format.payload_capacity();
        let (active, _) = session.buffers.split();
        Ok((&mut active[..capacity], usable))
    }

    /// Read the append cursor.
    ///
    /// Both working buffers are clobbered.
    pub fn read_cursor_cache(&mut self) -> Result<CursorRead> {
        let session = self.session_mut()?;
        session.check_cursor_cache()?;
        let (mut engine, _, scratch) = session.engine();
        let read = read_cursor(&mut engine, scratch)?;
        debug!(
            newest = read.cursor.newest_page_index,
            filled = read.cursor.filled_page_count,
            "Cursor read"
        );
        Ok(read)
    }

    /// Store the append cursor, CURSOR-A first.
    ///
    /// Both working buffers are clobbered.
    pub fn write_cursor_cache(&mut self, cursor: Cursor) -> Result<()> {
        let session = self.session_mut()?;
        session.check_cursor_cache()?;
        let usable = session.layout.usable_pages();
        if cursor.newest_page_index >= usable || cursor.filled_page_count > usable {
            return Err(Error::invalid_parameter(format!(
                "cursor ({}, {}) outside {} usable pages",
                cursor.newest_page_index, cursor.filled_page_count, usable
            )));
        }
        let (mut engine, active, scratch) = session.engine();
        write_cursor(&mut engine, cursor, scratch, active)
    }

    /// Load record `(role, index)` into the active buffer.
    pub fn load_page_as(&mut self, role: Role, index: u32) -> Result<PageLoad> {
        let session = self.session_mut()?;
        check_data_role(role)?;
        session.layout.check_index(index)?;
        let (mut engine, active, _) = session.engine();
        let read = engine.read_record(role, index, active)?;
        Ok(PageLoad {
            byte_count: read.byte_count(),
            status: read.status,
        })
    }

    /// Commit the first `len` bytes of the active buffer as `(role, index)`.
    pub fn flush_page_as(&mut self, role: Role, index: u32, len: usize) -> Result<()> {
        let session = self.session_mut()?;
        check_data_role(role)?;
        session.layout.check_index(index)?;
        session.check_length(len)?;
        let (mut engine, active, scratch) = session.engine();
        engine.write_record(role, index, len, active, scratch)
    }

    /// Like [`flush_page_as`](Self::flush_page_as), but skip flash entirely
    /// when the stored payload already matches.
    pub fn flush_page_if_different(
        &mut self,
        index: u32,
        len: usize,
        role: Role,
    ) -> Result<FlushOutcome> {
        let session = self.session_mut()?;
        check_data_role(role)?;
        session.layout.check_index(index)?;
        session.check_length(len)?;
        let (mut engine, active, scratch) = session.engine();
        engine.write_record_if_different(role, index, len, active, scratch)
    }

    /// Whether logical page `index` holds a NEWEST or NEWEST-BACKUP record at
    /// the configured format version.
    pub fn is_newest_or_backup_page(&mut self, index: u32) -> Result<bool> {
        let session = self.session_mut()?;
        session.layout.check_index(index)?;
        let (mut engine, _, scratch) = session.engine();
        engine.is_newest_or_backup(index, scratch)
    }

    /// Settings of the current session.
    pub fn settings(&self) -> Result<&StorageSettings> {
        Ok(&self.session()?.settings)
    }

    /// Logical pages available per role.
    pub fn usable_pages(&self) -> Result<u32> {
        Ok(self.session()?.layout.usable_pages())
    }

    /// The adapter of the current session.
    pub fn adapter(&self) -> Result<&A> {
        Ok(&self.session()?.adapter)
    }

    /// Mutable access to the adapter of the current session.
    pub fn adapter_mut(&mut self) -> Result<&mut A> {
        Ok(&mut self.session_mut()?.adapter)
    }

    /// End the session and hand back the adapter and both buffers.
    pub fn into_parts(self) -> Option<(A, [Vec<u8>; 2])> {
        self.session
            .map(|session| (session.adapter, session.buffers.into_inner()))
    }

    /// End the session and hand back the adapter.
    pub fn into_adapter(self) -> Option<A> {
        self.into_parts().map(|(adapter, _)| adapter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagestore_core::{LoadStatus, SettingsError};
    use pagestore_durability::testing::SimFlash;

    fn buffers() -> [Vec<u8>; 2] {
        [vec![0u8; 32], vec![0u8; 32]]
    }

    fn ready(options: StoreOptions) -> PageStore<SimFlash> {
        let settings = StorageSettings::for_testing();
        let mut store = PageStore::new();
        store
            .init(SimFlash::new(14, 32), settings, buffers(), options)
            .unwrap();
        store
    }

    fn flush(store: &mut PageStore<SimFlash>, role: Role, index: u32, payload: &[u8]) {
        let (active, _) = store.active_buffer().unwrap();
        active[..payload.len()].copy_from_slice(payload);
        store.flush_page_as(role, index, payload.len()).unwrap();
    }

    fn load(store: &mut PageStore<SimFlash>, role: Role, index: u32) -> (PageLoad, Vec<u8>) {
        let load = store.load_page_as(role, index).unwrap();
        let (active, _) = store.active_buffer().unwrap();
        (load, active[..load.byte_count].to_vec())
    }

    #[test]
    fn test_operations_before_init() {
        let mut store: PageStore<SimFlash> = PageStore::new();
        assert!(!store.is_initialized());
        assert!(matches!(store.is_cache_mode_enabled(), Err(Error::NotInitialized)));
        assert!(matches!(store.active_buffer(), Err(Error::NotInitialized)));
        assert!(matches!(store.load_page_as(Role::Log, 0), Err(Error::NotInitialized)));
        assert!(matches!(store.read_cursor_cache(), Err(Error::NotInitialized)));
        assert!(store.into_adapter().is_none());
    }

    #[test]
    fn test_init_reports_usable_pages() {
        let mut store = ready(StoreOptions::new().with_cursor_cache(true));
        assert!(store.is_initialized());
        assert!(store.is_cache_mode_enabled().unwrap());
        let (payload, usable) = store.active_buffer().unwrap();
        assert_eq!(payload.len(), 8);
        assert_eq!(usable, 12);
    }

    #[test]
    fn test_failed_init_keeps_previous_session() {
        let mut store = ready(StoreOptions::new());
        flush(&mut store, Role::Log, 1, b"keep");

        let bad = StorageSettings::for_testing().with_retry_count(0);
        let err = store
            .init(SimFlash::new(14, 32), bad, buffers(), StoreOptions::new())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidSettings(SettingsError::ZeroRetryCount)));

        assert_eq!(store.usable_pages().unwrap(), 14);
        let (_, payload) = load(&mut store, Role::Log, 1);
        assert_eq!(payload, b"keep");
    }

    #[test]
    fn test_failed_first_init_stays_uninitialized() {
        let mut store = PageStore::new();
        let err = store
            .init(
                SimFlash::new(3, 32),
                StorageSettings::new(3, 32),
                buffers(),
                StoreOptions::new().with_cursor_cache(true),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidSettings(SettingsError::TooFewPages { usable: 1, .. })
        ));
        assert!(!store.is_initialized());
    }

    #[test]
    fn test_init_buffer_errors() {
        let mut store = PageStore::new();
        let err = store
            .init(
                SimFlash::new(14, 32),
                StorageSettings::for_testing(),
                [Vec::new(), vec![0; 32]],
                StoreOptions::new(),
            )
            .unwrap_err();
        assert!(matches!(err, Error::Pointer(_)));

        let err = store
            .init(
                SimFlash::new(14, 32),
                StorageSettings::for_testing(),
                [vec![0; 32], vec![0; 40]],
                StoreOptions::new(),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidSettings(SettingsError::BufferSize { which: 1, .. })
        ));
    }

    #[test]
    fn test_round_trip() {
        let mut store = ready(StoreOptions::new());
        flush(&mut store, Role::Newest, 3, b"abcdefgh");
        let (load, payload) = load(&mut store, Role::Newest, 3);
        assert_eq!(load.status, LoadStatus::Intact);
        assert_eq!(payload, b"abcdefgh");
    }

    #[test]
    fn test_parameter_checks() {
        let mut store = ready(StoreOptions::new());
        assert!(matches!(
            store.load_page_as(Role::Log, 14),
            Err(Error::InvalidParameter(_))
        ));
        assert!(matches!(
            store.flush_page_as(Role::Log, 0, 9),
            Err(Error::InvalidParameter(_))
        ));
        assert!(matches!(
            store.flush_page_as(Role::CursorA, 0, 1),
            Err(Error::InvalidParameter(_))
        ));
        assert!(matches!(
            store.flush_page_if_different(0, 1, Role::CursorB),
            Err(Error::InvalidParameter(_))
        ));
        assert!(matches!(
            store.is_newest_or_backup_page(14),
            Err(Error::InvalidParameter(_))
        ));
        assert!(matches!(store.read_cursor_cache(), Err(Error::InvalidParameter(_))));
        assert_eq!(store.adapter().unwrap().counts().write, 0);
    }

    #[test]
    fn test_cursor_range_checks() {
        let mut store = ready(StoreOptions::new().with_cursor_cache(true));
        assert!(matches!(
            store.write_cursor_cache(Cursor::new(12, 0)),
            Err(Error::InvalidParameter(_))
        ));
        assert!(matches!(
            store.write_cursor_cache(Cursor::new(0, 13)),
            Err(Error::InvalidParameter(_))
        ));
        store.write_cursor_cache(Cursor::new(11, 12)).unwrap();
        let read = store.read_cursor_cache().unwrap();
        assert_eq!(read.cursor, Cursor::new(11, 12));
    }

    #[test]
    fn test_flush_if_different_skips_identical() {
        let mut store = ready(StoreOptions::new());
        flush(&mut store, Role::Log, 2, b"same");
        let outcome = store.flush_page_if_different(2, 4, Role::Log).unwrap();
        assert!(!outcome.was_written());
        // The active buffer still holds what the caller put there
        let (active, _) = store.active_buffer().unwrap();
        assert_eq!(&active[..4], b"same");
    }

    #[test]
    fn test_is_newest_or_backup_page() {
        let mut store = ready(StoreOptions::new());
        flush(&mut store, Role::NewestBackup, 4, b"b");
        assert!(store.is_newest_or_backup_page(4).unwrap());
        assert!(!store.is_newest_or_backup_page(5).unwrap());
    }

    #[test]
    fn test_into_parts_returns_adapter_and_buffers() {
        let mut store = ready(StoreOptions::new());
        flush(&mut store, Role::Log, 0, b"x");
        let (flash, [active, scratch]) = store.into_parts().unwrap();
        assert_eq!(flash.counts().write, 1);
        assert_eq!((active.len(), scratch.len()), (32, 32));
    }

    #[cfg(debug_assertions)]
    #[test]
    fn test_tampered_context_detected() {
        let mut store = ready(StoreOptions::new());
        if let Some(session) = store.session.as_mut() {
            session.buffers.shrink_scratch();
        }
        assert!(matches!(
            store.load_page_as(Role::Log, 0),
            Err(Error::CorruptedContext(_))
        ));
        assert!(store.is_initialized());
    }

    #[cfg(debug_assertions)]
    #[test]
    fn test_tampered_geometry_detected() {
        let mut store = ready(StoreOptions::new());
        if let Some(session) = store.session.as_mut() {
            session.settings.total_pages = 15;
        }
        assert!(matches!(
            store.flush_page_as(Role::Log, 0, 1),
            Err(Error::CorruptedContext(msg)) if msg.contains("page format")
        ));
        // Nothing reached the flash
        let erased = store.session.as_ref().map(|session| session.adapter.counts().erase);
        assert_eq!(erased, Some(0));
    }

    #[cfg(debug_assertions)]
    #[test]
    fn test_tampered_options_detected() {
        let mut store = ready(StoreOptions::new());
        if let Some(session) = store.session.as_mut() {
            session.options.mirror = true;
        }
        assert!(matches!(
            store.load_page_as(Role::Log, 0),
            Err(Error::CorruptedContext(msg)) if msg.contains("layout")
        ));
    }
}
