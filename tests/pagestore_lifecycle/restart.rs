//! Records survive reboots and damage done while the device was off

use crate::common::{flush, load, ImageFixture};
use pagestore::{Error, LoadStatus, Role, StoreOptions, ERASED_BYTE, PAGE_HEADER_SIZE};

#[test]
fn test_records_survive_reboot() {
    let fixture = ImageFixture::new();
    let options = StoreOptions::new().with_mirror(true);
    {
        let mut store = fixture.boot(options);
        flush(&mut store, Role::Log, 0, b"first boot");
        flush(&mut store, Role::Newest, 7, b"settings v1");
    }

    let mut store = fixture.boot(options);
    assert_eq!(
        load(&mut store, Role::Log, 0),
        (LoadStatus::Intact, b"first boot".to_vec())
    );
    assert_eq!(
        load(&mut store, Role::Newest, 7),
        (LoadStatus::Intact, b"settings v1".to_vec())
    );
}

#[test]
fn test_torn_write_recovered_from_backup() {
    let fixture = ImageFixture::new();
    {
        let mut store = fixture.boot(StoreOptions::new());
        flush(&mut store, Role::NewestBackup, 4, b"config A");
        flush(&mut store, Role::Newest, 3, b"config B");
    }

    // Power lost halfway through rewriting page 3: its tail is still erased
    fixture.scribble(3, 32, &[ERASED_BYTE; 32]);

    let mut store = fixture.boot(StoreOptions::new());
    let (status, payload) = load(&mut store, Role::Newest, 3);
    assert_eq!(status, LoadStatus::Recovered);
    assert_eq!(payload, b"config A");
    assert!(!store.is_newest_or_backup_page(3).unwrap());
    assert!(store.is_newest_or_backup_page(4).unwrap());
}

#[test]
fn test_header_damage_in_both_copies_is_reported() {
    let fixture = ImageFixture::new();
    let options = StoreOptions::new().with_mirror(true);
    {
        let mut store = fixture.boot(options);
        flush(&mut store, Role::Log, 2, b"doomed");
    }

    // usable = 8, so the shadow of 2 is page 10
    let header = 64 - PAGE_HEADER_SIZE;
    fixture.scribble(2, header, &[0; 4]);
    fixture.scribble(10, header + 4, &[9]);

    let mut store = fixture.boot(options);
    assert!(matches!(
        store.load_page_as(Role::Log, 2),
        Err(Error::UnrecoverableData {
            role: Role::Log,
            index: 2
        })
    ));
}

#[test]
fn test_settings_change_invalidates_pages() {
    let fixture = ImageFixture::new();
    {
        let mut store = fixture.boot(StoreOptions::new());
        flush(&mut store, Role::Log, 0, b"fourteen");
    }

    // Same image, other geometry: the stored total-pages field no longer matches
    let flash = pagestore::FileFlash::open(&fixture.path, 64).unwrap();
    let mut store = pagestore::PageStore::new();
    store
        .init(
            flash,
            pagestore::StorageSettings::new(15, 64),
            [vec![0; 64], vec![0; 64]],
            StoreOptions::new(),
        )
        .unwrap();
    assert!(matches!(
        store.load_page_as(Role::Log, 0),
        Err(Error::UnrecoverableData { .. })
    ));
}

#[test]
fn test_unchanged_flush_after_reboot_skips_write() {
    let fixture = ImageFixture::new();
    {
        let mut store = fixture.boot(StoreOptions::new());
        flush(&mut store, Role::Newest, 0, b"same");
    }
    let before = std::fs::read(&fixture.path).unwrap();

    let mut store = fixture.boot(StoreOptions::new());
    let (active, _) = store.active_buffer().unwrap();
    active[..4].copy_from_slice(b"same");
    let outcome = store.flush_page_if_different(0, 4, Role::Newest).unwrap();
    assert!(!outcome.was_written());
    drop(store);

    assert_eq!(std::fs::read(&fixture.path).unwrap(), before);
}
