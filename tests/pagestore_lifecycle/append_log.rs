//! A circular event log driven by the cursor cache
//!
//! The application appends one LOG record per event, wrapping around the
//! usable pages, and stores its position in the cursor cache after every
//! append. After a reboot it resumes from the cursor.

use crate::common::{flush, load, ImageFixture};
use pagestore::{Cursor, FlashAdapter, LoadStatus, PageStore, Role, StoreOptions};

fn options() -> StoreOptions {
    StoreOptions::new().with_cursor_cache(true)
}

fn append<A: FlashAdapter>(store: &mut PageStore<A>, event: &[u8]) -> Cursor {
    let usable = store.usable_pages().unwrap();
    let next = match store.read_cursor_cache() {
        Ok(read) => {
            let newest = (read.cursor.newest_page_index + 1) % usable;
            let filled = (read.cursor.filled_page_count + 1).min(usable);
            Cursor::new(newest, filled)
        }
        Err(_) => Cursor::new(0, 1),
    };
    flush(store, Role::Log, next.newest_page_index, event);
    store.write_cursor_cache(next).unwrap();
    next
}

#[test]
fn test_append_resumes_after_reboot() {
    let fixture = ImageFixture::new();
    {
        let mut store = fixture.boot(options());
        for n in 0..5u8 {
            append(&mut store, &[b'e', n]);
        }
    }

    let mut store = fixture.boot(options());
    let read = store.read_cursor_cache().unwrap();
    assert_eq!(read.status, LoadStatus::Intact);
    assert_eq!(read.cursor, Cursor::new(4, 5));

    let cursor = append(&mut store, b"after reboot");
    assert_eq!(cursor, Cursor::new(5, 6));
    assert_eq!(
        load(&mut store, Role::Log, 5),
        (LoadStatus::Intact, b"after reboot".to_vec())
    );
}

#[test]
fn test_append_wraps_around() {
    let fixture = ImageFixture::new();
    let mut store = fixture.boot(options());
    // 16 pages, 2 reserved for the cursor: 14 usable
    assert_eq!(store.usable_pages().unwrap(), 14);

    for n in 0..20u8 {
        append(&mut store, &[n]);
    }
    let read = store.read_cursor_cache().unwrap();
    assert_eq!(read.cursor, Cursor::new(5, 14));
    assert_eq!(load(&mut store, Role::Log, 5).1, vec![19]);
    assert_eq!(load(&mut store, Role::Log, 6).1, vec![6]);
}

#[test]
fn test_cursor_a_lost_while_off() {
    let fixture = ImageFixture::new();
    {
        let mut store = fixture.boot(options());
        append(&mut store, b"one");
        append(&mut store, b"two");
    }

    // CURSOR-A is page 14; wipe its header
    fixture.scribble(14, 40, &[0xFF; 24]);

    let mut store = fixture.boot(options());
    let read = store.read_cursor_cache().unwrap();
    assert_eq!(read.status, LoadStatus::Recovered);
    assert_eq!(read.cursor, Cursor::new(1, 2));

    // The next append rewrites both cursor pages
    append(&mut store, b"three");
    let read = store.read_cursor_cache().unwrap();
    assert_eq!(read.status, LoadStatus::Intact);
    assert_eq!(read.cursor, Cursor::new(2, 3));
}
