use super::*;
use std::sync::atomic::{AtomicUsize, Ordering};

#[test]
fn buffer_clones_alias_the_same_bytes() {
    let a = Buffer::new(vec![1, 2, 3]);
    let b = a.clone();
    b.write()[0] = 9;
    assert_eq!(a.to_vec(), vec![9, 2, 3]);
    assert!(a.ptr_eq(&b));
    assert!(!a.ptr_eq(&Buffer::new(vec![9, 2, 3])));
}

#[test]
fn into_unique_fails_while_aliased() {
    let a = Buffer::zeroed(4);
    let b = a.clone();
    let a = a.into_unique().unwrap_err();
    drop(b);
    assert_eq!(a.into_unique().unwrap(), vec![0; 4]);
}

#[test]
fn deleter_runs_once_on_drop() {
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = calls.clone();
    let slot = DataSlot::owned(
        Buffer::zeroed(8),
        8,
        Some(Box::new(move |buf: Buffer| {
            assert_eq!(buf.len(), 8);
            seen.fetch_add(1, Ordering::SeqCst);
        })),
    );
    assert!(slot.has_deleter());
    drop(slot);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn borrowed_slot_has_no_deleter() {
    let slot = DataSlot::borrowed(Buffer::zeroed(2), 0);
    assert!(!slot.has_deleter());
    assert_eq!(slot.size(), 0);
    assert_eq!(slot.buffer().map(Buffer::len), Some(2));
}

#[test]
fn object_downcasts_to_stored_type_only() {
    let slot = DataSlot::object(String::from("token"));
    assert_eq!(slot.object_as::<String>().as_deref(), Some("token"));
    assert!(slot.object_as::<u32>().is_none());
    assert!(slot.buffer().is_none());
}

#[test]
fn alias_shares_payload_without_deleter() {
    let slot = DataSlot::owned(Buffer::zeroed(3), 3, Some(Box::new(|_| {})));
    let alias = slot.alias().unwrap();
    assert!(!alias.has_deleter());
    assert_eq!(alias.size(), 3);
    assert!(alias.buffer().unwrap().ptr_eq(slot.buffer().unwrap()));
}
