use super::*;
use std::sync::atomic::{AtomicBool, Ordering};

#[test]
fn typed_accessors_convert_between_scalars() {
    let p = Properties::new();
    p.set_int("width", 720);
    p.set_double("aspect_ratio", 1.5);
    p.set_string("count", "12");
    p.set_string("mask", "0x10");
    assert_eq!(p.get_int("width"), 720);
    assert_eq!(p.get_double("width"), 720.0);
    assert_eq!(p.get_int("aspect_ratio"), 1);
    assert_eq!(p.get_int("count"), 12);
    assert_eq!(p.get_int("mask"), 16);
    assert_eq!(p.get_int("missing"), 0);
    assert_eq!(p.get_string("width").as_deref(), Some("720"));
    assert!(p.get_string("missing").is_none());
}

#[test]
fn keys_keep_insertion_order_across_removal() {
    let p = Properties::new();
    p.set_int("a", 1);
    p.set_int("b", 2);
    p.set_int("c", 3);
    assert!(p.remove("a"));
    assert!(!p.remove("a"));
    p.set_int("b", 20);
    assert_eq!(p.keys(), vec!["b".to_string(), "c".to_string()]);
    assert_eq!(p.get_int("c"), 3);
}

#[test]
fn inherit_copies_scalars_but_not_data() {
    let src = Properties::new();
    src.set_int("width", 64);
    src.set_string("consumer.rescale", "nearest");
    src.set_data("image", DataSlot::borrowed(Buffer::zeroed(4), 4));

    let dst = Properties::new();
    dst.inherit(&src);
    assert_eq!(dst.get_int("width"), 64);
    assert_eq!(dst.get_string("consumer.rescale").as_deref(), Some("nearest"));
    assert!(dst.get_buffer("image").is_none());
}

#[test]
fn replacing_a_slot_runs_its_deleter_outside_the_lock() {
    let p = Properties::new();
    let released = Arc::new(AtomicBool::new(false));
    let flag = released.clone();
    let reentrant = p.clone();
    p.set_data(
        "image",
        DataSlot::owned(
            Buffer::zeroed(2),
            2,
            Some(Box::new(move |_| {
                // Would deadlock if the write lock were still held.
                reentrant.set_int("released", 1);
                flag.store(true, Ordering::SeqCst);
            })),
        ),
    );
    p.set_data("image", DataSlot::borrowed(Buffer::zeroed(1), 1));
    assert!(released.load(Ordering::SeqCst));
    assert_eq!(p.get_int("released"), 1);
}

#[test]
fn comma_locale_parses_string_doubles() {
    let p = Properties::new();
    p.set_string("meta.volume", "0,5");
    assert_eq!(p.get_double("meta.volume"), 0.0);
    p.set_lc_numeric(Some("de_DE.UTF-8".into()));
    assert_eq!(p.get_double("meta.volume"), 0.5);
    assert_eq!(p.lc_numeric().as_deref(), Some("de_DE.UTF-8"));
}

#[test]
fn handles_share_one_carrier() {
    let a = Properties::new();
    let b = a.clone();
    assert_eq!(a.ref_count(), 2);
    b.set_int("x", 5);
    assert_eq!(a.get_int("x"), 5);
    assert!(a.ptr_eq(&b));
}

#[test]
fn objects_round_trip_through_data_slots() {
    let p = Properties::new();
    p.set_data("_profile", DataSlot::object(42u32));
    assert_eq!(p.get_object::<u32>("_profile"), Some(42));
    assert!(p.get_buffer("_profile").is_none());
}
