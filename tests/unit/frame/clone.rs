use super::*;
use crate::format::audio::AudioFormat;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

fn populated() -> Frame {
    let f = Frame::create(None);
    f.set_position(12);
    f.properties().set_int(keys::WIDTH, 2);
    f.properties().set_int(keys::HEIGHT, 2);
    f.properties().set_int(keys::FORMAT, ImageFormat::Rgb.code());
    f.properties().set_string("meta.title", "clip");
    f.set_image(Buffer::new(vec![9; 12]), 12, None);
    f.set_audio(Buffer::new(vec![3; 8]), AudioFormat::S16, 8, None);
    f
}

#[test]
fn clones_inherit_scalars_and_start_with_empty_stacks() {
    let f = populated();
    f.push_image_operation(|_, _| Err(crate::FrameError::resolution("unused")));
    f.push_audio_operation(|_, _| Err(crate::FrameError::resolution("unused")));

    for mode in [CloneMode::Shallow, CloneMode::Deep] {
        let c = f.clone_frame(mode);
        assert!(!c.ptr_eq(&f));
        assert_eq!(c.position().0, 12);
        assert_eq!(c.properties().get_string("meta.title").as_deref(), Some("clip"));
        assert_eq!(c.image_stack_len(), 0);
        assert_eq!(c.audio_stack_len(), 0);
    }
}

#[test]
fn passthrough_data_is_reattached() {
    #[derive(Clone, Debug, PartialEq)]
    struct Interop(u32);

    let f = populated();
    f.properties()
        .set_data(keys::GPU_CONVERT, DataSlot::object(Interop(7)));
    f.properties().set_data("private", DataSlot::object(Interop(8)));

    let c = f.clone_image(CloneMode::Deep);
    assert_eq!(
        c.properties().get_object::<Interop>(keys::GPU_CONVERT),
        Some(Interop(7))
    );
    assert!(!c.properties().contains("private"));
}

#[test]
fn deep_clone_buffers_are_independent() {
    let f = populated();
    let c = f.clone_frame(CloneMode::Deep);

    let (image, _) = c.properties().get_buffer(keys::IMAGE).expect("image");
    image.write().fill(0);
    let (source, _) = f.properties().get_buffer(keys::IMAGE).expect("image");
    assert_eq!(source.to_vec(), vec![9; 12]);
    assert!(!image.ptr_eq(&source));

    let (audio, size) = c.properties().get_buffer(keys::AUDIO).expect("audio");
    assert_eq!(size, 8);
    assert_eq!(audio.to_vec(), vec![3; 8]);
}

#[test]
fn shallow_clone_buffers_alias_the_source() {
    let f = populated();
    let c = f.clone_frame(CloneMode::Shallow);

    let (image, _) = c.properties().get_buffer(keys::IMAGE).expect("image");
    image.write()[0] = 200;
    let (source, _) = f.properties().get_buffer(keys::IMAGE).expect("image");
    assert_eq!(source.read()[0], 200);
    assert!(image.ptr_eq(&source));
    assert_eq!(f.ref_count(), 2);
}

#[test]
fn shallow_clone_keeps_the_source_alive_in_either_close_order() {
    let released = Arc::new(AtomicUsize::new(0));
    let make = || {
        let f = Frame::create(None);
        let r = released.clone();
        f.set_image(
            Buffer::new(vec![1; 3]),
            3,
            Some(Box::new(move |_: Buffer| {
                r.fetch_add(1, Ordering::SeqCst);
            })),
        );
        f
    };

    let source = make();
    let child = source.clone_image(CloneMode::Shallow);
    child.close();
    assert_eq!(released.load(Ordering::SeqCst), 0);
    assert!(source.properties().get_buffer(keys::IMAGE).is_some());
    source.close();
    assert_eq!(released.load(Ordering::SeqCst), 1);

    let source = make();
    let child = source.clone_image(CloneMode::Shallow);
    source.close();
    assert_eq!(released.load(Ordering::SeqCst), 1);
    let (image, _) = child.properties().get_buffer(keys::IMAGE).expect("image");
    assert_eq!(image.to_vec(), vec![1; 3]);
    drop(image);
    child.close();
    assert_eq!(released.load(Ordering::SeqCst), 2);
}

#[test]
fn partial_clones_carry_only_their_channel() {
    let f = populated();
    let a = f.clone_audio(CloneMode::Deep);
    assert!(a.properties().get_buffer(keys::AUDIO).is_some());
    assert!(a.properties().get_buffer(keys::IMAGE).is_none());

    let i = f.clone_image(CloneMode::Shallow);
    assert!(i.properties().get_buffer(keys::IMAGE).is_some());
    assert!(i.properties().get_buffer(keys::AUDIO).is_none());
}

#[test]
fn deep_clone_recomputes_untracked_sizes() {
    let f = Frame::create(None);
    f.properties().set_int(keys::WIDTH, 2);
    f.properties().set_int(keys::HEIGHT, 1);
    f.properties().set_int(keys::FORMAT, ImageFormat::Yuv422.code());
    f.properties().set_int(keys::AUDIO_SAMPLES, 3);
    f.properties().set_int(keys::AUDIO_CHANNELS, 2);
    f.set_image(Buffer::new(vec![5; 4]), 0, None);
    f.set_alpha(Buffer::new(vec![6; 2]), 0, None);
    f.set_audio(Buffer::new(vec![7; 12]), AudioFormat::S16, 0, None);

    let c = f.clone_frame(CloneMode::Deep);
    assert_eq!(c.properties().get_buffer(keys::IMAGE).map(|(_, s)| s), Some(4));
    assert_eq!(c.properties().get_buffer(keys::ALPHA).map(|(_, s)| s), Some(2));
    let (audio, size) = c.properties().get_buffer(keys::AUDIO).expect("audio");
    assert_eq!(size, 12);
    assert_eq!(audio.to_vec(), vec![7; 12]);
}

#[test]
fn deep_clone_skips_gpu_resident_images() {
    let f = Frame::create(None);
    f.properties()
        .set_int(keys::FORMAT, ImageFormat::GpuGraph.code());
    f.set_image(Buffer::new(vec![1; 4]), 4, None);

    let c = f.clone_frame(CloneMode::Deep);
    assert!(c.properties().get_buffer(keys::IMAGE).is_none());
    assert_eq!(c.image_format(), ImageFormat::GpuGraph);
}

#[test]
fn deep_copy_is_bounded_by_the_source() {
    let slot = deep_copy(&Buffer::new(vec![4; 2]), 5);
    assert_eq!(slot.size(), 5);
    assert_eq!(slot.buffer().map(Buffer::to_vec), Some(vec![4, 4, 0, 0, 0]));
}
