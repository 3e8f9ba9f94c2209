use super::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

fn s16(samples: &[i16]) -> Buffer {
    Buffer::new(samples.iter().flat_map(|s| s.to_ne_bytes()).collect())
}

fn read_s16(buffer: &Buffer) -> Vec<i16> {
    buffer
        .read()
        .chunks_exact(2)
        .map(|c| i16::from_ne_bytes([c[0], c[1]]))
        .collect()
}

fn push_pcm(frame: &Frame, pcm: Vec<i16>, calls: &Arc<AtomicUsize>) {
    let calls = calls.clone();
    frame.push_audio_operation(move |_, _| {
        calls.fetch_add(1, Ordering::SeqCst);
        let samples = (pcm.len() / 2) as u32;
        Ok(Audio::new(s16(&pcm), AudioFormat::S16, 48_000, 2, samples))
    });
}

#[test]
fn silence_uses_defaults_for_unset_fields() {
    let f = Frame::create(None);
    let audio = f.get_audio(AudioRequest::default());
    assert_eq!(audio.format, AudioFormat::S16);
    assert_eq!(
        (audio.frequency, audio.channels, audio.samples),
        (48_000, 2, 1920)
    );
    assert_eq!(audio.buffer.len(), 1920 * 2 * 2);
    assert!(audio.buffer.read().iter().all(|&b| b == 0));
    assert_eq!(f.properties().get_int(keys::TEST_AUDIO), 1);
    assert!(f.is_test_card_audio());
}

#[test]
fn silence_honours_explicit_fields() {
    let f = Frame::create(None);
    let audio = f.get_audio(AudioRequest::new(AudioFormat::Float, 44_100, 1, 100));
    assert_eq!(audio.buffer.len(), 400);
    assert_eq!(f.audio_format(), AudioFormat::Float);
    assert_eq!(f.properties().get_int(keys::AUDIO_FREQUENCY), 44_100);
}

#[test]
fn stack_audio_is_cached_and_reused() {
    let calls = Arc::new(AtomicUsize::new(0));
    let f = Frame::create(None);
    push_pcm(&f, vec![1, -1, 2, -2], &calls);

    let first = f.get_audio(AudioRequest::default());
    assert_eq!(read_s16(&first.buffer), vec![1, -1, 2, -2]);
    assert_eq!(f.properties().get_int(keys::AUDIO_SAMPLES), 2);
    let second = f.get_audio(AudioRequest::default());
    assert!(second.buffer.ptr_eq(&first.buffer));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(!f.is_test_card_audio());
}

#[test]
fn hidden_audio_discards_the_pending_operation_unrun() {
    let calls = Arc::new(AtomicUsize::new(0));
    let f = Frame::create(None);
    push_pcm(&f, vec![5, 5], &calls);
    f.properties().set_int(keys::TEST_AUDIO, 1);

    let audio = f.get_audio(AudioRequest::default());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(audio.samples, DEFAULT_SAMPLES);
    assert_eq!(f.audio_stack_len(), 0);
    assert_eq!(Arc::strong_count(&calls), 1);
}

#[test]
fn failing_operation_yields_silence() {
    let f = Frame::create(None);
    f.push_audio_operation(|_, _| Err(FrameError::resolution("demuxer closed")));
    let audio = f.get_audio(AudioRequest::new(AudioFormat::S16, 0, 1, 4));
    assert_eq!(read_s16(&audio.buffer), vec![0; 4]);
}

#[test]
fn zero_volume_silences_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let f = Frame::create(None);
    push_pcm(&f, vec![100, -100, 7, 8], &calls);
    f.properties().set_double(keys::VOLUME, 0.0);

    let audio = f.get_audio(AudioRequest::default());
    assert_eq!(read_s16(&audio.buffer), vec![0; 4]);
    assert!(!f.properties().contains(keys::VOLUME));
}

#[test]
fn volume_scales_clamps_and_is_consumed() {
    let calls = Arc::new(AtomicUsize::new(0));
    let f = Frame::create(None);
    push_pcm(&f, vec![100, -100, 20_000, -20_000], &calls);
    f.properties().set_double(keys::VOLUME, 2.0);

    let audio = f.get_audio(AudioRequest::default());
    assert_eq!(read_s16(&audio.buffer), vec![200, -200, 32_767, -32_768]);
    assert!(!f.properties().contains(keys::VOLUME));

    let again = f.get_audio(AudioRequest::default());
    assert_eq!(read_s16(&again.buffer), vec![200, -200, 32_767, -32_768]);
}

#[test]
fn volume_waits_for_s16_audio() {
    let f = Frame::create(None);
    f.properties().set_double(keys::VOLUME, 0.5);
    let audio = f.get_audio(AudioRequest::new(AudioFormat::F32le, 0, 0, 0));
    assert_eq!(audio.format, AudioFormat::F32le);
    assert!(f.properties().contains(keys::VOLUME));
}

#[test]
fn audio_converter_runs_for_a_differing_explicit_format() {
    let f = Frame::create(None);
    f.set_audio_converter(Some(Arc::new(
        |_: &Frame, audio: Audio, output: AudioFormat| -> FrameResult<Audio> {
            let len = output.buffer_size(audio.samples, audio.channels);
            Ok(Audio::new(
                Buffer::zeroed(len),
                output,
                audio.frequency,
                audio.channels,
                audio.samples,
            ))
        },
    )));
    let calls = Arc::new(AtomicUsize::new(0));
    push_pcm(&f, vec![1, 2, 3, 4], &calls);

    let audio = f.get_audio(AudioRequest::new(AudioFormat::S32le, 0, 0, 0));
    assert_eq!(audio.format, AudioFormat::S32le);
    assert_eq!(audio.buffer.len(), 16);
    assert_eq!(f.audio_format(), AudioFormat::S32le);
}

#[test]
fn waveform_draws_each_channel_in_its_own_band() {
    let f = Frame::create(None);
    f.push_audio_operation(|_, request| {
        let mut pcm = Vec::new();
        for _ in 0..request.samples {
            pcm.extend_from_slice(&[16_384, -16_384]);
        }
        Ok(Audio::new(
            s16(&pcm),
            AudioFormat::S16,
            request.frequency,
            2,
            request.samples,
        ))
    });

    let bitmap = f.get_waveform(4, 8).expect("waveform");
    let bytes = bitmap.to_vec();
    for x in 0..4 {
        let column: Vec<u8> = (0..8).map(|y| bytes[y * 4 + x]).collect();
        assert_eq!(column, vec![0, 160, 255, 0, 0, 0, 255, 160], "column {x}");
    }
    assert_eq!(f.properties().get_int(keys::AUDIO_FREQUENCY), 16_000);
    let (cached, size) = f.properties().get_buffer(keys::WAVEFORM).expect("cached");
    assert!(cached.ptr_eq(&bitmap));
    assert_eq!(size, 32);
}

#[test]
fn waveform_raises_the_rate_for_wide_bitmaps() {
    let f = Frame::create(None);
    f.get_waveform(1000, 2).expect("waveform");
    // 25 fps: 640 samples at 16 kHz, 1280 at 32 kHz.
    assert_eq!(f.properties().get_int(keys::AUDIO_FREQUENCY), 32_000);
    assert_eq!(f.properties().get_int(keys::AUDIO_SAMPLES), 1280);
}

#[test]
fn waveform_rejects_empty_geometry_and_non_s16_audio() {
    let f = Frame::create(None);
    assert!(matches!(
        f.get_waveform(0, 10),
        Err(FrameError::Validation(_))
    ));

    let g = Frame::create(None);
    g.set_audio(Buffer::zeroed(8), AudioFormat::Float, 8, None);
    assert!(matches!(
        g.get_waveform(2, 2),
        Err(FrameError::Resolution(_))
    ));
}
