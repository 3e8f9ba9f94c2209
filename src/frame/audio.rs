use tracing::{debug, warn};

use crate::foundation::core::Profile;
use crate::foundation::error::{FrameError, FrameResult};
use crate::format::audio::{AudioFormat, frame_samples};
use crate::frame::{AudioOp, Frame, keys};
use crate::pool::BufferPool;
use crate::properties::slot::{Buffer, DataSlot};

/// Samples per channel synthesized when the request leaves them unset.
pub const DEFAULT_SAMPLES: u32 = 1920;
/// Channel count synthesized when the request leaves it unset.
pub const DEFAULT_CHANNELS: u32 = 2;
/// Sample rate synthesized when the request leaves it unset.
pub const DEFAULT_FREQUENCY: u32 = 48_000;
/// Sample format synthesized when the request leaves it unset.
pub const DEFAULT_FORMAT: AudioFormat = AudioFormat::S16;

const WAVEFORM_FREQUENCY_STEP: u32 = 16_000;

/// What a consumer asks of [`Frame::get_audio`]. Zero or `None` fields are unspecified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AudioRequest {
    /// Preferred sample format.
    pub format: AudioFormat,
    /// Preferred sample rate.
    pub frequency: u32,
    /// Preferred channel count.
    pub channels: u32,
    /// Preferred samples per channel.
    pub samples: u32,
}

impl AudioRequest {
    /// Request `samples` of `format` at `frequency` over `channels` channels.
    pub fn new(format: AudioFormat, frequency: u32, channels: u32, samples: u32) -> Self {
        Self {
            format,
            frequency,
            channels,
            samples,
        }
    }
}

/// Resolved interleaved audio.
#[derive(Debug, Clone)]
pub struct Audio {
    /// Sample bytes, shared with the frame's cache.
    pub buffer: Buffer,
    /// Sample layout of `buffer`.
    pub format: AudioFormat,
    /// Sample rate.
    pub frequency: u32,
    /// Channel count.
    pub channels: u32,
    /// Samples per channel.
    pub samples: u32,
}

impl Audio {
    /// Wrap `buffer` as interleaved `format` audio.
    pub fn new(
        buffer: Buffer,
        format: AudioFormat,
        frequency: u32,
        channels: u32,
        samples: u32,
    ) -> Self {
        Self {
            buffer,
            format,
            frequency,
            channels,
            samples,
        }
    }
}

impl Frame {
    /// Resolve the frame's audio. Never fails: falls back to cached audio, then to silence.
    ///
    /// A pending `meta.volume` is applied to s16 results and consumed.
    #[tracing::instrument(level = "debug", skip(self), fields(position = self.position().0))]
    pub fn get_audio(&self, request: AudioRequest) -> Audio {
        let props = self.properties();
        let hidden = props.get_int(keys::TEST_AUDIO) != 0;

        let mut resolved = None;
        if let Some(op) = self.take_pending_audio_op(hidden) {
            match op(self, request) {
                Ok(audio) if !audio.buffer.is_empty() => {
                    debug!(format = ?audio.format, samples = audio.samples, "audio from stack");
                    let audio = self.cache_audio(audio);
                    resolved = Some(self.convert_audio_to(audio, request.format));
                }
                Ok(_) => warn!("audio operation produced no samples"),
                Err(err) => warn!(%err, "audio operation failed"),
            }
        }

        let audio = match resolved {
            Some(audio) => audio,
            None => match self.cached_audio() {
                Some(audio) => self.convert_audio_to(audio, request.format),
                None => self.synthesize_silence(request),
            },
        };
        self.inner.state.lock().audio_resolved = true;
        self.apply_pending_volume(audio)
    }

    /// Render the frame's audio as an 8-bit grayscale `width`×`height` bitmap.
    ///
    /// Audio is pulled as s16 stereo at 16 kHz, raised in 16 kHz steps until the frame holds at
    /// least `width` samples. Each channel gets its own horizontal band (channel 0 on top);
    /// positive samples rise from the band's centre line and negative ones fall from it. The
    /// bitmap is cached under `waveform`.
    pub fn get_waveform(&self, width: u32, height: u32) -> FrameResult<Buffer> {
        let size = width as usize * height as usize;
        if size == 0 {
            return Err(FrameError::validation("waveform needs a non-empty geometry"));
        }

        let fps = self
            .original_producer()
            .and_then(|p| p.profile())
            .map(|p| p.fps)
            .filter(|fps| fps.num != 0 && fps.den != 0)
            .unwrap_or_else(|| Profile::default().fps);
        let position = self.position().0 as i64;
        let mut frequency = WAVEFORM_FREQUENCY_STEP;
        let mut samples = frame_samples(fps, frequency, position);
        while samples < width {
            let Some(next) = frequency.checked_add(WAVEFORM_FREQUENCY_STEP) else {
                break;
            };
            frequency = next;
            samples = frame_samples(fps, frequency, position);
        }

        let audio = self.get_audio(AudioRequest::new(AudioFormat::S16, frequency, 2, samples));
        if audio.format != AudioFormat::S16 {
            return Err(FrameError::resolution(format!(
                "waveform needs s16 audio, got {:?}",
                audio.format
            )));
        }

        let pool = BufferPool::global();
        let mut bitmap = pool.alloc(size);
        rasterize_waveform(&mut bitmap, width, height, &audio);

        let bitmap = Buffer::new(bitmap);
        self.properties()
            .set_data(keys::WAVEFORM, pool.slot_for(bitmap.clone()));
        Ok(bitmap)
    }

    fn take_pending_audio_op(&self, hidden: bool) -> Option<AudioOp> {
        let op = {
            let mut st = self.inner.state.lock();
            if st.audio_resolved {
                return None;
            }
            st.audio_stack.pop()
        };
        if hidden {
            // Hidden audio discards the operation unrun.
            drop(op);
            return None;
        }
        op
    }

    fn cached_audio(&self) -> Option<Audio> {
        let props = self.properties();
        let (buffer, _) = props.get_buffer(keys::AUDIO)?;
        Some(Audio::new(
            buffer,
            self.audio_format(),
            props.get_int(keys::AUDIO_FREQUENCY).max(0) as u32,
            props.get_int(keys::AUDIO_CHANNELS).max(0) as u32,
            props.get_int(keys::AUDIO_SAMPLES).max(0) as u32,
        ))
    }

    fn cache_audio(&self, audio: Audio) -> Audio {
        let props = self.properties();
        let cached = props
            .get_buffer(keys::AUDIO)
            .is_some_and(|(b, _)| b.ptr_eq(&audio.buffer));
        if !cached {
            props.set_data(
                keys::AUDIO,
                DataSlot::borrowed(audio.buffer.clone(), audio.buffer.len()),
            );
        }
        props.set_int(keys::AUDIO_FREQUENCY, i64::from(audio.frequency));
        props.set_int(keys::AUDIO_CHANNELS, i64::from(audio.channels));
        props.set_int(keys::AUDIO_SAMPLES, i64::from(audio.samples));
        props.set_int(keys::AUDIO_FORMAT, audio.format.code());
        audio
    }

    fn convert_audio_to(&self, audio: Audio, output: AudioFormat) -> Audio {
        if output == AudioFormat::None || audio.format == output {
            return audio;
        }
        let converter = self.inner.state.lock().convert_audio.clone();
        let Some(converter) = converter else {
            return audio;
        };
        match converter.convert(self, audio.clone(), output) {
            Ok(converted) => self.cache_audio(converted),
            Err(err) => {
                warn!(%err, from = ?audio.format, to = ?output, "audio conversion failed");
                audio
            }
        }
    }

    fn synthesize_silence(&self, request: AudioRequest) -> Audio {
        let format = match request.format {
            AudioFormat::None => DEFAULT_FORMAT,
            f => f,
        };
        let or_default = |v: u32, default: u32| if v == 0 { default } else { v };
        let samples = or_default(request.samples, DEFAULT_SAMPLES);
        let channels = or_default(request.channels, DEFAULT_CHANNELS);
        let frequency = or_default(request.frequency, DEFAULT_FREQUENCY);
        debug!(?format, samples, channels, frequency, "synthesized silence");

        let pool = BufferPool::global();
        let buffer = Buffer::new(pool.alloc(format.buffer_size(samples, channels)));
        let props = self.properties();
        props.set_data(keys::AUDIO, pool.slot_for(buffer.clone()));
        props.set_int(keys::AUDIO_FREQUENCY, i64::from(frequency));
        props.set_int(keys::AUDIO_CHANNELS, i64::from(channels));
        props.set_int(keys::AUDIO_SAMPLES, i64::from(samples));
        props.set_int(keys::AUDIO_FORMAT, format.code());
        props.set_int(keys::TEST_AUDIO, 1);
        Audio::new(buffer, format, frequency, channels, samples)
    }

    fn apply_pending_volume(&self, audio: Audio) -> Audio {
        let props = self.properties();
        if audio.format != AudioFormat::S16 || !props.contains(keys::VOLUME) {
            return audio;
        }
        let volume = props.get_double(keys::VOLUME);
        props.remove(keys::VOLUME);

        let mut bytes = audio.buffer.write();
        if volume == 0.0 {
            bytes.fill(0);
        } else if volume != 1.0 {
            for sample in bytes.chunks_exact_mut(2) {
                let v = f64::from(i16::from_ne_bytes([sample[0], sample[1]])) * volume;
                let v = v.clamp(f64::from(i16::MIN), f64::from(i16::MAX)) as i16;
                sample.copy_from_slice(&v.to_ne_bytes());
            }
        }
        drop(bytes);
        audio
    }
}

fn rasterize_waveform(bitmap: &mut [u8], width: u32, height: u32, audio: &Audio) {
    let channels = audio.channels.max(1) as usize;
    let (w, h) = (width as usize, height as usize);
    let pcm = audio.buffer.read();
    let frames = (audio.samples as usize).min(pcm.len() / (2 * channels));
    let skip = (frames / w).max(1);
    let gray = (0xFF / skip).min(0xFF) as u8;
    debug!(frames, skip, "rasterizing waveform");

    for i in 0..frames {
        let x = i / skip;
        if x >= w {
            break;
        }
        for ch in 0..channels {
            let at = (i * channels + ch) * 2;
            let sample = i16::from_ne_bytes([pcm[at], pcm[at + 1]]);
            let magnitude = i64::from(sample).unsigned_abs() as usize;
            let line = h * magnitude / channels / 2 / 32768;
            let centre = h * (ch * 2 + 1) / channels / 2;
            let top = if sample < 0 {
                centre
            } else {
                centre.saturating_sub(line)
            };
            for k in 0..=line {
                let y = top + k;
                if y >= h {
                    break;
                }
                let px = &mut bitmap[y * w + x];
                let on_centre = if sample < 0 { k == 0 } else { k == line };
                *px = if on_centre { 0xFF } else { px.saturating_add(gray) };
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/frame/audio.rs"]
mod tests;
