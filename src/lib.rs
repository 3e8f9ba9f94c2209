//! Framestack is the frame layer of a multimedia processing graph.
//!
//! A [`Frame`] carries one instant of image and audio. Producers, filters and transitions do not
//! compute pixels or samples when they attach to a frame; they push deferred operations onto its
//! stacks. A consumer later asks for the image or the audio and the frame pulls the operations,
//! most recent first, until a concrete buffer exists.
//!
//! # Resolution overview
//!
//! 1. **Stack**: pop the most recent operation and run it. An operation may resolve the rest of
//!    the stack by calling [`Frame::get_image`] / [`Frame::get_audio`] itself.
//! 2. **Cache**: once resolved, the frame answers from the buffers cached in its [`Properties`].
//! 3. **Fallback**: with nothing to pull, the image comes from an attached test-card producer or a
//!    synthesized checkerboard, and the audio is synthesized silence.
//!
//! The key design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Shared handles**: [`Frame`] and [`Properties`] are reference-counted; the last drop tears
//!   the frame down and releases its services in reverse attach order.
//! - **Owned buffers**: buffers live in [`DataSlot`]s that either own their memory through a
//!   deleter or alias memory owned elsewhere.
//! - **Short critical sections**: no internal lock is held while operations, converters or
//!   services run.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;
mod format;
mod frame;
mod pool;
mod properties;
mod service;

pub use foundation::core::{DEFAULT_SAMPLE_ASPECT, Fps, FrameIndex, Profile};
pub use foundation::error::{FrameError, FrameResult};
pub use format::audio::{AudioFormat, frame_samples, samples_to_position};
pub use format::image::ImageFormat;
pub use format::pattern::{fill_checkerboard, fill_white, is_full_range};
pub use frame::audio::{
    Audio, AudioRequest, DEFAULT_CHANNELS, DEFAULT_FORMAT, DEFAULT_FREQUENCY, DEFAULT_SAMPLES,
};
pub use frame::clone::CloneMode;
pub use frame::convert::{AudioConverter, ImageConverter};
pub use frame::image::{Image, ImageRequest};
pub use frame::{AudioOp, Frame, ImageOp, ImageSlot, keys};
pub use pool::{BufferPool, BufferPoolOpts, BufferPoolStats};
pub use properties::map::{Properties, Value};
pub use properties::slot::{Buffer, DataSlot, Deleter, Payload};
pub use service::{Service, ServiceHandle, ServiceToken};
