pub(crate) mod audio;
pub(crate) mod clone;
pub(crate) mod convert;
pub(crate) mod dump;
pub(crate) mod image;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use smallvec::SmallVec;

use crate::foundation::core::{FrameIndex, Profile};
use crate::foundation::error::{FrameError, FrameResult};
use crate::format::image::ImageFormat;
use crate::frame::audio::{Audio, AudioRequest};
use crate::frame::convert::{AudioConverter, ImageConverter};
use crate::frame::image::{Image, ImageRequest};
use crate::format::audio::AudioFormat;
use crate::properties::map::Properties;
use crate::properties::slot::{Buffer, DataSlot, Deleter};
use crate::service::{Service, ServiceHandle, ServiceToken};

/// Property keys a frame reads and writes in its carrier.
pub mod keys {
    /// Current (possibly re-timed) position.
    pub const POSITION: &str = "_position";
    /// Position first assigned to the frame.
    pub const ORIGINAL_POSITION: &str = "original_position";
    /// Resolved image buffer.
    pub const IMAGE: &str = "image";
    /// Separate alpha mask.
    pub const ALPHA: &str = "alpha";
    /// Resolved audio buffer.
    pub const AUDIO: &str = "audio";
    /// Image width in pixels.
    pub const WIDTH: &str = "width";
    /// Image height in pixels.
    pub const HEIGHT: &str = "height";
    /// Image format code.
    pub const FORMAT: &str = "format";
    /// Sample aspect ratio.
    pub const ASPECT_RATIO: &str = "aspect_ratio";
    /// Set when the image is a synthesized placeholder.
    pub const TEST_IMAGE: &str = "test_image";
    /// Set when the audio is synthesized silence, or to hide audio.
    pub const TEST_AUDIO: &str = "test_audio";
    /// Audio sample rate.
    pub const AUDIO_FREQUENCY: &str = "audio_frequency";
    /// Audio channel count.
    pub const AUDIO_CHANNELS: &str = "audio_channels";
    /// Audio samples per channel.
    pub const AUDIO_SAMPLES: &str = "audio_samples";
    /// Audio format code.
    pub const AUDIO_FORMAT: &str = "audio_format";
    /// One-shot gain applied to s16 audio on the next resolution.
    pub const VOLUME: &str = "meta.volume";
    /// Producer the frame originates from.
    pub const PRODUCER: &str = "_producer";
    /// Producer pulled for a placeholder image.
    pub const TEST_CARD_PRODUCER: &str = "test_card_producer";
    /// GPU interop converter, carried opaquely.
    pub const GPU_CONVERT: &str = "gpu.convert";
    /// GPU-to-CPU interop converter, carried opaquely.
    pub const GPU_CPU_CONVERT: &str = "_gpu cpu_convert";
    /// Scaling hint forwarded to the test-card frame.
    pub const CONSUMER_RESCALE: &str = "consumer.rescale";
    /// Colour range of the consumer (`full`/`jpeg`/`pc` mean full range).
    pub const CONSUMER_COLOR_RANGE: &str = "consumer.color_range";
    /// Last rendered waveform bitmap.
    pub const WAVEFORM: &str = "waveform";
    /// Profile of the service owning a unique-properties carrier.
    pub const PROFILE: &str = "_profile";
}

/// Deferred image producer pushed onto a frame.
///
/// The operation receives the frame it was popped from and may resolve the rest of the stack by
/// calling [`Frame::get_image`] itself.
pub type ImageOp = Box<dyn FnOnce(&Frame, ImageRequest) -> FrameResult<Image> + Send>;

/// Deferred audio producer pushed onto a frame.
pub type AudioOp = Box<dyn FnOnce(&Frame, AudioRequest) -> FrameResult<Audio> + Send>;

/// One entry of the image stack.
pub enum ImageSlot {
    /// Pending image operation.
    Operation(ImageOp),
    /// A frame parked for a later operation (e.g. the b-frame of a transition).
    Frame(Frame),
    /// A service parked for a later operation.
    Service(ServiceHandle),
    /// An integer parked for a later operation.
    Int(i64),
}

impl ImageSlot {
    fn kind(&self) -> &'static str {
        match self {
            ImageSlot::Operation(_) => "operation",
            ImageSlot::Frame(_) => "frame",
            ImageSlot::Service(_) => "service",
            ImageSlot::Int(_) => "int",
        }
    }
}

struct FrameState {
    image_stack: SmallVec<[ImageSlot; 4]>,
    audio_stack: SmallVec<[AudioOp; 2]>,
    service_stack: Vec<ServiceHandle>,
    convert_image: Option<Arc<dyn ImageConverter>>,
    convert_audio: Option<Arc<dyn AudioConverter>>,
    unique: HashMap<ServiceToken, Properties>,
    test_card_frame: Option<Frame>,
    clone_source: Option<Frame>,
    image_resolved: bool,
    audio_resolved: bool,
}

struct FrameInner {
    properties: Properties,
    state: Mutex<FrameState>,
}

impl Drop for FrameInner {
    fn drop(&mut self) {
        let st = self.state.get_mut();
        st.image_stack.clear();
        st.audio_stack.clear();
        let services = st.service_stack.len();
        while let Some(service) = st.service_stack.pop() {
            drop(service);
        }
        tracing::trace!(services, "frame released");
    }
}

/// The per-instant carrier of image and audio state plus its deferred processing stacks.
///
/// `Frame` is a shared handle: cloning it adds a reference and the frame is torn down when the
/// last handle drops. Use [`Frame::clone_frame`] and friends to duplicate frame *content*.
#[derive(Clone)]
pub struct Frame {
    inner: Arc<FrameInner>,
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let st = self.inner.state.lock();
        f.debug_struct("Frame")
            .field("position", &self.position())
            .field("image_stack", &st.image_stack.len())
            .field("audio_stack", &st.audio_stack.len())
            .field("service_stack", &st.service_stack.len())
            .field("test_card", &st.test_card_frame.is_some())
            .field("shallow_clone", &st.clone_source.is_some())
            .field("refs", &Arc::strong_count(&self.inner))
            .finish()
    }
}

impl Frame {
    /// Create an empty frame for `profile`, or for a 720×576 square-pixel geometry.
    pub fn create(profile: Option<&Profile>) -> Frame {
        let properties = Properties::new();
        properties.set_position(keys::POSITION, 0);
        properties.set_int(keys::WIDTH, profile.map_or(720, |p| i64::from(p.width)));
        properties.set_int(keys::HEIGHT, profile.map_or(576, |p| i64::from(p.height)));
        properties.set_double(keys::ASPECT_RATIO, Profile::sar(profile));

        Frame {
            inner: Arc::new(FrameInner {
                properties,
                state: Mutex::new(FrameState {
                    image_stack: SmallVec::new(),
                    audio_stack: SmallVec::new(),
                    service_stack: Vec::new(),
                    convert_image: None,
                    convert_audio: None,
                    unique: HashMap::new(),
                    test_card_frame: None,
                    clone_source: None,
                    image_resolved: false,
                    audio_resolved: false,
                }),
            }),
        }
    }

    /// Create a frame for the profile of `service`.
    pub fn for_service(service: &dyn Service) -> Frame {
        Frame::create(service.profile().as_ref())
    }

    /// The backing carrier.
    pub fn properties(&self) -> &Properties {
        &self.inner.properties
    }

    /// Number of live handles to this frame.
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    /// Whether both handles refer to the same frame.
    pub fn ptr_eq(&self, other: &Frame) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Release this handle. The frame is torn down when it was the last one.
    pub fn close(self) {
        drop(self);
    }

    /// Current position, clamped to zero.
    pub fn position(&self) -> FrameIndex {
        FrameIndex::from_signed(self.inner.properties.get_position(keys::POSITION))
    }

    /// First position ever assigned, clamped to zero.
    pub fn original_position(&self) -> FrameIndex {
        FrameIndex::from_signed(self.inner.properties.get_position(keys::ORIGINAL_POSITION))
    }

    /// Set the current position; the first call also fixes the original position.
    pub fn set_position(&self, position: i64) {
        let props = &self.inner.properties;
        if !props.contains(keys::ORIGINAL_POSITION) {
            props.set_position(keys::ORIGINAL_POSITION, position);
        }
        props.set_position(keys::POSITION, position);
    }

    /// Sample aspect ratio of the image.
    pub fn aspect_ratio(&self) -> f64 {
        self.inner.properties.get_double(keys::ASPECT_RATIO)
    }

    /// Set the sample aspect ratio of the image.
    pub fn set_aspect_ratio(&self, value: f64) {
        self.inner.properties.set_double(keys::ASPECT_RATIO, value);
    }

    /// Cached image width.
    pub fn width(&self) -> u32 {
        self.inner.properties.get_int(keys::WIDTH).max(0) as u32
    }

    /// Cached image height.
    pub fn height(&self) -> u32 {
        self.inner.properties.get_int(keys::HEIGHT).max(0) as u32
    }

    /// Format of the cached image.
    pub fn image_format(&self) -> ImageFormat {
        ImageFormat::from_code(self.inner.properties.get_int(keys::FORMAT))
    }

    /// Format of the cached audio.
    pub fn audio_format(&self) -> AudioFormat {
        AudioFormat::from_code(self.inner.properties.get_int(keys::AUDIO_FORMAT))
    }

    /// Whether resolving the image will produce (or produced) a placeholder.
    pub fn is_test_card_image(&self) -> bool {
        let props = &self.inner.properties;
        let empty = self.inner.state.lock().image_stack.is_empty();
        (empty && props.get_buffer(keys::IMAGE).is_none()) || props.get_int(keys::TEST_IMAGE) != 0
    }

    /// Whether resolving the audio will produce (or produced) silence.
    pub fn is_test_card_audio(&self) -> bool {
        let props = &self.inner.properties;
        let empty = self.inner.state.lock().audio_stack.is_empty();
        (empty && props.get_buffer(keys::AUDIO).is_none()) || props.get_int(keys::TEST_AUDIO) != 0
    }

    /// Push a deferred image operation. It runs before everything pushed earlier.
    pub fn push_image_operation<F>(&self, op: F)
    where
        F: FnOnce(&Frame, ImageRequest) -> FrameResult<Image> + Send + 'static,
    {
        let mut st = self.inner.state.lock();
        st.image_stack.push(ImageSlot::Operation(Box::new(op)));
        st.image_resolved = false;
    }

    /// Pop the most recently pushed image operation.
    ///
    /// Returns `None` when the stack is empty or its top holds another kind of slot.
    pub fn pop_image_operation(&self) -> Option<ImageOp> {
        self.pop_image_slot("operation", |slot| match slot {
            ImageSlot::Operation(op) => Ok(op),
            other => Err(other),
        })
    }

    /// Park a frame on the image stack.
    pub fn push_frame(&self, frame: Frame) {
        self.inner.state.lock().image_stack.push(ImageSlot::Frame(frame));
    }

    /// Take back a parked frame.
    pub fn pop_frame(&self) -> Option<Frame> {
        self.pop_image_slot("frame", |slot| match slot {
            ImageSlot::Frame(frame) => Ok(frame),
            other => Err(other),
        })
    }

    /// Park a service on the image stack.
    pub fn push_service(&self, service: ServiceHandle) {
        self.inner
            .state
            .lock()
            .image_stack
            .push(ImageSlot::Service(service));
    }

    /// Take back a parked service.
    pub fn pop_service(&self) -> Option<ServiceHandle> {
        self.pop_image_slot("service", |slot| match slot {
            ImageSlot::Service(service) => Ok(service),
            other => Err(other),
        })
    }

    /// Park an integer on the image stack.
    pub fn push_service_int(&self, value: i64) {
        self.inner.state.lock().image_stack.push(ImageSlot::Int(value));
    }

    /// Take back a parked integer.
    pub fn pop_service_int(&self) -> Option<i64> {
        self.pop_image_slot("int", |slot| match slot {
            ImageSlot::Int(v) => Ok(v),
            other => Err(other),
        })
    }

    fn pop_image_slot<T>(
        &self,
        expected: &'static str,
        extract: impl FnOnce(ImageSlot) -> Result<T, ImageSlot>,
    ) -> Option<T> {
        let mut st = self.inner.state.lock();
        let slot = st.image_stack.pop()?;
        match extract(slot) {
            Ok(v) => Some(v),
            Err(slot) => {
                tracing::warn!(
                    expected,
                    found = slot.kind(),
                    "image stack top holds another slot kind"
                );
                st.image_stack.push(slot);
                None
            }
        }
    }

    /// Number of entries on the image stack.
    pub fn image_stack_len(&self) -> usize {
        self.inner.state.lock().image_stack.len()
    }

    /// Push a deferred audio operation.
    pub fn push_audio_operation<F>(&self, op: F)
    where
        F: FnOnce(&Frame, AudioRequest) -> FrameResult<Audio> + Send + 'static,
    {
        let mut st = self.inner.state.lock();
        st.audio_stack.push(Box::new(op));
        st.audio_resolved = false;
    }

    /// Pop the most recently pushed audio operation.
    pub fn pop_audio_operation(&self) -> Option<AudioOp> {
        self.inner.state.lock().audio_stack.pop()
    }

    /// Number of pending audio operations.
    pub fn audio_stack_len(&self) -> usize {
        self.inner.state.lock().audio_stack.len()
    }

    /// Tie `service` to this frame's lifetime. Services are released in reverse order at teardown.
    pub fn attach_service(&self, service: ServiceHandle) {
        self.inner.state.lock().service_stack.push(service);
    }

    /// Number of services tied to this frame.
    pub fn service_stack_len(&self) -> usize {
        self.inner.state.lock().service_stack.len()
    }

    /// Install or remove the image conversion hook.
    pub fn set_image_converter(&self, converter: Option<Arc<dyn ImageConverter>>) {
        self.inner.state.lock().convert_image = converter;
    }

    /// Install or remove the audio conversion hook.
    pub fn set_audio_converter(&self, converter: Option<Arc<dyn AudioConverter>>) {
        self.inner.state.lock().convert_audio = converter;
    }

    /// Replace the cached image, releasing the previous one. `size` 0 means untracked.
    pub fn set_image(&self, buffer: Buffer, size: usize, deleter: Option<Deleter>) {
        self.inner
            .properties
            .set_data(keys::IMAGE, DataSlot::owned(buffer, size, deleter));
    }

    /// Replace the alpha mask, releasing the previous one. `size` 0 means untracked.
    pub fn set_alpha(&self, buffer: Buffer, size: usize, deleter: Option<Deleter>) {
        self.inner
            .properties
            .set_data(keys::ALPHA, DataSlot::owned(buffer, size, deleter));
    }

    /// Replace the cached audio and record its format.
    pub fn set_audio(
        &self,
        buffer: Buffer,
        format: AudioFormat,
        size: usize,
        deleter: Option<Deleter>,
    ) {
        let props = &self.inner.properties;
        props.set_int(keys::AUDIO_FORMAT, format.code());
        props.set_data(keys::AUDIO, DataSlot::owned(buffer, size, deleter));
    }

    /// Discard every pending image-stack entry and install `buffer` as the resolved image.
    ///
    /// Intended for compositors processing layers strictly innermost-first, where an opaque
    /// upper layer makes the lower one irrelevant. The buffer is installed without a deleter, so
    /// its owner must keep it alive. Fails when an alpha mask is attached.
    pub fn replace_image(
        &self,
        buffer: Buffer,
        format: ImageFormat,
        width: u32,
        height: u32,
    ) -> FrameResult<()> {
        let props = &self.inner.properties;
        if props.get_buffer(keys::ALPHA).is_some() {
            return Err(FrameError::precondition(
                "replace_image cannot be used while an alpha mask is attached",
            ));
        }
        let drained = std::mem::take(&mut self.inner.state.lock().image_stack);
        drop(drained);

        props.set_data(keys::IMAGE, DataSlot::borrowed(buffer, 0));
        props.set_int(keys::WIDTH, i64::from(width));
        props.set_int(keys::HEIGHT, i64::from(height));
        props.set_int(keys::FORMAT, format.code());
        Ok(())
    }

    /// Producer this frame originates from.
    pub fn original_producer(&self) -> Option<ServiceHandle> {
        self.inner.properties.get_object::<ServiceHandle>(keys::PRODUCER)
    }

    /// Record the producer this frame originates from.
    pub fn set_original_producer(&self, producer: ServiceHandle) {
        self.inner
            .properties
            .set_data(keys::PRODUCER, DataSlot::object(producer));
    }

    /// Producer pulled for a placeholder image when nothing else resolves.
    pub fn test_card_producer(&self) -> Option<ServiceHandle> {
        self.inner
            .properties
            .get_object::<ServiceHandle>(keys::TEST_CARD_PRODUCER)
    }

    /// Attach a producer used for placeholder images.
    pub fn set_test_card_producer(&self, producer: ServiceHandle) {
        self.inner
            .properties
            .set_data(keys::TEST_CARD_PRODUCER, DataSlot::object(producer));
    }

    /// Get or create the carrier scoped to this frame and `service`.
    ///
    /// Lets a service stash per-frame processing parameters without touching the frame's shared
    /// namespace. A new carrier inherits the service's numeric locale and profile.
    pub fn unique_properties_for(&self, service: &dyn Service) -> Properties {
        let token = service.token();
        if let Some(props) = self.inner.state.lock().unique.get(&token) {
            return props.clone();
        }

        let props = Properties::new();
        props.set_lc_numeric(service.lc_numeric());
        if let Some(profile) = service.profile() {
            props.set_data(keys::PROFILE, DataSlot::object(profile));
        }
        self.inner
            .state
            .lock()
            .unique
            .entry(token)
            .or_insert(props)
            .clone()
    }

    /// Carrier scoped to this frame and `service`, if one was created.
    pub fn get_unique_properties_for(&self, service: &dyn Service) -> Option<Properties> {
        let token = service.token();
        self.inner.state.lock().unique.get(&token).cloned()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/frame/stack.rs"]
mod tests;
