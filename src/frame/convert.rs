use crate::foundation::error::FrameResult;
use crate::format::audio::AudioFormat;
use crate::format::image::ImageFormat;
use crate::frame::Frame;
use crate::frame::audio::Audio;
use crate::frame::image::Image;

/// Hook coercing a resolved image into a requested pixel format.
///
/// Installed per frame with [`Frame::set_image_converter`]. The frame caches whatever the
/// converter returns as its new image.
pub trait ImageConverter: Send + Sync {
    /// Convert `image` to `output`.
    fn convert(&self, frame: &Frame, image: Image, output: ImageFormat) -> FrameResult<Image>;
}

/// Hook coercing resolved audio into a requested sample format.
pub trait AudioConverter: Send + Sync {
    /// Convert `audio` to `output`.
    fn convert(&self, frame: &Frame, audio: Audio, output: AudioFormat) -> FrameResult<Audio>;
}

impl<F> ImageConverter for F
where
    F: Fn(&Frame, Image, ImageFormat) -> FrameResult<Image> + Send + Sync,
{
    fn convert(&self, frame: &Frame, image: Image, output: ImageFormat) -> FrameResult<Image> {
        self(frame, image, output)
    }
}

impl<F> AudioConverter for F
where
    F: Fn(&Frame, Audio, AudioFormat) -> FrameResult<Audio> + Send + Sync,
{
    fn convert(&self, frame: &Frame, audio: Audio, output: AudioFormat) -> FrameResult<Audio> {
        self(frame, audio, output)
    }
}
