use tracing::{debug, warn};

use crate::foundation::error::{FrameError, FrameResult};
use crate::format::image::ImageFormat;
use crate::format::pattern;
use crate::frame::{Frame, ImageOp, ImageSlot, keys};
use crate::pool::BufferPool;
use crate::properties::slot::{Buffer, DataSlot};

const FALLBACK_WIDTH: u32 = 720;
const FALLBACK_HEIGHT: u32 = 576;

/// What a consumer asks of [`Frame::get_image`]. Every field is advisory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageRequest {
    /// Preferred pixel format; [`ImageFormat::None`] means "whatever is native".
    pub format: ImageFormat,
    /// Preferred width, 0 for unspecified.
    pub width: u32,
    /// Preferred height, 0 for unspecified.
    pub height: u32,
    /// Whether the caller intends to write into the buffer.
    pub writable: bool,
}

impl ImageRequest {
    /// Request `format` at `width`×`height`.
    pub fn new(format: ImageFormat, width: u32, height: u32) -> Self {
        Self {
            format,
            width,
            height,
            writable: false,
        }
    }

    /// Request the native format and geometry.
    pub fn native() -> Self {
        Self::new(ImageFormat::None, 0, 0)
    }

    /// Mark the request as writable.
    pub fn writable(mut self, writable: bool) -> Self {
        self.writable = writable;
        self
    }
}

impl Default for ImageRequest {
    fn default() -> Self {
        Self::native()
    }
}

/// A resolved image.
#[derive(Debug, Clone)]
pub struct Image {
    /// Pixel bytes, shared with the frame's cache.
    pub buffer: Buffer,
    /// Pixel layout of `buffer`.
    pub format: ImageFormat,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Image {
    /// Wrap `buffer` as a `format` image of the given geometry.
    pub fn new(buffer: Buffer, format: ImageFormat, width: u32, height: u32) -> Self {
        Self {
            buffer,
            format,
            width,
            height,
        }
    }
}

impl Frame {
    /// Resolve the frame's image.
    ///
    /// Pops and runs the most recent image operation if the frame is not yet resolved, otherwise
    /// returns the cached image. When neither yields pixels, pulls the attached test-card producer
    /// or synthesizes a placeholder and marks the frame with `test_image`.
    ///
    /// The result is converted to `request.format` when a converter is installed and the format is
    /// not [`ImageFormat::None`]; without one the native format is returned as is.
    #[tracing::instrument(level = "debug", skip(self), fields(position = self.position().0))]
    pub fn get_image(&self, request: ImageRequest) -> FrameResult<Image> {
        if let Some(op) = self.take_pending_image_op() {
            match op(self, request) {
                Ok(image) if !image.buffer.is_empty() => {
                    debug!(
                        format = ?image.format,
                        width = image.width,
                        height = image.height,
                        "image from stack"
                    );
                    let image = self.cache_image(image);
                    let image = self.convert_image_to(image, request.format);
                    self.inner.state.lock().image_resolved = true;
                    return Ok(image);
                }
                Ok(_) => warn!("image operation produced no pixels"),
                Err(err) => warn!(%err, "image operation failed"),
            }
        } else if let Some((buffer, _)) = self.properties().get_buffer(keys::IMAGE) {
            let image = Image::new(buffer, self.image_format(), self.width(), self.height());
            self.inner.state.lock().image_resolved = true;
            return Ok(self.convert_image_to(image, request.format));
        }

        let image = self.fallback_image(request)?;
        self.inner.state.lock().image_resolved = true;
        Ok(image)
    }

    /// Separate alpha mask, suppressed when the image format carries alpha inline.
    pub fn get_alpha(&self) -> Option<Buffer> {
        self.get_alpha_with_size().map(|(buffer, _)| buffer)
    }

    /// Separate alpha mask and its size; an untracked size is reported as width×height.
    pub fn get_alpha_with_size(&self) -> Option<(Buffer, usize)> {
        if self.image_format().has_inline_alpha() {
            return None;
        }
        let (buffer, size) = self.properties().get_buffer(keys::ALPHA)?;
        let size = if size == 0 {
            self.width() as usize * self.height() as usize
        } else {
            size
        };
        Some((buffer, size))
    }

    fn take_pending_image_op(&self) -> Option<ImageOp> {
        let mut st = self.inner.state.lock();
        if st.image_resolved || !matches!(st.image_stack.last(), Some(ImageSlot::Operation(_))) {
            return None;
        }
        match st.image_stack.pop() {
            Some(ImageSlot::Operation(op)) => Some(op),
            _ => None,
        }
    }

    fn cache_image(&self, image: Image) -> Image {
        let props = self.properties();
        let cached = props
            .get_buffer(keys::IMAGE)
            .is_some_and(|(b, _)| b.ptr_eq(&image.buffer));
        if !cached {
            props.set_data(
                keys::IMAGE,
                DataSlot::borrowed(image.buffer.clone(), image.buffer.len()),
            );
        }
        props.set_int(keys::WIDTH, i64::from(image.width));
        props.set_int(keys::HEIGHT, i64::from(image.height));
        props.set_int(keys::FORMAT, image.format.code());
        image
    }

    fn convert_image_to(&self, image: Image, output: ImageFormat) -> Image {
        if output == ImageFormat::None || image.format == output {
            return image;
        }
        let converter = self.inner.state.lock().convert_image.clone();
        let Some(converter) = converter else {
            return image;
        };
        match converter.convert(self, image.clone(), output) {
            Ok(converted) => self.cache_image(converted),
            Err(err) => {
                warn!(%err, from = ?image.format, to = ?output, "image conversion failed");
                image
            }
        }
    }

    fn fallback_image(&self, request: ImageRequest) -> FrameResult<Image> {
        if let Some(image) = self.test_card_image(request) {
            return Ok(image);
        }
        self.synthesize_image(request)
    }

    fn test_card_image(&self, request: ImageRequest) -> Option<Image> {
        let props = self.properties();
        let producer = self.test_card_producer()?;
        let test_frame = match producer.get_frame(0) {
            Ok(frame) => frame,
            Err(err) => {
                warn!(%err, "test card producer failed, clearing it");
                props.remove(keys::TEST_CARD_PRODUCER);
                return None;
            }
        };

        let test_props = test_frame.properties();
        test_props.remove(keys::TEST_CARD_PRODUCER);
        if let Some(rescale) = props.get_string(keys::CONSUMER_RESCALE) {
            test_props.set_string(keys::CONSUMER_RESCALE, rescale);
        }

        let image = match test_frame.get_image(request) {
            Ok(image) => image,
            Err(err) => {
                warn!(%err, "test card frame did not resolve");
                return None;
            }
        };
        debug!(
            format = ?image.format,
            width = image.width,
            height = image.height,
            "image from test card"
        );

        self.set_aspect_ratio(test_frame.aspect_ratio());
        let previous = self.inner.state.lock().test_card_frame.replace(test_frame);
        drop(previous);
        let image = self.cache_image(image);
        props.set_int(keys::TEST_IMAGE, 1);
        Some(self.convert_image_to(image, request.format))
    }

    fn synthesize_image(&self, request: ImageRequest) -> FrameResult<Image> {
        let props = self.properties();
        let width = [request.width, self.width()]
            .into_iter()
            .find(|&w| w != 0)
            .unwrap_or(FALLBACK_WIDTH);
        let height = [request.height, self.height()]
            .into_iter()
            .find(|&h| h != 0)
            .unwrap_or(FALLBACK_HEIGHT);
        let format = match request.format {
            ImageFormat::None | ImageFormat::GpuGraph | ImageFormat::GlTexture => {
                ImageFormat::Yuv422
            }
            ImageFormat::Invalid => {
                return Err(FrameError::resolution(
                    "cannot synthesize a placeholder in an invalid image format",
                ));
            }
            concrete => concrete,
        };

        let pool = BufferPool::global();
        let mut bytes = pool.alloc(format.buffer_size(width, height));
        if props.get_int(keys::TEST_AUDIO) != 0 {
            let full_range =
                pattern::is_full_range(props.get_string(keys::CONSUMER_COLOR_RANGE).as_deref());
            pattern::fill_white(&mut bytes, format, width, height, full_range)?;
        } else {
            let aspect = self.aspect_ratio();
            pattern::fill_checkerboard(&mut bytes, format, width, height, aspect)?;
        }
        debug!(?format, width, height, "synthesized placeholder image");

        let buffer = Buffer::new(bytes);
        props.set_data(keys::IMAGE, pool.slot_for(buffer.clone()));
        props.set_int(keys::WIDTH, i64::from(width));
        props.set_int(keys::HEIGHT, i64::from(height));
        props.set_int(keys::FORMAT, format.code());
        props.set_int(keys::TEST_IMAGE, 1);
        Ok(Image::new(buffer, format, width, height))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/frame/image.rs"]
mod tests;
