use std::io::BufWriter;
use std::path::{Path, PathBuf};

use ::image::codecs::pnm::{PnmEncoder, PnmSubtype, SampleEncoding};
use ::image::{ExtendedColorType, ImageEncoder as _};

use crate::foundation::error::{FrameError, FrameResult};
use crate::format::image::ImageFormat;
use crate::frame::Frame;
use crate::frame::image::ImageRequest;

impl Frame {
    /// Resolve the image as RGB and write it to `dir/frame-NNNNN.ppm` (binary P6).
    ///
    /// Diagnostic aid only. Fails when the image cannot be had as RGB, which happens for a cached
    /// non-RGB image when no converter is installed.
    pub fn write_ppm(&self, dir: impl AsRef<Path>) -> FrameResult<PathBuf> {
        let image = self.get_image(ImageRequest::new(
            ImageFormat::Rgb,
            self.width(),
            self.height(),
        ))?;
        if image.format != ImageFormat::Rgb {
            return Err(FrameError::resolution(format!(
                "ppm dump needs an rgb image, got {:?}",
                image.format
            )));
        }

        let expected = ImageFormat::Rgb.buffer_size(image.width, image.height);
        let bytes = image.buffer.read();
        if expected == 0 || bytes.len() < expected {
            return Err(FrameError::resolution(format!(
                "rgb image holds {} bytes, {}x{} needs {expected}",
                bytes.len(),
                image.width,
                image.height
            )));
        }

        let path = dir
            .as_ref()
            .join(format!("frame-{:05}.ppm", self.position().0));
        let file = std::fs::File::create(&path)
            .map_err(|e| FrameError::io(format!("create {}: {e}", path.display())))?;
        PnmEncoder::new(BufWriter::new(file))
            .with_subtype(PnmSubtype::Pixmap(SampleEncoding::Binary))
            .write_image(
                &bytes[..expected],
                image.width,
                image.height,
                ExtendedColorType::Rgb8,
            )
            .map_err(|e| FrameError::io(format!("write {}: {e}", path.display())))?;
        tracing::debug!(path = %path.display(), "frame dumped");
        Ok(path)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/frame/dump.rs"]
mod tests;
