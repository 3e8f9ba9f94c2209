use crate::format::image::ImageFormat;
use crate::frame::{Frame, keys};
use crate::pool::BufferPool;
use crate::properties::slot::{Buffer, DataSlot};

/// How a clone gets its buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CloneMode {
    /// Alias the source's buffers and keep the source alive for as long as the clone lives.
    #[default]
    Shallow,
    /// Copy the buffers into memory owned by the clone.
    Deep,
}

// Identity data re-attached on every clone, aliased without ownership.
const PASSTHROUGH_KEYS: [&str; 3] = [keys::PRODUCER, keys::GPU_CONVERT, keys::GPU_CPU_CONVERT];

impl Frame {
    /// Clone scalar properties plus the image, alpha and audio buffers.
    ///
    /// Clones start with empty stacks; they are meant for a separate downstream path.
    pub fn clone_frame(&self, mode: CloneMode) -> Frame {
        let clone = self.clone_base(mode);
        self.copy_audio_into(&clone, mode);
        self.copy_image_into(&clone, mode);
        clone
    }

    /// Clone scalar properties plus the audio buffer.
    pub fn clone_audio(&self, mode: CloneMode) -> Frame {
        let clone = self.clone_base(mode);
        self.copy_audio_into(&clone, mode);
        clone
    }

    /// Clone scalar properties plus the image and alpha buffers.
    pub fn clone_image(&self, mode: CloneMode) -> Frame {
        let clone = self.clone_base(mode);
        self.copy_image_into(&clone, mode);
        clone
    }

    fn clone_base(&self, mode: CloneMode) -> Frame {
        let clone = Frame::create(None);
        let props = clone.properties();
        props.inherit(self.properties());
        for key in PASSTHROUGH_KEYS {
            if let Some(slot) = self.properties().alias_data(key) {
                props.set_data(key, slot);
            }
        }
        if mode == CloneMode::Shallow {
            clone.inner.state.lock().clone_source = Some(self.clone());
        }
        tracing::trace!(?mode, position = self.position().0, "frame cloned");
        clone
    }

    fn copy_audio_into(&self, clone: &Frame, mode: CloneMode) {
        let props = self.properties();
        match mode {
            CloneMode::Shallow => {
                if let Some(slot) = props.alias_data(keys::AUDIO) {
                    clone.properties().set_data(keys::AUDIO, slot);
                }
            }
            CloneMode::Deep => {
                let Some((buffer, size)) = props.get_buffer(keys::AUDIO) else {
                    return;
                };
                let size = if size == 0 {
                    self.audio_format().buffer_size(
                        props.get_int(keys::AUDIO_SAMPLES).max(0) as u32,
                        props.get_int(keys::AUDIO_CHANNELS).max(0) as u32,
                    )
                } else {
                    size
                };
                clone
                    .properties()
                    .set_data(keys::AUDIO, deep_copy(&buffer, size));
            }
        }
    }

    fn copy_image_into(&self, clone: &Frame, mode: CloneMode) {
        let props = self.properties();
        match mode {
            CloneMode::Shallow => {
                if let Some(slot) = props.alias_data(keys::IMAGE) {
                    clone.properties().set_data(keys::IMAGE, slot);
                }
                if let Some((alpha, size)) = self.get_alpha_with_size() {
                    clone
                        .properties()
                        .set_data(keys::ALPHA, DataSlot::borrowed(alpha, size));
                }
            }
            CloneMode::Deep => {
                let format = self.image_format();
                if format == ImageFormat::GpuGraph {
                    return;
                }
                let Some((buffer, size)) = props.get_buffer(keys::IMAGE) else {
                    return;
                };
                let size = if size == 0 {
                    format.buffer_size(self.width(), self.height())
                } else {
                    size
                };
                clone
                    .properties()
                    .set_data(keys::IMAGE, deep_copy(&buffer, size));

                if let Some((alpha, size)) = self.get_alpha_with_size() {
                    clone
                        .properties()
                        .set_data(keys::ALPHA, deep_copy(&alpha, size));
                }
            }
        }
    }
}

fn deep_copy(source: &Buffer, size: usize) -> DataSlot {
    let pool = BufferPool::global();
    let mut bytes = pool.alloc(size);
    {
        let src = source.read();
        let n = size.min(src.len());
        bytes[..n].copy_from_slice(&src[..n]);
    }
    pool.slot_for(Buffer::new(bytes))
}

#[cfg(test)]
#[path = "../../tests/unit/frame/clone.rs"]
mod tests;
