/// Pixel layouts a frame image can be resolved into.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageFormat {
    /// No preference / not yet known.
    #[default]
    None,
    /// Packed 8-bit RGB.
    Rgb,
    /// Packed 8-bit RGBA (alpha inline).
    Rgba,
    /// Packed 8-bit YUV 4:2:2 (YUYV).
    Yuv422,
    /// Planar 8-bit YUV 4:2:0.
    Yuv420p,
    /// Opaque handle into a GPU processing graph.
    GpuGraph,
    /// Opaque GL texture handle.
    GlTexture,
    /// Planar 16-bit YUV 4:2:2.
    Yuv422p16,
    /// Planar 10-bit (in 16-bit words) YUV 4:2:0.
    Yuv420p10,
    /// Planar 10-bit (in 16-bit words) YUV 4:4:4.
    Yuv444p10,
    /// Explicitly unusable.
    Invalid,
}

impl ImageFormat {
    /// Stable integer code stored in a frame's carrier.
    pub fn code(self) -> i64 {
        match self {
            ImageFormat::None => 0,
            ImageFormat::Rgb => 1,
            ImageFormat::Rgba => 2,
            ImageFormat::Yuv422 => 3,
            ImageFormat::Yuv420p => 4,
            ImageFormat::GpuGraph => 5,
            ImageFormat::GlTexture => 6,
            ImageFormat::Yuv422p16 => 7,
            ImageFormat::Yuv420p10 => 8,
            ImageFormat::Yuv444p10 => 9,
            ImageFormat::Invalid => 10,
        }
    }

    /// Inverse of [`ImageFormat::code`]; unknown codes map to `Invalid`.
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => ImageFormat::None,
            1 => ImageFormat::Rgb,
            2 => ImageFormat::Rgba,
            3 => ImageFormat::Yuv422,
            4 => ImageFormat::Yuv420p,
            5 => ImageFormat::GpuGraph,
            6 => ImageFormat::GlTexture,
            7 => ImageFormat::Yuv422p16,
            8 => ImageFormat::Yuv420p10,
            9 => ImageFormat::Yuv444p10,
            _ => ImageFormat::Invalid,
        }
    }

    /// Whether the image lives on the GPU and is not byte-addressable.
    pub fn is_gpu_resident(self) -> bool {
        matches!(self, ImageFormat::GpuGraph | ImageFormat::GlTexture)
    }

    /// Whether each pixel carries its own alpha sample.
    pub fn has_inline_alpha(self) -> bool {
        self == ImageFormat::Rgba
    }

    /// Whether pixels of this format can be synthesized in memory.
    pub fn is_concrete(self) -> bool {
        !matches!(
            self,
            ImageFormat::None
                | ImageFormat::Invalid
                | ImageFormat::GpuGraph
                | ImageFormat::GlTexture
        )
    }

    /// Exact buffer size in bytes for a `width`×`height` image; 0 for `None` and `Invalid`.
    pub fn buffer_size(self, width: u32, height: u32) -> usize {
        let w = width as usize;
        let h = height as usize;
        let cw = w.div_ceil(2);
        let ch = h.div_ceil(2);
        match self {
            ImageFormat::None | ImageFormat::Invalid => 0,
            ImageFormat::Rgb => w * h * 3,
            ImageFormat::Rgba => w * h * 4,
            ImageFormat::Yuv422 => w * h * 2,
            ImageFormat::Yuv420p => w * h + 2 * cw * ch,
            // Handle-sized placeholder.
            ImageFormat::GpuGraph | ImageFormat::GlTexture => 4,
            ImageFormat::Yuv422p16 => (w * h + 2 * cw * h) * 2,
            ImageFormat::Yuv420p10 => (w * h + 2 * cw * ch) * 2,
            ImageFormat::Yuv444p10 => w * h * 3 * 2,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/format/image.rs"]
mod tests;
