use crate::foundation::error::{FrameError, FrameResult};
use crate::format::image::ImageFormat;

const CHECKER_LIGHT: u8 = 0xC0;
const CHECKER_DARK: u8 = 0x40;

/// Fill `buf` with a checkerboard whose cells look square for sample aspect `sar`.
pub fn fill_checkerboard(
    buf: &mut [u8],
    format: ImageFormat,
    width: u32,
    height: u32,
    sar: f64,
) -> FrameResult<()> {
    let cell_h = (height / 16).max(1);
    let sar = if sar.is_finite() && sar > 0.0 { sar } else { 1.0 };
    let cell_w = (f64::from(cell_h) / sar).round().max(1.0) as u32;
    write_image(buf, format, width, height, |x, y| {
        if ((x / cell_w) + (y / cell_h)) % 2 == 0 {
            CHECKER_LIGHT
        } else {
            CHECKER_DARK
        }
    })
}

/// Fill `buf` with flat white, at full (255) or limited (235) range.
pub fn fill_white(
    buf: &mut [u8],
    format: ImageFormat,
    width: u32,
    height: u32,
    full_range: bool,
) -> FrameResult<()> {
    let level = if full_range { 255 } else { 235 };
    write_image(buf, format, width, height, |_, _| level)
}

/// Whether a `consumer.color_range` value denotes full range.
pub fn is_full_range(color_range: Option<&str>) -> bool {
    matches!(color_range, Some("full" | "jpeg" | "pc"))
}

fn write_u16(buf: &mut [u8], idx: usize, v: u16) {
    buf[idx * 2..idx * 2 + 2].copy_from_slice(&v.to_le_bytes());
}

fn scale_10(v: u8) -> u16 {
    (u32::from(v) * 1023 / 255) as u16
}

fn scale_16(v: u8) -> u16 {
    u16::from(v) * 257
}

// Writes grey levels (luma only, neutral chroma) for every concrete layout.
fn write_image(
    buf: &mut [u8],
    format: ImageFormat,
    width: u32,
    height: u32,
    luma: impl Fn(u32, u32) -> u8,
) -> FrameResult<()> {
    if !format.is_concrete() {
        return Err(FrameError::validation(format!(
            "cannot fill a {format:?} image in memory"
        )));
    }
    let need = format.buffer_size(width, height);
    if buf.len() < need {
        return Err(FrameError::validation(format!(
            "pattern buffer too small: {} < {need}",
            buf.len()
        )));
    }

    let w = width as usize;
    let h = height as usize;
    let cw = w.div_ceil(2);
    let ch = h.div_ceil(2);
    let pixels = (0..height).flat_map(|y| (0..width).map(move |x| (x, y)));

    match format {
        ImageFormat::Rgb | ImageFormat::Rgba => {
            let bpp = if format == ImageFormat::Rgba { 4 } else { 3 };
            for (i, (x, y)) in pixels.enumerate() {
                let v = luma(x, y);
                let px = &mut buf[i * bpp..(i + 1) * bpp];
                px[..3].fill(v);
                if bpp == 4 {
                    px[3] = 0xFF;
                }
            }
        }
        ImageFormat::Yuv422 => {
            for (i, (x, y)) in pixels.enumerate() {
                buf[i * 2] = luma(x, y);
                buf[i * 2 + 1] = 128;
            }
        }
        ImageFormat::Yuv420p => {
            for (i, (x, y)) in pixels.enumerate() {
                buf[i] = luma(x, y);
            }
            buf[w * h..w * h + 2 * cw * ch].fill(128);
        }
        ImageFormat::Yuv422p16 => {
            for (i, (x, y)) in pixels.enumerate() {
                write_u16(buf, i, scale_16(luma(x, y)));
            }
            for i in w * h..w * h + 2 * cw * h {
                write_u16(buf, i, 1 << 15);
            }
        }
        ImageFormat::Yuv420p10 => {
            for (i, (x, y)) in pixels.enumerate() {
                write_u16(buf, i, scale_10(luma(x, y)));
            }
            for i in w * h..w * h + 2 * cw * ch {
                write_u16(buf, i, 512);
            }
        }
        ImageFormat::Yuv444p10 => {
            for (i, (x, y)) in pixels.enumerate() {
                write_u16(buf, i, scale_10(luma(x, y)));
            }
            for i in w * h..w * h * 3 {
                write_u16(buf, i, 512);
            }
        }
        ImageFormat::None
        | ImageFormat::Invalid
        | ImageFormat::GpuGraph
        | ImageFormat::GlTexture => unreachable!("non-concrete formats are rejected above"),
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/format/pattern.rs"]
mod tests;
