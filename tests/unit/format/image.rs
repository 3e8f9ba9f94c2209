use super::*;

#[test]
fn codes_are_stable_and_reversible() {
    for f in [
        ImageFormat::None,
        ImageFormat::Rgb,
        ImageFormat::Rgba,
        ImageFormat::Yuv422,
        ImageFormat::Yuv420p,
        ImageFormat::GpuGraph,
        ImageFormat::GlTexture,
        ImageFormat::Yuv422p16,
        ImageFormat::Yuv420p10,
        ImageFormat::Yuv444p10,
        ImageFormat::Invalid,
    ] {
        assert_eq!(ImageFormat::from_code(f.code()), f);
    }
    assert_eq!(ImageFormat::from_code(99), ImageFormat::Invalid);
}

#[test]
fn sizes_match_layouts() {
    assert_eq!(ImageFormat::Rgb.buffer_size(720, 576), 720 * 576 * 3);
    assert_eq!(ImageFormat::Rgba.buffer_size(4, 2), 32);
    assert_eq!(ImageFormat::Yuv422.buffer_size(720, 576), 720 * 576 * 2);
    assert_eq!(ImageFormat::Yuv420p.buffer_size(4, 4), 16 + 8);
    assert_eq!(ImageFormat::Yuv420p10.buffer_size(4, 4), 48);
    assert_eq!(ImageFormat::Yuv422p16.buffer_size(4, 4), 64);
    assert_eq!(ImageFormat::Yuv444p10.buffer_size(2, 2), 24);
    assert_eq!(ImageFormat::None.buffer_size(720, 576), 0);
}

#[test]
fn odd_chroma_planes_round_up() {
    assert_eq!(ImageFormat::Yuv420p.buffer_size(3, 3), 9 + 2 * 4);
}

#[test]
fn only_rgba_carries_inline_alpha() {
    assert!(ImageFormat::Rgba.has_inline_alpha());
    assert!(!ImageFormat::Rgb.has_inline_alpha());
    assert!(!ImageFormat::Yuv422.has_inline_alpha());
}

#[test]
fn gpu_formats_are_not_concrete() {
    assert!(ImageFormat::GpuGraph.is_gpu_resident());
    assert!(!ImageFormat::GlTexture.is_concrete());
    assert!(!ImageFormat::None.is_concrete());
    assert!(ImageFormat::Yuv420p.is_concrete());
}
