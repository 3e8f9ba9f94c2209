use super::*;

#[test]
fn checkerboard_alternates_cells_in_rgb() {
    let (w, h) = (32u32, 32u32);
    let mut buf = vec![0u8; ImageFormat::Rgb.buffer_size(w, h)];
    fill_checkerboard(&mut buf, ImageFormat::Rgb, w, h, 1.0).unwrap();
    // 32 / 16 = 2 pixel cells.
    assert_eq!(&buf[0..3], &[CHECKER_LIGHT; 3]);
    assert_eq!(&buf[6..9], &[CHECKER_DARK; 3]);
    let row2 = (2 * w as usize) * 3;
    assert_eq!(&buf[row2..row2 + 3], &[CHECKER_DARK; 3]);
}

#[test]
fn checkerboard_stretches_cells_for_narrow_pixels() {
    let (w, h) = (16u32, 32u32);
    let mut buf = vec![0u8; ImageFormat::Yuv422.buffer_size(w, h)];
    fill_checkerboard(&mut buf, ImageFormat::Yuv422, w, h, 0.5).unwrap();
    // cell is 2 rows tall and 4 samples wide.
    let lumas: Vec<u8> = (0..8).map(|x| buf[x * 2]).collect();
    assert_eq!(
        lumas,
        vec![
            CHECKER_LIGHT,
            CHECKER_LIGHT,
            CHECKER_LIGHT,
            CHECKER_LIGHT,
            CHECKER_DARK,
            CHECKER_DARK,
            CHECKER_DARK,
            CHECKER_DARK
        ]
    );
    assert!(buf.iter().skip(1).step_by(2).all(|&c| c == 128));
}

#[test]
fn white_fill_honors_range() {
    let mut buf = vec![0u8; ImageFormat::Yuv420p.buffer_size(4, 4)];
    fill_white(&mut buf, ImageFormat::Yuv420p, 4, 4, false).unwrap();
    assert!(buf[..16].iter().all(|&y| y == 235));
    assert!(buf[16..].iter().all(|&c| c == 128));

    let mut rgba = vec![0u8; ImageFormat::Rgba.buffer_size(2, 2)];
    fill_white(&mut rgba, ImageFormat::Rgba, 2, 2, true).unwrap();
    assert!(rgba.iter().all(|&v| v == 255));
}

#[test]
fn high_bit_depth_planes_use_scaled_words() {
    let mut buf = vec![0u8; ImageFormat::Yuv420p10.buffer_size(2, 2)];
    fill_white(&mut buf, ImageFormat::Yuv420p10, 2, 2, true).unwrap();
    assert_eq!(u16::from_le_bytes([buf[0], buf[1]]), 1023);
    assert_eq!(u16::from_le_bytes([buf[8], buf[9]]), 512);
}

#[test]
fn rejects_gpu_formats_and_short_buffers() {
    let mut buf = vec![0u8; 4];
    assert!(fill_white(&mut buf, ImageFormat::GpuGraph, 1, 1, true).is_err());
    assert!(fill_white(&mut buf, ImageFormat::Rgb, 2, 2, true).is_err());
}

#[test]
fn color_range_names() {
    assert!(is_full_range(Some("full")));
    assert!(is_full_range(Some("jpeg")));
    assert!(!is_full_range(Some("mpeg")));
    assert!(!is_full_range(None));
}
