//! RGBA to YUV 4:2:0 conversion (BT.601, studio swing).
//!
//! Captured frames are RGBA rasters while the encoders expect planar
//! yuv420p, so every written frame passes through here. The conversion is
//! kept as a pure function over byte planes to stay testable without an
//! FFmpeg runtime.

use image::RgbaImage;

/// Planar yuv420p data: full-resolution Y, quarter-resolution U and V.
pub struct YuvPlanes {
    pub y: Vec<u8>,
    pub u: Vec<u8>,
    pub v: Vec<u8>,
    pub width: usize,
    pub height: usize,
}

/// Convert an RGBA image into yuv420p planes of `out_w` x `out_h`.
///
/// The output extent may exceed the image by one row/column (encoders
/// require even dimensions); padding stays black. Chroma is averaged over
/// each 2x2 block.
pub fn rgba_to_yuv420(image: &RgbaImage, out_w: usize, out_h: usize) -> YuvPlanes {
    let img_w = image.width() as usize;
    let img_h = image.height() as usize;
    let copy_w = out_w.min(img_w);
    let copy_h = out_h.min(img_h);

    let chroma_w = out_w / 2;
    let chroma_h = out_h / 2;

    let mut y_plane = vec![16u8; out_w * out_h];
    let mut u_plane = vec![128u8; chroma_w * chroma_h];
    let mut v_plane = vec![128u8; chroma_w * chroma_h];

    let raw = image.as_raw();

    for row in 0..copy_h {
        for col in 0..copy_w {
            let i = (row * img_w + col) * 4;
            let (r, g, b) = (
                i32::from(raw[i]),
                i32::from(raw[i + 1]),
                i32::from(raw[i + 2]),
            );
            y_plane[row * out_w + col] = ((66 * r + 129 * g + 25 * b + 128) >> 8) as u8 + 16;
        }
    }

    for cy in 0..chroma_h.min(copy_h.div_ceil(2)) {
        for cx in 0..chroma_w.min(copy_w.div_ceil(2)) {
            let (mut r_sum, mut g_sum, mut b_sum) = (0i32, 0i32, 0i32);
            let mut samples = 0i32;
            for dy in 0..2 {
                for dx in 0..2 {
                    let row = cy * 2 + dy;
                    let col = cx * 2 + dx;
                    if row < copy_h && col < copy_w {
                        let i = (row * img_w + col) * 4;
                        r_sum += i32::from(raw[i]);
                        g_sum += i32::from(raw[i + 1]);
                        b_sum += i32::from(raw[i + 2]);
                        samples += 1;
                    }
                }
            }
            if samples == 0 {
                continue;
            }
            let (r, g, b) = (r_sum / samples, g_sum / samples, b_sum / samples);
            let u = ((-38 * r - 74 * g + 112 * b + 128) >> 8).clamp(-112, 112);
            let v = ((112 * r - 94 * g - 18 * b + 128) >> 8).clamp(-112, 112);
            u_plane[cy * chroma_w + cx] = (u + 128) as u8;
            v_plane[cy * chroma_w + cx] = (v + 128) as u8;
        }
    }

    YuvPlanes {
        y: y_plane,
        u: u_plane,
        v: v_plane,
        width: out_w,
        height: out_h,
    }
}

/// Copy one plane into an encoder buffer with a possibly wider line size.
/// Strides match in the common case, making this a single copy.
pub fn copy_plane(source: &[u8], width: usize, rows: usize, destination: &mut [u8]) {
    let line_size = destination.len() / rows;
    if line_size == width {
        destination[..width * rows].copy_from_slice(&source[..width * rows]);
        return;
    }
    for r in 0..rows {
        destination[r * line_size..r * line_size + width]
            .copy_from_slice(&source[r * width..(r + 1) * width]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn solid(width: u32, height: u32, rgba: [u8; 4]) -> RgbaImage {
        let mut img = RgbaImage::new(width, height);
        for pixel in img.pixels_mut() {
            *pixel = Rgba(rgba);
        }
        img
    }

    #[test]
    fn test_black_maps_to_studio_black() {
        let planes = rgba_to_yuv420(&solid(4, 4, [0, 0, 0, 255]), 4, 4);
        assert!(planes.y.iter().all(|&y| y == 16));
        assert!(planes.u.iter().all(|&u| u == 128));
        assert!(planes.v.iter().all(|&v| v == 128));
    }

    #[test]
    fn test_white_maps_to_studio_white() {
        let planes = rgba_to_yuv420(&solid(4, 4, [255, 255, 255, 255]), 4, 4);
        assert!(planes.y.iter().all(|&y| (234..=236).contains(&y)));
        assert!(planes.u.iter().all(|&u| (126..=130).contains(&u)));
        assert!(planes.v.iter().all(|&v| (126..=130).contains(&v)));
    }

    #[test]
    fn test_red_has_high_v_low_u() {
        let planes = rgba_to_yuv420(&solid(4, 4, [255, 0, 0, 255]), 4, 4);
        assert!(planes.y.iter().all(|&y| (78..=84).contains(&y)));
        assert!(planes.u.iter().all(|&u| u < 110));
        assert!(planes.v.iter().all(|&v| v > 220));
    }

    #[test]
    fn test_odd_input_pads_to_even_output() {
        // 3x3 image into a 4x4 (even-aligned) plane set
        let planes = rgba_to_yuv420(&solid(3, 3, [255, 255, 255, 255]), 4, 4);
        assert_eq!(planes.y.len(), 16);
        assert_eq!(planes.u.len(), 4);
        // padded column stays studio black
        assert_eq!(planes.y[3], 16);
        assert_eq!(planes.y[15], 16);
    }

    #[test]
    fn test_copy_plane_with_padded_stride() {
        let source = vec![7u8; 4 * 2];
        let mut dest = vec![0u8; 6 * 2]; // line size 6 for width 4
        copy_plane(&source, 4, 2, &mut dest);
        assert_eq!(&dest[0..4], &[7, 7, 7, 7]);
        assert_eq!(&dest[4..6], &[0, 0]);
        assert_eq!(&dest[6..10], &[7, 7, 7, 7]);
    }
}
