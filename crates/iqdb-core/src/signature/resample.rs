//! Resampling to the canonical 128×128 raster.
//!
//! Catmull-Rom cubic convolution, applied horizontally then vertically.
//! When shrinking, the kernel is stretched by the scale factor so every
//! source pixel contributes. Taps past the border clamp to the edge pixel.

use image::{DynamicImage, Rgb, RgbImage};

use super::IMAGE_SIZE;

/// Half-width of the Catmull-Rom kernel in source pixels.
const SUPPORT: f64 = 2.0;

/// One source sample contributing to one output sample.
#[derive(Debug, Clone, Copy)]
struct Tap {
    index: usize,
    weight: f64,
}

/// Catmull-Rom cubic (B = 0, C = 0.5).
fn catmull_rom(t: f64) -> f64 {
    let t = t.abs();
    if t < 1.0 {
        (1.5 * t - 2.5) * t * t + 1.0
    } else if t < SUPPORT {
        ((-0.5 * t + 2.5) * t - 4.0) * t + 2.0
    } else {
        0.0
    }
}

/// Normalized taps for every output position along one axis.
fn taps(src_len: usize, dst_len: usize) -> Vec<Vec<Tap>> {
    let scale = src_len as f64 / dst_len as f64;
    let (half_width, arg_scale) = if scale > 1.0 {
        (SUPPORT * scale, 1.0 / scale)
    } else {
        (SUPPORT, 1.0)
    };
    let last = src_len as i64 - 1;

    (0..dst_len)
        .map(|dst| {
            let center = (dst as f64 + 0.5) * scale - 0.5;
            let first = (center - half_width).floor() as i64;
            let end = (center + half_width).ceil() as i64;

            let mut row: Vec<Tap> = (first..=end)
                .filter_map(|coord| {
                    let weight = catmull_rom((center - coord as f64) * arg_scale);
                    (weight != 0.0).then(|| Tap {
                        index: coord.clamp(0, last) as usize,
                        weight,
                    })
                })
                .collect();

            let total: f64 = row.iter().map(|tap| tap.weight).sum();
            for tap in &mut row {
                tap.weight /= total;
            }
            row
        })
        .collect()
}

/// Composite `image` over black and return it as 8-bit RGB.
///
/// Alpha is premultiplied into the color samples, so a fully transparent
/// pixel becomes black.
///
/// Sources with 16-bit channels are reduced to 8 bits before premultiplying.
pub(super) fn flatten(image: &DynamicImage) -> RgbImage {
    if !image.color().has_alpha() {
        return image.to_rgb8();
    }

    let rgba = image.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let premultiply = |c: u8| ((c as u32 * a as u32 + 127) / 255) as u8;
        Rgb([premultiply(r), premultiply(g), premultiply(b)])
    })
}

/// Resample `source` to the canonical `IMAGE_SIZE × IMAGE_SIZE` raster.
pub(super) fn canonical(source: &RgbImage) -> RgbImage {
    let (src_w, src_h) = (source.width() as usize, source.height() as usize);
    let columns = taps(src_w, IMAGE_SIZE);
    let rows = taps(src_h, IMAGE_SIZE);

    // Horizontal pass: src_h rows of IMAGE_SIZE samples
    let samples = source.as_raw();
    let mut horizontal = vec![[0.0f64; 3]; IMAGE_SIZE * src_h];
    for y in 0..src_h {
        let line = &samples[y * src_w * 3..(y + 1) * src_w * 3];
        for (x, column) in columns.iter().enumerate() {
            let out = &mut horizontal[y * IMAGE_SIZE + x];
            for tap in column {
                let px = &line[tap.index * 3..tap.index * 3 + 3];
                for c in 0..3 {
                    out[c] += px[c] as f64 * tap.weight;
                }
            }
        }
    }

    // Vertical pass
    let mut canonical = RgbImage::new(IMAGE_SIZE as u32, IMAGE_SIZE as u32);
    for (y, row) in rows.iter().enumerate() {
        for x in 0..IMAGE_SIZE {
            let mut acc = [0.0f64; 3];
            for tap in row {
                let px = &horizontal[tap.index * IMAGE_SIZE + x];
                for c in 0..3 {
                    acc[c] += px[c] * tap.weight;
                }
            }
            let pixel = acc.map(|v| v.round().clamp(0.0, 255.0) as u8);
            canonical.put_pixel(x as u32, y as u32, Rgb(pixel));
        }
    }

    canonical
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayAlphaImage, LumaA};

    #[test]
    fn test_kernel_shape() {
        assert_eq!(catmull_rom(0.0), 1.0);
        assert_eq!(catmull_rom(1.0), 0.0);
        assert_eq!(catmull_rom(-1.0), 0.0);
        assert_eq!(catmull_rom(2.0), 0.0);
        assert!((catmull_rom(0.5) - 0.5625).abs() < 1e-12);
        assert!((catmull_rom(1.5) + 0.0625).abs() < 1e-12);
    }

    #[test]
    fn test_taps_are_normalized_and_in_bounds() {
        for (src, dst) in [(1, 128), (37, 128), (128, 128), (1000, 128)] {
            for row in taps(src, dst) {
                let total: f64 = row.iter().map(|t| t.weight).sum();
                assert!((total - 1.0).abs() < 1e-12);
                assert!(row.iter().all(|t| t.index < src));
            }
        }
    }

    #[test]
    fn test_same_size_is_identity() {
        let source = RgbImage::from_fn(128, 128, |x, y| {
            Rgb([(x * 2) as u8, (y * 2) as u8, ((x + y) % 256) as u8])
        });
        assert_eq!(canonical(&source), source);
    }

    #[test]
    fn test_solid_color_survives_any_scale() {
        for (w, h) in [(1, 1), (3, 500), (640, 480), (128, 64)] {
            let source = RgbImage::from_pixel(w, h, Rgb([10, 200, 30]));
            let out = canonical(&source);
            assert_eq!(out.dimensions(), (128, 128));
            assert!(out.pixels().all(|p| p.0 == [10, 200, 30]), "{w}x{h}");
        }
    }

    #[test]
    fn test_sharp_edge_overshoot_is_clamped() {
        // Catmull-Rom rings on hard edges; output must stay in range and
        // keep the edge.
        let source = RgbImage::from_fn(64, 64, |x, _| {
            if x < 32 {
                Rgb([0, 0, 0])
            } else {
                Rgb([255, 255, 255])
            }
        });
        let out = canonical(&source);
        assert_eq!(out.get_pixel(0, 0).0, [0, 0, 0]);
        assert_eq!(out.get_pixel(127, 127).0, [255, 255, 255]);
    }

    #[test]
    fn test_flatten_premultiplies_alpha() {
        let image = DynamicImage::ImageLumaA8(GrayAlphaImage::from_fn(2, 1, |x, _| {
            if x == 0 {
                LumaA([200, 255])
            } else {
                LumaA([200, 128])
            }
        }));
        let flat = flatten(&image);
        assert_eq!(flat.get_pixel(0, 0).0, [200, 200, 200]);
        assert_eq!(flat.get_pixel(1, 0).0, [100, 100, 100]);
    }

    #[test]
    fn test_flatten_reduces_16_bit_before_premultiplying() {
        use image::{ImageBuffer, Rgba};

        let wide: ImageBuffer<Rgba<u16>, Vec<u16>> =
            ImageBuffer::from_pixel(1, 1, Rgba([200 * 257, 100 * 257, 0, 128 * 257]));
        let flat = flatten(&DynamicImage::ImageRgba16(wide));
        assert_eq!(flat.get_pixel(0, 0).0, [100, 50, 0]);
    }
}
