//! RGB to YIQ conversion.

use image::RgbImage;

use super::{NUM_CHANNELS, NUM_PIXELS};

/// Convert the canonical raster into Y, I and Q planes in row-major order.
///
/// The I and Q rows are not the textbook YIQ matrix; stored signatures
/// depend on these exact constants.
pub(super) fn rgb_to_yiq(raster: &RgbImage) -> [Vec<f64>; NUM_CHANNELS] {
    debug_assert_eq!(raster.len(), NUM_PIXELS * 3);

    let mut y = Vec::with_capacity(NUM_PIXELS);
    let mut i = Vec::with_capacity(NUM_PIXELS);
    let mut q = Vec::with_capacity(NUM_PIXELS);

    for pixel in raster.pixels() {
        let [r, g, b] = pixel.0.map(f64::from);
        y.push(0.299 * r + 0.587 * g + 0.114 * b);
        i.push(0.596 * r - 0.275 * g - 0.321 * b);
        q.push(0.212 * r - 0.523 * g + 0.311 * b);
    }

    [y, i, q]
}
