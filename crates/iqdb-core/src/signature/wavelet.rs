//! Two-dimensional Haar wavelet decomposition.
//!
//! The 1D transform is the in-place pyramid: each level replaces the first
//! `n` slots with `n/2` pair sums followed by `n/2` pair differences, both
//! divided by √2, then halves `n`. Rows are transformed before columns;
//! coefficient positions depend on that order.

use std::f64::consts::SQRT_2;

use super::{IMAGE_SIZE, NUM_PIXELS};

/// Scale applied to the DC coefficient: maximum intensity times side length.
const AVERAGE_SCALE: f64 = 256.0 * IMAGE_SIZE as f64;

fn haar_1d(line: &mut [f64; IMAGE_SIZE]) {
    let mut scratch = [0.0; IMAGE_SIZE];
    let mut n = IMAGE_SIZE;
    while n > 1 {
        let half = n / 2;
        for i in 0..half {
            let (even, odd) = (line[2 * i], line[2 * i + 1]);
            scratch[i] = (even + odd) / SQRT_2;
            scratch[half + i] = (even - odd) / SQRT_2;
        }
        line[..n].copy_from_slice(&scratch[..n]);
        n = half;
    }
}

fn haar_2d(plane: &mut [f64]) {
    let mut line = [0.0; IMAGE_SIZE];

    for row in plane.chunks_exact_mut(IMAGE_SIZE) {
        line.copy_from_slice(row);
        haar_1d(&mut line);
        row.copy_from_slice(&line);
    }

    for x in 0..IMAGE_SIZE {
        for (y, slot) in line.iter_mut().enumerate() {
            *slot = plane[x + y * IMAGE_SIZE];
        }
        haar_1d(&mut line);
        for (y, value) in line.iter().enumerate() {
            plane[x + y * IMAGE_SIZE] = *value;
        }
    }
}

/// Transform one channel plane in place and return its normalized average.
///
/// Slot 0 of the plane keeps the normalized average afterwards; callers
/// exclude it from coefficient selection.
pub(super) fn transform(plane: &mut [f64]) -> f64 {
    assert_eq!(plane.len(), NUM_PIXELS, "plane must be {IMAGE_SIZE}x{IMAGE_SIZE}");
    haar_2d(plane);
    plane[0] /= AVERAGE_SCALE;
    plane[0]
}
