//! Selection of the most significant wavelet coefficients.

use super::{NUM_COEFS, NUM_PIXELS};

/// Pick the `NUM_COEFS` positions with the largest magnitude and return
/// them as signed flat indices, sorted ascending by signed value.
///
/// Selection is a partial selection sort over positions `1..NUM_PIXELS`.
/// Each pass scans the remaining candidates and only replaces the current
/// best on a strictly greater magnitude, then swaps the winner to the front.
/// Because of that swap, ties at the cut-off are resolved by the order of
/// the working array rather than by position alone. Stored signatures
/// depend on this exact order, so it must not be replaced by a heap or a
/// sort with a different tie-break.
pub(super) fn largest_coefficients(plane: &[f64]) -> [i16; NUM_COEFS] {
    debug_assert_eq!(plane.len(), NUM_PIXELS);

    let mut candidates: Vec<(i16, f64)> = (1..NUM_PIXELS)
        .map(|index| (index as i16, plane[index].abs()))
        .collect();

    let mut selected = [0i16; NUM_COEFS];
    for (slot, out) in selected.iter_mut().enumerate() {
        let mut largest = slot;
        for j in slot + 1..candidates.len() {
            if candidates[j].1 > candidates[largest].1 {
                largest = j;
            }
        }
        candidates.swap(slot, largest);

        let index = candidates[slot].0;
        *out = if plane[index as usize] < 0.0 {
            -index
        } else {
            index
        };
    }

    selected.sort_unstable();
    selected
}
