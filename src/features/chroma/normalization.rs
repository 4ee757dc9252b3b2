//! Chroma normalization strategies

/// Values at or below this are treated as silence
const EPSILON: f32 = 1e-10;

/// Scale a chroma vector so its largest element is 1.0 (max / L-inf norm)
///
/// A vector whose maximum is zero (or not positive) is left unchanged, so
/// silence stays an all-zero vector.
///
/// # Example
///
/// ```
/// use chordsync::features::chroma::normalization::normalize_max;
///
/// let mut chroma = [0.0f32; 12];
/// chroma[0] = 2.0;
/// chroma[7] = 1.0;
/// normalize_max(&mut chroma);
/// assert_eq!(chroma[0], 1.0);
/// assert_eq!(chroma[7], 0.5);
/// ```
pub fn normalize_max(chroma: &mut [f32; 12]) {
    let max = chroma.iter().cloned().fold(0.0f32, f32::max);
    if max > 0.0 {
        for x in chroma.iter_mut() {
            *x /= max;
        }
    }
}

/// Like [`normalize_max`], but zeroes vectors whose peak is below `EPSILON`
///
/// Used on per-frame chroma so floating-point dust in near-silent frames
/// does not get blown up to full scale.
pub fn normalize_max_gated(chroma: &mut [f32; 12]) {
    let max = chroma.iter().cloned().fold(0.0f32, f32::max);
    if max <= EPSILON {
        *chroma = [0.0; 12];
        return;
    }
    for x in chroma.iter_mut() {
        *x /= max;
    }
}
