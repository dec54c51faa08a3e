// Copyright 2025 the Subcompose Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Blur quantization (spec §4.6.3): converts the continuous `\blur`
//! (Gaussian) and `\be` (blur-edge) tag values into the integer
//! `(radius, passes)` pair a [`crate::raster::BlitEngine`] actually runs,
//! and the padding such a pass needs around its source bitmap.

/// `\blur` maps to a true Gaussian blur, approximated by three box-blur
/// passes (the standard IIR/box-blur Gaussian approximation) whose radius
/// is derived from the requested standard deviation.
const GAUSSIAN_PASSES: u8 = 3;

/// Quantizes a `\blur` standard deviation (in pixels) to the
/// `(radius, passes)` a box-blur approximation runs. Clamped to avoid a
/// pathologically large radius turning one bitmap into a frame-sized blur.
#[must_use]
pub fn quantize_gaussian_blur(sigma: f32) -> Option<(i32, u8)> {
    if sigma <= 0.0 {
        return None;
    }
    // radius of a single box pass approximating a Gaussian of std-dev
    // `sigma` over `GAUSSIAN_PASSES` passes (standard box-blur identity).
    let ideal = (sigma * (12.0 / GAUSSIAN_PASSES as f32 + 1.0).sqrt()).round();
    let radius = (ideal as i32 / 2).clamp(1, 64);
    Some((radius, GAUSSIAN_PASSES))
}

/// `\be` (blur-edge) quantization: `n` repeated single-pixel box passes,
/// cheaper and coarser than `\blur`, applied directly to border/shadow
/// edges rather than the whole composited bitmap.
#[must_use]
pub fn quantize_edge_blur(be: i32) -> Option<(i32, u8)> {
    if be <= 0 {
        return None;
    }
    Some((1, be.clamp(1, 16) as u8))
}

/// Padding (in pixels) a bitmap needs around its nominal bbox to absorb a
/// blur of the given `(radius, passes)` without edge-clamping artifacts.
#[must_use]
pub fn blur_padding(radius: i32, passes: u8) -> i32 {
    radius * passes as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_or_negative_sigma_disables_blur() {
        assert!(quantize_gaussian_blur(0.0).is_none());
        assert!(quantize_gaussian_blur(-1.0).is_none());
    }

    #[test]
    fn larger_sigma_yields_larger_radius() {
        let (r1, _) = quantize_gaussian_blur(1.0).unwrap();
        let (r2, _) = quantize_gaussian_blur(4.0).unwrap();
        assert!(r2 > r1);
    }

    #[test]
    fn edge_blur_clamped_to_range() {
        let (_, passes) = quantize_edge_blur(1000).unwrap();
        assert_eq!(passes, 16);
        assert!(quantize_edge_blur(0).is_none());
    }

    #[test]
    fn padding_scales_with_radius_and_passes() {
        assert_eq!(blur_padding(2, 3), 6);
    }
}
