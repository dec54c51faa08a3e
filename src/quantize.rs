// Copyright 2025 the Subcompose Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Transform quantization (C2, spec §4.2): maps a continuous 3x3
//! affine/perspective matrix onto a discrete, hashable
//! [`QuantizedTransform`] with bounded positional error.
//!
//! The matrix acts on homogeneous `(x, y, 1)` input coordinates in pixels
//! and produces homogeneous `(X, Y, Z)` output; screen position is
//! `(X/Z, Y/Z)`. Quantization proceeds by:
//! 1. recentring the matrix so its input origin is the outline cbox centre,
//! 2. quantizing the recentred output centre to an integer pixel position
//!    plus a [`SUBPIXEL_ORDER`]-bit sub-pixel offset,
//! 3. quantizing the recentred Jacobian (the matrix's three output rows,
//!    each a pair of partial derivatives w.r.t. local input x/y) to integer
//!    steps sized so the maximum positional error across the cbox is
//!    bounded by [`POSITION_PRECISION`].
//!
//! [`restore_transform`] is the exact inverse, reconstructing an equivalent
//! matrix (acting on *original*, not recentred, coordinates) from only the
//! stored integers and the cbox — no access to the original continuous
//! matrix is needed, which is what lets two bitmaps built from the same
//! `BitmapHashKey` but different cache lifetimes agree.

use crate::geometry::BBox;
use glam::{Mat3, Vec3};

/// Target positional error, in pixels*64 (1/64-pixel units).
pub const POSITION_PRECISION: f32 = 8.0;
/// Number of sub-pixel bits kept in the quantized centre position.
pub const SUBPIXEL_ORDER: u32 = 3;
/// Clamp divisor keeping `z0` from blowing up near the perspective horizon.
pub const MAX_PERSP_SCALE: f32 = 16.0;
/// Outline coefficients beyond this magnitude abort quantization (spec §5).
pub const COEFF_LIMIT: f32 = 1.0e6;

const SUBPIXEL_STEPS: i32 = 1 << SUBPIXEL_ORDER; // 8
const Z_SCALE: f32 = 256.0;

/// A quantized transform: hashable, and exactly reconstructible via
/// [`restore_transform`].
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct QuantizedTransform {
    /// Integer pixel position of the recentred output centre.
    pub position: (i32, i32),
    /// Sub-pixel offset, each component in `0..SUBPIXEL_STEPS`.
    pub offset: (u8, u8),
    /// Quantized output-z at the centre (fixed point, scale [`Z_SCALE`]).
    pub z_base: i32,
    /// Quantized Jacobian row producing output X: `(d X/d x, d X/d y)`.
    pub matrix_x: (i32, i32),
    /// Quantized Jacobian row producing output Y.
    pub matrix_y: (i32, i32),
    /// Quantized Jacobian row producing output Z (the perspective row).
    pub matrix_z: (i32, i32),
}

/// The sub-pixel offset bits chosen for one cluster's fill quantization,
/// to be threaded into the border quantization call so fill and border
/// bitmaps hash to positionally-compatible keys (spec §4.2 "first").
#[derive(Copy, Clone, Debug)]
pub struct QuantizationResidual {
    pub offset: (u8, u8),
}

fn corners(cbox: BBox) -> [Vec3; 4] {
    let (x0, y0, x1, y1) = (
        cbox.x0 as f32 / 64.0,
        cbox.y0 as f32 / 64.0,
        cbox.x1 as f32 / 64.0,
        cbox.y1 as f32 / 64.0,
    );
    [
        Vec3::new(x0, y0, 1.0),
        Vec3::new(x1, y0, 1.0),
        Vec3::new(x1, y1, 1.0),
        Vec3::new(x0, y1, 1.0),
    ]
}

/// Quantizes `m` (acting on pixel coordinates) for an outline with bounding
/// box `cbox` (in 26.6 units). Returns `None` if `m` is ill-conditioned
/// (spec §4.2 rejection rules: `m[2][2] <= 0`, or any coefficient exceeds
/// [`COEFF_LIMIT`]).
///
/// `residual`, when `Some`, forces the sub-pixel offset to the given value
/// instead of recomputing it from `m` — pass the `offset` returned for a
/// cluster's fill quantization into its border quantization call.
#[must_use]
pub fn quantize_transform(
    m: Mat3,
    cbox: BBox,
    residual: Option<QuantizationResidual>,
) -> Option<(QuantizedTransform, QuantizationResidual)> {
    let arr = m.to_cols_array();
    if arr.iter().any(|v| !v.is_finite() || v.abs() > COEFF_LIMIT) {
        return None;
    }
    // `m[2][2]` in row/col notation is `m.z_axis.z` for a glam column-major Mat3.
    let m22 = m.z_axis.z;
    if m22 <= 0.0 {
        return None;
    }

    if cbox.is_empty() {
        return None;
    }

    let center = cbox.center() / 64.0; // pixels
    // Row vectors of M (glam stores columns, so build rows explicitly).
    let row_x = Vec3::new(m.x_axis.x, m.y_axis.x, m.z_axis.x);
    let row_y = Vec3::new(m.x_axis.y, m.y_axis.y, m.z_axis.y);
    let row_z = Vec3::new(m.x_axis.z, m.y_axis.z, m.z_axis.z);

    // Output at the centre (original, non-recentred evaluation).
    let center_h = Vec3::new(center.x, center.y, 1.0);
    let out_x = row_x.dot(center_h);
    let out_y = row_y.dot(center_h);
    let out_z = row_z.dot(center_h);
    if out_z <= 0.0 {
        return None;
    }
    let screen_cx = out_x / out_z;
    let screen_cy = out_y / out_z;

    // z0: minimum projected z over the cbox corners, clamped below.
    let z_clamp = m22 / MAX_PERSP_SCALE;
    let z0 = corners(cbox)
        .iter()
        .map(|c| row_z.dot(*c))
        .fold(f32::INFINITY, f32::min)
        .max(z_clamp);

    let half_w = cbox.width() as f32 / 128.0; // pixels
    let half_h = cbox.height() as f32 / 128.0;
    let d_x = half_w + 1.0; // "+64" 26.6 units == 1 pixel
    let d_y = half_h + 1.0;

    let q_x = POSITION_PRECISION / 64.0 * z0 / d_x;
    let q_y = POSITION_PRECISION / 64.0 * z0 / d_y;
    if q_x <= 0.0 || q_y <= 0.0 {
        return None;
    }

    // Quantize centre position + sub-pixel offset.
    let (position, offset) = if let Some(r) = residual {
        let px = (screen_cx - r.offset.0 as f32 / SUBPIXEL_STEPS as f32).round() as i32;
        let py = (screen_cy - r.offset.1 as f32 / SUBPIXEL_STEPS as f32).round() as i32;
        ((px, py), r.offset)
    } else {
        quantize_center(screen_cx, screen_cy)
    };

    // Jacobian rows relative to the recentred local input (x - cx, y - cy);
    // since M is affine in (x, y), the Jacobian doesn't depend on where we
    // recentre, so these are just M's own coefficients.
    let dx_dx = row_x.x;
    let dx_dy = row_x.y;
    let dy_dx = row_y.x;
    let dy_dy = row_y.y;
    let dz_dx = row_z.x;
    let dz_dy = row_z.y;

    let matrix_x = (
        (dx_dx / q_x).round() as i32,
        (dx_dy / q_x).round() as i32,
    );
    let matrix_y = (
        (dy_dx / q_y).round() as i32,
        (dy_dy / q_y).round() as i32,
    );

    let w = POSITION_PRECISION
        * (dx_dx.abs() + dx_dy.abs()).max(dy_dx.abs() + dy_dy.abs())
        + 1e-6;
    let q = (q_x + q_y) * 0.5;
    let q_z = q / w;
    let matrix_z = (
        (dz_dx / q_z).round() as i32,
        (dz_dy / q_z).round() as i32,
    );

    let quantized = QuantizedTransform {
        position,
        offset,
        z_base: (out_z * Z_SCALE).round() as i32,
        matrix_x,
        matrix_y,
        matrix_z,
    };
    Some((quantized, QuantizationResidual { offset }))
}

fn quantize_center(cx: f32, cy: f32) -> ((i32, i32), (u8, u8)) {
    let quant = |v: f32| -> (i32, u8) {
        let steps = (v * SUBPIXEL_STEPS as f32).round() as i32;
        let pixel = steps.div_euclid(SUBPIXEL_STEPS);
        let sub = steps.rem_euclid(SUBPIXEL_STEPS) as u8;
        (pixel, sub)
    };
    let (px, ox) = quant(cx);
    let (py, oy) = quant(cy);
    ((px, py), (ox, oy))
}

/// Reconstructs the local transform used to rasterize a bitmap: like
/// [`restore_transform`], but with the integer pixel `position` treated as
/// zero so only the sub-pixel `offset` contributes translation. The
/// integer position is instead applied as a blit offset when compositing
/// (spec §4.4: bitmaps are cached independent of integer pixel placement).
#[must_use]
pub fn restore_local_transform(q: &QuantizedTransform, cbox: BBox) -> Mat3 {
    let local = QuantizedTransform { position: (0, 0), ..*q };
    restore_transform(&local, cbox)
}

/// Reconstructs a matrix equivalent to (within quantization error) the one
/// originally passed to [`quantize_transform`], acting on *original*
/// (non-recentred) pixel coordinates.
#[must_use]
pub fn restore_transform(q: &QuantizedTransform, cbox: BBox) -> Mat3 {
    let center = cbox.center() / 64.0;
    let out_z = q.z_base as f32 / Z_SCALE;

    let half_w = cbox.width() as f32 / 128.0;
    let half_h = cbox.height() as f32 / 128.0;
    let d_x = half_w + 1.0;
    let d_y = half_h + 1.0;
    let z0 = out_z.max(1e-3);
    let q_x = POSITION_PRECISION / 64.0 * z0 / d_x;
    let q_y = POSITION_PRECISION / 64.0 * z0 / d_y;

    let screen_cx = q.position.0 as f32 + q.offset.0 as f32 / SUBPIXEL_STEPS as f32;
    let screen_cy = q.position.1 as f32 + q.offset.1 as f32 / SUBPIXEL_STEPS as f32;

    let dx_dx = q.matrix_x.0 as f32 * q_x;
    let dx_dy = q.matrix_x.1 as f32 * q_x;
    let dy_dx = q.matrix_y.0 as f32 * q_y;
    let dy_dy = q.matrix_y.1 as f32 * q_y;

    let w = POSITION_PRECISION * (dx_dx.abs() + dx_dy.abs()).max(dy_dx.abs() + dy_dy.abs()) + 1e-6;
    let qc = (q_x + q_y) * 0.5;
    let q_z = qc / w;
    let dz_dx = q.matrix_z.0 as f32 * q_z;
    let dz_dy = q.matrix_z.1 as f32 * q_z;

    // Row form acting on local coords (x - cx, y - cy, 1):
    //   out_x_local = dx_dx*(x-cx) + dx_dy*(y-cy) + screen_cx*out_z
    //   out_y_local = dy_dx*(x-cx) + dy_dy*(y-cy) + screen_cy*out_z
    //   out_z_local = dz_dx*(x-cx) + dz_dy*(y-cy) + out_z
    // Composing with the recentring translation gives rows acting on (x,y,1):
    let row_x = Vec3::new(
        dx_dx,
        dx_dy,
        screen_cx * out_z - dx_dx * center.x - dx_dy * center.y,
    );
    let row_y = Vec3::new(
        dy_dx,
        dy_dy,
        screen_cy * out_z - dy_dx * center.x - dy_dy * center.y,
    );
    let row_z = Vec3::new(dz_dx, dz_dy, out_z - dz_dx * center.x - dz_dy * center.y);

    Mat3::from_cols(
        Vec3::new(row_x.x, row_y.x, row_z.x),
        Vec3::new(row_x.y, row_y.y, row_z.y),
        Vec3::new(row_x.z, row_y.z, row_z.z),
    )
}

/// Applies a matrix to a 2D point, returning `None` if `w` is degenerate.
#[must_use]
pub fn project(m: Mat3, x: f32, y: f32) -> Option<(f32, f32)> {
    let v = m * Vec3::new(x, y, 1.0);
    if v.z.abs() < 1e-6 {
        return None;
    }
    Some((v.x / v.z, v.y / v.z))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity_cbox() -> BBox {
        BBox { x0: 0, y0: 0, x1: 64 * 20, y1: 64 * 20 }
    }

    #[test]
    fn identity_matrix_round_trips() {
        let m = Mat3::IDENTITY;
        let cbox = identity_cbox();
        let (q, _) = quantize_transform(m, cbox, None).expect("valid");
        let m2 = restore_transform(&q, cbox);
        for (x, y) in [(0.0, 0.0), (20.0, 0.0), (0.0, 20.0), (20.0, 20.0)] {
            let (ox, oy) = project(m, x, y).unwrap();
            let (rx, ry) = project(m2, x, y).unwrap();
            assert!((ox - rx).abs() < 2.0 * (POSITION_PRECISION / 64.0) + 0.05, "{ox} vs {rx}");
            assert!((oy - ry).abs() < 2.0 * (POSITION_PRECISION / 64.0) + 0.05, "{oy} vs {ry}");
        }
    }

    #[test]
    fn rejects_non_positive_m22() {
        let mut m = Mat3::IDENTITY;
        m.z_axis.z = 0.0;
        assert!(quantize_transform(m, identity_cbox(), None).is_none());
    }

    #[test]
    fn rejects_overflowing_coefficients() {
        let mut m = Mat3::IDENTITY;
        m.x_axis.x = 2.0e6;
        assert!(quantize_transform(m, identity_cbox(), None).is_none());
    }

    #[test]
    fn nearby_centers_share_a_key_within_one_step() {
        let cbox = identity_cbox();
        let m1 = Mat3::from_translation(glam::Vec2::new(10.0, 10.0));
        // Shift by less than one sub-pixel step (1/8 px).
        let m2 = Mat3::from_translation(glam::Vec2::new(10.01, 10.0));
        let (q1, _) = quantize_transform(m1, cbox, None).unwrap();
        let (q2, _) = quantize_transform(m2, cbox, None).unwrap();
        assert_eq!(q1.position, q2.position);
        assert_eq!(q1.offset, q2.offset);
    }

    #[test]
    fn residual_forces_identical_offset() {
        let cbox_fill = identity_cbox();
        let cbox_border = BBox { x0: -64, y0: -64, x1: 64 * 21, y1: 64 * 21 };
        let m = Mat3::from_translation(glam::Vec2::new(10.3, 10.7));
        let (q_fill, residual) = quantize_transform(m, cbox_fill, None).unwrap();
        let (q_border, _) = quantize_transform(m, cbox_border, Some(residual)).unwrap();
        assert_eq!(q_fill.offset, q_border.offset);
    }
}
