// Copyright 2025 the Subcompose Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rasterization and pixel-buffer manipulation — an external collaborator
//! per spec §1 ("the rasterizer... and any SIMD-specific blit routines"),
//! modeled as a capability-set trait so a scalar fallback can stand in for
//! the SSE2/AVX2 dispatch the design notes describe.

use crate::outline::Polyline;

/// A tile ordering hint `BlitEngine` implementations may prefer for cache
/// locality (spec §9 design notes: "tile order" affects how `fix_collisions`
/// and composition walk a bitmap's rows).
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub enum TileOrder {
    #[default]
    RowMajor,
    /// Blocks of `be_padding()` rows, for blur-edge passes that read a
    /// fixed vertical window at a time.
    Banded,
}

/// External collaborator: rasterizes outlines to 8-bit alpha coverage and
/// performs the pixel-buffer operations composition needs (spec §4.3/§4.6).
/// A production embedding dispatches these to SSE2/AVX2; [`ScalarBlitEngine`]
/// is the portable fallback and reference semantics.
pub trait BlitEngine {
    /// Rasterizes `outline` (already transformed into device space) into a
    /// fresh `width x height` 8-bit alpha buffer using the nonzero winding
    /// rule for fill and, if non-empty, xor-combined with the outline's own
    /// stroke when the caller passes a stroke-filled polyline.
    fn rasterize(&self, outline: &Polyline, width: i32, height: i32) -> Vec<u8>;

    /// Copies `src` into `dst` at `(dx, dy)`, clipping to `dst`'s bounds.
    fn copy_bitmap(&self, dst: &mut [u8], dst_stride: i32, dst_h: i32, src: &[u8], src_w: i32, src_h: i32, dx: i32, dy: i32);

    /// Additively blends `src` onto `dst` (saturating), at `(dx, dy)`.
    fn add_bitmaps(&self, dst: &mut [u8], dst_stride: i32, dst_h: i32, src: &[u8], src_w: i32, src_h: i32, dx: i32, dy: i32);

    /// Applies the separable box-blur approximation to a Gaussian
    /// (spec §4.6.3 "BE" passes) in place, `passes` times.
    fn synth_blur(&self, buf: &mut [u8], width: i32, height: i32, radius: i32, passes: u8);

    /// Allocates a zeroed `width * height` buffer, padded per [`Self::be_padding`].
    fn alloc_bitmap(&self, width: i32, height: i32) -> Vec<u8> {
        let pad = self.be_padding();
        vec![0u8; ((width + 2 * pad) * (height + 2 * pad)).max(0) as usize]
    }

    /// Preferred tile/row ordering for multi-row operations.
    fn tile_order(&self) -> TileOrder {
        TileOrder::RowMajor
    }

    /// Extra border (in pixels) a blur pass of this engine reads/writes
    /// around the nominal bitmap dimensions, so callers size allocations
    /// to avoid an edge-clamp special case.
    fn be_padding(&self) -> i32 {
        0
    }
}

/// Portable, allocation-straightforward `BlitEngine`: scanline
/// nonzero-winding fill, saturating-add compositing, and a repeated
/// 3-pass box blur standing in for [`crate::blur`]'s Gaussian target.
#[derive(Debug, Default)]
pub struct ScalarBlitEngine;

impl BlitEngine for ScalarBlitEngine {
    fn rasterize(&self, outline: &Polyline, width: i32, height: i32) -> Vec<u8> {
        scanline_fill(outline, width, height)
    }

    fn copy_bitmap(&self, dst: &mut [u8], dst_stride: i32, dst_h: i32, src: &[u8], src_w: i32, src_h: i32, dx: i32, dy: i32) {
        blit(dst, dst_stride, dst_h, src, src_w, src_h, dx, dy, |d, s| *d = s);
    }

    fn add_bitmaps(&self, dst: &mut [u8], dst_stride: i32, dst_h: i32, src: &[u8], src_w: i32, src_h: i32, dx: i32, dy: i32) {
        blit(dst, dst_stride, dst_h, src, src_w, src_h, dx, dy, |d, s| {
            *d = d.saturating_add(s);
        });
    }

    fn synth_blur(&self, buf: &mut [u8], width: i32, height: i32, radius: i32, passes: u8) {
        for _ in 0..passes {
            box_blur_pass(buf, width, height, radius);
        }
    }
}

fn blit(
    dst: &mut [u8],
    dst_stride: i32,
    dst_h: i32,
    src: &[u8],
    src_w: i32,
    src_h: i32,
    dx: i32,
    dy: i32,
    mut combine: impl FnMut(&mut u8, u8),
) {
    for sy in 0..src_h {
        let ty = dy + sy;
        if ty < 0 || ty >= dst_h {
            continue;
        }
        for sx in 0..src_w {
            let tx = dx + sx;
            if tx < 0 || tx >= dst_stride {
                continue;
            }
            let s = src[(sy * src_w + sx) as usize];
            let d = &mut dst[(ty * dst_stride + tx) as usize];
            combine(d, s);
        }
    }
}

/// Nonzero-winding scanline fill. `outline` is in device pixel space,
/// already clipped to fit `(width, height)` by the caller.
fn scanline_fill(outline: &Polyline, width: i32, height: i32) -> Vec<u8> {
    let mut out = vec![0u8; (width.max(0) * height.max(0)) as usize];
    if width <= 0 || height <= 0 {
        return out;
    }
    let edges = contour_edges(outline);
    if edges.is_empty() {
        return out;
    }
    for y in 0..height {
        let sy = y as f32 + 0.5;
        let mut crossings: Vec<(f32, i32)> = edges
            .iter()
            .filter_map(|e| e.crossing_x(sy))
            .collect();
        crossings.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());
        let mut winding = 0i32;
        let mut i = 0;
        while i < crossings.len() {
            let (x, dir) = crossings[i];
            let prev_winding = winding;
            winding += dir;
            if prev_winding == 0 && winding != 0 {
                // entering a filled span; find where it ends
                let start_x = x;
                let mut j = i + 1;
                let mut w = winding;
                let end_x;
                loop {
                    if j >= crossings.len() {
                        end_x = width as f32;
                        break;
                    }
                    w += crossings[j].1;
                    if w == 0 {
                        end_x = crossings[j].0;
                        break;
                    }
                    j += 1;
                }
                let x0 = start_x.max(0.0).round() as i32;
                let x1 = end_x.min(width as f32).round() as i32;
                for px in x0.max(0)..x1.min(width) {
                    out[(y * width + px) as usize] = 255;
                }
                winding = w;
                i = j + 1;
                continue;
            }
            i += 1;
        }
    }
    out
}

struct Edge {
    x0: f32,
    y0: f32,
    x1: f32,
    y1: f32,
}

impl Edge {
    fn crossing_x(&self, sy: f32) -> Option<(f32, i32)> {
        let (y0, y1) = (self.y0, self.y1);
        if (y0 <= sy && y1 > sy) || (y1 <= sy && y0 > sy) {
            let t = (sy - y0) / (y1 - y0);
            let x = self.x0 + t * (self.x1 - self.x0);
            let dir = if y1 > y0 { 1 } else { -1 };
            Some((x, dir))
        } else {
            None
        }
    }
}

/// Flattens a `Polyline`'s quad/cubic segments into line edges for the
/// scanline filler. Coarse (8 steps per curve) since sub-pixel accuracy at
/// this stage is bounded by the 8-bit alpha output anyway.
fn contour_edges(outline: &Polyline) -> Vec<Edge> {
    use crate::outline::SegmentTag;
    let mut edges = Vec::new();
    let mut cursor = glam::Vec2::ZERO;
    let mut start = glam::Vec2::ZERO;
    let mut idx = 0;
    for &tag in &outline.tags {
        match tag {
            SegmentTag::MoveTo => {
                cursor = outline.points[idx];
                start = cursor;
                idx += 1;
            }
            SegmentTag::LineTo => {
                let p = outline.points[idx];
                edges.push(Edge { x0: cursor.x, y0: cursor.y, x1: p.x, y1: p.y });
                cursor = p;
                idx += 1;
            }
            SegmentTag::QuadTo => {
                let p = outline.points[idx];
                flatten_quad(cursor, p, &mut edges);
                cursor = p;
                idx += 1;
            }
            SegmentTag::CubicTo => {
                let c1 = outline.points[idx];
                let c2 = outline.points[idx + 1];
                let end = outline.points[idx + 2];
                flatten_cubic(cursor, c1, c2, end, &mut edges);
                cursor = end;
                idx += 3;
            }
            SegmentTag::Close => {
                edges.push(Edge { x0: cursor.x, y0: cursor.y, x1: start.x, y1: start.y });
                cursor = start;
            }
        }
    }
    edges
}

fn flatten_quad(p0: glam::Vec2, p1: glam::Vec2, edges: &mut Vec<Edge>) {
    const STEPS: i32 = 8;
    let mut prev = p0;
    for i in 1..=STEPS {
        let t = i as f32 / STEPS as f32;
        let a = p0.lerp(p1, t);
        edges.push(Edge { x0: prev.x, y0: prev.y, x1: a.x, y1: a.y });
        prev = a;
    }
}

fn flatten_cubic(p0: glam::Vec2, c1: glam::Vec2, c2: glam::Vec2, p1: glam::Vec2, edges: &mut Vec<Edge>) {
    const STEPS: i32 = 12;
    let mut prev = p0;
    for i in 1..=STEPS {
        let t = i as f32 / STEPS as f32;
        let mt = 1.0 - t;
        let a = p0 * (mt * mt * mt) + c1 * (3.0 * mt * mt * t) + c2 * (3.0 * mt * t * t) + p1 * (t * t * t);
        edges.push(Edge { x0: prev.x, y0: prev.y, x1: a.x, y1: a.y });
        prev = a;
    }
}

fn box_blur_pass(buf: &mut [u8], width: i32, height: i32, radius: i32) {
    if radius <= 0 || width <= 0 || height <= 0 {
        return;
    }
    let mut tmp = vec![0u32; (width * height) as usize];
    // horizontal pass
    for y in 0..height {
        let row = (y * width) as usize;
        for x in 0..width {
            let mut sum = 0u32;
            let mut n = 0u32;
            for k in -radius..=radius {
                let sx = x + k;
                if sx >= 0 && sx < width {
                    sum += buf[row + sx as usize] as u32;
                    n += 1;
                }
            }
            tmp[row + x as usize] = sum / n.max(1);
        }
    }
    // vertical pass, writing back into buf
    for x in 0..width {
        for y in 0..height {
            let mut sum = 0u32;
            let mut n = 0u32;
            for k in -radius..=radius {
                let sy = y + k;
                if sy >= 0 && sy < height {
                    sum += tmp[(sy * width + x) as usize];
                    n += 1;
                }
            }
            buf[(y * width + x) as usize] = (sum / n.max(1)) as u8;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outline::SegmentTag;

    fn unit_square() -> Polyline {
        Polyline {
            points: vec![
                glam::Vec2::new(0.0, 0.0),
                glam::Vec2::new(10.0, 0.0),
                glam::Vec2::new(10.0, 10.0),
                glam::Vec2::new(0.0, 10.0),
            ],
            tags: vec![SegmentTag::MoveTo, SegmentTag::LineTo, SegmentTag::LineTo, SegmentTag::Close],
        }
    }

    #[test]
    fn fills_interior_and_leaves_exterior_clear() {
        let eng = ScalarBlitEngine;
        let buf = eng.rasterize(&unit_square(), 12, 12);
        assert_eq!(buf[5 * 12 + 5], 255);
        assert_eq!(buf[0], 0);
    }

    #[test]
    fn add_bitmaps_saturates() {
        let eng = ScalarBlitEngine;
        let mut dst = vec![200u8; 4];
        let src = vec![200u8; 4];
        eng.add_bitmaps(&mut dst, 2, 2, &src, 2, 2, 0, 0);
        assert_eq!(dst, vec![255, 255, 255, 255]);
    }

    #[test]
    fn copy_bitmap_clips_to_dest() {
        let eng = ScalarBlitEngine;
        let mut dst = vec![0u8; 4]; // 2x2
        let src = vec![9u8; 4]; // 2x2
        eng.copy_bitmap(&mut dst, 2, 2, &src, 2, 2, 1, 1);
        assert_eq!(dst[3], 9);
        assert_eq!(dst[0], 0);
    }

    #[test]
    fn blur_spreads_a_single_pixel() {
        let eng = ScalarBlitEngine;
        let mut buf = vec![0u8; 25];
        buf[12] = 255; // center of 5x5
        eng.synth_blur(&mut buf, 5, 5, 1, 1);
        assert!(buf[12] < 255);
        assert!(buf[7] > 0);
    }
}
