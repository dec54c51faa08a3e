// Copyright 2025 the Subcompose Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Composition & effects (C5, spec §4.6): combines per-glyph bitmaps into
//! one bitmap per visual layer (fill, border, shadow), corrects border/fill
//! overlap, and applies blur — all behind a [`CompositeKey`]-addressed
//! cache so two events (or two frames of the same event) that end up with
//! identical glyph-bitmap stacks share the composite.

use crate::bitmap::Bitmap;
use crate::cache::{BitmapRef, Cache, CompositeKey};
use crate::geometry::BBox;
use crate::raster::BlitEngine;
use std::rc::Rc;

pub type CompositeCache = Cache<CompositeKey, Bitmap>;

fn bitmap_bbox(bmp: &Bitmap, x: i32, y: i32) -> BBox {
    BBox { x0: x, y0: y, x1: x + bmp.width, y1: y + bmp.height }
}

fn union_bbox(items: &[(Rc<Bitmap>, i32, i32)]) -> BBox {
    items.iter().fold(BBox::EMPTY, |acc, (b, x, y)| acc.union(bitmap_bbox(b, *x, *y)))
}

/// Additively combines every `(bitmap, x, y)` in `items` onto one buffer
/// sized to their union bbox.
fn combine(items: &[(Rc<Bitmap>, i32, i32)], blit: &dyn BlitEngine) -> Bitmap {
    let bbox = union_bbox(items);
    if bbox.is_empty() {
        return Bitmap { width: 0, height: 0, stride: 0, data: Vec::new(), origin_x: 0, origin_y: 0 };
    }
    let width = bbox.width();
    let height = bbox.height();
    let mut data = vec![0u8; (width * height) as usize];
    for (b, x, y) in items {
        if b.is_empty() {
            continue;
        }
        blit.add_bitmaps(&mut data, width, height, &b.data, b.width, b.height, x - bbox.x0, y - bbox.y0);
    }
    Bitmap { width, height, stride: width, data, origin_x: bbox.x0, origin_y: bbox.y0 }
}

/// Subtracts `fill`'s coverage from `stroke`'s (spec §4.6.1 "fix_outline"),
/// so a glyph's border never shows through its own fill where the two
/// overlap — both bitmaps are given in the same coordinate space via their
/// `(x, y)` placement.
#[must_use]
pub fn fix_outline(fill: &Bitmap, fill_xy: (i32, i32), stroke: &Bitmap, stroke_xy: (i32, i32)) -> Bitmap {
    if stroke.is_empty() {
        return Bitmap { width: 0, height: 0, stride: 0, data: Vec::new(), origin_x: 0, origin_y: 0 };
    }
    let mut out = stroke.data.clone();
    let (fx, fy) = fill_xy;
    let (sx, sy) = stroke_xy;
    for y in 0..stroke.height {
        for x in 0..stroke.width {
            let world_x = sx + x;
            let world_y = sy + y;
            let lx = world_x - fx;
            let ly = world_y - fy;
            if lx >= 0 && lx < fill.width && ly >= 0 && ly < fill.height {
                let f = fill.data[(ly * fill.width + lx) as usize];
                let idx = (y * stroke.width + x) as usize;
                out[idx] = out[idx].saturating_sub(f);
            }
        }
    }
    Bitmap { width: stroke.width, height: stroke.height, stride: stroke.width, data: out, origin_x: stroke.origin_x, origin_y: stroke.origin_y }
}

/// Builds (or reuses) the composite bitmap for one layer (fill or border)
/// of one event line: combines every glyph's bitmap, then applies blur if
/// requested. `bitmaps`/`border_bitmaps` mirror [`CompositeKey`]'s two
/// lists so a single key covers a glyph run's fill-plus-border composite
/// in one cache entry (spec §4.6.2).
pub fn get_composite(
    cache: &mut CompositeCache,
    blit: &dyn BlitEngine,
    key: CompositeKey,
    bitmaps: Vec<(Rc<Bitmap>, i32, i32)>,
    blur: Option<(i32, u8)>,
    edge_blur: Option<(i32, u8)>,
) -> Rc<Bitmap> {
    cache.get(key, |_| {
        let mut composite = combine(&bitmaps, blit);
        if let Some((radius, passes)) = blur {
            blit.synth_blur(&mut composite.data, composite.width, composite.height, radius, passes);
        }
        if let Some((radius, passes)) = edge_blur {
            blit.synth_blur(&mut composite.data, composite.width, composite.height, radius, passes);
        }
        let size = (composite.width.max(0) * composite.height.max(0)) as usize;
        (composite, size.max(1))
    })
}

/// Builds a [`CompositeKey`] for a glyph run's fill+border bitmaps, so
/// callers don't need to hand-assemble the key's sorted bitmap lists.
#[must_use]
pub fn composite_key(
    filter_flags: u8,
    be_passes: u8,
    blur_n: i32,
    border_style: crate::style::BorderStyleKind,
    fill: &[(Rc<Bitmap>, i32, i32)],
    border: &[(Rc<Bitmap>, i32, i32)],
) -> CompositeKey {
    let wrap = |items: &[(Rc<Bitmap>, i32, i32)]| -> Vec<(BitmapRef, i32, i32)> {
        items.iter().map(|(b, x, y)| (BitmapRef(Rc::clone(b)), *x, *y)).collect()
    };
    CompositeKey {
        filter_flags,
        be_passes,
        blur_n,
        border_style,
        bitmaps: wrap(fill),
        border_bitmaps: wrap(border),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::ScalarBlitEngine;

    fn solid(w: i32, h: i32, v: u8) -> Rc<Bitmap> {
        Rc::new(Bitmap { width: w, height: h, stride: w, data: vec![v; (w * h) as usize], origin_x: 0, origin_y: 0 })
    }

    #[test]
    fn combine_unions_two_disjoint_bitmaps() {
        let blit = ScalarBlitEngine;
        let items = vec![(solid(2, 2, 100), 0, 0), (solid(2, 2, 50), 10, 10)];
        let out = combine(&items, &blit);
        assert_eq!(out.width, 12);
        assert_eq!(out.height, 12);
    }

    #[test]
    fn fix_outline_clears_overlap_with_fill() {
        let fill = Bitmap { width: 4, height: 4, stride: 4, data: vec![255; 16], origin_x: 0, origin_y: 0 };
        let stroke = Bitmap { width: 4, height: 4, stride: 4, data: vec![255; 16], origin_x: 0, origin_y: 0 };
        let fixed = fix_outline(&fill, (0, 0), &stroke, (0, 0));
        assert!(fixed.data.iter().all(|&b| b == 0));
    }

    #[test]
    fn fix_outline_keeps_non_overlapping_stroke() {
        let fill = Bitmap { width: 2, height: 2, stride: 2, data: vec![255; 4], origin_x: 0, origin_y: 0 };
        let stroke = Bitmap { width: 2, height: 2, stride: 2, data: vec![255; 4], origin_x: 10, origin_y: 10 };
        let fixed = fix_outline(&fill, (0, 0), &stroke, (10, 10));
        assert!(fixed.data.iter().all(|&b| b == 255));
    }

    #[test]
    fn edge_blur_changes_composite_pixels() {
        let mut cache: CompositeCache = Cache::new();
        let blit = ScalarBlitEngine;
        let mut data = vec![0u8; 25];
        data[12] = 255; // single lit pixel in a 5x5 field
        let b = Rc::new(Bitmap { width: 5, height: 5, stride: 5, data, origin_x: 0, origin_y: 0 });
        let key_plain = composite_key(0, 0, 0, crate::style::BorderStyleKind::OutlineAndShadow, &[(Rc::clone(&b), 0, 0)], &[]);
        let key_blurred = composite_key(0, 3, 0, crate::style::BorderStyleKind::OutlineAndShadow, &[(Rc::clone(&b), 0, 0)], &[]);
        let plain = get_composite(&mut cache, &blit, key_plain, vec![(Rc::clone(&b), 0, 0)], None, None);
        let blurred = get_composite(&mut cache, &blit, key_blurred, vec![(Rc::clone(&b), 0, 0)], None, Some((1, 3)));
        assert_ne!(plain.data, blurred.data);
    }

    #[test]
    fn composite_is_cached_by_key() {
        let mut cache: CompositeCache = Cache::new();
        let blit = ScalarBlitEngine;
        let b = solid(2, 2, 200);
        let key = composite_key(0, 0, 0, crate::style::BorderStyleKind::OutlineAndShadow, &[(Rc::clone(&b), 0, 0)], &[]);
        let c1 = get_composite(&mut cache, &blit, key.clone(), vec![(Rc::clone(&b), 0, 0)], None, None);
        let c2 = get_composite(&mut cache, &blit, key, vec![(Rc::clone(&b), 0, 0)], None, None);
        assert!(Rc::ptr_eq(&c1, &c2));
    }
}
