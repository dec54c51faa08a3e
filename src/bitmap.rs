// Copyright 2025 the Subcompose Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bitmap construction (C3/C4, spec §4.3-4.4): rasterizes an outline under
//! a quantized transform into an 8-bit alpha buffer, cached by
//! [`crate::cache::BitmapHashKey`] so identical (outline, transform) pairs
//! across events and frames share one raster.

use crate::cache::{BitmapHashKey, BitmapRef, Cache, OutlineRef};
use crate::geometry::BBox;
use crate::outline::{OutlineHashValue, Polyline};
use crate::quantize::{self, QuantizedTransform};
use crate::raster::BlitEngine;
use std::rc::Rc;

/// A rasterized, positioned 8-bit alpha coverage buffer.
#[derive(Debug, Clone)]
pub struct Bitmap {
    pub width: i32,
    pub height: i32,
    pub stride: i32,
    pub data: Vec<u8>,
    /// Offset from the quantized transform's integer `position` to this
    /// bitmap's top-left corner, so compositing adds `position + origin`.
    pub origin_x: i32,
    pub origin_y: i32,
}

impl Bitmap {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0 || self.data.iter().all(|&b| b == 0)
    }
}

pub type BitmapCache = Cache<BitmapHashKey, Bitmap>;

/// `ass_bitmap_construct` equivalent: builds or reuses the rasterized fill
/// (or stroke, for a border outline) of `outline` under `transform`.
///
/// `use_stroke` selects the border polyline instead of the fill — border
/// outlines carry both (spec §4.3), and the same cached `OutlineHashValue`
/// is the source for both the fill bitmap and the border bitmap.
pub fn get_bitmap(
    cache: &mut BitmapCache,
    blit: &dyn BlitEngine,
    outline: Rc<OutlineHashValue>,
    outline_key_source: OutlineRef,
    transform: &QuantizedTransform,
    use_stroke: bool,
) -> Rc<Bitmap> {
    let key = BitmapHashKey::from_quantized(outline_key_source, transform);
    cache.get(key, |_| {
        if !outline.valid {
            return (empty_bitmap(), 1);
        }
        let polyline: &Polyline = if use_stroke { &outline.stroke } else { &outline.fill };
        if polyline.is_empty() {
            return (empty_bitmap(), 1);
        }
        let cbox = outline.cbox;
        let m = quantize::restore_local_transform(transform, cbox);
        let local = transform_polyline_for_raster(polyline, m, transform.offset);
        let bbox = local.cbox();
        if bbox.is_empty() {
            return (empty_bitmap(), 1);
        }
        let width = bbox.width().div_ceil(64).max(1);
        let height = bbox.height().div_ceil(64).max(1);
        // rasterize in device pixels: shift so bbox.x0/y0 sits at (0, 0).
        let shifted = shift_to_origin(&local, bbox);
        let raster = blit.rasterize(&pixel_space(&shifted), width, height);
        let size = (width * height) as usize;
        let bitmap = Bitmap {
            width,
            height,
            stride: width,
            data: raster,
            origin_x: bbox.x0.div_euclid(64),
            origin_y: bbox.y0.div_euclid(64),
        };
        (bitmap, size.max(1))
    })
}

fn empty_bitmap() -> Bitmap {
    Bitmap { width: 0, height: 0, stride: 0, data: Vec::new(), origin_x: 0, origin_y: 0 }
}

/// Applies the restored local transform to `polyline` (outline-space,
/// relative to the outline's own cbox centre), landing its centre at the
/// quantized sub-pixel offset.
fn transform_polyline_for_raster(polyline: &Polyline, m: glam::Mat3, _offset: (u8, u8)) -> Polyline {
    if m.z_axis.z != 1.0 || m.z_axis.x != 0.0 || m.z_axis.y != 0.0 {
        polyline.transformed_perspective(m)
    } else {
        polyline.transformed_2d(m)
    }
}

fn shift_to_origin(polyline: &Polyline, bbox: BBox) -> Polyline {
    let dx = -(bbox.x0 as f32);
    let dy = -(bbox.y0 as f32);
    Polyline {
        points: polyline.points.iter().map(|&p| glam::Vec2::new(p.x + dx, p.y + dy)).collect(),
        tags: polyline.tags.clone(),
    }
}

/// Converts from 26.6 outline units to pixel units for the rasterizer.
fn pixel_space(polyline: &Polyline) -> Polyline {
    Polyline {
        points: polyline.points.iter().map(|&p| glam::Vec2::new(p.x / 64.0, p.y / 64.0)).collect(),
        tags: polyline.tags.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::Cache;
    use crate::outline::SegmentTag;
    use crate::raster::ScalarBlitEngine;

    fn square_outline() -> Rc<OutlineHashValue> {
        let fill = Polyline {
            points: vec![
                glam::Vec2::new(0.0, 0.0),
                glam::Vec2::new(640.0, 0.0),
                glam::Vec2::new(640.0, 640.0),
                glam::Vec2::new(0.0, 640.0),
            ],
            tags: vec![SegmentTag::MoveTo, SegmentTag::LineTo, SegmentTag::LineTo, SegmentTag::Close],
        };
        let cbox = fill.cbox();
        Rc::new(OutlineHashValue { fill, stroke: Polyline::default(), advance: 640.0, ascender: 640.0, descender: 0.0, cbox, valid: true })
    }

    #[test]
    fn missing_outline_yields_empty_bitmap() {
        let mut cache: BitmapCache = Cache::new();
        let blit = ScalarBlitEngine;
        let outline = Rc::new(OutlineHashValue::default());
        let key_source = OutlineRef(Rc::clone(&outline));
        let (q, _) = quantize::quantize_transform(glam::Mat3::IDENTITY, BBox { x0: 0, y0: 0, x1: 640, y1: 640 }, None).unwrap();
        let bmp = get_bitmap(&mut cache, &blit, outline, key_source, &q, false);
        assert!(bmp.is_empty());
    }

    #[test]
    fn identity_transform_fills_a_square() {
        let mut cache: BitmapCache = Cache::new();
        let blit = ScalarBlitEngine;
        let outline = square_outline();
        let cbox = outline.cbox;
        let key_source = OutlineRef(Rc::clone(&outline));
        let (q, _) = quantize::quantize_transform(glam::Mat3::IDENTITY, cbox, None).unwrap();
        let bmp = get_bitmap(&mut cache, &blit, outline, key_source, &q, false);
        assert!(bmp.width > 0 && bmp.height > 0);
        assert!(!bmp.is_empty());
    }

    #[test]
    fn same_key_hits_cache() {
        let mut cache: BitmapCache = Cache::new();
        let blit = ScalarBlitEngine;
        let outline = square_outline();
        let cbox = outline.cbox;
        let (q, _) = quantize::quantize_transform(glam::Mat3::IDENTITY, cbox, None).unwrap();
        let b1 = get_bitmap(&mut cache, &blit, Rc::clone(&outline), OutlineRef(Rc::clone(&outline)), &q, false);
        let b2 = get_bitmap(&mut cache, &blit, Rc::clone(&outline), OutlineRef(Rc::clone(&outline)), &q, false);
        assert!(Rc::ptr_eq(&b1, &b2));
        assert_eq!(cache.len(), 1);
    }
}
