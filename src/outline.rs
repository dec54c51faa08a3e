// Copyright 2025 the Subcompose Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Outline & bitmap construction (C3, spec §4.3): the four
//! `OutlineHashKey` variants and the cache-miss constructors that build an
//! [`OutlineHashValue`] for each.

use crate::cache::{Cache, Hinting, OutlineHashKey, OutlineRef};
use crate::fontsrc::{FaceId, FontSource};
use crate::geometry::BBox;
use glam::Vec2;
use std::rc::Rc;

/// Tag for one point in a [`Polyline`]'s contour stream.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum SegmentTag {
    MoveTo,
    LineTo,
    QuadTo,
    CubicTo,
    Close,
}

/// Flattened-enough representation of a contour set: parallel `points` and
/// `tags` arrays (spec §3: "two polylines ... as (points, segment-tags)").
#[derive(Clone, Default)]
pub struct Polyline {
    pub points: Vec<Vec2>,
    pub tags: Vec<SegmentTag>,
}

impl Polyline {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[must_use]
    pub fn cbox(&self) -> BBox {
        BBox::from_points(self.points.iter().copied())
    }

    /// Applies a 2D affine transform (the cheap path taken when the
    /// quantized `matrix_z` is zero, spec §4.4) to every point.
    #[must_use]
    pub fn transformed_2d(&self, m: glam::Mat3) -> Self {
        let points = self
            .points
            .iter()
            .map(|&p| {
                let v = m * Vec2::extend(p, 1.0);
                Vec2::new(v.x, v.y)
            })
            .collect();
        Self { points, tags: self.tags.clone() }
    }

    /// Applies a full 3x3 perspective transform, dividing by the
    /// homogeneous `w` (the path taken when `matrix_z` is non-zero).
    #[must_use]
    pub fn transformed_perspective(&self, m: glam::Mat3) -> Self {
        let points = self
            .points
            .iter()
            .map(|&p| {
                let v = m * Vec2::extend(p, 1.0);
                let w = if v.z.abs() > 1e-6 { v.z } else { 1e-6 };
                Vec2::new(v.x / w, v.y / w)
            })
            .collect();
        Self { points, tags: self.tags.clone() }
    }

    /// Scales every point by `(sx, sy)`, used before stroking (spec §4.3
    /// "scale source outline by 2^scale_ord on each axis").
    #[must_use]
    pub fn scaled(&self, sx: f32, sy: f32) -> Self {
        let points = self.points.iter().map(|&p| Vec2::new(p.x * sx, p.y * sy)).collect();
        Self { points, tags: self.tags.clone() }
    }
}

/// Cached value for any of the four outline key variants (spec §3).
#[derive(Debug, Default)]
pub struct OutlineHashValue {
    pub fill: Polyline,
    /// Stroke polyline; empty for glyph/drawing outlines that have not
    /// been bordered, populated for `Border` and `Box` keys.
    pub stroke: Polyline,
    pub advance: f32,
    pub ascender: f32,
    pub descender: f32,
    pub cbox: BBox,
    pub valid: bool,
}

impl OutlineHashValue {
    fn invalid() -> Self {
        Self { valid: false, ..Default::default() }
    }
}

impl std::fmt::Debug for Polyline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Polyline")
            .field("points", &self.points.len())
            .field("tags", &self.tags.len())
            .finish()
    }
}

/// External collaborator: strokes a fill polyline with separate X/Y border
/// widths at a fixed precision (spec §4.3 "Border"), producing the stroke
/// polyline, or `None` if stroking fails (degraded-data warning, value
/// marked invalid).
pub trait Stroker {
    fn stroke(&mut self, fill: &Polyline, border_x: f32, border_y: f32, precision: i32) -> Option<Polyline>;
}

/// `STROKER_PRECISION` (glossary): fixed stroker step size in outline units.
pub const STROKER_PRECISION: i32 = 16;

/// The outline cache: bounded by entry count (spec §4.1).
pub type OutlineCache = Cache<OutlineHashKey, OutlineHashValue>;

/// `ass_outline_construct` equivalent: builds (or reuses via cache) the
/// outline for a glyph cluster.
pub fn get_glyph_outline(
    cache: &mut OutlineCache,
    fonts: &mut dyn FontSource,
    face: FaceId,
    glyph_index: u32,
    size_px: f32,
    hinting: Hinting,
) -> Rc<OutlineHashValue> {
    let key = OutlineHashKey::Glyph {
        face,
        glyph_index,
        size_d6: (size_px * 64.0).round() as i32,
        hinting,
    };
    cache.get(key, |_| {
        match fonts.glyph_outline(face, glyph_index, size_px, hinting) {
            Some(g) => {
                let metrics = fonts.metrics(face, size_px);
                let value = OutlineHashValue {
                    fill: g.fill,
                    stroke: Polyline::default(),
                    advance: g.advance,
                    ascender: metrics.ascender,
                    descender: metrics.descender,
                    cbox: g.cbox,
                    valid: true,
                };
                let size = 1;
                (value, size)
            }
            None => (OutlineHashValue::invalid(), 1),
        }
    })
}

/// Builds (or reuses) a drawing outline from a parsed drawing polyline
/// (spec §4.3 "Drawing"): advance is bbox width, ascender is bbox height.
pub fn get_drawing_outline(
    cache: &mut OutlineCache,
    commands_hash: u64,
    scale: i32,
    build: impl FnOnce() -> Polyline,
) -> Rc<OutlineHashValue> {
    let key = OutlineHashKey::Drawing { commands_hash, scale };
    cache.get(key, |_| {
        let fill = build();
        let cbox = fill.cbox();
        let valid = !fill.is_empty();
        let value = OutlineHashValue {
            advance: cbox.width() as f32,
            ascender: cbox.height() as f32,
            descender: 0.0,
            cbox,
            fill,
            stroke: Polyline::default(),
            valid,
        };
        (value, 1)
    })
}

/// Builds (or reuses) a border-stroke outline: scale the source fill by
/// `2^scale_ord`, stroke it with separate X/Y widths at
/// [`STROKER_PRECISION`]. Fails gracefully (marks invalid) if stroking
/// fails, per spec §4.3 / §7.
pub fn get_border_outline(
    cache: &mut OutlineCache,
    stroker: &mut dyn Stroker,
    source: Rc<OutlineHashValue>,
    scale_ord: i32,
    border_x: f32,
    border_y: f32,
) -> Rc<OutlineHashValue> {
    let border_x_d6 = (border_x * 64.0).round() as i32;
    let border_y_d6 = (border_y * 64.0).round() as i32;
    let key = OutlineHashKey::Border {
        source: OutlineRef(Rc::clone(&source)),
        scale_ord,
        border_x_d6,
        border_y_d6,
    };
    cache.get(key, |_| {
        if !source.valid || source.fill.is_empty() {
            return (OutlineHashValue::invalid(), 1);
        }
        let scale = 2f32.powi(scale_ord);
        let scaled = source.fill.scaled(scale, scale);
        match stroker.stroke(&scaled, border_x * scale, border_y * scale, STROKER_PRECISION) {
            Some(stroke) => {
                let cbox = scaled.cbox().union(stroke.cbox());
                let value = OutlineHashValue {
                    fill: scaled,
                    stroke,
                    advance: source.advance * scale,
                    ascender: source.ascender * scale,
                    descender: source.descender * scale,
                    cbox,
                    valid: true,
                };
                (value, 1)
            }
            None => {
                log::warn!("border stroker failed; rendering cluster border as empty");
                (OutlineHashValue::invalid(), 1)
            }
        }
    })
}

/// Builds (or reuses) the unit-square box outline used for `BorderStyle=3`
/// opaque backgrounds: a four-segment contour from (0,0) to (64,64).
pub fn get_box_outline(cache: &mut OutlineCache) -> Rc<OutlineHashValue> {
    cache.get(OutlineHashKey::Box, |_| {
        let points = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(64.0, 0.0),
            Vec2::new(64.0, 64.0),
            Vec2::new(0.0, 64.0),
        ];
        let tags = vec![SegmentTag::MoveTo, SegmentTag::LineTo, SegmentTag::LineTo, SegmentTag::Close];
        let fill = Polyline { points, tags };
        let cbox = fill.cbox();
        let value = OutlineHashValue {
            advance: 64.0,
            ascender: 64.0,
            descender: 0.0,
            cbox,
            fill,
            stroke: Polyline::default(),
            valid: true,
        };
        (value, 1)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fontsrc::NullFontSource;

    #[test]
    fn box_outline_is_unit_square() {
        let mut cache = OutlineCache::new();
        let v = get_box_outline(&mut cache);
        assert!(v.valid);
        assert_eq!(v.cbox, BBox { x0: 0, y0: 0, x1: 64, y1: 64 });
    }

    #[test]
    fn missing_glyph_marks_invalid() {
        let mut cache = OutlineCache::new();
        let mut fonts = NullFontSource;
        let v = get_glyph_outline(&mut cache, &mut fonts, FaceId(0), 'A' as u32, 32.0, Hinting::Normal);
        assert!(!v.valid);
    }

    #[test]
    fn glyph_outline_is_cached_by_key() {
        struct OneGlyph;
        impl FontSource for OneGlyph {
            fn find_face(&mut self, _f: &str, _b: bool, _i: bool) -> Option<FaceId> {
                Some(FaceId(0))
            }
            fn metrics(&mut self, _f: FaceId, size_px: f32) -> crate::fontsrc::FaceMetrics {
                crate::fontsrc::FaceMetrics { ascender: size_px, descender: 0.0, underline_position: 0.0, underline_thickness: 1.0 }
            }
            fn glyph_outline(
                &mut self,
                _face: FaceId,
                _cp: u32,
                size_px: f32,
                _hinting: Hinting,
            ) -> Option<crate::fontsrc::GlyphOutline> {
                Some(crate::fontsrc::GlyphOutline {
                    fill: Polyline {
                        points: vec![Vec2::ZERO, Vec2::new(size_px, size_px)],
                        tags: vec![SegmentTag::MoveTo, SegmentTag::LineTo],
                    },
                    advance: size_px,
                    cbox: BBox { x0: 0, y0: 0, x1: size_px as i32, y1: size_px as i32 },
                })
            }
        }
        let mut cache = OutlineCache::new();
        let mut fonts = OneGlyph;
        let v1 = get_glyph_outline(&mut cache, &mut fonts, FaceId(0), 65, 32.0, Hinting::Normal);
        let v2 = get_glyph_outline(&mut cache, &mut fonts, FaceId(0), 65, 32.0, Hinting::Normal);
        assert!(Rc::ptr_eq(&v1, &v2));
        assert_eq!(cache.len(), 1);
    }
}
