// Copyright 2025 the Subcompose Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-event pipeline orchestration (C4, spec §4.5): runs one event's text
//! through validation, tag parsing, shaping, outline/bitmap retrieval,
//! wrapping, karaoke, bidi reordering, alignment, clipping, and
//! composition, producing the [`EventImages`] a caller composites onto a
//! video frame.
//!
//! Each phase below is grounded in its own module; this file is the glue
//! a real embedding's single `render_frame` entry point calls once per
//! active event.

use crate::bitmap::{self, Bitmap, BitmapCache};
use crate::cache::{Hinting, OutlineCache, OutlineRef};
use crate::color::Color;
use crate::compose::{self, CompositeCache};
use crate::coords::ScreenMapping;
use crate::drawing;
use crate::event::{Event, Track};
use crate::fontsrc::{FaceId, FontSource};
use crate::image::{EventImages, Image};
use crate::outline::{self, Stroker};
use crate::quantize::{self, QuantizationResidual};
use crate::raster::BlitEngine;
use crate::render_state::{KaraokeMode, RenderState};
use crate::reorder;
use crate::shaping::{ShapedCluster, Shaper};
use crate::style::{BorderStyleKind, Justify, OverrideMask};
use crate::tags::{self, TaggedRun};
use crate::wrap;
use crate::{align, blur};
use std::rc::Rc;

/// The four content caches a renderer threads through every event (spec
/// §4.1): outlines, bitmaps, composites, plus the drawing-outline keying
/// relies on the same outline cache as glyphs.
pub struct PipelineCaches {
    pub outlines: OutlineCache,
    pub bitmaps: BitmapCache,
    pub composites: CompositeCache,
}

impl Default for PipelineCaches {
    fn default() -> Self {
        Self { outlines: OutlineCache::new(), bitmaps: BitmapCache::new(), composites: CompositeCache::new() }
    }
}

impl PipelineCaches {
    /// Frame-start cache trim (spec §4.8 "trim caches" / §5 "caches trimmed
    /// LRU at frame start"), bounded by the three configured budgets.
    pub fn trim(&mut self, outline_limit: usize, bitmap_budget: usize, composite_budget: usize) {
        self.outlines.cut(outline_limit);
        self.bitmaps.cut(bitmap_budget);
        self.composites.cut(composite_budget);
    }
}

/// External collaborators a render call needs for one frame.
pub struct PipelineContext<'a> {
    pub fonts: &'a mut dyn FontSource,
    pub shaper: &'a mut dyn Shaper,
    pub stroker: &'a mut dyn Stroker,
    pub blit: &'a dyn BlitEngine,
}

struct RunSpan {
    state: RenderState,
    face: FaceId,
    /// `Some((commands_hash, commands, scale_ord))` when this run is
    /// drawing-mode vector data (`\p<scale_ord>`) rather than shaped text;
    /// its span covers a single placeholder cluster.
    drawing: Option<(u64, String, i32)>,
}

/// Phase 1 (validate) + 2 (init render state) + 3 (tag parsing) + 4 (style
/// runs): turns raw text into styled runs, resolving `\r` against the
/// track's style table, applying the track-wide font scale, and resolving
/// any pending `\t` transitions against `time_ms` (spec §11 supplemental).
fn build_runs(track: &Track, base_style: &crate::style::Style, event: &Event, time_ms: i64) -> Vec<TaggedRun> {
    let mut runs = tags::parse_event_text(&event.text, base_style, |name| track.style(name).cloned());
    let rel_time_ms = time_ms - event.start_ms;
    let duration_ms = (event.end_ms - event.start_ms).max(0);
    for run in &mut runs {
        run.state.style.size_px = crate::style::init_font_scale(run.state.style.size_px, track.font_scale_percent);
        run.state.resolve_transitions(rel_time_ms, duration_ms);
    }
    runs
}

/// Phase 5 (shape) + part of phase 6 (retrieve outlines' keys): shapes
/// every non-drawing run and records drawing runs as a single placeholder
/// cluster, building the full logical cluster sequence, the run span each
/// belongs to, and a per-cluster span index for later phases.
fn shape_runs(ctx: &mut PipelineContext, runs: &[TaggedRun]) -> (Vec<ShapedCluster>, Vec<RunSpan>, Vec<usize>) {
    let mut clusters = Vec::new();
    let mut spans = Vec::new();
    let mut cluster_span = Vec::new();
    for (span_idx, run) in runs.iter().enumerate() {
        if run.is_drawing {
            clusters.push(ShapedCluster {
                text_range: 0..run.text.len(),
                glyphs: smallvec::smallvec![crate::shaping::ShapedGlyph { glyph_index: u32::MAX, x_offset: 0.0, y_offset: 0.0 }],
                advance: run.state.style.size_px,
                bidi_level: 0,
                is_whitespace: false,
                mandatory_break_after: false,
            });
            cluster_span.push(span_idx);
            let scale_ord = run.state.drawing_scale.unwrap_or(1);
            spans.push(RunSpan { state: run.state.clone(), face: FaceId(0), drawing: Some((drawing::hash_drawing_commands(&run.text), run.text.clone(), scale_ord)) });
            continue;
        }
        let face = ctx.fonts.find_face(&run.state.style.font_family, run.state.style.bold, run.state.style.italic).unwrap_or(FaceId(0));
        let shaped = ctx.shaper.shape_run(face, run.state.style.size_px, &run.text);
        for _ in &shaped {
            cluster_span.push(span_idx);
        }
        clusters.extend(shaped);
        spans.push(RunSpan { state: run.state.clone(), face, drawing: None });
    }
    (clusters, spans, cluster_span)
}

/// Phase 9 (karaoke): color a run's primary fill at `time_ms` according to
/// its karaoke mode and the accumulated syllable clock.
fn karaoke_color(span_state: &RenderState, syllable_start_ms: i64, event_start_ms: i64, time_ms: i64) -> Color {
    let base = span_state.style.primary_color;
    let highlight = span_state.style.secondary_color;
    match span_state.karaoke {
        KaraokeMode::None => base,
        KaraokeMode::Sweep | KaraokeMode::Outline => {
            if time_ms >= event_start_ms + syllable_start_ms + span_state.karaoke_syllable_dur_ms {
                base
            } else {
                highlight
            }
        }
        KaraokeMode::Fill => {
            let elapsed = time_ms - (event_start_ms + syllable_start_ms);
            let t = (elapsed as f32 / span_state.karaoke_syllable_dur_ms.max(1) as f32).clamp(0.0, 1.0);
            highlight.lerp(base, t)
        }
    }
}

/// Shared layout result for one event: everything phases 5-11 produce
/// before outline/bitmap construction (phase 6 onward) begins. Both
/// [`render_event`] and [`event_glyph_info`] build on this so the
/// opt-in glyph-info API (spec §11 supplemental) never drifts from the
/// positions actually rendered.
struct EventLayout {
    clusters: Vec<ShapedCluster>,
    spans: Vec<RunSpan>,
    cluster_span: Vec<usize>,
    lines: Vec<wrap::WrappedLine>,
    line_ys: Vec<f32>,
    avail_width: f32,
    line_height: f32,
    base_style: crate::style::Style,
}

/// Phases 1-4 (validate/init/tag-parse/style), 5 (shape), and 11
/// (wrap + alignment positions). Returns `None` for inactive, textless,
/// or entirely-unshapeable events. `forced` is an embedding-level style
/// override (spec §4.7 "handle_selective_style_overrides") merged onto the
/// event's named style before any tag is applied.
fn layout_event(
    ctx: &mut PipelineContext,
    track: &Track,
    event: &Event,
    time_ms: i64,
    screen: &ScreenMapping,
    forced: Option<(&crate::style::Style, OverrideMask)>,
) -> Option<EventLayout> {
    if !event.is_active_at(time_ms) || event.text.is_empty() {
        return None;
    }
    let mut base_style = track.style(&event.style_name).cloned().unwrap_or_default();
    if let Some((forced_style, mask)) = forced {
        base_style = crate::style::apply_selective_override(&base_style, forced_style, mask);
    }
    let runs = build_runs(track, &base_style, event, time_ms);
    if runs.is_empty() {
        return None;
    }
    let (clusters, spans, cluster_span) = shape_runs(ctx, &runs);

    let margin_l = if event.margin_l != 0 { event.margin_l } else { base_style.margin_l };
    let margin_r = if event.margin_r != 0 { event.margin_r } else { base_style.margin_r };
    let margin_v = if event.margin_v != 0 { event.margin_v } else { base_style.margin_v };
    let avail_width = (screen.scale_x() * (track.play_res_x - margin_l - margin_r).max(0) as f32).max(1.0);

    let wrap_style = if spans.iter().any(|s| s.state.wrap_disabled_this_run) { Justify::NoWrap } else { track.wrap_style };
    let lines = wrap::wrap_lines(&clusters, avail_width, wrap_style);
    if lines.is_empty() {
        return None;
    }

    let line_height = base_style.size_px * 1.2 * screen.scale_y();
    let box_height = (screen.scale_y() * (track.play_res_y - margin_v).max(0) as f32).max(1.0);
    let line_ys = align::stack_lines_y(lines.len(), line_height, box_height, base_style.alignment);
    Some(EventLayout { clusters, spans, cluster_span, lines, line_ys, avail_width, line_height, base_style })
}

/// Renders one event at `time_ms`, producing its positioned image layers.
/// Returns an empty [`EventImages`] (phase 1 "validate") for inactive or
/// textless events.
pub fn render_event(
    caches: &mut PipelineCaches,
    ctx: &mut PipelineContext,
    track: &Track,
    event: &Event,
    time_ms: i64,
    screen: &ScreenMapping,
    forced: Option<(&crate::style::Style, OverrideMask)>,
) -> EventImages {
    let Some(EventLayout { clusters, spans, cluster_span, lines, line_ys, avail_width, line_height, base_style }) =
        layout_event(ctx, track, event, time_ms, screen, forced)
    else {
        return EventImages { images: Vec::new(), is_empty: true };
    };

    // Karaoke clock accumulates across the whole event, not per line.
    let mut karaoke_clock_ms: i64 = 0;
    let mut span_karaoke_start = vec![0i64; spans.len()];
    for (i, s) in spans.iter().enumerate() {
        span_karaoke_start[i] = karaoke_clock_ms;
        if s.state.karaoke != KaraokeMode::None {
            karaoke_clock_ms += s.state.karaoke_syllable_dur_ms;
        }
    }

    let mut shadow_parts = Vec::new();
    let mut border_parts = Vec::new();
    let mut fill_parts = Vec::new();
    let mut residual: Option<QuantizationResidual> = None;

    for (line_idx, line) in lines.iter().enumerate() {
        let order = reorder::visual_order(&clusters, line.start, line.end);
        let line_x0 = align::align_line_x::<false>(line, avail_width, base_style.alignment);
        let anchor_y = line_ys[line_idx];
        let mut pen_x = line_x0;

        for &cluster_idx in &order {
            let cluster = &clusters[cluster_idx];
            let span = &spans[cluster_span[cluster_idx]];
            let style = &span.state.style;

            let outline = if let Some((hash, commands, scale_ord)) = &span.drawing {
                // `\p<n>` coordinates are in `1 / 2^(n-1)` pixel units;
                // outline geometry throughout this crate is 26.6 (1/64
                // pixel) fixed point, hence the extra `* 64.0`.
                let pixel_scale = 64.0 / 2f32.powi(scale_ord - 1);
                outline::get_drawing_outline(&mut caches.outlines, *hash, *scale_ord, || drawing::parse_drawing(commands, pixel_scale))
            } else {
                let glyph = cluster.glyphs.first().map(|g| g.glyph_index).unwrap_or(0);
                outline::get_glyph_outline(&mut caches.outlines, ctx.fonts, span.face, glyph, style.size_px, Hinting::Normal)
            };

            if outline.valid {
                let pen_px_x = pen_x + cluster.glyphs.first().map(|g| g.x_offset).unwrap_or(0.0);
                let pen_px_y = anchor_y + cluster.glyphs.first().map(|g| g.y_offset).unwrap_or(0.0);
                let (dev_x, dev_y) = if let Some(pos) = span.state.position.pos {
                    (screen.x2scr(pos.0), screen.y2scr(pos.1))
                } else {
                    (screen.x2scr(0.0) + pen_px_x, screen.y2scr(0.0) + pen_px_y)
                };

                let m = transform_for_cluster(dev_x, dev_y, style, screen.scale_x());
                let outline_key = OutlineRef(Rc::clone(&outline));
                if let Some((q, new_residual)) = quantize::quantize_transform(m, outline.cbox, residual) {
                    residual = Some(new_residual);
                    let fill_bmp = bitmap::get_bitmap(&mut caches.bitmaps, ctx.blit, Rc::clone(&outline), outline_key.clone(), &q, false);
                    let fill_xy = (q.position.0 + fill_bmp.origin_x, q.position.1 + fill_bmp.origin_y);

                    let mut color = karaoke_color(&span.state, span_karaoke_start[cluster_span[cluster_idx]], event.start_ms, time_ms);
                    if let Some(fade) = &span.state.fade {
                        let alpha = fade.alpha_at(time_ms - event.start_ms);
                        color.a = (255.0 - (255.0 - f32::from(color.a)) * alpha).round().clamp(0.0, 255.0) as u8;
                    }

                    if style.border_style == BorderStyleKind::OutlineAndShadow && (style.border_x > 0.0 || style.border_y > 0.0) {
                        let border_outline = outline::get_border_outline(&mut caches.outlines, ctx.stroker, Rc::clone(&outline), 0, style.border_x, style.border_y);
                        if border_outline.valid {
                            let border_key = OutlineRef(Rc::clone(&border_outline));
                            if let Some((qb, _)) = quantize::quantize_transform(m, border_outline.cbox, Some(new_residual)) {
                                let stroke_bmp = bitmap::get_bitmap(&mut caches.bitmaps, ctx.blit, Rc::clone(&border_outline), border_key, &qb, true);
                                let stroke_xy = (qb.position.0 + stroke_bmp.origin_x, qb.position.1 + stroke_bmp.origin_y);
                                let fixed = fix_outline_positioned(&fill_bmp, fill_xy, &stroke_bmp, stroke_xy);
                                if style.shadow_x != 0.0 || style.shadow_y != 0.0 {
                                    shadow_parts.push((Rc::new(fixed.clone()), stroke_xy.0 + style.shadow_x as i32, stroke_xy.1 + style.shadow_y as i32, style.shadow_color));
                                }
                                border_parts.push((Rc::new(fixed), stroke_xy.0, stroke_xy.1, style.outline_color));
                            }
                        }
                    }

                    fill_parts.push((fill_bmp, fill_xy.0, fill_xy.1, color));
                }
            }
            pen_x += cluster.advance;
        }

        if base_style.border_style == BorderStyleKind::OpaqueBox {
            if let Some(part) = opaque_line_box(caches, ctx.blit, &base_style, line_x0, pen_x, anchor_y, line_height, screen) {
                border_parts.push(part);
            }
        }
    }

    let border_style = base_style.border_style;
    let blur = blur::quantize_gaussian_blur(base_style.blur_radius);
    let edge_blur = blur::quantize_edge_blur(base_style.edge_blur);
    let mut images = Vec::new();
    let mut order = 0;
    emit_layer(&mut caches.composites, ctx.blit, &shadow_parts, border_style, blur, edge_blur, &mut images, &mut order);
    emit_layer(&mut caches.composites, ctx.blit, &border_parts, border_style, blur, edge_blur, &mut images, &mut order);
    emit_layer(&mut caches.composites, ctx.blit, &fill_parts, border_style, blur, edge_blur, &mut images, &mut order);

    EventImages { is_empty: images.is_empty(), images }
}

/// `glyph_info` auxiliary API (spec §6/§11): resolved per-glyph placement
/// without forcing a raster. Opt-in — never called by [`render_event`].
pub(crate) fn event_glyph_info(
    ctx: &mut PipelineContext,
    track: &Track,
    event: &Event,
    time_ms: i64,
    screen: &ScreenMapping,
    forced: Option<(&crate::style::Style, OverrideMask)>,
) -> Vec<crate::render_state::GlyphInfo> {
    let Some(EventLayout { clusters, cluster_span: _, lines, line_ys, avail_width, base_style, .. }) =
        layout_event(ctx, track, event, time_ms, screen, forced)
    else {
        return Vec::new();
    };

    let mut out = Vec::new();
    for (line_idx, line) in lines.iter().enumerate() {
        let order = reorder::visual_order(&clusters, line.start, line.end);
        let mut pen_x = align::align_line_x::<false>(line, avail_width, base_style.alignment);
        let anchor_y = line_ys[line_idx];
        for &cluster_idx in &order {
            let cluster = &clusters[cluster_idx];
            let glyph = cluster.glyphs.first();
            out.push(crate::render_state::GlyphInfo {
                text_byte_offset: cluster.text_range.start,
                advance: cluster.advance,
                pen_x: pen_x + glyph.map(|g| g.x_offset).unwrap_or(0.0),
                pen_y: anchor_y + glyph.map(|g| g.y_offset).unwrap_or(0.0),
                bidi_level: cluster.bidi_level,
            });
            pen_x += cluster.advance;
        }
    }
    out
}

fn fix_outline_positioned(fill: &Bitmap, fill_xy: (i32, i32), stroke: &Bitmap, stroke_xy: (i32, i32)) -> Bitmap {
    compose::fix_outline(fill, fill_xy, stroke, stroke_xy)
}

/// Synthesizes a `BorderStyle=3` opaque background box sized to span the
/// whole line — advance width plus border padding, by the line's height
/// (the crate's ascent+descent proxy) plus border padding — rather than
/// rasterizing the unit box outline per glyph (spec §4.6.1).
fn opaque_line_box(
    caches: &mut PipelineCaches,
    blit: &dyn BlitEngine,
    style: &crate::style::Style,
    line_x0: f32,
    line_x1: f32,
    anchor_y: f32,
    line_height: f32,
    screen: &ScreenMapping,
) -> Option<(Rc<Bitmap>, i32, i32, Color)> {
    let border_x = style.border_x * screen.scale_x();
    let border_y = style.border_y * screen.scale_y();
    let box_w = ((line_x1 - line_x0) + border_x * 2.0).max(1.0);
    let box_h = (line_height + border_y * 2.0).max(1.0);
    let dev_x = screen.x2scr(0.0) + line_x0 - border_x;
    let dev_y = screen.y2scr(0.0) + anchor_y - border_y;

    let box_outline = outline::get_box_outline(&mut caches.outlines);
    let m = glam::Mat3::from_translation(glam::Vec2::new(dev_x, dev_y)) * glam::Mat3::from_scale(glam::Vec2::new(box_w / 64.0, box_h / 64.0));
    let (q, _) = quantize::quantize_transform(m, box_outline.cbox, None)?;
    let bmp = bitmap::get_bitmap(&mut caches.bitmaps, blit, Rc::clone(&box_outline), OutlineRef(Rc::clone(&box_outline)), &q, false);
    let xy = (q.position.0 + bmp.origin_x, q.position.1 + bmp.origin_y);
    Some((bmp, xy.0, xy.1, style.outline_color))
}

/// Groups same-colored parts of a layer into composite bitmaps and
/// appends them as [`Image`]s, in ascending paint order.
fn emit_layer(
    composites: &mut CompositeCache,
    blit: &dyn BlitEngine,
    parts: &[(Rc<Bitmap>, i32, i32, Color)],
    border_style: BorderStyleKind,
    blur: Option<(i32, u8)>,
    edge_blur: Option<(i32, u8)>,
    images: &mut Vec<Image>,
    order: &mut i32,
) {
    let mut by_color: Vec<(Color, Vec<(Rc<Bitmap>, i32, i32)>)> = Vec::new();
    for (bmp, x, y, color) in parts {
        if let Some((_, group)) = by_color.iter_mut().find(|(c, _)| c == color) {
            group.push((Rc::clone(bmp), *x, *y));
        } else {
            by_color.push((*color, vec![(Rc::clone(bmp), *x, *y)]));
        }
    }
    for (color, group) in by_color {
        let be_passes = edge_blur.map(|(_, p)| p).unwrap_or(0);
        let key = compose::composite_key(0, be_passes, blur.map(|(r, _)| r).unwrap_or(0), border_style, &group, &[]);
        let bmp = compose::get_composite(composites, blit, key, group, blur, edge_blur);
        if bmp.is_empty() {
            continue;
        }
        images.push(Image {
            width: bmp.width,
            height: bmp.height,
            stride: bmp.stride,
            bitmap: bmp.data.clone(),
            dst_x: bmp.origin_x,
            dst_y: bmp.origin_y,
            color,
            order: *order,
        });
        *order += 1;
    }
}

/// Builds the device-space transform for one cluster: a translation to its
/// pen position, composed with a Z rotation, an `\frx`/`\fry` 3D tilt, and
/// an `\fax`/`\fay` shear about the cluster's own origin. The tilt
/// projects the glyph plane (locally flat, `z=0`) through a fixed-distance
/// camera, producing the non-zero perspective row [`quantize::quantize_transform`]
/// already supports, so `\frx`/`\fry` widen the cluster's rendered bbox
/// (spec §8 3D-tilt scenario) instead of being silently dropped.
fn transform_for_cluster(dev_x: f32, dev_y: f32, style: &crate::style::Style, pixel_scale: f32) -> glam::Mat3 {
    let translate = glam::Mat3::from_translation(glam::Vec2::new(dev_x, dev_y));
    let scale = glam::Mat3::from_scale(glam::Vec2::splat((pixel_scale / 64.0).max(1e-6)));
    let shear = shear_matrix(style.fax, style.fay);
    let tilt = tilt_matrix(style.angle_x, style.angle_y);
    let rot = if style.angle_z == 0.0 { glam::Mat3::IDENTITY } else { glam::Mat3::from_angle(-style.angle_z.to_radians()) };
    translate * rot * tilt * shear * scale
}

/// `\frx`/`\fry`: rotates the (locally flat) glyph plane about its local X
/// then Y axes and projects back onto the screen plane through a fixed
/// camera distance, yielding a linear map with a non-zero Z row when
/// either angle is non-zero.
fn tilt_matrix(angle_x_deg: f32, angle_y_deg: f32) -> glam::Mat3 {
    if angle_x_deg == 0.0 && angle_y_deg == 0.0 {
        return glam::Mat3::IDENTITY;
    }
    const CAMERA_DISTANCE: f32 = 2000.0;
    let (sx, cx) = angle_x_deg.to_radians().sin_cos();
    let (sy, cy) = angle_y_deg.to_radians().sin_cos();
    // Local basis vectors e_x=(1,0,0), e_y=(0,1,0) rotated by Ry(fry)*Rx(frx).
    let ex = glam::Vec3::new(cy, 0.0, -sy);
    let ey = glam::Vec3::new(sy * sx, cx, cy * sx);
    glam::Mat3::from_cols(
        glam::Vec3::new(ex.x, ex.y, -ex.z / CAMERA_DISTANCE),
        glam::Vec3::new(ey.x, ey.y, -ey.z / CAMERA_DISTANCE),
        glam::Vec3::new(0.0, 0.0, 1.0),
    )
}

/// `\fax`/`\fay`: linear shear in the glyph's local plane.
fn shear_matrix(fax: f32, fay: f32) -> glam::Mat3 {
    if fax == 0.0 && fay == 0.0 {
        return glam::Mat3::IDENTITY;
    }
    glam::Mat3::from_cols(glam::Vec3::new(1.0, fay, 0.0), glam::Vec3::new(fax, 1.0, 0.0), glam::Vec3::new(0.0, 0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Track;
    use crate::fontsrc::NullFontSource;
    use crate::outline::Polyline;
    use crate::raster::ScalarBlitEngine;
    use crate::shaping::NullShaper;

    struct NullStroker;
    impl Stroker for NullStroker {
        fn stroke(&mut self, fill: &Polyline, _bx: f32, _by: f32, _prec: i32) -> Option<Polyline> {
            Some(fill.clone())
        }
    }

    #[test]
    fn inactive_event_yields_empty_images() {
        let mut caches = PipelineCaches::default();
        let mut fonts = NullFontSource;
        let mut shaper = NullShaper;
        let mut stroker = NullStroker;
        let blit = ScalarBlitEngine;
        let mut ctx = PipelineContext { fonts: &mut fonts, shaper: &mut shaper, stroker: &mut stroker, blit: &blit };
        let track = Track::new(1920, 1080);
        let event = Event { style_name: "Default".into(), start_ms: 0, end_ms: 1000, layer: 0, read_order: 0, margin_l: 0, margin_r: 0, margin_v: 0, text: "hi".into() };
        let screen = ScreenMapping::new(1920, 1080, 1920, 1080, false);
        let out = render_event(&mut caches, &mut ctx, &track, &event, 5000, &screen, None);
        assert!(out.is_empty);
    }

    #[test]
    fn empty_text_yields_empty_images() {
        let mut caches = PipelineCaches::default();
        let mut fonts = NullFontSource;
        let mut shaper = NullShaper;
        let mut stroker = NullStroker;
        let blit = ScalarBlitEngine;
        let mut ctx = PipelineContext { fonts: &mut fonts, shaper: &mut shaper, stroker: &mut stroker, blit: &blit };
        let track = Track::new(1920, 1080);
        let event = Event { style_name: "Default".into(), start_ms: 0, end_ms: 1000, layer: 0, read_order: 0, margin_l: 0, margin_r: 0, margin_v: 0, text: String::new() };
        let screen = ScreenMapping::new(1920, 1080, 1920, 1080, false);
        let out = render_event(&mut caches, &mut ctx, &track, &event, 500, &screen, None);
        assert!(out.is_empty);
    }
}
