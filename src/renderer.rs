// Copyright 2025 the Subcompose Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public entry point (spec §6 "Core API"): owns the four content caches
//! and the previous frame's image snapshot across calls, and drives the
//! per-event pipeline (phases 1-15, [`crate::pipeline`]) plus frame
//! assembly ([`crate::frame`]) for one `render_frame` call.

use crate::error::{Error, InitError};
use crate::event::{Event, Track};
use crate::frame::{self, PlacedEvent};
use crate::image::{EventImages, Image};
use crate::pipeline::PipelineCaches;

pub use crate::frame::ChangeLevel;
pub use crate::pipeline::PipelineContext;
pub use crate::render_state::GlyphInfo;

/// `hinting` renderer configuration (spec §6): which hinting mode glyph
/// outline extraction requests from the font source.
pub use crate::cache::Hinting;

/// Bitmask of which named-style fields an embedding allows a forced
/// selective override to touch (spec §6 `selective_style_overrides`).
/// Carried as configuration; see DESIGN.md for the scope this crate
/// wires it to.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub struct SelectiveOverrides(u32);

impl SelectiveOverrides {
    pub const FULL_STYLE: Self = Self(1 << 0);
    pub const STYLE: Self = Self(1 << 1);
    pub const FONT_NAME: Self = Self(1 << 2);
    pub const FONT_SIZE_FIELDS: Self = Self(1 << 3);
    pub const COLORS: Self = Self(1 << 4);
    pub const BORDER: Self = Self(1 << 5);
    pub const ATTRIBUTES: Self = Self(1 << 6);
    pub const ALIGNMENT: Self = Self(1 << 7);
    pub const JUSTIFY: Self = Self(1 << 8);
    pub const MARGINS: Self = Self(1 << 9);
    pub const SELECTIVE_FONT_SCALE: Self = Self(1 << 10);

    #[must_use]
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for SelectiveOverrides {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Translates the embedding-facing [`SelectiveOverrides`] field-group
/// bitmask into the pipeline's per-field [`crate::style::OverrideMask`]
/// (spec §4.7 "handle_selective_style_overrides").
fn override_mask(flags: SelectiveOverrides) -> crate::style::OverrideMask {
    use crate::style::OverrideMask as M;
    if flags.contains(SelectiveOverrides::FULL_STYLE) {
        return M::FONT_FAMILY
            | M::BOLD
            | M::ITALIC
            | M::UNDERLINE
            | M::STRIKEOUT
            | M::SIZE
            | M::SCALE_X
            | M::SCALE_Y
            | M::SPACING
            | M::ANGLE
            | M::BORDER
            | M::SHADOW
            | M::ALIGNMENT
            | M::PRIMARY_COLOR
            | M::SECONDARY_COLOR
            | M::OUTLINE_COLOR
            | M::SHADOW_COLOR
            | M::JUSTIFY
            | M::MARGINS
            | M::BLUR;
    }
    let mut mask = M::default();
    if flags.contains(SelectiveOverrides::STYLE) {
        mask.set(M::BOLD);
        mask.set(M::ITALIC);
        mask.set(M::UNDERLINE);
        mask.set(M::STRIKEOUT);
    }
    if flags.contains(SelectiveOverrides::FONT_NAME) {
        mask.set(M::FONT_FAMILY);
    }
    if flags.contains(SelectiveOverrides::FONT_SIZE_FIELDS) {
        mask.set(M::SIZE);
        mask.set(M::SCALE_X);
        mask.set(M::SCALE_Y);
        mask.set(M::SPACING);
    }
    if flags.contains(SelectiveOverrides::COLORS) {
        mask.set(M::PRIMARY_COLOR);
        mask.set(M::SECONDARY_COLOR);
        mask.set(M::OUTLINE_COLOR);
        mask.set(M::SHADOW_COLOR);
    }
    if flags.contains(SelectiveOverrides::BORDER) {
        mask.set(M::BORDER);
        mask.set(M::BLUR);
    }
    if flags.contains(SelectiveOverrides::ATTRIBUTES) {
        mask.set(M::ANGLE);
    }
    if flags.contains(SelectiveOverrides::ALIGNMENT) {
        mask.set(M::ALIGNMENT);
    }
    if flags.contains(SelectiveOverrides::JUSTIFY) {
        mask.set(M::JUSTIFY);
    }
    if flags.contains(SelectiveOverrides::MARGINS) {
        mask.set(M::MARGINS);
    }
    mask
}

/// Renderer configuration (spec §6 "Renderer configuration"), a plain
/// builder-style struct mirroring the teacher's unresolved-style-builder
/// pattern.
#[derive(Clone, Debug)]
pub struct RendererSettings {
    pub frame_width: i32,
    pub frame_height: i32,
    /// PAR reference dimensions; `0` lets `par` derive from frame size.
    pub storage_width: i32,
    pub storage_height: i32,
    /// Pixel aspect ratio; `0.0` means auto from DAR/SAR (here: from the
    /// frame-vs-storage ratio).
    pub par: f32,
    pub left_margin: i32,
    pub top_margin: i32,
    pub use_margins: bool,
    pub font_size_coeff: f32,
    pub line_spacing: f32,
    /// Percentage (0-100) shifting a line's vertical position within its
    /// alignment box.
    pub line_position: f32,
    pub hinting: Hinting,
    pub default_font: String,
    pub default_family: String,
    pub selective_style_overrides: SelectiveOverrides,
    /// Style values to force onto every event, restricted to the fields
    /// flagged in `selective_style_overrides` (spec §4.7
    /// "handle_selective_style_overrides"). `None` disables forcing.
    pub forced_style: Option<crate::style::Style>,
    /// Keep the script's aspect ratio via letterboxing instead of
    /// independent per-axis stretch (not a named libass knob, but this
    /// crate's [`crate::coords::ScreenMapping`] needs the choice made
    /// somewhere, and renderer construction is the natural place).
    pub keep_aspect: bool,
    /// Cache trim budgets applied at the start of every `render_frame`
    /// call (spec §5 "caches trimmed LRU at frame start"): outline entry
    /// count, then bitmap and composite byte footprints.
    pub outline_cache_limit: usize,
    pub bitmap_cache_budget: usize,
    pub composite_cache_budget: usize,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            frame_width: 1920,
            frame_height: 1080,
            storage_width: 0,
            storage_height: 0,
            par: 0.0,
            left_margin: 0,
            top_margin: 0,
            use_margins: false,
            font_size_coeff: 1.0,
            line_spacing: 0.0,
            line_position: 100.0,
            hinting: Hinting::Normal,
            default_font: String::new(),
            default_family: "sans-serif".to_owned(),
            selective_style_overrides: SelectiveOverrides::default(),
            forced_style: None,
            keep_aspect: false,
            outline_cache_limit: 4096,
            bitmap_cache_budget: 64 * 1024 * 1024,
            composite_cache_budget: 64 * 1024 * 1024,
        }
    }
}

impl RendererSettings {
    fn validate(&self) -> Result<(), InitError> {
        if self.frame_width <= 0 || self.frame_height <= 0 {
            return Err(InitError::InvalidSettings("frame_width/frame_height must be positive".into()));
        }
        Ok(())
    }
}

/// Owns the four content caches and the previous frame's image snapshot;
/// not safe to call concurrently (spec §5 "one logical renderer instance
/// is not safe for concurrent calls").
pub struct Renderer {
    settings: RendererSettings,
    caches: PipelineCaches,
    prev_frame: Vec<(usize, EventImages)>,
}

impl Renderer {
    /// `renderer_init` equivalent. Fails only on invalid settings (spec
    /// §7: "only init failures are surfaced to the caller").
    pub fn new(settings: RendererSettings) -> Result<Self, Error> {
        settings.validate().map_err(|e| {
            log::error!("renderer init failed: {e}");
            e
        })?;
        Ok(Self { settings, caches: PipelineCaches::default(), prev_frame: Vec::new() })
    }

    #[must_use]
    pub fn settings(&self) -> &RendererSettings {
        &self.settings
    }

    /// `render_frame` equivalent: selects the events active at `now_ms`,
    /// renders each, resolves vertical collisions within same-layer runs,
    /// and reports how much changed since the previous call.
    pub fn render_frame(&mut self, ctx: &mut PipelineContext, track: &Track, events: &[Event], now_ms: i64) -> (Vec<Image>, ChangeLevel) {
        self.caches.trim(self.settings.outline_cache_limit, self.settings.bitmap_cache_budget, self.settings.composite_cache_budget);

        let screen = self.screen_mapping(track);
        let active = frame::select_active(events, now_ms);
        let forced = self
            .settings
            .forced_style
            .as_ref()
            .map(|s| (s, override_mask(self.settings.selective_style_overrides)));

        let mut rendered: Vec<(usize, EventImages)> = Vec::with_capacity(active.len());
        for &idx in &active {
            let images = crate::pipeline::render_event(&mut self.caches, ctx, track, &events[idx], now_ms, &screen, forced);
            rendered.push((idx, images));
        }

        apply_collisions(events, &active, &mut rendered, track);

        let change = frame::detect_change(&self.prev_frame, &rendered);
        self.prev_frame = rendered.clone();

        let mut out = Vec::new();
        for (_, images) in &rendered {
            out.extend(images.images.iter().cloned());
        }
        out.sort_by_key(|img| img.order);
        log::trace!("render_frame: {} active events, {} images, change={:?}", active.len(), out.len(), change);
        (out, change)
    }

    /// `glyph_info` auxiliary API (spec §6, §11): per-glyph placement for
    /// one event without forcing a raster. Opt-in — never called by
    /// [`Self::render_frame`].
    #[must_use]
    pub fn glyph_info(&mut self, ctx: &mut PipelineContext, track: &Track, event: &Event, now_ms: i64) -> Vec<GlyphInfo> {
        let screen = self.screen_mapping(track);
        let forced = self
            .settings
            .forced_style
            .as_ref()
            .map(|s| (s, override_mask(self.settings.selective_style_overrides)));
        crate::pipeline::event_glyph_info(ctx, track, event, now_ms, &screen, forced)
    }

    fn screen_mapping(&self, track: &Track) -> crate::coords::ScreenMapping {
        crate::coords::ScreenMapping::new(track.play_res_x, track.play_res_y, self.settings.frame_width, self.settings.frame_height, self.settings.keep_aspect)
    }
}

/// Groups `active` into maximal same-layer runs and applies
/// [`frame::fix_collisions`] within each run, shifting every image of a
/// pushed event by the resolved Y delta (spec §4.8 "For each maximal
/// layer-run call fix_collisions").
fn apply_collisions(events: &[Event], active: &[usize], rendered: &mut [(usize, EventImages)], track: &Track) {
    let mut run_start = 0;
    while run_start < active.len() {
        let layer = events[active[run_start]].layer;
        let mut run_end = run_start + 1;
        while run_end < active.len() && events[active[run_end]].layer == layer {
            run_end += 1;
        }

        let placed: Vec<PlacedEvent> = rendered[run_start..run_end]
            .iter()
            .enumerate()
            .map(|(i, (idx, images))| {
                let shift_up = track.style(&events[*idx].style_name).is_some_and(|s| s.alignment.is_top());
                PlacedEvent { active_index: i, bbox: images.bbox(), shift_up }
            })
            .collect();
        let fixed = frame::fix_collisions(placed);

        for p in &fixed {
            let (_, images) = &mut rendered[run_start + p.active_index];
            let original = images.bbox();
            let dy = p.bbox.y0 - original.y0;
            if dy != 0 {
                log::debug!("collision shift: event moved by {dy}px");
                for img in &mut images.images {
                    img.dst_y += dy;
                }
            }
        }

        run_start = run_end;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fontsrc::NullFontSource;
    use crate::outline::{Polyline, Stroker};
    use crate::raster::ScalarBlitEngine;
    use crate::shaping::NullShaper;

    struct NullStroker;
    impl Stroker for NullStroker {
        fn stroke(&mut self, fill: &Polyline, _bx: f32, _by: f32, _prec: i32) -> Option<Polyline> {
            Some(fill.clone())
        }
    }

    fn ctx_parts() -> (NullFontSource, NullShaper, NullStroker, ScalarBlitEngine) {
        (NullFontSource, NullShaper, NullStroker, ScalarBlitEngine)
    }

    #[test]
    fn rejects_zero_sized_frame() {
        let settings = RendererSettings { frame_width: 0, ..RendererSettings::default() };
        assert!(Renderer::new(settings).is_err());
    }

    #[test]
    fn empty_track_yields_no_images_and_identical_change() {
        let settings = RendererSettings::default();
        let mut renderer = Renderer::new(settings).unwrap();
        let (mut fonts, mut shaper, mut stroker, blit) = ctx_parts();
        let mut ctx = PipelineContext { fonts: &mut fonts, shaper: &mut shaper, stroker: &mut stroker, blit: &blit };
        let track = Track::new(1920, 1080);
        let (images, change) = renderer.render_frame(&mut ctx, &track, &[], 0);
        assert!(images.is_empty());
        assert_eq!(change, ChangeLevel::Identical);
    }

    #[test]
    fn inactive_events_are_skipped() {
        let settings = RendererSettings::default();
        let mut renderer = Renderer::new(settings).unwrap();
        let (mut fonts, mut shaper, mut stroker, blit) = ctx_parts();
        let mut ctx = PipelineContext { fonts: &mut fonts, shaper: &mut shaper, stroker: &mut stroker, blit: &blit };
        let mut track = Track::new(1920, 1080);
        track.insert_style("Default", crate::style::Style::default());
        let events = vec![Event {
            style_name: "Default".into(),
            start_ms: 5000,
            end_ms: 6000,
            layer: 0,
            read_order: 0,
            margin_l: 0,
            margin_r: 0,
            margin_v: 0,
            text: "hi".into(),
        }];
        let (images, _) = renderer.render_frame(&mut ctx, &track, &events, 0);
        assert!(images.is_empty());
    }
}
