// Copyright 2025 the Subcompose Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Mutable per-event render state (spec §4.5 "init render state", phase 2):
//! the accumulator the tag parser (phase 3) mutates as it walks an event's
//! text, and that later phases read to decide fonts, colors, positions,
//! and clip regions.

use crate::style::{lerp_style, Style};

/// `\k`/`\K`/`\kf`/`\ko` karaoke mode for the current run.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub enum KaraokeMode {
    #[default]
    None,
    /// `\k`: instantaneous color swap at the syllable boundary.
    Sweep,
    /// `\kf`/`\K`: color sweeps across the syllable over its duration.
    Fill,
    /// `\ko`: outline-only sweep.
    Outline,
}

/// Rectangular or vector `\clip`/`\iclip` region (spec §11 supplemental).
#[derive(Clone, Debug)]
pub enum ClipMode {
    None,
    /// Inclusive device-space rectangle; points outside are dropped.
    Rect { x0: f32, y0: f32, x1: f32, y1: f32, inverse: bool },
    /// Drawing-mode vector clip, in script coordinates.
    Vector { commands: String, scale: f32, inverse: bool },
}

impl Default for ClipMode {
    fn default() -> Self {
        Self::None
    }
}

/// `\pos`/`\move`/`\org` explicit positioning, overriding alignment-based
/// placement (spec §4.5 phase 3 / §4.7).
#[derive(Clone, Debug, Default)]
pub struct PositionOverride {
    pub pos: Option<(f32, f32)>,
    pub movement: Option<Movement>,
    pub rotation_origin: Option<(f32, f32)>,
}

#[derive(Copy, Clone, Debug)]
pub struct Movement {
    pub from: (f32, f32),
    pub to: (f32, f32),
    pub start_ms: i64,
    pub end_ms: i64,
}

/// Per-event mutable state threaded through the pipeline phases.
#[derive(Clone, Debug, Default)]
pub struct RenderState {
    pub style: Style,
    pub karaoke: KaraokeMode,
    pub karaoke_syllable_start_ms: i64,
    pub karaoke_syllable_dur_ms: i64,
    pub clip: ClipMode,
    pub position: PositionOverride,
    pub drawing_scale: Option<i32>,
    /// `\fad`/`\fade`: alpha fade-in/out window applied at composite time.
    pub fade: Option<Fade>,
    pub wrap_disabled_this_run: bool,
    /// `\t` animated transitions pending resolution against the current
    /// render time (spec §11 supplemental).
    pub transitions: Vec<Transition>,
}

/// `\t(start,end,accel,tags)`: interpolates from the style in effect when
/// the tag was parsed (`before`) to the style produced by applying its
/// inner tags (`after`), over `[start_ms, end_ms]` relative to the event's
/// start.
#[derive(Clone, Debug)]
pub struct Transition {
    pub start_ms: i64,
    pub end_ms: i64,
    pub accel: f32,
    pub before: Style,
    pub after: Style,
}

impl Transition {
    /// Style at event-relative `rel_time_ms`, snapping to `before`/`after`
    /// outside the window and applying the `accel` power-law easing inside
    /// it. A negative `end_ms` (t2 omitted from the tag) is resolved
    /// against `event_duration_ms`.
    #[must_use]
    pub fn style_at(&self, rel_time_ms: i64, event_duration_ms: i64) -> Style {
        let end_ms = if self.end_ms < 0 { event_duration_ms } else { self.end_ms };
        if end_ms <= self.start_ms || rel_time_ms <= self.start_ms {
            return self.before.clone();
        }
        if rel_time_ms >= end_ms {
            return self.after.clone();
        }
        let t = (rel_time_ms - self.start_ms) as f32 / (end_ms - self.start_ms) as f32;
        let accel = if self.accel > 0.0 { self.accel } else { 1.0 };
        lerp_style(&self.before, &self.after, t.clamp(0.0, 1.0).powf(accel))
    }
}

#[derive(Copy, Clone, Debug)]
pub struct Fade {
    pub start_ms: i64,
    pub fade_in_end_ms: i64,
    pub fade_out_start_ms: i64,
    pub end_ms: i64,
}

impl Fade {
    /// Linear alpha multiplier `[0.0, 1.0]` at `time_ms` within the fade
    /// window; outside the window, fully transparent.
    #[must_use]
    pub fn alpha_at(&self, time_ms: i64) -> f32 {
        if time_ms < self.start_ms || time_ms > self.end_ms {
            return 0.0;
        }
        if time_ms < self.fade_in_end_ms && self.fade_in_end_ms > self.start_ms {
            let t = (time_ms - self.start_ms) as f32 / (self.fade_in_end_ms - self.start_ms) as f32;
            return t.clamp(0.0, 1.0);
        }
        if time_ms > self.fade_out_start_ms && self.end_ms > self.fade_out_start_ms {
            let t = (self.end_ms - time_ms) as f32 / (self.end_ms - self.fade_out_start_ms) as f32;
            return t.clamp(0.0, 1.0);
        }
        1.0
    }
}

impl RenderState {
    #[must_use]
    pub fn new(style: Style) -> Self {
        Self { style, ..Default::default() }
    }

    /// Applies every pending `\t` transition in order, so a later tag wins
    /// where two transitions' windows overlap (spec §11 supplemental).
    pub fn resolve_transitions(&mut self, rel_time_ms: i64, event_duration_ms: i64) {
        for t in &self.transitions {
            self.style = t.style_at(rel_time_ms, event_duration_ms);
        }
    }
}

/// Resolved per-glyph placement info (opt-in `glyph_info` API, spec §11
/// supplemental): exposes layout results without forcing a full raster.
#[derive(Clone, Debug)]
pub struct GlyphInfo {
    pub text_byte_offset: usize,
    pub advance: f32,
    pub pen_x: f32,
    pub pen_y: f32,
    pub bidi_level: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fade_outside_window_is_transparent() {
        let f = Fade { start_ms: 0, fade_in_end_ms: 100, fade_out_start_ms: 900, end_ms: 1000 };
        assert_eq!(f.alpha_at(-1), 0.0);
        assert_eq!(f.alpha_at(1001), 0.0);
    }

    #[test]
    fn fade_is_opaque_in_the_middle() {
        let f = Fade { start_ms: 0, fade_in_end_ms: 100, fade_out_start_ms: 900, end_ms: 1000 };
        assert_eq!(f.alpha_at(500), 1.0);
    }

    #[test]
    fn fade_ramps_linearly() {
        let f = Fade { start_ms: 0, fade_in_end_ms: 100, fade_out_start_ms: 900, end_ms: 1000 };
        assert!((f.alpha_at(50) - 0.5).abs() < 1e-3);
    }

    fn style_with_size(px: f32) -> Style {
        Style { size_px: px, ..Style::default() }
    }

    #[test]
    fn transition_snaps_to_before_and_after_outside_window() {
        let t = Transition { start_ms: 100, end_ms: 200, accel: 1.0, before: style_with_size(10.0), after: style_with_size(20.0) };
        assert_eq!(t.style_at(0, 1000).size_px, 10.0);
        assert_eq!(t.style_at(1000, 1000).size_px, 20.0);
    }

    #[test]
    fn transition_with_unspecified_end_resolves_against_event_duration() {
        let t = Transition { start_ms: 0, end_ms: -1, accel: 1.0, before: style_with_size(0.0), after: style_with_size(100.0) };
        assert_eq!(t.style_at(500, 1000).size_px, 50.0);
    }

    #[test]
    fn resolve_transitions_applies_last_overlapping_transition() {
        let mut state = RenderState::new(style_with_size(0.0));
        state.transitions.push(Transition { start_ms: 0, end_ms: 1000, accel: 1.0, before: style_with_size(0.0), after: style_with_size(10.0) });
        state.transitions.push(Transition { start_ms: 0, end_ms: 1000, accel: 1.0, before: style_with_size(0.0), after: style_with_size(100.0) });
        state.resolve_transitions(1000, 1000);
        assert_eq!(state.style.size_px, 100.0);
    }
}
