// Copyright 2025 the Subcompose Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public input types: a [`Track`] of named styles plus script-wide
//! settings, and the [`Event`]s (dialogue lines) rendered against it.

pub use crate::style::Style;
use crate::style::Justify;
use std::collections::HashMap;

/// Script-wide settings and the named style table an [`Event`] resolves
/// against (spec §2 "Track").
#[derive(Clone, Debug)]
pub struct Track {
    pub play_res_x: i32,
    pub play_res_y: i32,
    /// `ScaledBorderAndShadow`: if false, border/shadow widths are in
    /// script resolution units rather than device pixels.
    pub scaled_border_and_shadow: bool,
    pub wrap_style: Justify,
    pub kerning: bool,
    /// Track-wide font scale percentage (spec §4.7 "init_font_scale");
    /// 100.0 leaves style sizes untouched.
    pub font_scale_percent: f32,
    styles: HashMap<String, Style>,
}

impl Track {
    #[must_use]
    pub fn new(play_res_x: i32, play_res_y: i32) -> Self {
        Self {
            play_res_x,
            play_res_y,
            scaled_border_and_shadow: true,
            wrap_style: Justify::SmartWrap,
            kerning: true,
            font_scale_percent: 100.0,
            styles: HashMap::new(),
        }
    }

    pub fn insert_style(&mut self, name: impl Into<String>, style: Style) {
        self.styles.insert(name.into(), style);
    }

    #[must_use]
    pub fn style(&self, name: &str) -> Option<&Style> {
        self.styles.get(name)
    }
}

/// One dialogue event: a timed, styled run of (possibly tag-annotated)
/// text (spec §2 "Event").
#[derive(Clone, Debug)]
pub struct Event {
    /// Name of the [`Track`] style this event resolves against.
    pub style_name: String,
    pub start_ms: i64,
    pub end_ms: i64,
    pub layer: i32,
    /// Read order: stable secondary sort key at equal layer (spec §4.6.1).
    pub read_order: i32,
    pub margin_l: i32,
    pub margin_r: i32,
    pub margin_v: i32,
    /// Raw text, including any `{...}` override tag blocks and drawing
    /// mode escapes (spec §4.5 phase 1/3).
    pub text: String,
}

impl Event {
    #[must_use]
    pub fn is_active_at(&self, time_ms: i64) -> bool {
        time_ms >= self.start_ms && time_ms < self.end_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_window_is_half_open() {
        let e = Event {
            style_name: "Default".into(),
            start_ms: 1000,
            end_ms: 2000,
            layer: 0,
            read_order: 0,
            margin_l: 0,
            margin_r: 0,
            margin_v: 0,
            text: String::new(),
        };
        assert!(!e.is_active_at(999));
        assert!(e.is_active_at(1000));
        assert!(e.is_active_at(1999));
        assert!(!e.is_active_at(2000));
    }

    #[test]
    fn track_style_lookup() {
        let mut t = Track::new(1920, 1080);
        t.insert_style("Default", Style::default());
        assert!(t.style("Default").is_some());
        assert!(t.style("Missing").is_none());
    }
}
