// Copyright 2025 the Subcompose Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Script-to-screen coordinate mapping (C7, spec §4.7): the
//! `x2scr`/`y2scr` family, mapping a track's `PlayResX`/`PlayResY` script
//! coordinate space onto the caller's requested frame dimensions.

/// Precomputed script→screen scale/offset for one frame size, so every
/// event rendered against the same frame reuses the same mapping instead
/// of recomputing it per coordinate.
#[derive(Copy, Clone, Debug)]
pub struct ScreenMapping {
    scale_x: f32,
    scale_y: f32,
    /// Letterbox/pillarbox offset applied after scaling, when the frame's
    /// aspect ratio differs from the script's and the caller wants the
    /// script's coordinate space letterboxed rather than stretched.
    offset_x: f32,
    offset_y: f32,
}

impl ScreenMapping {
    /// `keep_aspect = false` stretches independently on each axis (the
    /// common case); `true` uniform-scales and letterboxes, matching
    /// players that avoid distorting subtitles on mismatched aspect video.
    #[must_use]
    pub fn new(play_res_x: i32, play_res_y: i32, frame_w: i32, frame_h: i32, keep_aspect: bool) -> Self {
        let rx = frame_w as f32 / play_res_x.max(1) as f32;
        let ry = frame_h as f32 / play_res_y.max(1) as f32;
        if keep_aspect {
            let s = rx.min(ry);
            let offset_x = (frame_w as f32 - play_res_x as f32 * s) * 0.5;
            let offset_y = (frame_h as f32 - play_res_y as f32 * s) * 0.5;
            Self { scale_x: s, scale_y: s, offset_x, offset_y }
        } else {
            Self { scale_x: rx, scale_y: ry, offset_x: 0.0, offset_y: 0.0 }
        }
    }

    #[must_use]
    pub fn x2scr(&self, x: f32) -> f32 {
        x * self.scale_x + self.offset_x
    }

    #[must_use]
    pub fn y2scr(&self, y: f32) -> f32 {
        y * self.scale_y + self.offset_y
    }

    /// Inverse of [`Self::x2scr`], used when a `\pos`/`\move` override
    /// tag's coordinates must round-trip through screen space for clipping.
    #[must_use]
    pub fn scr2x(&self, x: f32) -> f32 {
        (x - self.offset_x) / self.scale_x
    }

    #[must_use]
    pub fn scr2y(&self, y: f32) -> f32 {
        (y - self.offset_y) / self.scale_y
    }

    #[must_use]
    pub fn scale_x(&self) -> f32 {
        self.scale_x
    }

    #[must_use]
    pub fn scale_y(&self) -> f32 {
        self.scale_y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stretch_maps_corners_exactly() {
        let m = ScreenMapping::new(384, 288, 1920, 1080, false);
        assert!((m.x2scr(384.0) - 1920.0).abs() < 1e-3);
        assert!((m.y2scr(288.0) - 1080.0).abs() < 1e-3);
    }

    #[test]
    fn keep_aspect_letterboxes() {
        let m = ScreenMapping::new(384, 288, 1920, 1080, true);
        // 384x288 is 4:3; 1920x1080 is 16:9, so height-limited.
        assert!((m.scale_x() - m.scale_y()).abs() < 1e-6);
        assert!(m.x2scr(0.0) > 0.0);
    }

    #[test]
    fn scr_roundtrips_x2scr() {
        let m = ScreenMapping::new(640, 480, 1280, 720, false);
        let x = 123.4;
        assert!((m.scr2x(m.x2scr(x)) - x).abs() < 1e-3);
    }
}
