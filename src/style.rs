// Copyright 2025 the Subcompose Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Style resolution: the resolved per-run style record, its enums, and the
//! selective-override merge used when an event's style differs from its
//! track default only in the fields the tag parser actually touched
//! (spec §4.7 "handle_selective_style_overrides").

use crate::color::Color;

/// `\an`/legacy `\a` alignment (numpad layout: 1-9, plus legacy 1-11).
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Alignment {
    BottomLeft,
    BottomCenter,
    BottomRight,
    MiddleLeft,
    MiddleCenter,
    MiddleRight,
    TopLeft,
    TopCenter,
    TopRight,
}

impl Alignment {
    /// Parses the numpad form used by `\an` (1-9); legacy `\a` codes are
    /// mapped by the tag parser before reaching here.
    #[must_use]
    pub fn from_numpad(n: i32) -> Option<Self> {
        Some(match n {
            1 => Self::BottomLeft,
            2 => Self::BottomCenter,
            3 => Self::BottomRight,
            4 => Self::MiddleLeft,
            5 => Self::MiddleCenter,
            6 => Self::MiddleRight,
            7 => Self::TopLeft,
            8 => Self::TopCenter,
            9 => Self::TopRight,
            _ => return None,
        })
    }

    #[must_use]
    pub fn is_top(self) -> bool {
        matches!(self, Self::TopLeft | Self::TopCenter | Self::TopRight)
    }

    #[must_use]
    pub fn is_bottom(self) -> bool {
        matches!(self, Self::BottomLeft | Self::BottomCenter | Self::BottomRight)
    }

    #[must_use]
    pub fn is_left(self) -> bool {
        matches!(self, Self::TopLeft | Self::MiddleLeft | Self::BottomLeft)
    }

    #[must_use]
    pub fn is_right(self) -> bool {
        matches!(self, Self::TopRight | Self::MiddleRight | Self::BottomRight)
    }
}

/// `\q` wrap mode.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub enum Justify {
    #[default]
    SmartWrap,
    EndOfLineWrap,
    NoWrap,
    SmartWrapLowerLine,
}

/// `BorderStyle` field: outline+shadow (1) vs. opaque box (3).
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
pub enum BorderStyleKind {
    #[default]
    OutlineAndShadow,
    OpaqueBox,
}

/// Resolved style for a run of text: the merge of a track's named style
/// with any `\t`/inline-tag overrides the tag parser applied (spec §4.5
/// phase 3/4).
#[derive(Clone, Debug)]
pub struct Style {
    pub font_family: String,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikeout: bool,
    pub size_px: f32,
    pub scale_x: f32,
    pub scale_y: f32,
    pub spacing: f32,
    pub angle_z: f32,
    pub angle_x: f32,
    pub angle_y: f32,
    pub fax: f32,
    pub fay: f32,
    pub border_style: BorderStyleKind,
    pub border_x: f32,
    pub border_y: f32,
    pub shadow_x: f32,
    pub shadow_y: f32,
    pub alignment: Alignment,
    pub margin_l: i32,
    pub margin_r: i32,
    pub margin_v: i32,
    pub primary_color: Color,
    pub secondary_color: Color,
    pub outline_color: Color,
    pub shadow_color: Color,
    pub justify: Justify,
    /// `\blur` Gaussian blur sigma, in script pixels.
    pub blur_radius: f32,
    /// `\be` blur-edges pass count.
    pub edge_blur: i32,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            font_family: "sans-serif".to_owned(),
            bold: false,
            italic: false,
            underline: false,
            strikeout: false,
            size_px: 18.0,
            scale_x: 1.0,
            scale_y: 1.0,
            spacing: 0.0,
            angle_z: 0.0,
            angle_x: 0.0,
            angle_y: 0.0,
            fax: 0.0,
            fay: 0.0,
            border_style: BorderStyleKind::OutlineAndShadow,
            border_x: 2.0,
            border_y: 2.0,
            shadow_x: 0.0,
            shadow_y: 0.0,
            alignment: Alignment::BottomCenter,
            margin_l: 10,
            margin_r: 10,
            margin_v: 10,
            primary_color: Color::new(255, 255, 255, 255),
            secondary_color: Color::new(255, 0, 0, 255),
            outline_color: Color::new(0, 0, 0, 255),
            shadow_color: Color::new(0, 0, 0, 255),
            justify: Justify::SmartWrap,
            blur_radius: 0.0,
            edge_blur: 0,
        }
    }
}

/// Bitmask of fields an inline override touched, so
/// [`apply_selective_override`] only copies the fields actually set rather
/// than clobbering the base style wholesale.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub struct OverrideMask(u32);

impl OverrideMask {
    pub const FONT_FAMILY: Self = Self(1 << 0);
    pub const BOLD: Self = Self(1 << 1);
    pub const ITALIC: Self = Self(1 << 2);
    pub const UNDERLINE: Self = Self(1 << 3);
    pub const STRIKEOUT: Self = Self(1 << 4);
    pub const SIZE: Self = Self(1 << 5);
    pub const SCALE_X: Self = Self(1 << 6);
    pub const SCALE_Y: Self = Self(1 << 7);
    pub const SPACING: Self = Self(1 << 8);
    pub const ANGLE: Self = Self(1 << 9);
    pub const BORDER: Self = Self(1 << 10);
    pub const SHADOW: Self = Self(1 << 11);
    pub const ALIGNMENT: Self = Self(1 << 12);
    pub const PRIMARY_COLOR: Self = Self(1 << 13);
    pub const SECONDARY_COLOR: Self = Self(1 << 14);
    pub const OUTLINE_COLOR: Self = Self(1 << 15);
    pub const SHADOW_COLOR: Self = Self(1 << 16);
    pub const JUSTIFY: Self = Self(1 << 17);
    pub const MARGINS: Self = Self(1 << 18);
    pub const BLUR: Self = Self(1 << 19);

    #[must_use]
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn set(&mut self, field: Self) {
        self.0 |= field.0;
    }
}

impl std::ops::BitOr for OverrideMask {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Applies `overlay`'s fields onto a clone of `base`, restricted to the
/// fields flagged in `mask` (spec §4.7: a selective, not wholesale, merge,
/// so `\t` animations and other partial overrides don't reset unrelated
/// style fields back to the named style's defaults).
#[must_use]
pub fn apply_selective_override(base: &Style, overlay: &Style, mask: OverrideMask) -> Style {
    let mut out = base.clone();
    if mask.contains(OverrideMask::FONT_FAMILY) {
        out.font_family = overlay.font_family.clone();
    }
    if mask.contains(OverrideMask::BOLD) {
        out.bold = overlay.bold;
    }
    if mask.contains(OverrideMask::ITALIC) {
        out.italic = overlay.italic;
    }
    if mask.contains(OverrideMask::UNDERLINE) {
        out.underline = overlay.underline;
    }
    if mask.contains(OverrideMask::STRIKEOUT) {
        out.strikeout = overlay.strikeout;
    }
    if mask.contains(OverrideMask::SIZE) {
        out.size_px = overlay.size_px;
    }
    if mask.contains(OverrideMask::SCALE_X) {
        out.scale_x = overlay.scale_x;
    }
    if mask.contains(OverrideMask::SCALE_Y) {
        out.scale_y = overlay.scale_y;
    }
    if mask.contains(OverrideMask::SPACING) {
        out.spacing = overlay.spacing;
    }
    if mask.contains(OverrideMask::ANGLE) {
        out.angle_z = overlay.angle_z;
        out.angle_x = overlay.angle_x;
        out.angle_y = overlay.angle_y;
        out.fax = overlay.fax;
        out.fay = overlay.fay;
    }
    if mask.contains(OverrideMask::BORDER) {
        out.border_x = overlay.border_x;
        out.border_y = overlay.border_y;
    }
    if mask.contains(OverrideMask::SHADOW) {
        out.shadow_x = overlay.shadow_x;
        out.shadow_y = overlay.shadow_y;
    }
    if mask.contains(OverrideMask::ALIGNMENT) {
        out.alignment = overlay.alignment;
    }
    if mask.contains(OverrideMask::PRIMARY_COLOR) {
        out.primary_color = overlay.primary_color;
    }
    if mask.contains(OverrideMask::SECONDARY_COLOR) {
        out.secondary_color = overlay.secondary_color;
    }
    if mask.contains(OverrideMask::OUTLINE_COLOR) {
        out.outline_color = overlay.outline_color;
    }
    if mask.contains(OverrideMask::SHADOW_COLOR) {
        out.shadow_color = overlay.shadow_color;
    }
    if mask.contains(OverrideMask::JUSTIFY) {
        out.justify = overlay.justify;
    }
    if mask.contains(OverrideMask::MARGINS) {
        out.margin_l = overlay.margin_l;
        out.margin_r = overlay.margin_r;
        out.margin_v = overlay.margin_v;
    }
    if mask.contains(OverrideMask::BLUR) {
        out.blur_radius = overlay.blur_radius;
        out.edge_blur = overlay.edge_blur;
    }
    out
}

/// Linearly interpolates the numeric/color fields of a `\t` transition;
/// discrete fields (font family, flags, alignment, justify, border style,
/// edge blur) snap to `to` once `t` crosses the halfway point rather than
/// tweening, matching the common renderer behavior for non-numeric style
/// fields.
#[must_use]
pub fn lerp_style(from: &Style, to: &Style, t: f32) -> Style {
    let t = t.clamp(0.0, 1.0);
    let lerp = |a: f32, b: f32| a + (b - a) * t;
    let snap = t >= 0.5;
    Style {
        font_family: if snap { to.font_family.clone() } else { from.font_family.clone() },
        bold: if snap { to.bold } else { from.bold },
        italic: if snap { to.italic } else { from.italic },
        underline: if snap { to.underline } else { from.underline },
        strikeout: if snap { to.strikeout } else { from.strikeout },
        size_px: lerp(from.size_px, to.size_px),
        scale_x: lerp(from.scale_x, to.scale_x),
        scale_y: lerp(from.scale_y, to.scale_y),
        spacing: lerp(from.spacing, to.spacing),
        angle_z: lerp(from.angle_z, to.angle_z),
        angle_x: lerp(from.angle_x, to.angle_x),
        angle_y: lerp(from.angle_y, to.angle_y),
        fax: lerp(from.fax, to.fax),
        fay: lerp(from.fay, to.fay),
        border_style: if snap { to.border_style } else { from.border_style },
        border_x: lerp(from.border_x, to.border_x),
        border_y: lerp(from.border_y, to.border_y),
        shadow_x: lerp(from.shadow_x, to.shadow_x),
        shadow_y: lerp(from.shadow_y, to.shadow_y),
        alignment: if snap { to.alignment } else { from.alignment },
        margin_l: if snap { to.margin_l } else { from.margin_l },
        margin_r: if snap { to.margin_r } else { from.margin_r },
        margin_v: if snap { to.margin_v } else { from.margin_v },
        primary_color: from.primary_color.lerp(to.primary_color, t),
        secondary_color: from.secondary_color.lerp(to.secondary_color, t),
        outline_color: from.outline_color.lerp(to.outline_color, t),
        shadow_color: from.shadow_color.lerp(to.shadow_color, t),
        justify: if snap { to.justify } else { from.justify },
        blur_radius: lerp(from.blur_radius, to.blur_radius),
        edge_blur: if snap { to.edge_blur } else { from.edge_blur },
    }
}

/// Derives the effective font scale (spec §4.7 "init_font_scale"): the
/// style's own size combined with a track-wide scale percentage, so a
/// single track-level knob can rescale every event without editing styles.
#[must_use]
pub fn init_font_scale(style_size_px: f32, track_scale_percent: f32) -> f32 {
    style_size_px * (track_scale_percent / 100.0).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selective_override_only_touches_masked_fields() {
        let base = Style { font_family: "Arial".into(), bold: false, ..Style::default() };
        let overlay = Style { font_family: "Comic Sans".into(), bold: true, italic: true, ..Style::default() };
        let mut mask = OverrideMask::default();
        mask.set(OverrideMask::BOLD);
        let merged = apply_selective_override(&base, &overlay, mask);
        assert!(merged.bold);
        assert!(!merged.italic);
        assert_eq!(merged.font_family, "Arial");
    }

    #[test]
    fn font_scale_zero_percent_clamped() {
        assert_eq!(init_font_scale(20.0, -10.0), 0.0);
        assert_eq!(init_font_scale(20.0, 200.0), 40.0);
    }

    #[test]
    fn alignment_numpad_roundtrip() {
        assert_eq!(Alignment::from_numpad(5), Some(Alignment::MiddleCenter));
        assert!(Alignment::from_numpad(0).is_none());
    }
}
