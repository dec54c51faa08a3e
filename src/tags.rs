// Copyright 2025 the Subcompose Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Override-tag parsing (spec §4.5 phase 3): walks an event's raw text,
//! splitting `{...}` blocks from plain text and mutating a
//! [`RenderState`] as each tag is applied, producing a sequence of
//! [`TaggedRun`]s the shaping phase consumes one at a time.

use crate::color::Color;
use crate::render_state::{ClipMode, Fade, KaraokeMode, Movement, RenderState, Transition};
use crate::style::{Alignment, Justify};

/// One contiguous run of plain text plus the render state in effect while
/// it is shaped and rendered.
#[derive(Clone, Debug)]
pub struct TaggedRun {
    pub text: String,
    pub state: RenderState,
    /// Set when this run is drawing-mode vector data (`\p1` and up)
    /// rather than shaped text.
    pub is_drawing: bool,
}

/// Parses `text` against `base` (the event's resolved named style),
/// resolving `\r` (style reset, optionally to a named style via
/// `lookup_style`) and every tag documented in spec §4.5/§11.
pub fn parse_event_text(text: &str, base: &crate::style::Style, lookup_style: impl Fn(&str) -> Option<crate::style::Style>) -> Vec<TaggedRun> {
    let mut state = RenderState::new(base.clone());
    let mut runs = Vec::new();
    let mut plain = String::new();
    let mut drawing_mode = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '{' {
            if !plain.is_empty() {
                runs.push(TaggedRun { text: std::mem::take(&mut plain), state: state.clone(), is_drawing: drawing_mode });
            }
            let mut block = String::new();
            for c2 in chars.by_ref() {
                if c2 == '}' {
                    break;
                }
                block.push(c2);
            }
            apply_tags(&block, &mut state, base, &lookup_style, &mut drawing_mode);
        } else {
            plain.push(c);
        }
    }
    if !plain.is_empty() {
        runs.push(TaggedRun { text: plain, state, is_drawing: drawing_mode });
    }
    runs
}

fn apply_tags(
    block: &str,
    state: &mut RenderState,
    base_style: &crate::style::Style,
    lookup_style: &impl Fn(&str) -> Option<crate::style::Style>,
    drawing_mode: &mut bool,
) {
    for tag in split_tags(block) {
        apply_one_tag(&tag, state, base_style, lookup_style, drawing_mode);
    }
}

/// Splits a `{...}` block's contents into individual `\tag(args)` pieces,
/// respecting parenthesis nesting (`\move(...)`, `\clip(...)`, ...).
fn split_tags(block: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut depth = 0i32;
    let mut cur = String::new();
    for c in block.chars() {
        match c {
            '\\' if depth == 0 => {
                if !cur.is_empty() {
                    out.push(std::mem::take(&mut cur));
                }
                cur.push(c);
            }
            '(' => {
                depth += 1;
                cur.push(c);
            }
            ')' => {
                depth -= 1;
                cur.push(c);
            }
            _ => cur.push(c),
        }
    }
    if !cur.is_empty() {
        out.push(cur);
    }
    out
}

fn apply_one_tag(
    tag: &str,
    state: &mut RenderState,
    base_style: &crate::style::Style,
    lookup_style: &impl Fn(&str) -> Option<crate::style::Style>,
    drawing_mode: &mut bool,
) {
    let tag = tag.trim_start_matches('\\');
    let (name, rest) = split_name(tag);
    match name {
        "b" => state.style.bold = flag(rest),
        "i" => state.style.italic = flag(rest),
        "u" => state.style.underline = flag(rest),
        "s" => state.style.strikeout = flag(rest),
        "fn" => {
            let family = rest.trim();
            if !family.is_empty() {
                state.style.font_family = family.to_owned();
            }
        }
        "fs" => {
            if let Ok(v) = rest.parse::<f32>() {
                state.style.size_px = v;
            }
        }
        "fsp" => {
            if let Ok(v) = rest.parse::<f32>() {
                state.style.spacing = v;
            }
        }
        "fscx" => {
            if let Ok(v) = rest.parse::<f32>() {
                state.style.scale_x = v / 100.0;
            }
        }
        "fscy" => {
            if let Ok(v) = rest.parse::<f32>() {
                state.style.scale_y = v / 100.0;
            }
        }
        "frz" | "fr" => {
            if let Ok(v) = rest.parse::<f32>() {
                state.style.angle_z = v;
            }
        }
        "frx" => {
            if let Ok(v) = rest.parse::<f32>() {
                state.style.angle_x = v;
            }
        }
        "fry" => {
            if let Ok(v) = rest.parse::<f32>() {
                state.style.angle_y = v;
            }
        }
        "fax" => assign(&mut state.style.fax, rest),
        "fay" => assign(&mut state.style.fay, rest),
        "bord" => set_both(&mut state.style.border_x, &mut state.style.border_y, rest),
        "xbord" => assign(&mut state.style.border_x, rest),
        "ybord" => assign(&mut state.style.border_y, rest),
        "shad" => set_both(&mut state.style.shadow_x, &mut state.style.shadow_y, rest),
        "xshad" => assign(&mut state.style.shadow_x, rest),
        "yshad" => assign(&mut state.style.shadow_y, rest),
        "blur" => assign(&mut state.style.blur_radius, rest),
        "be" => {
            if let Ok(v) = rest.trim().parse::<i32>() {
                state.style.edge_blur = v;
            }
        }
        "an" => {
            if let Ok(v) = rest.parse::<i32>() {
                if let Some(a) = Alignment::from_numpad(v) {
                    state.style.alignment = a;
                }
            }
        }
        "a" => {
            if let Ok(v) = rest.parse::<i32>() {
                if let Some(a) = legacy_alignment(v) {
                    state.style.alignment = a;
                }
            }
        }
        "q" => {
            state.style.justify = match rest.trim() {
                "1" => Justify::EndOfLineWrap,
                "2" => Justify::NoWrap,
                "3" => Justify::SmartWrapLowerLine,
                _ => Justify::SmartWrap,
            };
        }
        "pos" => {
            if let Some((x, y)) = parse_pair(rest) {
                state.position.pos = Some((x, y));
            }
        }
        "org" => {
            if let Some((x, y)) = parse_pair(rest) {
                state.position.rotation_origin = Some((x, y));
            }
        }
        "move" => {
            if let Some(m) = parse_move(rest) {
                state.position.movement = Some(m);
            }
        }
        "clip" => state.clip = parse_clip(rest, false),
        "iclip" => state.clip = parse_clip(rest, true),
        "k" => start_karaoke(state, KaraokeMode::Sweep, rest),
        "kf" | "K" => start_karaoke(state, KaraokeMode::Fill, rest),
        "ko" => start_karaoke(state, KaraokeMode::Outline, rest),
        "fad" => {
            if let Some((fade_in, fade_out)) = parse_two_i64(rest) {
                state.fade = Some(Fade { start_ms: 0, fade_in_end_ms: fade_in, fade_out_start_ms: -fade_out, end_ms: i64::MAX });
            }
        }
        "fade" => {
            // \fade(a1,a2,a3,t1,t2,t3,t4): simplified to the two crossover
            // timestamps bounding full opacity, matching \fad's shape.
            let nums = parse_args(rest);
            if nums.len() >= 7 {
                state.fade = Some(Fade {
                    start_ms: nums[3] as i64,
                    fade_in_end_ms: nums[4] as i64,
                    fade_out_start_ms: nums[5] as i64,
                    end_ms: nums[6] as i64,
                });
            }
        }
        "c" | "1c" => assign_color_rgb(&mut state.style.primary_color, rest),
        "2c" => assign_color_rgb(&mut state.style.secondary_color, rest),
        "3c" => assign_color_rgb(&mut state.style.outline_color, rest),
        "4c" => assign_color_rgb(&mut state.style.shadow_color, rest),
        "alpha" => {
            if let Some(a) = parse_alpha(rest) {
                state.style.primary_color.a = a;
                state.style.secondary_color.a = a;
                state.style.outline_color.a = a;
                state.style.shadow_color.a = a;
            }
        }
        "1a" => {
            if let Some(a) = parse_alpha(rest) {
                state.style.primary_color.a = a;
            }
        }
        "2a" => {
            if let Some(a) = parse_alpha(rest) {
                state.style.secondary_color.a = a;
            }
        }
        "3a" => {
            if let Some(a) = parse_alpha(rest) {
                state.style.outline_color.a = a;
            }
        }
        "4a" => {
            if let Some(a) = parse_alpha(rest) {
                state.style.shadow_color.a = a;
            }
        }
        "r" => {
            let target = rest.trim();
            state.style = if target.is_empty() { base_style.clone() } else { lookup_style(target).unwrap_or_else(|| base_style.clone()) };
        }
        "t" => parse_transition(rest, state, base_style, lookup_style, drawing_mode),
        "p" => {
            if let Ok(v) = rest.parse::<i32>() {
                *drawing_mode = v > 0;
                state.drawing_scale = if v > 0 { Some(v) } else { None };
            }
        }
        "pbo" => {}
        _ => {}
    }
}

fn split_name(tag: &str) -> (&str, &str) {
    let idx = tag.find(|c: char| !c.is_ascii_alphabetic()).unwrap_or(tag.len());
    tag.split_at(idx)
}

fn flag(rest: &str) -> bool {
    rest.trim() != "0"
}

fn assign(field: &mut f32, rest: &str) {
    if let Ok(v) = rest.trim().parse::<f32>() {
        *field = v;
    }
}

fn set_both(x: &mut f32, y: &mut f32, rest: &str) {
    if let Ok(v) = rest.trim().parse::<f32>() {
        *x = v;
        *y = v;
    }
}

fn strip_parens(rest: &str) -> &str {
    rest.trim().trim_start_matches('(').trim_end_matches(')')
}

fn parse_args(rest: &str) -> Vec<f32> {
    strip_parens(rest).split(',').filter_map(|s| s.trim().parse::<f32>().ok()).collect()
}

fn parse_pair(rest: &str) -> Option<(f32, f32)> {
    let nums = parse_args(rest);
    if nums.len() >= 2 {
        Some((nums[0], nums[1]))
    } else {
        None
    }
}

fn parse_two_i64(rest: &str) -> Option<(i64, i64)> {
    let nums = parse_args(rest);
    if nums.len() >= 2 {
        Some((nums[0] as i64, nums[1] as i64))
    } else {
        None
    }
}

fn parse_move(rest: &str) -> Option<Movement> {
    let nums = parse_args(rest);
    if nums.len() < 4 {
        return None;
    }
    let (start_ms, end_ms) = if nums.len() >= 6 { (nums[4] as i64, nums[5] as i64) } else { (0, 0) };
    Some(Movement { from: (nums[0], nums[1]), to: (nums[2], nums[3]), start_ms, end_ms })
}

/// `\t([t1,t2,][accel,]tags)`: snapshots the style before and after applying
/// `tags` to a scratch state, and records the window to interpolate
/// between them (spec §11 supplemental). `t1`/`t2` are event-relative; a
/// negative `end_ms` marks "unspecified", resolved against the event's
/// duration in [`RenderState::resolve_transitions`].
fn parse_transition(
    rest: &str,
    state: &mut RenderState,
    base_style: &crate::style::Style,
    lookup_style: &impl Fn(&str) -> Option<crate::style::Style>,
    drawing_mode: &mut bool,
) {
    let inner = strip_parens(rest);
    let parts = split_t_args(inner);
    let (start_ms, end_ms, accel, tags_str) = match parts.len() {
        0 => return,
        1 => (0, -1, 1.0, parts[0].as_str()),
        2 => (0, -1, parts[0].trim().parse::<f32>().unwrap_or(1.0), parts[1].as_str()),
        3 => (parts[0].trim().parse::<i64>().unwrap_or(0), parts[1].trim().parse::<i64>().unwrap_or(-1), 1.0, parts[2].as_str()),
        _ => (
            parts[0].trim().parse::<i64>().unwrap_or(0),
            parts[1].trim().parse::<i64>().unwrap_or(-1),
            parts[2].trim().parse::<f32>().unwrap_or(1.0),
            parts[3].as_str(),
        ),
    };
    let before = state.style.clone();
    let mut scratch = state.clone();
    let mut scratch_drawing = *drawing_mode;
    apply_tags(tags_str, &mut scratch, base_style, lookup_style, &mut scratch_drawing);
    state.transitions.push(Transition { start_ms, end_ms, accel, before, after: scratch.style });
}

/// Splits `\t`'s argument list on up to its first three top-level commas
/// (`t1`, `t2`, `accel`), leaving the remainder — the inner tag string,
/// which may itself contain parenthesized commas — intact as the last part.
fn split_t_args(inner: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut cur = String::new();
    let mut splits = 0;
    for c in inner.chars() {
        if depth == 0 && c == ',' && splits < 3 {
            parts.push(std::mem::take(&mut cur));
            splits += 1;
            continue;
        }
        match c {
            '(' => depth += 1,
            ')' => depth -= 1,
            _ => {}
        }
        cur.push(c);
    }
    parts.push(cur);
    parts
}

fn parse_clip(rest: &str, inverse: bool) -> ClipMode {
    let inner = strip_parens(rest);
    let nums = parse_args(rest);
    if nums.len() == 4 {
        ClipMode::Rect { x0: nums[0], y0: nums[1], x1: nums[2], y1: nums[3], inverse }
    } else if !inner.trim().is_empty() {
        // `\clip(scale, commands)` or `\clip(commands)`: take the last
        // comma-separated piece as the drawing command string.
        let (scale, commands) = match inner.split_once(',') {
            Some((s, rest)) if s.trim().parse::<i32>().is_ok() && rest.contains(|c: char| c.is_ascii_alphabetic()) => {
                (s.trim().parse::<i32>().unwrap_or(1), rest.to_owned())
            }
            _ => (1, inner.to_owned()),
        };
        ClipMode::Vector { commands, scale: 2f32.powi(scale), inverse }
    } else {
        ClipMode::None
    }
}

fn start_karaoke(state: &mut RenderState, mode: KaraokeMode, rest: &str) {
    state.karaoke = mode;
    if let Ok(centiseconds) = strip_parens(rest).trim().parse::<i64>() {
        state.karaoke_syllable_dur_ms = centiseconds * 10;
    }
}

fn legacy_alignment(code: i32) -> Option<Alignment> {
    // Legacy \a: 1-3 bottom, 5-7 top (skipping 4), 9-11 middle (skipping 8).
    Some(match code {
        1 => Alignment::BottomLeft,
        2 => Alignment::BottomCenter,
        3 => Alignment::BottomRight,
        5 => Alignment::TopLeft,
        6 => Alignment::TopCenter,
        7 => Alignment::TopRight,
        9 => Alignment::MiddleLeft,
        10 => Alignment::MiddleCenter,
        11 => Alignment::MiddleRight,
        _ => return None,
    })
}

fn parse_color_hex(rest: &str) -> Option<Color> {
    let s = strip_parens(rest).trim();
    let hex = s.strip_prefix("&H").or_else(|| s.strip_prefix("&h"))?;
    let hex = hex.trim_end_matches('&');
    let v = u32::from_str_radix(hex, 16).ok()?;
    // ASS stores colors as &HAABBGGRR.
    let b = ((v >> 16) & 0xFF) as u8;
    let g = ((v >> 8) & 0xFF) as u8;
    let r = (v & 0xFF) as u8;
    let a = ((v >> 24) & 0xFF) as u8;
    Some(Color { r, g, b, a })
}

fn assign_color_rgb(field: &mut Color, rest: &str) {
    if let Some(c) = parse_color_hex(rest) {
        field.r = c.r;
        field.g = c.g;
        field.b = c.b;
    }
}

fn parse_alpha(rest: &str) -> Option<u8> {
    parse_color_hex(rest).map(|c| c.a).or_else(|| {
        let s = strip_parens(rest).trim();
        let hex = s.strip_prefix("&H").or_else(|| s.strip_prefix("&h"))?;
        let hex = hex.trim_end_matches('&');
        u8::from_str_radix(hex, 16).ok()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::Style;

    #[test]
    fn plain_text_is_single_run() {
        let runs = parse_event_text("hello world", &Style::default(), |_| None);
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].text, "hello world");
    }

    #[test]
    fn bold_tag_splits_runs_and_mutates_state() {
        let runs = parse_event_text("a{\\b1}b", &Style::default(), |_| None);
        assert_eq!(runs.len(), 2);
        assert!(!runs[0].state.style.bold);
        assert!(runs[1].state.style.bold);
    }

    #[test]
    fn pos_tag_sets_position_override() {
        let runs = parse_event_text("{\\pos(100,200)}x", &Style::default(), |_| None);
        assert_eq!(runs[0].state.position.pos, Some((100.0, 200.0)));
    }

    #[test]
    fn reset_tag_restores_base_style() {
        let runs = parse_event_text("{\\b1}a{\\r}b", &Style::default(), |_| None);
        assert!(runs[0].state.style.bold);
        assert!(!runs[1].state.style.bold);
    }

    #[test]
    fn color_tag_parses_bgr_hex() {
        let runs = parse_event_text("{\\c&H0000FF&}x", &Style::default(), |_| None);
        let c = runs[0].state.style.primary_color;
        assert_eq!((c.r, c.g, c.b), (255, 0, 0));
    }

    #[test]
    fn karaoke_tag_records_duration() {
        let runs = parse_event_text("{\\k50}hi", &Style::default(), |_| None);
        assert_eq!(runs[0].state.karaoke_syllable_dur_ms, 500);
        assert_eq!(runs[0].state.karaoke, KaraokeMode::Sweep);
    }

    #[test]
    fn unknown_tag_is_ignored_without_panicking() {
        let runs = parse_event_text("{\\qqzz}ok", &Style::default(), |_| None);
        assert_eq!(runs[0].text, "ok");
    }

    #[test]
    fn blur_tag_sets_blur_radius() {
        let runs = parse_event_text("{\\blur2.5}x", &Style::default(), |_| None);
        assert_eq!(runs[0].state.style.blur_radius, 2.5);
    }

    #[test]
    fn be_tag_sets_edge_blur() {
        let runs = parse_event_text("{\\be2}x", &Style::default(), |_| None);
        assert_eq!(runs[0].state.style.edge_blur, 2);
    }

    #[test]
    fn fax_fay_tags_set_shear_fields() {
        let runs = parse_event_text("{\\fax0.5\\fay-0.25}x", &Style::default(), |_| None);
        assert_eq!(runs[0].state.style.fax, 0.5);
        assert_eq!(runs[0].state.style.fay, -0.25);
    }

    #[test]
    fn t_tag_with_two_args_records_transition_window() {
        let runs = parse_event_text("{\\t(500,1000,\\fs20)}x", &Style::default(), |_| None);
        let t = &runs[0].state.transitions[0];
        assert_eq!(t.start_ms, 500);
        assert_eq!(t.end_ms, 1000);
        assert_eq!(t.after.size_px, 20.0);
    }

    #[test]
    fn t_tag_with_one_arg_defaults_window_to_whole_event() {
        let runs = parse_event_text("{\\t(\\fs20)}x", &Style::default(), |_| None);
        let t = &runs[0].state.transitions[0];
        assert_eq!(t.start_ms, 0);
        assert_eq!(t.end_ms, -1);
    }

    #[test]
    fn t_tag_interpolates_style_mid_window() {
        let mut style = Style::default();
        style.size_px = 10.0;
        let runs = parse_event_text("{\\t(0,1000,\\fs20)}x", &style, |_| None);
        let mut state = runs[0].state.clone();
        state.resolve_transitions(500, 1000);
        assert!((state.style.size_px - 15.0).abs() < 1e-3);
    }
}
