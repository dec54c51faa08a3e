// Copyright 2025 the Subcompose Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Inline drawing-mode command parser (spec §4.3 "Drawing"): turns a
//! string of `m/n/l/b/s/p/c` operations into a [`Polyline`]. Used for the
//! "object replacement" (U+FFFC) cluster produced when the tag parser
//! (spec §4.5 phase 3) enters drawing mode.

use crate::outline::{Polyline, SegmentTag};
use glam::Vec2;

/// Parses an ASS-style drawing command string. Unknown tokens and
/// malformed coordinate pairs are skipped rather than aborting the whole
/// outline, matching the "degraded, not failed" posture of cache
/// construction elsewhere in the pipeline.
#[must_use]
pub fn parse_drawing(commands: &str, scale: f32) -> Polyline {
    let mut tokens = commands.split_whitespace().peekable();
    let mut points = Vec::new();
    let mut tags = Vec::new();
    let mut pen = Vec2::ZERO;
    let mut have_open_contour = false;

    let mut next_point = |tokens: &mut std::iter::Peekable<std::str::SplitWhitespace<'_>>| -> Option<Vec2> {
        let x: f32 = tokens.next()?.parse().ok()?;
        let y: f32 = tokens.next()?.parse().ok()?;
        Some(Vec2::new(x * scale, y * scale))
    };

    while let Some(tok) = tokens.next() {
        match tok {
            "m" => {
                if let Some(p) = next_point(&mut tokens) {
                    if have_open_contour {
                        tags.push(SegmentTag::Close);
                    }
                    points.push(p);
                    tags.push(SegmentTag::MoveTo);
                    pen = p;
                    have_open_contour = true;
                }
            }
            "n" => {
                // Like `m`, but does not implicitly close the previous
                // contour (VSFilter quirk preserved deliberately).
                if let Some(p) = next_point(&mut tokens) {
                    points.push(p);
                    tags.push(SegmentTag::MoveTo);
                    pen = p;
                    have_open_contour = true;
                }
            }
            "l" => {
                while let Some(next) = tokens.peek() {
                    if next.parse::<f32>().is_err() {
                        break;
                    }
                    let Some(p) = next_point(&mut tokens) else { break };
                    points.push(p);
                    tags.push(SegmentTag::LineTo);
                    pen = p;
                }
            }
            "b" => {
                // Cubic Bezier: three control points follow, possibly
                // repeated for a polybezier chain.
                loop {
                    let Some(c1) = next_point(&mut tokens) else { break };
                    let Some(c2) = next_point(&mut tokens) else { break };
                    let Some(end) = next_point(&mut tokens) else { break };
                    points.push(c1);
                    tags.push(SegmentTag::CubicTo);
                    points.push(c2);
                    tags.push(SegmentTag::CubicTo);
                    points.push(end);
                    tags.push(SegmentTag::CubicTo);
                    pen = end;
                    match tokens.peek() {
                        Some(next) if next.parse::<f32>().is_ok() => continue,
                        _ => break,
                    }
                }
            }
            "s" | "p" => {
                // B-spline / open b-spline segments: approximate with
                // straight segments through the control points, which is
                // enough for bounding-box and fill purposes without
                // depending on the (external) curve rasterizer's own
                // spline evaluator.
                while let Some(next) = tokens.peek() {
                    if next.parse::<f32>().is_err() {
                        break;
                    }
                    let Some(p) = next_point(&mut tokens) else { break };
                    points.push(p);
                    tags.push(SegmentTag::QuadTo);
                    pen = p;
                }
            }
            "c" => {
                // Closes the current open b-spline/contour.
                if have_open_contour {
                    tags.push(SegmentTag::Close);
                    have_open_contour = false;
                }
            }
            _ => {
                // Unrecognized token: ignore (degraded, not fatal).
            }
        }
    }
    let _ = pen;
    if have_open_contour {
        tags.push(SegmentTag::Close);
    }
    Polyline { points, tags }
}

/// Hashes a drawing command string + scale for use as an
/// `OutlineHashKey::Drawing` key, so equal command strings collapse to one
/// cache entry without storing the string itself in the key.
#[must_use]
pub fn hash_drawing_commands(commands: &str) -> u64 {
    use std::hash::{Hash, Hasher};
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    commands.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_triangle() {
        let p = parse_drawing("m 0 0 l 10 0 10 10 0 10 c", 1.0);
        assert_eq!(p.points.len(), 4);
        assert_eq!(p.tags[0], SegmentTag::MoveTo);
        assert_eq!(p.tags.last(), Some(&SegmentTag::Close));
    }

    #[test]
    fn scale_is_applied() {
        let p = parse_drawing("m 2 2 l 4 4", 2.0);
        assert_eq!(p.points[0], Vec2::new(4.0, 4.0));
        assert_eq!(p.points[1], Vec2::new(8.0, 8.0));
    }

    #[test]
    fn unknown_tokens_are_skipped() {
        let p = parse_drawing("m 0 0 z l 5 5", 1.0);
        assert_eq!(p.points.len(), 2);
    }
}
