// Copyright 2025 the Subcompose Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Line/paragraph alignment (spec §4.5 phase 11): positions each wrapped
//! line horizontally within the available width per the event's
//! [`Alignment`], and stacks lines vertically to produce each line's pen
//! origin, using a const-generic dual-purpose function so justified
//! (`\q`-forced end-of-line) text and ragged text share one code path.

use crate::style::Alignment;
use crate::wrap::WrappedLine;

/// Horizontal pen-x for `line`'s start, given the available box width.
/// `UNDO_JUSTIFICATION` selects the ragged-edge placement used when a
/// caller wants a line's "natural" position regardless of forced
/// end-of-line stretching (spec §4.5's alignment step is reused, with
/// justification undone, when measuring for collision avoidance).
#[must_use]
pub fn align_line_x<const UNDO_JUSTIFICATION: bool>(line: &WrappedLine, box_width: f32, alignment: Alignment) -> f32 {
    let slack = (box_width - line.width).max(0.0);
    if UNDO_JUSTIFICATION || alignment.is_left() {
        0.0
    } else if alignment.is_right() {
        slack
    } else {
        slack * 0.5
    }
}

/// Vertical pen-y origins for a stack of `lines`, each `line_height` tall,
/// within `box_height`, per the event's vertical alignment.
#[must_use]
pub fn stack_lines_y(line_count: usize, line_height: f32, box_height: f32, alignment: Alignment) -> Vec<f32> {
    let total = line_height * line_count as f32;
    let top = if alignment.is_top() {
        0.0
    } else if alignment.is_bottom() {
        (box_height - total).max(0.0)
    } else {
        ((box_height - total) * 0.5).max(0.0)
    };
    (0..line_count).map(|i| top + line_height * i as f32).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(w: f32) -> WrappedLine {
        WrappedLine { start: 0, end: 1, width: w }
    }

    #[test]
    fn center_alignment_centers_the_line() {
        let x = align_line_x::<false>(&line(50.0), 100.0, Alignment::BottomCenter);
        assert!((x - 25.0).abs() < 1e-6);
    }

    #[test]
    fn left_alignment_pins_to_zero() {
        let x = align_line_x::<false>(&line(50.0), 100.0, Alignment::TopLeft);
        assert_eq!(x, 0.0);
    }

    #[test]
    fn undo_justification_forces_ragged_left() {
        let x = align_line_x::<true>(&line(50.0), 100.0, Alignment::BottomRight);
        assert_eq!(x, 0.0);
    }

    #[test]
    fn stack_lines_top_alignment_starts_at_zero() {
        let ys = stack_lines_y(3, 20.0, 200.0, Alignment::TopLeft);
        assert_eq!(ys, vec![0.0, 20.0, 40.0]);
    }

    #[test]
    fn stack_lines_bottom_alignment_hugs_bottom() {
        let ys = stack_lines_y(2, 20.0, 100.0, Alignment::BottomCenter);
        assert_eq!(ys, vec![60.0, 80.0]);
    }
}
