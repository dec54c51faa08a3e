// Copyright 2025 the Subcompose Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame assembly (C6, spec §4.6.4): selects the events active at a given
//! time, sorts them into paint order, resolves vertical collisions between
//! overlapping events at the same alignment, and reports whether anything
//! changed since the previous frame so callers can skip redundant work.

use crate::event::Event;
use crate::geometry::BBox;
use crate::image::EventImages;

/// How much (if anything) changed between two consecutive render calls at
/// different times, so a caller driving a video player can decide whether
/// to skip re-blitting a frame entirely.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum ChangeLevel {
    /// Nothing active changed: identical images would be produced.
    Identical,
    /// The same set of events is active, but positions/content differ
    /// (e.g. a `\move` or `\t` animation progressed).
    Positions,
    /// A different set of events became active or inactive.
    Contents,
}

/// Returns the indices (into `events`), sorted into paint order, of every
/// event active at `time_ms` (spec §4.6.1: stable sort by `(layer,
/// read_order)`, lower layers painted first).
#[must_use]
pub fn select_active(events: &[Event], time_ms: i64) -> Vec<usize> {
    let mut active: Vec<usize> = events.iter().enumerate().filter(|(_, e)| e.is_active_at(time_ms)).map(|(i, _)| i).collect();
    active.sort_by_key(|&i| (events[i].layer, events[i].read_order));
    active
}

/// One event's bbox plus the index into the caller's active-event list, so
/// [`fix_collisions`] can report which original event each shift applies
/// to.
#[derive(Clone, Debug)]
pub struct PlacedEvent {
    pub active_index: usize,
    pub bbox: BBox,
    /// Top-aligned events stack downward away from the top edge; all
    /// others (middle/bottom-aligned) stack upward away from the bottom.
    pub shift_up: bool,
}

/// Shifts vertically-colliding events apart (spec §4.6.1 "fix_collisions"):
/// events painted later (by paint order) that would overlap an
/// already-placed event's bbox are pushed away from it, in the direction
/// its alignment stacks toward, repeating until no collisions remain.
/// Horizontal overlap is ignored — collision avoidance only ever separates
/// on the Y axis, matching the common case of stacked same-alignment
/// subtitle lines.
#[must_use]
pub fn fix_collisions(mut placed: Vec<PlacedEvent>) -> Vec<PlacedEvent> {
    for i in 1..placed.len() {
        loop {
            let mut shift = 0;
            for j in 0..i {
                if !placed[i].bbox.y_disjoint(placed[j].bbox) && !placed[i].bbox.x_disjoint(placed[j].bbox) {
                    if placed[i].shift_up {
                        shift = shift.min(placed[j].bbox.y0 - placed[i].bbox.y1);
                    } else {
                        shift = shift.max(placed[j].bbox.y1 - placed[i].bbox.y0);
                    }
                }
            }
            if shift == 0 {
                break;
            }
            placed[i].bbox = placed[i].bbox.translated(0, shift);
        }
    }
    placed
}

/// Compares the active-event index set and each event's images between two
/// frames to classify what changed (spec §4.6.4): a different active set,
/// or a different number of image layers, is always `Contents`; otherwise
/// any difference in bitmap content, color, or geometry other than
/// position is `Contents` too, and a pure `dst_x`/`dst_y` difference is
/// `Positions`.
#[must_use]
pub fn detect_change(prev: &[(usize, EventImages)], curr: &[(usize, EventImages)]) -> ChangeLevel {
    let prev_ids: Vec<usize> = prev.iter().map(|(i, _)| *i).collect();
    let curr_ids: Vec<usize> = curr.iter().map(|(i, _)| *i).collect();
    if prev_ids != curr_ids {
        return ChangeLevel::Contents;
    }
    let mut positions_changed = false;
    for ((_, a), (_, b)) in prev.iter().zip(curr.iter()) {
        if a.images.len() != b.images.len() {
            return ChangeLevel::Contents;
        }
        for (ia, ib) in a.images.iter().zip(b.images.iter()) {
            if ia.width != ib.width || ia.height != ib.height || ia.stride != ib.stride || ia.color != ib.color || ia.bitmap != ib.bitmap {
                return ChangeLevel::Contents;
            }
            if ia.dst_x != ib.dst_x || ia.dst_y != ib.dst_y {
                positions_changed = true;
            }
        }
    }
    if positions_changed {
        ChangeLevel::Positions
    } else {
        ChangeLevel::Identical
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;

    fn event(start: i64, end: i64, layer: i32, read_order: i32) -> Event {
        Event { style_name: "Default".into(), start_ms: start, end_ms: end, layer, read_order, margin_l: 0, margin_r: 0, margin_v: 0, text: String::new() }
    }

    #[test]
    fn select_active_filters_and_sorts_by_layer_then_read_order() {
        let events = vec![event(0, 100, 1, 0), event(0, 100, 0, 5), event(200, 300, 0, 0)];
        let active = select_active(&events, 50);
        assert_eq!(active, vec![1, 0]);
    }

    #[test]
    fn fix_collisions_separates_overlapping_boxes() {
        let placed = vec![
            PlacedEvent { active_index: 0, bbox: BBox { x0: 0, y0: 0, x1: 100, y1: 20 }, shift_up: false },
            PlacedEvent { active_index: 1, bbox: BBox { x0: 0, y0: 0, x1: 100, y1: 20 }, shift_up: false },
        ];
        let fixed = fix_collisions(placed);
        assert_eq!(fixed[0].bbox.y0, 0);
        assert_eq!(fixed[1].bbox.y0, 20);
    }

    #[test]
    fn fix_collisions_leaves_non_overlapping_alone() {
        let placed = vec![
            PlacedEvent { active_index: 0, bbox: BBox { x0: 0, y0: 0, x1: 100, y1: 20 }, shift_up: false },
            PlacedEvent { active_index: 1, bbox: BBox { x0: 200, y0: 0, x1: 300, y1: 20 }, shift_up: false },
        ];
        let fixed = fix_collisions(placed);
        assert_eq!(fixed[1].bbox.y0, 0);
    }

    #[test]
    fn fix_collisions_shifts_up_when_requested() {
        let placed = vec![
            PlacedEvent { active_index: 0, bbox: BBox { x0: 0, y0: 20, x1: 100, y1: 40 }, shift_up: true },
            PlacedEvent { active_index: 1, bbox: BBox { x0: 0, y0: 20, x1: 100, y1: 40 }, shift_up: true },
        ];
        let fixed = fix_collisions(placed);
        assert_eq!(fixed[0].bbox.y0, 20);
        assert_eq!(fixed[1].bbox.y1, 20);
        assert_eq!(fixed[1].bbox.y0, 0);
    }

    #[test]
    fn detect_change_reports_contents_when_active_set_differs() {
        let prev = vec![(0, EventImages::default())];
        let curr = vec![(1, EventImages::default())];
        assert_eq!(detect_change(&prev, &curr), ChangeLevel::Contents);
    }

    #[test]
    fn detect_change_reports_identical_for_same_bboxes() {
        let prev = vec![(0, EventImages::default())];
        let curr = vec![(0, EventImages::default())];
        assert_eq!(detect_change(&prev, &curr), ChangeLevel::Identical);
    }

    fn img(dst_x: i32, dst_y: i32, color: Color) -> crate::image::Image {
        crate::image::Image { width: 4, height: 4, stride: 4, bitmap: vec![255; 16], dst_x, dst_y, color, order: 0 }
    }

    #[test]
    fn detect_change_reports_positions_for_moved_image() {
        let prev = vec![(0, EventImages { images: vec![img(0, 0, Color::default())], is_empty: false })];
        let curr = vec![(0, EventImages { images: vec![img(5, 0, Color::default())], is_empty: false })];
        assert_eq!(detect_change(&prev, &curr), ChangeLevel::Positions);
    }

    #[test]
    fn detect_change_reports_contents_for_color_only_change_at_same_bbox() {
        let prev = vec![(0, EventImages { images: vec![img(0, 0, Color::default())], is_empty: false })];
        let curr = vec![(0, EventImages { images: vec![img(0, 0, Color { r: 255, g: 0, b: 0, a: 0 })], is_empty: false })];
        assert_eq!(detect_change(&prev, &curr), ChangeLevel::Contents);
    }

    #[test]
    fn detect_change_reports_contents_when_image_count_differs_at_same_bbox() {
        let prev = vec![(0, EventImages { images: vec![img(0, 0, Color::default())], is_empty: false })];
        let curr = vec![(0, EventImages { images: vec![img(0, 0, Color::default()), img(0, 0, Color::default())], is_empty: false })];
        assert_eq!(detect_change(&prev, &curr), ChangeLevel::Contents);
    }
}
