// Copyright 2025 the Subcompose Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shared geometric primitives: integer bounding boxes (`cbox`) and the
//! continuous point type used by outlines.

use glam::Vec2;

/// Integer bounding box in 26.6 units (the glossary's `cbox`).
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default)]
pub struct BBox {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

impl BBox {
    pub const EMPTY: Self = Self { x0: 0, y0: 0, x1: 0, y1: 0 };

    #[must_use]
    pub fn from_points(points: impl IntoIterator<Item = Vec2>) -> Self {
        let mut it = points.into_iter();
        let Some(first) = it.next() else {
            return Self::EMPTY;
        };
        let mut b = Self {
            x0: first.x.floor() as i32,
            y0: first.y.floor() as i32,
            x1: first.x.ceil() as i32,
            y1: first.y.ceil() as i32,
        };
        for p in it {
            b.x0 = b.x0.min(p.x.floor() as i32);
            b.y0 = b.y0.min(p.y.floor() as i32);
            b.x1 = b.x1.max(p.x.ceil() as i32);
            b.y1 = b.y1.max(p.y.ceil() as i32);
        }
        b
    }

    #[must_use]
    pub fn union(self, other: Self) -> Self {
        if self.is_empty() {
            return other;
        }
        if other.is_empty() {
            return self;
        }
        Self {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    #[must_use]
    pub fn is_empty(self) -> bool {
        self.x1 <= self.x0 || self.y1 <= self.y0
    }

    #[must_use]
    pub fn width(self) -> i32 {
        (self.x1 - self.x0).max(0)
    }

    #[must_use]
    pub fn height(self) -> i32 {
        (self.y1 - self.y0).max(0)
    }

    #[must_use]
    pub fn center(self) -> Vec2 {
        Vec2::new(
            (self.x0 + self.x1) as f32 * 0.5,
            (self.y0 + self.y1) as f32 * 0.5,
        )
    }

    /// Two rectangles are disjoint on the Y axis (used for collision
    /// detection, which only ever needs to test vertical separation).
    #[must_use]
    pub fn y_disjoint(self, other: Self) -> bool {
        self.y1 <= other.y0 || other.y1 <= self.y0
    }

    #[must_use]
    pub fn x_disjoint(self, other: Self) -> bool {
        self.x1 <= other.x0 || other.x1 <= self.x0
    }

    #[must_use]
    pub fn translated(self, dx: i32, dy: i32) -> Self {
        Self {
            x0: self.x0 + dx,
            y0: self.y0 + dy,
            x1: self.x1 + dx,
            y1: self.y1 + dy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_of_empty_is_other() {
        let a = BBox::EMPTY;
        let b = BBox { x0: 1, y0: 2, x1: 5, y1: 6 };
        assert_eq!(a.union(b), b);
    }

    #[test]
    fn disjointness() {
        let a = BBox { x0: 0, y0: 0, x1: 10, y1: 10 };
        let b = BBox { x0: 0, y0: 10, x1: 10, y1: 20 };
        assert!(a.y_disjoint(b));
        assert!(!a.x_disjoint(b));
    }
}
