// Copyright 2025 the Subcompose Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public output types: positioned 8-bit alpha bitmaps ready for
//! compositing onto a video frame (spec §4.8, the `ASS_Image` equivalent).

use crate::color::Color;

/// One positioned, colored alpha bitmap layer.
#[derive(Clone, Debug)]
pub struct Image {
    pub width: i32,
    pub height: i32,
    pub stride: i32,
    /// 8-bit coverage, one byte per pixel, row-major, `stride` wide.
    pub bitmap: Vec<u8>,
    /// Device-space top-left corner.
    pub dst_x: i32,
    pub dst_y: i32,
    pub color: Color,
    /// Stacking/read order, ascending: composite lower indices first.
    pub order: i32,
}

/// All image layers produced for one event at one render time, plus the
/// identity the caller can diff against the previous frame's images to
/// decide whether to skip redrawing (spec §4.8 / §4.6.4 "ChangeLevel").
#[derive(Clone, Debug, Default)]
pub struct EventImages {
    pub images: Vec<Image>,
    /// True if this event produces no visible pixels (fully transparent,
    /// empty text, or entirely clipped) and can be skipped by the caller.
    pub is_empty: bool,
}

impl EventImages {
    #[must_use]
    pub fn bbox(&self) -> crate::BBox {
        self.images.iter().fold(crate::BBox::EMPTY, |acc, img| {
            acc.union(crate::BBox {
                x0: img.dst_x,
                y0: img.dst_y,
                x1: img.dst_x + img.width,
                y1: img.dst_y + img.height,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_event_images_has_empty_bbox() {
        let ei = EventImages::default();
        assert!(ei.bbox().is_empty());
    }

    #[test]
    fn bbox_unions_all_layers() {
        let mk = |x, y, w, h| Image { width: w, height: h, stride: w, bitmap: vec![], dst_x: x, dst_y: y, color: Color::default(), order: 0 };
        let ei = EventImages { images: vec![mk(0, 0, 10, 10), mk(20, 20, 5, 5)], is_empty: false };
        let b = ei.bbox();
        assert_eq!(b, crate::BBox { x0: 0, y0: 0, x1: 25, y1: 25 });
    }
}
