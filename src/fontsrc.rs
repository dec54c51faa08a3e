// Copyright 2025 the Subcompose Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Font discovery and face loading — an external collaborator per spec §1.
//!
//! This crate never opens a font file itself; it asks a [`FontSource`] for
//! a face matching a request and receives an opaque [`FaceId`] plus
//! [`FaceMetrics`]. Glyph outline extraction (`ass_outline_construct`'s
//! glyph variant, spec §4.3) is requested through the same trait.

use crate::geometry::BBox;
use crate::outline::Polyline;

/// Opaque handle to a loaded font face, assigned by the font source.
/// Equality/hash identify "the same face at the same variation/size axis
/// values", which is all the outline cache needs.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct FaceId(pub u32);

/// Face-level metrics needed by the layout pipeline (ascender/descender for
/// line metrics, in font units scaled to the requested size).
#[derive(Copy, Clone, Debug, Default)]
pub struct FaceMetrics {
    pub ascender: f32,
    pub descender: f32,
    pub underline_position: f32,
    pub underline_thickness: f32,
}

/// A single outline extracted from a face at a given size/hinting mode.
pub struct GlyphOutline {
    pub fill: Polyline,
    pub advance: f32,
    pub cbox: BBox,
}

/// External collaborator: font discovery, face loading, and glyph→outline
/// extraction. A production embedding backs this with FreeType/HarfBuzz or
/// a system font database; this crate only depends on the trait boundary.
pub trait FontSource {
    /// Finds or loads a face matching `family`/`bold`/`italic`, falling back
    /// to the renderer's configured default family/font if nothing matches.
    fn find_face(&mut self, family: &str, bold: bool, italic: bool) -> Option<FaceId>;

    /// Metrics for `face` at `size_px`, after the renderer's font-scale has
    /// already been applied by the caller.
    fn metrics(&mut self, face: FaceId, size_px: f32) -> FaceMetrics;

    /// Extracts the fill outline and advance for `codepoint` in `face` at
    /// `size_px` with the given hinting mode. Returns `None` if the face
    /// has no glyph for the codepoint (caller falls back to `.notdef`
    /// handling or skips the cluster).
    fn glyph_outline(
        &mut self,
        face: FaceId,
        codepoint: u32,
        size_px: f32,
        hinting: crate::cache::Hinting,
    ) -> Option<GlyphOutline>;
}

/// A `FontSource` that resolves no faces and extracts no outlines. Useful
/// for pipeline-only tests that never reach glyph rasterization, and as
/// the trait's `Default`-style placeholder.
#[derive(Debug, Default)]
pub struct NullFontSource;

impl FontSource for NullFontSource {
    fn find_face(&mut self, _family: &str, _bold: bool, _italic: bool) -> Option<FaceId> {
        None
    }

    fn metrics(&mut self, _face: FaceId, size_px: f32) -> FaceMetrics {
        FaceMetrics {
            ascender: size_px * 0.8,
            descender: size_px * 0.2,
            underline_position: -size_px * 0.1,
            underline_thickness: size_px * 0.05,
        }
    }

    fn glyph_outline(
        &mut self,
        _face: FaceId,
        _codepoint: u32,
        _size_px: f32,
        _hinting: crate::cache::Hinting,
    ) -> Option<GlyphOutline> {
        None
    }
}
