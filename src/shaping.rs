// Copyright 2025 the Subcompose Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Text shaping — an external collaborator per spec §1 ("the text shaper
//! (bidi, cluster formation, cmap application)").
//!
//! This module defines the boundary: the pipeline hands a run of text with
//! a single face/size/direction to a [`Shaper`], and gets back a sequence
//! of [`ShapedCluster`]s (cluster advance, glyph ids, and a resolved bidi
//! embedding level per cluster). Everything downstream of that — outline
//! retrieval, line breaking, visual reordering (spec §4.5 step 10),
//! karaoke, alignment, and bitmap composition — is this crate's job.

use crate::fontsrc::FaceId;

/// One shaped glyph inside a cluster (most clusters hold exactly one; a
/// ligature holds more than one glyph for one source character, a
/// decomposed combining sequence can hold more than one character for one
/// glyph).
#[derive(Copy, Clone, Debug)]
pub struct ShapedGlyph {
    pub glyph_index: u32,
    /// Offset within the cluster, in font units at the shaped size.
    pub x_offset: f32,
    pub y_offset: f32,
}

/// A shaped cluster: the atomic unit the rest of the pipeline operates on.
#[derive(Clone, Debug)]
pub struct ShapedCluster {
    /// Byte range in the original run text.
    pub text_range: core::ops::Range<usize>,
    pub glyphs: smallvec::SmallVec<[ShapedGlyph; 1]>,
    pub advance: f32,
    /// Resolved bidi embedding level (even = LTR, odd = RTL) for this
    /// cluster, as produced by the shaper's bidi pass.
    pub bidi_level: u8,
    pub is_whitespace: bool,
    /// True if the shaper inserted a mandatory line break immediately
    /// after this cluster (source text contained `'\n'` or similar).
    pub mandatory_break_after: bool,
}

/// External collaborator: shapes one contiguous run (single face, size,
/// and writing direction) of text into clusters.
pub trait Shaper {
    fn shape_run(&mut self, face: FaceId, size_px: f32, text: &str) -> Vec<ShapedCluster>;
}

/// A trivial shaper for tests and for scripts containing only single-byte
/// "object replacement" drawing clusters: one cluster per Unicode scalar,
/// one glyph per cluster, zero bidi level, advance derived from `size_px`
/// alone (stand-in for a real cmap-driven advance).
#[derive(Debug, Default)]
pub struct NullShaper;

impl Shaper for NullShaper {
    fn shape_run(&mut self, _face: FaceId, size_px: f32, text: &str) -> Vec<ShapedCluster> {
        let mut out = Vec::new();
        let mut byte_offset = 0;
        for ch in text.chars() {
            let len = ch.len_utf8();
            out.push(ShapedCluster {
                text_range: byte_offset..byte_offset + len,
                glyphs: smallvec::smallvec![ShapedGlyph {
                    glyph_index: ch as u32,
                    x_offset: 0.0,
                    y_offset: 0.0,
                }],
                advance: size_px * 0.6,
                bidi_level: 0,
                is_whitespace: ch.is_whitespace(),
                mandatory_break_after: ch == '\n',
            });
            byte_offset += len;
        }
        out
    }
}
