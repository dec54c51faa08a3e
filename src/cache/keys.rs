//! Cache key types. Hash/equality are derived so that, per spec §4.1 design
//! notes, only the variant-relevant fields participate.

use crate::fontsrc::FaceId;
use crate::style::BorderStyleKind;
use std::rc::Rc;

/// `OutlineHashKey`: a sum type over the four outline variants.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum OutlineHashKey {
    Glyph {
        face: FaceId,
        glyph_index: u32,
        /// Font size in 6.6 fixed point, so hinting-sensitive faces hash
        /// distinctly per requested size.
        size_d6: i32,
        hinting: Hinting,
    },
    Drawing {
        /// Hash of the normalized drawing-command string (not the string
        /// itself, to keep the key `Copy`-ish and cheap to compare).
        commands_hash: u64,
        scale: i32,
    },
    Border {
        source: OutlineRef,
        scale_ord: i32,
        border_x_d6: i32,
        border_y_d6: i32,
    },
    Box,
}

/// Hinting mode, external to this crate's scope but part of the glyph
/// outline key (affects which outline a font face returns).
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
pub enum Hinting {
    None,
    Light,
    #[default]
    Normal,
    Native,
}

/// A cheap, cloneable reference to an already-cached outline, used as the
/// source of a `Border` key and inside `BitmapHashKey`. Wraps the `Rc` so
/// hashing/equality is by pointer identity, which is exactly the "variant
/// relevant fields" the source outline contributes to a derived key.
#[derive(Clone, Debug)]
pub struct OutlineRef(pub Rc<crate::outline::OutlineHashValue>);

impl PartialEq for OutlineRef {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}
impl Eq for OutlineRef {}
impl std::hash::Hash for OutlineRef {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        (Rc::as_ptr(&self.0) as usize).hash(state);
    }
}

/// `BitmapHashKey`: outline reference + quantized matrix + integer
/// sub-pixel offset (spec §3).
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct BitmapHashKey {
    pub outline: OutlineRef,
    /// Quantized z at the transform's centre; needed alongside the outline's
    /// own cbox to reconstruct the per-axis quantization steps, so two
    /// different source depths never collide onto the same rasterized
    /// bitmap. Integer pixel *position* is deliberately excluded: it is a
    /// pure post-rasterization blit offset, not part of the bitmap's pixels.
    pub z_base: i32,
    pub matrix_x: (i32, i32),
    pub matrix_y: (i32, i32),
    pub matrix_z: (i32, i32),
    pub offset_x: u8,
    pub offset_y: u8,
}

impl BitmapHashKey {
    #[must_use]
    pub fn from_quantized(outline: OutlineRef, q: &crate::quantize::QuantizedTransform) -> Self {
        Self {
            outline,
            z_base: q.z_base,
            matrix_x: q.matrix_x,
            matrix_y: q.matrix_y,
            matrix_z: q.matrix_z,
            offset_x: q.offset.0,
            offset_y: q.offset.1,
        }
    }
}

/// Composite-cache key: a run's filter descriptor, blur-edge pass count,
/// quantized blur, and the sorted list of constituent bitmap references
/// and positions (spec §4.6.2).
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct CompositeKey {
    pub filter_flags: u8,
    pub be_passes: u8,
    pub blur_n: i32,
    pub border_style: BorderStyleKind,
    pub bitmaps: Vec<(BitmapRef, i32, i32)>,
    pub border_bitmaps: Vec<(BitmapRef, i32, i32)>,
}

#[derive(Clone, Debug)]
pub struct BitmapRef(pub Rc<crate::bitmap::Bitmap>);

impl PartialEq for BitmapRef {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}
impl Eq for BitmapRef {}
impl std::hash::Hash for BitmapRef {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        (Rc::as_ptr(&self.0) as usize).hash(state);
    }
}
