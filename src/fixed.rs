// Copyright 2025 the Subcompose Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! 6.6 fixed-point helper (`D6` in the glossary): a signed integer counting
//! 1/64-unit steps, used for pen positions and cluster advances.

use core::ops::{Add, AddAssign, Neg, Sub, SubAssign};

/// A 6.6 fixed-point value: `raw` units of `1/64`.
#[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Debug, Hash)]
pub struct D6(pub i32);

impl D6 {
    pub const ZERO: Self = Self(0);
    pub const ONE: Self = Self(64);

    #[must_use]
    pub fn from_f32(v: f32) -> Self {
        Self((v * 64.0).round() as i32)
    }

    #[must_use]
    pub fn to_f32(self) -> f32 {
        self.0 as f32 / 64.0
    }

    #[must_use]
    pub fn from_int(v: i32) -> Self {
        Self(v * 64)
    }

    /// Integer pixel part (floor).
    #[must_use]
    pub fn trunc(self) -> i32 {
        self.0 >> 6
    }

    /// Fractional sub-pixel remainder in `[0, 64)`.
    #[must_use]
    pub fn frac(self) -> i32 {
        self.0 & 63
    }
}

impl Add for D6 {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for D6 {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl Sub for D6 {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl SubAssign for D6 {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl Neg for D6 {
    type Output = Self;
    fn neg(self) -> Self {
        Self(-self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let v = D6::from_f32(12.5);
        assert_eq!(v.0, 800);
        assert!((v.to_f32() - 12.5).abs() < 1e-6);
    }

    #[test]
    fn trunc_and_frac() {
        let v = D6(321); // 5 + 1/64 * 1
        assert_eq!(v.trunc(), 5);
        assert_eq!(v.frac(), 1);
    }
}
