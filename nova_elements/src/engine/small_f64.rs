// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::SmallInteger;

/// 56-bit double, the implied bottom 8 bits are zero.
///
/// This is the thin representation of a Number: doubles whose low mantissa
/// byte is zero are stored inline in a Value, everything else goes into a
/// heap-allocated number.
#[derive(Clone, Copy, PartialEq)]
pub struct SmallF64 {
    data: [u8; 7],
}

impl std::fmt::Debug for SmallF64 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.into_f64())
    }
}

impl SmallF64 {
    #[inline]
    pub fn into_f64(self) -> f64 {
        let SmallF64 { data } = self;
        let bytes = if cfg!(target_endian = "little") {
            [
                0, data[0], data[1], data[2], data[3], data[4], data[5], data[6],
            ]
        } else {
            [
                data[0], data[1], data[2], data[3], data[4], data[5], data[6], 0,
            ]
        };
        f64::from_bits(u64::from_ne_bytes(bytes))
    }

    #[inline(always)]
    fn can_convert(value: f64) -> bool {
        if value.is_nan() {
            // NaN is canonicalized on conversion.
            true
        } else if value.to_bits().trailing_zeros() < 8 {
            false
        } else if value.fract() == 0.0 && !(value == 0.0 && value.is_sign_negative()) {
            // Integers in the safe range are SmallIntegers, not SmallF64s.
            let range =
                const { (SmallInteger::MIN_NUMBER as f64)..=(SmallInteger::MAX_NUMBER as f64) };
            !range.contains(&value)
        } else {
            true
        }
    }

    /// The f64 must have 8 or more trailing zeros, or be NaN. Other values
    /// lose their lowest mantissa byte.
    #[inline]
    fn from_f64_unchecked(mut value: f64) -> SmallF64 {
        if value.is_nan() {
            value = f64::NAN;
        }
        let bytes = u64::to_ne_bytes(value.to_bits());
        let data = if cfg!(target_endian = "little") {
            [
                bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
            ]
        } else {
            [
                bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6],
            ]
        };
        Self { data }
    }
}

impl TryFrom<f64> for SmallF64 {
    type Error = ();
    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if SmallF64::can_convert(value) {
            Ok(Self::from_f64_unchecked(value))
        } else {
            Err(())
        }
    }
}

impl From<f32> for SmallF64 {
    fn from(value: f32) -> Self {
        // All floats have at least 29 trailing zeros when widened to double.
        Self::from_f64_unchecked(value as f64)
    }
}

impl From<SmallF64> for f64 {
    fn from(value: SmallF64) -> Self {
        value.into_f64()
    }
}

#[test]
fn valid_small_floats() {
    assert_eq!(1.0 / 2.0, SmallF64::from(1.0f32 / 2.0).into_f64());
    assert_eq!(1.0 / 4.0, SmallF64::try_from(0.25).unwrap().into_f64());
    assert!(SmallF64::try_from(f64::NAN).unwrap().into_f64().is_nan());
    assert_eq!(
        f64::INFINITY,
        SmallF64::try_from(f64::INFINITY).unwrap().into_f64()
    );
    assert_eq!(
        f64::NEG_INFINITY,
        SmallF64::try_from(f64::NEG_INFINITY).unwrap().into_f64()
    );
    let negative_zero = SmallF64::try_from(-0.0).unwrap().into_f64();
    assert_eq!(negative_zero.to_bits(), (-0.0f64).to_bits());
}

#[test]
fn invalid_small_floats() {
    assert_eq!(SmallF64::try_from(1.0 / 3.0), Err(()));
    assert_eq!(SmallF64::try_from(0.1), Err(()));
    // Safe integers belong to SmallInteger.
    assert_eq!(SmallF64::try_from(3.0), Err(()));
}
