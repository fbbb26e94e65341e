// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/// 56-bit signed integer holding a safe integer Number inline.
///
/// Only integers in the range `MIN_NUMBER..=MAX_NUMBER` are representable,
/// which makes every value exactly convertible to and from `f64`.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct SmallInteger {
    data: [u8; 7],
}

impl std::fmt::Debug for SmallInteger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.into_i64())
    }
}

impl std::hash::Hash for SmallInteger {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.into_i64().hash(state);
    }
}

impl SmallInteger {
    pub const MIN_NUMBER: i64 = -(2i64.pow(53)) + 1;
    pub const MAX_NUMBER: i64 = 2i64.pow(53) - 1;

    pub const fn zero() -> SmallInteger {
        Self { data: [0; 7] }
    }

    #[inline]
    pub fn into_i64(self) -> i64 {
        let SmallInteger { data } = self;
        let bytes = if cfg!(target_endian = "little") {
            [
                data[0], data[1], data[2], data[3], data[4], data[5], data[6], 0,
            ]
        } else {
            [
                0, data[0], data[1], data[2], data[3], data[4], data[5], data[6],
            ]
        };
        // Move the 56-bit sign bit to the top and back down to sign-extend.
        (i64::from_ne_bytes(bytes) << 8) >> 8
    }

    #[inline]
    pub fn into_f64(self) -> f64 {
        self.into_i64() as f64
    }

    /// Returns the value as an i32 if it fits into one.
    #[inline]
    pub fn as_i32(self) -> Option<i32> {
        i32::try_from(self.into_i64()).ok()
    }

    fn from_i64_unchecked(value: i64) -> SmallInteger {
        debug_assert!((Self::MIN_NUMBER..=Self::MAX_NUMBER).contains(&value));
        let bytes = i64::to_ne_bytes(value);

        let data = if cfg!(target_endian = "little") {
            [
                bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6],
            ]
        } else {
            [
                bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
            ]
        };

        Self { data }
    }
}

impl From<i32> for SmallInteger {
    fn from(value: i32) -> Self {
        Self::from_i64_unchecked(value as i64)
    }
}

impl From<u32> for SmallInteger {
    fn from(value: u32) -> Self {
        Self::from_i64_unchecked(value as i64)
    }
}

impl TryFrom<i64> for SmallInteger {
    type Error = ();
    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if (Self::MIN_NUMBER..=Self::MAX_NUMBER).contains(&value) {
            Ok(Self::from_i64_unchecked(value))
        } else {
            Err(())
        }
    }
}

impl TryFrom<f64> for SmallInteger {
    type Error = ();
    /// Succeeds for integral values in the safe integer range. Negative zero
    /// has no SmallInteger representation.
    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if value.fract() != 0.0 || (value == 0.0 && value.is_sign_negative()) {
            return Err(());
        }
        let range =
            const { (SmallInteger::MIN_NUMBER as f64)..=(SmallInteger::MAX_NUMBER as f64) };
        if range.contains(&value) {
            Ok(Self::from_i64_unchecked(value as i64))
        } else {
            Err(())
        }
    }
}

impl From<SmallInteger> for i64 {
    fn from(value: SmallInteger) -> Self {
        value.into_i64()
    }
}

#[test]
fn valid_small_integers() {
    assert_eq!(0i64, SmallInteger::try_from(0i64).unwrap().into());
    assert_eq!(5i64, SmallInteger::try_from(5i64).unwrap().into());
    assert_eq!(-5i64, SmallInteger::try_from(-5i64).unwrap().into());
    assert_eq!(
        SmallInteger::MAX_NUMBER,
        SmallInteger::try_from(SmallInteger::MAX_NUMBER)
            .unwrap()
            .into_i64()
    );
    assert_eq!(
        SmallInteger::MIN_NUMBER,
        SmallInteger::try_from(SmallInteger::MIN_NUMBER)
            .unwrap()
            .into_i64()
    );
    assert_eq!(SmallInteger::from(i32::MIN).as_i32(), Some(i32::MIN));
    assert_eq!(SmallInteger::from(u32::MAX).as_i32(), None);
    assert_eq!(SmallInteger::try_from(-3.0f64).unwrap().into_i64(), -3);
}

#[test]
fn invalid_small_integers() {
    assert_eq!(SmallInteger::try_from(SmallInteger::MAX_NUMBER + 1), Err(()));
    assert_eq!(SmallInteger::try_from(SmallInteger::MIN_NUMBER - 1), Err(()));
    assert_eq!(SmallInteger::try_from(0.5f64), Err(()));
    assert_eq!(SmallInteger::try_from(-0.0f64), Err(()));
    assert_eq!(SmallInteger::try_from(f64::NAN), Err(()));
    assert_eq!(SmallInteger::try_from(f64::INFINITY), Err(()));
}
