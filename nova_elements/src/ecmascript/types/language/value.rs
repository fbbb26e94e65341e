// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::ops::Index;

use super::{HeapNumber, HeapString};
use crate::{SmallF64, SmallInteger, ecmascript::builtins::Array, heap::Heap};

/// ### [6.1 ECMAScript Language Types](https://tc39.es/ecma262/#sec-ecmascript-language-types)
///
/// Numbers come in three flavours: safe integers and doubles with a zero low
/// byte are stored inline, all other doubles live on the heap.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[repr(u8)]
pub enum Value {
    /// ### [6.1.1 The Undefined Type](https://tc39.es/ecma262/#sec-ecmascript-language-types-undefined-type)
    #[default]
    Undefined,

    /// ### [6.1.2 The Null Type](https://tc39.es/ecma262/#sec-ecmascript-language-types-null-type)
    Null,

    /// ### [6.1.3 The Boolean Type](https://tc39.es/ecma262/#sec-ecmascript-language-types-boolean-type)
    Boolean(bool),

    /// ### [6.1.6.1 The Number Type](https://tc39.es/ecma262/#sec-ecmascript-language-types-number-type)
    ///
    /// 53-bit signed integer.
    Integer(SmallInteger),
    /// 56-bit double with an implied zero low byte.
    SmallF64(SmallF64),
    Number(HeapNumber),

    /// ### [6.1.4 The String Type](https://tc39.es/ecma262/#sec-ecmascript-language-types-string-type)
    String(HeapString),

    /// ### [10.4.2 Array Exotic Objects](https://tc39.es/ecma262/#sec-array-exotic-objects)
    Array(Array),
}

impl Value {
    /// Creates a Number value, choosing the thinnest representation that
    /// holds `value` bit for bit.
    pub fn from_f64(heap: &mut Heap, value: f64) -> Self {
        if let Ok(int) = SmallInteger::try_from(value) {
            Value::Integer(int)
        } else if let Ok(small) = SmallF64::try_from(value) {
            Value::SmallF64(small)
        } else {
            Value::Number(heap.create_number(value))
        }
    }

    pub fn is_undefined(self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn is_number(self) -> bool {
        matches!(self, Value::Integer(_) | Value::SmallF64(_) | Value::Number(_))
    }

    /// Returns the Number value as an f64, or None if this is not a Number.
    pub fn as_f64(self, heap: &impl Index<HeapNumber, Output = f64>) -> Option<f64> {
        match self {
            Value::Integer(int) => Some(int.into_f64()),
            Value::SmallF64(small) => Some(small.into_f64()),
            Value::Number(number) => Some(heap[number]),
            _ => None,
        }
    }

    /// Returns the value as an i32 if it is a Number with an exact i32
    /// representation. Negative zero is not an i32.
    pub fn as_i32(self) -> Option<i32> {
        match self {
            Value::Integer(int) => int.as_i32(),
            _ => None,
        }
    }
}

/// ### [7.2.10 SameValueZero ( x, y )](https://tc39.es/ecma262/#sec-samevaluezero)
pub(crate) fn same_value_zero<H>(heap: &H, x: Value, y: Value) -> bool
where
    H: Index<HeapNumber, Output = f64> + Index<HeapString, Output = str>,
{
    if let (Some(x), Some(y)) = (x.as_f64(heap), y.as_f64(heap)) {
        return (x.is_nan() && y.is_nan()) || x == y;
    }
    same_non_number(heap, x, y)
}

/// ### [7.2.15 IsStrictlyEqual ( x, y )](https://tc39.es/ecma262/#sec-isstrictlyequal)
pub(crate) fn is_strictly_equal<H>(heap: &H, x: Value, y: Value) -> bool
where
    H: Index<HeapNumber, Output = f64> + Index<HeapString, Output = str>,
{
    if let (Some(x), Some(y)) = (x.as_f64(heap), y.as_f64(heap)) {
        return x == y;
    }
    same_non_number(heap, x, y)
}

fn same_non_number<H>(heap: &H, x: Value, y: Value) -> bool
where
    H: Index<HeapNumber, Output = f64> + Index<HeapString, Output = str>,
{
    match (x, y) {
        (Value::String(x), Value::String(y)) => x == y || heap[x] == heap[y],
        (Value::Integer(_) | Value::SmallF64(_) | Value::Number(_), _)
        | (_, Value::Integer(_) | Value::SmallF64(_) | Value::Number(_)) => false,
        _ => x == y,
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(SmallInteger::from(value))
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Integer(SmallInteger::from(value))
    }
}

impl From<SmallInteger> for Value {
    fn from(value: SmallInteger) -> Self {
        Value::Integer(value)
    }
}

impl From<HeapString> for Value {
    fn from(value: HeapString) -> Self {
        Value::String(value)
    }
}

impl From<Array> for Value {
    fn from(value: Array) -> Self {
        Value::Array(value)
    }
}

#[test]
fn number_representations() {
    let mut heap = Heap::new(None);
    assert!(matches!(Value::from_f64(&mut heap, 7.0), Value::Integer(_)));
    assert!(matches!(Value::from_f64(&mut heap, -0.0), Value::SmallF64(_)));
    assert!(matches!(Value::from_f64(&mut heap, 0.5), Value::SmallF64(_)));
    let fat = Value::from_f64(&mut heap, 0.1);
    assert!(matches!(fat, Value::Number(_)));
    assert_eq!(fat.as_f64(&heap), Some(0.1));
    assert_eq!(Value::from(-4).as_i32(), Some(-4));
    assert_eq!(Value::from(u32::MAX).as_i32(), None);
}

#[test]
fn equality_of_numbers() {
    let mut heap = Heap::new(None);
    let nan = Value::from_f64(&mut heap, f64::NAN);
    let zero = Value::from(0);
    let negative_zero = Value::from_f64(&mut heap, -0.0);
    assert!(same_value_zero(&heap, nan, nan));
    assert!(!is_strictly_equal(&heap, nan, nan));
    assert!(same_value_zero(&heap, zero, negative_zero));
    assert!(is_strictly_equal(&heap, zero, negative_zero));
    let a = Value::from_f64(&mut heap, 0.1);
    let b = Value::from_f64(&mut heap, 0.1);
    assert!(same_value_zero(&heap, a, b));
    let s1 = Value::String(heap.create_string("abc"));
    let s2 = Value::String(heap.create_string("abc"));
    assert!(is_strictly_equal(&heap, s1, s2));
    assert!(!is_strictly_equal(&heap, s1, Value::Undefined));
    assert!(!same_value_zero(&heap, Value::Null, Value::Undefined));
}
