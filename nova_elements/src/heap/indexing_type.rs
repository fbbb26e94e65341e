// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::ecmascript::types::Value;

/// Physical encoding backing an array's elements.
///
/// The variants are ordered by generality: an array only ever moves to a
/// later variant, except when its storage is dropped entirely and it starts
/// over from `Initial`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IndexingType {
    /// No storage allocated.
    Initial,
    /// Only i32 values and holes.
    Int32,
    /// Only non-NaN doubles and holes.
    Double,
    /// Any value or hole.
    Contiguous,
    /// Any value or hole, with an index bias for cheap front operations and
    /// a sparse map for elements outside the vector or with special
    /// attributes.
    ArrayStorage,
}

/// Result of merging two encodings for a copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergedIndexingType {
    Merged(IndexingType),
    /// The encodings cannot share a dense representation. The caller must
    /// fall back to per-element copying.
    NotRepresentable,
}

impl IndexingType {
    /// Returns true if elements are stored as boxed Values, which the
    /// collector needs to trace.
    pub fn is_boxed(self) -> bool {
        matches!(self, IndexingType::Contiguous | IndexingType::ArrayStorage)
    }

    pub fn is_dense(self) -> bool {
        matches!(
            self,
            IndexingType::Int32 | IndexingType::Double | IndexingType::Contiguous
        )
    }

    /// The minimal encoding that can hold both everything `self` holds and
    /// everything `required` holds.
    pub fn promote_for(self, required: IndexingType) -> IndexingType {
        self.max(required)
    }
}

/// Returns the least general encoding able to store `value`.
///
/// NaN is excluded from Double storage since a NaN slot denotes a hole
/// there.
pub fn classify(value: Value) -> IndexingType {
    match value {
        Value::Integer(int) if int.as_i32().is_some() => IndexingType::Int32,
        Value::Integer(_) | Value::Number(_) => IndexingType::Double,
        Value::SmallF64(small) if !small.into_f64().is_nan() => IndexingType::Double,
        _ => IndexingType::Contiguous,
    }
}

/// Computes the encoding a destination must have to receive elements of
/// both `a` and `b` through a dense copy.
///
/// Widening Int32 to Double or Double to boxed values changes the element
/// type of one side; that is only done when `allow_promotion` is set.
/// Int32 merges into Contiguous unconditionally since boxed slots can hold
/// integers as they are.
pub fn merge_for_copy(
    a: IndexingType,
    b: IndexingType,
    allow_promotion: bool,
) -> MergedIndexingType {
    use IndexingType::*;
    match (a, b) {
        (ArrayStorage, _) | (_, ArrayStorage) => MergedIndexingType::NotRepresentable,
        (Initial, other) | (other, Initial) => MergedIndexingType::Merged(other),
        (a, b) if a == b => MergedIndexingType::Merged(a),
        (Int32, Contiguous) | (Contiguous, Int32) => MergedIndexingType::Merged(Contiguous),
        (a, b) if allow_promotion => MergedIndexingType::Merged(a.max(b)),
        _ => MergedIndexingType::NotRepresentable,
    }
}

/// Returns true if indexed reads of an array with this encoding may be
/// answered from its storage alone, treating holes as undefined.
pub fn can_fast_indexed_access(
    indexing_type: IndexingType,
    holes_must_forward_to_prototype: bool,
) -> bool {
    match indexing_type {
        IndexingType::Initial
        | IndexingType::Int32
        | IndexingType::Double
        | IndexingType::Contiguous => !holes_must_forward_to_prototype,
        IndexingType::ArrayStorage => false,
    }
}

#[test]
fn classify_values() {
    use crate::{SmallF64, SmallInteger};
    assert_eq!(classify(Value::from(3)), IndexingType::Int32);
    assert_eq!(
        classify(Value::Integer(SmallInteger::try_from(1i64 << 40).unwrap())),
        IndexingType::Double
    );
    assert_eq!(
        classify(Value::SmallF64(SmallF64::try_from(0.5).unwrap())),
        IndexingType::Double
    );
    assert_eq!(
        classify(Value::SmallF64(SmallF64::try_from(f64::NAN).unwrap())),
        IndexingType::Contiguous
    );
    assert_eq!(classify(Value::Undefined), IndexingType::Contiguous);
    assert_eq!(classify(Value::Boolean(true)), IndexingType::Contiguous);
}

#[test]
fn promotion_is_monotonic() {
    use IndexingType::*;
    let all = [Initial, Int32, Double, Contiguous, ArrayStorage];
    for a in all {
        for b in all {
            let joined = a.promote_for(b);
            assert!(joined >= a && joined >= b);
        }
    }
    assert_eq!(Int32.promote_for(Double), Double);
    assert_eq!(Contiguous.promote_for(Int32), Contiguous);
}

#[test]
fn merge_indexing_types() {
    use IndexingType::*;
    assert_eq!(
        merge_for_copy(Int32, Int32, false),
        MergedIndexingType::Merged(Int32)
    );
    assert_eq!(
        merge_for_copy(Initial, Double, false),
        MergedIndexingType::Merged(Double)
    );
    assert_eq!(
        merge_for_copy(Int32, Contiguous, false),
        MergedIndexingType::Merged(Contiguous)
    );
    assert_eq!(
        merge_for_copy(Int32, Double, false),
        MergedIndexingType::NotRepresentable
    );
    assert_eq!(
        merge_for_copy(Int32, Double, true),
        MergedIndexingType::Merged(Double)
    );
    assert_eq!(
        merge_for_copy(Double, Contiguous, true),
        MergedIndexingType::Merged(Contiguous)
    );
    assert_eq!(
        merge_for_copy(Contiguous, ArrayStorage, true),
        MergedIndexingType::NotRepresentable
    );
}

#[test]
fn fast_indexed_access() {
    assert!(can_fast_indexed_access(IndexingType::Contiguous, false));
    assert!(!can_fast_indexed_access(IndexingType::Contiguous, true));
    assert!(!can_fast_indexed_access(IndexingType::ArrayStorage, false));
}
