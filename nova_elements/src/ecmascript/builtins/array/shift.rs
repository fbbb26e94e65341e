// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Removal and insertion of element ranges in the middle or at the front of
//! an array.
//!
//! Dense encodings move the tail of the array. Once the tail gets long the
//! array is converted to the queue encoding, where the front side of the
//! range can be moved instead and the index bias absorbs the difference.
//! Holes move along with the elements unless the prototype chain could
//! supply values for them. Sparse entries move with the storage as long as
//! they are plain data elements. Both operations return false when the array
//! must take the generic per-element path, or when the range is out of
//! bounds; the array is then unchanged apart from a possible conversion to
//! the queue encoding.

use super::{Array, ArrayHeapData};
use crate::{
    ecmascript::execution::{Agent, Options},
    engine::context::NoGcScope,
    heap::{
        Heap,
        bulk_ops::{contains_hole, move_within},
        element_array::SlotsRef,
        heap_constants::{MAX_ARRAY_LENGTH, MAX_STORAGE_VECTOR_LENGTH},
        indexing_type::IndexingType,
        sparse_map::SparseIndexMap,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftCountMode {
    /// Removing elements from the front: long tails convert the array to
    /// the queue encoding.
    ForShift,
    /// Removing elements from the middle: the tail is always moved.
    ForSplice,
}

impl ShiftCountMode {
    fn threshold(self, options: &Options) -> u32 {
        match self {
            ShiftCountMode::ForShift => options.shift_queue_threshold,
            ShiftCountMode::ForSplice => u32::MAX,
        }
    }
}

/// Removes the `count` elements at `start..start + count`. The following
/// elements move down by `count` and the length drops by `count`.
pub fn shift_count(
    agent: &mut Agent,
    array: Array,
    start: u32,
    count: u32,
    mode: ShiftCountMode,
) -> bool {
    let holes_must_forward = array.holes_must_forward_to_prototype(agent);
    let options = agent.options;
    agent.heap.with_array_data(array, |heap, data, gc| {
        if start as u64 + count as u64 > data.length as u64 {
            return false;
        }
        if count == 0 {
            return true;
        }
        if data.length_is_read_only() {
            return false;
        }
        if data.indexing_type() != IndexingType::ArrayStorage {
            let moved = data.length - (start + count);
            if moved < mode.threshold(&options) && !(holes_must_forward && data.contains_hole()) {
                shift_dense(heap, data, start, count);
                return true;
            }
            if data.ensure_array_storage(heap, &options, gc).is_err() {
                return false;
            }
            tracing::debug!(moved, "shift converted array to queue storage");
        }
        shift_array_storage(heap, data, start, count, holes_must_forward)
    })
}

fn shift_dense(heap: &mut Heap, data: &mut ArrayHeapData, start: u32, count: u32) {
    let stored = data.dense_len();
    let indexing_type = data.indexing_type();
    if let Some(storage) = data.storage.as_mut() {
        let gc_safe = heap.needs_gc_safe_ops(indexing_type);
        if start + count < stored {
            move_within(heap, storage, start + count, start, stored - start - count, gc_safe);
        }
        let vacated = stored.saturating_sub(count).max(start)..stored;
        storage.clear_range(heap, vacated, gc_safe);
    }
    data.length -= count;
}

fn shift_array_storage(
    heap: &mut Heap,
    data: &mut ArrayHeapData,
    start: u32,
    count: u32,
    holes_must_forward: bool,
) -> bool {
    let old_length = data.length;
    if !can_move_sparse_entries(data, holes_must_forward) {
        return false;
    }
    let Some(storage) = data.storage.as_mut() else {
        return false;
    };
    let stored = old_length.min(storage.capacity());
    if start + count > stored {
        return false;
    }
    if let Some(sparse) = data.sparse.as_mut() {
        sparse.remove_range(heap, start, start + count);
        sparse.shift_indices_from(start + count, -(count as i64));
    }
    let bias = storage.index_bias() as usize;
    let (start, count, stored) = (start as usize, count as usize, stored as usize);
    let before = start;
    let after = stored - (start + count);
    let num_values = storage.num_values_in_vector();
    let values = storage.physical_values_mut();
    let removed = &values[bias + start..bias + start + count];
    let removed_values = removed.iter().filter(|value| value.is_some()).count() as u32;
    if heap.is_marking() {
        removed.iter().for_each(|&value| heap.write_barrier(value));
    }
    if before < after {
        values.copy_within(bias..bias + start, bias + count);
        values[bias..bias + count].fill(None);
        storage.set_index_bias((bias + count) as u32);
    } else {
        values.copy_within(bias + start + count..bias + stored, bias + start);
        values[bias + stored - count..bias + stored].fill(None);
    }
    storage.set_num_values_in_vector(num_values - removed_values);
    data.length = old_length - count as u32;
    true
}

/// Queue storage moves its sparse entries along with the slots. That is
/// only unobservable for plain data entries, and only if no hole needs to
/// read through to the prototype.
fn can_move_sparse_entries(data: &ArrayHeapData, holes_must_forward: bool) -> bool {
    if holes_must_forward && data.count_values() != data.length {
        return false;
    }
    data.sparse().is_none_or(SparseIndexMap::has_only_plain_data)
}

/// Inserts `count` holes at `start`. The following elements move up by
/// `count` and the length grows by `count`.
pub fn unshift_count(agent: &mut Agent, array: Array, start: u32, count: u32) -> bool {
    let holes_must_forward = array.holes_must_forward_to_prototype(agent);
    let options = agent.options;
    agent.heap.with_array_data(array, |heap, data, gc| {
        if start > data.length || data.length as u64 + count as u64 > MAX_ARRAY_LENGTH {
            return false;
        }
        if count == 0 {
            return true;
        }
        if data.length_is_read_only() {
            return false;
        }
        if data.indexing_type() != IndexingType::ArrayStorage {
            let old_length = data.length;
            if old_length - start < options.min_sparse_array_index
                && !has_holes_in(data, start, old_length)
            {
                return unshift_dense(heap, &options, data, start, count, gc);
            }
            if data.ensure_array_storage(heap, &options, gc).is_err() {
                return false;
            }
            tracing::debug!(old_length, "unshift converted array to queue storage");
        }
        unshift_array_storage(heap, &options, data, start, count, holes_must_forward, gc)
    })
}

fn has_holes_in(data: &ArrayHeapData, start: u32, end: u32) -> bool {
    if start >= end {
        return false;
    }
    let Some(storage) = data.storage.as_ref().filter(|_| end <= data.capacity()) else {
        return true;
    };
    let range = start as usize..end as usize;
    match storage.view() {
        SlotsRef::Int32(slots) => contains_hole(&slots[range]),
        SlotsRef::Double(slots) => contains_hole(&slots[range]),
        SlotsRef::Boxed(slots) => contains_hole(&slots[range]),
    }
}

fn unshift_dense(
    heap: &mut Heap,
    options: &Options,
    data: &mut ArrayHeapData,
    start: u32,
    count: u32,
    gc: NoGcScope<'_>,
) -> bool {
    let old_length = data.length;
    let new_length = old_length as u64 + count as u64;
    if new_length > MAX_STORAGE_VECTOR_LENGTH as u64 {
        return false;
    }
    let indexing_type = data.indexing_type();
    if data
        .grow_and_promote(heap, options, indexing_type, new_length, gc)
        .is_err()
    {
        return false;
    }
    if let Some(storage) = data.storage.as_mut() {
        let gc_safe = heap.needs_gc_safe_ops(indexing_type);
        move_within(heap, storage, start, start + count, old_length - start, gc_safe);
        storage.clear_range(heap, start..start + count, gc_safe);
    }
    data.length = new_length as u32;
    true
}

fn unshift_array_storage(
    heap: &mut Heap,
    options: &Options,
    data: &mut ArrayHeapData,
    start: u32,
    count: u32,
    holes_must_forward: bool,
    gc: NoGcScope<'_>,
) -> bool {
    let length = data.length;
    if !can_move_sparse_entries(data, holes_must_forward) {
        return false;
    }
    let Some(storage) = data.storage.as_mut() else {
        return false;
    };
    let stored = length.min(storage.capacity());
    if start > stored {
        return false;
    }
    let move_front = start == 0 || start < length / 2;
    let fits = if move_front {
        storage.index_bias() >= count
    } else {
        storage.capacity() - stored >= count
    };
    if !fits {
        let required = stored as u64 + count as u64;
        if required > MAX_STORAGE_VECTOR_LENGTH as u64 {
            return false;
        }
        let required = required as u32;
        let desired = ((options.base_array_storage_vector_length.max(required) as u64) << 1)
            .min(MAX_STORAGE_VECTOR_LENGTH as u64) as u32;
        let index_bias = if move_front && desired - required >= count {
            desired - required
        } else {
            0
        };
        if storage.reallocate(heap, desired, index_bias, gc).is_err() {
            return false;
        }
    }
    if let Some(sparse) = data.sparse.as_mut() {
        sparse.shift_indices_from(start, count as i64);
    }
    let front = move_front && storage.index_bias() >= count;
    if front {
        storage.set_index_bias(storage.index_bias() - count);
    }
    let bias = storage.index_bias() as usize;
    let (start, count, stored) = (start as usize, count as usize, stored as usize);
    let values = storage.physical_values_mut();
    if front {
        values.copy_within(bias + count..bias + count + start, bias);
    } else {
        values.copy_within(bias + start..bias + stored, bias + start + count);
    }
    values[bias + start..bias + start + count].fill(None);
    data.length += count as u32;
    true
}
