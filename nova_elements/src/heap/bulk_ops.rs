// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bulk element operations.
//!
//! Slices are copied raw only when both sides share an encoding and no trace
//! can observe the overwritten slots. Every other copy goes element by
//! element, and boxed slots it overwrites pass through the write barrier.
//!
//! The `fast_*` routines are the dense fast paths of the array library
//! routines. They return `None` (or `false`) when the array cannot be handled
//! from its storage alone, and the caller takes the generic per-element path.

use std::ops::Range;

use super::{
    Heap,
    element_array::{DOUBLE_HOLE, IndexedStorage, SlotsMut, SlotsRef},
    heap_constants::MAX_STORAGE_VECTOR_LENGTH,
    indexing_type::{
        IndexingType, MergedIndexingType, can_fast_indexed_access, classify, merge_for_copy,
    },
};
use crate::ecmascript::{
    builtins::{Array, ArrayHeapData},
    execution::{Agent, JsResult},
    types::{Value, is_strictly_equal, same_value_zero},
};

/// What a hole in the source becomes in the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayFillMode {
    Undefined,
    Empty,
}

/// Whether writes into existing boxed storage must run the write barrier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NeedsGcSafeOps {
    No,
    Yes,
}

pub trait IsHole {
    fn is_hole(&self) -> bool;
}

impl IsHole for Option<i32> {
    #[inline]
    fn is_hole(&self) -> bool {
        self.is_none()
    }
}

impl IsHole for f64 {
    #[inline]
    fn is_hole(&self) -> bool {
        self.is_nan()
    }
}

impl IsHole for Option<Value> {
    #[inline]
    fn is_hole(&self) -> bool {
        self.is_none()
    }
}

pub fn contains_hole<T: IsHole>(slots: &[T]) -> bool {
    slots.iter().any(IsHole::is_hole)
}

#[inline]
fn write_boxed(
    heap: &mut Heap,
    slot: &mut Option<Value>,
    value: Option<Value>,
    gc_safe: NeedsGcSafeOps,
) {
    let old = std::mem::replace(slot, value);
    if gc_safe == NeedsGcSafeOps::Yes {
        heap.write_barrier(old);
    }
}

/// Copies the logical slots `src_range` of `src` into `dst`, starting at
/// `dst_offset`, converting every element to the encoding of `dst`.
///
/// `dst` must have room for the copied slots and be at least as general as
/// `src`. Source indices past the capacity of `src` are holes. With
/// [`ArrayFillMode::Undefined`], holes become undefined, which requires a
/// boxed `dst` if the range has holes.
pub(crate) fn copy_array_elements(
    heap: &mut Heap,
    dst: &mut IndexedStorage,
    dst_offset: u32,
    src: &IndexedStorage,
    src_range: Range<u32>,
    fill_mode: ArrayFillMode,
    gc_safe: NeedsGcSafeOps,
) {
    let stored_end = src_range.end.min(src.capacity()).max(src_range.start);
    if stored_end < src_range.end {
        let tail = dst_offset + (stored_end - src_range.start)
            ..dst_offset + (src_range.end - src_range.start);
        match fill_mode {
            ArrayFillMode::Undefined => fill_range(heap, dst, tail, Value::Undefined, gc_safe),
            ArrayFillMode::Empty => dst.clear_range(heap, tail, gc_safe),
        }
    }
    let count = (stored_end - src_range.start) as usize;
    if count == 0 {
        return;
    }
    let from = src_range.start as usize..stored_end as usize;
    let to = dst_offset as usize..dst_offset as usize + count;
    let fill = match fill_mode {
        ArrayFillMode::Undefined => Some(Value::Undefined),
        ArrayFillMode::Empty => None,
    };
    match (src.view(), dst.view_mut()) {
        (SlotsRef::Int32(src), SlotsMut::Int32(dst)) => {
            debug_assert!(fill.is_none() || !contains_hole(&src[from.clone()]));
            dst[to].copy_from_slice(&src[from]);
        }
        (SlotsRef::Double(src), SlotsMut::Double(dst)) => {
            debug_assert!(fill.is_none() || !contains_hole(&src[from.clone()]));
            dst[to].copy_from_slice(&src[from]);
        }
        (SlotsRef::Int32(src), SlotsMut::Double(dst)) => {
            for (dst, src) in dst[to].iter_mut().zip(&src[from]) {
                *dst = src.map_or(DOUBLE_HOLE, f64::from);
            }
        }
        (SlotsRef::Int32(src), SlotsMut::Boxed(dst)) => {
            for (dst, src) in dst[to].iter_mut().zip(&src[from]) {
                write_boxed(heap, dst, src.map(Value::from).or(fill), gc_safe);
            }
        }
        (SlotsRef::Double(src), SlotsMut::Boxed(dst)) => {
            for (dst, &src) in dst[to].iter_mut().zip(&src[from]) {
                let value = if src.is_hole() {
                    fill
                } else {
                    Some(Value::from_f64(heap, src))
                };
                write_boxed(heap, dst, value, gc_safe);
            }
        }
        (SlotsRef::Boxed(src), SlotsMut::Boxed(dst)) => {
            if gc_safe == NeedsGcSafeOps::No && fill.is_none() {
                dst[to].copy_from_slice(&src[from]);
            } else {
                for (dst, src) in dst[to].iter_mut().zip(&src[from]) {
                    write_boxed(heap, dst, src.or(fill), gc_safe);
                }
            }
        }
        _ => unreachable!("copy into a narrower encoding"),
    }
    if dst.indexing_type() == IndexingType::ArrayStorage {
        dst.set_num_values_in_vector(dst.count_values(u32::MAX));
    }
}

/// Moves `count` logical slots from `from` to `to` inside one storage, with
/// `memmove` semantics. Vacated slots keep their old contents. The value
/// count of queue storage is not maintained.
pub(crate) fn move_within(
    heap: &mut Heap,
    storage: &mut IndexedStorage,
    from: u32,
    to: u32,
    count: u32,
    gc_safe: NeedsGcSafeOps,
) {
    let src = from as usize..(from + count) as usize;
    match storage.view_mut() {
        SlotsMut::Int32(slots) => slots.copy_within(src, to as usize),
        SlotsMut::Double(slots) => slots.copy_within(src, to as usize),
        SlotsMut::Boxed(slots) => move_values(heap, slots, src, to as usize, gc_safe),
    }
}

/// `memmove` over boxed slots.
pub(crate) fn move_values(
    heap: &mut Heap,
    slots: &mut [Option<Value>],
    src: Range<usize>,
    dst: usize,
    gc_safe: NeedsGcSafeOps,
) {
    if gc_safe == NeedsGcSafeOps::No {
        slots.copy_within(src, dst);
        return;
    }
    let count = src.len();
    let mut move_one = |i: usize| {
        let value = slots[src.start + i];
        let old = std::mem::replace(&mut slots[dst + i], value);
        heap.write_barrier(old);
    };
    if dst <= src.start {
        (0..count).for_each(&mut move_one);
    } else {
        (0..count).rev().for_each(&mut move_one);
    }
}

/// Writes `value` into every logical slot of `range`. The storage must be
/// able to hold `value`.
fn fill_range(
    heap: &mut Heap,
    storage: &mut IndexedStorage,
    range: Range<u32>,
    value: Value,
    gc_safe: NeedsGcSafeOps,
) {
    debug_assert!(storage.can_store(value));
    let range = range.start as usize..range.end as usize;
    let number = value.as_f64(&*heap);
    match storage.view_mut() {
        SlotsMut::Int32(slots) => slots[range].fill(value.as_i32()),
        SlotsMut::Double(slots) => slots[range].fill(number.unwrap_or(DOUBLE_HOLE)),
        SlotsMut::Boxed(slots) => {
            for slot in &mut slots[range] {
                write_boxed(heap, slot, Some(value), gc_safe);
            }
        }
    }
    if storage.indexing_type() == IndexingType::ArrayStorage {
        storage.set_num_values_in_vector(storage.count_values(u32::MAX));
    }
}

fn reverse_range(heap: &mut Heap, storage: &mut IndexedStorage, len: u32, gc_safe: NeedsGcSafeOps) {
    let len = len as usize;
    match storage.view_mut() {
        SlotsMut::Int32(slots) => slots[..len].reverse(),
        SlotsMut::Double(slots) => slots[..len].reverse(),
        SlotsMut::Boxed(slots) => {
            slots[..len].reverse();
            if gc_safe == NeedsGcSafeOps::Yes {
                slots[..len]
                    .iter()
                    .for_each(|&value| heap.write_barrier(value));
            }
        }
    }
}

/// Returns the encoding of `array` if its elements below `length` can be
/// read from storage alone.
fn fast_access_type(agent: &Agent, array: Array) -> Option<IndexingType> {
    let data = &agent.heap[array];
    let indexing_type = data.indexing_type();
    let holes_must_forward =
        agent.host_hooks.holes_must_forward_to_prototype(array) && data.contains_hole();
    can_fast_indexed_access(indexing_type, holes_must_forward).then_some(indexing_type)
}

/// Encoding of a dense copy of `array` in which holes read as undefined.
fn filled_copy_type(agent: &Agent, array: Array, indexing_type: IndexingType) -> IndexingType {
    if agent.heap[array].contains_hole() {
        indexing_type.promote_for(IndexingType::Contiguous)
    } else {
        indexing_type
    }
}

/// Heap data of a new array with exactly `length` slots of storage.
fn new_array_data(
    heap: &mut Heap,
    indexing_type: IndexingType,
    length: u32,
) -> Option<ArrayHeapData> {
    let storage = if indexing_type == IndexingType::Initial || length == 0 {
        None
    } else {
        Some(IndexedStorage::try_create(heap, indexing_type, length)?)
    };
    Some(ArrayHeapData {
        length,
        storage,
        sparse: None,
    })
}

/// Fills `start..end` of the array with `value`, promoting the storage if
/// needed. `end` must not exceed the length.
pub(crate) fn fast_fill(
    agent: &mut Agent,
    array: Array,
    value: Value,
    start: u32,
    end: u32,
) -> bool {
    let indexing_type = agent.heap[array].indexing_type();
    if indexing_type == IndexingType::ArrayStorage {
        return false;
    }
    if start >= end {
        return true;
    }
    let target = indexing_type.promote_for(classify(value));
    let options = agent.options;
    agent.heap.with_array_data(array, |heap, data, gc| {
        debug_assert!(end <= data.length);
        if data
            .grow_and_promote(heap, &options, target, end as u64, gc)
            .is_err()
        {
            return false;
        }
        let Some(storage) = data.storage.as_mut() else {
            return false;
        };
        let gc_safe = heap.needs_gc_safe_ops(target);
        fill_range(heap, storage, start..end, value, gc_safe);
        true
    })
}

/// Copies `start..end` of `source` into a new array of the same encoding.
/// Holes stay holes.
pub(crate) fn fast_slice(agent: &mut Agent, source: Array, start: u32, end: u32) -> Option<Array> {
    let indexing_type = fast_access_type(agent, source)?;
    let count = end.saturating_sub(start);
    let mut result = new_array_data(&mut agent.heap, indexing_type, count)?;
    agent.heap.with_array_data(source, |heap, data, _| {
        if let (Some(dst), Some(src)) = (result.storage.as_mut(), data.storage.as_ref()) {
            copy_array_elements(
                heap,
                dst,
                0,
                src,
                start..end,
                ArrayFillMode::Empty,
                NeedsGcSafeOps::No,
            );
        }
    });
    Some(agent.heap.create_array(result))
}

/// Creates a copy of `source` with `delete_count` elements at `start`
/// replaced by `items`. Holes read as undefined.
pub(crate) fn fast_to_spliced(
    agent: &mut Agent,
    source: Array,
    start: u32,
    delete_count: u32,
    items: &[Value],
) -> Option<Array> {
    let indexing_type = fast_access_type(agent, source)?;
    let length = agent.heap[source].len();
    let new_length = length as u64 - delete_count as u64 + items.len() as u64;
    if new_length > MAX_STORAGE_VECTOR_LENGTH as u64 {
        return None;
    }
    let new_length = new_length as u32;
    let result_type = items.iter().fold(
        filled_copy_type(agent, source, indexing_type),
        |indexing_type, &item| indexing_type.promote_for(classify(item)),
    );
    let mut result = new_array_data(&mut agent.heap, result_type, new_length)?;
    let resume = start + items.len() as u32;
    agent.heap.with_array_data(source, |heap, data, _| {
        let Some(dst) = result.storage.as_mut() else {
            return;
        };
        match data.storage.as_ref() {
            Some(src) => {
                copy_array_elements(
                    heap,
                    dst,
                    0,
                    src,
                    0..start,
                    ArrayFillMode::Undefined,
                    NeedsGcSafeOps::No,
                );
                copy_array_elements(
                    heap,
                    dst,
                    resume,
                    src,
                    start + delete_count..length,
                    ArrayFillMode::Undefined,
                    NeedsGcSafeOps::No,
                );
            }
            // Without storage every slot is a hole, so `dst` is boxed.
            None if length > 0 => {
                fill_range(heap, dst, 0..new_length, Value::Undefined, NeedsGcSafeOps::No)
            }
            None => {}
        }
        for (index, &item) in (start..).zip(items) {
            dst.set(heap, index, item);
        }
    });
    Some(agent.heap.create_array(result))
}

/// Reverses the array in place. Holes move like elements.
pub(crate) fn fast_reverse(agent: &mut Agent, array: Array) -> bool {
    let Some(indexing_type) = fast_access_type(agent, array) else {
        return false;
    };
    let data = &agent.heap[array];
    if data.storage.is_some() && data.len() > data.capacity() {
        return false;
    }
    agent.heap.with_array_data(array, |heap, data, _| {
        let length = data.length;
        if let Some(storage) = data.storage.as_mut() {
            let gc_safe = heap.needs_gc_safe_ops(indexing_type);
            reverse_range(heap, storage, length, gc_safe);
        }
    });
    true
}

/// Creates a reversed copy of `source`. Holes read as undefined.
pub(crate) fn fast_to_reversed(agent: &mut Agent, source: Array) -> Option<Array> {
    let indexing_type = fast_access_type(agent, source)?;
    let length = agent.heap[source].len();
    let result_type = filled_copy_type(agent, source, indexing_type);
    let mut result = new_array_data(&mut agent.heap, result_type, length)?;
    agent.heap.with_array_data(source, |heap, data, _| {
        let Some(dst) = result.storage.as_mut() else {
            return;
        };
        match data.storage.as_ref() {
            Some(src) => copy_array_elements(
                heap,
                dst,
                0,
                src,
                0..length,
                ArrayFillMode::Undefined,
                NeedsGcSafeOps::No,
            ),
            None => fill_range(heap, dst, 0..length, Value::Undefined, NeedsGcSafeOps::No),
        }
        reverse_range(heap, dst, length, NeedsGcSafeOps::No);
    });
    Some(agent.heap.create_array(result))
}

/// Creates a copy of `source` with the element at `index` replaced. Holes
/// read as undefined.
pub(crate) fn fast_with(
    agent: &mut Agent,
    source: Array,
    index: u32,
    value: Value,
) -> Option<Array> {
    let indexing_type = fast_access_type(agent, source)?;
    let length = agent.heap[source].len();
    debug_assert!(index < length);
    let result_type = filled_copy_type(agent, source, indexing_type).promote_for(classify(value));
    let mut result = new_array_data(&mut agent.heap, result_type, length)?;
    agent.heap.with_array_data(source, |heap, data, _| {
        let Some(dst) = result.storage.as_mut() else {
            return;
        };
        match data.storage.as_ref() {
            Some(src) => copy_array_elements(
                heap,
                dst,
                0,
                src,
                0..length,
                ArrayFillMode::Undefined,
                NeedsGcSafeOps::No,
            ),
            None => fill_range(heap, dst, 0..length, Value::Undefined, NeedsGcSafeOps::No),
        }
        dst.set(heap, index, value);
    });
    Some(agent.heap.create_array(result))
}

/// Copies `count` elements from `start` to `target` within the array. Holes
/// in the source range become holes at the target.
pub(crate) fn fast_copy_within(
    agent: &mut Agent,
    array: Array,
    target: u32,
    start: u32,
    count: u32,
) -> bool {
    let Some(indexing_type) = fast_access_type(agent, array) else {
        return false;
    };
    if count == 0 || target == start {
        return true;
    }
    let data = &agent.heap[array];
    debug_assert!(start.max(target) + count <= data.len());
    if data.storage.is_some() && start.max(target) + count > data.capacity() {
        return false;
    }
    agent.heap.with_array_data(array, |heap, data, _| {
        if let Some(storage) = data.storage.as_mut() {
            let gc_safe = heap.needs_gc_safe_ops(indexing_type);
            move_within(heap, storage, start, target, count, gc_safe);
        }
    });
    true
}

/// SameValueZero search from `from`. Holes match undefined.
pub(crate) fn fast_includes(agent: &Agent, array: Array, search: Value, from: u32) -> Option<bool> {
    fast_access_type(agent, array)?;
    let data = &agent.heap[array];
    let length = data.len();
    if from >= length {
        return Some(false);
    }
    let stored = data.dense_len();
    if search.is_undefined() && stored < length {
        return Some(true);
    }
    let Some(storage) = data.storage().filter(|_| from < stored) else {
        return Some(false);
    };
    let range = from as usize..stored as usize;
    let heap = &agent.heap;
    Some(match storage.view() {
        SlotsRef::Int32(slots) => {
            let slots = &slots[range];
            if search.is_undefined() {
                contains_hole(slots)
            } else {
                exact_i32(search.as_f64(heap)).is_some_and(|int| slots.contains(&Some(int)))
            }
        }
        SlotsRef::Double(slots) => {
            let slots = &slots[range];
            if search.is_undefined() {
                contains_hole(slots)
            } else {
                // NaN never matches: a NaN slot is a hole.
                search
                    .as_f64(heap)
                    .is_some_and(|number| slots.iter().any(|&slot| slot == number))
            }
        }
        SlotsRef::Boxed(slots) => slots[range].iter().any(|slot| match slot {
            Some(value) => same_value_zero(heap, *value, search),
            None => search.is_undefined(),
        }),
    })
}

/// Strict equality search from `from`. Holes are skipped.
pub(crate) fn fast_index_of(
    agent: &Agent,
    array: Array,
    search: Value,
    from: u32,
) -> Option<Option<u32>> {
    fast_access_type(agent, array)?;
    let data = &agent.heap[array];
    let stored = data.dense_len();
    let Some(storage) = data.storage().filter(|_| from < stored) else {
        return Some(None);
    };
    let range = from as usize..stored as usize;
    let heap = &agent.heap;
    let position = match storage.view() {
        SlotsRef::Int32(slots) => exact_i32(search.as_f64(heap))
            .and_then(|int| slots[range].iter().position(|&slot| slot == Some(int))),
        SlotsRef::Double(slots) => search
            .as_f64(heap)
            .and_then(|number| slots[range].iter().position(|&slot| slot == number)),
        SlotsRef::Boxed(slots) => slots[range]
            .iter()
            .position(|slot| slot.is_some_and(|value| is_strictly_equal(heap, value, search))),
    };
    Some(position.map(|position| from + position as u32))
}

/// Strict equality search backwards from `from`. Holes are skipped.
pub(crate) fn fast_last_index_of(
    agent: &Agent,
    array: Array,
    search: Value,
    from: u32,
) -> Option<Option<u32>> {
    fast_access_type(agent, array)?;
    let data = &agent.heap[array];
    let Some(storage) = data.storage() else {
        return Some(None);
    };
    let end = data.dense_len().min(from.saturating_add(1));
    let range = 0..end as usize;
    let heap = &agent.heap;
    let position = match storage.view() {
        SlotsRef::Int32(slots) => exact_i32(search.as_f64(heap))
            .and_then(|int| slots[range].iter().rposition(|&slot| slot == Some(int))),
        SlotsRef::Double(slots) => search
            .as_f64(heap)
            .and_then(|number| slots[range].iter().rposition(|&slot| slot == number)),
        SlotsRef::Boxed(slots) => slots[range]
            .iter()
            .rposition(|slot| slot.is_some_and(|value| is_strictly_equal(heap, value, search))),
    };
    Some(position.map(|position| position as u32))
}

fn exact_i32(number: Option<f64>) -> Option<i32> {
    let number = number?;
    let int = number as i32;
    (int as f64 == number).then_some(int)
}

/// Joins the elements with `separator`. Holes, undefined and null become
/// empty strings. Gives up on nested arrays.
pub(crate) fn fast_join(agent: &Agent, array: Array, separator: &str) -> Option<String> {
    fast_access_type(agent, array)?;
    let data = &agent.heap[array];
    let length = data.len() as usize;
    let stored = data.dense_len() as usize;
    let heap = &agent.heap;
    let mut result = String::new();
    let mut buffer = ryu_js::Buffer::new();
    let push_separator = |result: &mut String, index: usize| {
        if index > 0 {
            result.push_str(separator);
        }
    };
    match data.storage().map(IndexedStorage::view) {
        None => {}
        Some(SlotsRef::Int32(slots)) => {
            for (index, slot) in slots[..stored].iter().enumerate() {
                push_separator(&mut result, index);
                if let Some(int) = slot {
                    result.push_str(&int.to_string());
                }
            }
        }
        Some(SlotsRef::Double(slots)) => {
            for (index, &slot) in slots[..stored].iter().enumerate() {
                push_separator(&mut result, index);
                if !slot.is_hole() {
                    result.push_str(buffer.format(slot));
                }
            }
        }
        Some(SlotsRef::Boxed(slots)) => {
            for (index, slot) in slots[..stored].iter().enumerate() {
                push_separator(&mut result, index);
                match slot {
                    None | Some(Value::Undefined | Value::Null) => {}
                    Some(Value::Boolean(boolean)) => {
                        result.push_str(if *boolean { "true" } else { "false" })
                    }
                    Some(Value::Integer(int)) => result.push_str(&int.into_i64().to_string()),
                    Some(value @ (Value::SmallF64(_) | Value::Number(_))) => {
                        let number = value.as_f64(heap)?;
                        result.push_str(buffer.format(number));
                    }
                    Some(Value::String(string)) => result.push_str(&heap[*string]),
                    Some(Value::Array(_)) => return None,
                }
            }
        }
    }
    (stored..length).for_each(|index| push_separator(&mut result, index));
    Some(result)
}

/// Elements gathered for sorting. Undefined values are only counted.
#[derive(Debug, Default)]
pub(crate) struct SortCompacted {
    pub(crate) values: Vec<Value>,
    pub(crate) undefined_count: u32,
}

/// Gathers the elements of `array` for sorting, skipping holes.
pub(crate) fn fast_sort_compact(agent: &mut Agent, array: Array) -> Option<SortCompacted> {
    fast_access_type(agent, array)?;
    let data = &agent.heap[array];
    let stored = data.dense_len() as usize;
    let mut compacted = SortCompacted::default();
    let Some(storage) = data.storage() else {
        return Some(compacted);
    };
    let numbers: Vec<f64> = match storage.view() {
        SlotsRef::Int32(slots) => {
            compacted
                .values
                .extend(slots[..stored].iter().flatten().map(|&int| Value::from(int)));
            Vec::new()
        }
        SlotsRef::Double(slots) => slots[..stored]
            .iter()
            .copied()
            .filter(|slot| !slot.is_hole())
            .collect(),
        SlotsRef::Boxed(slots) => {
            for &value in slots[..stored].iter().flatten() {
                if value.is_undefined() {
                    compacted.undefined_count += 1;
                } else {
                    compacted.values.push(value);
                }
            }
            Vec::new()
        }
    };
    for number in numbers {
        let value = Value::from_f64(&mut agent.heap, number);
        compacted.values.push(value);
    }
    Some(compacted)
}

/// Writes `sorted` followed by `undefined_count` undefined values to the
/// front of `array` and turns the remaining slots below `length` into holes.
/// The array must still have the `length` it had when it was compacted.
pub(crate) fn fast_sort_commit(
    agent: &mut Agent,
    array: Array,
    sorted: &[Value],
    undefined_count: u32,
    length: u32,
) -> bool {
    let data = &agent.heap[array];
    if data.len() != length || data.indexing_type() == IndexingType::ArrayStorage {
        return false;
    }
    let filled = sorted.len() as u64 + undefined_count as u64;
    if filled > length as u64 {
        return false;
    }
    let mut target = sorted
        .iter()
        .fold(data.indexing_type(), |target, &value| target.promote_for(classify(value)));
    if undefined_count > 0 {
        target = target.promote_for(IndexingType::Contiguous);
    }
    let options = agent.options;
    agent.heap.with_array_data(array, |heap, data, gc| {
        if data
            .grow_and_promote(heap, &options, target, filled, gc)
            .is_err()
        {
            return false;
        }
        let Some(storage) = data.storage.as_mut() else {
            return filled == 0;
        };
        for (index, &value) in (0..).zip(sorted) {
            storage.set(heap, index, value);
        }
        for index in sorted.len() as u32..filled as u32 {
            storage.set(heap, index, Value::Undefined);
        }
        let gc_safe = heap.needs_gc_safe_ops(target);
        storage.clear_range(heap, filled as u32..length, gc_safe);
        true
    })
}

#[derive(Debug, Clone, Copy)]
enum FlatElement {
    Int32(i32),
    Double(f64),
    Value(Value),
}

/// Flattens nested arrays up to `depth` levels into a new dense array.
/// Holes are skipped. Gives up on self-containing arrays.
pub(crate) fn fast_flat(agent: &mut Agent, source: Array, depth: u32) -> Option<Array> {
    let mut elements = Vec::new();
    let mut indexing_type = IndexingType::Initial;
    let mut ancestors = Vec::new();
    collect_flat(
        agent,
        source,
        depth,
        &mut ancestors,
        &mut elements,
        &mut indexing_type,
    )?;
    let length = u32::try_from(elements.len()).ok()?;
    let mut result = new_array_data(&mut agent.heap, indexing_type, length)?;
    if let Some(storage) = result.storage.as_mut() {
        for (index, element) in (0..).zip(elements) {
            let value = match element {
                FlatElement::Int32(int) => Value::from(int),
                FlatElement::Double(number) => Value::from_f64(&mut agent.heap, number),
                FlatElement::Value(value) => value,
            };
            storage.set(&mut agent.heap, index, value);
        }
    }
    Some(agent.heap.create_array(result))
}

fn collect_flat(
    agent: &Agent,
    array: Array,
    depth: u32,
    ancestors: &mut Vec<Array>,
    out: &mut Vec<FlatElement>,
    indexing_type: &mut IndexingType,
) -> Option<()> {
    fast_access_type(agent, array)?;
    if ancestors.contains(&array) {
        return None;
    }
    ancestors.push(array);
    let data = &agent.heap[array];
    let length = data.dense_len() as usize;
    match data.storage().map(IndexedStorage::view) {
        None => {}
        Some(SlotsRef::Int32(slots)) => {
            for &int in slots[..length].iter().flatten() {
                out.push(FlatElement::Int32(int));
                *indexing_type = indexing_type.promote_for(IndexingType::Int32);
            }
        }
        Some(SlotsRef::Double(slots)) => {
            for &number in slots[..length].iter().filter(|slot| !slot.is_hole()) {
                out.push(FlatElement::Double(number));
                *indexing_type = indexing_type.promote_for(IndexingType::Double);
            }
        }
        Some(SlotsRef::Boxed(slots)) => {
            for &value in slots[..length].iter().flatten() {
                match value {
                    Value::Array(nested) if depth > 0 => {
                        collect_flat(agent, nested, depth - 1, ancestors, out, indexing_type)?
                    }
                    value => {
                        out.push(FlatElement::Value(value));
                        *indexing_type = indexing_type.promote_for(classify(value));
                    }
                }
            }
        }
    }
    ancestors.pop();
    Some(())
}

/// Copies all elements of `source` into `target` starting at `offset`,
/// promoting `target` as needed. Holes stay holes. The length of `target`
/// grows to cover the copied range.
pub(crate) fn append_memcpy(agent: &mut Agent, target: Array, source: Array, offset: u32) -> bool {
    if target == source {
        return false;
    }
    let Some(source_type) = fast_access_type(agent, source) else {
        return false;
    };
    let target_type = agent.heap[target].indexing_type();
    let MergedIndexingType::Merged(merged) = merge_for_copy(target_type, source_type, true) else {
        return false;
    };
    let source_length = agent.heap[source].len();
    let new_length = offset as u64 + source_length as u64;
    if new_length > MAX_STORAGE_VECTOR_LENGTH as u64 {
        return false;
    }
    let options = agent.options;
    agent.heap.with_array_data(target, |heap, target_data, gc| {
        heap.with_array_data(source, |heap, source_data, _| {
            if target_data
                .grow_and_promote(heap, &options, merged, new_length, gc)
                .is_err()
            {
                return false;
            }
            if let (Some(dst), Some(src)) =
                (target_data.storage.as_mut(), source_data.storage.as_ref())
            {
                let gc_safe = heap.needs_gc_safe_ops(merged);
                copy_array_elements(
                    heap,
                    dst,
                    offset,
                    src,
                    0..source_length,
                    ArrayFillMode::Empty,
                    gc_safe,
                );
            }
            target_data.length = target_data.length.max(new_length as u32);
            true
        })
    })
}

/// Generic element-by-element copy of `count` elements. Holes in `source`
/// that the prototype chain does not fill are skipped.
pub(crate) fn move_array_elements(
    agent: &mut Agent,
    target: Array,
    target_offset: u32,
    source: Array,
    source_start: u32,
    count: u32,
) -> JsResult<()> {
    for i in 0..count {
        if let Some(value) = source.get_if_present(agent, source_start + i)? {
            target.put_index(agent, target_offset + i, value, true)?;
        }
    }
    Ok(())
}

#[test]
fn hole_predicates() {
    assert!(contains_hole(&[Some(1), None]));
    assert!(!contains_hole(&[Some(1), Some(2)]));
    assert!(contains_hole(&[1.0, DOUBLE_HOLE]));
    assert!(!contains_hole::<f64>(&[]));
    assert!(contains_hole(&[Some(Value::Null), None]));
    assert!(!Some(Value::Undefined).is_hole());
}

#[test]
fn copy_converts_between_encodings() {
    let mut heap = Heap::default();
    let mut src = IndexedStorage::try_create(&mut heap, IndexingType::Int32, 3).unwrap();
    src.set(&mut heap, 0, Value::from(1));
    src.set(&mut heap, 2, Value::from(3));

    let mut doubles = IndexedStorage::try_create(&mut heap, IndexingType::Double, 4).unwrap();
    copy_array_elements(
        &mut heap,
        &mut doubles,
        1,
        &src,
        0..3,
        ArrayFillMode::Empty,
        NeedsGcSafeOps::No,
    );
    assert!(doubles.is_hole(0));
    assert_eq!(doubles.get(&mut heap, 1), Some(Value::from(1)));
    assert!(doubles.is_hole(2));
    assert_eq!(doubles.get(&mut heap, 3), Some(Value::from(3)));

    let mut boxed = IndexedStorage::try_create(&mut heap, IndexingType::Contiguous, 3).unwrap();
    copy_array_elements(
        &mut heap,
        &mut boxed,
        0,
        &src,
        0..3,
        ArrayFillMode::Undefined,
        NeedsGcSafeOps::Yes,
    );
    assert_eq!(boxed.get(&mut heap, 1), Some(Value::Undefined));
    assert_eq!(boxed.count_values(3), 3);

    let mut queue = IndexedStorage::try_create(&mut heap, IndexingType::ArrayStorage, 4).unwrap();
    copy_array_elements(
        &mut heap,
        &mut queue,
        0,
        &doubles,
        0..4,
        ArrayFillMode::Empty,
        NeedsGcSafeOps::No,
    );
    assert_eq!(queue.num_values_in_vector(), 2);
}

#[test]
fn move_within_overlapping() {
    let mut heap = Heap::default();
    let mut storage = IndexedStorage::try_create(&mut heap, IndexingType::Contiguous, 5).unwrap();
    for i in 0..4 {
        storage.set(&mut heap, i, Value::from(i));
    }
    move_within(&mut heap, &mut storage, 0, 1, 4, NeedsGcSafeOps::Yes);
    let values: Vec<_> = (0..5).map(|i| storage.get(&mut heap, i)).collect();
    assert_eq!(
        values,
        vec![
            Some(Value::from(0)),
            Some(Value::from(0)),
            Some(Value::from(1)),
            Some(Value::from(2)),
            Some(Value::from(3)),
        ]
    );
    move_within(&mut heap, &mut storage, 2, 0, 3, NeedsGcSafeOps::No);
    assert_eq!(storage.get(&mut heap, 0), Some(Value::from(1)));
    assert_eq!(storage.get(&mut heap, 2), Some(Value::from(3)));
}
