// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::{mem::size_of, ops::Range};

use super::{
    AllocError, Heap,
    bulk_ops::{IsHole, NeedsGcSafeOps},
    heap_bits::{HeapMark, WorkQueues},
    heap_constants::MAX_STORAGE_VECTOR_LENGTH,
    indexing_type::{IndexingType, classify},
};
use crate::{
    ecmascript::{execution::Options, types::Value},
    engine::context::NoGcScope,
};

/// Hole marker of Double storage. NaN is never stored as a Double element,
/// so every NaN slot is a hole.
pub(crate) const DOUBLE_HOLE: f64 = f64::NAN;

/// The slots of an element storage block, one vector per encoding.
///
/// The vector always has exactly `vector_length` entries; unused entries are
/// holes.
#[derive(Debug, Clone)]
pub enum ElementSlots {
    Int32(Vec<Option<i32>>),
    Double(Vec<f64>),
    Contiguous(Vec<Option<Value>>),
    ArrayStorage(Vec<Option<Value>>),
}

/// Logical view of element slots, starting at index zero.
#[derive(Debug, Clone, Copy)]
pub(crate) enum SlotsRef<'a> {
    Int32(&'a [Option<i32>]),
    Double(&'a [f64]),
    Boxed(&'a [Option<Value>]),
}

#[derive(Debug)]
pub(crate) enum SlotsMut<'a> {
    Int32(&'a mut [Option<i32>]),
    Double(&'a mut [f64]),
    Boxed(&'a mut [Option<Value>]),
}

/// An allocated element storage block.
///
/// Logical element `i` lives in slot `index_bias + i`. Only the legacy queue
/// encoding (`ArrayStorage`) uses a non-zero bias: shifting elements off the
/// front moves the bias forward instead of moving elements. The physical
/// `vector_length` of a block never changes; growing replaces the block.
#[derive(Debug)]
pub struct IndexedStorage {
    vector_length: u32,
    index_bias: u32,
    /// Number of non-hole slots. Only maintained for `ArrayStorage`.
    num_values_in_vector: u32,
    slots: ElementSlots,
}

fn slot_size(indexing_type: IndexingType) -> usize {
    match indexing_type {
        IndexingType::Initial => 0,
        IndexingType::Int32 => size_of::<Option<i32>>(),
        IndexingType::Double => size_of::<f64>(),
        IndexingType::Contiguous | IndexingType::ArrayStorage => size_of::<Option<Value>>(),
    }
}

fn try_collect<T>(len: usize, iter: impl Iterator<Item = T>) -> Result<Vec<T>, AllocError> {
    let mut vec = Vec::new();
    vec.try_reserve_exact(len).map_err(|_| AllocError)?;
    vec.extend(iter);
    Ok(vec)
}

fn try_filled<T: Clone>(len: usize, fill: T) -> Result<Vec<T>, AllocError> {
    try_collect(len, std::iter::repeat_n(fill, len))
}

impl ElementSlots {
    fn try_new(indexing_type: IndexingType, len: usize) -> Result<Self, AllocError> {
        Ok(match indexing_type {
            IndexingType::Int32 => ElementSlots::Int32(try_filled(len, None)?),
            IndexingType::Double => ElementSlots::Double(try_filled(len, DOUBLE_HOLE)?),
            IndexingType::Contiguous => ElementSlots::Contiguous(try_filled(len, None)?),
            IndexingType::ArrayStorage => ElementSlots::ArrayStorage(try_filled(len, None)?),
            IndexingType::Initial => unreachable!("Initial arrays have no storage"),
        })
    }

    pub fn indexing_type(&self) -> IndexingType {
        match self {
            ElementSlots::Int32(_) => IndexingType::Int32,
            ElementSlots::Double(_) => IndexingType::Double,
            ElementSlots::Contiguous(_) => IndexingType::Contiguous,
            ElementSlots::ArrayStorage(_) => IndexingType::ArrayStorage,
        }
    }

    /// Converts every slot to the `to` encoding into a new vector. Holes stay
    /// holes.
    fn try_convert(&self, heap: &mut Heap, to: IndexingType) -> Result<Self, AllocError> {
        let boxed = |values: Vec<Option<Value>>| match to {
            IndexingType::Contiguous => ElementSlots::Contiguous(values),
            _ => ElementSlots::ArrayStorage(values),
        };
        Ok(match (self, to) {
            (ElementSlots::Int32(slots), IndexingType::Double) => ElementSlots::Double(try_collect(
                slots.len(),
                slots.iter().map(|slot| slot.map_or(DOUBLE_HOLE, f64::from)),
            )?),
            (ElementSlots::Int32(slots), _) => boxed(try_collect(
                slots.len(),
                slots.iter().map(|slot| slot.map(Value::from)),
            )?),
            (ElementSlots::Double(slots), _) => boxed(try_collect(
                slots.len(),
                slots.iter().map(|&slot| {
                    if slot.is_hole() {
                        None
                    } else {
                        Some(Value::from_f64(heap, slot))
                    }
                }),
            )?),
            (ElementSlots::Contiguous(slots) | ElementSlots::ArrayStorage(slots), _) => {
                boxed(try_collect(slots.len(), slots.iter().copied())?)
            }
        })
    }
}

impl IndexedStorage {
    /// Allocates a storage block of exactly `vector_length_hint` slots.
    ///
    /// Returns None without allocating anything if the hint exceeds the
    /// maximum storage length, or if the allocation fails.
    pub fn try_create(
        heap: &mut Heap,
        indexing_type: IndexingType,
        vector_length_hint: u32,
    ) -> Option<Self> {
        if vector_length_hint > MAX_STORAGE_VECTOR_LENGTH || indexing_type == IndexingType::Initial
        {
            return None;
        }
        Self::allocate(heap, indexing_type, vector_length_hint, 0).ok()
    }

    /// Allocates a fresh legacy queue storage block with the base capacity.
    pub(crate) fn create_array_storage(
        heap: &mut Heap,
        options: &Options,
    ) -> Result<Self, AllocError> {
        let vector_length = options
            .base_array_storage_vector_length
            .min(MAX_STORAGE_VECTOR_LENGTH);
        Self::allocate(heap, IndexingType::ArrayStorage, vector_length, 0)
    }

    pub(crate) fn allocate(
        heap: &mut Heap,
        indexing_type: IndexingType,
        vector_length: u32,
        index_bias: u32,
    ) -> Result<Self, AllocError> {
        debug_assert!(vector_length <= MAX_STORAGE_VECTOR_LENGTH);
        debug_assert!(index_bias <= vector_length);
        let bytes = slot_size(indexing_type) * vector_length as usize;
        heap.try_allocate(bytes)?;
        match ElementSlots::try_new(indexing_type, vector_length as usize) {
            Ok(slots) => Ok(Self {
                vector_length,
                index_bias,
                num_values_in_vector: 0,
                slots,
            }),
            Err(err) => {
                heap.release(bytes);
                Err(err)
            }
        }
    }

    /// Rounds a requested capacity up to the next growth step. Returns None
    /// if the request exceeds the maximum storage length.
    pub fn optimal_vector_length(options: &Options, requested: u64) -> Option<u32> {
        if requested > MAX_STORAGE_VECTOR_LENGTH as u64 {
            return None;
        }
        let requested = (requested as u32).max(options.min_vector_length);
        Some(
            requested
                .checked_next_power_of_two()
                .unwrap_or(MAX_STORAGE_VECTOR_LENGTH)
                .min(MAX_STORAGE_VECTOR_LENGTH),
        )
    }

    pub fn indexing_type(&self) -> IndexingType {
        self.slots.indexing_type()
    }

    pub fn vector_length(&self) -> u32 {
        self.vector_length
    }

    pub fn index_bias(&self) -> u32 {
        self.index_bias
    }

    /// Number of logical slots: the physical length minus the bias.
    pub fn capacity(&self) -> u32 {
        self.vector_length - self.index_bias
    }

    pub fn num_values_in_vector(&self) -> u32 {
        self.num_values_in_vector
    }

    pub fn slots(&self) -> &ElementSlots {
        &self.slots
    }

    pub(crate) fn allocated_bytes(&self) -> usize {
        slot_size(self.indexing_type()) * self.vector_length as usize
    }

    pub(crate) fn set_index_bias(&mut self, index_bias: u32) {
        debug_assert!(index_bias <= self.vector_length);
        debug_assert!(
            index_bias == 0 || self.indexing_type() == IndexingType::ArrayStorage,
            "only the queue encoding has an index bias"
        );
        self.index_bias = index_bias;
    }

    pub(crate) fn set_num_values_in_vector(&mut self, num_values: u32) {
        self.num_values_in_vector = num_values;
    }

    fn offset(&self, index: u32) -> usize {
        (self.index_bias + index) as usize
    }

    pub(crate) fn view(&self) -> SlotsRef<'_> {
        let start = self.index_bias as usize;
        match &self.slots {
            ElementSlots::Int32(slots) => SlotsRef::Int32(&slots[start..]),
            ElementSlots::Double(slots) => SlotsRef::Double(&slots[start..]),
            ElementSlots::Contiguous(slots) | ElementSlots::ArrayStorage(slots) => {
                SlotsRef::Boxed(&slots[start..])
            }
        }
    }

    pub(crate) fn view_mut(&mut self) -> SlotsMut<'_> {
        let start = self.index_bias as usize;
        match &mut self.slots {
            ElementSlots::Int32(slots) => SlotsMut::Int32(&mut slots[start..]),
            ElementSlots::Double(slots) => SlotsMut::Double(&mut slots[start..]),
            ElementSlots::Contiguous(slots) | ElementSlots::ArrayStorage(slots) => {
                SlotsMut::Boxed(&mut slots[start..])
            }
        }
    }

    /// Physical view including the bias region. Used by the queue
    /// operations, which move elements across the logical start.
    pub(crate) fn physical_values_mut(&mut self) -> &mut [Option<Value>] {
        match &mut self.slots {
            ElementSlots::ArrayStorage(slots) => slots,
            _ => unreachable!("only the queue encoding is accessed physically"),
        }
    }

    pub fn is_hole(&self, index: u32) -> bool {
        if index >= self.capacity() {
            return true;
        }
        let offset = self.offset(index);
        match &self.slots {
            ElementSlots::Int32(slots) => slots[offset].is_hole(),
            ElementSlots::Double(slots) => slots[offset].is_hole(),
            ElementSlots::Contiguous(slots) | ElementSlots::ArrayStorage(slots) => {
                slots[offset].is_hole()
            }
        }
    }

    /// Counts the non-hole slots among the first `len` logical slots.
    pub fn count_values(&self, len: u32) -> u32 {
        let len = len.min(self.capacity()) as usize;
        let count = match self.view() {
            SlotsRef::Int32(slots) => slots[..len].iter().filter(|s| !s.is_hole()).count(),
            SlotsRef::Double(slots) => slots[..len].iter().filter(|s| !s.is_hole()).count(),
            SlotsRef::Boxed(slots) => slots[..len].iter().filter(|s| !s.is_hole()).count(),
        };
        count as u32
    }

    /// Reads a logical slot. Double elements may need a heap number.
    pub(crate) fn get(&self, heap: &mut Heap, index: u32) -> Option<Value> {
        if index >= self.capacity() {
            return None;
        }
        let offset = self.offset(index);
        match &self.slots {
            ElementSlots::Int32(slots) => slots[offset].map(Value::from),
            ElementSlots::Double(slots) => {
                let value = slots[offset];
                (!value.is_hole()).then(|| Value::from_f64(heap, value))
            }
            ElementSlots::Contiguous(slots) | ElementSlots::ArrayStorage(slots) => slots[offset],
        }
    }

    /// Returns true if `value` can be written without promoting the storage.
    pub fn can_store(&self, value: Value) -> bool {
        classify(value) <= self.indexing_type()
    }

    /// Writes a logical slot. The slot must be within capacity and the value
    /// must be representable in the current encoding.
    pub(crate) fn set(&mut self, heap: &mut Heap, index: u32, value: Value) {
        debug_assert!(index < self.capacity());
        debug_assert!(self.can_store(value));
        let offset = self.offset(index);
        match &mut self.slots {
            ElementSlots::Int32(slots) => slots[offset] = value.as_i32(),
            ElementSlots::Double(slots) => {
                slots[offset] = value.as_f64(&*heap).unwrap_or(DOUBLE_HOLE);
            }
            ElementSlots::Contiguous(slots) => {
                let old = slots[offset].replace(value);
                heap.write_barrier(old);
            }
            ElementSlots::ArrayStorage(slots) => {
                let old = slots[offset].replace(value);
                if old.is_none() {
                    self.num_values_in_vector += 1;
                }
                heap.write_barrier(old);
            }
        }
    }

    /// Turns a logical slot into a hole. Returns true if it held a value.
    pub(crate) fn clear(&mut self, heap: &mut Heap, index: u32) -> bool {
        if index >= self.capacity() {
            return false;
        }
        let offset = self.offset(index);
        match &mut self.slots {
            ElementSlots::Int32(slots) => slots[offset].take().is_some(),
            ElementSlots::Double(slots) => {
                let had_value = !slots[offset].is_hole();
                slots[offset] = DOUBLE_HOLE;
                had_value
            }
            ElementSlots::Contiguous(slots) => {
                let old = slots[offset].take();
                heap.write_barrier(old);
                old.is_some()
            }
            ElementSlots::ArrayStorage(slots) => {
                let old = slots[offset].take();
                if old.is_some() {
                    self.num_values_in_vector -= 1;
                }
                heap.write_barrier(old);
                old.is_some()
            }
        }
    }

    /// Turns a range of logical slots into holes.
    pub(crate) fn clear_range(
        &mut self,
        heap: &mut Heap,
        range: Range<u32>,
        gc_safe: NeedsGcSafeOps,
    ) {
        let end = range.end.min(self.capacity());
        if range.start >= end {
            return;
        }
        let range = range.start as usize..end as usize;
        let mut removed = 0;
        match self.view_mut() {
            SlotsMut::Int32(slots) => slots[range].fill(None),
            SlotsMut::Double(slots) => slots[range].fill(DOUBLE_HOLE),
            SlotsMut::Boxed(slots) => {
                for slot in &mut slots[range] {
                    if let Some(old) = slot.take() {
                        removed += 1;
                        if gc_safe == NeedsGcSafeOps::Yes {
                            heap.write_barrier(Some(old));
                        }
                    }
                }
            }
        }
        if self.indexing_type() == IndexingType::ArrayStorage {
            self.num_values_in_vector -= removed;
        }
    }

    /// Moves the logical elements into a new block of `vector_length` slots
    /// with `index_bias` free slots in front. Elements that do not fit are
    /// dropped.
    pub(crate) fn reallocate(
        &mut self,
        heap: &mut Heap,
        vector_length: u32,
        index_bias: u32,
        _gc: NoGcScope<'_>,
    ) -> Result<(), AllocError> {
        let mut new_storage =
            Self::allocate(heap, self.indexing_type(), vector_length, index_bias)?;
        let keep = self.capacity().min(new_storage.capacity()) as usize;
        match (self.view(), new_storage.view_mut()) {
            (SlotsRef::Int32(old), SlotsMut::Int32(new)) => {
                new[..keep].copy_from_slice(&old[..keep])
            }
            (SlotsRef::Double(old), SlotsMut::Double(new)) => {
                new[..keep].copy_from_slice(&old[..keep])
            }
            (SlotsRef::Boxed(old), SlotsMut::Boxed(new)) => {
                new[..keep].copy_from_slice(&old[..keep])
            }
            _ => unreachable!("reallocation keeps the encoding"),
        }
        if new_storage.indexing_type() == IndexingType::ArrayStorage {
            new_storage.num_values_in_vector = new_storage.count_values(u32::MAX);
        }
        tracing::debug!(
            indexing_type = ?self.indexing_type(),
            from = self.vector_length,
            to = vector_length,
            index_bias,
            "reallocated element storage"
        );
        let old = std::mem::replace(self, new_storage);
        heap.release(old.allocated_bytes());
        Ok(())
    }

    /// Grows the block so that at least `required` logical slots exist.
    pub(crate) fn ensure_capacity(
        &mut self,
        heap: &mut Heap,
        options: &Options,
        required: u64,
        gc: NoGcScope<'_>,
    ) -> Result<(), AllocError> {
        if required <= self.capacity() as u64 {
            return Ok(());
        }
        let capacity = Self::optimal_vector_length(options, required).ok_or(AllocError)?;
        let index_bias = if self.index_bias as u64 + capacity as u64
            <= MAX_STORAGE_VECTOR_LENGTH as u64
        {
            self.index_bias
        } else {
            0
        };
        self.reallocate(heap, index_bias + capacity, index_bias, gc)
    }

    /// Converts the block to a more general encoding, preserving every
    /// element. Nothing changes if the conversion fails.
    pub(crate) fn convert(
        &mut self,
        heap: &mut Heap,
        to: IndexingType,
        _gc: NoGcScope<'_>,
    ) -> Result<(), AllocError> {
        let from = self.indexing_type();
        debug_assert!(to != IndexingType::Initial);
        if to <= from {
            return Ok(());
        }
        if from == IndexingType::Contiguous && to == IndexingType::ArrayStorage {
            // Same slot layout: the vector is reused as is.
            if let ElementSlots::Contiguous(values) = &mut self.slots {
                self.slots = ElementSlots::ArrayStorage(std::mem::take(values));
            }
        } else {
            let bytes = slot_size(to) * self.vector_length as usize;
            heap.try_allocate(bytes)?;
            let converted = match self.slots.try_convert(heap, to) {
                Ok(converted) => converted,
                Err(err) => {
                    heap.release(bytes);
                    return Err(err);
                }
            };
            heap.release(self.allocated_bytes());
            self.slots = converted;
        }
        if to == IndexingType::ArrayStorage {
            self.num_values_in_vector = self.count_values(u32::MAX);
        }
        tracing::debug!(?from, ?to, vector_length = self.vector_length, "promoted element storage");
        Ok(())
    }

    /// Releases the block. Values it held are greyed if marking is running.
    pub(crate) fn free(self, heap: &mut Heap) {
        if heap.is_marking()
            && let SlotsRef::Boxed(values) = self.view()
        {
            values
                .iter()
                .copied()
                .for_each(|value| heap.write_barrier(value));
        }
        heap.release(self.allocated_bytes());
    }
}

impl HeapMark for IndexedStorage {
    fn mark_values(&self, queues: &mut WorkQueues) {
        if let SlotsRef::Boxed(values) = self.view() {
            values.mark_values(queues);
        }
    }
}

#[test]
fn try_create_rejects_oversized_hint() {
    let mut heap = Heap::default();
    assert!(
        IndexedStorage::try_create(&mut heap, IndexingType::Int32, MAX_STORAGE_VECTOR_LENGTH + 1)
            .is_none()
    );
    assert_eq!(heap.allocated_bytes(), 0);
    let storage = IndexedStorage::try_create(&mut heap, IndexingType::Contiguous, 5).unwrap();
    assert_eq!(storage.vector_length(), 5);
    assert_eq!(storage.index_bias(), 0);
    assert_eq!(heap.allocated_bytes(), storage.allocated_bytes());
}

#[test]
fn try_create_respects_heap_limit() {
    let mut heap = Heap::new(Some(16));
    assert!(IndexedStorage::try_create(&mut heap, IndexingType::Double, 100).is_none());
    assert_eq!(heap.allocated_bytes(), 0);
}

#[test]
fn optimal_vector_length_grows_geometrically() {
    let options = Options::default();
    assert_eq!(
        IndexedStorage::optimal_vector_length(&options, 0),
        Some(options.min_vector_length)
    );
    assert_eq!(IndexedStorage::optimal_vector_length(&options, 5), Some(8));
    assert_eq!(IndexedStorage::optimal_vector_length(&options, 8), Some(8));
    assert_eq!(IndexedStorage::optimal_vector_length(&options, 9), Some(16));
    assert_eq!(
        IndexedStorage::optimal_vector_length(&options, MAX_STORAGE_VECTOR_LENGTH as u64),
        Some(MAX_STORAGE_VECTOR_LENGTH)
    );
    assert_eq!(
        IndexedStorage::optimal_vector_length(&options, MAX_STORAGE_VECTOR_LENGTH as u64 + 1),
        None
    );
}

#[test]
fn convert_preserves_elements() {
    let mut heap = Heap::default();
    let mut storage = IndexedStorage::try_create(&mut heap, IndexingType::Int32, 4).unwrap();
    storage.set(&mut heap, 0, Value::from(1));
    storage.set(&mut heap, 2, Value::from(-3));
    let defer = heap.defer_gc();
    storage
        .convert(&mut heap, IndexingType::Double, defer.nogc())
        .unwrap();
    let fat = Value::from_f64(&mut heap, 0.1);
    storage.set(&mut heap, 3, fat);
    storage
        .convert(&mut heap, IndexingType::ArrayStorage, defer.nogc())
        .unwrap();
    assert_eq!(storage.indexing_type(), IndexingType::ArrayStorage);
    assert_eq!(storage.num_values_in_vector(), 3);
    assert_eq!(storage.get(&mut heap, 0), Some(Value::from(1)));
    assert!(storage.is_hole(1));
    assert_eq!(storage.get(&mut heap, 2), Some(Value::from(-3)));
    let read = storage.get(&mut heap, 3).unwrap();
    assert_eq!(read.as_f64(&heap).map(f64::to_bits), Some(0.1f64.to_bits()));
    assert_eq!(heap.allocated_bytes(), storage.allocated_bytes());
}

#[test]
fn reallocate_keeps_logical_elements() {
    let mut heap = Heap::default();
    let options = Options::default();
    let mut storage = IndexedStorage::try_create(&mut heap, IndexingType::Int32, 2).unwrap();
    storage.set(&mut heap, 0, Value::from(10));
    storage.set(&mut heap, 1, Value::from(20));
    let defer = heap.defer_gc();
    storage
        .ensure_capacity(&mut heap, &options, 3, defer.nogc())
        .unwrap();
    assert!(storage.capacity() >= 3);
    assert_eq!(storage.get(&mut heap, 1), Some(Value::from(20)));
    assert!(storage.is_hole(2));
    assert_eq!(heap.allocated_bytes(), storage.allocated_bytes());
}

#[test]
fn failed_conversion_changes_nothing() {
    let mut heap = Heap::new(Some(64));
    let mut storage = IndexedStorage::try_create(&mut heap, IndexingType::Int32, 8).unwrap();
    storage.set(&mut heap, 0, Value::from(7));
    let before = heap.allocated_bytes();
    let defer = heap.defer_gc();
    assert_eq!(
        storage.convert(&mut heap, IndexingType::Contiguous, defer.nogc()),
        Err(AllocError)
    );
    assert_eq!(storage.indexing_type(), IndexingType::Int32);
    assert_eq!(heap.allocated_bytes(), before);
    assert_eq!(storage.get(&mut heap, 0), Some(Value::from(7)));
}
