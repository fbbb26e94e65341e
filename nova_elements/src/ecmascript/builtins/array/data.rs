// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::{
    ecmascript::execution::Options,
    engine::context::NoGcScope,
    heap::{
        AllocError, Heap, HeapMark, WorkQueues,
        bulk_ops::{ArrayFillMode, NeedsGcSafeOps, copy_array_elements},
        element_array::IndexedStorage,
        heap_constants::MAX_STORAGE_VECTOR_LENGTH,
        indexing_type::IndexingType,
        sparse_map::SparseIndexMap,
    },
};

/// Heap data of an array.
///
/// An element lives either in a storage slot or in a sparse map entry; the
/// storage slot of a sparse index is a hole. Only queue storage has a sparse
/// map. Storage slots at or past `length` are always holes, and so are
/// indices past the storage capacity that the sparse map does not hold.
#[derive(Debug, Default)]
pub struct ArrayHeapData {
    pub(crate) length: u32,
    pub(crate) storage: Option<IndexedStorage>,
    pub(crate) sparse: Option<SparseIndexMap>,
}

impl ArrayHeapData {
    pub fn len(&self) -> u32 {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn indexing_type(&self) -> IndexingType {
        self.storage
            .as_ref()
            .map_or(IndexingType::Initial, IndexedStorage::indexing_type)
    }

    pub fn storage(&self) -> Option<&IndexedStorage> {
        self.storage.as_ref()
    }

    pub fn sparse(&self) -> Option<&SparseIndexMap> {
        self.sparse.as_ref()
    }

    pub fn length_is_read_only(&self) -> bool {
        self.sparse
            .as_ref()
            .is_some_and(SparseIndexMap::length_is_read_only)
    }

    /// Number of logical storage slots.
    pub(crate) fn capacity(&self) -> u32 {
        self.storage.as_ref().map_or(0, IndexedStorage::capacity)
    }

    /// Length of the part of the array that is backed by storage slots.
    pub(crate) fn dense_len(&self) -> u32 {
        self.length.min(self.capacity())
    }

    pub(crate) fn allocated_bytes(&self) -> usize {
        self.storage
            .as_ref()
            .map_or(0, IndexedStorage::allocated_bytes)
    }

    /// Number of elements present, in storage or in the sparse map.
    pub(crate) fn count_values(&self) -> u32 {
        let dense = match &self.storage {
            Some(storage) if storage.indexing_type() == IndexingType::ArrayStorage => {
                storage.num_values_in_vector()
            }
            Some(storage) => storage.count_values(self.length),
            None => 0,
        };
        dense + self.sparse.as_ref().map_or(0, |sparse| sparse.len() as u32)
    }

    pub(crate) fn is_hole(&self, index: u32) -> bool {
        index >= self.length
            || (self.storage.as_ref().is_none_or(|storage| storage.is_hole(index))
                && !self.sparse.as_ref().is_some_and(|sparse| sparse.contains(index)))
    }

    /// Returns true if any index below `length` holds no element.
    pub fn contains_hole(&self) -> bool {
        self.count_values() < self.length
    }

    pub(crate) fn sparse_mut(&mut self) -> &mut SparseIndexMap {
        self.sparse.get_or_insert_with(SparseIndexMap::default)
    }

    /// Makes sure the array uses the queue encoding, allocating queue
    /// storage if the array has none.
    pub(crate) fn ensure_array_storage(
        &mut self,
        heap: &mut Heap,
        options: &Options,
        gc: NoGcScope<'_>,
    ) -> Result<(), AllocError> {
        match &mut self.storage {
            Some(storage) => storage.convert(heap, IndexingType::ArrayStorage, gc),
            None => {
                self.storage = Some(IndexedStorage::create_array_storage(heap, options)?);
                tracing::debug!(length = self.length, "created queue storage");
                Ok(())
            }
        }
    }

    /// Ensures storage of at least the `to` encoding with at least
    /// `required` logical slots. Nothing changes on failure.
    pub(crate) fn grow_and_promote(
        &mut self,
        heap: &mut Heap,
        options: &Options,
        to: IndexingType,
        required: u64,
        gc: NoGcScope<'_>,
    ) -> Result<(), AllocError> {
        let Some(storage) = self.storage.as_mut() else {
            if required == 0 || to == IndexingType::Initial {
                return Ok(());
            }
            let vector_length =
                IndexedStorage::optimal_vector_length(options, required).ok_or(AllocError)?;
            self.storage = Some(IndexedStorage::allocate(heap, to, vector_length, 0)?);
            return Ok(());
        };
        let from = storage.indexing_type();
        let needs_promotion = to > from;
        let needs_growth = required > storage.capacity() as u64;
        match (needs_promotion, needs_growth) {
            (false, false) => Ok(()),
            (false, true) => storage.ensure_capacity(heap, options, required, gc),
            (true, false) => storage.convert(heap, to, gc),
            (true, true) => {
                // Convert straight into the grown block.
                let vector_length =
                    IndexedStorage::optimal_vector_length(options, required).ok_or(AllocError)?;
                let mut grown = IndexedStorage::allocate(heap, to, vector_length, 0)?;
                let end = storage.capacity().min(vector_length);
                copy_array_elements(
                    heap,
                    &mut grown,
                    0,
                    storage,
                    0..end,
                    ArrayFillMode::Empty,
                    NeedsGcSafeOps::No,
                );
                tracing::debug!(?from, ?to, vector_length, "promoted and grew element storage");
                let old = std::mem::replace(storage, grown);
                heap.release(old.allocated_bytes());
                Ok(())
            }
        }
    }

    /// Decides whether a write at `index` belongs in the sparse map rather
    /// than in grown vector storage.
    pub(crate) fn should_use_sparse_map(&self, options: &Options, index: u32) -> bool {
        if index >= MAX_STORAGE_VECTOR_LENGTH {
            return true;
        }
        if index < options.min_sparse_array_index || index < self.capacity() {
            return false;
        }
        let required = index as u64 + 1;
        required / options.min_density_multiplier as u64 > self.count_values() as u64 + 1
    }

    /// Drops all elements and returns to the Initial state.
    pub(crate) fn reset(&mut self, heap: &mut Heap) {
        if let Some(storage) = self.storage.take() {
            storage.free(heap);
        }
        if let Some(sparse) = self.sparse.take() {
            sparse.free(heap);
        }
    }
}

impl HeapMark for ArrayHeapData {
    fn mark_values(&self, queues: &mut WorkQueues) {
        self.storage.mark_values(queues);
        self.sparse.mark_values(queues);
    }
}
