// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

pub mod bulk_ops;
pub mod element_array;
mod heap_bits;
pub mod heap_constants;
pub mod heap_gc;
pub mod indexes;
pub mod indexing_type;
pub mod sparse_map;

use std::ops::{Index, IndexMut};

pub use heap_bits::{HeapMark, WorkQueues};
pub use heap_gc::MarkProgress;

use self::{
    bulk_ops::NeedsGcSafeOps,
    heap_gc::GcState,
    indexes::{ArrayIndex, NumberIndex, StringIndex},
    indexing_type::IndexingType,
};
use crate::{
    ecmascript::{
        builtins::{Array, ArrayHeapData},
        types::{HeapNumber, HeapString, NumberHeapData, StringHeapData, Value},
    },
    engine::context::{DeferGc, NoGcScope},
};

/// Allocation failed: the heap budget or the system allocator is exhausted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocError;

impl std::fmt::Display for AllocError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("out of memory")
    }
}

impl std::error::Error for AllocError {}

#[derive(Debug)]
pub struct Heap {
    pub(crate) arrays: Vec<Option<ArrayHeapData>>,
    pub(crate) numbers: Vec<Option<NumberHeapData>>,
    pub(crate) strings: Vec<Option<StringHeapData>>,
    /// Root set of the collector.
    pub(crate) globals: Vec<Option<Value>>,
    pub(crate) gc: GcState,
    /// Bytes currently held by element storage blocks.
    allocated_bytes: usize,
    heap_limit: Option<usize>,
}

impl Heap {
    pub fn new(heap_limit: Option<usize>) -> Self {
        Self {
            arrays: Vec::with_capacity(64),
            numbers: Vec::with_capacity(64),
            strings: Vec::with_capacity(16),
            globals: Vec::new(),
            gc: GcState::default(),
            allocated_bytes: 0,
            heap_limit,
        }
    }

    /// Reserves `bytes` of the element storage budget.
    ///
    /// Fails without side effects if the reservation would exceed the heap
    /// limit.
    pub fn try_allocate(&mut self, bytes: usize) -> Result<(), AllocError> {
        let Some(total) = self.allocated_bytes.checked_add(bytes) else {
            return Err(AllocError);
        };
        if let Some(limit) = self.heap_limit
            && total > limit
        {
            tracing::warn!(requested = bytes, limit, "element storage budget exhausted");
            return Err(AllocError);
        }
        self.allocated_bytes = total;
        Ok(())
    }

    /// Returns `bytes` previously reserved with [`Heap::try_allocate`].
    pub(crate) fn release(&mut self, bytes: usize) {
        debug_assert!(bytes <= self.allocated_bytes);
        self.allocated_bytes = self.allocated_bytes.saturating_sub(bytes);
    }

    pub fn allocated_bytes(&self) -> usize {
        self.allocated_bytes
    }

    /// Opens a garbage collection deferral scope.
    pub fn defer_gc(&self) -> DeferGc {
        DeferGc::new(&self.gc.defer_depth)
    }

    pub fn is_gc_deferred(&self) -> bool {
        self.gc.defer_depth.get() > 0
    }

    pub fn is_marking(&self) -> bool {
        self.gc.marking.is_some()
    }

    /// Collection requests that were deferred since the last completed
    /// collection.
    pub fn deferred_gc_steps(&self) -> u32 {
        self.gc.deferred_steps
    }

    /// Write barrier for overwriting or clearing a slot that held `old`.
    ///
    /// While incremental marking is running, the overwritten value is greyed
    /// so that everything reachable when marking started gets marked.
    #[inline]
    pub fn write_barrier(&mut self, old: Option<Value>) {
        if let Some(marking) = self.gc.marking.as_mut()
            && let Some(old) = old
        {
            marking.queues.push_value(old);
        }
    }

    /// Decides whether writes into existing boxed storage of the given type
    /// must go through the element-wise barriered path.
    pub(crate) fn needs_gc_safe_ops(&self, indexing_type: IndexingType) -> NeedsGcSafeOps {
        if self.is_marking() && indexing_type.is_boxed() {
            NeedsGcSafeOps::Yes
        } else {
            NeedsGcSafeOps::No
        }
    }

    pub(crate) fn create_array(&mut self, data: ArrayHeapData) -> Array {
        self.arrays.push(Some(data));
        self.gc.on_allocation(|bits| &mut bits.arrays);
        Array(ArrayIndex::last(&self.arrays))
    }

    pub(crate) fn create_number(&mut self, data: f64) -> HeapNumber {
        self.numbers.push(Some(NumberHeapData { data }));
        self.gc.on_allocation(|bits| &mut bits.numbers);
        HeapNumber(NumberIndex::last(&self.numbers))
    }

    pub fn create_string(&mut self, data: &str) -> HeapString {
        self.strings.push(Some(StringHeapData {
            data: data.to_owned(),
        }));
        self.gc.on_allocation(|bits| &mut bits.strings);
        HeapString(StringIndex::last(&self.strings))
    }

    /// Adds `value` to the root set and returns its root slot.
    pub fn add_root(&mut self, value: Value) -> usize {
        if let Some(free) = self.globals.iter().position(Option::is_none) {
            self.globals[free] = Some(value);
            free
        } else {
            self.globals.push(Some(value));
            self.globals.len() - 1
        }
    }

    pub fn remove_root(&mut self, root: usize) {
        let old = self.globals.get_mut(root).and_then(Option::take);
        self.write_barrier(old);
    }

    /// Runs `f` with exclusive access to an array's heap data, inside a
    /// garbage collection deferral scope.
    ///
    /// The data is taken out of the arena for the duration of the call: `f`
    /// must not access `array` through the heap it is given.
    pub(crate) fn with_array_data<R>(
        &mut self,
        array: Array,
        f: impl FnOnce(&mut Heap, &mut ArrayHeapData, NoGcScope<'_>) -> R,
    ) -> R {
        let defer = self.defer_gc();
        let slot = array.get_index();
        let mut data = self.arrays[slot].take().expect("Array slot empty");
        let result = f(self, &mut data, defer.nogc());
        self.arrays[slot] = Some(data);
        result
    }
}

impl Default for Heap {
    fn default() -> Self {
        Self::new(None)
    }
}

impl Index<Array> for Heap {
    type Output = ArrayHeapData;

    fn index(&self, index: Array) -> &Self::Output {
        self.arrays
            .get(index.get_index())
            .expect("Array out of bounds")
            .as_ref()
            .expect("Array slot empty")
    }
}

impl IndexMut<Array> for Heap {
    fn index_mut(&mut self, index: Array) -> &mut Self::Output {
        self.arrays
            .get_mut(index.get_index())
            .expect("Array out of bounds")
            .as_mut()
            .expect("Array slot empty")
    }
}

#[test]
fn allocation_budget() {
    let mut heap = Heap::new(Some(100));
    assert!(heap.try_allocate(60).is_ok());
    assert_eq!(heap.try_allocate(60), Err(AllocError));
    assert_eq!(heap.allocated_bytes(), 60);
    heap.release(60);
    assert!(heap.try_allocate(100).is_ok());
    assert_eq!(heap.try_allocate(usize::MAX), Err(AllocError));
}

#[test]
fn roots_reuse_free_slots() {
    let mut heap = Heap::default();
    let a = heap.add_root(Value::Null);
    let b = heap.add_root(Value::Undefined);
    heap.remove_root(a);
    assert_eq!(heap.add_root(Value::Boolean(true)), a);
    assert_ne!(a, b);
}
