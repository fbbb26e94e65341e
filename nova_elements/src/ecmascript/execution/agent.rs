// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::ops::Index;

use crate::{
    ecmascript::{
        builtins::{Array, ArrayHeapData},
        types::{Function, HeapNumber, HeapString, Value},
    },
    heap::{
        Heap, MarkProgress,
        heap_gc::{finish_collection, heap_gc, mark_step, start_marking},
    },
};

/// Tuning knobs of the element storage engine.
#[derive(Debug, Clone, Copy)]
pub struct Options {
    /// Skip collections requested through [`Agent::gc`].
    pub disable_gc: bool,
    /// Byte budget of element storage. None means unlimited.
    pub heap_limit: Option<usize>,
    /// Smallest vector a growing dense storage gets.
    pub min_vector_length: u32,
    /// Vector length of a freshly created queue storage.
    pub base_array_storage_vector_length: u32,
    /// Writes below this index never fall back to the sparse map for
    /// density reasons.
    pub min_sparse_array_index: u32,
    /// An array is dense enough for vector storage while
    /// `length / min_density_multiplier <= number of values`.
    pub min_density_multiplier: u32,
    /// Dense shifts moving at least this many elements convert the array to
    /// the queue encoding first.
    pub shift_queue_threshold: u32,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            disable_gc: false,
            heap_limit: None,
            min_vector_length: 4,
            base_array_storage_vector_length: 4,
            min_sparse_array_index: 100_000,
            min_density_multiplier: 8,
            shift_queue_threshold: 128,
        }
    }
}

pub type JsResult<T> = std::result::Result<T, JsError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExceptionType {
    Error,
    RangeError,
    TypeError,
}

/// A thrown script exception.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JsError {
    exception_type: ExceptionType,
    message: &'static str,
}

impl JsError {
    pub fn exception_type(self) -> ExceptionType {
        self.exception_type
    }

    pub fn message(self) -> &'static str {
        self.message
    }
}

impl std::fmt::Display for JsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.exception_type, self.message)
    }
}

impl std::error::Error for JsError {}

/// Services of the object model that surrounds the element storage.
///
/// Prototype chains and callable functions live outside this crate; arrays
/// only ask whether holes are observable and forward accessor calls here.
pub trait HostHooks: std::fmt::Debug {
    /// Returns true if the prototype chain of `array` may define indexed
    /// properties, so that reading a hole must look there instead of
    /// producing undefined.
    fn holes_must_forward_to_prototype(&self, _array: Array) -> bool {
        false
    }

    /// Looks up `index` on the prototype chain after a hole was read.
    fn get_from_prototype(&self, _agent: &mut Agent, _index: u32) -> JsResult<Option<Value>> {
        Ok(None)
    }

    /// Calls a sort comparator with `x` and `y`. Number results order the
    /// pair by sign, booleans count as 0 or 1 and anything else as equal.
    fn call_comparator(
        &self,
        agent: &mut Agent,
        _comparator: Function,
        _x: Value,
        _y: Value,
    ) -> JsResult<Value> {
        Err(agent.throw_exception(ExceptionType::TypeError, "Comparator is not callable"))
    }

    fn call_getter(&self, agent: &mut Agent, getter: Function, this: Array) -> JsResult<Value>;

    fn call_setter(
        &self,
        agent: &mut Agent,
        setter: Function,
        this: Array,
        value: Value,
    ) -> JsResult<()>;
}

/// Owner of the heap, the options and the host hooks.
#[derive(Debug)]
pub struct Agent {
    pub(crate) heap: Heap,
    pub(crate) options: Options,
    pub(crate) host_hooks: &'static dyn HostHooks,
}

impl Agent {
    pub fn new(options: Options, host_hooks: &'static dyn HostHooks) -> Self {
        Self {
            heap: Heap::new(options.heap_limit),
            options,
            host_hooks,
        }
    }

    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    pub fn heap_mut(&mut self) -> &mut Heap {
        &mut self.heap
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn throw_exception(&mut self, kind: ExceptionType, message: &'static str) -> JsError {
        tracing::trace!(?kind, message, "throw");
        JsError {
            exception_type: kind,
            message,
        }
    }

    pub(crate) fn throw_out_of_memory(&mut self) -> JsError {
        self.throw_exception(ExceptionType::RangeError, "out of memory")
    }

    pub fn create_string(&mut self, data: &str) -> HeapString {
        self.heap.create_string(data)
    }

    /// Adds `value` to the root set. See [`Heap::add_root`].
    pub fn add_root(&mut self, value: impl Into<Value>) -> usize {
        self.heap.add_root(value.into())
    }

    pub fn remove_root(&mut self, root: usize) {
        self.heap.remove_root(root);
    }

    /// Runs a full collection at a safe point.
    pub fn gc(&mut self) -> MarkProgress {
        if self.options.disable_gc {
            return MarkProgress::Done;
        }
        heap_gc(&mut self.heap)
    }

    /// Starts incremental marking at a safe point.
    pub fn start_marking(&mut self) {
        if !self.options.disable_gc {
            start_marking(&mut self.heap);
        }
    }

    /// Performs one bounded marking step at a safe point.
    pub fn mark_step(&mut self, budget: usize) -> MarkProgress {
        mark_step(&mut self.heap, budget)
    }

    /// Completes an incremental cycle.
    pub fn finish_collection(&mut self) -> MarkProgress {
        finish_collection(&mut self.heap)
    }
}

impl Index<HeapNumber> for Agent {
    type Output = f64;

    fn index(&self, index: HeapNumber) -> &Self::Output {
        &self.heap[index]
    }
}

impl Index<HeapString> for Agent {
    type Output = str;

    fn index(&self, index: HeapString) -> &Self::Output {
        &self.heap[index]
    }
}

impl Index<Array> for Agent {
    type Output = ArrayHeapData;

    fn index(&self, index: Array) -> &Self::Output {
        &self.heap[index]
    }
}
