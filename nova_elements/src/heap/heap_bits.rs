// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::Heap;
use crate::ecmascript::{
    builtins::Array,
    types::{HeapNumber, HeapString, Value},
};

/// Mark bits for every arena of the heap. Arenas may grow while marking is
/// in progress; entries allocated after marking started are pushed marked.
#[derive(Debug)]
pub(crate) struct HeapBits {
    pub(crate) arrays: Vec<bool>,
    pub(crate) numbers: Vec<bool>,
    pub(crate) strings: Vec<bool>,
}

/// Grey set of the incremental marker.
#[derive(Debug, Default)]
pub struct WorkQueues {
    pub(crate) arrays: Vec<Array>,
    pub(crate) numbers: Vec<HeapNumber>,
    pub(crate) strings: Vec<HeapString>,
}

impl HeapBits {
    pub(crate) fn new(heap: &Heap) -> Self {
        Self {
            arrays: vec![false; heap.arrays.len()],
            numbers: vec![false; heap.numbers.len()],
            strings: vec![false; heap.strings.len()],
        }
    }
}

impl WorkQueues {
    pub fn push_value(&mut self, value: Value) {
        match value {
            Value::Array(array) => self.arrays.push(array),
            Value::Number(number) => self.numbers.push(number),
            Value::String(string) => self.strings.push(string),
            Value::Undefined
            | Value::Null
            | Value::Boolean(_)
            | Value::Integer(_)
            | Value::SmallF64(_) => {}
        }
    }

    pub fn is_empty(&self) -> bool {
        self.arrays.is_empty() && self.numbers.is_empty() && self.strings.is_empty()
    }
}

/// Heap data that holds references the collector must trace.
pub trait HeapMark {
    fn mark_values(&self, queues: &mut WorkQueues);
}

impl HeapMark for Value {
    fn mark_values(&self, queues: &mut WorkQueues) {
        queues.push_value(*self);
    }
}

impl<T: HeapMark> HeapMark for Option<T> {
    fn mark_values(&self, queues: &mut WorkQueues) {
        if let Some(content) = self {
            content.mark_values(queues);
        }
    }
}

impl<T: HeapMark> HeapMark for [T] {
    fn mark_values(&self, queues: &mut WorkQueues) {
        self.iter().for_each(|entry| entry.mark_values(queues));
    }
}
