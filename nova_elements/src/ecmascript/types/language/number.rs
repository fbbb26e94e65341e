// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::ops::Index;

use crate::{
    ecmascript::execution::Agent,
    heap::{Heap, indexes::NumberIndex},
};

/// Heap-allocated Number: the fat representation of doubles that fit neither
/// a SmallInteger nor a SmallF64.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HeapNumber(pub(crate) NumberIndex);

#[derive(Debug, Clone, Copy)]
pub struct NumberHeapData {
    pub(crate) data: f64,
}

impl HeapNumber {
    pub(crate) fn get_index(self) -> usize {
        self.0.into_index()
    }

    pub fn value(self, agent: &Agent) -> f64 {
        agent.heap[self]
    }
}

impl Index<HeapNumber> for Heap {
    type Output = f64;

    fn index(&self, index: HeapNumber) -> &Self::Output {
        &self
            .numbers
            .get(index.get_index())
            .expect("HeapNumber out of bounds")
            .as_ref()
            .expect("HeapNumber slot empty")
            .data
    }
}
