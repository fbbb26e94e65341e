// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::ops::Index;

use crate::{
    ecmascript::execution::Agent,
    heap::{Heap, indexes::StringIndex},
};

/// Heap-allocated string. Strings are leaves for the collector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HeapString(pub(crate) StringIndex);

#[derive(Debug, Clone)]
pub struct StringHeapData {
    pub(crate) data: String,
}

impl HeapString {
    pub(crate) fn get_index(self) -> usize {
        self.0.into_index()
    }

    pub fn from_str(agent: &mut Agent, message: &str) -> Self {
        agent.heap.create_string(message)
    }

    pub fn as_str(self, agent: &Agent) -> &str {
        &agent.heap[self]
    }
}

impl Index<HeapString> for Heap {
    type Output = str;

    fn index(&self, index: HeapString) -> &Self::Output {
        &self
            .strings
            .get(index.get_index())
            .expect("HeapString out of bounds")
            .as_ref()
            .expect("HeapString slot empty")
            .data
    }
}
