// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use ahash::RandomState;
use hashbrown::HashMap;

use super::{
    Heap,
    heap_bits::{HeapMark, WorkQueues},
};
use crate::ecmascript::types::{Function, Value};

/// Property attributes of an element. Plain dense elements have all three
/// set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementAttributes {
    pub writable: bool,
    pub enumerable: bool,
    pub configurable: bool,
}

impl Default for ElementAttributes {
    fn default() -> Self {
        Self {
            writable: true,
            enumerable: true,
            configurable: true,
        }
    }
}

impl ElementAttributes {
    pub fn is_default(self) -> bool {
        self == Self::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SparseValue {
    Data(Value),
    Accessor {
        get: Option<Function>,
        set: Option<Function>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SparseEntry {
    pub value: SparseValue,
    pub attributes: ElementAttributes,
}

impl SparseEntry {
    pub fn data(value: Value) -> Self {
        Self {
            value: SparseValue::Data(value),
            attributes: ElementAttributes::default(),
        }
    }

    fn data_value(&self) -> Option<Value> {
        match self.value {
            SparseValue::Data(value) => Some(value),
            SparseValue::Accessor { .. } => None,
        }
    }
}

/// Outcome of an ordinary write to an index present in the sparse map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SparsePut {
    Written,
    /// The entry is a non-writable data element.
    ReadOnly,
    /// The entry is an accessor; the write must call this setter, or fail
    /// if there is none.
    Setter(Option<Function>),
}

/// Dictionary fallback for elements that do not belong in dense storage:
/// indices far beyond the vector, and elements with non-default attributes.
///
/// Also carries the read-only flag of the array's `length`.
#[derive(Debug, Default)]
pub struct SparseIndexMap {
    entries: HashMap<u32, SparseEntry, RandomState>,
    length_is_read_only: bool,
}

impl SparseIndexMap {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, index: u32) -> bool {
        self.entries.contains_key(&index)
    }

    pub fn get(&self, index: u32) -> Option<&SparseEntry> {
        self.entries.get(&index)
    }

    /// Returns true if every entry is a data element with default
    /// attributes, so entries can be moved between indices like storage
    /// slots.
    pub fn has_only_plain_data(&self) -> bool {
        self.entries.values().all(|entry| {
            matches!(entry.value, SparseValue::Data(_)) && entry.attributes.is_default()
        })
    }

    pub fn length_is_read_only(&self) -> bool {
        self.length_is_read_only
    }

    pub(crate) fn set_length_read_only(&mut self) {
        self.length_is_read_only = true;
    }

    /// Ordinary write of a plain value.
    pub(crate) fn put(&mut self, heap: &mut Heap, index: u32, value: Value) -> SparsePut {
        match self.entries.get_mut(&index) {
            Some(SparseEntry {
                value: SparseValue::Accessor { set, .. },
                ..
            }) => SparsePut::Setter(*set),
            Some(SparseEntry {
                attributes: ElementAttributes {
                    writable: false, ..
                },
                ..
            }) => SparsePut::ReadOnly,
            Some(entry) => {
                let old = entry.data_value();
                entry.value = SparseValue::Data(value);
                heap.write_barrier(old);
                SparsePut::Written
            }
            None => {
                self.entries.insert(index, SparseEntry::data(value));
                SparsePut::Written
            }
        }
    }

    /// Defines an entry with explicit attributes. Returns false if an
    /// existing non-configurable entry forbids the redefinition.
    pub(crate) fn define(&mut self, heap: &mut Heap, index: u32, entry: SparseEntry) -> bool {
        if let Some(existing) = self.entries.get_mut(&index) {
            if !existing.attributes.configurable {
                let is_value_update = existing.attributes == entry.attributes
                    && existing.attributes.writable
                    && matches!(
                        (existing.value, entry.value),
                        (SparseValue::Data(_), SparseValue::Data(_))
                    );
                if !is_value_update && *existing != entry {
                    return false;
                }
            }
            let old = existing.data_value();
            *existing = entry;
            heap.write_barrier(old);
        } else {
            self.entries.insert(index, entry);
        }
        true
    }

    /// Deletes an entry. Returns false if the entry is not configurable.
    pub(crate) fn delete(&mut self, heap: &mut Heap, index: u32) -> bool {
        match self.entries.get(&index) {
            Some(entry) if !entry.attributes.configurable => false,
            Some(_) => {
                let old = self.entries.remove(&index).and_then(|e| e.data_value());
                heap.write_barrier(old);
                true
            }
            None => true,
        }
    }

    /// Deletes every entry at or above `new_length`, in descending index
    /// order. Stops at the first non-configurable entry and returns its
    /// index as the error.
    pub(crate) fn truncate(&mut self, heap: &mut Heap, new_length: u32) -> Result<(), u32> {
        let mut doomed: Vec<u32> = self
            .entries
            .keys()
            .copied()
            .filter(|&index| index >= new_length)
            .collect();
        doomed.sort_unstable_by(|a, b| b.cmp(a));
        for index in doomed {
            if !self.delete(heap, index) {
                return Err(index);
            }
        }
        Ok(())
    }

    /// Drops the map. Data values are greyed if marking is running.
    pub(crate) fn free(self, heap: &mut Heap) {
        if heap.is_marking() {
            self.entries
                .into_values()
                .filter_map(|entry| entry.data_value())
                .for_each(|value| heap.write_barrier(Some(value)));
        }
    }

    /// Indices of all entries in ascending order.
    pub fn sorted_indices(&self) -> Vec<u32> {
        let mut indices: Vec<u32> = self.entries.keys().copied().collect();
        indices.sort_unstable();
        indices
    }

    /// Returns true if any entry lies in `start..end`.
    pub fn has_entries_in(&self, start: u32, end: u32) -> bool {
        if (end - start) as usize <= self.entries.len() {
            (start..end).any(|index| self.entries.contains_key(&index))
        } else {
            self.entries
                .keys()
                .any(|&index| (start..end).contains(&index))
        }
    }

    /// Deletes the plain entries in `start..end`.
    pub(crate) fn remove_range(&mut self, heap: &mut Heap, start: u32, end: u32) {
        if !self.has_entries_in(start, end) {
            return;
        }
        for index in self.sorted_indices() {
            if (start..end).contains(&index) {
                let deleted = self.delete(heap, index);
                debug_assert!(deleted);
            }
        }
    }

    /// Moves every entry at or above `from` by `delta` positions.
    pub(crate) fn shift_indices_from(&mut self, from: u32, delta: i64) {
        let moved: Vec<(u32, SparseEntry)> = self
            .entries
            .extract_if(|&index, _| index >= from)
            .collect();
        for (index, entry) in moved {
            let new_index = (index as i64 + delta) as u32;
            self.entries.insert(new_index, entry);
        }
    }
}

impl HeapMark for SparseIndexMap {
    fn mark_values(&self, queues: &mut WorkQueues) {
        self.entries
            .values()
            .filter_map(SparseEntry::data_value)
            .for_each(|value| queues.push_value(value));
    }
}

#[test]
fn put_respects_attributes() {
    let mut heap = Heap::default();
    let mut map = SparseIndexMap::default();
    assert_eq!(map.put(&mut heap, 5, Value::from(1)), SparsePut::Written);
    let frozen = SparseEntry {
        value: SparseValue::Data(Value::from(2)),
        attributes: ElementAttributes {
            writable: false,
            enumerable: true,
            configurable: false,
        },
    };
    assert!(map.define(&mut heap, 6, frozen));
    assert!(!map.has_only_plain_data());
    assert_eq!(map.put(&mut heap, 6, Value::from(3)), SparsePut::ReadOnly);
    let setter = Function::from_host_id(9);
    let accessor = SparseEntry {
        value: SparseValue::Accessor {
            get: None,
            set: Some(setter),
        },
        attributes: ElementAttributes::default(),
    };
    assert!(map.define(&mut heap, 7, accessor));
    assert_eq!(
        map.put(&mut heap, 7, Value::from(4)),
        SparsePut::Setter(Some(setter))
    );
    assert!(!map.delete(&mut heap, 6));
    assert!(map.delete(&mut heap, 5));
    assert_eq!(map.sorted_indices(), vec![6, 7]);
}

#[test]
fn truncate_stops_at_non_configurable_entry() {
    let mut heap = Heap::default();
    let mut map = SparseIndexMap::default();
    map.put(&mut heap, 1, Value::from(1));
    map.put(&mut heap, 20, Value::from(20));
    map.put(&mut heap, 30, Value::from(30));
    let sealed = SparseEntry {
        value: SparseValue::Data(Value::from(10)),
        attributes: ElementAttributes {
            writable: true,
            enumerable: true,
            configurable: false,
        },
    };
    assert!(map.define(&mut heap, 10, sealed));
    assert_eq!(map.truncate(&mut heap, 5), Err(10));
    // Entries above the sealed one were deleted, entries below remain.
    assert_eq!(map.sorted_indices(), vec![1, 10]);
    assert!(map.has_entries_in(0, 2));
    assert!(!map.has_entries_in(2, 10));
}

#[test]
fn shift_indices_moves_tail() {
    let mut heap = Heap::default();
    let mut map = SparseIndexMap::default();
    map.put(&mut heap, 3, Value::from(3));
    map.put(&mut heap, 100, Value::from(100));
    map.shift_indices_from(50, -10);
    assert_eq!(map.sorted_indices(), vec![3, 90]);
    map.shift_indices_from(0, 2);
    assert_eq!(map.sorted_indices(), vec![5, 92]);
    assert!(map.has_only_plain_data());
    map.remove_range(&mut heap, 0, 10);
    assert_eq!(map.sorted_indices(), vec![92]);
}
