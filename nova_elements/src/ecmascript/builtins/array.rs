// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ### [10.4.2 Array Exotic Objects](https://tc39.es/ecma262/#sec-array-exotic-objects)

pub mod abstract_operations;
pub mod array_prototype;
mod data;
pub mod shift;

pub use array_prototype::ArrayPrototype;
pub use data::ArrayHeapData;

use abstract_operations::{array_set_length, array_try_create, reject};

use crate::{
    ecmascript::{
        execution::{Agent, ExceptionType, JsResult},
        types::{Function, Value},
    },
    heap::{
        AllocError,
        heap_constants::{MAX_ARRAY_INDEX, MAX_STORAGE_VECTOR_LENGTH},
        indexes::ArrayIndex,
        indexing_type::{IndexingType, classify},
        sparse_map::{SparseEntry, SparsePut, SparseValue},
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Array(pub(crate) ArrayIndex);

/// Where an ordinary write ended up.
enum PutOutcome {
    Done,
    /// The index holds a non-writable element.
    ReadOnly,
    /// The index holds an accessor element.
    Setter(Option<Function>),
    OutOfMemory,
}

impl Array {
    pub(crate) fn get_index(self) -> usize {
        self.0.into_index()
    }

    pub fn len(self, agent: &Agent) -> u32 {
        agent[self].len()
    }

    pub fn is_empty(self, agent: &Agent) -> bool {
        agent[self].is_empty()
    }

    pub fn indexing_type(self, agent: &Agent) -> IndexingType {
        agent[self].indexing_type()
    }

    pub fn length_writable(self, agent: &Agent) -> bool {
        !agent[self].length_is_read_only()
    }

    /// Returns true if reading a hole of this array must consult the
    /// prototype chain.
    pub fn holes_must_forward_to_prototype(self, agent: &Agent) -> bool {
        agent.host_hooks.holes_must_forward_to_prototype(self)
    }

    /// ### [7.3.18 CreateArrayFromList ( elements )](https://tc39.es/ecma262/#sec-createarrayfromlist)
    ///
    /// The storage gets the narrowest encoding that holds every element.
    pub fn from_slice(agent: &mut Agent, elements: &[Value]) -> JsResult<Self> {
        let Ok(length) = u32::try_from(elements.len()) else {
            return Err(agent.throw_exception(ExceptionType::RangeError, "invalid array length"));
        };
        if length > MAX_STORAGE_VECTOR_LENGTH {
            return Err(agent.throw_out_of_memory());
        }
        let indexing_type = elements
            .iter()
            .fold(IndexingType::Initial, |indexing_type, &element| {
                indexing_type.promote_for(classify(element))
            });
        let Some(array) = array_try_create(agent, indexing_type, length, length) else {
            return Err(agent.throw_out_of_memory());
        };
        agent.heap.with_array_data(array, |heap, data, _| {
            if let Some(storage) = data.storage.as_mut() {
                for (index, &element) in (0..).zip(elements) {
                    storage.set(heap, index, element);
                }
            }
        });
        Ok(array)
    }

    /// Reads an element straight from vector storage. Returns None for
    /// holes and for elements that need the full lookup.
    pub fn try_get_index_quickly(self, agent: &mut Agent, index: u32) -> Option<Value> {
        let heap = &mut agent.heap;
        let data = &heap[self];
        if index >= data.len() {
            return None;
        }
        let storage = data.storage()?;
        if storage.is_hole(index) {
            return None;
        }
        // Double slots may need a fresh heap number.
        heap.with_array_data(self, |heap, data, _| {
            data.storage.as_ref().and_then(|storage| storage.get(heap, index))
        })
    }

    /// ### [10.1.5 \[\[GetOwnProperty\]\] ( P )](https://tc39.es/ecma262/#sec-ordinary-object-internal-methods-and-internal-slots-getownproperty-p)
    ///
    /// Returns the value of the own element at `index`, calling its getter
    /// if it is an accessor, or None if the index is a hole.
    pub fn get_own(self, agent: &mut Agent, index: u32) -> JsResult<Option<Value>> {
        if let Some(value) = self.try_get_index_quickly(agent, index) {
            return Ok(Some(value));
        }
        let data = &agent[self];
        if index >= data.len() {
            return Ok(None);
        }
        let Some(entry) = data.sparse().and_then(|sparse| sparse.get(index)).copied() else {
            return Ok(None);
        };
        match entry.value {
            SparseValue::Data(value) => Ok(Some(value)),
            SparseValue::Accessor { get: Some(getter), .. } => {
                let hooks = agent.host_hooks;
                hooks.call_getter(agent, getter, self).map(Some)
            }
            SparseValue::Accessor { get: None, .. } => Ok(Some(Value::Undefined)),
        }
    }

    /// Like [`Array::get`], but distinguishes an absent element from an
    /// undefined one.
    pub fn get_if_present(self, agent: &mut Agent, index: u32) -> JsResult<Option<Value>> {
        if let Some(value) = self.get_own(agent, index)? {
            return Ok(Some(value));
        }
        if self.holes_must_forward_to_prototype(agent) {
            let hooks = agent.host_hooks;
            return hooks.get_from_prototype(agent, index);
        }
        Ok(None)
    }

    /// ### [10.1.8 \[\[Get\]\] ( P, Receiver )](https://tc39.es/ecma262/#sec-ordinary-object-internal-methods-and-internal-slots-get-p-receiver)
    pub fn get(self, agent: &mut Agent, index: u32) -> JsResult<Value> {
        Ok(self.get_if_present(agent, index)?.unwrap_or(Value::Undefined))
    }

    pub fn has_own_index(self, agent: &Agent, index: u32) -> bool {
        !agent[self].is_hole(index)
    }

    /// ### [10.1.7 \[\[HasProperty\]\] ( P )](https://tc39.es/ecma262/#sec-ordinary-object-internal-methods-and-internal-slots-hasproperty-p)
    pub fn has_property(self, agent: &mut Agent, index: u32) -> JsResult<bool> {
        if self.has_own_index(agent, index) {
            return Ok(true);
        }
        if self.holes_must_forward_to_prototype(agent) {
            let hooks = agent.host_hooks;
            return Ok(hooks.get_from_prototype(agent, index)?.is_some());
        }
        Ok(false)
    }

    /// ### [10.1.9 \[\[Set\]\] ( P, V, Receiver )](https://tc39.es/ecma262/#sec-ordinary-object-internal-methods-and-internal-slots-set-p-v-receiver)
    ///
    /// Writes `value` at `index`, growing or promoting the storage as
    /// needed and extending the length past `index`. Returns false, or
    /// throws a TypeError if `throw` is set, when the write is rejected.
    pub fn put_index(
        self,
        agent: &mut Agent,
        index: u32,
        value: Value,
        throw: bool,
    ) -> JsResult<bool> {
        if index > MAX_ARRAY_INDEX {
            return Err(agent.throw_exception(ExceptionType::RangeError, "Invalid array index"));
        }
        let data = &agent[self];
        if index >= data.len() && data.length_is_read_only() {
            return reject(agent, throw, "Cannot add element past read-only length");
        }
        let options = agent.options;
        let outcome = agent.heap.with_array_data(self, |heap, data, gc| {
            if let Some(sparse) = data.sparse.as_mut()
                && sparse.contains(index)
            {
                return match sparse.put(heap, index, value) {
                    SparsePut::Written => PutOutcome::Done,
                    SparsePut::ReadOnly => PutOutcome::ReadOnly,
                    SparsePut::Setter(setter) => PutOutcome::Setter(setter),
                };
            }
            if data.should_use_sparse_map(&options, index) {
                if data.ensure_array_storage(heap, &options, gc).is_err() {
                    return PutOutcome::OutOfMemory;
                }
                tracing::trace!(index, "element stored in sparse map");
                data.sparse_mut().put(heap, index, value);
            } else {
                let target = data.indexing_type().promote_for(classify(value));
                if data
                    .grow_and_promote(heap, &options, target, index as u64 + 1, gc)
                    .is_err()
                {
                    return PutOutcome::OutOfMemory;
                }
                let Some(storage) = data.storage.as_mut() else {
                    return PutOutcome::OutOfMemory;
                };
                storage.set(heap, index, value);
            }
            data.length = data.length.max(index + 1);
            PutOutcome::Done
        });
        match outcome {
            PutOutcome::Done => Ok(true),
            PutOutcome::ReadOnly => reject(agent, throw, "Cannot assign to read-only element"),
            PutOutcome::Setter(Some(setter)) => {
                let hooks = agent.host_hooks;
                hooks.call_setter(agent, setter, self, value)?;
                Ok(true)
            }
            PutOutcome::Setter(None) => {
                reject(agent, throw, "Cannot set element which has only a getter")
            }
            PutOutcome::OutOfMemory => Err(agent.throw_out_of_memory()),
        }
    }

    /// ### [10.4.2.1 \[\[DefineOwnProperty\]\] ( P, Desc )](https://tc39.es/ecma262/#sec-array-exotic-objects-defineownproperty-p-desc)
    ///
    /// Elements with non-default attributes and accessors move the array to
    /// the queue encoding and live in its sparse map.
    pub fn define_own_index(
        self,
        agent: &mut Agent,
        index: u32,
        entry: SparseEntry,
    ) -> JsResult<bool> {
        if index > MAX_ARRAY_INDEX {
            return Err(agent.throw_exception(ExceptionType::RangeError, "Invalid array index"));
        }
        let data = &agent[self];
        // 3. c. If index ≥ length and lengthDesc.[[Writable]] is false, return false.
        if index >= data.len() && data.length_is_read_only() {
            return Ok(false);
        }
        let in_sparse = data.sparse().is_some_and(|sparse| sparse.contains(index));
        if let SparseValue::Data(value) = entry.value
            && entry.attributes.is_default()
            && !in_sparse
        {
            return self.put_index(agent, index, value, false);
        }
        let options = agent.options;
        let defined = agent.heap.with_array_data(self, |heap, data, gc| {
            data.ensure_array_storage(heap, &options, gc)?;
            if let Some(storage) = data.storage.as_mut() {
                storage.clear(heap, index);
            }
            let defined = data.sparse_mut().define(heap, index, entry);
            if defined {
                data.length = data.length.max(index + 1);
            }
            Ok(defined)
        });
        defined.map_err(|_: AllocError| agent.throw_out_of_memory())
    }

    /// ### [10.1.10 \[\[Delete\]\] ( P )](https://tc39.es/ecma262/#sec-ordinary-object-internal-methods-and-internal-slots-delete-p)
    ///
    /// Leaves a hole. Returns false for non-configurable elements.
    pub fn delete_index(self, agent: &mut Agent, index: u32) -> bool {
        agent.heap.with_array_data(self, |heap, data, _| {
            if let Some(sparse) = data.sparse.as_mut()
                && sparse.contains(index)
            {
                return sparse.delete(heap, index);
            }
            if let Some(storage) = data.storage.as_mut() {
                storage.clear(heap, index);
            }
            true
        })
    }

    /// Appends `value` and returns the new length.
    pub fn push(self, agent: &mut Agent, value: Value) -> JsResult<u32> {
        let length = self.len(agent);
        if length == u32::MAX {
            return Err(agent.throw_exception(ExceptionType::RangeError, "invalid array length"));
        }
        self.put_index(agent, length, value, true)?;
        Ok(length + 1)
    }

    /// Removes and returns the last element, or undefined if the array is
    /// empty.
    pub fn pop(self, agent: &mut Agent) -> JsResult<Value> {
        let length = self.len(agent);
        if length == 0 {
            array_set_length(agent, self, 0, true)?;
            return Ok(Value::Undefined);
        }
        let value = self.get(agent, length - 1)?;
        array_set_length(agent, self, length as u64 - 1, true)?;
        Ok(value)
    }

    /// Own elements in index order; holes are None.
    pub fn to_vec(self, agent: &mut Agent) -> JsResult<Vec<Option<Value>>> {
        (0..self.len(agent))
            .map(|index| self.get_own(agent, index))
            .collect()
    }
}

impl From<ArrayIndex> for Array {
    fn from(value: ArrayIndex) -> Self {
        Array(value)
    }
}

#[test]
fn put_index_grows_and_promotes() {
    use crate::ecmascript::execution::{DefaultHostHooks, Options};

    let mut agent = Agent::new(Options::default(), &DefaultHostHooks);
    let array = Array::from_slice(&mut agent, &[Value::from(1), Value::from(2)]).unwrap();
    assert_eq!(array.indexing_type(&agent), IndexingType::Int32);
    array.put_index(&mut agent, 5, Value::from(6), true).unwrap();
    assert_eq!(array.len(&agent), 6);
    assert!(!array.has_own_index(&agent, 3));
    let half = Value::from_f64(agent.heap_mut(), 0.5);
    array.put_index(&mut agent, 0, half, true).unwrap();
    assert_eq!(array.indexing_type(&agent), IndexingType::Double);
    assert_eq!(array.get(&mut agent, 0).unwrap(), half);
    assert_eq!(array.get(&mut agent, 1).unwrap(), Value::from(2));
    assert_eq!(array.get(&mut agent, 3).unwrap(), Value::Undefined);
    let err = array
        .put_index(&mut agent, u32::MAX, Value::Null, true)
        .unwrap_err();
    assert_eq!(err.exception_type(), ExceptionType::RangeError);
}

#[test]
fn non_default_attributes_use_sparse_map() {
    use crate::{
        ecmascript::execution::{DefaultHostHooks, Options},
        heap::sparse_map::ElementAttributes,
    };

    let mut agent = Agent::new(Options::default(), &DefaultHostHooks);
    let array = Array::from_slice(&mut agent, &[Value::from(1), Value::from(2)]).unwrap();
    let frozen = SparseEntry {
        value: SparseValue::Data(Value::from(7)),
        attributes: ElementAttributes {
            writable: false,
            enumerable: true,
            configurable: false,
        },
    };
    assert!(array.define_own_index(&mut agent, 1, frozen).unwrap());
    assert_eq!(array.indexing_type(&agent), IndexingType::ArrayStorage);
    assert_eq!(array.get(&mut agent, 1).unwrap(), Value::from(7));
    assert!(!array.put_index(&mut agent, 1, Value::from(8), false).unwrap());
    assert!(!array.delete_index(&mut agent, 1));
    assert!(array.delete_index(&mut agent, 0));
    assert_eq!(array.to_vec(&mut agent).unwrap(), vec![None, Some(Value::from(7))]);
}
