// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use super::{Array, ArrayHeapData};
use crate::{
    ecmascript::execution::{Agent, ExceptionType, JsResult},
    heap::{
        AllocError,
        element_array::IndexedStorage,
        heap_constants::{MAX_ARRAY_LENGTH, MAX_STORAGE_VECTOR_LENGTH},
        indexing_type::IndexingType,
    },
};

/// ### [10.4.2.2 ArrayCreate ( length \[ , proto \] )](https://tc39.es/ecma262/#sec-arraycreate)
///
/// The abstract operation ArrayCreate takes argument length (a non-negative
/// integer) and returns either a normal completion containing an Array
/// exotic object or a throw completion. It is used to specify the creation
/// of new Arrays.
///
/// A non-zero `capacity` preallocates Int32 storage for that many elements.
pub fn array_create(agent: &mut Agent, length: u64, capacity: u32) -> JsResult<Array> {
    // 1. If length > 2**32 - 1, throw a RangeError exception.
    if length > MAX_ARRAY_LENGTH {
        return Err(agent.throw_exception(ExceptionType::RangeError, "invalid array length"));
    }
    let indexing_type = if capacity == 0 {
        IndexingType::Initial
    } else {
        IndexingType::Int32
    };
    array_try_create(agent, indexing_type, length as u32, capacity)
        .ok_or_else(|| agent.throw_out_of_memory())
}

/// Creates an array of `initial_length` holes backed by storage of the
/// given encoding with exactly `vector_length_hint` slots.
///
/// Returns None without touching the heap if the hint exceeds the maximum
/// storage length or the allocation fails.
pub fn array_try_create(
    agent: &mut Agent,
    indexing_type: IndexingType,
    initial_length: u32,
    vector_length_hint: u32,
) -> Option<Array> {
    if vector_length_hint > MAX_STORAGE_VECTOR_LENGTH {
        return None;
    }
    let storage = if vector_length_hint == 0 || indexing_type == IndexingType::Initial {
        None
    } else {
        Some(IndexedStorage::try_create(
            &mut agent.heap,
            indexing_type,
            vector_length_hint,
        )?)
    };
    Some(agent.heap.create_array(ArrayHeapData {
        length: initial_length,
        storage,
        sparse: None,
    }))
}

/// ### [10.4.2.4 ArraySetLength ( A, Desc )](https://tc39.es/ecma262/#sec-arraysetlength)
///
/// Sets the length of `array` to `new_length`. Returns false, or throws a
/// TypeError if `throw` is set, when the length is read-only or an element
/// past the new length cannot be deleted.
pub fn array_set_length(
    agent: &mut Agent,
    array: Array,
    new_length: u64,
    throw: bool,
) -> JsResult<bool> {
    // 5. If SameValueZero(newLen, numberLen) is false, throw a RangeError exception.
    if new_length > MAX_ARRAY_LENGTH {
        return Err(agent.throw_exception(ExceptionType::RangeError, "invalid array length"));
    }
    let new_length = new_length as u32;
    // 12. If oldLenDesc.[[Writable]] is false, return false.
    if agent[array].length_is_read_only() {
        return reject(agent, throw, "Cannot assign to read-only length");
    }
    let succeeded = agent.heap.with_array_data(array, |heap, data, _| {
        // 10. Let oldLen be oldLenDesc.[[Value]].
        let old_length = data.length;
        // 11. If newLen ≥ oldLen, then
        if new_length >= old_length {
            // a. Return ! OrdinaryDefineOwnProperty(A, "length", newLenDesc).
            data.length = new_length;
            return true;
        }
        // 17. For each own property key P of A such that P is an array index
        // and ! ToUint32(P) ≥ newLen, in descending numeric index order, do
        let mut kept_length = new_length;
        if let Some(sparse) = data.sparse.as_mut()
            && let Err(index) = sparse.truncate(heap, new_length)
        {
            // b. i. Set newLenDesc.[[Value]] to ! ToUint32(P) + 1𝔽.
            kept_length = index + 1;
        }
        let indexing_type = data.indexing_type();
        if let Some(storage) = data.storage.as_mut() {
            let gc_safe = heap.needs_gc_safe_ops(indexing_type);
            storage.clear_range(heap, kept_length..old_length, gc_safe);
        }
        data.length = kept_length;
        if kept_length == 0 {
            data.reset(heap);
        }
        // b. iv. Return false.
        kept_length == new_length
    });
    if succeeded {
        // 19. Return true.
        Ok(true)
    } else {
        reject(agent, throw, "Cannot delete non-configurable element")
    }
}

/// Makes the length of `array` non-writable. The array moves to the queue
/// encoding, whose sparse map carries the flag.
pub fn array_set_length_read_only(agent: &mut Agent, array: Array) -> JsResult<()> {
    let options = agent.options;
    agent
        .heap
        .with_array_data(array, |heap, data, gc| {
            data.ensure_array_storage(heap, &options, gc)?;
            data.sparse_mut().set_length_read_only();
            Ok(())
        })
        .map_err(|_: AllocError| agent.throw_out_of_memory())
}

pub(crate) fn reject(agent: &mut Agent, throw: bool, message: &'static str) -> JsResult<bool> {
    if throw {
        Err(agent.throw_exception(ExceptionType::TypeError, message))
    } else {
        Ok(false)
    }
}
