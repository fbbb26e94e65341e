// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ### [23.1.3 Properties of the Array Prototype Object](https://tc39.es/ecma262/#sec-properties-of-the-array-prototype-object)
//!
//! Every routine first tries the storage-level fast path and falls back to
//! the generic algorithm, which only goes through element get, put and
//! delete.

use std::{cmp::Ordering, iter::repeat_n};

use super::{
    Array,
    abstract_operations::{array_create, array_set_length},
    shift::{ShiftCountMode, shift_count, unshift_count},
};
use crate::{
    ecmascript::{
        execution::{Agent, ExceptionType, JsResult},
        types::{Function, Value, is_strictly_equal, same_value_zero},
    },
    heap::{
        bulk_ops::{
            SortCompacted, append_memcpy, fast_copy_within, fast_fill, fast_flat, fast_includes,
            fast_index_of, fast_join, fast_last_index_of, fast_reverse, fast_slice,
            fast_sort_commit, fast_sort_compact, fast_to_reversed, fast_to_spliced, fast_with,
            move_array_elements,
        },
        heap_constants::MAX_ARRAY_LENGTH,
    },
};

/// Nesting of flattened arrays beyond which flat gives up, as a
/// recursive implementation would run out of stack.
const MAX_FLATTEN_NESTING: u32 = 512;

pub struct ArrayPrototype;

impl ArrayPrototype {
    /// ### [23.1.3.2 Array.prototype.concat ( ...items )](https://tc39.es/ecma262/#sec-array.prototype.concat)
    ///
    /// Arrays among `items` are spread, other values are appended as they
    /// are.
    pub fn concat(agent: &mut Agent, array: Array, items: &[Value]) -> JsResult<Array> {
        // 2. Let A be ? ArraySpeciesCreate(O, 0).
        let a = array_create(agent, 0, 0)?;
        // 3. Let n be 0.
        let mut n: u64 = 0;
        // 4. Prepend O to items.
        // 5. For each element E of items, do
        for element in std::iter::once(Value::Array(array)).chain(items.iter().copied()) {
            // a. Let spreadable be ? IsConcatSpreadable(E).
            if let Value::Array(e) = element {
                // i. Let len be ? LengthOfArrayLike(E).
                let len = e.len(agent);
                // ii. If n + len > 2**53 - 1, throw a TypeError exception.
                if n + len as u64 > MAX_ARRAY_LENGTH {
                    return Err(
                        agent.throw_exception(ExceptionType::RangeError, "invalid array length")
                    );
                }
                if !append_memcpy(agent, a, e, n as u32) {
                    // iii. Let k be 0.
                    // iv. Repeat, while k < len,
                    move_array_elements(agent, a, n as u32, e, 0, len)?;
                }
                n += len as u64;
            } else {
                // ii. If n ≥ 2**53 - 1, throw a TypeError exception.
                if n >= MAX_ARRAY_LENGTH {
                    return Err(
                        agent.throw_exception(ExceptionType::RangeError, "invalid array length")
                    );
                }
                // iii. Perform ? CreateDataPropertyOrThrow(A, ! ToString(𝔽(n)), E).
                a.put_index(agent, n as u32, element, true)?;
                // iv. Set n to n + 1.
                n += 1;
            }
        }
        // 6. Perform ? Set(A, "length", 𝔽(n), true).
        array_set_length(agent, a, n, true)?;
        // 7. Return A.
        Ok(a)
    }

    /// ### [23.1.3.4 Array.prototype.copyWithin ( target, start \[ , end \] )](https://tc39.es/ecma262/#sec-array.prototype.copywithin)
    pub fn copy_within(
        agent: &mut Agent,
        array: Array,
        target: i64,
        start: i64,
        end: Option<i64>,
    ) -> JsResult<Array> {
        // 2. Let len be ? LengthOfArrayLike(O).
        let len = array.len(agent);
        // 3-5. Let to be the resolved target.
        let to = relative_index(target, len);
        // 6-8. Let from be the resolved start.
        let from = relative_index(start, len);
        // 9-10. Let final be the resolved end.
        let r#final = end.map_or(len, |end| relative_index(end, len));
        // 11. Let count be min(final - from, len - to).
        let count = r#final.saturating_sub(from).min(len - to);
        if fast_copy_within(agent, array, to, from, count) {
            return Ok(array);
        }
        // 12. If from < to and to < from + count, then
        if from < to && to < from + count {
            // a. Let direction be -1.
            for i in (0..count).rev() {
                move_or_delete(agent, array, from + i, to + i)?;
            }
        } else {
            // 13. Else,
            // a. Let direction be 1.
            for i in 0..count {
                move_or_delete(agent, array, from + i, to + i)?;
            }
        }
        // 15. Return O.
        Ok(array)
    }

    /// ### [23.1.3.7 Array.prototype.fill ( value \[ , start \[ , end \] \] )](https://tc39.es/ecma262/#sec-array.prototype.fill)
    pub fn fill(
        agent: &mut Agent,
        array: Array,
        value: Value,
        start: i64,
        end: Option<i64>,
    ) -> JsResult<Array> {
        let len = array.len(agent);
        // 3-5. Let k be the resolved start.
        let k = relative_index(start, len);
        // 6-8. Let final be the resolved end.
        let r#final = end.map_or(len, |end| relative_index(end, len));
        if fast_fill(agent, array, value, k, r#final) {
            return Ok(array);
        }
        // 9. Repeat, while k < final,
        for k in k..r#final {
            // b. Perform ? Set(O, Pk, value, true).
            array.put_index(agent, k, value, true)?;
        }
        // 10. Return O.
        Ok(array)
    }

    /// ### [23.1.3.13 Array.prototype.flat ( \[ depth \] )](https://tc39.es/ecma262/#sec-array.prototype.flat)
    ///
    /// A `depth` of None flattens completely.
    pub fn flat(agent: &mut Agent, array: Array, depth: Option<u32>) -> JsResult<Array> {
        if let Some(result) = fast_flat(agent, array, depth.unwrap_or(u32::MAX)) {
            return Ok(result);
        }
        // 5. Let A be ? ArraySpeciesCreate(O, 0).
        let a = array_create(agent, 0, 0)?;
        // 6. Perform ? FlattenIntoArray(A, O, sourceLen, 0, depthNum).
        flatten_into_array(agent, a, array, 0, depth, 0)?;
        // 7. Return A.
        Ok(a)
    }

    /// ### [23.1.3.16 Array.prototype.includes ( searchElement \[ , fromIndex \] )](https://tc39.es/ecma262/#sec-array.prototype.includes)
    pub fn includes(
        agent: &mut Agent,
        array: Array,
        search_element: Value,
        from_index: i64,
    ) -> JsResult<bool> {
        // 2. Let len be ? LengthOfArrayLike(O).
        let len = array.len(agent);
        // 3. If len = 0, return false.
        if len == 0 {
            return Ok(false);
        }
        // 4-10. Let k be the resolved fromIndex.
        let k = relative_index(from_index, len);
        if let Some(found) = fast_includes(agent, array, search_element, k) {
            return Ok(found);
        }
        // 11. Repeat, while k < len,
        for k in k..len {
            // a. Let elementK be ? Get(O, ! ToString(𝔽(k))).
            let element_k = array.get(agent, k)?;
            // b. If SameValueZero(searchElement, elementK) is true, return true.
            if same_value_zero(agent.heap(), search_element, element_k) {
                return Ok(true);
            }
        }
        // 12. Return false.
        Ok(false)
    }

    /// ### [23.1.3.17 Array.prototype.indexOf ( searchElement \[ , fromIndex \] )](https://tc39.es/ecma262/#sec-array.prototype.indexof)
    pub fn index_of(
        agent: &mut Agent,
        array: Array,
        search_element: Value,
        from_index: i64,
    ) -> JsResult<Option<u32>> {
        let len = array.len(agent);
        // 3. If len = 0, return -1𝔽.
        if len == 0 {
            return Ok(None);
        }
        // 4-10. Let k be the resolved fromIndex.
        let k = relative_index(from_index, len);
        if let Some(found) = fast_index_of(agent, array, search_element, k) {
            return Ok(found);
        }
        // 11. Repeat, while k < len,
        for k in k..len {
            // b. If kPresent is true, then
            // ii. If IsStrictlyEqual(searchElement, elementK) is true, return 𝔽(k).
            if let Some(element_k) = array.get_if_present(agent, k)?
                && is_strictly_equal(agent.heap(), search_element, element_k)
            {
                return Ok(Some(k));
            }
        }
        // 12. Return -1𝔽.
        Ok(None)
    }

    /// ### [23.1.3.18 Array.prototype.join ( separator )](https://tc39.es/ecma262/#sec-array.prototype.join)
    ///
    /// Arrays that contain themselves join as empty strings at the point of
    /// recursion.
    pub fn join(agent: &mut Agent, array: Array, separator: Option<&str>) -> JsResult<String> {
        let mut ancestors = Vec::new();
        join_elements(agent, array, separator.unwrap_or(","), &mut ancestors)
    }

    /// ### [23.1.3.20 Array.prototype.lastIndexOf ( searchElement \[ , fromIndex \] )](https://tc39.es/ecma262/#sec-array.prototype.lastindexof)
    pub fn last_index_of(
        agent: &mut Agent,
        array: Array,
        search_element: Value,
        from_index: Option<i64>,
    ) -> JsResult<Option<u32>> {
        let len = array.len(agent);
        // 3. If len = 0, return -1𝔽.
        if len == 0 {
            return Ok(None);
        }
        // 4. If fromIndex is present, let fromIndex be ? ToIntegerOrInfinity(fromIndex);
        // else let fromIndex be len - 1.
        let k = match from_index {
            None => len - 1,
            // 6. If fromIndex ≥ 0, then let k be min(fromIndex, len - 1).
            Some(from) if from >= 0 => from.min(len as i64 - 1) as u32,
            // 7. Else, let k be len + fromIndex.
            Some(from) => match u32::try_from(len as i64 + from) {
                Ok(k) => k,
                Err(_) => return Ok(None),
            },
        };
        if let Some(found) = fast_last_index_of(agent, array, search_element, k) {
            return Ok(found);
        }
        // 8. Repeat, while k ≥ 0,
        for k in (0..=k).rev() {
            // b. If kPresent is true, then
            // ii. If IsStrictlyEqual(searchElement, elementK) is true, return 𝔽(k).
            if let Some(element_k) = array.get_if_present(agent, k)?
                && is_strictly_equal(agent.heap(), search_element, element_k)
            {
                return Ok(Some(k));
            }
        }
        // 9. Return -1𝔽.
        Ok(None)
    }

    /// ### [23.1.3.22 Array.prototype.pop ( )](https://tc39.es/ecma262/#sec-array.prototype.pop)
    pub fn pop(agent: &mut Agent, array: Array) -> JsResult<Value> {
        array.pop(agent)
    }

    /// ### [23.1.3.23 Array.prototype.push ( ...items )](https://tc39.es/ecma262/#sec-array.prototype.push)
    pub fn push(agent: &mut Agent, array: Array, items: &[Value]) -> JsResult<u32> {
        // 2. Let len be ? LengthOfArrayLike(O).
        let len = array.len(agent);
        // 4. If len + argCount > 2**53 - 1, throw a TypeError exception.
        if len as u64 + items.len() as u64 > MAX_ARRAY_LENGTH {
            return Err(agent.throw_exception(ExceptionType::RangeError, "invalid array length"));
        }
        // 5. For each element E of items, do
        for (index, &item) in (len..).zip(items) {
            // a. Perform ? Set(O, ! ToString(𝔽(len)), E, true).
            array.put_index(agent, index, item, true)?;
        }
        let len = len + items.len() as u32;
        // 6. Perform ? Set(O, "length", 𝔽(len), true).
        array_set_length(agent, array, len as u64, true)?;
        // 7. Return 𝔽(len).
        Ok(len)
    }

    /// ### [23.1.3.26 Array.prototype.reverse ( )](https://tc39.es/ecma262/#sec-array.prototype.reverse)
    pub fn reverse(agent: &mut Agent, array: Array) -> JsResult<Array> {
        if fast_reverse(agent, array) {
            return Ok(array);
        }
        // 2. Let len be ? LengthOfArrayLike(O).
        let len = array.len(agent);
        // 3. Let middle be floor(len / 2).
        let middle = len / 2;
        // 4. Let lower be 0.
        // 5. Repeat, while lower ≠ middle,
        for lower in 0..middle {
            // a. Let upperP be ! ToString(𝔽(len - lower - 1)).
            let upper = len - lower - 1;
            // c-f. Let lowerValue and upperValue be the values if present.
            let lower_value = array.get_if_present(agent, lower)?;
            let upper_value = array.get_if_present(agent, upper)?;
            match (lower_value, upper_value) {
                // g. If lowerExists is true and upperExists is true, then
                (Some(lower_value), Some(upper_value)) => {
                    array.put_index(agent, lower, upper_value, true)?;
                    array.put_index(agent, upper, lower_value, true)?;
                }
                // h. Else if lowerExists is false and upperExists is true, then
                (None, Some(upper_value)) => {
                    array.put_index(agent, lower, upper_value, true)?;
                    delete_or_throw(agent, array, upper)?;
                }
                // i. Else if lowerExists is true and upperExists is false, then
                (Some(lower_value), None) => {
                    delete_or_throw(agent, array, lower)?;
                    array.put_index(agent, upper, lower_value, true)?;
                }
                // j. Else, no action is required.
                (None, None) => {}
            }
        }
        // 6. Return O.
        Ok(array)
    }

    /// ### [23.1.3.27 Array.prototype.shift ( )](https://tc39.es/ecma262/#sec-array.prototype.shift)
    pub fn shift(agent: &mut Agent, array: Array) -> JsResult<Value> {
        // 2. Let len be ? LengthOfArrayLike(O).
        let len = array.len(agent);
        // 3. If len = 0, then
        if len == 0 {
            // a. Perform ? Set(O, "length", +0𝔽, true).
            array_set_length(agent, array, 0, true)?;
            // b. Return undefined.
            return Ok(Value::Undefined);
        }
        // 4. Let first be ? Get(O, "0").
        let first = array.get(agent, 0)?;
        if array.len(agent) == len && shift_count(agent, array, 0, 1, ShiftCountMode::ForShift) {
            return Ok(first);
        }
        // 5. Let k be 1.
        // 6. Repeat, while k < len,
        for k in 1..len {
            move_or_delete(agent, array, k, k - 1)?;
        }
        // 7. Perform ? DeletePropertyOrThrow(O, ! ToString(𝔽(len - 1))).
        delete_or_throw(agent, array, len - 1)?;
        // 8. Perform ? Set(O, "length", 𝔽(len - 1), true).
        array_set_length(agent, array, len as u64 - 1, true)?;
        // 9. Return first.
        Ok(first)
    }

    /// ### [23.1.3.28 Array.prototype.slice ( start, end )](https://tc39.es/ecma262/#sec-array.prototype.slice)
    pub fn slice(agent: &mut Agent, array: Array, start: i64, end: Option<i64>) -> JsResult<Array> {
        // 2. Let len be ? LengthOfArrayLike(O).
        let len = array.len(agent);
        // 3-5. Let k be the resolved start.
        let k = relative_index(start, len);
        // 6-8. Let final be the resolved end.
        let r#final = end.map_or(len, |end| relative_index(end, len));
        // 9. Let count be max(final - k, 0).
        let count = r#final.saturating_sub(k);
        if let Some(result) = fast_slice(agent, array, k, k + count) {
            return Ok(result);
        }
        // 10. Let A be ? ArraySpeciesCreate(O, count).
        let a = array_create(agent, count as u64, 0)?;
        // 11. Let n be 0.
        // 12. Repeat, while k < final,
        for (n, k) in (0..count).zip(k..r#final) {
            // c. If kPresent is true, then
            if let Some(k_value) = array.get_if_present(agent, k)? {
                // ii. Perform ? CreateDataPropertyOrThrow(A, ! ToString(𝔽(n)), kValue).
                a.put_index(agent, n, k_value, true)?;
            }
        }
        // 13. Perform ? Set(A, "length", 𝔽(n), true).
        array_set_length(agent, a, count as u64, true)?;
        // 14. Return A.
        Ok(a)
    }

    /// ### [23.1.3.30 Array.prototype.sort ( comparator )](https://tc39.es/ecma262/#sec-array.prototype.sort)
    ///
    /// Without a `comparator` the elements are ordered by their string
    /// values. Undefined values end up after all other values and holes
    /// after them.
    pub fn sort(agent: &mut Agent, array: Array, comparator: Option<Function>) -> JsResult<Array> {
        // 3. Let len be ? LengthOfArrayLike(obj).
        let len = array.len(agent);
        // 5. Let sortedList be ? SortIndexedProperties(obj, len, SortCompare, skip-holes).
        let sorted = sort_indexed_properties(agent, array, len, comparator)?;
        if fast_sort_commit(agent, array, &sorted.values, sorted.undefined_count, len) {
            return Ok(array);
        }
        // 6. Let itemCount be the number of elements in sortedList.
        let undefined_values = repeat_n(Value::Undefined, sorted.undefined_count as usize);
        // 7. Let j be 0.
        let mut j = 0;
        // 8. Repeat, while j < itemCount,
        for value in sorted.values.into_iter().chain(undefined_values) {
            // a. Perform ? Set(obj, ! ToString(𝔽(j)), sortedList[j], true).
            array.put_index(agent, j, value, true)?;
            // b. Set j to j + 1.
            j += 1;
        }
        // 10. Repeat, while j < len,
        for j in j..len {
            // a. Perform ? DeletePropertyOrThrow(obj, ! ToString(𝔽(j))).
            delete_or_throw(agent, array, j)?;
        }
        // 11. Return obj.
        Ok(array)
    }

    /// ### [23.1.3.31 Array.prototype.splice ( start, deleteCount, ...items )](https://tc39.es/ecma262/#sec-array.prototype.splice)
    ///
    /// Returns the removed elements. A `delete_count` of None removes
    /// everything from `start` on.
    pub fn splice(
        agent: &mut Agent,
        array: Array,
        start: i64,
        delete_count: Option<i64>,
        items: &[Value],
    ) -> JsResult<Array> {
        // 2. Let len be ? LengthOfArrayLike(O).
        let len = array.len(agent);
        // 3-6. Let actualStart be the resolved start.
        let actual_start = relative_index(start, len);
        // 7-10. Let actualDeleteCount be the clamped deleteCount.
        let actual_delete_count = clamp_count(delete_count, len - actual_start);
        let item_count = items.len() as u64;
        // 11. If len + itemCount - actualDeleteCount > 2**53 - 1, throw a TypeError exception.
        let new_len = len as u64 + item_count - actual_delete_count as u64;
        if new_len > MAX_ARRAY_LENGTH {
            return Err(agent.throw_exception(ExceptionType::RangeError, "invalid array length"));
        }
        let item_count = item_count as u32;
        // 12. Let A be ? ArraySpeciesCreate(O, actualDeleteCount).
        let end = actual_start + actual_delete_count;
        let a = match fast_slice(agent, array, actual_start, end) {
            Some(a) => a,
            None => {
                let a = array_create(agent, actual_delete_count as u64, 0)?;
                // 13. Let k be 0.
                // 14. Repeat, while k < actualDeleteCount,
                for k in 0..actual_delete_count {
                    if let Some(from_value) = array.get_if_present(agent, actual_start + k)? {
                        a.put_index(agent, k, from_value, true)?;
                    }
                }
                // 15. Perform ? Set(A, "length", 𝔽(actualDeleteCount), true).
                array_set_length(agent, a, actual_delete_count as u64, true)?;
                a
            }
        };
        let unchanged = array.len(agent) == len;
        // 17. If itemCount < actualDeleteCount, then
        if item_count < actual_delete_count {
            let removed = actual_delete_count - item_count;
            if !(unchanged
                && shift_count(agent, array, actual_start, removed, ShiftCountMode::ForSplice))
            {
                // b. Repeat, while k < (len - actualDeleteCount),
                for k in actual_start..len - actual_delete_count {
                    move_or_delete(agent, array, k + actual_delete_count, k + item_count)?;
                }
                // d. Repeat, while k > (len - actualDeleteCount + itemCount),
                for k in (len - removed..len).rev() {
                    delete_or_throw(agent, array, k)?;
                }
            }
        } else if item_count > actual_delete_count {
            // 18. Else if itemCount > actualDeleteCount, then
            let inserted = item_count - actual_delete_count;
            if !(unchanged && unshift_count(agent, array, actual_start, inserted)) {
                // b. Repeat, while k > actualStart,
                for k in (actual_start..len - actual_delete_count).rev() {
                    move_or_delete(agent, array, k + actual_delete_count, k + item_count)?;
                }
            }
        }
        // 19. Set k to actualStart.
        // 20. For each element E of items, do
        for (k, &item) in (actual_start..).zip(items) {
            // a. Perform ? Set(O, ! ToString(𝔽(k)), E, true).
            array.put_index(agent, k, item, true)?;
        }
        // 21. Perform ? Set(O, "length", 𝔽(len - actualDeleteCount + itemCount), true).
        array_set_length(agent, array, new_len, true)?;
        // 22. Return A.
        Ok(a)
    }

    /// ### [23.1.3.33 Array.prototype.toReversed ( )](https://tc39.es/ecma262/#sec-array.prototype.toreversed)
    pub fn to_reversed(agent: &mut Agent, array: Array) -> JsResult<Array> {
        if let Some(result) = fast_to_reversed(agent, array) {
            return Ok(result);
        }
        // 2. Let len be ? LengthOfArrayLike(O).
        let len = array.len(agent);
        // 3. Let A be ? ArrayCreate(len).
        let a = array_create(agent, len as u64, 0)?;
        // 4. Let k be 0.
        // 5. Repeat, while k < len,
        for k in 0..len {
            // a. Let from be ! ToString(𝔽(len - k - 1)).
            // c. Let fromValue be ? Get(O, from).
            let from_value = array.get(agent, len - k - 1)?;
            // d. Perform ! CreateDataPropertyOrThrow(A, Pk, fromValue).
            a.put_index(agent, k, from_value, true)?;
        }
        // 6. Return A.
        Ok(a)
    }

    /// ### [23.1.3.34 Array.prototype.toSorted ( comparator )](https://tc39.es/ecma262/#sec-array.prototype.tosorted)
    ///
    /// Like [`ArrayPrototype::sort`], but into a new array in which holes
    /// read as undefined.
    pub fn to_sorted(
        agent: &mut Agent,
        array: Array,
        comparator: Option<Function>,
    ) -> JsResult<Array> {
        // 3. Let len be ? LengthOfArrayLike(O).
        let len = array.len(agent);
        // 6. Let sortedList be ? SortIndexedProperties(O, len, SortCompare, read-through-holes).
        let sorted = sort_indexed_properties(agent, array, len, comparator)?;
        let undefined_count = (len as usize).saturating_sub(sorted.values.len());
        let sorted_list: Vec<Value> = sorted
            .values
            .into_iter()
            .chain(repeat_n(Value::Undefined, undefined_count))
            .collect();
        // 4. Let A be ? ArrayCreate(len).
        // 8. Repeat, while j < len,
        // a. Perform ! CreateDataPropertyOrThrow(A, ! ToString(𝔽(j)), sortedList[j]).
        Array::from_slice(agent, &sorted_list)
    }

    /// ### [23.1.3.35 Array.prototype.toSpliced ( start, skipCount, ...items )](https://tc39.es/ecma262/#sec-array.prototype.tospliced)
    pub fn to_spliced(
        agent: &mut Agent,
        array: Array,
        start: i64,
        skip_count: Option<i64>,
        items: &[Value],
    ) -> JsResult<Array> {
        let len = array.len(agent);
        // 3-6. Let actualStart be the resolved start.
        let actual_start = relative_index(start, len);
        // 8-10. Let actualSkipCount be the clamped skipCount.
        let actual_skip_count = clamp_count(skip_count, len - actual_start);
        // 11. Let newLen be len + insertCount - actualSkipCount.
        let new_len = len as u64 + items.len() as u64 - actual_skip_count as u64;
        // 12. If newLen > 2**53 - 1, throw a TypeError exception.
        if new_len > MAX_ARRAY_LENGTH {
            return Err(agent.throw_exception(ExceptionType::RangeError, "invalid array length"));
        }
        if let Some(result) = fast_to_spliced(agent, array, actual_start, actual_skip_count, items)
        {
            return Ok(result);
        }
        // 13. Let A be ? ArrayCreate(newLen).
        let a = array_create(agent, new_len, 0)?;
        // 14. Let i be 0.
        // 16. Repeat, while i < actualStart,
        for i in 0..actual_start {
            let i_value = array.get(agent, i)?;
            a.put_index(agent, i, i_value, true)?;
        }
        // 17. For each element E of items, do
        let mut i = actual_start;
        for &item in items {
            a.put_index(agent, i, item, true)?;
            i += 1;
        }
        // 15. Let r be actualStart + actualSkipCount.
        // 18. Repeat, while i < newLen,
        for r in actual_start + actual_skip_count..len {
            let from_value = array.get(agent, r)?;
            a.put_index(agent, i, from_value, true)?;
            i += 1;
        }
        // 20. Return A.
        Ok(a)
    }

    /// ### [23.1.3.38 Array.prototype.unshift ( ...items )](https://tc39.es/ecma262/#sec-array.prototype.unshift)
    pub fn unshift(agent: &mut Agent, array: Array, items: &[Value]) -> JsResult<u32> {
        // 2. Let len be ? LengthOfArrayLike(O).
        let len = array.len(agent);
        // 3. Let argCount be the number of elements in items.
        let arg_count = items.len() as u64;
        // 4. If argCount > 0, then
        if arg_count > 0 {
            // a. If len + argCount > 2**53 - 1, throw a TypeError exception.
            if len as u64 + arg_count > MAX_ARRAY_LENGTH {
                return Err(
                    agent.throw_exception(ExceptionType::RangeError, "invalid array length")
                );
            }
            let arg_count = arg_count as u32;
            if !unshift_count(agent, array, 0, arg_count) {
                // b. Let k be len.
                // c. Repeat, while k > 0,
                for k in (0..len).rev() {
                    move_or_delete(agent, array, k, k + arg_count)?;
                }
            }
            // d. Let j be +0𝔽.
            // e. For each element E of items, do
            for (j, &item) in (0..).zip(items) {
                // i. Perform ? Set(O, ! ToString(j), E, true).
                array.put_index(agent, j, item, true)?;
            }
        }
        let len = len + items.len() as u32;
        // 5. Perform ? Set(O, "length", 𝔽(len + argCount), true).
        array_set_length(agent, array, len as u64, true)?;
        // 6. Return 𝔽(len + argCount).
        Ok(len)
    }

    /// ### [23.1.3.39 Array.prototype.with ( index, value )](https://tc39.es/ecma262/#sec-array.prototype.with)
    pub fn with(agent: &mut Agent, array: Array, index: i64, value: Value) -> JsResult<Array> {
        // 2. Let len be ? LengthOfArrayLike(O).
        let len = array.len(agent);
        // 4. If relativeIndex ≥ 0, let actualIndex be relativeIndex.
        // 5. Else, let actualIndex be len + relativeIndex.
        let actual_index = if index >= 0 { index } else { len as i64 + index };
        // 6. If actualIndex ≥ len or actualIndex < 0, throw a RangeError exception.
        if actual_index >= len as i64 || actual_index < 0 {
            return Err(agent.throw_exception(ExceptionType::RangeError, "Index out of bounds"));
        }
        let actual_index = actual_index as u32;
        if let Some(result) = fast_with(agent, array, actual_index, value) {
            return Ok(result);
        }
        // 7. Let A be ? ArrayCreate(len).
        let a = array_create(agent, len as u64, 0)?;
        // 8. Let k be 0.
        // 9. Repeat, while k < len,
        for k in 0..len {
            // c. Else, let fromValue be ? Get(O, Pk).
            let from_value = if k == actual_index {
                // b. If k is actualIndex, let fromValue be value.
                value
            } else {
                array.get(agent, k)?
            };
            // d. Perform ! CreateDataPropertyOrThrow(A, Pk, fromValue).
            a.put_index(agent, k, from_value, true)?;
        }
        // 10. Return A.
        Ok(a)
    }
}

/// Resolves a relative index argument against `len`: negative values count
/// from the end, and the result is clamped to `0..=len`.
fn relative_index(relative: i64, len: u32) -> u32 {
    if relative < 0 {
        (len as i64 + relative).max(0) as u32
    } else {
        relative.min(len as i64) as u32
    }
}

/// Clamps a count argument to `0..=max`. None selects `max`.
fn clamp_count(count: Option<i64>, max: u32) -> u32 {
    count.map_or(max, |count| count.clamp(0, max as i64) as u32)
}

/// Moves the element at `from` to `to`, or deletes `to` if `from` is a
/// hole.
fn move_or_delete(agent: &mut Agent, array: Array, from: u32, to: u32) -> JsResult<()> {
    // c. Let fromPresent be ? HasProperty(O, from).
    if let Some(from_value) = array.get_if_present(agent, from)? {
        // ii. Perform ? Set(O, to, fromValue, true).
        array.put_index(agent, to, from_value, true)?;
        Ok(())
    } else {
        // ii. Perform ? DeletePropertyOrThrow(O, to).
        delete_or_throw(agent, array, to)
    }
}

/// ### [7.3.10 DeletePropertyOrThrow ( O, P )](https://tc39.es/ecma262/#sec-deletepropertyorthrow)
fn delete_or_throw(agent: &mut Agent, array: Array, index: u32) -> JsResult<()> {
    if array.delete_index(agent, index) {
        Ok(())
    } else {
        Err(agent.throw_exception(
            ExceptionType::TypeError,
            "Cannot delete non-configurable element",
        ))
    }
}

/// ### [23.1.3.13.1 FlattenIntoArray ( target, source, sourceLen, start, depth )](https://tc39.es/ecma262/#sec-flattenintoarray)
fn flatten_into_array(
    agent: &mut Agent,
    target: Array,
    source: Array,
    start: u32,
    depth: Option<u32>,
    nesting: u32,
) -> JsResult<u32> {
    if nesting > MAX_FLATTEN_NESTING {
        return Err(agent.throw_exception(
            ExceptionType::RangeError,
            "Maximum call stack size exceeded",
        ));
    }
    // 2. Let targetIndex be start.
    let mut target_index = start;
    let source_len = source.len(agent);
    // 4. Repeat, while ℝ(sourceIndex) < sourceLen,
    for source_index in 0..source_len {
        // b. Let exists be ? HasProperty(source, P).
        let Some(element) = source.get_if_present(agent, source_index)? else {
            continue;
        };
        match element {
            // iv. If depth > 0, then
            // 1. Set shouldFlatten to ? IsArray(element).
            Value::Array(nested) if depth.is_none_or(|depth| depth > 0) => {
                // 4. Set targetIndex to ? FlattenIntoArray(target, element, elementLen, targetIndex, newDepth).
                target_index = flatten_into_array(
                    agent,
                    target,
                    nested,
                    target_index,
                    depth.map(|depth| depth - 1),
                    nesting + 1,
                )?;
            }
            _ => {
                // 1. If targetIndex ≥ 2**53 - 1, throw a TypeError exception.
                if target_index == u32::MAX {
                    return Err(
                        agent.throw_exception(ExceptionType::RangeError, "invalid array length")
                    );
                }
                // 2. Perform ? CreateDataPropertyOrThrow(target, ! ToString(𝔽(targetIndex)), element).
                target.put_index(agent, target_index, element, true)?;
                // 3. Set targetIndex to targetIndex + 1.
                target_index += 1;
            }
        }
    }
    // 5. Return targetIndex.
    Ok(target_index)
}

/// ### [23.1.3.30.1 SortIndexedProperties ( obj, len, SortCompare, holes )](https://tc39.es/ecma262/#sec-sortindexedproperties)
///
/// Collects and sorts the elements below `len`, skipping holes. Undefined
/// values are counted instead of sorted.
fn sort_indexed_properties(
    agent: &mut Agent,
    array: Array,
    len: u32,
    comparator: Option<Function>,
) -> JsResult<SortCompacted> {
    let compacted = match fast_sort_compact(agent, array) {
        Some(compacted) => compacted,
        None => {
            // 1. Let items be a new empty List.
            let mut compacted = SortCompacted::default();
            // 3. Repeat, while k < len,
            for k in 0..len {
                // b. If holes is skip-holes, then let kRead be ? HasProperty(obj, Pk).
                // d. If kRead is true, then let kValue be ? Get(obj, Pk).
                match array.get_if_present(agent, k)? {
                    Some(Value::Undefined) => compacted.undefined_count += 1,
                    Some(value) => compacted.values.push(value),
                    None => {}
                }
            }
            compacted
        }
    };
    // 4. Sort items using an implementation-defined sequence of calls to SortCompare.
    let values = sort_values(agent, compacted.values, comparator)?;
    Ok(SortCompacted {
        values,
        undefined_count: compacted.undefined_count,
    })
}

fn sort_values(
    agent: &mut Agent,
    values: Vec<Value>,
    comparator: Option<Function>,
) -> JsResult<Vec<Value>> {
    if values.len() < 2 {
        return Ok(values);
    }
    // Host code may collect garbage while the values only live here.
    let list = Array::from_slice(agent, &values)?;
    let root = agent.heap.add_root(Value::Array(list));
    let sorted = match comparator {
        Some(comparator) => merge_sort(agent, values, comparator),
        None => sort_by_string(agent, values),
    };
    agent.heap.remove_root(root);
    sorted
}

/// Stable bottom-up merge sort. Stops at the first comparator error.
fn merge_sort(
    agent: &mut Agent,
    mut values: Vec<Value>,
    comparator: Function,
) -> JsResult<Vec<Value>> {
    let len = values.len();
    let mut merged = values.clone();
    let mut width = 1;
    while width < len {
        for start in (0..len).step_by(2 * width) {
            let middle = (start + width).min(len);
            let end = (start + 2 * width).min(len);
            let (mut left, mut right) = (start, middle);
            for slot in &mut merged[start..end] {
                let take_left = if left == middle {
                    false
                } else if right == end {
                    true
                } else {
                    compare_array_elements(agent, values[left], values[right], comparator)?
                        != Ordering::Greater
                };
                if take_left {
                    *slot = values[left];
                    left += 1;
                } else {
                    *slot = values[right];
                    right += 1;
                }
            }
        }
        std::mem::swap(&mut values, &mut merged);
        width *= 2;
    }
    Ok(values)
}

/// ### [23.1.3.30.2 CompareArrayElements ( x, y, comparator )](https://tc39.es/ecma262/#sec-comparearrayelements)
///
/// Undefined values never get here.
fn compare_array_elements(
    agent: &mut Agent,
    x: Value,
    y: Value,
    comparator: Function,
) -> JsResult<Ordering> {
    // 4. a. Let v be ? ToNumber(? Call(comparator, undefined, « x, y »)).
    let hooks = agent.host_hooks;
    let v = match hooks.call_comparator(agent, comparator, x, y)? {
        Value::Boolean(boolean) => f64::from(u8::from(boolean)),
        v => v.as_f64(agent.heap()).unwrap_or(f64::NAN),
    };
    // b. If v is NaN, return +0𝔽.
    Ok(v.partial_cmp(&0.0).unwrap_or(Ordering::Equal))
}

/// Orders values by their string values, compared by UTF-16 code units.
fn sort_by_string(agent: &mut Agent, values: Vec<Value>) -> JsResult<Vec<Value>> {
    let mut keyed = Vec::with_capacity(values.len());
    for value in values {
        // 5. Let xString be ? ToString(x).
        let key = to_string(agent, value)?;
        keyed.push((key.encode_utf16().collect::<Vec<u16>>(), value));
    }
    keyed.sort_by(|(x, _), (y, _)| x.cmp(y));
    Ok(keyed.into_iter().map(|(_, value)| value).collect())
}

/// ### [7.1.17 ToString ( argument )](https://tc39.es/ecma262/#sec-tostring)
fn to_string(agent: &mut Agent, value: Value) -> JsResult<String> {
    Ok(match value {
        Value::Undefined => "undefined".to_owned(),
        Value::Null => "null".to_owned(),
        Value::Boolean(boolean) => boolean.to_string(),
        Value::Integer(int) => int.into_i64().to_string(),
        Value::SmallF64(_) | Value::Number(_) => value
            .as_f64(agent.heap())
            .map_or_else(String::new, |number| {
                ryu_js::Buffer::new().format(number).to_owned()
            }),
        Value::String(string) => string.as_str(agent).to_owned(),
        Value::Array(nested) => ArrayPrototype::join(agent, nested, None)?,
    })
}

fn join_elements(
    agent: &mut Agent,
    array: Array,
    separator: &str,
    ancestors: &mut Vec<Array>,
) -> JsResult<String> {
    if ancestors.contains(&array) {
        return Ok(String::new());
    }
    if let Some(joined) = fast_join(agent, array, separator) {
        return Ok(joined);
    }
    ancestors.push(array);
    // 5. Let R be the empty String.
    let mut r = String::new();
    // 6. Let k be 0.
    // 7. Repeat, while k < len,
    for k in 0..array.len(agent) {
        // a. If k > 0, set R to the string-concatenation of R and sep.
        if k > 0 {
            r.push_str(separator);
        }
        // b. Let element be ? Get(O, ! ToString(𝔽(k))).
        let element = array.get(agent, k)?;
        // c. If element is either undefined or null, let next be the empty String;
        // otherwise, let next be ? ToString(element).
        match element {
            Value::Undefined | Value::Null => {}
            Value::Boolean(boolean) => r.push_str(if boolean { "true" } else { "false" }),
            Value::Integer(int) => r.push_str(&int.into_i64().to_string()),
            Value::SmallF64(_) | Value::Number(_) => {
                if let Some(number) = element.as_f64(agent.heap()) {
                    r.push_str(ryu_js::Buffer::new().format(number));
                }
            }
            Value::String(string) => r.push_str(string.as_str(agent)),
            Value::Array(nested) => {
                let nested = join_elements(agent, nested, ",", ancestors)?;
                r.push_str(&nested);
            }
        }
    }
    ancestors.pop();
    // 8. Return R.
    Ok(r)
}

#[test]
fn relative_indices() {
    assert_eq!(relative_index(-1, 5), 4);
    assert_eq!(relative_index(-10, 5), 0);
    assert_eq!(relative_index(7, 5), 5);
    assert_eq!(clamp_count(None, 3), 3);
    assert_eq!(clamp_count(Some(-2), 3), 0);
    assert_eq!(clamp_count(Some(9), 3), 3);
}
