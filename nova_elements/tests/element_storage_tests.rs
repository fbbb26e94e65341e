use nova_elements::{
    ecmascript::{
        builtins::{
            Array, ArrayPrototype,
            array::{
                abstract_operations::{
                    array_create, array_set_length, array_set_length_read_only, array_try_create,
                },
                shift::{ShiftCountMode, shift_count, unshift_count},
            },
        },
        execution::{Agent, DefaultHostHooks, ExceptionType, Options},
        types::Value,
    },
    heap::{heap_constants::MAX_STORAGE_VECTOR_LENGTH, indexing_type::IndexingType},
};

fn agent() -> Agent {
    Agent::new(Options::default(), &DefaultHostHooks)
}

fn ints(values: impl IntoIterator<Item = i32>) -> Vec<Value> {
    values.into_iter().map(Value::from).collect()
}

fn elements(agent: &mut Agent, array: Array) -> Vec<Option<Value>> {
    array.to_vec(agent).unwrap()
}

fn present(values: &[Value]) -> Vec<Option<Value>> {
    values.iter().copied().map(Some).collect()
}

/// Arrays with the same contents in each encoding.
fn arrays_in_every_encoding(agent: &mut Agent, values: &[Value]) -> Vec<Array> {
    let int32 = Array::from_slice(agent, values).unwrap();
    let double = Array::from_slice(agent, values).unwrap();
    let half = Value::from_f64(agent.heap_mut(), 0.5);
    double.push(agent, half).unwrap();
    double.pop(agent).unwrap();
    let contiguous = Array::from_slice(agent, values).unwrap();
    contiguous.push(agent, Value::Null).unwrap();
    contiguous.pop(agent).unwrap();
    let queue = Array::from_slice(agent, &ints(0..200)).unwrap();
    assert!(shift_count(agent, queue, 0, 1, ShiftCountMode::ForShift));
    assert_eq!(queue.indexing_type(agent), IndexingType::ArrayStorage);
    assert!(shift_count(agent, queue, 0, 199, ShiftCountMode::ForShift));
    ArrayPrototype::push(agent, queue, values).unwrap();

    assert_eq!(int32.indexing_type(agent), IndexingType::Int32);
    assert_eq!(double.indexing_type(agent), IndexingType::Double);
    assert_eq!(contiguous.indexing_type(agent), IndexingType::Contiguous);
    vec![int32, double, contiguous, queue]
}

#[test]
fn push_pop_round_trip() {
    let mut agent = agent();
    let array = Array::from_slice(&mut agent, &ints([1, 2, 3])).unwrap();
    let pushed = [
        Value::from(4),
        Value::from_f64(agent.heap_mut(), 2.5),
        Value::String(agent.create_string("five")),
        Value::Null,
    ];
    for &value in &pushed {
        array.push(&mut agent, value).unwrap();
    }
    assert_eq!(array.len(&agent), 7);
    for &value in pushed.iter().rev() {
        assert_eq!(array.pop(&mut agent).unwrap(), value);
    }
    assert_eq!(elements(&mut agent, array), present(&ints([1, 2, 3])));
    assert_eq!(array.indexing_type(&agent), IndexingType::Contiguous);
}

#[test]
fn concat_copies_at_offset() {
    let mut agent = agent();
    let a = Array::from_slice(&mut agent, &ints([1, 2])).unwrap();
    let half = Value::from_f64(agent.heap_mut(), 1.5);
    let b = Array::from_slice(&mut agent, &[half, Value::from(7)]).unwrap();
    let c = ArrayPrototype::concat(&mut agent, a, &[b.into(), Value::Null]).unwrap();
    assert_eq!(c.len(&agent), 5);
    assert_eq!(
        elements(&mut agent, c),
        present(&[Value::from(1), Value::from(2), half, Value::from(7), Value::Null])
    );
    // The sources are untouched.
    assert_eq!(elements(&mut agent, a), present(&ints([1, 2])));
    assert_eq!(b.indexing_type(&agent), IndexingType::Double);
}

#[test]
fn shift_count_law() {
    let mut agent = agent();
    let values = ints(0..10);
    for array in arrays_in_every_encoding(&mut agent, &values) {
        assert!(shift_count(&mut agent, array, 3, 4, ShiftCountMode::ForSplice));
        assert_eq!(array.len(&agent), 6);
        let expected = ints([0, 1, 2, 7, 8, 9]);
        assert_eq!(elements(&mut agent, array), present(&expected));
    }
}

#[test]
fn unshift_count_law() {
    let mut agent = agent();
    let values = ints(0..10);
    for array in arrays_in_every_encoding(&mut agent, &values) {
        assert!(unshift_count(&mut agent, array, 4, 3));
        assert_eq!(array.len(&agent), 13);
        let got = elements(&mut agent, array);
        assert_eq!(got[..4], present(&ints(0..4))[..]);
        assert_eq!(got[4..7], [None, None, None]);
        assert_eq!(got[7..], present(&ints(4..10))[..]);
    }
}

#[test]
fn shift_is_left_inverse_of_unshift() {
    let mut agent = agent();
    let values = ints(0..10);
    for array in arrays_in_every_encoding(&mut agent, &values) {
        for (start, count) in [(0, 1), (0, 20), (5, 2), (10, 3)] {
            assert!(unshift_count(&mut agent, array, start, count));
            assert!(shift_count(
                &mut agent,
                array,
                start,
                count,
                ShiftCountMode::ForSplice
            ));
            assert_eq!(elements(&mut agent, array), present(&values));
        }
    }
}

#[test]
fn long_shift_converts_to_queue() {
    let mut agent = agent();
    let array = Array::from_slice(&mut agent, &ints(0..1000)).unwrap();
    for expected in 0..500 {
        assert_eq!(
            ArrayPrototype::shift(&mut agent, array).unwrap(),
            Value::from(expected)
        );
    }
    assert_eq!(array.indexing_type(&agent), IndexingType::ArrayStorage);
    assert_eq!(array.len(&agent), 500);
    assert_eq!(array.get(&mut agent, 0).unwrap(), Value::from(500));
    ArrayPrototype::unshift(&mut agent, array, &ints([-1, -2])).unwrap();
    assert_eq!(array.get(&mut agent, 0).unwrap(), Value::from(-1));
    assert_eq!(array.get(&mut agent, 2).unwrap(), Value::from(500));
    assert_eq!(array.len(&agent), 502);
}

#[test]
fn double_promotes_to_contiguous_once() {
    let mut agent = agent();
    let numbers = [0.1, -0.0, 2.5, 1e300, f64::MIN_POSITIVE, 3.0];
    let values: Vec<Value> = numbers
        .iter()
        .map(|&number| Value::from_f64(agent.heap_mut(), number))
        .collect();
    let array = Array::from_slice(&mut agent, &values).unwrap();
    assert_eq!(array.indexing_type(&agent), IndexingType::Double);
    let text = Value::String(agent.create_string("x"));
    array.push(&mut agent, text).unwrap();
    assert_eq!(array.indexing_type(&agent), IndexingType::Contiguous);
    array.push(&mut agent, Value::from(1)).unwrap();
    let half = Value::from_f64(agent.heap_mut(), 0.5);
    array.put_index(&mut agent, 0, half, true).unwrap();
    assert_eq!(array.indexing_type(&agent), IndexingType::Contiguous);
    for (index, &number) in (1..).zip(&numbers[1..]) {
        let value = array.get(&mut agent, index).unwrap();
        let read = value.as_f64(agent.heap()).unwrap();
        assert_eq!(read.to_bits(), number.to_bits());
    }
    assert_eq!(array.get(&mut agent, 6).unwrap(), text);
}

#[test]
fn nan_is_never_stored_as_double() {
    let mut agent = agent();
    let half = Value::from_f64(agent.heap_mut(), 0.5);
    let array = Array::from_slice(&mut agent, &[half]).unwrap();
    let nan = Value::from_f64(agent.heap_mut(), f64::NAN);
    array.push(&mut agent, nan).unwrap();
    assert_eq!(array.indexing_type(&agent), IndexingType::Contiguous);
    assert!(array.has_own_index(&agent, 1));
    let read = array.get(&mut agent, 1).unwrap();
    assert!(read.as_f64(agent.heap()).unwrap().is_nan());
    assert!(ArrayPrototype::includes(&mut agent, array, nan, 0).unwrap());
    assert_eq!(ArrayPrototype::index_of(&mut agent, array, nan, 0).unwrap(), None);
}

#[test]
fn read_only_length_rejects_changes() {
    let mut agent = agent();
    let array = Array::from_slice(&mut agent, &ints([1, 2, 3])).unwrap();
    array_set_length_read_only(&mut agent, array).unwrap();
    assert!(!array.length_writable(&agent));
    assert_eq!(array.indexing_type(&agent), IndexingType::ArrayStorage);

    let err = array_set_length(&mut agent, array, 1, true).unwrap_err();
    assert_eq!(err.exception_type(), ExceptionType::TypeError);
    assert!(!array_set_length(&mut agent, array, 10, false).unwrap());
    assert_eq!(array.len(&agent), 3);

    let err = array.push(&mut agent, Value::from(4)).unwrap_err();
    assert_eq!(err.exception_type(), ExceptionType::TypeError);
    assert!(ArrayPrototype::shift(&mut agent, array).is_err());
    assert!(!unshift_count(&mut agent, array, 0, 1));
    // Existing elements stay writable.
    assert!(array.put_index(&mut agent, 0, Value::from(9), true).unwrap());
    assert_eq!(array.len(&agent), 3);
}

#[test]
fn shift_then_unshift_scenario() {
    let mut agent = agent();
    let array = Array::from_slice(&mut agent, &ints([1, 2, 3])).unwrap();
    assert_eq!(
        ArrayPrototype::shift(&mut agent, array).unwrap(),
        Value::from(1)
    );
    assert_eq!(elements(&mut agent, array), present(&ints([2, 3])));
    assert_eq!(
        ArrayPrototype::unshift(&mut agent, array, &ints([9])).unwrap(),
        3
    );
    assert_eq!(elements(&mut agent, array), present(&ints([9, 2, 3])));
}

#[test]
fn try_create_rejects_oversized_hint() {
    let mut agent = agent();
    let before = agent.heap().allocated_bytes();
    assert!(
        array_try_create(
            &mut agent,
            IndexingType::Int32,
            5,
            MAX_STORAGE_VECTOR_LENGTH + 1
        )
        .is_none()
    );
    assert_eq!(agent.heap().allocated_bytes(), before);
    let array = array_try_create(&mut agent, IndexingType::Int32, 5, 8).unwrap();
    assert_eq!(array.len(&agent), 5);
    assert!(!array.has_own_index(&agent, 0));
    assert!(agent.heap().allocated_bytes() > before);
}

#[test]
fn far_write_goes_sparse() {
    let mut agent = agent();
    let array = Array::from_slice(&mut agent, &ints([1, 2, 3])).unwrap();
    array
        .put_index(&mut agent, 10_000_000, Value::from(42), true)
        .unwrap();
    assert_eq!(array.indexing_type(&agent), IndexingType::ArrayStorage);
    assert_eq!(array.len(&agent), 10_000_001);
    assert_eq!(
        array.get(&mut agent, 10_000_000).unwrap(),
        Value::from(42)
    );
    assert_eq!(array.get(&mut agent, 2).unwrap(), Value::from(3));
    assert!(!array.has_own_index(&agent, 5_000_000));
    // No vector was sized for the far index.
    assert!(agent.heap().allocated_bytes() < 4096);

    array_set_length(&mut agent, array, 2, true).unwrap();
    assert!(!array.has_own_index(&agent, 10_000_000));
    assert_eq!(elements(&mut agent, array), present(&ints([1, 2])));
}

#[test]
fn array_create_validates_length() {
    let mut agent = agent();
    let err = array_create(&mut agent, u32::MAX as u64 + 1, 0).unwrap_err();
    assert_eq!(err.exception_type(), ExceptionType::RangeError);
    let array = array_create(&mut agent, 3, 4).unwrap();
    assert_eq!(array.len(&agent), 3);
    assert_eq!(array.indexing_type(&agent), IndexingType::Int32);
    assert_eq!(elements(&mut agent, array), vec![None, None, None]);
}

#[test]
fn truncating_to_zero_starts_over() {
    let mut agent = agent();
    let array = Array::from_slice(&mut agent, &[Value::Null, Value::from(1)]).unwrap();
    array.put_index(&mut agent, 500_000, Value::from(2), true).unwrap();
    assert_eq!(array.indexing_type(&agent), IndexingType::ArrayStorage);
    assert!(array_set_length(&mut agent, array, 0, true).unwrap());
    assert_eq!(array.indexing_type(&agent), IndexingType::Initial);
    assert_eq!(agent.heap().allocated_bytes(), 0);
    array.push(&mut agent, Value::from(5)).unwrap();
    assert_eq!(array.indexing_type(&agent), IndexingType::Int32);
}

#[test]
fn non_configurable_element_stops_truncation() {
    use nova_elements::heap::sparse_map::{ElementAttributes, SparseEntry, SparseValue};

    let mut agent = agent();
    let array = Array::from_slice(&mut agent, &ints(0..6)).unwrap();
    let sealed = SparseEntry {
        value: SparseValue::Data(Value::from(2)),
        attributes: ElementAttributes {
            writable: true,
            enumerable: true,
            configurable: false,
        },
    };
    assert!(array.define_own_index(&mut agent, 2, sealed).unwrap());
    assert!(!array_set_length(&mut agent, array, 0, false).unwrap());
    assert_eq!(array.len(&agent), 3);
    assert_eq!(elements(&mut agent, array), present(&ints(0..3)));
    let err = array_set_length(&mut agent, array, 1, true).unwrap_err();
    assert_eq!(err.exception_type(), ExceptionType::TypeError);
}

#[test]
fn allocation_failure_changes_nothing() {
    let options = Options {
        heap_limit: Some(48),
        ..Options::default()
    };
    let mut agent = Agent::new(options, &DefaultHostHooks);
    let array = Array::from_slice(&mut agent, &ints([1, 2, 3, 4])).unwrap();
    let bytes = agent.heap().allocated_bytes();

    let err = array.push(&mut agent, Value::from(5)).unwrap_err();
    assert_eq!(err.exception_type(), ExceptionType::RangeError);
    let text = Value::String(agent.create_string("promote"));
    assert!(array.put_index(&mut agent, 0, text, true).is_err());

    assert_eq!(array.len(&agent), 4);
    assert_eq!(array.indexing_type(&agent), IndexingType::Int32);
    assert_eq!(agent.heap().allocated_bytes(), bytes);
    assert_eq!(elements(&mut agent, array), present(&ints([1, 2, 3, 4])));
}

#[test]
fn splice_and_to_spliced() {
    let mut agent = agent();
    let array = Array::from_slice(&mut agent, &ints(0..8)).unwrap();
    let copy = ArrayPrototype::to_spliced(&mut agent, array, 2, Some(3), &ints([-1])).unwrap();
    assert_eq!(elements(&mut agent, copy), present(&ints([0, 1, -1, 5, 6, 7])));

    let removed = ArrayPrototype::splice(&mut agent, array, 2, Some(3), &ints([-1])).unwrap();
    assert_eq!(elements(&mut agent, removed), present(&ints([2, 3, 4])));
    assert_eq!(elements(&mut agent, array), present(&ints([0, 1, -1, 5, 6, 7])));

    let removed =
        ArrayPrototype::splice(&mut agent, array, -1, Some(0), &ints([8, 9, 10])).unwrap();
    assert!(removed.is_empty(&agent));
    assert_eq!(
        elements(&mut agent, array),
        present(&ints([0, 1, -1, 5, 6, 8, 9, 10, 7]))
    );
    let removed = ArrayPrototype::splice(&mut agent, array, 3, None, &[]).unwrap();
    assert_eq!(removed.len(&agent), 6);
    assert_eq!(elements(&mut agent, array), present(&ints([0, 1, -1])));
}

#[test]
fn copying_routines_fill_holes_with_undefined() {
    let mut agent = agent();
    let array = Array::from_slice(&mut agent, &ints([1, 2, 3])).unwrap();
    assert!(array.delete_index(&mut agent, 1));
    let reversed = ArrayPrototype::to_reversed(&mut agent, array).unwrap();
    assert_eq!(
        elements(&mut agent, reversed),
        present(&[Value::from(3), Value::Undefined, Value::from(1)])
    );
    let with = ArrayPrototype::with(&mut agent, array, -1, Value::Null).unwrap();
    assert_eq!(
        elements(&mut agent, with),
        present(&[Value::from(1), Value::Undefined, Value::Null])
    );
    let err = ArrayPrototype::with(&mut agent, array, 3, Value::Null).unwrap_err();
    assert_eq!(err.exception_type(), ExceptionType::RangeError);
    // slice keeps holes as holes.
    let slice = ArrayPrototype::slice(&mut agent, array, 0, None).unwrap();
    assert_eq!(
        elements(&mut agent, slice),
        vec![Some(Value::from(1)), None, Some(Value::from(3))]
    );
    ArrayPrototype::reverse(&mut agent, array).unwrap();
    assert_eq!(
        elements(&mut agent, array),
        vec![Some(Value::from(3)), None, Some(Value::from(1))]
    );
}

#[test]
fn searching() {
    let mut agent = agent();
    let array = Array::from_slice(&mut agent, &ints([5, 6, 7, 6])).unwrap();
    let six = Value::from_f64(agent.heap_mut(), 6.0);
    assert_eq!(
        ArrayPrototype::index_of(&mut agent, array, six, 0).unwrap(),
        Some(1)
    );
    assert_eq!(
        ArrayPrototype::index_of(&mut agent, array, six, -1).unwrap(),
        Some(3)
    );
    assert!(!ArrayPrototype::includes(&mut agent, array, Value::Undefined, 0).unwrap());
    array_set_length(&mut agent, array, 6, true).unwrap();
    assert!(ArrayPrototype::includes(&mut agent, array, Value::Undefined, 0).unwrap());
    assert_eq!(
        ArrayPrototype::index_of(&mut agent, array, Value::Undefined, 0).unwrap(),
        None
    );
}

#[test]
fn fill_and_copy_within() {
    let mut agent = agent();
    let array = Array::from_slice(&mut agent, &ints(0..6)).unwrap();
    ArrayPrototype::copy_within(&mut agent, array, 0, 3, None).unwrap();
    assert_eq!(elements(&mut agent, array), present(&ints([3, 4, 5, 3, 4, 5])));
    ArrayPrototype::copy_within(&mut agent, array, 2, 0, Some(3)).unwrap();
    assert_eq!(elements(&mut agent, array), present(&ints([3, 4, 3, 4, 5, 5])));
    let text = Value::String(agent.create_string("f"));
    ArrayPrototype::fill(&mut agent, array, text, -2, None).unwrap();
    assert_eq!(array.indexing_type(&agent), IndexingType::Contiguous);
    assert_eq!(
        elements(&mut agent, array),
        present(&[
            Value::from(3),
            Value::from(4),
            Value::from(3),
            Value::from(4),
            text,
            text
        ])
    );
}

#[test]
fn flat_and_join() {
    let mut agent = agent();
    let inner = Array::from_slice(&mut agent, &ints([3, 4])).unwrap();
    let middle = Array::from_slice(&mut agent, &[Value::from(2), inner.into()]).unwrap();
    let outer = Array::from_slice(&mut agent, &[Value::from(1), middle.into()]).unwrap();

    let one_level = ArrayPrototype::flat(&mut agent, outer, Some(1)).unwrap();
    assert_eq!(
        elements(&mut agent, one_level),
        present(&[Value::from(1), Value::from(2), inner.into()])
    );
    let flat = ArrayPrototype::flat(&mut agent, outer, None).unwrap();
    assert_eq!(elements(&mut agent, flat), present(&ints(1..5)));
    assert_eq!(flat.indexing_type(&agent), IndexingType::Int32);

    let joined = ArrayPrototype::join(&mut agent, outer, None).unwrap();
    assert_eq!(joined, "1,2,3,4");
    let half = Value::from_f64(agent.heap_mut(), 0.5);
    let mixed = Array::from_slice(&mut agent, &[half, Value::Null, Value::Boolean(true)]).unwrap();
    array_set_length(&mut agent, mixed, 4, true).unwrap();
    assert_eq!(
        ArrayPrototype::join(&mut agent, mixed, Some("-")).unwrap(),
        "0.5--true-"
    );
}

#[test]
fn self_containing_arrays() {
    let mut agent = agent();
    let array = Array::from_slice(&mut agent, &ints([1])).unwrap();
    array.push(&mut agent, array.into()).unwrap();
    assert_eq!(ArrayPrototype::join(&mut agent, array, None).unwrap(), "1,");
    let err = ArrayPrototype::flat(&mut agent, array, None).unwrap_err();
    assert_eq!(err.exception_type(), ExceptionType::RangeError);
    let twice = ArrayPrototype::flat(&mut agent, array, Some(2)).unwrap();
    assert_eq!(twice.len(&agent), 4);
}

#[test]
fn copying_an_empty_array() {
    let mut agent = agent();
    let empty = Array::from_slice(&mut agent, &[]).unwrap();
    assert_eq!(empty.indexing_type(&agent), IndexingType::Initial);
    let spliced = ArrayPrototype::to_spliced(&mut agent, empty, 0, Some(0), &ints([1, 2])).unwrap();
    assert_eq!(elements(&mut agent, spliced), present(&ints([1, 2])));
    assert_eq!(spliced.indexing_type(&agent), IndexingType::Int32);
    let spliced = ArrayPrototype::to_spliced(&mut agent, empty, 0, None, &[]).unwrap();
    assert!(spliced.is_empty(&agent));
    let reversed = ArrayPrototype::to_reversed(&mut agent, empty).unwrap();
    assert!(reversed.is_empty(&agent));
    let err = ArrayPrototype::with(&mut agent, empty, 0, Value::Null).unwrap_err();
    assert_eq!(err.exception_type(), ExceptionType::RangeError);
    assert!(empty.is_empty(&agent));
}

#[test]
fn copying_an_array_without_storage() {
    let mut agent = agent();
    let holes = array_create(&mut agent, 3, 0).unwrap();
    assert_eq!(holes.indexing_type(&agent), IndexingType::Initial);
    let spliced = ArrayPrototype::to_spliced(&mut agent, holes, 1, Some(1), &ints([7])).unwrap();
    assert_eq!(
        elements(&mut agent, spliced),
        present(&[Value::Undefined, Value::from(7), Value::Undefined])
    );
    let spliced = ArrayPrototype::to_spliced(&mut agent, holes, 0, Some(1), &[]).unwrap();
    assert_eq!(
        elements(&mut agent, spliced),
        present(&[Value::Undefined, Value::Undefined])
    );
    let reversed = ArrayPrototype::to_reversed(&mut agent, holes).unwrap();
    assert_eq!(elements(&mut agent, reversed), present(&[Value::Undefined; 3]));
    let with = ArrayPrototype::with(&mut agent, holes, 2, Value::from(1)).unwrap();
    assert_eq!(
        elements(&mut agent, with),
        present(&[Value::Undefined, Value::Undefined, Value::from(1)])
    );
    assert_eq!(elements(&mut agent, holes), vec![None, None, None]);
}

#[test]
fn splice_with_long_tail_stays_dense() {
    let mut agent = agent();
    let tail = agent.options().shift_queue_threshold as i32 * 4;
    let array = Array::from_slice(&mut agent, &ints(0..tail)).unwrap();
    let removed = ArrayPrototype::splice(&mut agent, array, 1, Some(1), &[]).unwrap();
    assert_eq!(elements(&mut agent, removed), present(&ints([1])));
    assert_eq!(array.indexing_type(&agent), IndexingType::Int32);
    let expected: Vec<i32> = std::iter::once(0).chain(2..tail).collect();
    assert_eq!(elements(&mut agent, array), present(&ints(expected)));
}

#[test]
fn out_of_range_shift_and_unshift_change_nothing() {
    let mut agent = agent();
    let array = Array::from_slice(&mut agent, &ints(0..4)).unwrap();
    assert!(!shift_count(&mut agent, array, 3, 2, ShiftCountMode::ForSplice));
    assert!(!shift_count(&mut agent, array, 5, 0, ShiftCountMode::ForShift));
    assert!(!unshift_count(&mut agent, array, 5, 1));
    assert!(!unshift_count(&mut agent, array, 0, u32::MAX));
    assert_eq!(array.indexing_type(&agent), IndexingType::Int32);
    assert_eq!(elements(&mut agent, array), present(&ints(0..4)));
}

#[test]
fn queue_shift_moves_far_elements() {
    let mut agent = agent();
    let array = Array::from_slice(&mut agent, &ints(0..4)).unwrap();
    array
        .put_index(&mut agent, 10_000_000, Value::from(42), true)
        .unwrap();
    assert_eq!(array.indexing_type(&agent), IndexingType::ArrayStorage);

    assert_eq!(ArrayPrototype::shift(&mut agent, array).unwrap(), Value::from(0));
    assert_eq!(array.indexing_type(&agent), IndexingType::ArrayStorage);
    assert_eq!(array.len(&agent), 10_000_000);
    assert_eq!(array.get(&mut agent, 9_999_999).unwrap(), Value::from(42));
    assert!(!array.has_own_index(&agent, 10_000_000));
    assert_eq!(array.get(&mut agent, 0).unwrap(), Value::from(1));

    ArrayPrototype::unshift(&mut agent, array, &ints([-1])).unwrap();
    assert_eq!(array.indexing_type(&agent), IndexingType::ArrayStorage);
    assert_eq!(array.len(&agent), 10_000_001);
    assert_eq!(array.get(&mut agent, 10_000_000).unwrap(), Value::from(42));
    assert!(!array.has_own_index(&agent, 9_999_999));
    assert_eq!(array.get(&mut agent, 0).unwrap(), Value::from(-1));
    assert_eq!(array.get(&mut agent, 3).unwrap(), Value::from(3));
}

#[test]
fn shift_over_a_frozen_element_throws() {
    use nova_elements::heap::sparse_map::{ElementAttributes, SparseEntry, SparseValue};

    let mut agent = agent();
    let array = Array::from_slice(&mut agent, &ints(0..4)).unwrap();
    let frozen = SparseEntry {
        value: SparseValue::Data(Value::from(1)),
        attributes: ElementAttributes {
            writable: false,
            enumerable: true,
            configurable: false,
        },
    };
    assert!(array.define_own_index(&mut agent, 1, frozen).unwrap());
    let err = ArrayPrototype::shift(&mut agent, array).unwrap_err();
    assert_eq!(err.exception_type(), ExceptionType::TypeError);
    assert_eq!(array.get(&mut agent, 1).unwrap(), Value::from(1));
    assert_eq!(array.len(&agent), 4);
}

#[test]
fn last_index_of_searches_backwards() {
    let mut agent = agent();
    let array = Array::from_slice(&mut agent, &ints([5, 6, 7, 6])).unwrap();
    let six = Value::from_f64(agent.heap_mut(), 6.0);
    assert_eq!(
        ArrayPrototype::last_index_of(&mut agent, array, six, None).unwrap(),
        Some(3)
    );
    assert_eq!(
        ArrayPrototype::last_index_of(&mut agent, array, six, Some(2)).unwrap(),
        Some(1)
    );
    assert_eq!(
        ArrayPrototype::last_index_of(&mut agent, array, six, Some(-2)).unwrap(),
        Some(1)
    );
    assert_eq!(
        ArrayPrototype::last_index_of(&mut agent, array, six, Some(-5)).unwrap(),
        None
    );
    assert_eq!(
        ArrayPrototype::last_index_of(&mut agent, array, Value::from(5), Some(100)).unwrap(),
        Some(0)
    );
    array_set_length(&mut agent, array, 6, true).unwrap();
    assert_eq!(
        ArrayPrototype::last_index_of(&mut agent, array, Value::Undefined, None).unwrap(),
        None
    );

    array
        .put_index(&mut agent, 500_000, Value::from(6), true)
        .unwrap();
    assert_eq!(
        ArrayPrototype::last_index_of(&mut agent, array, six, None).unwrap(),
        Some(500_000)
    );
    assert_eq!(
        ArrayPrototype::last_index_of(&mut agent, array, six, Some(499_999)).unwrap(),
        Some(3)
    );
}

#[test]
fn sort_orders_by_string_value() {
    let mut agent = agent();
    let array = Array::from_slice(&mut agent, &ints([10, 9, 1, 2, -1])).unwrap();
    let sorted = ArrayPrototype::sort(&mut agent, array, None).unwrap();
    assert_eq!(sorted, array);
    assert_eq!(elements(&mut agent, array), present(&ints([-1, 1, 10, 2, 9])));
    assert_eq!(array.indexing_type(&agent), IndexingType::Int32);

    let b = Value::String(agent.create_string("b"));
    let a = Value::String(agent.create_string("a"));
    let half = Value::from_f64(agent.heap_mut(), 0.5);
    let mixed = Array::from_slice(&mut agent, &[b, Value::Null, a, half]).unwrap();
    ArrayPrototype::sort(&mut agent, mixed, None).unwrap();
    assert_eq!(elements(&mut agent, mixed), present(&[half, a, b, Value::Null]));
}

#[test]
fn sort_compacts_holes_and_undefined() {
    let mut agent = agent();
    for array in arrays_in_every_encoding(&mut agent, &ints([3, 1, 2])) {
        assert!(array.delete_index(&mut agent, 1));
        array.push(&mut agent, Value::from(0)).unwrap();
        ArrayPrototype::sort(&mut agent, array, None).unwrap();
        assert_eq!(
            elements(&mut agent, array),
            vec![Some(Value::from(0)), Some(Value::from(2)), Some(Value::from(3)), None]
        );
    }

    let array = Array::from_slice(&mut agent, &[Value::Undefined, Value::from(2)]).unwrap();
    array_set_length(&mut agent, array, 4, true).unwrap();
    array.put_index(&mut agent, 3, Value::from(1), true).unwrap();
    ArrayPrototype::sort(&mut agent, array, None).unwrap();
    assert_eq!(
        elements(&mut agent, array),
        vec![
            Some(Value::from(1)),
            Some(Value::from(2)),
            Some(Value::Undefined),
            None
        ]
    );

    let far = Array::from_slice(&mut agent, &ints([3, 1])).unwrap();
    far.put_index(&mut agent, 500_000, Value::from(2), true)
        .unwrap();
    ArrayPrototype::sort(&mut agent, far, None).unwrap();
    assert_eq!(far.len(&agent), 500_001);
    assert!(!far.has_own_index(&agent, 500_000));
    assert_eq!(far.get(&mut agent, 0).unwrap(), Value::from(1));
    assert_eq!(far.get(&mut agent, 2).unwrap(), Value::from(3));
}

#[test]
fn to_sorted_reads_holes_as_undefined() {
    let mut agent = agent();
    let array = Array::from_slice(&mut agent, &ints([3, 1, 2])).unwrap();
    array_set_length(&mut agent, array, 4, true).unwrap();
    let sorted = ArrayPrototype::to_sorted(&mut agent, array, None).unwrap();
    assert_eq!(
        elements(&mut agent, sorted),
        present(&[Value::from(1), Value::from(2), Value::from(3), Value::Undefined])
    );
    assert_eq!(
        elements(&mut agent, array),
        vec![Some(Value::from(3)), Some(Value::from(1)), Some(Value::from(2)), None]
    );
    let empty = Array::from_slice(&mut agent, &[]).unwrap();
    let sorted = ArrayPrototype::to_sorted(&mut agent, empty, None).unwrap();
    assert!(sorted.is_empty(&agent));
}

#[test]
fn equal_string_values_keep_their_order() {
    let mut agent = agent();
    let numbers: Vec<Value> = [2.5, 1.0, 0.5]
        .into_iter()
        .map(|number| Value::from_f64(agent.heap_mut(), number))
        .collect();
    let one = Value::String(agent.create_string("1"));
    let array = Array::from_slice(&mut agent, &numbers).unwrap();
    ArrayPrototype::unshift(&mut agent, array, &[one]).unwrap();
    array.push(&mut agent, numbers[1]).unwrap();
    let sorted = ArrayPrototype::to_sorted(&mut agent, array, None).unwrap();
    assert_eq!(
        elements(&mut agent, sorted),
        present(&[numbers[2], one, numbers[1], numbers[1], numbers[0]])
    );
}
