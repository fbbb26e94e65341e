use std::sync::atomic::{AtomicU32, Ordering};

use nova_elements::{
    ecmascript::{
        builtins::{Array, ArrayPrototype},
        execution::{Agent, DefaultHostHooks, ExceptionType, HostHooks, JsResult, Options},
        types::{Function, Value},
    },
    heap::{
        indexing_type::IndexingType,
        sparse_map::{ElementAttributes, SparseEntry, SparseValue},
    },
};

/// A realm whose array prototype defines index 1 as 42.
#[derive(Debug)]
struct PrototypeWithIndexOne;

impl HostHooks for PrototypeWithIndexOne {
    fn holes_must_forward_to_prototype(&self, _: Array) -> bool {
        true
    }

    fn get_from_prototype(&self, _: &mut Agent, index: u32) -> JsResult<Option<Value>> {
        Ok((index == 1).then_some(Value::from(42)))
    }

    fn call_getter(&self, _: &mut Agent, _: Function, _: Array) -> JsResult<Value> {
        Ok(Value::Undefined)
    }

    fn call_setter(&self, _: &mut Agent, _: Function, _: Array, _: Value) -> JsResult<()> {
        Ok(())
    }
}

static SETTER_CALLS: AtomicU32 = AtomicU32::new(0);

/// Getters return their host id; getter 0 throws. Setters are counted.
#[derive(Debug)]
struct RecordingHooks;

impl HostHooks for RecordingHooks {
    fn call_getter(&self, agent: &mut Agent, getter: Function, _: Array) -> JsResult<Value> {
        if getter.host_id() == 0 {
            return Err(agent.throw_exception(ExceptionType::Error, "getter threw"));
        }
        Ok(Value::from(getter.host_id()))
    }

    fn call_setter(&self, _: &mut Agent, _: Function, _: Array, _: Value) -> JsResult<()> {
        SETTER_CALLS.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Comparator 1 orders numbers descending, comparator 2 answers with a
/// boolean and comparator 0 throws.
#[derive(Debug)]
struct ComparatorHooks;

impl HostHooks for ComparatorHooks {
    fn call_comparator(
        &self,
        agent: &mut Agent,
        comparator: Function,
        x: Value,
        y: Value,
    ) -> JsResult<Value> {
        let (x, y) = (
            x.as_f64(agent.heap()).unwrap(),
            y.as_f64(agent.heap()).unwrap(),
        );
        match comparator.host_id() {
            0 => Err(agent.throw_exception(ExceptionType::Error, "comparator threw")),
            1 => Ok(Value::from_f64(agent.heap_mut(), y - x)),
            _ => Ok(Value::Boolean(x > y)),
        }
    }

    fn call_getter(&self, _: &mut Agent, _: Function, _: Array) -> JsResult<Value> {
        Ok(Value::Undefined)
    }

    fn call_setter(&self, _: &mut Agent, _: Function, _: Array, _: Value) -> JsResult<()> {
        Ok(())
    }
}

fn ints(values: impl IntoIterator<Item = i32>) -> Vec<Value> {
    values.into_iter().map(Value::from).collect()
}

fn present(values: &[Value]) -> Vec<Option<Value>> {
    values.iter().copied().map(Some).collect()
}

fn accessor(get: Option<u32>, set: Option<u32>) -> SparseEntry {
    SparseEntry {
        value: SparseValue::Accessor {
            get: get.map(Function::from_host_id),
            set: set.map(Function::from_host_id),
        },
        attributes: ElementAttributes::default(),
    }
}

#[test]
fn holes_read_through_to_the_prototype() {
    let mut agent = Agent::new(Options::default(), &PrototypeWithIndexOne);
    let array = Array::from_slice(&mut agent, &ints([1, 2, 3])).unwrap();
    assert!(array.delete_index(&mut agent, 1));
    assert!(!array.has_own_index(&agent, 1));
    assert!(array.has_property(&mut agent, 1).unwrap());
    assert_eq!(array.get(&mut agent, 1).unwrap(), Value::from(42));
    assert_eq!(array.get_own(&mut agent, 1).unwrap(), None);
    assert!(ArrayPrototype::includes(&mut agent, array, Value::from(42), 0).unwrap());
    assert_eq!(
        ArrayPrototype::index_of(&mut agent, array, Value::from(42), 0).unwrap(),
        Some(1)
    );
}

#[test]
fn shift_over_a_forwarding_hole() {
    let mut agent = Agent::new(Options::default(), &PrototypeWithIndexOne);
    let array = Array::from_slice(&mut agent, &ints([1, 2, 3])).unwrap();
    array.delete_index(&mut agent, 1);
    assert_eq!(
        ArrayPrototype::shift(&mut agent, array).unwrap(),
        Value::from(1)
    );
    assert_eq!(array.indexing_type(&agent), IndexingType::ArrayStorage);
    assert_eq!(
        array.to_vec(&mut agent).unwrap(),
        [Some(Value::from(42)), Some(Value::from(3))]
    );
}

#[test]
fn hole_free_arrays_keep_their_fast_paths() {
    let mut agent = Agent::new(Options::default(), &PrototypeWithIndexOne);
    let array = Array::from_slice(&mut agent, &ints([1, 2, 3])).unwrap();
    assert_eq!(
        ArrayPrototype::shift(&mut agent, array).unwrap(),
        Value::from(1)
    );
    assert_eq!(array.indexing_type(&agent), IndexingType::Int32);
    assert_eq!(
        array.to_vec(&mut agent).unwrap(),
        [Some(Value::from(2)), Some(Value::from(3))]
    );
}

#[test]
fn reverse_moves_inherited_values_in() {
    let mut agent = Agent::new(Options::default(), &PrototypeWithIndexOne);
    let array = Array::from_slice(&mut agent, &ints([1, 2, 3, 4])).unwrap();
    array.delete_index(&mut agent, 1);
    ArrayPrototype::reverse(&mut agent, array).unwrap();
    let expected: Vec<Option<Value>> = ints([4, 3, 42, 1]).into_iter().map(Some).collect();
    assert_eq!(array.to_vec(&mut agent).unwrap(), expected);
}

#[test]
fn accessors_call_into_the_host() {
    let mut agent = Agent::new(Options::default(), &RecordingHooks);
    let array = Array::from_slice(&mut agent, &ints([0, 1, 2])).unwrap();
    assert!(array.define_own_index(&mut agent, 1, accessor(Some(7), Some(9))).unwrap());
    assert_eq!(array.indexing_type(&agent), IndexingType::ArrayStorage);
    assert_eq!(array.get(&mut agent, 1).unwrap(), Value::from(7));

    let before = SETTER_CALLS.load(Ordering::SeqCst);
    assert!(array.put_index(&mut agent, 1, Value::from(5), true).unwrap());
    assert_eq!(SETTER_CALLS.load(Ordering::SeqCst), before + 1);
    assert_eq!(array.get(&mut agent, 1).unwrap(), Value::from(7));

    assert!(array.define_own_index(&mut agent, 2, accessor(Some(8), None)).unwrap());
    assert!(!array.put_index(&mut agent, 2, Value::from(1), false).unwrap());
    let error = array
        .put_index(&mut agent, 2, Value::from(1), true)
        .unwrap_err();
    assert_eq!(error.exception_type(), ExceptionType::TypeError);

    assert!(array.define_own_index(&mut agent, 0, accessor(Some(0), None)).unwrap());
    let error = array.get(&mut agent, 0).unwrap_err();
    assert_eq!(error.exception_type(), ExceptionType::Error);
    assert_eq!(error.message(), "getter threw");
}

#[test]
fn frozen_elements_reject_writes_and_deletes() {
    let mut agent = Agent::new(Options::default(), &RecordingHooks);
    let array = Array::from_slice(&mut agent, &ints([0, 1, 2])).unwrap();
    let frozen = SparseEntry {
        value: SparseValue::Data(Value::from(10)),
        attributes: ElementAttributes {
            writable: false,
            enumerable: true,
            configurable: false,
        },
    };
    assert!(array.define_own_index(&mut agent, 0, frozen).unwrap());
    assert!(!array.put_index(&mut agent, 0, Value::from(1), false).unwrap());
    assert!(array.put_index(&mut agent, 0, Value::from(1), true).is_err());
    assert!(!array.delete_index(&mut agent, 0));
    assert_eq!(array.get(&mut agent, 0).unwrap(), Value::from(10));
    // The remaining elements are still plain writable slots.
    assert!(array.put_index(&mut agent, 2, Value::from(20), true).unwrap());
    assert_eq!(array.get(&mut agent, 2).unwrap(), Value::from(20));
}

#[test]
fn sort_calls_the_host_comparator() {
    let mut agent = Agent::new(Options::default(), &ComparatorHooks);
    let array = Array::from_slice(&mut agent, &ints([3, 10, 1, 2])).unwrap();
    let descending = Function::from_host_id(1);
    ArrayPrototype::sort(&mut agent, array, Some(descending)).unwrap();
    assert_eq!(array.to_vec(&mut agent).unwrap(), present(&ints([10, 3, 2, 1])));

    let sorted = ArrayPrototype::to_sorted(&mut agent, array, Some(Function::from_host_id(2)))
        .unwrap();
    assert_eq!(sorted.to_vec(&mut agent).unwrap(), present(&ints([1, 2, 3, 10])));

    let error = ArrayPrototype::sort(&mut agent, array, Some(Function::from_host_id(0)))
        .unwrap_err();
    assert_eq!(error.exception_type(), ExceptionType::Error);
    assert_eq!(array.to_vec(&mut agent).unwrap(), present(&ints([10, 3, 2, 1])));
}

#[test]
fn default_host_cannot_call_comparators() {
    let mut agent = Agent::new(Options::default(), &DefaultHostHooks);
    let array = Array::from_slice(&mut agent, &ints([2, 1])).unwrap();
    let error = ArrayPrototype::sort(&mut agent, array, Some(Function::from_host_id(1)))
        .unwrap_err();
    assert_eq!(error.exception_type(), ExceptionType::TypeError);
    assert_eq!(array.to_vec(&mut agent).unwrap(), present(&ints([2, 1])));
}
