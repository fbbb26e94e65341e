use nova_elements::{
    ecmascript::{
        builtins::{Array, ArrayPrototype},
        execution::{Agent, DefaultHostHooks, Options},
        types::Value,
    },
    heap::{MarkProgress, indexing_type::IndexingType},
};

fn agent() -> Agent {
    Agent::new(Options::default(), &DefaultHostHooks)
}

fn ints(values: impl IntoIterator<Item = i32>) -> Vec<Value> {
    values.into_iter().map(Value::from).collect()
}

#[test]
fn rooted_array_survives_mutation_during_marking() {
    let mut agent = agent();
    let text = agent.create_string("kept");
    let array = Array::from_slice(&mut agent, &[Value::from(1), Value::String(text)]).unwrap();
    agent.add_root(array);

    agent.start_marking();
    assert!(agent.heap().is_marking());
    assert_eq!(agent.mark_step(1), MarkProgress::InProgress);

    let tenth = Value::from_f64(agent.heap_mut(), 0.1);
    for _ in 0..200 {
        array.push(&mut agent, tenth).unwrap();
    }
    for _ in 0..150 {
        ArrayPrototype::shift(&mut agent, array).unwrap();
    }
    assert_eq!(array.indexing_type(&agent), IndexingType::ArrayStorage);
    let name = Value::String(agent.create_string("front"));
    ArrayPrototype::unshift(&mut agent, array, &[name]).unwrap();

    assert_eq!(agent.finish_collection(), MarkProgress::Done);
    assert!(!agent.heap().is_marking());
    assert_eq!(&agent[text], "kept");
    assert_eq!(array.len(&agent), 53);
    assert_eq!(array.get(&mut agent, 0).unwrap(), name);
    let last = array.get(&mut agent, 52).unwrap();
    assert_eq!(last.as_f64(agent.heap()), Some(0.1));
}

#[test]
fn overwritten_value_is_kept_by_the_barrier() {
    let mut agent = agent();
    let text = agent.create_string("moved");
    let a = Array::from_slice(&mut agent, &[Value::String(text)]).unwrap();
    agent.add_root(a);

    agent.start_marking();
    // Created during marking, so already marked and never traced.
    let b = Array::from_slice(&mut agent, &[Value::Null]).unwrap();
    agent.add_root(b);
    b.put_index(&mut agent, 0, Value::String(text), true).unwrap();
    a.put_index(&mut agent, 0, Value::Null, true).unwrap();

    assert_eq!(agent.finish_collection(), MarkProgress::Done);
    assert_eq!(b.get(&mut agent, 0).unwrap(), Value::String(text));
    assert_eq!(&agent[text], "moved");
}

#[test]
fn unrooted_storage_is_released() {
    let mut agent = agent();
    let kept = Array::from_slice(&mut agent, &ints(0..8)).unwrap();
    agent.add_root(kept);
    let kept_bytes = agent.heap().allocated_bytes();
    let garbage = Array::from_slice(&mut agent, &ints(0..64)).unwrap();
    garbage.put_index(&mut agent, 1_000_000, Value::Null, true).unwrap();
    assert!(agent.heap().allocated_bytes() > kept_bytes);

    assert_eq!(agent.gc(), MarkProgress::Done);
    assert_eq!(agent.heap().allocated_bytes(), kept_bytes);
    assert_eq!(kept.get(&mut agent, 7).unwrap(), Value::from(7));
}

#[test]
fn removed_root_is_collected() {
    let mut agent = agent();
    let array = Array::from_slice(&mut agent, &ints(0..8)).unwrap();
    let root = agent.add_root(array);
    agent.gc();
    assert!(agent.heap().allocated_bytes() > 0);
    agent.remove_root(root);
    agent.gc();
    assert_eq!(agent.heap().allocated_bytes(), 0);
}

#[test]
fn deferral_blocks_tracing() {
    let mut agent = agent();
    let array = Array::from_slice(&mut agent, &ints(0..4)).unwrap();
    agent.add_root(array);
    agent.start_marking();

    let defer = agent.heap().defer_gc();
    assert!(agent.heap().is_gc_deferred());
    assert_eq!(agent.mark_step(usize::MAX), MarkProgress::Deferred);
    assert_eq!(agent.finish_collection(), MarkProgress::Deferred);
    assert!(agent.heap().is_marking());
    assert_eq!(agent.heap().deferred_gc_steps(), 2);
    drop(defer);

    assert!(!agent.heap().is_gc_deferred());
    assert_eq!(agent.mark_step(usize::MAX), MarkProgress::Done);
    assert_eq!(agent.finish_collection(), MarkProgress::Done);
    assert_eq!(agent.heap().deferred_gc_steps(), 0);
    assert_eq!(array.get(&mut agent, 3).unwrap(), Value::from(3));
}

#[test]
fn heap_numbers_and_sparse_entries_are_traced() {
    let mut agent = agent();
    let tenth = Value::from_f64(agent.heap_mut(), 0.1);
    assert!(matches!(tenth, Value::Number(_)));
    let array = Array::from_slice(&mut agent, &[tenth, Value::Null]).unwrap();
    let text = agent.create_string("far");
    array
        .put_index(&mut agent, 5_000_000, Value::String(text), true)
        .unwrap();
    agent.add_root(array);

    assert_eq!(agent.gc(), MarkProgress::Done);
    let first = array.get(&mut agent, 0).unwrap();
    assert_eq!(first.as_f64(agent.heap()), Some(0.1));
    assert_eq!(&agent[text], "far");
}

#[test]
fn disabled_collector_frees_nothing() {
    let mut agent = Agent::new(
        Options {
            disable_gc: true,
            ..Default::default()
        },
        &DefaultHostHooks,
    );
    Array::from_slice(&mut agent, &ints(0..8)).unwrap();
    let bytes = agent.heap().allocated_bytes();
    assert_eq!(agent.gc(), MarkProgress::Done);
    assert_eq!(agent.heap().allocated_bytes(), bytes);
}
