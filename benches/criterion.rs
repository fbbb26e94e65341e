use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use nova_elements::ecmascript::{
    builtins::{Array, ArrayPrototype},
    execution::{Agent, DefaultHostHooks, Options},
    types::Value,
};

fn agent() -> Agent {
    Agent::new(Options::default(), &DefaultHostHooks)
}

fn filled(agent: &mut Agent, len: i32) -> Array {
    let values: Vec<Value> = (0..len).map(Value::from).collect();
    Array::from_slice(agent, &values).unwrap()
}

fn bench_elements(c: &mut Criterion) {
    c.bench_function("push 10k integers", |b| {
        b.iter_batched(
            || (agent(), 0..10_000),
            |(mut agent, values)| {
                let array = Array::from_slice(&mut agent, &[]).unwrap();
                for value in values {
                    array.push(&mut agent, Value::from(value)).unwrap();
                }
                agent
            },
            BatchSize::SmallInput,
        )
    });

    c.bench_function("drain 10k as a queue", |b| {
        b.iter_batched(
            || {
                let mut agent = agent();
                let array = filled(&mut agent, 10_000);
                (agent, array)
            },
            |(mut agent, array)| {
                while !array.is_empty(&agent) {
                    ArrayPrototype::shift(&mut agent, array).unwrap();
                }
                agent
            },
            BatchSize::SmallInput,
        )
    });

    c.bench_function("unshift 1k onto 10k", |b| {
        b.iter_batched(
            || {
                let mut agent = agent();
                let array = filled(&mut agent, 10_000);
                (agent, array)
            },
            |(mut agent, array)| {
                for value in 0..1_000 {
                    ArrayPrototype::unshift(&mut agent, array, &[Value::from(value)]).unwrap();
                }
                agent
            },
            BatchSize::SmallInput,
        )
    });

    c.bench_function("sparse writes", |b| {
        b.iter_batched(
            agent,
            |mut agent| {
                let array = Array::from_slice(&mut agent, &[]).unwrap();
                for index in (0..1_000u32).map(|i| i * 1_000_003) {
                    array.put_index(&mut agent, index, Value::Null, true).unwrap();
                }
                agent
            },
            BatchSize::SmallInput,
        )
    });

    c.bench_function("concat 4 x 10k", |b| {
        b.iter_batched(
            || {
                let mut agent = agent();
                let parts: Vec<Value> = (0..3).map(|_| filled(&mut agent, 10_000).into()).collect();
                let first = filled(&mut agent, 10_000);
                (agent, first, parts)
            },
            |(mut agent, first, parts)| {
                ArrayPrototype::concat(&mut agent, first, &parts).unwrap();
                agent
            },
            BatchSize::SmallInput,
        )
    });

    c.bench_function("splice middle of 10k", |b| {
        b.iter_batched(
            || {
                let mut agent = agent();
                let array = filled(&mut agent, 10_000);
                (agent, array)
            },
            |(mut agent, array)| {
                for _ in 0..100 {
                    ArrayPrototype::splice(&mut agent, array, 5_000, Some(1), &[]).unwrap();
                    ArrayPrototype::splice(&mut agent, array, 5_000, Some(0), &[Value::Null])
                        .unwrap();
                }
                agent
            },
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, bench_elements);
criterion_main!(benches);
