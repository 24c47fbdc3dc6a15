use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use dsio::{new_reader, new_writer, read_all, value, DataFormat, Entry, Structure, Value};

fn tabular_structure() -> Structure {
    Structure::new(DataFormat::Csv).with_schema(value!({
        "type": "array",
        "items": {
            "type": "array",
            "items": [
                { "title": "id", "type": "integer" },
                { "title": "name", "type": "string" },
                { "title": "price", "type": "number" },
                { "title": "active", "type": "boolean" }
            ]
        }
    }))
}

fn json_structure() -> Structure {
    Structure::new(DataFormat::Json).with_schema(value!({ "type": "array" }))
}

fn rows(size: usize) -> Vec<Entry> {
    (0..size)
        .map(|i| {
            Entry::indexed(
                i,
                value!([(i), (format!("Product {}", i)), (9.99 + i as f64), (i % 2 == 0)]),
            )
        })
        .collect()
}

fn encode(st: &Structure, items: &[Entry]) -> Vec<u8> {
    let mut out = Vec::new();
    {
        let mut w = new_writer(st, &mut out).unwrap();
        for e in items {
            w.write_entry(e).unwrap();
        }
        w.close().unwrap();
    }
    out
}

fn benchmark_write(c: &mut Criterion) {
    let mut group = c.benchmark_group("write");

    for size in [10, 100, 1000].iter() {
        let items = rows(*size);
        for (name, st) in [("csv", tabular_structure()), ("json", json_structure())] {
            group.bench_with_input(BenchmarkId::new(name, size), size, |b, _| {
                b.iter(|| encode(black_box(&st), black_box(&items)))
            });
        }
    }
    group.finish();
}

fn benchmark_read(c: &mut Criterion) {
    let mut group = c.benchmark_group("read");

    for size in [10, 100, 1000].iter() {
        let items = rows(*size);
        for (name, st) in [("csv", tabular_structure()), ("json", json_structure())] {
            let bytes = encode(&st, &items);
            group.bench_with_input(BenchmarkId::new(name, size), size, |b, _| {
                b.iter(|| {
                    let mut r = new_reader(&st, black_box(&bytes[..])).unwrap();
                    read_all(&mut r).unwrap()
                })
            });
        }
    }
    group.finish();
}

fn benchmark_nested_document(c: &mut Criterion) {
    let nested: Vec<Entry> = (0..200)
        .map(|i| {
            let mut v = Value::from(i);
            for _ in 0..8 {
                v = value!({ "child": v, "tags": ["a", "b"] });
            }
            Entry::indexed(i as usize, v)
        })
        .collect();
    let st = json_structure();
    let bytes = encode(&st, &nested);

    c.bench_function("read_nested_document", |b| {
        b.iter(|| {
            let mut r = new_reader(&st, black_box(&bytes[..])).unwrap();
            read_all(&mut r).unwrap()
        })
    });
}

criterion_group!(
    benches,
    benchmark_write,
    benchmark_read,
    benchmark_nested_document
);
criterion_main!(benches);
