//! Property-based tests for the codecs.
//!
//! Generated values are written and read back through each format, and the
//! JSON reader is checked to give the same result whatever block size it
//! refills with.

use dsio::{
    new_reader, new_writer, read_all, value, DataFormat, DocumentReader, Entry, EntryReader,
    Map, Structure, Value,
};
use proptest::prelude::*;

fn json(kind: &str) -> Structure {
    Structure::new(DataFormat::Json).with_schema(value!({ "type": kind }))
}

fn arb_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        (-1.0e12..1.0e12f64).prop_map(Value::from),
        any::<f64>()
            .prop_filter("finite", |f| f.is_finite())
            .prop_map(Value::from),
        ".*".prop_map(Value::from),
    ];
    leaf.prop_recursive(4, 32, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::vec((".{0,8}", inner), 0..6).prop_map(|pairs| {
                let mut map = Map::new();
                for (k, v) in pairs {
                    map.insert(k, v);
                }
                Value::Object(map)
            }),
        ]
    })
}

fn write(st: &Structure, items: &[Entry]) -> Vec<u8> {
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

proptest! {
    #[test]
    fn prop_ordered_round_trip(values in prop::collection::vec(arb_value(), 0..8)) {
        let items: Vec<Entry> = values
            .into_iter()
            .enumerate()
            .map(|(i, v)| Entry::indexed(i, v))
            .collect();
        let st = json("array");
        let bytes = write(&st, &items);
        let back = read_all(&mut new_reader(&st, &bytes[..]).unwrap()).unwrap();
        prop_assert_eq!(back, items);
    }

    #[test]
    fn prop_keyed_round_trip(members in prop::collection::btree_map("[a-z]{1,6}", arb_value(), 0..8)) {
        let items: Vec<Entry> = members
            .into_iter()
            .map(|(k, v)| Entry::keyed(k, v))
            .collect();
        let st = json("object");
        let bytes = write(&st, &items);
        let back = read_all(&mut new_reader(&st, &bytes[..]).unwrap()).unwrap();
        prop_assert_eq!(back, items);
    }

    #[test]
    fn prop_block_size_does_not_change_result(
        values in prop::collection::vec(arb_value(), 0..6),
        block in 1usize..64,
    ) {
        let items: Vec<Entry> = values
            .into_iter()
            .enumerate()
            .map(|(i, v)| Entry::indexed(i, v))
            .collect();
        let st = json("array");
        let bytes = write(&st, &items);

        let mut r = DocumentReader::with_block_size(&st, &bytes[..], block).unwrap();
        let mut back = Vec::new();
        while let Some(e) = r.read_entry().unwrap() {
            back.push(e);
        }
        prop_assert_eq!(r.offset(), bytes.len() as u64);
        prop_assert_eq!(back, items);
    }

    #[test]
    fn prop_csv_text_round_trip(rows in prop::collection::vec(prop::collection::vec("[^\r]{0,12}", 3), 1..8)) {
        let st = Structure::new(DataFormat::Csv);
        let items: Vec<Entry> = rows
            .iter()
            .enumerate()
            .map(|(i, row)| Entry::indexed(i, Value::Array(row.iter().map(|s| Value::from(s.as_str())).collect())))
            .collect();
        let bytes = write(&st, &items);
        let back = read_all(&mut new_reader(&st, &bytes[..]).unwrap()).unwrap();
        prop_assert_eq!(back, items);
    }

    #[test]
    fn prop_csv_integers_coerce(rows in prop::collection::vec((any::<i64>(), any::<bool>()), 1..8)) {
        let st = Structure::new(DataFormat::Csv).with_schema(value!({
            "type": "array",
            "items": { "type": "array", "items": [
                { "title": "n", "type": "integer" },
                { "title": "b", "type": "boolean" }
            ]}
        }));
        let items: Vec<Entry> = rows
            .iter()
            .enumerate()
            .map(|(i, (n, b))| Entry::indexed(i, value!([(*n), (*b)])))
            .collect();
        let bytes = write(&st, &items);
        let back = read_all(&mut new_reader(&st, &bytes[..]).unwrap()).unwrap();
        prop_assert_eq!(back, items);
    }
}
