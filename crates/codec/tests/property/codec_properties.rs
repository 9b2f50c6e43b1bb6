use proptest::prelude::*;
use serde_json::{Map, Value};
use toonctx_codec::{EncodeOptions, decode, encode, encode_or_fallback, is_tabular};

fn leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        any::<f64>()
            .prop_filter("finite", |x| x.is_finite())
            .prop_map(Value::from),
        ".{0,12}".prop_map(Value::String),
        "[a-z]{1,8}".prop_map(Value::String),
    ]
}

fn value() -> impl Strategy<Value = Value> {
    leaf().prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::vec((".{0,6}", inner), 0..6)
                .prop_map(|entries| Value::Object(entries.into_iter().collect())),
        ]
    })
}

/// Arrays of flat records sharing one key set.
fn table() -> impl Strategy<Value = Value> {
    prop::collection::vec("[a-z_]{1,6}", 1..5).prop_flat_map(|keys| {
        let width = keys.len();
        prop::collection::vec(prop::collection::vec(leaf(), width), 1..8).prop_map(move |rows| {
            Value::Array(
                rows.into_iter()
                    .map(|cells| {
                        let record: Map<String, Value> =
                            keys.iter().cloned().zip(cells).collect();
                        Value::Object(record)
                    })
                    .collect(),
            )
        })
    })
}

proptest! {
    #[test]
    fn comma_round_trip(v in value()) {
        let text = encode(&v, &EncodeOptions::default()).unwrap();
        prop_assert_eq!(decode(&text).unwrap(), v);
    }

    #[test]
    fn tab_round_trip(v in value()) {
        let text = encode(&v, &EncodeOptions::tab()).unwrap();
        prop_assert_eq!(decode(&text).unwrap(), v);
    }

    #[test]
    fn tables_are_tabular_and_round_trip(t in table(), tab in any::<bool>()) {
        prop_assert!(is_tabular(&t));
        let options = if tab { EncodeOptions::tab() } else { EncodeOptions::default() };
        let text = encode(&t, &options).unwrap();
        prop_assert!(text.lines().next().unwrap_or("").ends_with("}:"), "header line should end with `}}:`");
        prop_assert_eq!(decode(&text).unwrap(), t);
    }

    #[test]
    fn encoding_is_deterministic(v in value()) {
        let options = EncodeOptions::default();
        prop_assert_eq!(encode(&v, &options).unwrap(), encode(&v, &options).unwrap());
    }

    #[test]
    fn fallback_output_is_always_valid_json(v in value(), depth in 0usize..4) {
        let out = encode_or_fallback(&v, &EncodeOptions::default().with_max_depth(depth));
        if out.fallback {
            let parsed: Value = serde_json::from_str(&out.text).unwrap();
            prop_assert_eq!(parsed, v);
        } else {
            prop_assert_eq!(decode(&out.text).unwrap(), v);
        }
    }
}
