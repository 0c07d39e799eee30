use ucl_core::{decode, decode_into, decode_prefix, Decoder, Object, UclError, Value, ValueKind};

/// Helper: decode `[0x91, ...scalar]` and return the single element.
fn decode_element(scalar: &[u8]) -> Value {
    let mut bytes = vec![0x91];
    bytes.extend_from_slice(scalar);
    let mut value = decode(&bytes).unwrap_or_else(|e| panic!("decode {bytes:02x?} failed: {e}"));
    assert_eq!(value.len(), 1, "expected single-element array, got {value:?}");
    value.as_array_mut().unwrap().remove(0)
}

fn assert_truncated(bytes: &[u8], offset: usize, remain: usize, needed: usize) {
    match decode(bytes) {
        Err(UclError::Truncated {
            offset: o,
            remain: r,
            needed: n,
        }) => assert_eq!(
            (o, r, n),
            (offset, remain, needed),
            "wrong truncation details for {bytes:02x?}"
        ),
        other => panic!("expected truncation for {bytes:02x?}, got {other:?}"),
    }
}

// ============================================================================
// Top-level documents
// ============================================================================

#[test]
fn decode_empty_fixarray() {
    assert_eq!(decode(&[0x90]).unwrap(), Value::Array(vec![]));
}

#[test]
fn decode_empty_fixmap() {
    assert_eq!(decode(&[0x80]).unwrap(), Value::object());
}

#[test]
fn decode_rejects_top_level_fixint() {
    assert!(matches!(
        decode(&[0x05]),
        Err(UclError::Structure { offset: 0, .. })
    ));
}

#[test]
fn decode_rejects_top_level_string() {
    assert!(matches!(
        decode(&[0xa1, b'x']),
        Err(UclError::Structure { .. })
    ));
}

#[test]
fn decode_accepts_array16_and_map16_top_level() {
    assert_eq!(decode(&[0xdc, 0x00, 0x00]).unwrap(), Value::array());
    assert_eq!(decode(&[0xde, 0x00, 0x00]).unwrap(), Value::object());
    assert_eq!(
        decode(&[0xdd, 0x00, 0x00, 0x00, 0x01, 0x07]).unwrap(),
        Value::Array(vec![Value::Integer(7)])
    );
}

#[test]
fn decode_empty_input() {
    assert!(matches!(decode(&[]), Err(UclError::EmptyInput)));
}

#[test]
fn decode_unknown_lead_byte() {
    assert!(matches!(
        decode(&[0xc1]),
        Err(UclError::Format {
            byte: 0xc1,
            offset: 0
        })
    ));
}

#[test]
fn decode_unknown_lead_byte_nested_reports_offset() {
    let err = decode(&[0x92, 0x01, 0xc1]).unwrap_err();
    assert!(matches!(
        err,
        UclError::Format {
            byte: 0xc1,
            offset: 2
        }
    ));
    assert!(err.to_string().contains("0xc1"));
}

#[test]
fn decode_ignores_trailing_bytes() {
    let (value, used) = decode_prefix(&[0x91, 0x01, 0xff, 0xff]).unwrap();
    assert_eq!(value, Value::Array(vec![Value::Integer(1)]));
    assert_eq!(used, 2);
}

#[test]
fn decoder_reads_consecutive_documents() {
    let bytes = [0x91, 0x01, 0x81, 0xa1, b'k', 0xc0];
    let mut decoder = Decoder::new(&bytes);
    assert_eq!(
        decoder.decode_document().unwrap(),
        Value::Array(vec![Value::Integer(1)])
    );
    assert_eq!(decoder.position(), 2);
    let second = decoder.decode_document().unwrap();
    assert_eq!(second.get("k"), Some(&Value::Null));
    assert!(decoder.is_finished());
    assert!(matches!(
        decoder.decode_document(),
        Err(UclError::EmptyInput)
    ));
}

// ============================================================================
// Scalars
// ============================================================================

#[test]
fn decode_fixints() {
    assert_eq!(decode_element(&[0x00]), Value::Integer(0));
    assert_eq!(decode_element(&[0x7f]), Value::Integer(127));
    assert_eq!(decode_element(&[0xff]), Value::Integer(-1));
    assert_eq!(decode_element(&[0xe0]), Value::Integer(-32));
}

#[test]
fn decode_unsigned_ints() {
    assert_eq!(decode_element(&[0xcc, 0xff]), Value::Integer(255));
    assert_eq!(decode_element(&[0xcd, 0x01, 0x00]), Value::Integer(256));
    assert_eq!(
        decode_element(&[0xce, 0xff, 0xff, 0xff, 0xff]),
        Value::Integer(0xffff_ffff)
    );
    assert_eq!(
        decode_element(&[0xcf, 0x7f, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff]),
        Value::Integer(i64::MAX)
    );
}

#[test]
fn decode_signed_ints_sign_extend() {
    assert_eq!(decode_element(&[0xd0, 0x80]), Value::Integer(-128));
    assert_eq!(decode_element(&[0xd0, 0x7f]), Value::Integer(127));
    assert_eq!(decode_element(&[0xd1, 0xff, 0x7f]), Value::Integer(-129));
    assert_eq!(
        decode_element(&[0xd2, 0x80, 0x00, 0x00, 0x00]),
        Value::Integer(i64::from(i32::MIN))
    );
    assert_eq!(
        decode_element(&[0xd3, 0x80, 0, 0, 0, 0, 0, 0, 0]),
        Value::Integer(i64::MIN)
    );
}

#[test]
fn decode_uint64_above_signed_range_overflows() {
    let err = decode(&[0x91, 0xcf, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff]).unwrap_err();
    assert!(matches!(
        err,
        UclError::IntegerOverflow {
            value: u64::MAX,
            offset: 1
        }
    ));
}

#[test]
fn decode_floats() {
    assert_eq!(
        decode_element(&[0xcb, 0x3f, 0xf8, 0, 0, 0, 0, 0, 0]),
        Value::Float(1.5)
    );
    assert_eq!(
        decode_element(&[0xca, 0x3f, 0xc0, 0x00, 0x00]),
        Value::Float(1.5)
    );
}

#[test]
fn decode_nil_and_booleans() {
    assert_eq!(decode_element(&[0xc0]), Value::Null);
    assert_eq!(decode_element(&[0xc2]), Value::Boolean(false));
    assert_eq!(decode_element(&[0xc3]), Value::Boolean(true));
}

#[test]
fn decode_string_forms() {
    assert_eq!(decode_element(&[0xa2, b'h', b'i']), Value::from("hi"));
    assert_eq!(decode_element(&[0xd9, 0x02, b'h', b'i']), Value::from("hi"));
    assert_eq!(
        decode_element(&[0xda, 0x00, 0x02, b'h', b'i']),
        Value::from("hi")
    );
    assert_eq!(
        decode_element(&[0xdb, 0x00, 0x00, 0x00, 0x02, b'h', b'i']),
        Value::from("hi")
    );
}

#[test]
fn decode_string_keeps_invalid_utf8() {
    assert_eq!(
        decode_element(&[0xa2, 0xc3, 0x28]),
        Value::string(vec![0xc3, 0x28])
    );
}

#[test]
fn decode_binary_forms_as_userdata() {
    assert_eq!(
        decode_element(&[0xc4, 0x02, 0x00, 0x01]),
        Value::userdata(vec![0, 1])
    );
    assert_eq!(
        decode_element(&[0xc5, 0x00, 0x01, 0x09]),
        Value::userdata(vec![9])
    );
    assert_eq!(
        decode_element(&[0xc6, 0x00, 0x00, 0x00, 0x00]),
        Value::userdata(vec![])
    );
}

// ============================================================================
// Containers and keys
// ============================================================================

#[test]
fn decode_single_pair_map() {
    let value = decode(&[0x81, 0xa1, 0x61, 0x01]).unwrap();
    let mut expected = Object::new();
    expected.insert("a", 1);
    assert_eq!(value, Value::Object(expected));
}

#[test]
fn decode_nested_containers() {
    // {"a": [1, {"b": nil}], "c": {}}
    let bytes = [
        0x82, 0xa1, b'a', 0x92, 0x01, 0x81, 0xa1, b'b', 0xc0, 0xa1, b'c', 0x80,
    ];
    let value = decode(&bytes).unwrap();
    assert_eq!(value.lookup_path("a.0"), Some(&Value::Integer(1)));
    assert_eq!(value.lookup_path("a.1.b"), Some(&Value::Null));
    assert_eq!(value.get("c"), Some(&Value::object()));
}

#[test]
fn decode_container_closes_then_sibling_follows() {
    // [[1], 2]
    let value = decode(&[0x92, 0x91, 0x01, 0x02]).unwrap();
    assert_eq!(
        value,
        Value::Array(vec![Value::Array(vec![Value::Integer(1)]), Value::Integer(2)])
    );
}

#[test]
fn decode_preserves_duplicate_keys() {
    let value = decode(&[0x82, 0xa1, b'k', 0x01, 0xa1, b'k', 0x02]).unwrap();
    let obj = value.as_object().unwrap();
    assert_eq!(obj.len(), 2);
    let all: Vec<_> = obj.get_all("k").cloned().collect();
    assert_eq!(all, vec![Value::Integer(1), Value::Integer(2)]);
}

#[test]
fn decode_binary_key_accepted() {
    let value = decode(&[0x81, 0xc4, 0x01, b'k', 0x03]).unwrap();
    assert_eq!(value.get("k"), Some(&Value::Integer(3)));
}

#[test]
fn decode_rejects_integer_key() {
    assert!(matches!(
        decode(&[0x81, 0x01, 0x02]),
        Err(UclError::Structure { offset: 1, .. })
    ));
}

#[test]
fn decode_rejects_container_key() {
    assert!(matches!(
        decode(&[0x81, 0x90, 0x02]),
        Err(UclError::Structure { offset: 1, .. })
    ));
}

#[test]
fn decode_rejects_non_utf8_key() {
    assert!(matches!(
        decode(&[0x81, 0xa1, 0xff, 0x02]),
        Err(UclError::Structure { .. })
    ));
}

#[test]
fn decode_deep_nesting_without_recursion() {
    let depth = 1_000_000;
    let mut bytes = vec![0x91; depth];
    bytes.push(0x90);
    let root = decode(&bytes).unwrap();
    let mut value = &root;
    for _ in 0..depth {
        let items = value.as_array().unwrap();
        assert_eq!(items.len(), 1);
        value = &items[0];
    }
    assert_eq!(value, &Value::array());
    // root is released here without walking the call stack
}

#[test]
fn decode_deep_map_nesting_then_drop() {
    // {"k": {"k": ... {} }}
    let depth = 500_000;
    let mut bytes = Vec::with_capacity(depth * 3 + 1);
    for _ in 0..depth {
        bytes.extend_from_slice(&[0x81, 0xa1, b'k']);
    }
    bytes.push(0x80);
    let root = decode(&bytes).unwrap();
    let path = vec!["k"; depth].join(".");
    assert_eq!(root.lookup_path(&path), Some(&Value::object()));
    drop(root);
}

#[test]
fn decode_deep_truncated_input_releases_partial_tree() {
    let mut bytes = vec![0x91; 1_000_000];
    bytes.push(0x92);
    assert!(matches!(decode(&bytes), Err(UclError::Truncated { .. })));
}

#[test]
fn decode_hostile_count_does_not_preallocate() {
    // array32 claiming 4 billion elements followed by nothing
    assert_truncated(&[0xdd, 0xff, 0xff, 0xff, 0xff], 5, 0, 1);
}

// ============================================================================
// Extensions
// ============================================================================

#[test]
fn decode_skips_fixext_in_array() {
    // [fixext1(type 1, data 2), 5]
    let value = decode(&[0x92, 0xd4, 0x01, 0x02, 0x05]).unwrap();
    assert_eq!(value, Value::Array(vec![Value::Integer(5)]));
}

#[test]
fn decode_skips_ext8_map_value_with_its_key() {
    // {"x": ext8(len 2, type 7, data), "y": 1}
    let bytes = [
        0x82, 0xa1, b'x', 0xc7, 0x02, 0x07, 0xaa, 0xbb, 0xa1, b'y', 0x01,
    ];
    let value = decode(&bytes).unwrap();
    let obj = value.as_object().unwrap();
    assert_eq!(obj.len(), 1);
    assert!(!obj.contains_key("x"));
    assert_eq!(obj.get("y"), Some(&Value::Integer(1)));
}

#[test]
fn decode_ext_closing_container() {
    // [[fixext4], 1]
    let bytes = [0x92, 0x91, 0xd6, 0x01, 0, 0, 0, 0, 0x01];
    let value = decode(&bytes).unwrap();
    assert_eq!(
        value,
        Value::Array(vec![Value::array(), Value::Integer(1)])
    );
}

#[test]
fn decode_rejects_ext_as_key() {
    assert!(matches!(
        decode(&[0x81, 0xd4, 0x01, 0x02, 0x01]),
        Err(UclError::Structure { offset: 1, .. })
    ));
}

#[test]
fn decode_truncated_ext_payload() {
    // ext16 declaring 16 bytes, only 1 type byte present
    assert_truncated(&[0x91, 0xc8, 0x00, 0x10, 0x01], 4, 1, 17);
}

// ============================================================================
// Truncation
// ============================================================================

#[test]
fn truncated_length_field() {
    assert_truncated(&[0xdc, 0x00], 1, 1, 2);
}

#[test]
fn truncated_missing_elements() {
    assert_truncated(&[0x92, 0x01], 2, 0, 1);
}

#[test]
fn truncated_string_payload() {
    assert_truncated(&[0x91, 0xa5, b'a', b'b'], 2, 2, 5);
}

#[test]
fn truncated_fixed_width_value() {
    assert_truncated(&[0x91, 0xcb, 0x00, 0x00], 2, 2, 8);
}

#[test]
fn truncated_map_missing_value() {
    assert_truncated(&[0x81, 0xa1, b'a'], 3, 0, 1);
}

#[test]
fn truncation_error_message_names_counts() {
    let msg = decode(&[0x91, 0xcd, 0x01]).unwrap_err().to_string();
    assert!(msg.contains("1 remain"), "{msg}");
    assert!(msg.contains("2 needed"), "{msg}");
}

// ============================================================================
// Appending into an existing container
// ============================================================================

#[test]
fn decode_into_array_appends_bare_scalars() {
    let mut target = Value::Array(vec![Value::Integer(0)]);
    let appended = decode_into(&mut target, &[0x01, 0xa1, b'x', 0xc3]).unwrap();
    assert_eq!(appended, 3);
    assert_eq!(
        target,
        Value::Array(vec![
            Value::Integer(0),
            Value::Integer(1),
            Value::from("x"),
            Value::Boolean(true),
        ])
    );
}

#[test]
fn decode_into_object_reads_pairs() {
    let mut target = Value::object();
    let appended = decode_into(&mut target, &[0xa1, b'a', 0x01, 0xa1, b'b', 0x91, 0x02]).unwrap();
    assert_eq!(appended, 2);
    assert_eq!(target.get("a"), Some(&Value::Integer(1)));
    assert_eq!(target.lookup_path("b.0"), Some(&Value::Integer(2)));
}

#[test]
fn decode_into_object_dangling_key_is_truncated() {
    let mut target = Value::object();
    let err = decode_into(&mut target, &[0xa1, b'a', 0x01, 0xa1, b'b']).unwrap_err();
    assert!(matches!(err, UclError::Truncated { .. }));
    // the completed pair stays
    assert_eq!(target.get("a"), Some(&Value::Integer(1)));
    assert_eq!(target.len(), 1);
}

#[test]
fn decode_into_keeps_partial_output_on_error() {
    let mut target = Value::array();
    let err = decode_into(&mut target, &[0x01, 0x02, 0xc1]).unwrap_err();
    assert!(matches!(err, UclError::Format { byte: 0xc1, offset: 2 }));
    assert_eq!(
        target,
        Value::Array(vec![Value::Integer(1), Value::Integer(2)])
    );
}

#[test]
fn decode_into_rejects_scalar_target() {
    let mut target = Value::Integer(3);
    let err = decode_into(&mut target, &[0x01]).unwrap_err();
    assert!(matches!(
        err,
        UclError::TypeMismatch {
            found: ValueKind::Int,
            ..
        }
    ));
    assert_eq!(target, Value::Integer(3));
}

#[test]
fn decode_into_empty_input() {
    let mut target = Value::array();
    assert!(matches!(
        decode_into(&mut target, &[]),
        Err(UclError::EmptyInput)
    ));
}

#[test]
fn decode_into_skips_extensions() {
    let mut target = Value::array();
    let appended = decode_into(&mut target, &[0xd4, 0x01, 0x00, 0x07]).unwrap();
    assert_eq!(appended, 1);
    assert_eq!(target, Value::Array(vec![Value::Integer(7)]));
}
