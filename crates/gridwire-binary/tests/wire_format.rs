//! Integration tests for the object layout: header, footer, raw section and
//! value encodings.

mod common;

use std::rc::Rc;

use chrono::{DateTime, NaiveTime};
use gridwire_binary::writer::array_identity_hash;
use gridwire_binary::{BinaryType, DynamicObject, ObjectWriter, SqlTime, Value};
use gridwire_core::protocol::{
    flags, schema_initial_id, tags, update_schema_id, OffsetWidth, HASH_CODE_POS, HEADER_LEN,
    UNREGISTERED_TYPE_ID,
};
use gridwire_core::registry::lower_case_hash;
use gridwire_core::{BinaryConfig, BinaryError, BinarySchema, Decimal, StringEncoding, TypeRegistry};
use uuid::Uuid;

use common::{i32_at, obj, parse, setup, TypeRef, Wire};

fn schema_id_of(field_names: &[&str]) -> i32 {
    field_names
        .iter()
        .fold(schema_initial_id(), |id, name| update_schema_id(id, lower_case_hash(name)))
}

// ============================================================================
// Header and footer
// ============================================================================

#[test]
fn test_registered_person_layout() {
    let (registry, marshaller) = setup(BinaryConfig::default(), &["Person"]);
    let person = obj(DynamicObject::new("Person").with_field("name", "Ann").with_field("age", 30));

    let bytes = marshaller.marshal(&person).expect("marshal person");

    // header + "Ann" (8) + 30 (5) + two one-byte offsets
    assert_eq!(bytes.len(), HEADER_LEN + 8 + 5 + 2);
    assert_eq!(&bytes[24..32], &[tags::STRING, 3, 0, 0, 0, b'A', b'n', b'n']);
    assert_eq!(&bytes[32..37], &[tags::INT, 30, 0, 0, 0]);
    assert_eq!(&bytes[37..], &[24, 32]);

    let wire = parse(&bytes);
    let person = wire.object();
    assert_eq!(person.type_id, lower_case_hash("Person"));
    assert_eq!(
        person.flags,
        flags::USER_TYPE | flags::HAS_SCHEMA | flags::COMPACT_FOOTER | flags::OFFSET_ONE_BYTE
    );
    assert_eq!(person.len, bytes.len());
    assert_eq!(person.schema_or_raw_offset, 37);
    assert_eq!(person.schema_id, schema_id_of(&["name", "age"]));
    assert_eq!(person.hash, 0);
    assert_eq!(person.field_at(0).str(), "Ann");
    assert_eq!(person.field_at(1), &Wire::Int(30));

    // Compact footers rely on the registry's schema cache for field ids.
    let schema = registry.schema(person.type_id, person.schema_id).expect("schema cached");
    assert_eq!(
        schema,
        BinarySchema::from_field_ids([lower_case_hash("name"), lower_case_hash("age")])
    );
}

#[test]
fn test_unregistered_empty_type_carries_name() {
    let (_, marshaller) = setup(BinaryConfig::default(), &[]);
    let bytes = marshaller.marshal(&obj(DynamicObject::new("Foo"))).expect("marshal Foo");

    assert_eq!(bytes.len(), HEADER_LEN + 8);
    let foo = parse(&bytes);
    let foo = foo.object();
    assert_eq!(foo.type_id, UNREGISTERED_TYPE_ID);
    assert_eq!(foo.type_name.as_deref(), Some("Foo"));
    assert_eq!(foo.flags, flags::USER_TYPE | flags::COMPACT_FOOTER);
    assert_eq!(foo.schema_id, 0);
    assert_eq!(foo.schema_or_raw_offset, 0);
    assert!(foo.fields.is_empty());
}

#[test]
fn test_unregistered_type_fields_follow_name() {
    let (_, marshaller) = setup(BinaryConfig::default().with_compact_footer(false), &[]);
    let bytes = marshaller
        .marshal(&obj(DynamicObject::new("Foo").with_field("x", 1)))
        .expect("marshal Foo");

    let foo = parse(&bytes);
    let foo = foo.object();
    assert_eq!(foo.fields[0].offset, HEADER_LEN + 8);
    assert_eq!(foo.field(lower_case_hash("x")), &Wire::Int(1));
}

#[test]
fn test_full_footer_pairs() {
    let (_, marshaller) = setup(BinaryConfig::default().with_compact_footer(false), &["Point"]);
    let point = obj(DynamicObject::new("Point").with_field("x", 1).with_field("y", 2));
    let bytes = marshaller.marshal(&point).expect("marshal point");

    let point = parse(&bytes);
    let point = point.object();
    assert!(!point.has(flags::COMPACT_FOOTER));
    assert_eq!(point.field(lower_case_hash("x")), &Wire::Int(1));
    assert_eq!(point.field(lower_case_hash("y")), &Wire::Int(2));
    // Two (id, one-byte offset) entries.
    assert_eq!(bytes.len() - point.schema_or_raw_offset, 10);
}

#[test]
fn test_footer_width_follows_largest_offset() {
    let (_, marshaller) = setup(BinaryConfig::default(), &["Blob"]);

    for (padding, width) in [
        (200, OffsetWidth::One),
        (300, OffsetWidth::Two),
        (70_000, OffsetWidth::Four),
    ] {
        let blob = obj(DynamicObject::new("Blob")
            .with_field("data", vec![0u8; padding])
            .with_field("tail", true));
        let bytes = marshaller.marshal(&blob).expect("marshal blob");
        let blob = parse(&bytes);
        let blob = blob.object();

        assert_eq!(blob.offset_width, Some(width), "padding {padding}");
        assert_eq!(blob.fields[1].offset, HEADER_LEN + 5 + padding);
        assert_eq!(blob.field_at(1), &Wire::Bool(true));
        let flag_bits = blob.flags & (flags::OFFSET_ONE_BYTE | flags::OFFSET_TWO_BYTES);
        assert_eq!(flag_bits, width.flag());
    }
}

#[test]
fn test_system_type_never_compact() {
    #[derive(Debug)]
    struct Duration(i64);

    impl BinaryType for Duration {
        fn type_name(&self) -> &str {
            "Duration"
        }

        fn write_binary(&self, writer: &mut ObjectWriter<'_, '_>) -> gridwire_core::Result<()> {
            writer.write_long("nanos", self.0)
        }
    }

    let (registry, marshaller) = setup(BinaryConfig::default(), &[]);
    registry.register_type_with_id("Duration", 77, false);

    let bytes = marshaller.marshal(&Value::object(Rc::new(Duration(5)))).expect("marshal");
    let duration = parse(&bytes);
    let duration = duration.object();
    assert_eq!(duration.type_id, 77);
    assert!(!duration.has(flags::USER_TYPE));
    assert!(!duration.has(flags::COMPACT_FOOTER));
    assert_eq!(duration.field(lower_case_hash("nanos")), &Wire::Long(5));
}

// ============================================================================
// Schema id
// ============================================================================

#[test]
fn test_schema_id_is_deterministic_and_order_sensitive() {
    let (_, marshaller) = setup(BinaryConfig::default(), &["Pair"]);
    let ab = || obj(DynamicObject::new("Pair").with_field("a", 1).with_field("b", 2));
    let ba = obj(DynamicObject::new("Pair").with_field("b", 2).with_field("a", 1));

    let first = parse(&marshaller.marshal(&ab()).expect("marshal")).object().schema_id;
    let second = parse(&marshaller.marshal(&ab()).expect("marshal")).object().schema_id;
    let reversed = parse(&marshaller.marshal(&ba).expect("marshal")).object().schema_id;

    assert_eq!(first, second);
    assert_eq!(first, schema_id_of(&["a", "b"]));
    assert_ne!(first, reversed);
}

// ============================================================================
// Raw section
// ============================================================================

#[test]
fn test_raw_only_object() {
    let (_, marshaller) = setup(BinaryConfig::default(), &["Packet"]);
    let packet = obj(DynamicObject::new("Packet").with_raw(vec![1, 2, 3]));
    let bytes = marshaller.marshal(&packet).expect("marshal");

    let packet = parse(&bytes);
    let packet = packet.object();
    assert!(packet.has(flags::HAS_RAW));
    assert!(!packet.has(flags::HAS_SCHEMA));
    assert_eq!(packet.schema_id, 0);
    assert_eq!(packet.schema_or_raw_offset, HEADER_LEN);
    assert_eq!(packet.raw.as_deref(), Some(&[1u8, 2, 3][..]));
}

#[test]
fn test_fields_then_raw() {
    let (_, marshaller) = setup(BinaryConfig::default(), &["Packet"]);
    let packet = obj(DynamicObject::new("Packet").with_field("id", 9).with_raw(vec![0xAA; 4]));
    let bytes = marshaller.marshal(&packet).expect("marshal");

    let packet = parse(&bytes);
    let packet = packet.object();
    assert!(packet.has(flags::HAS_RAW));
    assert!(packet.has(flags::HAS_SCHEMA));
    assert_eq!(packet.field_at(0), &Wire::Int(9));
    assert_eq!(packet.raw.as_deref(), Some(&[0xAA; 4][..]));
    // Raw offset trails the footer.
    assert_eq!(i32_at(&bytes, bytes.len() - 4), (HEADER_LEN + 5) as i32);
}

#[test]
fn test_field_after_raw_is_rejected() {
    #[derive(Debug)]
    struct Backwards;

    impl BinaryType for Backwards {
        fn type_name(&self) -> &str {
            "Backwards"
        }

        fn write_binary(&self, writer: &mut ObjectWriter<'_, '_>) -> gridwire_core::Result<()> {
            writer.raw_writer().write_i32(1)?;
            writer.write_int("late", 2)
        }
    }

    let (_, marshaller) = setup(BinaryConfig::default(), &["Backwards"]);
    let err = marshaller.marshal(&Value::object(Rc::new(Backwards))).unwrap_err();
    assert!(matches!(err, BinaryError::RawModeActive));
}

#[test]
fn test_duplicate_field_is_rejected() {
    #[derive(Debug)]
    struct Twice;

    impl BinaryType for Twice {
        fn type_name(&self) -> &str {
            "Twice"
        }

        fn write_binary(&self, writer: &mut ObjectWriter<'_, '_>) -> gridwire_core::Result<()> {
            writer.write_int("value", 1)?;
            writer.write_int("VALUE", 2)
        }
    }

    let (_, marshaller) = setup(BinaryConfig::default(), &["Twice"]);
    let err = marshaller.marshal(&Value::object(Rc::new(Twice))).unwrap_err();
    assert!(matches!(err, BinaryError::DuplicateField { field_id } if field_id == lower_case_hash("value")));
}

// ============================================================================
// Values
// ============================================================================

#[test]
fn test_every_value_kind_walks() {
    let (_, marshaller) = setup(BinaryConfig::default(), &[]);
    let ts = DateTime::from_timestamp(1_700_000_000, 5_000_001).expect("timestamp");
    let time = NaiveTime::from_hms_milli_opt(0, 0, 2, 5).expect("time");
    let uuid = Uuid::from_u64_pair(1, 2);

    let cases: Vec<(Value, Wire)> = vec![
        (Value::Null, Wire::Null),
        (Value::Byte(7), Wire::Byte(7)),
        (Value::Short(-3), Wire::Short(-3)),
        (Value::Long(i64::MIN), Wire::Long(i64::MIN)),
        (Value::Float(1.5), Wire::Float(1.5)),
        (Value::Double(-0.25), Wire::Double(-0.25)),
        (Value::Char(0x263A), Wire::Char(0x263A)),
        (Value::Bool(false), Wire::Bool(false)),
        (Value::from("héllo"), Wire::Str("héllo".as_bytes().to_vec())),
        (Value::Uuid(uuid), Wire::Uuid(1, 2)),
        (Value::Date(ts), Wire::Date(1_700_000_000_005)),
        (Value::Timestamp(ts), Wire::Timestamp(1_700_000_000_005, 1)),
        (Value::from(time), Wire::Time(2_005)),
        (Value::Time(SqlTime::from_millis(-3_600_000)), Wire::Time(-3_600_000)),
        (
            Value::Decimal(Decimal::new(-1250, 2)),
            Wire::Decimal { scale: 2, magnitude: vec![0x84, 0xE2] },
        ),
        (
            Value::ShortArray(vec![1, 2]),
            Wire::Primitive { tag: tags::SHORT_ARR, len: 2, payload: vec![1, 0, 2, 0] },
        ),
        (
            Value::LongArray(vec![]),
            Wire::Primitive { tag: tags::LONG_ARR, len: 0, payload: vec![] },
        ),
        (
            Value::UuidArray(vec![None, Some(uuid)]),
            Wire::Elements { tag: tags::UUID_ARR, items: vec![Wire::Null, Wire::Uuid(1, 2)] },
        ),
        (
            Value::TimestampArray(vec![Some(ts)]),
            Wire::Elements {
                tag: tags::TIMESTAMP_ARR,
                items: vec![Wire::Timestamp(1_700_000_000_005, 1)],
            },
        ),
        (Value::Class("Person".into()), Wire::Class(TypeRef::Name("Person".into()))),
    ];

    for (value, expected) in cases {
        let bytes = marshaller.marshal(&value).expect("marshal value");
        assert_eq!(parse(&bytes), expected, "value {value:?}");
    }
}

#[test]
fn test_decimal_sign_roundtrip() {
    let (_, marshaller) = setup(BinaryConfig::default(), &[]);
    for text in ["0", "1", "-1", "127", "128", "-128", "3.14159", "-99999999999999999999.5"] {
        let decimal: Decimal = text.parse().expect("parse decimal");
        let bytes = marshaller.marshal(&Value::Decimal(decimal.clone())).expect("marshal");
        let Wire::Decimal { scale, magnitude } = parse(&bytes) else {
            panic!("expected a decimal");
        };
        assert_eq!(Decimal::from_wire_parts(scale, &magnitude), decimal, "{text}");
        assert_eq!(magnitude[0] & 0x80 != 0, decimal.is_negative(), "{text}");
    }

    // Minimal length: a leading zero byte only when the top bit is taken.
    for (unscaled, len) in [(127, 1), (128, 2), (-128, 2), (32_767, 2), (32_768, 3)] {
        let bytes = marshaller.marshal(&Value::Decimal(Decimal::new(unscaled, 0))).expect("marshal");
        let Wire::Decimal { magnitude, .. } = parse(&bytes) else {
            panic!("expected a decimal");
        };
        assert_eq!(magnitude.len(), len, "{unscaled}");
    }
}

#[test]
fn test_reencoding_is_byte_identical() {
    let (_, marshaller) = setup(BinaryConfig::default(), &["Node"]);
    let leaf = obj(DynamicObject::new("Node").with_field("name", "leaf"));
    let root = obj(DynamicObject::new("Node")
        .with_field("left", leaf.clone())
        .with_field("right", leaf)
        .with_field("tags", Value::StringArray(vec![Some("a".into()), None])));

    let first = marshaller.marshal(&root).expect("marshal");
    let second = marshaller.marshal(&root).expect("marshal");
    assert_eq!(first, second);
}

#[test]
fn test_string_encoding_from_json_config() {
    let config: BinaryConfig =
        serde_json::from_str(r#"{"string_encoding": "v2"}"#).expect("config parses");
    let (_, marshaller) = setup(config, &[]);

    let bytes = marshaller.marshal(&Value::from("\u{1F600}")).expect("marshal");
    assert_eq!(bytes, vec![tags::STRING, 6, 0, 0, 0, 0xED, 0xA0, 0xBD, 0xED, 0xB8, 0x80]);

    let lone = marshaller.marshal(&Value::Utf16(vec![0xD800])).expect("marshal");
    assert_eq!(parse(&lone), Wire::Str(vec![0xED, 0xA0, 0x80]));
}

#[test]
fn test_v1_replaces_unpaired_surrogates() {
    let (_, marshaller) = setup(BinaryConfig::default().with_string_encoding(StringEncoding::V1), &[]);
    let bytes = marshaller.marshal(&Value::Utf16(vec![0x61, 0xDC00])).expect("marshal");
    assert_eq!(parse(&bytes), Wire::Str(b"a?".to_vec()));
}

#[test]
fn test_identity_hash_fills_header() {
    let (_, marshaller) = setup(BinaryConfig::default().with_identity_hash(true), &["Person"]);
    let person = obj(DynamicObject::new("Person").with_field("name", "Ann"));
    let bytes = marshaller.marshal(&person).expect("marshal");

    let person = parse(&bytes);
    let person = person.object();
    let data = &bytes[HEADER_LEN..person.schema_or_raw_offset];
    assert_eq!(i32_at(&bytes, HASH_CODE_POS), array_identity_hash(data));
    assert_ne!(person.hash, 0);
}

#[test]
fn test_fail_if_unregistered() {
    let (_, marshaller) = setup(BinaryConfig::default().with_fail_if_unregistered(true), &[]);
    let err = marshaller.marshal(&obj(DynamicObject::new("Foo"))).unwrap_err();
    assert!(err.is_resolution());

    // Class literals never refuse.
    let bytes = marshaller.marshal(&Value::Class("Foo".into())).expect("marshal class");
    assert_eq!(parse(&bytes), Wire::Class(TypeRef::Name("Foo".into())));
}
