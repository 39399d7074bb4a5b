//! Test-only reader for gridwire binary objects.
//!
//! Walks encoded bytes into a [`Wire`] tree so tests can check structure
//! without a library decode path.

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use std::rc::Rc;
use std::sync::Arc;

use gridwire_binary::{DynamicObject, Marshaller, Value};
use gridwire_core::protocol::{flags, tags, OffsetWidth, HEADER_LEN, PROTO_VER, UNREGISTERED_TYPE_ID};
use gridwire_core::{BinaryConfig, MemoryTypeRegistry};

/// A type reference: registered id or inline name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    Id(i32),
    Name(String),
}

/// One decoded value.
#[derive(Debug, Clone, PartialEq)]
pub enum Wire {
    Null,
    Byte(u8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Char(u16),
    Bool(bool),
    Str(Vec<u8>),
    Uuid(u64, u64),
    Date(i64),
    Timestamp(i64, i32),
    Time(i64),
    Decimal { scale: i32, magnitude: Vec<u8> },
    /// Fixed-width primitive array: tag, count, payload bytes.
    Primitive { tag: u8, len: usize, payload: Vec<u8> },
    /// Array of tagged elements (string, uuid, date, timestamp, time, decimal).
    Elements { tag: u8, items: Vec<Wire> },
    ObjectArray { component: TypeRef, items: Vec<Wire> },
    Collection { kind: i8, items: Vec<Wire> },
    Map { kind: i8, entries: Vec<(Wire, Wire)> },
    Enum { type_ref: TypeRef, ordinal: i32 },
    EnumArray { type_ref: TypeRef, items: Vec<Wire> },
    BinaryEnum { type_id: i32, name: Option<String>, ordinal: i32 },
    Class(TypeRef),
    Proxy { interfaces: Vec<TypeRef>, handler: Box<Wire> },
    Binary { bytes: Vec<u8>, start: i32 },
    /// Back-reference: absolute position of the referenced value.
    Handle { target: usize },
    Object(WireObject),
}

impl Wire {
    pub fn object(&self) -> &WireObject {
        match self {
            Self::Object(object) => object,
            other => panic!("expected an object, got {other:?}"),
        }
    }

    pub fn str(&self) -> &str {
        match self {
            Self::Str(bytes) => std::str::from_utf8(bytes).expect("valid UTF-8"),
            other => panic!("expected a string, got {other:?}"),
        }
    }
}

/// One field: id (absent for compact footers), offset from object start,
/// value.
#[derive(Debug, Clone, PartialEq)]
pub struct WireField {
    pub id: Option<i32>,
    pub offset: usize,
    pub value: Wire,
}

/// A decoded full object.
#[derive(Debug, Clone, PartialEq)]
pub struct WireObject {
    pub start: usize,
    pub flags: u16,
    pub type_id: i32,
    pub type_name: Option<String>,
    pub hash: i32,
    pub len: usize,
    pub schema_id: i32,
    pub schema_or_raw_offset: usize,
    pub offset_width: Option<OffsetWidth>,
    pub fields: Vec<WireField>,
    pub raw: Option<Vec<u8>>,
}

impl WireObject {
    pub fn has(&self, flag: u16) -> bool {
        self.flags & flag != 0
    }

    /// Value of the field with `id`, for full footers.
    pub fn field(&self, id: i32) -> &Wire {
        &self
            .fields
            .iter()
            .find(|f| f.id == Some(id))
            .unwrap_or_else(|| panic!("no field {id} in {self:?}"))
            .value
    }

    /// Value of the `index`-th field in footer order.
    pub fn field_at(&self, index: usize) -> &Wire {
        &self.fields[index].value
    }
}

/// Walk the value at the start of `bytes`.
pub fn parse(bytes: &[u8]) -> Wire {
    parse_at(bytes, 0).0
}

/// Walk the value at `pos` and return it with the position after it.
pub fn parse_at(bytes: &[u8], pos: usize) -> (Wire, usize) {
    let mut reader = Reader { bytes, pos };
    let wire = reader.value();
    (wire, reader.pos)
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl Reader<'_> {
    fn take(&mut self, n: usize) -> &[u8] {
        let out = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        out
    }

    fn u8(&mut self) -> u8 {
        self.take(1)[0]
    }

    fn i16(&mut self) -> i16 {
        i16::from_le_bytes(self.take(2).try_into().unwrap())
    }

    fn u16(&mut self) -> u16 {
        u16::from_le_bytes(self.take(2).try_into().unwrap())
    }

    fn i32(&mut self) -> i32 {
        i32::from_le_bytes(self.take(4).try_into().unwrap())
    }

    fn i64(&mut self) -> i64 {
        i64::from_le_bytes(self.take(8).try_into().unwrap())
    }

    fn count(&mut self) -> usize {
        usize::try_from(self.i32()).expect("non-negative count")
    }

    fn type_ref(&mut self) -> TypeRef {
        match self.i32() {
            UNREGISTERED_TYPE_ID => match self.value() {
                Wire::Str(bytes) => TypeRef::Name(String::from_utf8(bytes).expect("UTF-8 name")),
                other => panic!("expected inline type name, got {other:?}"),
            },
            id => TypeRef::Id(id),
        }
    }

    fn elements(&mut self, tag: u8) -> Wire {
        let len = self.count();
        let items = (0..len).map(|_| self.value()).collect();
        Wire::Elements { tag, items }
    }

    fn primitive(&mut self, tag: u8, width: usize) -> Wire {
        let len = self.count();
        let payload = self.take(len * width).to_vec();
        Wire::Primitive { tag, len, payload }
    }

    fn value(&mut self) -> Wire {
        let at = self.pos;
        let tag = self.u8();
        match tag {
            tags::NULL => Wire::Null,
            tags::BYTE => Wire::Byte(self.u8()),
            tags::SHORT => Wire::Short(self.i16()),
            tags::INT => Wire::Int(self.i32()),
            tags::LONG => Wire::Long(self.i64()),
            tags::FLOAT => Wire::Float(f32::from_le_bytes(self.take(4).try_into().unwrap())),
            tags::DOUBLE => Wire::Double(f64::from_le_bytes(self.take(8).try_into().unwrap())),
            tags::CHAR => Wire::Char(self.u16()),
            tags::BOOL => Wire::Bool(self.u8() != 0),
            tags::STRING => {
                let len = self.count();
                Wire::Str(self.take(len).to_vec())
            }
            tags::UUID => Wire::Uuid(self.i64() as u64, self.i64() as u64),
            tags::DATE => Wire::Date(self.i64()),
            tags::TIMESTAMP => Wire::Timestamp(self.i64(), self.i32()),
            tags::TIME => Wire::Time(self.i64()),
            tags::DECIMAL => {
                let scale = self.i32();
                let len = self.count();
                Wire::Decimal { scale, magnitude: self.take(len).to_vec() }
            }
            tags::BYTE_ARR | tags::BOOL_ARR => self.primitive(tag, 1),
            tags::SHORT_ARR | tags::CHAR_ARR => self.primitive(tag, 2),
            tags::INT_ARR | tags::FLOAT_ARR => self.primitive(tag, 4),
            tags::LONG_ARR | tags::DOUBLE_ARR => self.primitive(tag, 8),
            tags::STRING_ARR
            | tags::UUID_ARR
            | tags::DATE_ARR
            | tags::TIMESTAMP_ARR
            | tags::TIME_ARR
            | tags::DECIMAL_ARR => self.elements(tag),
            tags::OBJ_ARR => {
                let component = self.type_ref();
                let len = self.count();
                let items = (0..len).map(|_| self.value()).collect();
                Wire::ObjectArray { component, items }
            }
            tags::COL => {
                let len = self.count();
                let kind = self.u8() as i8;
                let items = (0..len).map(|_| self.value()).collect();
                Wire::Collection { kind, items }
            }
            tags::MAP => {
                let len = self.count();
                let kind = self.u8() as i8;
                let entries = (0..len).map(|_| (self.value(), self.value())).collect();
                Wire::Map { kind, entries }
            }
            tags::ENUM => {
                let type_ref = self.type_ref();
                Wire::Enum { type_ref, ordinal: self.i32() }
            }
            tags::ENUM_ARR => {
                let type_ref = self.type_ref();
                let len = self.count();
                let items = (0..len).map(|_| self.value()).collect();
                Wire::EnumArray { type_ref, items }
            }
            tags::BINARY_ENUM => {
                let type_id = self.i32();
                let name = (type_id == UNREGISTERED_TYPE_ID).then(|| self.value().str().to_owned());
                Wire::BinaryEnum { type_id, name, ordinal: self.i32() }
            }
            tags::CLASS => Wire::Class(self.type_ref()),
            tags::PROXY => {
                let len = self.count();
                let interfaces = (0..len).map(|_| self.type_ref()).collect();
                Wire::Proxy { interfaces, handler: Box::new(self.value()) }
            }
            tags::BINARY_OBJ => {
                let len = self.count();
                let bytes = self.take(len).to_vec();
                Wire::Binary { bytes, start: self.i32() }
            }
            tags::HANDLE => {
                let delta = self.count();
                Wire::Handle { target: at - delta }
            }
            tags::OBJ => {
                self.pos = at;
                Wire::Object(self.object())
            }
            other => panic!("unknown tag {other} at {at}"),
        }
    }

    fn object(&mut self) -> WireObject {
        let start = self.pos;
        assert_eq!(self.u8(), tags::OBJ);
        assert_eq!(self.u8(), PROTO_VER);
        let flags = self.u16();
        let type_id = self.i32();
        let hash = self.i32();
        let len = self.count();
        let schema_id = self.i32();
        let schema_or_raw_offset = self.count();
        assert_eq!(self.pos, start + HEADER_LEN);

        let type_name = (type_id == UNREGISTERED_TYPE_ID).then(|| self.value().str().to_owned());
        let end = start + len;

        let has_schema = flags & flags::HAS_SCHEMA != 0;
        let has_raw = flags & flags::HAS_RAW != 0;
        let compact = flags & flags::COMPACT_FOOTER != 0;

        let (footer_start, footer_end) = if has_schema {
            (start + schema_or_raw_offset, if has_raw { end - 4 } else { end })
        } else {
            (end, end)
        };

        let mut fields = Vec::new();
        let mut offset_width = None;
        if has_schema {
            let width = OffsetWidth::from_flags(flags);
            offset_width = Some(width);
            let mut footer = Reader { bytes: self.bytes, pos: footer_start };
            while footer.pos < footer_end {
                let id = (!compact).then(|| footer.i32());
                let offset = match width {
                    OffsetWidth::One => usize::from(footer.u8()),
                    OffsetWidth::Two => usize::from(footer.u16()),
                    OffsetWidth::Four => footer.count(),
                };
                let (value, _) = parse_at(self.bytes, start + offset);
                fields.push(WireField { id, offset, value });
            }
            assert_eq!(footer.pos, footer_end, "footer entries must tile the footer");
        }

        let raw = has_raw.then(|| {
            let raw_offset = if has_schema {
                let mut tail = Reader { bytes: self.bytes, pos: end - 4 };
                tail.count()
            } else {
                schema_or_raw_offset
            };
            self.bytes[start + raw_offset..footer_start].to_vec()
        });

        self.pos = end;
        WireObject {
            start,
            flags,
            type_id,
            type_name,
            hash,
            len,
            schema_id,
            schema_or_raw_offset,
            offset_width,
            fields,
            raw,
        }
    }
}

/// Registry plus marshaller with `types` registered.
pub fn setup(config: BinaryConfig, types: &[&str]) -> (Arc<MemoryTypeRegistry>, Marshaller) {
    let registry = Arc::new(MemoryTypeRegistry::new(config));
    for name in types {
        registry.register_type(name).expect("type should register");
    }
    let marshaller = Marshaller::new(registry.clone());
    (registry, marshaller)
}

/// Shorthand for a shared dynamic object.
pub fn obj(object: DynamicObject) -> Value {
    Value::object(Rc::new(object))
}

pub fn i32_at(bytes: &[u8], pos: usize) -> i32 {
    i32::from_le_bytes(bytes[pos..pos + 4].try_into().unwrap())
}
