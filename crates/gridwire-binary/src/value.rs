//! Values the writer can encode.
//!
//! [`Value`] is a closed set of the supported wire categories. Shared,
//! identity-bearing parts of a graph (objects, object arrays, collections,
//! maps, proxies) are held by `Rc`, so the same allocation written twice in
//! one root write becomes a back-reference the second time.
//!
//! User types implement [`BinaryType`] and are wrapped as [`ObjectRef`].
//! [`DynamicObject`] is a ready-made implementation with named fields.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use chrono::{DateTime, NaiveTime, Timelike, Utc};
use gridwire_core::{Decimal, Result};
use uuid::Uuid;

use crate::writer::ObjectWriter;

/// A user type that knows how to write itself as a binary object.
pub trait BinaryType: fmt::Debug {
    /// Fully qualified type name, resolved through the registry.
    fn type_name(&self) -> &str;

    /// Write the fields (and optionally a raw section) of this object.
    ///
    /// # Errors
    ///
    /// Propagates any error from the writer.
    fn write_binary(&self, writer: &mut ObjectWriter<'_, '_>) -> Result<()>;

    /// Value to write instead of this object, if any.
    ///
    /// Asked once per write. Returning `Some(Value::Null)` writes a null. The
    /// replacement itself is never asked for a further replacement.
    fn write_replace(&self) -> Option<Value> {
        None
    }
}

/// Shared handle to a user object.
pub type ObjectRef = Rc<dyn BinaryType>;

/// Any encodable value.
#[derive(Debug, Clone)]
#[allow(missing_docs)]
pub enum Value {
    Null,
    Byte(u8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    /// One UTF-16 code unit.
    Char(u16),
    Bool(bool),
    String(String),
    /// UTF-16 text that may hold unpaired surrogates.
    Utf16(Vec<u16>),
    Uuid(Uuid),
    Date(DateTime<Utc>),
    Timestamp(DateTime<Utc>),
    Time(SqlTime),
    Decimal(Decimal),

    ByteArray(Vec<u8>),
    ShortArray(Vec<i16>),
    IntArray(Vec<i32>),
    LongArray(Vec<i64>),
    FloatArray(Vec<f32>),
    DoubleArray(Vec<f64>),
    CharArray(Vec<u16>),
    BoolArray(Vec<bool>),
    StringArray(Vec<Option<String>>),
    UuidArray(Vec<Option<Uuid>>),
    DateArray(Vec<Option<DateTime<Utc>>>),
    TimestampArray(Vec<Option<DateTime<Utc>>>),
    TimeArray(Vec<Option<SqlTime>>),
    DecimalArray(Vec<Option<Decimal>>),

    Object(ObjectRef),
    ObjectArray(Rc<ObjectArray>),
    Collection(Rc<Collection>),
    Map(Rc<MapValue>),
    Enum(EnumValue),
    EnumArray(EnumArray),
    BinaryEnum(BinaryEnum),
    /// A type referenced by name.
    Class(String),
    Proxy(Rc<ProxyValue>),
    /// An object that is already encoded.
    Binary(EncodedObject),
}

impl Value {
    /// Wrap a user object.
    pub fn object<T: BinaryType + 'static>(object: Rc<T>) -> Self {
        Self::Object(object)
    }

    /// An array of values whose declared component type is `component_type`.
    pub fn object_array(component_type: impl Into<String>, items: Vec<Value>) -> Self {
        Self::ObjectArray(Rc::new(ObjectArray::new(component_type, items)))
    }

    /// A collection of concrete type `type_name`.
    pub fn collection(type_name: impl Into<String>, items: Vec<Value>) -> Self {
        Self::Collection(Rc::new(Collection::new(type_name, items)))
    }

    /// A map of concrete type `type_name`.
    pub fn map(type_name: impl Into<String>, entries: Vec<(Value, Value)>) -> Self {
        Self::Map(Rc::new(MapValue::new(type_name, entries)))
    }

    /// An enum constant.
    pub fn enumeration(type_name: impl Into<String>, ordinal: i32) -> Self {
        Self::Enum(EnumValue::new(type_name, ordinal))
    }

    /// Whether this is [`Value::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Self::$variant(value)
                }
            }
        )*
    };
}

impl_from! {
    u8 => Byte,
    i16 => Short,
    i32 => Int,
    i64 => Long,
    f32 => Float,
    f64 => Double,
    bool => Bool,
    String => String,
    Uuid => Uuid,
    SqlTime => Time,
    Decimal => Decimal,
    Vec<u8> => ByteArray,
    Vec<i32> => IntArray,
    Vec<i64> => LongArray,
    Vec<f64> => DoubleArray,
    EnumValue => Enum,
    ObjectRef => Object,
}

impl From<NaiveTime> for Value {
    fn from(value: NaiveTime) -> Self {
        Self::Time(value.into())
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// An array of values with a declared component type.
#[derive(Debug)]
pub struct ObjectArray {
    component_type: String,
    items: Vec<Value>,
}

impl ObjectArray {
    /// Create an array.
    pub fn new(component_type: impl Into<String>, items: Vec<Value>) -> Self {
        Self { component_type: component_type.into(), items }
    }

    /// Declared component type.
    #[must_use]
    pub fn component_type(&self) -> &str {
        &self.component_type
    }

    /// Elements.
    #[must_use]
    pub fn items(&self) -> &[Value] {
        &self.items
    }
}

/// A collection whose concrete type is classified by the registry.
#[derive(Debug)]
pub struct Collection {
    type_name: String,
    items: Vec<Value>,
}

impl Collection {
    /// Create a collection.
    pub fn new(type_name: impl Into<String>, items: Vec<Value>) -> Self {
        Self { type_name: type_name.into(), items }
    }

    /// Concrete collection type.
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Elements in iteration order.
    #[must_use]
    pub fn items(&self) -> &[Value] {
        &self.items
    }
}

/// A map whose concrete type is classified by the registry.
#[derive(Debug)]
pub struct MapValue {
    type_name: String,
    entries: Vec<(Value, Value)>,
}

impl MapValue {
    /// Create a map.
    pub fn new(type_name: impl Into<String>, entries: Vec<(Value, Value)>) -> Self {
        Self { type_name: type_name.into(), entries }
    }

    /// Concrete map type.
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Entries in iteration order.
    #[must_use]
    pub fn entries(&self) -> &[(Value, Value)] {
        &self.entries
    }
}

/// An enum constant, identified by its type and ordinal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumValue {
    type_name: String,
    ordinal: i32,
}

impl EnumValue {
    /// Create an enum constant.
    pub fn new(type_name: impl Into<String>, ordinal: i32) -> Self {
        Self { type_name: type_name.into(), ordinal }
    }

    /// Enum type name.
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Ordinal of the constant.
    #[must_use]
    pub const fn ordinal(&self) -> i32 {
        self.ordinal
    }
}

/// An array of enum constants of one declared type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumArray {
    type_name: String,
    items: Vec<Option<EnumValue>>,
}

impl EnumArray {
    /// Create an enum array.
    pub fn new(type_name: impl Into<String>, items: Vec<Option<EnumValue>>) -> Self {
        Self { type_name: type_name.into(), items }
    }

    /// Declared element type.
    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Elements; `None` is written as null.
    #[must_use]
    pub fn items(&self) -> &[Option<EnumValue>] {
        &self.items
    }
}

/// An enum constant whose type id is already resolved.
///
/// `type_name` must be present when the id is not registered cluster-wide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BinaryEnum {
    /// Resolved type id, or `0` for an unregistered type.
    pub type_id: i32,
    /// Type name written inline for unregistered types.
    pub type_name: Option<String>,
    /// Ordinal of the constant.
    pub ordinal: i32,
}

/// A dynamic proxy: the interfaces it implements and its invocation handler.
#[derive(Debug)]
pub struct ProxyValue {
    interfaces: Vec<String>,
    handler: Value,
}

impl ProxyValue {
    /// Create a proxy.
    pub fn new(interfaces: Vec<String>, handler: Value) -> Self {
        Self { interfaces, handler }
    }

    /// Implemented interface names.
    #[must_use]
    pub fn interfaces(&self) -> &[String] {
        &self.interfaces
    }

    /// Invocation handler.
    #[must_use]
    pub fn handler(&self) -> &Value {
        &self.handler
    }
}

const MILLIS_PER_DAY: i64 = 86_400_000;

/// A SQL time: milliseconds since the epoch.
///
/// A time of day converts to that time on 1970-01-01 UTC. Any other epoch
/// value, including a negative one, is kept as is so times produced elsewhere
/// are written back unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SqlTime(i64);

impl SqlTime {
    /// Wrap milliseconds since the epoch.
    #[must_use]
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Milliseconds since the epoch.
    #[must_use]
    pub const fn millis(self) -> i64 {
        self.0
    }

    /// Time of day in UTC.
    #[must_use]
    pub fn time_of_day(self) -> NaiveTime {
        let millis = self.0.rem_euclid(MILLIS_PER_DAY);
        // rem_euclid keeps the value inside one day.
        NaiveTime::from_num_seconds_from_midnight_opt(
            (millis / 1000) as u32,
            (millis % 1000) as u32 * 1_000_000,
        )
        .unwrap_or(NaiveTime::MIN)
    }
}

impl From<NaiveTime> for SqlTime {
    fn from(value: NaiveTime) -> Self {
        let millis = i64::from(value.num_seconds_from_midnight()) * 1000
            + i64::from(value.nanosecond() / 1_000_000);
        Self(millis)
    }
}

/// A binary object that was encoded earlier, possibly inside a larger buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedObject {
    bytes: Rc<[u8]>,
    start: usize,
}

impl EncodedObject {
    /// Wrap `bytes` with the object starting at `start`.
    pub fn new(bytes: impl Into<Rc<[u8]>>, start: usize) -> Self {
        Self { bytes: bytes.into(), start }
    }

    /// The whole backing buffer.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Offset of the object inside [`bytes`](Self::bytes).
    #[must_use]
    pub const fn start(&self) -> usize {
        self.start
    }
}

/// A user object with named fields and an optional raw section, defined at
/// runtime.
///
/// Fields sit behind a `RefCell` so that objects can be linked into cycles
/// after creation.
///
/// # Example
///
/// ```
/// use std::rc::Rc;
/// use gridwire_binary::{DynamicObject, Value};
///
/// let node = Rc::new(DynamicObject::new("Node"));
/// node.set_field("next", Value::object(Rc::clone(&node)));
/// assert_eq!(node.field_count(), 1);
/// # node.clear();
/// ```
pub struct DynamicObject {
    type_name: String,
    fields: RefCell<Vec<(String, Value)>>,
    raw: RefCell<Option<Vec<u8>>>,
}

impl DynamicObject {
    /// Create an object with no fields.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: RefCell::new(Vec::new()),
            raw: RefCell::new(None),
        }
    }

    /// Append a field (builder style).
    #[must_use]
    pub fn with_field(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.borrow_mut().push((name.into(), value.into()));
        self
    }

    /// Attach a raw section (builder style).
    #[must_use]
    pub fn with_raw(self, bytes: Vec<u8>) -> Self {
        *self.raw.borrow_mut() = Some(bytes);
        self
    }

    /// Set a field, replacing an earlier value with the same name.
    pub fn set_field(&self, name: &str, value: impl Into<Value>) {
        let value = value.into();
        let mut fields = self.fields.borrow_mut();
        match fields.iter_mut().find(|(existing, _)| existing == name) {
            Some((_, slot)) => *slot = value,
            None => fields.push((name.to_owned(), value)),
        }
    }

    /// Number of fields.
    #[must_use]
    pub fn field_count(&self) -> usize {
        self.fields.borrow().len()
    }

    /// Remove every field and the raw section, breaking reference cycles.
    pub fn clear(&self) {
        self.fields.borrow_mut().clear();
        self.raw.borrow_mut().take();
    }
}

impl fmt::Debug for DynamicObject {
    // Field values are not printed: they may lead back to this object.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields = self.fields.borrow();
        f.debug_struct("DynamicObject")
            .field("type_name", &self.type_name)
            .field("fields", &fields.iter().map(|(name, _)| name.as_str()).collect::<Vec<_>>())
            .field("raw_len", &self.raw.borrow().as_ref().map(Vec::len))
            .finish()
    }
}

impl BinaryType for DynamicObject {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn write_binary(&self, writer: &mut ObjectWriter<'_, '_>) -> Result<()> {
        for (name, value) in self.fields.borrow().iter() {
            writer.write_field(name, value)?;
        }
        if let Some(raw) = self.raw.borrow().as_deref() {
            writer.raw_writer().write_bytes(raw)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn set_field_replaces_by_name() {
        let obj = DynamicObject::new("T").with_field("a", 1).with_field("b", "x");
        obj.set_field("a", 2_i64);
        obj.set_field("c", true);
        assert_eq!(obj.field_count(), 3);
        assert!(matches!(obj.fields.borrow()[0].1, Value::Long(2)));
    }

    #[test]
    fn debug_does_not_follow_cycles() {
        let node = Rc::new(DynamicObject::new("Node"));
        node.set_field("next", Value::object(Rc::clone(&node)));
        let text = format!("{node:?}");
        assert!(text.contains("next"));
        node.clear();
        assert_eq!(Rc::strong_count(&node), 1);
    }

    #[test]
    fn options_become_null() {
        assert!(Value::from(None::<i32>).is_null());
        assert!(matches!(Value::from(Some("s")), Value::String(_)));
    }

    #[test]
    fn accessors() {
        let array = EnumArray::new("Color", vec![Some(EnumValue::new("Color", 2)), None]);
        assert_eq!(array.type_name(), "Color");
        assert_eq!(array.items()[0].as_ref().map(EnumValue::ordinal), Some(2));

        let proxy = ProxyValue::new(vec!["Greeter".into()], Value::Null);
        assert_eq!(proxy.interfaces(), ["Greeter".to_owned()]);
        assert!(proxy.handler().is_null());

        let encoded = EncodedObject::new(vec![1, 2, 3], 1);
        assert_eq!(encoded.bytes(), &[1, 2, 3]);
        assert_eq!(encoded.start(), 1);
    }

    #[test]
    fn sql_time_from_time_of_day() {
        let noon = NaiveTime::from_hms_milli_opt(12, 0, 0, 250).unwrap();
        let time = SqlTime::from(noon);
        assert_eq!(time.millis(), 43_200_250);
        assert_eq!(time.time_of_day(), noon);
        assert!(matches!(Value::from(noon), Value::Time(t) if t == time));
    }

    #[test]
    fn sql_time_keeps_any_epoch_value() {
        let time = SqlTime::from_millis(-1);
        assert_eq!(time.millis(), -1);
        assert_eq!(time.time_of_day(), NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap());
    }
}
