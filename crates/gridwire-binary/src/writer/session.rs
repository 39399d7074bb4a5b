//! State shared by every writer of one root write.

use std::fmt;
use std::rc::Rc;

use gridwire_core::protocol::{tags, UNREGISTERED_TYPE_ID};
use gridwire_core::{wire_len, BinaryError, Result, StringEncoding, TypeDescriptor, TypeRegistry};

use super::ObjectWriter;
use crate::encoding;
use crate::handles::{HandleTable, ObjectIdentity};
use crate::schema::SchemaTracker;
use crate::sink::OutputSink;
use crate::value::{
    BinaryEnum, Collection, EnumArray, EnumValue, MapValue, ObjectArray, ObjectRef, ProxyValue,
    Value,
};

/// One root write in progress.
///
/// Holds the sink, the schema tracker and the handle table for the duration
/// of the write. The handle table is created on the first handle check.
pub struct WriteSession<'a> {
    pub(crate) sink: &'a mut dyn OutputSink,
    pub(crate) schema: &'a mut SchemaTracker,
    pub(crate) registry: &'a dyn TypeRegistry,
    handles: Option<HandleTable>,
    // Handle identities are addresses; replacements must outlive the write.
    replacements: Vec<Value>,
    pub(crate) encoding: StringEncoding,
    pub(crate) compact_footer: bool,
    pub(crate) identity_hash: bool,
    fail_if_unregistered: bool,
}

impl<'a> WriteSession<'a> {
    /// Start a write into `sink` at its current position.
    pub fn new(
        sink: &'a mut dyn OutputSink,
        schema: &'a mut SchemaTracker,
        registry: &'a dyn TypeRegistry,
    ) -> Self {
        let config = registry.config();
        Self {
            sink,
            schema,
            registry,
            handles: None,
            replacements: Vec::new(),
            encoding: config.string_encoding,
            compact_footer: registry.compact_footer(),
            identity_hash: config.identity_hash,
            fail_if_unregistered: config.fail_if_unregistered,
        }
    }

    /// The output sink.
    pub fn sink(&mut self) -> &mut dyn OutputSink {
        &mut *self.sink
    }

    /// The registry types are resolved through.
    #[must_use]
    pub fn registry(&self) -> &'a dyn TypeRegistry {
        self.registry
    }

    /// Number of objects recorded for back-references so far.
    #[must_use]
    pub fn handle_count(&self) -> usize {
        self.handles.as_ref().map_or(0, HandleTable::len)
    }

    /// Write any value.
    ///
    /// # Errors
    ///
    /// Returns an error if a type cannot be resolved, a user type fails to
    /// write itself, or the sink cannot grow.
    pub fn write_value(&mut self, value: &Value) -> Result<()> {
        let sink = &mut *self.sink;
        match value {
            Value::Null => encoding::write_null(sink),
            Value::Byte(v) => encoding::write_byte(sink, *v),
            Value::Short(v) => encoding::write_short(sink, *v),
            Value::Int(v) => encoding::write_int(sink, *v),
            Value::Long(v) => encoding::write_long(sink, *v),
            Value::Float(v) => encoding::write_float(sink, *v),
            Value::Double(v) => encoding::write_double(sink, *v),
            Value::Char(v) => encoding::write_char(sink, *v),
            Value::Bool(v) => encoding::write_bool(sink, *v),
            Value::String(v) => encoding::write_str(sink, Some(v.as_str()), self.encoding),
            Value::Utf16(v) => encoding::write_utf16(sink, Some(v.as_slice()), self.encoding),
            Value::Uuid(v) => encoding::write_uuid(sink, Some(v)),
            Value::Date(v) => encoding::write_date(sink, Some(v)),
            Value::Timestamp(v) => encoding::write_timestamp(sink, Some(v)),
            Value::Time(v) => encoding::write_time(sink, Some(v)),
            Value::Decimal(v) => encoding::write_decimal(sink, Some(v)),

            Value::ByteArray(v) => encoding::write_byte_array(sink, Some(v.as_slice())),
            Value::ShortArray(v) => encoding::write_short_array(sink, Some(v.as_slice())),
            Value::IntArray(v) => encoding::write_int_array(sink, Some(v.as_slice())),
            Value::LongArray(v) => encoding::write_long_array(sink, Some(v.as_slice())),
            Value::FloatArray(v) => encoding::write_float_array(sink, Some(v.as_slice())),
            Value::DoubleArray(v) => encoding::write_double_array(sink, Some(v.as_slice())),
            Value::CharArray(v) => encoding::write_char_array(sink, Some(v.as_slice())),
            Value::BoolArray(v) => encoding::write_bool_array(sink, Some(v.as_slice())),
            Value::StringArray(v) => {
                encoding::write_string_array(sink, Some(v.as_slice()), self.encoding)
            }
            Value::UuidArray(v) => encoding::write_uuid_array(sink, Some(v.as_slice())),
            Value::DateArray(v) => encoding::write_date_array(sink, Some(v.as_slice())),
            Value::TimestampArray(v) => encoding::write_timestamp_array(sink, Some(v.as_slice())),
            Value::TimeArray(v) => encoding::write_time_array(sink, Some(v.as_slice())),
            Value::DecimalArray(v) => encoding::write_decimal_array(sink, Some(v.as_slice())),

            Value::Object(object) => self.write_object(object),
            Value::ObjectArray(array) => self.write_object_array(array),
            Value::Collection(collection) => self.write_collection(collection),
            Value::Map(map) => self.write_map(map),
            Value::Enum(value) => self.write_enum(value),
            Value::EnumArray(array) => self.write_enum_array(array),
            Value::BinaryEnum(value) => self.write_binary_enum(value),
            Value::Class(name) => self.write_class(name),
            Value::Proxy(proxy) => self.write_proxy(proxy),
            Value::Binary(encoded) => encoding::write_binary_object(sink, Some(encoded)),
        }
    }

    /// Write a value with a fresh handle table, so nothing inside it refers to
    /// objects written before it and nothing after it refers into it.
    ///
    /// # Errors
    ///
    /// Same as [`write_value`](Self::write_value).
    pub fn write_value_detached(&mut self, value: &Value) -> Result<()> {
        let outer = self.handles.take();
        let result = self.write_value(value);
        self.handles = outer;
        result
    }

    /// Write a user object as a full binary object, or as a back-reference if
    /// it was already written in this session.
    ///
    /// # Errors
    ///
    /// Same as [`write_value`](Self::write_value).
    pub fn write_object(&mut self, object: &ObjectRef) -> Result<()> {
        self.marshal(object, true)
    }

    fn marshal(&mut self, object: &ObjectRef, enable_replace: bool) -> Result<()> {
        let type_name = object.type_name();
        let resolved = self
            .registry
            .resolve(&TypeDescriptor::object(type_name), self.fail_if_unregistered)?;

        if enable_replace {
            if let Some(replacement) = object.write_replace() {
                let result = match &replacement {
                    Value::Object(replaced) => self.marshal(replaced, false),
                    other => self.write_value(other),
                };
                self.replacements.push(replacement);
                return result;
            }
        }

        if self.try_write_handle(ObjectIdentity::of(object))? {
            return Ok(());
        }

        let inline_name = (!resolved.registered).then_some(type_name);
        let mut writer = ObjectWriter::begin(self, resolved.type_id, inline_name)?;
        object.write_binary(&mut writer)?;
        writer.finish(resolved.user_type)?;
        Ok(())
    }

    /// Record the current position for `identity`, or write a back-reference
    /// if the identity was already written. Returns `true` when a
    /// back-reference was written.
    fn try_write_handle(&mut self, identity: ObjectIdentity) -> Result<bool> {
        let pos = self.sink.position();
        let Some(old) = self.handles.get_or_insert_with(HandleTable::new).put(identity, pos) else {
            return Ok(false);
        };
        let delta = wire_len(pos - old, "handle offset")?;
        self.sink.reserve(5)?;
        self.sink.unchecked_write_u8(tags::HANDLE);
        self.sink.unchecked_write_i32(delta);
        Ok(true)
    }

    /// Write a type id, or the unregistered id followed by the name.
    fn write_type_ref(
        &mut self,
        descriptor: TypeDescriptor<'_>,
        fail_if_unregistered: bool,
    ) -> Result<()> {
        let resolved = self.registry.resolve(&descriptor, fail_if_unregistered)?;
        if resolved.registered {
            self.sink.write_i32(resolved.type_id)?;
        } else {
            self.sink.write_i32(UNREGISTERED_TYPE_ID)?;
            encoding::write_str(&mut *self.sink, Some(descriptor.name), self.encoding)?;
        }
        Ok(())
    }

    fn write_object_array(&mut self, array: &Rc<ObjectArray>) -> Result<()> {
        if self.try_write_handle(ObjectIdentity::of(array))? {
            return Ok(());
        }
        self.sink.write_u8(tags::OBJ_ARR)?;
        let fail = self.fail_if_unregistered;
        self.write_type_ref(TypeDescriptor::object(array.component_type()), fail)?;
        self.sink.write_i32(wire_len(array.items().len(), "object array")?)?;
        for item in array.items() {
            self.write_value(item)?;
        }
        Ok(())
    }

    fn write_collection(&mut self, collection: &Rc<Collection>) -> Result<()> {
        if self.try_write_handle(ObjectIdentity::of(collection))? {
            return Ok(());
        }
        let size = wire_len(collection.items().len(), "collection")?;
        let kind = self.registry.collection_kind(collection.type_name());
        self.sink.reserve(6)?;
        self.sink.unchecked_write_u8(tags::COL);
        self.sink.unchecked_write_i32(size);
        self.sink.unchecked_write_u8(kind.as_byte());
        for item in collection.items() {
            self.write_value(item)?;
        }
        Ok(())
    }

    fn write_map(&mut self, map: &Rc<MapValue>) -> Result<()> {
        if self.try_write_handle(ObjectIdentity::of(map))? {
            return Ok(());
        }
        let size = wire_len(map.entries().len(), "map")?;
        let kind = self.registry.map_kind(map.type_name());
        self.sink.reserve(6)?;
        self.sink.unchecked_write_u8(tags::MAP);
        self.sink.unchecked_write_i32(size);
        self.sink.unchecked_write_u8(kind.as_byte());
        for (key, value) in map.entries() {
            self.write_value(key)?;
            self.write_value(value)?;
        }
        Ok(())
    }

    fn write_enum(&mut self, value: &EnumValue) -> Result<()> {
        self.sink.write_u8(tags::ENUM)?;
        let fail = self.fail_if_unregistered;
        self.write_type_ref(TypeDescriptor::enumeration(value.type_name()), fail)?;
        self.sink.write_i32(value.ordinal())?;
        Ok(())
    }

    fn write_enum_array(&mut self, array: &EnumArray) -> Result<()> {
        self.sink.write_u8(tags::ENUM_ARR)?;
        let fail = self.fail_if_unregistered;
        self.write_type_ref(TypeDescriptor::enumeration(array.type_name()), fail)?;
        self.sink.write_i32(wire_len(array.items().len(), "enum array")?)?;
        for item in array.items() {
            match item {
                Some(value) => self.write_enum(value)?,
                None => encoding::write_null(&mut *self.sink)?,
            }
        }
        Ok(())
    }

    fn write_binary_enum(&mut self, value: &BinaryEnum) -> Result<()> {
        self.sink.reserve(5)?;
        self.sink.unchecked_write_u8(tags::BINARY_ENUM);
        self.sink.unchecked_write_i32(value.type_id);
        if value.type_id == UNREGISTERED_TYPE_ID {
            let name = value
                .type_name
                .as_deref()
                .ok_or_else(|| BinaryError::unresolved_type("<unnamed binary enum>"))?;
            encoding::write_str(&mut *self.sink, Some(name), self.encoding)?;
        }
        self.sink.write_i32(value.ordinal)?;
        Ok(())
    }

    fn write_class(&mut self, name: &str) -> Result<()> {
        self.sink.write_u8(tags::CLASS)?;
        self.write_type_ref(TypeDescriptor::class(name), false)
    }

    fn write_proxy(&mut self, proxy: &ProxyValue) -> Result<()> {
        self.sink.reserve(5)?;
        self.sink.unchecked_write_u8(tags::PROXY);
        self.sink.unchecked_write_i32(wire_len(proxy.interfaces().len(), "proxy interfaces")?);
        for interface in proxy.interfaces() {
            let fail = self.fail_if_unregistered;
            self.write_type_ref(TypeDescriptor::proxy_interface(interface), fail)?;
        }
        self.write_value(proxy.handler())
    }
}

impl fmt::Debug for WriteSession<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriteSession")
            .field("position", &self.sink.position())
            .field("open_fields", &self.schema.len())
            .field("handles", &self.handle_count())
            .finish_non_exhaustive()
    }
}
