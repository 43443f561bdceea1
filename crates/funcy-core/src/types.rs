// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Runtime type descriptors for parameters, returns and records.
//!
//! A [`TypeDesc`] is the read-only ground truth the engine coerces against.
//! Descriptors are produced once per registration through the [`Reflect`]
//! trait (implemented here for primitives and containers, and for structs by
//! `#[derive(Record)]`).

use std::cell::RefCell;
use std::fmt;
use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::de::{self, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Integer widths a parameter can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntKind {
    I8,
    I16,
    I32,
    I64,
    Isize,
    U8,
    U16,
    U32,
    U64,
    Usize,
}

impl IntKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntKind::I8 => "i8",
            IntKind::I16 => "i16",
            IntKind::I32 => "i32",
            IntKind::I64 => "i64",
            IntKind::Isize => "isize",
            IntKind::U8 => "u8",
            IntKind::U16 => "u16",
            IntKind::U32 => "u32",
            IntKind::U64 => "u64",
            IntKind::Usize => "usize",
        }
    }

    /// Inclusive range of values representable by this kind.
    pub fn bounds(&self) -> (i128, i128) {
        match self {
            IntKind::I8 => (i8::MIN as i128, i8::MAX as i128),
            IntKind::I16 => (i16::MIN as i128, i16::MAX as i128),
            IntKind::I32 => (i32::MIN as i128, i32::MAX as i128),
            IntKind::I64 => (i64::MIN as i128, i64::MAX as i128),
            IntKind::Isize => (isize::MIN as i128, isize::MAX as i128),
            IntKind::U8 => (0, u8::MAX as i128),
            IntKind::U16 => (0, u16::MAX as i128),
            IntKind::U32 => (0, u32::MAX as i128),
            IntKind::U64 => (0, u64::MAX as i128),
            IntKind::Usize => (0, usize::MAX as i128),
        }
    }
}

/// Floating point widths a parameter can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FloatKind {
    F32,
    F64,
}

impl FloatKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FloatKind::F32 => "f32",
            FloatKind::F64 => "f64",
        }
    }
}

/// Declared type of a parameter, return slot or record field.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDesc {
    Bool,
    Int(IntKind),
    Float(FloatKind),
    String,
    /// Raw byte sequence ([`Bytes`]).
    Bytes,
    List(Box<TypeDesc>),
    /// Nullable value (`Option<T>`).
    Optional(Box<TypeDesc>),
    Record(Arc<RecordType>),
    /// Back-reference to an enclosing record of this name, produced for
    /// self-referential types. Resolved against the records being
    /// reconstructed.
    RecordRef(String),
    /// Untyped JSON, passed through unchanged.
    Any,
    /// Trailing error slot of a return list. Never a parameter type.
    Error,
}

impl TypeDesc {
    /// Zero value used for record fields missing from the input map.
    pub fn zero_value(&self) -> Value {
        match self {
            TypeDesc::Bool => Value::Bool(false),
            TypeDesc::Int(_) => Value::from(0),
            TypeDesc::Float(_) => Value::from(0.0),
            TypeDesc::String => Value::String(String::new()),
            TypeDesc::Bytes | TypeDesc::List(_) => Value::Array(Vec::new()),
            TypeDesc::Optional(_) | TypeDesc::RecordRef(_) | TypeDesc::Any | TypeDesc::Error => {
                Value::Null
            }
            TypeDesc::Record(record) => Value::Object(record.zero_fields()),
        }
    }

    /// The record descriptor, if this is a record type.
    pub fn as_record(&self) -> Option<&Arc<RecordType>> {
        match self {
            TypeDesc::Record(record) => Some(record),
            _ => None,
        }
    }
}

impl fmt::Display for TypeDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDesc::Bool => f.write_str("bool"),
            TypeDesc::Int(kind) => f.write_str(kind.as_str()),
            TypeDesc::Float(kind) => f.write_str(kind.as_str()),
            TypeDesc::String => f.write_str("string"),
            TypeDesc::Bytes => f.write_str("bytes"),
            TypeDesc::List(inner) => write!(f, "list<{}>", inner),
            TypeDesc::Optional(inner) => write!(f, "option<{}>", inner),
            TypeDesc::Record(record) => f.write_str(record.name()),
            TypeDesc::RecordRef(name) => f.write_str(name),
            TypeDesc::Any => f.write_str("any"),
            TypeDesc::Error => f.write_str("error"),
        }
    }
}

/// A named field of a record.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDesc {
    /// Name as it appears in the input map (the serde name).
    pub name: String,
    pub ty: TypeDesc,
    /// Whether input may set this field.
    pub writable: bool,
}

impl FieldDesc {
    pub fn new(name: impl Into<String>, ty: TypeDesc, writable: bool) -> Self {
        Self {
            name: name.into(),
            ty,
            writable,
        }
    }
}

/// Descriptor of a structured type: its name and ordered fields.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordType {
    name: String,
    fields: Vec<FieldDesc>,
}

impl RecordType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Add a writable field.
    pub fn field(self, name: impl Into<String>, ty: TypeDesc) -> Self {
        self.with_field(FieldDesc::new(name, ty, true))
    }

    /// Add a field that input cannot set.
    pub fn readonly_field(self, name: impl Into<String>, ty: TypeDesc) -> Self {
        self.with_field(FieldDesc::new(name, ty, false))
    }

    pub fn with_field(mut self, field: FieldDesc) -> Self {
        self.fields.push(field);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldDesc] {
        &self.fields
    }

    /// Find a field by exact (case-sensitive) name.
    pub fn find_field(&self, name: &str) -> Option<&FieldDesc> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Object holding the zero value of every writable field.
    ///
    /// Read-only fields are left out: they are not part of the input shape
    /// and the native type fills them itself.
    pub fn zero_fields(&self) -> Map<String, Value> {
        self.fields
            .iter()
            .filter(|f| f.writable)
            .map(|f| (f.name.clone(), f.ty.zero_value()))
            .collect()
    }
}

/// Types that can describe themselves as a [`TypeDesc`].
///
/// Implemented for primitives, `String`, [`Bytes`], `Vec<T>`, `Option<T>`,
/// `Box<T>` and `serde_json::Value`. Structs get it from `#[derive(Record)]`.
pub trait Reflect {
    fn describe() -> TypeDesc;
}

thread_local! {
    // Record names whose describe() is running on this thread
    static DESCRIBING: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

/// Describe a record named `name`, with fields added by `build`.
///
/// Used by `#[derive(Record)]`. If `name` is already being described further
/// up the stack (a self-referential type), returns [`TypeDesc::RecordRef`]
/// instead of recursing.
pub fn describe_record(name: &str, build: impl FnOnce(RecordType) -> RecordType) -> TypeDesc {
    let entered = DESCRIBING.with(|stack| {
        let mut stack = stack.borrow_mut();
        if stack.iter().any(|n| n == name) {
            false
        } else {
            stack.push(name.to_string());
            true
        }
    });
    if !entered {
        return TypeDesc::RecordRef(name.to_string());
    }

    struct Leave;
    impl Drop for Leave {
        fn drop(&mut self) {
            DESCRIBING.with(|stack| {
                stack.borrow_mut().pop();
            });
        }
    }
    let _leave = Leave;

    TypeDesc::Record(Arc::new(build(RecordType::new(name))))
}

macro_rules! impl_reflect {
    ($($ty:ty => $desc:expr),* $(,)?) => {
        $(
            impl Reflect for $ty {
                fn describe() -> TypeDesc {
                    $desc
                }
            }
        )*
    };
}

impl_reflect! {
    bool => TypeDesc::Bool,
    i8 => TypeDesc::Int(IntKind::I8),
    i16 => TypeDesc::Int(IntKind::I16),
    i32 => TypeDesc::Int(IntKind::I32),
    i64 => TypeDesc::Int(IntKind::I64),
    isize => TypeDesc::Int(IntKind::Isize),
    u8 => TypeDesc::Int(IntKind::U8),
    u16 => TypeDesc::Int(IntKind::U16),
    u32 => TypeDesc::Int(IntKind::U32),
    u64 => TypeDesc::Int(IntKind::U64),
    usize => TypeDesc::Int(IntKind::Usize),
    f32 => TypeDesc::Float(FloatKind::F32),
    f64 => TypeDesc::Float(FloatKind::F64),
    String => TypeDesc::String,
    Bytes => TypeDesc::Bytes,
    Value => TypeDesc::Any,
}

impl<T: Reflect> Reflect for Vec<T> {
    fn describe() -> TypeDesc {
        TypeDesc::List(Box::new(T::describe()))
    }
}

impl<T: Reflect> Reflect for Option<T> {
    fn describe() -> TypeDesc {
        TypeDesc::Optional(Box::new(T::describe()))
    }
}

impl<T: Reflect> Reflect for Box<T> {
    fn describe() -> TypeDesc {
        T::describe()
    }
}

/// Byte sequence parameter or result.
///
/// Coerced from a string (its UTF-8 bytes) or an array of small integers.
/// Serializes as a standard base64 string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Bytes(pub Vec<u8>);

impl Bytes {
    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }
}

impl std::ops::Deref for Bytes {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for Bytes {
    fn from(bytes: Vec<u8>) -> Self {
        Bytes(bytes)
    }
}

impl From<&str> for Bytes {
    fn from(s: &str) -> Self {
        Bytes(s.as_bytes().to_vec())
    }
}

impl Serialize for Bytes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(&self.0))
    }
}

impl<'de> Deserialize<'de> for Bytes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct BytesVisitor;

        impl<'de> Visitor<'de> for BytesVisitor {
            type Value = Bytes;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a byte array or a base64 string")
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Bytes, A::Error> {
                let mut bytes = Vec::with_capacity(seq.size_hint().unwrap_or(0));
                while let Some(byte) = seq.next_element::<u8>()? {
                    bytes.push(byte);
                }
                Ok(Bytes(bytes))
            }

            fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<Bytes, E> {
                Ok(Bytes(v.to_vec()))
            }

            fn visit_byte_buf<E: de::Error>(self, v: Vec<u8>) -> Result<Bytes, E> {
                Ok(Bytes(v))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Bytes, E> {
                STANDARD.decode(v).map(Bytes).map_err(E::custom)
            }
        }

        deserializer.deserialize_any(BytesVisitor)
    }
}

/// Type name of a generic value, for error messages.
pub fn value_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "map",
    }
}
