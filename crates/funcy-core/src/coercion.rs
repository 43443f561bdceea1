// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Type coercion from generic JSON arguments to declared parameter types.
//!
//! Coercion produces the canonical JSON shape of the declared type, which the
//! callable's trampoline then deserializes into the native Rust type.
//!
//! # Strict conversions
//!
//! | From | To | Example |
//! |------|-----|---------|
//! | Number | integer kinds | `42`, `42.0` → `42` (must be integral and in range) |
//! | Number | f32/f64 | `1.5` → `1.5` |
//! | String | bytes | `"abc"` → `[97, 98, 99]` |
//! | Array | list / bytes | element-wise |
//! | Null | option | `null` |
//! | Map | record | struct reconstruction |
//! | anything | any | unchanged |
//!
//! # Lenient conversions
//!
//! Only tried when the strict rule fails.
//!
//! | From | To | Example |
//! |------|-----|---------|
//! | String | floats | `"1840"` → `1840.0` |
//! | String | integer kinds | `"42"` → `42` |
//! | String | bool | `"true"`, `"1"`, `"yes"` → `true` |
//! | Number | String | `42` → `"42"` |
//! | Bool | String | `true` → `"true"` |
//! | Number | bool | `1` → `true`, `0` → `false` |

use std::str::FromStr;

use serde_json::{Map, Number, Value};

use crate::error::{InvokeError, Result};
use crate::types::{FloatKind, IntKind, RecordType, TypeDesc, value_type_name};

/// How permissive primitive conversions are.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CoercionMode {
    /// Representational conversions only.
    #[default]
    Strict,
    /// Strict conversions plus string/number/bool reinterpretation.
    Lenient,
}

impl CoercionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CoercionMode::Strict => "strict",
            CoercionMode::Lenient => "lenient",
        }
    }
}

impl FromStr for CoercionMode {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "strict" => Ok(CoercionMode::Strict),
            "lenient" => Ok(CoercionMode::Lenient),
            _ => Err(()),
        }
    }
}

/// Options shared by every coercion of one engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoercionOptions {
    pub mode: CoercionMode,
    /// Maximum record nesting for struct reconstruction.
    pub max_depth: usize,
}

impl Default for CoercionOptions {
    fn default() -> Self {
        Self {
            mode: CoercionMode::Strict,
            max_depth: 32,
        }
    }
}

/// Why a single conversion failed.
enum Failure {
    /// No conversion between the two types; the caller knows the context.
    Mismatch { from: String, to: String },
    /// A nested reconstruction failed with its own, already precise error.
    Nested(InvokeError),
}

/// Records currently being reconstructed, innermost first. Resolves
/// [`TypeDesc::RecordRef`] back-references.
struct Scope<'a> {
    record: &'a RecordType,
    parent: Option<&'a Scope<'a>>,
}

impl Scope<'_> {
    fn resolve(&self, name: &str) -> Option<&RecordType> {
        if self.record.name() == name {
            Some(self.record)
        } else {
            self.parent.and_then(|parent| parent.resolve(name))
        }
    }
}

impl Failure {
    fn mismatch(value: &Value, to: &TypeDesc) -> Self {
        Failure::Mismatch {
            from: value_type_name(value).to_string(),
            to: to.to_string(),
        }
    }
}

/// Coerce the argument at `position` (1-based) to its declared type.
///
/// A record parameter only accepts a map; anything else is an
/// [`InvokeError::InvalidArgument`].
pub fn coerce_argument(
    position: usize,
    value: Value,
    ty: &TypeDesc,
    options: &CoercionOptions,
) -> Result<Value> {
    if let TypeDesc::Record(record) = ty {
        return match value {
            Value::Object(map) => reconstruct(record, map, options, 1, None),
            other => Err(InvokeError::InvalidArgument {
                message: format!(
                    "parameter {} expects a map for struct {}, got {}",
                    position,
                    record.name(),
                    value_type_name(&other)
                ),
            }),
        };
    }

    convert(value, ty, options, 0, None).map_err(|failure| match failure {
        Failure::Mismatch { from, to } => InvokeError::TypeConversion { position, from, to },
        Failure::Nested(err) => err,
    })
}

/// Rebuild a record from a field-name→value map.
///
/// Driven by the keys of `map`: every key must name a writable field of
/// `record`. Fields missing from the map get their zero value.
pub fn reconstruct_record(
    record: &RecordType,
    map: Map<String, Value>,
    options: &CoercionOptions,
) -> Result<Value> {
    reconstruct(record, map, options, 1, None)
}

fn reconstruct(
    record: &RecordType,
    map: Map<String, Value>,
    options: &CoercionOptions,
    depth: usize,
    parent: Option<&Scope<'_>>,
) -> Result<Value> {
    if depth > options.max_depth {
        return Err(InvokeError::InvalidArgument {
            message: format!(
                "struct {} nested deeper than {} levels",
                record.name(),
                options.max_depth
            ),
        });
    }

    let scope = Scope { record, parent };
    let mut out = record.zero_fields();

    for (key, value) in map {
        let Some(field) = record.find_field(&key) else {
            return Err(InvokeError::UnknownField {
                record: record.name().to_string(),
                field: key,
            });
        };

        if !field.writable {
            return Err(InvokeError::ImmutableField {
                record: record.name().to_string(),
                field: key,
            });
        }

        let coerced = convert(value, &field.ty, options, depth, Some(&scope)).map_err(|failure| match failure {
            Failure::Mismatch { from, to } => InvokeError::FieldTypeConversion {
                record: record.name().to_string(),
                field: key.clone(),
                from,
                to,
            },
            Failure::Nested(err) => err,
        })?;

        out.insert(key, coerced);
    }

    Ok(Value::Object(out))
}

fn convert(
    value: Value,
    ty: &TypeDesc,
    options: &CoercionOptions,
    depth: usize,
    scope: Option<&Scope<'_>>,
) -> std::result::Result<Value, Failure> {
    match (ty, value) {
        (TypeDesc::Any, value) => Ok(value),

        (TypeDesc::Optional(_), Value::Null) => Ok(Value::Null),
        (TypeDesc::Optional(inner), value) => convert(value, inner, options, depth, scope),

        (TypeDesc::Record(record), Value::Object(map)) => {
            reconstruct(record, map, options, depth + 1, scope).map_err(Failure::Nested)
        }

        (TypeDesc::RecordRef(name), Value::Object(map)) => {
            let Some(record) = scope.and_then(|scope| scope.resolve(name)) else {
                return Err(Failure::Nested(InvokeError::InvalidArgument {
                    message: format!("struct {} is not an enclosing struct", name),
                }));
            };
            reconstruct(record, map, options, depth + 1, scope).map_err(Failure::Nested)
        }

        (TypeDesc::List(inner), Value::Array(items)) => items
            .into_iter()
            .enumerate()
            .map(|(index, item)| {
                convert(item, inner, options, depth, scope).map_err(|failure| match failure {
                    Failure::Mismatch { from, to } => Failure::Mismatch {
                        from: format!("{} at index {}", from, index),
                        to: format!("{} in {}", to, ty),
                    },
                    nested => nested,
                })
            })
            .collect::<std::result::Result<Vec<_>, _>>()
            .map(Value::Array),

        (TypeDesc::Bytes, Value::String(s)) => Ok(Value::Array(
            s.into_bytes().into_iter().map(Value::from).collect(),
        )),
        (TypeDesc::Bytes, Value::Array(items)) => {
            let bytes: Option<Vec<Value>> = items
                .iter()
                .map(|item| match item {
                    Value::Number(n) => integral(n, IntKind::U8),
                    _ => None,
                })
                .collect();
            bytes
                .map(Value::Array)
                .ok_or_else(|| Failure::mismatch(&Value::Array(items), ty))
        }

        (TypeDesc::Int(kind), Value::Number(n)) => match integral(&n, *kind) {
            Some(coerced) => Ok(coerced),
            None => Err(Failure::Mismatch {
                from: format!("{} {}", value_type_name(&Value::Number(n.clone())), n),
                to: ty.to_string(),
            }),
        },

        (TypeDesc::Float(kind), Value::Number(n)) => match float(&n, *kind) {
            Some(coerced) => Ok(coerced),
            None => Err(Failure::mismatch(&Value::Number(n), ty)),
        },

        (TypeDesc::Bool, value @ Value::Bool(_)) => Ok(value),
        (TypeDesc::String, value @ Value::String(_)) => Ok(value),

        (ty, value) => match options.mode {
            CoercionMode::Lenient => lenient(value, ty),
            CoercionMode::Strict => Err(Failure::mismatch(&value, ty)),
        },
    }
}

/// Integral number within the range of `kind`. Floats are accepted only when
/// they have no fractional part.
fn integral(n: &Number, kind: IntKind) -> Option<Value> {
    let wide: i128 = if let Some(i) = n.as_i64() {
        i as i128
    } else if let Some(u) = n.as_u64() {
        u as i128
    } else {
        let f = n.as_f64()?;
        if !f.is_finite() || f.fract() != 0.0 {
            return None;
        }
        f as i128
    };

    let (min, max) = kind.bounds();
    if wide < min || wide > max {
        return None;
    }

    Some(if wide < 0 {
        Value::from(wide as i64)
    } else {
        Value::from(wide as u64)
    })
}

fn float(n: &Number, kind: FloatKind) -> Option<Value> {
    let f = n.as_f64()?;
    match kind {
        FloatKind::F64 => Number::from_f64(f).map(Value::Number),
        FloatKind::F32 if (f as f32).is_finite() => Number::from_f64(f).map(Value::Number),
        FloatKind::F32 => None,
    }
}

/// Reinterpretations allowed in lenient mode, applied after the strict rules
/// found no conversion.
fn lenient(value: Value, ty: &TypeDesc) -> std::result::Result<Value, Failure> {
    let coerced = match (ty, &value) {
        // String → floating point
        (TypeDesc::Float(kind), Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .and_then(|n| float(&n, *kind)),

        // String → integers
        (TypeDesc::Int(kind), Value::String(s)) => {
            let s = s.trim();
            s.parse::<i64>()
                .map(Number::from)
                .or_else(|_| s.parse::<u64>().map(Number::from))
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(Number::from_f64))
                .and_then(|n| integral(&n, *kind))
        }

        // Number / bool → String
        (TypeDesc::String, Value::Number(n)) => Some(Value::String(n.to_string())),
        (TypeDesc::String, Value::Bool(b)) => Some(Value::String(b.to_string())),

        // String → bool
        (TypeDesc::Bool, Value::String(s)) => {
            let s_lower = s.trim().to_lowercase();
            Some(Value::Bool(
                s_lower == "true" || s_lower == "1" || s_lower == "yes",
            ))
        }

        // Number → bool (non-zero = true)
        (TypeDesc::Bool, Value::Number(n)) => {
            let is_true = n
                .as_i64()
                .map(|i| i != 0)
                .unwrap_or_else(|| n.as_f64().map(|f| f != 0.0).unwrap_or(false));
            Some(Value::Bool(is_true))
        }

        _ => None,
    };

    coerced.ok_or_else(|| Failure::mismatch(&value, ty))
}
