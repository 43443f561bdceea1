// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Type-erased callables built from ordinary Rust functions.
//!
//! A [`Callable`] pairs the declared parameter and return descriptors of a
//! function with a trampoline that takes already-coerced JSON arguments,
//! deserializes them into the native parameter types, calls the function and
//! encodes what it returned. The descriptors are captured once, when the
//! callable is built, so invocation never needs to inspect the function.
//!
//! # Return shapes
//!
//! | Function returns | Declared returns |
//! |------------------|------------------|
//! | `()` | none |
//! | `T` | `T` |
//! | `(A, B, ..)` | `A, B, ..` |
//! | `Result<V, E>` | the values of `V`, then `error` |
//! | `Partial<V, E>` | the values of `V`, then `error` |
//!
//! `E` only needs `Display`. An `Err` produces no values; a [`Partial`] keeps
//! its values next to the error.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::types::{Reflect, TypeDesc};

/// Failure of the call mechanism itself (not of the called function).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct CallFault(pub String);

/// One value produced by a call, in declared return order.
#[derive(Debug, Clone, PartialEq)]
pub enum ReturnSlot {
    Value(Value),
    /// An error-typed return; `None` means the function reported no error.
    Error(Option<String>),
}

impl ReturnSlot {
    /// Plain value view of the slot, used when an error slot is not trailing.
    pub fn into_value(self) -> Value {
        match self {
            ReturnSlot::Value(value) => value,
            ReturnSlot::Error(None) => Value::Null,
            ReturnSlot::Error(Some(message)) => Value::String(message),
        }
    }
}

type Trampoline = dyn Fn(Vec<Value>) -> Result<Vec<ReturnSlot>, CallFault> + Send + Sync;

/// A registered function value together with its declared signature.
#[derive(Clone)]
pub struct Callable {
    params: Vec<TypeDesc>,
    returns: Vec<TypeDesc>,
    call: Arc<Trampoline>,
}

impl Callable {
    /// Build a callable from a function or closure.
    ///
    /// ```ignore
    /// fn greet(name: String, times: u8) -> Result<String, String> { .. }
    ///
    /// registry.register_function("greet", Callable::new(greet));
    /// ```
    pub fn new<F, Args>(f: F) -> Self
    where
        F: IntoCallable<Args>,
    {
        f.into_callable()
    }

    /// Build a callable from explicit descriptors and a trampoline.
    pub fn from_parts<F>(params: Vec<TypeDesc>, returns: Vec<TypeDesc>, call: F) -> Self
    where
        F: Fn(Vec<Value>) -> Result<Vec<ReturnSlot>, CallFault> + Send + Sync + 'static,
    {
        Self {
            params,
            returns,
            call: Arc::new(call),
        }
    }

    pub fn params(&self) -> &[TypeDesc] {
        &self.params
    }

    pub fn returns(&self) -> &[TypeDesc] {
        &self.returns
    }

    /// Whether the last declared return is an error slot.
    pub fn has_error_return(&self) -> bool {
        matches!(self.returns.last(), Some(TypeDesc::Error))
    }

    /// Run the trampoline with coerced arguments.
    pub fn call(&self, args: Vec<Value>) -> Result<Vec<ReturnSlot>, CallFault> {
        (self.call)(args)
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callable")
            .field("params", &self.params)
            .field("returns", &self.returns)
            .field("call", &"<fn>")
            .finish()
    }
}

/// Values returned alongside an optional error.
///
/// Use this instead of `Result` when a function has meaningful output even
/// when it fails.
#[derive(Debug, Clone, PartialEq)]
pub struct Partial<T, E> {
    pub values: T,
    pub error: Option<E>,
}

impl<T, E> Partial<T, E> {
    pub fn ok(values: T) -> Self {
        Self {
            values,
            error: None,
        }
    }

    pub fn failed(values: T, error: E) -> Self {
        Self {
            values,
            error: Some(error),
        }
    }
}

/// The non-error part of a return list.
pub trait ReturnValues {
    fn describe_values() -> Vec<TypeDesc>;

    fn into_values(self) -> Result<Vec<Value>, CallFault>;
}

/// Everything a registered function may return.
pub trait IntoReturns {
    fn describe_returns() -> Vec<TypeDesc>;

    fn into_returns(self) -> Result<Vec<ReturnSlot>, CallFault>;
}

fn encode<T: Serialize>(value: &T) -> Result<Value, CallFault> {
    serde_json::to_value(value).map_err(|e| CallFault(format!("cannot encode result: {}", e)))
}

impl ReturnValues for () {
    fn describe_values() -> Vec<TypeDesc> {
        Vec::new()
    }

    fn into_values(self) -> Result<Vec<Value>, CallFault> {
        Ok(Vec::new())
    }
}

impl<T: Reflect + Serialize> ReturnValues for T {
    fn describe_values() -> Vec<TypeDesc> {
        vec![T::describe()]
    }

    fn into_values(self) -> Result<Vec<Value>, CallFault> {
        Ok(vec![encode(&self)?])
    }
}

macro_rules! impl_return_values_tuple {
    ($($ty:ident),+) => {
        impl<$($ty: Reflect + Serialize),+> ReturnValues for ($($ty,)+) {
            fn describe_values() -> Vec<TypeDesc> {
                vec![$(<$ty as Reflect>::describe()),+]
            }

            #[allow(non_snake_case)]
            fn into_values(self) -> Result<Vec<Value>, CallFault> {
                let ($($ty,)+) = self;
                Ok(vec![$(encode(&$ty)?),+])
            }
        }
    };
}

impl_return_values_tuple!(A, B);
impl_return_values_tuple!(A, B, C);
impl_return_values_tuple!(A, B, C, D);
impl_return_values_tuple!(A, B, C, D, E);

impl<T: ReturnValues> IntoReturns for T {
    fn describe_returns() -> Vec<TypeDesc> {
        T::describe_values()
    }

    fn into_returns(self) -> Result<Vec<ReturnSlot>, CallFault> {
        Ok(self.into_values()?.into_iter().map(ReturnSlot::Value).collect())
    }
}

impl<T: ReturnValues, E: fmt::Display> IntoReturns for Result<T, E> {
    fn describe_returns() -> Vec<TypeDesc> {
        let mut returns = T::describe_values();
        returns.push(TypeDesc::Error);
        returns
    }

    fn into_returns(self) -> Result<Vec<ReturnSlot>, CallFault> {
        match self {
            Ok(values) => {
                let mut slots: Vec<ReturnSlot> = values
                    .into_values()?
                    .into_iter()
                    .map(ReturnSlot::Value)
                    .collect();
                slots.push(ReturnSlot::Error(None));
                Ok(slots)
            }
            Err(e) => Ok(vec![ReturnSlot::Error(Some(e.to_string()))]),
        }
    }
}

impl<T: ReturnValues, E: fmt::Display> IntoReturns for Partial<T, E> {
    fn describe_returns() -> Vec<TypeDesc> {
        let mut returns = T::describe_values();
        returns.push(TypeDesc::Error);
        returns
    }

    fn into_returns(self) -> Result<Vec<ReturnSlot>, CallFault> {
        let mut slots: Vec<ReturnSlot> = self
            .values
            .into_values()?
            .into_iter()
            .map(ReturnSlot::Value)
            .collect();
        slots.push(ReturnSlot::Error(self.error.map(|e| e.to_string())));
        Ok(slots)
    }
}

/// Functions that can be turned into a [`Callable`].
///
/// Implemented for `Fn` items and closures of up to six arguments whose
/// parameters are `Reflect + DeserializeOwned` and whose return type is
/// [`IntoReturns`]. `Args` is the parameter tuple and only disambiguates
/// the impls.
pub trait IntoCallable<Args>: Send + Sync + 'static {
    fn into_callable(self) -> Callable;
}

macro_rules! impl_into_callable {
    ($($arg:ident),*) => {
        impl<F, R, $($arg,)*> IntoCallable<($($arg,)*)> for F
        where
            F: Fn($($arg),*) -> R + Send + Sync + 'static,
            R: IntoReturns,
            $($arg: Reflect + DeserializeOwned,)*
        {
            #[allow(non_snake_case, unused_mut, unused_variables)]
            fn into_callable(self) -> Callable {
                let params = vec![$(<$arg as Reflect>::describe()),*];
                let arity = params.len();

                Callable::from_parts(params, R::describe_returns(), move |args: Vec<Value>| {
                    if args.len() != arity {
                        return Err(CallFault(format!(
                            "expected {} argument(s), got {}",
                            arity,
                            args.len()
                        )));
                    }

                    let mut args = args.into_iter().enumerate();
                    $(
                        let $arg: $arg = match args.next() {
                            Some((index, value)) => serde_json::from_value(value).map_err(|e| {
                                CallFault(format!("argument {}: {}", index + 1, e))
                            })?,
                            None => return Err(CallFault("argument list exhausted".to_string())),
                        };
                    )*

                    (self)($($arg),*).into_returns()
                })
            }
        }
    };
}

impl_into_callable!();
impl_into_callable!(A1);
impl_into_callable!(A1, A2);
impl_into_callable!(A1, A2, A3);
impl_into_callable!(A1, A2, A3, A4);
impl_into_callable!(A1, A2, A3, A4, A5);
impl_into_callable!(A1, A2, A3, A4, A5, A6);
