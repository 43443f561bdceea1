// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Funcy - function registry and dynamic invocation
//!
//! Native functions are registered under string names and later invoked with
//! loosely-typed JSON arguments:
//!
//! - [`Registry`] maps names to type-erased [`Callable`]s and record types
//! - [`Engine`] resolves, checks arity, coerces arguments and classifies results
//! - [`coercion`] rebuilds declared types (including structs) from generic values
//! - [`wire`] holds the request/response shapes a transport speaks
//!
//! ```ignore
//! use std::sync::Arc;
//! use funcy_core::{Callable, Engine, Registry};
//!
//! let registry = Arc::new(Registry::new());
//! registry.register_function("math.Add", Callable::new(|a: i64, b: i64| a + b));
//!
//! let engine = Engine::new(registry);
//! let results = engine.invoke("math.Add", vec![1.into(), 2.into()])?;
//! ```

// Type-erased native functions
pub mod callable;

// Generic value to declared type conversion
pub mod coercion;

// Environment configuration
pub mod config;

// Invocation pipeline
pub mod engine;

pub mod error;

// Name -> function / record catalogue
pub mod registry;

// Runtime type descriptors
pub mod types;

// Request/response shapes
pub mod wire;

pub use callable::{CallFault, Callable, IntoCallable, IntoReturns, Partial, ReturnSlot, ReturnValues};
pub use coercion::{CoercionMode, CoercionOptions};
pub use config::{Config, ConfigError};
pub use engine::{Engine, FUNCTION_REQUEST};
pub use error::{InvokeError, Result};
pub use registry::{ModuleRegistration, Registry};
pub use types::{Bytes, FieldDesc, FloatKind, IntKind, RecordType, Reflect, TypeDesc};
pub use wire::{InvokeRequest, InvokeResponse};

// Re-exported so `inventory::submit!` works without a direct dependency
pub use inventory;
