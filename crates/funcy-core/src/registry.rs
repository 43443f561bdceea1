// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Function and record type registry.
//!
//! One [`Registry`] is constructed by the process and shared (usually behind
//! an `Arc`) by everything that registers or invokes. Lookups take the read
//! side of a reader/writer lock, so concurrent invocations never block each
//! other; registrations take the write side. Entries are append-or-replace:
//! the last registration under a name wins.
//!
//! Modules can also register themselves statically, the way package
//! initialisers would, by submitting a [`ModuleRegistration`]:
//!
//! ```ignore
//! fn register(registry: &Registry) {
//!     registry.register_function("mypackage.Greet", Callable::new(greet));
//! }
//!
//! inventory::submit! {
//!     ModuleRegistration::new("mypackage", register)
//! }
//! ```
//!
//! The process then calls [`Registry::load_modules`] once before serving.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::callable::Callable;
use crate::error::{InvokeError, Result};
use crate::types::{Reflect, RecordType};

/// A module's registration hook, collected via inventory.
pub struct ModuleRegistration {
    /// Module name, for logging (e.g., "mypackage")
    pub module: &'static str,
    /// Registers the module's functions and types
    pub register: fn(&Registry),
}

impl ModuleRegistration {
    pub const fn new(module: &'static str, register: fn(&Registry)) -> Self {
        Self { module, register }
    }
}

// Register ModuleRegistration with inventory
inventory::collect!(ModuleRegistration);

/// Thread-safe name→callable and name→record type catalogue.
#[derive(Default)]
pub struct Registry {
    functions: RwLock<HashMap<String, Arc<Callable>>>,
    types: RwLock<HashMap<String, Arc<RecordType>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `callable` under `name`, replacing any previous entry.
    pub fn register_function(&self, name: impl Into<String>, callable: Callable) {
        let name = name.into();
        let previous = self
            .functions
            .write()
            .insert(name.clone(), Arc::new(callable));

        if previous.is_some() {
            warn!(function = %name, "Replaced registered function");
        } else {
            debug!(function = %name, "Registered function");
        }
    }

    /// Store a record descriptor under `name`, replacing any previous entry.
    pub fn register_type(&self, name: impl Into<String>, record: impl Into<Arc<RecordType>>) {
        let name = name.into();
        let previous = self.types.write().insert(name.clone(), record.into());

        if previous.is_some() {
            warn!(record = %name, "Replaced registered type");
        } else {
            debug!(record = %name, "Registered type");
        }
    }

    /// Register `T`'s record descriptor under the record's own name.
    ///
    /// Fails with [`InvokeError::InvalidArgument`] if `T` does not describe a
    /// record.
    pub fn register_record<T: Reflect>(&self) -> Result<()> {
        let desc = T::describe();
        let Some(record) = desc.as_record() else {
            return Err(InvokeError::InvalidArgument {
                message: format!("{} is not a struct type", desc),
            });
        };
        self.register_type(record.name().to_string(), Arc::clone(record));
        Ok(())
    }

    /// Look up a function by name.
    pub fn get_function(&self, name: &str) -> Result<Arc<Callable>> {
        self.functions
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| InvokeError::FunctionNotFound {
                name: name.to_string(),
            })
    }

    /// Look up a record type by name.
    pub fn get_type(&self, name: &str) -> Result<Arc<RecordType>> {
        self.types
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| InvokeError::TypeNotFound {
                name: name.to_string(),
            })
    }

    /// Registered function names, sorted.
    pub fn function_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.functions.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Registered type names, sorted.
    pub fn type_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.types.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Run every inventory-submitted [`ModuleRegistration`].
    ///
    /// Returns the number of modules loaded.
    pub fn load_modules(&self) -> usize {
        let mut loaded = 0;
        for module in inventory::iter::<ModuleRegistration> {
            debug!(module = module.module, "Loading module");
            (module.register)(self);
            loaded += 1;
        }
        info!(
            modules = loaded,
            functions = self.functions.read().len(),
            types = self.types.read().len(),
            "Modules loaded"
        );
        loaded
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("functions", &self.function_names())
            .field("types", &self.type_names())
            .finish()
    }
}
