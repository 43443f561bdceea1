// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Sample package registered at startup.
//!
//! Functions are exposed as `mypackage.Function1` .. `mypackage.Function4`
//! and the record types as `mypackage.Details` / `mypackage.Data`.

use funcy_core::{Bytes, Callable, ModuleRegistration, Registry};
use funcy_macros::Record;
use serde::{Deserialize, Serialize};
use tracing::error;

pub const MODULE: &str = "mypackage";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Record)]
#[record(name = "mypackage.Details")]
pub struct Details {
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "Value")]
    pub value: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Record)]
#[record(name = "mypackage.Data")]
pub struct Data {
    #[serde(rename = "ID")]
    pub id: i64,
    #[serde(rename = "Name")]
    pub name: String,
}

#[derive(Debug, thiserror::Error)]
pub enum MyPackageError {
    #[error("param cannot be empty")]
    EmptyParam,
    #[error("params cannot be empty")]
    EmptyParams,
    #[error("num must be greater than zero")]
    NonPositiveNum,
    #[error("ID cannot be zero")]
    ZeroId,
}

pub fn function1(param: String) -> Result<(Bytes, Details), MyPackageError> {
    if param.is_empty() {
        return Err(MyPackageError::EmptyParam);
    }
    Ok((
        Bytes::from(param.as_str()),
        Details {
            description: "Example details".to_string(),
            value: 42,
        },
    ))
}

pub fn function2(param: String, num: i64) -> Result<Details, MyPackageError> {
    if num <= 0 {
        return Err(MyPackageError::NonPositiveNum);
    }
    Ok(Details {
        description: param,
        value: num,
    })
}

pub fn function3(data: Data) -> Result<Details, MyPackageError> {
    if data.id == 0 {
        return Err(MyPackageError::ZeroId);
    }
    Ok(Details {
        description: data.name,
        value: data.id,
    })
}

pub fn function4(
    param1: String,
    param2: String,
    data: Data,
) -> Result<(String, Details), MyPackageError> {
    if param1.is_empty() || param2.is_empty() {
        return Err(MyPackageError::EmptyParams);
    }
    Ok((
        param1 + &param2,
        Details {
            description: data.name,
            value: data.id,
        },
    ))
}

/// Register this package's functions and types.
pub fn register(registry: &Registry) {
    registry.register_function("mypackage.Function1", Callable::new(function1));
    registry.register_function("mypackage.Function2", Callable::new(function2));
    registry.register_function("mypackage.Function3", Callable::new(function3));
    registry.register_function("mypackage.Function4", Callable::new(function4));

    for result in [
        registry.register_record::<Details>(),
        registry.register_record::<Data>(),
    ] {
        if let Err(e) = result {
            error!(module = MODULE, error = %e, "Failed to register record type");
        }
    }
}

inventory::submit! {
    ModuleRegistration::new(MODULE, register)
}
