// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! End-to-end invocation of the bundled package through inventory loading.

use std::sync::Arc;

use funcy_cli::mypackage::{Data, Details};
use funcy_core::{Engine, InvokeError, InvokeRequest, Registry};
use serde_json::json;

fn engine() -> Engine {
    let registry = Arc::new(Registry::new());
    assert!(registry.load_modules() >= 1);
    Engine::new(registry)
}

#[test]
fn test_empty_param_returns_error_and_no_results() {
    let response = engine().handle(InvokeRequest::new("mypackage.Function1", vec![json!("")]));
    assert_eq!(response.error_message.as_deref(), Some("param cannot be empty"));
    assert!(response.results.is_empty());
}

#[test]
fn test_bytes_and_details_returned() {
    let results = engine()
        .invoke("mypackage.Function1", vec![json!("abc")])
        .unwrap();
    assert_eq!(results.len(), 2);

    let bytes: funcy_core::Bytes = serde_json::from_value(results[0].clone()).unwrap();
    assert_eq!(&*bytes, b"abc");

    let details: Details = serde_json::from_value(results[1].clone()).unwrap();
    assert_eq!(
        details,
        Details {
            description: "Example details".to_string(),
            value: 42,
        }
    );
}

#[test]
fn test_struct_argument_with_zero_id() {
    let err = engine()
        .invoke("mypackage.Function3", vec![json!({"ID": 0, "Name": "x"})])
        .unwrap_err();
    assert!(err.is_business());
    assert_eq!(err.to_string(), "ID cannot be zero");
}

#[test]
fn test_unregistered_function() {
    let err = engine().invoke("nope.Function", vec![]).unwrap_err();
    assert!(err.is_not_found());
    assert!(err.to_string().contains("nope.Function"));
}

#[test]
fn test_missing_argument() {
    let err = engine()
        .invoke("mypackage.Function2", vec![json!("x")])
        .unwrap_err();
    assert_eq!(
        err,
        InvokeError::ArityMismatch {
            function: "mypackage.Function2".to_string(),
            expected: 2,
            actual: 1,
        }
    );
}

#[test]
fn test_function2_accepts_integral_float() {
    let results = engine()
        .invoke("mypackage.Function2", vec![json!("x"), json!(3.0)])
        .unwrap();
    assert_eq!(results, vec![json!({"Description": "x", "Value": 3})]);
}

#[test]
fn test_function4_mixes_strings_and_struct() {
    let results = engine()
        .invoke(
            "mypackage.Function4",
            vec![json!("foo"), json!("bar"), json!({"Name": "n", "ID": 9})],
        )
        .unwrap();
    assert_eq!(
        results,
        vec![json!("foobar"), json!({"Description": "n", "Value": 9})]
    );
}

#[test]
fn test_missing_struct_fields_default_to_zero() {
    let err = engine()
        .invoke("mypackage.Function3", vec![json!({"Name": "x"})])
        .unwrap_err();
    assert_eq!(err.to_string(), "ID cannot be zero");
}

#[test]
fn test_unknown_struct_field_rejected() {
    let err = engine()
        .invoke("mypackage.Function3", vec![json!({"ID": 1, "Nmae": "x"})])
        .unwrap_err();
    assert_eq!(
        err,
        InvokeError::UnknownField {
            record: "mypackage.Data".to_string(),
            field: "Nmae".to_string(),
        }
    );
}

#[test]
fn test_struct_field_names_are_case_sensitive() {
    let err = engine()
        .invoke("mypackage.Function3", vec![json!({"id": 1})])
        .unwrap_err();
    assert!(matches!(err, InvokeError::UnknownField { .. }));
}

#[test]
fn test_build_registered_record() {
    let value = engine()
        .build_record("mypackage.Data", json!({"ID": 5}))
        .unwrap();
    let data: Data = serde_json::from_value(value).unwrap();
    assert_eq!(
        data,
        Data {
            id: 5,
            name: String::new(),
        }
    );
}
