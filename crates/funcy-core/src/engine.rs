// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Dynamic invocation engine.
//!
//! Turns a (name, generic arguments) request into a call against a registered
//! [`Callable`](crate::Callable):
//!
//! 1. resolve the name in the [`Registry`],
//! 2. check the argument count against the declared parameters,
//! 3. coerce every argument to its declared type,
//! 4. run the trampoline,
//! 5. split a trailing error return off the results.
//!
//! The engine is synchronous and holds the registry lock only for the lookup.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, debug_span, warn};

use crate::callable::ReturnSlot;
use crate::coercion::{CoercionOptions, coerce_argument, reconstruct_record};
use crate::error::{InvokeError, Result};
use crate::registry::Registry;
use crate::wire::{InvokeRequest, InvokeResponse};

/// Request type accepted by [`Engine::handle`].
pub const FUNCTION_REQUEST: &str = "function";

/// Invokes registered functions by name.
#[derive(Debug, Clone)]
pub struct Engine {
    registry: Arc<Registry>,
    options: CoercionOptions,
}

impl Engine {
    pub fn new(registry: Arc<Registry>) -> Self {
        Self::with_options(registry, CoercionOptions::default())
    }

    pub fn with_options(registry: Arc<Registry>, options: CoercionOptions) -> Self {
        Self { registry, options }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn options(&self) -> &CoercionOptions {
        &self.options
    }

    /// Invoke `name` with positional generic arguments.
    ///
    /// On success returns the function's results with any trailing
    /// error slot removed. A non-empty trailing error comes back as
    /// [`InvokeError::Business`], holding the values that preceded it.
    pub fn invoke(&self, name: &str, args: Vec<Value>) -> Result<Vec<Value>> {
        let callable = self.registry.get_function(name)?;

        let params = callable.params();
        if args.len() != params.len() {
            return Err(InvokeError::ArityMismatch {
                function: name.to_string(),
                expected: params.len(),
                actual: args.len(),
            });
        }

        let inputs = args
            .into_iter()
            .zip(params)
            .enumerate()
            .map(|(index, (value, ty))| coerce_argument(index + 1, value, ty, &self.options))
            .collect::<Result<Vec<_>>>()?;

        let slots = callable
            .call(inputs)
            .map_err(|fault| InvokeError::Invocation {
                function: name.to_string(),
                reason: fault.to_string(),
            })?;

        classify(name, slots)
    }

    /// Build a registered record type from a generic map.
    pub fn build_record(&self, type_name: &str, value: Value) -> Result<Value> {
        let record = self.registry.get_type(type_name)?;
        match value {
            Value::Object(map) => reconstruct_record(&record, map, &self.options),
            other => Err(InvokeError::InvalidArgument {
                message: format!(
                    "struct {} must be built from a map, got {}",
                    record.name(),
                    crate::types::value_type_name(&other)
                ),
            }),
        }
    }

    /// Serve one wire request. Exactly one of results or error is populated.
    pub fn handle(&self, request: InvokeRequest) -> InvokeResponse {
        let span = debug_span!("invoke", function = %request.function_name);
        let _enter = span.enter();

        if let Some(kind) = request.kind.as_deref()
            && kind != FUNCTION_REQUEST
        {
            return InvokeResponse::failure(&InvokeError::UnsupportedRequest {
                kind: kind.to_string(),
            });
        }

        debug!(arguments = request.arguments.len(), "Invoking function");

        match self.invoke(&request.function_name, request.arguments) {
            Ok(results) => {
                debug!(results = results.len(), "Function returned");
                InvokeResponse::success(results)
            }
            Err(e) if e.is_business() => {
                debug!(error = %e, "Function reported an error");
                InvokeResponse::failure(&e)
            }
            Err(e) => {
                warn!(code = e.error_code(), error = %e, "Invocation failed");
                InvokeResponse::failure(&e)
            }
        }
    }
}

/// Split a trailing error slot off the returned values.
fn classify(function: &str, mut slots: Vec<ReturnSlot>) -> Result<Vec<Value>> {
    let trailing = match slots.last() {
        Some(ReturnSlot::Error(_)) => slots.pop(),
        _ => None,
    };

    let values: Vec<Value> = slots.into_iter().map(ReturnSlot::into_value).collect();

    match trailing {
        Some(ReturnSlot::Error(Some(message))) => Err(InvokeError::Business {
            function: function.to_string(),
            message,
            partial: values,
        }),
        _ => Ok(values),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callable::{Callable, Partial};
    use crate::coercion::CoercionMode;
    use crate::types::{Bytes, Reflect, RecordType, TypeDesc};
    use serde::{Deserialize, Serialize};
    use serde_json::json;
    use std::result::Result;

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    struct Details {
        #[serde(rename = "Description")]
        description: String,
        #[serde(rename = "Value")]
        value: i64,
    }

    impl Reflect for Details {
        fn describe() -> TypeDesc {
            TypeDesc::Record(Arc::new(
                RecordType::new("Details")
                    .field("Description", String::describe())
                    .field("Value", i64::describe()),
            ))
        }
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    struct Data {
        #[serde(rename = "ID")]
        id: i64,
        #[serde(rename = "Name")]
        name: String,
    }

    impl Reflect for Data {
        fn describe() -> TypeDesc {
            TypeDesc::Record(Arc::new(
                RecordType::new("Data")
                    .field("ID", i64::describe())
                    .field("Name", String::describe()),
            ))
        }
    }

    fn describe_param(param: String) -> Result<(Bytes, Details), String> {
        if param.is_empty() {
            return Err("param cannot be empty".to_string());
        }
        Ok((
            Bytes::from(param.as_str()),
            Details {
                description: "Example details".to_string(),
                value: 42,
            },
        ))
    }

    fn check_data(data: Data) -> Result<Details, String> {
        if data.id == 0 {
            return Err("ID cannot be zero".to_string());
        }
        Ok(Details {
            description: data.name,
            value: data.id,
        })
    }

    fn engine() -> Engine {
        let registry = Arc::new(Registry::new());
        registry.register_function("test.Describe", Callable::new(describe_param));
        registry.register_function("test.Check", Callable::new(check_data));
        registry.register_function("test.Add", Callable::new(|a: i32, b: i32| a + b));
        registry.register_record::<Data>().unwrap();
        Engine::new(registry)
    }

    #[test]
    fn test_empty_param_reports_business_error() {
        let err = engine().invoke("test.Describe", vec![json!("")]).unwrap_err();
        assert_eq!(err.to_string(), "param cannot be empty");
        match err {
            InvokeError::Business { partial, .. } => assert!(partial.is_empty()),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_results_strip_empty_error_slot() {
        let results = engine().invoke("test.Describe", vec![json!("abc")]).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0], json!("YWJj"));
        assert_eq!(results[1], json!({"Description": "Example details", "Value": 42}));
    }

    #[test]
    fn test_record_argument_business_error() {
        let err = engine()
            .invoke("test.Check", vec![json!({"ID": 0, "Name": "x"})])
            .unwrap_err();
        assert_eq!(err.to_string(), "ID cannot be zero");
    }

    #[test]
    fn test_record_argument_success() {
        let results = engine()
            .invoke("test.Check", vec![json!({"ID": 3, "Name": "x"})])
            .unwrap();
        assert_eq!(results, vec![json!({"Description": "x", "Value": 3})]);
    }

    #[test]
    fn test_missing_function() {
        let err = engine().invoke("nope.Function", vec![]).unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("nope.Function"));
    }

    #[test]
    fn test_arity_mismatch() {
        let err = engine().invoke("test.Add", vec![json!(1)]).unwrap_err();
        assert_eq!(
            err,
            InvokeError::ArityMismatch {
                function: "test.Add".to_string(),
                expected: 2,
                actual: 1,
            }
        );
    }

    #[test]
    fn test_type_conversion_names_position() {
        let err = engine()
            .invoke("test.Add", vec![json!(1), json!("2")])
            .unwrap_err();
        assert_eq!(err.to_string(), "cannot convert parameter 2 from string to i32");
    }

    #[test]
    fn test_lenient_engine_accepts_numeric_strings() {
        let strict = engine();
        let lenient = Engine::with_options(
            Arc::clone(strict.registry()),
            CoercionOptions {
                mode: CoercionMode::Lenient,
                ..CoercionOptions::default()
            },
        );
        let results = lenient.invoke("test.Add", vec![json!("1"), json!(2)]).unwrap();
        assert_eq!(results, vec![json!(3)]);
    }

    #[test]
    fn test_non_map_for_record_parameter() {
        let err = engine().invoke("test.Check", vec![json!(5)]).unwrap_err();
        assert!(matches!(err, InvokeError::InvalidArgument { .. }));
    }

    #[test]
    fn test_partial_values_returned_with_error() {
        let engine = engine();
        engine.registry().register_function(
            "test.Count",
            Callable::new(|items: Vec<String>| {
                if items.is_empty() {
                    Partial::failed((0usize, String::new()), "no items")
                } else {
                    Partial::ok((items.len(), items.join(",")))
                }
            }),
        );

        let err = engine.invoke("test.Count", vec![json!([])]).unwrap_err();
        match err {
            InvokeError::Business { message, partial, .. } => {
                assert_eq!(message, "no items");
                assert_eq!(partial, vec![json!(0), json!("")]);
            }
            other => panic!("unexpected error: {:?}", other),
        }

        let ok = engine.invoke("test.Count", vec![json!(["a", "b"])]).unwrap();
        assert_eq!(ok, vec![json!(2), json!("a,b")]);
    }

    #[test]
    fn test_reregistration_changes_behavior() {
        let engine = engine();
        engine
            .registry()
            .register_function("test.Add", Callable::new(|a: i32, b: i32| a * b));
        let results = engine.invoke("test.Add", vec![json!(3), json!(4)]).unwrap();
        assert_eq!(results, vec![json!(12)]);
    }

    #[test]
    fn test_trampoline_fault_is_invocation_error() {
        let engine = engine();
        engine.registry().register_function(
            "test.Liar",
            Callable::from_parts(vec![TypeDesc::Any], vec![TypeDesc::Bool], |args| {
                Callable::new(|flag: bool| flag).call(args)
            }),
        );
        let err = engine.invoke("test.Liar", vec![json!("yes")]).unwrap_err();
        assert!(matches!(err, InvokeError::Invocation { .. }));
    }

    #[test]
    fn test_build_record_from_registered_type() {
        let value = engine().build_record("Data", json!({"Name": "x"})).unwrap();
        assert_eq!(value, json!({"ID": 0, "Name": "x"}));

        let err = engine().build_record("Missing", json!({})).unwrap_err();
        assert_eq!(err.to_string(), "type Missing not found");

        let err = engine().build_record("Data", json!([1])).unwrap_err();
        assert!(matches!(err, InvokeError::InvalidArgument { .. }));
    }

    #[test]
    fn test_handle_success_and_failure() {
        let engine = engine();

        let ok = engine.handle(InvokeRequest::new("test.Add", vec![json!(1), json!(2)]));
        assert_eq!(ok.results, vec![json!(3)]);
        assert!(ok.error_message.is_none());

        let failed = engine.handle(InvokeRequest::new("test.Describe", vec![json!("")]));
        assert!(failed.results.is_empty());
        assert_eq!(failed.error_message.as_deref(), Some("param cannot be empty"));
    }

    #[test]
    fn test_handle_rejects_other_request_types() {
        let mut request = InvokeRequest::new("test.Add", vec![json!(1), json!(2)]);
        request.kind = Some("method".to_string());
        let response = engine().handle(request);
        assert_eq!(
            response.error_message.as_deref(),
            Some("unsupported request type: method")
        );
    }

    #[test]
    fn test_classify_keeps_non_trailing_error_slots_as_values() {
        let slots = vec![
            ReturnSlot::Error(Some("inner".to_string())),
            ReturnSlot::Value(json!(1)),
        ];
        assert_eq!(classify("f", slots).unwrap(), vec![json!("inner"), json!(1)]);
    }
}
