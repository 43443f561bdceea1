// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Runner tests over in-memory IO.

use std::sync::Arc;

use funcy_cli::runner::run;
use funcy_core::{Callable, Engine, InvokeResponse, Registry};
use serde_json::json;

fn engine() -> Arc<Engine> {
    let registry = Arc::new(Registry::new());
    funcy_cli::mypackage::register(&registry);
    registry.register_function(
        "test.Sleep",
        Callable::new(|millis: u64| {
            std::thread::sleep(std::time::Duration::from_millis(millis));
            millis
        }),
    );
    registry.register_function(
        "test.Panic",
        Callable::new(|| -> i64 { panic!("boom") }),
    );
    Arc::new(Engine::new(registry))
}

async fn serve(input: &str, max_in_flight: usize) -> (usize, Vec<InvokeResponse>) {
    let mut output = Vec::new();
    let served = run(engine(), input.as_bytes(), &mut output, max_in_flight)
        .await
        .unwrap();
    let responses = String::from_utf8(output)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    (served, responses)
}

#[tokio::test]
async fn test_responses_follow_request_order() {
    let input = [
        json!({"type": "function", "func": "test.Sleep", "params": [50]}),
        json!({"type": "function", "func": "test.Sleep", "params": [0]}),
        json!({"func": "mypackage.Function1", "params": [""]}),
    ]
    .iter()
    .map(|v| v.to_string())
    .collect::<Vec<_>>()
    .join("\n");

    let (served, responses) = serve(&input, 4).await;

    assert_eq!(served, 3);
    assert_eq!(responses[0].results, vec![json!(50)]);
    assert_eq!(responses[1].results, vec![json!(0)]);
    assert_eq!(
        responses[2].error_message.as_deref(),
        Some("param cannot be empty")
    );
}

#[tokio::test]
async fn test_malformed_line_gets_error_response() {
    let input = "not json\n\n{\"func\": \"mypackage.Function2\", \"params\": [\"x\", 2]}\n";

    let (served, responses) = serve(input, 1).await;

    assert_eq!(served, 2);
    assert!(
        responses[0]
            .error_message
            .as_deref()
            .unwrap()
            .starts_with("invalid request:")
    );
    assert_eq!(
        responses[1].results,
        vec![json!({"Description": "x", "Value": 2})]
    );
}

#[tokio::test]
async fn test_panicking_function_does_not_stop_runner() {
    let input = "{\"func\": \"test.Panic\"}\n{\"func\": \"test.Sleep\", \"params\": [1]}\n";

    let (served, responses) = serve(input, 2).await;

    assert_eq!(served, 2);
    assert_eq!(
        responses[0].error_message.as_deref(),
        Some("function test.Panic panicked")
    );
    assert_eq!(responses[1].results, vec![json!(1)]);
}

#[tokio::test]
async fn test_wire_shape_of_written_lines() {
    let mut output = Vec::new();
    let input = "{\"func\": \"mypackage.Function1\", \"params\": [\"abc\"]}\n{\"type\": \"method\", \"func\": \"x\"}\n";
    run(engine(), input.as_bytes(), &mut output, 8).await.unwrap();

    let text = String::from_utf8(output).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        serde_json::from_str::<serde_json::Value>(lines[0]).unwrap(),
        json!({"result": ["YWJj", {"Description": "Example details", "Value": 42}]})
    );
    assert_eq!(
        serde_json::from_str::<serde_json::Value>(lines[1]).unwrap(),
        json!({"error": "unsupported request type: method"})
    );
}

#[tokio::test]
async fn test_empty_input() {
    let (served, responses) = serve("", 4).await;
    assert_eq!(served, 0);
    assert!(responses.is_empty());
}
