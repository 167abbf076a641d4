//! Protocol walkthrough integration tests for jbind-core
//!
//! Each test replays one of the request/response exchanges from the
//! JSON-RPC 2.0 protocol document through the codec.

use jbind_core::{
    codec, CodeRange, Error, ErrorObject, HasId, HasMethodAndParams, HasResultOrError, IdValue,
    Named, RequestMessage, ResponseMessage, ResponseState, ViolationKind,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Subtract {
    minuend: i64,
    subtrahend: i64,
}

#[test]
fn test_positional_params_exchange() {
    let wire = json!({"jsonrpc": "2.0", "method": "subtract", "params": [42, 23], "id": 1});
    let request: RequestMessage<Vec<i64>> = codec::decode(wire.clone()).unwrap();

    assert_eq!(request.method(), "subtract");
    assert!(!request.is_notification());
    assert_eq!(codec::encode(&request).unwrap(), wire);

    let params = request.params().unwrap();
    let response = request.respond_ok(params[0] - params[1]).unwrap();
    assert_eq!(
        codec::encode(&response).unwrap(),
        json!({"jsonrpc": "2.0", "result": 19, "id": 1})
    );
}

#[test]
fn test_named_params_exchange() {
    let wire = json!({"jsonrpc": "2.0", "method": "subtract",
                      "params": {"subtrahend": 23, "minuend": 42}, "id": 3});
    let request: RequestMessage<Named<Subtract>> = codec::decode(wire).unwrap();

    let Named(params) = request.params().cloned().unwrap();
    assert_eq!(params, Subtract { minuend: 42, subtrahend: 23 });

    let response = request.respond_ok(params.minuend - params.subtrahend).unwrap();
    assert_eq!(response.id_as_long().unwrap(), Some(3));
}

#[test]
fn test_named_request_rejects_positional_params() {
    let wire = json!({"jsonrpc": "2.0", "method": "subtract", "params": [42, 23], "id": 1});
    let err = codec::decode::<RequestMessage<Named<Subtract>>>(wire).unwrap_err();

    assert!(err.is_shape_mismatch());
    assert!(err.as_validation().unwrap().has(ViolationKind::ShapeMismatch));

    // Only the params were wrong
    let error_object = ErrorObject::from(&err);
    assert_eq!(error_object.code, -32602);
}

#[test]
fn test_notifications() {
    let wire = json!({"jsonrpc": "2.0", "method": "update", "params": [1, 2, 3, 4, 5]});
    let update: RequestMessage<Vec<i64>> = codec::decode(wire.clone()).unwrap();
    assert!(update.is_notification());
    assert!(update.id().is_absent());
    assert_eq!(codec::encode(&update).unwrap(), wire);

    let foobar: RequestMessage<Vec<i64>> =
        codec::decode(json!({"jsonrpc": "2.0", "method": "foobar"})).unwrap();
    assert!(foobar.is_notification());
    assert!(foobar.params().is_none());
}

#[test]
fn test_non_existent_method() {
    let request: RequestMessage<Vec<i64>> =
        codec::decode(json!({"jsonrpc": "2.0", "method": "foobar", "id": "1"})).unwrap();

    let response: ResponseMessage<Value> = request
        .respond_err(ErrorObject::method_not_found(request.method()))
        .unwrap();

    assert_eq!(response.state(), ResponseState::Rejected);
    let encoded = codec::encode(&response).unwrap();
    assert_eq!(encoded["error"]["code"], json!(-32601));
    assert_eq!(encoded["id"], json!("1"));
}

#[test]
fn test_invalid_json_answers_with_null_id() {
    let text = r#"{"jsonrpc": "2.0", "method": "foobar, "params": "bar", "baz]"#;
    let err = codec::from_str::<RequestMessage<Vec<i64>>>(text).unwrap_err();
    assert!(matches!(err, Error::Parse(_)));

    let error_object = ErrorObject::from(&err);
    assert_eq!(error_object.code, -32700);
    assert_eq!(error_object.code_range(), CodeRange::Predefined);

    let response = ResponseMessage::<Value>::rejected(error_object, IdValue::Null).unwrap();
    assert!(response.id().is_null());
    assert_eq!(
        codec::encode(&response).unwrap(),
        json!({"jsonrpc": "2.0", "error": {"code": -32700, "message": "Parse error"}, "id": null})
    );
}

#[test]
fn test_decode_parse_error_response() {
    let wire = json!({"jsonrpc": "2.0", "error": {"code": -32700, "message": "Parse error"}, "id": null});
    let response = codec::decode_response::<Value>(wire.clone()).unwrap();

    let error = response.error().unwrap();
    assert_eq!(error.code, -32700);
    assert!(error.is_predefined_range());
    assert!(!response.has_result());

    // Explicit null, not omission
    assert!(response.id().is_null());
    assert!(!response.id().is_absent());
    assert_eq!(codec::encode(&response).unwrap(), wire);
}

#[test]
fn test_invalid_request_object() {
    let wire = json!({"jsonrpc": "2.0", "method": 1, "params": "bar"});
    let err = codec::decode::<RequestMessage<Vec<i64>>>(wire).unwrap_err();

    let report = err.as_validation().unwrap();
    assert!(report.has(ViolationKind::InvalidPayload));
    assert!(report.has(ViolationKind::ShapeMismatch));
    assert_eq!(ErrorObject::from(&err).code, -32600);
}

#[test]
fn test_mixed_batch() {
    let batch = json!([
        {"jsonrpc": "2.0", "method": "sum", "params": [1, 2, 4], "id": "1"},
        {"jsonrpc": "2.0", "method": "notify_hello", "params": [7]},
        {"jsonrpc": "2.0", "method": "subtract", "params": [42, 23], "id": "2"},
        {"foo": "boo"},
        {"jsonrpc": "2.0", "method": "foo.get", "params": {"name": "myself"}, "id": "5"},
        {"jsonrpc": "2.0", "method": "get_data", "id": "9"}
    ]);

    let decoded = codec::decode_batch::<RequestMessage<Vec<i64>>>(batch).unwrap();
    assert_eq!(decoded.len(), 6);

    // Answer every valid call, report every invalid item, skip notifications
    let mut responses: Vec<ResponseMessage<Value>> = Vec::new();
    for (index, item) in decoded.items().iter().enumerate() {
        match item {
            Ok(request) if request.is_notification() => {}
            Ok(request) => {
                let params = request.params().cloned().unwrap_or_default();
                let answer: i64 = match request.method() {
                    "subtract" => params[0] - params[1],
                    _ => params.iter().sum(),
                };
                responses.push(request.respond_ok(json!(answer)).unwrap());
            }
            Err(err) => {
                let id = if index == 4 { IdValue::from("5") } else { IdValue::Null };
                responses.push(ResponseMessage::rejected(ErrorObject::from(err), id).unwrap());
            }
        }
    }

    assert_eq!(responses.len(), 5);
    assert_eq!(
        responses.iter().filter(|r| r.has_error()).count(),
        2,
        "the object without a method and the by-name call are rejected"
    );

    let encoded = codec::encode_batch(&responses).unwrap();
    assert_eq!(encoded[0], json!({"jsonrpc": "2.0", "result": 7, "id": "1"}));
    assert_eq!(encoded[1], json!({"jsonrpc": "2.0", "result": 19, "id": "2"}));
    assert_eq!(encoded[2]["id"], Value::Null);
}

#[test]
fn test_all_notification_batch() {
    let batch = json!([
        {"jsonrpc": "2.0", "method": "notify_sum", "params": [1, 2, 4]},
        {"jsonrpc": "2.0", "method": "notify_hello", "params": [7]}
    ]);

    let decoded = codec::decode_batch::<RequestMessage<Vec<i64>>>(batch).unwrap();
    assert!(decoded.is_complete());
    let (requests, failures) = decoded.into_parts();
    assert!(failures.is_empty());
    assert!(requests.iter().all(|r| r.is_notification()));
}

#[test]
fn test_error_data_round_trip() {
    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Detail {
        field: String,
    }

    let wire = json!({"jsonrpc": "2.0",
                      "error": {"code": -32602, "message": "Invalid params", "data": {"field": "minuend"}},
                      "id": 1});
    let response = codec::decode_response::<i64>(wire).unwrap();

    let error = response.error_as::<Detail>().unwrap().unwrap();
    assert_eq!(error.data, Some(Detail { field: "minuend".into() }));
    assert!(error.is_predefined_range());
    assert!(!error.is_implementation_defined_server_range());
}
