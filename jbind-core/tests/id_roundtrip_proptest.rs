//! Property-based tests for identifier fidelity and response exclusivity.
//!
//! Uses `proptest` to generate ids of every representation, including
//! integers far beyond 64 bits, and checks that they survive decoding and
//! encoding unchanged.

use jbind_core::{
    codec, ErrorObject, HasId, HasResultOrError, IdNumber, IdValue, RequestMessage,
    ResponseMessage, ViolationKind,
};
use proptest::prelude::*;
use serde_json::{json, Value};

type Sum = RequestMessage<Vec<i64>>;

// ─────────────────────────────────────────────────────────────────────────────
// Strategies
// ─────────────────────────────────────────────────────────────────────────────

/// Canonical integer literals with 20 to 60 digits.
fn arb_big_literal() -> impl Strategy<Value = String> {
    "-?[1-9][0-9]{19,59}"
}

/// Any text id, including ones that look like numbers.
fn arb_text_id() -> impl Strategy<Value = String> {
    prop_oneof!["\\PC{0,24}", "-?[0-9]{1,30}"]
}

/// A present error object with an arbitrary code.
fn arb_error() -> impl Strategy<Value = Value> {
    (any::<i32>(), "[a-zA-Z ]{0,20}")
        .prop_map(|(code, message)| json!({"code": code, "message": message}))
}

// ─────────────────────────────────────────────────────────────────────────────
// Properties
// ─────────────────────────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn test_i64_id_round_trip(id in any::<i64>()) {
        let wire = json!({"jsonrpc": "2.0", "method": "sum", "params": [1], "id": id});
        let request: Sum = codec::decode(wire.clone()).unwrap();

        prop_assert_eq!(request.id_as_long().unwrap(), Some(id));
        prop_assert_eq!(codec::encode(&request).unwrap(), wire);
    }

    #[test]
    fn test_u64_id_round_trip(id in any::<u64>()) {
        let wire = json!({"jsonrpc": "2.0", "method": "sum", "id": id});
        let request: Sum = codec::decode(wire.clone()).unwrap();

        let number = request.id().as_integer().unwrap().unwrap();
        prop_assert_eq!(number.to_u64().unwrap(), id);
        prop_assert_eq!(codec::encode(&request).unwrap(), wire);
    }

    #[test]
    fn test_big_integer_id_keeps_every_digit(literal in arb_big_literal()) {
        let text = format!(r#"{{"jsonrpc":"2.0","method":"sum","id":{}}}"#, literal);
        let request: Sum = codec::from_str(&text).unwrap();

        prop_assert_eq!(request.id(), &IdValue::Integer(IdNumber::parse(&literal).unwrap()));
        prop_assert!(request.id_as_long().is_err());

        let encoded = codec::to_string(&request).unwrap();
        let expected = format!("\"id\":{}", literal);
        prop_assert!(encoded.contains(&expected));
    }

    #[test]
    fn test_text_id_round_trip(id in arb_text_id()) {
        let wire = json!({"jsonrpc": "2.0", "method": "sum", "id": id.clone()});
        let request: Sum = codec::decode(wire.clone()).unwrap();

        // A string id stays a string, even when it spells a number
        prop_assert_eq!(request.id(), &IdValue::Text(id.clone()));
        prop_assert_eq!(request.id_as_string(), Some(id));
        prop_assert_eq!(codec::encode(&request).unwrap(), wire);
    }

    #[test]
    fn test_canonical_literals_parse(n in any::<i64>()) {
        let literal = n.to_string();
        let parsed = IdNumber::parse(&literal).unwrap();
        prop_assert_eq!(parsed.as_str(), literal.as_str());

        // Leading zeros are never canonical
        let padded = if n < 0 { format!("-0{}", n.unsigned_abs()) } else { format!("0{}", n) };
        prop_assert!(IdNumber::parse(&padded).is_err());
    }

    #[test]
    fn test_response_with_both_members_is_rejected(result in any::<i64>(), error in arb_error()) {
        let wire = json!({"jsonrpc": "2.0", "result": result, "error": error, "id": 1});
        let err = codec::decode_response::<i64>(wire).unwrap_err();
        prop_assert!(err.as_validation().unwrap().has(ViolationKind::Exclusivity));
    }

    #[test]
    fn test_response_with_one_member_is_accepted(result in any::<i64>(), error in arb_error()) {
        let resolved = json!({"jsonrpc": "2.0", "result": result, "id": 1});
        let response = codec::decode_response::<i64>(resolved).unwrap();
        prop_assert!(response.is_result_and_error_exclusive());
        prop_assert_eq!(response.result(), Some(&result));

        let rejected = json!({"jsonrpc": "2.0", "error": error, "id": 1});
        let response = codec::decode_response::<i64>(rejected).unwrap();
        prop_assert!(response.is_result_and_error_exclusive());
        prop_assert!(response.has_error() && !response.has_result());
    }

    #[test]
    fn test_resolved_response_needs_real_id(result in any::<i64>()) {
        prop_assert!(ResponseMessage::<i64>::resolved(result, IdValue::Null).is_err());
        prop_assert!(ResponseMessage::<i64>::resolved(result, IdValue::Absent).is_err());

        let rejected = ResponseMessage::<i64>::rejected(ErrorObject::internal_error("x"), IdValue::Null);
        prop_assert!(rejected.is_ok());
    }
}
