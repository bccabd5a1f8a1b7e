//! Property tests for search params coercion and validation.
//!
//! These tests check coercion invariants and the adapter's end-to-end
//! behaviour over generated queries.

use query_schema::{
    coerce, use_search_params, CoercedValue, FieldType, ObjectSchema, SearchParams,
    ValidationError,
};
use proptest::prelude::*;
use serde_json::{json, Value};

// Strategy: plain words that can never parse as JSON (no digits, quotes,
// brackets, or the letters of true/false/null)
fn arb_word() -> impl Strategy<Value = String> {
    prop::string::string_regex("[g-km]{1,12}").unwrap()
}

// Strategy: key names
fn arb_key() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z_]{1,8}").unwrap()
}

// Strategy: a raw value of any flavour, including non-JSON
fn arb_raw() -> impl Strategy<Value = String> {
    prop_oneof![
        any::<i64>().prop_map(|n| n.to_string()),
        any::<bool>().prop_map(|b| b.to_string()),
        Just("null".to_string()),
        arb_word(),
        prop::string::string_regex("[ -~]{0,16}").unwrap(),
    ]
}

fn basic() -> ObjectSchema {
    ObjectSchema::new()
        .field("string", FieldType::String)
        .field("number", FieldType::Number)
        .field("boolean", FieldType::Boolean)
}

proptest! {
    /// Property: single-valued params round-trip through a matching schema
    #[test]
    fn proptest_single_values_round_trip(
        word in arb_word(),
        number in any::<i64>(),
        flag in any::<bool>()
    ) {
        let schema = use_search_params(basic());
        let params = SearchParams::from([
            ("string", word.clone()),
            ("number", number.to_string()),
            ("boolean", flag.to_string()),
        ]);

        let output = schema.parse(&params).expect("matching types should validate");
        prop_assert_eq!(
            Value::Object(output),
            json!({ "string": word, "number": number, "boolean": flag })
        );
    }

    /// Property: repeated keys coerce to element-wise coercions, in order
    #[test]
    fn proptest_repeated_values_keep_order(
        key in arb_key(),
        raws in prop::collection::vec(arb_raw(), 2..6)
    ) {
        let params: SearchParams = raws.iter().map(|raw| (key.clone(), raw.clone())).collect();
        let mapping = coerce(&params, None);

        let expected: Vec<CoercedValue> = raws.iter().map(|raw| CoercedValue::parse(raw)).collect();
        prop_assert_eq!(mapping.get(&key), Some(&CoercedValue::Many(expected)));
    }

    /// Property: a single raw value is never wrapped in a sequence
    #[test]
    fn proptest_single_value_is_unwrapped(key in arb_key(), raw in arb_raw()) {
        let params = SearchParams::from([(key.clone(), raw.clone())]);
        let mapping = coerce(&params, None);

        let value = mapping.get(&key).expect("key is present");
        prop_assert!(!matches!(value, CoercedValue::Many(_)));
        prop_assert_eq!(value, &CoercedValue::parse(&raw));
    }

    /// Property: coercion is pure and never fails
    #[test]
    fn proptest_coerce_is_deterministic(
        pairs in prop::collection::vec((arb_key(), arb_raw()), 0..10),
        fixed in prop::option::of(prop::collection::vec(arb_key(), 0..5))
    ) {
        let params: SearchParams = pairs.into_iter().collect();
        let before = params.clone();

        let first = coerce(&params, fixed.as_deref());
        let second = coerce(&params, fixed.as_deref());

        prop_assert_eq!(&first, &second);
        prop_assert_eq!(params, before);
    }

    /// Property: without fixed keys, the mapping's keys are the params' distinct keys
    #[test]
    fn proptest_keys_follow_container(
        pairs in prop::collection::vec((arb_key(), arb_raw()), 0..10)
    ) {
        let params: SearchParams = pairs.into_iter().collect();
        let mapping = coerce(&params, None);

        let expected: Vec<&str> = params.keys().collect();
        let actual: Vec<&str> = mapping.keys().collect();
        prop_assert_eq!(actual, expected);
    }

    /// Property: under strip, the mapping's keys are exactly the declared fields
    #[test]
    fn proptest_strip_keys_follow_schema(
        pairs in prop::collection::vec((arb_key(), arb_raw()), 0..10)
    ) {
        let schema = use_search_params(basic());
        let params: SearchParams = pairs.into_iter().collect();
        let mapping = schema.coerce(&params);

        let actual: Vec<&str> = mapping.keys().collect();
        prop_assert_eq!(actual, vec!["string", "number", "boolean"]);
    }

    /// Property: non-JSON strings pass through unchanged
    #[test]
    fn proptest_non_json_passes_through(word in arb_word()) {
        prop_assert_eq!(CoercedValue::parse(&word), CoercedValue::String(word.clone()));
    }

    /// Property: anything other than SearchParams is a type mismatch
    #[test]
    fn proptest_plain_maps_are_type_mismatches(
        map in prop::collection::hash_map(arb_key(), arb_raw(), 0..6)
    ) {
        let schema = use_search_params(basic().passthrough());
        let result = schema.safe_parse(&map);
        prop_assert!(matches!(result, Err(ValidationError::TypeMismatch { .. })), "expected TypeMismatch, got {:?}", result);
    }

    /// Property: query strings survive encoding and decoding
    #[test]
    fn proptest_display_then_parse_is_identity(
        pairs in prop::collection::vec((arb_key(), arb_raw()), 0..10)
    ) {
        let params: SearchParams = pairs.into_iter().collect();
        prop_assert_eq!(SearchParams::parse(&params.to_string()), params);
    }
}
