//! Property tests for the validation engine.

use method_controller_core::{Field, Rule, Schema, inspect, validate};
use method_controller_testing::properties;
use proptest::prelude::*;
use serde_json::{Value, json};

proptest! {
    /// A record missing every optional field satisfies the schema.
    #[test]
    fn absent_optional_fields_always_pass(schema in properties::optional_schema()) {
        let empty = json!({});
        prop_assert!(validate(&empty, &schema));
    }

    /// Keys the schema does not declare never change the verdict or the violations.
    #[test]
    fn unknown_keys_never_change_the_verdict(
        schema in properties::schema(),
        record in properties::json_record(),
        extras in properties::extra_fields(),
    ) {
        let plain = Value::Object(record.clone());
        let mut widened = record;
        widened.extend(extras);
        let widened = Value::Object(widened);

        prop_assert_eq!(validate(&plain, &schema), validate(&widened, &schema));
        prop_assert_eq!(inspect(&plain, &schema), inspect(&widened, &schema));
    }

    /// A boolean rule accepts booleans and nothing else.
    #[test]
    fn boolean_rule_accepts_exactly_booleans(value in properties::json_value()) {
        let schema = Schema::new().field("flag", Field::required(Rule::Boolean));
        let expected = value.is_boolean();
        let record = json!({ "flag": value });
        prop_assert_eq!(validate(&record, &schema), expected);
    }

    /// Only records can satisfy a schema, even an empty one.
    #[test]
    fn non_records_never_pass(value in properties::json_value(), schema in properties::schema()) {
        prop_assume!(!value.is_object());
        prop_assert!(!validate(&value, &schema));
        prop_assert!(!validate(&value, &Schema::new()));
    }

    /// The verdict is exactly "no violations".
    #[test]
    fn verdict_matches_inspection(schema in properties::schema(), record in properties::json_record()) {
        let value = Value::Object(record);
        prop_assert_eq!(validate(&value, &schema), inspect(&value, &schema).is_empty());
    }
}
