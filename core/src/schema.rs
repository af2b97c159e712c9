//! Declarative validator schema.
//!
//! A [`Schema`] maps field names to [`Field`]s. Each field says whether it is
//! required and which [`Rule`] its value must satisfy. Rules form a closed sum
//! type, so the validation engine matches on them exhaustively instead of
//! reading a type tag at runtime.
//!
//! ```
//! use method_controller_core::schema::{ArrayRule, Field, NumberRule, Schema, StringRule};
//!
//! let schema = Schema::new()
//!     .field("name", Field::required(StringRule::new().with_min_length(2).with_max_length(4)))
//!     .field("age", Field::optional(NumberRule::new().integer().or_more(1.0)))
//!     .field(
//!         "tags",
//!         Field::optional(ArrayRule::new().with_min_length(1).of_primitive(StringRule::new())),
//!     );
//!
//! assert_eq!(schema.len(), 3);
//! ```

use regex::Regex;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A mapping from field name to the field's validator.
///
/// Fields present in the validated value but absent from the schema are not
/// checked: the schema is a whitelist of checked fields, not a shape lock.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: BTreeMap<String, Field>,
}

impl Schema {
    /// Create an empty schema. An empty schema accepts any record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a field, replacing any previous declaration with the same name.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, field: Field) -> Self {
        self.fields.insert(name.into(), field);
        self
    }

    /// Look up a declared field.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    /// Iterate over declared fields.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Field)> {
        self.fields.iter().map(|(name, field)| (name.as_str(), field))
    }

    /// Number of declared fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns `true` if no field is declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Field)> for Schema {
    fn from_iter<I: IntoIterator<Item = (K, Field)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// One schema node: presence requirement plus the rule for the value.
#[derive(Debug, Clone)]
pub struct Field {
    /// Whether the field must be present.
    pub required: bool,
    /// Rule applied when the field is present.
    pub rule: Rule,
}

impl Field {
    /// A field that must be present and satisfy `rule`.
    #[must_use]
    pub fn required(rule: impl Into<Rule>) -> Self {
        Self {
            required: true,
            rule: rule.into(),
        }
    }

    /// A field that, when present, must satisfy `rule`.
    #[must_use]
    pub fn optional(rule: impl Into<Rule>) -> Self {
        Self {
            required: false,
            rule: rule.into(),
        }
    }
}

/// The rule a present value must satisfy.
#[derive(Debug, Clone)]
pub enum Rule {
    /// A string, optionally matched against a pattern and bounded in length.
    String(StringRule),
    /// A number with optional integer and range constraints.
    Number(NumberRule),
    /// Any boolean.
    Boolean,
    /// One of a fixed list of literals.
    Enum(EnumRule),
    /// A non-array record, optionally checked against a nested schema.
    Object(ObjectRule),
    /// A sequence with optional length bounds and per-element rule.
    Array(ArrayRule),
    /// An arbitrary predicate over the raw value.
    Custom(CustomRule),
}

impl Rule {
    /// Name of the rule kind, used in violation reports.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::String(_) => "string",
            Self::Number(_) => "number",
            Self::Boolean => "boolean",
            Self::Enum(_) => "enum",
            Self::Object(_) => "object",
            Self::Array(_) => "array",
            Self::Custom(_) => "custom",
        }
    }
}

/// Constraints on a string value.
///
/// Lengths count Unicode scalar values and are inclusive. The pattern is a
/// search, not a full match; anchor it with `^…$` to constrain the whole string.
#[derive(Debug, Clone, Default)]
pub struct StringRule {
    /// Pattern the string must contain a match for.
    pub pattern: Option<Regex>,
    /// Minimum length.
    pub min_length: Option<usize>,
    /// Maximum length.
    pub max_length: Option<usize>,
}

impl StringRule {
    /// Any string.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Require a match for `pattern`.
    #[must_use]
    pub fn with_pattern(mut self, pattern: Regex) -> Self {
        self.pattern = Some(pattern);
        self
    }

    /// Compile `pattern` and require a match for it.
    ///
    /// # Errors
    ///
    /// Returns the compile error if `pattern` is not a valid regular expression.
    pub fn try_with_pattern(self, pattern: &str) -> Result<Self, regex::Error> {
        Ok(self.with_pattern(Regex::new(pattern)?))
    }

    /// Set the minimum length.
    #[must_use]
    pub fn with_min_length(mut self, min: usize) -> Self {
        self.min_length = Some(min);
        self
    }

    /// Set the maximum length.
    #[must_use]
    pub fn with_max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }
}

/// Constraints on a numeric value. Every set bound must hold.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NumberRule {
    /// Reject values with a fractional part.
    pub integer: bool,
    /// Value must be `<=` this bound.
    pub or_lower: Option<f64>,
    /// Value must be `>=` this bound.
    pub or_more: Option<f64>,
    /// Value must be `<` this bound.
    pub less_than: Option<f64>,
    /// Value must be `>` this bound.
    pub more_than: Option<f64>,
}

impl NumberRule {
    /// Any number.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            integer: false,
            or_lower: None,
            or_more: None,
            less_than: None,
            more_than: None,
        }
    }

    /// Only accept integral values.
    #[must_use]
    pub const fn integer(mut self) -> Self {
        self.integer = true;
        self
    }

    /// Inclusive upper bound.
    #[must_use]
    pub const fn or_lower(mut self, bound: f64) -> Self {
        self.or_lower = Some(bound);
        self
    }

    /// Inclusive lower bound.
    #[must_use]
    pub const fn or_more(mut self, bound: f64) -> Self {
        self.or_more = Some(bound);
        self
    }

    /// Exclusive upper bound.
    #[must_use]
    pub const fn less_than(mut self, bound: f64) -> Self {
        self.less_than = Some(bound);
        self
    }

    /// Exclusive lower bound.
    #[must_use]
    pub const fn more_than(mut self, bound: f64) -> Self {
        self.more_than = Some(bound);
        self
    }
}

/// A literal an enum rule admits.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// String literal, compared by exact equality.
    String(String),
    /// Integer literal, compared exactly against integral values.
    Integer(i64),
    /// Numeric literal, compared as `f64`.
    Number(f64),
}

impl Literal {
    /// Returns `true` if `value` equals this literal.
    #[must_use]
    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (Self::String(expected), Value::String(actual)) => expected == actual,
            // Only a float-encoded value (e.g. `2.0`) falls back to `f64`.
            #[allow(clippy::float_cmp, clippy::cast_precision_loss)]
            (Self::Integer(expected), Value::Number(actual)) => match actual.as_i64() {
                Some(actual) => actual == *expected,
                None => actual.is_f64() && actual.as_f64() == Some(*expected as f64),
            },
            #[allow(clippy::float_cmp)]
            (Self::Number(expected), Value::Number(actual)) => {
                actual.as_f64().is_some_and(|actual| actual == *expected)
            }
            _ => false,
        }
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Literal {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for Literal {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for Literal {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

/// Membership in a fixed, ordered list of literals.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnumRule {
    /// Admitted literals.
    pub list: Vec<Literal>,
}

impl EnumRule {
    /// Admit exactly the given literals.
    #[must_use]
    pub fn new<I, L>(list: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<Literal>,
    {
        Self {
            list: list.into_iter().map(Into::into).collect(),
        }
    }
}

/// A non-array record, optionally checked field by field.
#[derive(Debug, Clone, Default)]
pub struct ObjectRule {
    /// Nested schema applied to the record.
    pub validator: Option<Schema>,
}

impl ObjectRule {
    /// Any record.
    #[must_use]
    pub fn any() -> Self {
        Self::default()
    }

    /// A record satisfying `schema`.
    #[must_use]
    pub const fn with_schema(schema: Schema) -> Self {
        Self {
            validator: Some(schema),
        }
    }
}

/// Leaf rule applied to every element of an array.
#[derive(Debug, Clone)]
pub enum PrimitiveRule {
    /// Every element is a string satisfying the rule.
    String(StringRule),
    /// Every element is a number satisfying the rule.
    Number(NumberRule),
    /// Every element is a boolean.
    Boolean,
    /// Every element satisfies the predicate.
    Custom(CustomRule),
}

/// What the elements of an array are checked against.
///
/// Primitive and object element rules are mutually exclusive.
#[derive(Debug, Clone)]
pub enum ArrayItems {
    /// Leaf rule per element.
    Primitive(PrimitiveRule),
    /// Nested schema per element; each element must be a record.
    Object(Schema),
}

/// A sequence with optional inclusive length bounds.
#[derive(Debug, Clone, Default)]
pub struct ArrayRule {
    /// Minimum element count.
    pub min_length: Option<usize>,
    /// Maximum element count.
    pub max_length: Option<usize>,
    /// Per-element rule.
    pub items: Option<ArrayItems>,
}

impl ArrayRule {
    /// Any array.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the minimum element count.
    #[must_use]
    pub const fn with_min_length(mut self, min: usize) -> Self {
        self.min_length = Some(min);
        self
    }

    /// Set the maximum element count.
    #[must_use]
    pub const fn with_max_length(mut self, max: usize) -> Self {
        self.max_length = Some(max);
        self
    }

    /// Check every element against a leaf rule. Replaces any element rule set before.
    #[must_use]
    pub fn of_primitive(mut self, rule: impl Into<PrimitiveRule>) -> Self {
        self.items = Some(ArrayItems::Primitive(rule.into()));
        self
    }

    /// Check every element against a nested schema. Replaces any element rule set before.
    #[must_use]
    pub fn of_objects(mut self, schema: Schema) -> Self {
        self.items = Some(ArrayItems::Object(schema));
        self
    }
}

type Predicate = dyn Fn(&Value) -> bool + Send + Sync;

/// A caller-supplied predicate that owns all semantics of the value.
#[derive(Clone)]
pub struct CustomRule {
    predicate: Arc<Predicate>,
}

impl CustomRule {
    /// Wrap a predicate.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Arc::new(predicate),
        }
    }

    /// Evaluate the predicate.
    #[must_use]
    pub fn check(&self, value: &Value) -> bool {
        (self.predicate)(value)
    }
}

impl fmt::Debug for CustomRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CustomRule(<predicate>)")
    }
}

impl From<StringRule> for Rule {
    fn from(rule: StringRule) -> Self {
        Self::String(rule)
    }
}

impl From<NumberRule> for Rule {
    fn from(rule: NumberRule) -> Self {
        Self::Number(rule)
    }
}

impl From<EnumRule> for Rule {
    fn from(rule: EnumRule) -> Self {
        Self::Enum(rule)
    }
}

impl From<ObjectRule> for Rule {
    fn from(rule: ObjectRule) -> Self {
        Self::Object(rule)
    }
}

impl From<ArrayRule> for Rule {
    fn from(rule: ArrayRule) -> Self {
        Self::Array(rule)
    }
}

impl From<CustomRule> for Rule {
    fn from(rule: CustomRule) -> Self {
        Self::Custom(rule)
    }
}

impl From<PrimitiveRule> for Rule {
    fn from(rule: PrimitiveRule) -> Self {
        match rule {
            PrimitiveRule::String(rule) => Self::String(rule),
            PrimitiveRule::Number(rule) => Self::Number(rule),
            PrimitiveRule::Boolean => Self::Boolean,
            PrimitiveRule::Custom(rule) => Self::Custom(rule),
        }
    }
}

impl From<StringRule> for PrimitiveRule {
    fn from(rule: StringRule) -> Self {
        Self::String(rule)
    }
}

impl From<NumberRule> for PrimitiveRule {
    fn from(rule: NumberRule) -> Self {
        Self::Number(rule)
    }
}

impl From<CustomRule> for PrimitiveRule {
    fn from(rule: CustomRule) -> Self {
        Self::Custom(rule)
    }
}
