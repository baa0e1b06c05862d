use crate::error::ConfigError;
use crate::value::{Map, TypeTag, Value};
use std::borrow::Cow;
use std::fmt;
use std::ops::{Bound, RangeBounds};
use std::sync::Arc;

/// Shape normalization applied by the `make_*` constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Coercion {
    /// Null and empty sequences become an empty mapping; a mapping stays as is.
    Hash,
    /// Null becomes `[]`, a mapping becomes its `[key, value]` pairs, a scalar is wrapped.
    Array,
    /// Null becomes `""`; anything else its display form.
    String,
    Int,
    Float,
    /// Never fails: only null and `false` are false.
    Bool,
    /// Switch words for text sources such as environment variables: `true/yes/on/1` and
    /// `false/no/off/0/""` in any case. Bools pass through, null is false, integers 0 and 1 map to
    /// their bool; anything else fails.
    Flag,
}

impl Coercion {
    /// Applies the coercion.
    ///
    /// # Errors
    /// Returns a description of the value when it has no form of the target shape.
    pub fn apply(self, value: Value) -> Result<Value, Cow<'static, str>> {
        match self {
            Self::Hash => to_hash(value),
            Self::Array => Ok(to_array(value)),
            Self::String => Ok(to_string(value)),
            Self::Int => to_int(value),
            Self::Float => to_float(value),
            Self::Bool => Ok(Value::Bool(!matches!(value, Value::Null | Value::Bool(false)))),
            Self::Flag => to_flag(value),
        }
    }

    const fn label(self) -> &'static str {
        match self {
            Self::Hash => "mapping",
            Self::Array => "sequence",
            Self::String => "string",
            Self::Int => "integer",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::Flag => "flag",
        }
    }
}

fn cannot(value: &Value, target: Coercion) -> Cow<'static, str> {
    Cow::Owned(format!("cannot turn {} `{value}` into {}", value.type_name(), target.label()))
}

fn to_hash(value: Value) -> Result<Value, Cow<'static, str>> {
    match value {
        Value::Null => Ok(Value::Map(Map::new())),
        Value::Seq(items) if items.is_empty() => Ok(Value::Map(Map::new())),
        Value::Map(entries) => Ok(Value::Map(entries)),
        other => Err(cannot(&other, Coercion::Hash)),
    }
}

fn to_array(value: Value) -> Value {
    match value {
        Value::Null => Value::Seq(Vec::new()),
        Value::Seq(items) => Value::Seq(items),
        Value::Map(entries) => Value::Seq(
            entries.into_iter().map(|(k, v)| Value::Seq(vec![Value::Str(k), v])).collect(),
        ),
        other => Value::Seq(vec![other]),
    }
}

fn to_string(value: Value) -> Value {
    match value {
        Value::Null => Value::Str(String::new()),
        Value::Str(s) => Value::Str(s),
        other => Value::Str(other.to_string()),
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn float_to_int(f: f64) -> Option<i64> {
    let truncated = f.trunc();
    (truncated.is_finite() && truncated >= i64::MIN as f64 && truncated < i64::MAX as f64)
        .then(|| truncated as i64)
}

fn to_int(value: Value) -> Result<Value, Cow<'static, str>> {
    let int = match &value {
        Value::Null => Some(0),
        Value::Bool(b) => Some(i64::from(*b)),
        Value::Int(i) => Some(*i),
        Value::Float(f) => float_to_int(*f),
        Value::Str(s) => {
            let s = s.trim();
            s.parse::<i64>().ok().or_else(|| s.parse::<f64>().ok().and_then(float_to_int))
        }
        _ => None,
    };
    int.map(Value::Int).ok_or_else(|| cannot(&value, Coercion::Int))
}

#[allow(clippy::cast_precision_loss)]
fn to_float(value: Value) -> Result<Value, Cow<'static, str>> {
    let float = match &value {
        Value::Null => Some(0.0),
        Value::Bool(b) => Some(f64::from(u8::from(*b))),
        Value::Int(i) => Some(*i as f64),
        Value::Float(f) => Some(*f),
        Value::Str(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    float.map(Value::Float).ok_or_else(|| cannot(&value, Coercion::Float))
}

fn to_flag(value: Value) -> Result<Value, Cow<'static, str>> {
    let flag = match &value {
        Value::Null => Some(false),
        Value::Bool(b) => Some(*b),
        Value::Int(0) => Some(false),
        Value::Int(1) => Some(true),
        Value::Str(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Some(true),
            "false" | "no" | "off" | "0" | "" => Some(false),
            _ => None,
        },
        _ => None,
    };
    flag.map(Value::Bool).ok_or_else(|| cannot(&value, Coercion::Flag))
}

/// Allowed values for the `in` constraint: an explicit set, or a range.
#[derive(Debug, Clone, PartialEq)]
pub enum Membership {
    Values(Vec<Value>),
    Range { start: Bound<Value>, end: Bound<Value> },
}

impl Membership {
    #[must_use]
    pub fn contains(&self, value: &Value) -> bool {
        use std::cmp::Ordering::{Greater, Less};

        match self {
            Self::Values(values) => values.contains(value),
            Self::Range { start, end } => {
                let above = match start {
                    Bound::Included(s) => value.compare(s).is_some_and(|o| o != Less),
                    Bound::Excluded(s) => value.compare(s) == Some(Greater),
                    Bound::Unbounded => true,
                };
                let below = match end {
                    Bound::Included(e) => value.compare(e).is_some_and(|o| o != Greater),
                    Bound::Excluded(e) => value.compare(e) == Some(Less),
                    Bound::Unbounded => true,
                };
                above && below
            }
        }
    }
}

impl fmt::Display for Membership {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Values(values) => write!(f, "{}", Value::Seq(values.clone())),
            Self::Range { start, end } => {
                match start {
                    Bound::Included(s) | Bound::Excluded(s) => write!(f, "{s}")?,
                    Bound::Unbounded => {}
                }
                match end {
                    Bound::Included(e) => write!(f, "..={e}"),
                    Bound::Excluded(e) => write!(f, "..{e}"),
                    Bound::Unbounded => f.write_str(".."),
                }
            }
        }
    }
}

/// Lazily evaluated default.
#[derive(Clone)]
pub enum DefaultValue {
    Value(Value),
    Factory(Arc<dyn Fn() -> Value + Send + Sync>),
}

impl DefaultValue {
    pub(crate) fn materialize(&self) -> Value {
        match self {
            Self::Value(value) => value.clone(),
            Self::Factory(factory) => factory(),
        }
    }
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

type ConvertFn = dyn Fn(Value) -> Result<Value, ConfigError> + Send + Sync;

/// Final transformation before a value is stored.
#[derive(Clone)]
pub enum Convert {
    /// A method on the owner, invoked through [`Host::call`](crate::Host::call).
    Method(Cow<'static, str>),
    Function(Arc<ConvertFn>),
}

impl fmt::Debug for Convert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Method(name) => f.debug_tuple("Method").field(name).finish(),
            Self::Function(_) => f.write_str("Function(..)"),
        }
    }
}

/// Declarative rule set attached to one parameter.
///
/// Every method mirrors one constraint and returns the builder, so a declaration reads as a
/// single expression:
///
/// ```rust
/// use confkit_core::{Constraints, TypeTag};
///
/// let port = Constraints::new().default(8080).make_int().min(1).max(65535).lockable();
/// let name = Constraints::new().not_empty().must_be([TypeTag::String]);
/// # let _ = (port, name);
/// ```
///
/// Calling the same constraint twice keeps the last call.
#[derive(Debug, Clone, Default)]
pub struct Constraints {
    pub(crate) default: Option<DefaultValue>,
    pub(crate) lockable: bool,
    pub(crate) not_nil: bool,
    pub(crate) not_empty: bool,
    pub(crate) must_be: Option<Vec<TypeTag>>,
    pub(crate) must_respond_to: Vec<Cow<'static, str>>,
    pub(crate) coercion: Option<Coercion>,
    pub(crate) max: Option<Value>,
    pub(crate) min: Option<Value>,
    pub(crate) membership: Option<Membership>,
    pub(crate) convert: Option<Convert>,
}

impl Constraints {
    #[must_use]
    pub fn new() -> Self {
        <Self as Default>::default()
    }

    /// Value returned by reads while the parameter has never been written.
    #[must_use]
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(DefaultValue::Value(value.into()));
        self
    }

    /// Default built on first read, then cached.
    #[must_use]
    pub fn default_with<F, V>(mut self, factory: F) -> Self
    where
        F: Fn() -> V + Send + Sync + 'static,
        V: Into<Value>,
    {
        self.default = Some(DefaultValue::Factory(Arc::new(move || factory().into())));
        self
    }

    /// Rejects writes while the owning configuration is locked.
    #[must_use]
    pub const fn lockable(mut self) -> Self {
        self.lockable = true;
        self
    }

    #[must_use]
    pub const fn not_nil(mut self) -> Self {
        self.not_nil = true;
        self
    }

    #[must_use]
    pub const fn not_empty(mut self) -> Self {
        self.not_empty = true;
        self
    }

    /// The value must match at least one of the tags.
    #[must_use]
    pub fn must_be<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<TypeTag>,
    {
        self.must_be = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    /// The value must support every listed capability.
    #[must_use]
    pub fn must_respond_to<I, S>(mut self, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Cow<'static, str>>,
    {
        self.must_respond_to = capabilities.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub const fn make(mut self, coercion: Coercion) -> Self {
        self.coercion = Some(coercion);
        self
    }

    #[must_use]
    pub const fn make_hash(self) -> Self {
        self.make(Coercion::Hash)
    }

    #[must_use]
    pub const fn make_array(self) -> Self {
        self.make(Coercion::Array)
    }

    #[must_use]
    pub const fn make_string(self) -> Self {
        self.make(Coercion::String)
    }

    #[must_use]
    pub const fn make_int(self) -> Self {
        self.make(Coercion::Int)
    }

    #[must_use]
    pub const fn make_float(self) -> Self {
        self.make(Coercion::Float)
    }

    #[must_use]
    pub const fn make_bool(self) -> Self {
        self.make(Coercion::Bool)
    }

    /// Parses switch words, see [`Coercion::Flag`].
    #[must_use]
    pub const fn make_flag(self) -> Self {
        self.make(Coercion::Flag)
    }

    /// Inclusive upper bound.
    #[must_use]
    pub fn max(mut self, bound: impl Into<Value>) -> Self {
        self.max = Some(bound.into());
        self
    }

    /// Inclusive lower bound.
    #[must_use]
    pub fn min(mut self, bound: impl Into<Value>) -> Self {
        self.min = Some(bound.into());
        self
    }

    /// The value must equal one of `values`.
    #[must_use]
    pub fn one_of<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.membership = Some(Membership::Values(values.into_iter().map(Into::into).collect()));
        self
    }

    /// The value must fall inside `range`.
    #[must_use]
    pub fn within<T, R>(mut self, range: R) -> Self
    where
        T: Into<Value> + Clone,
        R: RangeBounds<T>,
    {
        self.membership = Some(Membership::Range {
            start: range.start_bound().cloned().map(Into::into),
            end: range.end_bound().cloned().map(Into::into),
        });
        self
    }

    /// Converts the value through the named host method.
    #[must_use]
    pub fn convert(mut self, method: impl Into<Cow<'static, str>>) -> Self {
        self.convert = Some(Convert::Method(method.into()));
        self
    }

    #[must_use]
    pub fn convert_with<F>(mut self, f: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.convert = Some(Convert::Function(Arc::new(move |value| Ok(f(value)))));
        self
    }

    /// Like [`Constraints::convert_with`], for conversions that can fail.
    #[must_use]
    pub fn try_convert_with<F>(mut self, f: F) -> Self
    where
        F: Fn(Value) -> Result<Value, ConfigError> + Send + Sync + 'static,
    {
        self.convert = Some(Convert::Function(Arc::new(f)));
        self
    }

    #[must_use]
    pub const fn has_default(&self) -> bool {
        self.default.is_some()
    }

    #[must_use]
    pub const fn is_lockable(&self) -> bool {
        self.lockable
    }

    #[must_use]
    pub const fn coercion(&self) -> Option<Coercion> {
        self.coercion
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_coercion_accepts_only_empty_shapes() {
        assert_eq!(Coercion::Hash.apply(Value::Null), Ok(Value::Map(Map::new())));
        assert_eq!(Coercion::Hash.apply(Value::Seq(Vec::new())), Ok(Value::Map(Map::new())));
        assert!(Coercion::Hash.apply(Value::from(vec![1])).is_err());
        assert!(Coercion::Hash.apply(Value::from("a")).is_err());
    }

    #[test]
    fn array_coercion_wraps_and_flattens() {
        assert_eq!(Coercion::Array.apply(Value::Null), Ok(Value::Seq(Vec::new())));
        assert_eq!(Coercion::Array.apply(Value::Int(1)), Ok(Value::from(vec![1])));
        let pairs = Coercion::Array.apply(Value::from_iter([("a", 1)])).unwrap();
        assert_eq!(pairs, Value::from(vec![Value::from(vec![Value::from("a"), Value::Int(1)])]));
    }

    #[test]
    fn string_coercion_uses_display_form() {
        assert_eq!(Coercion::String.apply(Value::Null), Ok(Value::from("")));
        assert_eq!(Coercion::String.apply(Value::Int(42)), Ok(Value::from("42")));
        assert_eq!(Coercion::String.apply(Value::Float(1.5)), Ok(Value::from("1.5")));
    }

    #[test]
    fn int_coercion_parses_strictly_and_truncates() {
        assert_eq!(Coercion::Int.apply(Value::from(" 12 ")), Ok(Value::Int(12)));
        assert_eq!(Coercion::Int.apply(Value::from("3.9")), Ok(Value::Int(3)));
        assert_eq!(Coercion::Int.apply(Value::Float(-2.7)), Ok(Value::Int(-2)));
        assert_eq!(Coercion::Int.apply(Value::Null), Ok(Value::Int(0)));
        assert!(Coercion::Int.apply(Value::from("12abc")).is_err());
        assert!(Coercion::Int.apply(Value::Float(f64::NAN)).is_err());
        assert!(Coercion::Int.apply(Value::from(vec![1])).is_err());
    }

    #[test]
    fn float_coercion_parses_numbers() {
        assert_eq!(Coercion::Float.apply(Value::from("2.5")), Ok(Value::Float(2.5)));
        assert_eq!(Coercion::Float.apply(Value::Int(2)), Ok(Value::Float(2.0)));
        assert!(Coercion::Float.apply(Value::from("fast")).is_err());
    }

    #[test]
    fn bool_coercion_is_plain_truthiness() {
        for value in [Value::Int(0), Value::Float(0.0), Value::from(""), Value::from("false")] {
            assert_eq!(Coercion::Bool.apply(value.clone()), Ok(Value::Bool(true)), "{value}");
        }
        assert_eq!(Coercion::Bool.apply(Value::Null), Ok(Value::Bool(false)));
        assert_eq!(Coercion::Bool.apply(Value::Bool(false)), Ok(Value::Bool(false)));
        assert_eq!(Coercion::Bool.apply(Value::Seq(Vec::new())), Ok(Value::Bool(true)));
    }

    #[test]
    fn flag_coercion_recognizes_words() {
        for word in ["false", "No", "off", "0", " "] {
            assert_eq!(Coercion::Flag.apply(Value::from(word)), Ok(Value::Bool(false)), "{word}");
        }
        for word in ["true", "yes", "ON", "1"] {
            assert_eq!(Coercion::Flag.apply(Value::from(word)), Ok(Value::Bool(true)), "{word}");
        }
        assert_eq!(Coercion::Flag.apply(Value::Null), Ok(Value::Bool(false)));
        assert!(Coercion::Flag.apply(Value::from("maybe")).is_err());
        assert!(Coercion::Flag.apply(Value::Int(2)).is_err());
    }

    #[test]
    fn ranges_honor_bound_kinds() {
        let inclusive = Constraints::new().within(1..=3).membership.unwrap();
        assert!(inclusive.contains(&Value::Int(3)));
        assert!(!inclusive.contains(&Value::Int(4)));
        assert!(inclusive.contains(&Value::Float(2.5)));
        assert!(!inclusive.contains(&Value::from("2")));

        let exclusive = Constraints::new().within(1..3).membership.unwrap();
        assert!(!exclusive.contains(&Value::Int(3)));
        assert_eq!(exclusive.to_string(), "1..3");

        let open = Constraints::new().within(10..).membership.unwrap();
        assert!(open.contains(&Value::Int(i64::MAX)));
    }

    #[test]
    fn last_call_wins() {
        let constraints = Constraints::new().make_int().make_string().one_of([1]).within(1..2);
        assert_eq!(constraints.coercion(), Some(Coercion::String));
        assert!(matches!(constraints.membership, Some(Membership::Range { .. })));
    }
}
