use indexmap::IndexMap;
use std::any::Any;
use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Ordered mapping used for configuration documents. Keys keep their insertion order.
pub type Map = IndexMap<String, Value>;

/// A dynamically typed configuration value.
///
/// Documents decoded from files, environment variables and in-memory mappings all end up as a
/// tree of `Value`s before the constraint chain of each parameter runs on them.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Seq(Vec<Self>),
    Map(Map),
    /// An opaque host value. Equality is identity.
    Object(Arc<dyn Object>),
}

/// A host-defined value stored behind [`Value::Object`].
///
/// Implementors describe themselves to the constraint chain: their type name and ancestry for
/// `must_be`, their capabilities for `must_respond_to`, and an optional size for `not_empty`.
pub trait Object: Any + fmt::Debug + Send + Sync {
    fn type_name(&self) -> &str;

    /// Whether this object is an instance of the named type. Defaults to an exact name match.
    fn is_a(&self, type_name: &str) -> bool {
        self.type_name() == type_name
    }

    fn responds_to(&self, _capability: &str) -> bool {
        false
    }

    /// Number of elements, for objects that have a notion of size.
    fn size(&self) -> Option<usize> {
        None
    }

    fn as_any(&self) -> &dyn Any;
}

const COMMON: &[&str] = &["clone", "to_string", "eq"];
const BOOL: &[&str] = &["not", "and", "or"];
const NUMERIC: &[&str] = &["abs", "add", "sub", "mul", "div", "cmp", "to_int", "to_float"];
const STRING: &[&str] = &[
    "len",
    "is_empty",
    "chars",
    "cmp",
    "trim",
    "parse",
    "to_uppercase",
    "to_lowercase",
    "to_int",
    "to_float",
];
const SEQUENCE: &[&str] = &["len", "is_empty", "iter", "get", "push", "first", "last", "contains"];
const MAPPING: &[&str] =
    &["len", "is_empty", "iter", "get", "keys", "values", "insert", "contains_key"];

/// Type predicate used by `must_be`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Any,
    Null,
    Bool,
    /// Either an integer or a float.
    Number,
    Integer,
    Float,
    String,
    Sequence,
    Mapping,
    /// A host type, matched through [`Object::is_a`].
    Named(Cow<'static, str>),
}

impl TypeTag {
    #[must_use]
    pub fn named(name: impl Into<Cow<'static, str>>) -> Self {
        Self::Named(name.into())
    }

    /// Parses a tag from its lowercase name, falling back to [`TypeTag::Named`].
    #[must_use]
    pub fn from_name(name: impl Into<Cow<'static, str>>) -> Self {
        let name = name.into();
        match name.as_ref() {
            "any" => Self::Any,
            "null" | "nil" => Self::Null,
            "bool" | "boolean" => Self::Bool,
            "number" | "numeric" => Self::Number,
            "integer" | "int" => Self::Integer,
            "float" => Self::Float,
            "string" | "str" => Self::String,
            "sequence" | "array" | "seq" => Self::Sequence,
            "mapping" | "hash" | "map" => Self::Mapping,
            _ => Self::Named(name),
        }
    }

    #[must_use]
    pub fn matches(&self, value: &Value) -> bool {
        match (self, value) {
            (Self::Any, _)
            | (Self::Null, Value::Null)
            | (Self::Bool, Value::Bool(_))
            | (Self::Number | Self::Integer, Value::Int(_))
            | (Self::Number | Self::Float, Value::Float(_))
            | (Self::String, Value::Str(_))
            | (Self::Sequence, Value::Seq(_))
            | (Self::Mapping, Value::Map(_)) => true,
            (Self::Named(name), Value::Object(object)) => object.is_a(name),
            _ => false,
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Any => "any",
            Self::Null => "null",
            Self::Bool => "bool",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::String => "string",
            Self::Sequence => "sequence",
            Self::Mapping => "mapping",
            Self::Named(name) => name,
        };
        f.write_str(name)
    }
}

impl From<&'static str> for TypeTag {
    fn from(name: &'static str) -> Self {
        Self::from_name(name)
    }
}

impl From<String> for TypeTag {
    fn from(name: String) -> Self {
        Self::from_name(name)
    }
}

static NULL: Value = Value::Null;

impl Value {
    /// A shared reference to [`Value::Null`], returned for parameters that hold nothing.
    #[must_use]
    pub fn null_ref() -> &'static Self {
        &NULL
    }

    /// Wraps a host object.
    pub fn object(object: impl Object) -> Self {
        Self::Object(Arc::new(object))
    }

    #[must_use]
    pub fn type_name(&self) -> &str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "integer",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
            Self::Seq(_) => "sequence",
            Self::Map(_) => "mapping",
            Self::Object(object) => object.type_name(),
        }
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn is_a(&self, tag: &TypeTag) -> bool {
        tag.matches(self)
    }

    /// Whether the value supports the named capability.
    #[must_use]
    pub fn responds_to(&self, capability: &str) -> bool {
        let table: &[&str] = match self {
            Self::Null => &[],
            Self::Bool(_) => BOOL,
            Self::Int(_) | Self::Float(_) => NUMERIC,
            Self::Str(_) => STRING,
            Self::Seq(_) => SEQUENCE,
            Self::Map(_) => MAPPING,
            Self::Object(object) => return object.responds_to(capability),
        };
        COMMON.contains(&capability) || table.contains(&capability)
    }

    /// Number of elements for strings (in chars), sequences, mappings and sized objects.
    #[must_use]
    pub fn size(&self) -> Option<usize> {
        match self {
            Self::Str(s) => Some(s.chars().count()),
            Self::Seq(items) => Some(items.len()),
            Self::Map(entries) => Some(entries.len()),
            Self::Object(object) => object.size(),
            _ => None,
        }
    }

    /// Null and zero-sized values are empty. Values without a size never are.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.is_null() || self.size() == Some(0)
    }

    /// Orders numbers against numbers and strings against strings.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => Some(a.cmp(b)),
            (Self::Int(a), Self::Float(b)) => (*a as f64).partial_cmp(b),
            (Self::Float(a), Self::Int(b)) => a.partial_cmp(&(*b as f64)),
            (Self::Float(a), Self::Float(b)) => a.partial_cmp(b),
            (Self::Str(a), Self::Str(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub const fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_seq(&self) -> Option<&[Self]> {
        match self {
            Self::Seq(items) => Some(items),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_map(&self) -> Option<&Map> {
        match self {
            Self::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Downcasts a host object to its concrete type.
    #[must_use]
    pub fn as_object<T: Object>(&self) -> Option<&T> {
        match self {
            Self::Object(object) => object.as_any().downcast_ref::<T>(),
            _ => None,
        }
    }

    /// Whether both values are the same instance: the same host object, or the same storage.
    #[must_use]
    pub fn same_instance(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Object(a), Self::Object(b)) => Arc::ptr_eq(a, b),
            _ => std::ptr::eq(self, other),
        }
    }

    fn fmt_nested(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => write!(f, "{s:?}"),
            other => fmt::Display::fmt(other, f),
        }
    }
}

impl PartialEq for Value {
    #[allow(clippy::float_cmp, clippy::cast_precision_loss)]
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Int(a), Self::Float(b)) | (Self::Float(b), Self::Int(a)) => *a as f64 == *b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Seq(a), Self::Seq(b)) => a == b,
            (Self::Map(a), Self::Map(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Top-level strings render bare; strings nested in collections are quoted.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x:?}"),
            Self::Str(s) => f.write_str(s),
            Self::Seq(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    item.fmt_nested(f)?;
                }
                f.write_str("]")
            }
            Self::Map(entries) => {
                f.write_str("{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key:?}: ")?;
                    value.fmt_nested(f)?;
                }
                f.write_str("}")
            }
            Self::Object(object) => write!(f, "#<{}>", object.type_name()),
        }
    }
}

macro_rules! impl_from_int {
    ($($ty:ty),*) => {
        $(impl From<$ty> for Value {
            fn from(value: $ty) -> Self {
                Self::Int(i64::from(value))
            }
        })*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Self::Float(f64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<Cow<'_, str>> for Value {
    fn from(value: Cow<'_, str>) -> Self {
        Self::Str(value.into_owned())
    }
}

impl From<&Path> for Value {
    fn from(value: &Path) -> Self {
        Self::Str(value.to_string_lossy().into_owned())
    }
}

impl From<PathBuf> for Value {
    fn from(value: PathBuf) -> Self {
        Self::from(value.as_path())
    }
}

impl<T: Into<Self>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Self::Seq(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Self>, const N: usize> From<[T; N]> for Value {
    fn from(values: [T; N]) -> Self {
        Self::Seq(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl From<Map> for Value {
    fn from(entries: Map) -> Self {
        Self::Map(entries)
    }
}

impl From<Arc<dyn Object>> for Value {
    fn from(object: Arc<dyn Object>) -> Self {
        Self::Object(object)
    }
}

impl<K: Into<String>, V: Into<Self>> FromIterator<(K, V)> for Value {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::Map(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Endpoint;

    impl Object for Endpoint {
        fn type_name(&self) -> &str {
            "Endpoint"
        }

        fn is_a(&self, type_name: &str) -> bool {
            matches!(type_name, "Endpoint" | "Resource")
        }

        fn responds_to(&self, capability: &str) -> bool {
            capability == "connect"
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn number_tags_cover_both_numeric_kinds() {
        assert!(TypeTag::Number.matches(&Value::Int(1)));
        assert!(TypeTag::Number.matches(&Value::Float(1.5)));
        assert!(!TypeTag::Integer.matches(&Value::Float(1.0)));
        assert!(!TypeTag::Number.matches(&Value::from("1")));
        assert!(TypeTag::Any.matches(&Value::Null));
    }

    #[test]
    fn named_tags_follow_object_ancestry() {
        let endpoint = Value::object(Endpoint);
        assert!(TypeTag::named("Resource").matches(&endpoint));
        assert!(!TypeTag::named("Socket").matches(&endpoint));
        assert!(endpoint.responds_to("connect"));
        assert!(!endpoint.responds_to("len"));
        assert!(endpoint.as_object::<Endpoint>().is_some());
    }

    #[test]
    fn tag_names_parse_to_builtins() {
        assert_eq!(TypeTag::from("integer"), TypeTag::Integer);
        assert_eq!(TypeTag::from("hash"), TypeTag::Mapping);
        assert_eq!(TypeTag::from("Endpoint"), TypeTag::named("Endpoint"));
    }

    #[test]
    fn emptiness_depends_on_size() {
        assert!(Value::Null.is_empty());
        assert!(Value::from("").is_empty());
        assert!(Value::Seq(Vec::new()).is_empty());
        assert!(!Value::Int(0).is_empty());
        assert!(!Value::object(Endpoint).is_empty());
    }

    #[test]
    fn numbers_compare_across_kinds() {
        assert_eq!(Value::Int(2).compare(&Value::Float(2.5)), Some(Ordering::Less));
        assert_eq!(Value::Int(2), Value::Float(2.0));
        assert_eq!(Value::from("a").compare(&Value::Int(1)), None);
    }

    #[test]
    fn objects_compare_by_identity() {
        let object: Arc<dyn Object> = Arc::new(Endpoint);
        let a = Value::Object(Arc::clone(&object));
        let b = Value::Object(object);
        assert_eq!(a, b);
        assert!(a.same_instance(&b));
        assert_ne!(a, Value::object(Endpoint));
    }

    #[test]
    fn display_quotes_nested_strings_only() {
        let value = Value::from(vec![Value::from("a"), Value::Int(1), Value::Float(2.0)]);
        assert_eq!(value.to_string(), "[\"a\", 1, 2.0]");
        assert_eq!(Value::from("plain").to_string(), "plain");

        let map = Value::from_iter([("port", 80)]);
        assert_eq!(map.to_string(), "{\"port\": 80}");
    }
}
