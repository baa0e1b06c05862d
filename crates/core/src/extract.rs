use crate::value::{Map, Value};
use indexmap::IndexMap;
use std::borrow::Cow;
use std::path::PathBuf;

/// Reads a stored [`Value`] back as a Rust type.
///
/// Extraction never coerces: use a `make_*` constraint on the parameter when the stored value
/// must be normalized first. The error is a short description, wrapped by the caller into
/// [`ConfigError::Extract`](crate::ConfigError::Extract).
pub trait FromValue: Sized {
    /// # Errors
    /// Returns a description of the mismatch when the value has another shape.
    fn from_value(value: &Value) -> Result<Self, Cow<'static, str>>;
}

fn mismatch(expected: &str, value: &Value) -> Cow<'static, str> {
    Cow::Owned(format!("expected {expected}, found {}", value.type_name()))
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Result<Self, Cow<'static, str>> {
        Ok(value.clone())
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Result<Self, Cow<'static, str>> {
        value.as_bool().ok_or_else(|| mismatch("bool", value))
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> Result<Self, Cow<'static, str>> {
        value.as_i64().ok_or_else(|| mismatch("integer", value))
    }
}

macro_rules! impl_from_value_int {
    ($($ty:ty),*) => {
        $(impl FromValue for $ty {
            fn from_value(value: &Value) -> Result<Self, Cow<'static, str>> {
                let int = i64::from_value(value)?;
                <$ty>::try_from(int).map_err(|_| {
                    Cow::Owned(format!("{int} does not fit into {}", stringify!($ty)))
                })
            }
        })*
    };
}

impl_from_value_int!(i8, i16, i32, u8, u16, u32, u64, usize);

impl FromValue for f64 {
    fn from_value(value: &Value) -> Result<Self, Cow<'static, str>> {
        value.as_f64().ok_or_else(|| mismatch("number", value))
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Result<Self, Cow<'static, str>> {
        value.as_str().map(str::to_owned).ok_or_else(|| mismatch("string", value))
    }
}

impl FromValue for PathBuf {
    fn from_value(value: &Value) -> Result<Self, Cow<'static, str>> {
        value.as_str().map(Self::from).ok_or_else(|| mismatch("path string", value))
    }
}

/// `Null` reads as `None`; anything else must extract as `T`.
impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Result<Self, Cow<'static, str>> {
        if value.is_null() { Ok(None) } else { T::from_value(value).map(Some) }
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: &Value) -> Result<Self, Cow<'static, str>> {
        let items = value.as_seq().ok_or_else(|| mismatch("sequence", value))?;
        items
            .iter()
            .enumerate()
            .map(|(i, item)| T::from_value(item).map_err(|e| Cow::Owned(format!("[{i}]: {e}"))))
            .collect()
    }
}

impl<T: FromValue> FromValue for IndexMap<String, T> {
    fn from_value(value: &Value) -> Result<Self, Cow<'static, str>> {
        let entries: &Map = value.as_map().ok_or_else(|| mismatch("mapping", value))?;
        entries
            .iter()
            .map(|(key, item)| {
                T::from_value(item)
                    .map(|v| (key.clone(), v))
                    .map_err(|e| Cow::Owned(format!("{key}: {e}")))
            })
            .collect()
    }
}
