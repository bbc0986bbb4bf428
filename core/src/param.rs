//! Query, header and path parameter values.

use std::collections::BTreeMap;
use std::fmt::Display;

/// A parameter value after formatting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValues {
    /// Nothing to send; the key is left untouched.
    Absent,
    One(String),
    /// One entry per element, in order.
    Many(Vec<String>),
}

/// Conversion into [`ParamValues`].
///
/// Scalars format through `Display`, sequences produce one value per
/// element, and `None` is absent.
pub trait ToParam {
    fn to_param(self) -> ParamValues;
}

macro_rules! scalar_param {
    ($($t:ty),* $(,)?) => {
        $(
            impl ToParam for $t {
                fn to_param(self) -> ParamValues {
                    ParamValues::One(self.to_string())
                }
            }
        )*
    };
}

scalar_param!(
    String, &str, &String, char, bool, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128,
    usize, f32, f64,
);

impl<T: ToParam> ToParam for Option<T> {
    fn to_param(self) -> ParamValues {
        match self {
            Some(v) => v.to_param(),
            None => ParamValues::Absent,
        }
    }
}

impl<T: Display> ToParam for Vec<T> {
    fn to_param(self) -> ParamValues {
        ParamValues::Many(self.iter().map(ToString::to_string).collect())
    }
}

impl<T: Display> ToParam for &[T] {
    fn to_param(self) -> ParamValues {
        ParamValues::Many(self.iter().map(ToString::to_string).collect())
    }
}

impl<T: Display, const N: usize> ToParam for [T; N] {
    fn to_param(self) -> ParamValues {
        ParamValues::Many(self.iter().map(ToString::to_string).collect())
    }
}

/// Query-string multimap.
///
/// Values under one key keep insertion order. Keys are encoded in
/// lexicographic order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryValues(BTreeMap<String, Vec<String>>);

impl QueryValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all values under `key` with `value`.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), vec![value.into()]);
    }

    /// Append `value` under `key`.
    pub fn add(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.entry(key.into()).or_default().push(value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.first()).map(String::as_str)
    }

    pub fn get_all(&self, key: &str) -> &[String] {
        self.0.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn del(&mut self, key: &str) {
        self.0.remove(key);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// `application/x-www-form-urlencoded` form of all pairs.
    pub fn encode(&self) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (key, values) in &self.0 {
            for value in values {
                serializer.append_pair(key, value);
            }
        }
        serializer.finish()
    }
}

/// Unwrap a pointer-like value to the value it points at.
///
/// Plain values unwrap to themselves, so dereferencing twice is the same as
/// dereferencing once.
pub trait Dereference {
    type Target;

    fn dereference(self) -> Option<Self::Target>;
}

impl<T> Dereference for Option<T> {
    type Target = T;

    fn dereference(self) -> Option<T> {
        self
    }
}

impl<T> Dereference for Box<T> {
    type Target = T;

    fn dereference(self) -> Option<T> {
        Some(*self)
    }
}

impl<T: Clone> Dereference for &Option<T> {
    type Target = T;

    fn dereference(self) -> Option<T> {
        self.clone()
    }
}

macro_rules! plain_dereference {
    ($($t:ty),* $(,)?) => {
        $(
            impl Dereference for $t {
                type Target = $t;

                fn dereference(self) -> Option<$t> {
                    Some(self)
                }
            }
        )*
    };
}

plain_dereference!(
    String, char, bool, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64,
);

/// Dereference `value`; `None` means the value is absent and must not be
/// sent.
pub fn dereference_value<V: Dereference>(value: V) -> Option<V::Target> {
    value.dereference()
}
