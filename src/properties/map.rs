use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::properties::slot::{Buffer, DataSlot};

/// A single carrier value.
#[derive(Debug)]
pub enum Value {
    /// Signed integer.
    Int(i64),
    /// Floating point number.
    Double(f64),
    /// Time position in frames.
    Position(i64),
    /// Free-form string.
    String(String),
    /// Owned or borrowed resource.
    Data(DataSlot),
}

impl Value {
    fn scalar_clone(&self) -> Option<Value> {
        match self {
            Value::Int(v) => Some(Value::Int(*v)),
            Value::Double(v) => Some(Value::Double(*v)),
            Value::Position(v) => Some(Value::Position(*v)),
            Value::String(v) => Some(Value::String(v.clone())),
            Value::Data(_) => None,
        }
    }
}

#[derive(Default)]
struct PropertyMap {
    entries: Vec<(String, Value)>,
    index: HashMap<String, usize>,
    lc_numeric: Option<String>,
}

impl PropertyMap {
    fn get(&self, key: &str) -> Option<&Value> {
        self.index.get(key).map(|&i| &self.entries[i].1)
    }

    fn insert(&mut self, key: &str, value: Value) -> Option<Value> {
        match self.index.get(key).copied() {
            Some(i) => Some(std::mem::replace(&mut self.entries[i].1, value)),
            None => {
                self.index.insert(key.to_owned(), self.entries.len());
                self.entries.push((key.to_owned(), value));
                None
            }
        }
    }

    fn remove(&mut self, key: &str) -> Option<Value> {
        let i = self.index.remove(key)?;
        let (_, value) = self.entries.remove(i);
        for slot in self.index.values_mut() {
            if *slot > i {
                *slot -= 1;
            }
        }
        Some(value)
    }
}

/// Reference-counted, insertion-ordered key/value carrier.
///
/// Cloning the handle shares the same map. Values replaced or removed are dropped after the
/// internal lock is released, so data-slot deleters may touch the carrier again.
#[derive(Clone, Default)]
pub struct Properties {
    inner: Arc<RwLock<PropertyMap>>,
}

impl Properties {
    /// Create an empty carrier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live handles sharing this carrier.
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    /// Whether both handles share one carrier.
    pub fn ptr_eq(&self, other: &Properties) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    /// Whether the carrier holds no keys.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> Vec<String> {
        self.inner
            .read()
            .entries
            .iter()
            .map(|(k, _)| k.clone())
            .collect()
    }

    /// Whether `key` is set.
    pub fn contains(&self, key: &str) -> bool {
        self.inner.read().index.contains_key(key)
    }

    /// Store `value` under `key`, releasing any previous value.
    pub fn set(&self, key: &str, value: Value) {
        let old = self.inner.write().insert(key, value);
        drop(old);
    }

    /// Remove `key`; returns whether it was present.
    pub fn remove(&self, key: &str) -> bool {
        let old = self.inner.write().remove(key);
        old.is_some()
    }

    /// Set an integer.
    pub fn set_int(&self, key: &str, value: i64) {
        self.set(key, Value::Int(value));
    }

    /// Set a double.
    pub fn set_double(&self, key: &str, value: f64) {
        self.set(key, Value::Double(value));
    }

    /// Set a time position.
    pub fn set_position(&self, key: &str, value: i64) {
        self.set(key, Value::Position(value));
    }

    /// Set a string.
    pub fn set_string(&self, key: &str, value: impl Into<String>) {
        self.set(key, Value::String(value.into()));
    }

    /// Set a data slot.
    pub fn set_data(&self, key: &str, slot: DataSlot) {
        self.set(key, Value::Data(slot));
    }

    /// Integer value of `key`, converting other scalar kinds; 0 when absent or unparsable.
    pub fn get_int(&self, key: &str) -> i64 {
        let map = self.inner.read();
        match map.get(key) {
            Some(Value::Int(v)) | Some(Value::Position(v)) => *v,
            Some(Value::Double(v)) => *v as i64,
            Some(Value::String(s)) => parse_int(s),
            Some(Value::Data(_)) | None => 0,
        }
    }

    /// Double value of `key`, converting other scalar kinds; 0.0 when absent or unparsable.
    pub fn get_double(&self, key: &str) -> f64 {
        let map = self.inner.read();
        match map.get(key) {
            Some(Value::Double(v)) => *v,
            Some(Value::Int(v)) | Some(Value::Position(v)) => *v as f64,
            Some(Value::String(s)) => parse_double(s, map.lc_numeric.as_deref()),
            Some(Value::Data(_)) | None => 0.0,
        }
    }

    /// Position value of `key`; 0 when absent.
    pub fn get_position(&self, key: &str) -> i64 {
        self.get_int(key)
    }

    /// String rendition of a scalar value; `None` for data slots and absent keys.
    pub fn get_string(&self, key: &str) -> Option<String> {
        let map = self.inner.read();
        match map.get(key)? {
            Value::Int(v) | Value::Position(v) => Some(v.to_string()),
            Value::Double(v) => Some(v.to_string()),
            Value::String(s) => Some(s.clone()),
            Value::Data(_) => None,
        }
    }

    /// Buffer stored under `key` with its tracked size.
    pub fn get_buffer(&self, key: &str) -> Option<(Buffer, usize)> {
        let map = self.inner.read();
        match map.get(key)? {
            Value::Data(slot) => slot.buffer().map(|b| (b.clone(), slot.size())),
            _ => None,
        }
    }

    /// Object stored under `key`, downcast to `T`.
    pub fn get_object<T: Any + Send + Sync + Clone>(&self, key: &str) -> Option<T> {
        let map = self.inner.read();
        match map.get(key)? {
            Value::Data(slot) => slot.object_as::<T>(),
            _ => None,
        }
    }

    /// Borrowed alias of the data slot under `key` (see [`DataSlot::alias`]).
    pub fn alias_data(&self, key: &str) -> Option<DataSlot> {
        let map = self.inner.read();
        match map.get(key)? {
            Value::Data(slot) => slot.alias(),
            _ => None,
        }
    }

    /// Copy every scalar value of `other` into this carrier. Data slots are not inherited.
    pub fn inherit(&self, other: &Properties) {
        if self.ptr_eq(other) {
            return;
        }
        let scalars: Vec<(String, Value)> = other
            .inner
            .read()
            .entries
            .iter()
            .filter_map(|(k, v)| v.scalar_clone().map(|v| (k.clone(), v)))
            .collect();
        let mut replaced = Vec::new();
        {
            let mut map = self.inner.write();
            for (k, v) in scalars {
                replaced.extend(map.insert(&k, v));
            }
        }
        drop(replaced);
    }

    /// Set the numeric locale used when parsing string doubles.
    pub fn set_lc_numeric(&self, locale: Option<String>) {
        self.inner.write().lc_numeric = locale;
    }

    /// Numeric locale, if any.
    pub fn lc_numeric(&self) -> Option<String> {
        self.inner.read().lc_numeric.clone()
    }
}

impl fmt::Debug for Properties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let map = self.inner.read();
        f.debug_map()
            .entries(map.entries.iter().map(|(k, v)| (k, v)))
            .finish()
    }
}

fn parse_int(s: &str) -> i64 {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        return i64::from_str_radix(hex, 16).unwrap_or(0);
    }
    s.parse::<i64>()
        .ok()
        .or_else(|| s.parse::<f64>().ok().map(|v| v as i64))
        .unwrap_or(0)
}

// Locales whose decimal separator is a comma.
const COMMA_DECIMAL_LANGS: &[&str] = &[
    "cs", "da", "de", "es", "fi", "fr", "it", "nb", "nl", "pl", "pt", "ru", "sv", "tr", "uk",
];

fn uses_comma_decimal(locale: &str) -> bool {
    let lang = locale.split(['_', '-', '.']).next().unwrap_or("");
    COMMA_DECIMAL_LANGS.contains(&lang)
}

fn parse_double(s: &str, lc_numeric: Option<&str>) -> f64 {
    let s = s.trim();
    let normalized;
    let s = match lc_numeric {
        Some(locale) if uses_comma_decimal(locale) => {
            normalized = s.replace(',', ".");
            normalized.as_str()
        }
        _ => s,
    };
    s.parse::<f64>().unwrap_or(0.0)
}

#[cfg(test)]
#[path = "../../tests/unit/properties/map.rs"]
mod tests;
