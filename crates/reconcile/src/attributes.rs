//! Untyped attribute mappings for desired and observed state

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Mapping from attribute name to value.
///
/// Used both for desired configuration and for the observed remote
/// representation. Key order is irrelevant; values are JSON values so
/// nested mappings, lists and null round-trip unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeSet(BTreeMap<String, Value>);

impl AttributeSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a JSON value, which must be an object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map.into_iter().collect())),
            _ => None,
        }
    }

    /// Convert into a JSON object value.
    pub fn into_value(self) -> Value {
        Value::Object(self.0.into_iter().collect::<Map<String, Value>>())
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(name.into(), value.into())
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.0.remove(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Attribute names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Copy of this set keeping only attributes accepted by `keep`.
    pub fn filtered<F>(&self, keep: F) -> Self
    where
        F: Fn(&str) -> bool,
    {
        Self(
            self.0
                .iter()
                .filter(|(k, _)| keep(k))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }

    /// Read an attribute as a string identifier.
    ///
    /// Numbers are rendered in decimal; empty strings count as missing.
    pub fn identifier(&self, name: &str) -> Option<String> {
        match self.0.get(name)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for AttributeSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl IntoIterator for AttributeSet {
    type Item = (String, Value);
    type IntoIter = std::collections::btree_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Structural equality between attribute values.
///
/// Mappings compare key-by-key regardless of order, lists element-wise, and
/// numbers by value so that `1` and `1.0` are equal.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            if x.is_f64() || y.is_f64() {
                x.as_f64() == y.as_f64()
            } else {
                x == y
            }
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x.iter()
                    .all(|(k, v)| y.get(k).is_some_and(|w| values_equal(v, w)))
        }
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(v, w)| values_equal(v, w))
        }
        _ => a == b,
    }
}

/// Build an [`AttributeSet`] from `name => value` pairs.
#[macro_export]
macro_rules! attrs {
    () => {
        $crate::AttributeSet::new()
    };
    ($($name:expr => $value:expr),+ $(,)?) => {{
        let mut set = $crate::AttributeSet::new();
        $( set.insert($name, $crate::serde_json::json!($value)); )+
        set
    }};
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_value_requires_object() {
        assert!(AttributeSet::from_value(json!({"a": 1})).is_some());
        assert!(AttributeSet::from_value(json!([1, 2])).is_none());
        assert!(AttributeSet::from_value(json!("x")).is_none());
    }

    #[test]
    fn test_identifier() {
        let set = attrs! { "id" => "42", "num" => 7, "empty" => "", "flag" => true };
        assert_eq!(set.identifier("id").as_deref(), Some("42"));
        assert_eq!(set.identifier("num").as_deref(), Some("7"));
        assert_eq!(set.identifier("empty"), None);
        assert_eq!(set.identifier("flag"), None);
        assert_eq!(set.identifier("missing"), None);
    }

    #[test]
    fn test_values_equal_numbers() {
        assert!(values_equal(&json!(1), &json!(1.0)));
        assert!(values_equal(&json!(3), &json!(3)));
        assert!(!values_equal(&json!(1), &json!(2)));
        assert!(!values_equal(&json!(1), &json!("1")));
    }

    #[test]
    fn test_values_equal_nested_order_irrelevant() {
        let a = json!({"rules": {"a": 1, "b": {"c": true}}});
        let b = json!({"rules": {"b": {"c": true}, "a": 1.0}});
        assert!(values_equal(&a, &b));

        let c = json!({"rules": {"a": 1}});
        assert!(!values_equal(&a, &c));
    }

    #[test]
    fn test_values_equal_lists_are_ordered() {
        assert!(values_equal(&json!([1, 2]), &json!([1, 2])));
        assert!(!values_equal(&json!([1, 2]), &json!([2, 1])));
    }

    #[test]
    fn test_filtered() {
        let set = attrs! { "id" => "1", "name" => "blog" };
        let kept = set.filtered(|k| k != "id");
        assert_eq!(kept.len(), 1);
        assert!(kept.contains("name"));
    }

    #[test]
    fn test_serde_transparent() {
        let set = attrs! { "name" => "blog", "enabled" => true };
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"{"enabled":true,"name":"blog"}"#);

        let back: AttributeSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, set);
    }
}
