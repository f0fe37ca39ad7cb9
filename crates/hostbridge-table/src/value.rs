//! Host-side values mirroring an interpreter's dynamic tables.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// A value that can be bound under a table key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// A scalar integer.
    Integer(i64),
    /// A nested table, produced from a nested structure.
    Table(Table),
}

impl Value {
    /// Return the integer if this value is one.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            Value::Table(_) => None,
        }
    }

    /// Return the nested table if this value is one.
    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Value::Table(table) => Some(table),
            Value::Integer(_) => None,
        }
    }
}

macro_rules! integer_from {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(n: $ty) -> Self {
                    Value::Integer(i64::from(n))
                }
            }
        )*
    };
}

integer_from!(i8, i16, i32, i64, u8, u16, u32);

impl From<Table> for Value {
    fn from(table: Table) -> Self {
        Value::Table(table)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "{}", n),
            Value::Table(table) => write!(f, "{}", table),
        }
    }
}

/// A mapping from string keys to [`Value`]s.
///
/// Keys are kept sorted so that iteration and display are deterministic.
/// Binding a key that is already present replaces its value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Table {
    entries: BTreeMap<String, Value>,
}

impl Table {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `value` under `key`, returning the previous value if any.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.entries.insert(key.into(), value.into())
    }

    /// Move every binding of `other` into this table, overwriting shared keys.
    pub fn merge(&mut self, other: Table) {
        self.entries.extend(other.entries);
    }

    /// Look up a key in this table.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    /// Follow a chain of keys through nested tables.
    ///
    /// `table.get_path(&["variables", "n"])` is the host-side equivalent of
    /// `table.variables.n` in script code.
    pub fn get_path(&self, path: &[&str]) -> Option<&Value> {
        let (last, parents) = path.split_last()?;
        let mut current = self;
        for key in parents {
            current = current.get(key)?.as_table()?;
        }
        current.get(last)
    }

    /// Check whether `key` is bound.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over the bindings in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (key, value)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, " {} = {}", key, value)?;
        }
        if !self.is_empty() {
            f.write_str(" ")?;
        }
        f.write_str("}")
    }
}

impl<'a> IntoIterator for &'a Table {
    type Item = (&'a String, &'a Value);
    type IntoIter = std::collections::btree_map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_overwrites() {
        let mut table = Table::new();
        assert!(table.set("n", 1).is_none());
        assert_eq!(table.set("n", 2), Some(Value::Integer(1)));
        assert_eq!(table.get("n"), Some(&Value::Integer(2)));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_merge_overwrites_shared_keys() {
        let mut table = Table::new();
        table.set("kept", 1);
        table.set("n", 2);
        let mut other = Table::new();
        other.set("n", 3);

        table.merge(other);

        assert_eq!(table.get("kept"), Some(&Value::Integer(1)));
        assert_eq!(table.get("n"), Some(&Value::Integer(3)));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_get_path() {
        let mut inner = Table::new();
        inner.set("n", 42);
        let mut outer = Table::new();
        outer.set("variables", inner);

        assert_eq!(outer.get_path(&["variables", "n"]), Some(&Value::Integer(42)));
        assert_eq!(outer.get_path(&["variables", "missing"]), None);
        // Walking through an integer fails rather than panicking
        assert_eq!(outer.get_path(&["variables", "n", "deeper"]), None);
        assert_eq!(outer.get_path(&[]), None);
    }

    #[test]
    fn test_display() {
        let mut inner = Table::new();
        inner.set("n", 7);
        let mut outer = Table::new();
        outer.set("variables", inner);
        assert_eq!(outer.to_string(), "{ variables = { n = 7 } }");
        assert_eq!(Table::new().to_string(), "{}");
    }

    #[test]
    fn test_value_accessors() {
        assert_eq!(Value::Integer(1).as_integer(), Some(1));
        assert!(Value::Integer(1).as_table().is_none());
        assert!(Value::Table(Table::new()).as_integer().is_none());
    }
}
