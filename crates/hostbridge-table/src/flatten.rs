//! Statically declared structure-to-table mappings.

use crate::error::FlattenError;
use crate::value::{Table, Value};
use crate::Result;

/// A structure that knows how to bind its fields into a [`Table`].
///
/// Implementations list every field with its target key, in declaration
/// order. Most types get this from [`table_struct!`](crate::table_struct).
pub trait Flatten {
    /// Bind every field of `self` into `table`.
    ///
    /// The table may already hold entries; fields overwrite keys they share
    /// with them and leave the rest alone.
    fn flatten_into(&self, table: &mut Table) -> Result<()>;

    /// Flatten into a fresh table.
    fn to_table(&self) -> Result<Table> {
        let mut table = Table::new();
        self.flatten_into(&mut table)?;
        Ok(table)
    }
}

/// A field type with a table representation.
///
/// Only integers and nested [`Flatten`] structures implement this, so a
/// structure with any other field kind fails to compile instead of silently
/// dropping the field.
pub trait FieldValue {
    /// Convert the field stored under `key` into a [`Value`].
    fn to_value(&self, key: &str) -> Result<Value>;
}

macro_rules! lossless_integer {
    ($($ty:ty),*) => {
        $(
            impl FieldValue for $ty {
                fn to_value(&self, _key: &str) -> Result<Value> {
                    Ok(Value::Integer(i64::from(*self)))
                }
            }
        )*
    };
}

macro_rules! checked_integer {
    ($($ty:ty),*) => {
        $(
            impl FieldValue for $ty {
                fn to_value(&self, key: &str) -> Result<Value> {
                    i64::try_from(*self)
                        .map(Value::Integer)
                        .map_err(|_| FlattenError::IntegerOverflow {
                            key: key.to_string(),
                            value: self.to_string(),
                        })
                }
            }
        )*
    };
}

lossless_integer!(i8, i16, i32, i64, u8, u16, u32);
checked_integer!(isize, usize, u64, i128, u128);

impl FieldValue for Table {
    fn to_value(&self, _key: &str) -> Result<Value> {
        Ok(Value::Table(self.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Point {
        x: i32,
        y: u64,
    }

    impl Flatten for Point {
        fn flatten_into(&self, table: &mut Table) -> Result<()> {
            table.set("x", self.x.to_value("x")?);
            table.set("y", self.y.to_value("y")?);
            Ok(())
        }
    }

    #[test]
    fn test_manual_impl() {
        let table = Point { x: -3, y: 9 }.to_table().unwrap();
        assert_eq!(table.get("x"), Some(&Value::Integer(-3)));
        assert_eq!(table.get("y"), Some(&Value::Integer(9)));
    }

    #[test]
    fn test_unsigned_overflow() {
        let err = Point { x: 0, y: u64::MAX }.to_table().unwrap_err();
        assert_eq!(
            err,
            FlattenError::IntegerOverflow {
                key: "y".to_string(),
                value: u64::MAX.to_string(),
            }
        );
    }

    #[test]
    fn test_partially_filled_table() {
        let mut table = Table::new();
        table.set("x", 100);
        table.set("other", 5);

        Point { x: 1, y: 2 }.flatten_into(&mut table).unwrap();

        assert_eq!(table.get("x"), Some(&Value::Integer(1)));
        assert_eq!(table.get("other"), Some(&Value::Integer(5)));
        assert_eq!(table.len(), 3);
    }
}
