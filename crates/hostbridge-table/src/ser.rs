//! Flattening through `serde::Serialize`.
//!
//! Derived `Serialize` impls give a per-type field listing for free, with
//! `#[serde(rename = "...")]` supplying the table keys. Field kinds the table
//! model cannot hold are reported with [`FlattenError::UnsupportedField`].

use serde::ser::{Impossible, Serialize, SerializeStruct, Serializer};

use crate::error::FlattenError;
use crate::value::{Table, Value};
use crate::Result;

/// Flatten a serializable structure into an existing table.
///
/// Fields are collected in a scratch table first, so `table` is only
/// modified when every field converts.
pub fn flatten_serialize_into<T: ?Sized + Serialize>(value: &T, table: &mut Table) -> Result<()> {
    let mut fields = Table::new();
    value.serialize(TopLevel { table: &mut fields })?;
    table.merge(fields);
    Ok(())
}

/// Flatten a serializable structure into a fresh table.
pub fn to_table<T: ?Sized + Serialize>(value: &T) -> Result<Table> {
    let mut table = Table::new();
    flatten_serialize_into(value, &mut table)?;
    Ok(table)
}

fn bind_field<T: ?Sized + Serialize>(table: &mut Table, key: &'static str, value: &T) -> Result<()> {
    let value = value.serialize(FieldSerializer { key })?;
    table.set(key, value);
    Ok(())
}

/// Accepts only a structure and writes its fields into a borrowed table.
struct TopLevel<'a> {
    table: &'a mut Table,
}

struct TopLevelStruct<'a> {
    table: &'a mut Table,
}

impl SerializeStruct for TopLevelStruct<'_> {
    type Ok = ();
    type Error = FlattenError;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, key: &'static str, value: &T) -> Result<()> {
        bind_field(self.table, key, value)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

macro_rules! reject_top_level {
    ($($method:ident($($arg:ty),*) => $kind:literal;)*) => {
        $(
            fn $method(self, $(_: $arg),*) -> Result<Self::Ok> {
                Err(FlattenError::NotAStructure($kind))
            }
        )*
    };
}

impl<'a> Serializer for TopLevel<'a> {
    type Ok = ();
    type Error = FlattenError;
    type SerializeSeq = Impossible<(), FlattenError>;
    type SerializeTuple = Impossible<(), FlattenError>;
    type SerializeTupleStruct = Impossible<(), FlattenError>;
    type SerializeTupleVariant = Impossible<(), FlattenError>;
    type SerializeMap = Impossible<(), FlattenError>;
    type SerializeStruct = TopLevelStruct<'a>;
    type SerializeStructVariant = Impossible<(), FlattenError>;

    reject_top_level! {
        serialize_bool(bool) => "bool";
        serialize_i8(i8) => "integer";
        serialize_i16(i16) => "integer";
        serialize_i32(i32) => "integer";
        serialize_i64(i64) => "integer";
        serialize_i128(i128) => "integer";
        serialize_u8(u8) => "integer";
        serialize_u16(u16) => "integer";
        serialize_u32(u32) => "integer";
        serialize_u64(u64) => "integer";
        serialize_u128(u128) => "integer";
        serialize_f32(f32) => "float";
        serialize_f64(f64) => "float";
        serialize_char(char) => "char";
        serialize_str(&str) => "string";
        serialize_bytes(&[u8]) => "bytes";
        serialize_none() => "option";
        serialize_unit() => "unit";
        serialize_unit_struct(&'static str) => "unit struct";
        serialize_unit_variant(&'static str, u32, &'static str) => "enum";
    }

    fn serialize_some<T: ?Sized + Serialize>(self, _value: &T) -> Result<()> {
        Err(FlattenError::NotAStructure("option"))
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(self, _name: &'static str, value: &T) -> Result<()> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<()> {
        Err(FlattenError::NotAStructure("enum"))
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq> {
        Err(FlattenError::NotAStructure("sequence"))
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple> {
        Err(FlattenError::NotAStructure("tuple"))
    }

    fn serialize_tuple_struct(self, _name: &'static str, _len: usize) -> Result<Self::SerializeTupleStruct> {
        Err(FlattenError::NotAStructure("tuple struct"))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        Err(FlattenError::NotAStructure("enum"))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap> {
        Err(FlattenError::NotAStructure("map"))
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Self::SerializeStruct> {
        Ok(TopLevelStruct { table: self.table })
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        Err(FlattenError::NotAStructure("enum"))
    }
}

/// Converts a single field value; `key` is only used for error reporting.
struct FieldSerializer {
    key: &'static str,
}

impl FieldSerializer {
    fn unsupported(&self, kind: &'static str) -> FlattenError {
        FlattenError::UnsupportedField {
            key: self.key.to_string(),
            kind,
        }
    }

    fn overflow(&self, value: impl ToString) -> FlattenError {
        FlattenError::IntegerOverflow {
            key: self.key.to_string(),
            value: value.to_string(),
        }
    }
}

/// Collects the fields of a nested structure into its own table.
struct NestedStruct {
    table: Table,
}

impl SerializeStruct for NestedStruct {
    type Ok = Value;
    type Error = FlattenError;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, key: &'static str, value: &T) -> Result<()> {
        bind_field(&mut self.table, key, value)
    }

    fn end(self) -> Result<Value> {
        Ok(Value::Table(self.table))
    }
}

macro_rules! reject_field {
    ($($method:ident($($arg:ty),*) => $kind:literal;)*) => {
        $(
            fn $method(self, $(_: $arg),*) -> Result<Self::Ok> {
                Err(self.unsupported($kind))
            }
        )*
    };
}

impl Serializer for FieldSerializer {
    type Ok = Value;
    type Error = FlattenError;
    type SerializeSeq = Impossible<Value, FlattenError>;
    type SerializeTuple = Impossible<Value, FlattenError>;
    type SerializeTupleStruct = Impossible<Value, FlattenError>;
    type SerializeTupleVariant = Impossible<Value, FlattenError>;
    type SerializeMap = Impossible<Value, FlattenError>;
    type SerializeStruct = NestedStruct;
    type SerializeStructVariant = Impossible<Value, FlattenError>;

    fn serialize_i8(self, v: i8) -> Result<Value> {
        Ok(Value::Integer(v.into()))
    }

    fn serialize_i16(self, v: i16) -> Result<Value> {
        Ok(Value::Integer(v.into()))
    }

    fn serialize_i32(self, v: i32) -> Result<Value> {
        Ok(Value::Integer(v.into()))
    }

    fn serialize_i64(self, v: i64) -> Result<Value> {
        Ok(Value::Integer(v))
    }

    fn serialize_i128(self, v: i128) -> Result<Value> {
        i64::try_from(v).map(Value::Integer).map_err(|_| self.overflow(v))
    }

    fn serialize_u8(self, v: u8) -> Result<Value> {
        Ok(Value::Integer(v.into()))
    }

    fn serialize_u16(self, v: u16) -> Result<Value> {
        Ok(Value::Integer(v.into()))
    }

    fn serialize_u32(self, v: u32) -> Result<Value> {
        Ok(Value::Integer(v.into()))
    }

    fn serialize_u64(self, v: u64) -> Result<Value> {
        i64::try_from(v).map(Value::Integer).map_err(|_| self.overflow(v))
    }

    fn serialize_u128(self, v: u128) -> Result<Value> {
        i64::try_from(v).map(Value::Integer).map_err(|_| self.overflow(v))
    }

    reject_field! {
        serialize_bool(bool) => "bool";
        serialize_f32(f32) => "float";
        serialize_f64(f64) => "float";
        serialize_char(char) => "char";
        serialize_str(&str) => "string";
        serialize_bytes(&[u8]) => "bytes";
        serialize_none() => "option";
        serialize_unit() => "unit";
        serialize_unit_struct(&'static str) => "unit struct";
        serialize_unit_variant(&'static str, u32, &'static str) => "enum";
    }

    fn serialize_some<T: ?Sized + Serialize>(self, _value: &T) -> Result<Value> {
        Err(self.unsupported("option"))
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(self, _name: &'static str, value: &T) -> Result<Value> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _value: &T,
    ) -> Result<Value> {
        Err(self.unsupported("enum"))
    }

    fn serialize_seq(self, _len: Option<usize>) -> Result<Self::SerializeSeq> {
        Err(self.unsupported("sequence"))
    }

    fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple> {
        Err(self.unsupported("tuple"))
    }

    fn serialize_tuple_struct(self, _name: &'static str, _len: usize) -> Result<Self::SerializeTupleStruct> {
        Err(self.unsupported("tuple struct"))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeTupleVariant> {
        Err(self.unsupported("enum"))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap> {
        Err(self.unsupported("map"))
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Self::SerializeStruct> {
        Ok(NestedStruct { table: Table::new() })
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        _variant: &'static str,
        _len: usize,
    ) -> Result<Self::SerializeStructVariant> {
        Err(self.unsupported("enum"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Inner {
        #[serde(rename = "n")]
        n: u8,
    }

    #[derive(Serialize)]
    struct Outer {
        #[serde(rename = "inner")]
        inner: Inner,
        #[serde(rename = "count")]
        count: i32,
    }

    #[derive(Serialize)]
    struct WithFloat {
        ratio: f64,
    }

    #[derive(Serialize)]
    struct Wrapper(Inner);

    #[test]
    fn test_nested_struct() {
        let table = to_table(&Outer { inner: Inner { n: 3 }, count: -1 }).unwrap();
        assert_eq!(table.get_path(&["inner", "n"]), Some(&Value::Integer(3)));
        assert_eq!(table.get("count"), Some(&Value::Integer(-1)));
    }

    #[test]
    fn test_float_field_rejected() {
        let err = to_table(&WithFloat { ratio: 0.5 }).unwrap_err();
        assert_eq!(
            err,
            FlattenError::UnsupportedField {
                key: "ratio".to_string(),
                kind: "float",
            }
        );
    }

    #[test]
    fn test_top_level_must_be_struct() {
        assert_eq!(to_table(&5_i64).unwrap_err(), FlattenError::NotAStructure("integer"));
        assert_eq!(to_table(&vec![1, 2]).unwrap_err(), FlattenError::NotAStructure("sequence"));
    }

    #[test]
    fn test_newtype_struct_is_transparent() {
        let table = to_table(&Wrapper(Inner { n: 9 })).unwrap();
        assert_eq!(table.get("n"), Some(&Value::Integer(9)));
    }
}
