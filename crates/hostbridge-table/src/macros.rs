/// Declare a structure together with its table mapping.
///
/// Each field names the key it is bound under. Nested structures declared
/// with this macro can be used as field types and become nested tables.
/// If any field fails to convert, the target table is left untouched.
///
/// ```
/// use hostbridge_table::{table_struct, Flatten, Value};
///
/// table_struct! {
///     pub struct Variables {
///         pub n: i64 => "n",
///     }
/// }
///
/// table_struct! {
///     pub struct Registry {
///         pub variables: Variables => "variables",
///     }
/// }
///
/// let registry = Registry { variables: Variables { n: 7 } };
/// let table = registry.to_table().unwrap();
/// assert_eq!(table.get_path(&["variables", "n"]), Some(&Value::Integer(7)));
/// ```
#[macro_export]
macro_rules! table_struct {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$field_meta:meta])*
                $field_vis:vis $field:ident : $ty:ty => $key:literal
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $(
                $(#[$field_meta])*
                $field_vis $field: $ty,
            )*
        }

        impl $crate::Flatten for $name {
            #[allow(unused_mut)]
            fn flatten_into(&self, table: &mut $crate::Table) -> $crate::Result<()> {
                let mut fields = $crate::Table::new();
                $(
                    fields.set($key, $crate::FieldValue::to_value(&self.$field, $key)?);
                )*
                table.merge(fields);
                Ok(())
            }
        }

        impl $crate::FieldValue for $name {
            fn to_value(&self, _key: &str) -> $crate::Result<$crate::Value> {
                $crate::Flatten::to_table(self).map($crate::Value::Table)
            }
        }
    };
}
