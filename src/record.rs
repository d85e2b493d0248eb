//! Record type descriptors
//!
//! A [`RecordType`] stands in for runtime reflection: it is the ordered list
//! of declared field names of a record type plus a table of accessors keyed
//! by their `get<Field>` name. Rows are rendered by resolving those accessors
//! by name, so a declared field without a matching accessor is reported as a
//! conversion failure at render time, never here.
//!
//! # Examples
//!
//! ```
//! use recordsheet::RecordType;
//!
//! struct Account {
//!     id: u32,
//!     owner: Option<String>,
//! }
//!
//! let record_type = RecordType::<Account>::new("Account")
//!     .field("id", |a: &Account| a.id)
//!     .field("owner", |a: &Account| a.owner.clone());
//!
//! assert_eq!(record_type.fields(), ["id", "owner"]);
//! assert!(record_type.has_accessor("getOwner"));
//! ```

use crate::error::AccessError;
use crate::schema::capitalize_initial_letter;
use crate::types::CellValue;
use std::collections::HashMap;
use std::fmt;

/// Zero-argument field reader
pub type Accessor<T> = Box<dyn Fn(&T) -> Result<CellValue, AccessError>>;

/// Ordered field declarations and named accessors for one record type
pub struct RecordType<T> {
    name: String,
    fields: Vec<String>,
    accessors: HashMap<String, Accessor<T>>,
}

impl<T> RecordType<T> {
    /// Create an empty descriptor; `name` is the type's simple name
    pub fn new(name: impl Into<String>) -> Self {
        RecordType {
            name: name.into(),
            fields: Vec::new(),
            accessors: HashMap::new(),
        }
    }

    /// Declare a field and register its `get<Field>` accessor
    pub fn field<V, F>(self, name: &str, read: F) -> Self
    where
        V: Into<CellValue>,
        F: Fn(&T) -> V + 'static,
    {
        let accessor = accessor_name(name);
        self.declare(name).accessor(&accessor, read)
    }

    /// Declare a field whose accessor can fail
    pub fn try_field<V, E, F>(self, name: &str, read: F) -> Self
    where
        V: Into<CellValue>,
        E: fmt::Display,
        F: Fn(&T) -> Result<V, E> + 'static,
    {
        let accessor = accessor_name(name);
        self.declare(name).try_accessor(&accessor, read)
    }

    /// Declare a field without registering any accessor
    pub fn declare(mut self, name: &str) -> Self {
        self.fields.push(name.to_string());
        self
    }

    /// Register an accessor under an explicit name, replacing any earlier one
    pub fn accessor<V, F>(mut self, accessor: &str, read: F) -> Self
    where
        V: Into<CellValue>,
        F: Fn(&T) -> V + 'static,
    {
        self.accessors
            .insert(accessor.to_string(), Box::new(move |r: &T| Ok(read(r).into())));
        self
    }

    /// Register a fallible accessor under an explicit name
    pub fn try_accessor<V, E, F>(mut self, accessor: &str, read: F) -> Self
    where
        V: Into<CellValue>,
        E: fmt::Display,
        F: Fn(&T) -> Result<V, E> + 'static,
    {
        let owned = accessor.to_string();
        self.accessors.insert(
            accessor.to_string(),
            Box::new(move |r: &T| {
                read(r)
                    .map(Into::into)
                    .map_err(|e| AccessError::failed(owned.as_str(), e.to_string()))
            }),
        );
        self
    }

    /// Simple name of the record type
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared field names, in declaration order
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn has_accessor(&self, accessor: &str) -> bool {
        self.accessors.contains_key(accessor)
    }

    /// Resolve `get<display_name>` and read it from `record`
    pub fn read(&self, display_name: &str, record: &T) -> Result<CellValue, AccessError> {
        let accessor = format!("get{}", display_name);
        match self.accessors.get(&accessor) {
            Some(read) => read(record),
            None => Err(AccessError::Missing { accessor }),
        }
    }
}

impl<T> fmt::Debug for RecordType<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut accessors: Vec<&String> = self.accessors.keys().collect();
        accessors.sort();
        f.debug_struct("RecordType")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .field("accessors", &accessors)
            .finish()
    }
}

fn accessor_name(field: &str) -> String {
    format!("get{}", capitalize_initial_letter(field))
}

/// A type that describes its own fields
pub trait Record: Sized {
    fn record_type() -> RecordType<Self>;
}

/// Build a [`RecordType`] from a struct name and its field list
///
/// Each field is read with `Clone` and converted through `CellValue::from`.
///
/// ```
/// use recordsheet::record_type;
///
/// #[derive(Clone)]
/// struct Point {
///     x: i32,
///     y: i32,
/// }
///
/// let rt = record_type!(Point { x, y });
/// assert_eq!(rt.name(), "Point");
/// assert_eq!(rt.fields(), ["x", "y"]);
/// ```
#[macro_export]
macro_rules! record_type {
    ($ty:ident { $($field:ident),* $(,)? }) => {
        $crate::RecordType::<$ty>::new(stringify!($ty))
            $(.field(stringify!($field), |r: &$ty| $crate::CellValue::from(r.$field.clone())))*
    };
}

/// Implement [`Record`] for a struct from its field list
#[macro_export]
macro_rules! impl_record {
    ($ty:ident { $($field:ident),* $(,)? }) => {
        impl $crate::Record for $ty {
            fn record_type() -> $crate::RecordType<Self> {
                $crate::record_type!($ty { $($field),* })
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Person {
        name: String,
        age: u32,
        nickname: Option<String>,
    }

    fn person() -> Person {
        Person {
            name: "  Alice ".to_string(),
            age: 30,
            nickname: None,
        }
    }

    #[test]
    fn test_field_registers_get_accessor() {
        let rt = RecordType::<Person>::new("Person")
            .field("name", |p: &Person| p.name.clone())
            .field("age", |p: &Person| p.age);

        assert_eq!(rt.fields(), ["name", "age"]);
        assert!(rt.has_accessor("getName"));
        assert!(rt.has_accessor("getAge"));
        assert_eq!(rt.read("Age", &person()).unwrap(), CellValue::UInt(30));
    }

    #[test]
    fn test_declared_field_without_accessor() {
        let rt = RecordType::<Person>::new("Person").declare("foo");

        let err = rt.read("Foo", &person()).unwrap_err();
        assert_eq!(
            err,
            AccessError::Missing {
                accessor: "getFoo".to_string()
            }
        );
    }

    #[test]
    fn test_try_field_failure_is_reported() {
        let rt = RecordType::<Person>::new("Person").try_field("nickname", |p: &Person| {
            p.nickname.clone().ok_or("nickname not loaded")
        });

        match rt.read("Nickname", &person()) {
            Err(AccessError::Failed { accessor, message }) => {
                assert_eq!(accessor, "getNickname");
                assert_eq!(message, "nickname not loaded");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_explicit_accessor_name() {
        let rt = RecordType::<Person>::new("Person")
            .declare("name")
            .accessor("getName", |p: &Person| p.name.len());

        assert_eq!(rt.read("Name", &person()).unwrap(), CellValue::UInt(8));
    }

    #[derive(Clone)]
    struct Order {
        id: i64,
        note: Option<String>,
    }

    impl_record!(Order { id, note });

    #[test]
    fn test_impl_record_macro() {
        let rt = Order::record_type();
        let order = Order {
            id: 9,
            note: Some("rush".to_string()),
        };

        assert_eq!(rt.name(), "Order");
        assert_eq!(rt.fields(), ["id", "note"]);
        assert_eq!(rt.read("Id", &order).unwrap(), CellValue::Int(9));
        assert_eq!(
            rt.read("Note", &order).unwrap(),
            CellValue::String("rush".to_string())
        );
    }
}
