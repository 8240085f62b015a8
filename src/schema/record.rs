//! Record description API.
//!
//! A [`Record`] lists its fields once through [`Fields`]. The description is pure data plus
//! accessor closures; [`super::walker`] turns it into flattened [`super::FieldBinding`]s.

use std::sync::Arc;

use crate::naming;
use crate::types::{CellKind, FieldValue, Value};

use super::walker::{self, FieldBinding};

/// A destination type rows can be materialized into.
///
/// ```rust
/// use sheetbind::schema::{Fields, Record};
///
/// #[derive(Debug, Default)]
/// struct Address {
///     city: String,
///     zip: Option<u32>,
/// }
///
/// impl Record for Address {
///     fn describe(fields: &mut Fields<Self>) {
///         fields.field("city", |a: &mut Address| &mut a.city);
///         fields.field("zip", |a: &mut Address| &mut a.zip).tag("sheet", "postal_code");
///     }
/// }
///
/// #[derive(Debug, Default)]
/// struct Customer {
///     id: u64,
///     address: Option<Address>,
/// }
///
/// impl Record for Customer {
///     fn describe(fields: &mut Fields<Self>) {
///         fields.field("id", |c: &mut Customer| &mut c.id);
///         fields.nested_option("address", |c: &mut Customer| &mut c.address);
///     }
/// }
///
/// assert_eq!(Customer::record_name(), "Customer");
/// ```
pub trait Record: Default + Send + 'static {
    /// Describe every field in declaration order.
    fn describe(fields: &mut Fields<Self>);

    /// Name used in qualified field paths and for the default sheet name.
    fn record_name() -> &'static str {
        naming::short_type_name::<Self>()
    }
}

pub(crate) type Setter<R> = Arc<dyn Fn(&mut R, Value) + Send + Sync>;
pub(crate) type Allocator<R> = Arc<dyn Fn(&mut R) + Send + Sync>;

type Expand<R> = Box<dyn Fn(&str) -> Vec<FieldBinding<R>>>;

pub(crate) enum Shape<R> {
    Leaf {
        kind: CellKind,
        optional: bool,
        set: Setter<R>,
    },
    /// Sub-record; expands to the child's bindings lifted into `R`.
    Nested { expand: Expand<R> },
    Opaque { type_name: &'static str },
}

pub(crate) struct FieldDescriptor<R> {
    pub(crate) name: String,
    pub(crate) tags: Vec<(String, String)>,
    pub(crate) exported: bool,
    pub(crate) shape: Shape<R>,
}

impl<R> FieldDescriptor<R> {
    /// Raw annotation value for `tag`, if any.
    pub(crate) fn tag_value(&self, tag: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|(name, _)| name == tag)
            .map(|(_, value)| value.as_str())
    }
}

/// Collects the field descriptions of one record type.
pub struct Fields<R> {
    entries: Vec<FieldDescriptor<R>>,
}

impl<R: Record> Fields<R> {
    pub(crate) fn new() -> Self {
        Self { entries: Vec::new() }
    }

    pub(crate) fn into_entries(self) -> Vec<FieldDescriptor<R>> {
        self.entries
    }

    /// A scalar, timestamp or `Option` leaf.
    pub fn field<T, F>(&mut self, name: &str, access: F) -> FieldBuilder<'_, R>
    where
        T: FieldValue,
        F: Fn(&mut R) -> &mut T + Send + Sync + 'static,
    {
        let set: Setter<R> = Arc::new(move |record: &mut R, value: Value| access(record).assign(value));
        self.push(
            name,
            Shape::Leaf {
                kind: T::KIND,
                optional: T::OPTIONAL,
                set,
            },
        )
    }

    /// An embedded sub-record whose leaves are flattened into this record.
    pub fn nested<C, F>(&mut self, name: &str, access: F) -> FieldBuilder<'_, R>
    where
        C: Record,
        F: Fn(&mut R) -> &mut C + Send + Sync + 'static,
    {
        let access = Arc::new(access);
        let expand: Expand<R> = Box::new(move |tag: &str| {
            walker::walk::<C>(tag)
                .into_iter()
                .map(|child| walker::embed_value(child, Arc::clone(&access)))
                .collect()
        });
        self.push(name, Shape::Nested { expand })
    }

    /// An optional sub-record, allocated only when one of its leaves receives a value.
    pub fn nested_option<C, F>(&mut self, name: &str, access: F) -> FieldBuilder<'_, R>
    where
        C: Record,
        F: Fn(&mut R) -> &mut Option<C> + Send + Sync + 'static,
    {
        let access = Arc::new(access);
        let expand: Expand<R> = Box::new(move |tag: &str| {
            walker::walk::<C>(tag)
                .into_iter()
                .map(|child| walker::embed_option(child, Arc::clone(&access)))
                .collect()
        });
        self.push(name, Shape::Nested { expand })
    }

    /// A public field of a type no converter can fill.
    ///
    /// Harmless unless a header column maps to it, in which case parsing fails with
    /// [`crate::SheetError::UnsupportedType`].
    pub fn opaque<T: ?Sized>(&mut self, name: &str) -> FieldBuilder<'_, R> {
        self.push(
            name,
            Shape::Opaque {
                type_name: std::any::type_name::<T>(),
            },
        )
    }

    fn push(&mut self, name: &str, shape: Shape<R>) -> FieldBuilder<'_, R> {
        self.entries.push(FieldDescriptor {
            name: name.to_string(),
            tags: Vec::new(),
            exported: true,
            shape,
        });
        let index = self.entries.len() - 1;
        FieldBuilder {
            entry: &mut self.entries[index],
        }
    }
}

/// Per-field annotations.
pub struct FieldBuilder<'a, R> {
    entry: &'a mut FieldDescriptor<R>,
}

impl<R> FieldBuilder<'_, R> {
    /// Annotate the field under `tag`.
    ///
    /// The first comma-separated segment of `value` is the column name; `-` removes the field.
    pub fn tag(self, tag: &str, value: &str) -> Self {
        match self.entry.tags.iter_mut().find(|(name, _)| name == tag) {
            Some(existing) => existing.1 = value.to_string(),
            None => self.entry.tags.push((tag.to_string(), value.to_string())),
        }
        self
    }

    /// Mark the field as not externally visible; it never takes part in a mapping.
    pub fn private(self) -> Self {
        self.entry.exported = false;
        self
    }
}
