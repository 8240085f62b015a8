//! Type descriptor walker: flattens a record description into leaf field bindings.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::convert::Converter;
use crate::types::{CellKind, Value};

use super::record::{Allocator, Fields, Record, Setter, Shape};

/// How a bound leaf turns cell text into a value.
#[derive(Debug, Clone, Copy)]
pub enum Conversion {
    Convert(Converter),
    /// Deferred fault, raised only if the leaf is matched to a column.
    Unsupported { type_name: &'static str },
}

/// One flattened leaf of a record type.
pub struct FieldBinding<R> {
    pub(crate) path: Vec<usize>,
    pub(crate) field_names: Vec<String>,
    pub(crate) column: String,
    pub(crate) optional: bool,
    pub(crate) conversion: Conversion,
    pub(crate) set: Setter<R>,
    pub(crate) alloc: Option<Allocator<R>>,
}

impl<R> Clone for FieldBinding<R> {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            field_names: self.field_names.clone(),
            column: self.column.clone(),
            optional: self.optional,
            conversion: self.conversion,
            set: Arc::clone(&self.set),
            alloc: self.alloc.clone(),
        }
    }
}

impl<R> fmt::Debug for FieldBinding<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldBinding")
            .field("path", &self.path)
            .field("field_names", &self.field_names)
            .field("column", &self.column)
            .field("optional", &self.optional)
            .field("conversion", &self.conversion)
            .field("lazy_alloc", &self.alloc.is_some())
            .finish()
    }
}

impl<R> FieldBinding<R> {
    /// Column name this leaf expects in the header.
    pub fn column(&self) -> &str {
        &self.column
    }

    /// Declaration indices from the root record down to the leaf.
    pub fn path(&self) -> &[usize] {
        &self.path
    }

    /// Field names from the root record down to the leaf.
    pub fn field_names(&self) -> &[String] {
        &self.field_names
    }

    /// Destination kind, or `None` for an unsupported leaf.
    pub fn kind(&self) -> Option<CellKind> {
        match self.conversion {
            Conversion::Convert(c) => Some(c.kind()),
            Conversion::Unsupported { .. } => None,
        }
    }

    /// Whether the leaf itself is an `Option`.
    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// Whether writing this leaf may first allocate an optional sub-record.
    pub fn allocates(&self) -> bool {
        self.alloc.is_some()
    }

    /// Dotted path prefixed by the record name, e.g. `Order.customer.name`.
    pub fn qualified_name(&self, record: &str) -> String {
        let mut out = String::from(record);
        for name in &self.field_names {
            out.push('.');
            out.push_str(name);
        }
        out
    }

    /// Run the pending allocator (if any), then write `value`.
    pub(crate) fn write(&self, record: &mut R, value: Value) {
        if let Some(alloc) = &self.alloc {
            alloc(record);
        }
        (self.set)(record, value);
    }

    fn prefixed(mut self, index: usize, name: &str) -> Self {
        self.path.insert(0, index);
        self.field_names.insert(0, name.to_string());
        self
    }
}

/// Flatten `R` into leaf bindings, depth first in declaration order.
///
/// Private fields and fields annotated with `-` under `tag` are dropped.
pub fn walk<R: Record>(tag: &str) -> Vec<FieldBinding<R>> {
    let mut fields = Fields::new();
    R::describe(&mut fields);

    let mut out = Vec::new();
    for (index, desc) in fields.into_entries().into_iter().enumerate() {
        if !desc.exported {
            debug!(record = R::record_name(), field = %desc.name, "skipping private field");
            continue;
        }
        let column = match desc.tag_value(tag).map(|v| v.split(',').next().unwrap_or_default()) {
            Some("-") => {
                debug!(record = R::record_name(), field = %desc.name, "field ignored by annotation");
                continue;
            }
            Some(name) if !name.is_empty() => name.to_string(),
            _ => desc.name.clone(),
        };

        match desc.shape {
            Shape::Leaf { kind, optional, set } => out.push(FieldBinding {
                path: vec![index],
                field_names: vec![desc.name],
                column,
                optional,
                conversion: Conversion::Convert(Converter::for_kind(kind)),
                set,
                alloc: None,
            }),
            Shape::Opaque { type_name } => out.push(FieldBinding {
                path: vec![index],
                field_names: vec![desc.name],
                column,
                optional: false,
                conversion: Conversion::Unsupported { type_name },
                set: Arc::new(|_: &mut R, _: Value| {}),
                alloc: None,
            }),
            Shape::Nested { expand } => {
                out.extend(expand(tag).into_iter().map(|child| child.prefixed(index, &desc.name)));
            }
        }
    }
    out
}

/// Lift a child binding through an embedded sub-record.
pub(crate) fn embed_value<R, C, A>(child: FieldBinding<C>, access: Arc<A>) -> FieldBinding<R>
where
    R: 'static,
    C: 'static,
    A: Fn(&mut R) -> &mut C + Send + Sync + 'static,
{
    let child_set = child.set;
    let set_access = Arc::clone(&access);
    let set: Setter<R> = Arc::new(move |record: &mut R, value: Value| child_set(set_access(record), value));

    let alloc = child.alloc.map(|inner| {
        let alloc: Allocator<R> = Arc::new(move |record: &mut R| inner(access(record)));
        alloc
    });

    FieldBinding {
        path: child.path,
        field_names: child.field_names,
        column: child.column,
        optional: child.optional,
        conversion: child.conversion,
        set,
        alloc,
    }
}

/// Lift a child binding through an optional sub-record.
///
/// The allocator instantiates the sub-record at most once and then chains to the child's own
/// allocator, so every optional level on the path exists before the leaf is written.
pub(crate) fn embed_option<R, C, A>(child: FieldBinding<C>, access: Arc<A>) -> FieldBinding<R>
where
    R: 'static,
    C: Record,
    A: Fn(&mut R) -> &mut Option<C> + Send + Sync + 'static,
{
    let child_set = child.set;
    let set_access = Arc::clone(&access);
    let set: Setter<R> = Arc::new(move |record: &mut R, value: Value| {
        if let Some(inner) = set_access(record).as_mut() {
            child_set(inner, value);
        }
    });

    let inner_alloc = child.alloc;
    let alloc: Allocator<R> = Arc::new(move |record: &mut R| {
        let inner = access(record).get_or_insert_with(C::default);
        if let Some(inner_alloc) = &inner_alloc {
            inner_alloc(inner);
        }
    });

    FieldBinding {
        path: child.path,
        field_names: child.field_names,
        column: child.column,
        optional: child.optional,
        conversion: child.conversion,
        set,
        alloc: Some(alloc),
    }
}
