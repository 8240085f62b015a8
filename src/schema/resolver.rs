//! Column resolver: binds field bindings to header columns.

use std::collections::HashMap;
use std::fmt;

use tracing::debug;

use crate::error::{ErrorList, SheetError, SheetResult};
use crate::grid::cell_label;

use super::walker::{Conversion, FieldBinding};

/// Skip policies applied while resolving.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Record fields without a header column are dropped instead of failing.
    pub allow_skip_fields: bool,
    /// Header columns without a record field are ignored instead of failing.
    pub allow_skip_columns: bool,
}

/// A field binding bound to a zero-based header column.
pub struct Mapping<R> {
    pub(crate) binding: FieldBinding<R>,
    pub(crate) column: usize,
}

impl<R> Mapping<R> {
    pub fn binding(&self) -> &FieldBinding<R> {
        &self.binding
    }

    pub fn column_index(&self) -> usize {
        self.column
    }
}

impl<R> Clone for Mapping<R> {
    fn clone(&self) -> Self {
        Self {
            binding: self.binding.clone(),
            column: self.column,
        }
    }
}

impl<R> fmt::Debug for Mapping<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mapping")
            .field("column", &self.column)
            .field("binding", &self.binding)
            .finish()
    }
}

/// Match `bindings` against `header`.
///
/// Header names are compared verbatim and scanning stops at the first empty header cell. A
/// repeated name refers to its first column only. A name is consumed by the first binding that
/// matches it, so later bindings with the same column name are treated as missing. `record` is
/// used in error messages.
pub fn resolve<R>(
    bindings: &[FieldBinding<R>],
    header: &[String],
    record: &str,
    opts: ResolveOptions,
) -> SheetResult<Vec<Mapping<R>>> {
    let mut available: HashMap<&str, usize> = HashMap::new();
    for (index, name) in header.iter().enumerate() {
        if name.is_empty() {
            break;
        }
        available.entry(name.as_str()).or_insert(index);
    }

    let mut mappings = Vec::with_capacity(bindings.len());
    for binding in bindings {
        let column = available.remove(binding.column.as_str());

        match column {
            Some(column) => {
                if let Conversion::Unsupported { type_name } = binding.conversion {
                    return Err(SheetError::UnsupportedType {
                        field: binding.qualified_name(record),
                        type_name,
                    });
                }
                mappings.push(Mapping {
                    binding: binding.clone(),
                    column,
                });
            }
            None if opts.allow_skip_fields => {
                debug!(record, column = %binding.column, "skipping field without column");
            }
            None => {
                return Err(SheetError::FieldNotFoundInSheet {
                    field: binding.qualified_name(record),
                    column: binding.column.clone(),
                });
            }
        }
    }

    let mut leftover: Vec<usize> = available.into_values().collect();
    if !leftover.is_empty() {
        leftover.sort_unstable();
        if opts.allow_skip_columns {
            debug!(record, columns = leftover.len(), "ignoring unmapped columns");
        } else {
            let errors = leftover
                .into_iter()
                .map(|index| SheetError::FieldNotFoundInRecord {
                    column: header[index].clone(),
                    cell: cell_label(index, 1),
                })
                .collect();
            return Err(SheetError::Multiple(ErrorList::new(errors)));
        }
    }

    if mappings.is_empty() {
        return Err(SheetError::NoMapping {
            record: record.to_string(),
        });
    }

    debug!(record, mapped = mappings.len(), "resolved columns");
    Ok(mappings)
}
