//! Schema compilation.
//!
//! A record type is described once ([`Record::describe`]), flattened into leaf
//! [`FieldBinding`]s ([`walk`], cached by [`bindings_for`]) and matched against a sheet header
//! ([`resolve`]) to produce the per-call [`Mapping`] list.

mod record;
mod registry;
mod resolver;
mod walker;

pub use record::{FieldBuilder, Fields, Record};
pub use registry::{bindings_for, cached_schemas};
pub use resolver::{resolve, Mapping, ResolveOptions};
pub use walker::{walk, Conversion, FieldBinding};
