//! Process-wide cache of compiled field bindings, keyed by record type and tag name.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use once_cell::sync::Lazy;
use tracing::debug;

use super::record::Record;
use super::walker::{walk, FieldBinding};

type Compiled = Arc<dyn Any + Send + Sync>;

static REG: Lazy<Mutex<HashMap<(TypeId, String), Compiled>>> = Lazy::new(|| Mutex::new(HashMap::new()));

/// Bindings of `R` under `tag`, walked on first use and shared afterwards.
pub fn bindings_for<R: Record>(tag: &str) -> Arc<Vec<FieldBinding<R>>> {
    let key = (TypeId::of::<R>(), tag.to_string());
    if let Some(hit) = REG.lock().unwrap_or_else(PoisonError::into_inner).get(&key).cloned() {
        if let Ok(bindings) = hit.downcast::<Vec<FieldBinding<R>>>() {
            return bindings;
        }
    }

    // Walk without holding the lock; nested records walk their own children.
    let bindings = Arc::new(walk::<R>(tag));
    debug!(record = R::record_name(), tag, leaves = bindings.len(), "compiled record schema");

    let mut reg = REG.lock().unwrap_or_else(PoisonError::into_inner);
    let entry = reg.entry(key).or_insert_with(|| bindings.clone() as Compiled);
    Arc::clone(entry)
        .downcast::<Vec<FieldBinding<R>>>()
        .unwrap_or(bindings)
}

/// Number of cached `(type, tag)` entries.
pub fn cached_schemas() -> usize {
    REG.lock().unwrap_or_else(PoisonError::into_inner).len()
}
