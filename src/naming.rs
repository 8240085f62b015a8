//! Naming helpers used to derive a default sheet name from a record type.

/// Short name of a Rust type: `my_crate::model::Order<T>` → `Order`.
pub fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// English plural of `word`. Only the matched suffix is rewritten, so CamelCase prefixes keep
/// their casing.
///
/// ```rust
/// use sheetbind::naming::pluralize;
///
/// assert_eq!(pluralize("Workout"), "Workouts");
/// assert_eq!(pluralize("Category"), "Categories");
/// assert_eq!(pluralize("Person"), "People");
/// ```
pub fn pluralize(word: &str) -> String {
    if word.is_empty() {
        return String::new();
    }
    pluralizer::pluralize(word, 2, false)
}
