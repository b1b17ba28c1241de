//! Convention values: defaults a model object's attribute takes when the
//! user never assigned it.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use bramble_common::Object;

/// Looks up the convention value of an attribute.
pub trait ConventionProvider: Send + Sync {
    /// The convention for `field` of `owner`, if one is mapped.
    fn convention_value(&self, owner: &Object, field: &str) -> Option<Object>;
}

/// A provider without conventions.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoConventions;

impl ConventionProvider for NoConventions {
    fn convention_value(&self, _owner: &Object, _field: &str) -> Option<Object> {
        None
    }
}

type ConventionFn = Arc<dyn Fn(&Object) -> Option<Object> + Send + Sync>;

/// Conventions mapped per owner type and field name.
#[derive(Default, Clone)]
pub struct ConventionTable {
    mappings: HashMap<(TypeId, String), ConventionFn>,
}

impl ConventionTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps the convention of `field` on owners of type `T`.
    ///
    /// `value` is computed lazily, from the owner, each time it is requested.
    pub fn map<T, F>(mut self, field: &str, value: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&T) -> Option<Object> + Send + Sync + 'static,
    {
        let f: ConventionFn =
            Arc::new(move |owner: &Object| owner.downcast_ref::<T>().and_then(|t| value(t)));
        self.mappings.insert((TypeId::of::<T>(), field.to_string()), f);
        self
    }
}

impl fmt::Debug for ConventionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConventionTable")
            .field("mappings", &self.mappings.len())
            .finish()
    }
}

impl ConventionProvider for ConventionTable {
    fn convention_value(&self, owner: &Object, field: &str) -> Option<Object> {
        let f = self
            .mappings
            .get(&(owner.runtime_type(), field.to_string()))?;
        f(owner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Compile {
        source_level: String,
    }

    #[test]
    fn no_conventions_returns_none() {
        let owner = Object::new(1u8);
        assert!(NoConventions.convention_value(&owner, "x").is_none());
    }

    #[test]
    fn table_resolves_per_owner_type_and_field() {
        let table = ConventionTable::new().map::<Compile, _>("target_level", |c| {
            Some(Object::new(c.source_level.clone()))
        });
        let owner = Object::new(Compile {
            source_level: "17".to_string(),
        });
        let value = table.convention_value(&owner, "target_level").unwrap();
        assert_eq!(value.downcast_ref::<String>().unwrap(), "17");
        assert!(table.convention_value(&owner, "source_level").is_none());
        assert!(table
            .convention_value(&Object::new(0u8), "target_level")
            .is_none());
    }
}
