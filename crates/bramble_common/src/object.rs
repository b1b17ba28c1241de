//! Type-erased, shared handles to configuration model values.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// A shared, type-erased handle to a value in the configuration model.
///
/// Cloning an `Object` clones the handle, not the value: two clones refer to
/// the same instance and report the same [`identity`](Self::identity). The
/// runtime type is captured at construction so that codecs can be resolved
/// and errors can name the offending type without reflection.
#[derive(Clone)]
pub struct Object {
    value: Arc<dyn Any + Send + Sync>,
    type_id: TypeId,
    type_name: &'static str,
}

impl Object {
    /// Moves `value` into a new shared instance.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self::from_arc(Arc::new(value))
    }

    /// Wraps an existing shared instance without copying it.
    ///
    /// The resulting handle has the same identity as every other handle
    /// created from a clone of `value`.
    pub fn from_arc<T: Any + Send + Sync>(value: Arc<T>) -> Self {
        Self {
            value,
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Returns the [`TypeId`] of the concrete value.
    pub fn runtime_type(&self) -> TypeId {
        self.type_id
    }

    /// Returns the fully qualified name of the concrete value's type.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns `true` if the concrete value is a `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    /// Borrows the concrete value as a `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    /// Returns a typed shared handle to the concrete value.
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        Arc::clone(&self.value).downcast::<T>().ok()
    }

    /// Returns the instance identity: equal for handles to the same instance,
    /// distinct for live handles to different instances.
    pub fn identity(&self) -> usize {
        Arc::as_ptr(&self.value).cast::<()>() as usize
    }

    /// Returns `true` if both handles refer to the same instance.
    pub fn ptr_eq(&self, other: &Object) -> bool {
        self.identity() == other.identity()
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Object({}@{:#x})", self.type_name, self.identity())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Task {
        name: String,
    }

    #[test]
    fn clones_share_identity() {
        let a = Object::new(Task {
            name: "compile".to_string(),
        });
        let b = a.clone();
        assert!(a.ptr_eq(&b));
        assert_eq!(a.identity(), b.identity());
    }

    #[test]
    fn equal_values_have_distinct_identity() {
        let a = Object::new(String::from("x"));
        let b = Object::new(String::from("x"));
        assert!(!a.ptr_eq(&b));
    }

    #[test]
    fn from_arc_keeps_instance() {
        let task = Arc::new(Task {
            name: "test".to_string(),
        });
        let a = Object::from_arc(Arc::clone(&task));
        let b = Object::from_arc(Arc::clone(&task));
        assert!(a.ptr_eq(&b));
        assert!(Arc::ptr_eq(&a.downcast::<Task>().unwrap(), &task));
    }

    #[test]
    fn runtime_type_and_name() {
        let obj = Object::new(42_i64);
        assert!(obj.is::<i64>());
        assert!(!obj.is::<i32>());
        assert_eq!(obj.runtime_type(), TypeId::of::<i64>());
        assert_eq!(obj.type_name(), "i64");
    }

    #[test]
    fn downcasting() {
        let obj = Object::new(Task {
            name: "jar".to_string(),
        });
        assert_eq!(obj.downcast_ref::<Task>().unwrap().name, "jar");
        assert!(obj.downcast_ref::<String>().is_none());
        assert!(obj.downcast::<String>().is_none());
    }

    #[test]
    fn debug_names_type() {
        let obj = Object::new(String::from("x"));
        let s = format!("{obj:?}");
        assert!(s.starts_with("Object(alloc::string::String@"));
    }
}
