//! Shared, nullable handles to engine-backed resources
//!
//! A `Handle<T>` is a cheap value wrapping an `Arc` to an implementation
//! object. Clones share the object; the object is dropped (and its engine
//! resource released) synchronously when the last clone goes away. A null
//! handle refers to nothing: it can be tested and compared, but every other
//! operation on it panics.

use std::fmt;
use std::sync::Arc;

/// Reference-counted, nullable handle
pub struct Handle<T> {
    inner: Option<Arc<T>>,
}

impl<T> Handle<T> {
    /// The null handle
    pub const fn null() -> Self {
        Self { inner: None }
    }

    pub(crate) fn from_impl(object: T) -> Self {
        Self {
            inner: Some(Arc::new(object)),
        }
    }

    pub fn is_null(&self) -> bool {
        self.inner.is_none()
    }

    /// True when the handle refers to an object
    pub fn is_valid(&self) -> bool {
        self.inner.is_some()
    }

    /// Release this share; the object is dropped here if it was the last one
    pub fn reset(&mut self) {
        self.inner = None;
    }

    /// Move the reference out, leaving this handle null
    pub fn take(&mut self) -> Self {
        Self {
            inner: self.inner.take(),
        }
    }

    /// Number of handles sharing the object (0 for null)
    pub fn ref_count(&self) -> usize {
        self.inner.as_ref().map_or(0, Arc::strong_count)
    }

    /// Borrow the object, if any
    pub fn get(&self) -> Option<&T> {
        self.inner.as_deref()
    }

    /// Borrow the object, panicking on a null handle
    #[track_caller]
    pub(crate) fn object(&self) -> &T {
        match self.inner.as_deref() {
            Some(object) => object,
            None => panic!(
                "operation on a null {} handle",
                short_type_name::<T>()
            ),
        }
    }
}

fn short_type_name<T>() -> &'static str {
    let name = std::any::type_name::<T>();
    name.rsplit("::").next().unwrap_or(name)
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> Default for Handle<T> {
    fn default() -> Self {
        Self::null()
    }
}

impl<T> PartialEq for Handle<T> {
    /// Identity comparison
    fn eq(&self, other: &Self) -> bool {
        match (&self.inner, &other.inner) {
            (None, None) => true,
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl<T> Eq for Handle<T> {}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner {
            None => write!(f, "Handle<{}>(null)", short_type_name::<T>()),
            Some(object) => write!(
                f,
                "Handle<{}>({:p}, refs={})",
                short_type_name::<T>(),
                Arc::as_ptr(object),
                Arc::strong_count(object)
            ),
        }
    }
}
