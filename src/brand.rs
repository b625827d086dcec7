//! Zero-cost nominal tags.
//!
//! [`Branded<T, B>`] has the same layout as `T` but is a different type for
//! every brand `B`, so a function can require "an id that came from the
//! server" rather than any string. Branding performs no check. Only brand
//! values that have already passed [`check`](crate::validate::check) or
//! [`parse`](crate::validate::parse).

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::ops::Deref;

/// A `T` tagged with brand `B`.
///
/// # Examples
///
/// ```
/// use apiwire::brand::Branded;
///
/// enum Validated {}
///
/// let id: Branded<String, Validated> = Branded::new("f1".to_string());
/// assert_eq!(id.len(), 2);
/// assert_eq!(id.into_inner(), "f1");
/// ```
#[repr(transparent)]
pub struct Branded<T, B> {
    value: T,
    _brand: PhantomData<fn() -> B>,
}

impl<T, B> Branded<T, B> {
    /// Tags `value` without inspecting it.
    pub const fn new(value: T) -> Self {
        Self {
            value,
            _brand: PhantomData,
        }
    }

    /// Removes the tag.
    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T, B> Deref for Branded<T, B> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T, B> AsRef<T> for Branded<T, B> {
    fn as_ref(&self) -> &T {
        &self.value
    }
}

impl<T: Clone, B> Clone for Branded<T, B> {
    fn clone(&self) -> Self {
        Self::new(self.value.clone())
    }
}

impl<T: fmt::Debug, B> fmt::Debug for Branded<T, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.value.fmt(f)
    }
}

impl<T: PartialEq, B> PartialEq for Branded<T, B> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T: Eq, B> Eq for Branded<T, B> {}

impl<T: Hash, B> Hash for Branded<T, B> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}
