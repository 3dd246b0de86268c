use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// Variable-length value storage with explicit ownership
///
/// `Owned` buffers belong to the value. `Shared` buffers borrow a pinned
/// source: the `Arc` keeps the source alive for as long as the value holds
/// it, so a shallow assignment can never dangle. Mutation goes through
/// [`Buffer::to_mut`], which copies a shared source before writing.
pub enum Buffer<T: ?Sized + ToOwned> {
    Owned(T::Owned),
    Shared(Arc<T>),
}

impl<T: ?Sized + ToOwned> Buffer<T> {
    pub fn is_owned(&self) -> bool {
        matches!(self, Buffer::Owned(_))
    }

    pub fn is_shared(&self) -> bool {
        matches!(self, Buffer::Shared(_))
    }

    /// Mutable access to owned content, copying a shared source first
    pub fn to_mut(&mut self) -> &mut T::Owned {
        if let Buffer::Shared(shared) = self {
            *self = Buffer::Owned((**shared).to_owned());
        }
        match self {
            Buffer::Owned(owned) => owned,
            Buffer::Shared(_) => unreachable!(),
        }
    }

    /// Copy of the content that never shares storage with `self`
    pub fn deep_copy(&self) -> Self {
        Buffer::Owned(self.deref().to_owned())
    }
}

impl<T: ?Sized + ToOwned> Deref for Buffer<T> {
    type Target = T;

    fn deref(&self) -> &T {
        match self {
            Buffer::Owned(owned) => owned.borrow(),
            Buffer::Shared(shared) => shared,
        }
    }
}

impl<T: ?Sized + ToOwned> Clone for Buffer<T>
where
    T::Owned: Clone,
{
    fn clone(&self) -> Self {
        match self {
            Buffer::Owned(owned) => Buffer::Owned(owned.clone()),
            Buffer::Shared(shared) => Buffer::Shared(Arc::clone(shared)),
        }
    }
}

impl<T: ?Sized + ToOwned + fmt::Debug> fmt::Debug for Buffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Buffer::Owned(_) => f.debug_tuple("Owned").field(&self.deref()).finish(),
            Buffer::Shared(_) => f.debug_tuple("Shared").field(&self.deref()).finish(),
        }
    }
}

impl<T: ?Sized + ToOwned + PartialEq> PartialEq for Buffer<T> {
    fn eq(&self, other: &Self) -> bool {
        self.deref() == other.deref()
    }
}

impl From<String> for Buffer<str> {
    fn from(value: String) -> Self {
        Buffer::Owned(value)
    }
}

impl From<&str> for Buffer<str> {
    fn from(value: &str) -> Self {
        Buffer::Owned(value.to_string())
    }
}

impl From<Arc<str>> for Buffer<str> {
    fn from(value: Arc<str>) -> Self {
        Buffer::Shared(value)
    }
}

impl From<Vec<u8>> for Buffer<[u8]> {
    fn from(value: Vec<u8>) -> Self {
        Buffer::Owned(value)
    }
}

impl From<&[u8]> for Buffer<[u8]> {
    fn from(value: &[u8]) -> Self {
        Buffer::Owned(value.to_vec())
    }
}

impl From<Arc<[u8]>> for Buffer<[u8]> {
    fn from(value: Arc<[u8]>) -> Self {
        Buffer::Shared(value)
    }
}
