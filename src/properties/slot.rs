use std::any::Any;
use std::fmt;
use std::sync::Arc;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Shared byte buffer holding image, alpha or audio data.
///
/// Cloning a `Buffer` aliases the same bytes; in-place writes through one handle are visible
/// through every other.
#[derive(Clone, Default)]
pub struct Buffer {
    bytes: Arc<RwLock<Vec<u8>>>,
}

impl Buffer {
    /// Wrap owned bytes.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes: Arc::new(RwLock::new(bytes)),
        }
    }

    /// Allocate `len` zero bytes.
    pub fn zeroed(len: usize) -> Self {
        Self::new(vec![0; len])
    }

    /// Current length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.read().len()
    }

    /// Whether the buffer holds no bytes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Borrow the bytes for reading.
    pub fn read(&self) -> RwLockReadGuard<'_, Vec<u8>> {
        self.bytes.read()
    }

    /// Borrow the bytes for in-place writing.
    pub fn write(&self) -> RwLockWriteGuard<'_, Vec<u8>> {
        self.bytes.write()
    }

    /// Copy the bytes out.
    pub fn to_vec(&self) -> Vec<u8> {
        self.bytes.read().clone()
    }

    /// Whether both handles alias the same bytes.
    pub fn ptr_eq(&self, other: &Buffer) -> bool {
        Arc::ptr_eq(&self.bytes, &other.bytes)
    }

    /// Take the bytes back if this is the only handle left.
    pub fn into_unique(self) -> Result<Vec<u8>, Buffer> {
        Arc::try_unwrap(self.bytes)
            .map(RwLock::into_inner)
            .map_err(|bytes| Buffer { bytes })
    }
}

impl From<Vec<u8>> for Buffer {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("ptr", &Arc::as_ptr(&self.bytes))
            .field("len", &self.len())
            .finish()
    }
}

/// Release hook run when a data slot holding a buffer is replaced, removed or dropped.
pub type Deleter = Box<dyn FnOnce(Buffer) + Send + Sync>;

/// Value carried by a [`DataSlot`].
#[derive(Clone)]
pub enum Payload {
    /// Raw bytes.
    Bytes(Buffer),
    /// Any other shared object (service handles, profiles, opaque interop state).
    Object(Arc<dyn Any + Send + Sync>),
}

/// An owned resource stored by value in a property carrier.
///
/// A slot with a deleter owns its buffer and hands it to the deleter on release; a slot without
/// one is a borrowed alias whose memory is released by whoever installed the owning slot.
pub struct DataSlot {
    payload: Option<Payload>,
    size: usize,
    deleter: Option<Deleter>,
}

impl DataSlot {
    /// Slot owning `buffer`; `size` 0 means "not tracked".
    pub fn owned(buffer: Buffer, size: usize, deleter: Option<Deleter>) -> Self {
        Self {
            payload: Some(Payload::Bytes(buffer)),
            size,
            deleter,
        }
    }

    /// Slot aliasing a buffer owned elsewhere.
    pub fn borrowed(buffer: Buffer, size: usize) -> Self {
        Self::owned(buffer, size, None)
    }

    /// Slot holding a shared object.
    pub fn object<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            payload: Some(Payload::Object(Arc::new(value))),
            size: 0,
            deleter: None,
        }
    }

    /// Borrowed alias of this slot's payload: same bytes or object, no deleter.
    pub fn alias(&self) -> Option<DataSlot> {
        Some(DataSlot {
            payload: Some(self.payload.clone()?),
            size: self.size,
            deleter: None,
        })
    }

    /// Tracked size in bytes, 0 when untracked.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Whether the slot releases its buffer through a deleter.
    pub fn has_deleter(&self) -> bool {
        self.deleter.is_some()
    }

    /// Buffer payload, if this slot holds bytes.
    pub fn buffer(&self) -> Option<&Buffer> {
        match &self.payload {
            Some(Payload::Bytes(b)) => Some(b),
            _ => None,
        }
    }

    /// Object payload downcast to `T`.
    pub fn object_as<T: Any + Send + Sync + Clone>(&self) -> Option<T> {
        match &self.payload {
            Some(Payload::Object(o)) => o.clone().downcast::<T>().ok().map(|v| (*v).clone()),
            _ => None,
        }
    }
}

impl Drop for DataSlot {
    fn drop(&mut self) {
        if let (Some(deleter), Some(Payload::Bytes(buffer))) =
            (self.deleter.take(), self.payload.take())
        {
            deleter(buffer);
        }
    }
}

impl fmt::Debug for DataSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.payload {
            Some(Payload::Bytes(_)) => "bytes",
            Some(Payload::Object(_)) => "object",
            None => "empty",
        };
        f.debug_struct("DataSlot")
            .field("kind", &kind)
            .field("size", &self.size)
            .field("owned", &self.deleter.is_some())
            .finish()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/properties/slot.rs"]
mod tests;
