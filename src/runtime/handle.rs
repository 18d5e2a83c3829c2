//! Instance handles
//!
//! Component code refers to native instances by an opaque `u64`. Handles are
//! issued by an [`InstanceTable`], a generation-checked slot map: the low 32
//! bits hold `slot index + 1` and the high 32 bits the slot's generation. A
//! handle stops resolving as soon as its instance is removed, even after the
//! slot is reused.
//!
//! Because slot index zero is encoded as one, a table holds at most
//! [`MAX_SLOTS`] (`u32::MAX - 1`) slots.

use std::any::{type_name, Any};
use std::fmt;
use thiserror::Error;
use wasmtime::component::Val;

/// Largest number of slots a table can address.
pub const MAX_SLOTS: u32 = u32::MAX - 1;

/// Opaque reference to an instance stored in an [`InstanceTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceHandle(u64);

impl InstanceHandle {
    fn new(index: u32, generation: u32) -> Self {
        Self((u64::from(generation) << 32) | (u64::from(index) + 1))
    }

    /// Reinterpret raw bits received from a component.
    ///
    /// Returns `None` for zero and for any value without a slot index.
    pub fn from_bits(bits: u64) -> Option<Self> {
        if bits as u32 == 0 {
            return None;
        }
        Some(Self(bits))
    }

    /// The raw bits to hand to a component. Never zero.
    pub fn to_bits(self) -> u64 {
        self.0
    }

    fn index(self) -> usize {
        (self.0 as u32 - 1) as usize
    }

    fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }
}

impl fmt::Display for InstanceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

impl From<InstanceHandle> for Val {
    fn from(handle: InstanceHandle) -> Self {
        Val::U64(handle.to_bits())
    }
}

/// Why a handle did not resolve.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HandleError {
    #[error("handle {0} was never issued by this table")]
    Unknown(InstanceHandle),

    #[error("handle {0} refers to a removed instance")]
    Stale(InstanceHandle),

    #[error("handle {handle} does not refer to a `{expected}`")]
    TypeMismatch {
        handle: InstanceHandle,
        expected: &'static str,
    },

    #[error("instance table is full ({capacity} slots)")]
    TableFull { capacity: u32 },
}

struct Slot {
    generation: u32,
    value: Option<Box<dyn Any + Send>>,
}

/// Owns the native instances that components can call into.
pub struct InstanceTable {
    slots: Vec<Slot>,
    free: Vec<u32>,
    len: usize,
    max_slots: u32,
}

impl Default for InstanceTable {
    fn default() -> Self {
        Self::with_max_slots(MAX_SLOTS)
    }
}

impl InstanceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// A table that refuses to grow past `max_slots` slots.
    ///
    /// Values above [`MAX_SLOTS`] are clamped.
    pub fn with_max_slots(max_slots: u32) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
            max_slots: max_slots.min(MAX_SLOTS),
        }
    }

    /// Move `value` into the table and return its handle.
    ///
    /// Freed slots are reused first. Fails with [`HandleError::TableFull`]
    /// once every addressable slot is occupied.
    pub fn insert<T: Any + Send>(&mut self, value: T) -> Result<InstanceHandle, HandleError> {
        let value: Box<dyn Any + Send> = Box::new(value);
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.value = Some(value);
            self.len += 1;
            return Ok(InstanceHandle::new(index, slot.generation));
        }
        let index = u32::try_from(self.slots.len())
            .ok()
            .filter(|index| *index < self.max_slots)
            .ok_or(HandleError::TableFull {
                capacity: self.max_slots,
            })?;
        self.slots.push(Slot {
            generation: 0,
            value: Some(value),
        });
        self.len += 1;
        Ok(InstanceHandle::new(index, 0))
    }

    pub fn get<T: Any>(&self, handle: InstanceHandle) -> Result<&T, HandleError> {
        self.occupied(handle)?
            .downcast_ref::<T>()
            .ok_or(HandleError::TypeMismatch {
                handle,
                expected: type_name::<T>(),
            })
    }

    pub fn get_mut<T: Any>(&mut self, handle: InstanceHandle) -> Result<&mut T, HandleError> {
        self.occupied_mut(handle)?
            .downcast_mut::<T>()
            .ok_or(HandleError::TypeMismatch {
                handle,
                expected: type_name::<T>(),
            })
    }

    /// Take the instance out of the table, invalidating `handle`.
    ///
    /// Nothing is removed when the handle names an instance of another type.
    pub fn remove<T: Any>(&mut self, handle: InstanceHandle) -> Result<T, HandleError> {
        if !self.occupied(handle)?.is::<T>() {
            return Err(HandleError::TypeMismatch {
                handle,
                expected: type_name::<T>(),
            });
        }
        let slot = &mut self.slots[handle.index()];
        let value = slot.value.take().ok_or(HandleError::Stale(handle))?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index() as u32);
        self.len -= 1;
        value
            .downcast::<T>()
            .map(|boxed| *boxed)
            .map_err(|_| HandleError::TypeMismatch {
                handle,
                expected: type_name::<T>(),
            })
    }

    pub fn contains(&self, handle: InstanceHandle) -> bool {
        self.occupied(handle).is_ok()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn slot(&self, handle: InstanceHandle) -> Result<&Slot, HandleError> {
        let slot = self
            .slots
            .get(handle.index())
            .ok_or(HandleError::Unknown(handle))?;
        if slot.generation != handle.generation() {
            return Err(HandleError::Stale(handle));
        }
        Ok(slot)
    }

    fn occupied(&self, handle: InstanceHandle) -> Result<&(dyn Any + Send), HandleError> {
        self.slot(handle)?
            .value
            .as_deref()
            .ok_or(HandleError::Stale(handle))
    }

    fn occupied_mut(
        &mut self,
        handle: InstanceHandle,
    ) -> Result<&mut (dyn Any + Send), HandleError> {
        self.slot(handle)?;
        self.slots[handle.index()]
            .value
            .as_deref_mut()
            .ok_or(HandleError::Stale(handle))
    }
}

impl fmt::Debug for InstanceTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstanceTable")
            .field("len", &self.len)
            .field("slots", &self.slots.len())
            .field("max_slots", &self.max_slots)
            .finish()
    }
}
