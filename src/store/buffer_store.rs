//! BufferStore - the growable byte region behind a device.
//!
//! A [`BufferStore`] owns the raw bytes plus two counters:
//! - `size`: bytes written so far (an accumulating counter)
//! - `capacity`: bytes currently allocated
//!
//! Capacity only ever doubles. Every byte past the written region is zero,
//! so growth never exposes stale memory.

use tracing::trace;

use crate::common::{Error, Result};

/// Outcome of [`BufferStore::ensure_capacity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Growth {
    /// Capacity already covers the requested end.
    Satisfied,

    /// Growth stopped early. Nothing past `writable_end` may be written and
    /// the caller must clip its operation to it.
    Partial { writable_end: usize },
}

/// The byte region backing a device.
///
/// # Memory Layout
/// ```text
/// ┌──────────────────────────┬────────────────────────────┐
/// │  written bytes           │  zero fill                 │
/// └──────────────────────────┴────────────────────────────┘
/// 0                     high-water                  capacity
/// ```
///
/// `storage.len()` always equals `capacity`.
///
/// # Thread Safety
/// `BufferStore` is **single-threaded**. The device wraps it in an
/// [`AccessGate`](super::AccessGate) that serializes every operation.
#[derive(Debug)]
pub struct BufferStore {
    storage: Vec<u8>,
    /// Accumulates the length of every write, even overlapping ones.
    size: usize,
    /// Allocation ceiling; growth past it is treated as allocator failure.
    capacity_limit: Option<usize>,
}

impl BufferStore {
    /// Allocate a zero-filled store of `capacity` bytes.
    ///
    /// # Errors
    /// Returns `Error::OutOfMemory` if the region cannot be allocated or
    /// exceeds `capacity_limit`.
    pub fn new(capacity: usize, capacity_limit: Option<usize>) -> Result<Self> {
        if capacity_limit.is_some_and(|limit| capacity > limit) {
            return Err(Error::OutOfMemory {
                requested: capacity,
            });
        }

        let storage = Self::allocate_zeroed(capacity).ok_or(Error::OutOfMemory {
            requested: capacity,
        })?;

        Ok(Self {
            storage,
            size: 0,
            capacity_limit,
        })
    }

    /// Logical size in bytes.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Allocated bytes.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    /// End of the region that is actually backed by storage and may hold
    /// written bytes.
    #[inline]
    pub fn readable_end(&self) -> usize {
        self.size.min(self.capacity())
    }

    /// The whole allocated region.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.storage
    }

    /// Grow until `required_end` fits, doubling capacity each step.
    ///
    /// Each doubling copies the readable bytes into a fresh region and
    /// zero-fills the rest before swapping it in. If an allocation fails the
    /// loop stops and reports the current capacity as the writable end;
    /// bytes already stored are untouched.
    pub fn ensure_capacity(&mut self, required_end: usize) -> Growth {
        while required_end > self.capacity() {
            let Some(new_capacity) = self.next_capacity() else {
                return Growth::Partial {
                    writable_end: self.capacity(),
                };
            };

            let Some(mut region) = Self::allocate_empty(new_capacity) else {
                return Growth::Partial {
                    writable_end: self.capacity(),
                };
            };

            let keep = self.readable_end();
            region.extend_from_slice(&self.storage[..keep]);
            region.resize(new_capacity, 0);

            trace!(
                old_capacity = self.capacity(),
                new_capacity,
                "doubled store capacity"
            );
            self.storage = region;
        }

        Growth::Satisfied
    }

    /// Copy `data` into storage at `offset` and add its length to `size`.
    ///
    /// # Panics
    /// Panics if `offset + data.len()` exceeds capacity. Callers clip
    /// against [`ensure_capacity`](Self::ensure_capacity) first.
    pub fn write_at(&mut self, offset: usize, data: &[u8]) {
        self.storage[offset..offset + data.len()].copy_from_slice(data);
        self.size += data.len();
    }

    /// Copy up to `buf.len()` bytes starting at `offset` into `buf`.
    ///
    /// Returns the number of bytes copied, bounded by the readable end.
    pub fn read_at(&self, offset: usize, buf: &mut [u8]) -> usize {
        let end = self.readable_end();
        if offset >= end {
            return 0;
        }
        let count = buf.len().min(end - offset);
        buf[..count].copy_from_slice(&self.storage[offset..offset + count]);
        count
    }

    /// Doubled capacity, or `None` if doubling overflows or passes the limit.
    fn next_capacity(&self) -> Option<usize> {
        let doubled = self.capacity().checked_mul(2)?;
        match self.capacity_limit {
            Some(limit) if doubled > limit => None,
            _ => Some(doubled),
        }
    }

    fn allocate_empty(capacity: usize) -> Option<Vec<u8>> {
        let mut region = Vec::new();
        region.try_reserve_exact(capacity).ok()?;
        Some(region)
    }

    fn allocate_zeroed(capacity: usize) -> Option<Vec<u8>> {
        let mut region = Self::allocate_empty(capacity)?;
        region.resize(capacity, 0);
        Some(region)
    }
}
