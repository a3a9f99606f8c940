//! Device - the shared store plus the gate that serializes access to it.
//!
//! The [`Device`] provides:
//! - Offset-explicit read and write under the gate
//! - Capacity growth with truncation under memory pressure
//! - Session handles with independent cursors
//! - Shutdown that interrupts every pending gate wait

use std::io::SeekFrom;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use parking_lot::MutexGuard;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::common::{DeviceConfig, Error, Result};
use crate::device::{DeviceStats, Handle};
use crate::store::{AccessGate, BufferStore, Growth};

/// A resizable in-memory block device.
///
/// # Architecture
/// ```text
/// ┌──────────────────────────────────────────────────────┐
/// │                       Device                         │
/// │  ┌────────────────────────────────────────────────┐  │
/// │  │  gate: AccessGate<BufferStore>                 │  │
/// │  │     storage: Vec<u8>  size  capacity           │  │
/// │  └────────────────────────────────────────────────┘  │
/// │  ┌──────────────┐  ┌──────────────┐  ┌────────────┐  │
/// │  │    stats     │  │   config     │  │  shutdown  │  │
/// │  └──────────────┘  └──────────────┘  └────────────┘  │
/// └──────────────────────────────────────────────────────┘
///        ▲              ▲              ▲
///     Handle         Handle         Handle   (own cursor each)
/// ```
///
/// # Thread Safety
/// - `gate`: one lock for every read, write, and seek; operations never
///   run in parallel
/// - `stats`: atomic counters, no lock
/// - `shutdown`: parent of every handle's cancellation token
///
/// # Usage
/// ```
/// use std::io::SeekFrom;
/// use ilium::{Device, DeviceConfig};
///
/// let device = Device::new(DeviceConfig::default()).unwrap();
/// let mut handle = device.open();
///
/// handle.write(b"hello").unwrap();
/// handle.seek(SeekFrom::Start(0)).unwrap();
/// assert_eq!(handle.read(5).unwrap(), b"hello");
/// ```
pub struct Device {
    /// The store, reachable only through the gate.
    gate: AccessGate<BufferStore>,

    /// Operation counters.
    stats: DeviceStats,

    /// Settings the device was created with.
    config: DeviceConfig,

    /// Cancelling this interrupts every handle.
    shutdown: CancellationToken,
}

impl Device {
    /// Create a device with a zero-filled initial region.
    ///
    /// # Errors
    /// - `Error::OutOfMemory` if the initial region cannot be allocated or
    ///   its size overflows `usize`
    ///
    /// # Panics
    /// Panics if `config.growth_unit` is 0.
    pub fn new(config: DeviceConfig) -> Result<Arc<Self>> {
        assert!(config.growth_unit > 0, "growth_unit must be > 0");

        let initial_capacity = config.initial_capacity().ok_or(Error::OutOfMemory {
            requested: usize::MAX,
        })?;
        let store = BufferStore::new(initial_capacity, config.capacity_limit)?;

        debug!(
            capacity = initial_capacity,
            capacity_limit = ?config.capacity_limit,
            "device created"
        );

        Ok(Arc::new(Self {
            gate: AccessGate::new(store, config.lock_poll_interval),
            stats: DeviceStats::new(),
            config,
            shutdown: CancellationToken::new(),
        }))
    }

    // ========================================================================
    // Public API: Sessions
    // ========================================================================

    /// Open a new session with its cursor at 0.
    ///
    /// The handle's cancellation token is a child of the device's shutdown
    /// token. Opening has no effect on the store.
    pub fn open(self: &Arc<Self>) -> Handle {
        debug!("device opened");
        Handle::new(Arc::clone(self), self.shutdown.child_token())
    }

    /// Interrupt every pending and future gate wait made through a handle.
    pub fn shutdown(&self) {
        debug!("device shutting down");
        self.shutdown.cancel();
    }

    /// Check whether [`shutdown`](Self::shutdown) has been called.
    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    // ========================================================================
    // Public API: Stream operations
    // ========================================================================

    /// Write `data` at `offset`, growing the store as needed.
    ///
    /// Returns the number of bytes written. This is less than `data.len()`
    /// when growth could not reach `offset + data.len()`; the caller is
    /// responsible for reissuing the remainder. `size` grows by exactly the
    /// returned count, even if the bytes overlap earlier writes.
    ///
    /// # Errors
    /// - `Error::OutOfRange` if `offset > size`
    /// - `Error::Interrupted` if `cancel` fires before the gate is taken
    pub fn write_at(
        &self,
        offset: u64,
        data: &[u8],
        cancel: &CancellationToken,
    ) -> Result<usize> {
        let mut store = self.lock(cancel)?;

        let size = store.size();
        if offset > size as u64 {
            return Err(self.reject("write", offset, size));
        }
        // offset <= size, so it fits in usize
        let offset = offset as usize;

        let capacity_before = store.capacity();
        let count = match store.ensure_capacity(offset.saturating_add(data.len())) {
            Growth::Satisfied => data.len(),
            Growth::Partial { writable_end } => {
                let count = writable_end.saturating_sub(offset);
                warn!(
                    offset,
                    requested = data.len(),
                    written = count,
                    capacity = writable_end,
                    "store growth failed, truncating write"
                );
                self.stats.partial_writes.fetch_add(1, Ordering::Relaxed);
                count
            }
        };
        if store.capacity() > capacity_before {
            self.stats.growths.fetch_add(1, Ordering::Relaxed);
        }

        if count > 0 {
            store.write_at(offset, &data[..count]);
        }
        self.stats.record_write(count);

        debug!(offset, written = count, size = store.size(), "write");
        Ok(count)
    }

    /// Read into `buf` starting at `offset`.
    ///
    /// Returns the number of bytes copied, clamped to the logical end.
    ///
    /// # Errors
    /// - `Error::OutOfRange` if `offset >= size`
    /// - `Error::Interrupted` if `cancel` fires before the gate is taken
    pub fn read_at(
        &self,
        offset: u64,
        buf: &mut [u8],
        cancel: &CancellationToken,
    ) -> Result<usize> {
        self.read_with(offset, cancel, |store, offset| store.read_at(offset, buf))
    }

    /// Read up to `max_len` bytes starting at `offset` into a new buffer.
    ///
    /// # Errors
    /// Same as [`read_at`](Self::read_at).
    pub fn read_vec_at(
        &self,
        offset: u64,
        max_len: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.read_with(offset, cancel, |store, offset| {
            let available = store.readable_end().saturating_sub(offset);
            out.resize(max_len.min(available), 0);
            store.read_at(offset, &mut out)
        })?;
        Ok(out)
    }

    /// Resolve a seek relative to `cursor` against the current size.
    ///
    /// The target must land in `0..size`; seeking to `size` itself fails,
    /// unlike writing at `size`.
    ///
    /// # Errors
    /// - `Error::OutOfRange` if the target is negative or `>= size`
    /// - `Error::Interrupted` if `cancel` fires before the gate is taken
    pub fn seek_from(
        &self,
        cursor: u64,
        pos: SeekFrom,
        cancel: &CancellationToken,
    ) -> Result<u64> {
        let store = self.lock(cancel)?;

        let size = store.size();
        let size_i64 = i64::try_from(size).unwrap_or(i64::MAX);
        let target = match pos {
            SeekFrom::Start(delta) => i64::try_from(delta).ok(),
            SeekFrom::Current(delta) => i64::try_from(cursor)
                .ok()
                .and_then(|cur| cur.checked_add(delta)),
            SeekFrom::End(delta) => (size_i64 - 1).checked_add(delta),
        }
        .unwrap_or(i64::MAX);

        if target < 0 || target >= size_i64 {
            self.stats.out_of_range.fetch_add(1, Ordering::Relaxed);
            debug!(position = target, size, "seek out of range");
            return Err(Error::OutOfRange {
                position: target,
                size: size as u64,
            });
        }

        self.stats.seeks.fetch_add(1, Ordering::Relaxed);
        debug!(?pos, position = target, "seek");
        Ok(target as u64)
    }

    // ========================================================================
    // Public API: Inspection
    // ========================================================================

    /// Logical size. Waits for the gate without cancellation.
    pub fn size(&self) -> usize {
        self.gate.acquire_uninterruptible().size()
    }

    /// Allocated capacity. Waits for the gate without cancellation.
    pub fn capacity(&self) -> usize {
        self.gate.acquire_uninterruptible().capacity()
    }

    /// Copy of the whole allocated region. Waits for the gate without
    /// cancellation.
    pub fn contents(&self) -> Vec<u8> {
        self.gate.acquire_uninterruptible().as_slice().to_vec()
    }

    /// Get device statistics.
    pub fn stats(&self) -> &DeviceStats {
        &self.stats
    }

    /// Get the configuration the device was created with.
    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    // ========================================================================
    // Internal
    // ========================================================================

    /// Take the gate, counting interruptions.
    fn lock(&self, cancel: &CancellationToken) -> Result<MutexGuard<'_, BufferStore>> {
        self.gate.acquire(cancel).inspect_err(|_| {
            self.stats.interruptions.fetch_add(1, Ordering::Relaxed);
            debug!("gate wait interrupted");
        })
    }

    /// Shared bounds check and bookkeeping for the read paths.
    fn read_with<F>(&self, offset: u64, cancel: &CancellationToken, read: F) -> Result<usize>
    where
        F: FnOnce(&BufferStore, usize) -> usize,
    {
        let store = self.lock(cancel)?;

        let size = store.size();
        if offset >= size as u64 {
            return Err(self.reject("read", offset, size));
        }

        let count = read(&*store, offset as usize);
        self.stats.record_read(count);

        debug!(offset, read = count, "read");
        Ok(count)
    }

    fn reject(&self, op: &'static str, offset: u64, size: usize) -> Error {
        self.stats.out_of_range.fetch_add(1, Ordering::Relaxed);
        debug!(op, offset, size, "offset out of range");
        Error::out_of_range(offset, size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    /// Helper to create a device with a small growth unit.
    fn small_device(limit: Option<usize>) -> Arc<Device> {
        let mut config = DeviceConfig::default()
            .with_growth_unit(16)
            .with_initial_pages_pow(2)
            .with_lock_poll_interval(Duration::from_millis(1));
        config.capacity_limit = limit;
        Device::new(config).unwrap()
    }

    #[test]
    fn test_new_device() {
        let device = Device::new(DeviceConfig::default()).unwrap();
        assert_eq!(device.size(), 0);
        assert_eq!(device.capacity(), 131072);
        assert!(!device.is_shut_down());
    }

    #[test]
    fn test_new_device_over_limit() {
        let config = DeviceConfig::default().with_capacity_limit(1024);
        assert_eq!(
            Device::new(config).err(),
            Some(Error::OutOfMemory { requested: 131072 })
        );
    }

    #[test]
    #[should_panic(expected = "growth_unit must be > 0")]
    fn test_zero_growth_unit_panics() {
        let _ = Device::new(DeviceConfig::default().with_growth_unit(0));
    }

    #[test]
    fn test_initial_capacity_overflow_is_out_of_memory() {
        let config = DeviceConfig::default().with_initial_pages_pow(64);
        assert_eq!(
            Device::new(config).err(),
            Some(Error::OutOfMemory {
                requested: usize::MAX
            })
        );
    }

    #[test]
    fn test_write_at_size_succeeds() {
        let device = small_device(None);
        let token = CancellationToken::new();

        assert_eq!(device.write_at(0, b"abc", &token), Ok(3));
        assert_eq!(device.write_at(3, b"def", &token), Ok(3));
        assert_eq!(device.size(), 6);
    }

    #[test]
    fn test_write_past_size_fails() {
        let device = small_device(None);
        let token = CancellationToken::new();

        assert_eq!(
            device.write_at(1, b"x", &token),
            Err(Error::OutOfRange {
                position: 1,
                size: 0
            })
        );
        assert_eq!(device.stats().snapshot().out_of_range, 1);
    }

    #[test]
    fn test_write_grows_capacity() {
        let device = small_device(None);
        let token = CancellationToken::new();

        assert_eq!(device.write_at(0, &[1; 100], &token), Ok(100));

        // 64 -> 128
        assert_eq!(device.capacity(), 128);
        assert_eq!(device.stats().snapshot().growths, 1);
    }

    #[test]
    fn test_partial_write_under_limit() {
        let device = small_device(Some(128));
        let token = CancellationToken::new();

        device.write_at(0, &[1; 100], &token).unwrap();
        let written = device.write_at(100, &[2; 100], &token).unwrap();

        assert_eq!(written, 28);
        assert_eq!(device.size(), 128);
        assert_eq!(device.capacity(), 128);
        assert_eq!(device.stats().snapshot().partial_writes, 1);

        let contents = device.contents();
        assert!(contents[..100].iter().all(|&b| b == 1));
        assert!(contents[100..].iter().all(|&b| b == 2));
    }

    #[test]
    fn test_write_beyond_capacity_after_overlap_writes_nothing() {
        let device = small_device(Some(64));
        let token = CancellationToken::new();

        // Overlapping writes push size past capacity
        device.write_at(0, &[1; 64], &token).unwrap();
        device.write_at(0, &[1; 64], &token).unwrap();
        assert_eq!(device.size(), 128);

        assert_eq!(device.write_at(100, b"zz", &token), Ok(0));
        assert_eq!(device.size(), 128);
    }

    #[test]
    fn test_read_at() {
        let device = small_device(None);
        let token = CancellationToken::new();
        device.write_at(0, b"hello world", &token).unwrap();

        let mut buf = [0u8; 32];
        assert_eq!(device.read_at(6, &mut buf, &token), Ok(5));
        assert_eq!(&buf[..5], b"world");

        assert_eq!(device.read_vec_at(0, 5, &token).unwrap(), b"hello");
    }

    #[test]
    fn test_read_at_size_fails() {
        let device = small_device(None);
        let token = CancellationToken::new();
        device.write_at(0, b"abc", &token).unwrap();

        let mut buf = [0u8; 4];
        assert!(matches!(
            device.read_at(3, &mut buf, &token),
            Err(Error::OutOfRange { .. })
        ));
        assert!(device.read_vec_at(10, 1, &token).is_err());
        assert_eq!(device.stats().snapshot().out_of_range, 2);
    }

    #[test]
    fn test_read_vec_clamps_to_size() {
        let device = small_device(None);
        let token = CancellationToken::new();
        device.write_at(0, b"abc", &token).unwrap();

        assert_eq!(device.read_vec_at(1, usize::MAX, &token).unwrap(), b"bc");
    }

    #[test]
    fn test_seek_bounds() {
        let device = small_device(None);
        let token = CancellationToken::new();
        device.write_at(0, b"0123456789", &token).unwrap();

        assert_eq!(device.seek_from(0, SeekFrom::Start(9), &token), Ok(9));
        assert!(device.seek_from(0, SeekFrom::Start(10), &token).is_err());

        assert_eq!(device.seek_from(4, SeekFrom::Current(2), &token), Ok(6));
        assert!(device.seek_from(4, SeekFrom::Current(-5), &token).is_err());

        assert_eq!(device.seek_from(0, SeekFrom::End(0), &token), Ok(9));
        assert_eq!(device.seek_from(0, SeekFrom::End(-9), &token), Ok(0));
        assert!(device.seek_from(0, SeekFrom::End(1), &token).is_err());
    }

    #[test]
    fn test_seek_on_empty_device_fails() {
        let device = small_device(None);
        let token = CancellationToken::new();

        assert_eq!(
            device.seek_from(0, SeekFrom::Start(0), &token),
            Err(Error::OutOfRange {
                position: 0,
                size: 0
            })
        );
    }

    #[test]
    fn test_seek_overflow_is_out_of_range() {
        let device = small_device(None);
        let token = CancellationToken::new();
        device.write_at(0, b"x", &token).unwrap();

        assert!(device
            .seek_from(u64::MAX, SeekFrom::Current(1), &token)
            .is_err());
        assert!(device
            .seek_from(0, SeekFrom::Start(u64::MAX), &token)
            .is_err());
    }

    #[test]
    fn test_interrupted_write_changes_nothing() {
        let device = small_device(None);
        let token = CancellationToken::new();
        device.write_at(0, b"keep", &token).unwrap();
        let before = device.contents();

        let cancelled = CancellationToken::new();
        cancelled.cancel();

        assert_eq!(
            device.write_at(4, &[9; 500], &cancelled),
            Err(Error::Interrupted)
        );
        assert_eq!(device.size(), 4);
        assert_eq!(device.capacity(), 64);
        assert_eq!(device.contents(), before);
        assert_eq!(device.stats().snapshot().interruptions, 1);
    }

    #[test]
    fn test_shutdown_interrupts_blocked_handle() {
        let device = small_device(None);
        let held = device.gate.acquire_uninterruptible();

        let waiter = {
            let mut handle = device.open();
            thread::spawn(move || handle.write(b"late"))
        };

        thread::sleep(Duration::from_millis(20));
        device.shutdown();

        assert_eq!(waiter.join().unwrap(), Err(Error::Interrupted));
        drop(held);

        assert!(device.is_shut_down());
        assert_eq!(device.size(), 0);
    }

    #[test]
    fn test_gate_released_after_error() {
        let device = small_device(None);
        let token = CancellationToken::new();

        assert!(device.write_at(5, b"x", &token).is_err());
        assert!(!device.gate.is_locked());
    }
}
