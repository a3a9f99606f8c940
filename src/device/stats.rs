//! Device statistics tracking.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters tracked by a device.
///
/// All fields are atomic and updated with `Ordering::Relaxed`; the counters
/// are independent of each other and only need atomicity.
///
/// # Example
/// ```
/// use ilium::DeviceStats;
/// use std::sync::atomic::Ordering;
///
/// let stats = DeviceStats::new();
/// stats.writes.fetch_add(1, Ordering::Relaxed);
/// assert_eq!(stats.snapshot().writes, 1);
/// ```
#[derive(Debug)]
pub struct DeviceStats {
    /// Successful write calls.
    pub writes: AtomicU64,

    /// Successful read calls.
    pub reads: AtomicU64,

    /// Successful seek calls.
    pub seeks: AtomicU64,

    /// Total bytes accepted by writes.
    pub bytes_written: AtomicU64,

    /// Total bytes returned by reads.
    pub bytes_read: AtomicU64,

    /// Writes that had to grow the store.
    pub growths: AtomicU64,

    /// Writes truncated because growth could not reach the requested end.
    pub partial_writes: AtomicU64,

    /// Gate waits aborted by cancellation.
    pub interruptions: AtomicU64,

    /// Operations rejected for an out-of-range position.
    pub out_of_range: AtomicU64,
}

impl DeviceStats {
    /// Create a new stats tracker with all counters at zero.
    pub fn new() -> Self {
        Self {
            writes: AtomicU64::new(0),
            reads: AtomicU64::new(0),
            seeks: AtomicU64::new(0),
            bytes_written: AtomicU64::new(0),
            bytes_read: AtomicU64::new(0),
            growths: AtomicU64::new(0),
            partial_writes: AtomicU64::new(0),
            interruptions: AtomicU64::new(0),
            out_of_range: AtomicU64::new(0),
        }
    }

    pub(crate) fn record_write(&self, bytes: usize) {
        self.writes.fetch_add(1, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_read(&self, bytes: usize) {
        self.reads.fetch_add(1, Ordering::Relaxed);
        self.bytes_read.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    /// Get a snapshot of current statistics.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            writes: self.writes.load(Ordering::Relaxed),
            reads: self.reads.load(Ordering::Relaxed),
            seeks: self.seeks.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            bytes_read: self.bytes_read.load(Ordering::Relaxed),
            growths: self.growths.load(Ordering::Relaxed),
            partial_writes: self.partial_writes.load(Ordering::Relaxed),
            interruptions: self.interruptions.load(Ordering::Relaxed),
            out_of_range: self.out_of_range.load(Ordering::Relaxed),
        }
    }

    /// Reset all counters to zero.
    pub fn reset(&self) {
        self.writes.store(0, Ordering::Relaxed);
        self.reads.store(0, Ordering::Relaxed);
        self.seeks.store(0, Ordering::Relaxed);
        self.bytes_written.store(0, Ordering::Relaxed);
        self.bytes_read.store(0, Ordering::Relaxed);
        self.growths.store(0, Ordering::Relaxed);
        self.partial_writes.store(0, Ordering::Relaxed);
        self.interruptions.store(0, Ordering::Relaxed);
        self.out_of_range.store(0, Ordering::Relaxed);
    }
}

impl Default for DeviceStats {
    fn default() -> Self {
        Self::new()
    }
}

/// A point-in-time copy of [`DeviceStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub writes: u64,
    pub reads: u64,
    pub seeks: u64,
    pub bytes_written: u64,
    pub bytes_read: u64,
    pub growths: u64,
    pub partial_writes: u64,
    pub interruptions: u64,
    pub out_of_range: u64,
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Stats {{ writes: {} ({} bytes), reads: {} ({} bytes), seeks: {}, growths: {}, partial: {}, interrupted: {} }}",
            self.writes,
            self.bytes_written,
            self.reads,
            self.bytes_read,
            self.seeks,
            self.growths,
            self.partial_writes,
            self.interruptions
        )
    }
}
