//! Configuration for ilium devices.

use std::time::Duration;

/// Size of a page in bytes (4KB).
///
/// This is the default growth unit: capacity is always a power-of-two
/// number of pages.
pub const PAGE_SIZE: usize = 4096;

/// log2 of the number of pages allocated when a device is created.
///
/// With 4KB pages the device starts with 32 pages = 128KB.
pub const INITIAL_PAGES_POW: u8 = 5;

/// How long a blocked caller waits on the gate before re-checking its
/// cancellation token.
pub const DEFAULT_LOCK_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Tunables for a [`Device`](crate::Device).
///
/// # Example
/// ```
/// use ilium::DeviceConfig;
///
/// let config = DeviceConfig::default().with_capacity_limit(1 << 20);
/// assert_eq!(config.initial_capacity(), Some(131072));
/// assert_eq!(config.capacity_limit, Some(1 << 20));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceConfig {
    /// Fixed block size; capacity is always `growth_unit << k`.
    pub growth_unit: usize,

    /// Capacity at creation is `growth_unit << initial_pages_pow`.
    pub initial_pages_pow: u8,

    /// Largest capacity growth may reach. Allocations above it are treated
    /// exactly like an allocator failure. `None` means only the real
    /// allocator limits growth.
    pub capacity_limit: Option<usize>,

    /// Granularity of the interruptible wait on the gate.
    pub lock_poll_interval: Duration,
}

impl DeviceConfig {
    /// Bytes allocated when the device is created, or `None` if the shift
    /// overflows `usize`.
    pub fn initial_capacity(&self) -> Option<usize> {
        self.growth_unit
            .checked_shl(u32::from(self.initial_pages_pow))
            .filter(|cap| cap >> self.initial_pages_pow == self.growth_unit)
    }

    pub fn with_growth_unit(mut self, growth_unit: usize) -> Self {
        self.growth_unit = growth_unit;
        self
    }

    pub fn with_initial_pages_pow(mut self, pow: u8) -> Self {
        self.initial_pages_pow = pow;
        self
    }

    pub fn with_capacity_limit(mut self, limit: usize) -> Self {
        self.capacity_limit = Some(limit);
        self
    }

    pub fn with_lock_poll_interval(mut self, interval: Duration) -> Self {
        self.lock_poll_interval = interval;
        self
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            growth_unit: PAGE_SIZE,
            initial_pages_pow: INITIAL_PAGES_POW,
            capacity_limit: None,
            lock_poll_interval: DEFAULT_LOCK_POLL_INTERVAL,
        }
    }
}
