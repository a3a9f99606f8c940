//! Device layer - the shared store and the sessions that use it.
//!
//! # Components
//! - [`Device`] - Gate + store + stats, shared by `Arc`
//! - [`Handle`] - A session with its own cursor
//! - [`DeviceStats`] - Operation counters
//!
//! `Handle` also implements `std::io::{Read, Write, Seek}`.

#[allow(clippy::module_inception)]
mod device;
mod handle;
mod io;
mod stats;

pub use device::Device;
pub use handle::Handle;
pub use stats::{DeviceStats, StatsSnapshot};
