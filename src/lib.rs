//! ilium - a resizable in-memory block device.
//!
//! # Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │   Handle      Handle      Handle     (cursor per session)   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌───────────────────────────────────────────────────────┐  │
//! │  │                Device (device/)                       │  │
//! │  │   write_at / read_at / seek_from + DeviceStats        │  │
//! │  └───────────────────────────────────────────────────────┘  │
//! │                            ↓                                │
//! │  ┌───────────────────────────────────────────────────────┐  │
//! │  │                 Store (store/)                        │  │
//! │  │   AccessGate (one lock)  →  BufferStore (Vec<u8>)     │  │
//! │  └───────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every operation takes the one gate, so reads, writes and seeks run
//! strictly one after another no matter how many threads call in. Waiting
//! for the gate can be cancelled through a
//! [`CancellationToken`](tokio_util::sync::CancellationToken).
//!
//! # Modules
//! - [`common`] - Configuration and errors
//! - [`store`] - The byte region and its gate
//! - [`device`] - Device, handles, statistics
//!
//! # Quick Start
//! ```
//! use std::io::SeekFrom;
//! use ilium::{Device, DeviceConfig};
//!
//! let device = Device::new(DeviceConfig::default()).unwrap();
//! let mut handle = device.open();
//!
//! handle.write(b"Hello, world!").unwrap();
//! handle.seek(SeekFrom::Start(7)).unwrap();
//! assert_eq!(handle.read(5).unwrap(), b"world");
//! ```

pub mod common;
pub mod device;
pub mod store;

pub use common::config::PAGE_SIZE;
pub use common::{DeviceConfig, Error, Result};

pub use device::{Device, DeviceStats, Handle, StatsSnapshot};
pub use store::{AccessGate, BufferStore, Growth};
