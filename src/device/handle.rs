//! Handle - a per-open session on a device.
//!
//! A [`Handle`] pairs a shared [`Device`] with a private cursor. Writes and
//! reads start at the cursor and advance it by the bytes transferred; seeks
//! move it. The cursor is never shared, so handle operations take
//! `&mut self`.

use std::io::SeekFrom;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::common::Result;
use crate::device::Device;

/// An open session on a [`Device`].
///
/// Dropping the handle closes it; [`close`](Handle::close) does the same
/// explicitly. Neither touches the store.
///
/// # Example
/// ```
/// use std::io::SeekFrom;
/// use ilium::{Device, DeviceConfig};
///
/// let device = Device::new(DeviceConfig::default()).unwrap();
/// let mut writer = device.open();
/// let mut reader = device.open();
///
/// writer.write(b"abcdef").unwrap();
/// assert_eq!(writer.position(), 6);
///
/// // Each handle has its own cursor
/// assert_eq!(reader.read(3).unwrap(), b"abc");
/// reader.seek(SeekFrom::End(0)).unwrap();
/// assert_eq!(reader.read(3).unwrap(), b"f");
/// ```
pub struct Handle {
    device: Arc<Device>,
    cursor: u64,
    /// Child of the device's shutdown token.
    cancel: CancellationToken,
}

impl Handle {
    pub(crate) fn new(device: Arc<Device>, cancel: CancellationToken) -> Self {
        Self {
            device,
            cursor: 0,
            cancel,
        }
    }

    /// Current cursor position.
    #[inline]
    pub fn position(&self) -> u64 {
        self.cursor
    }

    /// The device this handle is bound to.
    #[inline]
    pub fn device(&self) -> &Arc<Device> {
        &self.device
    }

    /// A clone of this handle's cancellation token.
    ///
    /// Cancelling it from another thread interrupts a blocked operation on
    /// this handle and every later one.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Write `data` at the cursor and advance it by the bytes written.
    ///
    /// See [`Device::write_at`] for truncation and errors.
    pub fn write(&mut self, data: &[u8]) -> Result<usize> {
        self.write_bytes(data)
    }

    /// Read up to `max_len` bytes at the cursor and advance it.
    ///
    /// See [`Device::read_at`] for errors.
    pub fn read(&mut self, max_len: usize) -> Result<Vec<u8>> {
        let bytes = self
            .device
            .read_vec_at(self.cursor, max_len, &self.cancel)?;
        self.cursor += bytes.len() as u64;
        Ok(bytes)
    }

    /// Read into `buf` at the cursor and advance it.
    pub fn read_into(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.read_bytes(buf)
    }

    /// Move the cursor. Returns the new position.
    ///
    /// On error the cursor is unchanged. See [`Device::seek_from`].
    pub fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        self.seek_to(pos)
    }

    /// Close the session.
    pub fn close(self) {}

    pub(crate) fn write_bytes(&mut self, data: &[u8]) -> Result<usize> {
        let written = self.device.write_at(self.cursor, data, &self.cancel)?;
        self.cursor += written as u64;
        Ok(written)
    }

    pub(crate) fn read_bytes(&mut self, buf: &mut [u8]) -> Result<usize> {
        let read = self.device.read_at(self.cursor, buf, &self.cancel)?;
        self.cursor += read as u64;
        Ok(read)
    }

    pub(crate) fn seek_to(&mut self, pos: SeekFrom) -> Result<u64> {
        self.cursor = self.device.seek_from(self.cursor, pos, &self.cancel)?;
        Ok(self.cursor)
    }
}

impl Drop for Handle {
    fn drop(&mut self) {
        debug!(position = self.cursor, "handle closed");
    }
}
