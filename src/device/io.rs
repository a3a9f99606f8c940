//! `std::io` adapters for [`Handle`].
//!
//! These let a handle stand in wherever a `Read + Write + Seek` stream is
//! expected. Reading at or past the logical end reports end-of-file
//! (`Ok(0)`) rather than an out-of-range error.

use std::io::{self, Read, Seek, SeekFrom, Write};

use crate::common::Error;
use crate::device::Handle;

impl Read for Handle {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.read_bytes(buf) {
            Ok(n) => Ok(n),
            Err(Error::OutOfRange { .. }) => Ok(0),
            Err(e) => Err(e.into()),
        }
    }
}

impl Write for Handle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(self.write_bytes(buf)?)
    }

    /// Writes land in the store immediately.
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Seek for Handle {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        Ok(self.seek_to(pos)?)
    }

    // Seeking to the current position fails once the cursor sits at the
    // end, so report the cursor directly.
    fn stream_position(&mut self) -> io::Result<u64> {
        Ok(self.position())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::DeviceConfig;
    use crate::device::Device;

    #[test]
    fn test_write_all_and_read_to_end() {
        let device = Device::new(DeviceConfig::default()).unwrap();
        let mut writer = device.open();
        Write::write_all(&mut writer, b"stream of bytes").unwrap();
        Write::flush(&mut writer).unwrap();

        let mut reader = device.open();
        let mut out = Vec::new();
        Read::read_to_end(&mut reader, &mut out).unwrap();

        assert_eq!(out, b"stream of bytes");
    }

    #[test]
    fn test_read_on_empty_device_is_eof() {
        let device = Device::new(DeviceConfig::default()).unwrap();
        let mut handle = device.open();

        let mut buf = [0u8; 8];
        assert_eq!(Read::read(&mut handle, &mut buf).unwrap(), 0);
    }

    #[test]
    fn test_seek_errors_map_to_io() {
        let device = Device::new(DeviceConfig::default()).unwrap();
        let mut handle = device.open();

        let err = Seek::seek(&mut handle, SeekFrom::Start(0)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_stream_position_at_end() {
        let device = Device::new(DeviceConfig::default()).unwrap();
        let mut handle = device.open();
        Write::write_all(&mut handle, b"abc").unwrap();

        assert_eq!(Seek::stream_position(&mut handle).unwrap(), 3);
        assert_eq!(Seek::seek(&mut handle, SeekFrom::End(-1)).unwrap(), 1);
    }

    #[test]
    fn test_interrupted_maps_to_io() {
        let device = Device::new(DeviceConfig::default()).unwrap();
        let mut handle = device.open();
        handle.cancel_token().cancel();

        // write_all must give up instead of retrying forever
        let err = Write::write_all(&mut handle, b"x").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Other);
    }
}
