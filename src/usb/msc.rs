//! Mass-storage backing hooks.
//!
//! The SCSI interpreter lives in the controller stack; it calls these hooks
//! for medium access. The defaults describe an absent medium, so a device
//! built with the mass-storage role but no backing enumerates and then
//! reports "not ready" instead of faulting.

use crate::error::{Error, Result};

/// Logical unit number.
pub type Lun = u8;

/// Medium geometry reported to READ CAPACITY.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Capacity {
    pub block_count: u32,
    pub block_size: u16,
}

/// INQUIRY identification fields, space or NUL padded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Inquiry {
    pub vendor_id: [u8; 8],
    pub product_id: [u8; 16],
    pub product_rev: [u8; 4],
}

/// Storage medium behind the mass-storage interface.
///
/// Read and write return the number of bytes transferred.
pub trait MassStorage {
    fn test_unit_ready(&self, _lun: Lun) -> bool {
        false
    }

    fn capacity(&self, _lun: Lun) -> Capacity {
        Capacity::default()
    }

    fn inquiry(&self, _lun: Lun) -> Inquiry {
        Inquiry::default()
    }

    fn read10(&self, _lun: Lun, _lba: u32, _offset: u32, _buf: &mut [u8]) -> Result<usize> {
        Err(Error::NotReady)
    }

    fn write10(&self, _lun: Lun, _lba: u32, _offset: u32, _buf: &[u8]) -> Result<usize> {
        Err(Error::NotReady)
    }

    /// Commands the stack does not handle itself. `Ok(0)` means no data
    /// phase.
    fn scsi(&self, _lun: Lun, _command: &[u8; 16], _buf: &mut [u8]) -> Result<usize> {
        Ok(0)
    }
}

/// No medium attached.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoMedia;

impl MassStorage for NoMedia {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_media_reports_absent() {
        let m = NoMedia;
        let mut buf = [0u8; 512];
        assert!(!m.test_unit_ready(0));
        assert_eq!(m.capacity(0), Capacity { block_count: 0, block_size: 0 });
        assert_eq!(m.inquiry(0).vendor_id, [0; 8]);
        assert_eq!(m.read10(0, 0, 0, &mut buf), Err(Error::NotReady));
        assert_eq!(m.write10(0, 0, 0, &buf), Err(Error::NotReady));
        assert_eq!(m.scsi(0, &[0; 16], &mut buf), Ok(0));
    }

    struct RamDisk([u8; 1024]);

    impl MassStorage for RamDisk {
        fn test_unit_ready(&self, _lun: Lun) -> bool {
            true
        }

        fn capacity(&self, _lun: Lun) -> Capacity {
            Capacity { block_count: 2, block_size: 512 }
        }

        fn read10(&self, _lun: Lun, lba: u32, offset: u32, buf: &mut [u8]) -> Result<usize> {
            let start = lba as usize * 512 + offset as usize;
            let src = self.0.get(start..start + buf.len()).ok_or(Error::NotReady)?;
            buf.copy_from_slice(src);
            Ok(buf.len())
        }
    }

    #[test]
    fn overrides_replace_defaults() {
        let mut disk = RamDisk([0; 1024]);
        disk.0[512] = 0xAB;
        let mut buf = [0u8; 4];
        assert!(disk.test_unit_ready(0));
        assert_eq!(disk.capacity(0).block_size, 512);
        assert_eq!(disk.read10(0, 1, 0, &mut buf), Ok(4));
        assert_eq!(buf[0], 0xAB);
        // Untouched hooks keep their defaults.
        assert_eq!(disk.write10(0, 0, 0, &buf), Err(Error::NotReady));
    }
}
